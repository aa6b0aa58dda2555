pub mod threaded_face_branch_executor;
