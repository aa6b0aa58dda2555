use crate::face::domain::face_analysis::FaceReport;
use crate::pipeline::face_branch_executor::{analyze_face, FaceBranchExecutor, FaceJob};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::error::StageError;

/// Runs per-face branches on a pool of scoped worker threads.
///
/// Layout: `main [queue face indices] → workers [analyze_face] → main [slots]`
///
/// Workers pull face indices from a shared queue and send back
/// `(index, report)`; the main thread writes each report into its index
/// slot, so completion order never affects alignment. Frames, stages and
/// templates are borrowed for the duration of the scope. All workers are
/// joined before the reports are returned.
pub struct ThreadedFaceBranchExecutor {
    max_workers: usize,
}

impl ThreadedFaceBranchExecutor {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
        }
    }
}

impl FaceBranchExecutor for ThreadedFaceBranchExecutor {
    fn execute(&self, job: &FaceJob<'_>, boxes: &[BoundingBox]) -> Vec<FaceReport> {
        let workers = self.max_workers.min(boxes.len());
        if workers <= 1 {
            return boxes.iter().map(|bbox| analyze_face(job, bbox)).collect();
        }

        let (task_tx, task_rx) = crossbeam_channel::unbounded::<usize>();
        let (report_tx, report_rx) = crossbeam_channel::unbounded::<(usize, FaceReport)>();
        for idx in 0..boxes.len() {
            // The receiver is alive until the scope below ends.
            let _ = task_tx.send(idx);
        }
        drop(task_tx);

        let mut slots: Vec<Option<FaceReport>> = vec![None; boxes.len()];

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    let task_rx = task_rx.clone();
                    let report_tx = report_tx.clone();
                    scope.spawn(move || {
                        for idx in task_rx {
                            let report = analyze_face(job, &boxes[idx]);
                            if report_tx.send((idx, report)).is_err() {
                                break;
                            }
                        }
                    })
                })
                .collect();
            drop(report_tx);

            for (idx, report) in report_rx.iter() {
                slots[idx] = Some(report);
            }

            for handle in handles {
                if handle.join().is_err() {
                    log::error!("Face branch worker panicked");
                }
            }
        });

        slots
            .into_iter()
            .enumerate()
            .map(|(idx, slot)| {
                slot.unwrap_or_else(|| {
                    FaceReport::failed(StageError::internal(format!(
                        "face {idx} was lost by a panicked worker"
                    )))
                })
            })
            .collect()
    }
}
