pub mod enrollment;
pub mod eye;
pub mod face;
pub mod hand;
pub mod pipeline;
pub mod shared;
pub mod voice;
