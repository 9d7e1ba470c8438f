pub mod generation;
pub mod jobs;
