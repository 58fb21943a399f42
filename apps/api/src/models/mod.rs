pub mod job;
pub mod queue_job;
pub mod resume;
pub mod user;
