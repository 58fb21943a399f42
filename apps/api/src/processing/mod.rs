pub mod aggregate;
pub mod handlers;
pub mod intake;
pub mod retention;
pub mod status;
pub mod submitter;
