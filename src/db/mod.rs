pub mod connection;
pub mod migrations;
pub mod models;
pub mod user_upload_job_repository;

pub use user_upload_job_repository::{CloudUser, UserUploadJobRepository};
