//! Access to the cloud upload jobs of a build backend.
//!
//! [`upload_job::UploadJobService`] starts uploads and fetches their state
//! through a [`transport::CloudTransport`], and hands back read-only
//! [`upload_job::UploadJob`] views of the backend's XML records.

pub mod config;
pub mod db;
pub mod telemetry;
pub mod transport;
pub mod upload_job;
pub mod xml;
