pub mod models;
pub mod record;
pub mod service;

// Re-export commonly used types
pub use models::UploadJob;
pub use record::JobRecord;
pub use service::{AllResult, FindOptions, FindResult, Format, UploadJobOwner, UploadJobService};
