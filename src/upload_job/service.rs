use std::sync::Arc;
use tracing::{debug, info, warn};

use super::models::UploadJob;
use super::record::JobRecord;
use crate::transport::{CloudTransport, UploadParams};
use crate::xml::{XmlHash, XmlValue};

/// Element name of one job inside a backend response.
const JOB_ELEMENT: &str = "clouduploadjob";

/// Payload format requested from [`UploadJobService::find`] and
/// [`UploadJobService::all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Decoded,
    /// Hand back the backend's XML untouched.
    Xml,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FindOptions {
    pub format: Format,
}

impl FindOptions {
    pub fn xml() -> Self {
        Self {
            format: Format::Xml,
        }
    }
}

/// Outcome of [`UploadJobService::find`].
///
/// A failed backend call is reported as [`FindResult::NotFound`], the same
/// as an empty response.
#[derive(Debug)]
pub enum FindResult {
    Found(UploadJob),
    Xml(String),
    NotFound,
}

impl FindResult {
    pub fn into_job(self) -> Option<UploadJob> {
        match self {
            FindResult::Found(job) => Some(job),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FindResult::NotFound)
    }
}

/// Outcome of [`UploadJobService::all`]. A failed backend call yields an
/// empty [`AllResult::Jobs`].
#[derive(Debug)]
pub enum AllResult {
    Jobs(Vec<UploadJob>),
    Xml(String),
}

impl AllResult {
    pub fn into_jobs(self) -> Vec<UploadJob> {
        match self {
            AllResult::Jobs(jobs) => jobs,
            AllResult::Xml(_) => Vec::new(),
        }
    }
}

/// Anything owning a list of cloud upload job ids, usually a user.
pub trait UploadJobOwner {
    fn upload_job_ids(&self) -> Vec<String>;
}

/// Access to the backend's cloud upload jobs.
///
/// None of the operations return an error: backend failures turn into a
/// job that fails validation (`create`) or into an empty result (`find`,
/// `all`).
#[derive(Clone)]
pub struct UploadJobService {
    transport: Arc<dyn CloudTransport>,
}

impl UploadJobService {
    pub fn new(transport: Arc<dyn CloudTransport>) -> Self {
        Self { transport }
    }

    /// Start a new upload
    ///
    /// # Returns
    /// - The job reported by the backend, decoded on first field access
    /// - On transport failure or timeout, a job carrying the failure message
    ///   that does not validate
    pub async fn create(&self, params: &UploadParams) -> UploadJob {
        info!(
            "Creating cloud upload job: project={}, package={}, target={}",
            params.project, params.package, params.target
        );

        match self.transport.upload(params).await {
            Ok(xml) => UploadJob::from_xml(xml),
            Err(e) => {
                warn!("Cloud upload request failed: {}", e);
                UploadJob::from_exception(e.to_string())
            }
        }
    }

    /// Fetch one job by id
    ///
    /// # Returns
    /// - `Xml` with the raw response when `options.format` is [`Format::Xml`]
    /// - `Found` with the decoded job
    /// - `NotFound` when the response has no job or the backend call failed
    pub async fn find(&self, job_id: &str, options: FindOptions) -> FindResult {
        debug!("Fetching cloud upload job {}", job_id);

        let xml = match self.transport.upload_jobs(&[job_id.to_string()]).await {
            Ok(xml) => xml,
            Err(e) => {
                warn!("Fetching cloud upload job {} failed: {}", job_id, e);
                return FindResult::NotFound;
            }
        };

        if options.format == Format::Xml {
            return FindResult::Xml(xml);
        }

        match extract_jobs(&xml).into_iter().next() {
            Some(record) => FindResult::Found(UploadJob::from_record(record)),
            None => {
                debug!("Cloud upload job {} not found", job_id);
                FindResult::NotFound
            }
        }
    }

    /// Fetch every job of `owner`, in the order the backend lists them
    pub async fn all(&self, owner: &dyn UploadJobOwner, options: FindOptions) -> AllResult {
        let job_ids = owner.upload_job_ids();
        debug!("Fetching {} cloud upload jobs", job_ids.len());

        let xml = match self.transport.upload_jobs(&job_ids).await {
            Ok(xml) => xml,
            Err(e) => {
                warn!("Fetching cloud upload jobs failed: {}", e);
                return AllResult::Jobs(Vec::new());
            }
        };

        if options.format == Format::Xml {
            return AllResult::Xml(xml);
        }

        let jobs: Vec<UploadJob> = extract_jobs(&xml)
            .into_iter()
            .map(UploadJob::from_record)
            .collect();
        debug!("Decoded {} cloud upload jobs", jobs.len());

        AllResult::Jobs(jobs)
    }
}

/// Records of the non-blank `<clouduploadjob>` elements of a response, in
/// document order.
fn extract_jobs(xml: &str) -> Vec<JobRecord> {
    let mut hash = match XmlHash::parse(xml) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("Cloud upload jobs response is not decodable: {}", e);
            return Vec::new();
        }
    };

    let Some(jobs) = hash.remove(JOB_ELEMENT) else {
        return Vec::new();
    };

    jobs.flatten()
        .iter()
        .filter(|job| matches!(job, XmlValue::Element(_)) && !job.is_blank())
        .map(JobRecord::from)
        .collect()
}
