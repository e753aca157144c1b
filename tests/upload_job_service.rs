//! Tests of `UploadJobService` against an in-memory backend.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use cloud_upload_jobs::transport::{CloudTransport, TransportError, UploadParams};
use cloud_upload_jobs::upload_job::{
    AllResult, FindOptions, FindResult, UploadJobOwner, UploadJobService,
};
use validator::Validate;

/// Canned backend answer, replayed for every call.
#[derive(Clone)]
enum Reply {
    Body(&'static str),
    Backend(&'static str),
    Timeout,
}

struct FakeBackend {
    reply: Reply,
    calls: Mutex<Vec<Vec<String>>>,
}

impl FakeBackend {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn answer(&self) -> Result<String, TransportError> {
        match &self.reply {
            Reply::Body(body) => Ok(body.to_string()),
            Reply::Backend(body) => Err(TransportError::Backend {
                status: 400,
                body: body.to_string(),
            }),
            Reply::Timeout => Err(TransportError::Timeout("operation timed out".into())),
        }
    }

    fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CloudTransport for FakeBackend {
    async fn upload(&self, params: &UploadParams) -> Result<String, TransportError> {
        self.calls.lock().unwrap().push(vec![params.target.clone()]);
        self.answer()
    }

    async fn upload_jobs(&self, job_ids: &[String]) -> Result<String, TransportError> {
        self.calls.lock().unwrap().push(job_ids.to_vec());
        self.answer()
    }
}

struct User(Vec<&'static str>);

impl UploadJobOwner for User {
    fn upload_job_ids(&self) -> Vec<String> {
        self.0.iter().map(|id| id.to_string()).collect()
    }
}

fn service(backend: &Arc<FakeBackend>) -> UploadJobService {
    UploadJobService::new(backend.clone())
}

fn params() -> UploadParams {
    UploadParams {
        project: "home:alice".into(),
        package: "appliance".into(),
        repository: "images".into(),
        arch: "x86_64".into(),
        filename: "appliance.raw.xz".into(),
        user: "alice".into(),
        target: "ec2".into(),
        ..UploadParams::default()
    }
}

const ONE_JOB: &str = r#"<clouduploadjobs>
  <clouduploadjob name="6">
    <state>uploading</state>
    <target>ec2</target>
    <arch>x86_64</arch>
    <created>1500000000</created>
  </clouduploadjob>
</clouduploadjobs>"#;

const THREE_JOBS: &str = r#"<clouduploadjobs>
  <clouduploadjob name="3"><state>succeeded</state></clouduploadjob>
  <clouduploadjob name="1"><state>failed</state></clouduploadjob>
  <clouduploadjob name="2"><state>created</state></clouduploadjob>
</clouduploadjobs>"#;

fn base_message(job: &cloud_upload_jobs::upload_job::UploadJob) -> Option<String> {
    let errors = job.validate().unwrap_err();
    let field_errors = errors.field_errors();
    let base = field_errors.get("base")?;
    assert_eq!(base.len(), 1);
    base[0].message.as_ref().map(|m| m.to_string())
}

#[tokio::test]
async fn create_wraps_the_backend_document_lazily() {
    let backend = FakeBackend::new(Reply::Body(
        r#"<clouduploadjob name="12"><state>created</state><target>ec2</target></clouduploadjob>"#,
    ));

    let job = service(&backend).create(&params()).await;

    assert!(!job.is_decoded());
    assert!(job.is_valid());
    assert_eq!(job.id(), Some("12"));
    assert_eq!(job.state(), Some("created"));
    assert_eq!(backend.calls(), vec![vec!["ec2".to_string()]]);
}

#[tokio::test]
async fn create_turns_backend_errors_into_an_invalid_job() {
    let backend = FakeBackend::new(Reply::Backend(
        r#"<status code="400"><summary>quota exceeded</summary></status>"#,
    ));

    let job = service(&backend).create(&params()).await;

    assert!(!job.is_valid());
    assert_eq!(job.name(), None);
    assert_eq!(base_message(&job).as_deref(), Some("quota exceeded"));
}

#[tokio::test]
async fn create_turns_timeouts_into_an_invalid_job() {
    let backend = FakeBackend::new(Reply::Timeout);

    let job = service(&backend).create(&params()).await;

    assert!(!job.is_valid());
    assert_eq!(
        base_message(&job).as_deref(),
        Some("request to backend timed out: operation timed out")
    );
}

#[tokio::test]
async fn find_decodes_a_single_job() {
    let backend = FakeBackend::new(Reply::Body(ONE_JOB));

    let job = service(&backend)
        .find("6", FindOptions::default())
        .await
        .into_job()
        .expect("job 6 should be found");

    assert_eq!(job.id(), Some("6"));
    assert_eq!(job.state(), Some("uploading"));
    assert_eq!(job.architecture(), Some("x86_64"));
    assert_eq!(job.created_at().timestamp(), 1_500_000_000);
    assert!(job.is_valid());
    assert_eq!(backend.calls(), vec![vec!["6".to_string()]]);
}

#[tokio::test]
async fn find_returns_raw_xml_on_request() {
    let backend = FakeBackend::new(Reply::Body(ONE_JOB));

    match service(&backend).find("6", FindOptions::xml()).await {
        FindResult::Xml(xml) => assert_eq!(xml, ONE_JOB),
        other => panic!("expected raw xml, got {other:?}"),
    }
}

#[tokio::test]
async fn find_reports_failures_like_missing_jobs() {
    let empty = FakeBackend::new(Reply::Body("<clouduploadjobs/>"));
    let broken = FakeBackend::new(Reply::Backend("<status><summary>boom</summary></status>"));
    let slow = FakeBackend::new(Reply::Timeout);

    for backend in [&empty, &broken, &slow] {
        let result = service(backend).find("6", FindOptions::default()).await;
        assert!(result.is_not_found(), "{result:?}");
    }

    let raw_failure = service(&slow).find("6", FindOptions::xml()).await;
    assert!(raw_failure.is_not_found());
}

#[tokio::test]
async fn all_fetches_every_job_of_the_owner_in_response_order() {
    let backend = FakeBackend::new(Reply::Body(THREE_JOBS));
    let user = User(vec!["1", "2", "3"]);

    let jobs = service(&backend)
        .all(&user, FindOptions::default())
        .await
        .into_jobs();

    let ids: Vec<_> = jobs.iter().filter_map(|job| job.id()).collect();
    assert_eq!(ids, ["3", "1", "2"]);
    assert_eq!(jobs[1].state(), Some("failed"));
    assert_eq!(
        backend.calls(),
        vec![vec!["1".to_string(), "2".to_string(), "3".to_string()]]
    );
}

#[tokio::test]
async fn all_wraps_a_single_element_in_a_list() {
    let backend = FakeBackend::new(Reply::Body(ONE_JOB));

    let jobs = service(&backend)
        .all(&User(vec!["6"]), FindOptions::default())
        .await
        .into_jobs();

    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].id(), Some("6"));
}

#[tokio::test]
async fn all_returns_nothing_when_the_backend_fails() {
    let user = User(vec!["1"]);

    for reply in [Reply::Timeout, Reply::Backend("<status/>")] {
        let backend = FakeBackend::new(reply);
        for options in [FindOptions::default(), FindOptions::xml()] {
            match service(&backend).all(&user, options).await {
                AllResult::Jobs(jobs) => assert!(jobs.is_empty()),
                AllResult::Xml(xml) => panic!("unexpected raw xml {xml}"),
            }
        }
    }
}

#[tokio::test]
async fn all_returns_raw_xml_on_request() {
    let backend = FakeBackend::new(Reply::Body(THREE_JOBS));

    match service(&backend).all(&User(vec!["1"]), FindOptions::xml()).await {
        AllResult::Xml(xml) => assert_eq!(xml, THREE_JOBS),
        AllResult::Jobs(jobs) => panic!("expected raw xml, got {} jobs", jobs.len()),
    }
}
