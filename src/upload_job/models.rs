use chrono::{DateTime, Utc};
use std::borrow::Cow;
use std::sync::OnceLock;
use validator::{Validate, ValidationError, ValidationErrors};

use super::record::JobRecord;
use crate::xml::XmlHash;

/// Error category for failures not tied to a single field.
pub const BASE: &str = "base";

/// A cloud upload job as returned by the backend.
///
/// Built from a raw XML document (decoded on first field access), from an
/// already decoded record, or from a captured transport failure. In the
/// last case the job carries no fields and never validates.
#[derive(Debug)]
pub struct UploadJob {
    xml: Option<String>,
    record: OnceLock<JobRecord>,
    exception: Option<String>,
}

impl UploadJob {
    /// Wraps a raw `<clouduploadjob>` document without decoding it.
    pub fn from_xml(xml: impl Into<String>) -> Self {
        Self {
            xml: Some(xml.into()),
            record: OnceLock::new(),
            exception: None,
        }
    }

    pub fn from_record(record: JobRecord) -> Self {
        Self {
            xml: None,
            record: OnceLock::from(record),
            exception: None,
        }
    }

    /// Job standing in for a failed backend call.
    pub fn from_exception(message: impl Into<String>) -> Self {
        Self {
            xml: None,
            record: OnceLock::new(),
            exception: Some(message.into()),
        }
    }

    /// Decoded record, decoding the raw document on first use.
    pub fn record(&self) -> &JobRecord {
        self.record.get_or_init(|| match &self.xml {
            Some(xml) => JobRecord::from_xml(xml),
            None => JobRecord::default(),
        })
    }

    pub fn is_decoded(&self) -> bool {
        self.record.get().is_some()
    }

    /// Raw document this job was built from, if any.
    pub fn xml(&self) -> Option<&str> {
        self.xml.as_deref()
    }

    pub fn exception(&self) -> Option<&str> {
        self.exception.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.record().name.as_deref()
    }

    pub fn id(&self) -> Option<&str> {
        self.name()
    }

    pub fn state(&self) -> Option<&str> {
        self.record().state.as_deref()
    }

    pub fn details(&self) -> Option<&str> {
        self.record().details.as_deref()
    }

    pub fn target(&self) -> Option<&str> {
        self.record().target.as_deref()
    }

    pub fn user(&self) -> Option<&str> {
        self.record().user.as_deref()
    }

    pub fn project(&self) -> Option<&str> {
        self.record().project.as_deref()
    }

    pub fn package(&self) -> Option<&str> {
        self.record().package.as_deref()
    }

    pub fn repository(&self) -> Option<&str> {
        self.record().repository.as_deref()
    }

    pub fn arch(&self) -> Option<&str> {
        self.record().arch.as_deref()
    }

    pub fn architecture(&self) -> Option<&str> {
        self.arch()
    }

    pub fn filename(&self) -> Option<&str> {
        self.record().filename.as_deref()
    }

    pub fn vpc_subnet_id(&self) -> Option<&str> {
        self.record().vpc_subnet_id.as_deref()
    }

    pub fn size(&self) -> Option<&str> {
        self.record().size.as_deref()
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.record().created_at()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created()
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Validation errors of this job; empty when it is valid.
    pub fn errors(&self) -> ValidationErrors {
        self.validate().err().unwrap_or_default()
    }

    /// Message reported for the captured failure: the `<summary>` of a
    /// backend status document, or the failure text as is.
    fn exception_message(exception: &str) -> String {
        XmlHash::parse(exception)
            .ok()
            .and_then(|status| status.text("summary").map(str::to_string))
            .filter(|summary| !summary.trim().is_empty())
            .unwrap_or_else(|| exception.to_string())
    }
}

impl Validate for UploadJob {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let Some(exception) = self.exception.as_deref().filter(|e| !e.trim().is_empty()) else {
            return Ok(());
        };

        let mut error = ValidationError::new("backend");
        error.message = Some(Cow::Owned(Self::exception_message(exception)));

        let mut errors = ValidationErrors::new();
        errors.add(BASE, error);
        Err(errors)
    }
}
