use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::xml::{XmlHash, XmlValue};

/// Fields of one `<clouduploadjob>` record as reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub name: Option<String>,
    pub state: Option<String>,
    pub details: Option<String>,
    pub target: Option<String>,
    pub user: Option<String>,
    pub project: Option<String>,
    pub package: Option<String>,
    pub repository: Option<String>,
    pub arch: Option<String>,
    pub filename: Option<String>,
    pub vpc_subnet_id: Option<String>,
    pub size: Option<String>,
    pub created: Option<String>,
}

impl JobRecord {
    /// Maps the keys of a decoded `<clouduploadjob>` element onto the record.
    ///
    /// Unknown keys are ignored. A known key holding something other than
    /// text (a list, or an element without text content) decodes as `None`.
    pub fn from_hash(hash: &XmlHash) -> Self {
        let field = |key: &str| match hash.get(key) {
            None => None,
            Some(value) => match value.as_text() {
                Some(text) => Some(text.to_string()),
                None => {
                    debug!("Ignoring non-text value for upload job field {}", key);
                    None
                }
            },
        };

        Self {
            name: field("name"),
            state: field("state"),
            details: field("details"),
            target: field("target"),
            user: field("user"),
            project: field("project"),
            package: field("package"),
            repository: field("repository"),
            arch: field("arch"),
            filename: field("filename"),
            vpc_subnet_id: field("vpc_subnet_id"),
            size: field("size"),
            created: field("created"),
        }
    }

    /// Decodes a record from a raw `<clouduploadjob>` document.
    ///
    /// An undecodable document yields an empty record.
    pub fn from_xml(xml: &str) -> Self {
        match XmlHash::parse(xml) {
            Ok(hash) => Self::from_hash(&hash),
            Err(e) => {
                debug!("Upload job payload is not decodable: {}", e);
                Self::default()
            }
        }
    }

    /// Creation time of the job. Falls back to the Unix epoch when
    /// `created` is missing, non-numeric or out of range.
    pub fn created_at(&self) -> DateTime<Utc> {
        let seconds = self.created.as_deref().map(leading_integer).unwrap_or(0);
        DateTime::from_timestamp(seconds, 0).unwrap_or_default()
    }
}

impl From<&XmlValue> for JobRecord {
    fn from(value: &XmlValue) -> Self {
        match value {
            XmlValue::Element(hash) => Self::from_hash(hash),
            _ => Self::default(),
        }
    }
}

/// Integer prefix of `input`, ignoring leading whitespace and an optional
/// sign. Anything unparsable is zero.
fn leading_integer(input: &str) -> i64 {
    let trimmed = input.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    let value = digits[..end].parse::<i64>().unwrap_or(0);
    if negative {
        -value
    } else {
        value
    }
}
