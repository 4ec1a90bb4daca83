use std::fmt;
use std::str::FromStr;

use dicom_core::Tag;
use dicom_object::InMemDicomObject;
use thiserror::Error;

use crate::redaction::parse_attribute;

/// Filter key matched against the calling AE title instead of an attribute
pub const AE_TITLE_KEY: &str = "AETitle";

/// Predicate deciding whether a C-STORE goes to a given destination.
pub trait DestinationFilter: Send + Sync + fmt::Debug {
    fn matches(&self, calling_ae_title: &str, attributes: &InMemDicomObject) -> bool;

    /// Whether evaluating this filter needs data set attributes at all
    fn needs_attributes(&self) -> bool {
        true
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterParseError {
    #[error("empty filter")]
    Empty,

    #[error("filter term '{0}' is not key=value")]
    MalformedTerm(String),

    #[error("unknown attribute '{0}' in filter")]
    UnknownAttribute(String),
}

/// Conjunction of exact matches, written as `AETitle=MODA&Modality=CT`.
///
/// Attribute values are compared after trimming DICOM padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeFilter {
    ae_title: Option<String>,
    attributes: Vec<(Tag, String)>,
}

impl AttributeFilter {
    pub fn ae_title(&self) -> Option<&str> {
        self.ae_title.as_deref()
    }
}

impl FromStr for AttributeFilter {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut ae_title = None;
        let mut attributes = Vec::new();
        for term in s.split('&').map(str::trim).filter(|t| !t.is_empty()) {
            let (key, value) = term
                .split_once('=')
                .ok_or_else(|| FilterParseError::MalformedTerm(term.to_string()))?;
            let (key, value) = (key.trim(), value.trim());
            if key.is_empty() {
                return Err(FilterParseError::MalformedTerm(term.to_string()));
            }
            if key == AE_TITLE_KEY {
                ae_title = Some(value.to_string());
            } else {
                let tag = parse_attribute(key)
                    .ok_or_else(|| FilterParseError::UnknownAttribute(key.to_string()))?;
                attributes.push((tag, value.to_string()));
            }
        }
        if ae_title.is_none() && attributes.is_empty() {
            return Err(FilterParseError::Empty);
        }
        Ok(Self {
            ae_title,
            attributes,
        })
    }
}

impl DestinationFilter for AttributeFilter {
    fn matches(&self, calling_ae_title: &str, attributes: &InMemDicomObject) -> bool {
        if let Some(expected) = &self.ae_title {
            if calling_ae_title.trim() != expected {
                return false;
            }
        }
        self.attributes.iter().all(|(tag, expected)| {
            attributes
                .element(*tag)
                .ok()
                .and_then(|e| e.to_str().ok())
                .map(|actual| trim_padding(&actual) == expected)
                .unwrap_or(false)
        })
    }

    fn needs_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }
}

fn trim_padding(value: &str) -> &str {
    value.trim_matches(|c: char| c == '\0' || c.is_whitespace())
}
