//! DICOMweb URL checks applied at configuration time
//!
//! URLs pointing at the Google Cloud Healthcare API must follow its resource
//! layout exactly. For other servers the only check is that a root URL does
//! not already include the `studies` resource, since the client appends it.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

pub const HEALTHCARE_API_ROOT: &str = "https://healthcare.googleapis.com";

const DICOMWEB_PATH: &str = r"https://healthcare\.googleapis\.com/.*?/projects/.*?/locations/.*?/datasets/.*?/dicomStores/.*?/dicomWeb";

static DICOMWEB_ROOT: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^{}$", DICOMWEB_PATH)).expect("static DICOMweb path pattern"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathValidationError {
    #[error("Path: {0} is not a valid Google Healthcare Api dicomWeb root path")]
    NotHealthcareApiPath(String),

    #[error("Path: {0} is not dicomWeb root (ends with 'studies')")]
    EndsWithStudies(String),
}

/// Check a URL meant as a DICOMweb service root, e.g. a destination URL.
pub fn validate_root_url(url: &str) -> Result<(), PathValidationError> {
    if url.starts_with(HEALTHCARE_API_ROOT) {
        if !DICOMWEB_ROOT.is_match(url) {
            return Err(PathValidationError::NotHealthcareApiPath(url.to_string()));
        }
    } else if url.trim_end_matches('/').ends_with("studies") {
        return Err(PathValidationError::EndsWithStudies(url.to_string()));
    }
    Ok(())
}
