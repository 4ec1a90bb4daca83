//! DICOM status vocabulary
//!
//! Status codes follow PS3.4 / PS3.7 conventions:
//! - `0x0000`: Success
//! - `0x0001`, `0xB000-0xBFFF`: Warning
//! - `0x0110`: Processing failure
//! - `0xA700-0xA7FF`: Refused / out of resources
//! - `0xC000-0xCFFF`: Cannot understand
//! - `0xFE00`: Cancel
//! - `0xFF00`, `0xFF01`: Pending

use std::fmt;

pub const SUCCESS: u16 = 0x0000;
pub const PROCESSING_FAILURE: u16 = 0x0110;
pub const UNABLE_TO_CALCULATE_NUMBER_OF_MATCHES: u16 = 0xA701;
pub const CANNOT_UNDERSTAND: u16 = 0xC000;
pub const CANCEL: u16 = 0xFE00;
pub const PENDING: u16 = 0xFF00;

/// DIMSE operation status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimseStatus {
    /// Operation completed successfully
    Success,
    /// Operation is pending (more responses to follow)
    Pending,
    /// Operation cancelled by user
    Cancel,
    /// Operation failed with error
    Failure(u16), // DICOM status code
    /// Warning occurred during operation
    Warning(u16), // DICOM status code
}

impl DimseStatus {
    /// Classify a raw status code.
    pub fn from_code(code: u16) -> Self {
        match code {
            SUCCESS => DimseStatus::Success,
            PENDING | 0xFF01 => DimseStatus::Pending,
            CANCEL => DimseStatus::Cancel,
            0x0001 | 0x0107 | 0x0116 | 0xB000..=0xBFFF => DimseStatus::Warning(code),
            _ => DimseStatus::Failure(code),
        }
    }

    /// The raw status code written into the response command set.
    pub fn code(&self) -> u16 {
        match self {
            DimseStatus::Success => SUCCESS,
            DimseStatus::Pending => PENDING,
            DimseStatus::Cancel => CANCEL,
            DimseStatus::Failure(code) | DimseStatus::Warning(code) => *code,
        }
    }

    /// Success or warning
    pub fn is_success(&self) -> bool {
        matches!(self, DimseStatus::Success | DimseStatus::Warning(_))
    }
}

impl fmt::Display for DimseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimseStatus::Success => write!(f, "Success"),
            DimseStatus::Pending => write!(f, "Pending"),
            DimseStatus::Cancel => write!(f, "Cancel"),
            DimseStatus::Failure(code) => write!(f, "Failure(0x{:04X})", code),
            DimseStatus::Warning(code) => write!(f, "Warning(0x{:04X})", code),
        }
    }
}
