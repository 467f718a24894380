//! Typed errors shared by readers, converters, the convolver and devices.
//!
//! Construction-time failures (incompatible specs, bad parameters, sink
//! open errors) surface through [`Error`]; runtime read failures never do —
//! a failing reader reports zero frames and end-of-stream instead.

use thiserror::Error;

/// Result alias used by every fallible constructor and factory.
pub type Result<T> = std::result::Result<T, Error>;

/// The engine-wide error taxonomy.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Incompatible channel/rate/format combination or invalid parameter.
    #[error("incompatible specs: {reason}")]
    Specs {
        /// What combination was rejected.
        reason: String,
    },
    /// Input data could not be opened or parsed.
    #[error("unreadable input: {reason}")]
    File {
        /// What failed while opening or parsing.
        reason: String,
    },
    /// Output device open/context failure.
    #[error("device failure: {reason}")]
    Device {
        /// What the backend reported.
        reason: String,
    },
    /// Allocation or FFT plan failure.
    #[error("allocation failure: {reason}")]
    Memory {
        /// What could not be allocated.
        reason: String,
    },
}

impl Error {
    pub fn specs(reason: impl Into<String>) -> Self {
        Self::Specs {
            reason: reason.into(),
        }
    }

    pub fn file(reason: impl Into<String>) -> Self {
        Self::File {
            reason: reason.into(),
        }
    }

    pub fn device(reason: impl Into<String>) -> Self {
        Self::Device {
            reason: reason.into(),
        }
    }

    pub fn memory(reason: impl Into<String>) -> Self {
        Self::Memory {
            reason: reason.into(),
        }
    }
}
