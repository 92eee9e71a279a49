//! Run-terminating error types
//!
//! These represent the conditions under which the run cannot safely continue, because they
//! indicate that the alignment, region and sequence inputs are not mutually consistent.
//! Recoverable per-region/per-contig conditions are handled with log diagnostics instead.
//!

use std::error;
use std::fmt;

#[derive(Debug, Eq, PartialEq)]
pub enum RefineError {
    /// A segment or region input record could not be interpreted
    MalformedInput(String),

    /// A reference/contig coordinate projection disagreed with the directly observed
    /// coordinate, meaning the alignment input contradicts itself
    MismatchedCoordinates(String),

    /// A non-ACGT/N character was found where strand-complemented sequence is required
    InvalidSequenceData(String),
}

impl fmt::Display for RefineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RefineError::MalformedInput(msg) => write!(f, "Malformed input: {msg}"),
            RefineError::MismatchedCoordinates(msg) => {
                write!(f, "Mismatched alignment coordinates: {msg}")
            }
            RefineError::InvalidSequenceData(msg) => write!(f, "Invalid sequence data: {msg}"),
        }
    }
}

impl error::Error for RefineError {}

pub type RefineResult<T> = Result<T, RefineError>;
