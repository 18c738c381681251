//! Identification codes stamped into the label.
//!
//! A code is either supplied by the caller or derived with one of two
//! strategies. The calling context picks the strategy; nothing is negotiated.
//!
//! | Strategy | Length | Reproducible | Used by |
//! |---|---|---|---|
//! | explicit | any | yes | `stamp --code`, `batch --codes stem` |
//! | random-short | 8 hex | no | `stamp` without a code |
//! | content-derived | 6 hex | yes, from the file name | `batch` (default), with audit log |
//!
//! Content-derived codes are the first six hex digits of the MD5 of the
//! original file name (the name, not the file contents). Codes issued by
//! earlier tooling used the same digest, so re-running a batch reproduces
//! them.

use md5::{Digest, Md5};
use uuid::Uuid;

/// How to obtain the code for one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeStrategy {
    /// Used verbatim.
    Explicit(String),
    /// Fresh random code per call.
    RandomShort,
    /// Hash of the original file name.
    ContentDerived { filename: String },
}

impl CodeStrategy {
    pub fn resolve(&self) -> String {
        match self {
            Self::Explicit(code) => code.clone(),
            Self::RandomShort => random_short(),
            Self::ContentDerived { filename } => content_derived(filename),
        }
    }

    /// Whether the code should be recorded in an audit log.
    pub fn is_content_derived(&self) -> bool {
        matches!(self, Self::ContentDerived { .. })
    }
}

/// 8 hex characters of a v4 UUID.
pub fn random_short() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

/// 6 hex characters of MD5(`filename`).
pub fn content_derived(filename: &str) -> String {
    let mut hash = format!("{:x}", Md5::digest(filename.as_bytes()));
    hash.truncate(6);
    hash
}

/// An explicit code wins unchanged, even when empty; otherwise `fallback`
/// decides.
pub fn resolve_code(explicit: Option<&str>, fallback: &CodeStrategy) -> String {
    match explicit {
        Some(code) => code.to_string(),
        None => fallback.resolve(),
    }
}
