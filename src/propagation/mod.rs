//! Carrying span contexts across transport boundaries.
//!
//! A carrier is the flat string-keyed structure that moves a
//! [`SpanContext`] across a process boundary, typically a request header
//! map. The [`Injector`] and [`Extractor`] traits adapt concrete carrier
//! types; [`HeaderCodec`] does the actual encoding and decoding over a
//! reserved key namespace.
//!
//! Extraction is the only fallible operation in this crate, and both of its
//! failure modes are recoverable: a request without upstream trace headers
//! yields [`ExtractError::Missing`] and the caller starts a new root; corrupt
//! headers yield [`ExtractError::Malformed`] and the caller should log and
//! likewise fall back to a new root. Neither is ever fatal to the request.
//!
//! [`SpanContext`]: crate::trace::SpanContext
use std::collections::HashMap;
use thiserror::Error;

mod codec;

pub use codec::HeaderCodec;

/// Errors returned when a carrier cannot be decoded into a span context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExtractError {
    /// The mandatory trace-id/span-id keys are absent from the carrier.
    ///
    /// This is the normal case for a request with no upstream trace; treat
    /// it as "start a new root", not as a failure.
    #[error("no span context found in carrier")]
    Missing,

    /// A mandatory key is present but not parseable as the expected format.
    #[error("span context field `{0}` in carrier is malformed")]
    Malformed(&'static str),
}

/// Injector provides an interface for adding fields to an underlying struct
/// like `HashMap`.
pub trait Injector {
    /// Add a key and value to the underlying data.
    fn set(&mut self, key: &str, value: String);
}

/// Extractor provides an interface for reading fields from an underlying
/// struct like `HashMap`.
pub trait Extractor {
    /// Get a value for a key from the underlying data.
    fn get(&self, key: &str) -> Option<&str>;

    /// Collect all the keys from the underlying data.
    fn keys(&self) -> Vec<&str>;
}

impl<S: std::hash::BuildHasher> Injector for HashMap<String, String, S> {
    /// Set a key and value in the HashMap.
    ///
    /// Keys are lowercased, matching the case-insensitivity of HTTP header
    /// names.
    fn set(&mut self, key: &str, value: String) {
        self.insert(key.to_lowercase(), value);
    }
}

impl<S: std::hash::BuildHasher> Extractor for HashMap<String, String, S> {
    /// Get a value for a key from the HashMap.
    fn get(&self, key: &str) -> Option<&str> {
        self.get(&key.to_lowercase()).map(|v| v.as_str())
    }

    /// Collect all the keys from the HashMap.
    fn keys(&self) -> Vec<&str> {
        self.keys().map(|k| k.as_str()).collect()
    }
}
