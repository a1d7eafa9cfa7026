//! addon-status - aggregate health for composite Kubernetes resources
//!
//! A declarative controller applies a manifest of child objects on behalf of
//! an owner resource. This crate turns the live state of those children into
//! a single phase, a `healthy` flag and a normalized `Ready` condition on the
//! owner's status.
//!
//! # Modules
//!
//! - [`crd`] - Status types (conditions, common status, child references)
//! - [`kstatus`] - Generic status computation for arbitrary objects
//! - [`status`] - Per-kind dispatch, aggregation and the status writer
//! - [`telemetry`] - Tracing subscriber setup
//! - [`error`] - Error types

#![deny(missing_docs)]

pub mod crd;
pub mod error;
pub mod kstatus;
pub mod status;
pub mod telemetry;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Field manager used for status patches
pub const DEFAULT_FIELD_MANAGER: &str = "addon-status";
