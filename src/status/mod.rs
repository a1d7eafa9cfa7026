//! Aggregate status of a composite resource
//!
//! A status pass reads the live state of every child in the owner's
//! manifest, classifies each one, merges the classifications by precedence
//! and writes the resulting phase and `Ready` condition back to the owner.
//!
//! The per-kind behavior is configured through [`StatusMethods`]; fetching
//! children and persisting status go through the [`LiveObjectAccessor`] and
//! [`StatusWriter`] traits.

mod abnormal;
mod aggregate;
mod builder;
mod client;
mod common;
mod conditions;
mod methods;

pub use abnormal::{abnormal_conditions, object_identity};
pub use aggregate::{aggregate_status, precedence};
pub use builder::{
    KnownErrorKind, KstatusAggregator, ReconcileFailure, StatusInfo, PHASE_APPLYING,
    PHASE_INTERNAL_ERROR, PHASE_VERSION_MISMATCH,
};
pub use client::{KubeLiveObjects, KubeStatusWriter, LiveObjectAccessor, StatusWriter};
pub use common::{get_common_status, set_common_status};
pub use conditions::{
    build_ready_condition, get_conditions, set_conditions, set_status_condition,
    REASON_MANIFESTS_NOT_READY, REASON_NORMAL,
};
pub use methods::{AbnormalConditionsFn, ComputeFn, StatusMethods};
