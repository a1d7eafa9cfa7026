//! Status types for composite resources
//!
//! The owner's condition list, its common status fields and the references
//! to the children its manifest declares.

mod manifest;
mod types;

pub use manifest::{kind_key, object_gvk, parse_api_version, ChildReference, Manifest, NamespacedName};
pub use types::{
    CommonStatus, Condition, ConditionStatus, CONDITION_READY, CONDITION_RECONCILING,
    CONDITION_STALLED,
};
