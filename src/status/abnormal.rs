//! Abnormal condition extraction for child objects
//!
//! An abnormal condition is any condition describing a state other than
//! nominal. For the default extraction that is a trailing `Stalled` or
//! `Reconciling` condition after the object has been augmented with the
//! standard conditions of its computed status.

use kube::api::DynamicObject;
use kube::ResourceExt;
use tracing::error;

use crate::crd::{kind_key, object_gvk, Condition, CONDITION_RECONCILING, CONDITION_STALLED};
use crate::kstatus;

/// Default abnormal condition extraction
///
/// Works on a copy of the object, so the caller's object keeps its original
/// conditions. Failures are logged and yield no conditions.
pub fn abnormal_conditions(obj: &DynamicObject) -> Vec<Condition> {
    let mut augmented = obj.clone();
    if let Err(e) = kstatus::augment(&mut augmented) {
        error!(object = %object_identity(obj), error = %e, "unable to augment conditions");
        return Vec::new();
    }

    let conditions = match kstatus::get_conditions(&augmented) {
        Ok(conditions) => conditions,
        Err(e) => {
            error!(object = %object_identity(obj), error = %e, "unable to get conditions");
            return Vec::new();
        }
    };

    // Augmentation appends, so the newest standard condition is last
    let Some(last) = conditions.last() else {
        return Vec::new();
    };
    if last.type_ != CONDITION_STALLED && last.type_ != CONDITION_RECONCILING {
        return Vec::new();
    }

    vec![Condition::untimed(
        last.type_.clone(),
        last.status,
        last.reason.clone(),
        format!("{}: {}", object_identity(obj), last.message),
    )]
}

/// `{kind identifier}/{namespace}/{name}` of an object
pub fn object_identity(obj: &DynamicObject) -> String {
    let kind = object_gvk(obj)
        .map(|gvk| kind_key(&gvk))
        .unwrap_or_default();
    format!(
        "{}/{}/{}",
        kind,
        obj.namespace().unwrap_or_default(),
        obj.name_any()
    )
}
