//! Generic status computation for arbitrary Kubernetes objects
//!
//! Classifies a `DynamicObject` as InProgress, Current, Failed or
//! Terminating from its metadata, its status fields and its conditions, and
//! can append the standard `Reconciling`/`Stalled` conditions that describe
//! that classification to the object itself.
//!
//! Evaluation order:
//! 1. a deletion timestamp means Terminating
//! 2. an observed generation behind the current generation means InProgress
//! 3. `Reconciling=True` means InProgress, `Stalled=True` means Failed
//! 4. built-in rules for well-known kinds (see [`kinds`])
//! 5. `Ready=False` means InProgress, anything else is Current

mod kinds;

use kube::api::DynamicObject;
use serde_json::Value;

use crate::crd::{
    object_gvk, Condition, ConditionStatus, CONDITION_READY, CONDITION_RECONCILING,
    CONDITION_STALLED,
};
use crate::Error;

/// Classification of a single object
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    /// The object is still converging towards its desired state
    InProgress,
    /// The object has reached its desired state
    Current,
    /// The object cannot reach its desired state without intervention
    Failed,
    /// The object is being deleted
    Terminating,
    /// The object's state could not be determined
    Unknown,
}

impl Status {
    /// String form written into the owner's phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "InProgress",
            Self::Current => "Current",
            Self::Failed => "Failed",
            Self::Terminating => "Terminating",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a status computation
#[derive(Clone, Debug, PartialEq)]
pub struct ComputeResult {
    /// Classification of the object
    pub status: Status,
    /// Why the object has this status
    pub message: String,
    /// Standard conditions describing the status (`Reconciling`, `Stalled`)
    pub conditions: Vec<Condition>,
}

impl ComputeResult {
    /// The object reached its desired state
    pub fn current(message: impl Into<String>) -> Self {
        Self {
            status: Status::Current,
            message: message.into(),
            conditions: Vec::new(),
        }
    }

    /// The object is converging; carries a `Reconciling=True` condition
    pub fn in_progress(reason: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            status: Status::InProgress,
            conditions: vec![Condition::untimed(
                CONDITION_RECONCILING,
                ConditionStatus::True,
                reason,
                message.clone(),
            )],
            message,
        }
    }

    /// The object is stuck; carries a `Stalled=True` condition
    pub fn failed(reason: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            status: Status::Failed,
            conditions: vec![Condition::untimed(
                CONDITION_STALLED,
                ConditionStatus::True,
                reason,
                message.clone(),
            )],
            message,
        }
    }

    /// The object is being deleted
    pub fn terminating(message: impl Into<String>) -> Self {
        Self {
            status: Status::Terminating,
            message: message.into(),
            conditions: Vec::new(),
        }
    }
}

/// Compute the status of an object
///
/// Fails only when a field the rules depend on has the wrong shape.
pub fn compute(obj: &DynamicObject) -> Result<ComputeResult, Error> {
    if let Some(result) = check_generic_properties(obj)? {
        return Ok(result);
    }

    if let Ok(gvk) = object_gvk(obj) {
        if let Some(rule) = kinds::rule_for(&gvk) {
            return rule(obj);
        }
    }

    let conditions = get_conditions(obj)?;
    if let Some(ready) = conditions.iter().find(|c| c.type_ == CONDITION_READY) {
        if ready.status == ConditionStatus::False {
            let message = if ready.message.is_empty() {
                "Resource not ready".to_string()
            } else {
                ready.message.clone()
            };
            return Ok(ComputeResult::in_progress("ResourceNotReady", message));
        }
    }

    Ok(ComputeResult::current("Resource is current"))
}

fn check_generic_properties(obj: &DynamicObject) -> Result<Option<ComputeResult>, Error> {
    if obj.metadata.deletion_timestamp.is_some() {
        return Ok(Some(ComputeResult::terminating(
            "Resource scheduled for deletion",
        )));
    }

    if let Some(result) = check_generation(obj)? {
        return Ok(Some(result));
    }

    let conditions = get_conditions(obj)?;
    for condition in &conditions {
        if condition.is_true(CONDITION_RECONCILING) {
            return Ok(Some(ComputeResult::in_progress(
                condition.reason.clone(),
                condition.message.clone(),
            )));
        }
        if condition.is_true(CONDITION_STALLED) {
            return Ok(Some(ComputeResult::failed(
                condition.reason.clone(),
                condition.message.clone(),
            )));
        }
    }

    Ok(None)
}

fn check_generation(obj: &DynamicObject) -> Result<Option<ComputeResult>, Error> {
    let Some(generation) = obj.metadata.generation else {
        return Ok(None);
    };
    let Some(observed) = nested_i64(obj, &["status", "observedGeneration"])? else {
        return Ok(None);
    };
    if observed == generation {
        return Ok(None);
    }

    let kind = obj.types.as_ref().map(|t| t.kind.as_str()).unwrap_or("resource");
    Ok(Some(ComputeResult::in_progress(
        "LatestGenerationNotObserved",
        format!("{kind} generation is {generation}, but latest observed generation is {observed}"),
    )))
}

/// Append the standard conditions for the object's computed status
///
/// A standard condition whose type the object already carries is skipped,
/// so existing entries are never rewritten or reordered.
pub fn augment(obj: &mut DynamicObject) -> Result<(), Error> {
    let result = compute(obj)?;
    let existing = get_conditions(obj)?;

    let missing: Vec<&Condition> = result
        .conditions
        .iter()
        .filter(|c| !existing.iter().any(|e| e.type_ == c.type_))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }

    if obj.data.is_null() {
        obj.data = Value::Object(Default::default());
    }
    let data = obj
        .data
        .as_object_mut()
        .ok_or_else(|| Error::compute("object body is not a map"))?;
    let status = data
        .entry("status")
        .or_insert_with(|| Value::Object(Default::default()));
    if status.is_null() {
        *status = Value::Object(Default::default());
    }
    let status = status
        .as_object_mut()
        .ok_or_else(|| Error::compute("status is not a map"))?;
    let conditions = status
        .entry("conditions")
        .or_insert_with(|| Value::Array(Vec::new()));
    if conditions.is_null() {
        *conditions = Value::Array(Vec::new());
    }
    let conditions = conditions
        .as_array_mut()
        .ok_or_else(|| Error::compute("status.conditions is not a list"))?;

    for condition in missing {
        conditions.push(serde_json::to_value(condition)?);
    }
    Ok(())
}

/// Read `status.conditions` in structured form
///
/// A missing list is empty; a list that does not parse as conditions is an
/// error.
pub fn get_conditions(obj: &DynamicObject) -> Result<Vec<Condition>, Error> {
    match nested(&obj.data, &["status", "conditions"]) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| Error::compute(format!("status.conditions: {e}"))),
    }
}

/// Find a condition by type
pub(crate) fn find_condition<'a>(conditions: &'a [Condition], type_: &str) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.type_ == type_)
}

fn nested<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |v, key| v.get(key))
}

pub(crate) fn nested_i64(obj: &DynamicObject, path: &[&str]) -> Result<Option<i64>, Error> {
    match nested(&obj.data, path) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v.as_i64().map(Some).ok_or_else(|| {
            Error::compute(format!(".{} is {}, expected an integer", path.join("."), v))
        }),
    }
}

pub(crate) fn nested_str<'a>(obj: &'a DynamicObject, path: &[&str]) -> Result<Option<&'a str>, Error> {
    match nested(&obj.data, path) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v.as_str().map(Some).ok_or_else(|| {
            Error::compute(format!(".{} is {}, expected a string", path.join("."), v))
        }),
    }
}

pub(crate) fn nested_value<'a>(obj: &'a DynamicObject, path: &[&str]) -> Option<&'a Value> {
    nested(&obj.data, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: serde_json::Value) -> DynamicObject {
        serde_json::from_value(value).unwrap()
    }

    fn widget(status: serde_json::Value) -> DynamicObject {
        object(json!({
            "apiVersion": "example.com/v1",
            "kind": "Widget",
            "metadata": {"name": "w", "namespace": "default", "generation": 2},
            "status": status
        }))
    }

    mod compute_generic {
        use super::*;

        #[test]
        fn object_without_status_is_current() {
            let obj = object(json!({
                "apiVersion": "v1",
                "kind": "ConfigMap",
                "metadata": {"name": "c", "namespace": "default"},
                "data": {"k": "v"}
            }));
            let result = compute(&obj).unwrap();
            assert_eq!(result.status, Status::Current);
            assert!(result.conditions.is_empty());
        }

        #[test]
        fn deletion_timestamp_means_terminating() {
            let obj = object(json!({
                "apiVersion": "v1",
                "kind": "ConfigMap",
                "metadata": {
                    "name": "c",
                    "namespace": "default",
                    "deletionTimestamp": "2024-01-01T00:00:00Z"
                }
            }));
            assert_eq!(compute(&obj).unwrap().status, Status::Terminating);
        }

        #[test]
        fn stale_observed_generation_is_in_progress() {
            let obj = widget(json!({"observedGeneration": 1}));
            let result = compute(&obj).unwrap();
            assert_eq!(result.status, Status::InProgress);
            assert_eq!(
                result.message,
                "Widget generation is 2, but latest observed generation is 1"
            );
            assert_eq!(result.conditions[0].type_, CONDITION_RECONCILING);
            assert_eq!(result.conditions[0].reason, "LatestGenerationNotObserved");
        }

        #[test]
        fn reconciling_condition_is_in_progress() {
            let obj = widget(json!({
                "observedGeneration": 2,
                "conditions": [
                    {"type": "Reconciling", "status": "True", "reason": "Rollout", "message": "waiting for rollout"}
                ]
            }));
            let result = compute(&obj).unwrap();
            assert_eq!(result.status, Status::InProgress);
            assert_eq!(result.message, "waiting for rollout");
        }

        #[test]
        fn stalled_condition_is_failed() {
            let obj = widget(json!({
                "conditions": [
                    {"type": "Stalled", "status": "True", "reason": "BadConfig", "message": "invalid image"}
                ]
            }));
            let result = compute(&obj).unwrap();
            assert_eq!(result.status, Status::Failed);
            assert_eq!(result.conditions[0].type_, CONDITION_STALLED);
            assert_eq!(result.conditions[0].reason, "BadConfig");
        }

        #[test]
        fn ready_false_is_in_progress() {
            let obj = widget(json!({
                "conditions": [{"type": "Ready", "status": "False", "message": "warming up"}]
            }));
            let result = compute(&obj).unwrap();
            assert_eq!(result.status, Status::InProgress);
            assert_eq!(result.message, "warming up");
        }

        #[test]
        fn false_standard_conditions_do_not_count() {
            let obj = widget(json!({
                "conditions": [
                    {"type": "Reconciling", "status": "False"},
                    {"type": "Stalled", "status": "False"},
                    {"type": "Ready", "status": "True"}
                ]
            }));
            assert_eq!(compute(&obj).unwrap().status, Status::Current);
        }

        #[test]
        fn non_standard_sibling_conditions_do_not_block_classification() {
            let obj = widget(json!({
                "conditions": [
                    {"type": "Reconciling", "status": "True", "message": "waiting for rollout"},
                    {"type": "Synced", "status": "Pending"},
                    {"message": "no type or status"}
                ]
            }));
            let result = compute(&obj).unwrap();
            assert_eq!(result.status, Status::InProgress);
            assert_eq!(result.message, "waiting for rollout");
        }

        #[test]
        fn malformed_conditions_are_an_error() {
            let obj = widget(json!({"conditions": "not-a-list"}));
            assert!(matches!(compute(&obj), Err(Error::Compute(_))));
        }

        #[test]
        fn malformed_observed_generation_is_an_error() {
            let obj = widget(json!({"observedGeneration": "two"}));
            assert!(compute(&obj).is_err());
        }
    }

    mod augment_conditions {
        use super::*;

        /// Story: Augmenting appends the standard condition for the computed status
        #[test]
        fn story_augment_appends_reconciling_for_in_progress() {
            let mut obj = widget(json!({
                "observedGeneration": 1,
                "conditions": [{"type": "Available", "status": "True"}]
            }));
            augment(&mut obj).unwrap();

            let conditions = get_conditions(&obj).unwrap();
            assert_eq!(conditions.len(), 2);
            assert_eq!(conditions[0].type_, "Available");
            assert_eq!(conditions[1].type_, CONDITION_RECONCILING);
            assert_eq!(conditions[1].status, ConditionStatus::True);
        }

        #[test]
        fn augment_creates_status_when_absent() {
            let mut obj = object(json!({
                "apiVersion": "apps/v1",
                "kind": "Deployment",
                "metadata": {"name": "web", "namespace": "default"},
                "spec": {"replicas": 2}
            }));
            augment(&mut obj).unwrap();
            let conditions = get_conditions(&obj).unwrap();
            assert_eq!(conditions.len(), 1);
            assert_eq!(conditions[0].type_, CONDITION_RECONCILING);
        }

        #[test]
        fn augment_skips_existing_condition_types() {
            let mut obj = widget(json!({
                "conditions": [
                    {"type": "Stalled", "status": "True", "reason": "Crash", "message": "first"}
                ]
            }));
            augment(&mut obj).unwrap();
            let conditions = get_conditions(&obj).unwrap();
            assert_eq!(conditions.len(), 1);
            assert_eq!(conditions[0].message, "first");
        }

        #[test]
        fn augment_leaves_current_objects_untouched() {
            let mut obj = widget(json!({"conditions": [{"type": "Ready", "status": "True"}]}));
            let before = obj.data.clone();
            augment(&mut obj).unwrap();
            assert_eq!(obj.data, before);
        }

        #[test]
        fn augment_rejects_non_map_status() {
            let mut obj = object(json!({
                "apiVersion": "v1",
                "kind": "PersistentVolumeClaim",
                "metadata": {"name": "data", "namespace": "default"},
                "status": ["bogus"]
            }));
            assert!(augment(&mut obj).is_err());
        }
    }

    #[test]
    fn status_strings_match_phase_names() {
        assert_eq!(Status::InProgress.to_string(), "InProgress");
        assert_eq!(Status::Current.to_string(), "Current");
        assert_eq!(Status::Failed.to_string(), "Failed");
        assert_eq!(Status::Terminating.to_string(), "Terminating");
        assert_eq!(Status::Unknown.to_string(), "Unknown");
    }
}
