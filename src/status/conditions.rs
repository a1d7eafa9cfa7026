//! The owner's condition list and its `Ready` condition

use chrono::Utc;
use kube::api::DynamicObject;
use serde_json::Value;

use super::common::{status_map, status_map_mut};
use crate::crd::{Condition, ConditionStatus, CONDITION_READY};
use crate::Error;

/// Reason on `Ready` when every manifest object is current
pub const REASON_NORMAL: &str = "Normal";
/// Reason on `Ready` when some manifest object is not current
pub const REASON_MANIFESTS_NOT_READY: &str = "ManifestsNotReady";

const MESSAGE_READY: &str = "all manifests are reconciled";
const MESSAGE_NOT_READY: &str = "manifests are not ready";

/// Build the `Ready` condition from the aggregate readiness
///
/// The message summarizes the abnormal conditions in the order they were
/// collected.
pub fn build_ready_condition(ready: bool, abnormal: &[Condition]) -> Condition {
    let reason = if ready {
        REASON_NORMAL
    } else {
        REASON_MANIFESTS_NOT_READY
    };
    let message = if abnormal.is_empty() {
        let summary = if ready { MESSAGE_READY } else { MESSAGE_NOT_READY };
        summary.to_string()
    } else {
        abnormal
            .iter()
            .map(|c| c.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    };
    Condition::untimed(
        CONDITION_READY,
        ConditionStatus::from_bool(ready),
        reason,
        message,
    )
}

/// Upsert a condition by type
///
/// An existing condition of the same type is updated in place; its
/// transition time only moves when the status changes. A new type is
/// appended. Returns true if the list changed.
pub fn set_status_condition(conditions: &mut Vec<Condition>, new: Condition) -> bool {
    let now = new.last_transition_time.unwrap_or_else(Utc::now);

    let Some(existing) = conditions.iter_mut().find(|c| c.type_ == new.type_) else {
        conditions.push(Condition {
            last_transition_time: Some(now),
            ..new
        });
        return true;
    };

    let mut changed = false;
    if existing.status != new.status {
        existing.status = new.status;
        existing.last_transition_time = Some(now);
        changed = true;
    }
    if existing.last_transition_time.is_none() {
        existing.last_transition_time = Some(now);
        changed = true;
    }
    if existing.reason != new.reason {
        existing.reason = new.reason;
        changed = true;
    }
    if existing.message != new.message {
        existing.message = new.message;
        changed = true;
    }
    changed
}

/// Read the owner's `status.conditions`
pub fn get_conditions(subject: &DynamicObject) -> Result<Vec<Condition>, Error> {
    let Some(status) = status_map(subject)? else {
        return Ok(Vec::new());
    };
    match status.get("conditions") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| Error::invalid_status(format!("status.conditions: {e}"))),
    }
}

/// Replace the owner's `status.conditions`
pub fn set_conditions(subject: &mut DynamicObject, conditions: &[Condition]) -> Result<(), Error> {
    let value = serde_json::to_value(conditions)?;
    status_map_mut(subject)?.insert("conditions".to_string(), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn abnormal(message: &str) -> Condition {
        Condition::untimed("Reconciling", ConditionStatus::True, "Rollout", message)
    }

    mod ready_condition {
        use super::*;

        #[test]
        fn ready_without_abnormal_conditions() {
            let ready = build_ready_condition(true, &[]);
            assert_eq!(ready.type_, "Ready");
            assert_eq!(ready.status, ConditionStatus::True);
            assert_eq!(ready.reason, REASON_NORMAL);
            assert_eq!(ready.message, "all manifests are reconciled");
        }

        #[test]
        fn not_ready_summarizes_in_order() {
            let ready = build_ready_condition(
                false,
                &[abnormal("a/ns/one: waiting"), abnormal("b/ns/two: stuck")],
            );
            assert_eq!(ready.status, ConditionStatus::False);
            assert_eq!(ready.reason, REASON_MANIFESTS_NOT_READY);
            assert_eq!(ready.message, "a/ns/one: waiting; b/ns/two: stuck");
        }

        #[test]
        fn not_ready_without_abnormal_conditions_has_generic_message() {
            let ready = build_ready_condition(false, &[]);
            assert_eq!(ready.message, "manifests are not ready");
        }
    }

    mod upsert {
        use super::*;

        fn at(seconds: i64) -> Option<chrono::DateTime<Utc>> {
            Some(Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(seconds))
        }

        fn list() -> Vec<Condition> {
            vec![
                Condition {
                    last_transition_time: at(0),
                    ..Condition::untimed("Available", ConditionStatus::True, "", "")
                },
                Condition {
                    last_transition_time: at(0),
                    ..Condition::untimed("Ready", ConditionStatus::True, REASON_NORMAL, "ok")
                },
                Condition {
                    last_transition_time: at(0),
                    ..Condition::untimed("Degraded", ConditionStatus::False, "", "")
                },
            ]
        }

        /// Story: Upserting Ready twice replaces it in place
        ///
        /// The Ready entry keeps its position, is never duplicated, and the
        /// conditions around it keep their order.
        #[test]
        fn story_ready_is_replaced_in_place() {
            let mut conditions = list();

            assert!(set_status_condition(
                &mut conditions,
                build_ready_condition(false, &[abnormal("x: waiting")])
            ));
            assert!(set_status_condition(
                &mut conditions,
                build_ready_condition(true, &[])
            ));

            let types: Vec<_> = conditions.iter().map(|c| c.type_.as_str()).collect();
            assert_eq!(types, ["Available", "Ready", "Degraded"]);
            assert_eq!(conditions[1].status, ConditionStatus::True);
            assert_eq!(conditions[1].message, "all manifests are reconciled");
        }

        #[test]
        fn transition_time_moves_only_on_status_change() {
            let mut conditions = list();

            let same_status = Condition::untimed("Ready", ConditionStatus::True, "Other", "new");
            assert!(set_status_condition(&mut conditions, same_status));
            assert_eq!(conditions[1].last_transition_time, at(0));
            assert_eq!(conditions[1].message, "new");

            let flipped = Condition {
                last_transition_time: at(60),
                ..Condition::untimed("Ready", ConditionStatus::False, "Broken", "down")
            };
            assert!(set_status_condition(&mut conditions, flipped));
            assert_eq!(conditions[1].last_transition_time, at(60));
        }

        #[test]
        fn identical_condition_reports_no_change() {
            let mut conditions = list();
            let same = Condition::untimed("Ready", ConditionStatus::True, REASON_NORMAL, "ok");
            assert!(!set_status_condition(&mut conditions, same));
        }

        #[test]
        fn new_type_is_appended_with_timestamp() {
            let mut conditions = list();
            set_status_condition(
                &mut conditions,
                Condition::untimed("Progressing", ConditionStatus::True, "", ""),
            );
            assert_eq!(conditions.len(), 4);
            assert_eq!(conditions[3].type_, "Progressing");
            assert!(conditions[3].last_transition_time.is_some());
        }
    }

    mod subject_conditions {
        use super::*;

        fn owner(status: serde_json::Value) -> DynamicObject {
            serde_json::from_value(json!({
                "apiVersion": "addons.example.com/v1alpha1",
                "kind": "Dashboard",
                "metadata": {"name": "main", "namespace": "ops"},
                "status": status
            }))
            .unwrap()
        }

        #[test]
        fn conditions_round_trip_through_status() {
            let mut subject = owner(json!({"phase": "Applying"}));
            assert!(get_conditions(&subject).unwrap().is_empty());

            set_conditions(&mut subject, &[build_ready_condition(true, &[])]).unwrap();
            let conditions = get_conditions(&subject).unwrap();
            assert_eq!(conditions.len(), 1);
            assert_eq!(conditions[0].type_, "Ready");
            assert_eq!(subject.data["status"]["phase"], "Applying");
        }

        #[test]
        fn ready_upsert_preserves_fields_of_other_conditions() {
            let custom = json!({
                "type": "Custom",
                "status": "True",
                "reason": "R",
                "message": "m",
                "observedGeneration": 4,
                "severity": "Info"
            });
            let mut subject = owner(json!({"conditions": [custom.clone()]}));

            let mut conditions = get_conditions(&subject).unwrap();
            set_status_condition(&mut conditions, build_ready_condition(true, &[]));
            set_conditions(&mut subject, &conditions).unwrap();

            assert_eq!(subject.data["status"]["conditions"][0], custom);
            assert_eq!(subject.data["status"]["conditions"][1]["type"], "Ready");
        }

        /// Story: A corrupt condition list stops the pass
        #[test]
        fn story_malformed_conditions_are_invalid_status() {
            let subject = owner(json!({"conditions": {"Ready": true}}));
            assert!(matches!(
                get_conditions(&subject),
                Err(Error::InvalidStatus(_))
            ));
        }
    }
}
