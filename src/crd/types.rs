//! Status types shared by the aggregator and the status library

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Condition type reserved for the aggregate readiness of the owner
pub const CONDITION_READY: &str = "Ready";
/// Standard condition appended while a resource converges
pub const CONDITION_RECONCILING: &str = "Reconciling";
/// Standard condition appended when a resource cannot make progress
pub const CONDITION_STALLED: &str = "Stalled";

/// Condition status following Kubernetes conventions
///
/// Any status string other than True or False reads as Unknown.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum ConditionStatus {
    /// Condition is true
    True,
    /// Condition is false
    False,
    /// Condition status is unknown
    #[default]
    #[serde(other)]
    Unknown,
}

impl ConditionStatus {
    /// Map a boolean onto True/False
    pub fn from_bool(value: bool) -> Self {
        if value {
            Self::True
        } else {
            Self::False
        }
    }
}

impl std::fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::True => write!(f, "True"),
            Self::False => write!(f, "False"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Kubernetes-style condition for status reporting
///
/// Used both for the owner's condition list and for conditions read from
/// child objects. Every field may be absent on the way in, and fields this
/// type does not model are kept in `extra` so they survive a rewrite.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Condition {
    /// Type of condition (e.g., Ready, Reconciling)
    #[serde(rename = "type", default)]
    pub type_: String,

    /// Status of the condition (True, False, Unknown)
    #[serde(default)]
    pub status: ConditionStatus,

    /// Machine-readable reason for the condition
    #[serde(default)]
    pub reason: String,

    /// Human-readable message
    #[serde(default)]
    pub message: String,

    /// Last time the condition transitioned
    #[serde(
        rename = "lastTransitionTime",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_transition_time: Option<DateTime<Utc>>,

    /// Generation of the object the condition was set for
    #[serde(
        rename = "observedGeneration",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub observed_generation: Option<i64>,

    /// Fields not modeled above, passed through unchanged
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Condition {
    /// Create a new condition with the current timestamp
    pub fn new(
        type_: impl Into<String>,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            type_: type_.into(),
            status,
            reason: reason.into(),
            message: message.into(),
            last_transition_time: Some(Utc::now()),
            observed_generation: None,
            extra: BTreeMap::new(),
        }
    }

    /// Create a condition without a transition timestamp
    ///
    /// Computed conditions get their timestamp when they are merged into a
    /// condition list.
    pub fn untimed(
        type_: impl Into<String>,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            last_transition_time: None,
            ..Self::new(type_, status, reason, message)
        }
    }

    /// Returns true if this condition has the given type and status True
    pub fn is_true(&self, type_: &str) -> bool {
        self.type_ == type_ && self.status == ConditionStatus::True
    }
}

/// Status fields every composite resource carries
///
/// Merged into `.status` without touching any other field there.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommonStatus {
    /// Summarized phase of the owner (e.g., Current, InProgress, Applying)
    #[serde(default)]
    pub phase: String,

    /// True iff the phase is Current
    #[serde(default)]
    pub healthy: bool,

    /// Generation of the owner this status was computed for
    #[serde(default)]
    pub observed_generation: i64,
}

impl CommonStatus {
    /// Set the phase and return self for chaining
    pub fn phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = phase.into();
        self
    }
}
