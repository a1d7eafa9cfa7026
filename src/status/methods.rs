//! Per-kind dispatch of status computation and abnormal condition extraction
//!
//! Controllers register overrides by exact kind identifier (see
//! [`crate::crd::kind_key`]) before building the aggregator. Kinds without
//! an override use [`kstatus::compute`] and [`abnormal_conditions`]. There is
//! no wildcard or group-level matching.

use std::collections::HashMap;
use std::sync::Arc;

use kube::api::DynamicObject;
use kube::core::GroupVersionKind;

use super::abnormal::abnormal_conditions;
use crate::crd::{kind_key, Condition};
use crate::kstatus::{self, ComputeResult};
use crate::Error;

/// Computes the status of one object; `Ok(None)` means no status could be derived
pub type ComputeFn =
    Arc<dyn Fn(&DynamicObject) -> Result<Option<ComputeResult>, Error> + Send + Sync>;

/// Extracts the abnormal conditions of one object
pub type AbnormalConditionsFn = Arc<dyn Fn(&DynamicObject) -> Vec<Condition> + Send + Sync>;

type ComputeRef<'a> = &'a (dyn Fn(&DynamicObject) -> Result<Option<ComputeResult>, Error> + Send + Sync);
type AbnormalRef<'a> = &'a (dyn Fn(&DynamicObject) -> Vec<Condition> + Send + Sync);

fn default_compute(obj: &DynamicObject) -> Result<Option<ComputeResult>, Error> {
    kstatus::compute(obj).map(Some)
}

/// Dispatch table from kind identifier to status methods
///
/// Built once at controller construction and shared read-only afterwards.
#[derive(Clone, Default)]
pub struct StatusMethods {
    compute: HashMap<String, ComputeFn>,
    abnormal_conditions: HashMap<String, AbnormalConditionsFn>,
}

impl StatusMethods {
    /// Create a table with no overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Override status computation for a kind
    pub fn with_compute<F>(self, gvk: &GroupVersionKind, method: F) -> Self
    where
        F: Fn(&DynamicObject) -> Result<Option<ComputeResult>, Error> + Send + Sync + 'static,
    {
        self.with_compute_for_key(kind_key(gvk), method)
    }

    /// Override status computation for a raw kind identifier
    pub fn with_compute_for_key<F>(mut self, key: impl Into<String>, method: F) -> Self
    where
        F: Fn(&DynamicObject) -> Result<Option<ComputeResult>, Error> + Send + Sync + 'static,
    {
        self.compute.insert(key.into(), Arc::new(method));
        self
    }

    /// Override abnormal condition extraction for a kind
    pub fn with_abnormal_conditions<F>(self, gvk: &GroupVersionKind, method: F) -> Self
    where
        F: Fn(&DynamicObject) -> Vec<Condition> + Send + Sync + 'static,
    {
        self.with_abnormal_conditions_for_key(kind_key(gvk), method)
    }

    /// Override abnormal condition extraction for a raw kind identifier
    pub fn with_abnormal_conditions_for_key<F>(mut self, key: impl Into<String>, method: F) -> Self
    where
        F: Fn(&DynamicObject) -> Vec<Condition> + Send + Sync + 'static,
    {
        self.abnormal_conditions.insert(key.into(), Arc::new(method));
        self
    }

    /// Resolve the status computation for a kind identifier
    pub fn compute_method(&self, key: &str) -> ComputeRef<'_> {
        match self.compute.get(key) {
            Some(method) => method.as_ref(),
            None => &default_compute,
        }
    }

    /// Resolve the abnormal condition extraction for a kind identifier
    pub fn abnormal_conditions_method(&self, key: &str) -> AbnormalRef<'_> {
        match self.abnormal_conditions.get(key) {
            Some(method) => method.as_ref(),
            None => &abnormal_conditions,
        }
    }
}

impl std::fmt::Debug for StatusMethods {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut compute: Vec<_> = self.compute.keys().collect();
        compute.sort();
        let mut abnormal: Vec<_> = self.abnormal_conditions.keys().collect();
        abnormal.sort();
        f.debug_struct("StatusMethods")
            .field("compute", &compute)
            .field("abnormal_conditions", &abnormal)
            .finish()
    }
}
