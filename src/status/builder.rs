//! Building the owner's status from its children
//!
//! One pass reads the owner's current status, applies any known reconcile
//! error, scans the manifest's children in order, and writes back the
//! aggregate phase, the `healthy` flag, the observed generation and the
//! `Ready` condition.

use std::collections::HashSet;
use std::sync::Arc;

use kube::api::DynamicObject;
use kube::ResourceExt;
use tracing::{debug, error, info, instrument, warn};

use super::aggregate::aggregate_status;
use super::client::{LiveObjectAccessor, StatusWriter};
use super::common::{get_common_status, set_common_status};
use super::conditions::{build_ready_condition, get_conditions, set_conditions, set_status_condition};
use super::methods::StatusMethods;
use crate::crd::{Condition, Manifest};
use crate::kstatus::Status;
use crate::Error;

/// Phase while an apply failed but children may still be inspected
pub const PHASE_APPLYING: &str = "Applying";
/// Phase when the owner's version check failed
pub const PHASE_VERSION_MISMATCH: &str = "VersionMismatch";
/// Phase for any other reconcile failure
pub const PHASE_INTERNAL_ERROR: &str = "InternalError";

/// Classification of a failure in the reconcile pass preceding a status pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KnownErrorKind {
    /// Applying the manifest failed
    ApplyFailed,
    /// The owner's requested version is not supported
    VersionCheckFailed,
    /// Any other failure
    #[default]
    Other,
}

impl KnownErrorKind {
    /// Phase the owner takes when this failure is reported
    pub fn phase(&self) -> &'static str {
        match self {
            Self::ApplyFailed => PHASE_APPLYING,
            Self::VersionCheckFailed => PHASE_VERSION_MISMATCH,
            Self::Other => PHASE_INTERNAL_ERROR,
        }
    }

    /// Whether children are still scanned after this failure
    pub fn computes_from_objects(&self) -> bool {
        matches!(self, Self::ApplyFailed)
    }
}

/// A failure reported by the reconcile pass
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconcileFailure {
    /// What kind of failure it was
    pub kind: KnownErrorKind,
    /// Rendered error
    pub message: String,
}

impl ReconcileFailure {
    /// Create a failure from any displayable error
    pub fn new(kind: KnownErrorKind, error: impl std::fmt::Display) -> Self {
        Self {
            kind,
            message: error.to_string(),
        }
    }
}

/// Inputs of one status pass
pub struct StatusInfo<'a> {
    /// The owner whose status is built; updated in place
    pub subject: &'a mut DynamicObject,
    /// Children the owner manages, if the manifest was rendered
    pub manifest: Option<&'a Manifest>,
    /// Access to the children's live state, if available
    pub live_objects: Option<&'a dyn LiveObjectAccessor>,
    /// Failure from the reconcile pass, if any
    pub error: Option<ReconcileFailure>,
}

impl<'a> StatusInfo<'a> {
    /// Create inputs for an owner with no manifest, accessor or error
    pub fn new(subject: &'a mut DynamicObject) -> Self {
        Self {
            subject,
            manifest: None,
            live_objects: None,
            error: None,
        }
    }

    /// Set the manifest and return self for chaining
    pub fn manifest(mut self, manifest: &'a Manifest) -> Self {
        self.manifest = Some(manifest);
        self
    }

    /// Set the live object accessor and return self for chaining
    pub fn live_objects(mut self, live_objects: &'a dyn LiveObjectAccessor) -> Self {
        self.live_objects = Some(live_objects);
        self
    }

    /// Set the reconcile failure and return self for chaining
    pub fn error(mut self, error: ReconcileFailure) -> Self {
        self.error = Some(error);
        self
    }
}

/// Builds owner status from the kstatus classification of its children
pub struct KstatusAggregator {
    methods: Arc<StatusMethods>,
    writer: Arc<dyn StatusWriter>,
}

impl KstatusAggregator {
    /// Create an aggregator with per-kind overrides
    pub fn new(methods: Arc<StatusMethods>, writer: Arc<dyn StatusWriter>) -> Self {
        Self { methods, writer }
    }

    /// Create an aggregator that uses the default methods for every kind
    pub fn with_defaults(writer: Arc<dyn StatusWriter>) -> Self {
        Self::new(Arc::new(StatusMethods::default()), writer)
    }

    /// Build and persist the owner's status
    ///
    /// Only failures to read or write the owner's own status are returned.
    /// Failures fetching or classifying a child make that child Unknown.
    #[instrument(skip_all, fields(owner = %info.subject.name_any()))]
    pub async fn build_status(&self, info: StatusInfo<'_>) -> Result<(), Error> {
        let StatusInfo {
            subject,
            manifest,
            live_objects,
            error,
        } = info;

        let mut current = get_common_status(subject).inspect_err(|e| {
            error!(error = %e, "error retrieving status");
        })?;
        let mut conditions = get_conditions(subject).inspect_err(|e| {
            error!(error = %e, "error retrieving status.conditions");
        })?;

        let mut targets = manifest.zip(live_objects);
        if let Some(failure) = &error {
            current.phase = failure.kind.phase().to_string();
            if !failure.kind.computes_from_objects() {
                targets = None;
            }
            warn!(
                kind = ?failure.kind,
                error = %failure.message,
                phase = %current.phase,
                "reconcile reported an error"
            );
        }

        if let Some((manifest, live_objects)) = targets {
            let (statuses, abnormal) = self.scan_children(manifest, live_objects).await;

            let aggregated = aggregate_status(statuses);
            let ready = build_ready_condition(aggregated == Status::Current, &abnormal);
            set_status_condition(&mut conditions, ready);

            current.phase = aggregated.to_string();
            set_conditions(subject, &conditions)?;
        }

        current.healthy = current.phase == Status::Current.as_str();
        current.observed_generation = subject.metadata.generation.unwrap_or(0);
        set_common_status(subject, &current)?;
        self.writer.write_status(subject).await?;

        info!(
            phase = %current.phase,
            healthy = current.healthy,
            observed_generation = current.observed_generation,
            "status updated"
        );
        Ok(())
    }

    /// Classify every child in manifest order
    ///
    /// Returns the set of statuses seen and the abnormal conditions in
    /// manifest order.
    async fn scan_children(
        &self,
        manifest: &Manifest,
        live_objects: &dyn LiveObjectAccessor,
    ) -> (HashSet<Status>, Vec<Condition>) {
        let mut statuses = HashSet::new();
        let mut abnormal = Vec::new();

        for child in &manifest.items {
            let key = child.kind_key();
            let kind = child.gvk.kind.as_str();
            let namespace = child.object.namespace.as_str();
            let name = child.object.name.as_str();

            let obj = match live_objects.get(&child.gvk, &child.object).await {
                Ok(obj) => obj,
                Err(e) => {
                    warn!(
                        kind, namespace, name,
                        error = %e,
                        "unable to get object to determine status"
                    );
                    statuses.insert(Status::Unknown);
                    continue;
                }
            };

            match self.methods.compute_method(&key)(&obj) {
                Ok(Some(result)) => {
                    debug!(
                        kind, namespace, name,
                        status = %result.status,
                        message = %result.message,
                        "computed status of resource"
                    );
                    statuses.insert(result.status);
                }
                Ok(None) => {
                    debug!(kind, namespace, name, "resource status was empty");
                    statuses.insert(Status::Unknown);
                }
                Err(e) => {
                    warn!(
                        kind, namespace, name,
                        error = %e,
                        "error computing status of resource"
                    );
                    statuses.insert(Status::Unknown);
                }
            }

            abnormal.extend(self.methods.abnormal_conditions_method(&key)(&obj));
        }

        (statuses, abnormal)
    }
}
