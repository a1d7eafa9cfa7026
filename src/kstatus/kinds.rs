//! Built-in status rules for well-known kinds

use kube::api::DynamicObject;
use kube::core::GroupVersionKind;

use super::{find_condition, get_conditions, nested_i64, nested_str, nested_value, ComputeResult};
use crate::crd::ConditionStatus;
use crate::Error;

type Rule = fn(&DynamicObject) -> Result<ComputeResult, Error>;

/// Look up the built-in rule for a kind, by group and kind only
pub(super) fn rule_for(gvk: &GroupVersionKind) -> Option<Rule> {
    let rule: Rule = match (gvk.group.as_str(), gvk.kind.as_str()) {
        ("apps", "Deployment") => deployment,
        ("apps", "StatefulSet") => stateful_set,
        ("apps", "DaemonSet") => daemon_set,
        ("apps", "ReplicaSet") => replica_set,
        ("", "Pod") => pod,
        ("", "PersistentVolumeClaim") => pvc,
        ("", "Service") => service,
        ("batch", "Job") => job,
        ("apiextensions.k8s.io", "CustomResourceDefinition") => crd,
        _ => return None,
    };
    Some(rule)
}

fn int_or_zero(obj: &DynamicObject, path: &[&str]) -> Result<i64, Error> {
    Ok(nested_i64(obj, path)?.unwrap_or(0))
}

fn spec_replicas(obj: &DynamicObject) -> Result<i64, Error> {
    Ok(nested_i64(obj, &["spec", "replicas"])?.unwrap_or(1))
}

fn deployment(obj: &DynamicObject) -> Result<ComputeResult, Error> {
    let conditions = get_conditions(obj)?;

    let mut progressing = false;
    let mut available = false;
    for c in &conditions {
        match c.type_.as_str() {
            "Progressing" if c.reason == "ProgressDeadlineExceeded" => {
                return Ok(ComputeResult::failed(
                    "ProgressDeadlineExceeded",
                    "Progress deadline exceeded",
                ));
            }
            "Progressing" => {
                progressing =
                    c.status == ConditionStatus::True && c.reason == "NewReplicaSetAvailable";
            }
            "Available" => available = c.status == ConditionStatus::True,
            _ => {}
        }
    }

    let spec = spec_replicas(obj)?;
    let replicas = int_or_zero(obj, &["status", "replicas"])?;
    let ready = int_or_zero(obj, &["status", "readyReplicas"])?;
    let updated = int_or_zero(obj, &["status", "updatedReplicas"])?;
    let avail = int_or_zero(obj, &["status", "availableReplicas"])?;

    if spec > replicas {
        return Ok(ComputeResult::in_progress(
            "LessReplicas",
            format!("Replicas: {replicas}/{spec}"),
        ));
    }
    if spec > updated {
        return Ok(ComputeResult::in_progress(
            "LessUpdated",
            format!("Updated: {updated}/{spec}"),
        ));
    }
    if replicas > spec {
        return Ok(ComputeResult::in_progress(
            "ExtraPods",
            format!("Pending termination: {}", replicas.saturating_sub(spec)),
        ));
    }
    if updated > avail {
        return Ok(ComputeResult::in_progress(
            "LessAvailable",
            format!("Available: {avail}/{updated}"),
        ));
    }
    if spec > ready {
        return Ok(ComputeResult::in_progress(
            "LessReady",
            format!("Ready: {ready}/{spec}"),
        ));
    }
    if !progressing {
        return Ok(ComputeResult::in_progress(
            "ReplicaSetNotAvailable",
            "ReplicaSet not Available",
        ));
    }
    if !available {
        return Ok(ComputeResult::in_progress(
            "DeploymentNotAvailable",
            "Deployment not Available",
        ));
    }

    Ok(ComputeResult::current(format!(
        "Deployment is available. Replicas: {replicas}"
    )))
}

fn stateful_set(obj: &DynamicObject) -> Result<ComputeResult, Error> {
    let spec = spec_replicas(obj)?;
    let ready = int_or_zero(obj, &["status", "readyReplicas"])?;
    let current = int_or_zero(obj, &["status", "currentReplicas"])?;
    let replicas = int_or_zero(obj, &["status", "replicas"])?;

    if spec > ready {
        return Ok(ComputeResult::in_progress(
            "LessReady",
            format!("Ready: {ready}/{spec}"),
        ));
    }
    if replicas > spec {
        return Ok(ComputeResult::in_progress(
            "ExtraPods",
            format!("Pending termination: {}", replicas.saturating_sub(spec)),
        ));
    }

    let current_revision = nested_str(obj, &["status", "currentRevision"])?;
    let update_revision = nested_str(obj, &["status", "updateRevision"])?;
    if current_revision != update_revision {
        return Ok(ComputeResult::in_progress(
            "RevisionMismatch",
            format!("Waiting for updated revision: {current}/{spec} replicas on current revision"),
        ));
    }

    Ok(ComputeResult::current(format!(
        "All replicas scheduled as expected. Replicas: {replicas}"
    )))
}

fn daemon_set(obj: &DynamicObject) -> Result<ComputeResult, Error> {
    let Some(desired) = nested_i64(obj, &["status", "desiredNumberScheduled"])? else {
        return Ok(ComputeResult::in_progress(
            "NoDesiredNumber",
            "Missing .status.desiredNumberScheduled",
        ));
    };
    let checks = [
        ("LessCurrent", "Current", "currentNumberScheduled"),
        ("LessUpdated", "Updated", "updatedNumberScheduled"),
        ("LessReady", "Ready", "numberReady"),
        ("LessAvailable", "Available", "numberAvailable"),
    ];
    for (reason, label, field) in checks {
        let have = int_or_zero(obj, &["status", field])?;
        if desired > have {
            return Ok(ComputeResult::in_progress(
                reason,
                format!("{label}: {have}/{desired}"),
            ));
        }
    }

    Ok(ComputeResult::current(format!(
        "All replicas scheduled as expected. Replicas: {desired}"
    )))
}

fn replica_set(obj: &DynamicObject) -> Result<ComputeResult, Error> {
    let conditions = get_conditions(obj)?;
    if find_condition(&conditions, "ReplicaFailure")
        .is_some_and(|c| c.status == ConditionStatus::True)
    {
        return Ok(ComputeResult::in_progress(
            "ReplicaFailure",
            "Replica Failure condition. Check Pods",
        ));
    }

    let spec = spec_replicas(obj)?;
    let replicas = int_or_zero(obj, &["status", "replicas"])?;
    let ready = int_or_zero(obj, &["status", "readyReplicas"])?;
    let available = int_or_zero(obj, &["status", "availableReplicas"])?;

    if spec > ready {
        return Ok(ComputeResult::in_progress(
            "LessReady",
            format!("Ready: {ready}/{spec}"),
        ));
    }
    if spec > available {
        return Ok(ComputeResult::in_progress(
            "LessAvailable",
            format!("Available: {available}/{spec}"),
        ));
    }
    if replicas > spec {
        return Ok(ComputeResult::in_progress(
            "ExtraPods",
            format!("Pending termination: {}", replicas.saturating_sub(spec)),
        ));
    }

    Ok(ComputeResult::current(format!(
        "ReplicaSet is available. Replicas: {replicas}"
    )))
}

fn pod(obj: &DynamicObject) -> Result<ComputeResult, Error> {
    let phase = nested_str(obj, &["status", "phase"])?.unwrap_or_default();
    match phase {
        "Succeeded" => return Ok(ComputeResult::current("Pod has completed successfully")),
        "Failed" => {
            return Ok(ComputeResult::failed(
                "PodFailed",
                "Pod has completed, but not successfully",
            ))
        }
        _ => {}
    }

    let conditions = get_conditions(obj)?;
    if phase == "Running"
        && find_condition(&conditions, "Ready").is_some_and(|c| c.status == ConditionStatus::True)
    {
        return Ok(ComputeResult::current("Pod is Ready"));
    }

    let crash_looping = nested_value(obj, &["status", "containerStatuses"])
        .and_then(|v| v.as_array())
        .is_some_and(|statuses| {
            statuses.iter().any(|s| {
                s.pointer("/state/waiting/reason").and_then(|r| r.as_str())
                    == Some("CrashLoopBackOff")
            })
        });
    if crash_looping {
        return Ok(ComputeResult::failed(
            "ContainerCrashLooping",
            "Containers are crash looping",
        ));
    }

    if phase == "Pending"
        && find_condition(&conditions, "PodScheduled")
            .is_some_and(|c| c.status == ConditionStatus::False && c.reason == "Unschedulable")
    {
        return Ok(ComputeResult::in_progress(
            "PodUnschedulable",
            "Pod could not be scheduled",
        ));
    }

    if phase.is_empty() {
        return Ok(ComputeResult::in_progress(
            "PodPhaseUnavailable",
            "Pod phase not available",
        ));
    }
    Ok(ComputeResult::in_progress(
        "PodNotReady",
        format!("Pod is in the {phase} phase"),
    ))
}

fn pvc(obj: &DynamicObject) -> Result<ComputeResult, Error> {
    match nested_str(obj, &["status", "phase"])? {
        Some("Bound") => Ok(ComputeResult::current("PVC is Bound")),
        phase => Ok(ComputeResult::in_progress(
            "NotBound",
            format!("PVC is not Bound. phase: {}", phase.unwrap_or_default()),
        )),
    }
}

fn service(obj: &DynamicObject) -> Result<ComputeResult, Error> {
    if nested_str(obj, &["spec", "type"])? == Some("LoadBalancer") {
        let has_ingress = nested_value(obj, &["status", "loadBalancer", "ingress"])
            .and_then(|v| v.as_array())
            .is_some_and(|ingress| !ingress.is_empty());
        if !has_ingress {
            return Ok(ComputeResult::in_progress(
                "NoIPAssigned",
                "LoadBalancer ingress not assigned",
            ));
        }
    }
    Ok(ComputeResult::current("Service is ready"))
}

fn job(obj: &DynamicObject) -> Result<ComputeResult, Error> {
    let conditions = get_conditions(obj)?;
    let succeeded = int_or_zero(obj, &["status", "succeeded"])?;
    let failed = int_or_zero(obj, &["status", "failed"])?;
    let active = int_or_zero(obj, &["status", "active"])?;

    if find_condition(&conditions, "Failed").is_some_and(|c| c.status == ConditionStatus::True) {
        return Ok(ComputeResult::failed(
            "JobFailed",
            format!("Job Failed. failed: {failed}"),
        ));
    }
    if find_condition(&conditions, "Complete").is_some_and(|c| c.status == ConditionStatus::True)
    {
        return Ok(ComputeResult::current(format!(
            "Job Completed. succeeded: {succeeded}"
        )));
    }
    if nested_value(obj, &["status", "startTime"]).is_none() {
        return Ok(ComputeResult::in_progress("JobNotStarted", "Job not started"));
    }

    Ok(ComputeResult::current(format!(
        "Job in progress. success:{succeeded}, active: {active}, failed: {failed}"
    )))
}

fn crd(obj: &DynamicObject) -> Result<ComputeResult, Error> {
    let conditions = get_conditions(obj)?;
    if find_condition(&conditions, "NamesAccepted")
        .is_some_and(|c| c.status == ConditionStatus::False)
    {
        return Ok(ComputeResult::failed(
            "NamesNotAccepted",
            "CRD names have not been accepted",
        ));
    }
    if find_condition(&conditions, "Established")
        .is_some_and(|c| c.status == ConditionStatus::True)
    {
        return Ok(ComputeResult::current("CRD is established"));
    }
    Ok(ComputeResult::in_progress("Installing", "Install in progress"))
}
