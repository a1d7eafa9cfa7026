//! Collaborators of a status pass: fetching children and persisting status
//!
//! Both are traits so the aggregator can be exercised without a cluster.
//! The kube-backed implementations do no caching and no retries.

use async_trait::async_trait;
use kube::api::{Api, DynamicObject, Patch, PatchParams};
use kube::core::GroupVersionKind;
use kube::discovery::ApiResource;
use kube::Client;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use crate::crd::{object_gvk, NamespacedName};
use crate::{Error, DEFAULT_FIELD_MANAGER};

/// Fetches the live state of a child object
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LiveObjectAccessor: Send + Sync {
    /// Get the current state of an object
    ///
    /// # Arguments
    ///
    /// * `gvk` - Group, version and kind of the object
    /// * `object` - Namespace (empty for cluster-scoped) and name
    async fn get(
        &self,
        gvk: &GroupVersionKind,
        object: &NamespacedName,
    ) -> Result<DynamicObject, Error>;
}

/// Persists the owner's status subresource
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StatusWriter: Send + Sync {
    /// Write the owner's `.status` as it currently stands on `subject`
    async fn write_status(&self, subject: &DynamicObject) -> Result<(), Error>;
}

fn dynamic_api(client: &Client, gvk: &GroupVersionKind, namespace: Option<&str>) -> Api<DynamicObject> {
    let ar = ApiResource::from_gvk(gvk);
    match namespace {
        Some(ns) => Api::namespaced_with(client.clone(), ns, &ar),
        None => Api::all_with(client.clone(), &ar),
    }
}

/// Live object accessor backed by the Kubernetes API
pub struct KubeLiveObjects {
    client: Client,
}

impl KubeLiveObjects {
    /// Create a new KubeLiveObjects wrapping the given kube Client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LiveObjectAccessor for KubeLiveObjects {
    async fn get(
        &self,
        gvk: &GroupVersionKind,
        object: &NamespacedName,
    ) -> Result<DynamicObject, Error> {
        let api = dynamic_api(&self.client, gvk, object.namespace());
        let obj = api.get(&object.name).await?;
        debug!(kind = %gvk.kind, object = %object, "fetched live object");
        Ok(obj)
    }
}

/// Status writer that merge-patches the owner's status subresource
pub struct KubeStatusWriter {
    client: Client,
    params: PatchParams,
}

impl KubeStatusWriter {
    /// Create a new KubeStatusWriter wrapping the given kube Client
    pub fn new(client: Client) -> Self {
        Self {
            client,
            params: status_patch_params(DEFAULT_FIELD_MANAGER),
        }
    }

    /// Set the field manager recorded on status patches
    pub fn with_field_manager(mut self, field_manager: &str) -> Self {
        self.params = status_patch_params(field_manager);
        self
    }
}

/// Patch parameters recording `field_manager` as the status owner
fn status_patch_params(field_manager: &str) -> PatchParams {
    PatchParams::apply(field_manager)
}

#[async_trait]
impl StatusWriter for KubeStatusWriter {
    async fn write_status(&self, subject: &DynamicObject) -> Result<(), Error> {
        let gvk = object_gvk(subject)?;
        let name = subject
            .metadata
            .name
            .as_deref()
            .ok_or_else(|| Error::missing_field("metadata.name"))?;
        let api = dynamic_api(&self.client, &gvk, subject.metadata.namespace.as_deref());

        let status_patch = status_patch(subject);
        api.patch_status(name, &self.params, &Patch::Merge(&status_patch))
            .await?;

        debug!(kind = %gvk.kind, name = %name, "patched status");
        Ok(())
    }
}

/// Merge patch body carrying the subject's status
fn status_patch(subject: &DynamicObject) -> serde_json::Value {
    serde_json::json!({
        "status": subject.data.get("status").cloned().unwrap_or(serde_json::Value::Null)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_patch_carries_only_status() {
        let subject: DynamicObject = serde_json::from_value(json!({
            "apiVersion": "addons.example.com/v1alpha1",
            "kind": "Dashboard",
            "metadata": {"name": "main", "namespace": "ops"},
            "spec": {"version": "1.0"},
            "status": {"phase": "Current", "healthy": true}
        }))
        .unwrap();

        let patch = status_patch(&subject);
        assert_eq!(patch, json!({"status": {"phase": "Current", "healthy": true}}));
    }

    #[test]
    fn status_patch_without_status_is_null() {
        let subject: DynamicObject = serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {"name": "c"}
        }))
        .unwrap();
        assert_eq!(status_patch(&subject), json!({"status": null}));
    }

    #[test]
    fn status_patches_name_their_field_manager() {
        let default = status_patch_params(DEFAULT_FIELD_MANAGER);
        assert_eq!(default.field_manager.as_deref(), Some("addon-status"));

        let custom = status_patch_params("dashboard-controller");
        assert_eq!(custom.field_manager.as_deref(), Some("dashboard-controller"));
    }

    #[tokio::test]
    async fn mock_accessor_serves_children() {
        let mut mock = MockLiveObjectAccessor::new();
        mock.expect_get().returning(|gvk, object| {
            let value = json!({
                "apiVersion": format!("{}/{}", gvk.group, gvk.version),
                "kind": gvk.kind,
                "metadata": {"name": object.name, "namespace": object.namespace}
            });
            Ok(serde_json::from_value(value)?)
        });

        let gvk = GroupVersionKind::gvk("apps", "v1", "Deployment");
        let obj = mock
            .get(&gvk, &NamespacedName::new("default", "web"))
            .await
            .unwrap();
        assert_eq!(obj.metadata.name.as_deref(), Some("web"));
    }
}
