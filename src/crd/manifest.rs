//! Child references declared by an owner's manifest

use kube::api::DynamicObject;
use kube::core::GroupVersionKind;

use crate::Error;

/// Render the kind identifier for a GVK
///
/// The format is `{group}/{version}, Kind={kind}` (`/v1, Kind=Pod` for the
/// core group). It is both the dispatch key for per-kind status methods and
/// the prefix of abnormal condition messages.
pub fn kind_key(gvk: &GroupVersionKind) -> String {
    format!("{}/{}, Kind={}", gvk.group, gvk.version, gvk.kind)
}

/// Split an apiVersion into group and version
pub fn parse_api_version(api_version: &str) -> (&str, &str) {
    match api_version.split_once('/') {
        Some((group, version)) => (group, version),
        None => ("", api_version),
    }
}

/// Derive the GVK of a dynamic object from its type metadata
pub fn object_gvk(obj: &DynamicObject) -> Result<GroupVersionKind, Error> {
    let types = obj
        .types
        .as_ref()
        .ok_or_else(|| Error::missing_field("apiVersion/kind"))?;
    if types.kind.is_empty() {
        return Err(Error::missing_field("kind"));
    }
    let (group, version) = parse_api_version(&types.api_version);
    Ok(GroupVersionKind::gvk(group, version, &types.kind))
}

/// Namespace and name of an object; namespace is empty for cluster-scoped kinds
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct NamespacedName {
    /// Namespace, empty for cluster-scoped objects
    pub namespace: String,
    /// Object name
    pub name: String,
}

impl NamespacedName {
    /// Create a new namespaced name
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Namespace as an option, `None` for cluster-scoped objects
    pub fn namespace(&self) -> Option<&str> {
        if self.namespace.is_empty() {
            None
        } else {
            Some(&self.namespace)
        }
    }
}

impl std::fmt::Display for NamespacedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// One child object declared in a manifest
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChildReference {
    /// Group, version and kind of the child
    pub gvk: GroupVersionKind,
    /// Where the child lives
    pub object: NamespacedName,
}

impl ChildReference {
    /// Create a reference from its parts
    pub fn new(
        gvk: GroupVersionKind,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            gvk,
            object: NamespacedName::new(namespace, name),
        }
    }

    /// Reference the object a rendered manifest entry describes
    pub fn from_object(obj: &DynamicObject) -> Result<Self, Error> {
        let gvk = object_gvk(obj)?;
        let name = obj
            .metadata
            .name
            .clone()
            .ok_or_else(|| Error::missing_field("metadata.name"))?;
        let namespace = obj.metadata.namespace.clone().unwrap_or_default();
        Ok(Self::new(gvk, namespace, name))
    }

    /// Dispatch key for this child's kind
    pub fn kind_key(&self) -> String {
        kind_key(&self.gvk)
    }
}

/// Ordered set of children an owner manages
///
/// Order is significant: children are scanned in this order and abnormal
/// conditions are reported in it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Manifest {
    /// Children in manifest order
    pub items: Vec<ChildReference>,
}

impl Manifest {
    /// Create a manifest from child references
    pub fn new(items: Vec<ChildReference>) -> Self {
        Self { items }
    }

    /// Build a manifest from rendered objects, keeping their order
    pub fn from_objects(objects: &[DynamicObject]) -> Result<Self, Error> {
        let items = objects
            .iter()
            .map(ChildReference::from_object)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { items })
    }

    /// Add a child and return self for chaining
    pub fn child(mut self, child: ChildReference) -> Self {
        self.items.push(child);
        self
    }
}
