//! Reading and merging the owner's common status fields

use kube::api::DynamicObject;
use serde_json::{Map, Value};

use crate::crd::CommonStatus;
use crate::Error;

/// Read `phase`, `healthy` and `observedGeneration` from the owner's status
///
/// A missing status reads as the default. A status that is not a map, or
/// whose common fields have the wrong type, is an error.
pub fn get_common_status(subject: &DynamicObject) -> Result<CommonStatus, Error> {
    let Some(status) = status_map(subject)? else {
        return Ok(CommonStatus::default());
    };

    let mut common = Map::new();
    for field in ["phase", "healthy", "observedGeneration"] {
        if let Some(value) = status.get(field).filter(|v| !v.is_null()) {
            common.insert(field.to_string(), value.clone());
        }
    }
    serde_json::from_value(Value::Object(common))
        .map_err(|e| Error::invalid_status(format!("status: {e}")))
}

/// Merge the common fields into the owner's status
///
/// Only the three common fields are written; everything else in the status
/// is left as it was.
pub fn set_common_status(subject: &mut DynamicObject, common: &CommonStatus) -> Result<(), Error> {
    let status = status_map_mut(subject)?;
    status.insert("phase".to_string(), Value::from(common.phase.clone()));
    status.insert("healthy".to_string(), Value::from(common.healthy));
    status.insert(
        "observedGeneration".to_string(),
        Value::from(common.observed_generation),
    );
    Ok(())
}

/// The owner's status as a map, `None` when it has no status yet
pub(crate) fn status_map(subject: &DynamicObject) -> Result<Option<&Map<String, Value>>, Error> {
    match subject.data.get("status") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(other) => Err(Error::invalid_status(format!(
            "status is {other}, expected a map"
        ))),
    }
}

/// The owner's status as a mutable map, created when missing
pub(crate) fn status_map_mut(subject: &mut DynamicObject) -> Result<&mut Map<String, Value>, Error> {
    if subject.data.is_null() {
        subject.data = Value::Object(Map::new());
    }
    let data = subject
        .data
        .as_object_mut()
        .ok_or_else(|| Error::invalid_status("object body is not a map"))?;
    let status = data
        .entry("status")
        .or_insert_with(|| Value::Object(Map::new()));
    if status.is_null() {
        *status = Value::Object(Map::new());
    }
    match status {
        Value::Object(map) => Ok(map),
        other => Err(Error::invalid_status(format!(
            "status is {other}, expected a map"
        ))),
    }
}
