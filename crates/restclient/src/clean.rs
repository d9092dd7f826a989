//! Strips host-assigned and host-UI-only fields before a write (§4.7).

use n8n_mcp_domain::workflow::{filter_settings_whitelist, Workflow};
use serde_json::{Map, Value};

const CREATE_STRIP: &[&str] = &["id", "createdAt", "updatedAt", "versionId", "meta", "active", "tags"];

const UPDATE_STRIP_EXTRA: &[&str] = &[
    "staticData",
    "pinData",
    "isArchived",
    "usedCredentials",
    "sharedWithProjects",
    "triggerCount",
    "shared",
];

fn to_map(workflow: &Workflow) -> Map<String, Value> {
    match serde_json::to_value(workflow).expect("Workflow always serializes") {
        Value::Object(m) => m,
        _ => unreachable!("Workflow serializes to an object"),
    }
}

fn strip(mut map: Map<String, Value>, keys: &[&str]) -> Map<String, Value> {
    for key in keys {
        map.remove(*key);
    }
    map
}

/// Body for `POST /workflows`.
pub fn clean_for_create(workflow: &Workflow) -> Map<String, Value> {
    strip(to_map(workflow), CREATE_STRIP)
}

/// Body for `PUT|PATCH /workflows/:id`. Unlike create, `settings` is kept
/// but filtered to the whitelist rather than dropped outright — a caller
/// supplying no settings still sends none.
pub fn clean_for_update(workflow: &Workflow) -> Map<String, Value> {
    let mut map = strip(to_map(workflow), CREATE_STRIP);
    map = strip(map, UPDATE_STRIP_EXTRA);
    if let Some(Value::Object(settings)) = map.get("settings").cloned() {
        map.insert(
            "settings".to_string(),
            Value::Object(filter_settings_whitelist(&settings)),
        );
    }
    map
}
