use n8n_mcp_domain::diffop::{DiffOperation, UpdateNodePatch};
use n8n_mcp_domain::workflow::{filter_settings_whitelist, ConnectionEndpoint, ConnectionKind, Workflow};
use n8n_mcp_normalize::normalize_name;
use serde_json::{Map, Value};

/// Applies one operation to `working`, validating it against the current
/// state first. On error, `working` is left untouched by this call (the
/// caller's copy may still carry earlier operations from the same batch —
/// that's intentional, §4.4's working-copy semantics).
pub fn apply_one(working: &mut Workflow, op: &DiffOperation) -> Result<(), String> {
    match op {
        DiffOperation::AddNode { node } => {
            if find_index(working, &node.name).is_some() {
                return Err(format!(
                    "a node named {:?} already exists after normalization",
                    normalize_name(&node.name)
                ));
            }
            working.nodes.push(node.clone());
            Ok(())
        }

        DiffOperation::RemoveNode { name } => {
            let idx = require_node(working, name)?;
            let removed_name = working.nodes[idx].name.clone();
            working.nodes.remove(idx);
            strip_connections_touching(working, &removed_name);
            Ok(())
        }

        DiffOperation::UpdateNode { name, patch } => apply_update_node(working, name, patch),

        DiffOperation::MoveNode { name, position } => {
            let idx = require_node(working, name)?;
            working.nodes[idx].position = *position;
            Ok(())
        }

        DiffOperation::EnableNode { name } => {
            let idx = require_node(working, name)?;
            working.nodes[idx].disabled = false;
            Ok(())
        }

        DiffOperation::DisableNode { name } => {
            let idx = require_node(working, name)?;
            working.nodes[idx].disabled = true;
            Ok(())
        }

        DiffOperation::AddConnection {
            source,
            target,
            source_index,
            target_index,
            kind,
            branch,
            case,
        } => {
            let source_idx = require_node(working, source)?;
            let target_idx = require_node(working, target)?;
            let effective = DiffOperation::resolve_add_connection_source_index(
                *source_index,
                branch.as_deref(),
                *case,
            );
            let target_name = working.nodes[target_idx].name.clone();
            let source_name = working.nodes[source_idx].name.clone();
            let slots = working.connections.slots_mut(&source_name, *kind);
            while slots.len() <= effective {
                slots.push(Vec::new());
            }
            let endpoint = ConnectionEndpoint {
                target_name,
                kind: *kind,
                target_index: *target_index,
            };
            if !slots[effective].contains(&endpoint) {
                slots[effective].push(endpoint);
            }
            Ok(())
        }

        DiffOperation::RemoveConnection {
            source,
            target,
            source_index,
            kind,
        } => {
            let source_idx = require_node(working, source)?;
            let source_name = working.nodes[source_idx].name.clone();
            let target_norm = normalize_name(target);
            {
                let slots = working.connections.slots_mut(&source_name, *kind);
                match source_index {
                    Some(idx) => {
                        if let Some(slot) = slots.get_mut(*idx) {
                            slot.retain(|e| normalize_name(&e.target_name) != target_norm);
                        }
                    }
                    None => {
                        for slot in slots.iter_mut() {
                            slot.retain(|e| normalize_name(&e.target_name) != target_norm);
                        }
                    }
                }
            }
            working.connections.truncate_trailing_empty(&source_name, *kind);
            Ok(())
        }

        DiffOperation::RewireConnection {
            source,
            from,
            to,
            source_index,
            kind,
        } => {
            let source_idx = require_node(working, source)?;
            let to_idx = require_node(working, to)?;
            let source_name = working.nodes[source_idx].name.clone();
            let from_norm = normalize_name(from);

            let resolved_index = match source_index {
                Some(idx) => *idx,
                None => {
                    let slots = working
                        .connections
                        .slots(&source_name, *kind)
                        .ok_or_else(|| format!("no {} connections from {source_name:?} to rewire", kind.as_str()))?;
                    slots
                        .iter()
                        .position(|slot| slot.iter().any(|e| normalize_name(&e.target_name) == from_norm))
                        .ok_or_else(|| format!("no connection from {source_name:?} to {from:?} found"))?
                }
            };

            let target_name = working.nodes[to_idx].name.clone();
            let slots = working.connections.slots_mut(&source_name, *kind);
            if resolved_index >= slots.len() {
                return Err(format!(
                    "source index {resolved_index} out of range for {source_name:?}"
                ));
            }
            let target_index = slots[resolved_index]
                .iter()
                .find(|e| normalize_name(&e.target_name) == from_norm)
                .map(|e| e.target_index)
                .unwrap_or(0);
            slots[resolved_index].retain(|e| normalize_name(&e.target_name) != from_norm);
            slots[resolved_index].push(ConnectionEndpoint {
                target_name,
                kind: *kind,
                target_index,
            });
            Ok(())
        }

        DiffOperation::CleanStaleConnections => {
            let known: std::collections::HashSet<String> =
                working.nodes.iter().map(|n| n.name.clone()).collect();
            let touched: Vec<(String, ConnectionKind)> = working
                .connections
                .0
                .iter()
                .flat_map(|(src, kinds)| kinds.keys().map(move |k| (src.clone(), *k)))
                .collect();
            for (src, kind) in &touched {
                let slots = working.connections.slots_mut(src, *kind);
                for slot in slots.iter_mut() {
                    slot.retain(|e| known.contains(&e.target_name));
                }
            }
            for (src, kind) in &touched {
                working.connections.truncate_trailing_empty(src, *kind);
            }
            working.connections.0.retain(|src, _| known.contains(src));
            Ok(())
        }

        DiffOperation::ReplaceConnections { connections } => {
            for (source, kinds) in &connections.0 {
                if find_index(working, source).is_none() {
                    return Err(format!("replaceConnections references unknown source node {source:?}"));
                }
                for slots in kinds.values() {
                    for slot in slots {
                        for endpoint in slot {
                            if find_index(working, &endpoint.target_name).is_none() {
                                return Err(format!(
                                    "replaceConnections references unknown target node {:?}",
                                    endpoint.target_name
                                ));
                            }
                        }
                    }
                }
            }
            working.connections = connections.clone();
            Ok(())
        }

        DiffOperation::UpdateSettings { patch } => {
            let filtered = filter_settings_whitelist(patch);
            let dropped: Vec<&String> = patch.keys().filter(|k| !filtered.contains_key(*k)).collect();
            if !dropped.is_empty() {
                tracing::info!(?dropped, "updateSettings dropped non-whitelisted keys");
            }
            let mut settings = working.settings.clone().unwrap_or_default();
            for (k, v) in filtered {
                settings.insert(k, v);
            }
            working.settings = Some(settings);
            Ok(())
        }

        DiffOperation::UpdateName { name } => {
            if name.trim().is_empty() {
                return Err("updateName requires a non-empty name".into());
            }
            working.name = name.clone();
            Ok(())
        }

        DiffOperation::AddTag { tag } => {
            if !working.tags.iter().any(|t| t == tag) {
                working.tags.push(tag.clone());
            }
            Ok(())
        }

        DiffOperation::RemoveTag { tag } => {
            working.tags.retain(|t| t != tag);
            Ok(())
        }
    }
}

fn apply_update_node(working: &mut Workflow, name: &str, patch: &UpdateNodePatch) -> Result<(), String> {
    let idx = require_node(working, name)?;

    if let Some(new_name) = &patch.name {
        let new_norm = normalize_name(new_name);
        let clashes = working
            .nodes
            .iter()
            .enumerate()
            .any(|(i, n)| i != idx && normalize_name(&n.name) == new_norm);
        if clashes {
            return Err(format!(
                "renaming to {new_norm:?} would collide with an existing node name"
            ));
        }
    }

    let old_name = working.nodes[idx].name.clone();

    if let Some(new_type) = &patch.node_type {
        working.nodes[idx].node_type = new_type.clone();
    }
    if let Some(tv) = patch.type_version {
        working.nodes[idx].type_version = tv;
    }
    if let Some(disabled) = patch.disabled {
        working.nodes[idx].disabled = disabled;
    }
    if let Some(notes) = &patch.notes {
        working.nodes[idx].notes = Some(notes.clone());
    }
    if let Some(params_patch) = &patch.parameters {
        let merged = deep_merge(&working.nodes[idx].parameters, params_patch);
        working.nodes[idx].parameters = merged;
    }
    if let Some(new_name) = &patch.name {
        working.nodes[idx].name = new_name.clone();
        if &old_name != new_name {
            rename_connection_references(working, &old_name, new_name);
        }
    }

    Ok(())
}

/// Recursive object merge: `patch` keys win; nested objects merge key by
/// key instead of replacing wholesale; everything else (arrays, scalars)
/// replaces.
fn deep_merge(base: &Map<String, Value>, patch: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = base.clone();
    for (k, patch_v) in patch {
        match (merged.get(k), patch_v) {
            (Some(Value::Object(base_obj)), Value::Object(patch_obj)) => {
                merged.insert(k.clone(), Value::Object(deep_merge(base_obj, patch_obj)));
            }
            _ => {
                merged.insert(k.clone(), patch_v.clone());
            }
        }
    }
    merged
}

fn rename_connection_references(working: &mut Workflow, old_name: &str, new_name: &str) {
    if let Some(kinds) = working.connections.0.remove(old_name) {
        working.connections.0.insert(new_name.to_string(), kinds);
    }
    for kinds in working.connections.0.values_mut() {
        for slots in kinds.values_mut() {
            for slot in slots.iter_mut() {
                for endpoint in slot.iter_mut() {
                    if endpoint.target_name == old_name {
                        endpoint.target_name = new_name.to_string();
                    }
                }
            }
        }
    }
}

fn strip_connections_touching(working: &mut Workflow, name: &str) {
    working.connections.0.remove(name);
    let touched: Vec<(String, ConnectionKind)> = working
        .connections
        .0
        .iter()
        .flat_map(|(src, kinds)| kinds.keys().map(move |k| (src.clone(), *k)))
        .collect();
    for (src, kind) in &touched {
        let slots = working.connections.slots_mut(src, *kind);
        for slot in slots.iter_mut() {
            slot.retain(|e| e.target_name != name);
        }
    }
    for (src, kind) in &touched {
        working.connections.truncate_trailing_empty(src, *kind);
    }
}

/// Finds a node index by name, normalizing both sides for the comparison.
fn find_index(working: &Workflow, name: &str) -> Option<usize> {
    let norm = normalize_name(name);
    working
        .nodes
        .iter()
        .position(|n| normalize_name(&n.name) == norm)
}

/// Like [`find_index`] but returns a structured, suggestion-bearing error
/// when the name is missing — including an "id instead of name" hint,
/// since that's the most common way this lookup fails in practice.
fn require_node(working: &Workflow, name: &str) -> Result<usize, String> {
    if let Some(idx) = find_index(working, name) {
        return Ok(idx);
    }
    if let Some(by_id) = working.nodes.iter().find(|n| n.id == name) {
        return Err(format!(
            "{name:?} looks like a node id; did you mean the name {:?}?",
            by_id.name
        ));
    }
    let available: Vec<&str> = working.nodes.iter().map(|n| n.name.as_str()).collect();
    Err(format!(
        "no node named {name:?} found; available nodes: {available:?}"
    ))
}
