use serde_json::Value;
use std::collections::HashMap;

/// The declared type of a node property, used by validator Pass 2 for
/// type-match checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    String,
    Number,
    Boolean,
    Options,
    ResourceLocator,
    Array,
    Object,
}

/// `displayOptions.show` / `displayOptions.hide` conditions: a property is
/// only "active" when every `show` condition matches and no `hide`
/// condition matches, evaluated against *defaults-applied* config.
#[derive(Debug, Clone, Default)]
pub struct DisplayOptions {
    pub show: HashMap<String, Vec<Value>>,
    pub hide: HashMap<String, Vec<Value>>,
}

impl DisplayOptions {
    pub fn is_active(&self, resolved_config: &HashMap<String, Value>) -> bool {
        for (key, allowed) in &self.show {
            let actual = resolved_config.get(key);
            let matches = actual.is_some_and(|v| allowed.contains(v));
            if !matches {
                return false;
            }
        }
        for (key, blocked) in &self.hide {
            if let Some(actual) = resolved_config.get(key) {
                if blocked.contains(actual) {
                    return false;
                }
            }
        }
        true
    }
}

#[derive(Debug, Clone)]
pub struct PropertySchema {
    pub name: &'static str,
    pub prop_type: PropertyType,
    pub required: bool,
    pub default: Option<Value>,
    pub options: Option<Vec<&'static str>>,
    pub numeric_range: Option<(f64, f64)>,
    pub resource_locator_modes: Option<Vec<&'static str>>,
    pub display_options: Option<DisplayOptions>,
}

impl PropertySchema {
    pub fn is_active(&self, resolved_config: &HashMap<String, Value>) -> bool {
        match &self.display_options {
            Some(d) => d.is_active(resolved_config),
            None => true,
        }
    }
}

/// Catalog entry for one normalized node type. Real n8n ships properties
/// as a recursive collection-of-collections (`collection`, `fixedCollection`);
/// this embedded subset models only the flat properties the validator
/// needs to exercise Pass 2.
#[derive(Debug, Clone)]
pub struct NodeSchema {
    pub node_type: &'static str,
    pub is_trigger: bool,
    pub properties: Vec<PropertySchema>,
}

impl NodeSchema {
    pub fn property(&self, name: &str) -> Option<&PropertySchema> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Builds the "defaults-applied" config map used for displayOptions
    /// evaluation: caller-supplied values win, everything else falls back
    /// to the property's declared default.
    pub fn resolve_config(&self, supplied: &HashMap<String, Value>) -> HashMap<String, Value> {
        let mut resolved = HashMap::new();
        for p in &self.properties {
            if let Some(v) = supplied.get(p.name) {
                resolved.insert(p.name.to_string(), v.clone());
            } else if let Some(d) = &p.default {
                resolved.insert(p.name.to_string(), d.clone());
            }
        }
        resolved
    }
}
