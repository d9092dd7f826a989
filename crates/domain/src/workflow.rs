//! The workflow document shape (§3).
//!
//! Connections are modeled exactly as the host represents them: a map
//! keyed by *source node name*, then by connection kind, then an
//! index-stable array of *output slots*, each an array of endpoints. The
//! outer `Vec` positions are semantic (branch/case identity) and must
//! never be re-packed — see [`crate::diffop`] and the diff engine crate
//! for the operations that preserve this invariant.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A complete workflow document as exchanged with the host's REST API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub connections: Connections,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    // Read-only provenance fields the core never writes back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
}

impl Workflow {
    /// All node names currently in the workflow, in declaration order.
    pub fn node_names(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.name.as_str()).collect()
    }

    /// Look up a node by exact (already-normalized) name.
    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Look up a node by exact (already-normalized) name, mutably.
    pub fn node_by_name_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.name == name)
    }

    /// Look up a node by its opaque id.
    pub fn node_by_id(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// A single workflow node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default = "default_type_version")]
    pub type_version: f64,
    #[serde(default)]
    pub position: (f64, f64),
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Map<String, Value>>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_error: Option<String>,
}

fn default_type_version() -> f64 {
    1.0
}

impl Node {
    pub fn enabled(&self) -> bool {
        !self.disabled
    }
}

/// The kind of a connection edge. `Main` carries data flow; the `Ai*`
/// kinds are modeled source-to-target in the direction the host expects,
/// which is the *reverse* of data flow for some of them (a language
/// model's edge points to the agent it serves). Never "fix" this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionKind {
    #[serde(rename = "main")]
    Main,
    #[serde(rename = "ai_tool")]
    AiTool,
    #[serde(rename = "ai_languageModel")]
    AiLanguageModel,
    #[serde(rename = "ai_memory")]
    AiMemory,
    #[serde(rename = "ai_outputParser")]
    AiOutputParser,
    #[serde(rename = "ai_chain")]
    AiChain,
}

impl ConnectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionKind::Main => "main",
            ConnectionKind::AiTool => "ai_tool",
            ConnectionKind::AiLanguageModel => "ai_languageModel",
            ConnectionKind::AiMemory => "ai_memory",
            ConnectionKind::AiOutputParser => "ai_outputParser",
            ConnectionKind::AiChain => "ai_chain",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "main" => Some(Self::Main),
            "ai_tool" => Some(Self::AiTool),
            "ai_languageModel" => Some(Self::AiLanguageModel),
            "ai_memory" => Some(Self::AiMemory),
            "ai_outputParser" => Some(Self::AiOutputParser),
            "ai_chain" => Some(Self::AiChain),
            _ => None,
        }
    }
}

/// An endpoint at the far end of a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionEndpoint {
    #[serde(rename = "node")]
    pub target_name: String,
    #[serde(rename = "type")]
    pub kind: ConnectionKind,
    #[serde(default, rename = "index")]
    pub target_index: usize,
}

/// One source node's output slots for one connection kind: the outer
/// `Vec` index *is* the output slot number and must stay positional.
pub type SlotArray = Vec<Vec<ConnectionEndpoint>>;

/// The full connections map: source node name -> kind -> slot array.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Connections(pub HashMap<String, HashMap<ConnectionKind, SlotArray>>);

impl Connections {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn slots(&self, source: &str, kind: ConnectionKind) -> Option<&SlotArray> {
        self.0.get(source).and_then(|m| m.get(&kind))
    }

    pub fn slots_mut(&mut self, source: &str, kind: ConnectionKind) -> &mut SlotArray {
        self.0
            .entry(source.to_string())
            .or_default()
            .entry(kind)
            .or_default()
    }

    /// Iterate every `(source, kind, slot_index, endpoint)` tuple.
    pub fn iter_endpoints(
        &self,
    ) -> impl Iterator<Item = (&str, ConnectionKind, usize, &ConnectionEndpoint)> {
        self.0.iter().flat_map(|(source, kinds)| {
            kinds.iter().flat_map(move |(kind, slots)| {
                slots.iter().enumerate().flat_map(move |(idx, endpoints)| {
                    endpoints
                        .iter()
                        .map(move |e| (source.as_str(), *kind, idx, e))
                })
            })
        })
    }

    /// Drop trailing empty slots from a source/kind's slot array, but never
    /// compact interior empties — removal of a mid-array connection leaves a
    /// hole (§4.4, Testable Property 2).
    pub fn truncate_trailing_empty(&mut self, source: &str, kind: ConnectionKind) {
        if let Some(kinds) = self.0.get_mut(source) {
            if let Some(slots) = kinds.get_mut(&kind) {
                while matches!(slots.last(), Some(s) if s.is_empty()) {
                    slots.pop();
                }
                if slots.is_empty() {
                    kinds.remove(&kind);
                }
            }
            if kinds.is_empty() {
                self.0.remove(source);
            }
        }
    }
}

/// The fixed whitelist of writable [`Workflow::settings`] properties (§3).
/// Any other key received from the host (UI-only telemetry fields) must be
/// stripped before a write — see [`filter_settings_whitelist`].
pub const SETTINGS_WHITELIST: &[&str] = &[
    "executionOrder",
    "timezone",
    "saveDataErrorExecution",
    "saveDataSuccessExecution",
    "saveManualExecutions",
    "saveExecutionProgress",
    "executionTimeout",
    "errorWorkflow",
    "callerPolicy",
];

/// Filter a raw settings object down to [`SETTINGS_WHITELIST`] keys only.
/// Non-whitelisted keys are dropped, never erroring.
pub fn filter_settings_whitelist(settings: &Map<String, Value>) -> Map<String, Value> {
    settings
        .iter()
        .filter(|(k, _)| SETTINGS_WHITELIST.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
