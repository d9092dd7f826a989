//! Read-only, embedded node-type catalog.
//!
//! Production runs against a ~500-node database built offline by a
//! separate metadata-enrichment pipeline (out of scope, §1); this crate
//! embeds a representative subset sufficient to exercise validator Pass 2
//! (per-node config) and Pass 5 (AI subgraph) end to end. All lookups are
//! normalized through [`n8n_mcp_normalize::normalize_type`] first, the
//! same requirement every comparison in the workspace is held to.

mod data;
pub mod schema;

use schema::NodeSchema;
use std::collections::HashMap;
use std::sync::OnceLock;

pub use schema::{DisplayOptions, PropertySchema, PropertyType};

pub struct Catalog {
    by_type: HashMap<&'static str, NodeSchema>,
}

impl Catalog {
    fn build() -> Self {
        let mut by_type = HashMap::new();
        for schema in data::embedded_nodes() {
            by_type.insert(schema.node_type, schema);
        }
        Self { by_type }
    }

    /// Looks up a node schema by any equivalent spelling of its type.
    pub fn lookup(&self, type_str: &str) -> Option<&NodeSchema> {
        let canonical = n8n_mcp_normalize::normalize_type(type_str);
        self.by_type.get(canonical.as_str())
    }

    pub fn contains(&self, type_str: &str) -> bool {
        self.lookup(type_str).is_some()
    }

    pub fn len(&self) -> usize {
        self.by_type.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }
}

static CATALOG: OnceLock<Catalog> = OnceLock::new();

/// Returns the process-wide embedded catalog, built once on first use.
pub fn embedded() -> &'static Catalog {
    CATALOG.get_or_init(Catalog::build)
}
