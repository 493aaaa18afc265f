//! Tool Registry (spec.md §4.7 "Registry"): accepts descriptors at
//! startup, rejects duplicate identifiers, and is read-only thereafter —
//! no locking is needed once built (spec.md §5 "Registry: read-only after
//! startup; no locking").

use std::collections::HashMap;

use crate::descriptor::{ToolDescriptor, ToolDescriptorJson};
use crate::fuzzy::closest_match;

pub struct Registry {
    tools: HashMap<&'static str, ToolDescriptor>,
}

impl Registry {
    /// Builds a registry from `descriptors`, failing startup if two share
    /// an identifier (spec.md §3: "Registry must reject duplicate
    /// identifiers").
    pub fn build(descriptors: Vec<ToolDescriptor>) -> Result<Self, String> {
        let mut tools = HashMap::with_capacity(descriptors.len());
        for descriptor in descriptors {
            if tools.insert(descriptor.name, descriptor).is_some() {
                return Err("duplicate tool identifier registered at startup".to_string());
            }
        }
        Ok(Self { tools })
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name)
    }

    /// `tools/list` (spec.md §6): identifiers, summaries, safety class, and
    /// parameter schemas.
    pub fn list(&self) -> Vec<ToolDescriptorJson> {
        let mut names: Vec<&'static str> = self.tools.keys().copied().collect();
        names.sort_unstable();
        names.into_iter().map(|name| self.tools[name].to_json()).collect()
    }

    /// The closest registered name to `unknown`, within edit distance 3
    /// (spec.md §4.7 step 1, §8 property 15).
    pub fn fuzzy_suggest(&self, unknown: &str) -> Option<&'static str> {
        closest_match(unknown, self.tools.keys().copied(), 3)
    }
}
