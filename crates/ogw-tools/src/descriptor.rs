//! Tool Descriptor (spec.md §3 "Tool Descriptor", §6 "tools/list element"):
//! identifier, parameter schema, safety/category classification,
//! performance hints, and a handler reference. Immutable after
//! registration — the [`crate::registry::Registry`] never mutates a
//! descriptor once built.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use ogw_domain::Result;
use ogw_sessions::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Safety {
    Safe,
    Caution,
    Destructive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Query,
    Mutation,
    Analysis,
    Utility,
    Bulk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

/// One parameter in a tool's schema (spec.md §3: "name, type, required
/// flag, default, value constraints").
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub param_type: ParameterType,
    pub required: bool,
    pub default: Option<Value>,
}

impl ParameterSpec {
    pub fn required(name: &'static str, description: &'static str, param_type: ParameterType) -> Self {
        Self { name, description, param_type, required: true, default: None }
    }

    pub fn optional(name: &'static str, description: &'static str, param_type: ParameterType, default: Value) -> Self {
        Self { name, description, param_type, required: false, default: Some(default) }
    }
}

/// Per-invocation context threaded into a handler: session access, the
/// dry-run flag (spec.md §4.7 step 4), and the deadline the handler must
/// respect for its own suspension points.
pub struct ToolContext {
    pub session_id: Option<String>,
    pub request_id: Option<String>,
    pub dry_run: bool,
    pub deadline: Duration,
    pub sessions: Arc<SessionStore>,
}

#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, ctx: &ToolContext, params: Value) -> Result<Value>;
}

/// Immutable once registered (spec.md §3: "Immutable after registration").
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub safety: Safety,
    pub category: Category,
    pub parameters: Vec<ParameterSpec>,
    /// Whether a successful result may be cached (spec.md §4.7 step 5).
    pub cacheable: bool,
    /// Whether the cache key includes the session id (spec.md §4.3 "session
    /// id only if the tool descriptor marks results session-scoped").
    pub session_scoped: bool,
    /// Rate-class bucket this tool draws from (spec.md §4.2/§4.7 step 3).
    pub rate_class: &'static str,
    /// Handler-local timeout, combined with the request deadline as
    /// `min(request_deadline, timeout)` (spec.md §4.7 step 6).
    pub timeout: Duration,
    /// When true, concurrent requests within one session for this tool are
    /// serialised (spec.md §4.7 "Concurrency").
    pub session_serial: bool,
    pub handler: Arc<dyn ToolHandler>,
}

/// JSON shape matching spec.md §6's `tools/list` element exactly.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptorJson {
    pub name: String,
    pub description: String,
    pub safety: Safety,
    pub category: Category,
    pub parameters: ParametersJson,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParametersJson {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub properties: serde_json::Map<String, Value>,
    pub required: Vec<String>,
}

impl ToolDescriptor {
    pub fn to_json(&self) -> ToolDescriptorJson {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();
        for param in &self.parameters {
            let mut entry = serde_json::Map::new();
            entry.insert("type".into(), Value::String(param_type_str(param.param_type).into()));
            entry.insert("description".into(), Value::String(param.description.into()));
            if let Some(default) = &param.default {
                entry.insert("default".into(), default.clone());
            }
            properties.insert(param.name.into(), Value::Object(entry));
            if param.required {
                required.push(param.name.to_string());
            }
        }
        ToolDescriptorJson {
            name: self.name.to_string(),
            description: self.description.to_string(),
            safety: self.safety,
            category: self.category,
            parameters: ParametersJson { kind: "object", properties, required },
        }
    }
}

fn param_type_str(t: ParameterType) -> &'static str {
    match t {
        ParameterType::String => "string",
        ParameterType::Integer => "integer",
        ParameterType::Number => "number",
        ParameterType::Boolean => "boolean",
        ParameterType::Array => "array",
        ParameterType::Object => "object",
    }
}
