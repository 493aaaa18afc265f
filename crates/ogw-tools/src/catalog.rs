//! Representative tool catalogue (SPEC_FULL.md §4.7 supplement): one
//! descriptor per safety class and category named in spec.md §3, so every
//! dispatch path — safety gate, dry-run preview, rate class, cache scoping
//! — has a concrete exerciser. The registry remains extensible: adding a
//! tool elsewhere in the binary is just another [`ToolDescriptor`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use ogw_backend::{GraphQlRequest, ResilientBackend};
use ogw_discovery::{DiscoveryEngine, DiscoveryJobTracker};
use ogw_domain::config::QueryPolicyConfig;
use ogw_domain::error::{Error, Result};
use ogw_query::validate as validate_query;

use crate::descriptor::{Category, ParameterSpec, ParameterType, Safety, ToolContext, ToolDescriptor, ToolHandler};

const RATE_CLASS_QUERY: &str = "query";
const RATE_CLASS_DISCOVERY: &str = "discovery";
const RATE_CLASS_MUTATION: &str = "mutation";
const RATE_CLASS_BULK: &str = "bulk";
const RATE_CLASS_UTILITY: &str = "utility";

fn default_window(params: &Value) -> String {
    params.get("window").and_then(Value::as_str).unwrap_or("1 DAY AGO").to_string()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// discovery.list_schemas — query / safe / cacheable
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct ListSchemasHandler {
    pub engine: Arc<DiscoveryEngine>,
}

#[async_trait]
impl ToolHandler for ListSchemasHandler {
    async fn call(&self, ctx: &ToolContext, params: Value) -> Result<Value> {
        let window = default_window(&params);
        let schemas = self.engine.discover_schemas(&window, ctx.deadline).await?;
        Ok(json!({ "schemas": schemas }))
    }
}

pub fn list_schemas_descriptor(handler: Arc<ListSchemasHandler>) -> ToolDescriptor {
    ToolDescriptor {
        name: "discovery.list_schemas",
        description: "Enumerate schemas observed in the Backend within a time window.",
        safety: Safety::Safe,
        category: Category::Query,
        parameters: vec![ParameterSpec::optional(
            "window",
            "time window to enumerate over, e.g. \"1 DAY AGO\"",
            ParameterType::String,
            json!("1 DAY AGO"),
        )],
        cacheable: true,
        session_scoped: false,
        rate_class: RATE_CLASS_DISCOVERY,
        timeout: std::time::Duration::from_secs(30),
        session_serial: false,
        handler,
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// discovery.profile_attributes — analysis / safe / cacheable
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct ProfileAttributesHandler {
    pub engine: Arc<DiscoveryEngine>,
}

#[async_trait]
impl ToolHandler for ProfileAttributesHandler {
    async fn call(&self, ctx: &ToolContext, params: Value) -> Result<Value> {
        let schema = params
            .get("schema")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Validation("schema is required".into()))?;
        let window = default_window(&params);
        let profiles = self.engine.profile_attributes(schema, &window, ctx.deadline).await?;
        Ok(json!({ "schema": schema, "attributes": profiles }))
    }
}

pub fn profile_attributes_descriptor(handler: Arc<ProfileAttributesHandler>) -> ToolDescriptor {
    ToolDescriptor {
        name: "discovery.profile_attributes",
        description: "Profile the attributes of a schema: inferred type, cardinality, null ratio, coverage.",
        safety: Safety::Safe,
        category: Category::Analysis,
        parameters: vec![
            ParameterSpec::required("schema", "schema name to profile", ParameterType::String),
            ParameterSpec::optional("window", "time window to sample over", ParameterType::String, json!("1 DAY AGO")),
        ],
        cacheable: true,
        session_scoped: false,
        rate_class: RATE_CLASS_DISCOVERY,
        timeout: std::time::Duration::from_secs(30),
        session_serial: false,
        handler,
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// discovery.mine_relationships — analysis / safe / cacheable
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct MineRelationshipsHandler {
    pub engine: Arc<DiscoveryEngine>,
}

#[async_trait]
impl ToolHandler for MineRelationshipsHandler {
    async fn call(&self, ctx: &ToolContext, params: Value) -> Result<Value> {
        let schema_names: Vec<String> = params
            .get("schemas")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::Validation("schemas is required".into()))?
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();
        if schema_names.len() < 2 {
            return Err(Error::Validation("mine_relationships requires at least 2 schemas".into()));
        }
        let window = default_window(&params);

        let mut profiles = HashMap::new();
        for name in &schema_names {
            let attrs = self.engine.profile_attributes(name, &window, ctx.deadline).await?;
            profiles.insert(name.clone(), attrs);
        }

        let result = self.engine.mine_relationships(&profiles, &window, ctx.deadline).await;
        Ok(json!({
            "edges": result.items,
            "partial": result.partial,
            "failed_sub_queries": result.failed_sub_queries,
        }))
    }
}

pub fn mine_relationships_descriptor(handler: Arc<MineRelationshipsHandler>) -> ToolDescriptor {
    ToolDescriptor {
        name: "discovery.mine_relationships",
        description: "Find likely join relationships between schemas sharing a candidate attribute.",
        safety: Safety::Safe,
        category: Category::Analysis,
        parameters: vec![
            ParameterSpec::required("schemas", "schema names to mine relationships between", ParameterType::Array),
            ParameterSpec::optional("window", "join evidence time window", ParameterType::String, json!("1 DAY AGO")),
        ],
        cacheable: true,
        session_scoped: false,
        rate_class: RATE_CLASS_DISCOVERY,
        timeout: std::time::Duration::from_secs(60),
        session_serial: false,
        handler,
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// discovery.score_quality — analysis / safe / cacheable
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct ScoreQualityHandler {
    pub engine: Arc<DiscoveryEngine>,
}

#[async_trait]
impl ToolHandler for ScoreQualityHandler {
    async fn call(&self, ctx: &ToolContext, params: Value) -> Result<Value> {
        let schema = params
            .get("schema")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Validation("schema is required".into()))?;
        let window = default_window(&params);
        let report = self.engine.score_quality(schema, &window, chrono::Utc::now(), ctx.deadline).await?;
        serde_json::to_value(report).map_err(Error::Json)
    }
}

pub fn score_quality_descriptor(handler: Arc<ScoreQualityHandler>) -> ToolDescriptor {
    ToolDescriptor {
        name: "discovery.score_quality",
        description: "Compute a data-quality score for a schema from coverage, null ratio, freshness, and cardinality health.",
        safety: Safety::Safe,
        category: Category::Analysis,
        parameters: vec![
            ParameterSpec::required("schema", "schema name to score", ParameterType::String),
            ParameterSpec::optional("window", "time window backing the score", ParameterType::String, json!("1 DAY AGO")),
        ],
        cacheable: true,
        session_scoped: false,
        rate_class: RATE_CLASS_DISCOVERY,
        timeout: std::time::Duration::from_secs(30),
        session_serial: false,
        handler,
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// discovery.job_status — utility / safe, not cacheable
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct JobStatusHandler {
    pub jobs: Arc<DiscoveryJobTracker>,
}

#[async_trait]
impl ToolHandler for JobStatusHandler {
    async fn call(&self, _ctx: &ToolContext, params: Value) -> Result<Value> {
        let job_id = params
            .get("job_id")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Validation("job_id is required".into()))?;
        match self.jobs.status(job_id) {
            Some(status) => serde_json::to_value(status).map_err(Error::Json),
            None => Err(Error::NotFound(format!("discovery job {job_id}"))),
        }
    }
}

pub fn job_status_descriptor(handler: Arc<JobStatusHandler>) -> ToolDescriptor {
    ToolDescriptor {
        name: "discovery.job_status",
        description: "Poll the state of a long-running discovery job (pending/running/complete/partial/failed).",
        safety: Safety::Safe,
        category: Category::Utility,
        parameters: vec![ParameterSpec::required("job_id", "discovery job id", ParameterType::String)],
        cacheable: false,
        session_scoped: false,
        rate_class: RATE_CLASS_UTILITY,
        timeout: std::time::Duration::from_secs(5),
        session_serial: false,
        handler,
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// query.execute — query / safe, session-scoped cache
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct QueryExecuteHandler {
    pub backend: Arc<ResilientBackend>,
    pub policy: QueryPolicyConfig,
    pub account_id: String,
}

#[async_trait]
impl ToolHandler for QueryExecuteHandler {
    async fn call(&self, ctx: &ToolContext, params: Value) -> Result<Value> {
        let query = params
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Validation("query is required".into()))?;

        let canonical = if self.policy.validation_enabled {
            validate_query(query, self.policy.mutations_allowed, self.policy.max_time_window_days, false)
                .map_err(|failure| Error::QueryValidation {
                    message: failure.message,
                    offset: failure.offset,
                    token: failure.token,
                })?
                .canonical
        } else {
            query.to_string()
        };

        let request = GraphQlRequest::new(
            "query Execute($nrql: Nrql!) { actor { account { nrql(query: $nrql) { results } } } }",
            json!({ "nrql": canonical }),
            self.account_id.clone(),
        );
        let response = self.backend.call(RATE_CLASS_QUERY, request, ctx.deadline).await?;
        if response.has_errors() {
            let messages: Vec<String> = response.errors.iter().map(|e| e.message.clone()).collect();
            return Err(Error::Backend { message: messages.join("; ") });
        }
        Ok(json!({ "query": canonical, "data": response.data.unwrap_or(Value::Null) }))
    }
}

pub fn query_execute_descriptor(handler: Arc<QueryExecuteHandler>) -> ToolDescriptor {
    ToolDescriptor {
        name: "query.execute",
        description: "Validate and execute a domain query against the Backend.",
        safety: Safety::Safe,
        category: Category::Query,
        parameters: vec![ParameterSpec::required("query", "domain query text", ParameterType::String)],
        cacheable: true,
        session_scoped: true,
        rate_class: RATE_CLASS_QUERY,
        timeout: std::time::Duration::from_secs(30),
        session_serial: false,
        handler,
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// dashboard.create — mutation / destructive, dry-run-capable
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct DashboardCreateHandler {
    pub backend: Arc<ResilientBackend>,
    pub account_id: String,
}

#[async_trait]
impl ToolHandler for DashboardCreateHandler {
    async fn call(&self, ctx: &ToolContext, params: Value) -> Result<Value> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Validation("name is required".into()))?;
        let widgets = params.get("widgets").cloned().unwrap_or_else(|| json!([]));

        // spec.md §4.7 step 4: dry-run must not cause a Backend mutation.
        if ctx.dry_run {
            return Ok(json!({
                "would_create": [{ "name": name, "widgets": widgets }],
                "would_modify": [],
                "would_delete": [],
            }));
        }

        let request = GraphQlRequest::new(
            "mutation CreateDashboard($name: String!, $widgets: [DashboardWidgetInput!]!) { \
                dashboardCreate(name: $name, widgets: $widgets) { guid } }",
            json!({ "name": name, "widgets": widgets }),
            self.account_id.clone(),
        );
        let response = self.backend.call(RATE_CLASS_MUTATION, request, ctx.deadline).await?;
        if response.has_errors() {
            let messages: Vec<String> = response.errors.iter().map(|e| e.message.clone()).collect();
            return Err(Error::Backend { message: messages.join("; ") });
        }
        Ok(response.data.unwrap_or(Value::Null))
    }
}

pub fn dashboard_create_descriptor(handler: Arc<DashboardCreateHandler>) -> ToolDescriptor {
    ToolDescriptor {
        name: "dashboard.create",
        description: "Create a dashboard from a list of widgets. Destructive: requires dry_run or confirm.",
        safety: Safety::Destructive,
        category: Category::Mutation,
        parameters: vec![
            ParameterSpec::required("name", "dashboard name", ParameterType::String),
            ParameterSpec::optional("widgets", "widget definitions", ParameterType::Array, json!([])),
            ParameterSpec::optional("dry_run", "preview only, no Backend mutation", ParameterType::Boolean, json!(false)),
            ParameterSpec::optional("confirm", "explicit confirmation to mutate", ParameterType::Boolean, json!(false)),
        ],
        cacheable: false,
        session_scoped: false,
        rate_class: RATE_CLASS_MUTATION,
        timeout: std::time::Duration::from_secs(30),
        session_serial: false,
        handler,
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// alerts.manage — mutation / destructive / bulk, dry-run-capable
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct AlertsManageHandler {
    pub backend: Arc<ResilientBackend>,
    pub account_id: String,
}

#[async_trait]
impl ToolHandler for AlertsManageHandler {
    async fn call(&self, ctx: &ToolContext, params: Value) -> Result<Value> {
        let policies: Vec<Value> = params.get("policies").and_then(Value::as_array).cloned().unwrap_or_default();

        if ctx.dry_run {
            let mut would_create = Vec::new();
            let mut would_modify = Vec::new();
            let mut would_delete = Vec::new();
            for policy in &policies {
                match policy.get("action").and_then(Value::as_str) {
                    Some("create") => would_create.push(policy.clone()),
                    Some("update") => would_modify.push(policy.clone()),
                    Some("delete") => would_delete.push(policy.clone()),
                    _ => {}
                }
            }
            return Ok(json!({ "would_create": would_create, "would_modify": would_modify, "would_delete": would_delete }));
        }

        // Bulk mutation: one sub-mutation per policy, independent of siblings
        // (spec.md §9 "batch members are independent" applied here too).
        let mut results = Vec::with_capacity(policies.len());
        for policy in &policies {
            let request = GraphQlRequest::new(
                "mutation ManageAlertPolicy($policy: AlertsPolicyInput!) { alertsPolicyManage(policy: $policy) { id } }",
                json!({ "policy": policy }),
                self.account_id.clone(),
            );
            match self.backend.call(RATE_CLASS_BULK, request, ctx.deadline).await {
                Ok(response) if !response.has_errors() => {
                    results.push(json!({ "policy": policy, "status": "ok", "result": response.data }));
                }
                Ok(response) => {
                    let messages: Vec<String> = response.errors.iter().map(|e| e.message.clone()).collect();
                    results.push(json!({ "policy": policy, "status": "error", "errors": messages }));
                }
                Err(e) => {
                    results.push(json!({ "policy": policy, "status": "error", "errors": [e.to_string()] }));
                }
            }
        }
        Ok(json!({ "results": results }))
    }
}

pub fn alerts_manage_descriptor(handler: Arc<AlertsManageHandler>) -> ToolDescriptor {
    ToolDescriptor {
        name: "alerts.manage",
        description: "Create, update, or delete a batch of alert policies. Destructive: requires dry_run or confirm.",
        safety: Safety::Destructive,
        category: Category::Bulk,
        parameters: vec![
            ParameterSpec::required("policies", "alert policy edits, each with an \"action\" field", ParameterType::Array),
            ParameterSpec::optional("dry_run", "preview only, no Backend mutation", ParameterType::Boolean, json!(false)),
            ParameterSpec::optional("confirm", "explicit confirmation to mutate", ParameterType::Boolean, json!(false)),
        ],
        cacheable: false,
        session_scoped: false,
        rate_class: RATE_CLASS_BULK,
        timeout: std::time::Duration::from_secs(60),
        session_serial: false,
        handler,
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// session.set / session.get — utility / safe (spec.md §4.4, Scenario F)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct SessionSetHandler;

#[async_trait]
impl ToolHandler for SessionSetHandler {
    async fn call(&self, ctx: &ToolContext, params: Value) -> Result<Value> {
        let session_id = ctx.session_id.as_deref().ok_or_else(|| Error::Validation("a session id is required".into()))?;
        let key = params
            .get("key")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Validation("key is required".into()))?
            .to_string();
        let value = params.get("value").cloned().unwrap_or(Value::Null);
        ctx.sessions.set_context(session_id, key, value)?;
        Ok(json!({ "ok": true }))
    }
}

pub fn session_set_descriptor(handler: Arc<SessionSetHandler>) -> ToolDescriptor {
    ToolDescriptor {
        name: "session.set",
        description: "Store a value in the calling session's context bag.",
        safety: Safety::Safe,
        category: Category::Utility,
        parameters: vec![
            ParameterSpec::required("key", "context key", ParameterType::String),
            ParameterSpec::required("value", "context value", ParameterType::Object),
        ],
        cacheable: false,
        session_scoped: false,
        rate_class: RATE_CLASS_UTILITY,
        timeout: std::time::Duration::from_secs(5),
        session_serial: false,
        handler,
    }
}

pub struct SessionGetHandler;

#[async_trait]
impl ToolHandler for SessionGetHandler {
    async fn call(&self, ctx: &ToolContext, params: Value) -> Result<Value> {
        let session_id = ctx.session_id.as_deref().ok_or_else(|| Error::Validation("a session id is required".into()))?;
        let key = params
            .get("key")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Validation("key is required".into()))?;
        match ctx.sessions.get_context(session_id, key)? {
            Some(value) => Ok(json!({ "value": value })),
            None => Err(Error::NotFound(format!("context key \"{key}\""))),
        }
    }
}

pub fn session_get_descriptor(handler: Arc<SessionGetHandler>) -> ToolDescriptor {
    ToolDescriptor {
        name: "session.get",
        description: "Read a value from the calling session's context bag.",
        safety: Safety::Safe,
        category: Category::Utility,
        parameters: vec![ParameterSpec::required("key", "context key", ParameterType::String)],
        cacheable: false,
        session_scoped: false,
        rate_class: RATE_CLASS_UTILITY,
        timeout: std::time::Duration::from_secs(5),
        session_serial: false,
        handler,
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Wiring
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Everything the default catalogue needs from the lower crates, owned by
/// the gateway's bootstrap and handed here to build the descriptor list.
pub struct CatalogDeps {
    pub discovery: Arc<DiscoveryEngine>,
    pub backend: Arc<ResilientBackend>,
    pub query_policy: QueryPolicyConfig,
    pub account_id: String,
}

/// Builds the representative tool catalogue described in SPEC_FULL.md
/// §4.7: one descriptor per safety class and category, covering every
/// dispatch path (safety gate, dry-run preview, rate class, cache
/// scoping). The registry stays extensible — a binary embedding this
/// crate may append further descriptors before calling
/// [`crate::registry::Registry::build`].
pub fn default_catalog(deps: CatalogDeps) -> Vec<ToolDescriptor> {
    let jobs = deps.discovery.jobs().clone();

    vec![
        list_schemas_descriptor(Arc::new(ListSchemasHandler { engine: deps.discovery.clone() })),
        profile_attributes_descriptor(Arc::new(ProfileAttributesHandler { engine: deps.discovery.clone() })),
        mine_relationships_descriptor(Arc::new(MineRelationshipsHandler { engine: deps.discovery.clone() })),
        score_quality_descriptor(Arc::new(ScoreQualityHandler { engine: deps.discovery.clone() })),
        job_status_descriptor(Arc::new(JobStatusHandler { jobs })),
        query_execute_descriptor(Arc::new(QueryExecuteHandler {
            backend: deps.backend.clone(),
            policy: deps.query_policy,
            account_id: deps.account_id.clone(),
        })),
        dashboard_create_descriptor(Arc::new(DashboardCreateHandler {
            backend: deps.backend.clone(),
            account_id: deps.account_id.clone(),
        })),
        alerts_manage_descriptor(Arc::new(AlertsManageHandler {
            backend: deps.backend.clone(),
            account_id: deps.account_id.clone(),
        })),
        session_set_descriptor(Arc::new(SessionSetHandler)),
        session_get_descriptor(Arc::new(SessionGetHandler)),
    ]
}
