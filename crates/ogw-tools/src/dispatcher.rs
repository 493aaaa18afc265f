//! Dispatcher (spec.md §4.7 "Dispatch algorithm"): the eight-step pipeline
//! that turns a `tools/call` invocation into a response, plus the
//! `tools/list` and `ping` methods (spec.md §6, SPEC_FULL.md §4.8).

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use parking_lot::Mutex as SyncMutex;
use serde_json::Value;
use tokio::sync::Mutex as AsyncMutex;

use ogw_cache::{derive_cache_key, Cache};
use ogw_domain::error::{Error, Result};
use ogw_domain::trace::TraceEvent;
use ogw_protocol::{ErrorType, JsonRpcError};
use ogw_resilience::RateLimiterRegistry;
use ogw_sessions::SessionStore;

use crate::descriptor::{Safety, ToolContext, ToolDescriptor, ToolHandler};
use crate::params::validate_and_coerce;
use crate::registry::Registry;

pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct Dispatcher {
    registry: Registry,
    cache: Arc<Cache>,
    rate_limiter: Arc<RateLimiterRegistry>,
    sessions: Arc<SessionStore>,
    account_scope: String,
    started_at: Instant,
    /// One lock per `(session_id, tool name)` pair, held for the duration of
    /// a `session_serial` tool's cache/handler step so that concurrent calls
    /// to that tool within the same session run one at a time (spec.md §4.7
    /// "Concurrency": "A single session handles requests serially only if
    /// the tool descriptor marks itself `session_serial`"). Built lazily;
    /// unrelated `(session, tool)` pairs never contend.
    session_serial_locks: SyncMutex<HashMap<(String, &'static str), Arc<AsyncMutex<()>>>>,
}

impl Dispatcher {
    pub fn new(
        registry: Registry,
        cache: Arc<Cache>,
        rate_limiter: Arc<RateLimiterRegistry>,
        sessions: Arc<SessionStore>,
        account_scope: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            cache,
            rate_limiter,
            sessions,
            account_scope: account_scope.into(),
            started_at: Instant::now(),
            session_serial_locks: SyncMutex::new(HashMap::new()),
        }
    }

    /// Returns the `(session_id, tool)`-scoped lock used to serialise
    /// `session_serial` tool invocations, creating it on first use.
    fn session_serial_lock(&self, session_id: &str, tool_name: &'static str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.session_serial_locks.lock();
        locks
            .entry((session_id.to_string(), tool_name))
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Routes a JSON-RPC method (spec.md §4.8/§6): `tools/list`,
    /// `tools/call`, and the ambient `ping` liveness method. Any other
    /// method is `method_not_found`.
    pub async fn handle(&self, method: &str, params: &Value, session_id: Option<String>, request_id: Option<String>, deadline: Duration) -> std::result::Result<Value, JsonRpcError> {
        match method {
            "tools/list" => Ok(serde_json::to_value(self.registry.list()).unwrap_or(Value::Null)),
            "tools/call" => self.dispatch_tool_call(params, session_id, request_id, deadline).await,
            "ping" => Ok(serde_json::json!({
                "version": SERVER_VERSION,
                "uptime_secs": self.started_at.elapsed().as_secs(),
            })),
            other => {
                let known = ["tools/list", "tools/call", "ping"];
                let suggestion = crate::fuzzy::closest_match(other, known.into_iter(), 3);
                Err(JsonRpcError::method_not_found(other, suggestion))
            }
        }
    }

    async fn dispatch_tool_call(&self, params: &Value, session_id: Option<String>, request_id: Option<String>, deadline: Duration) -> std::result::Result<Value, JsonRpcError> {
        let name = params.get("name").and_then(Value::as_str).ok_or_else(|| {
            JsonRpcError::invalid_params("name", "tools/call requires a \"name\" field")
        })?;
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Object(Default::default()));
        self.call_tool(name, arguments, session_id, request_id, deadline).await
    }

    /// The eight-step algorithm of spec.md §4.7.
    pub async fn call_tool(&self, tool_name: &str, arguments: Value, session_id: Option<String>, request_id: Option<String>, deadline: Duration) -> std::result::Result<Value, JsonRpcError> {
        let start = Instant::now();

        // 1. Lookup, with fuzzy suggestion on miss.
        let descriptor = match self.registry.get(tool_name) {
            Some(d) => d,
            None => {
                let suggestion = self.registry.fuzzy_suggest(tool_name);
                return Err(JsonRpcError::method_not_found(tool_name, suggestion));
            }
        };

        // 2. Validate/coerce parameters, unknown params rejected.
        let effective_params = validate_and_coerce(&arguments, &descriptor.parameters)
            .map_err(|e| JsonRpcError::invalid_params(&e.field, e.message).with_tool(tool_name))?;

        // 3. Rate-class token (may wait up to the remaining deadline).
        self.rate_limiter
            .acquire(descriptor.rate_class, deadline)
            .await
            .map_err(|e| JsonRpcError::from(e).with_tool(tool_name))?;

        let dry_run = effective_params.get("dry_run").and_then(Value::as_bool).unwrap_or(false);
        let confirm = effective_params.get("confirm").and_then(Value::as_bool).unwrap_or(false);

        // 4. Destructive gating.
        if descriptor.safety == Safety::Destructive && !dry_run && !confirm {
            return Err(JsonRpcError::new(
                ErrorType::PermissionDenied,
                "destructive tools require dry_run=true or confirm=true",
            )
            .with_tool(tool_name));
        }

        TraceEvent::ToolDispatched {
            tool: tool_name.to_string(),
            safety: safety_str(descriptor.safety),
            dry_run,
            request_id: request_id.clone(),
        }
        .emit();

        let remaining = deadline.saturating_sub(start.elapsed());
        let handler_deadline = remaining.min(descriptor.timeout);

        // Materialise/touch the session before the handler runs so
        // `last_activity` is updated happen-before any context read the
        // handler performs (spec.md §5 "Session `last_activity` updates
        // happen-before subsequent reads of that session's context").
        let resolved_session_id = session_id.map(|id| self.sessions.get_or_create(Some(id)));

        let ctx = ToolContext {
            session_id: resolved_session_id,
            request_id: request_id.clone(),
            dry_run,
            deadline: handler_deadline,
            sessions: self.sessions.clone(),
        };

        // 5/6. Cache lookup (single-flight on miss) or direct invocation,
        // bounded by the handler deadline.
        let outcome = tokio::time::timeout(handler_deadline, self.execute(descriptor, ctx, effective_params, dry_run))
            .await
            .unwrap_or_else(|_| Err(Error::Timeout(format!("tool \"{tool_name}\" exceeded its deadline"))));

        // 7. Audit caution/destructive tools regardless of outcome.
        if descriptor.safety != Safety::Safe {
            TraceEvent::ToolAudit {
                tool: tool_name.to_string(),
                safety: safety_str(descriptor.safety),
                outcome: if outcome.is_ok() { "success" } else { "error" },
                duration_ms: start.elapsed().as_millis() as u64,
            }
            .emit();
        }

        // 8. Translate through the error taxonomy.
        outcome.map_err(|e| JsonRpcError::from(e).with_tool(tool_name))
    }

    async fn execute(&self, descriptor: &ToolDescriptor, ctx: ToolContext, params: Value, dry_run: bool) -> Result<Value> {
        // Serialise concurrent calls to a `session_serial` tool within the
        // same session; held across the cache/handler step below so a
        // second call for the same (session, tool) waits for the first to
        // finish rather than racing it (spec.md §4.7 "Concurrency"). A tool
        // invoked without a session id has nothing to serialise against.
        let _session_serial_guard = match (descriptor.session_serial, ctx.session_id.as_deref()) {
            (true, Some(session_id)) => Some(self.session_serial_lock(session_id, descriptor.name).lock_owned().await),
            _ => None,
        };

        let handler = descriptor.handler.clone();

        if descriptor.cacheable && !dry_run {
            let cache_key = derive_cache_key(
                descriptor.name,
                &params,
                &self.account_scope,
                if descriptor.session_scoped { ctx.session_id.as_deref() } else { None },
            );
            let params_for_fetch = params.clone();
            self.cache
                .get_or_fetch(&cache_key, None, move || async move { run_handler(handler, ctx, params_for_fetch).await })
                .await
        } else {
            run_handler(handler, ctx, params).await
        }
    }
}

/// Invokes the handler inside a panic guard (spec.md §7: "Handler bug /
/// unhandled panic -> `internal_error`... one handler crash must not
/// terminate the server").
async fn run_handler(handler: Arc<dyn ToolHandler>, ctx: ToolContext, params: Value) -> Result<Value> {
    let future = AssertUnwindSafe(async move { handler.call(&ctx, params).await });
    match future.catch_unwind().await {
        Ok(result) => result,
        Err(_) => Err(Error::Internal("tool handler panicked".to_string())),
    }
}

fn safety_str(safety: Safety) -> &'static str {
    match safety {
        Safety::Safe => "safe",
        Safety::Caution => "caution",
        Safety::Destructive => "destructive",
    }
}
