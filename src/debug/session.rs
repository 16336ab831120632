//! Debug Session Management
//!
//! This module implements debug session lifecycle and multi-session coordination.
//!
//! # Architecture Overview
//!
//! ## Single Session Mode (Python, Ruby)
//!
//! Simple 1:1 relationship between MCP session and DAP adapter:
//!
//! ```text
//! DebugSession → DapClient → Adapter (debugpy/rdbg) → User Program
//! ```
//!
//! All debugging operations (breakpoints, stepping, evaluation) go directly through
//! the single DapClient. State changes from the adapter are immediately reflected
//! in the session state.
//!
//! ## Multi-Session Mode (Node.js with vscode-js-debug)
//!
//! Complex parent-child architecture required by vscode-js-debug:
//!
//! ```text
//! DebugSession (parent)
//!   ↓
//!   ├─→ Parent DapClient → vscode-js-debug (port 12345)
//!   │                      ↓ [spawns via startDebugging]
//!   └─→ Child DapClient ──→ vscode-js-debug (SAME port 12345)
//!                          ↓ [launches with __pendingTargetId]
//!                          User Program (actual debugging happens here)
//! ```
//!
//! ### Why Multi-Session?
//!
//! vscode-js-debug uses a **parent-child session model** where:
//! - **Parent**: Coordinates debugging, doesn't run user code
//! - **Child**: Actually runs user code, sends stopped/continued events
//!
//! This enables advanced features like:
//! - Debugging multiple processes (parent + spawned children)
//! - Browser + Node.js debugging simultaneously
//! - Worker threads / cluster debugging
//!
//! ### How Child Sessions Work
//!
//! 1. Parent sends `launch` → vscode-js-debug prepares to spawn child
//! 2. vscode-js-debug sends **reverse request** `startDebugging` with `__pendingTargetId`
//! 3. MCP server spawns child connection to SAME port
//! 4. Child sends `initialize` + `launch` with `__pendingTargetId`
//! 5. vscode-js-debug matches child to pending target
//! 6. Child events forwarded to parent session state
//!
//! ### Event Forwarding
//!
//! Child session events (stopped, continued, breakpoint) are forwarded to parent
//! session state so the user sees a unified debugging experience, not separate
//! parent/child sessions.
//!
//! ### Entry Breakpoint Workaround
//!
//! `stopOnEntry: true` doesn't work on parent (parent doesn't run code).
//! Solution: Set breakpoint at first executable line on child session.
//!
//! # See Also
//!
//! - `src/debug/multi_session.rs` - MultiSessionManager implementation
//! - `src/dap/client.rs` - DapClient with reverse request handling
//! - `docs/NODEJS_ALL_TESTS_PASSING.md` - Multi-session architecture details

use super::multi_session::MultiSessionManager;
use super::state::{BreakpointOptions, DebugState, SessionState, StopContext, TracePoint};
use crate::dap::client::DapClient;
use crate::dap::types::{Source, SourceBreakpoint};
use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Append one JSONL line to a dump file, creating it if necessary. Failures are the
/// caller's to log and swallow (spec: tracepoint I/O failures never interrupt debugging).
async fn append_trace_jsonl(path: &str, trace: &TracePoint) -> std::io::Result<()> {
    let mut line = serde_json::to_string(trace).unwrap_or_default();
    line.push('\n');
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(line.as_bytes()).await
}

/// Shared handling for a `stopped` event, used by both the single-session path and the
/// multi-session child path. Refreshes the stop context (top frame + locals), then either
/// hands the hit to the tracepoint engine (which may auto-continue without surfacing a
/// `stopped` transition) or surfaces it as a normal pause.
///
/// The auto-continue is dispatched via `tokio::spawn` rather than awaited inline: reentering
/// the DAP request path from inside this handler would race the next `stopped` event.
async fn handle_stopped_event(
    client_arc: Arc<RwLock<DapClient>>,
    state_arc: Arc<RwLock<SessionState>>,
    thread_id: i32,
    reason: String,
) {
    let frames = {
        let client = client_arc.read().await;
        client.stack_trace(thread_id).await.unwrap_or_default()
    };

    let top = frames.first();
    let frame_id = top.map(|f| f.id);
    let file = top.and_then(|f| f.source.as_ref()).and_then(|s| s.path.clone());
    let line = top.map(|f| f.line);
    let function = top.map(|f| f.name.clone()).unwrap_or_default();

    let mut variables: HashMap<String, String> = HashMap::new();
    if let Some(fid) = frame_id {
        let client = client_arc.read().await;
        if let Ok(scopes) = client.scopes(fid).await {
            if let Some(scope) = scopes.iter().find(|s| s.name.to_lowercase().contains("local")) {
                if let Ok(vars) = client.variables(scope.variables_reference, None).await {
                    for v in vars {
                        variables.insert(v.name, v.value);
                    }
                }
            }
        }
    }

    let dump_target = match (file.as_deref(), line) {
        (Some(f), Some(l)) => {
            let state = state_arc.read().await;
            state.dump_target(f, l)
        }
        _ => None,
    };

    if let (Some((dump_file, max_dumps)), Some(f), Some(l)) = (dump_target, file.clone(), line) {
        // Check the cap against the count *before* this hit: hits 1..=max_dumps trace
        // and auto-continue, the (max_dumps + 1)th hit pauses without recording another
        // trace. Testing `dump_count < max_dumps` only after recording this hit would
        // trace-and-continue on the max_dumps'th hit itself, pausing one hit too late.
        let already_at_cap = {
            let state = state_arc.read().await;
            max_dumps.map(|m| state.dump_count(&f, l) >= m).unwrap_or(false)
        };

        if !already_at_cap {
            let dump_count = {
                let mut state = state_arc.write().await;
                state.record_trace_hit(&f, l);
                state.dump_count(&f, l)
            };

            let trace = TracePoint {
                hit_number: dump_count,
                timestamp_ms: now_ms(),
                file: f,
                line: l,
                function: function.clone(),
                variables: variables.clone(),
            };

            {
                let mut state = state_arc.write().await;
                state.push_trace(trace.clone());
            }

            if let Some(path) = &dump_file {
                if let Err(e) = append_trace_jsonl(path, &trace).await {
                    warn!("tracepoint dump-file write to {} failed: {}", path, e);
                }
            }

            let client_for_continue = client_arc.clone();
            tokio::spawn(async move {
                // Yield once so this runs after the current event-handling pass, not
                // reentrant inside it.
                tokio::task::yield_now().await;
                let client = client_for_continue.read().await;
                if let Err(e) = client.continue_execution(thread_id).await {
                    warn!("tracepoint auto-continue failed: {}", e);
                }
            });
            return;
        }
        // already at max_dumps: fall through and pause normally, with no extra trace.
    }

    let mut state = state_arc.write().await;
    state.set_state(DebugState::Stopped {
        thread_id,
        reason: reason.clone(),
    });
    state.set_last_stop_context(StopContext {
        thread_id,
        frame_id,
        reason,
        file,
        line,
        function,
        variables,
    });
}

/// Default time to wait for the `stopped` event after a single step request.
const STEP_WAIT_TIMEOUT_MS: u64 = 5000;

/// Which step operation `step_and_trace` should drive on each iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Over,
    Into,
    Out,
}

/// Session mode - determines how debugging operations are routed
///
/// Single mode is used for languages like Python and Ruby where the debugger
/// adapter directly handles all debugging operations.
///
/// MultiSession mode is used for adapters like vscode-js-debug that use a
/// parent-child session architecture, where the parent coordinates and children
/// do actual debugging.
pub enum SessionMode {
    /// Single session mode (Python, Ruby)
    Single { client: Arc<RwLock<DapClient>> },
    /// Multi-session mode (Node.js with vscode-js-debug)
    MultiSession {
        parent_client: Arc<RwLock<DapClient>>,
        multi_session_manager: MultiSessionManager,
        /// Port that vscode-js-debug is listening on (for spawning child connections)
        vscode_js_debug_port: u16,
    },
}

pub struct DebugSession {
    pub id: String,
    pub language: String,
    pub program: String,
    pub session_mode: SessionMode,
    pub(crate) state: Arc<RwLock<SessionState>>,
    /// Pending breakpoints that will be applied after initialization completes
    pending_breakpoints: Arc<RwLock<HashMap<String, Vec<SourceBreakpoint>>>>,
}

impl DebugSession {
    /// Create a new debug session in Single mode (for Python, Ruby)
    ///
    /// This is the default constructor for backward compatibility.
    /// For multi-session debugging (Node.js), use `new_with_mode()`.
    pub async fn new(language: String, program: String, client: DapClient) -> Result<Self> {
        let id = Uuid::new_v4().to_string();

        Ok(Self {
            id,
            language,
            program,
            session_mode: SessionMode::Single {
                client: Arc::new(RwLock::new(client)),
            },
            state: Arc::new(RwLock::new(SessionState::new())),
            pending_breakpoints: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Create a new debug session with specified mode
    ///
    /// Used for Node.js multi-session debugging with vscode-js-debug.
    pub async fn new_with_mode(
        language: String,
        program: String,
        session_mode: SessionMode,
    ) -> Result<Self> {
        let id = Uuid::new_v4().to_string();

        Ok(Self {
            id,
            language,
            program,
            session_mode,
            state: Arc::new(RwLock::new(SessionState::new())),
            pending_breakpoints: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Get the client to use for debugging operations
    ///
    /// # Parent vs Child Responsibilities (Multi-Session Mode)
    ///
    /// ## Parent Client (vscode-js-debug coordinator)
    /// - **Coordinates** multi-session debugging
    /// - Handles `launch` request (prepares child spawning)
    /// - Sends reverse requests (`startDebugging`)
    /// - **Does NOT run user code**
    /// - **Does NOT send stopped/continued events**
    /// - Use for: Initial launch coordination only
    ///
    /// ## Child Client (actual debugging)
    /// - **Runs user code** via spawned process
    /// - Sends `stopped` events (breakpoints, steps, entry)
    /// - Sends `continued` events (resume execution)
    /// - Sends `terminated` events (program exit)
    /// - Handles all debugging operations (step, evaluate, stack trace)
    /// - Use for: All debugging operations after child spawns
    ///
    /// ## Routing Logic
    /// 1. **Before child spawns**: Use parent (no choice)
    /// 2. **After child spawns**: Use child (where code runs)
    /// 3. **No child available**: Fall back to parent (with warning)
    ///
    /// This method returns the **child client if available** (preferred for debugging),
    /// otherwise falls back to parent client (only for initial launch).
    ///
    /// # Single Session Mode
    /// Returns the sole client directly (Python, Ruby) - no routing needed.
    async fn get_debug_client(&self) -> Arc<RwLock<DapClient>> {
        match &self.session_mode {
            SessionMode::Single { client } => client.clone(),
            SessionMode::MultiSession {
                parent_client,
                multi_session_manager,
                ..
            } => {
                // Try to get active child, fall back to parent
                multi_session_manager
                    .get_active_child()
                    .await
                    .unwrap_or_else(|| {
                        info!("No active child session, using parent client");
                        parent_client.clone()
                    })
            }
        }
    }

    /// Spawn a child session for multi-session debugging (Node.js vscode-js-debug)
    ///
    /// This method is called when vscode-js-debug sends a `startDebugging` reverse request
    /// with a `__pendingTargetId`. It:
    /// 1. Connects to the SAME vscode-js-debug port (not a child port)
    /// 2. Sends initialize and launch with `__pendingTargetId` in launch params
    /// 3. vscode-js-debug matches this to the pending target and handles the session
    /// 4. Registers event handlers that forward events to parent session state
    /// 5. Adds the child to the MultiSessionManager
    ///
    /// # Arguments
    ///
    /// * `target_id` - The `__pendingTargetId` from the `startDebugging` request
    ///
    /// # Returns
    ///
    /// Ok(()) if child session spawned successfully, Err otherwise
    pub async fn spawn_child_session(&self, target_id: String) -> Result<()> {
        info!(
            "🔄 [MULTI-SESSION] Spawning child session for target_id: {}",
            target_id
        );

        // Only works in multi-session mode
        let (multi_session_manager, vscode_port) = match &self.session_mode {
            SessionMode::MultiSession {
                multi_session_manager,
                vscode_js_debug_port,
                ..
            } => (multi_session_manager.clone(), *vscode_js_debug_port),
            _ => {
                return Err(crate::Error::InvalidState(
                    "spawn_child_session called on non-multi-session session".to_string(),
                ));
            }
        };

        // 1. Connect to vscode-js-debug port (SAME as parent)
        info!(
            "   Connecting to vscode-js-debug on localhost:{}",
            vscode_port
        );
        let socket = tokio::net::TcpStream::connect(("127.0.0.1", vscode_port))
            .await
            .map_err(|e| {
                crate::Error::Process(format!(
                    "Failed to connect to vscode-js-debug port {}: {}",
                    vscode_port, e
                ))
            })?;

        info!("   ✅ Connected to vscode-js-debug on port {}", vscode_port);

        // 2. Create DAP client for child
        let child_client = DapClient::from_socket(socket).await?;
        info!("   Created DAP client for child session");
        // Wrapped immediately: the stopped-event handler needs a shareable handle to
        // issue further requests (stackTrace/scopes/variables/continue) from within the
        // tracepoint engine.
        let child_client_arc = Arc::new(RwLock::new(child_client));

        // 3. Initialize child session
        let child_adapter_id = format!("nodejs-child-{}", &target_id);
        info!(
            "   Initializing child session with adapter_id: {}",
            child_adapter_id
        );
        child_client_arc
            .read()
            .await
            .initialize(&child_adapter_id)
            .await?;
        info!("   ✅ Child session initialized");

        // 4. Send launch with __pendingTargetId
        //    This tells vscode-js-debug to match this connection with the pending target
        //    NOTE: vscode-js-debug does NOT send a response to this launch request!
        //    The __pendingTargetId just matches the connection to an existing target.
        info!("   Sending launch with __pendingTargetId: {}", target_id);
        use serde_json::json;
        let launch_args = json!({
            "type": "pwa-node",
            "request": "launch",
            "__pendingTargetId": target_id,
        });

        // Send launch request without waiting for response
        // vscode-js-debug won't send a launch response for child connections
        info!("   Sending child launch request (no response expected)...");
        child_client_arc
            .read()
            .await
            .send_request_nowait("launch", Some(launch_args))
            .await?;
        info!("   ✅ Child launch request sent");

        // 5. Register event handlers for child (forward to parent state)
        info!("   Registering event handlers for child session");
        let child_client = child_client_arc.read().await;

        // Handler for 'stopped' events from child. Goes through the shared tracepoint-aware
        // path so a `trace=true` breakpoint hit on the child auto-continues just like it
        // would in single-session mode.
        let session_state = self.state.clone();
        let client_for_stopped = child_client_arc.clone();
        child_client
            .on_event("stopped", move |event| {
                info!("📍 [CHILD] Received 'stopped' event: {:?}", event);
                if let Some(body) = &event.body {
                    let thread_id = body
                        .get("threadId")
                        .and_then(|v| v.as_i64())
                        .map(|v| v as i32)
                        .unwrap_or(1);
                    let reason = body
                        .get("reason")
                        .and_then(|v| v.as_str())
                        .unwrap_or("unknown")
                        .to_string();

                    let state_clone = session_state.clone();
                    let client_clone = client_for_stopped.clone();
                    tokio::spawn(async move {
                        handle_stopped_event(client_clone, state_clone, thread_id, reason).await;
                    });
                }
            })
            .await;

        // Handler for 'continued' events from child
        let session_state = self.state.clone();
        child_client
            .on_event("continued", move |event| {
                info!("▶️  [CHILD] Received 'continued' event: {:?}", event);
                let state_clone = session_state.clone();
                tokio::spawn(async move {
                    let mut state = state_clone.write().await;
                    state.set_state(DebugState::Running);
                    info!("   ✅ Parent state updated to Running");
                });
            })
            .await;

        // Handler for 'terminated' events from child
        let session_state = self.state.clone();
        child_client
            .on_event("terminated", move |event| {
                info!("🛑 [CHILD] Received 'terminated' event: {:?}", event);
                let state_clone = session_state.clone();
                tokio::spawn(async move {
                    let mut state = state_clone.write().await;
                    state.set_state(DebugState::Terminated);
                    info!("   ✅ Parent state updated to Terminated");
                });
            })
            .await;

        // Handler for 'exited' events from child
        let session_state = self.state.clone();
        child_client
            .on_event("exited", move |event| {
                info!("🚪 [CHILD] Received 'exited' event: {:?}", event);
                let state_clone = session_state.clone();
                tokio::spawn(async move {
                    let mut state = state_clone.write().await;
                    state.set_state(DebugState::Terminated);
                    info!("   ✅ Parent state updated to Terminated (exited)");
                });
            })
            .await;

        info!("   Event handlers registered for child session");

        // 5. Set entry breakpoint on child (stopOnEntry workaround for Node.js)
        //    The child session is what actually runs the user's code, so it needs
        //    the entry breakpoint, not the parent.
        //    Use intelligent line detection to skip comments/imports.
        let entry_line =
            crate::dap::client::DapClient::find_first_executable_line_javascript(&self.program);
        info!(
            "   Setting entry breakpoint on child at line {} of {}",
            entry_line, self.program
        );
        let source = crate::dap::types::Source {
            path: Some(self.program.clone()),
            name: None,
            source_reference: None,
        };
        let entry_bp = crate::dap::types::SourceBreakpoint {
            line: entry_line as i32,
            column: None,
            condition: None,
            hit_condition: None,
                log_message: None,
        };
        match child_client
            .set_breakpoints(source.clone(), vec![entry_bp])
            .await
        {
            Ok(verified_bps) => {
                if !verified_bps.is_empty() && verified_bps[0].verified {
                    info!(
                        "   ✅ Entry breakpoint set and verified on child at line {}",
                        entry_line
                    );
                } else {
                    error!("   ❌ Entry breakpoint could not be verified on child");
                }
            }
            Err(e) => {
                error!("   ❌ Failed to set entry breakpoint on child: {}", e);
            }
        }

        // 6. Copy pending breakpoints from parent to child
        info!("   Checking for pending breakpoints to copy to child...");
        let breakpoints = self.pending_breakpoints.read().await;
        if !breakpoints.is_empty() {
            info!(
                "   Found {} files with pending breakpoints",
                breakpoints.len()
            );
            for (file, bp_list) in breakpoints.iter() {
                info!("     File: {} has {} breakpoints", file, bp_list.len());
                // Set breakpoints on child session
                let source = crate::dap::types::Source {
                    path: Some(file.clone()),
                    name: None,
                    source_reference: None,
                };

                match child_client.set_breakpoints(source, bp_list.clone()).await {
                    Ok(verified_bps) => {
                        info!(
                            "     ✅ {} breakpoints set on child for {}",
                            verified_bps.len(),
                            file
                        );
                    }
                    Err(e) => {
                        error!(
                            "     ❌ Failed to set breakpoints on child for {}: {}",
                            file, e
                        );
                    }
                }
            }
        } else {
            info!("   No pending breakpoints to copy");
        }

        // 6. Send configurationDone to child so it starts running
        info!("   Sending configurationDone to child session");
        match child_client.configuration_done().await {
            Ok(_) => info!("   ✅ Child session configuration complete"),
            Err(e) => error!("   ❌ Failed to send configurationDone to child: {}", e),
        }
        drop(child_client);

        // 7. Add to multi-session manager
        use super::multi_session::ChildSession;
        let child = ChildSession {
            id: format!("child-{}", &target_id),
            client: child_client_arc,
            port: vscode_port, // Store vscode-js-debug port, not a child-specific port
            session_type: "pwa-node".to_string(),
        };

        multi_session_manager.add_child(child).await;

        info!(
            "🎉 [MULTI-SESSION] Child session spawned successfully for target_id: {}",
            target_id
        );
        info!("   Operations will now be routed to child session");

        Ok(())
    }

    /// Initialize and launch using the proper DAP sequence
    /// This combines initialize and launch into one atomic operation
    pub async fn initialize_and_launch(
        &self,
        adapter_id: &str,
        launch_args: serde_json::Value,
    ) -> Result<()> {
        {
            let mut state = self.state.write().await;
            state.set_state(DebugState::Initializing);
        }

        let client_arc = self.get_debug_client().await;
        let client = client_arc.read().await;

        // Register event handlers BEFORE launching to capture all state changes
        info!("📡 Registering DAP event handlers for session state tracking");

        // Handler for 'stopped' events (breakpoints, steps, entry). Routed through the
        // shared tracepoint-aware handler so a `trace=true` breakpoint auto-continues
        // instead of surfacing a pause.
        let session_state = self.state.clone();
        let client_for_stopped = client_arc.clone();
        client
            .on_event("stopped", move |event| {
                info!("📍 Received 'stopped' event: {:?}", event);

                if let Some(body) = &event.body {
                    let thread_id = body
                        .get("threadId")
                        .and_then(|v| v.as_i64())
                        .map(|v| v as i32)
                        .unwrap_or(1);

                    let reason = body
                        .get("reason")
                        .and_then(|v| v.as_str())
                        .unwrap_or("unknown")
                        .to_string();

                    let state_clone = session_state.clone();
                    let client_clone = client_for_stopped.clone();
                    tokio::spawn(async move {
                        handle_stopped_event(client_clone, state_clone, thread_id, reason).await;
                    });
                }
            })
            .await;

        // Handler for 'continued' events
        let session_state = self.state.clone();
        client
            .on_event("continued", move |event| {
                info!("▶️  Received 'continued' event: {:?}", event);

                let state_clone = session_state.clone();
                tokio::spawn(async move {
                    let mut state = state_clone.write().await;
                    state.set_state(DebugState::Running);
                    info!("✅ Session state updated to Running");
                });
            })
            .await;

        // Handler for 'terminated' events
        let session_state = self.state.clone();
        client
            .on_event("terminated", move |event| {
                info!("🛑 Received 'terminated' event: {:?}", event);

                let state_clone = session_state.clone();
                tokio::spawn(async move {
                    let mut state = state_clone.write().await;
                    state.set_state(DebugState::Terminated);
                    info!("✅ Session state updated to Terminated");
                });
            })
            .await;

        // Handler for 'exited' events
        let session_state = self.state.clone();
        client
            .on_event("exited", move |event| {
                info!("🚪 Received 'exited' event: {:?}", event);

                let state_clone = session_state.clone();
                tokio::spawn(async move {
                    let mut state = state_clone.write().await;
                    state.set_state(DebugState::Terminated);
                    info!("✅ Session state updated to Terminated (exited)");
                });
            })
            .await;

        // Handler for 'thread' events (track threads)
        let session_state = self.state.clone();
        client
            .on_event("thread", move |event| {
                if let Some(body) = &event.body {
                    if let Some(thread_id) = body.get("threadId").and_then(|v| v.as_i64()) {
                        let state_clone = session_state.clone();
                        tokio::spawn(async move {
                            let mut state = state_clone.write().await;
                            state.add_thread(thread_id as i32);
                        });
                    }
                }
            })
            .await;

        // Use the DapClient's event-driven initialize_and_launch method with timeout
        // This properly handles the 'initialized' event and configurationDone sequence
        // Timeout: 7s (2s for init + 5s for launch, as per TIMEOUT_IMPLEMENTATION.md)
        // Pass adapter type for language-specific workarounds (e.g., Ruby stopOnEntry fix)
        let adapter_type = match self.language.as_str() {
            "python" => Some("python"),
            "ruby" => Some("ruby"),
            "nodejs" => Some("nodejs"),
            _ => None,
        };
        client
            .initialize_and_launch_with_timeout(adapter_id, launch_args, adapter_type)
            .await?;

        // Apply pending breakpoints after initialization
        info!("🔧 Applying pending breakpoints after initialization");
        let pending = self.pending_breakpoints.read().await;
        for (source_path, breakpoints) in pending.iter() {
            info!(
                "  Applying {} breakpoint(s) for {}",
                breakpoints.len(),
                source_path
            );
            let source = Source {
                name: None,
                path: Some(source_path.clone()),
                source_reference: None,
            };

            match client.set_breakpoints(source, breakpoints.clone()).await {
                Ok(result_bps) => {
                    // Update state with results
                    let mut state = self.state.write().await;
                    for (idx, bp) in result_bps.iter().enumerate() {
                        if let Some(id) = bp.id {
                            let line = breakpoints.get(idx).map(|b| b.line).unwrap_or(0);
                            state.update_breakpoint(source_path, line, id, bp.verified);
                        }
                    }
                    info!("  ✅ Applied {} breakpoint(s)", result_bps.len());
                }
                Err(e) => {
                    info!("  ⚠️  Failed to apply breakpoints: {}", e);
                }
            }
        }
        drop(pending);

        // Clear pending breakpoints
        self.pending_breakpoints.write().await.clear();

        // DON'T manually set state to Running here!
        // The DAP event handlers will update the state based on actual events:
        // - 'stopped' event (if stopOnEntry=true) → Stopped state
        // - 'continued' event → Running state
        // - 'terminated'/'exited' events → Terminated state
        //
        // Setting Running here causes a race condition where we overwrite
        // the Stopped state from the 'stopped' event handler.

        Ok(())
    }

    /// Initialize and launch in the background, returning immediately
    /// Updates state to indicate initialization status
    pub async fn initialize_and_launch_async(
        self: Arc<Self>,
        adapter_id: String,
        launch_args: serde_json::Value,
    ) {
        let session_id = self.id.clone();
        info!(
            "🚀 Starting async initialization for session {}",
            session_id
        );

        match self.initialize_and_launch(&adapter_id, launch_args).await {
            Ok(()) => {
                info!(
                    "✅ Async initialization completed successfully for session {}",
                    session_id
                );
            }
            Err(e) => {
                info!(
                    "❌ Async initialization failed for session {}: {}",
                    session_id, e
                );
                let mut state = self.state.write().await;
                state.set_state(DebugState::Failed {
                    error: format!("Initialization failed: {}", e),
                });
            }
        }
    }

    // Deprecated: Use initialize_and_launch instead
    // Kept for backward compatibility
    pub async fn initialize(&self, adapter_id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state.set_state(DebugState::Initializing);
        drop(state);

        let client_arc = self.get_debug_client().await;
        let client = client_arc.read().await;
        client.initialize(adapter_id).await?;

        let mut state = self.state.write().await;
        state.set_state(DebugState::Initialized);

        Ok(())
    }

    // Deprecated: Use initialize_and_launch instead
    // Kept for backward compatibility
    pub async fn launch(&self, launch_args: serde_json::Value) -> Result<()> {
        let mut state = self.state.write().await;
        state.set_state(DebugState::Launching);
        drop(state);

        let client_arc = self.get_debug_client().await;
        let client = client_arc.read().await;
        client.launch(launch_args).await?;

        let mut state = self.state.write().await;
        state.set_state(DebugState::Running);

        Ok(())
    }

    pub async fn set_breakpoint(&self, source_path: String, line: i32) -> Result<bool> {
        self.set_breakpoint_with_options(source_path, line, BreakpointOptions::default())
            .await
    }

    /// Queue (or re-set) a breakpoint at `source_path:line` with the full set of DAP/
    /// tracepoint options. In `created`/`initializing` state the breakpoint is only
    /// recorded as pending (applied once the adapter is ready). Otherwise the adapter's
    /// full desired set for the file is re-sent, since `setBreakpoints` replaces the
    /// file's breakpoints atomically rather than adding one at a time.
    pub async fn set_breakpoint_with_options(
        &self,
        source_path: String,
        line: i32,
        options: BreakpointOptions,
    ) -> Result<bool> {
        let current_state = {
            let state = self.state.read().await;
            state.state.clone()
        };

        let dap_bp = SourceBreakpoint {
            line,
            column: options.column,
            condition: options.condition.clone(),
            hit_condition: options.hit_condition.clone(),
            log_message: options.log_message.clone(),
        };

        match current_state {
            DebugState::NotStarted | DebugState::Initializing => {
                info!(
                    "📌 Session initializing, storing breakpoint as pending: {}:{}",
                    source_path, line
                );
                let mut pending = self.pending_breakpoints.write().await;
                pending
                    .entry(source_path.clone())
                    .or_insert_with(Vec::new)
                    .push(dap_bp);

                let mut state = self.state.write().await;
                state.add_breakpoint_with_options(source_path, line, options);

                // Pending: the caller sees verified=false until the adapter acks it.
                Ok(false)
            }
            DebugState::Running
            | DebugState::Stopped { .. }
            | DebugState::Initialized
            | DebugState::Launching => {
                // The in-memory table is the authoritative desired state; re-issuing the
                // full per-file set is how DAP `setBreakpoints` works (it's not additive).
                let breakpoints_for_file = {
                    let mut state = self.state.write().await;
                    state.add_breakpoint_with_options(source_path.clone(), line, options);
                    state.get_breakpoints(&source_path)
                };

                let source = Source {
                    name: None,
                    path: Some(source_path.clone()),
                    source_reference: None,
                };

                let dap_breakpoints: Vec<SourceBreakpoint> = breakpoints_for_file
                    .iter()
                    .map(|bp| SourceBreakpoint {
                        line: bp.line,
                        column: bp.column,
                        condition: bp.condition.clone(),
                        hit_condition: bp.hit_condition.clone(),
                        log_message: bp.log_message.clone(),
                    })
                    .collect();

                let client_arc = self.get_debug_client().await;
                let client = client_arc.read().await;
                let result = client.set_breakpoints(source, dap_breakpoints).await?;

                let mut state = self.state.write().await;
                let mut verified_at_line = false;
                for (bp, result_bp) in breakpoints_for_file.iter().zip(result.iter()) {
                    if let Some(id) = result_bp.id {
                        state.update_breakpoint(&source_path, bp.line, id, result_bp.verified);
                    }
                    if bp.line == line {
                        verified_at_line = result_bp.verified;
                    }
                }
                Ok(verified_at_line)
            }
            DebugState::Terminated | DebugState::Failed { .. } => Err(crate::Error::InvalidState(
                format!("Cannot set breakpoint in state: {:?}", current_state),
            )),
        }
    }

    /// Remove a breakpoint at `source_path:line` and re-issue the file's remaining set.
    /// Returns `false` (without erroring) if no breakpoint existed at that line.
    pub async fn remove_breakpoint(&self, source_path: String, line: i32) -> Result<bool> {
        let had_it = {
            let state = self.state.read().await;
            state
                .get_breakpoints(&source_path)
                .iter()
                .any(|bp| bp.line == line)
        };
        if !had_it {
            return Ok(false);
        }

        let remaining = {
            let mut state = self.state.write().await;
            state.remove_breakpoint(&source_path, line);
            state.get_breakpoints(&source_path)
        };

        let current_state = self.get_state().await;
        if matches!(
            current_state,
            DebugState::Running | DebugState::Stopped { .. } | DebugState::Initialized | DebugState::Launching
        ) {
            let source = Source {
                name: None,
                path: Some(source_path.clone()),
                source_reference: None,
            };
            let dap_breakpoints: Vec<SourceBreakpoint> = remaining
                .iter()
                .map(|bp| SourceBreakpoint {
                    line: bp.line,
                    column: bp.column,
                    condition: bp.condition.clone(),
                    hit_condition: bp.hit_condition.clone(),
                    log_message: bp.log_message.clone(),
                })
                .collect();
            let client_arc = self.get_debug_client().await;
            let client = client_arc.read().await;
            let result = client.set_breakpoints(source, dap_breakpoints).await?;
            let mut state = self.state.write().await;
            for (bp, result_bp) in remaining.iter().zip(result.iter()) {
                if let Some(id) = result_bp.id {
                    state.update_breakpoint(&source_path, bp.line, id, result_bp.verified);
                }
            }
        } else {
            let mut pending = self.pending_breakpoints.write().await;
            if let Some(list) = pending.get_mut(&source_path) {
                list.retain(|bp| bp.line != line);
            }
        }

        Ok(true)
    }

    /// Collected tracepoint hits for this session.
    pub async fn get_traces(&self) -> Vec<TracePoint> {
        self.state.read().await.get_traces()
    }

    pub async fn clear_traces(&self) {
        self.state.write().await.clear_traces();
    }

    /// Resolve once the next `stopped` event lands (or the session is already paused),
    /// or once `timeout_ms` elapses. Never errors on timeout -- an empty/unchanged stop
    /// context means "did not stop", which is a valid outcome for the caller to check.
    pub async fn wait_for_pause(&self, timeout_ms: u64) -> Option<StopContext> {
        let deadline = tokio::time::Instant::now() + tokio::time::Duration::from_millis(timeout_ms);
        loop {
            {
                let state = self.state.read().await;
                if matches!(state.state, DebugState::Stopped { .. }) {
                    return state.last_stop_context.clone();
                }
                if matches!(state.state, DebugState::Terminated | DebugState::Failed { .. }) {
                    return None;
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
        }
    }

    /// `continue` with the advanced modes from the tool surface: wait (and report) for
    /// the next pause, or accumulate up to `collect_hits` tracepoint-style snapshots
    /// without necessarily surfacing every intermediate stop to the caller.
    pub async fn continue_with_options(
        &self,
        wait_for_breakpoint: bool,
        collect_hits: Option<usize>,
        timeout_ms: u64,
    ) -> Result<(bool, Option<StopContext>, Vec<TracePoint>)> {
        if let Some(n) = collect_hits {
            self.clear_traces().await;
            let mut traces = Vec::new();
            let deadline = tokio::time::Instant::now() + tokio::time::Duration::from_millis(timeout_ms);
            for _ in 0..n {
                self.continue_execution().await?;
                let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
                let ctx = self.wait_for_pause(remaining.as_millis() as u64).await;
                let Some(ctx) = ctx else { break };
                traces.push(TracePoint {
                    hit_number: traces.len() + 1,
                    timestamp_ms: now_ms(),
                    file: ctx.file.clone().unwrap_or_default(),
                    line: ctx.line.unwrap_or(0),
                    function: ctx.function.clone(),
                    variables: ctx.variables.clone(),
                });
            }
            let paused = matches!(self.get_state().await, DebugState::Stopped { .. });
            return Ok((paused, None, traces));
        }

        self.continue_execution().await?;
        if wait_for_breakpoint {
            let ctx = self.wait_for_pause(timeout_ms).await;
            Ok((ctx.is_some(), ctx, Vec::new()))
        } else {
            Ok((true, None, Vec::new()))
        }
    }

    /// Step `count` times, capturing a `TracePoint` from the stop context before each
    /// step. Stops early if the session leaves the `paused` state.
    pub async fn step_and_trace(
        &self,
        count: usize,
        step_type: StepKind,
        dump_file: Option<String>,
        timeout_ms: u64,
    ) -> Result<(usize, Vec<TracePoint>)> {
        let mut traces = Vec::new();
        let mut completed = 0;
        let deadline = tokio::time::Instant::now() + tokio::time::Duration::from_millis(timeout_ms);

        for i in 0..count {
            if !matches!(self.get_state().await, DebugState::Stopped { .. }) {
                break;
            }

            if let Some(ctx) = self.state.read().await.last_stop_context.clone() {
                let trace = TracePoint {
                    hit_number: i + 1,
                    timestamp_ms: now_ms(),
                    file: ctx.file.clone().unwrap_or_default(),
                    line: ctx.line.unwrap_or(0),
                    function: ctx.function.clone(),
                    variables: ctx.variables.clone(),
                };
                if let Some(path) = &dump_file {
                    if let Err(e) = append_trace_jsonl(path, &trace).await {
                        warn!("step-and-trace dump-file write to {} failed: {}", path, e);
                    }
                }
                traces.push(trace);
            }

            let thread_id = self.current_thread_id().await;
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            let per_step_cap = remaining.min(tokio::time::Duration::from_secs(5));
            self.do_step(thread_id, step_type, per_step_cap.as_millis() as u64).await?;
            completed += 1;

            if tokio::time::Instant::now() >= deadline {
                break;
            }
        }

        Ok((completed, traces))
    }

    async fn current_thread_id(&self) -> i32 {
        let state = self.state.read().await;
        match &state.state {
            DebugState::Stopped { thread_id, .. } => *thread_id,
            _ => state.threads.first().copied().unwrap_or(1),
        }
    }

    pub async fn continue_execution(&self) -> Result<()> {
        let state = self.state.read().await;
        let thread_id = state.threads.first().copied().unwrap_or(1);
        drop(state);

        let client_arc = self.get_debug_client().await;
        let client = client_arc.read().await;
        client.continue_execution(thread_id).await?;

        let mut state = self.state.write().await;
        state.set_state(DebugState::Running);

        Ok(())
    }

    /// Issue the DAP request for `kind`, then wait up to `timeout_ms` for the resulting
    /// `stopped` event, returning the stop context (top frame + locals) if it arrives.
    async fn do_step(&self, thread_id: i32, kind: StepKind, timeout_ms: u64) -> Result<Option<StopContext>> {
        let client_arc = self.get_debug_client().await;
        {
            let client = client_arc.read().await;
            match kind {
                StepKind::Over => client.next(thread_id).await?,
                StepKind::Into => client.step_in(thread_id).await?,
                StepKind::Out => client.step_out(thread_id).await?,
            }
        }

        // State will be updated by the 'stopped' event handler when the step completes.
        Ok(self.wait_for_pause(timeout_ms).await)
    }

    pub async fn step_over(&self, thread_id: i32) -> Result<Option<StopContext>> {
        self.do_step(thread_id, StepKind::Over, STEP_WAIT_TIMEOUT_MS).await
    }

    pub async fn step_into(&self, thread_id: i32) -> Result<Option<StopContext>> {
        self.do_step(thread_id, StepKind::Into, STEP_WAIT_TIMEOUT_MS).await
    }

    pub async fn step_out(&self, thread_id: i32) -> Result<Option<StopContext>> {
        self.do_step(thread_id, StepKind::Out, STEP_WAIT_TIMEOUT_MS).await
    }

    pub async fn stack_trace(&self) -> Result<Vec<crate::dap::types::StackFrame>> {
        let state = self.state.read().await;

        // Get thread_id from the current Stopped state, or fallback to threads list
        let thread_id = match &state.state {
            DebugState::Stopped { thread_id, .. } => *thread_id,
            _ => state.threads.first().copied().unwrap_or(1),
        };
        drop(state);

        let client_arc = self.get_debug_client().await;
        let client = client_arc.read().await;
        client.stack_trace(thread_id).await
    }

    pub async fn evaluate(&self, expression: &str, frame_id: Option<i32>) -> Result<String> {
        let client_arc = self.get_debug_client().await;
        let client = client_arc.read().await;
        client.evaluate(expression, frame_id).await
    }

    pub async fn disconnect(&self) -> Result<()> {
        let client_arc = self.get_debug_client().await;
        let client = client_arc.read().await;

        // Use disconnect with 2s timeout (force cleanup if hangs)
        // If timeout occurs, we still update state to Terminated
        match client.disconnect_with_timeout().await {
            Ok(_) => info!("✅ Disconnect completed successfully"),
            Err(e) => {
                warn!(
                    "⚠️  Disconnect timeout or error: {}, proceeding with cleanup",
                    e
                );
                // Continue anyway - state will be set to Terminated
            }
        }

        let mut state = self.state.write().await;
        state.set_state(DebugState::Terminated);

        Ok(())
    }

    pub async fn get_state(&self) -> DebugState {
        let state = self.state.read().await;
        state.state.clone()
    }

    pub async fn get_full_state(&self) -> SessionState {
        let state = self.state.read().await;
        state.clone()
    }

    pub async fn pause(&self, thread_id: Option<i32>) -> Result<()> {
        let thread_id = match thread_id {
            Some(t) => t,
            None => self.current_thread_id().await,
        };
        let client_arc = self.get_debug_client().await;
        let client = client_arc.read().await;
        client.pause(thread_id).await
    }

    pub async fn get_threads(&self) -> Result<Vec<crate::dap::types::Thread>> {
        let client_arc = self.get_debug_client().await;
        let client = client_arc.read().await;
        client.threads().await
    }

    pub async fn get_scopes(&self, frame_id: Option<i32>) -> Result<Vec<crate::dap::types::Scope>> {
        let frame_id = match frame_id {
            Some(f) => f,
            None => self
                .state
                .read()
                .await
                .current_frame_id
                .ok_or_else(|| crate::Error::InvalidState("no current frame".to_string()))?,
        };
        let client_arc = self.get_debug_client().await;
        let client = client_arc.read().await;
        client.scopes(frame_id).await
    }

    /// All variables across scopes whose name contains `scope_filter` (case-insensitive),
    /// e.g. "local", "global", "closure". An unmatched filter returns an empty list, not
    /// an error. `None` returns every scope's variables, concatenated in scope order.
    pub async fn get_variables(
        &self,
        frame_id: Option<i32>,
        scope_filter: Option<&str>,
    ) -> Result<Vec<crate::dap::types::Variable>> {
        let scopes = self.get_scopes(frame_id).await?;
        let client_arc = self.get_debug_client().await;
        let client = client_arc.read().await;

        let mut out = Vec::new();
        for scope in scopes {
            let matches = scope_filter
                .map(|f| scope.name.to_lowercase().contains(&f.to_lowercase()))
                .unwrap_or(true);
            if !matches {
                continue;
            }
            out.extend(client.variables(scope.variables_reference, None).await?);
        }
        Ok(out)
    }

    pub async fn expand_variable(
        &self,
        variables_reference: i32,
    ) -> Result<Vec<crate::dap::types::Variable>> {
        let client_arc = self.get_debug_client().await;
        let client = client_arc.read().await;
        client.variables(variables_reference, None).await
    }

    /// A window of `file` around `line` (default +/-5), clipped to the file's bounds,
    /// annotated with whether each line is the current position or carries a breakpoint.
    /// Returns `None` if the file can't be read.
    pub async fn get_source_context(
        &self,
        file: &str,
        line: i32,
        lines_context: Option<i32>,
    ) -> Option<Vec<crate::dap::types::SourceContextLine>> {
        let content = tokio::fs::read_to_string(file).await.ok()?;
        let total_lines = content.lines().count() as i32;
        let context = lines_context.unwrap_or(5).max(0);

        let start = (line - context).max(1);
        let end = (line + context).min(total_lines.max(1));

        let breakpoint_lines: std::collections::HashSet<i32> = {
            let state = self.state.read().await;
            state
                .get_breakpoints(file)
                .iter()
                .map(|bp| bp.line)
                .collect()
        };

        let lines: Vec<crate::dap::types::SourceContextLine> = content
            .lines()
            .enumerate()
            .map(|(idx, text)| (idx as i32 + 1, text))
            .filter(|(n, _)| *n >= start && *n <= end)
            .map(|(n, text)| crate::dap::types::SourceContextLine {
                line: n,
                text: text.to_string(),
                is_current: n == line,
                has_breakpoint: breakpoint_lines.contains(&n),
            })
            .collect();

        Some(lines)
    }
}
