use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Default cap on the per-session tracepoint ring buffer (spec: drop-oldest at 10k).
pub const MAX_COLLECTED_TRACES: usize = 10_000;

/// Max number of variables captured per tracepoint hit (truncated beyond this).
pub const MAX_TRACE_VARIABLES: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DebugState {
    NotStarted,
    Initializing,
    Initialized,
    Launching,
    Running,
    Stopped { thread_id: i32, reason: String },
    Terminated,
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Breakpoint {
    pub source_path: String,
    pub line: i32,
    pub column: Option<i32>,
    pub id: Option<i32>,
    pub verified: bool,
    pub condition: Option<String>,
    pub hit_condition: Option<String>,
    pub log_message: Option<String>,
    /// True if this breakpoint is a tracepoint: hitting it captures a snapshot and
    /// auto-continues instead of surfacing a `stopped` event to the caller.
    pub trace: bool,
    /// Optional JSONL file that captured snapshots are also appended to.
    pub dump_file: Option<String>,
    /// Stop auto-continuing (and start surfacing `stopped` normally) once this many
    /// dumps have been collected for this breakpoint.
    pub max_dumps: Option<usize>,
    pub dump_count: usize,
}

impl Breakpoint {
    fn new(source_path: String, line: i32) -> Self {
        Self {
            source_path,
            line,
            column: None,
            id: None,
            verified: false,
            condition: None,
            hit_condition: None,
            log_message: None,
            trace: false,
            dump_file: None,
            max_dumps: None,
            dump_count: 0,
        }
    }
}

/// Options accepted when queueing a breakpoint, mirroring the DAP `SourceBreakpoint`
/// shape plus this session manager's tracepoint/dump extensions.
#[derive(Debug, Clone, Default)]
pub struct BreakpointOptions {
    pub column: Option<i32>,
    pub condition: Option<String>,
    pub hit_condition: Option<String>,
    pub log_message: Option<String>,
    pub trace: bool,
    pub dump_file: Option<String>,
    pub max_dumps: Option<usize>,
}

/// A single tracepoint hit captured without stopping execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracePoint {
    pub hit_number: usize,
    pub timestamp_ms: i64,
    pub file: String,
    pub line: i32,
    pub function: String,
    pub variables: HashMap<String, String>,
}

/// Snapshot of where execution last stopped, kept around so `getSourceContext`/
/// `getScopes`/`getVariables` can default to "the current position" without the
/// caller re-supplying thread/frame ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopContext {
    pub thread_id: i32,
    pub frame_id: Option<i32>,
    pub reason: String,
    pub file: Option<String>,
    pub line: Option<i32>,
    pub function: String,
    pub variables: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub state: DebugState,
    pub breakpoints: HashMap<String, Vec<Breakpoint>>,
    pub threads: Vec<i32>,
    pub current_thread_id: Option<i32>,
    pub current_frame_id: Option<i32>,
    pub last_stop_context: Option<StopContext>,
    collected_traces: VecDeque<TracePoint>,
    /// `"file:line"` -> dump config, for O(1) lookup from the stopped-event handler
    /// without scanning `breakpoints`.
    dump_breakpoints: HashMap<String, (Option<String>, Option<usize>)>,
    pub exit_code: Option<i32>,
    pub error_message: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            state: DebugState::NotStarted,
            breakpoints: HashMap::new(),
            threads: Vec::new(),
            current_thread_id: None,
            current_frame_id: None,
            last_stop_context: None,
            collected_traces: VecDeque::new(),
            dump_breakpoints: HashMap::new(),
            exit_code: None,
            error_message: None,
        }
    }

    pub fn set_state(&mut self, state: DebugState) {
        if let DebugState::Stopped { thread_id, .. } = &state {
            self.current_thread_id = Some(*thread_id);
        }
        if let DebugState::Failed { error } = &state {
            self.error_message = Some(error.clone());
        }
        self.state = state;
    }

    pub fn add_breakpoint(&mut self, source: String, line: i32) {
        let bp = Breakpoint::new(source.clone(), line);
        self.upsert_breakpoint(source, bp);
    }

    /// Queue (or update in place) a breakpoint with the full set of DAP/tracepoint
    /// options. One breakpoint per (file, line) per session: re-setting the same
    /// line updates it rather than appending a duplicate.
    pub fn add_breakpoint_with_options(&mut self, source: String, line: i32, options: BreakpointOptions) {
        let mut bp = Breakpoint::new(source.clone(), line);
        bp.column = options.column;
        bp.condition = options.condition;
        bp.hit_condition = options.hit_condition;
        bp.log_message = options.log_message;
        bp.trace = options.trace;
        bp.dump_file = options.dump_file.clone();
        bp.max_dumps = options.max_dumps;

        if bp.trace {
            self.dump_breakpoints.insert(
                format!("{}:{}", source, line),
                (options.dump_file, options.max_dumps),
            );
        }

        self.upsert_breakpoint(source, bp);
    }

    fn upsert_breakpoint(&mut self, source: String, bp: Breakpoint) {
        let list = self.breakpoints.entry(source).or_insert_with(Vec::new);
        match list.iter_mut().find(|existing| existing.line == bp.line) {
            Some(existing) => *existing = bp,
            None => list.push(bp),
        }
    }

    pub fn update_breakpoint(&mut self, source: &str, line: i32, id: i32, verified: bool) {
        if let Some(bps) = self.breakpoints.get_mut(source) {
            if let Some(bp) = bps.iter_mut().find(|b| b.line == line) {
                bp.id = Some(id);
                bp.verified = verified;
            }
        }
    }

    pub fn get_breakpoints(&self, source: &str) -> Vec<Breakpoint> {
        self.breakpoints
            .get(source)
            .cloned()
            .unwrap_or_default()
    }

    /// Drop the breakpoint at `source:line`, if any, including its dump-target
    /// registration. Does nothing (not an error) if none existed.
    pub fn remove_breakpoint(&mut self, source: &str, line: i32) {
        if let Some(list) = self.breakpoints.get_mut(source) {
            list.retain(|bp| bp.line != line);
        }
        self.dump_breakpoints.remove(&format!("{}:{}", source, line));
    }

    /// Dump config for a "file:line" key, if that location is a tracepoint.
    pub fn dump_target(&self, source: &str, line: i32) -> Option<(Option<String>, Option<usize>)> {
        self.dump_breakpoints.get(&format!("{}:{}", source, line)).cloned()
    }

    pub fn record_trace_hit(&mut self, source: &str, line: i32) {
        if let Some(bps) = self.breakpoints.get_mut(source) {
            if let Some(bp) = bps.iter_mut().find(|b| b.line == line) {
                bp.dump_count += 1;
            }
        }
    }

    pub fn dump_count(&self, source: &str, line: i32) -> usize {
        self.breakpoints
            .get(source)
            .and_then(|bps| bps.iter().find(|b| b.line == line))
            .map(|bp| bp.dump_count)
            .unwrap_or(0)
    }

    /// Append a tracepoint hit, truncating its variable set and dropping the
    /// oldest entry if the ring buffer is at capacity.
    pub fn push_trace(&mut self, mut trace: TracePoint) {
        if trace.variables.len() > MAX_TRACE_VARIABLES {
            let keep: HashMap<String, String> = trace
                .variables
                .into_iter()
                .take(MAX_TRACE_VARIABLES)
                .collect();
            trace.variables = keep;
        }
        if self.collected_traces.len() >= MAX_COLLECTED_TRACES {
            self.collected_traces.pop_front();
        }
        self.collected_traces.push_back(trace);
    }

    pub fn get_traces(&self) -> Vec<TracePoint> {
        self.collected_traces.iter().cloned().collect()
    }

    pub fn clear_traces(&mut self) {
        self.collected_traces.clear();
    }

    pub fn set_current_position(&mut self, thread_id: i32, frame_id: Option<i32>) {
        self.current_thread_id = Some(thread_id);
        self.current_frame_id = frame_id;
    }

    pub fn set_last_stop_context(&mut self, context: StopContext) {
        self.current_thread_id = Some(context.thread_id);
        self.current_frame_id = context.frame_id;
        self.last_stop_context = Some(context);
    }

    pub fn set_exit_code(&mut self, code: i32) {
        self.exit_code = Some(code);
    }

    pub fn add_thread(&mut self, thread_id: i32) {
        if !self.threads.contains(&thread_id) {
            self.threads.push(thread_id);
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
