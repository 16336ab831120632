use crate::adapters::logging::DebugAdapterLogger;
use serde_json::{json, Value};
use tracing::error;

/// Python debugpy adapter configuration
pub struct PythonAdapter;

impl PythonAdapter {
    pub fn command() -> String {
        "python".to_string()
    }

    pub fn args() -> Vec<String> {
        vec!["-m".to_string(), "debugpy.adapter".to_string()]
    }

    pub fn adapter_id() -> &'static str {
        "debugpy"
    }

    pub fn launch_args(program: &str, args: &[String], cwd: Option<&str>) -> Value {
        Self::launch_args_with_options(program, args, cwd, false)
    }

    pub fn launch_args_with_options(
        program: &str,
        args: &[String],
        cwd: Option<&str>,
        stop_on_entry: bool,
    ) -> Value {
        let mut launch = json!({
            "request": "launch",
            "type": "python",
            "program": program,
            "args": args,
            "console": "integratedTerminal",
            "stopOnEntry": stop_on_entry,
        });

        if let Some(cwd_path) = cwd {
            launch["cwd"] = json!(cwd_path);
        }

        launch
    }
}

// ============================================================================
// DebugAdapterLogger Trait Implementation
// ============================================================================

impl DebugAdapterLogger for PythonAdapter {
    fn language_name(&self) -> &str {
        "Python"
    }

    fn language_emoji(&self) -> &str {
        "🐍"
    }

    fn transport_type(&self) -> &str {
        "STDIO"
    }

    fn adapter_id(&self) -> &str {
        "debugpy"
    }

    fn command_line(&self) -> String {
        "python -m debugpy.adapter".to_string()
    }

    fn log_spawn_error(&self, error: &dyn std::error::Error) {
        error!("❌ [PYTHON] Failed to spawn debugpy adapter: {}", error);
        error!("   Command: {}", self.command_line());
        error!("   ");
        error!("   Possible causes:");
        error!("   1. debugpy not installed → pip install debugpy");
        error!("   2. python not in PATH → which python");
        error!("   ");
        error!("   Troubleshooting:");
        error!("   $ python -c 'import debugpy; print(debugpy.__version__)'");
    }

    fn log_connection_error(&self, error: &dyn std::error::Error) {
        error!("❌ [PYTHON] Adapter connection failed: {}", error);
        error!("   Transport: STDIO");
        error!("   ");
        error!("   Possible causes:");
        error!("   1. debugpy adapter process crashed before responding");
        error!("   2. Python version incompatible with debugpy");
    }

    fn log_init_error(&self, error: &dyn std::error::Error) {
        error!("❌ [PYTHON] DAP initialization failed: {}", error);
        error!("   Possible causes:");
        error!("   1. debugpy adapter did not complete the initialize handshake");
        error!("   2. Target script has syntax errors");
    }
}
