//! Observable state of the script supervisor.

use serde::Serialize;

/// Snapshot of the current (or most recent) script run.
///
/// `logs` keeps the previous run's lines after it finishes and is cleared
/// when the next run starts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScriptRun {
    pub running: bool,
    pub current_script: Option<String>,
    pub logs: Vec<String>,
}

impl ScriptRun {
    /// Enter the running state for the script named `script_name` with an
    /// empty log.
    pub fn start(&mut self, script_name: &str) {
        self.running = true;
        self.current_script = Some(script_name.to_string());
        self.logs.clear();
    }

    /// Return to idle, keeping the log for inspection.
    pub fn finish(&mut self) {
        self.running = false;
        self.current_script = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_clears_previous_logs() {
        let mut run = ScriptRun {
            logs: vec!["old".into()],
            ..Default::default()
        };
        run.start("Restart llama");
        assert!(run.running);
        assert_eq!(run.current_script.as_deref(), Some("Restart llama"));
        assert!(run.logs.is_empty());
    }

    #[test]
    fn finish_keeps_logs() {
        let mut run = ScriptRun::default();
        run.start("Restart llama");
        run.logs.push("Executing: uptime".into());
        run.finish();
        assert!(!run.running);
        assert!(run.current_script.is_none());
        assert_eq!(run.logs.len(), 1);
    }

    #[test]
    fn serializes_idle_state() {
        let json = serde_json::to_value(ScriptRun::default()).unwrap();
        assert_eq!(json, serde_json::json!({"running": false, "current_script": null, "logs": []}));
    }
}
