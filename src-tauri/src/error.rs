/// Fail-stop: the shell reports the error and exits instead of retrying.
#[derive(Debug, thiserror::Error)]
pub(crate) enum StartupError {
    #[error("failed to allocate a local backend port: {0}")]
    PortAllocation(#[source] std::io::Error),

    #[error("failed to resolve backend launch plan: {0}")]
    Launch(String),

    #[error("failed to spawn backend process '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("backend exited before becoming ready ({status})")]
    ExitedBeforeReady { status: String },

    #[error("backend produced no readiness signal within {timeout_ms}ms")]
    ReadinessTimeout { timeout_ms: u64 },

    #[error("backend process state is unavailable: {0}")]
    Process(String),
}

#[cfg(test)]
mod tests {
    use super::StartupError;

    #[test]
    fn readiness_timeout_message_names_the_budget() {
        let error = StartupError::ReadinessTimeout { timeout_ms: 20_000 };
        assert!(error.to_string().contains("20000ms"));
    }

    #[test]
    fn exited_before_ready_message_carries_the_status() {
        let error = StartupError::ExitedBeforeReady {
            status: "exit status: 3".to_string(),
        };
        assert!(error.to_string().contains("exit status: 3"));
    }
}
