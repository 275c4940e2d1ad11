use std::{path::PathBuf, process::Child, sync::Mutex};

use serde::{Deserialize, Serialize};

use crate::idle_watcher::IdleWatcher;

/// Packaged backend description shipped under `resources/backend/`.
#[derive(Debug, Deserialize)]
pub(crate) struct RuntimeManifest {
    pub(crate) command: Option<String>,
    pub(crate) entrypoint: Option<String>,
}

#[derive(Debug)]
pub(crate) struct LaunchPlan {
    pub(crate) cmd: String,
    pub(crate) args: Vec<String>,
    pub(crate) cwd: PathBuf,
    pub(crate) packaged_mode: bool,
}

/// `NotStarted` -> `Starting` -> `Running` -> `Exited`. The shell never
/// restarts an exited backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum BackendStatus {
    #[default]
    NotStarted,
    Starting,
    Running,
    Exited(Option<i32>),
}

impl BackendStatus {
    pub(crate) fn label(self) -> String {
        match self {
            Self::NotStarted => "not-started".to_string(),
            Self::Starting => "starting".to_string(),
            Self::Running => "running".to_string(),
            Self::Exited(Some(code)) => format!("exited({code})"),
            Self::Exited(None) => "exited(signal)".to_string(),
        }
    }
}

/// Endpoint handshake payload; immutable once the backend is `Running`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiConfig {
    pub(crate) host: String,
    pub(crate) port: u16,
}

/// Owns the backend child; reached through `Manager::state`, never a
/// process-wide global.
#[derive(Debug, Default)]
pub(crate) struct BackendState {
    pub(crate) child: Mutex<Option<Child>>,
    pub(crate) status: Mutex<BackendStatus>,
    pub(crate) api_config: Mutex<Option<ApiConfig>>,
}

impl BackendState {
    pub(crate) fn status(&self) -> BackendStatus {
        self.status
            .lock()
            .map(|guard| *guard)
            .unwrap_or(BackendStatus::NotStarted)
    }

    pub(crate) fn set_status(&self, status: BackendStatus) {
        if let Ok(mut guard) = self.status.lock() {
            *guard = status;
        }
    }

    pub(crate) fn api_config(&self) -> Option<ApiConfig> {
        self.api_config.lock().ok().and_then(|guard| guard.clone())
    }

    pub(crate) fn set_api_config(&self, config: ApiConfig) {
        if let Ok(mut guard) = self.api_config.lock() {
            *guard = Some(config);
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BackendBridgeState {
    pub(crate) running: bool,
    pub(crate) status: String,
    pub(crate) port: Option<u16>,
}

/// At most one idle watcher per session.
#[derive(Default)]
pub(crate) struct IdleSessionState {
    pub(crate) watcher: Mutex<Option<IdleWatcher>>,
}

/// Event names outside this set are rejected at the bridge boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ActivityKind {
    PointerMove,
    KeyPress,
    Click,
}

impl std::str::FromStr for ActivityKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "pointermove" | "mousemove" => Ok(Self::PointerMove),
            "keydown" | "keypress" => Ok(Self::KeyPress),
            "click" | "mousedown" => Ok(Self::Click),
            other => Err(format!("Unsupported activity event '{other}'.")),
        }
    }
}
