pub(crate) const APP_NAME: &str = "Folio";
pub(crate) const MAIN_WINDOW_LABEL: &str = "main";

// The backend only ever binds loopback.
pub(crate) const API_HOST: &str = "127.0.0.1";

/// Line prefix the backend prints on stdout once its HTTP listener is bound.
pub(crate) const READY_SENTINEL: &str = "FOLIO_BACKEND_READY";
pub(crate) const READY_POLL_INTERVAL_MS: u64 = 200;
pub(crate) const DEV_BACKEND_TIMEOUT_MS: u64 = 20_000;
pub(crate) const PACKAGED_BACKEND_TIMEOUT_MS: u64 = 120_000;
pub(crate) const EXIT_POLL_INTERVAL_MS: u64 = 1_000;

pub(crate) const DEFAULT_DEV_SERVER_URL: &str = "http://localhost:5173/";

pub(crate) const DESKTOP_LOG_FILE: &str = "desktop.log";
pub(crate) const BACKEND_LOG_FILE: &str = "backend.log";

pub(crate) const MODE_ENV: &str = "FOLIO_DESKTOP_MODE";
pub(crate) const BACKEND_CMD_ENV: &str = "FOLIO_BACKEND_CMD";
pub(crate) const BACKEND_CWD_ENV: &str = "FOLIO_BACKEND_CWD";
pub(crate) const BACKEND_TIMEOUT_ENV: &str = "FOLIO_BACKEND_TIMEOUT_MS";
pub(crate) const DEV_SERVER_URL_ENV: &str = "FOLIO_DEV_SERVER_URL";
pub(crate) const SOURCE_DIR_ENV: &str = "FOLIO_SOURCE_DIR";

// Set on the spawned backend so it knows it is embedded in the shell.
pub(crate) const DESKTOP_CLIENT_ENV: &str = "FOLIO_DESKTOP_CLIENT";
pub(crate) const API_PORT_ENV: &str = "FOLIO_API_PORT";
