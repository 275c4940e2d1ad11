use std::env;

use crate::MODE_ENV;

/// Which backend and which window content the shell should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StartupMode {
    Development,
    Production,
}

impl StartupMode {
    /// Environment override first, build profile otherwise.
    pub(crate) fn resolve() -> Self {
        if let Ok(raw) = env::var(MODE_ENV) {
            if let Some(mode) = Self::parse(&raw) {
                return mode;
            }
        }

        if cfg!(debug_assertions) {
            Self::Development
        } else {
            Self::Production
        }
    }

    pub(crate) fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}
