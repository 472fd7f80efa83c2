//! Application configuration.
//!
//! Values are plain structs handed to the client and session by the caller.
//! Nothing in the core reads the environment on its own; `Environment` and the
//! presets below exist so the embedding application can pick sensible
//! defaults for where it is running.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Application-level constants
pub const APP_NAME: &str = "BitBot";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_DESCRIPTION: &str = "AI Assistant powered by LangChain and LangGraph";

/// Deployment environment, detected from the hostname serving the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    /// `localhost` / `127.0.0.1` is development, static-site hosts are
    /// production, anything else is staging.
    pub fn from_hostname(hostname: &str) -> Self {
        let host = hostname.trim().to_ascii_lowercase();
        if host == "localhost" || host == "127.0.0.1" {
            Environment::Development
        } else if host.contains(".github.io") || host.contains("pages.dev") {
            Environment::Production
        } else {
            Environment::Staging
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ═══════════════════════════════════════════
// Config sections
// ═══════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}

impl Default for AppInfo {
    fn default() -> Self {
        Self {
            name: APP_NAME.into(),
            version: APP_VERSION.into(),
            description: APP_DESCRIPTION.into(),
        }
    }
}

/// Backend connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    /// Hard timeout for a single attempt.
    #[serde(with = "duration_millis")]
    pub timeout: Duration,
    /// Total attempts per request, including the first.
    pub retry_attempts: u32,
    /// Linear backoff unit: attempt `n` failing waits `retry_delay * n`.
    #[serde(with = "duration_millis")]
    pub retry_delay: Duration,
    /// Answer locally with canned replies instead of calling the backend.
    pub demo_mode: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            timeout: Duration::from_secs(30),
            retry_attempts: 3,
            retry_delay: Duration::from_millis(1000),
            demo_mode: true,
        }
    }
}

/// Limits applied by the chat session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatLimits {
    pub max_message_length: usize,
    pub history_limit: usize,
    /// How many past messages accompany a new message as context.
    pub context_messages: usize,
    /// Minimum demo-bot "thinking" time. The demo adds up to twice this
    /// again at random.
    #[serde(with = "duration_millis")]
    pub typing_delay: Duration,
}

impl Default for ChatLimits {
    fn default() -> Self {
        Self {
            max_message_length: 1000,
            history_limit: 100,
            context_messages: 10,
            typing_delay: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_level: String,
    pub show_network_logs: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_level: "error".into(),
            show_network_logs: false,
        }
    }
}

/// Full configuration for one chat widget instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    pub environment: Environment,
    pub app: AppInfo,
    pub api: ApiConfig,
    pub chat: ChatLimits,
    pub debug: DebugConfig,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::for_environment(Environment::Development)
    }
}

impl ChatConfig {
    /// Preset configuration for an environment.
    pub fn for_environment(environment: Environment) -> Self {
        let (base_url, demo_mode, debug) = match environment {
            Environment::Development => (
                "http://localhost:8000",
                true,
                DebugConfig {
                    enabled: true,
                    log_level: "debug".into(),
                    show_network_logs: true,
                },
            ),
            Environment::Staging => (
                "https://staging-api.bitbot.dev",
                false,
                DebugConfig {
                    enabled: true,
                    log_level: "info".into(),
                    show_network_logs: false,
                },
            ),
            // Production keeps demo mode until the backend ships.
            Environment::Production => ("https://api.bitbot.dev", true, DebugConfig::default()),
        };

        Self {
            environment,
            app: AppInfo::default(),
            api: ApiConfig {
                base_url: base_url.into(),
                demo_mode,
                ..ApiConfig::default()
            },
            chat: ChatLimits::default(),
            debug,
        }
    }

    /// Preset for the environment serving `hostname`.
    pub fn for_hostname(hostname: &str) -> Self {
        Self::for_environment(Environment::from_hostname(hostname))
    }

    /// Merge runtime overrides on top of this configuration.
    /// Only fields set in `overrides` change.
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(v) = overrides.base_url {
            self.api.base_url = v;
        }
        if let Some(v) = overrides.timeout {
            self.api.timeout = v;
        }
        if let Some(v) = overrides.retry_attempts {
            self.api.retry_attempts = v;
        }
        if let Some(v) = overrides.retry_delay {
            self.api.retry_delay = v;
        }
        if let Some(v) = overrides.demo_mode {
            self.api.demo_mode = v;
        }
        if let Some(v) = overrides.max_message_length {
            self.chat.max_message_length = v;
        }
        if let Some(v) = overrides.history_limit {
            self.chat.history_limit = v;
        }
        if let Some(v) = overrides.log_level {
            self.debug.log_level = v;
        }
    }

    /// `tracing` filter for this configuration. Falls back to
    /// [`default_log_filter`] when debug output is off.
    /// `show_network_logs` opens the request client's per-attempt logs.
    pub fn log_filter(&self) -> String {
        let mut filter = if self.debug.enabled && !self.debug.log_level.trim().is_empty() {
            format!("warn,bitbot_lib={}", self.debug.log_level.trim())
        } else {
            default_log_filter()
        };
        if self.debug.show_network_logs {
            filter.push_str(",bitbot_lib::client=debug");
        }
        filter
    }

    /// Consuming variant of [`ChatConfig::apply`].
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        self.apply(overrides);
        self
    }
}

/// Sparse set of runtime overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    #[serde(default, with = "opt_duration_millis")]
    pub timeout: Option<Duration>,
    pub retry_attempts: Option<u32>,
    #[serde(default, with = "opt_duration_millis")]
    pub retry_delay: Option<Duration>,
    pub demo_mode: Option<bool>,
    pub max_message_length: Option<usize>,
    pub history_limit: Option<usize>,
    pub log_level: Option<String>,
}

/// Default `tracing` filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> String {
    format!("warn,bitbot_lib={}", default_log_level())
}

fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

mod opt_duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}
