//! Server configuration shared by the worker and the supervisor

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::RouteDescriptor;

/// Host the server binds to unless overridden
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Port the server binds to unless overridden
pub const DEFAULT_PORT: u16 = 3000;

/// Settings for one worker (or `run`) process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,

    /// Bind port
    pub port: u16,

    /// URL prefix applied to every route, normalized (empty or `/prefix`)
    pub namespace: String,

    /// Root of the schema/data tree
    pub data_dir: PathBuf,

    /// Quiet period between a settled file change and the restart request
    #[serde(with = "millis")]
    pub quiet_period: Duration,

    /// First launch of this server under the current supervisor
    pub initial: bool,
}

impl ServerConfig {
    /// Create a configuration with defaults for everything except the data root
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            namespace: String::new(),
            data_dir: data_dir.into(),
            quiet_period: Duration::from_secs(2),
            initial: true,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the URL prefix; it is normalized on the way in
    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = normalize_namespace(namespace);
        self
    }

    pub fn with_quiet_period(mut self, quiet_period: Duration) -> Self {
        self.quiet_period = quiet_period;
        self
    }

    pub fn with_initial(mut self, initial: bool) -> Self {
        self.initial = initial;
        self
    }

    /// `host:port` for binding
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL used in log messages
    pub fn base_url(&self) -> String {
        format!("http://{}", self.address())
    }

    /// Full HTTP path a route is served under
    pub fn route_path(&self, route: &RouteDescriptor) -> String {
        format!("{}{}", self.namespace, route.endpoint)
    }

    /// "open" on first launch, "reopened" after a restart
    pub fn launch_word(&self) -> &'static str {
        if self.initial {
            "open"
        } else {
            "reopened"
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("./data")
    }
}

/// Normalize a URL prefix: empty stays empty, otherwise `/segment[/segment]`
pub fn normalize_namespace(namespace: &str) -> String {
    let trimmed = namespace.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
