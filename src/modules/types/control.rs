//! Supervisor/worker control protocol
//!
//! The worker writes line-oriented text to stdout. A line that parses as a
//! JSON object carrying the [`RESTART_KEY`] key is a control message; every
//! other line is ordinary log output that the supervisor passes through.

use serde::Serialize;

use crate::Fingerprint;

/// Key whose presence marks a restart request
pub const RESTART_KEY: &str = "restart";

/// Structured message sent from the worker to the supervisor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlMessage {
    /// Ask the supervisor to relaunch the worker
    Restart {
        /// File whose change triggered the request, relative to the data root
        file: Option<String>,
        /// Fingerprint of the changed content
        fingerprint: Option<Fingerprint>,
    },
}

#[derive(Serialize)]
struct RestartLine<'a> {
    restart: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fingerprint: Option<&'a str>,
}

impl ControlMessage {
    /// A restart request with no attached details
    pub fn restart() -> Self {
        ControlMessage::Restart {
            file: None,
            fingerprint: None,
        }
    }

    /// A restart request triggered by a change to `file`
    pub fn restart_for(file: impl Into<String>, fingerprint: Fingerprint) -> Self {
        ControlMessage::Restart {
            file: Some(file.into()),
            fingerprint: Some(fingerprint),
        }
    }

    /// Encode as a single JSON line (no trailing newline)
    pub fn to_line(&self) -> String {
        match self {
            ControlMessage::Restart { file, fingerprint } => {
                let line = RestartLine {
                    restart: true,
                    file: file.as_deref(),
                    fingerprint: fingerprint.as_ref().map(Fingerprint::as_str),
                };
                // Serializing a struct of strings and a bool cannot fail
                serde_json::to_string(&line).unwrap_or_else(|_| r#"{"restart":true}"#.to_string())
            }
        }
    }
}

/// Classification of one line of worker output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamLine {
    /// Free-form log output
    Log(String),
    /// Control message
    Control(ControlMessage),
}

impl StreamLine {
    /// Classify a line read from the worker's stdout
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if !trimmed.starts_with('{') {
            return StreamLine::Log(line.to_string());
        }

        match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(serde_json::Value::Object(map)) if map.contains_key(RESTART_KEY) => {
                let file = map
                    .get("file")
                    .and_then(|v| v.as_str())
                    .map(str::to_string);
                let fingerprint = map
                    .get("fingerprint")
                    .and_then(|v| v.as_str())
                    .map(Fingerprint::from_hex);
                StreamLine::Control(ControlMessage::Restart { file, fingerprint })
            }
            _ => StreamLine::Log(line.to_string()),
        }
    }

    /// Whether this line asks for a restart
    pub fn is_restart(&self) -> bool {
        matches!(self, StreamLine::Control(ControlMessage::Restart { .. }))
    }
}
