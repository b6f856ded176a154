use serde_derive::{Deserialize, Serialize};

use crate::{errors::ReporterError, toggles::Toggles};

fn default_host() -> String {
    "[::]".to_owned()
}

fn default_port() -> String {
    "8080".to_owned()
}

/// Layout of the report body.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Timestamp header, a blank line after every section, long client form.
    #[default]
    Full,
    /// No timestamp, blank lines only between sections, short client form.
    Compact,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Settings {
    /// Read separately with the flag rules of [`Toggles::from_env`], since
    /// an empty value means "on" there.
    #[serde(skip)]
    pub toggles: Toggles,

    #[serde(default = "default_host")]
    pub http_host: String,

    /// Kept as the raw string from the environment; it is only echoed back
    /// and handed to the listener.
    #[serde(default = "default_port")]
    pub http_port: String,

    #[serde(default)]
    pub render_mode: RenderMode,

    #[serde(default)]
    pub human_logs: bool,

    pub sentry_dsn: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        // Produce a default value by creating a mock empty environment, and
        // then asking envy to deserialize it. Since all settings have a default
        // value specified in the struct, this works and keeps everything in sync.
        let empty_env: Vec<(String, String)> = Vec::new();
        envy::from_iter(empty_env).unwrap()
    }
}

impl Settings {
    /// Load settings from the environment.
    pub fn load() -> Result<Self, ReporterError> {
        let mut settings: Self = envy::from_env()?;
        settings.toggles = Toggles::from_env();
        Ok(settings)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}
