use std::env;

pub const DEBUG_HTTP: &str = "DEBUG_HTTP";
pub const DEBUG_SERVER: &str = "DEBUG_SERVER";
pub const DEBUG_CLIENT: &str = "DEBUG_CLIENT";

/// Whether an environment value switches a flag on.
///
/// Only the exact strings `""`, `"1"` and `"true"` count. No trimming, no
/// case folding.
pub fn is_truthy(value: &str) -> bool {
    matches!(value, "" | "1" | "true")
}

/// Check whether the environment variable `name` is set to a truthy value.
///
/// An unset variable (or one that isn't valid unicode) is simply off.
pub fn is_enabled(name: &str) -> bool {
    env::var(name).map(|value| is_truthy(&value)).unwrap_or(false)
}

/// The set of report sections switched on for this process.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Toggles {
    pub http: bool,
    pub server: bool,
    pub client: bool,
}

impl Toggles {
    /// Snapshot the section flags from the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(DEBUG_HTTP, DEBUG_SERVER, DEBUG_CLIENT)
    }

    fn from_vars(http: &str, server: &str, client: &str) -> Self {
        Self {
            http: is_enabled(http),
            server: is_enabled(server),
            client: is_enabled(client),
        }
    }

    pub fn any(&self) -> bool {
        self.http || self.server || self.client
    }
}
