use hickory_resolver::error::ResolveError;
use std::{fmt, io};

#[derive(Debug)]
pub struct ReporterError {
    message: String,
}

impl ReporterError {
    pub fn new<M: Into<String>>(message: M) -> Self {
        let message = message.into();
        Self { message }
    }

    pub fn from_source<S: fmt::Display, E: fmt::Display>(source: S, err: E) -> Self {
        Self {
            message: format!("{}: {}", source, err),
        }
    }
}

// Use default implementation of Error
impl std::error::Error for ReporterError {}

impl fmt::Display for ReporterError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "{}", self.message)
    }
}

impl From<envy::Error> for ReporterError {
    fn from(error: envy::Error) -> Self {
        Self::from_source("ConfigError", error)
    }
}

impl From<io::Error> for ReporterError {
    fn from(error: io::Error) -> Self {
        Self::from_source("IoError", error)
    }
}

impl From<ResolveError> for ReporterError {
    fn from(error: ResolveError) -> Self {
        Self::from_source("ResolveError", error)
    }
}
