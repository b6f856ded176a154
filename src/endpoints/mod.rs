pub mod report;

use std::sync::Arc;

use crate::{
    logging::MozLogger,
    network::{Introspector, ReverseLookup},
    settings::Settings,
};

/// Everything a request handler needs. Built once before the server starts
/// and never mutated afterwards.
#[derive(Clone)]
pub struct EndpointState {
    pub settings: Settings,
    pub log: MozLogger,
    pub resolver: Arc<dyn ReverseLookup>,
}

impl EndpointState {
    pub fn introspector(&self) -> Introspector {
        Introspector::new(self.resolver.clone(), self.log.log.clone())
    }
}
