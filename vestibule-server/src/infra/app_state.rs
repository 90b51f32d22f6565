use crate::infra::config::Config;
use std::{fmt, sync::Arc};
use vestibule_core::AdmissionEngine;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AdmissionEngine>,
    pub config: Arc<Config>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(engine: Arc<AdmissionEngine>, config: Arc<Config>) -> Self {
        Self { engine, config }
    }
}
