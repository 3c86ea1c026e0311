// src/state.rs

use axum::extract::FromRef;

use crate::{config::Config, store::SharedStore};

/// Process-wide dependencies, built once at startup and injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub config: Config,
}

impl FromRef<AppState> for SharedStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
