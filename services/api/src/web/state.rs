//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use std::sync::Arc;
use storygen_core::generator::StoryGenerator;
use storygen_core::ports::StoryStoreService;

/// The shared application state, created once at startup and passed to all handlers.
///
/// The generator and the store hold no per-request state, so a single
/// instance of each serves all concurrent connections.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn StoryStoreService>,
    pub generator: StoryGenerator,
    pub config: Arc<Config>,
}
