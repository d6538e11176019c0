// handlers/mod.rs - HTTP handlers
//
// Every handler takes the shared AppState, decodes its input, calls a single
// UserStore operation and maps the outcome through ApiError.

pub mod system;
pub mod users;

use std::sync::Arc;

use crate::database::UserStore;

/// Router state shared by every request
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
}

impl AppState {
    pub fn new(users: impl UserStore + 'static) -> Self {
        Self { users: Arc::new(users) }
    }
}
