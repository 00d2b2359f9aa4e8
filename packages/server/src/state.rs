use std::sync::Arc;

use crate::config::AppConfig;
use crate::service::BookService;
use crate::store::UserStore;

/// Shared handler state, built once in `main` and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub users: Arc<dyn UserStore>,
    pub books: BookService,
}
