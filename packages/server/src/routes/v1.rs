use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers::{self, health};
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(health::welcome))
        .nest("/auth", handlers::auth::router())
        .nest("/books", handlers::book::router())
}
