use axum::Json;
use serde::Serialize;

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: &'static str,
    #[schema(example = "Server is running")]
    pub message: &'static str,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct WelcomeResponse {
    #[schema(example = "Welcome to the Cloud Reader API")]
    pub message: &'static str,
    #[schema(example = "1.0.0")]
    pub version: &'static str,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    operation_id = "healthCheck",
    summary = "Liveness probe",
    responses((status = 200, description = "Server is up", body = HealthResponse)),
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "Server is running",
    })
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    operation_id = "welcome",
    summary = "API welcome document",
    responses((status = 200, description = "API name and version", body = WelcomeResponse)),
)]
pub async fn welcome() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to the Cloud Reader API",
        version: "1.0.0",
    })
}
