use crate::common::{TestApp, routes};

#[tokio::test]
async fn health_is_served_at_both_paths() {
    let app = TestApp::spawn().await;

    for path in [routes::HEALTH, routes::API_HEALTH] {
        let res = app.get(path, None).await;
        assert_eq!(res.status, 200, "{path}");
        assert_eq!(res.body["status"], "ok");
        assert!(res.body["message"].is_string());
    }
}

#[tokio::test]
async fn welcome_document_names_the_version() {
    let app = TestApp::spawn().await;

    let res = app.get(routes::WELCOME, None).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body["version"], "1.0.0");
}

#[tokio::test]
async fn api_reference_is_served() {
    let app = TestApp::spawn().await;

    let res = app.get("/scalar", None).await;

    assert_eq!(res.status, 200);
    assert!(res.text.contains("Cloud Reader API"));
}

#[tokio::test]
async fn cors_preflight_allows_the_user_id_header() {
    let app = TestApp::spawn().await;

    let res = app
        .client
        .request(
            reqwest::Method::OPTIONS,
            format!("http://{}{}", app.addr, routes::BOOKS),
        )
        .header("Origin", "http://localhost:3000")
        .header("Access-Control-Request-Method", "GET")
        .header("Access-Control-Request-Headers", "x-user-id")
        .send()
        .await
        .unwrap();

    assert!(res.status().is_success());
    assert_eq!(
        res.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:3000")
    );
}
