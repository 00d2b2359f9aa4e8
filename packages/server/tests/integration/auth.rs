use serde_json::json;

use crate::common::{TestApp, routes};

mod registration {
    use super::*;

    #[tokio::test]
    async fn new_user_can_register() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(
                routes::REGISTER,
                &json!({"name": "Alice", "email": "alice@example.com", "password": "secret1"}),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert!(res.body["id"].is_number());
        assert_eq!(res.body["name"], "Alice");
        assert_eq!(res.body["email"], "alice@example.com");
        assert!(res.body.get("password").is_none());
    }

    #[tokio::test]
    async fn cannot_register_an_email_twice() {
        let app = TestApp::spawn().await;
        app.register("Alice", "alice@example.com", "secret1").await;

        let res = app
            .post_json(
                routes::REGISTER,
                &json!({"name": "Other Alice", "email": "alice@example.com", "password": "secret2"}),
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "EMAIL_TAKEN");
    }

    #[tokio::test]
    async fn invalid_fields_are_rejected() {
        let app = TestApp::spawn().await;

        for body in [
            json!({"name": "A", "email": "a@example.com", "password": "secret1"}),
            json!({"name": "Alice", "email": "not-an-email", "password": "secret1"}),
            json!({"name": "Alice", "email": "alice@example.com", "password": "12345"}),
            json!({"name": "Alice", "email": "alice@example.com", "password": "a".repeat(129)}),
        ] {
            let res = app.post_json(routes::REGISTER, &body).await;
            assert_eq!(res.status, 400, "{body}");
            assert_eq!(res.body["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post_raw(routes::REGISTER, "application/json", "{\"name\": ")
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn registered_user_can_log_in() {
        let app = TestApp::spawn().await;
        let user = app.register("Alice", "alice@example.com", "secret1").await;

        let res = app
            .post_json(
                routes::LOGIN,
                &json!({"email": "alice@example.com", "password": "secret1"}),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["user"]["id"], user["id"]);
        assert_eq!(res.body["user"]["email"], "alice@example.com");
        assert!(res.body.get("token").is_none());
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;
        app.register("Alice", "alice@example.com", "secret1").await;

        let res = app
            .post_json(
                routes::LOGIN,
                &json!({"email": "alice@example.com", "password": "wrong-one"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn unknown_email_looks_like_a_wrong_password() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(
                routes::LOGIN,
                &json!({"email": "nobody@example.com", "password": "secret1"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }
}
