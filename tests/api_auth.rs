//! Integration tests per gli endpoints di autenticazione
//!
//! Test per:
//! - POST /auth/register
//! - POST /auth/login
//! - POST /auth/forgot-password
//! - POST /auth/reset-password
//! - autenticazione tramite header Authorization o cookie

mod common;

#[cfg(test)]
mod auth_tests {
    use super::common::*;
    use axum::Json;
    use axum::extract::State;
    use axum::http::{HeaderName, HeaderValue, StatusCode};
    use chrono::Utc;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::{Value, json};
    use trip_server::core::ResetClaims;
    use trip_server::dtos::CreateUserDTO;
    use trip_server::services::register_user;

    /// Token di reset estratto dal link contenuto nell'email
    fn reset_token_from(html: &str) -> String {
        let start = html.find("token=").expect("reset link in email") + "token=".len();
        html[start..]
            .split('"')
            .next()
            .expect("token terminated by a quote")
            .to_string()
    }

    // ============================================================
    // Test per POST /auth/register - register_user
    // ============================================================

    #[tokio::test]
    async fn test_register_and_login_success() {
        let server = create_test_server(create_test_state());

        let register_body = json!({
            "name": "Ada Lovelace",
            "email": "Ada@Example.com",
            "password": "TestLogin123"
        });
        let response = server.post("/auth/register").json(&register_body).await;
        response.assert_status(StatusCode::CREATED);
        let profile: Value = response.json();
        assert_eq!(profile["email"], "ada@example.com", "Email salvata in minuscolo");
        assert!(profile.get("password").is_none(), "La password non deve mai uscire");

        let login_body = json!({
            "email": "ada@example.com",
            "password": "TestLogin123"
        });
        let response = server.post("/auth/login").json(&login_body).await;
        response.assert_status_ok();

        let headers = response.headers();
        let cookie = headers
            .get("set-cookie")
            .expect("Set-Cookie header should be present")
            .to_str()
            .unwrap();
        assert!(cookie.starts_with("token="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=86400"));
        let authorization = headers
            .get("authorization")
            .expect("Authorization header should be present")
            .to_str()
            .unwrap();
        assert!(authorization.starts_with("Bearer "));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let state = create_test_state();
        let server = create_test_server(state.clone());
        seed_user(&state, "Grace").await;

        let response = server
            .post("/auth/register")
            .json(&json!({
                "name": "Another Grace",
                "email": "grace@example.com",
                "password": "Password123"
            }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_registration_with_same_email() {
        let state = create_test_state();

        let handles: Vec<_> = (0..2)
            .map(|i| {
                let state = state.clone();
                tokio::spawn(async move {
                    register_user(
                        State(state),
                        Json(CreateUserDTO {
                            name: format!("Dup {}", i),
                            email: "dup@example.com".to_string(),
                            password: "Password123".to_string(),
                            photo: None,
                        }),
                    )
                    .await
                })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(e) => assert_eq!(e.status(), StatusCode::CONFLICT),
            }
        }
        assert_eq!(created, 1);

        let users = state.user.search_by_name_prefix("Dup").await.unwrap();
        assert_eq!(users.len(), 1);
    }

    #[tokio::test]
    async fn test_register_invalid_fields() {
        let server = create_test_server(create_test_state());

        let response = server
            .post("/auth/register")
            .json(&json!({ "name": "Bob", "email": "not-an-email", "password": "Password123" }))
            .await;
        response.assert_status_bad_request();

        let response = server
            .post("/auth/register")
            .json(&json!({ "name": "Bob", "email": "bob@example.com", "password": "short" }))
            .await;
        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["error"], "Validation error");
    }

    // ============================================================
    // Test per POST /auth/login - login_user
    // ============================================================

    #[tokio::test]
    async fn test_login_wrong_password() {
        let state = create_test_state();
        let server = create_test_server(state.clone());
        seed_user(&state, "Linus").await;

        let response = server
            .post("/auth/login")
            .json(&json!({ "email": "linus@example.com", "password": "WrongPassword" }))
            .await;
        response.assert_status_unauthorized();

        let response = server
            .post("/auth/login")
            .json(&json!({ "email": "nobody@example.com", "password": PASSWORD }))
            .await;
        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn test_login_with_seeded_user() {
        let state = create_test_state();
        let server = create_test_server(state.clone());
        let user = seed_user(&state, "Margaret").await;

        let response = server
            .post("/auth/login")
            .json(&json!({ "email": "margaret@example.com", "password": PASSWORD }))
            .await;
        response.assert_status_ok();
        let profile: Value = response.json();
        assert_eq!(profile["user_id"], json!(user.user_id));
    }

    // ============================================================
    // Middleware di autenticazione
    // ============================================================

    #[tokio::test]
    async fn test_protected_route_without_token() {
        let server = create_test_server(create_test_state());
        server.get("/users/me").await.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn test_protected_route_with_invalid_token() {
        let server = create_test_server(create_test_state());
        server
            .get("/users/me")
            .add_header(
                HeaderName::from_static("authorization"),
                HeaderValue::from_static("Bearer not.a.token"),
            )
            .await
            .assert_status_unauthorized();
    }

    #[tokio::test]
    async fn test_cookie_authentication() {
        let state = create_test_state();
        let server = create_test_server(state.clone());
        let user = seed_user(&state, "Barbara").await;

        let cookie = format!("token={}", create_test_jwt(&user));
        let response = server
            .get("/users/me")
            .add_header(
                HeaderName::from_static("cookie"),
                HeaderValue::from_str(&cookie).unwrap(),
            )
            .await;
        response.assert_status_ok();
        let profile: Value = response.json();
        assert_eq!(profile["name"], "Barbara");
    }

    // ============================================================
    // Test per POST /auth/forgot-password e /auth/reset-password
    // ============================================================

    #[tokio::test]
    async fn test_forgot_and_reset_password() {
        let (state, emails) = create_test_state_with_email();
        let server = create_test_server(state.clone());
        seed_user(&state, "Hedy").await;

        let response = server
            .post("/auth/forgot-password")
            .json(&json!({ "email": "hedy@example.com" }))
            .await;
        response.assert_status_ok();

        let sent = emails.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "hedy@example.com");
        assert!(sent[0].html.contains("https://trips.example.com/reset-password.html?token="));
        let token = reset_token_from(&sent[0].html);

        // il token di reset non vale come token di sessione
        server
            .get("/users/me")
            .add_header(
                HeaderName::from_static("authorization"),
                HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
            )
            .await
            .assert_status_unauthorized();

        server
            .post("/auth/reset-password")
            .json(&json!({ "reset_token": token, "new_password": "BrandNew456" }))
            .await
            .assert_status_ok();

        server
            .post("/auth/login")
            .json(&json!({ "email": "hedy@example.com", "password": PASSWORD }))
            .await
            .assert_status_unauthorized();
        server
            .post("/auth/login")
            .json(&json!({ "email": "hedy@example.com", "password": "BrandNew456" }))
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn test_forgot_password_unknown_email() {
        let (state, emails) = create_test_state_with_email();
        let server = create_test_server(state);

        let response = server
            .post("/auth/forgot-password")
            .json(&json!({ "email": "nobody@example.com" }))
            .await;
        // stessa risposta di un'email registrata, ma nessun invio
        response.assert_status_ok();
        assert!(emails.sent().is_empty());

        server
            .post("/auth/forgot-password")
            .json(&json!({ "email": "not-an-email" }))
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn test_reset_password_rejects_bad_tokens() {
        let state = create_test_state();
        let server = create_test_server(state.clone());
        let user = seed_user(&state, "Katherine").await;

        // scaduto da un'ora, oltre il margine di validazione
        let now = Utc::now().timestamp() as usize;
        let expired = encode(
            &Header::default(),
            &ResetClaims {
                iat: now - 2 * 3600,
                exp: now - 3600,
                id: user.user_id,
                purpose: "password_reset".to_string(),
            },
            &EncodingKey::from_secret(JWT_SECRET.as_ref()),
        )
        .unwrap();

        let session = create_test_jwt(&user);

        for token in [expired, session, "not.a.token".to_string()] {
            let response = server
                .post("/auth/reset-password")
                .json(&json!({ "reset_token": token, "new_password": "BrandNew456" }))
                .await;
            response.assert_status_bad_request();
            let body: Value = response.json();
            assert_eq!(body["error"], "Invalid or expired reset token");
        }

        // la password è rimasta quella originale
        server
            .post("/auth/login")
            .json(&json!({ "email": "katherine@example.com", "password": PASSWORD }))
            .await
            .assert_status_ok();
    }
}
