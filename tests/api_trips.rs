//! Integration tests per gli endpoints dei viaggi
//!
//! Test per:
//! - POST /trips, GET /trips/{trip_id}, PUT /trips/{trip_id}, DELETE /trips/{trip_id}
//! - POST /trips/{trip_id}/copy
//! - GET /trips?query=&tags=, GET /trips/open, GET /users/me/trips

mod common;

#[cfg(test)]
mod trip_tests {
    use super::common::*;
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use trip_server::repositories::Read;

    #[tokio::test]
    async fn test_create_trip_host_is_only_member() {
        let state = create_test_state();
        let server = create_test_server(state.clone());
        let host = seed_user(&state, "Alice").await;
        let (name, value) = auth(&host);

        let response = server
            .post("/trips")
            .add_header(name, value)
            .json(&json!({ "title": "Lisbon weekend", "destination": "Portugal", "tags": ["food"] }))
            .await;
        response.assert_status(StatusCode::CREATED);

        let trip: Value = response.json();
        assert_eq!(trip["host"], json!(host.user_id));
        assert_eq!(trip["is_public"], json!(false));
        let members = trip["members"].as_array().unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0]["role"], "host");
        assert_eq!(members[0]["status"], "accepted");

        let stored = state.user.read(&host.user_id).await.unwrap().unwrap();
        assert_eq!(stored.trip_history, vec![trip["trip_id"].as_i64().unwrap() as i32]);
    }

    #[tokio::test]
    async fn test_create_trip_requires_title() {
        let state = create_test_state();
        let server = create_test_server(state.clone());
        let host = seed_user(&state, "Alice").await;
        let (name, value) = auth(&host);

        server
            .post("/trips")
            .add_header(name, value)
            .json(&json!({ "title": "" }))
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn test_private_trip_visibility() {
        let state = create_test_state();
        let server = create_test_server(state.clone());
        let host = seed_user(&state, "Alice").await;
        let stranger = seed_user(&state, "Bob").await;
        let trip_id = create_trip(&server, &host, "Secret trip", false).await;

        let (name, value) = auth(&host);
        server
            .get(&format!("/trips/{}", trip_id))
            .add_header(name, value)
            .await
            .assert_status_ok();

        let (name, value) = auth(&stranger);
        server
            .get(&format!("/trips/{}", trip_id))
            .add_header(name.clone(), value.clone())
            .await
            .assert_status_forbidden();

        server
            .get("/trips/9999")
            .add_header(name, value)
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn test_update_trip_requires_edit_access() {
        let state = create_test_state();
        let server = create_test_server(state.clone());
        let host = seed_user(&state, "Alice").await;
        let stranger = seed_user(&state, "Bob").await;
        let trip_id = create_trip(&server, &host, "Rome", true).await;

        let (name, value) = auth(&stranger);
        server
            .put(&format!("/trips/{}", trip_id))
            .add_header(name, value)
            .json(&json!({ "title": "Hijacked" }))
            .await
            .assert_status_forbidden();

        let (name, value) = auth(&host);
        let response = server
            .put(&format!("/trips/{}", trip_id))
            .add_header(name, value)
            .json(&json!({ "title": "Rome in spring", "status": "planned" }))
            .await;
        response.assert_status_ok();
        let trip: Value = response.json();
        assert_eq!(trip["title"], "Rome in spring");
        assert_eq!(trip["status"], "planned");
        assert_eq!(trip["members"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_ignores_membership_fields() {
        let state = create_test_state();
        let server = create_test_server(state.clone());
        let host = seed_user(&state, "Alice").await;
        let other = seed_user(&state, "Bob").await;
        let trip_id = create_trip(&server, &host, "Rome", true).await;

        let (name, value) = auth(&host);
        let response = server
            .put(&format!("/trips/{}", trip_id))
            .add_header(name, value)
            .json(&json!({ "host": other.user_id, "members": [] }))
            .await;
        response.assert_status_ok();
        let trip: Value = response.json();
        assert_eq!(trip["host"], json!(host.user_id));
        assert!(member_of(&trip, host.user_id).is_some());
    }

    #[tokio::test]
    async fn test_delete_trip_only_host() {
        let state = create_test_state();
        let server = create_test_server(state.clone());
        let host = seed_user(&state, "Alice").await;
        let stranger = seed_user(&state, "Bob").await;
        let trip_id = create_trip(&server, &host, "Rome", true).await;

        let (name, value) = auth(&stranger);
        server
            .delete(&format!("/trips/{}", trip_id))
            .add_header(name, value)
            .await
            .assert_status_forbidden();

        let (name, value) = auth(&host);
        server
            .delete(&format!("/trips/{}", trip_id))
            .add_header(name.clone(), value.clone())
            .await
            .assert_status_ok();

        server
            .get(&format!("/trips/{}", trip_id))
            .add_header(name.clone(), value.clone())
            .await
            .assert_status_not_found();
        let response = server
            .delete(&format!("/trips/{}", trip_id))
            .add_header(name, value)
            .await;
        response.assert_status_not_found();
        let body: Value = response.json();
        assert_eq!(body["error"], "Trip not found");

        let stored = state.user.read(&host.user_id).await.unwrap().unwrap();
        assert!(stored.trip_history.is_empty());
    }

    #[tokio::test]
    async fn test_copy_public_trip() {
        let state = create_test_state();
        let server = create_test_server(state.clone());
        let host = seed_user(&state, "Alice").await;
        let other = seed_user(&state, "Bob").await;
        let public_id = create_trip(&server, &host, "Kyoto", true).await;
        let private_id = create_trip(&server, &host, "Private", false).await;

        let (name, value) = auth(&other);
        let response = server
            .post(&format!("/trips/{}/copy", public_id))
            .add_header(name.clone(), value.clone())
            .await;
        response.assert_status(StatusCode::CREATED);
        let copy: Value = response.json();
        assert_eq!(copy["title"], "Copy of Kyoto");
        assert_eq!(copy["host"], json!(other.user_id));
        assert_eq!(copy["members"].as_array().unwrap().len(), 1);

        server
            .post(&format!("/trips/{}/copy", private_id))
            .add_header(name, value)
            .await
            .assert_status_forbidden();
    }

    #[tokio::test]
    async fn test_search_and_open_trips() {
        let state = create_test_state();
        let server = create_test_server(state.clone());
        let host = seed_user(&state, "Alice").await;
        let other = seed_user(&state, "Bob").await;

        let (name, value) = auth(&host);
        server
            .post("/trips")
            .add_header(name.clone(), value.clone())
            .json(&json!({ "title": "Beach days", "tags": ["Beach", "sun"], "is_public": true }))
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post("/trips")
            .add_header(name.clone(), value.clone())
            .json(&json!({ "title": "Alps hike", "tags": ["hiking"], "is_public": true }))
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post("/trips")
            .add_header(name, value)
            .json(&json!({ "title": "Private beach", "tags": ["beach"] }))
            .await
            .assert_status(StatusCode::CREATED);

        let (name, value) = auth(&other);
        let response = server
            .get("/trips")
            .add_query_param("tags", "beach,snow")
            .add_header(name.clone(), value.clone())
            .await;
        response.assert_status_ok();
        let trips: Vec<Value> = response.json();
        assert_eq!(trips.len(), 1, "Il viaggio privato non è visibile");
        assert_eq!(trips[0]["title"], "Beach days");

        let response = server
            .get("/trips")
            .add_query_param("query", "ALPS")
            .add_header(name.clone(), value.clone())
            .await;
        let trips: Vec<Value> = response.json();
        assert_eq!(trips.len(), 1);

        let response = server.get("/trips/open").add_header(name, value).await;
        response.assert_status_ok();
        let trips: Vec<Value> = response.json();
        assert_eq!(trips.len(), 2);

        // per l'host i suoi viaggi non sono "open"
        let (name, value) = auth(&host);
        let response = server.get("/trips/open").add_header(name.clone(), value.clone()).await;
        let trips: Vec<Value> = response.json();
        assert!(trips.is_empty());

        let response = server.get("/users/me/trips").add_header(name, value).await;
        let trips: Vec<Value> = response.json();
        assert_eq!(trips.len(), 3);
    }
}
