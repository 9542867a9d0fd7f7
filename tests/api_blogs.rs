//! Integration tests per blog, valutazioni e domande
//!
//! Test per:
//! - POST /blogs, GET /blogs, GET /blogs/{blog_id}, GET /blogs/trending
//! - POST /blogs/{blog_id}/rate
//! - POST/GET /blogs/{blog_id}/questions, POST /questions/{question_id}/answers

mod common;

#[cfg(test)]
mod blog_tests {
    use super::common::*;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{Value, json};
    use trip_server::entities::User;
    use trip_server::repositories::Read;

    async fn create_blog(server: &TestServer, author: &User, trip_id: i32, caption: &str) -> i64 {
        let (name, value) = auth(author);
        let response = server
            .post("/blogs")
            .add_header(name, value)
            .json(&json!({ "trip_id": trip_id, "caption": caption, "content": "Great trip" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let blog: Value = response.json();
        blog["blog_id"].as_i64().unwrap()
    }

    async fn rate(server: &TestServer, user: &User, blog_id: i64, value: u8) -> axum_test::TestResponse {
        let (name, header) = auth(user);
        server
            .post(&format!("/blogs/{}/rate", blog_id))
            .add_header(name, header)
            .json(&json!({ "value": value }))
            .await
    }

    #[tokio::test]
    async fn test_create_blog_requires_membership() {
        let state = create_test_state();
        let server = create_test_server(state.clone());
        let host = seed_user(&state, "Alice").await;
        let stranger = seed_user(&state, "Bob").await;
        let trip_id = create_trip(&server, &host, "Lisbon", true).await;

        let (name, value) = auth(&stranger);
        server
            .post("/blogs")
            .add_header(name.clone(), value.clone())
            .json(&json!({ "trip_id": trip_id, "caption": "Not mine" }))
            .await
            .assert_status_forbidden();
        server
            .post("/blogs")
            .add_header(name, value)
            .json(&json!({ "trip_id": 9999 }))
            .await
            .assert_status_not_found();

        let blog_id = create_blog(&server, &host, trip_id, "Lisbon diary").await;
        let stored = state.user.read(&host.user_id).await.unwrap().unwrap();
        assert_eq!(stored.public_posts, vec![blog_id as i32]);

        // la lettura non richiede autenticazione
        let response = server.get(&format!("/blogs/{}", blog_id)).await;
        response.assert_status_ok();
        let blog: Value = response.json();
        assert_eq!(blog["caption"], "Lisbon diary");
        assert_eq!(server.get("/blogs").await.json::<Vec<Value>>().len(), 1);
        server.get("/blogs/9999").await.assert_status_not_found();
    }

    #[tokio::test]
    async fn test_rating_replaces_previous_value() {
        let state = create_test_state();
        let server = create_test_server(state.clone());
        let host = seed_user(&state, "Alice").await;
        let reader = seed_user(&state, "Bob").await;
        let trip_id = create_trip(&server, &host, "Lisbon", true).await;
        let blog_id = create_blog(&server, &host, trip_id, "Lisbon diary").await;

        rate(&server, &reader, blog_id, 0).await.assert_status_bad_request();
        rate(&server, &reader, blog_id, 6).await.assert_status_bad_request();

        rate(&server, &reader, blog_id, 2).await.assert_status_ok();
        let response = rate(&server, &reader, blog_id, 4).await;
        response.assert_status_ok();
        let blog: Value = response.json();
        assert_eq!(blog["rating_count"], 1);
        assert_eq!(blog["average_rating"], 4.0);

        rate(&server, &reader, 9999, 4).await.assert_status_not_found();
    }

    #[tokio::test]
    async fn test_trending_prefers_consistent_ratings() {
        let state = create_test_state();
        let server = create_test_server(state.clone());
        let host = seed_user(&state, "Alice").await;
        let trip_id = create_trip(&server, &host, "Lisbon", true).await;

        let lucky = create_blog(&server, &host, trip_id, "One perfect vote").await;
        let solid = create_blog(&server, &host, trip_id, "Many good votes").await;
        let poor = create_blog(&server, &host, trip_id, "Poor").await;

        let mut readers = Vec::new();
        for i in 0..6 {
            readers.push(seed_user(&state, &format!("Reader {}", i)).await);
        }

        rate(&server, &readers[0], lucky, 5).await.assert_status_ok();
        for reader in &readers {
            rate(&server, reader, solid, 5).await.assert_status_ok();
        }
        rate(&server, &readers[0], poor, 1).await.assert_status_ok();
        rate(&server, &readers[1], poor, 2).await.assert_status_ok();

        let response = server.get("/blogs/trending").add_query_param("limit", 2).await;
        response.assert_status_ok();
        let trending: Vec<Value> = response.json();
        assert_eq!(trending.len(), 2);
        assert_eq!(trending[0]["blog_id"], json!(solid));
        assert_eq!(trending[1]["blog_id"], json!(lucky));
    }

    #[tokio::test]
    async fn test_questions_and_answers() {
        let state = create_test_state();
        let server = create_test_server(state.clone());
        let host = seed_user(&state, "Alice").await;
        let reader = seed_user(&state, "Bob").await;
        let trip_id = create_trip(&server, &host, "Lisbon", true).await;
        let blog_id = create_blog(&server, &host, trip_id, "Lisbon diary").await;

        let (name, value) = auth(&reader);
        let response = server
            .post(&format!("/blogs/{}/questions", blog_id))
            .add_header(name.clone(), value.clone())
            .json(&json!({ "question_text": "  Best time to visit?  " }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let question: Value = response.json();
        assert_eq!(question["question_text"], "Best time to visit?");
        assert_eq!(question["asked_by"], json!(reader.user_id));
        let question_id = question["question_id"].as_i64().unwrap();

        server
            .post("/blogs/9999/questions")
            .add_header(name, value)
            .json(&json!({ "question_text": "Anyone?" }))
            .await
            .assert_status_not_found();

        let (name, value) = auth(&host);
        let response = server
            .post(&format!("/questions/{}/answers", question_id))
            .add_header(name.clone(), value.clone())
            .json(&json!({ "answer_text": "Spring" }))
            .await;
        response.assert_status(StatusCode::CREATED);

        server
            .post("/questions/9999/answers")
            .add_header(name, value)
            .json(&json!({ "answer_text": "Spring" }))
            .await
            .assert_status_not_found();

        let response = server.get(&format!("/blogs/{}/questions", blog_id)).await;
        response.assert_status_ok();
        let questions: Vec<Value> = response.json();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0]["answers"][0]["answer_text"], "Spring");
    }
}
