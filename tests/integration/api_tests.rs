//! API integration tests
//!
//! These run against a live server backed by a fresh database.

use std::sync::atomic::{AtomicU32, Ordering};

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080";

static COUNTER: AtomicU32 = AtomicU32::new(0);

/// Suffix that keeps emails and ISBNs unique across runs
fn unique() -> String {
    format!(
        "{}-{}",
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default(),
        COUNTER.fetch_add(1, Ordering::SeqCst)
    )
}

/// Register a fresh user and log in. Returns (user id, token).
async fn signup_and_login(client: &Client) -> (i64, String) {
    let email = format!("user-{}@example.com", unique());

    let response = client
        .post(format!("{}/signup", BASE_URL))
        .json(&json!({
            "name": "Alice",
            "email": email,
            "password": "pw123",
            "role": "user"
        }))
        .send()
        .await
        .expect("Failed to send signup request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse signup response");
    let id = body["id"].as_i64().expect("No id in signup response");

    let response = client
        .post(format!("{}/login", BASE_URL))
        .json(&json!({ "email": email, "password": "pw123" }))
        .send()
        .await
        .expect("Failed to send login request");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse login response");
    let token = body["token"].as_str().expect("No token in response").to_string();

    (id, token)
}

async fn create_author(client: &Client, token: &str) -> i64 {
    let response = client
        .post(format!("{}/authors", BASE_URL))
        .bearer_auth(token)
        .json(&json!({ "name": "Ursula K. Le Guin" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No author id")
}

async fn create_book(client: &Client, token: &str, author_id: i64) -> i64 {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "title": "The Dispossessed",
            "category": "Fiction",
            "author_id": author_id,
            "isbn": format!("isbn-{}", unique())
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "available");
    body["id"].as_i64().expect("No book id")
}

async fn issue(client: &Client, token: &str, book_id: i64, user_id: i64) -> reqwest::Response {
    client
        .post(format!("{}/issued_books", BASE_URL))
        .bearer_auth(token)
        .json(&json!({ "book_id": book_id, "user_id": user_id }))
        .send()
        .await
        .expect("Failed to send request")
}

async fn book_status(client: &Client, book_id: i64) -> String {
    let body: Value = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    body["status"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], true);
}

#[tokio::test]
#[ignore]
async fn test_issue_requires_token_then_conflicts_on_repeat() {
    let client = Client::new();
    let (user_id, token) = signup_and_login(&client).await;
    let author_id = create_author(&client, &token).await;
    let book_id = create_book(&client, &token, author_id).await;

    // No Authorization header
    let response = client
        .post(format!("{}/issued_books", BASE_URL))
        .json(&json!({ "book_id": book_id, "user_id": user_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(book_status(&client, book_id).await, "available");

    let response = issue(&client, &token, book_id, user_id).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["issued_id"].is_i64());
    assert_eq!(book_status(&client, book_id).await, "issued");

    let response = issue(&client, &token, book_id, user_id).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "Book not available");
}

#[tokio::test]
#[ignore]
async fn test_concurrent_issue_has_single_winner() {
    let client = Client::new();
    let (first_user, token) = signup_and_login(&client).await;
    let (second_user, _) = signup_and_login(&client).await;
    let author_id = create_author(&client, &token).await;
    let book_id = create_book(&client, &token, author_id).await;

    let (a, b) = tokio::join!(
        issue(&client, &token, book_id, first_user),
        issue(&client, &token, book_id, second_user)
    );

    let mut statuses = [a.status(), b.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::BAD_REQUEST]);

    let active: Value = client
        .get(format!("{}/issued_books?book_id={}&status=issued", BASE_URL, book_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(active.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
#[ignore]
async fn test_close_restores_availability() {
    let client = Client::new();
    let (user_id, token) = signup_and_login(&client).await;
    let author_id = create_author(&client, &token).await;
    let book_id = create_book(&client, &token, author_id).await;

    let body: Value = issue(&client, &token, book_id, user_id)
        .await
        .json()
        .await
        .expect("Failed to parse response");
    let issued_id = body["issued_id"].as_i64().expect("No issued_id");

    let response = client
        .delete(format!("{}/issued_books/{}", BASE_URL, issued_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "returned");
    assert!(body["returned_at"].is_string());
    assert_eq!(book_status(&client, book_id).await, "available");

    // Closing twice is rejected
    let response = client
        .delete(format!("{}/issued_books/{}", BASE_URL, issued_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = issue(&client, &token, book_id, user_id).await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
#[ignore]
async fn test_issue_unknown_book_or_user() {
    let client = Client::new();
    let (user_id, token) = signup_and_login(&client).await;
    let author_id = create_author(&client, &token).await;
    let book_id = create_book(&client, &token, author_id).await;

    let response = issue(&client, &token, i32::MAX as i64, user_id).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = issue(&client, &token, book_id, i32::MAX as i64).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(book_status(&client, book_id).await, "available");

    let response = client
        .post(format!("{}/issued_books", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_author_delete_cascades_to_books() {
    let client = Client::new();
    let (_, token) = signup_and_login(&client).await;
    let author_id = create_author(&client, &token).await;
    let book_id = create_book(&client, &token, author_id).await;

    let response = client
        .delete(format!("{}/authors/{}", BASE_URL, author_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_signup_rejected() {
    let client = Client::new();
    let email = format!("dup-{}@example.com", unique());
    let request = json!({ "name": "Bob", "email": email, "password": "secret" });

    let first = client
        .post(format!("{}/signup", BASE_URL))
        .json(&request)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = client
        .post(format!("{}/signup", BASE_URL))
        .json(&request)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    let body: Value = second.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "Email already exists");

    let users: Value = client
        .get(format!("{}/users?email={}", BASE_URL, email))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(users.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/login", BASE_URL))
        .json(&json!({
            "email": format!("nobody-{}@example.com", unique()),
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_bad_tokens_rejected() {
    let client = Client::new();

    let missing = client
        .get(format!("{}/me", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let malformed = client
        .get(format!("{}/me", BASE_URL))
        .header("Authorization", "Token abc")
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(malformed.status(), StatusCode::UNAUTHORIZED);

    let invalid = client
        .get(format!("{}/me", BASE_URL))
        .bearer_auth("not.a.jwt")
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(invalid.status(), StatusCode::UNAUTHORIZED);
    let body: Value = invalid.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], "Unauthorized");
}

#[tokio::test]
#[ignore]
async fn test_deleted_user_token_rejected() {
    let client = Client::new();
    let (admin_id, admin_token) = signup_and_login(&client).await;
    let (user_id, user_token) = signup_and_login(&client).await;
    let author_id = create_author(&client, &admin_token).await;
    let book_id = create_book(&client, &admin_token, author_id).await;

    let response = issue(&client, &admin_token, book_id, user_id).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = client
        .delete(format!("{}/users/{}", BASE_URL, user_id))
        .bearer_auth(&admin_token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Books held by the deleted user are released
    assert_eq!(book_status(&client, book_id).await, "available");

    let response = client
        .get(format!("{}/me", BASE_URL))
        .bearer_auth(&user_token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let me: Value = client
        .get(format!("{}/me", BASE_URL))
        .bearer_auth(&admin_token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(me["id"].as_i64(), Some(admin_id));
}

#[tokio::test]
#[ignore]
async fn test_book_search_empty_result() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books?title=no-such-title-{}", BASE_URL, unique()))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body, json!([]));
}

#[tokio::test]
#[ignore]
async fn test_blank_isbn_update_clears_it() {
    let client = Client::new();
    let (_, token) = signup_and_login(&client).await;
    let author_id = create_author(&client, &token).await;

    for _ in 0..2 {
        let book_id = create_book(&client, &token, author_id).await;
        let response = client
            .put(format!("{}/books/{}", BASE_URL, book_id))
            .bearer_auth(&token)
            .json(&json!({ "isbn": "  " }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.expect("Failed to parse response");
        assert!(body["isbn"].is_null());
    }
}

#[tokio::test]
#[ignore]
async fn test_close_racing_user_delete_never_fails_internally() {
    let client = Client::new();
    let (_, admin_token) = signup_and_login(&client).await;
    let author_id = create_author(&client, &admin_token).await;

    for _ in 0..5 {
        let (user_id, _) = signup_and_login(&client).await;
        let book_id = create_book(&client, &admin_token, author_id).await;
        let body: Value = issue(&client, &admin_token, book_id, user_id)
            .await
            .json()
            .await
            .expect("Failed to parse response");
        let issued_id = body["issued_id"].as_i64().expect("No issued_id");

        let close = client
            .delete(format!("{}/issued_books/{}", BASE_URL, issued_id))
            .bearer_auth(&admin_token)
            .send();
        let delete = client
            .delete(format!("{}/users/{}", BASE_URL, user_id))
            .bearer_auth(&admin_token)
            .send();
        let (close, delete) = tokio::join!(close, delete);

        let close = close.expect("Failed to send request").status();
        let delete = delete.expect("Failed to send request").status();
        assert!(
            close == StatusCode::OK || close == StatusCode::NOT_FOUND,
            "close returned {}",
            close
        );
        assert_eq!(delete, StatusCode::NO_CONTENT);
        assert_eq!(book_status(&client, book_id).await, "available");
    }
}
