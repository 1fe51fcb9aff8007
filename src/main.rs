//! Library Server
//!
//! Catalog and book lending REST API server.

use anyhow::Context;
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use library_server::{
    api, config::AppConfig, repository::Repository, services::Services, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("library_server={},tower_http=info", config.logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Library Server v{}", env!("CARGO_PKG_VERSION"));

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations completed");

    let addr = SocketAddr::new(
        config
            .server
            .host
            .parse()
            .context("Invalid host address")?,
        config.server.port,
    );

    let repository = Repository::new(pool);
    let services = Services::new(repository, &config.auth);

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    let app = create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public = Router::new()
        .route("/health", get(api::health::health_check))
        // Authentication
        .route("/signup", post(api::auth::signup))
        .route("/login", post(api::auth::login))
        // Catalog reads
        .route("/authors", get(api::authors::list_authors))
        .route("/authors/:id", get(api::authors::get_author))
        .route("/books", get(api::books::list_books))
        .route("/books/:id", get(api::books::get_book))
        .route("/users", get(api::users::list_users))
        .route("/users/:id", get(api::users::get_user));

    let protected = Router::new()
        .route("/me", get(api::auth::me))
        // Authors
        .route("/authors", post(api::authors::create_author))
        .route(
            "/authors/:id",
            put(api::authors::update_author).delete(api::authors::delete_author),
        )
        // Books
        .route("/books", post(api::books::create_book))
        .route(
            "/books/:id",
            put(api::books::update_book).delete(api::books::delete_book),
        )
        // Users
        .route("/users", post(api::users::create_user))
        .route("/users/:id", delete(api::users::delete_user))
        // Issuances
        .route(
            "/issued_books",
            get(api::issuances::list_issuances).post(api::issuances::issue_book),
        )
        .route(
            "/issued_books/:id",
            get(api::issuances::get_issuance).delete(api::issuances::close_issuance),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .with_state(state)
        .merge(api::openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header::AUTHORIZATION, Method, Request, StatusCode},
    };
    use library_server::config::{AuthConfig, DatabaseConfig, LoggingConfig, ServerConfig};
    use tower::ServiceExt;

    // The pool never connects; every request here is answered before storage
    fn test_router() -> Router {
        let config = AppConfig {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig {
                jwt_secret: "router-test-secret".to_string(),
                token_lifetime_hours: 24,
            },
            logging: LoggingConfig::default(),
        };
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database.url)
            .unwrap();
        let services = Services::new(Repository::new(pool), &config.auth);

        create_router(AppState {
            config: Arc::new(config),
            services: Arc::new(services),
        })
    }

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = test_router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    #[tokio::test]
    async fn test_issue_without_token_is_unauthorized() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/issued_books")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"book_id":1,"user_id":1}"#))
            .unwrap();

        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "Unauthorized");
        assert_eq!(body["error"], "Token is missing");
    }

    #[tokio::test]
    async fn test_garbage_token_is_unauthorized() {
        let request = Request::builder()
            .uri("/me")
            .header(AUTHORIZATION, "Bearer not.a.token")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].as_str().unwrap().starts_with("Token is invalid"));
    }

    #[tokio::test]
    async fn test_protected_write_on_public_path_is_gated() {
        let request = Request::builder()
            .method(Method::DELETE)
            .uri("/books/1")
            .header(AUTHORIZATION, "Basic abc")
            .body(Body::empty())
            .unwrap();

        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_openapi_document_served() {
        let request = Request::builder()
            .uri("/api-docs/openapi.json")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/issued_books"].is_object());
    }

    #[tokio::test]
    async fn test_signup_without_content_type_is_validation_error() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/signup")
            .body(Body::from(r#"{"name":"Alice","email":"a@x.com","password":"pw"}"#))
            .unwrap();

        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "ValidationError");
        assert_eq!(body["error"], "No JSON data provided");
    }

    #[tokio::test]
    async fn test_wrongly_typed_body_is_validation_error() {
        for payload in [r#"{"email":5,"password":"pw"}"#, "{not json", ""] {
            let request = Request::builder()
                .method(Method::POST)
                .uri("/login")
                .header("content-type", "application/json")
                .body(Body::from(payload))
                .unwrap();

            let (status, body) = send(request).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "payload {:?}", payload);
            assert_eq!(body["code"], "ValidationError");
        }
    }

    #[tokio::test]
    async fn test_bad_path_and_query_are_validation_errors() {
        for uri in ["/books/abc", "/books?status=lost", "/users?role=librarian"] {
            let request = Request::builder().uri(uri).body(Body::empty()).unwrap();

            let (status, body) = send(request).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "uri {}", uri);
            assert_eq!(body["code"], "ValidationError");
            assert!(body["error"].is_string());
        }
    }
}
