pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::AppConfig;
use crate::middleware::jwt_auth_middleware;
use crate::services::MediaKind;

pub use crate::state::AppState;

/// Build the HTTP application
pub fn app(state: AppState) -> Router {
    let response_level = if state.config.api.enable_request_logging {
        Level::INFO
    } else {
        Level::DEBUG
    };

    Router::new()
        // Public
        .route("/", get(handlers::system::root))
        .route("/health", get(handlers::system::health))
        // Resources; guarded methods carry the bearer-token gate
        .merge(user_routes(&state))
        .merge(audio_routes(&state))
        .merge(category_routes(&state))
        .merge(playlist_routes(&state))
        // Uploaded media
        .nest_service("/uploads/audios", ServeDir::new(state.files.directory(MediaKind::Audio)))
        .nest_service("/uploads/pictures", ServeDir::new(state.files.directory(MediaKind::Picture)))
        .fallback(handlers::system::not_found)
        // Global middleware, outermost first
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http().on_response(DefaultOnResponse::new().level(response_level)))
                .layer(cors_layer(&state.config))
                .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes)),
        )
        .with_state(state)
}

fn user_routes(state: &AppState) -> Router<AppState> {
    use handlers::users;
    let guard = || from_fn_with_state(state.clone(), jwt_auth_middleware);

    Router::new()
        .route("/api/users/signup", post(users::signup))
        .route("/api/users/login", post(users::login))
        .route("/api/users/ban", post(users::ban).route_layer(guard()))
        .route("/api/users", get(users::list).route_layer(guard()))
        .route(
            "/api/users/:user_id",
            get(users::show).merge(patch(users::edit).route_layer(guard())),
        )
}

fn audio_routes(state: &AppState) -> Router<AppState> {
    use handlers::audios;
    let guard = || from_fn_with_state(state.clone(), jwt_auth_middleware);

    Router::new()
        .route("/api/audios", get(audios::list))
        .route("/api/audios/search", post(audios::search))
        .route(
            "/api/audios/:audio_id",
            get(audios::show).merge(patch(audios::update).delete(audios::delete).route_layer(guard())),
        )
        .route("/api/audios/:audio_id/comments", post(audios::comment).route_layer(guard()))
}

fn category_routes(state: &AppState) -> Router<AppState> {
    use handlers::categories;
    let guard = || from_fn_with_state(state.clone(), jwt_auth_middleware);

    Router::new()
        .route(
            "/api/categories",
            get(categories::list).merge(post(categories::create).route_layer(guard())),
        )
        .route(
            "/api/categories/:ctg_id",
            get(categories::show).merge(
                post(categories::create_audio)
                    .patch(categories::rename)
                    .delete(categories::delete)
                    .route_layer(guard()),
            ),
        )
}

/// Every playlist route requires a token
fn playlist_routes(state: &AppState) -> Router<AppState> {
    use handlers::playlists;

    Router::new()
        .route("/api/playlists", post(playlists::create))
        .route("/api/playlists/user/:user_id", get(playlists::for_user))
        .route("/api/playlists/liked/add/:audio_id", post(playlists::like))
        .route(
            "/api/playlists/:playlist_id",
            get(playlists::show)
                .post(playlists::add_track)
                .patch(playlists::rename)
                .delete(playlists::delete),
        )
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins = if config.allows_any_origin() {
        AllowOrigin::any()
    } else {
        let list: Vec<HeaderValue> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                    None
                }
            })
            .collect();
        AllowOrigin::list(list)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([
            header::ORIGIN,
            HeaderName::from_static("x-requested-with"),
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
}
