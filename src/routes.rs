use crate::auth::{handlers as auth, require_auth};
use crate::handlers::{image_handlers, project_handlers, upload_handlers, user_handlers};
use crate::middleware::add_security_headers;
use crate::services::UPLOAD_BODY_LIMIT;
use crate::AppState;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use std::path::Path;
use tower_http::{services::ServeDir, trace::TraceLayer};

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/send-code", post(auth::send_code))
        .route("/auth/verify-code", post(auth::verify_code))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
}

/// Everything else under `/api` needs a session cookie.
fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Users
        .route(
            "/users",
            get(user_handlers::list_users).post(user_handlers::create_user),
        )
        .route(
            "/users/{id}",
            get(user_handlers::get_user)
                .put(user_handlers::update_user)
                .delete(user_handlers::delete_user),
        )
        // Projects
        .route(
            "/projects",
            get(project_handlers::list_projects).post(project_handlers::create_project),
        )
        .route(
            "/projects/{id}",
            get(project_handlers::get_project)
                .put(project_handlers::update_project)
                .delete(project_handlers::delete_project),
        )
        // Images
        .route(
            "/images",
            get(image_handlers::list_images).post(image_handlers::create_image),
        )
        .route(
            "/images/{id}",
            get(image_handlers::get_image)
                .put(image_handlers::update_image)
                .delete(image_handlers::delete_image),
        )
        .route("/images/{id}/notes", put(image_handlers::update_note))
        .route(
            "/images/{id}/variations",
            get(image_handlers::get_variations).put(image_handlers::select_variation),
        )
        .route(
            "/upload",
            post(upload_handlers::upload_image).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

/// Full application router: JSON API under `/api`, static files from
/// `public_dir` everywhere else.
pub fn app(state: AppState, public_dir: &Path) -> Router {
    Router::new()
        .nest("/api", auth_routes().merge(protected_routes(state.clone())))
        .fallback_service(ServeDir::new(public_dir))
        .layer(middleware::from_fn(add_security_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
