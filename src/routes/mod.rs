//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Content pages and outbound redirects are registered from the site
//! content, so adding a page is a content edit. The contact form and theme
//! endpoints are fixed routes; static assets are served from `STATIC_DIR`.

pub mod contact;
pub mod pages;
pub mod theme;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::site::CONTACT_PATH;
use crate::state::AppState;

/// Full application router.
pub fn app(state: AppState) -> Router {
    let mut router: Router<AppState> = Router::new();

    for page in state.site.pages.iter().filter(|p| p.path != CONTACT_PATH) {
        router = router.route(&page.path, get(pages::show_page));
    }
    for redirect in &state.site.redirects {
        router = router.route(&redirect.path, get(pages::follow_redirect));
    }

    let static_files = ServeDir::new(&state.config.static_dir);

    router
        .route(CONTACT_PATH, get(contact::show_form).post(contact::submit_form))
        .route("/api/contact", post(contact::submit_json))
        .route("/api/theme", get(theme::current).post(theme::set))
        .route("/theme/toggle", post(theme::toggle))
        .route("/healthz", get(healthz))
        .nest_service("/static", static_files)
        .fallback(pages::not_found)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
