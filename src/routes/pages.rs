//! Content pages, outbound redirects, and the 404 page.

use axum::extract::State;
use axum::http::{HeaderName, StatusCode, Uri, header};
use axum::response::{Html, IntoResponse, Redirect, Response};

use super::theme::PageTheme;
use crate::render::{Layout, PageView, RenderError};
use crate::site::Page;
use crate::state::AppState;

const ACCEPT_CH: HeaderName = HeaderName::from_static("accept-ch");
const CRITICAL_CH: HeaderName = HeaderName::from_static("critical-ch");
const COLOR_SCHEME_HINT_NAME: &str = "Sec-CH-Prefers-Color-Scheme";

/// Layout values for `page` under this request's theme.
pub(crate) fn layout_for<'a>(state: &'a AppState, theme: &PageTheme, page: &'a Page) -> Layout<'a> {
    Layout::new(&state.site, page, &theme.root, theme.ctx.resolved())
}

/// HTML response. The markup depends on the theme cookie and the color-scheme
/// hint, so both are advertised for caches. `Critical-CH` asks the browser to
/// retry the first request with the hint rather than render the wrong theme.
pub(crate) fn html_response(status: StatusCode, rendered: Result<String, RenderError>) -> Response {
    match rendered {
        Ok(html) => (
            status,
            [
                (ACCEPT_CH, COLOR_SCHEME_HINT_NAME),
                (CRITICAL_CH, COLOR_SCHEME_HINT_NAME),
                (header::VARY, "Cookie, Sec-CH-Prefers-Color-Scheme"),
            ],
            Html(html),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "page render failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn render_page(state: &AppState, theme: &PageTheme, page: &Page, status: StatusCode) -> Response {
    let view = PageView { layout: layout_for(state, theme, page), page };
    html_response(status, state.templates.render(&view))
}

/// `GET <page path>`: any page defined in the site content.
pub async fn show_page(State(state): State<AppState>, theme: PageTheme, uri: Uri) -> Response {
    match state.site.page(uri.path()) {
        Some(page) => render_page(&state, &theme, page, StatusCode::OK),
        None => not_found_response(&state, &theme),
    }
}

/// `GET <redirect path>`: temporary redirect to an external documentation site.
pub async fn follow_redirect(State(state): State<AppState>, uri: Uri) -> Response {
    match state.site.redirect(uri.path()) {
        Some(redirect) => Redirect::temporary(&redirect.target).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Fallback for unknown paths.
pub async fn not_found(State(state): State<AppState>, theme: PageTheme) -> Response {
    not_found_response(&state, &theme)
}

fn not_found_response(state: &AppState, theme: &PageTheme) -> Response {
    let page = Page {
        path: String::new(),
        title: format!("Page not found | {}", state.site.name),
        description: state.site.description.clone(),
        heading: "Page not found".to_owned(),
        lead: Some("The page you are looking for does not exist or has moved.".to_owned()),
        sections: Vec::new(),
    };
    render_page(state, theme, &page, StatusCode::NOT_FOUND)
}

#[cfg(test)]
#[path = "pages_test.rs"]
mod tests;
