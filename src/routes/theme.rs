//! Theme routes and the per-request theme extractor.

use std::convert::Infallible;

use axum::extract::rejection::FormRejection;
use axum::extract::{Form, FromRef, State};
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::services::theme::{
    CookiePolicy, RootClasses, ThemeContext, ThemePreference, ThemeSetting, ThemeSync, apply_before_first_paint,
};
use crate::state::AppState;

const COLOR_SCHEME_HINT: &str = "sec-ch-prefers-color-scheme";

/// Theme synchronizer over this request's cookies, scoped for its host.
pub(crate) fn sync_for(state: &AppState, headers: &HeaderMap, jar: CookieJar) -> ThemeSync<CookieJar> {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let policy = CookiePolicy::for_host(host, &state.config.shared_cookie_domain, state.config.cookie_secure);
    ThemeSync::new(jar, policy)
}

/// System preference from the `Sec-CH-Prefers-Color-Scheme` client hint,
/// light when the browser did not send one.
pub(crate) fn system_hint(headers: &HeaderMap) -> ThemePreference {
    headers
        .get(COLOR_SCHEME_HINT)
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| ThemePreference::parse(raw.trim().trim_matches('"')))
        .unwrap_or(ThemePreference::Light)
}

// =============================================================================
// PAGE THEME EXTRACTOR
// =============================================================================

/// Reconciled theme for a page render. Use as a handler parameter on any
/// route that returns HTML.
#[derive(Debug)]
pub struct PageTheme {
    pub ctx: ThemeContext,
    pub root: RootClasses,
}

impl<S> axum::extract::FromRequestParts<S> for PageTheme
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        let mut sync = sync_for(&app_state, &parts.headers, jar);

        let mut ctx = ThemeContext::new(system_hint(&parts.headers));
        sync.reconcile_on_mount(&mut ctx);

        let mut root = RootClasses::default();
        apply_before_first_paint(&mut root, ctx.resolved());
        Ok(Self { ctx, root })
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ThemeBody {
    theme: Option<ThemePreference>,
}

#[derive(Debug, Deserialize)]
pub struct SetThemeRequest {
    theme: String,
}

/// `GET /api/theme`: the shared preference, or `null` when unset.
pub async fn current(State(state): State<AppState>, headers: HeaderMap, jar: CookieJar) -> Json<ThemeBody> {
    let sync = sync_for(&state, &headers, jar);
    Json(ThemeBody { theme: sync.read_shared_preference() })
}

/// `POST /api/theme`: set an explicit preference and write the shared cookie.
pub async fn set(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(body): Json<SetThemeRequest>,
) -> Response {
    let Some(preference) = ThemePreference::parse(&body.theme) else {
        return (StatusCode::UNPROCESSABLE_ENTITY, "theme must be \"dark\" or \"light\"").into_response();
    };

    let mut sync = sync_for(&state, &headers, jar);
    let mut ctx = ThemeContext::new(system_hint(&headers));
    sync.reconcile_on_mount(&mut ctx);
    let previous = ctx.setting();
    sync.on_preference_change(&mut ctx, ThemeSetting::Explicit(preference));

    tracing::debug!(theme = preference.as_str(), ?previous, "theme preference set");
    (sync.into_store(), StatusCode::NO_CONTENT).into_response()
}

#[derive(Debug, Deserialize)]
pub struct ToggleForm {
    #[serde(default)]
    shown: Option<String>,
}

/// Theme the user is looking at. The toggle form carries it, since the page
/// script may have applied a system preference the server never saw. Without
/// it, fall back to what this request would render.
fn shown_context(sync: &mut ThemeSync<CookieJar>, headers: &HeaderMap, shown: Option<ThemePreference>) -> ThemeContext {
    if let Some(shown) = shown {
        return ThemeContext::new(shown);
    }
    let mut ctx = ThemeContext::new(system_hint(headers));
    sync.reconcile_on_mount(&mut ctx);
    ctx
}

/// `POST /theme/toggle`: flip the shown theme and go back where the user was.
pub async fn toggle(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    form: Result<Form<ToggleForm>, FormRejection>,
) -> Response {
    let shown = form
        .ok()
        .and_then(|Form(form)| form.shown)
        .and_then(|raw| ThemePreference::parse(&raw));

    let mut sync = sync_for(&state, &headers, jar);
    let mut ctx = shown_context(&mut sync, &headers, shown);
    let next = sync.toggle(&mut ctx);

    tracing::debug!(theme = next.as_str(), "theme toggled");
    (sync.into_store(), Redirect::to(&back_path(&headers))).into_response()
}

/// Path of the `Referer`, so the redirect never leaves this host.
pub(crate) fn back_path(headers: &HeaderMap) -> String {
    headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| raw.parse::<Uri>().ok())
        .and_then(|uri| uri.path_and_query().map(|pq| pq.as_str().to_owned()))
        .filter(|path| path.starts_with('/') && !path.starts_with("//"))
        .unwrap_or_else(|| "/".to_owned())
}

#[cfg(test)]
#[path = "theme_test.rs"]
mod tests;
