//! Contact routes: HTML form and JSON API over the same pipeline.

use std::collections::HashMap;

use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use super::pages::{html_response, layout_for};
use super::theme::PageTheme;
use crate::render::{ContactForm, ContactView};
use crate::services::contact::{self, RawContactFields, SubmissionResult};
use crate::site::CONTACT_PATH;
use crate::state::AppState;

/// 200 delivered, 422 rejected input, 502 delivery fault.
pub(crate) fn status_for(result: &SubmissionResult) -> StatusCode {
    if result.success {
        StatusCode::OK
    } else if result.is_validation_failure() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::BAD_GATEWAY
    }
}

fn contact_page(
    state: &AppState,
    theme: &PageTheme,
    previous: Option<(&RawContactFields, &SubmissionResult)>,
    status: StatusCode,
) -> Response {
    let Some(page) = state.site.page(CONTACT_PATH) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let view = ContactView { layout: layout_for(state, theme, page), page, form: ContactForm::new(previous) };
    html_response(status, state.templates.render(&view))
}

/// `GET /contact`: empty form.
pub async fn show_form(State(state): State<AppState>, theme: PageTheme) -> Response {
    contact_page(&state, &theme, None, StatusCode::OK)
}

/// `POST /contact`: URL-encoded form; re-renders the page with the outcome.
pub async fn submit_form(
    State(state): State<AppState>,
    theme: PageTheme,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let raw = RawContactFields::from_form(&form);
    let result = contact::handle_submission(state.mailer.as_ref(), &state.templates, &state.delivery, &raw).await;
    contact_page(&state, &theme, Some((&raw, &result)), status_for(&result))
}

/// `POST /api/contact`: JSON body in, `SubmissionResult` out.
pub async fn submit_json(State(state): State<AppState>, Json(body): Json<serde_json::Value>) -> Response {
    let raw = RawContactFields::from_json(&body);
    let result = contact::handle_submission(state.mailer.as_ref(), &state.templates, &state.delivery, &raw).await;
    (status_for(&result), Json(result)).into_response()
}

#[cfg(test)]
#[path = "contact_test.rs"]
mod tests;
