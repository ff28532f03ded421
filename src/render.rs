//! Server-side HTML rendering.
//!
//! DESIGN
//! ======
//! Templates are embedded at build time and registered with `tera` under
//! `.html` names, so every value is autoescaped on output. Each template has a
//! serializable view; `Templates::render` turns a view into a string. Values
//! are substituted once, so user text that looks like template syntax stays
//! text.
//!
//! `base.html` is the document shell: the root class and the pre-paint theme
//! script live there. `page.html` extends it and `contact.html` extends the
//! page.

use std::sync::Arc;

use serde::Serialize;
use tera::Tera;

use crate::services::contact::{ContactField, RawContactFields, SubmissionResult};
use crate::services::theme::{RootClasses, THEME_COOKIE, ThemePreference};
use crate::site::{Link, Page, Site};

#[derive(Debug, thiserror::Error)]
#[error("template render failed: {0}")]
pub struct RenderError(#[from] tera::Error);

/// A view bound to one embedded template.
pub trait Template: Serialize {
    const NAME: &'static str;
}

macro_rules! templates {
    ($( $ty:ident ( $path:literal ), )*) => {
        $(
            impl Template for $ty<'_> {
                const NAME: &'static str = $path;
            }
        )*

        const TEMPLATES: &[(&str, &str)] = &[
            ("base.html", include_str!("../templates/base.html")),
            $( ($path, include_str!(concat!("../templates/", $path))), )*
        ];
    };
}

templates! {
    PageView("page.html"),
    ContactView("contact.html"),
    ContactEmail("contact_email.html"),
}

#[derive(Debug, Clone)]
pub struct Templates(Arc<Tera>);

impl Templates {
    /// Parse every embedded template.
    ///
    /// # Errors
    ///
    /// Returns a [`RenderError`] if a template does not parse or extends a
    /// missing parent.
    pub fn new() -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.iter().copied())?;
        Ok(Self(Arc::new(tera)))
    }

    /// # Errors
    ///
    /// Returns a [`RenderError`] if the view does not serialize to an object
    /// or the template references a value the view lacks.
    pub fn render<T: Template>(&self, view: &T) -> Result<String, RenderError> {
        let context = tera::Context::from_serialize(view)?;
        Ok(self.0.render(T::NAME, &context)?)
    }
}

// =============================================================================
// DOCUMENT SHELL
// =============================================================================

/// Values `base.html` needs for every page.
#[derive(Debug, Serialize)]
pub struct Layout<'a> {
    pub path: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub site_name: &'a str,
    pub site_title: &'a str,
    pub nav: &'a [Link],
    pub footer: &'a [Link],
    /// Written into `<html class>`, which is what makes the theme visible on
    /// the first painted frame.
    pub html_class: String,
    /// Theme the server resolved; the toggle form posts it back.
    pub shown: ThemePreference,
    pub theme_cookie: &'static str,
}

impl<'a> Layout<'a> {
    #[must_use]
    pub fn new(site: &'a Site, page: &'a Page, root: &RootClasses, shown: ThemePreference) -> Self {
        Self {
            path: &page.path,
            title: &page.title,
            description: &page.description,
            site_name: &site.name,
            site_title: &site.title,
            nav: &site.nav,
            footer: &site.footer,
            html_class: root.render(),
            shown,
            theme_cookie: THEME_COOKIE,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PageView<'a> {
    #[serde(flatten)]
    pub layout: Layout<'a>,
    pub page: &'a Page,
}

// =============================================================================
// CONTACT FORM
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ContactView<'a> {
    #[serde(flatten)]
    pub layout: Layout<'a>,
    pub page: &'a Page,
    pub form: ContactForm<'a>,
}

/// The contact form, optionally echoing a previous attempt.
///
/// After a successful submission the fields are cleared; after a failed one
/// the user's input is kept so they only fix what was flagged.
#[derive(Debug, Serialize)]
pub struct ContactForm<'a> {
    banner: Option<Banner<'a>>,
    fields: Vec<FormField<'a>>,
}

#[derive(Debug, Serialize)]
struct Banner<'a> {
    kind: &'static str,
    message: &'a str,
}

#[derive(Debug, Serialize)]
struct FormField<'a> {
    name: &'static str,
    label: &'static str,
    input_type: &'static str,
    value: &'a str,
    error: Option<&'a str>,
}

impl<'a> ContactForm<'a> {
    #[must_use]
    pub fn new(previous: Option<(&'a RawContactFields, &'a SubmissionResult)>) -> Self {
        let banner = previous.map(|(_, result)| Banner {
            kind: if result.success { "success" } else { "error" },
            message: &result.message,
        });
        let fields = ContactField::ALL
            .into_iter()
            .map(|field| {
                let (label, input_type) = match field {
                    ContactField::Name => ("Name", "text"),
                    ContactField::Email => ("Email", "email"),
                    ContactField::Subject => ("Subject", "text"),
                    ContactField::Message => ("Message", "textarea"),
                };
                let value = match previous {
                    Some((raw, result)) if !result.success => raw.text_of(field),
                    _ => "",
                };
                let error = previous
                    .and_then(|(_, result)| result.field_errors.as_ref())
                    .and_then(|errors| errors.first(field));
                FormField { name: field.as_str(), label, input_type, value, error }
            })
            .collect();
        Self { banner, fields }
    }
}

// =============================================================================
// CONTACT EMAIL
// =============================================================================

/// Body of the message sent to the forum inbox.
#[derive(Debug, Serialize)]
pub struct ContactEmail<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub subject: &'a str,
    pub message_lines: Vec<&'a str>,
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
