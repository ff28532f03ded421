//! Cross-subdomain light/dark theme synchronization.
//!
//! The `ekgf-theme` cookie is the shared source of truth for every site under
//! the parent domain. Each request gets its own `ThemeContext` (the in-page
//! theme state) and a `ThemeSync` wrapping that request's cookie store; the
//! context is only changed through `ThemeSync` operations.
//!
//! On the server, "before first paint" means the root class is rendered into
//! the `<html>` tag itself. The layout also carries a small inline script that
//! repeats the same decision client-side so an unset preference still follows
//! the system setting before the body is painted.
//!
//! TRADE-OFFS
//! ==========
//! Persistence is best-effort. Read failures look like "no preference" and
//! write failures are dropped; the page renders either way.

use std::convert::Infallible;

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};

pub const THEME_COOKIE: &str = "ekgf-theme";
pub const THEME_COOKIE_MAX_AGE_DAYS: i64 = 365;

// =============================================================================
// PREFERENCE + CONTEXT
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    Dark,
    Light,
}

impl ThemePreference {
    /// Strict parse: only the exact strings `dark` and `light`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

/// In-page theme state: follow the system, or an explicit choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeSetting {
    #[default]
    System,
    Explicit(ThemePreference),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeContext {
    setting: ThemeSetting,
    system: ThemePreference,
}

impl ThemeContext {
    #[must_use]
    pub fn new(system: ThemePreference) -> Self {
        Self { setting: ThemeSetting::System, system }
    }

    #[must_use]
    pub fn setting(&self) -> ThemeSetting {
        self.setting
    }

    #[must_use]
    pub fn system(&self) -> ThemePreference {
        self.system
    }

    /// The theme actually shown.
    #[must_use]
    pub fn resolved(&self) -> ThemePreference {
        match self.setting {
            ThemeSetting::System => self.system,
            ThemeSetting::Explicit(pref) => pref,
        }
    }
}

impl Default for ThemeContext {
    fn default() -> Self {
        Self::new(ThemePreference::Light)
    }
}

// =============================================================================
// DOCUMENT ROOT
// =============================================================================

/// Class list of the document root (`<html class="...">`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootClasses(Vec<String>);

impl RootClasses {
    pub fn add(&mut self, class: &str) {
        if !self.contains(class) {
            self.0.push(class.to_owned());
        }
    }

    pub fn remove(&mut self, class: &str) {
        self.0.retain(|c| c != class);
    }

    #[must_use]
    pub fn contains(&self, class: &str) -> bool {
        self.0.iter().any(|c| c == class)
    }

    /// Space-separated, for the `class` attribute.
    #[must_use]
    pub fn render(&self) -> String {
        self.0.join(" ")
    }
}

/// Put the preference's class on the root and take the opposite one off.
/// Callers run this while building the document, before anything is sent.
pub fn apply_before_first_paint(root: &mut RootClasses, preference: ThemePreference) {
    root.remove(preference.opposite().as_str());
    root.add(preference.as_str());
}

// =============================================================================
// COOKIE STORE
// =============================================================================

pub trait CookieStore {
    /// Why a read or write did not happen. Only logged, never surfaced.
    type Error: std::fmt::Display;

    /// Raw value of the named cookie, if present.
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` when the store cannot be read.
    fn get(&self, name: &str) -> Result<Option<String>, Self::Error>;

    /// Queue a cookie write.
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` when the store cannot be written.
    fn set(&mut self, cookie: Cookie<'static>) -> Result<(), Self::Error>;
}

/// Request cookies in, `Set-Cookie` headers out.
impl CookieStore for CookieJar {
    type Error = Infallible;

    fn get(&self, name: &str) -> Result<Option<String>, Self::Error> {
        Ok(CookieJar::get(self, name).map(|c| c.value().to_owned()))
    }

    fn set(&mut self, cookie: Cookie<'static>) -> Result<(), Self::Error> {
        let jar = std::mem::replace(self, CookieJar::new());
        *self = jar.add(cookie);
        Ok(())
    }
}

// =============================================================================
// COOKIE POLICY
// =============================================================================

/// Attributes for the shared cookie as seen from one request host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookiePolicy {
    /// `Domain` attribute; `None` means host-only.
    pub domain: Option<String>,
    pub secure: bool,
}

impl CookiePolicy {
    #[must_use]
    pub fn for_host(host: &str, shared_parent: &str, secure: bool) -> Self {
        Self { domain: shared_domain_for_host(host, shared_parent), secure }
    }

    #[must_use]
    pub fn build(&self, preference: ThemePreference) -> Cookie<'static> {
        let mut builder = Cookie::build((THEME_COOKIE, preference.as_str()))
            .path("/")
            .max_age(time::Duration::days(THEME_COOKIE_MAX_AGE_DAYS))
            .same_site(SameSite::Lax)
            .secure(self.secure);
        if let Some(domain) = &self.domain {
            builder = builder.domain(domain.clone());
        }
        builder.build()
    }
}

/// The parent domain to scope the cookie to, when `host` is a strict
/// subdomain of it. The apex itself and unrelated hosts stay host-only.
#[must_use]
pub fn shared_domain_for_host(host: &str, shared_parent: &str) -> Option<String> {
    let parent = shared_parent.trim().trim_start_matches('.').to_ascii_lowercase();
    if parent.is_empty() {
        return None;
    }
    let host = strip_port(host.trim()).trim_end_matches('.').to_ascii_lowercase();
    let suffix = format!(".{parent}");
    (host.len() > suffix.len() && host.ends_with(&suffix)).then_some(parent)
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return host;
    }
    match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

// =============================================================================
// SYNCHRONIZER
// =============================================================================

pub struct ThemeSync<S> {
    store: S,
    policy: CookiePolicy,
}

impl<S: CookieStore> ThemeSync<S> {
    #[must_use]
    pub fn new(store: S, policy: CookiePolicy) -> Self {
        Self { store, policy }
    }

    /// The shared cookie's preference. Missing, malformed, or unreadable
    /// cookies all read as `None`.
    #[must_use]
    pub fn read_shared_preference(&self) -> Option<ThemePreference> {
        match self.store.get(THEME_COOKIE) {
            Ok(Some(raw)) => ThemePreference::parse(&raw),
            Ok(None) => None,
            Err(e) => {
                tracing::debug!(error = %e, "theme cookie read failed; treating as unset");
                None
            }
        }
    }

    /// Record a new in-page setting and mirror explicit choices to the cookie.
    pub fn on_preference_change(&mut self, ctx: &mut ThemeContext, setting: ThemeSetting) {
        ctx.setting = setting;
        if let ThemeSetting::Explicit(preference) = setting {
            self.write_shared_preference(preference);
        }
    }

    /// Cookie wins on load: a valid cookie overrides the in-page setting.
    /// With no valid cookie the context is left alone and nothing is written.
    pub fn reconcile_on_mount(&mut self, ctx: &mut ThemeContext) {
        if let Some(preference) = self.read_shared_preference() {
            ctx.setting = ThemeSetting::Explicit(preference);
        }
    }

    /// Flip whatever is currently shown and persist it.
    pub fn toggle(&mut self, ctx: &mut ThemeContext) -> ThemePreference {
        let next = ctx.resolved().opposite();
        self.on_preference_change(ctx, ThemeSetting::Explicit(next));
        next
    }

    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }

    fn write_shared_preference(&mut self, preference: ThemePreference) {
        let cookie = self.policy.build(preference);
        if let Err(e) = self.store.set(cookie) {
            tracing::debug!(error = %e, theme = preference.as_str(), "theme cookie write dropped");
        }
    }
}

#[cfg(test)]
#[path = "theme_test.rs"]
mod tests;
