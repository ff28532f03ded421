//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds only immutable data: configuration, parsed site content, compiled
//! templates, and the delivery collaborator. Theme state is per request and
//! never lives here.

use std::sync::Arc;

use crate::config::SiteConfig;
use crate::render::Templates;
use crate::services::contact::DeliverySettings;
use crate::services::mailer::Mailer;
use crate::site::Site;

/// Clone is required by Axum; every field is Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<SiteConfig>,
    pub site: Arc<Site>,
    pub templates: Templates,
    pub mailer: Arc<dyn Mailer>,
    pub delivery: Arc<DeliverySettings>,
}

impl AppState {
    #[must_use]
    pub fn new(config: SiteConfig, site: Site, templates: Templates, mailer: Arc<dyn Mailer>) -> Self {
        let delivery = DeliverySettings::from_config(&config);
        Self { config: Arc::new(config), site: Arc::new(site), templates, mailer, delivery: Arc::new(delivery) }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;
    use crate::services::mailer::LogMailer;

    /// `AppState` with default config, the embedded site and templates, and
    /// log-only delivery.
    #[must_use]
    pub fn test_app_state() -> AppState {
        test_app_state_with_mailer(Arc::new(LogMailer))
    }

    #[must_use]
    pub fn test_app_state_with_mailer(mailer: Arc<dyn Mailer>) -> AppState {
        let site = Site::load().expect("embedded site content should load");
        let templates = Templates::new().expect("embedded templates should parse");
        AppState::new(SiteConfig::default(), site, templates, mailer)
    }
}
