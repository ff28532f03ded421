//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own validation, delivery, and theme reconciliation so
//! route handlers can stay focused on protocol translation.

pub mod contact;
pub mod mailer;
pub mod theme;
