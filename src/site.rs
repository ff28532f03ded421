//! Site content: navigation, pages, and outbound redirects.
//!
//! Content is embedded at build time from `content/site.yaml` and checked
//! once at startup, so a broken content edit fails fast instead of 404ing.

use std::collections::HashSet;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize};

const SITE_CONTENT: &str = include_str!("../content/site.yaml");

pub const CONTACT_PATH: &str = "/contact";

#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    #[error("site content parse failed: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("path {0:?} is defined more than once")]
    DuplicatePath(String),
    #[error("path {0:?} must start with '/'")]
    RelativePath(String),
    #[error("redirect {path:?} must target an https URL, got {target:?}")]
    InsecureRedirect { path: String, target: String },
    #[error("contact page {0:?} is missing")]
    MissingContactPage(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Link {
    pub label: String,
    pub href: String,
}

impl Link {
    #[must_use]
    pub fn is_external(&self) -> bool {
        self.href.starts_with("http://") || self.href.starts_with("https://")
    }
}

/// Templates see `external` alongside the content fields.
impl Serialize for Link {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut link = serializer.serialize_struct("Link", 3)?;
        link.serialize_field("label", &self.label)?;
        link.serialize_field("href", &self.href)?;
        link.serialize_field("external", &self.is_external())?;
        link.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Redirect {
    pub path: String,
    pub target: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Card {
    pub title: String,
    #[serde(default)]
    pub meta: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Section {
    pub heading: String,
    #[serde(default)]
    pub paragraphs: Vec<String>,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Page {
    pub path: String,
    pub title: String,
    pub description: String,
    pub heading: String,
    #[serde(default)]
    pub lead: Option<String>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Site {
    pub name: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub nav: Vec<Link>,
    #[serde(default)]
    pub footer: Vec<Link>,
    #[serde(default)]
    pub redirects: Vec<Redirect>,
    pub pages: Vec<Page>,
}

impl Site {
    /// Parse and check the embedded content.
    ///
    /// # Errors
    ///
    /// Returns a [`SiteError`] if the YAML is malformed or inconsistent.
    pub fn load() -> Result<Self, SiteError> {
        Self::from_yaml(SITE_CONTENT)
    }

    /// # Errors
    ///
    /// Returns a [`SiteError`] if the YAML is malformed or inconsistent.
    pub fn from_yaml(raw: &str) -> Result<Self, SiteError> {
        let site: Self = serde_yaml::from_str(raw)?;
        site.check()?;
        Ok(site)
    }

    #[must_use]
    pub fn page(&self, path: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.path == path)
    }

    #[must_use]
    pub fn redirect(&self, path: &str) -> Option<&Redirect> {
        self.redirects.iter().find(|r| r.path == path)
    }

    fn check(&self) -> Result<(), SiteError> {
        let mut seen = HashSet::new();
        let paths = self
            .pages
            .iter()
            .map(|p| &p.path)
            .chain(self.redirects.iter().map(|r| &r.path));
        for path in paths {
            if !path.starts_with('/') {
                return Err(SiteError::RelativePath(path.clone()));
            }
            if !seen.insert(path.as_str()) {
                return Err(SiteError::DuplicatePath(path.clone()));
            }
        }

        if let Some(r) = self.redirects.iter().find(|r| !r.target.starts_with("https://")) {
            return Err(SiteError::InsecureRedirect { path: r.path.clone(), target: r.target.clone() });
        }

        if self.page(CONTACT_PATH).is_none() {
            return Err(SiteError::MissingContactPage(CONTACT_PATH));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "site_test.rs"]
mod tests;
