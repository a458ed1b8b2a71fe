//! Site Credentials
//!
//! A site's analytics credential is an application name plus opaque key
//! material. Where credentials live is the host's business; the cache only
//! sees a [`CredentialResolver`].

use crate::config::SiteConfig;
use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

/// Analytics credential configured for one site
pub struct SiteCredential {
    application_name: String,
    key_material: Secret<Vec<u8>>,
}

impl SiteCredential {
    pub fn new(application_name: impl Into<String>, key_material: Vec<u8>) -> Self {
        Self {
            application_name: application_name.into(),
            key_material: Secret::new(key_material),
        }
    }

    pub fn application_name(&self) -> &str {
        &self.application_name
    }

    /// Raw key material, typically a service-account JSON key
    pub fn key_material(&self) -> &[u8] {
        self.key_material.expose_secret()
    }
}

impl std::fmt::Debug for SiteCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteCredential")
            .field("application_name", &self.application_name)
            .field("key_material", &"[REDACTED]")
            .finish()
    }
}

/// Errors raised while looking up a credential
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Failed to read key file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Credential store error: {0}")]
    Store(String),
}

/// Looks up the credential configured for a site
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    /// `Ok(None)` when the site has no analytics credential
    async fn resolve(&self, site_id: &str) -> Result<Option<SiteCredential>, CredentialError>;
}

/// In-memory credentials. A poisoned lock is recovered, not reported.
#[derive(Default)]
pub struct StaticCredentialResolver {
    entries: RwLock<HashMap<String, (String, Vec<u8>)>>,
}

impl StaticCredentialResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the credential for `site_id`
    pub fn insert(
        &self,
        site_id: impl Into<String>,
        application_name: impl Into<String>,
        key_material: Vec<u8>,
    ) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(site_id.into(), (application_name.into(), key_material));
    }

    pub fn remove(&self, site_id: &str) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(site_id)
            .is_some()
    }
}

#[async_trait]
impl CredentialResolver for StaticCredentialResolver {
    async fn resolve(&self, site_id: &str) -> Result<Option<SiteCredential>, CredentialError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);

        Ok(entries
            .get(site_id)
            .map(|(name, key)| SiteCredential::new(name.clone(), key.clone())))
    }
}

/// Credentials from `[sites.<id>]` config tables.
///
/// `key_file` is read on every resolve so rotated keys are picked up when the
/// cache rebuilds a client; `key_env` is consulted when no file is set.
pub struct ConfigCredentialResolver {
    sites: BTreeMap<String, SiteConfig>,
}

impl ConfigCredentialResolver {
    pub fn new(sites: BTreeMap<String, SiteConfig>) -> Self {
        Self { sites }
    }

    /// Configured site ids, sorted
    pub fn site_ids(&self) -> impl Iterator<Item = &str> {
        self.sites.keys().map(String::as_str)
    }
}

#[async_trait]
impl CredentialResolver for ConfigCredentialResolver {
    async fn resolve(&self, site_id: &str) -> Result<Option<SiteCredential>, CredentialError> {
        let Some(site) = self.sites.get(site_id) else {
            return Ok(None);
        };

        let key_material = if let Some(path) = &site.key_file {
            tokio::fs::read(path).await.map_err(|e| CredentialError::Io {
                path: path.clone(),
                error: e.to_string(),
            })?
        } else if let Some(var) = &site.key_env {
            match std::env::var(var) {
                Ok(value) if !value.trim().is_empty() => value.into_bytes(),
                _ => {
                    tracing::debug!(site_id, var = %var, "Key variable unset");
                    return Ok(None);
                }
            }
        } else {
            return Ok(None);
        };

        Ok(Some(SiteCredential::new(
            site.application_name.clone(),
            key_material,
        )))
    }
}
