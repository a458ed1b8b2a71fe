//! Site-Scoped Clients
//!
//! Each site has its own analytics credential and therefore its own provider
//! client:
//!
//! - **credentials**: where a site's credential comes from
//! - **cache**: lazily built, shared per-site clients

mod cache;
mod credentials;

pub use cache::{EvictionPolicy, MaxAge, NeverEvict, SiteClient, SiteClientCache};
pub use credentials::{
    ConfigCredentialResolver, CredentialError, CredentialResolver, SiteCredential,
    StaticCredentialResolver,
};
