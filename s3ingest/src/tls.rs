//! RusTLS setup for database connections.

use std::sync::Arc;

use rustls::{crypto::aws_lc_rs, ClientConfig, RootCertStore};
use rustls_native_certs::load_native_certs;

use crate::common::*;

/// A RusTLS `ClientConfig` trusting the platform's root certificates.
pub(crate) fn rustls_client_config() -> Result<ClientConfig> {
    let mut root_store = RootCertStore::empty();
    let cert_result = load_native_certs();
    for err in &cert_result.errors {
        warn!("problem loading native certificates: {}", err);
    }
    let (added, ignored) = root_store.add_parsable_certificates(cert_result.certs);
    trace!("loaded {} root certificates ({} ignored)", added, ignored);

    Ok(
        ClientConfig::builder_with_provider(Arc::new(aws_lc_rs::default_provider()))
            .with_safe_default_protocol_versions()
            .context("could not configure TLS protocol versions")?
            .with_root_certificates(root_store)
            .with_no_client_auth(),
    )
}
