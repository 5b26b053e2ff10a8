//! TLS material for the Device-Manager channel.

use std::path::Path;

use anyhow::{Context, Result};
use tonic::transport::{Certificate, ClientTlsConfig, Identity};

use crate::domain::config::TlsConfig;

/// Build the client TLS config: trust `ca_cert`, present a client identity
/// when one is configured, and verify the server as `domain`.
///
/// # Errors
///
/// Returns an error if a configured PEM file cannot be read.
pub fn client_tls_config(tls: &TlsConfig, domain: &str) -> Result<ClientTlsConfig> {
    let mut config = ClientTlsConfig::new().domain_name(domain);
    if let Some(ca) = &tls.ca_cert {
        config = config.ca_certificate(Certificate::from_pem(read_pem(ca)?));
    }
    if let (Some(cert), Some(key)) = (&tls.client_cert, &tls.client_key) {
        config = config.identity(Identity::from_pem(read_pem(cert)?, read_pem(key)?));
        tracing::debug!(cert = %cert.display(), "using mTLS client identity");
    }
    Ok(config)
}

fn read_pem(path: &Path) -> Result<Vec<u8>> {
    let pem =
        std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    anyhow::ensure!(
        !pem.is_empty(),
        "{} is empty; expected PEM data",
        path.display()
    );
    Ok(pem)
}
