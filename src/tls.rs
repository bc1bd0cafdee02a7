//! Client TLS material.
//!
//! Loads the PEM client certificate chain, private key and CA bundle and
//! assembles a `rustls` client configuration that presents the client
//! certificate and trusts only the supplied CA.

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::Arc,
};

use rustls::{
    ClientConfig,
    RootCertStore,
    crypto::ring,
    pki_types::{CertificateDer, PrivateKeyDer},
};
use thiserror::Error;

/// Errors raised while loading certificate material.
#[derive(Debug, Error)]
pub enum TlsError {
    /// A PEM file could not be opened or read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Offending file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The certificate file contained no certificates.
    #[error("no certificates found in {path}")]
    NoCertificates {
        /// Offending file.
        path: PathBuf,
    },
    /// The key file contained no private key.
    #[error("no private key found in {path}")]
    NoPrivateKey {
        /// Offending file.
        path: PathBuf,
    },
    /// None of the CA certificates could be used as trust anchors.
    #[error("no usable CA certificates in {path}")]
    NoTrustAnchors {
        /// Offending file.
        path: PathBuf,
    },
    /// rustls rejected the assembled configuration.
    #[error("invalid TLS configuration: {0}")]
    Rustls(#[from] rustls::Error),
}

/// Paths to the PEM material for a mutually authenticated client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientTlsFiles {
    /// Client certificate chain, leaf first.
    pub cert: PathBuf,
    /// Private key matching the leaf certificate.
    pub private_key: PathBuf,
    /// CA bundle used to verify the server.
    pub ca_cert: PathBuf,
}

impl ClientTlsFiles {
    /// Load the files and build a client configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TlsError`] if a file is unreadable, holds no usable PEM
    /// items, or the key does not suit the certificate.
    pub fn load(&self) -> Result<Arc<ClientConfig>, TlsError> {
        let chain = load_certificates(&self.cert)?;
        let key = load_private_key(&self.private_key)?;
        let roots = load_trust_anchors(&self.ca_cert)?;

        let config = ClientConfig::builder_with_provider(Arc::new(ring::default_provider()))
            .with_safe_default_protocol_versions()?
            .with_root_certificates(roots)
            .with_client_auth_cert(chain, key)?;
        Ok(Arc::new(config))
    }
}

fn open(path: &Path) -> Result<BufReader<File>, TlsError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| TlsError::Read {
            path: path.to_path_buf(),
            source,
        })
}

/// Read every certificate from a PEM file.
///
/// # Errors
///
/// Returns [`TlsError::Read`] for unreadable or malformed files and
/// [`TlsError::NoCertificates`] when the file holds none.
pub fn load_certificates(path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let certs = rustls_pemfile::certs(&mut open(path)?)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TlsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    if certs.is_empty() {
        return Err(TlsError::NoCertificates {
            path: path.to_path_buf(),
        });
    }
    Ok(certs)
}

/// Read the first private key from a PEM file.
///
/// # Errors
///
/// Returns [`TlsError::Read`] for unreadable or malformed files and
/// [`TlsError::NoPrivateKey`] when the file holds none.
pub fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, TlsError> {
    rustls_pemfile::private_key(&mut open(path)?)
        .map_err(|source| TlsError::Read {
            path: path.to_path_buf(),
            source,
        })?
        .ok_or_else(|| TlsError::NoPrivateKey {
            path: path.to_path_buf(),
        })
}

/// Build a root store from a PEM CA bundle.
///
/// Certificates that cannot serve as trust anchors are skipped; the bundle
/// must contribute at least one.
///
/// # Errors
///
/// Returns [`TlsError::NoTrustAnchors`] if nothing usable was found.
pub fn load_trust_anchors(path: &Path) -> Result<RootCertStore, TlsError> {
    let certs = match load_certificates(path) {
        Err(TlsError::NoCertificates { path }) => return Err(TlsError::NoTrustAnchors { path }),
        other => other?,
    };
    let mut roots = RootCertStore::empty();
    let (added, ignored) = roots.add_parsable_certificates(certs);
    if ignored > 0 {
        tracing::warn!(path = %path.display(), ignored, "skipped unusable CA certificates");
    }
    if added == 0 {
        return Err(TlsError::NoTrustAnchors {
            path: path.to_path_buf(),
        });
    }
    Ok(roots)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn pem_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("create temp file");
        file.write_all(contents.as_bytes()).expect("write temp file");
        file
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load_certificates(Path::new("/nonexistent/client.pem"))
            .expect_err("missing file must fail");
        assert!(matches!(err, TlsError::Read { .. }));
    }

    #[test]
    fn empty_certificate_file_is_rejected() {
        let file = pem_file("");
        let err = load_certificates(file.path()).expect_err("empty file must fail");
        assert!(matches!(err, TlsError::NoCertificates { .. }));
    }

    #[test]
    fn key_file_without_key_is_rejected() {
        let file = pem_file("just some text\n");
        let err = load_private_key(file.path()).expect_err("no key must fail");
        assert!(matches!(err, TlsError::NoPrivateKey { .. }));
    }

    #[test]
    fn empty_ca_bundle_has_no_trust_anchors() {
        let file = pem_file("");
        let err = load_trust_anchors(file.path()).expect_err("empty bundle must fail");
        assert!(matches!(err, TlsError::NoTrustAnchors { .. }));
    }
}
