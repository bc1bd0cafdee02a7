//! Throwaway certificate authority for TLS tests.
//!
//! [`TestPki::generate`] creates a CA plus a server leaf valid for
//! `localhost` and `127.0.0.1` and a client leaf for mutual authentication.

use std::{fs, path::Path, sync::Arc};

use rcgen::{
    BasicConstraints,
    Certificate,
    CertificateParams,
    DnType,
    ExtendedKeyUsagePurpose,
    IsCa,
    KeyPair,
    KeyUsagePurpose,
};
use rustls::{
    RootCertStore,
    ServerConfig,
    crypto::ring,
    pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer},
    server::WebPkiClientVerifier,
};
use warplink::ClientTlsFiles;

struct Leaf {
    cert: Certificate,
    key: KeyPair,
}

/// A CA with one server and one client certificate.
pub struct TestPki {
    ca_cert: Certificate,
    server: Leaf,
    client: Leaf,
}

impl TestPki {
    /// Generate fresh keys and certificates.
    ///
    /// # Panics
    ///
    /// Panics if key generation or signing fails.
    #[must_use]
    pub fn generate() -> Self {
        let ca_key = KeyPair::generate().expect("generate CA key");
        let mut ca_params = CertificateParams::new(Vec::<String>::new()).expect("CA params");
        ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        ca_params
            .distinguished_name
            .push(DnType::CommonName, "warplink test CA");
        ca_params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];
        let ca_cert = ca_params.self_signed(&ca_key).expect("self-sign CA");

        let issue = |names: Vec<String>, common_name: &str, usage| {
            let key = KeyPair::generate().expect("generate leaf key");
            let mut params = CertificateParams::new(names).expect("leaf params");
            params.distinguished_name.push(DnType::CommonName, common_name);
            params.extended_key_usages = vec![usage];
            let cert = params
                .signed_by(&key, &ca_cert, &ca_key)
                .expect("sign leaf");
            Leaf { cert, key }
        };

        let server = issue(
            vec!["localhost".to_owned(), "127.0.0.1".to_owned()],
            "warplink test server",
            ExtendedKeyUsagePurpose::ServerAuth,
        );
        let client = issue(
            vec!["agent.test".to_owned()],
            "warplink test agent",
            ExtendedKeyUsagePurpose::ClientAuth,
        );

        Self {
            ca_cert,
            server,
            client,
        }
    }

    /// PEM encoding of the CA certificate.
    #[must_use]
    pub fn ca_pem(&self) -> String { self.ca_cert.pem() }

    /// Write the client-side PEM files into `dir`.
    ///
    /// # Panics
    ///
    /// Panics if a file cannot be written.
    #[must_use]
    pub fn write_client_files(&self, dir: &Path) -> ClientTlsFiles {
        let files = ClientTlsFiles {
            cert: dir.join("client.pem"),
            private_key: dir.join("client.key"),
            ca_cert: dir.join("ca.pem"),
        };
        fs::write(&files.cert, self.client.cert.pem()).expect("write client certificate");
        fs::write(&files.private_key, self.client.key.serialize_pem()).expect("write client key");
        fs::write(&files.ca_cert, self.ca_pem()).expect("write CA certificate");
        files
    }

    /// Server configuration presenting the server leaf and requiring a
    /// client certificate signed by this CA.
    ///
    /// # Panics
    ///
    /// Panics if rustls rejects the generated material.
    #[must_use]
    pub fn server_config(&self) -> Arc<ServerConfig> {
        let provider = Arc::new(ring::default_provider());
        let mut roots = RootCertStore::empty();
        roots
            .add(self.ca_cert.der().clone())
            .expect("add CA to root store");
        let verifier = WebPkiClientVerifier::builder_with_provider(Arc::new(roots), provider.clone())
            .build()
            .expect("build client verifier");

        let chain: Vec<CertificateDer<'static>> = vec![self.server.cert.der().clone()];
        let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(self.server.key.serialize_der()));
        let config = ServerConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .expect("protocol versions")
            .with_client_cert_verifier(verifier)
            .with_single_cert(chain, key)
            .expect("server certificate");
        Arc::new(config)
    }
}
