//! Mutual-TLS material loading.

use std::path::{Path, PathBuf};

use reqwest::{Certificate, Identity};

use crate::config::UpstreamConfig;
use crate::upstream::error::{MaterialKind, TlsError};

/// Where the client certificate, private key and CA certificate live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub client_certificate: PathBuf,
    pub client_private_key: PathBuf,
    pub ca_certificate: PathBuf,
}

impl From<&UpstreamConfig> for TlsPaths {
    fn from(config: &UpstreamConfig) -> Self {
        Self {
            client_certificate: config.client_certificate.clone(),
            client_private_key: config.client_private_key.clone(),
            ca_certificate: config.ca_certificate.clone(),
        }
    }
}

/// PEM material read for one backend call.
///
/// Files are read fully and closed before this value is returned.
pub struct TlsMaterial {
    certificate_pem: Vec<u8>,
    private_key_pem: Vec<u8>,
    ca_pem: Vec<u8>,
}

impl TlsMaterial {
    /// Read and sanity-check all three files.
    pub async fn load(paths: &TlsPaths) -> Result<Self, TlsError> {
        let certificate_pem = read(MaterialKind::ClientCertificate, &paths.client_certificate).await?;
        ensure_certificate(MaterialKind::ClientCertificate, &paths.client_certificate, &certificate_pem)?;

        let private_key_pem = read(MaterialKind::ClientPrivateKey, &paths.client_private_key).await?;
        ensure_private_key(&paths.client_private_key, &private_key_pem)?;

        let ca_pem = read(MaterialKind::CaCertificate, &paths.ca_certificate).await?;
        ensure_certificate(MaterialKind::CaCertificate, &paths.ca_certificate, &ca_pem)?;

        Ok(Self {
            certificate_pem,
            private_key_pem,
            ca_pem,
        })
    }

    /// Client identity: certificate chain followed by the private key.
    pub fn identity(&self) -> Result<Identity, TlsError> {
        let mut pem = Vec::with_capacity(self.certificate_pem.len() + self.private_key_pem.len() + 1);
        pem.extend_from_slice(&self.certificate_pem);
        pem.push(b'\n');
        pem.extend_from_slice(&self.private_key_pem);
        Identity::from_pem(&pem).map_err(|source| TlsError::Rejected {
            kind: MaterialKind::ClientCertificate,
            source,
        })
    }

    pub fn ca_certificate(&self) -> Result<Certificate, TlsError> {
        Certificate::from_pem(&self.ca_pem).map_err(|source| TlsError::Rejected {
            kind: MaterialKind::CaCertificate,
            source,
        })
    }
}

async fn read(kind: MaterialKind, path: &Path) -> Result<Vec<u8>, TlsError> {
    tokio::fs::read(path).await.map_err(|source| TlsError::Read {
        kind,
        path: path.to_path_buf(),
        source,
    })
}

fn ensure_certificate(kind: MaterialKind, path: &Path, pem: &[u8]) -> Result<(), TlsError> {
    let mut reader = pem;
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TlsError::Pem {
            kind,
            path: path.to_path_buf(),
            source,
        })?;
    if certs.is_empty() {
        return Err(TlsError::NoCertificate {
            kind,
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

fn ensure_private_key(path: &Path, pem: &[u8]) -> Result<(), TlsError> {
    let mut reader = pem;
    match rustls_pemfile::private_key(&mut reader) {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(TlsError::NoPrivateKey {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(TlsError::Pem {
            kind: MaterialKind::ClientPrivateKey,
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    struct Fixture {
        _dir: tempfile::TempDir,
        paths: TlsPaths,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let rcgen::CertifiedKey { cert, signing_key } =
            rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        let paths = TlsPaths {
            client_certificate: dir.path().join("client.crt"),
            client_private_key: dir.path().join("client.key"),
            ca_certificate: dir.path().join("ca.crt"),
        };
        fs::write(&paths.client_certificate, cert.pem()).unwrap();
        fs::write(&paths.client_private_key, signing_key.serialize_pem()).unwrap();
        fs::write(&paths.ca_certificate, cert.pem()).unwrap();
        Fixture { _dir: dir, paths }
    }

    #[tokio::test]
    async fn loads_generated_material() {
        let fixture = fixture();
        let material = TlsMaterial::load(&fixture.paths).await.unwrap();
        assert!(material.identity().is_ok());
        assert!(material.ca_certificate().is_ok());
    }

    #[tokio::test]
    async fn missing_file_names_the_material() {
        let mut fixture = fixture();
        fixture.paths.ca_certificate = fixture.paths.ca_certificate.with_file_name("absent.crt");
        let err = TlsMaterial::load(&fixture.paths).await.err().unwrap();
        assert!(matches!(err, TlsError::Read { kind: MaterialKind::CaCertificate, .. }));
    }

    #[tokio::test]
    async fn key_file_without_key_is_rejected() {
        let fixture = fixture();
        fs::write(&fixture.paths.client_private_key, "not a key").unwrap();
        let err = TlsMaterial::load(&fixture.paths).await.err().unwrap();
        assert!(matches!(err, TlsError::NoPrivateKey { .. }));
    }

    #[tokio::test]
    async fn certificate_file_without_certificate_is_rejected() {
        let fixture = fixture();
        let key = fs::read(&fixture.paths.client_private_key).unwrap();
        fs::write(&fixture.paths.client_certificate, key).unwrap();
        let err = TlsMaterial::load(&fixture.paths).await.err().unwrap();
        assert!(matches!(
            err,
            TlsError::NoCertificate { kind: MaterialKind::ClientCertificate, .. }
        ));
    }
}
