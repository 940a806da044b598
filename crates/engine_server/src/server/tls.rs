//! TLS termination for the listener.

use crate::error::ServerError;
use std::path::Path;
use tokio_native_tls::TlsAcceptor;

/// Builds a TLS acceptor from a PEM certificate chain and PKCS#8 key.
pub fn load_acceptor(cert_path: &Path, key_path: &Path) -> Result<TlsAcceptor, ServerError> {
    let cert = std::fs::read(cert_path).map_err(|e| {
        ServerError::Tls(format!("Failed to read certificate {}: {}", cert_path.display(), e))
    })?;
    let key = std::fs::read(key_path).map_err(|e| {
        ServerError::Tls(format!("Failed to read private key {}: {}", key_path.display(), e))
    })?;

    let identity = native_tls::Identity::from_pkcs8(&cert, &key)
        .map_err(|e| ServerError::Tls(format!("Invalid certificate or key: {}", e)))?;
    let acceptor = native_tls::TlsAcceptor::new(identity)
        .map_err(|e| ServerError::Tls(format!("Failed to build TLS acceptor: {}", e)))?;

    Ok(TlsAcceptor::from(acceptor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_files_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_acceptor(&dir.path().join("cert.pem"), &dir.path().join("key.pem"));
        match result {
            Err(ServerError::Tls(message)) => assert!(message.contains("cert.pem")),
            Err(other) => panic!("unexpected error: {:?}", other),
            Ok(_) => panic!("acceptor built from missing files"),
        }
    }

    #[test]
    fn test_garbage_material_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cert = dir.path().join("cert.pem");
        let key = dir.path().join("key.pem");
        std::fs::write(&cert, "not a certificate").unwrap();
        std::fs::write(&key, "not a key").unwrap();

        assert!(matches!(load_acceptor(&cert, &key), Err(ServerError::Tls(_))));
    }
}
