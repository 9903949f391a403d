//! Session configuration types.
//!
//! All types here are flat and owned, ready to cross an embedding
//! boundary unchanged.

use crate::error::HandleError;

/// Collaboration-server settings for an Instant-connected session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstantConfig {
    /// Document Engine server URL.
    pub server_url: String,
    /// JSON Web Token authorizing access to the document.
    pub jwt: String,
}

/// Configuration for opening a [`BridgeHandle`](crate::BridgeHandle).
///
/// A session is either local (a document on disk, optionally encrypted)
/// or connected to a collaboration server via [`InstantConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Path or URI of the document to open.
    pub document_path: String,
    /// Password for an encrypted document.
    pub password: Option<String>,
    /// Collaboration settings; `None` for a local session.
    pub instant: Option<InstantConfig>,
}

impl SessionConfig {
    /// Configuration for a local document session.
    pub fn local(document_path: &str) -> Self {
        Self {
            document_path: document_path.to_string(),
            password: None,
            instant: None,
        }
    }

    /// Configuration for a collaboration-connected session.
    pub fn instant(document_path: &str, server_url: &str, jwt: &str) -> Self {
        Self {
            document_path: document_path.to_string(),
            password: None,
            instant: Some(InstantConfig {
                server_url: server_url.to_string(),
                jwt: jwt.to_string(),
            }),
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - `document_path` is empty
    /// - an empty password is set (absent and empty are different things)
    /// - instant settings are present with an empty server URL or JWT
    pub fn validate(&self) -> Result<(), HandleError> {
        if self.document_path.is_empty() {
            return Err(HandleError::InvalidConfig(
                "document_path must not be empty".to_string(),
            ));
        }

        if self.password.as_deref() == Some("") {
            return Err(HandleError::InvalidConfig(
                "password must not be empty when set".to_string(),
            ));
        }

        if let Some(ref instant) = self.instant {
            if instant.server_url.is_empty() {
                return Err(HandleError::InvalidConfig(
                    "instant server_url must not be empty".to_string(),
                ));
            }
            if instant.jwt.is_empty() {
                return Err(HandleError::InvalidConfig(
                    "instant jwt must not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_config_constructs_and_validates() {
        let config = SessionConfig::local("/documents/report.pdf");
        assert_eq!(config.document_path, "/documents/report.pdf");
        assert!(config.password.is_none());
        assert!(config.instant.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn instant_config_constructs_and_validates() {
        let config = SessionConfig::instant(
            "doc-layer-id",
            "https://engine.example.com",
            "eyJhbGciOiJSUzI1NiJ9.payload.sig",
        );
        let instant = config.instant.as_ref().unwrap();
        assert_eq!(instant.server_url, "https://engine.example.com");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_document_path() {
        let config = SessionConfig::local("");
        let err = config.validate().unwrap_err();
        assert!(matches!(err, HandleError::InvalidConfig(_)));
        assert!(err.to_string().contains("document_path"));
    }

    #[test]
    fn validate_rejects_empty_password() {
        let mut config = SessionConfig::local("/documents/report.pdf");
        config.password = Some(String::new());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("password"));
    }

    #[test]
    fn validate_rejects_blank_instant_settings() {
        let config = SessionConfig::instant("/doc.pdf", "", "jwt");
        assert!(config.validate().unwrap_err().to_string().contains("server_url"));

        let config = SessionConfig::instant("/doc.pdf", "https://engine.example.com", "");
        assert!(config.validate().unwrap_err().to_string().contains("jwt"));
    }
}
