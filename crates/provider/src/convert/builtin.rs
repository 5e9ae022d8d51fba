//! Builtin converters
//!
//! Two widely-used secret shapes ship with the crate: username/password
//! pairs and single opaque text values. Anything else is supplied by the
//! host application through [`ConverterRegistry::register`].
//!
//! [`ConverterRegistry::register`]: super::ConverterRegistry::register

use std::fmt;

use k8s_openapi::api::core::v1::Secret;

use crate::convert::{data_string, local_id, scope_of, SecretConverter};
use crate::core::error::{ConversionError, IdRewriteError};
use crate::core::{Credential, CredentialScope};

/// Kind label value for username/password secrets
pub const USERNAME_PASSWORD_KIND: &str = "username-password";

/// Kind label value for single-value text secrets
pub const SECRET_TEXT_KIND: &str = "secret-text";

/// A username/password pair
#[derive(Clone)]
pub struct UsernamePasswordCredential {
    id: String,
    scope: CredentialScope,
    username: String,
    password: String,
}

impl UsernamePasswordCredential {
    /// Creates a credential with the given local id
    pub fn new(
        id: impl Into<String>,
        scope: CredentialScope,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            scope,
            username: username.into(),
            password: password.into(),
        }
    }

    /// The username
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The password
    pub fn password(&self) -> &str {
        &self.password
    }
}

// Manual Debug: the password never appears in logs.
impl fmt::Debug for UsernamePasswordCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UsernamePasswordCredential")
            .field("id", &self.id)
            .field("scope", &self.scope)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Credential for UsernamePasswordCredential {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) -> Result<(), IdRewriteError> {
        self.id = id;
        Ok(())
    }

    fn scope(&self) -> CredentialScope {
        self.scope
    }

    fn kind(&self) -> &str {
        USERNAME_PASSWORD_KIND
    }
}

/// A single opaque text value (API token, webhook secret, ...)
#[derive(Clone)]
pub struct SecretTextCredential {
    id: String,
    scope: CredentialScope,
    text: String,
}

impl SecretTextCredential {
    /// Creates a credential with the given local id
    pub fn new(
        id: impl Into<String>,
        scope: CredentialScope,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            scope,
            text: text.into(),
        }
    }

    /// The secret text
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Debug for SecretTextCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretTextCredential")
            .field("id", &self.id)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl Credential for SecretTextCredential {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) -> Result<(), IdRewriteError> {
        self.id = id;
        Ok(())
    }

    fn scope(&self) -> CredentialScope {
        self.scope
    }

    fn kind(&self) -> &str {
        SECRET_TEXT_KIND
    }
}

/// Converter for [`USERNAME_PASSWORD_KIND`] secrets
///
/// Expects data keys `username` and `password`.
pub struct UsernamePasswordConverter;

impl SecretConverter for UsernamePasswordConverter {
    fn kind(&self) -> &str {
        USERNAME_PASSWORD_KIND
    }

    fn convert(&self, secret: &Secret) -> Result<Box<dyn Credential>, ConversionError> {
        let id = local_id(secret)?;
        let username = data_string(secret, "username")?;
        let password = data_string(secret, "password")?;

        Ok(Box::new(UsernamePasswordCredential::new(
            id,
            scope_of(secret),
            username,
            password,
        )))
    }
}

/// Converter for [`SECRET_TEXT_KIND`] secrets
///
/// Expects data key `text`.
pub struct SecretTextConverter;

impl SecretConverter for SecretTextConverter {
    fn kind(&self) -> &str {
        SECRET_TEXT_KIND
    }

    fn convert(&self, secret: &Secret) -> Result<Box<dyn Credential>, ConversionError> {
        let id = local_id(secret)?;
        let text = data_string(secret, "text")?;

        Ok(Box::new(SecretTextCredential::new(
            id,
            scope_of(secret),
            text,
        )))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::testing::{secret_with_data, system_scoped};

    #[test]
    fn username_password_conversion() {
        let secret = secret_with_data(
            "test1",
            "db-creds",
            USERNAME_PASSWORD_KIND,
            &[("username", "admin"), ("password", "hunter2")],
        );

        let credential = UsernamePasswordConverter.convert(&secret).unwrap();
        assert_eq!(credential.id(), "db-creds");
        assert_eq!(credential.scope(), CredentialScope::Global);
    }

    #[test]
    fn missing_password_key_fails() {
        let secret = secret_with_data(
            "test1",
            "db-creds",
            USERNAME_PASSWORD_KIND,
            &[("username", "admin")],
        );

        let err = UsernamePasswordConverter.convert(&secret).unwrap_err();
        assert!(matches!(
            err,
            ConversionError::MissingDataKey { ref key, .. } if key == "password"
        ));
    }

    #[test]
    fn secret_text_conversion() {
        let secret =
            secret_with_data("test1", "api-token", SECRET_TEXT_KIND, &[("text", "t0k3n")]);

        let credential = SecretTextConverter.convert(&secret).unwrap();
        assert_eq!(credential.id(), "api-token");
        assert_eq!(credential.kind(), SECRET_TEXT_KIND);
    }

    #[test]
    fn scope_label_marks_system_credentials() {
        let secret = system_scoped(secret_with_data(
            "test1",
            "internal",
            SECRET_TEXT_KIND,
            &[("text", "t")],
        ));

        let credential = SecretTextConverter.convert(&secret).unwrap();
        assert_eq!(credential.scope(), CredentialScope::System);
    }

    #[test]
    fn debug_output_redacts_secret_material() {
        let credential =
            UsernamePasswordCredential::new("id", CredentialScope::Global, "admin", "hunter2");
        let rendered = format!("{credential:?}");
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("hunter2"));
    }
}
