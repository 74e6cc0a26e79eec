//! Password gate in front of the admin commands.
//!
//! This is a shared-password check, not authentication: there are no users,
//! sessions expire with the process and the password sits in configuration.

use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoginError {
    #[error("Geçersiz şifre")]
    InvalidPassword,
}

#[derive(Debug, Clone)]
pub struct AdminGate {
    password: String,
}

/// Proof that the admin password was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminSession(());

impl AdminGate {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }

    pub fn login(&self, attempt: &str) -> Result<AdminSession, LoginError> {
        if attempt == self.password {
            Ok(AdminSession(()))
        } else {
            warn!("admin login rejected");
            Err(LoginError::InvalidPassword)
        }
    }
}
