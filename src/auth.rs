//! Shared admin password guarding vehicle management and log viewing.
//!
//! Only a SHA-256 hex digest of the password is kept, in a local file.

use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::constants::API_NAME;

pub const MIN_PASSWORD_LEN: usize = 4;

#[derive(Debug, Error)]
pub enum AdminAuthError {
    #[error("Password must be at least 4 characters")]
    PasswordTooShort,

    #[error("Current password is wrong")]
    WrongPassword,

    #[error("Admin password storage error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct AdminGate {
    path: PathBuf,
}

impl AdminGate {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn has_password(&self) -> bool {
        matches!(self.stored_hash(), Ok(Some(_)))
    }

    pub fn set_password(&self, password: &str) -> Result<(), AdminAuthError> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AdminAuthError::PasswordTooShort);
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, sha256_hex(password))?;
        tracing::info!("{} Admin password updated", API_NAME);
        Ok(())
    }

    /// False when no password has been set or the store cannot be read.
    pub fn verify(&self, password: &str) -> bool {
        match self.stored_hash() {
            Ok(Some(stored)) => stored == sha256_hex(password),
            Ok(None) => false,
            Err(e) => {
                tracing::error!("{} Failed to read admin password: {}", API_NAME, e);
                false
            }
        }
    }

    /// First-time setup needs no current password; afterwards it must match.
    pub fn change_password(
        &self,
        current: Option<&str>,
        new_password: &str,
    ) -> Result<(), AdminAuthError> {
        if self.stored_hash()?.is_some() && !current.map_or(false, |c| self.verify(c)) {
            tracing::warn!("{} Rejected admin password change: wrong current password", API_NAME);
            return Err(AdminAuthError::WrongPassword);
        }
        self.set_password(new_password)
    }

    fn stored_hash(&self) -> Result<Option<String>, AdminAuthError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let hash = contents.trim();
                Ok((!hash.is_empty()).then(|| hash.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}
