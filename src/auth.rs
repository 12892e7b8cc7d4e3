//! Authentication collaborator.
//!
//! The repository only needs to know who is calling. `SessionFile` keeps the
//! signed-in user in a small JSON file next to the board data; `FixedUser`
//! takes the identity from the command line or the environment.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Source of the caller identity.
pub trait AuthProvider {
    /// The signed-in user id, if any.
    fn current_user(&self) -> Result<Option<String>, StoreError>;

    /// Forget the signed-in user.
    fn sign_out(&self) -> Result<(), StoreError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Session {
    user_id: String,
    signed_in_at: DateTime<Utc>,
}

/// Session persisted as `session.json` in the data directory.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SessionFile { path: path.into() }
    }

    /// Record `user_id` as the signed-in user.
    pub fn sign_in(&self, user_id: &str) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
        }
        let session = Session { user_id: user_id.to_string(), signed_in_at: Utc::now() };
        let data = serde_json::to_string_pretty(&session)?;
        fs::write(&self.path, data).map_err(|e| StoreError::io(&self.path, e))
    }
}

impl AuthProvider for SessionFile {
    fn current_user(&self) -> Result<Option<String>, StoreError> {
        let buf = match fs::read_to_string(&self.path) {
            Ok(buf) => buf,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };
        let session: Session = serde_json::from_str(&buf)
            .map_err(|source| StoreError::Decode { path: self.path.clone(), source })?;
        Ok(Some(session.user_id).filter(|u| !u.is_empty()))
    }

    fn sign_out(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(StoreError::io(&self.path, e)),
            _ => Ok(()),
        }
    }
}

impl<T: AuthProvider + ?Sized> AuthProvider for Box<T> {
    fn current_user(&self) -> Result<Option<String>, StoreError> {
        (**self).current_user()
    }

    fn sign_out(&self) -> Result<(), StoreError> {
        (**self).sign_out()
    }
}

/// Identity fixed for the lifetime of the process (`--user`, `NOTALIST_USER`).
#[derive(Debug, Clone, Default)]
pub struct FixedUser(pub Option<String>);

impl AuthProvider for FixedUser {
    fn current_user(&self) -> Result<Option<String>, StoreError> {
        Ok(self.0.clone())
    }

    fn sign_out(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_in_then_out() {
        let dir = tempfile::tempdir().unwrap();
        let session = SessionFile::new(dir.path().join("session.json"));
        assert_eq!(session.current_user().unwrap(), None);

        session.sign_in("alice").unwrap();
        assert_eq!(session.current_user().unwrap().as_deref(), Some("alice"));

        session.sign_out().unwrap();
        assert_eq!(session.current_user().unwrap(), None);
        // Signing out twice is harmless.
        session.sign_out().unwrap();
    }

    #[test]
    fn fixed_user_reports_its_identity() {
        assert_eq!(FixedUser(Some("bob".into())).current_user().unwrap().as_deref(), Some("bob"));
        assert_eq!(FixedUser(None).current_user().unwrap(), None);
    }
}
