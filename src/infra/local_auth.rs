//! File-backed account registry standing in for a hosted auth provider.
//!
//! Passwords are stored as salted SHA-256 digests in `credentials.toml`; the
//! signed-in user is kept in `session.toml` until sign-out.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
    domain::session::Session,
    usecases::contracts::{AuthError, AuthService},
};

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialsFile {
    #[serde(default)]
    accounts: Vec<Account>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Account {
    user_id: String,
    email: String,
    salt: String,
    password_sha256: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    user_id: String,
    email: String,
}

#[derive(Debug, Clone)]
pub struct LocalAuth {
    credentials_path: PathBuf,
    session_path: PathBuf,
}

impl LocalAuth {
    pub fn new(credentials_path: PathBuf, session_path: PathBuf) -> Self {
        Self {
            credentials_path,
            session_path,
        }
    }

    fn load_credentials(&self) -> Result<CredentialsFile, AuthError> {
        match read_optional(&self.credentials_path)? {
            Some(raw) => toml::from_str(&raw).map_err(|error| {
                AuthError::Unavailable(format!(
                    "parse {}: {error}",
                    self.credentials_path.display()
                ))
            }),
            None => Ok(CredentialsFile::default()),
        }
    }

    fn save_credentials(&self, credentials: &CredentialsFile) -> Result<(), AuthError> {
        let raw = toml::to_string(credentials)
            .map_err(|error| AuthError::Unavailable(error.to_string()))?;
        write_file(&self.credentials_path, &raw)
    }

    fn remember_session(&self, account: &Account) -> Result<Session, AuthError> {
        let session_file = SessionFile {
            user_id: account.user_id.clone(),
            email: account.email.clone(),
        };
        let raw = toml::to_string(&session_file)
            .map_err(|error| AuthError::Unavailable(error.to_string()))?;
        write_file(&self.session_path, &raw)?;

        Ok(Session::new(&account.user_id, &account.email))
    }
}

impl AuthService for LocalAuth {
    fn current_user(&self) -> Result<Option<Session>, AuthError> {
        let Some(raw) = read_optional(&self.session_path)? else {
            return Ok(None);
        };
        let session: SessionFile = toml::from_str(&raw).map_err(|error| {
            AuthError::Unavailable(format!("parse {}: {error}", self.session_path.display()))
        })?;

        Ok(Some(Session::new(session.user_id, session.email)))
    }

    fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let mut credentials = self.load_credentials()?;
        if credentials
            .accounts
            .iter()
            .any(|account| account.email.eq_ignore_ascii_case(email))
        {
            return Err(AuthError::EmailTaken);
        }

        let salt = Uuid::new_v4().simple().to_string();
        let account = Account {
            user_id: Uuid::new_v4().simple().to_string(),
            email: email.to_owned(),
            password_sha256: password_digest(&salt, password),
            salt,
        };
        credentials.accounts.push(account.clone());
        self.save_credentials(&credentials)?;

        tracing::debug!(user_id = %account.user_id, "local account registered");
        self.remember_session(&account)
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let credentials = self.load_credentials()?;
        let account = credentials
            .accounts
            .iter()
            .find(|account| account.email.eq_ignore_ascii_case(email))
            .filter(|account| password_digest(&account.salt, password) == account.password_sha256)
            .ok_or(AuthError::InvalidCredentials)?;

        self.remember_session(account)
    }

    fn sign_out(&self) -> Result<(), AuthError> {
        match fs::remove_file(&self.session_path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(AuthError::Unavailable(format!(
                "remove {}: {error}",
                self.session_path.display()
            ))),
        }
    }
}

fn password_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn read_optional(path: &Path) -> Result<Option<String>, AuthError> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(Some(raw)),
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
        Err(error) => Err(AuthError::Unavailable(format!(
            "read {}: {error}",
            path.display()
        ))),
    }
}

fn write_file(path: &Path, raw: &str) -> Result<(), AuthError> {
    fs::write(path, raw)
        .map_err(|error| AuthError::Unavailable(format!("write {}: {error}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(dir: &tempfile::TempDir) -> LocalAuth {
        LocalAuth::new(
            dir.path().join("credentials.toml"),
            dir.path().join("session.toml"),
        )
    }

    #[test]
    fn sign_up_persists_session_and_rejects_duplicate_email() {
        let dir = tempfile::tempdir().expect("temp dir");
        let auth = auth(&dir);

        let session = auth.sign_up("ann@example.com", "pw").expect("sign up");

        assert_eq!(auth.current_user(), Ok(Some(session)));
        assert_eq!(
            auth.sign_up("ANN@example.com", "other"),
            Err(AuthError::EmailTaken)
        );
    }

    #[test]
    fn password_is_not_stored_in_clear_text() {
        let dir = tempfile::tempdir().expect("temp dir");
        let auth = auth(&dir);
        auth.sign_up("ann@example.com", "hunter2").expect("sign up");

        let raw = fs::read_to_string(dir.path().join("credentials.toml")).expect("credentials");

        assert!(!raw.contains("hunter2"));
        assert!(raw.contains("password_sha256"));
    }

    #[test]
    fn sign_in_checks_password_and_sign_out_clears_session() {
        let dir = tempfile::tempdir().expect("temp dir");
        let auth = auth(&dir);
        let created = auth.sign_up("ann@example.com", "pw").expect("sign up");
        auth.sign_out().expect("sign out");
        assert_eq!(auth.current_user(), Ok(None));

        assert_eq!(
            auth.sign_in("ann@example.com", "wrong"),
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(
            auth.sign_in("nobody@example.com", "pw"),
            Err(AuthError::InvalidCredentials)
        );

        let session = auth.sign_in("ann@example.com", "pw").expect("sign in");
        assert_eq!(session.user_id, created.user_id);
        auth.sign_out().expect("sign out");
        auth.sign_out().expect("sign out is idempotent");
    }
}
