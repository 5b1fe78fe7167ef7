//! The local sign-in record and the flows that write it.
//!
//! The session file only caches `{id, nickname}`; the API store stays the
//! source of truth, so losing the file just means signing in again.

use std::path::{Path, PathBuf};

use parley_core::types::{RegisterUserRequest, UpdateUserRequest, User};
use parley_core::validation::{validate_nickname, ValidationError};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::ChatBackend;
use crate::error::ShellError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub nickname: String,
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when no session file exists.
    pub fn load(&self) -> Result<Option<Session>, ShellError> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(self.storage_error(source)),
        };
        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|source| ShellError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    pub fn require(&self) -> Result<Session, ShellError> {
        self.load()?.ok_or(ShellError::SignedOut)
    }

    pub fn save(&self, session: &Session) -> Result<(), ShellError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| self.storage_error(source))?;
        }
        let raw = serde_json::to_vec_pretty(session).map_err(|source| ShellError::Encode {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, raw).map_err(|source| self.storage_error(source))
    }

    /// Returns whether a session file was removed.
    pub fn clear(&self) -> Result<bool, ShellError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(self.storage_error(source)),
        }
    }

    fn storage_error(&self, source: std::io::Error) -> ShellError {
        ShellError::Storage {
            path: self.path.clone(),
            source,
        }
    }
}

/// Registers (or refreshes) the user and stores the session. Nothing is
/// saved when validation or the API call fails.
pub async fn sign_in<B>(
    backend: &B,
    store: &SessionStore,
    user_id: &str,
    nickname: &str,
) -> Result<Session, ShellError>
where
    B: ChatBackend + ?Sized,
{
    let user_id = user_id.trim();
    let nickname = nickname.trim();
    if user_id.is_empty() {
        return Err(ValidationError::MissingUserId.into());
    }
    validate_nickname(nickname)?;

    let user = backend
        .register_or_update(&RegisterUserRequest {
            user_id: user_id.to_string(),
            nickname: nickname.to_string(),
            profile_url: String::new(),
        })
        .await?;

    let session = Session {
        id: user.user_id,
        nickname: user.nickname,
    };
    store.save(&session)?;
    info!(user_id = %session.id, "signed in");
    Ok(session)
}

pub fn sign_out(store: &SessionStore) -> Result<bool, ShellError> {
    let removed = store.clear()?;
    info!(removed, "signed out");
    Ok(removed)
}

/// Updates the stored profile and then the local nickname.
pub async fn update_profile<B>(
    backend: &B,
    store: &SessionStore,
    session: &Session,
    nickname: &str,
    profile_url: &str,
) -> Result<(Session, User), ShellError>
where
    B: ChatBackend + ?Sized,
{
    let nickname = nickname.trim();
    validate_nickname(nickname)?;

    let user = backend
        .update_user(
            &session.id,
            &UpdateUserRequest {
                nickname: nickname.to_string(),
                profile_url: profile_url.to_string(),
            },
        )
        .await?;

    let updated = Session {
        id: session.id.clone(),
        nickname: user.nickname.clone(),
    };
    store.save(&updated)?;
    Ok((updated, user))
}
