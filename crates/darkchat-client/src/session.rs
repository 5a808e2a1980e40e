//! Session store
//!
//! Holds the signed-in [`Identity`] for the lifetime of the process and
//! mirrors it to disk so a restart resumes the session.
//!
//! # Invariants
//!
//! - At most one identity is held at a time. Storing replaces, clearing
//!   removes both the in-memory copy and the file.
//! - The file is replaced atomically (write to a sibling temp file, then
//!   rename), so a crash never leaves a half-written identity behind.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use darkchat_proto::Identity;

use crate::SessionError;

/// Process-wide identity holder.
#[derive(Debug)]
pub struct SessionStore {
    /// Backing file. `None` for in-memory stores.
    path: Option<PathBuf>,
    /// Current identity. `None` when signed out.
    identity: Option<Identity>,
}

impl SessionStore {
    /// Open the store at `path`, loading any persisted identity.
    ///
    /// A missing file means signed out. A corrupt file is discarded with a
    /// warning rather than blocking startup.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let path = path.into();
        let identity = match load(&path) {
            Ok(identity) => identity,
            Err(SessionError::Decode(reason)) => {
                tracing::warn!(path = %path.display(), %reason, "discarding corrupt session file");
                remove_if_exists(&path)?;
                None
            },
            Err(e) => return Err(e),
        };

        tracing::debug!(path = %path.display(), signed_in = identity.is_some(), "session loaded");
        Ok(Self { path: Some(path), identity })
    }

    /// Store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self { path: None, identity: None }
    }

    /// Current identity. `None` if signed out.
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Whether an identity is held.
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Replace the current identity and persist it.
    pub fn store(&mut self, identity: Identity) -> Result<(), SessionError> {
        if let Some(path) = &self.path {
            save(path, &identity)?;
        }
        tracing::info!(user_id = %identity.user_id, "session stored");
        self.identity = Some(identity);
        Ok(())
    }

    /// Forget the identity and delete the persisted copy.
    pub fn clear(&mut self) -> Result<(), SessionError> {
        if let Some(path) = &self.path {
            remove_if_exists(path)?;
        }
        if self.identity.take().is_some() {
            tracing::info!("session cleared");
        }
        Ok(())
    }
}

fn load(path: &Path) -> Result<Option<Identity>, SessionError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    ciborium::from_reader(bytes.as_slice())
        .map(Some)
        .map_err(|e| SessionError::Decode(e.to_string()))
}

fn save(path: &Path, identity: &Identity) -> Result<(), SessionError> {
    let mut bytes = Vec::new();
    ciborium::into_writer(identity, &mut bytes).map_err(|e| SessionError::Encode(e.to_string()))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, &bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<(), SessionError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity { user_id: "u1".into(), auth_token: "tok".into(), email: "al@example.com".into() }
    }

    #[test]
    fn in_memory_store_and_clear() {
        let mut store = SessionStore::in_memory();
        assert!(!store.is_authenticated());

        store.store(identity()).expect("store");
        assert_eq!(store.identity(), Some(&identity()));

        store.clear().expect("clear");
        assert_eq!(store.identity(), None);
    }

    #[test]
    fn clear_when_signed_out_is_noop() {
        let mut store = SessionStore::in_memory();
        assert!(store.clear().is_ok());
    }
}
