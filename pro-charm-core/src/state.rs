//! Persisted unit state.
//!
//! # Storage layout
//!
//! ```text
//! <state_dir>/
//!   .ubuntu-pro-state.json      (mode 0600)
//! ```
//!
//! The Juju charm directory is the usual `state_dir`. Writes go through a
//! `.tmp` sibling and a rename, so a crash mid-write leaves the previous
//! state intact.

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::{io_err, CoreError};
use crate::types::PersistedState;

pub const STATE_FILE: &str = ".ubuntu-pro-state.json";

/// `<state_dir>/.ubuntu-pro-state.json`: pure, no I/O.
pub fn state_path_at(state_dir: &Path) -> PathBuf {
    state_dir.join(STATE_FILE)
}

/// Load the state for this unit.
///
/// Returns [`PersistedState::default`] if the file does not yet exist, which is
/// how a first run is seeded.
pub fn load_at(state_dir: &Path) -> Result<PersistedState, CoreError> {
    let path = state_path_at(state_dir);
    if !path.exists() {
        return Ok(PersistedState::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    serde_json::from_str(&contents).map_err(|source| CoreError::StateParse { path, source })
}

/// Save the state atomically, stamping `updated_at`.
pub fn save_at(state_dir: &Path, state: &mut PersistedState) -> Result<(), CoreError> {
    std::fs::create_dir_all(state_dir).map_err(|e| io_err(state_dir, e))?;
    let path = state_path_at(state_dir);

    state.updated_at = Some(Utc::now());
    let json = serde_json::to_string_pretty(state)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
    set_file_permissions(&tmp)?;
    if let Err(e) = std::fs::rename(&tmp, &path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(&path, e));
    }
    Ok(())
}

/// Handle on the state file of one unit.
///
/// The reconciler holds one of these and saves through it after every
/// successful external action.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        state_path_at(&self.dir)
    }

    pub fn load(&self) -> Result<PersistedState, CoreError> {
        load_at(&self.dir)
    }

    pub fn save(&self, state: &mut PersistedState) -> Result<(), CoreError> {
        save_at(&self.dir, state)
    }
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), CoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), CoreError> {
    Ok(())
}
