use std::io;
use std::path::Path;
use std::path::PathBuf;

use crate::state::StudyState;

/// Fixed storage key. The suffix is the schema version; there is no
/// migration machinery beyond bumping it.
pub const STATE_FILE: &str = "obesity-intervention-state-v2-1.json";

/// Whole-record JSON persistence for the study state: read once at
/// startup, overwritten in full after every mutation.
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn open(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            path: dir.join(STATE_FILE),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when no state has ever been saved. A file that fails to
    /// parse is an error; the caller decides whether to start fresh.
    pub fn load(&self) -> io::Result<Option<StudyState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&self.path)?;
        let state = serde_json::from_slice::<StudyState>(&bytes).map_err(|err| {
            log::warn!("state file at {} does not parse: {err}", self.path.display());
            io::Error::other(format!("parse state: {err}"))
        })?;
        Ok(Some(state))
    }

    pub fn save(&self, state: &StudyState) -> io::Result<()> {
        let encoded = serde_json::to_vec_pretty(state)
            .map_err(|err| io::Error::other(format!("serialize state: {err}")))?;
        std::fs::write(&self.path, encoded)
    }

    /// Full wipe; absence is not an error.
    pub fn wipe(&self) -> io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}
