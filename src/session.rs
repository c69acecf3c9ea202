pub mod pipeline;
pub mod watch;

use anyhow::Result;
use std::path::PathBuf;

use crate::config::{self, Profile, ProfileStore};

/// Where a session takes its profile from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileSource {
    Active,
    Named(String),
    File(PathBuf),
}

impl ProfileSource {
    /// Load the profile, returning the file it came from for reload watching.
    pub fn load(&self) -> Result<(Profile, PathBuf)> {
        match self {
            ProfileSource::File(path) => Ok((config::load_path(path)?, path.clone())),
            ProfileSource::Active => {
                let store = ProfileStore::load_or_install_default()?;
                let path = store.profile_path(&store.active_name);
                Ok((store.profile, path))
            }
            ProfileSource::Named(name) => {
                let store = ProfileStore::load_or_install_default()?;
                let profile = store.load_profile(name)?;
                Ok((profile, store.profile_path(name)))
            }
        }
    }
}
