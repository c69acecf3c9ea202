use anyhow::{Result, anyhow};
use log::{debug, warn};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher, recommended_watcher};
use std::{fs, path::Path, sync::mpsc::Sender};

use super::pipeline::FollowEvent;

/// Watch a profile file and send [`FollowEvent::ProfileChanged`] on edits.
///
/// The parent directory is watched so editors that replace the file on save
/// are still seen. Dropping the returned watcher stops it.
pub fn watch_profile(path: &Path, tx: Sender<FollowEvent>) -> Result<RecommendedWatcher> {
    let file = fs::canonicalize(path)?;
    let dir = file
        .parent()
        .ok_or_else(|| anyhow!("{} has no parent directory", file.display()))?
        .to_path_buf();

    let mut watcher = recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(ev) => {
            let relevant = matches!(ev.kind, EventKind::Modify(_) | EventKind::Create(_))
                && ev.paths.iter().any(|p| p == &file);
            if relevant {
                debug!("profile changed on disk: {:?}", ev.kind);
                let _ = tx.send(FollowEvent::ProfileChanged);
            }
        }
        Err(e) => warn!("profile watch error: {e}"),
    })?;
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}
