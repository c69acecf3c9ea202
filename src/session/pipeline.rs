use anyhow::{Context, Result};
use log::{error, info, warn};
use signal_hook::{
    consts::{SIGINT, SIGTERM},
    iterator::Signals,
};
use std::{
    fs::File,
    io::{self, BufRead, BufReader, Write},
    path::{Path, PathBuf},
    sync::mpsc::{self, Sender},
    thread,
};

use super::watch;
use crate::config::{self, Profile};
use crate::controls::{Controls, TickRecord};
use crate::frame::{self, Frame};
use crate::target::{SceneTarget, Snapshot};

/// Run every frame of `reader` through `controls`.
///
/// With `trace`, one JSON line per tick is written to `out`. Returns the
/// number of frames processed. Malformed lines abort the run.
pub fn run_frames<R: BufRead, W: Write>(
    reader: R,
    controls: &mut Controls<SceneTarget>,
    trace: bool,
    out: &mut W,
) -> Result<usize> {
    let mut ticks = 0;
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let Some(frame) = frame::parse_line(i + 1, &line)? else {
            continue;
        };
        let report = controls.update(&frame);
        if trace {
            let rec = TickRecord::new(ticks, &report, controls.snapshot());
            writeln!(out, "{}", serde_json::to_string(&rec)?)?;
        }
        ticks += 1;
    }
    Ok(ticks)
}

/// Replay a JSON-lines recording and return the final state.
pub fn replay<W: Write>(path: &Path, profile: &Profile, trace: bool, out: &mut W) -> Result<Snapshot> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut controls = Controls::from_profile(profile);
    info!(
        "replaying {} with profile '{}' (step {})",
        path.display(),
        profile.name,
        controls.step()
    );
    let ticks = run_frames(BufReader::new(file), &mut controls, trace, out)
        .with_context(|| format!("replay of {} failed", path.display()))?;
    info!("replayed {ticks} frames");
    Ok(controls.snapshot())
}

pub enum FollowEvent {
    Frame(usize, Frame),
    ProfileChanged,
    Stop,
}

fn spawn_stdin_reader(tx: Sender<FollowEvent>) {
    thread::spawn(move || {
        let stdin = io::stdin().lock();
        for (i, line) in stdin.lines().enumerate() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    error!("stdin read failed: {e}");
                    break;
                }
            };
            match frame::parse_line(i + 1, &line) {
                Ok(Some(f)) => {
                    if tx.send(FollowEvent::Frame(i + 1, f)).is_err() {
                        return;
                    }
                }
                Ok(None) => {}
                // a live stream keeps going past a bad record
                Err(e) => warn!("skipping frame: {e}"),
            }
        }
        let _ = tx.send(FollowEvent::Stop);
    });
}

fn spawn_signal_listener(tx: Sender<FollowEvent>) -> Result<()> {
    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    thread::spawn(move || {
        if let Some(sig) = signals.forever().next() {
            info!("received signal {sig}, stopping");
            let _ = tx.send(FollowEvent::Stop);
        }
    });
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reload {
    Applied,
    /// Controls applied; the scene differs but the target is already built.
    SceneIgnored,
    VariantRejected,
}

/// Apply a reloaded profile's controls to a session started from `running`.
pub fn apply_reload(controls: &mut Controls<SceneTarget>, running: &Profile, reloaded: Profile) -> Reload {
    if reloaded.variant != running.variant {
        warn!(
            "reload ignored: variant changed from {:?} to {:?}; restart to switch",
            running.variant, reloaded.variant
        );
        return Reload::VariantRejected;
    }
    let outcome = if reloaded.scene != running.scene {
        warn!("reload: [scene] changes take effect on restart only");
        Reload::SceneIgnored
    } else {
        Reload::Applied
    };
    controls.reconfigure(reloaded.controls);
    info!("profile reloaded");
    outcome
}

/// Follow frames on stdin until EOF or SIGINT/SIGTERM, printing a record per tick.
///
/// Edits to `profile_path` are picked up live. A reload that changes the
/// variant is rejected since the target shape cannot change mid-session.
pub fn follow<W: Write>(profile: Profile, profile_path: PathBuf, out: &mut W) -> Result<Snapshot> {
    let (tx, rx) = mpsc::channel::<FollowEvent>();
    let mut controls = Controls::from_profile(&profile);
    info!("following stdin with profile '{}'", profile.name);

    // keep the watcher alive for the whole session
    let _watcher = match watch::watch_profile(&profile_path, tx.clone()) {
        Ok(w) => Some(w),
        Err(e) => {
            warn!("profile hot-reload disabled: {e}");
            None
        }
    };
    spawn_signal_listener(tx.clone())?;
    spawn_stdin_reader(tx);

    let mut ticks = 0;
    for evt in rx {
        match evt {
            FollowEvent::Frame(line, f) => {
                let report = controls.update(&f);
                let rec = TickRecord::new(ticks, &report, controls.snapshot());
                writeln!(out, "{}", serde_json::to_string(&rec)?)
                    .with_context(|| format!("failed to write tick for line {line}"))?;
                out.flush()?;
                ticks += 1;
            }
            FollowEvent::ProfileChanged => match config::load_path(&profile_path) {
                Ok(p) => {
                    apply_reload(&mut controls, &profile, p);
                }
                Err(e) => error!("reload failed, keeping last good profile: {e:#}"),
            },
            FollowEvent::Stop => break,
        }
    }
    info!("followed {ticks} frames");
    Ok(controls.snapshot())
}
