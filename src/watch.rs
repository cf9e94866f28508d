//! Merged cancellation and reload signals for a running session.

use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use anyhow::{Context, Result};
use log::{debug, warn};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;

/// Why a capture pass should stop early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSignal {
    /// SIGINT or SIGTERM. End the session.
    Cancel,
    /// A profile file changed. Reload and restart the drill.
    Reload,
}

/// Keeps the signal sources alive and hands out the merged receiver.
pub struct SignalHub {
    rx: Receiver<SessionSignal>,
    _watcher: RecommendedWatcher,
}

impl SignalHub {
    pub fn receiver(&self) -> &Receiver<SessionSignal> {
        &self.rx
    }

    /// Discards signals that piled up between drill passes, so a burst of
    /// file events coalesces into a single restart.
    pub fn drain(&self) {
        while self.rx.try_recv().is_ok() {}
    }
}

/// Wires SIGINT/SIGTERM and profile file changes into one channel.
pub fn session_signals(profiles_dir: &Path) -> Result<SignalHub> {
    let (tx, rx) = mpsc::channel();

    let mut signals = Signals::new([SIGINT, SIGTERM]).context("installing signal handler")?;
    let signal_tx = tx.clone();
    thread::spawn(move || {
        for sig in signals.forever() {
            debug!("caught signal {sig}");
            if signal_tx.send(SessionSignal::Cancel).is_err() {
                break;
            }
        }
    });

    let watch_tx = tx;
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        match res {
            Ok(event) => {
                let relevant = matches!(
                    event.kind,
                    notify::EventKind::Create(_) | notify::EventKind::Modify(_)
                ) && event
                    .paths
                    .iter()
                    .any(|p| p.extension().is_some_and(|ext| ext == "toml"));
                if relevant {
                    let _ = watch_tx.send(SessionSignal::Reload);
                }
            }
            Err(e) => warn!("profile watcher error: {e}"),
        }
    })
    .context("creating profile watcher")?;
    watcher
        .watch(profiles_dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("watching {}", profiles_dir.display()))?;

    Ok(SignalHub {
        rx,
        _watcher: watcher,
    })
}
