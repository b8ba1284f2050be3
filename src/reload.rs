//! Config hot-reload.
//!
//! Watches the config file and re-applies it to a running [`FilterPlugin`].
//! A file that fails to parse, or a config the plugin rejects, is logged and
//! the running state is kept.
//!
//! # Example
//!
//! ```no_run
//! use std::{path::PathBuf, sync::Arc};
//! use tokio::sync::broadcast;
//! use filterbot::{config::Config, plugin::FilterPlugin, reload::ConfigWatcher};
//!
//! # tokio_test::block_on(async {
//! let (shutdown_tx, _) = broadcast::channel(1);
//! let plugin = Arc::new(FilterPlugin::with_standard_registry(&Config::default()).unwrap());
//!
//! let _watcher = ConfigWatcher::start(
//!     PathBuf::from("filterbot.yaml"),
//!     plugin,
//!     shutdown_tx.subscribe(),
//! );
//! # });
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::plugin::FilterPlugin;
use crate::{Error, Result};

/// Quiet period after the last change before the file is re-read.
const DEBOUNCE: Duration = Duration::from_millis(500);

/// File watcher that re-applies the config file on change.
///
/// Dropping it stops the watch and ends the background task.
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
}

impl ConfigWatcher {
    /// Start watching `config_path`.
    ///
    /// Spawns a background task that calls [`reload_once`] once a burst of
    /// changes has settled. The task ends when `shutdown_rx` fires or the
    /// watcher is dropped.
    ///
    /// # Errors
    ///
    /// Returns `Error::Internal` if the OS watch cannot be set up.
    pub fn start(
        config_path: PathBuf,
        plugin: Arc<FilterPlugin>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<Self> {
        let (event_tx, mut event_rx) = mpsc::channel(32);

        let target = config_path.clone();
        let mut watcher = notify::recommended_watcher(
            move |event: std::result::Result<Event, notify::Error>| {
                if event.is_ok_and(|e| is_config_event(&e, &target)) {
                    let _ = event_tx.try_send(());
                }
            },
        )
        .map_err(|e| Error::Internal(format!("Failed to create config watcher: {e}")))?;

        // Editors often replace the file, so watch its directory.
        let dir = config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| Error::Internal(format!("Failed to watch {}: {e}", dir.display())))?;

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    event = event_rx.recv() => {
                        if event.is_none() || !settle(&mut event_rx, &mut shutdown_rx).await {
                            break;
                        }
                        // Failures are logged there and leave the plugin as it was.
                        let _ = reload_once(&config_path, &plugin);
                    }
                }
            }
            info!("Config watcher stopped");
        });

        Ok(Self { _watcher: watcher })
    }
}

/// Wait until no change has arrived for [`DEBOUNCE`]. Returns `false` when
/// the watcher should stop instead.
async fn settle(events: &mut mpsc::Receiver<()>, shutdown: &mut broadcast::Receiver<()>) -> bool {
    loop {
        tokio::select! {
            _ = shutdown.recv() => return false,
            next = tokio::time::timeout(DEBOUNCE, events.recv()) => match next {
                Ok(Some(())) => {}
                Ok(None) => return false,
                Err(_) => return true,
            },
        }
    }
}

/// Returns `true` for create/modify events on the watched config file.
fn is_config_event(event: &Event, config_path: &Path) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event.paths.iter().any(|p| same_file(p, config_path))
}

fn same_file(event_path: &Path, config_path: &Path) -> bool {
    if event_path == config_path {
        return true;
    }
    // notify reports absolute paths; the config path may be relative.
    config_path.is_relative()
        && config_path.file_name().is_some()
        && event_path.ends_with(config_path)
}

/// Load `config_path` and apply it to `plugin`.
///
/// Failures are logged at `warn` and returned; the plugin keeps its
/// current state.
///
/// # Errors
///
/// Returns the load error, or the error [`FilterPlugin::reload`] reported.
pub fn reload_once(config_path: &Path, plugin: &FilterPlugin) -> Result<()> {
    let config = Config::load(Some(config_path)).inspect_err(|e| {
        warn!(error = %e, "Config reload: failed to parse config file, keeping current config");
    })?;

    debug!(path = %config_path.display(), "Config reload: applying");
    plugin.reload(&config).inspect_err(|e| {
        warn!(error = %e, "Config reload: rejected, keeping current config");
    })?;

    info!("Config reload: complete");
    Ok(())
}
