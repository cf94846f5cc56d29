//! Change source — local clipboard change detection.
//!
//! Wraps the external `clipnotify` tool, which blocks until the
//! clipboard changes and then exits. Run in a loop, each successful
//! exit becomes one tick on the channel.
//!
//! Availability is probed at startup with a `$PATH` lookup. A missing
//! tool (or an unsupported OS) disables the send side for the process
//! lifetime; the daemon keeps running receive-only, with restoration
//! disabled as well.
//!
//! Runtime failures are retried with a fixed delay — on Linux the tool
//! keeps failing until the GUI session is up after boot, so transient
//! failure is expected. A long run of consecutive failures escalates to
//! a fatal error instead of spinning forever.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One detected local clipboard change.
#[derive(Debug)]
pub struct ChangeTick;

/// Watcher failure after retries were exhausted.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("clipboard watcher `{tool}` failed {failures} consecutive times")]
    WatcherGaveUp { tool: String, failures: u32 },
}

/// Retry policy for the watcher loop.
#[derive(Debug, Clone)]
pub struct WatchPolicy {
    /// Delay between retries after a failed watcher run.
    pub retry_delay: Duration,
    /// Consecutive failures after which the watcher gives up (fatal).
    pub max_consecutive_failures: u32,
}

impl Default for WatchPolicy {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_secs(2),
            // Tolerates roughly 45s of post-boot GUI startup lag.
            max_consecutive_failures: 22,
        }
    }
}

/// A running change source: tick channel plus the watcher task handle.
///
/// The handle resolves to `Err` only when the retry budget is
/// exhausted; the coordinator escalates that to a fatal error.
pub struct ChangeSource {
    pub ticks: mpsc::UnboundedReceiver<ChangeTick>,
    pub handle: JoinHandle<Result<(), SourceError>>,
}

/// Start the platform change watcher, if one is available.
///
/// Returns `None` (after a one-line notice) when the platform has no
/// watcher or the tool is not installed.
pub fn spawn() -> Option<ChangeSource> {
    let command = watch_command()?;

    if find_in_path(&command[0]).is_none() {
        tracing::warn!(tool = %command[0], "clipboard watcher not found in PATH");
        eprintln!(
            "`{}` was not found; local copies will not be synced (receive-only mode)",
            command[0]
        );
        return None;
    }

    Some(spawn_with_command(command, WatchPolicy::default()))
}

/// The blocking watch command for this platform, or `None` when local
/// change detection is unsupported.
fn watch_command() -> Option<Vec<String>> {
    #[cfg(target_os = "linux")]
    {
        Some(vec![
            "clipnotify".into(),
            "-s".into(),
            "clipboard".into(),
        ])
    }
    #[cfg(target_os = "macos")]
    {
        Some(vec!["clipnotify".into()])
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        eprintln!("local copy detection is not supported on this OS (receive-only mode)");
        None
    }
}

fn spawn_with_command(command: Vec<String>, policy: WatchPolicy) -> ChangeSource {
    let (tick_tx, ticks) = mpsc::unbounded_channel();
    let handle = tokio::spawn(watch_loop(command, policy, tick_tx));
    ChangeSource { ticks, handle }
}

async fn watch_loop(
    command: Vec<String>,
    policy: WatchPolicy,
    tick_tx: mpsc::UnboundedSender<ChangeTick>,
) -> Result<(), SourceError> {
    let mut failures = 0u32;

    loop {
        let ran_ok = match tokio::process::Command::new(&command[0])
            .args(&command[1..])
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .await
        {
            Ok(status) => status.success(),
            Err(e) => {
                tracing::warn!(tool = %command[0], error = %e, "watcher spawn failed");
                false
            }
        };

        if !ran_ok {
            failures += 1;
            if failures >= policy.max_consecutive_failures {
                return Err(SourceError::WatcherGaveUp {
                    tool: command[0].clone(),
                    failures,
                });
            }
            tokio::time::sleep(policy.retry_delay).await;
            continue;
        }
        failures = 0;

        if tick_tx.send(ChangeTick).is_err() {
            // Send side is gone; nothing left to notify.
            return Ok(());
        }
    }
}

/// Look for an executable in `$PATH`.
fn find_in_path(program: &str) -> Option<PathBuf> {
    if program.contains('/') {
        let p = Path::new(program);
        return p.is_file().then(|| p.to_path_buf());
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_policy(max: u32) -> WatchPolicy {
        WatchPolicy {
            retry_delay: Duration::from_millis(1),
            max_consecutive_failures: max,
        }
    }

    #[tokio::test]
    async fn successful_runs_produce_ticks() {
        let mut source = spawn_with_command(vec!["true".into()], quick_policy(3));
        assert!(source.ticks.recv().await.is_some());
        assert!(source.ticks.recv().await.is_some());
    }

    #[tokio::test]
    async fn watcher_gives_up_after_consecutive_failures() {
        let source = spawn_with_command(vec!["false".into()], quick_policy(3));
        let result = source.handle.await.unwrap();
        assert!(matches!(
            result,
            Err(SourceError::WatcherGaveUp { failures: 3, .. })
        ));
    }

    #[tokio::test]
    async fn loop_ends_when_ticks_are_dropped() {
        let source = spawn_with_command(vec!["true".into()], quick_policy(3));
        drop(source.ticks);
        assert!(source.handle.await.unwrap().is_ok());
    }

    #[test]
    fn find_in_path_locates_sh() {
        assert!(find_in_path("sh").is_some());
        assert!(find_in_path("clipsyncd-no-such-tool").is_none());
    }
}
