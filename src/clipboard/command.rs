//! Subprocess clipboard adapter — `xclip` / `pbcopy` wrappers.
//!
//! Reads by capturing the tool's stdout, writes by piping to its stdin.
//! Synchronous (`std::process::Command`): clipboard tools complete in
//! milliseconds and the callers run at most one operation at a time.

use std::io::Write;
use std::process::{Command, Stdio};

use super::{ClipboardError, ClipboardPort};

/// Clipboard port backed by a pair of external commands.
///
/// `read` must print the clipboard to stdout; `write` must replace the
/// clipboard with its stdin. Each command is `[program, args...]`.
pub struct CommandClipboard {
    read: Vec<String>,
    write: Vec<String>,
}

impl CommandClipboard {
    /// X11 clipboard via `xclip -selection clipboard`.
    pub fn xclip() -> Self {
        Self::new(
            &["xclip", "-selection", "clipboard", "-o"],
            &["xclip", "-selection", "clipboard"],
        )
    }

    /// macOS pasteboard via `pbpaste` / `pbcopy`.
    #[allow(dead_code)] // selected by clipboard::system() on macOS
    pub fn pasteboard() -> Self {
        Self::new(&["pbpaste"], &["pbcopy"])
    }

    pub fn new(read: &[&str], write: &[&str]) -> Self {
        Self {
            read: read.iter().map(|s| s.to_string()).collect(),
            write: write.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ClipboardPort for CommandClipboard {
    fn read(&self) -> Result<String, ClipboardError> {
        let tool = &self.read[0];
        let output = Command::new(tool)
            .args(&self.read[1..])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| ClipboardError::Spawn {
                tool: tool.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(ClipboardError::ToolFailed {
                tool: tool.clone(),
                status: output.status,
            });
        }

        String::from_utf8(output.stdout).map_err(|_| ClipboardError::NotText)
    }

    fn write(&self, text: &str) -> Result<(), ClipboardError> {
        let tool = &self.write[0];
        let mut child = Command::new(tool)
            .args(&self.write[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ClipboardError::Spawn {
                tool: tool.clone(),
                source: e,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .map_err(|e| ClipboardError::Pipe {
                    tool: tool.clone(),
                    source: e,
                })?;
            // Drop stdin to close the pipe so the tool can finish.
        }

        let status = child.wait().map_err(|e| ClipboardError::Pipe {
            tool: tool.clone(),
            source: e,
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(ClipboardError::ToolFailed {
                tool: tool.clone(),
                status,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Round a write through a file-backed fake clipboard and read it
    /// back, exercising both subprocess paths.
    #[test]
    fn write_then_read_via_shell() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.txt");
        let path = path.to_str().unwrap();

        let store = format!("cat > {path}");
        let clip = CommandClipboard::new(&["cat", path], &["sh", "-c", store.as_str()]);

        clip.write("line one\nline two").unwrap();
        assert_eq!(clip.read().unwrap(), "line one\nline two");
    }

    #[test]
    fn missing_tool_is_spawn_error() {
        let clip = CommandClipboard::new(&["clipsyncd-no-such-tool"], &["clipsyncd-no-such-tool"]);
        assert!(matches!(clip.read(), Err(ClipboardError::Spawn { .. })));
    }

    #[test]
    fn failing_tool_is_tool_error() {
        let clip = CommandClipboard::new(&["false"], &["false"]);
        assert!(matches!(
            clip.read(),
            Err(ClipboardError::ToolFailed { .. })
        ));
    }
}
