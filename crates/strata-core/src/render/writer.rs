//! Writes rendered output into the target directory.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{Result, StrataError};

/// Post-processes the rendered bytes of one output file.
pub trait Formatter: fmt::Debug {
    fn format(&self, path: &Path, contents: &[u8]) -> io::Result<Vec<u8>>;
}

/// Runs an external program with the file content on stdin and takes its stdout.
#[derive(Debug, Clone)]
pub struct CommandFormatter {
    argv: Vec<String>,
}

impl CommandFormatter {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }
}

impl Formatter for CommandFormatter {
    fn format(&self, _path: &Path, contents: &[u8]) -> io::Result<Vec<u8>> {
        let (program, args) = self
            .argv
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty formatter command"))?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::other("formatter stdin unavailable"))?;
        let input = contents.to_vec();
        let feeder = std::thread::spawn(move || stdin.write_all(&input));

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(io::Error::other(format!(
                "{program} exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        feeder
            .join()
            .map_err(|_| io::Error::other("formatter input thread panicked"))??;

        Ok(output.stdout)
    }
}

/// Writes files, applying the extension-specific handling:
/// `.sh` outputs are made executable and extensions with a registered
/// formatter are piped through it first.
#[derive(Debug, Default)]
pub struct OutputWriter {
    formatters: BTreeMap<String, Box<dyn Formatter>>,
}

impl OutputWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// One [`CommandFormatter`] per extension, e.g. `go -> ["goimports"]`.
    pub fn from_commands(commands: &BTreeMap<String, Vec<String>>) -> Self {
        let mut writer = Self::new();
        for (extension, argv) in commands {
            writer.register(extension, CommandFormatter::new(argv.clone()));
        }
        writer
    }

    pub fn register(&mut self, extension: &str, formatter: impl Formatter + 'static) {
        self.formatters
            .insert(extension.trim_start_matches('.').to_string(), Box::new(formatter));
    }

    /// Write `contents` to `path`, creating parent directories as needed.
    pub fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let failed = |e: io::Error| StrataError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(failed)?;
        }

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let formatted = match self.formatters.get(extension) {
            Some(formatter) => match formatter.format(path, contents) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "formatter failed; writing unformatted output");
                    None
                }
            },
            None => None,
        };

        std::fs::write(path, formatted.as_deref().unwrap_or(contents)).map_err(failed)?;

        if extension == "sh" {
            make_executable(path).map_err(failed)?;
        }

        Ok(())
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}
