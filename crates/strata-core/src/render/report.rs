use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// What happened to one output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteAction {
    Created,
    Updated,
    Skipping,
}

impl fmt::Display for WriteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WriteAction::Created => "Created",
            WriteAction::Updated => "Updated",
            WriteAction::Skipping => "Skipping",
        };
        f.pad(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    /// Relative to the target directory.
    pub path: PathBuf,
    pub action: WriteAction,
}

/// Every output file of one run, in the order it was processed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub files: Vec<FileReport>,
}

impl RunReport {
    pub fn push(&mut self, path: impl Into<PathBuf>, action: WriteAction) {
        self.files.push(FileReport {
            path: path.into(),
            action,
        });
    }

    pub fn count(&self, action: WriteAction) -> usize {
        self.files.iter().filter(|f| f.action == action).count()
    }

    /// Action recorded for `path`, if it was processed.
    pub fn action_for(&self, path: impl Into<PathBuf>) -> Option<WriteAction> {
        let path = path.into();
        self.files
            .iter()
            .find(|f| f.path == path)
            .map(|f| f.action)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} skipped",
            self.count(WriteAction::Created),
            self.count(WriteAction::Updated),
            self.count(WriteAction::Skipping),
        )
    }
}
