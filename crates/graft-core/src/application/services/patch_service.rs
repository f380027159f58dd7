//! Patch Service - idempotent, per-file source edits.
//!
//! `file(path, transform)` reads `path` below the project root (an empty
//! string when it does not exist), runs `transform` over the content and
//! writes the result back. A failing transform writes nothing. When the
//! output equals the input the write is skipped, so running the same
//! transform twice leaves the file byte-identical.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ports::Filesystem};
use crate::domain::RelativePath;
use crate::error::GraftResult;
use crate::tooling::EditResult;

/// What a patch did to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchStatus {
    Created,
    Modified,
    Unchanged,
}

impl PatchStatus {
    /// Status of a file patched twice in one run.
    fn then(self, next: Self) -> Self {
        match (self, next) {
            (Self::Created, _) => Self::Created,
            (_, Self::Created) => Self::Created,
            (Self::Modified, _) | (_, Self::Modified) => Self::Modified,
            _ => Self::Unchanged,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Unchanged => "unchanged",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchRecord {
    pub path: String,
    pub status: PatchStatus,
}

pub struct PatchService {
    filesystem: Arc<dyn Filesystem>,
    root: PathBuf,
    dry_run: bool,
    /// Content produced in dry-run mode, so later patches see it.
    staged: HashMap<PathBuf, String>,
    records: Vec<PatchRecord>,
}

impl PatchService {
    pub fn new(filesystem: Arc<dyn Filesystem>, root: impl Into<PathBuf>) -> Self {
        Self {
            filesystem,
            root: root.into(),
            dry_run: false,
            staged: HashMap::new(),
            records: Vec::new(),
        }
    }

    /// Record what would change without writing.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    #[instrument(skip(self, transform), fields(root = %self.root.display()))]
    pub fn file<F>(&mut self, path: &str, transform: F) -> GraftResult<PatchStatus>
    where
        F: FnOnce(&str) -> EditResult<String>,
    {
        let target = self.resolve(path)?;
        let current = self.read_at(&target)?;
        let content = current.as_deref().unwrap_or_default();

        let output = transform(content).map_err(|source| ApplicationError::PatchFailed {
            path: path.to_owned(),
            source,
        })?;

        let status = match &current {
            None if output.is_empty() => PatchStatus::Unchanged,
            None => PatchStatus::Created,
            Some(before) if *before == output => PatchStatus::Unchanged,
            Some(_) => PatchStatus::Modified,
        };

        if status != PatchStatus::Unchanged {
            self.write(&target, output)?;
        }
        debug!(path, status = status.as_str(), dry_run = self.dry_run, "patched file");
        self.record(path, status);
        Ok(status)
    }

    /// Current content of `path`, including changes staged by a dry run.
    pub fn read(&self, path: &str) -> GraftResult<Option<String>> {
        let target = self.resolve(path)?;
        self.read_at(&target)
    }

    pub fn records(&self) -> &[PatchRecord] {
        &self.records
    }

    /// Take the records gathered so far, leaving the staged content.
    pub fn take_records(&mut self) -> Vec<PatchRecord> {
        std::mem::take(&mut self.records)
    }

    // -------------------------------------------------------------------------
    // Internal Helpers
    // -------------------------------------------------------------------------

    fn resolve(&self, path: &str) -> GraftResult<PathBuf> {
        let relative = RelativePath::try_new(path)?;
        Ok(self.root.join(relative.as_path()))
    }

    fn read_at(&self, target: &Path) -> GraftResult<Option<String>> {
        if let Some(staged) = self.staged.get(target) {
            return Ok(Some(staged.clone()));
        }
        self.filesystem.read_file(target)
    }

    fn write(&mut self, target: &Path, output: String) -> GraftResult<()> {
        if self.dry_run {
            self.staged.insert(target.to_path_buf(), output);
            return Ok(());
        }
        if let Some(parent) = target.parent() {
            self.filesystem.create_dir_all(parent)?;
        }
        self.filesystem.write_file(target, &output)
    }

    fn record(&mut self, path: &str, status: PatchStatus) {
        match self.records.iter_mut().find(|r| r.path == path) {
            Some(existing) => existing.status = existing.status.then(status),
            None => self.records.push(PatchRecord {
                path: path.to_owned(),
                status,
            }),
        }
    }
}
