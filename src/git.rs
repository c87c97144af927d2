//! Thin wrapper over the `git` command line for publishing exported files.

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("not a git repository: {0}")]
    NotARepository(String),
    #[error("failed to run git: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("git {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },
}

pub type Result<T> = std::result::Result<T, GitError>;

/// What `publish` ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    NothingToDo,
    /// Committed locally but the push failed or there is no remote
    Committed,
    Pushed,
}

/// A local git working tree
#[derive(Debug, Clone)]
pub struct GitRepo {
    dir: PathBuf,
}

impl GitRepo {
    /// Open a working tree; fails unless `dir/.git` exists
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !is_repository(&dir) {
            return Err(GitError::NotARepository(dir.display().to_string()));
        }
        Ok(GitRepo { dir })
    }

    /// Run git with the given arguments, returning stdout
    fn run(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.dir)
            .output()?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        debug!(args = ?args, %stdout, %stderr, status = ?output.status.code(), "git");

        if output.status.success() {
            Ok(stdout)
        } else {
            Err(GitError::CommandFailed {
                command: args.join(" "),
                stderr: stderr.trim().to_string(),
            })
        }
    }

    /// `git status --porcelain`, empty when the tree is clean
    pub fn status(&self) -> Result<String> {
        Ok(self.run(&["status", "--porcelain"])?.trim().to_string())
    }

    pub fn pull(&self) -> Result<()> {
        self.run(&["pull"]).map(|_| ())
    }

    /// Stage everything (including new files) and commit
    pub fn commit_all(&self, message: &str) -> Result<()> {
        self.run(&["add", "-A"])?;
        self.run(&["commit", "-m", message]).map(|_| ())
    }

    /// Push to the upstream, or to `remote` when given
    pub fn push(&self, remote: Option<&str>) -> Result<()> {
        match remote {
            Some(remote) => self.run(&["push", remote, "HEAD"]).map(|_| ()),
            None => self.run(&["push"]).map(|_| ()),
        }
    }

    /// One line per commit not yet on the upstream branch
    pub fn unpushed_commits(&self) -> Result<String> {
        Ok(self
            .run(&["log", "@{u}..HEAD", "--oneline"])?
            .trim()
            .to_string())
    }

    /// Commit pending changes and push whatever the upstream lacks
    pub fn publish(&self, message: &str, remote: Option<&str>) -> Result<PublishOutcome> {
        let committed = if self.status()?.is_empty() {
            false
        } else {
            self.commit_all(message)?;
            true
        };

        // Without an upstream, `log @{u}..HEAD` fails: let push decide
        let needs_push = committed || self.unpushed_commits().map(|c| !c.is_empty()).unwrap_or(true);
        if !needs_push {
            return Ok(PublishOutcome::NothingToDo);
        }

        match self.push(remote) {
            Ok(()) => Ok(PublishOutcome::Pushed),
            Err(e) if committed => {
                debug!(error = %e, "push failed after commit");
                Ok(PublishOutcome::Committed)
            }
            Err(e) => Err(e),
        }
    }
}

/// Whether `dir` is the root of a git working tree
pub fn is_repository(dir: &Path) -> bool {
    dir.join(".git").exists()
}
