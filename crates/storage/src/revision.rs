// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git-based revisioning: a thin, real implementation — committing the
//! ensemble directory after a job and returning the commit id that
//! `ChangeRecord::commit_id` records.

use std::path::{Path, PathBuf};

use git2::{Repository, Signature};

#[derive(Debug, thiserror::Error)]
pub enum RevisionError {
    #[error("git operation failed: {0}")]
    Git(#[from] git2::Error),
    #[error("repository has no working directory")]
    NoWorkdir,
}

/// A place a job's changes can be committed to and recalled from.
pub trait Revisioning {
    /// Stage and commit the ensemble's working tree, returning the new
    /// commit id (used as `ChangeRecord::commit_id`).
    fn commit_all(&self, message: &str) -> Result<String, RevisionError>;

    /// The current HEAD commit id, if any commits exist yet.
    fn head(&self) -> Result<Option<String>, RevisionError>;
}

/// Commits the whole working tree of a git repository rooted at the
/// ensemble directory, authoring as the process identity.
pub struct GitRevisioning {
    repo: Repository,
}

impl GitRevisioning {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RevisionError> {
        Ok(Self { repo: Repository::open(path)? })
    }

    pub fn init(path: impl AsRef<Path>) -> Result<Self, RevisionError> {
        Ok(Self { repo: Repository::init(path)? })
    }

    fn signature(&self) -> Signature<'static> {
        self.repo
            .signature()
            .unwrap_or_else(|_| Signature::now("ens-storage", "ens-storage@localhost").expect("fixed signature is always valid"))
    }

    fn workdir(&self) -> Result<PathBuf, RevisionError> {
        self.repo.workdir().map(Path::to_path_buf).ok_or(RevisionError::NoWorkdir)
    }
}

impl Revisioning for GitRevisioning {
    fn commit_all(&self, message: &str) -> Result<String, RevisionError> {
        let _ = self.workdir()?;
        let mut index = self.repo.index()?;
        index.add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)?;
        index.write()?;
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;
        let signature = self.signature();

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<_> = parent.iter().collect();
        let commit_id = self.repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
        Ok(commit_id.to_string())
    }

    fn head(&self) -> Result<Option<String>, RevisionError> {
        match self.repo.head() {
            Ok(head) => Ok(head.peel_to_commit().ok().map(|c| c.id().to_string())),
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// A no-op revisioner for ensembles that opt out of git-backed history.
#[derive(Debug, Default)]
pub struct NullRevisioning;

impl Revisioning for NullRevisioning {
    fn commit_all(&self, _message: &str) -> Result<String, RevisionError> {
        Ok(String::new())
    }

    fn head(&self) -> Result<Option<String>, RevisionError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_revisioning_never_fails_and_has_no_head() {
        let rev = NullRevisioning;
        assert_eq!(rev.commit_all("job 1").unwrap(), "");
        assert_eq!(rev.head().unwrap(), None);
    }

    #[test]
    fn git_revisioning_commits_a_fresh_repo_and_advances_head() {
        let dir = tempfile::tempdir().unwrap();
        let rev = GitRevisioning::init(dir.path()).unwrap();
        std::fs::write(dir.path().join("ensemble.yaml"), "kind: Ensemble\n").unwrap();
        assert_eq!(rev.head().unwrap(), None);

        let first = rev.commit_all("initial deploy").unwrap();
        assert_eq!(rev.head().unwrap(), Some(first.clone()));

        std::fs::write(dir.path().join("ensemble.yaml"), "kind: Ensemble\nchanged: true\n").unwrap();
        let second = rev.commit_all("second deploy").unwrap();
        assert_ne!(first, second);
        assert_eq!(rev.head().unwrap(), Some(second));
    }
}
