// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Working-directory resolution for tasks:
//! a per-task temp directory and a persistent `artifacts/<instance>`
//! directory, both created lazily and rooted at the ensemble's base
//! directory.

use std::io;
use std::path::{Path, PathBuf};

const ARTIFACTS_DIR: &str = "artifacts";
const TMP_DIR: &str = ".ens-tmp";

/// Resolves instance- and task-scoped filesystem paths against an
/// ensemble's base directory, without touching the filesystem until a
/// directory is actually requested.
#[derive(Debug, Clone)]
pub struct PathResolver {
    base: PathBuf,
}

impl PathResolver {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// The persistent artifact directory for an instance, created if it
    /// does not already exist.
    pub fn artifact_dir(&self, instance_name: &str) -> io::Result<PathBuf> {
        let dir = self.base.join(ARTIFACTS_DIR).join(sanitize(instance_name));
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// A scratch directory for one task, named after its changeId so
    /// concurrent tasks never collide. The caller is responsible for
    /// removing it on job success if the task opted into cleanup.
    pub fn task_tmp_dir(&self, instance_name: &str, change_id: &str) -> io::Result<PathBuf> {
        let dir = self.base.join(TMP_DIR).join(sanitize(instance_name)).join(sanitize(change_id));
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn remove_task_tmp_dir(&self, instance_name: &str, change_id: &str) -> io::Result<()> {
        let dir = self.base.join(TMP_DIR).join(sanitize(instance_name)).join(sanitize(change_id));
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Resolve a path expression relative to an instance's artifact
    /// directory: a leading `./` or bare relative path is joined under
    /// `artifacts/<instance>`; an absolute path passes through unchanged.
    pub fn resolve(&self, instance_name: &str, raw: &str) -> io::Result<PathBuf> {
        let candidate = Path::new(raw);
        if candidate.is_absolute() {
            return Ok(candidate.to_path_buf());
        }
        Ok(self.artifact_dir(instance_name)?.join(candidate))
    }
}

/// Path components must not escape the instance's own subtree via `..` or
/// carry separators that would otherwise do so.
fn sanitize(name: &str) -> String {
    name.replace(['/', '\\'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_dir_is_created_under_the_base_directory() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = PathResolver::new(dir.path());
        let artifact = resolver.artifact_dir("db").unwrap();
        assert!(artifact.exists());
        assert_eq!(artifact, dir.path().join("artifacts").join("db"));
    }

    #[test]
    fn task_tmp_dir_is_removable_and_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = PathResolver::new(dir.path());
        let tmp = resolver.task_tmp_dir("db", "00000001.00000000").unwrap();
        assert!(tmp.exists());
        resolver.remove_task_tmp_dir("db", "00000001.00000000").unwrap();
        assert!(!tmp.exists());
        // removing again is not an error
        resolver.remove_task_tmp_dir("db", "00000001.00000000").unwrap();
    }

    #[test]
    fn resolve_passes_absolute_paths_through_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = PathResolver::new(dir.path());
        let resolved = resolver.resolve("db", "/etc/hosts").unwrap();
        assert_eq!(resolved, PathBuf::from("/etc/hosts"));
    }

    #[test]
    fn resolve_joins_relative_paths_under_the_artifact_dir() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = PathResolver::new(dir.path());
        let resolved = resolver.resolve("db", "dump.sql").unwrap();
        assert_eq!(resolved, dir.path().join("artifacts").join("db").join("dump.sql"));
    }

    #[test]
    fn instance_names_with_separators_are_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = PathResolver::new(dir.path());
        let artifact = resolver.artifact_dir("a/b").unwrap();
        assert_eq!(artifact, dir.path().join("artifacts").join("a_b"));
    }
}
