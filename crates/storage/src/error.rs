// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The storage crate's error type: wraps document parsing, include
//! resolution, vault, revisioning, and filesystem failures behind one
//! enum, mirroring `ens-engine::error`'s one-enum-per-kind layering.

use crate::include::IncludeError;
use crate::revision::RevisionError;
use crate::vault::VaultError;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to parse document: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to resolve include directive: {0}")]
    Include(#[from] IncludeError),
    #[error(transparent)]
    Vault(#[from] VaultError),
    #[error(transparent)]
    Revision(#[from] RevisionError),
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no changeId {0} found in the change log")]
    UnknownChangeId(String),
}
