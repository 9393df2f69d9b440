// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AST-walking executor: runs a parsed command list against a cwd/env,
//! capturing per-command traces.

mod error;
mod expand;
mod expand_glob;
mod redirect;
mod result;
mod run;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub use error::ExecError;
pub use result::{CommandTrace, ExecOutput};
use run::ExecContext;
pub(crate) use run::{execute_command_list, execute_command_list_capture};

use crate::{CommandList, Parser};

/// Default cap on captured stdout/stderr snippets (bytes).
const DEFAULT_SNIPPET_LIMIT: usize = 4096;

/// Builder over [`ExecContext`] that parses and runs shell scripts.
///
/// Cloning is cheap; each `execute`/`execute_str` call builds a fresh
/// context from the builder's settings so the executor itself stays
/// immutable between runs.
#[derive(Clone)]
pub struct ShellExecutor {
    cwd: Option<PathBuf>,
    env: HashMap<String, String>,
    variables: HashMap<String, String>,
    snippet_limit: usize,
    pipefail: bool,
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self {
            cwd: None,
            env: HashMap::new(),
            variables: HashMap::new(),
            snippet_limit: DEFAULT_SNIPPET_LIMIT,
            pipefail: false,
        }
    }
}

impl ShellExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn envs<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in vars {
            self.env.insert(k.into(), v.into());
        }
        self
    }

    pub fn variables<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in vars {
            self.variables.insert(k.into(), v.into());
        }
        self
    }

    pub fn snippet_limit(mut self, limit: usize) -> Self {
        self.snippet_limit = limit;
        self
    }

    pub fn pipefail(mut self, pipefail: bool) -> Self {
        self.pipefail = pipefail;
        self
    }

    fn context(&self) -> ExecContext {
        let cwd = match &self.cwd {
            Some(p) => p.clone(),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        };
        ExecContext {
            cwd,
            env: self.env.clone(),
            variables: self.variables.clone(),
            snippet_limit: self.snippet_limit,
            pipefail: self.pipefail,
            ifs: " \t\n".to_string(),
            last_exit_code: 0,
        }
    }

    /// Parse `script` and run it with fail-fast semantics.
    pub async fn execute_str(&self, script: &str) -> Result<ExecOutput, ExecError> {
        let ast = Parser::parse(script)?;
        self.execute(&ast).await
    }

    /// Run an already-parsed command list with fail-fast semantics.
    pub async fn execute(&self, cmd_list: &CommandList) -> Result<ExecOutput, ExecError> {
        let mut ctx = self.context();
        execute_command_list(&mut ctx, cmd_list).await
    }

    /// Run an already-parsed command list, returning captured stdout instead
    /// of a trace list. Used for command-substitution-style callers.
    pub async fn execute_capture(&self, cmd_list: &CommandList) -> Result<String, ExecError> {
        let mut ctx = self.context();
        execute_command_list_capture(&mut ctx, cmd_list).await
    }
}
