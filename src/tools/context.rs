//! ToolContext - execution context for tools
//!
//! One context per conversation/workspace session. Tools reach the
//! filesystem and search collaborators only through it, and every path
//! argument is validated here before any I/O happens.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::config::ToolDefaults;
use crate::workspace::{FileSystem, LocalFs, LocalSearch, SearchBackend};

use super::sandbox;
use super::ToolError;

/// Execution context for tools
#[derive(Clone)]
pub struct ToolContext {
    /// Workspace root - the sandbox boundary
    pub workspace: PathBuf,

    /// Filesystem collaborator
    pub fs: Arc<dyn FileSystem>,

    /// Search collaborator
    pub search: Arc<dyn SearchBackend>,

    /// Absolute prefixes allowed outside the workspace
    pub allowed_roots: Vec<String>,

    /// Per-tool default parameters
    pub defaults: ToolDefaults,
}

impl ToolContext {
    /// Create a context with the disk-backed default collaborators
    pub fn new(workspace: PathBuf) -> Self {
        debug!(?workspace, "ToolContext::new: called");
        Self {
            workspace,
            fs: Arc::new(LocalFs),
            search: Arc::new(LocalSearch),
            allowed_roots: sandbox::DEFAULT_ALLOWED_ROOTS.iter().map(|s| s.to_string()).collect(),
            defaults: ToolDefaults::default(),
        }
    }

    /// Create a context with custom collaborator backends
    pub fn with_backends(workspace: PathBuf, fs: Arc<dyn FileSystem>, search: Arc<dyn SearchBackend>) -> Self {
        debug!(?workspace, "ToolContext::with_backends: called");
        Self {
            workspace,
            fs,
            search,
            allowed_roots: sandbox::DEFAULT_ALLOWED_ROOTS.iter().map(|s| s.to_string()).collect(),
            defaults: ToolDefaults::default(),
        }
    }

    /// Override per-tool defaults
    pub fn with_defaults(mut self, defaults: ToolDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Override the sandbox allowlist
    pub fn with_allowed_roots(mut self, allowed_roots: Vec<String>) -> Self {
        self.allowed_roots = allowed_roots;
        self
    }

    /// Validate a raw path argument against the sandbox
    pub fn sanitize(&self, raw: &str) -> Result<PathBuf, ToolError> {
        sandbox::sanitize_path(&self.workspace, raw, &self.allowed_roots)
    }

    /// Display form of a path with the workspace root hidden
    pub fn display(&self, path: &Path) -> String {
        sandbox::display_path(&self.workspace, path)
    }

    /// Workspace-relative form of a path
    pub fn relative(&self, path: &Path) -> String {
        sandbox::relative_path(&self.workspace, path)
    }
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("workspace", &self.workspace)
            .field("allowed_roots", &self.allowed_roots)
            .finish()
    }
}
