//! Workspace path sandbox
//!
//! Every path-bearing tool argument goes through [`sanitize_path`] before a
//! collaborator sees it. Normalization is done on `/`-separated components
//! with an explicit stack, never the OS path API - the result must be
//! deterministic across platforms.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::ToolError;

/// Placeholder substituted for the workspace root in displayed paths
pub const WORKSPACE_PLACEHOLDER: &str = "[workspace]";

/// Absolute roots that are always rejected
const BLOCKED_ROOTS: &[&str] = &[
    "/etc", "/var", "/root", "/proc", "/sys", "/dev", "/boot", "/bin", "/sbin", "/lib",
];

/// Absolute roots tools may read outside the workspace
pub const DEFAULT_ALLOWED_ROOTS: &[&str] = &["/home", "/usr", "/tmp", "/Users"];

/// Validate and resolve a raw tool path against the workspace root
///
/// Relative paths resolve under `workspace`. Absolute paths are accepted
/// only under `allowed_roots`; other absolute paths are demoted to
/// workspace-relative rather than rejected outright.
pub fn sanitize_path(workspace: &Path, raw: &str, allowed_roots: &[String]) -> Result<PathBuf, ToolError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ToolError::InvalidArgument("path must be a non-empty string".to_string()));
    }

    // Traversal sequences are rejected up front, before any normalization
    if raw.split(['/', '\\']).any(|c| c == "..") {
        debug!(%raw, "sanitize_path: traversal rejected");
        return Err(ToolError::AccessDenied { path: raw.to_string() });
    }

    // Home-anchored paths are never resolvable deterministically
    if raw.starts_with('~') {
        debug!(%raw, "sanitize_path: home-anchored path rejected");
        return Err(ToolError::AccessDenied { path: raw.to_string() });
    }

    if BLOCKED_ROOTS.iter().any(|root| path_has_prefix(raw, root)) {
        debug!(%raw, "sanitize_path: blocked root rejected");
        return Err(ToolError::AccessDenied { path: raw.to_string() });
    }

    let collapsed = collapse_separators(raw);

    if is_home_dotfile(&collapsed) {
        debug!(%raw, "sanitize_path: home dotfile rejected");
        return Err(ToolError::AccessDenied { path: raw.to_string() });
    }

    let ws = workspace_string(workspace);

    let normalized = if collapsed.starts_with('/') {
        if allowed_roots.iter().any(|root| path_has_prefix(&collapsed, root)) {
            normalize_components(&collapsed)
        } else {
            // Absolute but not allowlisted: treat as workspace-relative
            let rel = collapsed.trim_start_matches('/');
            normalize_components(&format!("{ws}/{rel}"))
        }
    } else {
        normalize_components(&format!("{ws}/{collapsed}"))
    };

    let allowed = path_has_prefix(&normalized, &ws)
        || allowed_roots.iter().any(|root| path_has_prefix(&normalized, root));

    if allowed {
        debug!(%normalized, "sanitize_path: accepted");
        Ok(PathBuf::from(normalized))
    } else {
        debug!(%normalized, "sanitize_path: rejected after normalization");
        Err(ToolError::AccessDenied { path: raw.to_string() })
    }
}

/// Render a path for display, hiding the absolute workspace location
pub fn display_path(workspace: &Path, path: &Path) -> String {
    let ws = workspace_string(workspace);
    let p = collapse_separators(&path.to_string_lossy());

    if p == ws {
        WORKSPACE_PLACEHOLDER.to_string()
    } else if path_has_prefix(&p, &ws) {
        format!("{}/{}", WORKSPACE_PLACEHOLDER, &p[ws.len() + 1..])
    } else {
        p
    }
}

/// Workspace-relative form of a path (full path if outside the workspace)
pub fn relative_path(workspace: &Path, path: &Path) -> String {
    let ws = workspace_string(workspace);
    let p = collapse_separators(&path.to_string_lossy());

    if p == ws {
        ".".to_string()
    } else if path_has_prefix(&p, &ws) {
        p[ws.len() + 1..].to_string()
    } else {
        p
    }
}

fn workspace_string(workspace: &Path) -> String {
    let ws = collapse_separators(&workspace.to_string_lossy());
    ws.trim_end_matches('/').to_string()
}

/// Prefix match on whole components: `/home` covers `/home/x`, not `/homey`
fn path_has_prefix(path: &str, prefix: &str) -> bool {
    path == prefix || path.starts_with(&format!("{prefix}/"))
}

/// Unify separators to `/` and collapse runs
fn collapse_separators(raw: &str) -> String {
    let unified = raw.replace('\\', "/");
    let mut out = String::with_capacity(unified.len());
    let mut prev_sep = false;
    for ch in unified.chars() {
        if ch == '/' {
            if !prev_sep {
                out.push(ch);
            }
            prev_sep = true;
        } else {
            prev_sep = false;
            out.push(ch);
        }
    }
    out
}

/// Dotfiles directly under a home directory, e.g. `/home/user/.ssh/...`
fn is_home_dotfile(path: &str) -> bool {
    let comps: Vec<&str> = path.split('/').collect();
    comps.len() >= 4
        && comps[0].is_empty()
        && (comps[1] == "home" || comps[1] == "Users")
        && comps[3].starts_with('.')
}

/// Resolve `.` and `..` segments with an explicit component stack
fn normalize_components(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut stack: Vec<&str> = Vec::new();

    for comp in path.split('/') {
        match comp {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            c => stack.push(c),
        }
    }

    if absolute {
        format!("/{}", stack.join("/"))
    } else {
        stack.join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roots() -> Vec<String> {
        DEFAULT_ALLOWED_ROOTS.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_traversal_rejected() {
        let result = sanitize_path(Path::new("/ws"), "../../etc/passwd", &roots());
        assert!(matches!(result, Err(ToolError::AccessDenied { .. })));
    }

    #[test]
    fn test_relative_path_resolves_under_workspace() {
        let result = sanitize_path(Path::new("/ws"), "src/App.tsx", &roots()).unwrap();
        assert_eq!(result, PathBuf::from("/ws/src/App.tsx"));
    }

    #[test]
    fn test_sensitive_absolute_root_rejected() {
        let result = sanitize_path(Path::new("/ws"), "/etc/shadow", &roots());
        assert!(matches!(result, Err(ToolError::AccessDenied { .. })));
    }

    #[test]
    fn test_allowlisted_absolute_path_accepted() {
        let result = sanitize_path(Path::new("/ws"), "/home/user/file", &roots()).unwrap();
        assert_eq!(result, PathBuf::from("/home/user/file"));
    }

    #[test]
    fn test_unlisted_absolute_path_demoted_to_relative() {
        let result = sanitize_path(Path::new("/ws"), "/opt/data/notes.txt", &roots()).unwrap();
        assert_eq!(result, PathBuf::from("/ws/opt/data/notes.txt"));
    }

    #[test]
    fn test_home_dotfile_rejected() {
        let result = sanitize_path(Path::new("/ws"), "/home/user/.ssh/id_rsa", &roots());
        assert!(matches!(result, Err(ToolError::AccessDenied { .. })));
    }

    #[test]
    fn test_tilde_path_rejected() {
        let result = sanitize_path(Path::new("/ws"), "~/notes.txt", &roots());
        assert!(matches!(result, Err(ToolError::AccessDenied { .. })));
    }

    #[test]
    fn test_empty_path_rejected() {
        let result = sanitize_path(Path::new("/ws"), "  ", &roots());
        assert!(matches!(result, Err(ToolError::InvalidArgument(_))));
    }

    #[test]
    fn test_repeated_separators_collapsed() {
        let result = sanitize_path(Path::new("/ws"), "src//deep///file.rs", &roots()).unwrap();
        assert_eq!(result, PathBuf::from("/ws/src/deep/file.rs"));
    }

    #[test]
    fn test_dot_segments_normalized() {
        let result = sanitize_path(Path::new("/ws"), "./src/./lib.rs", &roots()).unwrap();
        assert_eq!(result, PathBuf::from("/ws/src/lib.rs"));
    }

    #[test]
    fn test_prefix_match_is_component_wise() {
        // "/homey" must not ride on the "/home" allowlist entry
        let result = sanitize_path(Path::new("/ws"), "/homey/user/file", &roots()).unwrap();
        assert_eq!(result, PathBuf::from("/ws/homey/user/file"));
    }

    #[test]
    fn test_display_path_hides_workspace_root() {
        let shown = display_path(Path::new("/ws"), Path::new("/ws/src/lib.rs"));
        assert_eq!(shown, "[workspace]/src/lib.rs");

        let outside = display_path(Path::new("/ws"), Path::new("/home/user/file"));
        assert_eq!(outside, "/home/user/file");
    }

    #[test]
    fn test_relative_path_strips_workspace_root() {
        let rel = relative_path(Path::new("/ws"), Path::new("/ws/src/lib.rs"));
        assert_eq!(rel, "src/lib.rs");

        let root = relative_path(Path::new("/ws"), Path::new("/ws"));
        assert_eq!(root, ".");
    }
}
