//! Folder tree rendering.
//!
//! Produces the familiar `tree`-style drawing, one line per entry:
//!
//! ```text
//! └── project/
//!     ├── Cargo.toml
//!     ├── src/
//!     │   └── main.rs
//!     └── ... and 3 more hidden items
//! ```
//!
//! The walk is bounded in both directions: directories deeper than
//! `max_depth` are shown but not opened, and at most `max_items` children are
//! listed per directory. Unreadable directories produce a marker line instead
//! of aborting the whole render.

use crate::config::TreeOptions;
use crate::error::FilekitError;
use crate::files::icons::icon_for;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE: &str = "│   ";
const SPACE: &str = "    ";

/// Render the directory tree rooted at `root` as a list of lines.
///
/// # Errors
/// - [`FilekitError::PathNotFound`] if `root` does not exist
/// - [`FilekitError::NotADirectory`] if `root` is a file
/// - [`FilekitError::PermissionDenied`] if `root` itself cannot be inspected
pub fn render_tree(
    root: impl AsRef<Path>,
    options: &TreeOptions,
) -> Result<Vec<String>, FilekitError> {
    let root = root.as_ref();
    let meta = fs::metadata(root).map_err(|e| FilekitError::from_io(root, e))?;
    if !meta.is_dir() {
        return Err(FilekitError::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    let mut lines = Vec::new();
    walk(root, "", true, 0, options, &mut lines);
    debug!("Rendered tree for {}: {} lines", root.display(), lines.len());
    Ok(lines)
}

/// Render the tree as a single newline-joined string, ready to save as `.txt`.
pub fn render_tree_text(
    root: impl AsRef<Path>,
    options: &TreeOptions,
) -> Result<String, FilekitError> {
    Ok(render_tree(root, options)?.join("\n"))
}

fn walk(
    path: &Path,
    prefix: &str,
    is_last: bool,
    depth: usize,
    options: &TreeOptions,
    out: &mut Vec<String>,
) {
    let is_dir = path.is_dir();
    let name = display_name(path);

    let label = if options.use_icons {
        format!("{}{}", icon_for(&name, is_dir), name)
    } else if is_dir {
        format!("{name}/")
    } else {
        name
    };

    let connector = if is_last { LAST_BRANCH } else { BRANCH };
    out.push(format!("{prefix}{connector}{label}"));

    if !is_dir || depth >= options.max_depth {
        return;
    }

    let child_prefix = format!("{prefix}{}", if is_last { SPACE } else { PIPE });

    let mut children = match sorted_children(path) {
        Ok(children) => children,
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            warn!("Access denied: {}", path.display());
            out.push(format!("{child_prefix}⛔ [Access denied]"));
            return;
        }
        Err(e) => {
            warn!("Cannot list {}: {}", path.display(), e);
            out.push(format!("{child_prefix}⚠️ [Error: {e}]"));
            return;
        }
    };

    let hidden = children.len().saturating_sub(options.max_items);
    children.truncate(options.max_items);
    let shown = children.len();

    for (i, child) in children.iter().enumerate() {
        // With a hidden trailer, the last visible child is not the last line.
        let last = i + 1 == shown && hidden == 0;
        walk(&path.join(child), &child_prefix, last, depth + 1, options, out);
    }

    if hidden > 0 {
        out.push(format!("{child_prefix}... and {hidden} more hidden items"));
    }
}

fn sorted_children(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<io::Result<Vec<_>>>()?;
    names.sort();
    Ok(names)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
