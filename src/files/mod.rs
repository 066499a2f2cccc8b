//! Filesystem utilities: folder tree drawing and flat file listing.

pub mod icons;
pub mod listing;
pub mod tree;

pub use listing::{list_files, FileListing};
pub use tree::{render_tree, render_tree_text};
