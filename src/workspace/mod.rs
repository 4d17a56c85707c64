//! Document/folder workspace: records, tree building, realtime feed

pub mod realtime;
pub mod record;
pub mod tree;

pub use record::DocumentRecord;
pub use tree::{build_tree, can_move, folder_stats, TreeNode};
