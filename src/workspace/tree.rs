//! Folder tree building and move validation
//!
//! The backend stores documents and folders as a flat record list with
//! parent pointers. The client builds the display tree from that list,
//! sorting folders before documents and alphabetically within each
//! group. Records whose parent is missing from the list are treated as
//! roots rather than dropped.
//!
//! Moves are validated before any network call: a folder may never be
//! moved into itself or one of its own descendants.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::workspace::record::DocumentRecord;

/// One node of the display tree
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    /// The record at this node
    pub record: DocumentRecord,
    /// Sorted child nodes
    pub children: Vec<TreeNode>,
}

/// Builds the display tree from a flat record list
///
/// Folders sort before documents; within each group siblings sort
/// alphabetically by title (case-insensitive). Records pointing at an
/// unknown parent become roots.
///
/// # Examples
///
/// ```
/// use textly::workspace::record::DocumentRecord;
/// use textly::workspace::tree::build_tree;
///
/// let records = vec![
///     DocumentRecord::document("d1", "zebra", None),
///     DocumentRecord::folder("f1", "alpha", None),
///     DocumentRecord::document("d2", "inside", Some("f1")),
/// ];
/// let tree = build_tree(&records);
/// assert_eq!(tree[0].record.id, "f1");
/// assert_eq!(tree[0].children[0].record.id, "d2");
/// assert_eq!(tree[1].record.id, "d1");
/// ```
pub fn build_tree(records: &[DocumentRecord]) -> Vec<TreeNode> {
    let known_ids: HashSet<&str> = records.iter().map(|r| r.id.as_str()).collect();

    let mut children_of: HashMap<&str, Vec<&DocumentRecord>> = HashMap::new();
    let mut roots: Vec<&DocumentRecord> = Vec::new();
    for record in records {
        match record.parent_id() {
            Some(parent) if known_ids.contains(parent) => {
                children_of.entry(parent).or_default().push(record);
            }
            _ => roots.push(record),
        }
    }

    sort_siblings(&mut roots);
    roots
        .into_iter()
        .map(|record| assemble(record, &children_of))
        .collect()
}

fn assemble<'a>(
    record: &'a DocumentRecord,
    children_of: &HashMap<&'a str, Vec<&'a DocumentRecord>>,
) -> TreeNode {
    let mut children: Vec<&DocumentRecord> = children_of
        .get(record.id.as_str())
        .cloned()
        .unwrap_or_default();
    sort_siblings(&mut children);
    TreeNode {
        record: record.clone(),
        children: children
            .into_iter()
            .map(|child| assemble(child, children_of))
            .collect(),
    }
}

/// Folders first, then case-insensitive alphabetical by title
fn sort_siblings(nodes: &mut [&DocumentRecord]) {
    nodes.sort_by(|a, b| match (a.is_folder, b.is_folder) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
    });
}

/// Collects every descendant of a record, depth-first
pub fn descendants<'a>(records: &'a [DocumentRecord], id: &str) -> Vec<&'a DocumentRecord> {
    let direct: Vec<&DocumentRecord> = records
        .iter()
        .filter(|r| r.parent_id() == Some(id))
        .collect();
    let mut all = direct.clone();
    for child in direct {
        all.extend(descendants(records, &child.id));
    }
    all
}

/// Checks whether a record may be moved under a target folder
///
/// Moving to the root is always allowed. Otherwise the target's
/// ancestor chain is walked: the move is rejected when the chain passes
/// through the moved record (which covers moving a folder into itself
/// or any of its descendants) or when the target is unknown.
///
/// # Examples
///
/// ```
/// use textly::workspace::record::DocumentRecord;
/// use textly::workspace::tree::can_move;
///
/// let records = vec![
///     DocumentRecord::folder("a", "A", None),
///     DocumentRecord::folder("b", "B", Some("a")),
/// ];
/// assert!(!can_move(&records, "a", Some("b")));
/// assert!(can_move(&records, "b", None));
/// ```
pub fn can_move(records: &[DocumentRecord], record_id: &str, target: Option<&str>) -> bool {
    let Some(target_id) = target else {
        return true;
    };

    let by_id: HashMap<&str, &DocumentRecord> =
        records.iter().map(|r| (r.id.as_str(), r)).collect();
    if !by_id.contains_key(target_id) {
        return false;
    }

    let mut cursor = Some(target_id);
    let mut hops = 0usize;
    while let Some(id) = cursor {
        if id == record_id {
            return false;
        }
        hops += 1;
        if hops > records.len() {
            // Corrupt parent chain; refuse rather than loop forever.
            return false;
        }
        cursor = by_id.get(id).and_then(|r| r.parent_id());
    }
    true
}

/// Lists folders that may become the parent of a record
///
/// Excludes the record itself and all of its descendants so the
/// resulting move can never form a cycle.
pub fn valid_parent_folders<'a>(
    records: &'a [DocumentRecord],
    exclude_id: Option<&str>,
) -> Vec<&'a DocumentRecord> {
    let folders = records.iter().filter(|r| r.is_folder);
    match exclude_id {
        None => folders.collect(),
        Some(id) => {
            let mut excluded: HashSet<&str> = descendants(records, id)
                .into_iter()
                .map(|r| r.id.as_str())
                .collect();
            excluded.insert(id);
            folders.filter(|f| !excluded.contains(f.id.as_str())).collect()
        }
    }
}

/// Size statistics for a folder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FolderStats {
    /// Records directly inside the folder
    pub direct_children: usize,
    /// Records anywhere below the folder
    pub total_descendants: usize,
    /// Folders among the descendants
    pub folders: usize,
    /// Documents among the descendants
    pub documents: usize,
}

/// Computes statistics for one folder
pub fn folder_stats(records: &[DocumentRecord], folder_id: &str) -> FolderStats {
    let direct_children = records
        .iter()
        .filter(|r| r.parent_id() == Some(folder_id))
        .count();
    let all = descendants(records, folder_id);
    let folders = all.iter().filter(|r| r.is_folder).count();
    FolderStats {
        direct_children,
        total_descendants: all.len(),
        folders,
        documents: all.len() - folders,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A small workspace:
    ///
    /// ```text
    /// projects/
    ///   drafts/
    ///     chapter one
    ///   readme
    /// notes
    /// ```
    fn sample() -> Vec<DocumentRecord> {
        vec![
            DocumentRecord::folder("projects", "projects", None),
            DocumentRecord::folder("drafts", "drafts", Some("projects")),
            DocumentRecord::document("ch1", "chapter one", Some("drafts")),
            DocumentRecord::document("readme", "readme", Some("projects")),
            DocumentRecord::document("notes", "notes", None),
        ]
    }

    #[test]
    fn test_build_tree_shape() {
        let tree = build_tree(&sample());
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].record.id, "projects");
        assert_eq!(tree[1].record.id, "notes");

        let projects = &tree[0];
        assert_eq!(projects.children.len(), 2);
        assert_eq!(projects.children[0].record.id, "drafts");
        assert_eq!(projects.children[1].record.id, "readme");
        assert_eq!(projects.children[0].children[0].record.id, "ch1");
    }

    #[test]
    fn test_build_tree_folders_sort_before_documents() {
        let records = vec![
            DocumentRecord::document("d", "aaa", None),
            DocumentRecord::folder("f", "zzz", None),
        ];
        let tree = build_tree(&records);
        assert_eq!(tree[0].record.id, "f");
        assert_eq!(tree[1].record.id, "d");
    }

    #[test]
    fn test_build_tree_alphabetical_within_group() {
        let records = vec![
            DocumentRecord::document("d1", "Banana", None),
            DocumentRecord::document("d2", "apple", None),
            DocumentRecord::document("d3", "Cherry", None),
        ];
        let tree = build_tree(&records);
        let titles: Vec<&str> = tree.iter().map(|n| n.record.title.as_str()).collect();
        assert_eq!(titles, vec!["apple", "Banana", "Cherry"]);
    }

    #[test]
    fn test_build_tree_orphan_becomes_root() {
        let records = vec![
            DocumentRecord::document("lost", "lost", Some("missing-folder")),
            DocumentRecord::folder("top", "top", None),
        ];
        let tree = build_tree(&records);
        assert_eq!(tree.len(), 2);
        assert!(tree.iter().any(|n| n.record.id == "lost"));
    }

    #[test]
    fn test_build_tree_empty() {
        assert!(build_tree(&[]).is_empty());
    }

    #[test]
    fn test_descendants_collects_transitively() {
        let records = sample();
        let ids: Vec<&str> = descendants(&records, "projects")
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids.len(), 3);
        assert!(ids.contains(&"drafts"));
        assert!(ids.contains(&"ch1"));
        assert!(ids.contains(&"readme"));
    }

    #[test]
    fn test_descendants_of_leaf_is_empty() {
        let records = sample();
        assert!(descendants(&records, "notes").is_empty());
    }

    #[test]
    fn test_can_move_to_root_always_allowed() {
        let records = sample();
        assert!(can_move(&records, "projects", None));
    }

    #[test]
    fn test_can_move_into_sibling() {
        let records = sample();
        assert!(can_move(&records, "notes", Some("drafts")));
    }

    /// Moving folder A into a descendant B of A must be rejected, and
    /// the record list is untouched (inputs are borrowed immutably, so
    /// this is structural).
    #[test]
    fn test_can_move_rejects_descendant_cycle() {
        let records = sample();
        let before = records.clone();
        assert!(!can_move(&records, "projects", Some("drafts")));
        assert_eq!(records, before);
    }

    #[test]
    fn test_can_move_rejects_self() {
        let records = sample();
        assert!(!can_move(&records, "drafts", Some("drafts")));
    }

    #[test]
    fn test_can_move_rejects_unknown_target() {
        let records = sample();
        assert!(!can_move(&records, "notes", Some("nope")));
    }

    #[test]
    fn test_can_move_survives_corrupt_parent_loop() {
        let records = vec![
            DocumentRecord::folder("a", "a", Some("b")),
            DocumentRecord::folder("b", "b", Some("a")),
            DocumentRecord::document("d", "d", None),
        ];
        assert!(!can_move(&records, "d", Some("a")));
    }

    #[test]
    fn test_valid_parent_folders_excludes_subtree() {
        let records = sample();
        let valid: Vec<&str> = valid_parent_folders(&records, Some("projects"))
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert!(valid.is_empty(), "only folders were projects and drafts");

        let valid: Vec<&str> = valid_parent_folders(&records, Some("notes"))
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(valid, vec!["projects", "drafts"]);
    }

    #[test]
    fn test_valid_parent_folders_without_exclusion() {
        let records = sample();
        let valid = valid_parent_folders(&records, None);
        assert_eq!(valid.len(), 2);
    }

    #[test]
    fn test_folder_stats() {
        let records = sample();
        let stats = folder_stats(&records, "projects");
        assert_eq!(stats.direct_children, 2);
        assert_eq!(stats.total_descendants, 3);
        assert_eq!(stats.folders, 1);
        assert_eq!(stats.documents, 2);
    }

    #[test]
    fn test_folder_stats_empty_folder() {
        let records = vec![DocumentRecord::folder("empty", "empty", None)];
        let stats = folder_stats(&records, "empty");
        assert_eq!(stats.direct_children, 0);
        assert_eq!(stats.total_descendants, 0);
    }
}
