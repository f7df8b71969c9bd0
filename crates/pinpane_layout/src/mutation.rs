//! Mutation records and batch classification
//!
//! `LayoutTree` queues a record for every structural, attribute or content
//! change. The pane drains them in batches and classifies each batch as either
//! touching a pinned container or touching the scroll content.

use smallvec::SmallVec;

use crate::tree::{LayoutNodeId, NodeTree};

/// What changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// Children added or removed. The record targets the parent.
    ChildList,
    /// Style changed
    Attributes,
    /// Content changed without a structural or style change
    CharacterData,
}

/// A single change observed in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MutationRecord {
    pub target: LayoutNodeId,
    pub kind: MutationKind,
}

impl MutationRecord {
    pub fn new(target: LayoutNodeId, kind: MutationKind) -> Self {
        Self { target, kind }
    }
}

/// Classification of a non-empty batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationScope {
    /// At least one record lies inside a pinned container
    Pinned,
    /// Every record lies outside the pinned containers. Holds the distinct
    /// targets in record order.
    Content(SmallVec<[LayoutNodeId; 4]>),
}

/// Classify a batch against the pinned containers.
///
/// Returns `None` for an empty batch.
pub fn classify<T: NodeTree + ?Sized>(
    tree: &T,
    records: &[MutationRecord],
    pinned_containers: &[LayoutNodeId],
) -> Option<MutationScope> {
    if records.is_empty() {
        return None;
    }

    let in_pinned = records.iter().any(|record| {
        pinned_containers
            .iter()
            .any(|&container| tree.contains(container, record.target))
    });
    if in_pinned {
        return Some(MutationScope::Pinned);
    }

    let mut targets: SmallVec<[LayoutNodeId; 4]> = SmallVec::new();
    for record in records {
        if !targets.contains(&record.target) {
            targets.push(record.target);
        }
    }
    Some(MutationScope::Content(targets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::LayoutStyle;
    use crate::tree::LayoutTree;

    struct Fixture {
        tree: LayoutTree,
        top: LayoutNodeId,
        content: LayoutNodeId,
        pinned_child: LayoutNodeId,
        item: LayoutNodeId,
    }

    fn fixture() -> Fixture {
        let mut tree = LayoutTree::new();
        let top = tree.create_node(LayoutStyle::flex_column()).unwrap();
        let content = tree.create_node(LayoutStyle::flex_column()).unwrap();
        let pinned_child = tree.create_node(LayoutStyle::fixed_height(4.0)).unwrap();
        let item = tree.create_node(LayoutStyle::fixed_height(4.0)).unwrap();
        tree.add_child(top, pinned_child).unwrap();
        tree.add_child(content, item).unwrap();
        Fixture {
            tree,
            top,
            content,
            pinned_child,
            item,
        }
    }

    #[test]
    fn test_empty_batch() {
        let f = fixture();
        assert_eq!(classify(&f.tree, &[], &[f.top]), None);
    }

    #[test]
    fn test_any_pinned_record_wins() {
        let f = fixture();
        let records = [
            MutationRecord::new(f.item, MutationKind::Attributes),
            MutationRecord::new(f.pinned_child, MutationKind::CharacterData),
        ];
        assert_eq!(
            classify(&f.tree, &records, &[f.top]),
            Some(MutationScope::Pinned)
        );

        // The container itself counts
        let records = [MutationRecord::new(f.top, MutationKind::ChildList)];
        assert_eq!(
            classify(&f.tree, &records, &[f.top]),
            Some(MutationScope::Pinned)
        );
    }

    #[test]
    fn test_content_collects_every_distinct_target() {
        let f = fixture();
        let records = [
            MutationRecord::new(f.item, MutationKind::Attributes),
            MutationRecord::new(f.content, MutationKind::ChildList),
            MutationRecord::new(f.item, MutationKind::CharacterData),
        ];
        let Some(MutationScope::Content(targets)) = classify(&f.tree, &records, &[f.top]) else {
            panic!("expected a content batch");
        };
        assert_eq!(targets.as_slice(), &[f.item, f.content]);
    }
}
