//! Layout tree management
//!
//! `LayoutTree` maps Pinpane node ids onto a Taffy tree. On top of the flexbox
//! engine it offers DOM-style child list surgery (`insert_before`), containment
//! queries, and a queue of mutation records that the sticky pane drains in
//! batches.

use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::{new_key_type, SlotMap};
use taffy::prelude::{AvailableSpace, Dimension, Layout, NodeId, Size, Style, TaffyTree};

use crate::error::{LayoutError, Result};
use crate::mutation::{MutationKind, MutationRecord};

new_key_type! {
    pub struct LayoutNodeId;
}

/// Ordered child lists with insert-before, containment and measurement.
///
/// The sticky engine is written against this trait so it can run on any tree
/// backend. `LayoutTree` is the Taffy-backed implementation.
pub trait NodeTree {
    /// Children of `parent`, in order
    fn children(&self, parent: LayoutNodeId) -> Vec<LayoutNodeId>;

    fn parent(&self, node: LayoutNodeId) -> Option<LayoutNodeId>;

    /// Insert `child` into `parent` right before `before`, or at the end when
    /// `before` is `None`. A child that already has a parent is moved.
    fn insert_before(
        &mut self,
        parent: LayoutNodeId,
        child: LayoutNodeId,
        before: Option<LayoutNodeId>,
    ) -> Result<()>;

    /// Detach `child` from `parent`. Returns `Ok(false)` if it was not a child.
    fn remove_child(&mut self, parent: LayoutNodeId, child: LayoutNodeId) -> Result<bool>;

    /// Rendered height of an attached node
    fn height(&mut self, node: LayoutNodeId) -> Option<f32>;

    /// Vertical offset of `node`'s top edge inside `ancestor`
    fn offset_top(&mut self, node: LayoutNodeId, ancestor: LayoutNodeId) -> Option<f32>;

    fn is_child_of(&self, node: LayoutNodeId, parent: LayoutNodeId) -> bool {
        self.parent(node) == Some(parent)
    }

    /// Inclusive descendant check, like DOM `Node.contains`
    fn contains(&self, ancestor: LayoutNodeId, node: LayoutNodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }
}

/// Maps between Pinpane node IDs and Taffy node IDs
pub struct LayoutTree {
    taffy: TaffyTree,
    node_map: SlotMap<LayoutNodeId, NodeId>,
    reverse: FxHashMap<NodeId, LayoutNodeId>,
    root: Option<LayoutNodeId>,
    viewport: Size<f32>,
    layout_dirty: bool,
    observing: bool,
    /// Queued records, at most one per target and kind
    pending: Vec<MutationRecord>,
    queued: FxHashSet<MutationRecord>,
}

impl LayoutTree {
    pub fn new() -> Self {
        Self {
            taffy: TaffyTree::new(),
            node_map: SlotMap::with_key(),
            reverse: FxHashMap::default(),
            root: None,
            viewport: Size {
                width: 0.0,
                height: 0.0,
            },
            layout_dirty: true,
            observing: true,
            pending: Vec::new(),
            queued: FxHashSet::default(),
        }
    }

    fn taffy_node(&self, id: LayoutNodeId) -> Result<NodeId> {
        self.node_map
            .get(id)
            .copied()
            .ok_or(LayoutError::UnknownNode(id))
    }

    fn node_id(&self, node: NodeId) -> Option<LayoutNodeId> {
        self.reverse.get(&node).copied()
    }

    fn record(&mut self, target: LayoutNodeId, kind: MutationKind) {
        self.layout_dirty = true;
        if !self.observing {
            return;
        }
        let record = MutationRecord::new(target, kind);
        if self.queued.insert(record) {
            self.pending.push(record);
        }
    }

    /// Create a new detached layout node with the given style
    pub fn create_node(&mut self, style: Style) -> Result<LayoutNodeId> {
        let taffy_node = self.taffy.new_leaf(style)?;
        let id = self.node_map.insert(taffy_node);
        self.reverse.insert(taffy_node, id);
        Ok(id)
    }

    /// Set the style for a node
    pub fn set_style(&mut self, id: LayoutNodeId, style: Style) -> Result<()> {
        let node = self.taffy_node(id)?;
        self.taffy.set_style(node, style)?;
        self.record(id, MutationKind::Attributes);
        Ok(())
    }

    /// Change only the height of a node's style
    pub fn set_height(&mut self, id: LayoutNodeId, height: f32) -> Result<()> {
        let node = self.taffy_node(id)?;
        let mut style = self.taffy.style(node)?.clone();
        style.size.height = Dimension::Length(height);
        self.set_style(id, style)
    }

    /// Flag a node's content as changed (text edits and the like)
    pub fn touch(&mut self, id: LayoutNodeId) -> Result<()> {
        let node = self.taffy_node(id)?;
        self.taffy.mark_dirty(node)?;
        self.record(id, MutationKind::CharacterData);
        Ok(())
    }

    /// Append a child to a parent node
    pub fn add_child(&mut self, parent: LayoutNodeId, child: LayoutNodeId) -> Result<()> {
        self.insert_before(parent, child, None)
    }

    /// Remove a node. Its children stay in the tree, detached.
    pub fn remove_node(&mut self, id: LayoutNodeId) -> Result<()> {
        let node = self.taffy_node(id)?;
        if let Some(parent) = self.parent(id) {
            self.record(parent, MutationKind::ChildList);
        }
        self.taffy.remove(node)?;
        self.node_map.remove(id);
        self.reverse.remove(&node);
        if self.root == Some(id) {
            self.root = None;
        }
        self.layout_dirty = true;
        Ok(())
    }

    pub fn contains_node(&self, id: LayoutNodeId) -> bool {
        self.node_map.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }

    pub fn set_root(&mut self, root: Option<LayoutNodeId>) {
        self.root = root;
        self.layout_dirty = true;
    }

    pub fn root(&self) -> Option<LayoutNodeId> {
        self.root
    }

    /// Set the viewport. Width constrains layout; height is informational
    /// since scroll content grows to fit.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = Size { width, height };
        self.layout_dirty = true;
    }

    pub fn viewport(&self) -> Size<f32> {
        self.viewport
    }

    /// Compute layout for the tree under the root, if anything changed
    pub fn compute_layout(&mut self) -> Result<()> {
        if !self.layout_dirty {
            return Ok(());
        }
        let Some(root) = self.root else {
            return Ok(());
        };
        let node = self.taffy_node(root)?;
        let available_space = Size {
            width: AvailableSpace::Definite(self.viewport.width),
            height: AvailableSpace::MaxContent,
        };
        self.taffy.compute_layout(node, available_space)?;
        self.layout_dirty = false;
        Ok(())
    }

    /// Get the computed layout for a node
    pub fn get_layout(&self, id: LayoutNodeId) -> Option<&Layout> {
        self.node_map
            .get(id)
            .and_then(|&taffy_node| self.taffy.layout(taffy_node).ok())
    }

    /// Whether the node is connected to the root
    pub fn is_attached(&self, id: LayoutNodeId) -> bool {
        self.root.is_some_and(|root| self.contains(root, id))
    }

    fn layout_for_attached(&mut self, id: LayoutNodeId) -> Option<Layout> {
        if !self.is_attached(id) {
            return None;
        }
        if let Err(err) = self.compute_layout() {
            tracing::warn!("layout computation failed: {err}");
            return None;
        }
        self.get_layout(id).copied()
    }

    /// Enable or disable mutation recording
    pub fn set_observing(&mut self, observing: bool) {
        self.observing = observing;
        if !observing {
            self.pending.clear();
            self.queued.clear();
        }
    }

    pub fn is_observing(&self) -> bool {
        self.observing
    }

    /// Drain the mutation records queued since the last call. Repeated
    /// changes of the same kind to the same node come back as one record.
    pub fn take_mutations(&mut self) -> Vec<MutationRecord> {
        self.queued.clear();
        std::mem::take(&mut self.pending)
    }
}

impl NodeTree for LayoutTree {
    fn children(&self, parent: LayoutNodeId) -> Vec<LayoutNodeId> {
        let Ok(node) = self.taffy_node(parent) else {
            return Vec::new();
        };
        self.taffy
            .children(node)
            .map(|children| {
                children
                    .into_iter()
                    .filter_map(|child| self.node_id(child))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn parent(&self, node: LayoutNodeId) -> Option<LayoutNodeId> {
        let taffy_node = self.node_map.get(node)?;
        self.taffy
            .parent(*taffy_node)
            .and_then(|parent| self.node_id(parent))
    }

    fn insert_before(
        &mut self,
        parent: LayoutNodeId,
        child: LayoutNodeId,
        before: Option<LayoutNodeId>,
    ) -> Result<()> {
        if before == Some(child) {
            return Ok(());
        }
        let parent_node = self.taffy_node(parent)?;
        let child_node = self.taffy_node(child)?;
        let before_node = match before {
            Some(target) => {
                if !self.is_child_of(target, parent) {
                    return Err(LayoutError::NotAChild {
                        parent,
                        child: target,
                    });
                }
                Some(self.taffy_node(target)?)
            }
            None => None,
        };

        if let Some(old_parent) = self.taffy.parent(child_node) {
            let siblings = self.taffy.children(old_parent)?;
            if let Some(index) = siblings.iter().position(|&n| n == child_node) {
                self.taffy.remove_child_at_index(old_parent, index)?;
            }
            if let Some(old_parent) = self.node_id(old_parent) {
                self.record(old_parent, MutationKind::ChildList);
            }
        }

        let siblings = self.taffy.children(parent_node)?;
        let index = before_node
            .and_then(|target| siblings.iter().position(|&n| n == target))
            .unwrap_or(siblings.len());
        self.taffy.insert_child_at_index(parent_node, index, child_node)?;
        self.record(parent, MutationKind::ChildList);
        Ok(())
    }

    fn remove_child(&mut self, parent: LayoutNodeId, child: LayoutNodeId) -> Result<bool> {
        let parent_node = self.taffy_node(parent)?;
        let child_node = self.taffy_node(child)?;
        if self.taffy.parent(child_node) != Some(parent_node) {
            return Ok(false);
        }
        let siblings = self.taffy.children(parent_node)?;
        let Some(index) = siblings.iter().position(|&n| n == child_node) else {
            return Ok(false);
        };
        self.taffy.remove_child_at_index(parent_node, index)?;
        self.record(parent, MutationKind::ChildList);
        Ok(true)
    }

    fn height(&mut self, node: LayoutNodeId) -> Option<f32> {
        self.layout_for_attached(node).map(|layout| layout.size.height)
    }

    fn offset_top(&mut self, node: LayoutNodeId, ancestor: LayoutNodeId) -> Option<f32> {
        if !self.contains(ancestor, node) {
            return None;
        }
        self.layout_for_attached(node)?;

        let mut offset = 0.0;
        let mut current = node;
        while current != ancestor {
            offset += self.get_layout(current)?.location.y;
            current = self.parent(current)?;
        }
        Some(offset)
    }
}

impl Default for LayoutTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::LayoutStyle;

    fn column_with(tree: &mut LayoutTree, heights: &[f32]) -> (LayoutNodeId, Vec<LayoutNodeId>) {
        let root = tree.create_node(LayoutStyle::flex_column()).unwrap();
        let children = heights
            .iter()
            .map(|&h| {
                let child = tree.create_node(LayoutStyle::fixed_height(h)).unwrap();
                tree.add_child(root, child).unwrap();
                child
            })
            .collect();
        tree.set_root(Some(root));
        tree.set_viewport(400.0, 300.0);
        (root, children)
    }

    #[test]
    fn test_insert_before_and_append() {
        let mut tree = LayoutTree::new();
        let (root, kids) = column_with(&mut tree, &[10.0, 20.0]);
        let extra = tree.create_node(LayoutStyle::fixed_height(5.0)).unwrap();

        tree.insert_before(root, extra, Some(kids[1])).unwrap();
        assert_eq!(tree.children(root), vec![kids[0], extra, kids[1]]);

        // Inserting an attached node moves it
        tree.insert_before(root, extra, None).unwrap();
        assert_eq!(tree.children(root), vec![kids[0], kids[1], extra]);
    }

    #[test]
    fn test_insert_before_rejects_foreign_target() {
        let mut tree = LayoutTree::new();
        let (root, kids) = column_with(&mut tree, &[10.0]);
        let other = tree.create_node(LayoutStyle::flex_column()).unwrap();
        let extra = tree.create_node(LayoutStyle::fixed_height(5.0)).unwrap();
        tree.add_child(other, extra).unwrap();

        let err = tree.insert_before(root, extra, Some(other));
        assert!(matches!(err, Err(LayoutError::NotAChild { .. })));
        // Nothing moved
        assert!(tree.is_child_of(extra, other));
        assert_eq!(tree.children(root), kids);
    }

    #[test]
    fn test_remove_child_is_tolerant() {
        let mut tree = LayoutTree::new();
        let (root, kids) = column_with(&mut tree, &[10.0, 20.0]);

        assert!(tree.remove_child(root, kids[0]).unwrap());
        assert!(!tree.remove_child(root, kids[0]).unwrap());
        assert_eq!(tree.children(root), vec![kids[1]]);
        assert!(tree.contains_node(kids[0]));
    }

    #[test]
    fn test_measurement() {
        let mut tree = LayoutTree::new();
        let (root, kids) = column_with(&mut tree, &[10.0, 20.0, 30.0]);

        assert_eq!(tree.height(kids[1]), Some(20.0));
        assert_eq!(tree.offset_top(kids[2], root), Some(30.0));
        assert_eq!(tree.height(root), Some(60.0));

        tree.set_height(kids[0], 15.0).unwrap();
        assert_eq!(tree.offset_top(kids[2], root), Some(35.0));

        // Detached nodes have no geometry
        let loose = tree.create_node(LayoutStyle::fixed_height(7.0)).unwrap();
        assert_eq!(tree.height(loose), None);
        assert_eq!(tree.offset_top(loose, root), None);
    }

    #[test]
    fn test_contains_is_inclusive() {
        let mut tree = LayoutTree::new();
        let (root, kids) = column_with(&mut tree, &[10.0]);
        assert!(tree.contains(root, root));
        assert!(tree.contains(root, kids[0]));
        assert!(!tree.contains(kids[0], root));
    }

    #[test]
    fn test_mutation_records() {
        let mut tree = LayoutTree::new();
        let (root, kids) = column_with(&mut tree, &[10.0]);
        let _ = tree.take_mutations();

        tree.set_height(kids[0], 12.0).unwrap();
        tree.touch(kids[0]).unwrap();
        tree.remove_child(root, kids[0]).unwrap();

        let kinds: Vec<_> = tree
            .take_mutations()
            .into_iter()
            .map(|r| (r.target, r.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (kids[0], MutationKind::Attributes),
                (kids[0], MutationKind::CharacterData),
                (root, MutationKind::ChildList),
            ]
        );
        assert!(tree.take_mutations().is_empty());

        tree.set_observing(false);
        tree.add_child(root, kids[0]).unwrap();
        assert!(tree.take_mutations().is_empty());
    }

    #[test]
    fn test_repeated_changes_coalesce() {
        let mut tree = LayoutTree::new();
        let (root, kids) = column_with(&mut tree, &[10.0]);
        let _ = tree.take_mutations();

        for _ in 0..1000 {
            tree.remove_child(root, kids[0]).unwrap();
            tree.add_child(root, kids[0]).unwrap();
            tree.set_height(kids[0], 11.0).unwrap();
        }
        assert_eq!(
            tree.take_mutations(),
            vec![
                MutationRecord::new(root, MutationKind::ChildList),
                MutationRecord::new(kids[0], MutationKind::Attributes),
            ]
        );

        // A drained record is queued again on the next change
        tree.touch(kids[0]).unwrap();
        tree.set_height(kids[0], 12.0).unwrap();
        assert_eq!(tree.take_mutations().len(), 2);
    }

    #[test]
    fn test_remove_node() {
        let mut tree = LayoutTree::new();
        let (root, kids) = column_with(&mut tree, &[10.0, 20.0]);
        tree.remove_node(kids[0]).unwrap();
        assert!(!tree.contains_node(kids[0]));
        assert_eq!(tree.children(root), vec![kids[1]]);
        assert!(matches!(
            tree.remove_node(kids[0]),
            Err(LayoutError::UnknownNode(_))
        ));
    }
}
