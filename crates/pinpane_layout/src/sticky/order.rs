//! Pinned container ordering
//!
//! Representations are kept in ascending distance-from-top order with an
//! insertion-sort-by-scan: one insert-before per placement, never a re-sort of
//! what is already there.

use crate::error::Result;
use crate::tree::{LayoutNodeId, NodeTree};

/// A region that may already be pinned in the target container
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sibling {
    pub node: LayoutNodeId,
    pub distance: f32,
}

/// What `place` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Already a child of the container, nothing touched
    AlreadyPlaced,
    /// Appended at the end (empty container, or the largest distance)
    Appended,
    /// Inserted right before the given sibling
    InsertedBefore(LayoutNodeId),
}

/// Put `node` into `container` at the position its `distance` dictates.
///
/// `siblings` are the candidates capable of pinning to the same edge; only
/// those already children of `container` are considered. Equal distances keep
/// pin order: the new node goes after existing siblings with the same distance.
pub fn place<T: NodeTree + ?Sized>(
    tree: &mut T,
    container: LayoutNodeId,
    node: LayoutNodeId,
    distance: f32,
    siblings: &[Sibling],
) -> Result<Placement> {
    if tree.is_child_of(node, container) {
        return Ok(Placement::AlreadyPlaced);
    }

    if tree.children(container).is_empty() {
        tree.insert_before(container, node, None)?;
        return Ok(Placement::Appended);
    }

    let mut pinned: Vec<Sibling> = siblings
        .iter()
        .filter(|sibling| sibling.node != node && tree.is_child_of(sibling.node, container))
        .copied()
        .collect();
    pinned.sort_by(|a, b| a.distance.total_cmp(&b.distance));

    let before = pinned
        .iter()
        .find(|sibling| sibling.distance > distance)
        .map(|sibling| sibling.node);
    tree.insert_before(container, node, before)?;

    Ok(match before {
        Some(target) => Placement::InsertedBefore(target),
        None => Placement::Appended,
    })
}

/// Take `node` out of `container`. Returns `false` if it was not there.
pub fn detach<T: NodeTree + ?Sized>(
    tree: &mut T,
    container: LayoutNodeId,
    node: LayoutNodeId,
) -> Result<bool> {
    tree.remove_child(container, node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LayoutError;
    use rustc_hash::FxHashMap;
    use slotmap::SlotMap;

    /// Bare child-list tree, no geometry
    #[derive(Default)]
    struct ListTree {
        ids: SlotMap<LayoutNodeId, ()>,
        children: FxHashMap<LayoutNodeId, Vec<LayoutNodeId>>,
        parents: FxHashMap<LayoutNodeId, LayoutNodeId>,
        inserts: usize,
    }

    impl ListTree {
        fn node(&mut self) -> LayoutNodeId {
            self.ids.insert(())
        }
    }

    impl NodeTree for ListTree {
        fn children(&self, parent: LayoutNodeId) -> Vec<LayoutNodeId> {
            self.children.get(&parent).cloned().unwrap_or_default()
        }

        fn parent(&self, node: LayoutNodeId) -> Option<LayoutNodeId> {
            self.parents.get(&node).copied()
        }

        fn insert_before(
            &mut self,
            parent: LayoutNodeId,
            child: LayoutNodeId,
            before: Option<LayoutNodeId>,
        ) -> Result<()> {
            if let Some(old) = self.parents.remove(&child) {
                self.children.entry(old).or_default().retain(|&n| n != child);
            }
            let list = self.children.entry(parent).or_default();
            let index = match before {
                Some(target) => list.iter().position(|&n| n == target).ok_or(
                    LayoutError::NotAChild {
                        parent,
                        child: target,
                    },
                )?,
                None => list.len(),
            };
            list.insert(index, child);
            self.parents.insert(child, parent);
            self.inserts += 1;
            Ok(())
        }

        fn remove_child(&mut self, parent: LayoutNodeId, child: LayoutNodeId) -> Result<bool> {
            if self.parents.get(&child) != Some(&parent) {
                return Ok(false);
            }
            self.parents.remove(&child);
            self.children.entry(parent).or_default().retain(|&n| n != child);
            Ok(true)
        }

        fn height(&mut self, _node: LayoutNodeId) -> Option<f32> {
            None
        }

        fn offset_top(&mut self, _node: LayoutNodeId, _ancestor: LayoutNodeId) -> Option<f32> {
            None
        }
    }

    fn place_all(tree: &mut ListTree, container: LayoutNodeId, order: &[usize], all: &[Sibling]) {
        for &i in order {
            place(tree, container, all[i].node, all[i].distance, all).unwrap();
        }
    }

    #[test]
    fn test_first_placement_appends() {
        let mut tree = ListTree::default();
        let container = tree.node();
        let a = tree.node();
        let placement = place(&mut tree, container, a, 10.0, &[]).unwrap();
        assert_eq!(placement, Placement::Appended);
        assert_eq!(tree.children(container), vec![a]);
    }

    #[test]
    fn test_later_smaller_distance_goes_first() {
        let mut tree = ListTree::default();
        let container = tree.node();
        let a = Sibling {
            node: tree.node(),
            distance: 10.0,
        };
        let b = Sibling {
            node: tree.node(),
            distance: 5.0,
        };
        let all = [a, b];

        place_all(&mut tree, container, &[0, 1], &all);
        assert_eq!(tree.children(container), vec![b.node, a.node]);
    }

    #[test]
    fn test_any_pin_order_converges_to_sorted() {
        let mut tree = ListTree::default();
        let container = tree.node();
        let all: Vec<Sibling> = [30.0, 10.0, 50.0, 20.0, 40.0]
            .into_iter()
            .map(|distance| Sibling {
                node: tree.node(),
                distance,
            })
            .collect();

        place_all(&mut tree, container, &[2, 0, 4, 1, 3], &all);
        let distances: Vec<f32> = tree
            .children(container)
            .iter()
            .map(|n| all.iter().find(|s| s.node == *n).unwrap().distance)
            .collect();
        assert_eq!(distances, vec![10.0, 20.0, 30.0, 40.0, 50.0]);
    }

    #[test]
    fn test_ties_keep_pin_order() {
        let mut tree = ListTree::default();
        let container = tree.node();
        let all: Vec<Sibling> = (0..3)
            .map(|_| Sibling {
                node: tree.node(),
                distance: 7.0,
            })
            .collect();

        place_all(&mut tree, container, &[1, 0, 2], &all);
        assert_eq!(
            tree.children(container),
            vec![all[1].node, all[0].node, all[2].node]
        );
    }

    #[test]
    fn test_placement_is_idempotent() {
        let mut tree = ListTree::default();
        let container = tree.node();
        let a = tree.node();
        place(&mut tree, container, a, 1.0, &[]).unwrap();
        let inserts = tree.inserts;

        let placement = place(&mut tree, container, a, 1.0, &[]).unwrap();
        assert_eq!(placement, Placement::AlreadyPlaced);
        assert_eq!(tree.inserts, inserts);
    }

    #[test]
    fn test_siblings_outside_container_are_ignored() {
        let mut tree = ListTree::default();
        let container = tree.node();
        let pinned = Sibling {
            node: tree.node(),
            distance: 20.0,
        };
        let unpinned = Sibling {
            node: tree.node(),
            distance: 15.0,
        };
        let new = tree.node();
        place(&mut tree, container, pinned.node, pinned.distance, &[]).unwrap();

        let placement = place(&mut tree, container, new, 10.0, &[pinned, unpinned]).unwrap();
        assert_eq!(placement, Placement::InsertedBefore(pinned.node));
    }

    #[test]
    fn test_detach_tolerates_absence() {
        let mut tree = ListTree::default();
        let container = tree.node();
        let a = tree.node();
        assert!(!detach(&mut tree, container, a).unwrap());
        place(&mut tree, container, a, 0.0, &[]).unwrap();
        assert!(detach(&mut tree, container, a).unwrap());
        assert!(tree.children(container).is_empty());
    }
}
