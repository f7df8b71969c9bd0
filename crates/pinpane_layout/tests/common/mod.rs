//! Shared fixtures for the sticky pane integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use pinpane_layout::prelude::*;

/// Region whose pin flags are set directly by the test
#[derive(Debug, Default)]
pub struct FlagRegion {
    pub node: Option<LayoutNodeId>,
    pub top: Option<LayoutNodeId>,
    pub bottom: Option<LayoutNodeId>,
    pub sticky_top: bool,
    pub sticky_bottom: bool,
    pub distance: f32,
    /// Flag value applied by the next `force_update`
    pub pending_top: Option<bool>,
    pub added: Vec<StickyEdge>,
    pub resets: usize,
    pub force_updates: usize,
}

impl StickyRegion for FlagRegion {
    fn can_sticky(&self, edge: StickyEdge) -> bool {
        self.pinned_node(edge).is_some()
    }

    fn is_sticky(&self, edge: StickyEdge) -> bool {
        match edge {
            StickyEdge::Top => self.sticky_top,
            StickyEdge::Bottom => self.sticky_bottom,
        }
    }

    fn distance_from_top(&self) -> f32 {
        self.distance
    }

    fn set_distance_from_top(&mut self, distance: f32) {
        self.distance = distance;
    }

    fn node(&self) -> Option<LayoutNodeId> {
        self.node
    }

    fn pinned_node(&self, edge: StickyEdge) -> Option<LayoutNodeId> {
        match edge {
            StickyEdge::Top => self.top,
            StickyEdge::Bottom => self.bottom,
        }
    }

    fn add_sticky(&mut self, edge: StickyEdge, _node: LayoutNodeId) {
        self.added.push(edge);
    }

    fn reset_sticky(&mut self) {
        self.sticky_top = false;
        self.sticky_bottom = false;
        self.resets += 1;
    }

    fn force_update(&mut self) -> bool {
        self.force_updates += 1;
        match self.pending_top.take() {
            Some(next) if next != self.sticky_top => {
                self.sticky_top = next;
                true
            }
            _ => false,
        }
    }
}

pub type SharedFlag = Arc<Mutex<FlagRegion>>;

pub fn config() -> StickyPaneConfig {
    StickyPaneConfig::default().viewport(400.0, 300.0)
}

pub fn mounted_pane() -> StickyPane {
    let pane = StickyPane::new(config());
    pane.mount().unwrap();
    pane
}

/// Append a plain block to the scroll content
pub fn add_block(pane: &StickyPane, height: f32) -> LayoutNodeId {
    let content = pane.content().unwrap();
    let mut tree = pane.tree().lock().unwrap();
    let node = tree.create_node(LayoutStyle::fixed_height(height)).unwrap();
    tree.add_child(content, node).unwrap();
    node
}

/// Append a region to the scroll content, with a detached pinned node per
/// requested edge
pub fn flag_region(pane: &StickyPane, height: f32, top: bool, bottom: bool) -> SharedFlag {
    let node = add_block(pane, height);
    let mut tree = pane.tree().lock().unwrap();
    let mut pinned = |enabled: bool| {
        enabled.then(|| tree.create_node(LayoutStyle::fixed_height(height)).unwrap())
    };
    let top = pinned(top);
    let bottom = pinned(bottom);
    Arc::new(Mutex::new(FlagRegion {
        node: Some(node),
        top,
        bottom,
        ..Default::default()
    }))
}

pub fn shared(region: &SharedFlag) -> SharedRegion {
    Arc::clone(region) as SharedRegion
}

pub fn children(pane: &StickyPane, parent: LayoutNodeId) -> Vec<LayoutNodeId> {
    pane.tree().lock().unwrap().children(parent)
}

/// Subscribe a handler that counts broadcasts
pub fn counter(pane: &StickyPane) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&count);
    pane.subscribe(Arc::new(move |_: &BroadcastContext| {
        seen.fetch_add(1, Ordering::SeqCst);
    }));
    count
}

pub fn drain_mutations(pane: &StickyPane) {
    pane.tree().lock().unwrap().take_mutations();
}
