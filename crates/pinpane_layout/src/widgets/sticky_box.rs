//! Sticky box widget
//!
//! A fixed-height region that pins itself to the top of the viewport once it
//! scrolls past, and to the bottom while it is still below the fold.
//!
//! # Example
//!
//! ```rust,ignore
//! use pinpane_layout::prelude::*;
//!
//! let pane = StickyPane::new(StickyPaneConfig::default());
//! pane.mount()?;
//!
//! let header = {
//!     let mut tree = pane.tree().lock().unwrap();
//!     StickyBox::new(40.0).sticky_top().build(&mut tree, pane.content().unwrap())?
//! };
//! let mount = mount_sticky(&pane.context(), header);
//!
//! pane.on_scroll(200.0);
//! // ...
//! mount.unmount();
//! ```

use std::sync::{Arc, Mutex};

use crate::error::Result;
use crate::sticky::{
    lock, BroadcastContext, SharedRegion, SharedTree, StickyContext, StickyEdge, StickyRegion,
    StickySubscriber,
};
use crate::style::LayoutStyle;
use crate::tree::{LayoutNodeId, LayoutTree, NodeTree};

// ============================================================================
// Pin State
// ============================================================================

/// Where a sticky box currently sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PinState {
    /// In normal flow
    #[default]
    Unpinned,
    /// Pinned to the top of the viewport
    PinnedTop,
    /// Pinned to the bottom of the viewport
    PinnedBottom,
}

impl PinState {
    pub fn is_pinned(&self, edge: StickyEdge) -> bool {
        matches!(
            (self, edge),
            (PinState::PinnedTop, StickyEdge::Top) | (PinState::PinnedBottom, StickyEdge::Bottom)
        )
    }

    /// Decide the pin state from geometry. Top wins over bottom.
    pub fn resolve(geometry: &PinGeometry, can_top: bool, can_bottom: bool) -> Self {
        if can_top && geometry.scroll_top > geometry.distance_from_top {
            PinState::PinnedTop
        } else if can_bottom
            && geometry.distance_from_top + geometry.height
                > geometry.scroll_top + geometry.viewport_height
        {
            PinState::PinnedBottom
        } else {
            PinState::Unpinned
        }
    }
}

/// Inputs to `PinState::resolve`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PinGeometry {
    pub distance_from_top: f32,
    pub height: f32,
    pub scroll_top: f32,
    pub viewport_height: f32,
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for a sticky box
#[derive(Debug, Clone, Copy)]
pub struct StickyBox {
    height: f32,
    can_top: bool,
    can_bottom: bool,
}

impl StickyBox {
    pub fn new(height: f32) -> Self {
        Self {
            height,
            can_top: false,
            can_bottom: false,
        }
    }

    /// Allow pinning to the top edge
    pub fn sticky_top(mut self) -> Self {
        self.can_top = true;
        self
    }

    /// Allow pinning to the bottom edge
    pub fn sticky_bottom(mut self) -> Self {
        self.can_bottom = true;
        self
    }

    /// Create the normal-flow node under `parent` plus one detached pinned
    /// representation per enabled edge
    pub fn build(self, tree: &mut LayoutTree, parent: LayoutNodeId) -> Result<SharedStickyBox> {
        let node = tree.create_node(LayoutStyle::fixed_height(self.height))?;
        tree.add_child(parent, node)?;

        let top_node = if self.can_top {
            Some(tree.create_node(LayoutStyle::fixed_height(self.height))?)
        } else {
            None
        };
        let bottom_node = if self.can_bottom {
            Some(tree.create_node(LayoutStyle::fixed_height(self.height))?)
        } else {
            None
        };

        Ok(Arc::new(Mutex::new(StickyBoxState {
            node,
            top_node,
            bottom_node,
            height: self.height,
            distance_from_top: 0.0,
            pin: PinState::Unpinned,
            mounted_edge: None,
            scroll_top: 0.0,
            viewport_height: 0.0,
            tree: None,
        })))
    }
}

// ============================================================================
// State
// ============================================================================

/// Live state of a built sticky box
pub struct StickyBoxState {
    node: LayoutNodeId,
    top_node: Option<LayoutNodeId>,
    bottom_node: Option<LayoutNodeId>,
    /// Fallback height while the node has no layout
    height: f32,
    distance_from_top: f32,
    pin: PinState,
    /// Edge whose pinned representation the pane last placed
    mounted_edge: Option<StickyEdge>,
    scroll_top: f32,
    viewport_height: f32,
    /// Tree seen on the last broadcast, used to re-measure on forced updates
    tree: Option<SharedTree>,
}

pub type SharedStickyBox = Arc<Mutex<StickyBoxState>>;

impl StickyBoxState {
    pub fn pin_state(&self) -> PinState {
        self.pin
    }

    /// Edge the pane last placed a pinned representation for, cleared on reset
    pub fn mounted_edge(&self) -> Option<StickyEdge> {
        self.mounted_edge
    }

    /// Resize the box and both pinned representations
    pub fn set_height(&mut self, tree: &mut LayoutTree, height: f32) -> Result<()> {
        self.height = height;
        for node in [Some(self.node), self.top_node, self.bottom_node]
            .into_iter()
            .flatten()
        {
            tree.set_height(node, height)?;
        }
        Ok(())
    }

    /// Re-evaluate against a broadcast. Returns `true` if the pin state
    /// changed.
    pub fn on_broadcast(&mut self, context: &BroadcastContext) -> bool {
        self.scroll_top = context.scroll_top;
        self.viewport_height = context.viewport_height;
        if self.tree.is_none() {
            self.tree = Some(Arc::clone(&context.tree));
        }
        self.evaluate()
    }

    fn measure_height(&self) -> f32 {
        self.tree
            .as_ref()
            .and_then(|tree| lock(tree).height(self.node))
            .unwrap_or(self.height)
    }

    fn evaluate(&mut self) -> bool {
        let geometry = PinGeometry {
            distance_from_top: self.distance_from_top,
            height: self.measure_height(),
            scroll_top: self.scroll_top,
            viewport_height: self.viewport_height,
        };
        let next = PinState::resolve(
            &geometry,
            self.top_node.is_some(),
            self.bottom_node.is_some(),
        );
        if next == self.pin {
            return false;
        }
        tracing::trace!(from = ?self.pin, to = ?next, ?geometry, "sticky box pin state changed");
        self.pin = next;
        true
    }
}

impl StickyRegion for StickyBoxState {
    fn can_sticky(&self, edge: StickyEdge) -> bool {
        self.pinned_node(edge).is_some()
    }

    fn is_sticky(&self, edge: StickyEdge) -> bool {
        self.pin.is_pinned(edge)
    }

    fn distance_from_top(&self) -> f32 {
        self.distance_from_top
    }

    fn set_distance_from_top(&mut self, distance: f32) {
        self.distance_from_top = distance;
    }

    fn node(&self) -> Option<LayoutNodeId> {
        Some(self.node)
    }

    fn pinned_node(&self, edge: StickyEdge) -> Option<LayoutNodeId> {
        match edge {
            StickyEdge::Top => self.top_node,
            StickyEdge::Bottom => self.bottom_node,
        }
    }

    fn add_sticky(&mut self, edge: StickyEdge, _node: LayoutNodeId) {
        self.mounted_edge = Some(edge);
    }

    fn reset_sticky(&mut self) {
        self.pin = PinState::Unpinned;
        self.mounted_edge = None;
    }

    fn force_update(&mut self) -> bool {
        self.evaluate()
    }
}

// ============================================================================
// Mounting
// ============================================================================

/// A sticky box registered with a pane
pub struct StickyMount {
    context: StickyContext,
    region: SharedRegion,
    subscriber: StickySubscriber,
}

impl StickyMount {
    pub fn region(&self) -> &SharedRegion {
        &self.region
    }

    /// Unsubscribe and unregister
    pub fn unmount(self) {
        self.context.unsubscribe(&self.subscriber);
        self.context.remove_region(&self.region);
    }
}

/// Subscribe a sticky box to the pane's broadcasts and register it.
///
/// Whenever a broadcast flips the box's pin state the pane is asked to
/// recount its pinned heights.
pub fn mount_sticky(context: &StickyContext, sticky: SharedStickyBox) -> StickyMount {
    let weak = Arc::downgrade(&sticky);
    let pane = context.clone();
    let subscriber: StickySubscriber = Arc::new(move |broadcast: &BroadcastContext| {
        let Some(sticky) = weak.upgrade() else {
            return;
        };
        let changed = lock(&sticky).on_broadcast(broadcast);
        if changed {
            pane.update_sticky_ref_heights();
        }
    });

    let region: SharedRegion = sticky;
    context.subscribe(Arc::clone(&subscriber));
    context.add_region(Arc::clone(&region));

    StickyMount {
        context: context.clone(),
        region,
        subscriber,
    }
}
