//! Sticky region coordination
//!
//! A `StickyPane` owns three stacked containers in a `LayoutTree`:
//!
//! ```text
//! root
//! ├── top container      pinned-top representations, ordered by distance
//! ├── content            the scroll content; regions live here in normal flow
//! └── bottom container   pinned-bottom representations, ordered by distance
//! ```
//!
//! Regions decide for themselves whether they are pinned. The pane reads that
//! decision, moves the region's pinned representation in or out of the matching
//! container with a single insert-before, and keeps the combined pinned height
//! per edge up to date so the content can reserve space for it.
//!
//! ```ignore
//! use pinpane_layout::prelude::*;
//!
//! let pane = StickyPane::new(StickyPaneConfig::default().viewport(400.0, 300.0));
//! pane.mount()?;
//!
//! let content = pane.content().unwrap();
//! let header = StickyBox::new(32.0).sticky_top().build(&mut pane.tree().lock().unwrap(), content)?;
//! let mount = mount_sticky(&pane.context(), header);
//!
//! pane.on_scroll(120.0);
//! ```

mod context;
mod heights;
mod order;
mod pane;
mod registry;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::tree::LayoutNodeId;

pub use context::StickyContext;
pub use heights::{HeightAccumulator, StickyLayout};
pub use order::{detach, place, Placement, Sibling};
pub use pane::{BroadcastContext, SharedTree, StickyPane, StickySubscriber};
pub use registry::RegionKey;

/// Viewport edge a region can pin to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StickyEdge {
    Top,
    Bottom,
}

impl StickyEdge {
    pub const ALL: [StickyEdge; 2] = [StickyEdge::Top, StickyEdge::Bottom];
}

/// A region that can detach from normal flow and pin to a viewport edge.
///
/// The pane assigns `distance_from_top` and reads everything else. Whether the
/// region is pinned is the region's own decision.
pub trait StickyRegion: Send {
    /// Whether the region supports pinning to `edge` at all
    fn can_sticky(&self, edge: StickyEdge) -> bool;

    /// Whether the region currently wants to be pinned to `edge`
    fn is_sticky(&self, edge: StickyEdge) -> bool;

    fn distance_from_top(&self) -> f32;

    fn set_distance_from_top(&mut self, distance: f32);

    /// Normal-flow node inside the scroll content
    fn node(&self) -> Option<LayoutNodeId>;

    /// Pinned representation for `edge`
    fn pinned_node(&self, edge: StickyEdge) -> Option<LayoutNodeId>;

    /// The pinned representation for `edge` was just placed in its container
    fn add_sticky(&mut self, edge: StickyEdge, node: LayoutNodeId);

    /// Return to the unpinned baseline
    fn reset_sticky(&mut self);

    /// Re-evaluate after content inside the region changed. Returns `true` if
    /// the pin state changed.
    fn force_update(&mut self) -> bool;
}

/// Shared handle to a registered region. Identity is the `Arc` allocation.
pub type SharedRegion = Arc<Mutex<dyn StickyRegion>>;

pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Point-in-time copy of the region state the pane works from, taken so no
/// region lock is held during tree surgery.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RegionView {
    pub distance: f32,
    pub node: Option<LayoutNodeId>,
    pub can_top: bool,
    pub can_bottom: bool,
    pub sticky_top: bool,
    pub sticky_bottom: bool,
    pub top_node: Option<LayoutNodeId>,
    pub bottom_node: Option<LayoutNodeId>,
}

impl RegionView {
    pub fn of(region: &SharedRegion) -> Self {
        let region = lock(region);
        Self {
            distance: region.distance_from_top(),
            node: region.node(),
            can_top: region.can_sticky(StickyEdge::Top),
            can_bottom: region.can_sticky(StickyEdge::Bottom),
            sticky_top: region.is_sticky(StickyEdge::Top),
            sticky_bottom: region.is_sticky(StickyEdge::Bottom),
            top_node: region.pinned_node(StickyEdge::Top),
            bottom_node: region.pinned_node(StickyEdge::Bottom),
        }
    }

    pub fn can_sticky(&self, edge: StickyEdge) -> bool {
        match edge {
            StickyEdge::Top => self.can_top,
            StickyEdge::Bottom => self.can_bottom,
        }
    }

    pub fn is_sticky(&self, edge: StickyEdge) -> bool {
        match edge {
            StickyEdge::Top => self.sticky_top,
            StickyEdge::Bottom => self.sticky_bottom,
        }
    }

    pub fn pinned_node(&self, edge: StickyEdge) -> Option<LayoutNodeId> {
        match edge {
            StickyEdge::Top => self.top_node,
            StickyEdge::Bottom => self.bottom_node,
        }
    }
}
