//! Ambient handle to the nearest sticky pane
//!
//! Regions nested anywhere below a pane receive a `StickyContext` from their
//! builder instead of reaching for a global. The context holds the pane
//! weakly, so a region outliving its pane degrades to no-ops.

use std::fmt;
use std::sync::Weak;

use super::pane::{PaneInner, SharedTree, StickyPane, StickySubscriber};
use super::SharedRegion;

/// Weak handle to a `StickyPane`
#[derive(Clone, Default)]
pub struct StickyContext {
    pane: Weak<PaneInner>,
}

impl StickyContext {
    pub(crate) fn new(pane: Weak<PaneInner>) -> Self {
        Self { pane }
    }

    /// The pane, if it is still alive
    pub fn pane(&self) -> Option<StickyPane> {
        self.pane.upgrade().map(StickyPane::from_inner)
    }

    pub fn is_alive(&self) -> bool {
        self.pane.strong_count() > 0
    }

    pub fn tree(&self) -> Option<SharedTree> {
        self.pane().map(|pane| pane.tree().clone())
    }

    pub fn add_region(&self, region: SharedRegion) -> bool {
        self.pane().is_some_and(|pane| pane.add_region(region))
    }

    pub fn remove_region(&self, region: &SharedRegion) -> bool {
        self.pane().is_some_and(|pane| pane.remove_region(region))
    }

    pub fn sort_sticky(&self, region: &SharedRegion) {
        if let Some(pane) = self.pane() {
            pane.sort_sticky(region);
        }
    }

    pub fn update_sticky_ref_heights(&self) -> bool {
        self.pane()
            .is_some_and(|pane| pane.update_sticky_ref_heights())
    }

    pub fn notify_subscribers(&self) -> usize {
        self.pane().map_or(0, |pane| pane.notify_subscribers())
    }

    pub fn subscribe(&self, handler: StickySubscriber) -> bool {
        self.pane().is_some_and(|pane| pane.subscribe(handler))
    }

    pub fn unsubscribe(&self, handler: &StickySubscriber) -> bool {
        self.pane().is_some_and(|pane| pane.unsubscribe(handler))
    }

    pub fn scroll_position(&self) -> f32 {
        self.pane().map_or(0.0, |pane| pane.scroll_position())
    }

    /// Re-measure every region's distance from the top of the content
    pub fn recompute_all_distances(&self) {
        if let Some(pane) = self.pane() {
            pane.set_stickies_distance_from_top();
        }
    }
}

impl fmt::Debug for StickyContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StickyContext")
            .field("alive", &self.is_alive())
            .finish()
    }
}
