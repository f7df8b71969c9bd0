//! Sticky pane coordinator
//!
//! Ties the registry, the order maintainer, the height aggregator, the
//! subscriber broadcast and the mutation watcher together.
//!
//! # Locking
//!
//! Regions, the tree and the pane state each sit behind their own mutex. No
//! lock is held while a subscriber or a region command runs, and the pane
//! never locks a region while it holds the tree: it snapshots region state
//! first (`RegionView`), then does the tree surgery, then issues region
//! commands.
//!
//! # Broadcast rounds
//!
//! A recount requested while a broadcast is running is deferred until the
//! handlers return, then run once. If it changed the heights, or a handler
//! asked for another broadcast, a new round starts. Any number of regions
//! flipping in one scroll costs two rounds, not one nested broadcast each.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use pinpane_core::broadcast::{Broadcaster, Subscriber};
use pinpane_core::events::{event_types, Event, EventData};
use pinpane_core::throttle::Throttle;
use smallvec::SmallVec;

use super::context::StickyContext;
use super::heights::{HeightAccumulator, StickyLayout};
use super::order::{self, Sibling};
use super::registry::{RegionKey, Registry};
use super::{lock, RegionView, SharedRegion, StickyEdge};
use crate::config::StickyPaneConfig;
use crate::error::Result;
use crate::mutation::{self, MutationRecord, MutationScope};
use crate::style::LayoutStyle;
use crate::tree::{LayoutNodeId, LayoutTree, NodeTree};

/// Tree shared between the pane, its regions and the host
pub type SharedTree = Arc<Mutex<LayoutTree>>;

/// What every subscriber receives on a broadcast
#[derive(Clone)]
pub struct BroadcastContext {
    /// Scroll content node
    pub content: LayoutNodeId,
    /// Top pinned container
    pub top: LayoutNodeId,
    /// Bottom pinned container, used to measure the distance left to the
    /// bottom edge
    pub bottom: LayoutNodeId,
    /// Last reported scroll offset of the content
    pub scroll_top: f32,
    pub viewport_height: f32,
    /// Pinned heights at the time of the broadcast
    pub layout: StickyLayout,
    pub tree: SharedTree,
}

/// Broadcast handler type
pub type StickySubscriber = Subscriber<BroadcastContext>;

/// Upper bound on follow-up rounds per broadcast
const MAX_BROADCAST_ROUNDS: usize = 16;

/// The pane's own nodes, present while mounted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Containers {
    root: LayoutNodeId,
    top: LayoutNodeId,
    content: LayoutNodeId,
    bottom: LayoutNodeId,
}

impl Containers {
    fn pinned(&self, edge: StickyEdge) -> LayoutNodeId {
        match edge {
            StickyEdge::Top => self.top,
            StickyEdge::Bottom => self.bottom,
        }
    }
}

struct PaneState {
    containers: Option<Containers>,
    registry: Registry,
    layout: StickyLayout,
    scroll_top: f32,
    viewport: (f32, f32),
    throttle: Throttle,
    /// Content node kept with its subtree while unmounted
    detached_content: Option<LayoutNodeId>,
    broadcasting: bool,
    update_pending: bool,
    rebroadcast: bool,
}

pub(crate) struct PaneInner {
    config: StickyPaneConfig,
    tree: SharedTree,
    state: Mutex<PaneState>,
    subscribers: Broadcaster<BroadcastContext>,
}

/// Command for a region, collected during a pass and issued after the tree
/// lock is released
#[derive(Debug, Clone, Copy)]
enum RegionCommand {
    AddSticky(StickyEdge, LayoutNodeId),
    Reset,
}

type Commands = SmallVec<[RegionCommand; 2]>;

/// Reconciliation check for one region: make both pinned containers match
/// what the region reports.
fn reconcile(
    tree: &mut LayoutTree,
    containers: Containers,
    view: &RegionView,
    all: &[RegionView],
) -> Commands {
    let mut commands = Commands::new();

    for edge in StickyEdge::ALL {
        let Some(node) = view.pinned_node(edge) else {
            continue;
        };
        let container = containers.pinned(edge);

        if view.is_sticky(edge) {
            if tree.is_child_of(node, container) {
                continue;
            }
            let siblings: Vec<Sibling> = all
                .iter()
                .filter(|other| other.can_sticky(edge))
                .filter_map(|other| {
                    other.pinned_node(edge).map(|node| Sibling {
                        node,
                        distance: other.distance,
                    })
                })
                .collect();
            match order::place(tree, container, node, view.distance, &siblings) {
                Ok(placement) => {
                    tracing::trace!(?edge, ?placement, distance = view.distance, "pinned");
                    commands.push(RegionCommand::AddSticky(edge, node));
                }
                Err(err) => tracing::warn!(?edge, "failed to pin region: {err}"),
            }
        } else if tree.is_child_of(node, container) {
            match order::detach(tree, container, node) {
                Ok(_) => tracing::trace!(?edge, "unpinned"),
                Err(err) => tracing::warn!(?edge, "failed to unpin region: {err}"),
            }
        }
    }

    if !view.sticky_top && !view.sticky_bottom {
        if let Some(node) = view.node {
            if !tree.contains(containers.content, node) {
                commands.push(RegionCommand::Reset);
            }
        }
    }

    commands
}

fn apply(region: &SharedRegion, commands: &[RegionCommand]) {
    if commands.is_empty() {
        return;
    }
    let mut region = lock(region);
    for command in commands {
        match *command {
            RegionCommand::AddSticky(edge, node) => region.add_sticky(edge, node),
            RegionCommand::Reset => region.reset_sticky(),
        }
    }
}

/// Coordinates the sticky regions of one scrollable pane
#[derive(Clone)]
pub struct StickyPane {
    inner: Arc<PaneInner>,
}

impl StickyPane {
    /// Create a pane with its own tree
    pub fn new(config: StickyPaneConfig) -> Self {
        Self::with_tree(config, Arc::new(Mutex::new(LayoutTree::new())))
    }

    /// Create a pane on a tree shared with the host
    pub fn with_tree(config: StickyPaneConfig, tree: SharedTree) -> Self {
        lock(&tree).set_observing(config.observe_mutations);
        let state = PaneState {
            containers: None,
            registry: Registry::new(),
            layout: StickyLayout::default(),
            scroll_top: 0.0,
            viewport: (config.viewport_width, config.viewport_height),
            throttle: Throttle::new(config.scroll_throttle()),
            detached_content: None,
            broadcasting: false,
            update_pending: false,
            rebroadcast: false,
        };
        Self {
            inner: Arc::new(PaneInner {
                config,
                tree,
                state: Mutex::new(state),
                subscribers: Broadcaster::new(),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<PaneInner>) -> Self {
        Self { inner }
    }

    fn state(&self) -> MutexGuard<'_, PaneState> {
        lock(&self.inner.state)
    }

    fn tree_guard(&self) -> MutexGuard<'_, LayoutTree> {
        lock(&self.inner.tree)
    }

    fn containers(&self) -> Option<Containers> {
        self.state().containers
    }

    pub fn config(&self) -> &StickyPaneConfig {
        &self.inner.config
    }

    pub fn tree(&self) -> &SharedTree {
        &self.inner.tree
    }

    /// Ambient handle for regions nested anywhere below this pane
    pub fn context(&self) -> StickyContext {
        StickyContext::new(Arc::downgrade(&self.inner))
    }

    pub fn is_mounted(&self) -> bool {
        self.containers().is_some()
    }

    pub fn root(&self) -> Option<LayoutNodeId> {
        self.containers().map(|c| c.root)
    }

    pub fn content(&self) -> Option<LayoutNodeId> {
        self.containers().map(|c| c.content)
    }

    pub fn top_container(&self) -> Option<LayoutNodeId> {
        self.containers().map(|c| c.top)
    }

    pub fn bottom_container(&self) -> Option<LayoutNodeId> {
        self.containers().map(|c| c.bottom)
    }

    /// Pinned container for an edge
    pub fn container(&self, edge: StickyEdge) -> Option<LayoutNodeId> {
        self.containers().map(|c| c.pinned(edge))
    }

    /// Current pinned heights
    pub fn layout(&self) -> StickyLayout {
        self.state().layout
    }

    pub fn viewport(&self) -> (f32, f32) {
        self.state().viewport
    }

    /// Scroll offset of the content, `0.0` while unmounted
    pub fn scroll_position(&self) -> f32 {
        let state = self.state();
        if state.containers.is_some() {
            state.scroll_top
        } else {
            0.0
        }
    }

    pub fn region_count(&self) -> usize {
        self.state().registry.len()
    }

    pub fn contains_region(&self, region: &SharedRegion) -> bool {
        self.state().registry.contains(region)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Build the pane's containers and bring every registered region up to
    /// date. Mounting twice is a no-op.
    pub fn mount(&self) -> Result<()> {
        if self.is_mounted() {
            return Ok(());
        }
        let (width, height) = self.viewport();
        let kept = self.state().detached_content.take();

        let containers = {
            let mut tree = self.tree_guard();
            let root = tree.create_node(LayoutStyle::flex_column())?;
            let top = tree.create_node(LayoutStyle::flex_column())?;
            let content = match kept.filter(|&node| tree.contains_node(node)) {
                Some(node) => node,
                None => tree.create_node(LayoutStyle::flex_column())?,
            };
            let bottom = tree.create_node(LayoutStyle::flex_column())?;
            tree.add_child(root, top)?;
            tree.add_child(root, content)?;
            tree.add_child(root, bottom)?;
            tree.set_root(Some(root));
            tree.set_viewport(width, height);
            Containers {
                root,
                top,
                content,
                bottom,
            }
        };
        self.state().containers = Some(containers);
        tracing::debug!(?containers, "sticky pane mounted");

        self.set_stickies_distance_from_top();
        self.refresh();
        Ok(())
    }

    /// Detach every pinned representation, reset every region and drop the
    /// pane's nodes. The content node is detached and kept with its subtree
    /// for the next mount. Registered regions and subscribers are kept.
    pub fn unmount(&self) {
        let Some(containers) = self.state().containers.take() else {
            return;
        };
        let regions = self.state().registry.snapshot();
        let views: Vec<RegionView> = regions.iter().map(RegionView::of).collect();

        {
            let mut tree = self.tree_guard();
            for view in &views {
                for edge in StickyEdge::ALL {
                    if let Some(node) = view.pinned_node(edge) {
                        if let Err(err) = order::detach(&mut *tree, containers.pinned(edge), node) {
                            tracing::warn!(?edge, "failed to detach region on unmount: {err}");
                        }
                    }
                }
            }
            if let Err(err) = tree.remove_child(containers.root, containers.content) {
                tracing::warn!("failed to detach pane content: {err}");
            }
            for node in [containers.top, containers.bottom, containers.root] {
                if let Err(err) = tree.remove_node(node) {
                    tracing::warn!("failed to remove pane node: {err}");
                }
            }
        }

        for region in &regions {
            lock(region).reset_sticky();
        }

        let mut state = self.state();
        state.layout = StickyLayout::default();
        state.scroll_top = 0.0;
        state.throttle.reset();
        state.detached_content = Some(containers.content);
        tracing::debug!("sticky pane unmounted");
    }

    // =========================================================================
    // Registry
    // =========================================================================

    /// Register a region. Returns `false` if it was already registered.
    pub fn add_region(&self, region: SharedRegion) -> bool {
        if !self.state().registry.insert(Arc::clone(&region)) {
            return false;
        }
        tracing::debug!(region = ?RegionKey::of(&region), "sticky region registered");

        if self.is_mounted() {
            self.set_distance_from_top(&region);
            self.sort_sticky(&region);
            self.refresh();
        }
        true
    }

    /// Unregister a region and pull its pinned representations out of both
    /// containers. Returns `false` if it was not registered.
    pub fn remove_region(&self, region: &SharedRegion) -> bool {
        let removed = self.state().registry.remove(region).is_some();
        let detached = self.detach_region(region);
        if !removed && !detached {
            return false;
        }
        tracing::debug!(region = ?RegionKey::of(region), "sticky region unregistered");
        self.refresh();
        removed
    }

    fn detach_region(&self, region: &SharedRegion) -> bool {
        let Some(containers) = self.containers() else {
            return false;
        };
        let view = RegionView::of(region);
        let mut tree = self.tree_guard();
        let mut detached = false;
        for edge in StickyEdge::ALL {
            let Some(node) = view.pinned_node(edge) else {
                continue;
            };
            match order::detach(&mut *tree, containers.pinned(edge), node) {
                Ok(removed) => detached |= removed,
                Err(err) => tracing::warn!(?edge, "failed to detach region: {err}"),
            }
        }
        detached
    }

    /// Recompute placement for a single registered region
    pub fn sort_sticky(&self, region: &SharedRegion) {
        let (containers, regions) = {
            let state = self.state();
            match state.containers {
                Some(containers) if state.registry.contains(region) => {
                    (containers, state.registry.snapshot())
                }
                _ => return,
            }
        };
        let views: Vec<RegionView> = regions.iter().map(RegionView::of).collect();
        let view = RegionView::of(region);

        let commands = reconcile(&mut self.tree_guard(), containers, &view, &views);
        apply(region, &commands);
    }

    /// Assign every region its distance from the top of the scroll content
    pub fn set_stickies_distance_from_top(&self) {
        let regions = self.state().registry.snapshot();
        for region in &regions {
            self.set_distance_from_top(region);
        }
    }

    fn set_distance_from_top(&self, region: &SharedRegion) {
        let Some(containers) = self.containers() else {
            return;
        };
        let Some(node) = lock(region).node() else {
            return;
        };
        let distance = self.tree_guard().offset_top(node, containers.content);
        if let Some(distance) = distance {
            lock(region).set_distance_from_top(distance);
        }
    }

    // =========================================================================
    // Heights and broadcast
    // =========================================================================

    /// Reconcile every region and recount the pinned heights. Broadcasts and
    /// returns `true` if the heights changed.
    ///
    /// Called from a broadcast handler, the recount is deferred to the end of
    /// the current round and this returns `false`.
    pub fn update_sticky_ref_heights(&self) -> bool {
        {
            let mut state = self.state();
            if state.containers.is_none() {
                return false;
            }
            if state.broadcasting {
                state.update_pending = true;
                return false;
            }
        }
        let changed = self.recount();
        if changed {
            self.notify_subscribers();
        }
        changed
    }

    /// Reconcile and recount without broadcasting. Returns `true` if the
    /// heights changed.
    fn recount(&self) -> bool {
        let Some(containers) = self.containers() else {
            return false;
        };
        let regions = self.state().registry.snapshot();
        let views: Vec<RegionView> = regions.iter().map(RegionView::of).collect();

        let mut accumulator = HeightAccumulator::new();
        let mut pending: Vec<(&SharedRegion, Commands)> = Vec::new();
        {
            let mut tree = self.tree_guard();
            for (region, view) in regions.iter().zip(&views) {
                let commands = reconcile(&mut tree, containers, view, &views);
                if !commands.is_empty() {
                    pending.push((region, commands));
                }
                if view.sticky_top || view.sticky_bottom {
                    let height = view.node.and_then(|node| tree.height(node)).unwrap_or(0.0);
                    accumulator.add(height, view.sticky_top, view.sticky_bottom);
                }
            }
        }
        for (region, commands) in &pending {
            apply(region, commands);
        }

        let layout = accumulator.finish();
        let changed = {
            let mut state = self.state();
            let changed = state.layout != layout;
            state.layout = layout;
            changed
        };
        if changed {
            tracing::debug!(
                top = layout.sticky_top_height,
                bottom = layout.sticky_bottom_height,
                "sticky layout changed"
            );
        }
        changed
    }

    /// Recount heights, and broadcast even if they did not change
    fn refresh(&self) {
        if !self.update_sticky_ref_heights() {
            self.notify_subscribers();
        }
    }

    /// Recompute distances and invoke every subscriber. Returns the number of
    /// subscribers invoked in the first round, `0` while unmounted.
    ///
    /// Called from a broadcast handler, this schedules another round after
    /// the current one instead of nesting and returns `0`.
    pub fn notify_subscribers(&self) -> usize {
        {
            let mut state = self.state();
            if state.containers.is_none() {
                return 0;
            }
            if state.broadcasting {
                state.rebroadcast = true;
                return 0;
            }
            state.broadcasting = true;
        }
        let _round = BroadcastRound { pane: self };

        let mut invoked = None;
        for round in 0..MAX_BROADCAST_ROUNDS {
            let Some(count) = self.broadcast_once() else {
                break;
            };
            if invoked.is_none() {
                invoked = Some(count);
            }

            let (update, rebroadcast) = {
                let mut state = self.state();
                (
                    std::mem::take(&mut state.update_pending),
                    std::mem::take(&mut state.rebroadcast),
                )
            };
            let changed = update && self.recount();
            if !changed && !rebroadcast {
                break;
            }
            if round + 1 == MAX_BROADCAST_ROUNDS {
                tracing::warn!(rounds = MAX_BROADCAST_ROUNDS, "sticky broadcast did not settle");
            }
        }
        invoked.unwrap_or(0)
    }

    /// One pass over the subscribers. `None` if the pane is not mounted.
    fn broadcast_once(&self) -> Option<usize> {
        self.set_stickies_distance_from_top();

        let context = {
            let state = self.state();
            let containers = state.containers?;
            BroadcastContext {
                content: containers.content,
                top: containers.top,
                bottom: containers.bottom,
                scroll_top: state.scroll_top,
                viewport_height: state.viewport.1,
                layout: state.layout,
                tree: Arc::clone(&self.inner.tree),
            }
        };
        Some(self.inner.subscribers.notify(&context))
    }

    /// Returns `false` if the handler was already subscribed
    pub fn subscribe(&self, handler: StickySubscriber) -> bool {
        self.inner.subscribers.subscribe(handler)
    }

    /// Returns `false` if the handler was not subscribed
    pub fn unsubscribe(&self, handler: &StickySubscriber) -> bool {
        self.inner.subscribers.unsubscribe(handler)
    }

    // =========================================================================
    // Platform events
    // =========================================================================

    /// Record a scroll offset and broadcast, at most once per throttle
    /// interval
    pub fn on_scroll(&self, offset_y: f32) -> bool {
        self.on_scroll_at(offset_y, Instant::now())
    }

    /// `on_scroll` with an explicit clock. Returns whether a broadcast ran.
    pub fn on_scroll_at(&self, offset_y: f32, now: Instant) -> bool {
        let fire = {
            let mut state = self.state();
            state.scroll_top = offset_y;
            state.containers.is_some() && state.throttle.try_fire(now)
        };
        if fire {
            self.notify_subscribers();
        }
        fire
    }

    /// Apply a new viewport size and re-evaluate everything
    pub fn on_resize(&self, width: f32, height: f32) {
        self.state().viewport = (width, height);
        if !self.is_mounted() {
            return;
        }
        self.tree_guard().set_viewport(width, height);
        self.set_stickies_distance_from_top();
        self.refresh();
    }

    /// Resize-equivalent update with the current viewport
    pub fn force_layout_update(&self) {
        let (width, height) = self.viewport();
        self.on_resize(width, height);
    }

    /// Dispatch a platform event
    pub fn handle_event(&self, event: &Event) {
        match (event.event_type, &event.data) {
            (event_types::SCROLL, EventData::Scroll { offset_y }) => {
                self.on_scroll(*offset_y);
            }
            (event_types::SCROLL_END, _) => {
                self.notify_subscribers();
            }
            (event_types::RESIZE, EventData::Resize { width, height }) => {
                self.on_resize(*width, *height);
            }
            (event_types::MOUNT, _) => {
                if let Err(err) = self.mount() {
                    tracing::warn!("failed to mount sticky pane: {err}");
                }
            }
            (event_types::UNMOUNT, _) => self.unmount(),
            (event_types::MUTATION, _) => {
                self.flush_mutations();
            }
            (event_type, _) => tracing::trace!(event_type, "event ignored by sticky pane"),
        }
    }

    // =========================================================================
    // Mutation watcher
    // =========================================================================

    /// Deliver the mutation records queued in the tree since the last flush.
    /// Returns the number of records processed.
    pub fn flush_mutations(&self) -> usize {
        let records = self.tree_guard().take_mutations();
        if records.is_empty() {
            return 0;
        }
        self.on_mutations(&records);
        records.len()
    }

    /// React to a batch of mutation records
    pub fn on_mutations(&self, records: &[MutationRecord]) {
        let Some(containers) = self.containers() else {
            return;
        };
        if records.is_empty() {
            return;
        }

        self.notify_subscribers();

        let scope = mutation::classify(
            &*self.tree_guard(),
            records,
            &[containers.top, containers.bottom],
        );
        match scope {
            None => {}
            Some(MutationScope::Pinned) => {
                tracing::trace!(records = records.len(), "pinned content mutated");
                self.update_sticky_ref_heights();
            }
            Some(MutationScope::Content(targets)) => {
                let regions = self.state().registry.snapshot();
                let nodes: Vec<Option<LayoutNodeId>> =
                    regions.iter().map(|region| lock(region).node()).collect();
                let affected: Vec<&SharedRegion> = {
                    let tree = self.tree_guard();
                    regions
                        .iter()
                        .zip(&nodes)
                        .filter(|(_, node)| {
                            node.is_some_and(|node| {
                                targets.iter().any(|&target| tree.contains(node, target))
                            })
                        })
                        .map(|(region, _)| region)
                        .collect()
                };
                tracing::trace!(
                    records = records.len(),
                    affected = affected.len(),
                    "scroll content mutated"
                );

                let mut changed = false;
                for region in affected {
                    changed |= lock(region).force_update();
                }
                if changed {
                    self.update_sticky_ref_heights();
                }
            }
        }
    }
}

/// Clears the in-broadcast flag when a broadcast ends, even if a handler
/// panics
struct BroadcastRound<'a> {
    pane: &'a StickyPane,
}

impl Drop for BroadcastRound<'_> {
    fn drop(&mut self) {
        let mut state = self.pane.state();
        state.broadcasting = false;
        state.update_pending = false;
        state.rebroadcast = false;
    }
}
