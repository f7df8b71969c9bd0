//! Pinpane Layout Engine
//!
//! Sticky region coordination on top of a Taffy-backed node tree.
//!
//! A [`StickyPane`] owns a scroll content container flanked by two pinned
//! containers. Regions registered with the pane decide for themselves when to
//! pin; the pane keeps each pinned container sorted by distance from the top of
//! the content, tracks the combined pinned height per edge, and broadcasts
//! scroll, resize and mutation updates to its subscribers.
//!
//! # Example
//!
//! ```rust
//! use pinpane_layout::prelude::*;
//!
//! let pane = StickyPane::new(StickyPaneConfig::default().viewport(400.0, 100.0));
//! pane.mount().unwrap();
//!
//! let content = pane.content().unwrap();
//! let header = {
//!     let mut tree = pane.tree().lock().unwrap();
//!     let spacer = tree.create_node(LayoutStyle::fixed_height(50.0)).unwrap();
//!     tree.add_child(content, spacer).unwrap();
//!     StickyBox::new(20.0).sticky_top().build(&mut tree, content).unwrap()
//! };
//! let _mount = mount_sticky(&pane.context(), header);
//!
//! pane.on_scroll(80.0);
//! assert_eq!(pane.layout().sticky_top_height, 20.0);
//! ```

pub mod config;
pub mod error;
pub mod mutation;
pub mod sticky;
pub mod style;
pub mod tree;
pub mod widgets;

pub use config::StickyPaneConfig;
pub use error::{ConfigError, LayoutError, Result};
pub use mutation::{MutationKind, MutationRecord, MutationScope};
pub use sticky::{
    BroadcastContext, SharedRegion, SharedTree, StickyContext, StickyEdge, StickyLayout,
    StickyPane, StickyRegion, StickySubscriber,
};
pub use style::LayoutStyle;
pub use tree::{LayoutNodeId, LayoutTree, NodeTree};
pub use widgets::{mount_sticky, PinState, SharedStickyBox, StickyBox, StickyMount};

/// Common imports
pub mod prelude {
    pub use crate::config::StickyPaneConfig;
    pub use crate::error::{LayoutError, Result};
    pub use crate::sticky::{
        BroadcastContext, SharedRegion, StickyContext, StickyEdge, StickyLayout, StickyPane,
        StickyRegion, StickySubscriber,
    };
    pub use crate::style::LayoutStyle;
    pub use crate::tree::{LayoutNodeId, LayoutTree, NodeTree};
    pub use crate::widgets::{mount_sticky, PinState, StickyBox, StickyMount};
    pub use pinpane_core::events::{event_types, Event, EventData};
}
