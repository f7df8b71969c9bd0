//! Pinpane Core Runtime
//!
//! This crate provides the platform-agnostic primitives the sticky pane is
//! built on:
//!
//! - **Events**: scroll, resize and lifecycle payloads delivered by the platform
//! - **Broadcast**: a set-semantics subscriber hub that tolerates re-entrant
//!   subscribe/unsubscribe while notifying
//! - **Throttle**: leading-edge rate limiting for high-frequency events
//!
//! # Example
//!
//! ```rust
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::sync::Arc;
//!
//! use pinpane_core::broadcast::{Broadcaster, Subscriber};
//!
//! let hub: Broadcaster<f32> = Broadcaster::new();
//! let calls = Arc::new(AtomicU32::new(0));
//!
//! let counter = Arc::clone(&calls);
//! let handler: Subscriber<f32> = Arc::new(move |_offset: &f32| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! // Duplicate subscriptions collapse
//! hub.subscribe(Arc::clone(&handler));
//! hub.subscribe(Arc::clone(&handler));
//!
//! hub.notify(&120.0);
//! assert_eq!(calls.load(Ordering::SeqCst), 1);
//! ```

pub mod broadcast;
pub mod events;
pub mod throttle;

pub use broadcast::{Broadcaster, Subscriber};
pub use events::{Event, EventData, EventType};
pub use throttle::Throttle;
