//! Platform events
//!
//! The handful of events a sticky pane reacts to, in a platform-agnostic form.

/// Event type identifier
pub type EventType = u32;

/// Common event types
pub mod event_types {
    use super::EventType;

    pub const SCROLL: EventType = 30;
    /// Scroll gesture ended
    pub const SCROLL_END: EventType = 31;
    pub const RESIZE: EventType = 40;

    // Element lifecycle events
    pub const MOUNT: EventType = 60;
    pub const UNMOUNT: EventType = 61;
    /// Structural, attribute or text change somewhere in an observed subtree
    pub const MUTATION: EventType = 62;
}

/// A UI event with associated data
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub event_type: EventType,
    pub data: EventData,
    /// Milliseconds since an arbitrary platform epoch
    pub timestamp: u64,
}

/// Event-specific data
#[derive(Clone, Debug, PartialEq)]
pub enum EventData {
    /// Absolute vertical scroll offset of the scroll content
    Scroll { offset_y: f32 },
    /// New viewport size
    Resize { width: f32, height: f32 },
    None,
}

impl Event {
    /// Create a scroll event carrying an absolute offset
    pub fn scroll(offset_y: f32) -> Self {
        Self {
            event_type: event_types::SCROLL,
            data: EventData::Scroll { offset_y },
            timestamp: 0,
        }
    }

    /// Create a resize event
    pub fn resize(width: f32, height: f32) -> Self {
        Self {
            event_type: event_types::RESIZE,
            data: EventData::Resize { width, height },
            timestamp: 0,
        }
    }

    /// Create a data-less event of the given type
    pub fn signal(event_type: EventType) -> Self {
        Self {
            event_type,
            data: EventData::None,
            timestamp: 0,
        }
    }

    /// Set the timestamp
    pub fn at(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }
}
