//! Ready-made sticky regions

pub mod sticky_box;

pub use sticky_box::{
    mount_sticky, PinGeometry, PinState, SharedStickyBox, StickyBox, StickyBoxState, StickyMount,
};
