//! Layout style helpers

pub use taffy::prelude::*;

/// Helper to create the styles a sticky pane is built from
pub struct LayoutStyle;

impl LayoutStyle {
    /// Create a flex column style (vertical stack, sized by content)
    pub fn flex_column() -> Style {
        Style {
            display: Display::Flex,
            flex_direction: FlexDirection::Column,
            flex_shrink: 0.0,
            ..Default::default()
        }
    }

    /// Create a full-width block of a fixed height that never shrinks
    pub fn fixed_height(height: f32) -> Style {
        Style {
            flex_shrink: 0.0,
            size: Size {
                width: Dimension::Auto,
                height: Dimension::Length(height),
            },
            ..Default::default()
        }
    }
}
