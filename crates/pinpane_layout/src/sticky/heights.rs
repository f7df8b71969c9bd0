//! Combined pinned height per edge

use super::StickyEdge;

/// Space the pinned containers occupy, consumed by the scroll content to
/// reserve room at each edge
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StickyLayout {
    pub sticky_top_height: f32,
    pub sticky_bottom_height: f32,
}

impl StickyLayout {
    pub fn height(&self, edge: StickyEdge) -> f32 {
        match edge {
            StickyEdge::Top => self.sticky_top_height,
            StickyEdge::Bottom => self.sticky_bottom_height,
        }
    }
}

/// Full-recount accumulator. Each pass starts from zero so a missed
/// add/remove can never leave the totals drifting.
#[derive(Debug, Default)]
pub struct HeightAccumulator {
    top: f32,
    bottom: f32,
}

impl HeightAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one region. The same measurement feeds both edges.
    pub fn add(&mut self, height: f32, sticky_top: bool, sticky_bottom: bool) {
        if sticky_top {
            self.top += height;
        }
        if sticky_bottom {
            self.bottom += height;
        }
    }

    pub fn finish(self) -> StickyLayout {
        StickyLayout {
            sticky_top_height: self.top,
            sticky_bottom_height: self.bottom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulate() {
        let mut acc = HeightAccumulator::new();
        acc.add(10.0, true, false);
        acc.add(5.0, false, true);
        acc.add(7.0, false, false);
        acc.add(3.0, true, false);

        let layout = acc.finish();
        assert_eq!(layout.height(StickyEdge::Top), 13.0);
        assert_eq!(layout.height(StickyEdge::Bottom), 5.0);
    }
}
