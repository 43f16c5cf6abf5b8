//! Debug Drawing
//!
//! Sink for constraint visualization. Nothing here affects the simulation.

use crate::core::vec3::FixedVec3;

/// Receives line segments from `debug_draw` calls.
pub trait DebugDrawer {
    /// Draw a segment from `from` to `to` (world space).
    fn draw_line(&mut self, from: FixedVec3, to: FixedVec3);
}

/// Collects segments in call order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineBuffer {
    /// Recorded `(from, to)` pairs
    pub lines: Vec<(FixedVec3, FixedVec3)>,
}

impl LineBuffer {
    /// Empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every recorded line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Number of recorded lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True if nothing was drawn.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl DebugDrawer for LineBuffer {
    fn draw_line(&mut self, from: FixedVec3, to: FixedVec3) {
        self.lines.push((from, to));
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_buffer_records_in_order() {
        let mut buffer = LineBuffer::new();
        buffer.draw_line(FixedVec3::ZERO, FixedVec3::UNIT_X);
        buffer.draw_line(FixedVec3::UNIT_Y, FixedVec3::UNIT_Z);
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.lines[1], (FixedVec3::UNIT_Y, FixedVec3::UNIT_Z));

        buffer.clear();
        assert!(buffer.is_empty());
    }
}
