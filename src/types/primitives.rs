//! Primitive type definitions for the connectivity store.
//!
//! Type aliases keep the semantics of the original C++ implementation while
//! the handle types lean on Rust's type system: a handle carries the slot it
//! addresses plus the generation of that slot, so a handle kept across the
//! destroy/reuse of its slot is detectable instead of silently aliasing a
//! newer entity.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 32-bit floating point number.
pub type Real32 = f32;

/// 64-bit floating point number.
pub type Real64 = f64;

/// Index type for cells in the connections graph.
pub type CellIdx = u32;

/// Index type for segments within a cell.
pub type SegmentIdx = u16;

/// Count type for synapses within a segment.
pub type SynapseIdx = u16;

/// Synapse permanence value (0.0 to 1.0).
pub type Permanence = Real32;

/// Minimum permanence value.
pub const MIN_PERMANENCE: Permanence = 0.0;

/// Maximum permanence value.
pub const MAX_PERMANENCE: Permanence = 1.0;

/// Epsilon for permanence comparisons at the API boundary.
pub const PERMANENCE_EPSILON: Permanence = 1e-7;

/// Stable handle to a segment in the connections flat list.
///
/// The slot is a small dense integer usable as a direct index into activity
/// output buffers (see [`Segment::flat_index`]). Slots of destroyed segments
/// are recycled; the generation distinguishes a recycled slot from the
/// segment a stale handle referred to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Segment {
    pub(crate) slot: u32,
    pub(crate) generation: u32,
}

impl Segment {
    /// Position of this segment in the flat list.
    ///
    /// Valid index into activity output buffers sized to
    /// `segment_flat_list_length()`.
    #[inline]
    #[must_use]
    pub fn flat_index(self) -> usize {
        self.slot as usize
    }
}

/// Stable handle to a synapse.
///
/// Same slot-plus-generation scheme as [`Segment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Synapse {
    pub(crate) slot: u32,
    pub(crate) generation: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_sizes() {
        assert_eq!(core::mem::size_of::<CellIdx>(), 4);
        assert_eq!(core::mem::size_of::<SegmentIdx>(), 2);
        assert_eq!(core::mem::size_of::<SynapseIdx>(), 2);
        assert_eq!(core::mem::size_of::<Segment>(), 8);
        assert_eq!(core::mem::size_of::<Synapse>(), 8);
        assert_eq!(core::mem::size_of::<Permanence>(), 4);
    }

    #[test]
    fn test_permanence_bounds() {
        assert!(MIN_PERMANENCE < MAX_PERMANENCE);
        assert!(PERMANENCE_EPSILON > 0.0);
        assert!(PERMANENCE_EPSILON < 0.001);
    }

    #[test]
    fn test_flat_index() {
        let segment = Segment {
            slot: 7,
            generation: 3,
        };
        assert_eq!(segment.flat_index(), 7);
    }
}
