//! # Veles - Sparse synaptic connectivity for HTM
//!
//! Veles is the synaptic connectivity store used by Hierarchical Temporal
//! Memory (HTM) style cortical algorithms. It maintains a three-level graph
//! of cells, dendritic segments, and synapses under a workload of continuous
//! structural churn, in-place learning updates, and a hot inference step
//! that tallies per-segment overlap with a sparse input.
//!
//! ## Overview
//!
//! The central type is [`Connections`](connections::Connections):
//!
//! - **Stable handles**: segments and synapses are addressed by generational
//!   handles that survive unrelated destroys and detect use-after-free.
//! - **Forward queries**: segments of a cell, synapses of a segment, in
//!   creation order.
//! - **Reverse queries**: all synapses sourced from a given presynaptic
//!   cell, kept consistent with the forward store at every observable point.
//! - **Activity kernel**: [`compute_activity`](connections::Connections::compute_activity)
//!   counts connected and potential overlaps per segment, touching only the
//!   synapses driven by the input.
//! - **Learning**: clamped permanence updates and the adapt-segment rule.
//! - **Events**: subscribers observe every structural change through the
//!   [`ConnectionsEventHandler`](events::ConnectionsEventHandler) hooks.
//!
//! ## Quick Start
//!
//! ```rust
//! use veles::prelude::*;
//!
//! let mut connections = Connections::new(1024);
//!
//! let segment = connections.create_segment(10, None);
//! connections.create_synapse(segment, 150, 0.85);
//! connections.create_synapse(segment, 151, 0.15);
//!
//! let len = connections.segment_flat_list_length();
//! let mut connected = vec![0u32; len];
//! let mut potential = vec![0u32; len];
//! connections.compute_activity(&mut connected, &mut potential, &[150, 151], 0.5);
//!
//! assert_eq!(connected[segment.flat_index()], 1);
//! assert_eq!(potential[segment.flat_index()], 2);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): snapshot save/load and the [`serialization`] helpers

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_possible_truncation)]

pub mod types;
pub mod events;
pub mod connections;
pub mod utils;

#[cfg(feature = "serde")]
pub mod serialization;

/// Re-export of commonly used types and traits for convenience.
pub mod prelude {
    pub use crate::types::{
        CellIdx, Permanence, Segment, SegmentIdx, Synapse, SynapseIdx,
        MAX_PERMANENCE, MIN_PERMANENCE, PERMANENCE_EPSILON,
    };
    pub use crate::connections::{Connections, SegmentData, SynapseData};
    pub use crate::events::{ConnectionsEventHandler, SubscriberToken};
    pub use crate::utils::Random;

    #[cfg(feature = "serde")]
    pub use crate::serialization::{Serializable, SerializableFormat};
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error types for the library.
pub mod error {
    use thiserror::Error;

    /// Main error type for veles operations.
    ///
    /// Precondition violations (stale handles, out-of-range cells,
    /// undersized buffers) are programmer errors and panic instead; only
    /// the snapshot codec and serialization helpers surface errors.
    #[derive(Error, Debug)]
    pub enum VelesError {
        /// Invalid parameter value.
        #[error("Invalid parameter '{name}': {message}")]
        InvalidParameter {
            /// Name of the invalid parameter.
            name: &'static str,
            /// Description of the error.
            message: String,
        },

        /// Serialization or deserialization failed, including malformed
        /// snapshots.
        #[error("Serialization error: {message}")]
        SerializationError {
            /// Description of the serialization error.
            message: String,
        },

        /// I/O error from a byte sink or source.
        #[error("I/O error: {message}")]
        IoError {
            /// Description of the I/O error.
            message: String,
        },
    }

    /// Result type alias using VelesError.
    pub type Result<T> = std::result::Result<T, VelesError>;
}

pub use error::{Result, VelesError};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
