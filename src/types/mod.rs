//! Core types for the connectivity store.
//!
//! This module contains the primitive type aliases and the generational
//! segment/synapse handle types shared by the whole crate.

mod primitives;

pub use primitives::*;
