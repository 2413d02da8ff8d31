//! Structural event subscription.
//!
//! Higher-level learners observe structural changes to a
//! [`Connections`](crate::connections::Connections) store by subscribing a
//! handler. The store owns the handler for the lifetime of the subscription
//! and drops it on unsubscribe. Hooks fire after the change they describe
//! has been applied to both the forward and reverse indices, in
//! subscription order.

use crate::types::{Permanence, Segment, Synapse};

/// Hooks invoked by the store on every structural change.
///
/// All hooks default to no-ops; implement only the ones of interest. A
/// handler receives event payloads only, never the store itself, so it
/// observes the post-mutation state through whatever access its owner
/// arranges, not by reentrant calls.
pub trait ConnectionsEventHandler {
    /// A segment was created.
    fn on_create_segment(&mut self, _segment: Segment) {}

    /// A segment was destroyed, after all of its remaining synapses.
    fn on_destroy_segment(&mut self, _segment: Segment) {}

    /// A synapse was created.
    fn on_create_synapse(&mut self, _synapse: Synapse) {}

    /// A synapse was destroyed.
    fn on_destroy_synapse(&mut self, _synapse: Synapse) {}

    /// A synapse permanence was written, clamped value included.
    fn on_update_synapse_permanence(&mut self, _synapse: Synapse, _permanence: Permanence) {}
}

/// Opaque token returned by `subscribe`, accepted by `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberToken(pub(crate) u32);
