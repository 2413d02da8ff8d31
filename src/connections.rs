//! Connections - the synaptic connectivity store.
//!
//! The Connections store represents the connectivity of a collection of
//! cells: per cell, dendritic segments; per segment, synapses to
//! presynaptic cells with a permanence strength. It is driven by HTM
//! learners (spatial pooling, temporal memory) through structural mutators
//! and queried by their inference step through the activity kernel.
//!
//! The store hands out generational handles: the slot part is a small dense
//! integer that doubles as a flat-list index, the generation part makes a
//! handle kept across its slot's destroy-and-reuse detectable. Forward
//! lists (segments of a cell, synapses of a segment) preserve creation
//! order; the reverse index (synapses sourced from a presynaptic cell) is
//! unordered and exists to make the activity kernel proportional to the
//! synapses the input actually touches.

use crate::events::{ConnectionsEventHandler, SubscriberToken};
use crate::types::{
    CellIdx, Permanence, Segment, SegmentIdx, Synapse, MAX_PERMANENCE, MIN_PERMANENCE,
    PERMANENCE_EPSILON,
};
use crate::utils::Random;

use ahash::{AHashMap, AHashSet};
use smallvec::SmallVec;

use std::fmt;

#[cfg(feature = "serde")]
use crate::error::{Result, VelesError};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "serde")]
use std::io::{BufReader, BufWriter, Read, Write};

/// Data associated with a synapse.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SynapseData {
    /// The presynaptic cell this synapse connects to.
    pub presynaptic_cell: CellIdx,

    /// The permanence strength of this synapse.
    pub permanence: Permanence,

    /// The segment this synapse belongs to.
    pub segment: Segment,

    pub(crate) destroyed: bool,
    pub(crate) generation: u32,
}

impl SynapseData {
    fn new(
        presynaptic_cell: CellIdx,
        permanence: Permanence,
        segment: Segment,
        generation: u32,
    ) -> Self {
        Self {
            presynaptic_cell,
            permanence,
            segment,
            destroyed: false,
            generation,
        }
    }
}

/// Data associated with a segment.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SegmentData {
    /// The synapses on this segment, in creation order.
    pub synapses: SmallVec<[Synapse; 32]>,

    /// The cell this segment belongs to.
    pub cell: CellIdx,

    pub(crate) destroyed: bool,
    pub(crate) generation: u32,
}

impl SegmentData {
    fn new(cell: CellIdx, generation: u32) -> Self {
        Self {
            synapses: SmallVec::new(),
            cell,
            destroyed: false,
            generation,
        }
    }
}

/// Data associated with a cell.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellData {
    /// The live segments on this cell, in creation order.
    pub segments: SmallVec<[Segment; 8]>,
}

/// The Connections store manages the synaptic connections between cells.
///
/// Constructed over a fixed universe of `num_cells` cells. Segments and
/// synapses are created and destroyed explicitly; destroying a segment
/// destroys its remaining synapses. Subscribed event handlers observe every
/// structural change after it has been applied to both the forward and
/// reverse indices.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Connections {
    /// All cells in the connections graph.
    cells: Vec<CellData>,

    /// All segment slots, including destroyed ones (indexed by slot).
    segments: Vec<SegmentData>,

    /// Destroyed segment slots (available for reuse).
    destroyed_segments: Vec<u32>,

    /// All synapse slots, including destroyed ones (indexed by slot).
    synapses: Vec<SynapseData>,

    /// Destroyed synapse slots (available for reuse).
    destroyed_synapses: Vec<u32>,

    /// Maps presynaptic cell -> synapses sourced from that cell.
    presynaptic_map: AHashMap<CellIdx, Vec<Synapse>>,

    /// Subscribed event handlers, in subscription order.
    #[cfg_attr(feature = "serde", serde(skip))]
    subscribers: Vec<(SubscriberToken, Box<dyn ConnectionsEventHandler>)>,

    #[cfg_attr(feature = "serde", serde(skip))]
    next_subscriber_token: u32,
}

impl Connections {
    /// Creates a new store over `num_cells` cells with no segments.
    pub fn new(num_cells: CellIdx) -> Self {
        Self {
            cells: vec![CellData::default(); num_cells as usize],
            segments: Vec::new(),
            destroyed_segments: Vec::new(),
            synapses: Vec::new(),
            destroyed_synapses: Vec::new(),
            presynaptic_map: AHashMap::new(),
            subscribers: Vec::new(),
            next_subscriber_token: 0,
        }
    }

    /// Returns the number of cells.
    #[inline]
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// Returns the number of live segments.
    pub fn num_segments(&self) -> usize {
        self.segments.len() - self.destroyed_segments.len()
    }

    /// Returns the number of live segments on a specific cell.
    pub fn num_segments_on_cell(&self, cell: CellIdx) -> usize {
        self.cells[cell as usize].segments.len()
    }

    /// Returns the number of live synapses.
    pub fn num_synapses(&self) -> usize {
        self.synapses.len() - self.destroyed_synapses.len()
    }

    /// Returns the number of live synapses on a specific segment.
    pub fn num_synapses_on_segment(&self, segment: Segment) -> usize {
        self.segment_data(segment).synapses.len()
    }

    /// Returns one past the largest segment slot ever issued.
    ///
    /// This is the required size of activity output buffers, and it never
    /// decreases: destroyed slots stay counted so that buffer sizes are
    /// stable across deletions and segments can be indexed by
    /// [`Segment::flat_index`] directly.
    pub fn segment_flat_list_length(&self) -> usize {
        self.segments.len()
    }

    /// Returns whether `segment` refers to a live segment.
    pub fn is_segment_live(&self, segment: Segment) -> bool {
        match self.segments.get(segment.slot as usize) {
            Some(data) => !data.destroyed && data.generation == segment.generation,
            None => false,
        }
    }

    /// Returns whether `synapse` refers to a live synapse.
    pub fn is_synapse_live(&self, synapse: Synapse) -> bool {
        match self.synapses.get(synapse.slot as usize) {
            Some(data) => !data.destroyed && data.generation == synapse.generation,
            None => false,
        }
    }

    // ========================================================================
    // Segment operations
    // ========================================================================

    /// Creates a new segment on the specified cell and returns its handle.
    ///
    /// When `max_segments_per_cell` is given and the cell is at its budget,
    /// the least-used segment on the cell (fewest synapses) is destroyed
    /// first, with full notification.
    pub fn create_segment(
        &mut self,
        cell: CellIdx,
        max_segments_per_cell: Option<SegmentIdx>,
    ) -> Segment {
        assert!(
            (cell as usize) < self.cells.len(),
            "cell {cell} out of range for {} cells",
            self.cells.len()
        );

        if let Some(max) = max_segments_per_cell {
            while self.cells[cell as usize].segments.len() >= max as usize {
                self.prune_segment(cell);
            }
        }

        let segment = if let Some(slot) = self.destroyed_segments.pop() {
            // Reincarnate the slot under a new generation; stale handles to
            // the previous occupant no longer match.
            let generation = self.segments[slot as usize].generation.wrapping_add(1);
            self.segments[slot as usize] = SegmentData::new(cell, generation);
            Segment { slot, generation }
        } else {
            let slot = self.segments.len() as u32;
            self.segments.push(SegmentData::new(cell, 0));
            Segment { slot, generation: 0 }
        };

        self.cells[cell as usize].segments.push(segment);
        self.notify(|handler| handler.on_create_segment(segment));
        segment
    }

    /// Destroys a segment and all of its remaining synapses.
    ///
    /// Each synapse destroy fires its own notification before the segment's
    /// `on_destroy_segment` fires.
    pub fn destroy_segment(&mut self, segment: Segment) {
        let data = self.segment_data(segment);
        let cell = data.cell;

        let synapses: Vec<Synapse> = data.synapses.iter().copied().collect();
        for synapse in synapses {
            self.destroy_synapse(synapse);
        }

        let cell_segments = &mut self.cells[cell as usize].segments;
        if let Some(pos) = cell_segments.iter().position(|&s| s == segment) {
            cell_segments.remove(pos);
        }

        let data = &mut self.segments[segment.slot as usize];
        data.destroyed = true;
        data.synapses = SmallVec::new();
        self.destroyed_segments.push(segment.slot);

        self.notify(|handler| handler.on_destroy_segment(segment));
    }

    /// Destroys the least-used segment on a cell.
    fn prune_segment(&mut self, cell: CellIdx) {
        let segments = &self.cells[cell as usize].segments;
        if segments.is_empty() {
            return;
        }

        let segment_to_prune = segments
            .iter()
            .copied()
            .min_by_key(|&s| self.segments[s.slot as usize].synapses.len())
            .unwrap();

        self.destroy_segment(segment_to_prune);
    }

    /// Gets the live segments of a cell, in creation order.
    #[inline]
    pub fn segments_for_cell(&self, cell: CellIdx) -> &[Segment] {
        &self.cells[cell as usize].segments
    }

    /// Gets the cell that owns a segment.
    #[inline]
    pub fn cell_for_segment(&self, segment: Segment) -> CellIdx {
        self.segment_data(segment).cell
    }

    /// Gets the segment data.
    #[inline]
    pub fn data_for_segment(&self, segment: Segment) -> &SegmentData {
        self.segment_data(segment)
    }

    /// Gets the segment at a specific position on a cell.
    #[inline]
    pub fn get_segment(&self, cell: CellIdx, idx: SegmentIdx) -> Segment {
        self.cells[cell as usize].segments[idx as usize]
    }

    /// Gets the position of a segment on its cell.
    pub fn idx_on_cell_for_segment(&self, segment: Segment) -> SegmentIdx {
        let cell = self.segment_data(segment).cell;
        self.cells[cell as usize]
            .segments
            .iter()
            .position(|&s| s == segment)
            .unwrap() as SegmentIdx
    }

    /// Orders two live segments by owning cell, then by position on the cell.
    pub fn compare_segments(&self, a: Segment, b: Segment) -> std::cmp::Ordering {
        let cell_a = self.segment_data(a).cell;
        let cell_b = self.segment_data(b).cell;

        cell_a.cmp(&cell_b).then_with(|| {
            let idx_a = self.idx_on_cell_for_segment(a);
            let idx_b = self.idx_on_cell_for_segment(b);
            idx_a.cmp(&idx_b)
        })
    }

    /// Maps each segment to its owning cell: `cells_out[i]` becomes the
    /// cell of `segments[i]`.
    ///
    /// All segments must be live and `cells_out` must have the same length
    /// as `segments`.
    pub fn map_segments_to_cells(&self, segments: &[Segment], cells_out: &mut [CellIdx]) {
        assert_eq!(
            segments.len(),
            cells_out.len(),
            "output buffer length must match the segment count"
        );
        for (&segment, out) in segments.iter().zip(cells_out.iter_mut()) {
            *out = self.segment_data(segment).cell;
        }
    }

    // ========================================================================
    // Synapse operations
    // ========================================================================

    /// Creates a new synapse on a segment and returns its handle.
    ///
    /// `permanence` is clamped to [0, 1]. A segment holds at most one
    /// synapse per presynaptic cell; creating a second one for the same
    /// source is a precondition violation.
    pub fn create_synapse(
        &mut self,
        segment: Segment,
        presynaptic_cell: CellIdx,
        permanence: Permanence,
    ) -> Synapse {
        assert!(
            (presynaptic_cell as usize) < self.cells.len(),
            "presynaptic cell {presynaptic_cell} out of range for {} cells",
            self.cells.len()
        );
        let segment_data = self.segment_data(segment);
        assert!(
            segment_data
                .synapses
                .iter()
                .all(|&y| self.synapses[y.slot as usize].presynaptic_cell != presynaptic_cell),
            "segment already has a synapse from presynaptic cell {presynaptic_cell}"
        );

        let permanence = permanence.clamp(MIN_PERMANENCE, MAX_PERMANENCE);

        let synapse = if let Some(slot) = self.destroyed_synapses.pop() {
            let generation = self.synapses[slot as usize].generation.wrapping_add(1);
            self.synapses[slot as usize] =
                SynapseData::new(presynaptic_cell, permanence, segment, generation);
            Synapse { slot, generation }
        } else {
            let slot = self.synapses.len() as u32;
            self.synapses
                .push(SynapseData::new(presynaptic_cell, permanence, segment, 0));
            Synapse { slot, generation: 0 }
        };

        self.segments[segment.slot as usize].synapses.push(synapse);
        self.presynaptic_map
            .entry(presynaptic_cell)
            .or_default()
            .push(synapse);

        self.notify(|handler| handler.on_create_synapse(synapse));
        synapse
    }

    /// Destroys a synapse, removing it from its segment and from its
    /// source's reverse bucket.
    ///
    /// Calling this for a synapse that was already destroyed (directly, or
    /// as a side effect of destroying its segment) is a no-op as long as the
    /// slot has not been reused; a reincarnated slot makes the handle stale
    /// and is a precondition violation.
    pub fn destroy_synapse(&mut self, synapse: Synapse) {
        let data = &self.synapses[synapse.slot as usize];
        assert!(
            data.generation == synapse.generation,
            "stale synapse handle: slot {} was reused",
            synapse.slot
        );
        if data.destroyed {
            return;
        }
        let segment = data.segment;
        let presynaptic_cell = data.presynaptic_cell;

        let segment_synapses = &mut self.segments[segment.slot as usize].synapses;
        if let Some(pos) = segment_synapses.iter().position(|&y| y == synapse) {
            segment_synapses.remove(pos);
        }

        self.remove_synapse_from_presynaptic_map(synapse, presynaptic_cell);

        self.synapses[synapse.slot as usize].destroyed = true;
        self.destroyed_synapses.push(synapse.slot);

        self.notify(|handler| handler.on_destroy_synapse(synapse));
    }

    /// Writes a synapse's permanence, clamped to [0, 1].
    ///
    /// Never inserts or removes edges, whatever thresholds the new value
    /// crosses; connectedness is decided per activity query.
    pub fn update_synapse_permanence(&mut self, synapse: Synapse, permanence: Permanence) {
        let permanence = permanence.clamp(MIN_PERMANENCE, MAX_PERMANENCE);
        self.synapse_data_mut(synapse).permanence = permanence;
        self.notify(|handler| handler.on_update_synapse_permanence(synapse, permanence));
    }

    /// Gets the live synapses of a segment, in creation order.
    #[inline]
    pub fn synapses_for_segment(&self, segment: Segment) -> &[Synapse] {
        &self.segment_data(segment).synapses
    }

    /// Gets the segment that owns a synapse.
    #[inline]
    pub fn segment_for_synapse(&self, synapse: Synapse) -> Segment {
        self.synapse_data(synapse).segment
    }

    /// Gets the synapse data.
    #[inline]
    pub fn data_for_synapse(&self, synapse: Synapse) -> &SynapseData {
        self.synapse_data(synapse)
    }

    /// Gets the presynaptic cells of a segment's synapses, in creation order.
    pub fn presynaptic_cells_for_segment(&self, segment: Segment) -> Vec<CellIdx> {
        self.segment_data(segment)
            .synapses
            .iter()
            .map(|&y| self.synapses[y.slot as usize].presynaptic_cell)
            .collect()
    }

    /// Gets all live synapses sourced from a presynaptic cell.
    ///
    /// Bucket order is unspecified; it is stable across a single read.
    pub fn synapses_for_presynaptic_cell(&self, cell: CellIdx) -> &[Synapse] {
        self.presynaptic_map
            .get(&cell)
            .map_or(&[][..], Vec::as_slice)
    }

    // ========================================================================
    // Activity computation
    // ========================================================================

    /// Tallies per-segment overlap with a sparse input.
    ///
    /// For each input cell, every synapse sourced from it bumps the
    /// potential count of its segment; synapses at or above
    /// `connected_permanence` also bump the connected count. Counts are
    /// accumulated by `Segment::flat_index` into the caller-owned,
    /// zero-initialized buffers, which must be at least
    /// [`segment_flat_list_length`](Self::segment_flat_list_length) long.
    ///
    /// Work is proportional to the reverse-index entries of the input cells,
    /// independent of the number of quiescent segments.
    pub fn compute_activity(
        &self,
        num_active_connected: &mut [u32],
        num_active_potential: &mut [u32],
        active_presynaptic_cells: &[CellIdx],
        connected_permanence: Permanence,
    ) {
        let flat_length = self.segments.len();
        assert!(
            num_active_connected.len() >= flat_length,
            "connected output buffer shorter than the segment flat list"
        );
        assert!(
            num_active_potential.len() >= flat_length,
            "potential output buffer shorter than the segment flat list"
        );

        for &cell in active_presynaptic_cells {
            debug_assert!((cell as usize) < self.cells.len());
            let Some(bucket) = self.presynaptic_map.get(&cell) else {
                continue;
            };
            for &synapse in bucket {
                let data = &self.synapses[synapse.slot as usize];
                let flat = data.segment.flat_index();
                num_active_potential[flat] += 1;
                if data.permanence >= connected_permanence {
                    num_active_connected[flat] += 1;
                }
            }
        }
    }

    // ========================================================================
    // Learning operations
    // ========================================================================

    /// Adapts a segment toward a sparse input.
    ///
    /// Synapses whose source is in `active_input` are incremented, the rest
    /// decremented, clamped to [0, 1]. One update notification fires per
    /// synapse on the segment. Synapses driven to zero stay in place.
    pub fn adapt_segment(
        &mut self,
        segment: Segment,
        active_input: &[CellIdx],
        increment: Permanence,
        decrement: Permanence,
    ) {
        let active: AHashSet<CellIdx> = active_input.iter().copied().collect();

        let synapses: Vec<Synapse> = self.segment_data(segment).synapses.iter().copied().collect();

        for synapse in synapses {
            let data = &self.synapses[synapse.slot as usize];
            let delta = if active.contains(&data.presynaptic_cell) {
                increment
            } else {
                -decrement
            };
            let new_permanence = (data.permanence + delta).clamp(MIN_PERMANENCE, MAX_PERMANENCE);
            self.update_synapse_permanence(synapse, new_permanence);
        }
    }

    /// Grows new synapses on a segment toward candidate presynaptic cells.
    ///
    /// Candidates that already project onto the segment are skipped. At most
    /// `max_new` synapses are grown, subsampled at random; when
    /// `max_synapses_per_segment` is given, minimum-permanence synapses are
    /// destroyed first to make room.
    pub fn grow_synapses(
        &mut self,
        segment: Segment,
        growth_candidates: &[CellIdx],
        initial_permanence: Permanence,
        rng: &mut Random,
        max_new: Option<usize>,
        max_synapses_per_segment: Option<usize>,
    ) {
        let existing: AHashSet<CellIdx> = self
            .segment_data(segment)
            .synapses
            .iter()
            .map(|&y| self.synapses[y.slot as usize].presynaptic_cell)
            .collect();

        let mut candidates: Vec<CellIdx> = growth_candidates
            .iter()
            .copied()
            .filter(|c| !existing.contains(c))
            .collect();

        if candidates.is_empty() {
            return;
        }

        let num_new = max_new
            .map(|m| m.min(candidates.len()))
            .unwrap_or(candidates.len());

        if num_new < candidates.len() {
            candidates = rng.sample(candidates, num_new);
        }

        if let Some(max) = max_synapses_per_segment {
            let current = self.segment_data(segment).synapses.len();
            if current + candidates.len() > max {
                let to_destroy = current + candidates.len() - max;
                self.destroy_min_permanence_synapses(segment, to_destroy, &[]);
            }
        }

        for candidate in candidates {
            self.create_synapse(segment, candidate, initial_permanence);
        }
    }

    /// Uniformly adjusts all permanences on a segment, clamped to [0, 1].
    pub fn bump_segment(&mut self, segment: Segment, delta: Permanence) {
        let synapses: Vec<Synapse> = self.segment_data(segment).synapses.iter().copied().collect();

        for synapse in synapses {
            let old_permanence = self.synapses[synapse.slot as usize].permanence;
            self.update_synapse_permanence(synapse, old_permanence + delta);
        }
    }

    /// Destroys up to `n_destroy` synapses with the lowest permanences,
    /// never touching synapses sourced from `exclude_cells`.
    pub fn destroy_min_permanence_synapses(
        &mut self,
        segment: Segment,
        n_destroy: usize,
        exclude_cells: &[CellIdx],
    ) {
        if n_destroy == 0 {
            return;
        }

        let exclude_set: AHashSet<CellIdx> = exclude_cells.iter().copied().collect();

        let mut candidates: Vec<(Synapse, Permanence)> = self
            .segment_data(segment)
            .synapses
            .iter()
            .filter_map(|&y| {
                let data = &self.synapses[y.slot as usize];
                if exclude_set.contains(&data.presynaptic_cell) {
                    None
                } else {
                    Some((y, data.permanence))
                }
            })
            .collect();

        candidates.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());

        for (synapse, _) in candidates.into_iter().take(n_destroy) {
            self.destroy_synapse(synapse);
        }
    }

    // ========================================================================
    // Event subscription
    // ========================================================================

    /// Registers an event handler, taking ownership of it.
    ///
    /// Handlers fire in subscription order. The returned token is the only
    /// way to refer to the subscription afterwards.
    pub fn subscribe(&mut self, handler: Box<dyn ConnectionsEventHandler>) -> SubscriberToken {
        let token = SubscriberToken(self.next_subscriber_token);
        self.next_subscriber_token += 1;
        self.subscribers.push((token, handler));
        token
    }

    /// Removes a subscription and drops its handler.
    ///
    /// Subsequent events do not reach the handler.
    pub fn unsubscribe(&mut self, token: SubscriberToken) {
        let pos = self
            .subscribers
            .iter()
            .position(|(t, _)| *t == token)
            .expect("unsubscribe with an unknown subscriber token");
        self.subscribers.remove(pos);
    }

    fn notify<F: FnMut(&mut dyn ConnectionsEventHandler)>(&mut self, mut event: F) {
        for (_, handler) in &mut self.subscribers {
            event(handler.as_mut());
        }
    }

    // ========================================================================
    // Internal record access
    // ========================================================================

    #[inline]
    fn segment_data(&self, segment: Segment) -> &SegmentData {
        let data = &self.segments[segment.slot as usize];
        assert!(
            !data.destroyed && data.generation == segment.generation,
            "destroyed or stale segment handle (slot {})",
            segment.slot
        );
        data
    }

    #[inline]
    fn synapse_data(&self, synapse: Synapse) -> &SynapseData {
        let data = &self.synapses[synapse.slot as usize];
        assert!(
            !data.destroyed && data.generation == synapse.generation,
            "destroyed or stale synapse handle (slot {})",
            synapse.slot
        );
        data
    }

    #[inline]
    fn synapse_data_mut(&mut self, synapse: Synapse) -> &mut SynapseData {
        let data = &mut self.synapses[synapse.slot as usize];
        assert!(
            !data.destroyed && data.generation == synapse.generation,
            "destroyed or stale synapse handle (slot {})",
            synapse.slot
        );
        data
    }

    fn remove_synapse_from_presynaptic_map(&mut self, synapse: Synapse, presynaptic_cell: CellIdx) {
        if let Some(bucket) = self.presynaptic_map.get_mut(&presynaptic_cell) {
            if let Some(pos) = bucket.iter().position(|&y| y == synapse) {
                // Bucket order is unobservable, so the cheap removal is fine.
                bucket.swap_remove(pos);
            }
        }
    }
}

// ============================================================================
// Snapshot codec
// ============================================================================

#[cfg(feature = "serde")]
impl Connections {
    /// Serializes the full observable state into `sink`.
    pub fn save<W: Write>(&self, sink: W) -> Result<()> {
        let mut writer = BufWriter::new(sink);
        bincode::serialize_into(&mut writer, self).map_err(|e| {
            VelesError::SerializationError {
                message: format!("snapshot save failed: {e}"),
            }
        })?;
        writer.flush().map_err(|e| VelesError::IoError {
            message: format!("snapshot sink flush failed: {e}"),
        })
    }

    /// Restores the state serialized by [`save`](Self::save) from `source`.
    ///
    /// Deserializes into a scratch instance and swaps it in only on
    /// success, so a failed load leaves the store unchanged. Registered
    /// subscribers survive a successful load.
    pub fn load<R: Read>(&mut self, source: R) -> Result<()> {
        let restored: Connections = bincode::deserialize_from(BufReader::new(source)).map_err(
            |e| VelesError::SerializationError {
                message: format!("snapshot load failed: {e}"),
            },
        )?;

        let subscribers = std::mem::take(&mut self.subscribers);
        let next_subscriber_token = self.next_subscriber_token;
        *self = restored;
        self.subscribers = subscribers;
        self.next_subscriber_token = next_subscriber_token;
        Ok(())
    }
}

// ============================================================================
// Equality and Debug
// ============================================================================

/// Structural equality over the live graph.
///
/// Two stores are equal iff they have the same cell count and, per cell,
/// the same segment lists whose segments carry the same synapse lists
/// (presynaptic cells exact, permanences within `PERMANENCE_EPSILON`).
/// Raw handle values, free-lists, and subscribers are not compared.
impl PartialEq for Connections {
    fn eq(&self, other: &Self) -> bool {
        if self.cells.len() != other.cells.len() {
            return false;
        }

        for cell in 0..self.cells.len() as CellIdx {
            let ours = self.segments_for_cell(cell);
            let theirs = other.segments_for_cell(cell);
            if ours.len() != theirs.len() {
                return false;
            }

            for (&segment_a, &segment_b) in ours.iter().zip(theirs) {
                let synapses_a = self.synapses_for_segment(segment_a);
                let synapses_b = other.synapses_for_segment(segment_b);
                if synapses_a.len() != synapses_b.len() {
                    return false;
                }

                for (&a, &b) in synapses_a.iter().zip(synapses_b) {
                    let data_a = self.data_for_synapse(a);
                    let data_b = other.data_for_synapse(b);
                    if data_a.presynaptic_cell != data_b.presynaptic_cell {
                        return false;
                    }
                    if (data_a.permanence - data_b.permanence).abs() > PERMANENCE_EPSILON {
                        return false;
                    }
                }
            }
        }
        true
    }
}

impl fmt::Debug for Connections {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connections")
            .field("num_cells", &self.num_cells())
            .field("num_segments", &self.num_segments())
            .field("num_synapses", &self.num_synapses())
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}
