//! Head registry
//!
//! A head is the durable identity of one logical monitor. Heads live in an
//! index-ordered arena and carry a tag naming the set they currently belong
//! to. During a reconciliation a head only ever moves
//! `Active -> Pending -> MovePending -> Active`, or is removed from
//! `Pending`.

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::trace;

use crate::compositor::OutputHandle;
use crate::multimon::types::{LayoutBounds, Point, Rectangle, ResolvedMonitorMode};

/// Stable head index, assigned once at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeadId(pub u32);

impl fmt::Display for HeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Set membership of a head
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeadSet {
    /// Authoritative, visible to the compositor
    Active,
    /// Carried over from the previous layout, not yet matched
    Pending,
    /// Matched to a monitor of the new layout, awaiting commit
    MovePending,
}

impl HeadSet {
    /// Whether a head may move from `self` to `to`
    fn can_transition(self, to: HeadSet) -> bool {
        matches!(
            (self, to),
            (HeadSet::Active, HeadSet::Pending)
                | (HeadSet::Pending, HeadSet::MovePending)
                | (HeadSet::MovePending, HeadSet::Active)
        )
    }
}

/// Head registry errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No head index left to hand out
    #[error("Head index space exhausted")]
    IndexExhausted,

    /// Id does not name a live head
    #[error("Unknown head: {0}")]
    UnknownHead(HeadId),

    /// Set move that would go backwards
    #[error("Head {head}: invalid transition {from:?} -> {to:?}")]
    InvalidTransition {
        /// Head being moved
        head: HeadId,
        /// Current set
        from: HeadSet,
        /// Requested set
        to: HeadSet,
    },

    /// Head already drives an output
    #[error("Head {head} is already bound to {output}")]
    HeadAlreadyBound {
        /// Head being bound
        head: HeadId,
        /// Output it already drives
        output: OutputHandle,
    },

    /// Output already driven by a head
    #[error("{output} is already bound to head {head}")]
    OutputAlreadyBound {
        /// Output being bound
        output: OutputHandle,
        /// Head driving it
        head: HeadId,
    },
}

/// One logical monitor
#[derive(Debug, Clone, PartialEq)]
pub struct Head {
    id: HeadId,
    name: String,
    mode: ResolvedMonitorMode,
    client_region: Rectangle,
    local_region: Rectangle,
    output: Option<OutputHandle>,
    output_position: Option<Point>,
    set: HeadSet,
}

impl Head {
    fn new(id: HeadId, mode: ResolvedMonitorMode, set: HeadSet) -> Self {
        Self {
            id,
            name: format!("rdp-{:x}", id.0),
            mode,
            client_region: mode.client_rect(),
            local_region: mode.local_rect,
            output: None,
            output_position: None,
            set,
        }
    }

    /// Stable index
    pub fn id(&self) -> HeadId {
        self.id
    }

    /// Head name (`rdp-<hex index>`)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current resolved mode
    pub fn mode(&self) -> &ResolvedMonitorMode {
        &self.mode
    }

    /// Region in client space
    pub fn client_region(&self) -> Rectangle {
        self.client_region
    }

    /// Region in local space
    pub fn local_region(&self) -> Rectangle {
        self.local_region
    }

    /// Primary flag of the current mode
    pub fn is_primary(&self) -> bool {
        self.mode.monitor.is_primary
    }

    /// Bound compositor output, if any
    pub fn output(&self) -> Option<OutputHandle> {
        self.output
    }

    /// Last position pushed to the bound output
    pub fn output_position(&self) -> Option<Point> {
        self.output_position
    }

    /// Current set
    pub fn set(&self) -> HeadSet {
        self.set
    }

    pub(crate) fn apply_mode(&mut self, mode: ResolvedMonitorMode) {
        self.mode = mode;
        self.client_region = mode.client_rect();
        self.local_region = mode.local_rect;
    }

    pub(crate) fn bind(&mut self, output: OutputHandle) {
        self.output = Some(output);
        self.output_position = None;
    }

    pub(crate) fn unbind(&mut self) -> Option<OutputHandle> {
        self.output_position = None;
        self.output.take()
    }

    pub(crate) fn record_position(&mut self, position: Point) {
        self.output_position = Some(position);
    }
}

/// Arena of heads keyed by index
#[derive(Debug, Clone, Default)]
pub struct HeadRegistry {
    heads: BTreeMap<HeadId, Head>,
    next_index: u32,
    bounds: LayoutBounds,
}

impl HeadRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a transaction: every Active head becomes Pending and the
    /// accumulated bounds are cleared
    pub fn begin(&mut self) {
        for head in self.heads.values_mut() {
            debug_assert_eq!(head.set, HeadSet::Active);
            head.set = HeadSet::Pending;
        }
        self.bounds.clear();
    }

    /// Heads of one set, in ascending index order
    pub fn iter_set(&self, set: HeadSet) -> impl Iterator<Item = &Head> {
        self.heads.values().filter(move |head| head.set == set)
    }

    /// Active heads, in ascending index order
    pub fn active(&self) -> impl Iterator<Item = &Head> {
        self.iter_set(HeadSet::Active)
    }

    /// All heads, in ascending index order
    pub fn iter(&self) -> impl Iterator<Item = &Head> {
        self.heads.values()
    }

    /// First Pending head (lowest index) matching `pred`
    pub fn find_pending<F>(&self, pred: F) -> Option<HeadId>
    where
        F: Fn(&Head) -> bool,
    {
        self.iter_set(HeadSet::Pending)
            .find(|head| pred(head))
            .map(|head| head.id)
    }

    /// Move a head to another set
    pub fn transition(&mut self, id: HeadId, to: HeadSet) -> Result<(), RegistryError> {
        let head = self
            .heads
            .get_mut(&id)
            .ok_or(RegistryError::UnknownHead(id))?;

        if !head.set.can_transition(to) {
            return Err(RegistryError::InvalidTransition {
                head: id,
                from: head.set,
                to,
            });
        }

        trace!("head {}: {:?} -> {:?}", id, head.set, to);
        head.set = to;
        Ok(())
    }

    /// Create a new head directly in MovePending
    pub fn create(&mut self, mode: ResolvedMonitorMode) -> Result<HeadId, RegistryError> {
        let id = HeadId(self.next_index);
        self.next_index = self
            .next_index
            .checked_add(1)
            .ok_or(RegistryError::IndexExhausted)?;

        self.heads.insert(id, Head::new(id, mode, HeadSet::MovePending));
        Ok(id)
    }

    /// Remove a head
    pub fn remove(&mut self, id: HeadId) -> Result<Head, RegistryError> {
        self.heads.remove(&id).ok_or(RegistryError::UnknownHead(id))
    }

    /// Remove and return every Pending head
    pub fn drain_pending(&mut self) -> Vec<Head> {
        let ids: Vec<HeadId> = self.iter_set(HeadSet::Pending).map(|head| head.id).collect();
        ids.into_iter()
            .filter_map(|id| self.heads.remove(&id))
            .collect()
    }

    /// Remove and return every head
    pub fn drain(&mut self) -> Vec<Head> {
        self.bounds.clear();
        std::mem::take(&mut self.heads).into_values().collect()
    }

    /// Head by id
    pub fn get(&self, id: HeadId) -> Option<&Head> {
        self.heads.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: HeadId) -> Result<&mut Head, RegistryError> {
        self.heads.get_mut(&id).ok_or(RegistryError::UnknownHead(id))
    }

    /// Active head driving `output`
    pub fn find_by_output(&self, output: OutputHandle) -> Option<&Head> {
        self.active().find(|head| head.output == Some(output))
    }

    /// Active primary head
    pub fn primary(&self) -> Option<&Head> {
        self.active().find(|head| head.is_primary())
    }

    /// Accumulated bounds of the last transaction
    pub fn bounds(&self) -> &LayoutBounds {
        &self.bounds
    }

    pub(crate) fn bounds_mut(&mut self) -> &mut LayoutBounds {
        &mut self.bounds
    }

    /// Number of heads in a set
    pub fn count(&self, set: HeadSet) -> usize {
        self.iter_set(set).count()
    }

    /// Total number of heads
    pub fn len(&self) -> usize {
        self.heads.len()
    }

    /// True when the registry holds no heads
    pub fn is_empty(&self) -> bool {
        self.heads.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn set_next_index(&mut self, index: u32) {
        self.next_index = index;
    }
}
