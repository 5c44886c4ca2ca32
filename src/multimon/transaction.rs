//! Reconciliation Transaction
//!
//! Converges the registry's Active heads onto a newly projected layout:
//!
//! ```text
//! begin        Active -> Pending, bounds cleared
//! fast match   identical mode      Pending -> MovePending, no compositor call
//! best fit     (a) size + scale    Pending -> MovePending
//!              (b) client position Pending -> MovePending, flagged for update
//!              (c) first Pending   Pending -> MovePending, flagged for update
//!              none left           new head in MovePending
//! apply        scale/mode/physical size for flagged heads with an output
//! commit       MovePending -> Active (+ move), Pending destroyed
//! ```
//!
//! The registry is checkpointed at begin and restored when any step fails.

use tracing::{debug, error, trace, warn};

use crate::compositor::OutputControl;
use crate::multimon::head::{HeadId, HeadRegistry, HeadSet};
use crate::multimon::manager::LayoutError;
use crate::multimon::types::{Point, ResolvedMonitorMode};

/// Counters describing what a transaction did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionReport {
    /// Monitors matched by the identical-mode fast path
    pub fast_matched: usize,
    /// Monitors matched to an existing head by best fit
    pub reused: usize,
    /// Heads created for unmatched monitors
    pub created: Vec<HeadId>,
    /// Heads flagged for a scale/mode update
    pub updated: usize,
    /// Output move notifications issued at commit
    pub moved: usize,
    /// Stale heads destroyed at commit
    pub destroyed: usize,
}

impl TransactionReport {
    /// True when nothing but the fast path ran
    pub fn is_noop(&self) -> bool {
        self.reused == 0 && self.created.is_empty() && self.moved == 0 && self.destroyed == 0
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingUpdate {
    head: HeadId,
    previous_scale: u32,
}

/// One validate-project-reconcile-commit pass over a registry
pub struct ReconciliationTransaction<'a> {
    registry: &'a mut HeadRegistry,
    outputs: &'a mut dyn OutputControl,
    checkpoint: HeadRegistry,
    updates: Vec<PendingUpdate>,
    report: TransactionReport,
}

impl<'a> ReconciliationTransaction<'a> {
    /// Begin a transaction
    ///
    /// Snapshots the registry, then moves every Active head into Pending.
    pub fn begin(registry: &'a mut HeadRegistry, outputs: &'a mut dyn OutputControl) -> Self {
        let checkpoint = registry.clone();
        registry.begin();

        Self {
            registry,
            outputs,
            checkpoint,
            updates: Vec::new(),
            report: TransactionReport::default(),
        }
    }

    /// Reconcile against `modes` and commit, rolling back on failure
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Registry`] when a head cannot be created,
    /// [`LayoutError::Output`] when the compositor rejects a call, and
    /// [`LayoutError::Internal`] when the committed set would break the
    /// primary/overlap invariants.
    pub fn run(mut self, modes: &[ResolvedMonitorMode]) -> Result<TransactionReport, LayoutError> {
        match self.reconcile(modes) {
            Ok(()) => Ok(self.report),
            Err(e) => {
                self.rollback();
                Err(e)
            }
        }
    }

    fn reconcile(&mut self, modes: &[ResolvedMonitorMode]) -> Result<(), LayoutError> {
        let done = self.fast_match(modes)?;
        self.best_fit(modes, &done)?;
        self.apply_updates()?;
        self.commit()
    }

    /// Move heads whose stored mode is identical to a new monitor
    fn fast_match(&mut self, modes: &[ResolvedMonitorMode]) -> Result<Vec<bool>, LayoutError> {
        let mut done = vec![false; modes.len()];

        for (i, mode) in modes.iter().enumerate() {
            if let Some(id) = self.registry.find_pending(|head| head.mode() == mode) {
                self.registry.transition(id, HeadSet::MovePending)?;
                self.registry.bounds_mut().accumulate(mode);
                self.report.fast_matched += 1;
                done[i] = true;
                trace!("monitor[{}]: unchanged, head {}", i, id);
            }
        }

        Ok(done)
    }

    /// Match remaining monitors to Pending heads, creating heads when none
    /// are left
    fn best_fit(&mut self, modes: &[ResolvedMonitorMode], done: &[bool]) -> Result<(), LayoutError> {
        for (i, mode) in modes.iter().enumerate() {
            if done[i] {
                continue;
            }

            let primary = mode.monitor.is_primary;

            let size_match = self
                .registry
                .find_pending(|head| head.is_primary() == primary && head.mode().same_size_and_scale(mode));

            let (id, needs_update) = if let Some(id) = size_match {
                debug!("monitor[{}]: size and scale match head {}", i, id);
                (id, false)
            } else if let Some(id) = self
                .registry
                .find_pending(|head| head.is_primary() == primary && head.mode().same_client_position(mode))
            {
                debug!("monitor[{}]: position match head {}", i, id);
                (id, true)
            } else if let Some(id) = self.registry.find_pending(|_| true) {
                debug!("monitor[{}]: reusing head {}", i, id);
                (id, true)
            } else {
                let id = self.registry.create(*mode)?;
                debug!("monitor[{}]: created head {}", i, id);
                self.registry.bounds_mut().accumulate(mode);
                self.report.created.push(id);
                continue;
            };

            self.registry.transition(id, HeadSet::MovePending)?;
            let head = self.registry.get_mut(id)?;
            let previous_scale = head.mode().output_scale;
            head.apply_mode(*mode);
            self.registry.bounds_mut().accumulate(mode);
            self.report.reused += 1;

            if needs_update {
                self.updates.push(PendingUpdate {
                    head: id,
                    previous_scale,
                });
            }
        }

        Ok(())
    }

    /// Push scale, mode and physical size to bound outputs of flagged heads
    fn apply_updates(&mut self) -> Result<(), LayoutError> {
        for update in std::mem::take(&mut self.updates) {
            let head = self.registry.get_mut(update.head)?;
            let mode = *head.mode();

            let Some(output) = head.output() else {
                debug!("head {}: no output bound, deferring mode update", update.head);
                continue;
            };

            if update.previous_scale != mode.output_scale {
                self.outputs.disable(output)?;
                self.outputs.set_scale(output, mode.output_scale)?;
                self.outputs.enable(output)?;
            }

            self.outputs
                .set_mode(output, mode.monitor.width, mode.monitor.height)?;
            self.outputs.set_physical_size(
                output,
                mode.monitor.attributes.physical_width,
                mode.monitor.attributes.physical_height,
            )?;

            self.report.updated += 1;
        }

        Ok(())
    }

    /// Check the new set, promote it to Active, and destroy stale heads
    fn commit(&mut self) -> Result<(), LayoutError> {
        self.check_invariants()?;

        let ids: Vec<HeadId> = self
            .registry
            .iter_set(HeadSet::MovePending)
            .map(|head| head.id())
            .collect();

        for id in ids {
            self.registry.transition(id, HeadSet::Active)?;

            let head = self.registry.get_mut(id)?;
            let origin = head.local_region().origin();
            if let Some(output) = head.output() {
                if head.output_position() != Some(origin) {
                    self.outputs.move_output(output, origin.x, origin.y)?;
                    head.record_position(origin);
                    self.report.moved += 1;
                }
            }
        }

        for head in self.registry.drain_pending() {
            debug!("Destroying head {} ({})", head.id(), head.name());
            if let Some(output) = head.output() {
                if let Err(e) = self.outputs.destroy_output(output) {
                    warn!("Failed to destroy {} of head {}: {}", output, head.id(), e);
                }
            }
            self.report.destroyed += 1;
        }

        Ok(())
    }

    fn check_invariants(&self) -> Result<(), LayoutError> {
        let heads: Vec<_> = self.registry.iter_set(HeadSet::MovePending).collect();

        let violation = if heads.is_empty() {
            Some("no heads to commit".to_string())
        } else {
            let primaries: Vec<_> = heads.iter().filter(|head| head.is_primary()).collect();
            if primaries.len() != 1 {
                Some(format!("{} primary heads", primaries.len()))
            } else if primaries[0].client_region().origin() != Point::default() {
                Some(format!(
                    "primary head {} at {}",
                    primaries[0].id(),
                    primaries[0].client_region()
                ))
            } else {
                heads.iter().enumerate().find_map(|(i, a)| {
                    heads[i + 1..]
                        .iter()
                        .find(|b| a.client_region().intersects(&b.client_region()))
                        .map(|b| format!("heads {} and {} overlap", a.id(), b.id()))
                })
            }
        };

        match violation {
            Some(reason) => {
                error!("Layout invariant violated at commit: {}", reason);
                Err(LayoutError::Internal(reason))
            }
            None => Ok(()),
        }
    }

    fn rollback(&mut self) {
        warn!("Rolling back layout transaction");
        *self.registry = std::mem::take(&mut self.checkpoint);
    }
}
