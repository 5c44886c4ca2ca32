//! Monitor Manager
//!
//! Engine facade owned by the display loop. Validates, projects and
//! reconciles client layouts, binds compositor outputs to heads, and
//! answers the queries of the input path.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::compositor::{OutputControl, OutputError, OutputHandle};
use crate::config::{Config, MultiMonitorConfig, ScalingConfig};
use crate::input::coordinates::{ClientMapping, CoordinateMapper, LocalMapping};
use crate::multimon::head::{Head, HeadId, HeadRegistry, HeadSet, RegistryError};
use crate::multimon::layout::LayoutProjector;
use crate::multimon::scale::ScaleResolver;
use crate::multimon::topology::{Arrangement, TopologyError, TopologyValidator};
use crate::multimon::transaction::{ReconciliationTransaction, TransactionReport};
use crate::multimon::types::{MonitorLayoutMessage, Point, Rectangle, ResolvedMonitorMode, Size};

/// Layout processing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// Layout rejected by the validator
    #[error("Topology rejected: {0}")]
    Topology(#[from] TopologyError),

    /// Compositor output call failed
    #[error("Output control failed: {0}")]
    Output(#[from] OutputError),

    /// Head registry failure
    #[error("Head registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Invariant violated at commit
    #[error("Internal layout invariant violated: {0}")]
    Internal(String),

    /// Layout could not reach the display loop
    #[error("Layout not processed: {0}")]
    Unavailable(String),
}

impl LayoutError {
    /// True for errors that indicate a defect rather than bad input
    pub fn is_fatal_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

/// Acknowledgement of an applied layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutAck {
    /// Number of layouts applied so far, including this one
    pub generation: u64,
    /// Arrangement used for projection
    pub arrangement: Arrangement,
    /// DPI scaling was applied
    pub scaling_applied: bool,
    /// Union of all monitors in client space
    pub client_bounds: Rectangle,
    /// Union of all monitors in local space
    pub local_bounds: Rectangle,
    /// What the reconciliation did
    pub report: TransactionReport,
}

/// Output configuration for a newly bound output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    /// Mode width in client pixels
    pub width: u32,
    /// Mode height in client pixels
    pub height: u32,
    /// Integer output scale
    pub scale: u32,
}

/// Monitor manager coordinates multi-head reconciliation
pub struct MonitorManager {
    /// Multi-monitor configuration
    config: MultiMonitorConfig,

    resolver: ScaleResolver,
    validator: TopologyValidator,
    projector: LayoutProjector,

    /// Durable heads
    registry: HeadRegistry,

    /// Applied layout count
    generation: u64,
}

impl MonitorManager {
    /// Create a new monitor manager
    pub fn new(scaling: ScalingConfig, config: MultiMonitorConfig) -> Self {
        Self {
            validator: TopologyValidator::new(config.max_monitors),
            resolver: ScaleResolver::new(scaling),
            projector: LayoutProjector::new(),
            registry: HeadRegistry::new(),
            generation: 0,
            config,
        }
    }

    /// Create from the full configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.scaling, config.multimon)
    }

    /// Apply a client layout
    ///
    /// Runs one full transaction. On error the Active set is exactly what it
    /// was before the call.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Topology`] for rejected layouts; see
    /// [`ReconciliationTransaction::run`] for the rest.
    pub fn apply_layout(
        &mut self,
        message: &MonitorLayoutMessage,
        outputs: &mut dyn OutputControl,
    ) -> Result<LayoutAck, LayoutError> {
        let monitors = &message.monitors;
        debug!("Layout message with {} monitors", monitors.len());
        for (i, m) in monitors.iter().enumerate() {
            debug!(
                "  monitor[{}]: {} primary:{} desktopScale:{} deviceScale:{} physical:{}x{}mm {:?}",
                i,
                m.rect(),
                m.is_primary,
                m.attributes.desktop_scale_factor,
                m.attributes.device_scale_factor,
                m.attributes.physical_width,
                m.attributes.physical_height,
                m.attributes.orientation
            );
        }

        let topology = self.validator.analyze(monitors).map_err(|e| {
            warn!("Rejecting monitor layout: {}", e);
            e
        })?;

        let modes: Vec<ResolvedMonitorMode> =
            monitors.iter().map(|m| self.resolver.resolve(m)).collect();
        let projected = self.projector.project(&topology, &modes).map_err(|e| {
            warn!("Rejecting monitor layout: {}", e);
            e
        })?;

        let report = ReconciliationTransaction::begin(&mut self.registry, outputs)
            .run(&projected.modes)?;

        // Heads left unbound here are retried after the next layout
        if self.config.auto_realize_outputs {
            if let Err(e) = self.realize_outputs(outputs) {
                warn!("Failed to realize outputs: {}", e);
            }
        }

        self.generation += 1;
        info!(
            "Layout {} applied: {} monitors, {:?}, scaling {}, local {}",
            self.generation,
            projected.modes.len(),
            projected.arrangement,
            if projected.scaling_applied { "on" } else { "off" },
            self.registry.bounds().local()
        );

        Ok(LayoutAck {
            generation: self.generation,
            arrangement: projected.arrangement,
            scaling_applied: projected.scaling_applied,
            client_bounds: self.client_bounds(),
            local_bounds: self.local_bounds(),
            report,
        })
    }

    /// Create, configure, enable and bind outputs for every Active head
    /// that has none
    ///
    /// # Errors
    ///
    /// Returns the first compositor error. The output that failed setup is
    /// destroyed; outputs bound before it stay bound.
    pub fn realize_outputs(&mut self, outputs: &mut dyn OutputControl) -> Result<(), LayoutError> {
        let unbound: Vec<HeadId> = self
            .registry
            .active()
            .filter(|head| head.output().is_none())
            .map(|head| head.id())
            .collect();

        for id in unbound {
            let (name, mode) = match self.registry.get(id) {
                Some(head) => (head.name().to_string(), *head.mode()),
                None => continue,
            };

            let output = outputs.create_output(&name)?;
            if let Err(e) = self.configure_output(id, output, &mode, outputs) {
                if let Err(destroy_error) = outputs.destroy_output(output) {
                    warn!("Failed to destroy {} after setup error: {}", output, destroy_error);
                }
                return Err(e);
            }
        }

        Ok(())
    }

    fn configure_output(
        &mut self,
        id: HeadId,
        output: OutputHandle,
        mode: &ResolvedMonitorMode,
        outputs: &mut dyn OutputControl,
    ) -> Result<(), LayoutError> {
        outputs.set_scale(output, mode.output_scale)?;
        outputs.set_mode(output, mode.monitor.width, mode.monitor.height)?;
        outputs.set_physical_size(
            output,
            mode.monitor.attributes.physical_width,
            mode.monitor.attributes.physical_height,
        )?;
        outputs.enable(output)?;
        self.bind_output(id, output, outputs)
    }

    /// Record that `output` now drives `head` and move it to the head's
    /// local origin
    ///
    /// # Errors
    ///
    /// Fails when the head is unknown or not Active, when either side is
    /// already bound, or when the move is rejected.
    pub fn bind_output(
        &mut self,
        id: HeadId,
        output: OutputHandle,
        outputs: &mut dyn OutputControl,
    ) -> Result<(), LayoutError> {
        if let Some(owner) = self.registry.iter().find(|head| head.output() == Some(output)) {
            return Err(RegistryError::OutputAlreadyBound {
                output,
                head: owner.id(),
            }
            .into());
        }

        let head = self.registry.get_mut(id)?;
        if head.set() != HeadSet::Active {
            return Err(RegistryError::UnknownHead(id).into());
        }
        if let Some(current) = head.output() {
            return Err(RegistryError::HeadAlreadyBound { head: id, output: current }.into());
        }

        let origin = head.local_region().origin();
        outputs.move_output(output, origin.x, origin.y)?;
        head.bind(output);
        head.record_position(origin);

        debug!("Bound {} to head {} at {}", output, head.name(), head.local_region());
        Ok(())
    }

    /// Mode and scale the compositor should configure for `output`
    pub fn output_config(&self, output: OutputHandle) -> Option<OutputConfig> {
        self.registry.find_by_output(output).map(|head| OutputConfig {
            width: head.mode().monitor.width,
            height: head.mode().monitor.height,
            scale: head.mode().output_scale,
        })
    }

    /// Physical size (mm) of a head
    pub fn physical_size(&self, id: HeadId) -> Option<Size> {
        self.registry.get(id).map(|head| {
            let attributes = head.mode().monitor.attributes;
            Size::new(attributes.physical_width, attributes.physical_height)
        })
    }

    /// Coordinate mapper over the Active heads
    pub fn mapper(&self) -> CoordinateMapper<'_> {
        CoordinateMapper::new(&self.registry)
    }

    /// Map a client point into local space
    pub fn to_local(&self, point: Point, size: Option<Size>) -> Option<LocalMapping> {
        self.mapper().to_local(point, size)
    }

    /// Map a local point on `output` into client space
    pub fn to_client(
        &self,
        point: Point,
        output: OutputHandle,
        size: Option<Size>,
    ) -> Option<ClientMapping> {
        self.mapper().to_client(point, output, size)
    }

    /// Output bound to the primary head
    pub fn primary_output(&self) -> Option<OutputHandle> {
        self.registry.primary().and_then(Head::output)
    }

    /// Client size of the primary monitor
    pub fn primary_size(&self) -> Option<Size> {
        self.registry.primary().map(|head| head.client_region().size())
    }

    /// Union of all monitors in client space
    pub fn client_bounds(&self) -> Rectangle {
        self.registry.bounds().client()
    }

    /// Union of all monitors in local space
    pub fn local_bounds(&self) -> Rectangle {
        self.registry.bounds().local()
    }

    /// Clamp a client point into the client bounds
    pub fn clamp_to_client_bounds(&self, point: Point) -> Point {
        let bounds = self.client_bounds();
        if bounds.is_empty() {
            return point;
        }

        let max_x = (bounds.right() - 1) as i32;
        let max_y = (bounds.bottom() - 1) as i32;
        Point::new(point.x.clamp(bounds.x, max_x), point.y.clamp(bounds.y, max_y))
    }

    /// Active heads in index order
    pub fn heads(&self) -> impl Iterator<Item = &Head> {
        self.registry.active()
    }

    /// Head by id
    pub fn head(&self, id: HeadId) -> Option<&Head> {
        self.registry.get(id)
    }

    /// Underlying registry
    pub fn registry(&self) -> &HeadRegistry {
        &self.registry
    }

    /// Applied layout count
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Destroy every head and its bound output
    pub fn shutdown(&mut self, outputs: &mut dyn OutputControl) {
        for mut head in self.registry.drain() {
            if let Some(output) = head.unbind() {
                if let Err(e) = outputs.destroy_output(output) {
                    warn!("Failed to destroy {} of head {}: {}", output, head.name(), e);
                }
            }
        }
        info!("Monitor manager shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::{OutputCall, VirtualOutputs};
    use crate::multimon::types::MonitorDescriptor;

    /// In-memory outputs whose mode changes always fail
    #[derive(Default)]
    struct ModeRejectingOutputs {
        inner: VirtualOutputs,
    }

    impl OutputControl for ModeRejectingOutputs {
        fn create_output(&mut self, name: &str) -> Result<OutputHandle, OutputError> {
            self.inner.create_output(name)
        }

        fn enable(&mut self, output: OutputHandle) -> Result<(), OutputError> {
            self.inner.enable(output)
        }

        fn disable(&mut self, output: OutputHandle) -> Result<(), OutputError> {
            self.inner.disable(output)
        }

        fn set_scale(&mut self, output: OutputHandle, scale: u32) -> Result<(), OutputError> {
            self.inner.set_scale(output, scale)
        }

        fn set_mode(&mut self, output: OutputHandle, _: u32, _: u32) -> Result<(), OutputError> {
            Err(OutputError::Rejected {
                output,
                operation: "set_mode",
                reason: "mode not supported".to_string(),
            })
        }

        fn set_physical_size(
            &mut self,
            output: OutputHandle,
            width_mm: u32,
            height_mm: u32,
        ) -> Result<(), OutputError> {
            self.inner.set_physical_size(output, width_mm, height_mm)
        }

        fn move_output(&mut self, output: OutputHandle, x: i32, y: i32) -> Result<(), OutputError> {
            self.inner.move_output(output, x, y)
        }

        fn destroy_output(&mut self, output: OutputHandle) -> Result<(), OutputError> {
            self.inner.destroy_output(output)
        }
    }

    fn manager() -> MonitorManager {
        MonitorManager::new(ScalingConfig::default(), MultiMonitorConfig::default())
    }

    fn dual() -> MonitorLayoutMessage {
        MonitorLayoutMessage::new(vec![
            MonitorDescriptor::new(0, 0, 1920, 1080, true).with_physical_size(530, 300),
            MonitorDescriptor::new(1920, 0, 1280, 1024, false),
        ])
    }

    #[test]
    fn test_apply_layout_realizes_outputs() {
        let mut manager = manager();
        let mut outputs = VirtualOutputs::new();

        let ack = manager.apply_layout(&dual(), &mut outputs).unwrap();

        assert_eq!(ack.generation, 1);
        assert_eq!(ack.arrangement, Arrangement::Horizontal);
        assert_eq!(outputs.len(), 2);

        let secondary = manager.heads().nth(1).unwrap();
        let state = outputs.output(secondary.output().unwrap()).unwrap();
        assert!(state.enabled);
        assert_eq!(state.name, "rdp-1");
        assert_eq!(state.position, Point::new(1920, 0));
        assert_eq!(state.mode, Size::new(1280, 1024));
    }

    #[test]
    fn test_rejected_layout_keeps_state() {
        let mut manager = manager();
        let mut outputs = VirtualOutputs::new();
        manager.apply_layout(&dual(), &mut outputs).unwrap();
        outputs.take_calls();

        let no_primary = MonitorLayoutMessage::new(vec![MonitorDescriptor::new(0, 0, 800, 600, false)]);
        let result = manager.apply_layout(&no_primary, &mut outputs);

        assert_eq!(
            result,
            Err(LayoutError::Topology(TopologyError::PrimaryCountInvalid(0)))
        );
        assert_eq!(manager.heads().count(), 2);
        assert_eq!(manager.generation(), 1);
        assert!(outputs.calls().is_empty());
    }

    #[test]
    fn test_output_config_and_physical_size() {
        let mut manager = manager();
        let mut outputs = VirtualOutputs::new();
        manager.apply_layout(&dual(), &mut outputs).unwrap();

        let primary = manager.primary_output().unwrap();
        assert_eq!(
            manager.output_config(primary),
            Some(OutputConfig {
                width: 1920,
                height: 1080,
                scale: 1,
            })
        );
        assert_eq!(manager.physical_size(HeadId(0)), Some(Size::new(530, 300)));
        assert_eq!(manager.primary_size(), Some(Size::new(1920, 1080)));
    }

    #[test]
    fn test_manual_binding_without_auto_realize() {
        let config = MultiMonitorConfig {
            auto_realize_outputs: false,
            ..Default::default()
        };
        let mut manager = MonitorManager::new(ScalingConfig::default(), config);
        let mut outputs = VirtualOutputs::new();

        manager.apply_layout(&dual(), &mut outputs).unwrap();
        assert!(outputs.is_empty());
        assert!(manager.primary_output().is_none());

        let output = outputs.create_output("rdp-1").unwrap();
        manager.bind_output(HeadId(1), output, &mut outputs).unwrap();

        assert_eq!(manager.head(HeadId(1)).unwrap().output(), Some(output));
        assert_eq!(outputs.output(output).unwrap().position, Point::new(1920, 0));
    }

    #[test]
    fn test_clamp_to_client_bounds() {
        let mut manager = manager();
        let mut outputs = VirtualOutputs::new();
        manager.apply_layout(&dual(), &mut outputs).unwrap();

        assert_eq!(manager.client_bounds(), Rectangle::new(0, 0, 3200, 1080));
        assert_eq!(
            manager.clamp_to_client_bounds(Point::new(5000, -10)),
            Point::new(3199, 0)
        );
        assert_eq!(
            manager.clamp_to_client_bounds(Point::new(100, 100)),
            Point::new(100, 100)
        );
    }

    #[test]
    fn test_shutdown_destroys_outputs() {
        let mut manager = manager();
        let mut outputs = VirtualOutputs::new();
        manager.apply_layout(&dual(), &mut outputs).unwrap();
        outputs.take_calls();

        manager.shutdown(&mut outputs);

        assert!(outputs.is_empty());
        assert_eq!(manager.heads().count(), 0);
        assert!(outputs
            .calls()
            .iter()
            .all(|call| matches!(call, OutputCall::Destroy(_))));
    }

    #[test]
    fn test_failed_output_setup_is_destroyed() {
        let mut manager = manager();
        let mut outputs = ModeRejectingOutputs::default();
        let single = MonitorLayoutMessage::new(vec![MonitorDescriptor::new(0, 0, 1920, 1080, true)]);

        for _ in 0..3 {
            manager.apply_layout(&single, &mut outputs).unwrap();
        }

        assert_eq!(manager.heads().count(), 1);
        assert!(manager.primary_output().is_none());
        assert!(outputs.inner.is_empty());
        let creates = outputs
            .inner
            .calls()
            .iter()
            .filter(|call| matches!(call, OutputCall::Create(_)))
            .count();
        let destroys = outputs
            .inner
            .calls()
            .iter()
            .filter(|call| matches!(call, OutputCall::Destroy(_)))
            .count();
        assert_eq!(creates, 3);
        assert_eq!(destroys, 3);
    }

    #[test]
    fn test_realized_output_gets_physical_size() {
        let mut manager = manager();
        let mut outputs = VirtualOutputs::new();
        manager.apply_layout(&dual(), &mut outputs).unwrap();

        let primary = manager.primary_output().unwrap();
        assert_eq!(outputs.output(primary).unwrap().physical_size, Size::new(530, 300));
        assert!(outputs
            .calls()
            .contains(&OutputCall::SetPhysicalSize(primary, 530, 300)));
    }

    #[test]
    fn test_bind_output_rejects_double_binding() {
        let mut manager = manager();
        let mut outputs = VirtualOutputs::new();
        manager.apply_layout(&dual(), &mut outputs).unwrap();
        let primary = manager.primary_output().unwrap();
        let secondary = manager.head(HeadId(1)).unwrap().output().unwrap();
        outputs.take_calls();

        let spare = outputs.create_output("spare").unwrap();
        assert_eq!(
            manager.bind_output(HeadId(0), spare, &mut outputs),
            Err(LayoutError::Registry(RegistryError::HeadAlreadyBound {
                head: HeadId(0),
                output: primary,
            }))
        );
        assert_eq!(
            manager.bind_output(HeadId(1), primary, &mut outputs),
            Err(LayoutError::Registry(RegistryError::OutputAlreadyBound {
                output: primary,
                head: HeadId(0),
            }))
        );

        assert_eq!(manager.primary_output(), Some(primary));
        assert_eq!(manager.head(HeadId(1)).unwrap().output(), Some(secondary));
        assert_eq!(outputs.take_calls(), vec![OutputCall::Create(spare)]);
    }

    #[test]
    fn test_out_of_bounds_layout_rejected() {
        let mut manager = manager();
        let mut outputs = VirtualOutputs::new();
        let layout = MonitorLayoutMessage::new(vec![
            MonitorDescriptor::new(0, 0, 1920, 1080, true),
            MonitorDescriptor::new(i32::MIN, 0, 10, 10, false),
        ]);

        let result = manager.apply_layout(&layout, &mut outputs);

        assert!(matches!(
            result,
            Err(LayoutError::Topology(TopologyError::MonitorOutOfBounds { index: 1, .. }))
        ));
        assert_eq!(manager.heads().count(), 0);
        assert!(outputs.is_empty());
    }
}
