//! Scale Resolution
//!
//! Derives the integer output scale and the fractional client scale of
//! each monitor from the server scaling configuration and the monitor's
//! DPI attributes.

use crate::config::ScalingConfig;
use crate::multimon::types::{MonitorDescriptor, Rectangle, ResolvedMonitorMode};

/// Resolves per-monitor scale factors
#[derive(Debug, Clone, Copy, Default)]
pub struct ScaleResolver {
    config: ScalingConfig,
}

impl ScaleResolver {
    /// Create a resolver for the given scaling configuration
    pub fn new(config: ScalingConfig) -> Self {
        Self { config }
    }

    /// Scaling configuration in use
    pub fn config(&self) -> &ScalingConfig {
        &self.config
    }

    /// Fractional scale between client and local space
    pub fn client_scale(&self, monitor: &MonitorDescriptor) -> f64 {
        if !self.config.enable_hi_dpi_support {
            return 1.0;
        }

        if self.config.debug_desktop_scaling_factor != 0 {
            return f64::from(self.config.debug_desktop_scaling_factor) / 100.0;
        }

        let desktop_scale = monitor.attributes.effective_desktop_scale_factor();
        if self.config.enable_fractional_hi_dpi_support {
            f64::from(desktop_scale) / 100.0
        } else if self.config.enable_fractional_hi_dpi_roundup {
            f64::from((desktop_scale + 50) / 100)
        } else {
            f64::from(desktop_scale / 100)
        }
    }

    /// Integer output scale: the client scale truncated, never below 1
    pub fn output_scale(&self, monitor: &MonitorDescriptor) -> u32 {
        (self.client_scale(monitor).trunc() as u32).max(1)
    }

    /// Resolve both scales; the local rectangle is filled in by projection
    pub fn resolve(&self, monitor: &MonitorDescriptor) -> ResolvedMonitorMode {
        ResolvedMonitorMode {
            monitor: *monitor,
            output_scale: self.output_scale(monitor),
            client_scale: self.client_scale(monitor),
            local_rect: Rectangle::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor(desktop_scale: u32) -> MonitorDescriptor {
        MonitorDescriptor::new(0, 0, 3840, 2160, true).with_desktop_scale(desktop_scale)
    }

    #[test]
    fn test_integer_truncation_default() {
        let resolver = ScaleResolver::new(ScalingConfig::default());

        assert_eq!(resolver.client_scale(&monitor(100)), 1.0);
        assert_eq!(resolver.client_scale(&monitor(150)), 1.0);
        assert_eq!(resolver.client_scale(&monitor(200)), 2.0);
        assert_eq!(resolver.client_scale(&monitor(250)), 2.0);
        assert_eq!(resolver.output_scale(&monitor(250)), 2);
    }

    #[test]
    fn test_fractional_support() {
        let resolver = ScaleResolver::new(ScalingConfig {
            enable_fractional_hi_dpi_support: true,
            ..Default::default()
        });

        assert_eq!(resolver.client_scale(&monitor(150)), 1.5);
        assert_eq!(resolver.output_scale(&monitor(150)), 1);
        assert_eq!(resolver.client_scale(&monitor(175)), 1.75);
        assert_eq!(resolver.output_scale(&monitor(250)), 2);
    }

    #[test]
    fn test_roundup() {
        let resolver = ScaleResolver::new(ScalingConfig {
            enable_fractional_hi_dpi_roundup: true,
            ..Default::default()
        });

        assert_eq!(resolver.client_scale(&monitor(140)), 1.0);
        assert_eq!(resolver.client_scale(&monitor(150)), 2.0);
        assert_eq!(resolver.client_scale(&monitor(249)), 2.0);
        assert_eq!(resolver.client_scale(&monitor(250)), 3.0);
    }

    #[test]
    fn test_fractional_takes_priority_over_roundup() {
        let resolver = ScaleResolver::new(ScalingConfig {
            enable_fractional_hi_dpi_support: true,
            enable_fractional_hi_dpi_roundup: true,
            ..Default::default()
        });

        assert_eq!(resolver.client_scale(&monitor(150)), 1.5);
    }

    #[test]
    fn test_debug_override_applies_to_every_monitor() {
        let resolver = ScaleResolver::new(ScalingConfig {
            debug_desktop_scaling_factor: 200,
            enable_fractional_hi_dpi_support: true,
            ..Default::default()
        });

        assert_eq!(resolver.client_scale(&monitor(100)), 2.0);
        assert_eq!(resolver.client_scale(&monitor(300)), 2.0);
        assert_eq!(resolver.output_scale(&monitor(300)), 2);
    }

    #[test]
    fn test_hi_dpi_disabled_wins() {
        let resolver = ScaleResolver::new(ScalingConfig {
            enable_hi_dpi_support: false,
            debug_desktop_scaling_factor: 200,
            enable_fractional_hi_dpi_support: true,
            ..Default::default()
        });

        assert_eq!(resolver.client_scale(&monitor(300)), 1.0);
        assert_eq!(resolver.output_scale(&monitor(300)), 1);
    }

    #[test]
    fn test_out_of_range_scale_factor_is_ignored() {
        let resolver = ScaleResolver::new(ScalingConfig {
            enable_fractional_hi_dpi_support: true,
            ..Default::default()
        });

        assert_eq!(resolver.client_scale(&monitor(0)), 1.0);
        assert_eq!(resolver.output_scale(&monitor(0)), 1);
        assert_eq!(resolver.client_scale(&monitor(1000)), 1.0);
    }

    #[test]
    fn test_resolve_keeps_descriptor() {
        let resolver = ScaleResolver::new(ScalingConfig::default());
        let m = monitor(200);
        let mode = resolver.resolve(&m);

        assert_eq!(mode.monitor, m);
        assert_eq!(mode.output_scale, 2);
        assert_eq!(mode.client_scale, 2.0);
        assert_eq!(mode.local_rect, Rectangle::default());
    }
}
