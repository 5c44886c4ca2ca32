//! Head Diagnostics
//!
//! Human-readable dumps of the monitor manager state.

use std::fmt::Write;
use tracing::info;

use crate::multimon::manager::MonitorManager;

/// Format every Active head, one block per head
pub fn format_head_dump(manager: &MonitorManager) -> String {
    let mut output = String::new();

    writeln!(
        output,
        "Heads: {} (generation {})",
        manager.heads().count(),
        manager.generation()
    )
    .ok();
    writeln!(output, "  client bounds: {}", manager.client_bounds()).ok();
    writeln!(output, "  local bounds:  {}", manager.local_bounds()).ok();

    for head in manager.heads() {
        let mode = head.mode();
        let attributes = mode.monitor.attributes;
        writeln!(
            output,
            "  {} (index {}){}",
            head.name(),
            head.id(),
            if head.is_primary() { " primary" } else { "" }
        )
        .ok();
        writeln!(output, "    client: {}", head.client_region()).ok();
        writeln!(output, "    local:  {}", head.local_region()).ok();
        writeln!(
            output,
            "    physical: {}x{}mm, orientation {}",
            attributes.physical_width,
            attributes.physical_height,
            attributes.orientation.degrees()
        )
        .ok();
        writeln!(
            output,
            "    desktopScale:{} deviceScale:{} scale:{} clientScale:{:.2}",
            attributes.desktop_scale_factor,
            attributes.device_scale_factor,
            mode.output_scale,
            mode.client_scale
        )
        .ok();
        match head.output() {
            Some(output_handle) => writeln!(output, "    output: {}", output_handle).ok(),
            None => writeln!(output, "    output: unbound").ok(),
        };
    }

    output
}

/// Log the head dump at info level
pub fn log_head_dump(manager: &MonitorManager) {
    for line in format_head_dump(manager).lines() {
        info!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::VirtualOutputs;
    use crate::config::{MultiMonitorConfig, ScalingConfig};
    use crate::multimon::types::{MonitorDescriptor, MonitorLayoutMessage};

    #[test]
    fn test_head_dump_lists_heads() {
        let mut manager = MonitorManager::new(ScalingConfig::default(), MultiMonitorConfig::default());
        let mut outputs = VirtualOutputs::new();
        manager
            .apply_layout(
                &MonitorLayoutMessage::new(vec![
                    MonitorDescriptor::new(0, 0, 1920, 1080, true).with_physical_size(600, 340),
                    MonitorDescriptor::new(1920, 0, 1920, 1080, false),
                ]),
                &mut outputs,
            )
            .unwrap();

        let dump = format_head_dump(&manager);

        assert!(dump.starts_with("Heads: 2 (generation 1)"));
        assert!(dump.contains("rdp-0 (index 0) primary"));
        assert!(dump.contains("rdp-1 (index 1)\n"));
        assert!(dump.contains("physical: 600x340mm"));
        assert!(dump.contains("client: (1920,0) 1920x1080"));
        assert!(!dump.contains("unbound"));
    }

    #[test]
    fn test_empty_dump() {
        let manager = MonitorManager::new(ScalingConfig::default(), MultiMonitorConfig::default());
        let dump = format_head_dump(&manager);
        assert!(dump.starts_with("Heads: 0 (generation 0)"));
    }
}
