//! User-Friendly Error Formatting
//!
//! Provides user-friendly error messages with troubleshooting hints
//! for common error scenarios.

use std::fmt::Write;

use crate::multimon::manager::LayoutError;
use crate::multimon::topology::TopologyError;

/// Format error for user consumption
///
/// Takes technical error and produces user-friendly message with
/// troubleshooting steps and context.
pub fn format_user_error(error: &anyhow::Error) -> String {
    let mut output = String::new();

    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "╔════════════════════════════════════════════════════════════╗"
    )
    .ok();
    writeln!(
        &mut output,
        "║                     ERROR                                  ║"
    )
    .ok();
    writeln!(
        &mut output,
        "╚════════════════════════════════════════════════════════════╝"
    )
    .ok();
    writeln!(&mut output).ok();

    let error_msg = error.to_string();
    let layout_error = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<LayoutError>());

    match layout_error {
        Some(LayoutError::Topology(e)) => format_topology_error(&mut output, e),
        Some(LayoutError::Internal(reason)) => format_internal_error(&mut output, reason),
        Some(e) => format_generic_error(&mut output, &e.to_string()),
        None if error_msg.contains("config") => format_config_error(&mut output),
        None if error_msg.contains("layout file") => format_layout_file_error(&mut output),
        None => format_generic_error(&mut output, &error_msg),
    }

    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
    )
    .ok();
    writeln!(&mut output, "Technical Details:").ok();
    writeln!(&mut output).ok();
    writeln!(&mut output, "{:#}", error).ok();
    writeln!(&mut output).ok();

    writeln!(
        &mut output,
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
    )
    .ok();
    writeln!(&mut output, "Need Help?").ok();
    writeln!(
        &mut output,
        "  - Run with --verbose for detailed logs: lamco-rdp-multihead -vv"
    )
    .ok();
    writeln!(
        &mut output,
        "  - Dump the resulting heads with: lamco-rdp-multihead --dump"
    )
    .ok();
    writeln!(
        &mut output,
        "╚════════════════════════════════════════════════════════════╝"
    )
    .ok();

    output
}

fn format_topology_error(output: &mut String, error: &TopologyError) {
    writeln!(output, "Monitor Layout Rejected").ok();
    writeln!(output).ok();
    writeln!(output, "The client's monitor layout cannot be applied: {}", error).ok();
    writeln!(output, "The previous layout stays in effect.").ok();
    writeln!(output).ok();
    writeln!(output, "Requirements:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Exactly one monitor is marked primary").ok();
    writeln!(output, "  2. The primary monitor sits at (0, 0)").ok();
    writeln!(output, "  3. Between 1 and 16 monitors, each 1..=8192 pixels wide and high").ok();
    writeln!(output, "  4. Every monitor edge within 32766 pixels of (0, 0)").ok();
    writeln!(output, "  5. Monitors do not overlap").ok();
    writeln!(output).ok();
    writeln!(
        output,
        "Monitors that are not chained left-to-right or top-to-bottom are"
    )
    .ok();
    writeln!(output, "accepted, but DPI scaling is disabled for them.").ok();
}

fn format_internal_error(output: &mut String, reason: &str) {
    writeln!(output, "Internal Layout Error").ok();
    writeln!(output).ok();
    writeln!(
        output,
        "A layout passed validation but broke a head invariant at commit:"
    )
    .ok();
    writeln!(output, "  {}", reason).ok();
    writeln!(output).ok();
    writeln!(output, "This is a bug. Please report it with the layout that").ok();
    writeln!(output, "triggered it and a log captured with -vv.").ok();
}

fn format_config_error(output: &mut String) {
    writeln!(output, "Configuration Error").ok();
    writeln!(output).ok();
    writeln!(output, "Problem with configuration file.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Configuration file not found").ok();
    writeln!(
        output,
        "     → Specify: lamco-rdp-multihead -c /path/to/config.toml"
    )
    .ok();
    writeln!(output).ok();
    writeln!(output, "  2. Invalid TOML syntax").ok();
    writeln!(output, "     → Check for typos, missing quotes, etc.").ok();
    writeln!(output).ok();
    writeln!(output, "  3. Value out of range").ok();
    writeln!(output, "     → multimon.max_monitors must be 1..=16").ok();
    writeln!(
        output,
        "     → scaling.debug_desktop_scaling_factor must be 0 or 100..=500"
    )
    .ok();
}

fn format_layout_file_error(output: &mut String) {
    writeln!(output, "Layout File Error").ok();
    writeln!(output).ok();
    writeln!(output, "Could not read the monitor layouts to replay.").ok();
    writeln!(output).ok();
    writeln!(output, "Expected a JSON array of layout messages:").ok();
    writeln!(output).ok();
    writeln!(
        output,
        r#"  [{{"monitors": [{{"x": 0, "y": 0, "width": 1920, "height": 1080, "is_primary": true}}]}}]"#
    )
    .ok();
}

fn format_generic_error(output: &mut String, error: &str) {
    writeln!(output, "Error").ok();
    writeln!(output).ok();
    writeln!(output, "An error occurred while applying monitor layouts.").ok();
    writeln!(output).ok();
    writeln!(output, "Error: {}", error).ok();
}
