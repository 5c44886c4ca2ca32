//! Reconciliation integration tests
//!
//! Drives the monitor manager end to end against in-memory outputs.

use lamco_rdp_multihead::compositor::{OutputCall, VirtualOutputs};
use lamco_rdp_multihead::config::{MultiMonitorConfig, ScalingConfig};
use lamco_rdp_multihead::multimon::{
    Arrangement, HeadId, LayoutError, MonitorDescriptor, MonitorLayoutMessage, MonitorManager,
    Point, Rectangle, TopologyError,
};
use proptest::prelude::*;

fn manager() -> MonitorManager {
    MonitorManager::new(ScalingConfig::default(), MultiMonitorConfig::default())
}

fn fractional_manager() -> MonitorManager {
    MonitorManager::new(
        ScalingConfig {
            enable_fractional_hi_dpi_support: true,
            ..Default::default()
        },
        MultiMonitorConfig::default(),
    )
}

fn triple() -> MonitorLayoutMessage {
    MonitorLayoutMessage::new(vec![
        MonitorDescriptor::new(0, 0, 1920, 1080, true),
        MonitorDescriptor::new(1920, 0, 1920, 1080, false),
        MonitorDescriptor::new(3840, 0, 1920, 1080, false),
    ])
}

fn active_snapshot(manager: &MonitorManager) -> Vec<(HeadId, Rectangle, Rectangle)> {
    manager
        .heads()
        .map(|head| (head.id(), head.client_region(), head.local_region()))
        .collect()
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_single_primary_at_origin() {
    for (width, height) in [(640, 480), (1920, 1080), (3840, 2160), (1, 1)] {
        let mut manager = manager();
        let mut outputs = VirtualOutputs::new();
        let layout = MonitorLayoutMessage::new(vec![MonitorDescriptor::new(0, 0, width, height, true)]);

        manager.apply_layout(&layout, &mut outputs).unwrap();

        let heads: Vec<_> = manager.heads().collect();
        assert_eq!(heads.len(), 1);
        assert!(heads[0].is_primary());
        assert_eq!(heads[0].local_region().origin(), Point::new(0, 0));
    }
}

#[test]
fn test_primary_count_rejected_without_side_effects() {
    let mut manager = manager();
    let mut outputs = VirtualOutputs::new();
    manager.apply_layout(&triple(), &mut outputs).unwrap();
    let before = active_snapshot(&manager);
    outputs.take_calls();

    let none = MonitorLayoutMessage::new(vec![
        MonitorDescriptor::new(0, 0, 1920, 1080, false),
        MonitorDescriptor::new(1920, 0, 1920, 1080, false),
    ]);
    let two = MonitorLayoutMessage::new(vec![
        MonitorDescriptor::new(0, 0, 1920, 1080, true),
        MonitorDescriptor::new(1920, 0, 1920, 1080, true),
    ]);

    assert_eq!(
        manager.apply_layout(&none, &mut outputs),
        Err(LayoutError::Topology(TopologyError::PrimaryCountInvalid(0)))
    );
    assert_eq!(
        manager.apply_layout(&two, &mut outputs),
        Err(LayoutError::Topology(TopologyError::PrimaryCountInvalid(2)))
    );

    assert_eq!(active_snapshot(&manager), before);
    assert!(outputs.calls().is_empty());
    assert_eq!(manager.generation(), 1);
}

#[test]
fn test_primary_off_origin_rejected() {
    let mut manager = manager();
    let mut outputs = VirtualOutputs::new();
    let layout = MonitorLayoutMessage::new(vec![MonitorDescriptor::new(10, 0, 1920, 1080, true)]);

    assert_eq!(
        manager.apply_layout(&layout, &mut outputs),
        Err(LayoutError::Topology(TopologyError::PrimaryNotAtOrigin(10, 0)))
    );
    assert_eq!(manager.heads().count(), 0);
    assert!(outputs.is_empty());
}

// ============================================================================
// Projection
// ============================================================================

#[test]
fn test_horizontal_contiguity() {
    let mut manager = manager();
    let mut outputs = VirtualOutputs::new();

    let ack = manager.apply_layout(&triple(), &mut outputs).unwrap();

    assert_eq!(ack.arrangement, Arrangement::Horizontal);
    assert_eq!(ack.local_bounds.width, 5760);

    let mut locals: Vec<Rectangle> = manager.heads().map(|head| head.local_region()).collect();
    locals.sort_by_key(|rect| rect.x);
    assert_eq!(locals[0].x, 0);
    for pair in locals.windows(2) {
        assert_eq!(pair[0].right(), i64::from(pair[1].x));
        assert_eq!(pair[0].y, pair[1].y);
    }
}

#[test]
fn test_scaled_horizontal_packing() {
    let mut manager = manager();
    let mut outputs = VirtualOutputs::new();
    let layout = MonitorLayoutMessage::new(vec![
        MonitorDescriptor::new(0, 0, 3840, 2160, true).with_desktop_scale(200),
        MonitorDescriptor::new(3840, 0, 1920, 1080, false),
    ]);

    let ack = manager.apply_layout(&layout, &mut outputs).unwrap();

    assert!(ack.scaling_applied);
    assert_eq!(ack.local_bounds, Rectangle::new(0, 0, 3840, 1080));

    let primary = manager.primary_output().unwrap();
    assert_eq!(outputs.output(primary).unwrap().scale, 2);
    assert_eq!(outputs.output(primary).unwrap().logical_size().width, 1920);
}

#[test]
fn test_complex_placement_drops_scaling() {
    let mut manager = manager();
    let mut outputs = VirtualOutputs::new();
    let l_shape = MonitorLayoutMessage::new(vec![
        MonitorDescriptor::new(0, 0, 1920, 1080, true).with_desktop_scale(200),
        MonitorDescriptor::new(1920, 0, 1920, 1080, false).with_desktop_scale(200),
        MonitorDescriptor::new(0, 1080, 1920, 1080, false).with_desktop_scale(200),
    ]);

    let ack = manager.apply_layout(&l_shape, &mut outputs).unwrap();

    assert!(!ack.scaling_applied);
    assert_eq!(manager.heads().count(), 3);
    for head in manager.heads() {
        assert_eq!(head.mode().output_scale, 1);
        assert_eq!(head.mode().client_scale, 1.0);
        assert_eq!(head.local_region(), head.client_region());
    }
    for (_, output) in outputs.iter() {
        assert_eq!(output.scale, 1);
    }
}

#[test]
fn test_negative_client_space_is_shifted() {
    let mut manager = manager();
    let mut outputs = VirtualOutputs::new();
    let layout = MonitorLayoutMessage::new(vec![
        MonitorDescriptor::new(0, 0, 1920, 1080, true),
        MonitorDescriptor::new(-1280, 0, 1280, 1024, false),
    ]);

    let ack = manager.apply_layout(&layout, &mut outputs).unwrap();

    assert_eq!(ack.client_bounds, Rectangle::new(-1280, 0, 3200, 1080));
    assert_eq!(ack.local_bounds.x, 0);
    for head in manager.heads() {
        assert!(head.local_region().x >= 0);
    }
}

// ============================================================================
// Reuse
// ============================================================================

#[test]
fn test_identical_resubmission_makes_no_calls() {
    let mut manager = manager();
    let mut outputs = VirtualOutputs::new();

    manager.apply_layout(&triple(), &mut outputs).unwrap();
    assert!(!outputs.take_calls().is_empty());

    let ack = manager.apply_layout(&triple(), &mut outputs).unwrap();

    assert!(outputs.calls().is_empty());
    assert!(ack.report.is_noop());
    assert_eq!(ack.report.fast_matched, 3);
    assert_eq!(ack.generation, 2);
}

#[test]
fn test_moving_one_monitor_keeps_head_indices() {
    let mut manager = manager();
    let mut outputs = VirtualOutputs::new();
    manager.apply_layout(&triple(), &mut outputs).unwrap();

    let before: Vec<(HeadId, Rectangle)> = manager
        .heads()
        .map(|head| (head.id(), head.client_region()))
        .collect();
    outputs.take_calls();

    let moved = MonitorLayoutMessage::new(vec![
        MonitorDescriptor::new(0, 0, 1920, 1080, true),
        MonitorDescriptor::new(1920, 0, 1920, 1080, false),
        MonitorDescriptor::new(3840, 200, 1920, 1080, false),
    ]);
    let ack = manager.apply_layout(&moved, &mut outputs).unwrap();

    assert!(ack.report.created.is_empty());
    assert_eq!(ack.report.destroyed, 0);
    assert_eq!(ack.report.fast_matched, 2);

    let after: Vec<HeadId> = manager.heads().map(|head| head.id()).collect();
    let ids_before: Vec<HeadId> = before.iter().map(|(id, _)| *id).collect();
    assert_eq!(after, ids_before);

    let third = manager
        .heads()
        .find(|head| head.client_region().x == 3840)
        .unwrap();
    assert_eq!(third.client_region().y, 200);

    let calls = outputs.take_calls();
    assert!(calls
        .iter()
        .all(|call| !matches!(call, OutputCall::Create(_) | OutputCall::Destroy(_))));
    assert!(calls
        .iter()
        .any(|call| matches!(call, OutputCall::Move(_, 3840, 200))));
}

#[test]
fn test_removed_monitor_destroys_its_output() {
    let mut manager = manager();
    let mut outputs = VirtualOutputs::new();
    manager.apply_layout(&triple(), &mut outputs).unwrap();
    assert_eq!(outputs.len(), 3);

    let dual = MonitorLayoutMessage::new(vec![
        MonitorDescriptor::new(0, 0, 1920, 1080, true),
        MonitorDescriptor::new(1920, 0, 1920, 1080, false),
    ]);
    let ack = manager.apply_layout(&dual, &mut outputs).unwrap();

    assert_eq!(ack.report.destroyed, 1);
    assert_eq!(outputs.len(), 2);
    assert_eq!(ack.local_bounds.width, 3840);
}

#[test]
fn test_desktop_resize_reuses_primary() {
    let mut manager = manager();
    let mut outputs = VirtualOutputs::new();
    let small = MonitorLayoutMessage::new(vec![MonitorDescriptor::new(0, 0, 1280, 720, true)]);
    let large = MonitorLayoutMessage::new(vec![MonitorDescriptor::new(0, 0, 2560, 1440, true)]);

    manager.apply_layout(&small, &mut outputs).unwrap();
    let output = manager.primary_output().unwrap();
    outputs.take_calls();

    let ack = manager.apply_layout(&large, &mut outputs).unwrap();

    assert!(ack.report.created.is_empty());
    assert_eq!(manager.primary_output(), Some(output));
    assert_eq!(outputs.output(output).unwrap().mode.width, 2560);
    assert!(outputs
        .take_calls()
        .contains(&OutputCall::SetMode(output, 2560, 1440)));
}

// ============================================================================
// Coordinate mapping
// ============================================================================

#[test]
fn test_fractional_scale_is_resolved() {
    let mut manager = fractional_manager();
    let mut outputs = VirtualOutputs::new();
    let layout = MonitorLayoutMessage::new(vec![
        MonitorDescriptor::new(0, 0, 1920, 1080, true).with_desktop_scale(150)
    ]);

    manager.apply_layout(&layout, &mut outputs).unwrap();

    let head = manager.heads().next().unwrap();
    assert_eq!(head.mode().client_scale, 1.5);
    assert_eq!(head.mode().output_scale, 1);
}

proptest! {
    #[test]
    fn prop_fractional_round_trip(x in 0i32..1920, y in 0i32..1080) {
        let mut manager = fractional_manager();
        let mut outputs = VirtualOutputs::new();
        let layout = MonitorLayoutMessage::new(vec![
            MonitorDescriptor::new(0, 0, 1920, 1080, true).with_desktop_scale(150),
        ]);
        manager.apply_layout(&layout, &mut outputs).unwrap();

        let p = Point::new(x, y);
        let local = manager.to_local(p, None).unwrap();
        let output = local.output.unwrap();
        let back = manager.to_client(local.point, output, None).unwrap();

        prop_assert!((back.point.x - p.x).abs() <= 2);
        prop_assert!((back.point.y - p.y).abs() <= 2);
    }
}

#[test]
fn test_point_outside_every_monitor() {
    let mut manager = manager();
    let mut outputs = VirtualOutputs::new();
    manager.apply_layout(&triple(), &mut outputs).unwrap();

    assert!(manager.to_local(Point::new(6000, 10), None).is_none());
    assert!(manager.to_local(Point::new(-1, 10), None).is_none());
}
