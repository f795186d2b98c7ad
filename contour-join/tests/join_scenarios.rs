//! End-to-end joining scenarios over small synthetic rasters

use std::collections::{HashMap, HashSet};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use contour_common::Error;
use contour_core::{unpack, BoundaryTouch, ContourHeader, ContourSet, Rect};
use contour_join::{ContourJoiner, JoinConfig, JoiningOrder};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Counter-clockwise rectangle `[x0, x1] x [y0, y1]`
fn rect_points(x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<i32> {
    vec![x0, y0, x1, y0, x1, y1, x0, y1]
}

fn add_rect(set: &mut ContourSet, label: i32, x0: i32, y0: i32, x1: i32, y1: i32) {
    set.add_contour(&ContourHeader::new(label), &rect_points(x0, y0, x1, y1))
        .unwrap();
}

/// One unit square per pixel, labelled by the raster value
fn pixel_fragments(raster: &[Vec<i32>]) -> ContourSet {
    let mut set = ContourSet::new();
    for (y, row) in raster.iter().enumerate() {
        for (x, &label) in row.iter().enumerate() {
            let (x, y) = (x as i32, y as i32);
            add_rect(&mut set, label, x, y, x + 1, y + 1);
        }
    }
    set
}

fn random_raster(rng: &mut StdRng, width: usize, height: usize, labels: i32) -> Vec<Vec<i32>> {
    (0..height)
        .map(|_| (0..width).map(|_| rng.random_range(0..labels)).collect())
        .collect()
}

fn doubled_area_by_label(set: &ContourSet) -> HashMap<i32, i64> {
    let mut areas = HashMap::new();
    for k in 0..set.len() {
        *areas.entry(set.label(k).unwrap()).or_insert(0) += set.precise_doubled_area(k).unwrap();
    }
    areas
}

fn assert_no_duplicate_edges(set: &ContourSet) {
    for k in 0..set.len() {
        let points = unpack(set.contour_points(k).unwrap(), false).unwrap();
        let n = points.len() / 2;
        let mut edges = HashSet::new();
        for i in 0..n {
            let j = (i + 1) % n;
            let edge = (points[2 * i], points[2 * i + 1], points[2 * j], points[2 * j + 1]);
            assert!(edges.insert(edge), "contour #{k} repeats edge {edge:?}");
        }
    }
}

/// Outputs of one label must not share a unit edge, otherwise they could still be joined
fn assert_no_edges_shared_between_outputs(set: &ContourSet) {
    let mut owners: HashMap<(i32, i32, i32, i32, i32), usize> = HashMap::new();
    for k in 0..set.len() {
        let label = set.label(k).unwrap();
        let points = unpack(set.contour_points(k).unwrap(), false).unwrap();
        let n = points.len() / 2;
        for i in 0..n {
            let j = (i + 1) % n;
            let (a, b) = ((points[2 * i], points[2 * i + 1]), (points[2 * j], points[2 * j + 1]));
            let (a, b) = if a <= b { (a, b) } else { (b, a) };
            let owner = *owners.entry((label, a.0, a.1, b.0, b.1)).or_insert(k);
            assert_eq!(
                owner, k,
                "contours #{owner} and #{k} of label {label} share edge {a:?}-{b:?}"
            );
        }
    }
}

#[test]
fn two_halves_become_one_square() {
    let mut set = ContourSet::new();
    add_rect(&mut set, 1, 0, 0, 4, 8);
    add_rect(&mut set, 1, 4, 0, 8, 8);
    let mut joiner = ContourJoiner::new(&set, None, Some(&[]), 0).unwrap();
    let result = joiner.join_contours().unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.label(0).unwrap(), 1);
    assert_eq!(result.contour_points(0).unwrap().len(), 8);
    assert_eq!(result.rectangle(0).unwrap(), Rect::new(0, 8, 0, 8));
    assert_eq!(result.precise_doubled_area(0).unwrap(), 128);
}

#[test]
fn disjoint_squares_stay_separate() {
    let mut set = ContourSet::new();
    add_rect(&mut set, 1, 0, 0, 2, 2);
    add_rect(&mut set, 1, 5, 0, 7, 2);
    add_rect(&mut set, 1, 0, 5, 2, 7);
    let mut joiner = ContourJoiner::new(&set, None, Some(&[]), 0).unwrap();
    let result = joiner.join_contours().unwrap();
    assert_eq!(result.len(), 3);
    for k in 0..3 {
        assert_eq!(result.precise_doubled_area(k).unwrap(), 8);
    }
    assert_eq!(joiner.stats().successful_joins, 0);
}

#[test]
fn self_intersecting_fragment_is_rejected() {
    let mut set = ContourSet::new();
    // walks along the segment (1,0)-(2,0) twice
    set.add_contour(&ContourHeader::new(1), &[0, 0, 1, 0, 2, 0, 1, 0, 1, 1, 0, 1])
        .unwrap();
    add_rect(&mut set, 1, 0, 0, 3, 3);
    let mut joiner = ContourJoiner::new(&set, None, Some(&[]), 0).unwrap();
    let err = joiner.join_contours().unwrap_err();
    assert!(matches!(err, Error::Geometry(_)), "{err}");
}

#[test]
fn ring_of_fragments_keeps_its_hole() {
    // 3x3 block of unit squares with the centre missing
    let mut set = ContourSet::new();
    for y in 0..3 {
        for x in 0..3 {
            if (x, y) != (1, 1) {
                add_rect(&mut set, 1, x, y, x + 1, y + 1);
            }
        }
    }
    let mut joiner = ContourJoiner::new(&set, None, Some(&[]), 0).unwrap();
    let result = joiner.join_contours().unwrap();
    assert_eq!(result.len(), 2);
    let mut areas: Vec<i64> = (0..2)
        .map(|k| result.precise_doubled_area(k).unwrap())
        .collect();
    areas.sort_unstable();
    assert_eq!(areas, vec![-2, 18]);
    assert_no_duplicate_edges(&result);
}

#[test]
fn random_rasters_conserve_area_in_every_order() {
    let mut rng = StdRng::seed_from_u64(0x5EA4);
    for _ in 0..4 {
        let raster = random_raster(&mut rng, 16, 12, 3);
        let set = pixel_fragments(&raster);
        let expected = doubled_area_by_label(&set);
        for order in JoiningOrder::ALL {
            for grid_step_log in [None, Some(0), Some(3)] {
                let mut joiner = ContourJoiner::new(&set, grid_step_log, Some(&[]), 0).unwrap();
                joiner.set_joining_order(order);
                let result = joiner.join_contours().unwrap();
                assert!(result.len() < set.len());
                assert_eq!(doubled_area_by_label(&result), expected, "{order}");
                assert_no_duplicate_edges(&result);
                assert_no_edges_shared_between_outputs(&result);
                let stats = joiner.stats();
                assert_eq!(stats.output_contours, result.len());
                assert_eq!(stats.input_contours, set.len());
                // every input is either joined into another contour or starts one
                assert_eq!(
                    stats.successful_joins
                        + stats.output_contours as u64
                        + stats.annihilated_contours,
                    stats.input_contours as u64 + stats.deferred_contours,
                    "{order} {grid_step_log:?}"
                );
            }
        }
    }
}

#[test]
fn filled_hole_is_annihilated() {
    // the ring closes first; the centre pixel then fills its hole exactly
    let mut set = ContourSet::new();
    for y in 0..3 {
        for x in 0..3 {
            if (x, y) != (1, 1) {
                add_rect(&mut set, 1, x, y, x + 1, y + 1);
            }
        }
    }
    add_rect(&mut set, 1, 1, 1, 2, 2);
    let mut joiner = ContourJoiner::new(&set, Some(0), Some(&[]), 0).unwrap();
    joiner.set_joining_order(JoiningOrder::Natural);
    let result = joiner.join_contours().unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.precise_doubled_area(0).unwrap(), 18);
    assert_no_edges_shared_between_outputs(&result);
    let stats = joiner.stats();
    assert_eq!(stats.successful_joins, 8);
    assert_eq!(
        stats.successful_joins + stats.output_contours as u64 + stats.annihilated_contours,
        stats.input_contours as u64 + stats.deferred_contours
    );
}

#[test]
fn label_map_and_default_label() {
    let mut set = ContourSet::new();
    add_rect(&mut set, 0, 0, 0, 2, 2);
    add_rect(&mut set, 1, 2, 0, 4, 2);
    add_rect(&mut set, 2, 4, 0, 6, 2);

    // labels 0 and 1 merge into 7, label 2 becomes 9
    let mut joiner = ContourJoiner::new(&set, None, Some(&[7, 7, 9]), 0).unwrap();
    let result = joiner.join_contours().unwrap();
    assert_eq!(result.all_labels(), vec![7, 9]);
    assert_eq!(result.rectangle(0).unwrap(), Rect::new(0, 4, 0, 2));

    // without a map everything shares the default label
    let mut joiner = ContourJoiner::new(&set, None, None, 5).unwrap();
    let result = joiner.join_contours().unwrap();
    assert_eq!(result.all_labels(), vec![5]);
    assert_eq!(result.rectangle(0).unwrap(), Rect::new(0, 6, 0, 2));

    // an empty map keeps original labels
    let mut joiner = ContourJoiner::new(&set, None, Some(&[]), 5).unwrap();
    assert_eq!(joiner.join_contours().unwrap().all_labels(), vec![0, 1, 2]);
}

#[test]
fn singleton_passes_through_repacked() {
    let mut set = ContourSet::new();
    let mut header = ContourHeader::with_internal(3, true);
    header.set_frame_id(Some(11)).set_touch(BoundaryTouch {
        min_x: true,
        ..BoundaryTouch::NONE
    });
    let walk = unpack(&rect_points(0, 0, 3, 2), false).unwrap();
    set.add_contour(&header, &walk).unwrap();

    let mut joiner = ContourJoiner::new(&set, None, Some(&[0, 0, 0, 8]), 0).unwrap();
    let result = joiner.join_contours().unwrap();
    assert_eq!(result.len(), 1);
    let out = result.header(0).unwrap();
    assert_eq!(out.label(), 8);
    assert_eq!(out.frame_id(), Some(11));
    assert!(out.is_internal());
    assert!(!out.touch().any());
    assert_eq!(result.contour_points(0).unwrap().len(), 8);

    joiner.set_pack_result(false);
    let result = joiner.join_contours().unwrap();
    assert_eq!(result.contour_points(0).unwrap(), &walk[..]);
}

#[test]
fn unpacked_results_are_unit_walks() {
    let mut set = ContourSet::new();
    add_rect(&mut set, 1, 0, 0, 2, 2);
    add_rect(&mut set, 1, 2, 0, 4, 2);
    let config = JoinConfig {
        pack_result: false,
        joined_labels_map: Some(Vec::new()),
        ..JoinConfig::default()
    };
    let mut joiner = ContourJoiner::with_config(&set, &config).unwrap();
    let result = joiner.join_contours().unwrap();
    assert_eq!(result.len(), 1);
    // perimeter of the 4x2 rectangle
    assert_eq!(result.contour_points(0).unwrap().len(), 2 * 12);
}

#[test]
fn cancellation_keeps_finished_records() {
    let mut set = ContourSet::new();
    add_rect(&mut set, 5, -10, -10, -8, -8);
    add_rect(&mut set, 1, -10, 0, -8, 2);
    add_rect(&mut set, 1, -8, 0, -6, 2);
    for y in 0..40 {
        for x in 0..40 {
            add_rect(&mut set, 2, 2 * x, 2 * y, 2 * x + 2, 2 * y + 2);
        }
    }
    let flag = Arc::new(AtomicBool::new(true));
    let mut joiner = ContourJoiner::new(&set, None, Some(&[]), 0).unwrap();
    joiner
        .set_joining_order(JoiningOrder::Natural)
        .set_cancel_flag(Arc::clone(&flag));

    let mut result = ContourSet::new();
    let err = joiner.join_into(&mut result).unwrap_err();
    assert!(err.is_cancelled(), "{err}");
    assert_eq!(result.len(), 2);
    assert_eq!(result.all_labels(), vec![5, 1]);
    assert_eq!(result.precise_doubled_area(1).unwrap(), 16);
    let copy = ContourSet::deserialize(&result.serialize()).unwrap();
    assert_eq!(copy.len(), 2);
    assert_eq!(joiner.stats().output_contours, 2);

    flag.store(false, std::sync::atomic::Ordering::Relaxed);
    let result = joiner.join_contours().unwrap();
    assert_eq!(result.len(), 3);
    assert_eq!(result.rectangle(2).unwrap(), Rect::new(0, 80, 0, 80));
}
