//! Container scenarios: incremental building, serialization and `.ctrs` files

use contour_core::format::{read_contours, write_contours};
use contour_core::{BoundaryTouch, ContourHeader, ContourSet, InsideStatus, Rect};
use contour_common::Error;
use tempfile::TempDir;

fn build_sample() -> ContourSet {
    let mut set = ContourSet::new();
    let mut header = ContourHeader::new(17);
    header.set_frame_id(Some(4));
    set.open_contour(&header).unwrap();
    for (x, y) in [(0, 0), (5, 0), (5, 5), (0, 5)] {
        set.add_point_touching(
            x,
            y,
            BoundaryTouch {
                min_y: y == 0,
                ..BoundaryTouch::NONE
            },
        )
        .unwrap();
    }
    header.set_internal(true);
    set.close_contour(&header).unwrap();
    set.add_contour(&ContourHeader::new(-3), &[100, 100]).unwrap();
    set
}

#[test]
fn serialized_record_reproduces_header_and_points() {
    let set = build_sample();
    let copy = ContourSet::deserialize(&set.serialize()).unwrap();
    assert_eq!(copy.len(), 2);
    let header = copy.header(0).unwrap();
    assert_eq!(header.label(), 17);
    assert_eq!(header.frame_id(), Some(4));
    assert!(header.is_internal());
    assert!(header.touch().min_y);
    assert!(!header.touch().max_x);
    assert_eq!(header.rectangle(), Some(Rect::new(0, 5, 0, 5)));
    assert_eq!(copy.contour_points(0).unwrap(), set.contour_points(0).unwrap());
    assert_eq!(copy.all_frame_ids(-1), vec![4, -1]);
    assert_eq!(copy.label(1).unwrap(), -3);
    assert!(copy.equals_to_serialized(set.as_serialized()));
}

#[test]
fn deserialize_checks_rectangle_order() {
    let mut words = build_sample().serialize();
    // swap minX and maxX of the first record
    words.swap(2, 3);
    match ContourSet::deserialize(&words) {
        Err(Error::Format { position, .. }) => assert_eq!(position, 2),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn add_contour_rejects_invalid_supplied_rectangle() {
    let mut set = build_sample();
    let before = set.serialize();
    let square = [0, 0, 2, 0, 2, 2, 0, 2];

    let mut header = ContourHeader::new(1);
    header.set_rectangle(Some(Rect::new(5, 0, 0, 2)));
    assert!(matches!(
        set.add_contour(&header, &square),
        Err(Error::InvalidArgument(_))
    ));
    header.set_rectangle(Some(Rect::new(0, 2, 0, 0x4000_0000)));
    assert!(matches!(
        set.add_contour(&header, &square),
        Err(Error::InvalidArgument(_))
    ));
    assert_eq!(set.len(), 2);
    assert_eq!(set.serialize(), before);

    header.set_rectangle(Some(Rect::new(0, 2, 0, 2)));
    set.add_contour(&header, &square).unwrap();
    let copy = ContourSet::deserialize(&set.serialize()).unwrap();
    assert_eq!(copy.len(), 3);
    assert_eq!(copy.rectangle(2).unwrap(), Rect::new(0, 2, 0, 2));
}

#[test]
fn deserialize_checks_odd_length() {
    let mut words = build_sample().serialize();
    words[1] += 1;
    assert!(matches!(
        ContourSet::deserialize(&words),
        Err(Error::Format { position: 0, .. })
    ));
}

#[test]
fn file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sample.ctrs");
    let set = build_sample();
    write_contours(&path, &set).unwrap();
    let read = read_contours(&path).unwrap();
    assert_eq!(read, set);
    assert_eq!(read.header(0).unwrap(), set.header(0).unwrap());
}

#[test]
fn missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        read_contours(dir.path().join("absent.ctrs")),
        Err(Error::Io(_))
    ));
}

#[test]
fn queries_on_stored_contours() {
    let set = build_sample();
    assert_eq!(
        set.point_inside_status(0, 2.5, 2.5, false).unwrap(),
        InsideStatus::Inside {
            left: 0.0,
            right: 5.0
        }
    );
    assert!(!set.is_point_strictly_inside(1, 100.0, 100.0, false).unwrap());
    assert_eq!(set.strict_area(0).unwrap(), 25.0);
    assert_eq!(set.strict_perimeter(0).unwrap(), 20.0);
    assert_eq!(set.point_x(0, 1).unwrap(), 5);
    assert!(matches!(
        set.point_y(0, 4),
        Err(Error::IndexOutOfBounds { index: 4, len: 4 })
    ));
}
