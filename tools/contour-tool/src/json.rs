//! JSON views of contour sets

use contour_common::Result;
use contour_core::{ContourHeader, ContourSet, Rect};
use serde::{Deserialize, Serialize};

/// One contour as exchanged with `import` and `export`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContourRecord {
    pub label: i32,
    #[serde(default)]
    pub internal: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<i32>,
    pub points: Vec<[i32; 2]>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RectInfo {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl From<Rect> for RectInfo {
    fn from(r: Rect) -> Self {
        Self {
            min_x: r.min_x,
            max_x: r.max_x,
            min_y: r.min_y,
            max_y: r.max_y,
        }
    }
}

/// Summary line of `info`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContourInfo {
    pub index: usize,
    pub label: i32,
    pub internal: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<i32>,
    pub rectangle: RectInfo,
    pub points: usize,
    pub doubled_area: i64,
}

pub fn records_to_set(records: &[ContourRecord]) -> Result<ContourSet> {
    let mut set = ContourSet::new();
    let mut points = Vec::new();
    for record in records {
        points.clear();
        points.extend(record.points.iter().flatten());
        let mut header = ContourHeader::with_internal(record.label, record.internal);
        header.set_frame_id(record.frame_id);
        set.add_contour(&header, &points)?;
    }
    Ok(set)
}

pub fn set_to_records(set: &ContourSet) -> Result<Vec<ContourRecord>> {
    (0..set.len())
        .map(|k| {
            let header = set.header(k)?;
            Ok(ContourRecord {
                label: header.label(),
                internal: header.is_internal(),
                frame_id: header.frame_id(),
                points: set
                    .contour_points(k)?
                    .chunks_exact(2)
                    .map(|p| [p[0], p[1]])
                    .collect(),
            })
        })
        .collect()
}

pub fn describe(set: &ContourSet) -> Result<Vec<ContourInfo>> {
    (0..set.len())
        .map(|k| {
            let header = set.header(k)?;
            Ok(ContourInfo {
                index: k,
                label: header.label(),
                internal: header.is_internal(),
                frame_id: header.frame_id(),
                rectangle: set.rectangle(k)?.into(),
                points: set.number_of_points(k)?,
                doubled_area: set.precise_doubled_area(k)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_round_trip() {
        let records: Vec<ContourRecord> = serde_json::from_str(
            r#"[
                {"label": 3, "points": [[0, 0], [4, 0], [4, 2], [0, 2]]},
                {"label": 1, "internal": true, "frame_id": 9, "points": [[5, 5], [5, 6], [6, 6], [6, 5]]}
            ]"#,
        )
        .unwrap();
        let set = records_to_set(&records).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.frame_id(1).unwrap(), Some(9));
        assert_eq!(set_to_records(&set).unwrap(), records);

        let info = describe(&set).unwrap();
        assert_eq!(info[0].doubled_area, 16);
        assert_eq!(info[0].rectangle.max_x, 4);
        assert_eq!(info[1].points, 4);
        assert!(info[1].internal);
    }

    #[test]
    fn test_empty_record_is_rejected() {
        let records = vec![ContourRecord {
            label: 0,
            internal: false,
            frame_id: None,
            points: Vec::new(),
        }];
        assert!(records_to_set(&records).is_err());
    }
}
