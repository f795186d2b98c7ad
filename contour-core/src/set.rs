//! `ContourSet`: many contour records in one flat `i32` buffer
//!
//! Records are stored back to back (header, then interleaved points) and a parallel offset
//! index gives O(1) access to record `k`. The buffer read from offset 0 is always a valid
//! sequence of records; while a contour is open for incremental construction, every other
//! mutation is refused.

use std::fmt;
use std::ops::Range;

use contour_common::{Error, Result};
use rayon::prelude::*;
use tracing::debug;

use crate::header::{
    check_rectangle, is_record_start, is_reserved, BoundaryTouch, ContourHeader, Rect, FLAGS_OFFSET,
    FRAME_ID_OFFSET, HAS_FRAME_ID_FLAG, HEADER_LENGTH_MASK, INTERNAL_FLAG, LABEL_OFFSET,
    MAGIC_WORD, MAGIC_WORD_MASK, MAX_ALLOWED_HEADER_LENGTH, MIN_HEADER_LENGTH, RECTANGLE_OFFSET,
    RESERVED_INDICATOR,
};
use crate::inside::{self, InsideStatus};
use crate::measure;
use crate::pack;
use crate::point::{
    check_contour_length, check_point, check_point_i64, collinear_codirectional,
    MAX_CONTOUR_NUMBER_OF_POINTS, MAX_NUMBER_OF_CONTOURS,
};

const MAX_BUFFER_LENGTH: usize = i32::MAX as usize;

#[derive(Clone, Copy, Debug)]
struct OpenContour {
    header_offset: usize,
    points_offset: usize,
    rect: Rect,
    touch: BoundaryTouch,
}

/// Growable container of contour records
#[derive(Clone, Debug, Default)]
pub struct ContourSet {
    points: Vec<i32>,
    header_offsets: Vec<usize>,
    open: Option<OpenContour>,
    optimize_collinear_steps: bool,
}

impl ContourSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_optimize_collinear_steps(&self) -> bool {
        self.optimize_collinear_steps
    }

    /// In this mode [`add_point`](Self::add_point) merges steps continuing the previous one
    pub fn set_optimize_collinear_steps(&mut self, optimize: bool) -> &mut Self {
        self.optimize_collinear_steps = optimize;
        self
    }

    /// Whether `serialized` starts with a contour record
    pub fn is_serialized(serialized: &[i32]) -> bool {
        serialized.first().is_some_and(|&v| is_record_start(v))
    }

    /// Rebuilds a set from a serialized buffer, validating every record
    pub fn deserialize(serialized: &[i32]) -> Result<Self> {
        let mut header_offsets = Vec::new();
        let mut p = 0;
        while p < serialized.len() {
            let k = header_offsets.len();
            if k >= MAX_NUMBER_OF_CONTOURS {
                return Err(Error::capacity(format!(
                    "too large number of serialized contours: > {MAX_NUMBER_OF_CONTOURS}"
                )));
            }
            let value = serialized[p];
            if !is_record_start(value) {
                return Err(Error::format(
                    p,
                    format!(
                        "unsupported serialized contour, contour #{k}: signature high bits \
                         (in value 0x{value:08x}) are 0x{:08x} instead of 0x{MAGIC_WORD:08x}",
                        value & MAGIC_WORD_MASK
                    ),
                ));
            }
            let header_length = (value & HEADER_LENGTH_MASK) as usize;
            if header_length < MIN_HEADER_LENGTH {
                return Err(Error::format(
                    p,
                    format!("too short header: {header_length} elements < {MIN_HEADER_LENGTH}"),
                ));
            }
            let full_length = match serialized.get(p + 1) {
                Some(&v) if v > 0 => v as usize,
                Some(&v) => {
                    return Err(Error::format(
                        p + 1,
                        format!("non-positive contour length {v}"),
                    ))
                }
                None => {
                    return Err(Error::format(p, "truncated contour header"));
                }
            };
            if full_length <= header_length || (full_length - header_length) % 2 != 0 {
                return Err(Error::format(
                    p,
                    format!(
                        "serialized contour length must be even and positive, but it is \
                         {full_length} - {header_length} (full length - header length)"
                    ),
                ));
            }
            if p + full_length > serialized.len() {
                return Err(Error::format(
                    p,
                    format!(
                        "serialized contour has not enough elements: position {p} + contour \
                         length {full_length} > buffer length {}",
                        serialized.len()
                    ),
                ));
            }
            ContourHeader::read_from(serialized, p)?;
            header_offsets.push(p);
            p += full_length;
        }
        debug!(
            contours = header_offsets.len(),
            words = serialized.len(),
            "deserialized contours"
        );
        Ok(Self {
            points: serialized.to_vec(),
            header_offsets,
            open: None,
            optimize_collinear_steps: false,
        })
    }

    /// Copy of the whole buffer
    pub fn serialize(&self) -> Vec<i32> {
        self.points.clone()
    }

    pub fn as_serialized(&self) -> &[i32] {
        &self.points
    }

    pub fn equals_to_serialized(&self, serialized: &[i32]) -> bool {
        self.points == serialized
    }

    pub fn is_empty(&self) -> bool {
        self.header_offsets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.header_offsets.len()
    }

    pub fn clear(&mut self) -> Result<()> {
        self.check_closed()?;
        self.points.clear();
        self.header_offsets.clear();
        Ok(())
    }

    pub fn is_contour_open(&self) -> bool {
        self.open.is_some()
    }

    /// Starts incremental construction of a new record
    ///
    /// Only the frame id of `header` is used here; it cannot be changed when closing.
    pub fn open_contour(&mut self, header: &ContourHeader) -> Result<()> {
        if self.open.is_some() {
            return Err(Error::state("a contour is already open"));
        }
        self.check_contours_capacity()?;
        if self.points.len() > MAX_BUFFER_LENGTH - MAX_ALLOWED_HEADER_LENGTH {
            return Err(Error::capacity(format!(
                "too large contour buffer: > {} elements",
                MAX_BUFFER_LENGTH - MAX_ALLOWED_HEADER_LENGTH
            )));
        }
        let header_offset = self.points.len();
        header.write_to(&mut self.points, 0);
        self.open = Some(OpenContour {
            header_offset,
            points_offset: self.points.len(),
            rect: Rect::UNKNOWN,
            touch: BoundaryTouch::NONE,
        });
        Ok(())
    }

    pub fn add_point(&mut self, x: i64, y: i64) -> Result<()> {
        self.add_point_touching(x, y, BoundaryTouch::NONE)
    }

    /// Appends a point to the open contour, recording which raster borders it lies on
    pub fn add_point_touching(&mut self, x: i64, y: i64, touch: BoundaryTouch) -> Result<()> {
        check_point_i64(x, y)?;
        let optimize = self.optimize_collinear_steps;
        let Some(open) = self.open.as_mut() else {
            return Err(Error::state("cannot add a point: no contour is open"));
        };
        let (x, y) = (x as i32, y as i32);
        open.rect.include(x, y);
        open.touch.min_x |= touch.min_x;
        open.touch.max_x |= touch.max_x;
        open.touch.min_y |= touch.min_y;
        open.touch.max_y |= touch.max_y;
        let len = self.points.len();
        if optimize && len >= open.points_offset + 4 {
            let (previous_x, previous_y) = (self.points[len - 2], self.points[len - 1]);
            let (before_x, before_y) = (self.points[len - 4], self.points[len - 3]);
            if is_reserved(previous_x) || is_reserved(before_x) {
                let position = if is_reserved(previous_x) { len - 2 } else { len - 4 };
                return Err(Error::state(format!(
                    "damaged contour buffer: reserved value at position {position}"
                )));
            }
            if x == previous_x && y == previous_y {
                return Ok(());
            }
            let previous_dx = previous_x - before_x;
            let previous_dy = previous_y - before_y;
            if collinear_codirectional(previous_dx, previous_dy, x - previous_x, y - previous_y)
                || (previous_dx == 0 && previous_dy == 0)
            {
                self.points[len - 2] = x;
                self.points[len - 1] = y;
                return Ok(());
            }
        }
        self.points.push(x);
        self.points.push(y);
        Ok(())
    }

    /// Finishes the open contour
    ///
    /// The rectangle and touch flags come from the added points; those of `header` are
    /// ignored. On error the partially built record is discarded.
    pub fn close_contour(&mut self, header: &ContourHeader) -> Result<()> {
        let Some(open) = self.open.take() else {
            return Err(Error::state("cannot close: no contour is open"));
        };
        let result = self.finish_record(header, &open);
        if result.is_err() {
            self.points.truncate(open.header_offset);
        }
        result
    }

    fn finish_record(&mut self, header: &ContourHeader, open: &OpenContour) -> Result<()> {
        let p = open.header_offset;
        let q = open.points_offset;
        let len = self.points.len();
        if q - p != header.header_length() {
            return Err(Error::state(format!(
                "header length {} does not match the length of the header written on opening",
                header.header_length()
            )));
        }
        if !is_reserved(self.points[p]) {
            return Err(Error::state(format!(
                "damaged contour buffer: no signature at position {p}"
            )));
        }
        if len - q < 2 {
            return Err(Error::state(
                "cannot close empty contour: at least 1 point must be added",
            ));
        }
        if (len - q) >> 1 > MAX_CONTOUR_NUMBER_OF_POINTS {
            return Err(Error::capacity(format!(
                "too large number of points in a contour: it is > {MAX_CONTOUR_NUMBER_OF_POINTS}"
            )));
        }
        self.points[p + 1] = (len - p) as i32;
        self.write_rectangle(p, open.rect);
        self.points[p + FLAGS_OFFSET] =
            RESERVED_INDICATOR | open.touch.flags() | header.flags_without_touching();
        self.points[p + LABEL_OFFSET] = header.label();
        self.header_offsets.push(p);
        Ok(())
    }

    /// Appends a record with the given points
    ///
    /// When `header` has no rectangle, it is computed from the points. A supplied rectangle
    /// must be non-inverted and inside the coordinate range.
    pub fn add_contour(&mut self, header: &ContourHeader, points: &[i32]) -> Result<()> {
        check_contour_length(points.len())?;
        self.check_closed()?;
        self.check_contours_capacity()?;
        if let Some(rect) = header.rectangle() {
            check_rectangle(&rect)?;
        }
        for p in points.chunks_exact(2) {
            check_point(p[0], p[1])?;
        }
        let header_offset = self.points.len();
        self.check_buffer_capacity(header.header_length() + points.len())?;
        header.write_to(&mut self.points, points.len() >> 1);
        if header.rectangle().is_none() {
            self.write_rectangle(header_offset, Rect::of_points(points));
        }
        self.points.extend_from_slice(points);
        self.header_offsets.push(header_offset);
        Ok(())
    }

    /// Packs `points` and appends them as a new record
    pub fn add_packed_contour(&mut self, header: &ContourHeader, points: &[i32]) -> Result<()> {
        let packed = pack::pack(points)?;
        self.add_contour(header, &packed)
    }

    /// Appends a raw copy of record `index` of `other`
    pub fn add_contour_from(&mut self, other: &ContourSet, index: usize) -> Result<()> {
        other.check_index(index)?;
        self.check_closed()?;
        self.check_contours_capacity()?;
        let from = other.header_offsets[index];
        let to = other.record_end(index);
        self.check_buffer_capacity(to - from)?;
        self.header_offsets.push(self.points.len());
        self.points.extend_from_slice(&other.points[from..to]);
        Ok(())
    }

    /// Appends raw copies of the records `range` of `other`
    pub fn add_contours_range(&mut self, other: &ContourSet, range: Range<usize>) -> Result<()> {
        other.check_range(&range)?;
        self.check_closed()?;
        if range.is_empty() {
            return Ok(());
        }
        if self.len() + range.len() > MAX_NUMBER_OF_CONTOURS {
            return Err(Error::capacity(format!(
                "too large number of contours: > {MAX_NUMBER_OF_CONTOURS}"
            )));
        }
        let from_offset = other.header_offsets[range.start];
        let to_offset = other.record_end(range.end - 1);
        self.check_buffer_capacity(to_offset - from_offset)?;
        let base = self.points.len();
        self.points
            .extend_from_slice(&other.points[from_offset..to_offset]);
        self.header_offsets.extend(
            other.header_offsets[range]
                .iter()
                .map(|&offset| offset - from_offset + base),
        );
        Ok(())
    }

    pub fn add_contours(&mut self, other: &ContourSet) -> Result<()> {
        self.add_contours_range(other, 0..other.len())
    }

    pub fn contours_range(&self, range: Range<usize>) -> Result<ContourSet> {
        let mut result = ContourSet::new();
        result.add_contours_range(self, range)?;
        Ok(result)
    }

    /// Appends every record of `other` mapped through `v * scale + shift`
    ///
    /// Each record is transformed, re-packed and appended. A negative scale on exactly one
    /// axis reverses orientation, so the internal flag is inverted. With `remove_degenerated`,
    /// records collapsing to zero width or height are dropped.
    pub fn add_transformed_contours(
        &mut self,
        other: &ContourSet,
        scale_x: f64,
        scale_y: f64,
        shift_x: f64,
        shift_y: f64,
        remove_degenerated: bool,
    ) -> Result<()> {
        let invert_orientation = (scale_x < 0.0) != (scale_y < 0.0);
        let mut transformed = Vec::new();
        let mut packed = Vec::new();
        for k in 0..other.len() {
            let mut header = other.header(k)?;
            transformed.clear();
            transformed.extend_from_slice(other.contour_points(k)?);
            measure::transform_contour_in_place(
                &mut transformed,
                scale_x,
                scale_y,
                shift_x,
                shift_y,
            )?;
            pack::pack_unchecked_into(&mut packed, &transformed)?;
            header.transform_rectangle(scale_x, scale_y, shift_x, shift_y)?;
            if invert_orientation {
                header.set_internal(!header.is_internal());
            }
            self.add_contour(&header, &packed)?;
            if remove_degenerated {
                let rect = self.rectangle(self.len() - 1)?;
                if rect.min_x == rect.max_x || rect.min_y == rect.max_y {
                    self.remove_last_contour()?;
                }
            }
        }
        Ok(())
    }

    pub fn transform_contours(
        &self,
        scale_x: f64,
        scale_y: f64,
        shift_x: f64,
        shift_y: f64,
        remove_degenerated: bool,
    ) -> Result<ContourSet> {
        let mut result = ContourSet::new();
        result.add_transformed_contours(
            self,
            scale_x,
            scale_y,
            shift_x,
            shift_y,
            remove_degenerated,
        )?;
        Ok(result)
    }

    pub fn remove_contours_range(&mut self, range: Range<usize>) -> Result<()> {
        self.check_range(&range)?;
        self.check_closed()?;
        if range.is_empty() {
            return Ok(());
        }
        let from_offset = self.header_offsets[range.start];
        let to_offset = self.record_end(range.end - 1);
        let removed = to_offset - from_offset;
        self.points.drain(from_offset..to_offset);
        self.header_offsets.drain(range.clone());
        for offset in &mut self.header_offsets[range.start..] {
            *offset -= removed;
        }
        Ok(())
    }

    pub fn remove_contour(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        self.remove_contours_range(index..index + 1)
    }

    pub fn remove_last_contour(&mut self) -> Result<()> {
        self.check_closed()?;
        let Some(offset) = self.header_offsets.pop() else {
            return Err(Error::state("no contours"));
        };
        self.points.truncate(offset);
        Ok(())
    }

    /// Number of `i32` words occupied by the points of contour `index`
    pub fn contour_length(&self, index: usize) -> Result<usize> {
        self.check_index(index)?;
        let p = self.header_offsets[index];
        Ok(self.points[p + 1] as usize - self.header_length_at(p))
    }

    pub fn number_of_points(&self, index: usize) -> Result<usize> {
        Ok(self.contour_length(index)? >> 1)
    }

    /// Offset of the first point of contour `index` in the serialized buffer
    pub fn contour_offset(&self, index: usize) -> Result<usize> {
        self.check_index(index)?;
        let p = self.header_offsets[index];
        Ok(p + self.header_length_at(p))
    }

    /// Offset of the header of contour `index`; `len()` maps to the end of the buffer
    pub fn serialized_header_offset(&self, index: usize) -> Result<usize> {
        if index == self.len() {
            return Ok(self.points.len());
        }
        self.check_index(index)?;
        Ok(self.header_offsets[index])
    }

    /// Interleaved points of contour `index`
    pub fn contour_points(&self, index: usize) -> Result<&[i32]> {
        self.check_index(index)?;
        let p = self.header_offsets[index];
        let from = p + self.header_length_at(p);
        Ok(&self.points[from..p + self.points[p + 1] as usize])
    }

    pub fn point_x(&self, index: usize, point_index: usize) -> Result<i32> {
        Ok(self.point(index, point_index)?.0)
    }

    pub fn point_y(&self, index: usize, point_index: usize) -> Result<i32> {
        Ok(self.point(index, point_index)?.1)
    }

    fn point(&self, index: usize, point_index: usize) -> Result<(i32, i32)> {
        let points = self.contour_points(index)?;
        let n = points.len() >> 1;
        if point_index >= n {
            return Err(Error::IndexOutOfBounds {
                index: point_index,
                len: n,
            });
        }
        Ok((points[2 * point_index], points[2 * point_index + 1]))
    }

    pub fn unpack_contour(&self, index: usize, diagonal: bool) -> Result<Vec<i32>> {
        pack::unpack(self.contour_points(index)?, diagonal)
    }

    /// New set with every record packed
    pub fn pack_contours(&self) -> Result<ContourSet> {
        let mut result = ContourSet::new();
        let mut packed = Vec::new();
        for k in 0..self.len() {
            let header = self.header(k)?;
            pack::pack_into(&mut packed, self.contour_points(k)?)?;
            result.add_contour(&header, &packed)?;
        }
        Ok(result)
    }

    /// New set with every record unpacked to unit steps
    pub fn unpack_contours(&self, diagonal: bool) -> Result<ContourSet> {
        Ok(self.unpack_contours_with_areas(diagonal)?.0)
    }

    /// Like [`unpack_contours`](Self::unpack_contours), also returning each doubled area
    pub fn unpack_contours_with_areas(&self, diagonal: bool) -> Result<(ContourSet, Vec<i64>)> {
        let mut result = ContourSet::new();
        let mut areas = Vec::with_capacity(self.len());
        let mut unpacked = Vec::new();
        for k in 0..self.len() {
            let header = self.header(k)?;
            let area = pack::unpack_into(&mut unpacked, self.contour_points(k)?, diagonal)?;
            result.add_contour(&header, &unpacked)?;
            areas.push(area);
        }
        Ok((result, areas))
    }

    pub fn header(&self, index: usize) -> Result<ContourHeader> {
        self.check_index(index)?;
        ContourHeader::read_from(&self.points, self.header_offsets[index])
    }

    pub fn rectangle(&self, index: usize) -> Result<Rect> {
        self.check_index(index)?;
        let r = self.header_offsets[index] + RECTANGLE_OFFSET;
        Ok(Rect::new(
            self.points[r],
            self.points[r + 1],
            self.points[r + 2],
            self.points[r + 3],
        ))
    }

    pub fn label(&self, index: usize) -> Result<i32> {
        self.check_index(index)?;
        Ok(self.points[self.header_offsets[index] + LABEL_OFFSET])
    }

    pub fn set_label(&mut self, index: usize, label: i32) -> Result<()> {
        self.check_index(index)?;
        let p = self.header_offsets[index];
        self.points[p + LABEL_OFFSET] = label;
        Ok(())
    }

    pub fn frame_id(&self, index: usize) -> Result<Option<i32>> {
        self.check_index(index)?;
        let p = self.header_offsets[index];
        Ok((self.points[p + FLAGS_OFFSET] & HAS_FRAME_ID_FLAG != 0)
            .then(|| self.points[p + FRAME_ID_OFFSET]))
    }

    pub fn is_internal(&self, index: usize) -> Result<bool> {
        self.check_index(index)?;
        Ok(self.points[self.header_offsets[index] + FLAGS_OFFSET] & INTERNAL_FLAG != 0)
    }

    pub fn all_labels(&self) -> Vec<i32> {
        self.header_offsets
            .iter()
            .map(|&p| self.points[p + LABEL_OFFSET])
            .collect()
    }

    pub fn all_internal(&self) -> Vec<bool> {
        self.header_offsets
            .iter()
            .map(|&p| self.points[p + FLAGS_OFFSET] & INTERNAL_FLAG != 0)
            .collect()
    }

    /// Frame id of every record, `absent` for records without one
    pub fn all_frame_ids(&self, absent: i32) -> Vec<i32> {
        self.header_offsets
            .iter()
            .map(|&p| {
                if self.points[p + FLAGS_OFFSET] & HAS_FRAME_ID_FLAG != 0 {
                    self.points[p + FRAME_ID_OFFSET]
                } else {
                    absent
                }
            })
            .collect()
    }

    pub fn point_inside_status(
        &self,
        index: usize,
        x: f64,
        y: f64,
        surely_unpacked: bool,
    ) -> Result<InsideStatus> {
        inside::point_inside_status(self.contour_points(index)?, x, y, surely_unpacked)
    }

    pub fn is_point_strictly_inside(
        &self,
        index: usize,
        x: f64,
        y: f64,
        surely_unpacked: bool,
    ) -> Result<bool> {
        Ok(self
            .point_inside_status(index, x, y, surely_unpacked)?
            .is_strictly_inside())
    }

    pub fn find_some_point_inside(
        &self,
        index: usize,
        surely_unpacked: bool,
    ) -> Result<Option<(f64, f64)>> {
        inside::find_some_point_inside(self.contour_points(index)?, surely_unpacked)
    }

    pub fn strict_perimeter(&self, index: usize) -> Result<f64> {
        measure::strict_perimeter(self.contour_points(index)?)
    }

    pub fn segment_centers_perimeter(&self, index: usize) -> Result<f64> {
        measure::segment_centers_perimeter(self.contour_points(index)?)
    }

    pub fn strict_area(&self, index: usize) -> Result<f64> {
        measure::strict_area(self.contour_points(index)?)
    }

    pub fn segment_centers_area(&self, index: usize) -> Result<f64> {
        measure::segment_centers_area(self.contour_points(index)?)
    }

    pub fn precise_doubled_area(&self, index: usize) -> Result<i64> {
        measure::precise_doubled_area(self.contour_points(index)?)
    }

    /// Sorts contour indexes by label; equal labels put internal (or external) contours first
    pub fn sort_indexes_by_labels(
        &self,
        indexes: &mut [usize],
        internal_first: bool,
    ) -> Result<()> {
        if let Some(&bad) = indexes.iter().find(|&&k| k >= self.len()) {
            return Err(Error::IndexOutOfBounds {
                index: bad,
                len: self.len(),
            });
        }
        let key = |k: usize| {
            let p = self.header_offsets[k];
            let internal = self.points[p + FLAGS_OFFSET] & INTERNAL_FLAG != 0;
            (self.points[p + LABEL_OFFSET], internal != internal_first)
        };
        indexes.sort_by_key(|&k| key(k));
        Ok(())
    }

    /// Sorts contour indexes by their exact doubled area
    pub fn sort_indexes_by_precise_area(
        &self,
        indexes: &mut [usize],
        absolute: bool,
        greater_first: bool,
    ) -> Result<()> {
        let areas = indexes
            .par_iter()
            .map(|&k| -> Result<i64> {
                let area = self.precise_doubled_area(k)?;
                let area = if absolute { area.abs() } else { area };
                Ok(if greater_first { -area } else { area })
            })
            .collect::<Result<Vec<i64>>>()?;
        let mut pairs: Vec<(i64, usize)> = areas.into_iter().zip(indexes.iter().copied()).collect();
        pairs.sort_by_key(|&(area, _)| area);
        for (slot, (_, k)) in indexes.iter_mut().zip(pairs) {
            *slot = k;
        }
        Ok(())
    }

    fn header_length_at(&self, header_offset: usize) -> usize {
        (self.points[header_offset] & HEADER_LENGTH_MASK) as usize
    }

    fn record_end(&self, index: usize) -> usize {
        self.header_offsets
            .get(index + 1)
            .copied()
            .unwrap_or(self.points.len())
    }

    fn write_rectangle(&mut self, header_offset: usize, rect: Rect) {
        let r = header_offset + RECTANGLE_OFFSET;
        self.points[r] = rect.min_x;
        self.points[r + 1] = rect.max_x;
        self.points[r + 2] = rect.min_y;
        self.points[r + 3] = rect.max_y;
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                len: self.len(),
            });
        }
        Ok(())
    }

    fn check_range(&self, range: &Range<usize>) -> Result<()> {
        if range.start > range.end {
            return Err(Error::invalid(format!(
                "from = {} > to = {}",
                range.start, range.end
            )));
        }
        if range.end > self.len() {
            return Err(Error::IndexOutOfBounds {
                index: range.end - 1,
                len: self.len(),
            });
        }
        Ok(())
    }

    fn check_closed(&self) -> Result<()> {
        if self.open.is_some() {
            return Err(Error::state("cannot modify contours while a contour is open"));
        }
        Ok(())
    }

    fn check_contours_capacity(&self) -> Result<()> {
        if self.len() >= MAX_NUMBER_OF_CONTOURS {
            return Err(Error::capacity(format!(
                "cannot add contour: the number of contours is already maximal \
                 ({MAX_NUMBER_OF_CONTOURS})"
            )));
        }
        Ok(())
    }

    fn check_buffer_capacity(&self, added: usize) -> Result<()> {
        if self.points.len() + added > MAX_BUFFER_LENGTH {
            return Err(Error::capacity(format!(
                "too large contour buffer: {} + {added} > {MAX_BUFFER_LENGTH} elements",
                self.points.len()
            )));
        }
        Ok(())
    }
}

impl PartialEq for ContourSet {
    fn eq(&self, other: &Self) -> bool {
        self.points == other.points
    }
}

impl Eq for ContourSet {}

impl fmt::Display for ContourSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} contours ({} words)",
            self.len(),
            self.points.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_set() -> ContourSet {
        let mut set = ContourSet::new();
        set.add_contour(&ContourHeader::new(1), &[0, 0, 2, 0, 2, 2, 0, 2])
            .unwrap();
        set.add_contour(
            &ContourHeader::with_internal(2, true),
            &[10, 10, 10, 13, 13, 13, 13, 10],
        )
        .unwrap();
        set
    }

    #[test]
    fn test_add_contour_computes_rectangle() {
        let set = square_set();
        assert_eq!(set.len(), 2);
        assert_eq!(set.rectangle(1).unwrap(), Rect::new(10, 13, 10, 13));
        assert_eq!(set.contour_points(0).unwrap(), &[0, 0, 2, 0, 2, 2, 0, 2]);
        assert_eq!(set.number_of_points(1).unwrap(), 4);
        assert!(set.is_internal(1).unwrap());
        assert_eq!(set.all_labels(), vec![1, 2]);
    }

    #[test]
    fn test_incremental_construction_with_optimization() {
        let mut set = ContourSet::new();
        set.set_optimize_collinear_steps(true);
        let mut header = ContourHeader::new(5);
        header.set_frame_id(Some(3));
        set.open_contour(&header).unwrap();
        assert!(set.add_contour(&header, &[0, 0]).is_err());
        for (x, y) in [(0, 0), (1, 0), (2, 0), (2, 0), (2, 1), (2, 2), (1, 2), (0, 2), (0, 1)] {
            set.add_point(x, y).unwrap();
        }
        set.close_contour(&header).unwrap();
        assert_eq!(
            set.contour_points(0).unwrap(),
            &[0, 0, 2, 0, 2, 2, 0, 2, 0, 1]
        );
        assert_eq!(set.frame_id(0).unwrap(), Some(3));
        assert_eq!(set.rectangle(0).unwrap(), Rect::new(0, 2, 0, 2));
    }

    #[test]
    fn test_state_errors() {
        let mut set = ContourSet::new();
        assert!(matches!(set.add_point(0, 0), Err(Error::State(_))));
        assert!(matches!(
            set.close_contour(&ContourHeader::new(0)),
            Err(Error::State(_))
        ));
        set.open_contour(&ContourHeader::new(0)).unwrap();
        assert!(matches!(
            set.open_contour(&ContourHeader::new(0)),
            Err(Error::State(_))
        ));
        assert!(matches!(
            set.close_contour(&ContourHeader::new(0)),
            Err(Error::State(_))
        ));
        // the empty record was rolled back
        assert!(set.as_serialized().is_empty());
        assert!(matches!(set.remove_last_contour(), Err(Error::State(_))));
    }

    #[test]
    fn test_touch_flags_are_recorded() {
        let mut set = ContourSet::new();
        set.open_contour(&ContourHeader::new(0)).unwrap();
        set.add_point_touching(
            0,
            0,
            BoundaryTouch {
                min_x: true,
                ..BoundaryTouch::NONE
            },
        )
        .unwrap();
        set.close_contour(&ContourHeader::new(0)).unwrap();
        assert!(set.header(0).unwrap().touch().min_x);
        assert!(!set.header(0).unwrap().touch().max_y);
    }

    #[test]
    fn test_out_of_range_point() {
        let mut set = ContourSet::new();
        set.open_contour(&ContourHeader::new(0)).unwrap();
        assert!(matches!(
            set.add_point(1 << 31, 0),
            Err(Error::OutOfRange(_))
        ));
    }

    #[test]
    fn test_deserialize_round_trip() {
        let set = square_set();
        let copy = ContourSet::deserialize(&set.serialize()).unwrap();
        assert_eq!(copy, set);
        assert_eq!(copy.header(1).unwrap(), set.header(1).unwrap());
    }

    #[test]
    fn test_deserialize_rejects_bad_magic() {
        let mut words = square_set().serialize();
        let second = 8 + 8;
        words[second] = 12345;
        match ContourSet::deserialize(&words) {
            Err(Error::Format { position, message }) => {
                assert_eq!(position, second);
                assert!(message.contains("contour #1"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_deserialize_rejects_truncation() {
        let words = square_set().serialize();
        assert!(ContourSet::deserialize(&words[..words.len() - 2]).is_err());
    }

    #[test]
    fn test_range_copy_and_removal() {
        let mut set = square_set();
        set.add_contour(&ContourHeader::new(3), &[5, 5]).unwrap();
        let middle = set.contours_range(1..3).unwrap();
        assert_eq!(middle.len(), 2);
        assert_eq!(middle.label(1).unwrap(), 3);
        assert_eq!(middle.contour_points(0).unwrap(), set.contour_points(1).unwrap());

        set.remove_contour(1).unwrap();
        assert_eq!(set.all_labels(), vec![1, 3]);
        assert_eq!(set.contour_points(1).unwrap(), &[5, 5]);
        assert!(ContourSet::deserialize(set.as_serialized()).is_ok());
        assert!(set.remove_contours_range(1..3).is_err());
    }

    #[test]
    fn test_transform_inverts_orientation() {
        let set = square_set();
        let mirrored = set.transform_contours(-1.0, 1.0, 0.0, 0.0, false).unwrap();
        assert!(mirrored.is_internal(0).unwrap());
        assert!(!mirrored.is_internal(1).unwrap());
        assert_eq!(mirrored.rectangle(0).unwrap(), Rect::new(-2, 0, 0, 2));
        assert_eq!(
            mirrored.precise_doubled_area(0).unwrap(),
            -set.precise_doubled_area(0).unwrap()
        );
    }

    #[test]
    fn test_transform_removes_degenerated() {
        let set = square_set();
        let flattened = set.transform_contours(0.1, 0.1, 0.0, 0.0, true).unwrap();
        // 0..2 collapses to 0..0, 10..13 becomes 1..1
        assert!(flattened.is_empty());
    }

    #[test]
    fn test_sorting() {
        let mut set = square_set();
        set.add_contour(&ContourHeader::with_internal(1, true), &[0, 0, 9, 0, 9, 9, 0, 9])
            .unwrap();
        let mut indexes = vec![0, 1, 2];
        set.sort_indexes_by_labels(&mut indexes, true).unwrap();
        assert_eq!(indexes, vec![2, 0, 1]);
        set.sort_indexes_by_precise_area(&mut indexes, true, true)
            .unwrap();
        assert_eq!(indexes, vec![2, 1, 0]);
        assert!(set.sort_indexes_by_precise_area(&mut [7], true, true).is_err());
    }

    #[test]
    fn test_pack_and_unpack_contours() {
        let set = square_set();
        let (unpacked, areas) = set.unpack_contours_with_areas(false).unwrap();
        assert_eq!(unpacked.number_of_points(0).unwrap(), 8);
        assert_eq!(areas, vec![8, -18]);
        let packed = unpacked.pack_contours().unwrap();
        assert_eq!(packed.number_of_points(0).unwrap(), 4);
        assert_eq!(packed.rectangle(1).unwrap(), set.rectangle(1).unwrap());
    }
}
