//! Contour record header codec
//!
//! Every record in a [`ContourSet`](crate::ContourSet) buffer starts with a fixed-layout
//! header of 8 words (10 when a frame id is present):
//!
//! | word | content |
//! |------|---------|
//! | 0 | `MAGIC \| header_length` |
//! | 1 | full record length (header + 2 * points) |
//! | 2..=5 | `min_x, max_x, min_y, max_y` |
//! | 6 | `RESERVED_INDICATOR \| flags` |
//! | 7 | object label |
//! | 8, 9 | `RESERVED_INDICATOR`, frame id (optional) |
//!
//! The high byte `0x7F` of the tag and flag words can never be a legal coordinate, which is
//! what makes the buffer self-describing.

use std::fmt;

use contour_common::{Error, Result};

use crate::point::{check_point_i64, round_half_up, MAX_COORDINATE, MIN_COORDINATE};

pub const RESERVED: i32 = 0x7F00_0000;

pub(crate) const MAX_ALLOWED_HEADER_LENGTH: usize = 512;
pub(crate) const HEADER_LENGTH_WITHOUT_FRAME_ID: usize = 8;
pub(crate) const HEADER_LENGTH_WITH_FRAME_ID: usize = HEADER_LENGTH_WITHOUT_FRAME_ID + 2;
pub(crate) const MIN_HEADER_LENGTH: usize = HEADER_LENGTH_WITHOUT_FRAME_ID;

pub(crate) const RECTANGLE_OFFSET: usize = 2;
pub(crate) const FLAGS_OFFSET: usize = 6;
pub(crate) const LABEL_OFFSET: usize = 7;
pub(crate) const FRAME_ID_OFFSET: usize = 9;

pub(crate) const HEADER_LENGTH_MASK: i32 = 0xFF;
pub(crate) const MAGIC_WORD_MASK: i32 = 0xFFFF_FF00_u32 as i32;
pub(crate) const MAGIC_WORD: i32 = RESERVED | 0x0043_3100;
pub(crate) const RESERVED_INDICATOR: i32 = 0x7FFF_0000;

pub(crate) const INTERNAL_FLAG: i32 = 0x001;
pub(crate) const TOUCHES_MIN_X_FLAG: i32 = 0x010;
pub(crate) const TOUCHES_MAX_X_FLAG: i32 = 0x020;
pub(crate) const TOUCHES_MIN_Y_FLAG: i32 = 0x040;
pub(crate) const TOUCHES_MAX_Y_FLAG: i32 = 0x080;
pub(crate) const HAS_FRAME_ID_FLAG: i32 = 0x100;

#[inline]
pub(crate) fn is_reserved(value: i32) -> bool {
    (value & 0xFF00_0000_u32 as i32) == RESERVED
}

#[inline]
pub(crate) fn is_record_start(value: i32) -> bool {
    (value & MAGIC_WORD_MASK) == MAGIC_WORD
}

/// Integer bounding rectangle, inclusive on both ends
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rect {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl Rect {
    /// Sentinel written into records whose rectangle is not known yet
    pub(crate) const UNKNOWN: Rect = Rect {
        min_x: i32::MAX,
        max_x: i32::MIN,
        min_y: i32::MAX,
        max_y: i32::MIN,
    };

    pub fn new(min_x: i32, max_x: i32, min_y: i32, max_y: i32) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Bounding rectangle of a non-empty raw point sequence
    pub fn of_points(points: &[i32]) -> Self {
        debug_assert!(points.len() >= 2);
        let mut rect = Rect::new(points[0], points[0], points[1], points[1]);
        for p in points.chunks_exact(2).skip(1) {
            rect.include(p[0], p[1]);
        }
        rect
    }

    #[inline]
    pub fn include(&mut self, x: i32, y: i32) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new(
            self.min_x.min(other.min_x),
            self.max_x.max(other.max_x),
            self.min_y.min(other.min_y),
            self.max_y.max(other.max_y),
        )
    }

    /// Intersection of two rectangles, or `None` when they do not overlap
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let r = Rect::new(
            self.min_x.max(other.min_x),
            self.max_x.min(other.max_x),
            self.min_y.max(other.min_y),
            self.max_y.min(other.max_y),
        );
        (r.min_x <= r.max_x && r.min_y <= r.max_y).then_some(r)
    }

    #[inline]
    pub fn width(&self) -> i64 {
        self.max_x as i64 - self.min_x as i64 + 1
    }

    #[inline]
    pub fn height(&self) -> i64 {
        self.max_y as i64 - self.min_y as i64 + 1
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}x{}..{}",
            self.min_x, self.max_x, self.min_y, self.max_y
        )
    }
}

/// Which borders of the scanned raster a contour touches
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoundaryTouch {
    pub min_x: bool,
    pub max_x: bool,
    pub min_y: bool,
    pub max_y: bool,
}

impl BoundaryTouch {
    pub const NONE: BoundaryTouch = BoundaryTouch {
        min_x: false,
        max_x: false,
        min_y: false,
        max_y: false,
    };

    pub(crate) fn flags(self) -> i32 {
        (if self.min_x { TOUCHES_MIN_X_FLAG } else { 0 })
            | (if self.max_x { TOUCHES_MAX_X_FLAG } else { 0 })
            | (if self.min_y { TOUCHES_MIN_Y_FLAG } else { 0 })
            | (if self.max_y { TOUCHES_MAX_Y_FLAG } else { 0 })
    }

    pub(crate) fn from_flags(flags: i32) -> Self {
        Self {
            min_x: flags & TOUCHES_MIN_X_FLAG != 0,
            max_x: flags & TOUCHES_MAX_X_FLAG != 0,
            min_y: flags & TOUCHES_MIN_Y_FLAG != 0,
            max_y: flags & TOUCHES_MAX_Y_FLAG != 0,
        }
    }

    pub fn any(self) -> bool {
        self.min_x || self.max_x || self.min_y || self.max_y
    }
}

/// Metadata of one contour record
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContourHeader {
    label: i32,
    rectangle: Option<Rect>,
    frame_id: Option<i32>,
    internal: bool,
    touch: BoundaryTouch,
}

impl ContourHeader {
    pub fn new(label: i32) -> Self {
        Self {
            label,
            ..Self::default()
        }
    }

    pub fn with_internal(label: i32, internal: bool) -> Self {
        Self {
            label,
            internal,
            ..Self::default()
        }
    }

    pub fn label(&self) -> i32 {
        self.label
    }

    pub fn set_label(&mut self, label: i32) -> &mut Self {
        self.label = label;
        self
    }

    pub fn frame_id(&self) -> Option<i32> {
        self.frame_id
    }

    pub fn set_frame_id(&mut self, frame_id: Option<i32>) -> &mut Self {
        self.frame_id = frame_id;
        self
    }

    pub fn is_internal(&self) -> bool {
        self.internal
    }

    pub fn set_internal(&mut self, internal: bool) -> &mut Self {
        self.internal = internal;
        self
    }

    pub fn touch(&self) -> BoundaryTouch {
        self.touch
    }

    pub fn set_touch(&mut self, touch: BoundaryTouch) -> &mut Self {
        self.touch = touch;
        self
    }

    pub fn rectangle(&self) -> Option<Rect> {
        self.rectangle
    }

    pub fn set_rectangle(&mut self, rectangle: Option<Rect>) -> &mut Self {
        self.rectangle = rectangle;
        self
    }

    pub fn clear_touching(&mut self) -> &mut Self {
        self.touch = BoundaryTouch::NONE;
        self
    }

    pub fn clear(&mut self) -> &mut Self {
        *self = Self::default();
        self
    }

    pub fn header_length(&self) -> usize {
        if self.frame_id.is_some() {
            HEADER_LENGTH_WITH_FRAME_ID
        } else {
            HEADER_LENGTH_WITHOUT_FRAME_ID
        }
    }

    pub(crate) fn flags_without_touching(&self) -> i32 {
        (if self.internal { INTERNAL_FLAG } else { 0 })
            | (if self.frame_id.is_some() {
                HAS_FRAME_ID_FLAG
            } else {
                0
            })
    }

    pub(crate) fn flags(&self) -> i32 {
        self.flags_without_touching() | self.touch.flags()
    }

    /// Maps the rectangle corners through `v * scale + shift` (rounded half up)
    pub fn transform_rectangle(
        &mut self,
        scale_x: f64,
        scale_y: f64,
        shift_x: f64,
        shift_y: f64,
    ) -> Result<()> {
        if let Some(r) = self.rectangle {
            let x1 = round_half_up(scale_x * r.min_x as f64 + shift_x);
            let y1 = round_half_up(scale_y * r.min_y as f64 + shift_y);
            check_point_i64(x1, y1)?;
            let x2 = round_half_up(scale_x * r.max_x as f64 + shift_x);
            let y2 = round_half_up(scale_y * r.max_y as f64 + shift_y);
            check_point_i64(x2, y2)?;
            self.rectangle = Some(Rect::new(
                x1.min(x2) as i32,
                x1.max(x2) as i32,
                y1.min(y2) as i32,
                y1.max(y2) as i32,
            ));
        }
        Ok(())
    }

    /// Appends the header words for a record of `number_of_points` points
    pub(crate) fn write_to(&self, buf: &mut Vec<i32>, number_of_points: usize) {
        let header_length = self.header_length();
        let rect = self.rectangle.unwrap_or(Rect::UNKNOWN);
        buf.push(MAGIC_WORD | header_length as i32);
        buf.push((2 * number_of_points + header_length) as i32);
        buf.push(rect.min_x);
        buf.push(rect.max_x);
        buf.push(rect.min_y);
        buf.push(rect.max_y);
        buf.push(RESERVED_INDICATOR | self.flags());
        buf.push(self.label);
        if let Some(frame_id) = self.frame_id {
            buf.push(RESERVED_INDICATOR);
            buf.push(frame_id);
        }
    }

    /// Decodes and validates the header of the record starting at `offset`
    pub(crate) fn read_from(buf: &[i32], offset: usize) -> Result<Self> {
        let rect_at = offset + RECTANGLE_OFFSET;
        let rect = Rect::new(
            buf[rect_at],
            buf[rect_at + 1],
            buf[rect_at + 2],
            buf[rect_at + 3],
        );
        if let Some(message) = rectangle_problem(&rect) {
            return Err(Error::format(rect_at, message));
        }
        let flags = buf[offset + FLAGS_OFFSET];
        let frame_id = if flags & HAS_FRAME_ID_FLAG != 0 {
            Some(buf[offset + FRAME_ID_OFFSET])
        } else {
            None
        };
        Ok(Self {
            label: buf[offset + LABEL_OFFSET],
            rectangle: Some(rect),
            frame_id,
            internal: flags & INTERNAL_FLAG != 0,
            touch: BoundaryTouch::from_flags(flags),
        })
    }
}

/// Describes why `rect` cannot be stored as a containing rectangle
fn rectangle_problem(rect: &Rect) -> Option<String> {
    if rect.min_x > rect.max_x || rect.min_y > rect.max_y {
        return Some(format!("negative sizes of containing rectangle {rect}"));
    }
    if rect.min_x < MIN_COORDINATE
        || rect.max_x > MAX_COORDINATE
        || rect.min_y < MIN_COORDINATE
        || rect.max_y > MAX_COORDINATE
    {
        return Some(format!(
            "containing rectangle {rect} is outside allowed range \
             {MIN_COORDINATE}..{MAX_COORDINATE}"
        ));
    }
    None
}

/// Checks a caller-supplied containing rectangle before it is written into a buffer
pub(crate) fn check_rectangle(rect: &Rect) -> Result<()> {
    match rectangle_problem(rect) {
        Some(message) => Err(Error::invalid(message)),
        None => Ok(()),
    }
}

impl fmt::Display for ContourHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "contour header: label {}", self.label)?;
        if let Some(frame_id) = self.frame_id {
            write!(f, ", frame {frame_id}")?;
        }
        f.write_str(if self.internal {
            ", internal"
        } else {
            ", external"
        })?;
        if let Some(rect) = self.rectangle {
            write!(f, ", containing rectangle {rect}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_layout_without_frame_id() {
        let mut header = ContourHeader::with_internal(42, true);
        header.set_rectangle(Some(Rect::new(1, 5, -2, 7)));
        let mut buf = Vec::new();
        header.write_to(&mut buf, 3);
        assert_eq!(buf.len(), 8);
        assert_eq!(buf[0], 0x7F43_3108);
        assert_eq!(buf[1], 14);
        assert_eq!(&buf[2..6], &[1, 5, -2, 7]);
        assert_eq!(buf[6], 0x7FFF_0001);
        assert_eq!(buf[7], 42);
    }

    #[test]
    fn test_frame_id_round_trip() {
        let mut header = ContourHeader::new(3);
        header
            .set_frame_id(Some(-9))
            .set_rectangle(Some(Rect::new(0, 0, 0, 0)))
            .set_touch(BoundaryTouch {
                min_x: true,
                max_y: true,
                ..BoundaryTouch::NONE
            });
        let mut buf = Vec::new();
        header.write_to(&mut buf, 1);
        assert_eq!(buf.len(), 10);
        assert_eq!(buf[0] & HEADER_LENGTH_MASK, 10);
        assert_eq!(buf[8], RESERVED_INDICATOR);
        let read = ContourHeader::read_from(&buf, 0).unwrap();
        assert_eq!(read, header);
    }

    #[test]
    fn test_read_rejects_inverted_rectangle() {
        let mut header = ContourHeader::new(0);
        header.set_rectangle(Some(Rect::new(5, 1, 0, 0)));
        let mut buf = vec![0; 4];
        header.write_to(&mut buf, 1);
        match ContourHeader::read_from(&buf, 4) {
            Err(Error::Format { position, .. }) => assert_eq!(position, 6),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_transform_rectangle_reorders_corners() {
        let mut header = ContourHeader::new(0);
        header.set_rectangle(Some(Rect::new(0, 10, 0, 4)));
        header.transform_rectangle(-1.0, 2.0, 0.0, 1.0).unwrap();
        assert_eq!(header.rectangle(), Some(Rect::new(-10, 0, 1, 9)));
    }

    #[test]
    fn test_reserved_detection() {
        assert!(is_reserved(MAGIC_WORD));
        assert!(is_reserved(RESERVED_INDICATOR));
        assert!(!is_reserved(MAX_COORDINATE));
        assert!(!is_reserved(MIN_COORDINATE));
    }

    #[test]
    fn test_display() {
        let mut header = ContourHeader::new(7);
        header.set_frame_id(Some(2));
        assert_eq!(
            header.to_string(),
            "contour header: label 7, frame 2, external"
        );
    }
}
