//! `.ctrs` file format - a serialized `ContourSet` with integrity footer
//!
//! Format (little-endian):
//!
//! Header (24 bytes):
//!   magic:    u32 = 0x43545253  // "CTRS"
//!   version:  u16 = 1
//!   reserved: u16 = 0
//!   count:    u64 = number of contours
//!   words:    u64 = number of i32 words in the body
//!
//! Body (4 * words bytes):
//!   the serialized contour buffer as i32 words
//!
//! Footer (8 bytes):
//!   file_crc64: u64 over header + body

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use contour_common::{Error, Result};
use tracing::debug;

use super::crc::Digest;
use crate::set::ContourSet;

const MAGIC: u32 = 0x4354_5253; // "CTRS"
const VERSION: u16 = 1;
const HEADER_SIZE: usize = 24; // 4 + 2 + 2 + 8 + 8
const CHUNK_WORDS: usize = 64 * 1024;

/// Write a contour set to `path`
pub fn write_contours<P: AsRef<Path>>(path: P, set: &ContourSet) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write_contours_to(&mut writer, set)?;
    writer.flush()?;
    debug!(
        path = %path.as_ref().display(),
        contours = set.len(),
        "wrote contour file"
    );
    Ok(())
}

/// Write a contour set to any byte sink
pub fn write_contours_to<W: Write>(writer: &mut W, set: &ContourSet) -> Result<()> {
    let words = set.as_serialized();
    let mut header = Vec::with_capacity(HEADER_SIZE);
    header.extend_from_slice(&MAGIC.to_le_bytes());
    header.extend_from_slice(&VERSION.to_le_bytes());
    header.extend_from_slice(&0u16.to_le_bytes());
    header.extend_from_slice(&(set.len() as u64).to_le_bytes());
    header.extend_from_slice(&(words.len() as u64).to_le_bytes());
    debug_assert_eq!(header.len(), HEADER_SIZE);

    let mut digest = Digest::new();
    digest.update(&header);
    writer.write_all(&header)?;

    let mut bytes = Vec::with_capacity(4 * CHUNK_WORDS.min(words.len()));
    for chunk in words.chunks(CHUNK_WORDS) {
        bytes.clear();
        for word in chunk {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        digest.update(&bytes);
        writer.write_all(&bytes)?;
    }

    writer.write_all(&digest.finalize().to_le_bytes())?;
    Ok(())
}

/// Read and fully validate a contour file
pub fn read_contours<P: AsRef<Path>>(path: P) -> Result<ContourSet> {
    let file = File::open(path.as_ref())?;
    let set = read_contours_from(&mut BufReader::new(file))?;
    debug!(
        path = %path.as_ref().display(),
        contours = set.len(),
        "read contour file"
    );
    Ok(set)
}

/// Read a contour set from any byte source
pub fn read_contours_from<R: Read>(reader: &mut R) -> Result<ContourSet> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let magic = u32::from_le_bytes(header[0..4].try_into().map_err(|_| bad_header())?);
    if magic != MAGIC {
        return Err(Error::format(
            0,
            format!("invalid magic: expected 0x{MAGIC:08x}, got 0x{magic:08x}"),
        ));
    }
    let version = u16::from_le_bytes(header[4..6].try_into().map_err(|_| bad_header())?);
    if version != VERSION {
        return Err(Error::format(4, format!("unsupported version {version}")));
    }
    let count = u64::from_le_bytes(header[8..16].try_into().map_err(|_| bad_header())?);
    let n_words = u64::from_le_bytes(header[16..24].try_into().map_err(|_| bad_header())?);
    if n_words > i32::MAX as u64 {
        return Err(Error::format(
            16,
            format!("too many words in contour file: {n_words}"),
        ));
    }
    let n_words = n_words as usize;

    let mut digest = Digest::new();
    digest.update(&header);

    let mut words = Vec::with_capacity(n_words);
    let mut bytes = vec![0u8; 4 * CHUNK_WORDS.min(n_words)];
    let mut remaining = n_words;
    while remaining > 0 {
        let chunk = remaining.min(CHUNK_WORDS);
        let buf = &mut bytes[..4 * chunk];
        reader.read_exact(buf)?;
        digest.update(buf);
        words.extend(
            buf.chunks_exact(4)
                .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]])),
        );
        remaining -= chunk;
    }

    let mut footer = [0u8; 8];
    reader.read_exact(&mut footer)?;
    let stored_crc = u64::from_le_bytes(footer);
    let computed_crc = digest.finalize();
    if stored_crc != computed_crc {
        return Err(Error::format(
            HEADER_SIZE + 4 * n_words,
            format!("CRC mismatch: stored 0x{stored_crc:016x}, computed 0x{computed_crc:016x}"),
        ));
    }

    let set = ContourSet::deserialize(&words)?;
    if set.len() as u64 != count {
        return Err(Error::format(
            8,
            format!(
                "header declares {count} contours, but the body contains {}",
                set.len()
            ),
        ));
    }
    Ok(set)
}

fn bad_header() -> Error {
    Error::format(0, "truncated contour file header")
}
