//! Container header and coordinate-reference-system preamble.
//!
//! # Layout
//! ```text
//! 0x00: magic       [u8; 4]  "REX1"
//! 0x04: version     u16
//! 0x06: crc         u32      always 0, never validated
//! 0x0A: nr_blocks   u16
//! 0x0C: start_addr  u16      offset of the first block
//! 0x0E: size_bytes  u64      sum of all block sizes, frames included
//! 0x16: reserved    [u8; 42]
//! 0x40: srid        u32      ─┐
//! 0x44: name_len    u16       │ CRS preamble
//! 0x46: name        [u8; n]   │
//!  var: origin      3×f32    ─┘
//! ```
//! With the default CRS name `"EPSG"` the preamble ends at byte 86.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use glam::Vec3;
use std::fmt;
use std::io::{self, Read, Write};

use crate::codec::primitives::{ReadVecExt, WriteVecExt};
use crate::error::{Result, RexError};

pub const MAGIC: &[u8; 4] = b"REX1";
pub const VERSION: u16 = 1;

/// Fixed header fields, CRS excluded.
pub const HEADER_FIXED_SIZE: usize = 64;
/// Header plus the default 22-byte CRS preamble.
pub const DEFAULT_START_ADDR: u16 = 86;

const RESERVED_LEN: usize = 42;

// ── Coordinate reference system ──────────────────────────────────────────────

/// Carried opaquely; the codec never interprets it.
#[derive(Debug, Clone, PartialEq)]
pub struct Crs {
    pub srid:   u32,
    pub name:   String,
    pub origin: Vec3,
}

impl Default for Crs {
    fn default() -> Self {
        Self {
            srid:   3876,
            name:   "EPSG".to_owned(),
            origin: Vec3::ZERO,
        }
    }
}

impl Crs {
    /// Bytes the preamble occupies on disk.
    pub fn encoded_len(&self) -> usize {
        4 + 2 + self.name_bytes().len() + 12
    }

    fn name_bytes(&self) -> &[u8] {
        let bytes = self.name.as_bytes();
        &bytes[..bytes.len().min(u16::MAX as usize)]
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        let name = self.name_bytes();
        writer.write_u32::<LittleEndian>(self.srid)?;
        writer.write_u16::<LittleEndian>(name.len() as u16)?;
        writer.write_all(name)?;
        writer.write_vec3(self.origin)?;
        Ok(())
    }

    pub fn read<R: Read>(mut reader: R) -> Result<Self> {
        let read = |r: &mut R| -> io::Result<Self> {
            let srid = r.read_u32::<LittleEndian>()?;
            let len  = r.read_u16::<LittleEndian>()?;
            let mut name = vec![0u8; len as usize];
            r.read_exact(&mut name)?;
            let origin = r.read_vec3()?;
            Ok(Self { srid, name: String::from_utf8_lossy(&name).into_owned(), origin })
        };
        read(&mut reader).map_err(|e| RexError::from_io(e, "coordinate system preamble"))
    }
}

// ── Header ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub magic:      [u8; 4],
    pub version:    u16,
    pub crc:        u32,
    pub nr_blocks:  u16,
    pub start_addr: u16,
    pub size_bytes: u64,
    pub crs:        Crs,
}

impl Default for Header {
    fn default() -> Self {
        Self::new()
    }
}

impl Header {
    pub fn new() -> Self {
        Self::with_crs(Crs::default())
    }

    pub fn with_crs(crs: Crs) -> Self {
        let start = HEADER_FIXED_SIZE + crs.encoded_len();
        Self {
            magic:      *MAGIC,
            version:    VERSION,
            crc:        0,
            nr_blocks:  0,
            start_addr: u16::try_from(start).unwrap_or(u16::MAX),
            size_bytes: 0,
            crs,
        }
    }

    /// Bytes written by [`Header::write`].
    pub fn encoded_len(&self) -> usize {
        HEADER_FIXED_SIZE + self.crs.encoded_len()
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(&self.magic)?;
        writer.write_u16::<LittleEndian>(self.version)?;
        writer.write_u32::<LittleEndian>(self.crc)?;
        writer.write_u16::<LittleEndian>(self.nr_blocks)?;
        writer.write_u16::<LittleEndian>(self.start_addr)?;
        writer.write_u64::<LittleEndian>(self.size_bytes)?;
        writer.write_all(&[0u8; RESERVED_LEN])?;
        self.crs.write(&mut writer)
    }

    /// Read the fixed fields and the CRS preamble.  Magic and version are
    /// returned as found; see [`Header::validate`].
    pub fn read<R: Read>(mut reader: R) -> Result<Self> {
        let read = |r: &mut R| -> io::Result<([u8; 4], u16, u32, u16, u16, u64)> {
            let mut magic = [0u8; 4];
            r.read_exact(&mut magic)?;
            let version    = r.read_u16::<LittleEndian>()?;
            let crc        = r.read_u32::<LittleEndian>()?;
            let nr_blocks  = r.read_u16::<LittleEndian>()?;
            let start_addr = r.read_u16::<LittleEndian>()?;
            let size_bytes = r.read_u64::<LittleEndian>()?;
            let mut reserved = [0u8; RESERVED_LEN];
            r.read_exact(&mut reserved)?;
            Ok((magic, version, crc, nr_blocks, start_addr, size_bytes))
        };
        let (magic, version, crc, nr_blocks, start_addr, size_bytes) =
            read(&mut reader).map_err(|e| RexError::from_io(e, "file header"))?;
        let crs = Crs::read(&mut reader)?;
        Ok(Self { magic, version, crc, nr_blocks, start_addr, size_bytes, crs })
    }

    pub fn validate(&self) -> Result<()> {
        if &self.magic != MAGIC {
            return Err(RexError::InvalidMagic(self.magic));
        }
        if self.version != VERSION {
            return Err(RexError::UnsupportedFormatVersion(self.version));
        }
        Ok(())
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "| MAGIC          | {:<41} |", String::from_utf8_lossy(&self.magic))?;
        writeln!(f, "| Version        | {:<41} |", self.version)?;
        writeln!(f, "| CRC            | {:<41} |", self.crc)?;
        writeln!(f, "| NrBlocks       | {:<41} |", self.nr_blocks)?;
        writeln!(f, "| StartAddr      | {:<41} |", self.start_addr)?;
        writeln!(f, "| SizeBytes      | {:<41} |", self.size_bytes)?;
        writeln!(f, "| CRS            | {:<41} |",
            format!("{}:{} @ {}", self.crs.name, self.crs.srid, self.crs.origin))
    }
}
