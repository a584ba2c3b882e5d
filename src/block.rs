//! Per-block framing: the 16-byte `{type, version, size, id}` header that
//! precedes every payload in the stream.
//!
//! ```text
//! 0x00: type    u16
//! 0x02: version u16
//! 0x04: size    u32   payload bytes, frame excluded
//! 0x08: id      u64
//! ```

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fmt;
use std::io::{self, Read, Write};

use crate::error::{Result, RexError};

/// Size of the block frame on disk.
pub const BLOCK_HEADER_SIZE: usize = 16;

/// Sentinel id meaning "no block referenced".
pub const NOT_SPECIFIED: u64 = u64::MAX;

pub(crate) fn ref_to_wire(id: Option<u64>) -> u64 {
    id.unwrap_or(NOT_SPECIFIED)
}

pub(crate) fn ref_from_wire(raw: u64) -> Option<u64> {
    if raw == NOT_SPECIFIED { None } else { Some(raw) }
}

// ── Block type tags ──────────────────────────────────────────────────────────

/// Wire tag of a data block.  Tags 0–7 are the core range; 8 and up are
/// extension blocks.  `Unknown` keeps any tag this build cannot decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    LineSet,
    Text,
    PointList,
    Mesh,
    Image,
    Material,
    PeopleSimulation,
    UnityPackage,
    SceneNode,
    Track,
    Unknown(u16),
}

impl BlockType {
    pub fn tag(self) -> u16 {
        match self {
            BlockType::LineSet          => 0,
            BlockType::Text             => 1,
            BlockType::PointList        => 2,
            BlockType::Mesh             => 3,
            BlockType::Image            => 4,
            BlockType::Material         => 5,
            BlockType::PeopleSimulation => 6,
            BlockType::UnityPackage     => 7,
            BlockType::SceneNode        => 8,
            BlockType::Track            => 9,
            BlockType::Unknown(t)       => t,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BlockType::LineSet          => "LineSet",
            BlockType::Text             => "Text",
            BlockType::PointList        => "PointList",
            BlockType::Mesh             => "Mesh",
            BlockType::Image            => "Image",
            BlockType::Material         => "Material",
            BlockType::PeopleSimulation => "PeopleSimulation",
            BlockType::UnityPackage     => "UnityPackage",
            BlockType::SceneNode        => "SceneNode",
            BlockType::Track            => "Track",
            BlockType::Unknown(_)       => "Unknown",
        }
    }
}

impl From<u16> for BlockType {
    fn from(tag: u16) -> Self {
        match tag {
            0 => BlockType::LineSet,
            1 => BlockType::Text,
            2 => BlockType::PointList,
            3 => BlockType::Mesh,
            4 => BlockType::Image,
            5 => BlockType::Material,
            6 => BlockType::PeopleSimulation,
            7 => BlockType::UnityPackage,
            8 => BlockType::SceneNode,
            9 => BlockType::Track,
            t => BlockType::Unknown(t),
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockType::Unknown(t) => write!(f, "Unknown({t})"),
            other                 => f.write_str(other.name()),
        }
    }
}

// ── Frame ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataBlockHeader {
    pub block_type: BlockType,
    pub version:    u16,
    /// Payload length in bytes, excluding this frame.
    pub size:       u32,
    pub id:         u64,
}

impl DataBlockHeader {
    pub fn new(block_type: BlockType, version: u16, id: u64, size: u32) -> Self {
        Self { block_type, version, size, id }
    }

    /// Total bytes occupied by frame plus payload.
    pub fn total_size(&self) -> u64 {
        BLOCK_HEADER_SIZE as u64 + self.size as u64
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u16::<LittleEndian>(self.block_type.tag())?;
        writer.write_u16::<LittleEndian>(self.version)?;
        writer.write_u32::<LittleEndian>(self.size)?;
        writer.write_u64::<LittleEndian>(self.id)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> [u8; BLOCK_HEADER_SIZE] {
        let mut bytes = [0u8; BLOCK_HEADER_SIZE];
        bytes[0..2].copy_from_slice(&self.block_type.tag().to_le_bytes());
        bytes[2..4].copy_from_slice(&self.version.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.size.to_le_bytes());
        bytes[8..16].copy_from_slice(&self.id.to_le_bytes());
        bytes
    }

    /// Read one frame.  Fails with `Truncated` if the stream ends anywhere
    /// inside the 16 bytes, including before the first one.
    pub fn read<R: Read>(mut reader: R) -> Result<Self> {
        let read = |r: &mut R| -> io::Result<Self> {
            Ok(Self {
                block_type: BlockType::from(r.read_u16::<LittleEndian>()?),
                version:    r.read_u16::<LittleEndian>()?,
                size:       r.read_u32::<LittleEndian>()?,
                id:         r.read_u64::<LittleEndian>()?,
            })
        };
        read(&mut reader).map_err(|e| RexError::from_io(e, "block header"))
    }

    /// Read one frame, returning `Ok(None)` when the stream ends exactly on a
    /// block boundary.  A partial frame is `Truncated`.
    pub fn read_next<R: Read>(mut reader: R) -> Result<Option<Self>> {
        let mut buf = [0u8; BLOCK_HEADER_SIZE];
        let mut filled = 0;
        while filled < BLOCK_HEADER_SIZE {
            match reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(RexError::from_io(e, "block header")),
            }
        }
        match filled {
            0 => Ok(None),
            BLOCK_HEADER_SIZE => Self::read(&buf[..]).map(Some),
            _ => Err(RexError::Truncated { context: "block header" }),
        }
    }
}
