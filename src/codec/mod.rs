//! Block-type codecs.
//!
//! Each entity that can appear in a REX stream implements [`BlockCodec`]:
//! it knows its wire tag, its current payload version, its own encoded size
//! and how to read/write its payload.  Framing (the 16-byte
//! [`DataBlockHeader`]) is handled once, here, by the provided methods.
//!
//! # Decode contract
//! The decoder hands a codec exactly `header.size` bytes.  A codec that
//! runs out of bytes yields `Truncated`; one that leaves bytes unread yields
//! `BlockSizeMismatch`.  Element counts that cannot fit the declared size are
//! reported as `io::ErrorKind::InvalidData` and surface as `InvalidBlock`.
//! Either way the outer stream stays aligned on the next frame.
//!
//! # Empty blocks
//! Meshes, point lists and line sets without any vertex are not written at
//! all, not even a frame, and do not count toward the header's block total.

pub mod primitives;

pub mod image;
pub mod material;
pub mod mesh;
pub mod pointlist;
pub mod scenenode;
pub mod track;

use std::io::{self, Cursor, Read, Write};

use crate::block::{BlockType, DataBlockHeader, BLOCK_HEADER_SIZE};
use crate::error::{Result, RexError};

pub use image::{Image, ImageCompression};
pub use material::Material;
pub use mesh::{Mesh, MeshLayout, Triangle};
pub use pointlist::{LineSet, PointList};
pub use scenenode::SceneNode;
pub use track::{Track, TrackElement};

pub trait BlockCodec: Sized {
    const BLOCK_TYPE: BlockType;
    /// Payload version written by this build and the only one it reads.
    const VERSION: u16;

    fn id(&self) -> u64;

    /// Payload bytes, frame excluded.
    fn payload_size(&self) -> u64;

    fn write_payload<W: Write>(&self, writer: &mut W) -> io::Result<()>;

    fn read_payload<R: Read>(reader: &mut R, header: &DataBlockHeader) -> io::Result<Self>;

    /// Blocks for which this returns true are never written.
    fn is_empty_block(&self) -> bool {
        false
    }

    /// Checked before anything is written.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Frame plus payload; zero for an empty block.
    fn encoded_size(&self) -> u64 {
        if self.is_empty_block() {
            0
        } else {
            BLOCK_HEADER_SIZE as u64 + self.payload_size()
        }
    }

    fn block_header(&self) -> Result<DataBlockHeader> {
        let payload = self.payload_size();
        let size = u32::try_from(payload).map_err(|_| RexError::BlockTooLarge {
            block_type: Self::BLOCK_TYPE,
            size:       payload,
        })?;
        Ok(DataBlockHeader::new(Self::BLOCK_TYPE, Self::VERSION, self.id(), size))
    }

    /// Write frame and payload.  Returns the bytes written (0 for an empty
    /// block).
    fn write_block<W: Write>(&self, mut writer: W) -> Result<u64> {
        if self.is_empty_block() {
            return Ok(0);
        }
        self.validate()?;
        let header = self.block_header()?;
        header.write(&mut writer)?;
        self.write_payload(&mut writer)?;
        tracing::debug!(block_type = %Self::BLOCK_TYPE, id = header.id, size = header.size, "wrote block");
        Ok(header.total_size())
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.encoded_size() as usize);
        self.write_block(&mut out)?;
        Ok(out)
    }

    /// Decode a payload that has already been cut to `header.size` bytes.
    fn decode(payload: &[u8], header: &DataBlockHeader) -> Result<Self> {
        if header.version != Self::VERSION {
            return Err(RexError::UnsupportedBlockVersion {
                block_type: Self::BLOCK_TYPE,
                version:    header.version,
            });
        }
        let mut cursor = Cursor::new(payload);
        let block = Self::read_payload(&mut cursor, header).map_err(|e| {
            if e.kind() == io::ErrorKind::InvalidData {
                RexError::InvalidBlock {
                    block_type: Self::BLOCK_TYPE,
                    id:         header.id,
                    reason:     e.to_string(),
                }
            } else {
                RexError::from_io(e, Self::BLOCK_TYPE.name())
            }
        })?;
        if cursor.position() != payload.len() as u64 {
            return Err(RexError::BlockSizeMismatch {
                block_type: Self::BLOCK_TYPE,
                declared:   header.size,
                consumed:   cursor.position(),
            });
        }
        Ok(block)
    }

    /// Read `header.size` bytes from `reader` and decode them.
    fn read_block<R: Read>(reader: R, header: &DataBlockHeader) -> Result<Self> {
        let payload = read_payload_bytes(reader, header)?;
        Self::decode(&payload, header)
    }
}

/// Error for element counts a payload of `header.size` bytes cannot hold.
pub(crate) fn counts_exceed_size(what: &str, header: &DataBlockHeader) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("{what} exceed the declared size of {} bytes", header.size),
    )
}

/// Read exactly `header.size` bytes, or fail with `Truncated`.
pub fn read_payload_bytes<R: Read>(reader: R, header: &DataBlockHeader) -> Result<Vec<u8>> {
    let mut payload = Vec::new();
    reader
        .take(header.size as u64)
        .read_to_end(&mut payload)
        .map_err(|e| RexError::from_io(e, "block payload"))?;
    if payload.len() != header.size as usize {
        return Err(RexError::Truncated { context: "block payload" });
    }
    Ok(payload)
}

/// Discard exactly `header.size` bytes, or fail with `Truncated`.
pub fn skip_payload<R: Read>(reader: R, header: &DataBlockHeader) -> Result<()> {
    let skipped = io::copy(&mut reader.take(header.size as u64), &mut io::sink())
        .map_err(|e| RexError::from_io(e, "skipped block payload"))?;
    if skipped != header.size as u64 {
        return Err(RexError::Truncated { context: "skipped block payload" });
    }
    Ok(())
}
