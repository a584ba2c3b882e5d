//! Error taxonomy shared by every codec in the crate.
//!
//! | Condition | Variant | Decoder policy |
//! |-----------|---------|----------------|
//! | Fewer bytes than a fixed-size read needs | `Truncated` | abort, partial `File` surfaced |
//! | Block version unknown to its codec | `UnsupportedBlockVersion` | block skipped, decode continues |
//! | Block type unknown | *(not an error)* | block skipped and counted |
//! | Element counts exceed the declared size | `InvalidBlock` | abort, or skip and count when lenient |
//! | Sink write failure | `Io` | encode aborts, no rollback |

use std::io;
use thiserror::Error;

use crate::block::BlockType;
use crate::file::File;

#[derive(Error, Debug)]
pub enum RexError {
    #[error("Truncated stream while reading {context}")]
    Truncated { context: &'static str },
    #[error("IO error: {0}")]
    Io(io::Error),
    #[error("Invalid magic number {0:?}")]
    InvalidMagic([u8; 4]),
    #[error("Unsupported format version: {0}")]
    UnsupportedFormatVersion(u16),
    #[error("{block_type} block version {version} is not supported")]
    UnsupportedBlockVersion { block_type: BlockType, version: u16 },
    #[error("{block_type} block declares {declared} payload bytes but its codec consumed {consumed}")]
    BlockSizeMismatch { block_type: BlockType, declared: u32, consumed: u64 },
    #[error("Invalid {block_type} block {id}: {reason}")]
    InvalidBlock { block_type: BlockType, id: u64, reason: String },
    #[error("{block_type} payload of {size} bytes does not fit a block frame")]
    BlockTooLarge { block_type: BlockType, size: u64 },
    #[error("{0} blocks exceed the container header's u16 block count")]
    TooManyBlocks(usize),
}

impl RexError {
    /// Wrap an `io::Error`, naming what was being read if the stream ran dry.
    pub fn from_io(err: io::Error, context: &'static str) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            RexError::Truncated { context }
        } else {
            RexError::Io(err)
        }
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, RexError::Truncated { .. })
    }
}

impl From<io::Error> for RexError {
    fn from(err: io::Error) -> Self {
        RexError::from_io(err, "stream")
    }
}

/// A decode that failed part-way through the block stream.
///
/// `file` holds every block decoded before the failure.
#[derive(Error, Debug)]
#[error("Decoding stopped after {} block(s): {source}", .file.block_count())]
pub struct DecodeError {
    pub file:   Box<File>,
    #[source]
    pub source: RexError,
}

/// An encode that failed after `written` bytes reached the sink.
///
/// Nothing is rolled back; truncating the partial output is up to the caller.
#[derive(Error, Debug)]
#[error("Encoding stopped after {written} byte(s): {source}")]
pub struct EncodeError {
    pub written: u64,
    #[source]
    pub source:  RexError,
}

pub type Result<T> = std::result::Result<T, RexError>;
