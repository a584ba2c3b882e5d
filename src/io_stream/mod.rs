//! Streaming decoder and encoder.
//!
//! # Decoder
//! [`Decoder`] reads the container header once, then pulls one frame at a
//! time and dispatches on its tag.  Blocks with an unknown tag, or a version
//! their codec does not read, are skipped by their declared size and counted.
//! A block whose payload contradicts its frame is an error, or with
//! `skip_invalid_blocks` is skipped and counted separately.
//! The stream ends cleanly only when it runs out exactly on a frame boundary.
//!
//! ```text
//!   ReadingHeader ──header ok──▶ ReadingBlocks ──clean EOF──▶ Done
//!                                   │    ▲
//!                                   └────┘ one block per step
//! ```
//!
//! The decoder never buffers more than one block payload and never seeks,
//! so any `Read` works, including pipes of unknown length.
//!
//! # Encoder
//! [`Encoder`] writes [`File::derive_header`] followed by every non-empty
//! block, grouped by type in the fixed order PointList, Mesh, Material,
//! Image, LineSet, SceneNode, Track.  Every block is validated before the
//! first byte goes out.  A write failure aborts with [`EncodeError`], which
//! reports how many bytes reached the sink; they are not rolled back.
//!
//! Neither side closes its stream.  Wrap a `&mut` reference to keep
//! ownership with the caller.

use std::io::{self, Read, Write};

use crate::block::{BlockType, DataBlockHeader};
use crate::codec::{
    read_payload_bytes, skip_payload, BlockCodec, Image, LineSet, Material, Mesh, PointList,
    SceneNode, Track,
};
use crate::error::{DecodeError, EncodeError, Result, RexError};
use crate::file::{Block, File};
use crate::header::Header;

// ── Options ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    /// Reject a header whose magic is not `REX1` or whose format version is
    /// unknown.
    pub validate_magic: bool,
    /// Treat a stream that ends inside a block as the end of the file: the
    /// blocks before it are returned and `File::truncated` is set.
    pub lenient_eof:    bool,
    /// Skip a fully read block whose contents contradict its frame (counts
    /// beyond the declared size, unread trailing bytes) and keep decoding.
    /// Skipped blocks are counted in `File::invalid_blocks`.
    pub skip_invalid_blocks: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self { validate_magic: true, lenient_eof: false, skip_invalid_blocks: false }
    }
}

impl DecodeOptions {
    /// Accept anything that parses; used by inspection tools.
    pub fn lenient() -> Self {
        Self { validate_magic: false, lenient_eof: true, skip_invalid_blocks: true }
    }
}

// ── Decoder ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    ReadingHeader,
    ReadingBlocks,
    Done,
}

pub struct Decoder<R: Read> {
    reader:  R,
    options: DecodeOptions,
    state:   DecoderState,
    header:  Option<Header>,
}

impl<R: Read> Decoder<R> {
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, DecodeOptions::default())
    }

    pub fn with_options(reader: R, options: DecodeOptions) -> Self {
        Self { reader, options, state: DecoderState::ReadingHeader, header: None }
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// The container header, once it has been read.
    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Read the container header and CRS preamble.  Idempotent.
    pub fn read_header(&mut self) -> Result<&Header> {
        if self.state == DecoderState::ReadingHeader {
            let header = Header::read(&mut self.reader)?;
            if self.options.validate_magic {
                header.validate()?;
            }
            // A preamble shorter than start_addr leaves a gap before the
            // first block.
            let consumed = header.encoded_len() as u64;
            if (header.start_addr as u64) > consumed {
                let gap = header.start_addr as u64 - consumed;
                let skipped = io::copy(&mut (&mut self.reader).take(gap), &mut io::sink())?;
                if skipped != gap {
                    return Err(RexError::Truncated { context: "file header padding" });
                }
            }
            tracing::debug!(
                nr_blocks = header.nr_blocks,
                size_bytes = header.size_bytes,
                srid = header.crs.srid,
                "read REX header"
            );
            self.header = Some(header);
            self.state = DecoderState::ReadingBlocks;
        }
        self.header
            .as_ref()
            .ok_or(RexError::Truncated { context: "file header" })
    }

    /// Read the next frame, or `None` on clean end of stream.
    fn next_frame(&mut self) -> Result<Option<DataBlockHeader>> {
        self.read_header()?;
        if self.state == DecoderState::Done {
            return Ok(None);
        }
        let frame = DataBlockHeader::read_next(&mut self.reader)?;
        match frame {
            Some(h) => tracing::debug!(
                block_type = %h.block_type, version = h.version, size = h.size, id = h.id,
                "read block frame"
            ),
            None => self.state = DecoderState::Done,
        }
        Ok(frame)
    }

    /// Decode the next block.  Returns `Ok(None)` once the stream is
    /// exhausted.
    pub fn next_block(&mut self) -> Result<Option<Block>> {
        let Some(header) = self.next_frame()? else {
            return Ok(None);
        };
        let block = match header.block_type {
            BlockType::Mesh      => self.read_known::<Mesh>(header, Block::Mesh)?,
            BlockType::Material  => self.read_known::<Material>(header, Block::Material)?,
            BlockType::Image     => self.read_known::<Image>(header, Block::Image)?,
            BlockType::PointList => self.read_known::<PointList>(header, Block::PointList)?,
            BlockType::LineSet   => self.read_known::<LineSet>(header, Block::LineSet)?,
            BlockType::SceneNode => self.read_known::<SceneNode>(header, Block::SceneNode)?,
            BlockType::Track     => self.read_known::<Track>(header, Block::Track)?,
            BlockType::Text
            | BlockType::PeopleSimulation
            | BlockType::UnityPackage
            | BlockType::Unknown(_) => {
                tracing::warn!(block_type = %header.block_type, id = header.id, size = header.size,
                    "skipping block without a codec");
                skip_payload(&mut self.reader, &header)?;
                Block::Unknown { header }
            }
        };
        Ok(Some(block))
    }

    fn read_known<B: BlockCodec>(
        &mut self,
        header: DataBlockHeader,
        wrap: fn(B) -> Block,
    ) -> Result<Block> {
        let payload = read_payload_bytes(&mut self.reader, &header)?;
        match B::decode(&payload, &header) {
            Ok(block) => Ok(wrap(block)),
            Err(RexError::UnsupportedBlockVersion { block_type, version }) => {
                tracing::warn!(%block_type, version, id = header.id,
                    "skipping block with unsupported version");
                Ok(Block::Unknown { header })
            }
            Err(e @ (RexError::InvalidBlock { .. } | RexError::BlockSizeMismatch { .. }))
                if self.options.skip_invalid_blocks =>
            {
                tracing::warn!(error = %e, id = header.id, "skipping invalid block");
                Ok(Block::Invalid { header, reason: e.to_string() })
            }
            Err(e) => Err(e),
        }
    }

    /// Decode every remaining block into a [`File`].
    ///
    /// On failure the blocks decoded so far travel inside the error.  With
    /// `lenient_eof`, a truncated final block ends the file instead.
    pub fn decode(&mut self) -> std::result::Result<File, DecodeError> {
        let mut file = File::new();
        if let Err(source) = self.read_header() {
            return Err(DecodeError { file: Box::new(file), source });
        }
        if let Some(header) = &self.header {
            file.crs = header.crs.clone();
        }

        loop {
            match self.next_block() {
                Ok(Some(block)) => file.push(block),
                Ok(None) => break,
                Err(e) if e.is_truncated() && self.options.lenient_eof => {
                    tracing::warn!(error = %e, blocks = file.block_count(),
                        "stream ended inside a block; keeping what was decoded");
                    file.truncated = true;
                    self.state = DecoderState::Done;
                    break;
                }
                Err(source) => {
                    self.state = DecoderState::Done;
                    return Err(DecodeError { file: Box::new(file), source });
                }
            }
        }
        Ok(file)
    }

    /// Stream forward to the first block with `id` and return its frame and
    /// raw payload.  Other blocks are skipped unparsed.
    pub fn extract_payload(&mut self, id: u64) -> Result<Option<(DataBlockHeader, Vec<u8>)>> {
        while let Some(header) = self.next_frame()? {
            if header.id == id {
                let payload = read_payload_bytes(&mut self.reader, &header)?;
                return Ok(Some((header, payload)));
            }
            skip_payload(&mut self.reader, &header)?;
        }
        Ok(None)
    }
}

/// Decode a whole stream with default options.
pub fn decode<R: Read>(reader: R) -> std::result::Result<File, DecodeError> {
    Decoder::new(reader).decode()
}

// ── Encoder ──────────────────────────────────────────────────────────────────

pub struct Encoder<W: Write> {
    writer: W,
}

impl<W: Write> Encoder<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Write `file` and return the number of bytes written.  On failure the
    /// error carries the number of bytes the sink accepted.
    pub fn encode(&mut self, file: &File) -> std::result::Result<u64, EncodeError> {
        let mut sink = CountingWriter { inner: &mut self.writer, written: 0 };
        match write_file(&mut sink, file) {
            Ok(nr_blocks) => {
                tracing::debug!(blocks = nr_blocks, bytes = sink.written, "encoded REX file");
                Ok(sink.written)
            }
            Err(source) => Err(EncodeError { written: sink.written, source }),
        }
    }
}

fn write_file<W: Write>(sink: &mut W, file: &File) -> Result<u16> {
    let header = file.derive_header()?;
    header.write(&mut *sink)?;

    write_all_blocks(sink, &file.point_lists)?;
    write_all_blocks(sink, &file.meshes)?;
    write_all_blocks(sink, &file.materials)?;
    write_all_blocks(sink, &file.images)?;
    write_all_blocks(sink, &file.line_sets)?;
    write_all_blocks(sink, &file.scene_nodes)?;
    write_all_blocks(sink, &file.tracks)?;

    sink.flush()?;
    Ok(header.nr_blocks)
}

fn write_all_blocks<W: Write, B: BlockCodec>(sink: &mut W, blocks: &[B]) -> Result<()> {
    for block in blocks {
        block.write_block(&mut *sink)?;
    }
    Ok(())
}

/// Counts the bytes the inner writer accepted.
struct CountingWriter<'a, W: Write> {
    inner:   &'a mut W,
    written: u64,
}

impl<W: Write> Write for CountingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Encode `file` into a fresh buffer.
pub fn encode_to_vec(file: &File) -> std::result::Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    Encoder::new(&mut out).encode(file)?;
    Ok(out)
}
