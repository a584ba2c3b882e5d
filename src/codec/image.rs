//! Texture image block (tag 4): a compression tag followed by the opaque
//! encoded image.  The data length is implied by the frame: `size - 4`.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;
use std::io::{self, Read, Write};

use super::BlockCodec;
use crate::block::{BlockType, DataBlockHeader};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "&'static str")]
pub enum ImageCompression {
    Raw24,
    Jpeg,
    Png,
    /// Tag unknown to this build; preserved verbatim.
    Other(u32),
}

impl ImageCompression {
    pub fn tag(self) -> u32 {
        match self {
            ImageCompression::Raw24    => 0,
            ImageCompression::Jpeg     => 1,
            ImageCompression::Png      => 2,
            ImageCompression::Other(t) => t,
        }
    }

    /// Short name for listings; also the usual file extension.
    pub fn name(self) -> &'static str {
        match self {
            ImageCompression::Raw24    => "raw",
            ImageCompression::Jpeg     => "jpg",
            ImageCompression::Png      => "png",
            ImageCompression::Other(_) => "unknown",
        }
    }
}

impl From<u32> for ImageCompression {
    fn from(tag: u32) -> Self {
        match tag {
            0 => ImageCompression::Raw24,
            1 => ImageCompression::Jpeg,
            2 => ImageCompression::Png,
            t => ImageCompression::Other(t),
        }
    }
}

impl From<ImageCompression> for &'static str {
    fn from(c: ImageCompression) -> Self {
        c.name()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub id:          u64,
    pub compression: ImageCompression,
    pub data:        Vec<u8>,
}

impl Image {
    pub fn new(id: u64, compression: ImageCompression, data: Vec<u8>) -> Self {
        Self { id, compression, data }
    }
}

impl BlockCodec for Image {
    const BLOCK_TYPE: BlockType = BlockType::Image;
    const VERSION: u16 = 1;

    fn id(&self) -> u64 {
        self.id
    }

    fn payload_size(&self) -> u64 {
        4 + self.data.len() as u64
    }

    fn write_payload<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u32::<LittleEndian>(self.compression.tag())?;
        w.write_all(&self.data)
    }

    fn read_payload<R: Read>(r: &mut R, header: &DataBlockHeader) -> io::Result<Self> {
        let compression = ImageCompression::from(r.read_u32::<LittleEndian>()?);
        let mut data = Vec::new();
        let len = header.size.saturating_sub(4) as u64;
        r.by_ref().take(len).read_to_end(&mut data)?;
        if data.len() as u64 != len {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "image data"));
        }
        Ok(Self { id: header.id, compression, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RexError;

    #[test]
    fn data_length_comes_from_the_frame() {
        let img = Image::new(9, ImageCompression::Png, vec![0x89, b'P', b'N', b'G', 1, 2, 3]);
        let bytes = img.to_bytes().unwrap();
        let header = DataBlockHeader::read(&bytes[..]).unwrap();
        assert_eq!(header.size, 4 + 7);
        assert_eq!(Image::decode(&bytes[16..], &header).unwrap(), img);
    }

    #[test]
    fn short_payload_is_truncated() {
        let img = Image::new(9, ImageCompression::Jpeg, vec![0xFF; 32]);
        let bytes = img.to_bytes().unwrap();
        let header = DataBlockHeader::read(&bytes[..]).unwrap();
        let err = Image::read_block(&bytes[16..bytes.len() - 1], &header).unwrap_err();
        assert!(matches!(err, RexError::Truncated { .. }));
    }

    #[test]
    fn unknown_compression_tags_are_kept() {
        assert_eq!(ImageCompression::from(7), ImageCompression::Other(7));
        assert_eq!(ImageCompression::from(7).tag(), 7);
        assert_eq!(ImageCompression::from(1).name(), "jpg");
    }
}
