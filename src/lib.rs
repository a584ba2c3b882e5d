pub mod error;
pub mod header;
pub mod block;
pub mod codec;
pub mod file;
pub mod io_stream;
pub mod shapes;

pub use error::{DecodeError, EncodeError, RexError};
pub use header::{Crs, Header};
pub use block::{BlockType, DataBlockHeader, NOT_SPECIFIED};
pub use codec::{
    BlockCodec, Image, ImageCompression, LineSet, Material, Mesh, PointList, SceneNode, Track,
    TrackElement, Triangle,
};
pub use file::{Block, File};
pub use io_stream::{decode, encode_to_vec, DecodeOptions, Decoder, Encoder};
