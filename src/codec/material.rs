//! Phong material block (tag 5).
//!
//! # Payload layout (version 1, 68 bytes)
//! ```text
//! 0x00: ka rgb 3×f32, ka texture u64
//! 0x14: kd rgb 3×f32, kd texture u64
//! 0x28: ks rgb 3×f32, ks texture u64
//! 0x3C: ns    f32     specular exponent
//! 0x40: alpha f32     1.0 = opaque
//! ```
//! Texture references use `NOT_SPECIFIED` for "no texture"; id 0 is a valid
//! texture.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use glam::Vec3;
use std::io::{self, Read, Write};

use super::primitives::{ReadVecExt, WriteVecExt};
use super::BlockCodec;
use crate::block::{ref_from_wire, ref_to_wire, BlockType, DataBlockHeader};

pub const MATERIAL_PAYLOAD_SIZE: u64 = 68;

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub id:             u64,
    pub ka_rgb:         Vec3,
    pub ka_texture_id:  Option<u64>,
    pub kd_rgb:         Vec3,
    pub kd_texture_id:  Option<u64>,
    pub ks_rgb:         Vec3,
    pub ks_texture_id:  Option<u64>,
    pub ns:             f32,
    pub alpha:          f32,
}

impl Material {
    /// Light grey, no textures, fully opaque.
    pub fn new(id: u64) -> Self {
        Self {
            id,
            ka_rgb:        Vec3::ZERO,
            ka_texture_id: None,
            kd_rgb:        Vec3::splat(0.8),
            kd_texture_id: None,
            ks_rgb:        Vec3::ZERO,
            ks_texture_id: None,
            ns:            0.0,
            alpha:         1.0,
        }
    }

    pub fn with_diffuse(mut self, rgb: Vec3) -> Self {
        self.kd_rgb = rgb;
        self
    }

    pub fn textures(&self) -> [Option<u64>; 3] {
        [self.ka_texture_id, self.kd_texture_id, self.ks_texture_id]
    }
}

impl BlockCodec for Material {
    const BLOCK_TYPE: BlockType = BlockType::Material;
    const VERSION: u16 = 1;

    fn id(&self) -> u64 {
        self.id
    }

    fn payload_size(&self) -> u64 {
        MATERIAL_PAYLOAD_SIZE
    }

    fn write_payload<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_vec3(self.ka_rgb)?;
        w.write_u64::<LittleEndian>(ref_to_wire(self.ka_texture_id))?;
        w.write_vec3(self.kd_rgb)?;
        w.write_u64::<LittleEndian>(ref_to_wire(self.kd_texture_id))?;
        w.write_vec3(self.ks_rgb)?;
        w.write_u64::<LittleEndian>(ref_to_wire(self.ks_texture_id))?;
        w.write_f32::<LittleEndian>(self.ns)?;
        w.write_f32::<LittleEndian>(self.alpha)
    }

    fn read_payload<R: Read>(r: &mut R, header: &DataBlockHeader) -> io::Result<Self> {
        Ok(Self {
            id:            header.id,
            ka_rgb:        r.read_vec3()?,
            ka_texture_id: ref_from_wire(r.read_u64::<LittleEndian>()?),
            kd_rgb:        r.read_vec3()?,
            kd_texture_id: ref_from_wire(r.read_u64::<LittleEndian>()?),
            ks_rgb:        r.read_vec3()?,
            ks_texture_id: ref_from_wire(r.read_u64::<LittleEndian>()?),
            ns:            r.read_f32::<LittleEndian>()?,
            alpha:         r.read_f32::<LittleEndian>()?,
        })
    }
}
