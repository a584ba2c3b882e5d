//! Scene-graph node block (tag 8): a transform that places a geometry block.
//!
//! # Payload layout (version 1, 80 bytes)
//! ```text
//! 0x00: geometry_id  u64       NOT_SPECIFIED if the node is empty
//! 0x08: name         [u8; 32]  zero-padded
//! 0x28: translation  3×f32
//! 0x34: rotation     4×f32     x, y, z, w
//! 0x44: scale        3×f32
//! ```

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use glam::{Quat, Vec3};
use std::io::{self, Read, Write};

use super::primitives::{str_from_fixed, ReadVecExt, WriteVecExt};
use super::BlockCodec;
use crate::block::{ref_from_wire, ref_to_wire, BlockType, DataBlockHeader};

pub const SCENE_NODE_PAYLOAD_SIZE: u64 = 80;
pub const SCENE_NODE_NAME_SIZE: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub id:          u64,
    pub geometry_id: Option<u64>,
    pub name:        String,
    pub translation: Vec3,
    pub rotation:    Quat,
    pub scale:       Vec3,
}

impl SceneNode {
    /// Identity transform pointing at no geometry.
    pub fn new(id: u64) -> Self {
        Self {
            id,
            geometry_id: None,
            name:        String::new(),
            translation: Vec3::ZERO,
            rotation:    Quat::IDENTITY,
            scale:       Vec3::ONE,
        }
    }

    pub fn placing(id: u64, geometry_id: u64, translation: Vec3) -> Self {
        Self { geometry_id: Some(geometry_id), translation, ..Self::new(id) }
    }
}

impl BlockCodec for SceneNode {
    const BLOCK_TYPE: BlockType = BlockType::SceneNode;
    const VERSION: u16 = 1;

    fn id(&self) -> u64 {
        self.id
    }

    fn payload_size(&self) -> u64 {
        SCENE_NODE_PAYLOAD_SIZE
    }

    fn write_payload<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u64::<LittleEndian>(ref_to_wire(self.geometry_id))?;
        w.write_fixed_str(&self.name, SCENE_NODE_NAME_SIZE)?;
        w.write_vec3(self.translation)?;
        w.write_quat(self.rotation)?;
        w.write_vec3(self.scale)
    }

    fn read_payload<R: Read>(r: &mut R, header: &DataBlockHeader) -> io::Result<Self> {
        let geometry_id = ref_from_wire(r.read_u64::<LittleEndian>()?);
        let mut name = [0u8; SCENE_NODE_NAME_SIZE];
        r.read_exact(&mut name)?;
        Ok(Self {
            id:          header.id,
            geometry_id,
            name:        str_from_fixed(&name),
            translation: r.read_vec3()?,
            rotation:    r.read_quat()?,
            scale:       r.read_vec3()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_node_is_identity() {
        let node = SceneNode::new(3);
        let bytes = node.to_bytes().unwrap();
        assert_eq!(bytes.len(), 16 + 80);
        // rotation w
        assert_eq!(&bytes[16 + 0x40..16 + 0x44], &1.0f32.to_le_bytes());
        // scale x
        assert_eq!(&bytes[16 + 0x44..16 + 0x48], &1.0f32.to_le_bytes());

        let header = DataBlockHeader::read(&bytes[..]).unwrap();
        assert_eq!(header.size as u64, SCENE_NODE_PAYLOAD_SIZE);
        assert_eq!(SceneNode::decode(&bytes[16..], &header).unwrap(), node);
    }

    #[test]
    fn named_node_round_trips() {
        let mut node = SceneNode::placing(4, 1, Vec3::new(5.0, 0.0, 0.0));
        node.name = "right cube".into();
        let bytes = node.to_bytes().unwrap();
        let header = DataBlockHeader::read(&bytes[..]).unwrap();
        assert_eq!(SceneNode::decode(&bytes[16..], &header).unwrap(), node);
    }
}
