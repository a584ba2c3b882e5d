//! Point cloud (tag 2) and polyline (tag 0) blocks.
//!
//! Both share one payload layout (version 1):
//! ```text
//! 0x00: nr_points  u32
//! 0x04: nr_colors  u32     0 or nr_points
//! 0x08: points     nr_points × 3×f32
//!  var: colors     nr_colors × 3×f32
//! ```

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use glam::Vec3;
use std::io::{self, Read, Write};

use super::primitives::{ReadVecExt, WriteVecExt};
use super::{counts_exceed_size, BlockCodec};
use crate::block::{BlockType, DataBlockHeader};
use crate::error::{Result, RexError};

fn payload_size(points: &[Vec3], colors: &[Vec3]) -> u64 {
    8 + (points.len() as u64 + colors.len() as u64) * 12
}

fn validate(block_type: BlockType, id: u64, points: &[Vec3], colors: &[Vec3]) -> Result<()> {
    if !colors.is_empty() && colors.len() != points.len() {
        return Err(RexError::InvalidBlock {
            block_type,
            id,
            reason: format!("{} colors for {} points", colors.len(), points.len()),
        });
    }
    Ok(())
}

fn write_points<W: Write>(w: &mut W, points: &[Vec3], colors: &[Vec3]) -> io::Result<()> {
    w.write_u32::<LittleEndian>(points.len() as u32)?;
    w.write_u32::<LittleEndian>(colors.len() as u32)?;
    w.write_vec3_array(points)?;
    w.write_vec3_array(colors)
}

fn read_points<R: Read>(r: &mut R, header: &DataBlockHeader) -> io::Result<(Vec<Vec3>, Vec<Vec3>)> {
    let nr_points = r.read_u32::<LittleEndian>()?;
    let nr_colors = r.read_u32::<LittleEndian>()?;
    if 8 + (nr_points as u64 + nr_colors as u64) * 12 > header.size as u64 {
        return Err(counts_exceed_size("point arrays", header));
    }
    let points = r.read_vec3_array(nr_points as usize)?;
    let colors = r.read_vec3_array(nr_colors as usize)?;
    Ok((points, colors))
}

// ── PointList ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointList {
    pub id:     u64,
    pub points: Vec<Vec3>,
    pub colors: Vec<Vec3>,
}

impl PointList {
    pub fn new(id: u64) -> Self {
        Self { id, ..Default::default() }
    }
}

impl BlockCodec for PointList {
    const BLOCK_TYPE: BlockType = BlockType::PointList;
    const VERSION: u16 = 1;

    fn id(&self) -> u64 {
        self.id
    }

    fn payload_size(&self) -> u64 {
        payload_size(&self.points, &self.colors)
    }

    fn is_empty_block(&self) -> bool {
        self.points.is_empty()
    }

    fn validate(&self) -> Result<()> {
        validate(Self::BLOCK_TYPE, self.id, &self.points, &self.colors)
    }

    fn write_payload<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_points(w, &self.points, &self.colors)
    }

    fn read_payload<R: Read>(r: &mut R, header: &DataBlockHeader) -> io::Result<Self> {
        let (points, colors) = read_points(r, header)?;
        Ok(Self { id: header.id, points, colors })
    }
}

// ── LineSet ──────────────────────────────────────────────────────────────────

/// Consecutive points form one polyline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineSet {
    pub id:     u64,
    pub points: Vec<Vec3>,
    pub colors: Vec<Vec3>,
}

impl LineSet {
    pub fn new(id: u64) -> Self {
        Self { id, ..Default::default() }
    }
}

impl BlockCodec for LineSet {
    const BLOCK_TYPE: BlockType = BlockType::LineSet;
    const VERSION: u16 = 1;

    fn id(&self) -> u64 {
        self.id
    }

    fn payload_size(&self) -> u64 {
        payload_size(&self.points, &self.colors)
    }

    fn is_empty_block(&self) -> bool {
        self.points.is_empty()
    }

    fn validate(&self) -> Result<()> {
        validate(Self::BLOCK_TYPE, self.id, &self.points, &self.colors)
    }

    fn write_payload<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_points(w, &self.points, &self.colors)
    }

    fn read_payload<R: Read>(r: &mut R, header: &DataBlockHeader) -> io::Result<Self> {
        let (points, colors) = read_points(r, header)?;
        Ok(Self { id: header.id, points, colors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_list_layout() {
        let mut pl = PointList::new(4);
        pl.points = vec![Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0), Vec3::new(0.0, 1.0, 1.0)];
        pl.colors = vec![Vec3::X, Vec3::Y, Vec3::Z];

        let bytes = pl.to_bytes().unwrap();
        assert_eq!(bytes.len(), 16 + 8 + 3 * 12 * 2);
        assert_eq!(&bytes[0..2], &2u16.to_le_bytes());
        assert_eq!(&bytes[16..20], &3u32.to_le_bytes());

        let header = DataBlockHeader::read(&bytes[..]).unwrap();
        assert_eq!(PointList::decode(&bytes[16..], &header).unwrap(), pl);
    }

    #[test]
    fn line_set_uses_tag_zero() {
        let mut ls = LineSet::new(2);
        ls.points = vec![Vec3::ZERO, Vec3::ONE];
        let bytes = ls.to_bytes().unwrap();
        assert_eq!(&bytes[0..2], &0u16.to_le_bytes());
        let header = DataBlockHeader::read(&bytes[..]).unwrap();
        assert_eq!(header.block_type, BlockType::LineSet);
        assert_eq!(LineSet::decode(&bytes[16..], &header).unwrap(), ls);
    }

    #[test]
    fn empty_point_list_is_skipped() {
        assert!(PointList::new(1).to_bytes().unwrap().is_empty());
        assert!(LineSet::new(1).to_bytes().unwrap().is_empty());
    }

    #[test]
    fn partial_colors_are_rejected() {
        let mut pl = PointList::new(1);
        pl.points = vec![Vec3::ZERO, Vec3::ONE];
        pl.colors = vec![Vec3::ONE];
        assert!(pl.to_bytes().is_err());
    }
}
