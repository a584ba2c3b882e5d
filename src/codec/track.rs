//! Motion track block (tag 9): timestamped, confidence-weighted samples.
//!
//! # Payload layout (version 1)
//! ```text
//! 0x00: timestamp  i64     unix seconds
//! 0x08: nr_points  u32
//! 0x0C: elements   nr_points × { point 3×f32, normal 3×f32, confidence f32 }
//! ```

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use chrono::{DateTime, Utc};
use glam::Vec3;
use std::io::{self, Read, Write};

use super::primitives::{ReadVecExt, WriteVecExt};
use super::{counts_exceed_size, BlockCodec};
use crate::block::{BlockType, DataBlockHeader};

const TRACK_HEADER_SIZE: u64 = 12;
const TRACK_ELEMENT_SIZE: u64 = 28;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackElement {
    pub point:      Vec3,
    pub normal:     Vec3,
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id:        u64,
    /// Capture time, unix seconds.
    pub timestamp: i64,
    pub points:    Vec<TrackElement>,
}

impl Track {
    /// Empty track stamped with the current time.
    pub fn new(id: u64) -> Self {
        Self { id, timestamp: Utc::now().timestamp(), points: Vec::new() }
    }

    pub fn captured_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}

impl BlockCodec for Track {
    const BLOCK_TYPE: BlockType = BlockType::Track;
    const VERSION: u16 = 1;

    fn id(&self) -> u64 {
        self.id
    }

    fn payload_size(&self) -> u64 {
        TRACK_HEADER_SIZE + self.points.len() as u64 * TRACK_ELEMENT_SIZE
    }

    fn write_payload<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_i64::<LittleEndian>(self.timestamp)?;
        w.write_u32::<LittleEndian>(self.points.len() as u32)?;
        for e in &self.points {
            w.write_vec3(e.point)?;
            w.write_vec3(e.normal)?;
            w.write_f32::<LittleEndian>(e.confidence)?;
        }
        Ok(())
    }

    fn read_payload<R: Read>(r: &mut R, header: &DataBlockHeader) -> io::Result<Self> {
        let timestamp = r.read_i64::<LittleEndian>()?;
        let nr_points = r.read_u32::<LittleEndian>()?;
        if TRACK_HEADER_SIZE + nr_points as u64 * TRACK_ELEMENT_SIZE > header.size as u64 {
            return Err(counts_exceed_size("track elements", header));
        }
        let mut points = Vec::with_capacity(nr_points as usize);
        for _ in 0..nr_points {
            points.push(TrackElement {
                point:      r.read_vec3()?,
                normal:     r.read_vec3()?,
                confidence: r.read_f32::<LittleEndian>()?,
            });
        }
        Ok(Self { id: header.id, timestamp, points })
    }
}
