//! Indexed triangle mesh block (tag 3).
//!
//! # Payload layout (version 1)
//! ```text
//! 0x00: lod, max_lod            u16 ×2   always 0
//! 0x04: nr_coords               u32
//! 0x08: nr_normals              u32
//! 0x0C: nr_texcoords            u32
//! 0x10: nr_colors               u32
//! 0x14: nr_triangles            u32
//! 0x18: start_coords            u32  ─┐ payload-relative offsets,
//! 0x1C: start_normals           u32   │ written for self-description
//! 0x20: start_texcoords         u32   │ only; readers go by the counts
//! 0x24: start_colors            u32   │
//! 0x28: start_triangles         u32  ─┘
//! 0x2C: material_id             u64      NOT_SPECIFIED if unset
//! 0x34: name_len                u16
//! 0x36: name                    [u8; 74]
//! 0x80: coords 3×f32, normals 3×f32, texcoords 2×f32, colors 3×f32,
//!       triangles 3×u32
//! ```

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use glam::{Vec2, Vec3};
use std::fmt;
use std::io::{self, Read, Write};

use super::primitives::{ReadVecExt, WriteVecExt};
use super::{counts_exceed_size, BlockCodec};
use crate::block::{ref_from_wire, ref_to_wire, BlockType, DataBlockHeader};
use crate::error::{Result, RexError};

/// Size of the mesh sub-header that precedes the vertex arrays.
pub const MESH_HEADER_SIZE: u32 = 128;
/// Bytes reserved for the mesh name; longer names are truncated.
pub const MESH_NAME_MAX_SIZE: usize = 74;

const VEC3_SIZE: u64 = 12;
const VEC2_SIZE: u64 = 8;
const TRIANGLE_SIZE: u64 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Triangle {
    pub v0: u32,
    pub v1: u32,
    pub v2: u32,
}

impl Triangle {
    pub fn new(v0: u32, v1: u32, v2: u32) -> Self {
        Self { v0, v1, v2 }
    }

    pub fn indices(&self) -> [u32; 3] {
        [self.v0, self.v1, self.v2]
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    pub id:          u64,
    pub name:        String,
    pub material_id: Option<u64>,
    pub coords:      Vec<Vec3>,
    pub normals:     Vec<Vec3>,
    pub tex_coords:  Vec<Vec2>,
    pub colors:      Vec<Vec3>,
    pub triangles:   Vec<Triangle>,
}

/// Array counts and payload-relative start offsets as written into the
/// mesh sub-header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeshLayout {
    pub nr_coords:       u32,
    pub nr_normals:      u32,
    pub nr_tex_coords:   u32,
    pub nr_colors:       u32,
    pub nr_triangles:    u32,
    pub start_coords:    u32,
    pub start_normals:   u32,
    pub start_tex_coords: u32,
    pub start_colors:    u32,
    pub start_triangles: u32,
}

impl MeshLayout {
    /// Payload bytes the arrays described by this layout occupy, sub-header
    /// included.
    pub fn payload_size(&self) -> u64 {
        MESH_HEADER_SIZE as u64
            + self.nr_coords as u64 * VEC3_SIZE
            + self.nr_normals as u64 * VEC3_SIZE
            + self.nr_tex_coords as u64 * VEC2_SIZE
            + self.nr_colors as u64 * VEC3_SIZE
            + self.nr_triangles as u64 * TRIANGLE_SIZE
    }
}

impl Mesh {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self { id, name: name.into(), ..Default::default() }
    }

    pub fn vertex_count(&self) -> usize {
        self.coords.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Counts and running offsets for the current arrays.  Offsets saturate
    /// at `u32::MAX`; such a mesh is rejected by `block_header` anyway.
    pub fn layout(&self) -> MeshLayout {
        let count = |n: usize| u32::try_from(n).unwrap_or(u32::MAX);
        let advance = |start: u32, n: usize, stride: u64| {
            u32::try_from(start as u64 + n as u64 * stride).unwrap_or(u32::MAX)
        };

        let start_coords     = MESH_HEADER_SIZE;
        let start_normals    = advance(start_coords, self.coords.len(), VEC3_SIZE);
        let start_tex_coords = advance(start_normals, self.normals.len(), VEC3_SIZE);
        let start_colors     = advance(start_tex_coords, self.tex_coords.len(), VEC2_SIZE);
        let start_triangles  = advance(start_colors, self.colors.len(), VEC3_SIZE);

        MeshLayout {
            nr_coords:        count(self.coords.len()),
            nr_normals:       count(self.normals.len()),
            nr_tex_coords:    count(self.tex_coords.len()),
            nr_colors:        count(self.colors.len()),
            nr_triangles:     count(self.triangles.len()),
            start_coords,
            start_normals,
            start_tex_coords,
            start_colors,
            start_triangles,
        }
    }

    fn invalid(&self, reason: String) -> RexError {
        RexError::InvalidBlock { block_type: BlockType::Mesh, id: self.id, reason }
    }
}

impl BlockCodec for Mesh {
    const BLOCK_TYPE: BlockType = BlockType::Mesh;
    const VERSION: u16 = 1;

    fn id(&self) -> u64 {
        self.id
    }

    fn payload_size(&self) -> u64 {
        self.layout().payload_size()
    }

    fn is_empty_block(&self) -> bool {
        self.coords.is_empty()
    }

    fn validate(&self) -> Result<()> {
        let n = self.coords.len();
        for (what, len) in [
            ("normals", self.normals.len()),
            ("texture coordinates", self.tex_coords.len()),
            ("colors", self.colors.len()),
        ] {
            if len != 0 && len != n {
                return Err(self.invalid(format!("{len} {what} for {n} coordinates")));
            }
        }
        if let Some((i, t)) = self
            .triangles
            .iter()
            .enumerate()
            .find(|(_, t)| t.indices().iter().any(|&v| v as usize >= n))
        {
            return Err(self.invalid(format!(
                "triangle {i} {:?} references a vertex beyond {n} coordinates",
                t.indices()
            )));
        }
        Ok(())
    }

    fn write_payload<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let layout = self.layout();

        w.write_u16::<LittleEndian>(0)?; // lod
        w.write_u16::<LittleEndian>(0)?; // max lod
        w.write_u32::<LittleEndian>(layout.nr_coords)?;
        w.write_u32::<LittleEndian>(layout.nr_normals)?;
        w.write_u32::<LittleEndian>(layout.nr_tex_coords)?;
        w.write_u32::<LittleEndian>(layout.nr_colors)?;
        w.write_u32::<LittleEndian>(layout.nr_triangles)?;
        w.write_u32::<LittleEndian>(layout.start_coords)?;
        w.write_u32::<LittleEndian>(layout.start_normals)?;
        w.write_u32::<LittleEndian>(layout.start_tex_coords)?;
        w.write_u32::<LittleEndian>(layout.start_colors)?;
        w.write_u32::<LittleEndian>(layout.start_triangles)?;
        w.write_u64::<LittleEndian>(ref_to_wire(self.material_id))?;

        let name_len = super::primitives::fixed_str_len(&self.name, MESH_NAME_MAX_SIZE);
        w.write_u16::<LittleEndian>(name_len as u16)?;
        w.write_fixed_str(&self.name, MESH_NAME_MAX_SIZE)?;

        w.write_vec3_array(&self.coords)?;
        w.write_vec3_array(&self.normals)?;
        w.write_vec2_array(&self.tex_coords)?;
        w.write_vec3_array(&self.colors)?;
        for t in &self.triangles {
            w.write_u32::<LittleEndian>(t.v0)?;
            w.write_u32::<LittleEndian>(t.v1)?;
            w.write_u32::<LittleEndian>(t.v2)?;
        }
        Ok(())
    }

    fn read_payload<R: Read>(r: &mut R, header: &DataBlockHeader) -> io::Result<Self> {
        let _lod     = r.read_u16::<LittleEndian>()?;
        let _max_lod = r.read_u16::<LittleEndian>()?;
        let layout = MeshLayout {
            nr_coords:        r.read_u32::<LittleEndian>()?,
            nr_normals:       r.read_u32::<LittleEndian>()?,
            nr_tex_coords:    r.read_u32::<LittleEndian>()?,
            nr_colors:        r.read_u32::<LittleEndian>()?,
            nr_triangles:     r.read_u32::<LittleEndian>()?,
            start_coords:     r.read_u32::<LittleEndian>()?,
            start_normals:    r.read_u32::<LittleEndian>()?,
            start_tex_coords: r.read_u32::<LittleEndian>()?,
            start_colors:     r.read_u32::<LittleEndian>()?,
            start_triangles:  r.read_u32::<LittleEndian>()?,
        };
        let material_id = ref_from_wire(r.read_u64::<LittleEndian>()?);
        let name_len = r.read_u16::<LittleEndian>()? as usize;
        let mut name = [0u8; MESH_NAME_MAX_SIZE];
        r.read_exact(&mut name)?;

        // Counts that cannot fit the declared size would otherwise drive
        // large allocations before the cursor runs dry.
        if layout.payload_size() > header.size as u64 {
            return Err(counts_exceed_size("mesh arrays", header));
        }

        let coords     = r.read_vec3_array(layout.nr_coords as usize)?;
        let normals    = r.read_vec3_array(layout.nr_normals as usize)?;
        let tex_coords = r.read_vec2_array(layout.nr_tex_coords as usize)?;
        let colors     = r.read_vec3_array(layout.nr_colors as usize)?;
        let mut triangles = Vec::with_capacity(layout.nr_triangles as usize);
        for _ in 0..layout.nr_triangles {
            triangles.push(Triangle {
                v0: r.read_u32::<LittleEndian>()?,
                v1: r.read_u32::<LittleEndian>()?,
                v2: r.read_u32::<LittleEndian>()?,
            });
        }

        Ok(Mesh {
            id: header.id,
            name: String::from_utf8_lossy(&name[..name_len.min(MESH_NAME_MAX_SIZE)]).into_owned(),
            material_id,
            coords,
            normals,
            tex_coords,
            colors,
            triangles,
        })
    }
}

impl fmt::Display for Mesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let material = self.material_id.map_or_else(|| "-".to_owned(), |m| m.to_string());
        writeln!(f, "| Mesh datablock {:<44} |", self.id)?;
        writeln!(f, "| Name           | {:<41} |", self.name)?;
        writeln!(f, "| MaterialID     | {:<41} |", material)?;
        writeln!(f, "| # Coords       | {:<41} |", self.coords.len())?;
        writeln!(f, "| # Normals      | {:<41} |", self.normals.len())?;
        writeln!(f, "| # TexCoords    | {:<41} |", self.tex_coords.len())?;
        writeln!(f, "| # Colors       | {:<41} |", self.colors.len())?;
        writeln!(f, "| # Triangles    | {:<41} |", self.triangles.len())
    }
}
