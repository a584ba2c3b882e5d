//! The decoded/encodable aggregate and the closed set of block values.

use serde::Serialize;

use crate::block::{BlockType, DataBlockHeader};
use crate::codec::{
    BlockCodec, Image, ImageCompression, LineSet, Material, Mesh, PointList, SceneNode, Track,
};
use crate::error::{Result, RexError};
use crate::header::{Crs, Header};

// ── Block ────────────────────────────────────────────────────────────────────

/// One block as it comes off the stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Mesh(Mesh),
    Material(Material),
    Image(Image),
    PointList(PointList),
    LineSet(LineSet),
    SceneNode(SceneNode),
    Track(Track),
    /// Skipped: unknown tag or a version this build cannot read.  The
    /// payload (`header.size` bytes) was consumed and discarded.
    Unknown { header: DataBlockHeader },
    /// Skipped: the payload was read in full but contradicts its frame.
    Invalid { header: DataBlockHeader, reason: String },
}

impl Block {
    pub fn block_type(&self) -> BlockType {
        match self {
            Block::Mesh(_)             => BlockType::Mesh,
            Block::Material(_)         => BlockType::Material,
            Block::Image(_)            => BlockType::Image,
            Block::PointList(_)        => BlockType::PointList,
            Block::LineSet(_)          => BlockType::LineSet,
            Block::SceneNode(_)        => BlockType::SceneNode,
            Block::Track(_)            => BlockType::Track,
            Block::Unknown { header }  => header.block_type,
            Block::Invalid { header, .. } => header.block_type,
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            Block::Mesh(b)             => b.id,
            Block::Material(b)         => b.id,
            Block::Image(b)            => b.id,
            Block::PointList(b)        => b.id,
            Block::LineSet(b)          => b.id,
            Block::SceneNode(b)        => b.id,
            Block::Track(b)            => b.id,
            Block::Unknown { header }  => header.id,
            Block::Invalid { header, .. } => header.id,
        }
    }
}

// ── File ─────────────────────────────────────────────────────────────────────

/// A complete REX scene.  Order within each list is stream order; blocks of
/// different types may have been interleaved arbitrarily.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct File {
    pub crs:            Crs,
    pub meshes:         Vec<Mesh>,
    pub materials:      Vec<Material>,
    pub images:         Vec<Image>,
    pub point_lists:    Vec<PointList>,
    pub line_sets:      Vec<LineSet>,
    pub scene_nodes:    Vec<SceneNode>,
    pub tracks:         Vec<Track>,
    /// Blocks skipped for an unknown type or version.
    pub unknown_blocks: usize,
    /// Blocks skipped because their contents contradict their frame.
    pub invalid_blocks: usize,
    /// Set when a lenient decode stopped at a truncated block.
    pub truncated:      bool,
}

impl File {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_crs(crs: Crs) -> Self {
        Self { crs, ..Self::default() }
    }

    /// Append a decoded block to the matching collection.
    pub fn push(&mut self, block: Block) {
        match block {
            Block::Mesh(b)        => self.meshes.push(b),
            Block::Material(b)    => self.materials.push(b),
            Block::Image(b)       => self.images.push(b),
            Block::PointList(b)   => self.point_lists.push(b),
            Block::LineSet(b)     => self.line_sets.push(b),
            Block::SceneNode(b)   => self.scene_nodes.push(b),
            Block::Track(b)       => self.tracks.push(b),
            Block::Unknown { .. } => self.unknown_blocks += 1,
            Block::Invalid { .. } => self.invalid_blocks += 1,
        }
    }

    /// Known blocks held, empty ones included.
    pub fn block_count(&self) -> usize {
        self.meshes.len()
            + self.materials.len()
            + self.images.len()
            + self.point_lists.len()
            + self.line_sets.len()
            + self.scene_nodes.len()
            + self.tracks.len()
    }

    /// `(blocks written, bytes written)` over every collection, empty blocks
    /// contributing nothing.  Fails on the first block that would not encode.
    fn encoded_totals(&self) -> Result<(usize, u64)> {
        fn add<B: BlockCodec>(acc: &mut (usize, u64), blocks: &[B]) -> Result<()> {
            for b in blocks.iter().filter(|b| !b.is_empty_block()) {
                b.validate()?;
                b.block_header()?;
                acc.0 += 1;
                acc.1 += b.encoded_size();
            }
            Ok(())
        }
        let mut acc = (0, 0);
        add(&mut acc, &self.point_lists)?;
        add(&mut acc, &self.meshes)?;
        add(&mut acc, &self.materials)?;
        add(&mut acc, &self.images)?;
        add(&mut acc, &self.line_sets)?;
        add(&mut acc, &self.scene_nodes)?;
        add(&mut acc, &self.tracks)?;
        Ok(acc)
    }

    /// Container header describing what the encoder will write for this file.
    /// Every non-empty block is validated first, so an error here means the
    /// file cannot be encoded.
    pub fn derive_header(&self) -> Result<Header> {
        let (blocks, bytes) = self.encoded_totals()?;
        let mut header = Header::with_crs(self.crs.clone());
        header.nr_blocks  = u16::try_from(blocks).map_err(|_| RexError::TooManyBlocks(blocks))?;
        header.size_bytes = bytes;
        Ok(header)
    }

    pub fn find_image(&self, id: u64) -> Option<&Image> {
        self.images.iter().find(|img| img.id == id)
    }

    pub fn summary(&self) -> FileSummary {
        FileSummary {
            crs: CrsSummary {
                srid:   self.crs.srid,
                name:   self.crs.name.clone(),
                origin: self.crs.origin.to_array(),
            },
            meshes: self.meshes.iter().map(|m| MeshSummary {
                id:        m.id,
                name:      m.name.clone(),
                vertices:  m.coords.len(),
                normals:   m.normals.len(),
                texcoords: m.tex_coords.len(),
                colors:    m.colors.len(),
                triangles: m.triangles.len(),
                material:  m.material_id,
            }).collect(),
            materials: self.materials.iter().map(|m| MaterialSummary {
                id:       m.id,
                ambient:  m.ka_rgb.to_array(),
                diffuse:  m.kd_rgb.to_array(),
                specular: m.ks_rgb.to_array(),
                ns:       m.ns,
                alpha:    m.alpha,
                textures: m.textures(),
            }).collect(),
            images: self.images.iter().map(|i| ImageSummary {
                id:          i.id,
                compression: i.compression,
                bytes:       i.data.len(),
            }).collect(),
            point_lists: self.point_lists.iter().map(|p| PointsSummary {
                id: p.id, points: p.points.len(), colors: p.colors.len(),
            }).collect(),
            line_sets: self.line_sets.iter().map(|l| PointsSummary {
                id: l.id, points: l.points.len(), colors: l.colors.len(),
            }).collect(),
            scene_nodes: self.scene_nodes.iter().map(|n| SceneNodeSummary {
                id:          n.id,
                name:        n.name.clone(),
                geometry:    n.geometry_id,
                translation: n.translation.to_array(),
            }).collect(),
            tracks: self.tracks.iter().map(|t| TrackSummary {
                id:        t.id,
                timestamp: t.timestamp,
                points:    t.points.len(),
            }).collect(),
            unknown_blocks: self.unknown_blocks,
            invalid_blocks: self.invalid_blocks,
            truncated:      self.truncated,
        }
    }
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Flat, serializable listing of a file's contents.
#[derive(Debug, Clone, Serialize)]
pub struct FileSummary {
    pub crs:            CrsSummary,
    pub meshes:         Vec<MeshSummary>,
    pub materials:      Vec<MaterialSummary>,
    pub images:         Vec<ImageSummary>,
    pub point_lists:    Vec<PointsSummary>,
    pub line_sets:      Vec<PointsSummary>,
    pub scene_nodes:    Vec<SceneNodeSummary>,
    pub tracks:         Vec<TrackSummary>,
    pub unknown_blocks: usize,
    pub invalid_blocks: usize,
    pub truncated:      bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CrsSummary {
    pub srid:   u32,
    pub name:   String,
    pub origin: [f32; 3],
}

#[derive(Debug, Clone, Serialize)]
pub struct MeshSummary {
    pub id:        u64,
    pub name:      String,
    pub vertices:  usize,
    pub normals:   usize,
    pub texcoords: usize,
    pub colors:    usize,
    pub triangles: usize,
    pub material:  Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MaterialSummary {
    pub id:       u64,
    pub ambient:  [f32; 3],
    pub diffuse:  [f32; 3],
    pub specular: [f32; 3],
    pub ns:       f32,
    pub alpha:    f32,
    pub textures: [Option<u64>; 3],
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageSummary {
    pub id:          u64,
    pub compression: ImageCompression,
    pub bytes:       usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PointsSummary {
    pub id:     u64,
    pub points: usize,
    pub colors: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SceneNodeSummary {
    pub id:          u64,
    pub name:        String,
    pub geometry:    Option<u64>,
    pub translation: [f32; 3],
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackSummary {
    pub id:        u64,
    pub timestamp: i64,
    pub points:    usize,
}
