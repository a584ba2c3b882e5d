use glam::{Quat, Vec2, Vec3};
use rexfmt::block::{BlockType, DataBlockHeader, BLOCK_HEADER_SIZE};
use rexfmt::io_stream::{decode, encode_to_vec, DecodeOptions, Decoder, DecoderState, Encoder};
use rexfmt::{
    BlockCodec, Crs, File, Image, ImageCompression, LineSet, Material, Mesh, PointList, RexError,
    SceneNode, Track, TrackElement, Triangle,
};
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use tempfile::NamedTempFile;

fn triangle_mesh(id: u64, name: &str) -> Mesh {
    Mesh {
        id,
        name: name.to_string(),
        material_id: Some(0),
        coords: vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.5, 1.0, 0.0)],
        triangles: vec![Triangle::new(0, 1, 2)],
        ..Default::default()
    }
}

fn full_scene() -> File {
    let mut file = File::new();

    let mut mesh = triangle_mesh(1, "textured");
    mesh.material_id = Some(2);
    mesh.normals = vec![Vec3::Z; 3];
    mesh.tex_coords = vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.5, 1.0)];
    mesh.colors = vec![Vec3::X, Vec3::Y, Vec3::Z];
    file.meshes.push(mesh);
    file.meshes.push(triangle_mesh(11, "plain"));

    let mut mat = Material::new(2);
    mat.kd_texture_id = Some(3);
    mat.ns = 12.5;
    mat.alpha = 0.75;
    file.materials.push(mat);

    file.images.push(Image::new(3, ImageCompression::Jpeg, vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3]));

    let mut pl = PointList::new(4);
    pl.points = vec![Vec3::ZERO, Vec3::ONE, Vec3::new(0.0, 1.0, 1.0)];
    pl.colors = vec![Vec3::ONE; 3];
    file.point_lists.push(pl);

    let mut ls = LineSet::new(5);
    ls.points = vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0)];
    file.line_sets.push(ls);

    let mut node = SceneNode::placing(6, 1, Vec3::new(-5.0, 0.0, 0.0));
    node.name = "left".into();
    node.rotation = Quat::from_xyzw(0.0, 0.0, 0.707_106_77, 0.707_106_77);
    node.scale = Vec3::splat(2.0);
    file.scene_nodes.push(node);

    file.tracks.push(Track {
        id: 7,
        timestamp: 1_560_000_000,
        points: vec![TrackElement { point: Vec3::ONE, normal: Vec3::Y, confidence: 0.5 }],
    });
    file
}

#[test]
fn test_empty_file_is_header_only() {
    let bytes = encode_to_vec(&File::new()).unwrap();
    assert_eq!(bytes.len(), 86);

    let file = decode(Cursor::new(&bytes)).unwrap();
    assert_eq!(file.block_count(), 0);
    assert_eq!(file.unknown_blocks, 0);
    assert_eq!(file.crs, Crs::default());
}

#[test]
fn test_single_triangle_roundtrip() {
    let mut file = File::new();
    file.meshes.push(triangle_mesh(1, "t"));

    let bytes = encode_to_vec(&file).unwrap();
    let back = decode(&bytes[..]).unwrap();

    assert_eq!(back.meshes.len(), 1);
    assert_eq!(back.meshes[0].triangle_count(), 1);
    assert_eq!(back.meshes[0].vertex_count(), 3);
    assert_eq!(back.meshes[0].name, "t");
    assert_eq!(back.meshes[0].material_id, Some(0));
}

#[test]
fn test_full_scene_roundtrip() {
    let file = full_scene();
    let mut buf = Vec::new();
    let written = Encoder::new(&mut buf).encode(&file).unwrap();
    assert_eq!(written, buf.len() as u64);

    let mut decoder = Decoder::new(&buf[..]);
    let back = decoder.decode().unwrap();
    assert_eq!(decoder.state(), DecoderState::Done);
    assert_eq!(back, file);

    let header = decoder.header().unwrap();
    assert_eq!(header.nr_blocks as usize, file.block_count());
    assert_eq!(header.size_bytes + 86, buf.len() as u64);
}

#[test]
fn test_blocks_are_grouped_in_fixed_order() {
    let bytes = encode_to_vec(&full_scene()).unwrap();
    let mut reader = &bytes[86..];
    let mut order = Vec::new();
    while let Some(h) = DataBlockHeader::read_next(&mut reader).unwrap() {
        order.push(h.block_type);
        reader = &reader[h.size as usize..];
    }
    assert_eq!(order, vec![
        BlockType::PointList,
        BlockType::Mesh,
        BlockType::Mesh,
        BlockType::Material,
        BlockType::Image,
        BlockType::LineSet,
        BlockType::SceneNode,
        BlockType::Track,
    ]);
}

#[test]
fn test_empty_geometry_is_not_written() {
    let mut file = File::new();
    file.meshes.push(Mesh::new(1, "nothing"));
    file.point_lists.push(PointList::new(2));
    file.line_sets.push(LineSet::new(3));

    let bytes = encode_to_vec(&file).unwrap();
    assert_eq!(bytes.len(), 86);
    assert_eq!(file.derive_header().unwrap().nr_blocks, 0);
    assert_eq!(decode(&bytes[..]).unwrap().block_count(), 0);
}

#[test]
fn test_unknown_block_is_skipped_and_counted() {
    let mut buf = Vec::new();
    rexfmt::Header::new().write(&mut buf).unwrap();
    triangle_mesh(1, "before").write_block(&mut buf).unwrap();

    let junk = [0xAB; 37];
    DataBlockHeader::new(BlockType::Unknown(999), 1, 42, junk.len() as u32)
        .write(&mut buf)
        .unwrap();
    buf.extend_from_slice(&junk);

    Material::new(2).write_block(&mut buf).unwrap();

    let file = decode(&buf[..]).unwrap();
    assert_eq!(file.meshes.len(), 1);
    assert_eq!(file.materials.len(), 1);
    assert_eq!(file.materials[0].id, 2);
    assert_eq!(file.unknown_blocks, 1);
}

#[test]
fn test_reserved_tags_without_codec_are_skipped() {
    let mut buf = Vec::new();
    rexfmt::Header::new().write(&mut buf).unwrap();
    for (i, block_type) in [BlockType::Text, BlockType::PeopleSimulation, BlockType::UnityPackage]
        .into_iter()
        .enumerate()
    {
        let payload = vec![i as u8; 5 + i];
        DataBlockHeader::new(block_type, 1, 100 + i as u64, payload.len() as u32)
            .write(&mut buf)
            .unwrap();
        buf.extend_from_slice(&payload);
    }
    Material::new(2).write_block(&mut buf).unwrap();

    let mut decoder = Decoder::new(&buf[..]);
    let skipped: Vec<_> = std::iter::from_fn(|| decoder.next_block().unwrap())
        .map(|b| (b.block_type().tag(), b.id()))
        .collect();
    assert_eq!(skipped, vec![(1, 100), (6, 101), (7, 102), (5, 2)]);

    let file = decode(&buf[..]).unwrap();
    assert_eq!(file.unknown_blocks, 3);
    assert_eq!(file.materials.len(), 1);
}

#[test]
fn test_unsupported_version_is_skipped() {
    let mut buf = Vec::new();
    rexfmt::Header::new().write(&mut buf).unwrap();

    let mut mat = Material::new(9).to_bytes().unwrap();
    mat[2..4].copy_from_slice(&7u16.to_le_bytes());
    buf.extend_from_slice(&mat);
    triangle_mesh(1, "after").write_block(&mut buf).unwrap();

    let file = decode(&buf[..]).unwrap();
    assert!(file.materials.is_empty());
    assert_eq!(file.unknown_blocks, 1);
    assert_eq!(file.meshes[0].name, "after");
}

#[test]
fn test_truncated_block_keeps_partial_file() {
    let mut file = File::new();
    file.materials.push(Material::new(1));
    file.images.push(Image::new(2, ImageCompression::Png, vec![7; 64]));
    let bytes = encode_to_vec(&file).unwrap();
    let cut = &bytes[..bytes.len() - 1];

    let err = decode(cut).unwrap_err();
    assert!(matches!(err.source, RexError::Truncated { .. }));
    assert_eq!(err.file.materials.len(), 1);
    assert!(err.file.images.is_empty());

    let lenient = Decoder::with_options(cut, DecodeOptions::lenient()).decode().unwrap();
    assert!(lenient.truncated);
    assert_eq!(lenient.materials.len(), 1);
}

#[test]
fn test_truncated_frame_is_an_error() {
    let mut file = File::new();
    file.materials.push(Material::new(1));
    let mut bytes = encode_to_vec(&file).unwrap();
    bytes.extend_from_slice(&[3, 0, 1]);

    let err = decode(&bytes[..]).unwrap_err();
    assert!(err.source.is_truncated());
    assert_eq!(err.file.materials.len(), 1);
}

#[test]
fn test_foreign_magic_is_rejected_unless_lenient() {
    let mut bytes = encode_to_vec(&full_scene()).unwrap();
    bytes[0..4].copy_from_slice(b"XYZ9");

    let err = decode(&bytes[..]).unwrap_err();
    assert!(matches!(err.source, RexError::InvalidMagic(m) if &m == b"XYZ9"));

    let file = Decoder::with_options(&bytes[..], DecodeOptions::lenient()).decode().unwrap();
    assert_eq!(file.block_count(), full_scene().block_count());
}

#[test]
fn test_custom_crs_roundtrip() {
    let crs = Crs { srid: 31256, name: "MGI / Austria GK East".into(), origin: Vec3::new(10.0, 20.0, 0.5) };
    let mut file = File::with_crs(crs.clone());
    file.meshes.push(triangle_mesh(1, "t"));

    let bytes = encode_to_vec(&file).unwrap();
    let mut decoder = Decoder::new(&bytes[..]);
    let back = decoder.decode().unwrap();
    assert_eq!(back.crs, crs);
    assert_eq!(decoder.header().unwrap().start_addr as usize, 64 + 18 + crs.name.len());
}

#[test]
fn test_extract_image_payload_by_id() {
    let file = full_scene();
    let bytes = encode_to_vec(&file).unwrap();

    let mut decoder = Decoder::new(&bytes[..]);
    let (header, payload) = decoder.extract_payload(3).unwrap().unwrap();
    assert_eq!(header.block_type, BlockType::Image);
    let image = Image::decode(&payload, &header).unwrap();
    assert_eq!(image.data, file.images[0].data);

    let mut decoder = Decoder::new(&bytes[..]);
    assert!(decoder.extract_payload(12345).unwrap().is_none());
}

#[test]
fn test_next_block_streams_one_at_a_time() {
    let bytes = encode_to_vec(&full_scene()).unwrap();
    let mut decoder = Decoder::new(&bytes[..]);
    assert_eq!(decoder.state(), DecoderState::ReadingHeader);

    let first = decoder.next_block().unwrap().unwrap();
    assert_eq!(first.block_type(), BlockType::PointList);
    assert_eq!(first.id(), 4);
    assert_eq!(decoder.state(), DecoderState::ReadingBlocks);

    let mut rest = 0;
    while decoder.next_block().unwrap().is_some() {
        rest += 1;
    }
    assert_eq!(rest, 7);
    assert_eq!(decoder.state(), DecoderState::Done);
    assert!(decoder.next_block().unwrap().is_none());
}

#[test]
fn test_file_backed_roundtrip() {
    let mut temp = NamedTempFile::new().unwrap();
    let file = full_scene();

    let written = Encoder::new(temp.as_file_mut()).encode(&file).unwrap();
    temp.as_file_mut().flush().unwrap();

    let mut f = temp.reopen().unwrap();
    assert_eq!(f.seek(SeekFrom::End(0)).unwrap(), written);
    f.seek(SeekFrom::Start(0)).unwrap();

    let back = Decoder::new(&mut f).decode().unwrap();
    assert_eq!(back, file);

    // The decoder leaves the stream open and positioned at its end.
    let mut rest = Vec::new();
    f.read_to_end(&mut rest).unwrap();
    assert!(rest.is_empty());
}

#[test]
fn test_write_failure_is_reported() {
    struct Full(usize);
    impl Write for Full {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.0 == 0 {
                return Err(std::io::Error::new(std::io::ErrorKind::WriteZero, "disk full"));
            }
            let n = buf.len().min(self.0);
            self.0 -= n;
            Ok(n)
        }
        fn flush(&mut self) -> std::io::Result<()> { Ok(()) }
    }

    let err = Encoder::new(Full(100)).encode(&full_scene()).unwrap_err();
    assert!(matches!(err.source, RexError::Io(_)));
    assert_eq!(err.written, 100);
}

#[test]
fn test_invalid_block_writes_nothing() {
    let mut file = full_scene();
    let mut bad = triangle_mesh(20, "bad");
    bad.colors = vec![Vec3::ONE];
    file.meshes.push(bad);

    let mut buf = Vec::new();
    let err = Encoder::new(&mut buf).encode(&file).unwrap_err();
    assert!(matches!(err.source, RexError::InvalidBlock { id: 20, .. }));
    assert_eq!(err.written, 0);
    assert!(buf.is_empty());
}

#[test]
fn test_oversized_counts_are_invalid_not_truncated() {
    let mut file = File::new();
    file.meshes.push(triangle_mesh(1, "corrupt"));
    file.materials.push(Material::new(2));
    let mut bytes = encode_to_vec(&file).unwrap();
    // nr_coords of the first block's mesh sub-header.
    bytes[86 + 16 + 4..86 + 16 + 8].copy_from_slice(&1000u32.to_le_bytes());

    let err = decode(&bytes[..]).unwrap_err();
    assert!(!err.source.is_truncated());
    assert!(matches!(err.source, RexError::InvalidBlock { block_type: BlockType::Mesh, id: 1, .. }));

    let lenient = Decoder::with_options(&bytes[..], DecodeOptions::lenient()).decode().unwrap();
    assert!(!lenient.truncated);
    assert!(lenient.meshes.is_empty());
    assert_eq!(lenient.materials.len(), 1);
    assert_eq!(lenient.invalid_blocks, 1);
    assert_eq!(lenient.unknown_blocks, 0);
}

#[test]
fn test_summary_serializes_to_json() {
    let summary = full_scene().summary();
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["meshes"][0]["name"], "textured");
    assert_eq!(json["images"][0]["compression"], "jpg");
    assert_eq!(json["materials"][0]["textures"][1], 3);
    assert!(json["materials"][0]["textures"][0].is_null());
    assert_eq!(json["unknown_blocks"], 0);
    assert_eq!(json["invalid_blocks"], 0);
    assert_eq!(BLOCK_HEADER_SIZE, 16);
}
