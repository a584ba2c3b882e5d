//! Procedural demo geometry.

use glam::Vec3;

use crate::codec::{Material, Mesh, Triangle};

/// Axis-aligned cube of edge length `size` centred on the origin: 24
/// vertices (four per face so normals stay flat), 12 triangles.  The mesh
/// references `material_id`; a matching red material is returned with it.
pub fn cube(mesh_id: u64, material_id: u64, size: f32) -> (Mesh, Material) {
    let size = if size <= 0.0 {
        tracing::warn!(size, "cube size must be > 0.0, clamping to 0.001");
        0.001
    } else {
        size
    };
    let h = size / 2.0;

    let mut mesh = Mesh::new(mesh_id, "cube");
    mesh.material_id = Some(material_id);

    let mut add_quad = |corners: [Vec3; 4], normal: Vec3| {
        let base = mesh.coords.len() as u32;
        mesh.coords.extend_from_slice(&corners);
        mesh.normals.extend_from_slice(&[normal; 4]);
        // Counter-clockwise seen from outside: BL, BR, TR, TL.
        mesh.triangles.push(Triangle::new(base, base + 1, base + 2));
        mesh.triangles.push(Triangle::new(base, base + 2, base + 3));
    };

    // +Z
    add_quad(
        [Vec3::new(-h, -h, h), Vec3::new(h, -h, h), Vec3::new(h, h, h), Vec3::new(-h, h, h)],
        Vec3::Z,
    );
    // -Z
    add_quad(
        [Vec3::new(h, -h, -h), Vec3::new(-h, -h, -h), Vec3::new(-h, h, -h), Vec3::new(h, h, -h)],
        Vec3::NEG_Z,
    );
    // +Y
    add_quad(
        [Vec3::new(-h, h, h), Vec3::new(h, h, h), Vec3::new(h, h, -h), Vec3::new(-h, h, -h)],
        Vec3::Y,
    );
    // -Y
    add_quad(
        [Vec3::new(-h, -h, -h), Vec3::new(h, -h, -h), Vec3::new(h, -h, h), Vec3::new(-h, -h, h)],
        Vec3::NEG_Y,
    );
    // +X
    add_quad(
        [Vec3::new(h, -h, h), Vec3::new(h, -h, -h), Vec3::new(h, h, -h), Vec3::new(h, h, h)],
        Vec3::X,
    );
    // -X
    add_quad(
        [Vec3::new(-h, -h, -h), Vec3::new(-h, -h, h), Vec3::new(-h, h, h), Vec3::new(-h, h, -h)],
        Vec3::NEG_X,
    );

    let material = Material::new(material_id).with_diffuse(Vec3::new(0.9, 0.1, 0.1));
    (mesh, material)
}
