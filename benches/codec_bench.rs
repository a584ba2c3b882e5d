use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::Vec3;
use rexfmt::io_stream::{decode, encode_to_vec};
use rexfmt::{File, Mesh, PointList, Triangle};

fn grid_mesh(n: u32) -> Mesh {
    let mut mesh = Mesh::new(1, "grid");
    for y in 0..=n {
        for x in 0..=n {
            mesh.coords.push(Vec3::new(x as f32, y as f32, 0.0));
            mesh.normals.push(Vec3::Z);
        }
    }
    let row = n + 1;
    for y in 0..n {
        for x in 0..n {
            let i = y * row + x;
            mesh.triangles.push(Triangle::new(i, i + 1, i + row + 1));
            mesh.triangles.push(Triangle::new(i, i + row + 1, i + row));
        }
    }
    mesh
}

fn scene() -> File {
    let mut file = File::new();
    file.meshes.push(grid_mesh(256));
    let mut cloud = PointList::new(2);
    cloud.points = (0..100_000).map(|i| Vec3::splat(i as f32)).collect();
    file.point_lists.push(cloud);
    file
}

fn bench_encode(c: &mut Criterion) {
    let file = scene();
    c.bench_function("encode_grid_mesh_and_cloud", |b| {
        b.iter(|| encode_to_vec(black_box(&file)).unwrap())
    });
}

fn bench_decode(c: &mut Criterion) {
    let bytes = encode_to_vec(&scene()).unwrap();
    c.bench_function("decode_grid_mesh_and_cloud", |b| {
        b.iter(|| decode(black_box(&bytes[..])).unwrap())
    });
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
