use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use glam::DVec3;
use splatcap_3d::{
    camera::CameraIntrinsics,
    io::{colmap, ply},
    pointcloud::PointCloud,
    trajectory::{generate_viewpoints, TrajectoryConfig, TrajectoryKind},
};

fn bench_generate_viewpoints(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_viewpoints");

    for kind in [
        TrajectoryKind::Orbital,
        TrajectoryKind::Spherical,
        TrajectoryKind::Spiral,
    ] {
        let config = TrajectoryConfig {
            kind,
            num_rings: 8,
            views_per_ring: 72,
            ..Default::default()
        };
        group.bench_with_input(
            BenchmarkId::new("kind", format!("{kind:?}")),
            &config,
            |b, config| b.iter(|| black_box(generate_viewpoints(black_box(config)))),
        );
    }

    group.finish();
}

fn bench_write_binary(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_binary");

    for num_views in [36usize, 360] {
        let config = TrajectoryConfig {
            num_rings: 1,
            views_per_ring: num_views as u32,
            ..Default::default()
        };
        let viewpoints = generate_viewpoints(&config);
        let intrinsics = CameraIntrinsics::from_fov(1920, 1080, 90.0);
        let images = colmap::create_images_from_viewpoints(&viewpoints, &intrinsics, "image_", ".jpg");
        let cloud = PointCloud::from_viewpoints(&viewpoints, DVec3::ZERO);
        let splats = ply::create_splats_from_pointcloud(&cloud, ply::DEFAULT_INITIAL_SCALE);

        group.throughput(criterion::Throughput::Elements(num_views as u64));

        group.bench_with_input(
            BenchmarkId::new("images_bin", num_views),
            &images,
            |b, images| {
                b.iter(|| {
                    let mut buffer = Vec::new();
                    colmap::write_images_binary(&mut buffer, black_box(images)).ok();
                    black_box(buffer)
                })
            },
        );

        group.bench_with_input(
            BenchmarkId::new("gaussian_ply", num_views),
            &splats,
            |b, splats| {
                b.iter(|| {
                    let mut buffer = Vec::new();
                    ply::write_gaussians(&mut buffer, black_box(splats), ply::PlyEncoding::BinaryLittleEndian)
                        .ok();
                    black_box(buffer)
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_generate_viewpoints, bench_write_binary);
criterion_main!(benches);
