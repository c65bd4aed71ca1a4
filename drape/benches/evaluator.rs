use criterion::{Bencher, BenchmarkId, Criterion, criterion_group, criterion_main};
use drape::deform::*;
use drape::math::*;
use drape::rbf::*;

// Fitted garment fields typically carry a few hundred centers
fn build_field(centers: usize) -> RbfField {
    let mut c = Vec::with_capacity(centers);
    let mut w = Vec::with_capacity(centers);
    for i in 0..centers {
        let t = i as f64 / centers as f64;
        c.push(Vec3::new((t * 17.0).sin(), t * 2.0 - 1.0, (t * 11.0).cos()));
        w.push(Vec3::new(0.001 * (t * 5.0).cos(), 0.002, -0.001 * t));
    }
    RbfField::new(0.1, c, w, [Vec3::ZERO; 4]).unwrap_or_else(|_| RbfField::identity())
}

// 100x100 grid of vertices on the unit square at z=0
fn build_10k_vertices() -> Vec<Vec3> {
    let mut vertices = Vec::with_capacity(100 * 100);
    for y in 0..100 {
        for x in 0..100 {
            vertices.push(Vec3::new(x as f64 * 0.01, y as f64 * 0.01, 0.0));
        }
    }
    vertices
}

fn criterion_benchmark(c: &mut Criterion) {
    let vertices = build_10k_vertices();

    let mut group = c.benchmark_group("Evaluate 10K");
    for centers in [16, 128, 512] {
        let field = build_field(centers);
        group.bench_with_input(BenchmarkId::new("Centers", centers), &field, |bencher: &mut Bencher, field| {
            bencher.iter(|| {
                for &p in &vertices {
                    std::hint::black_box(field.evaluate(p));
                }
            })
        });
    }
    group.finish();

    let field = build_field(128);
    let ledger = BufferLedger::default();
    let mut group = c.benchmark_group("Deformation pass 10K");
    for chunk_size in [16, 64, 1024] {
        let pass = DeformationPass::new(&ledger, Transform::identity(), chunk_size);
        group.bench_with_input(BenchmarkId::new("Chunk", chunk_size), &pass, |bencher: &mut Bencher, pass| {
            bencher.iter(|| std::hint::black_box(pass.run(&vertices, &field)))
        });
    }
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
