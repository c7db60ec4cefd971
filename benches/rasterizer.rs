use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use scanraster::bench::{
    Fragment, Rasterizer, ScanlineRasterizer, Vertex, Viewport, WireframeRasterizer,
};
use scanraster::math::{Mat4, Vec4};
use scanraster::{Camera, Mesh, RenderMode};

type ScreenTriangle = [Vertex; 3];

const VIEWPORT: Viewport = Viewport::new(800, 600);

fn vertex(x: f32, y: f32) -> Vertex {
    Vertex::at(Vec4::point(x, y, 0.5))
}

fn small_triangle() -> ScreenTriangle {
    [vertex(100.0, 100.0), vertex(120.0, 100.0), vertex(110.0, 120.0)]
}

fn medium_triangle() -> ScreenTriangle {
    [vertex(100.0, 100.0), vertex(300.0, 100.0), vertex(200.0, 300.0)]
}

fn large_triangle() -> ScreenTriangle {
    [vertex(50.0, 50.0), vertex(750.0, 100.0), vertex(400.0, 550.0)]
}

fn rasterize_all(
    rasterizer: &dyn Rasterizer,
    triangles: &[ScreenTriangle],
    out: &mut Vec<Fragment>,
) {
    out.clear();
    for [a, b, c] in triangles {
        rasterizer.rasterize(black_box(a), black_box(b), black_box(c), out);
    }
}

fn benchmark_single_triangle(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_triangle");

    let scanline = ScanlineRasterizer::new(VIEWPORT);
    let wireframe = WireframeRasterizer::new(VIEWPORT);

    for (name, triangle) in [
        ("small", small_triangle()),
        ("medium", medium_triangle()),
        ("large", large_triangle()),
    ] {
        group.bench_with_input(BenchmarkId::new("scanline", name), &triangle, |b, tri| {
            let mut fragments = Vec::new();
            b.iter(|| rasterize_all(&scanline, std::slice::from_ref(tri), &mut fragments));
        });

        group.bench_with_input(BenchmarkId::new("wireframe", name), &triangle, |b, tri| {
            let mut fragments = Vec::new();
            b.iter(|| rasterize_all(&wireframe, std::slice::from_ref(tri), &mut fragments));
        });
    }

    group.finish();
}

fn benchmark_many_triangles(c: &mut Criterion) {
    let mut group = c.benchmark_group("many_triangles");

    let scanline = ScanlineRasterizer::new(VIEWPORT);

    // A grid of small triangles
    let triangles: Vec<ScreenTriangle> = (0..20)
        .flat_map(|row| {
            (0..20).map(move |col| {
                let x = col as f32 * 40.0;
                let y = row as f32 * 30.0;
                [vertex(x, y), vertex(x + 35.0, y), vertex(x + 17.5, y + 25.0)]
            })
        })
        .collect();

    group.bench_function("scanline_400_triangles", |b| {
        let mut fragments = Vec::new();
        b.iter(|| rasterize_all(&scanline, &triangles, &mut fragments));
    });

    group.finish();
}

fn benchmark_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame");

    let mut cube = Mesh::cube();
    cube.set_model_to_world(
        Mat4::rotation_y(0.6) * Mat4::rotation_x(0.4) * Mat4::translation(0.0, 0.0, 4.0),
    );

    for mode in [RenderMode::Wireframe, RenderMode::Filled] {
        let mut camera = Camera::new(800, 600);
        camera.set_render_mode(mode);
        group.bench_function(BenchmarkId::new("cube", mode), |b| {
            b.iter(|| camera.draw_frame([black_box(&cube)]))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_single_triangle,
    benchmark_many_triangles,
    benchmark_frame
);
criterion_main!(benches);
