//! Benchmarks for the binding generator.
//!
//! Measures the full scan, resolve and emit pipeline over synthetic interop
//! surfaces of increasing size:
//! - `exports_N`: N exported traits of eight methods each over a shared set of
//!   blittable types
//! - `types_N`: N blittable structs chained by value, stressing layout
//!   computation
//!
//! ```bash
//! cargo bench --bench codegen_benchmarks -- exports_64
//! ```

use std::fmt::Write;
use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use retro_binds_codegen::{Generator, GeneratorConfig, SourceFile};

const TYPES: &str = r#"
#[derive(Clone, Copy, Blittable)]
#[repr(C)]
#[blittable(name = "retro::Color", module = "retro.core")]
pub struct Color { pub r: f32, pub g: f32, pub b: f32, pub a: f32 }

#[derive(Clone, Copy, Blittable)]
#[repr(C)]
#[blittable(name = "retro::Transform", module = "retro.core")]
pub struct Transform { pub x: f32, pub y: f32, pub rotation: f32, pub scale: f64 }

#[derive(Clone, Copy, Blittable)]
#[repr(u8)]
#[blittable(name = "retro::LogLevel", module = "retro.logging")]
pub enum LogLevel { Trace, Debug, Info, Warn, Error }
"#;

fn exports_source(count: usize) -> String {
    let mut src = String::from("use super::types::*;\n");
    for i in 0..count {
        let kind = ["class", "struct", "record"][i % 3];
        let _ = writeln!(
            src,
            "#[bind_export(namespace = \"retro\", kind = \"{kind}\")]\npub trait Export{i} {{"
        );
        src.push_str(
            "    fn add(&self, a: i32, b: i32) -> i32;\n\
             \x20   fn lerp(&self, from: f32, to: f32, t: f32) -> f32;\n\
             \x20   fn tint(&self, id: u64) -> Color;\n\
             \x20   fn set_tint(&self, id: u64, color: Color);\n\
             \x20   fn get_transform(&self, id: u64, out: &mut Transform) -> bool;\n\
             \x20   fn translate(&self, id: u64, #[native(is_const)] delta: &Transform);\n\
             \x20   fn log(&self, level: LogLevel, #[native(name = \"char16_t\")] text: *const u16, len: i32);\n\
             \x20   fn reset(&self);\n",
        );
        src.push_str("}\n\n");
    }
    src
}

fn chained_types_source(count: usize) -> String {
    let mut src = String::from(
        "#[derive(Clone, Copy, Blittable)]\n#[repr(C)]\npub struct Link0 { pub value: u8 }\n",
    );
    for i in 1..count {
        let _ = writeln!(
            src,
            "#[derive(Clone, Copy, Blittable)]\n#[repr(C)]\npub struct Link{i} {{ pub prev: Link{}, pub tag: u16, pub weight: f64 }}",
            i - 1
        );
    }
    src
}

fn bench_exports(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    let generator = Generator::new(GeneratorConfig::default());

    for count in [1, 8, 64] {
        let sources = vec![
            SourceFile::new("src/interop/types.rs", "interop::types", TYPES),
            SourceFile::new(
                "src/interop/exports.rs",
                "interop::exports",
                exports_source(count),
            ),
        ];
        group.throughput(Throughput::Elements((count * 8) as u64));
        group.bench_with_input(
            BenchmarkId::new("exports", count),
            &sources,
            |b, sources| {
                b.iter(|| {
                    let output = generator.generate_sources(black_box(sources)).unwrap();
                    black_box(output.classes.len())
                });
            },
        );
    }
    group.finish();
}

fn bench_layouts(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let generator = Generator::new(GeneratorConfig::default());

    for count in [16, 128] {
        let sources = vec![SourceFile::new(
            "src/interop/chain.rs",
            "interop::chain",
            chained_types_source(count),
        )];
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("types", count), &sources, |b, sources| {
            b.iter(|| {
                let output = generator.generate_sources(black_box(sources)).unwrap();
                black_box(output.types.len())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_exports, bench_layouts);
criterion_main!(benches);
