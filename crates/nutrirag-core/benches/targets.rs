//! Targets and ranking benchmarks
//!
//! Measures performance of:
//! - Nutrition target computation across activity levels and eGFR bands
//! - Brute-force cosine search over an in-memory corpus

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nutrirag_core::index::cosine_similarity;
use nutrirag_core::{
    compute_targets, ActivityLevel, GuidelinePassage, MemoryIndex, Sex, TargetsPolicy,
    UserProfile, VectorIndex,
};

const GUIDELINES: &[&str] = &["ADA", "AHA", "DASH", "KDIGO", "LIPID"];

fn profile(activity_level: ActivityLevel, egfr: Option<f64>) -> UserProfile {
    UserProfile {
        weight_kg: 82.0,
        height_cm: 178.0,
        age: 54,
        sex: Sex::Female,
        activity_level,
        egfr,
    }
}

fn synthetic_corpus(size: usize, dims: usize) -> Vec<GuidelinePassage> {
    (0..size)
        .map(|i| GuidelinePassage {
            id: format!("p{:05}", i),
            guideline: GUIDELINES[i % GUIDELINES.len()].to_string(),
            document: None,
            text: format!("passage {}", i),
            embedding: (0..dims)
                .map(|d| ((i * 31 + d * 17) % 97) as f32 / 97.0)
                .collect(),
        })
        .collect()
}

fn bench_compute_targets(c: &mut Criterion) {
    let policy = TargetsPolicy::default();
    let mut group = c.benchmark_group("compute_targets");

    for egfr in [None, Some(75.0), Some(45.0), Some(20.0), Some(10.0)] {
        let label = egfr.map_or_else(|| "none".to_string(), |e| e.to_string());
        group.bench_with_input(BenchmarkId::new("egfr", label), &egfr, |b, egfr| {
            b.iter(|| {
                for level in ActivityLevel::ALL {
                    let targets = compute_targets(black_box(&profile(level, *egfr)), &policy);
                    black_box(targets.ok());
                }
            })
        });
    }

    group.finish();
}

fn bench_cosine_similarity(c: &mut Criterion) {
    let a: Vec<f32> = (0..768).map(|i| (i as f32).sin()).collect();
    let b: Vec<f32> = (0..768).map(|i| (i as f32).cos()).collect();

    c.bench_function("cosine_similarity_768", |bench| {
        bench.iter(|| cosine_similarity(black_box(&a), black_box(&b)))
    });
}

fn bench_memory_search(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let query: Vec<f32> = (0..768).map(|d| (d % 13) as f32 / 13.0).collect();
    let mut group = c.benchmark_group("memory_search");

    for size in [100, 1_000, 5_000] {
        let index = MemoryIndex::new(synthetic_corpus(size, 768));
        group.bench_with_input(BenchmarkId::from_parameter(size), &index, |b, index| {
            b.iter(|| rt.block_on(index.search(black_box(&query), 5, None)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_compute_targets,
    bench_cosine_similarity,
    bench_memory_search
);
criterion_main!(benches);
