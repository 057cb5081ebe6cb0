//! Prompt hashing benchmarks
//!
//! Every resolver dispatch hashes its prompt pair, so this sits on the hot
//! path of a full matrix run.

use chirality::context::{terms, OperationType, SemanticContext};
use chirality::prompt::{normalize_text, prompt_hash, SYSTEM_PROMPT};
use chirality::resolver::PromptFragments;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn user_prompt(products: usize) -> String {
    let pairs: Vec<String> = (0..products)
        .map(|k| format!("Term{} * Other{}", k, k))
        .collect();
    let context = SemanticContext::new(
        "Requirements",
        "Semantic Valley: Problem Statement → [Requirements] → Objectives",
        "Normative",
        "Determinacy",
        OperationType::Interpret,
        terms([("content", pairs.join(", "))]),
    )
    .expect("valid context");
    PromptFragments::from_context(&context).render()
}

fn bench_prompt_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("prompt_hash");
    for products in [1usize, 4, 16] {
        let user = user_prompt(products);
        group.bench_with_input(BenchmarkId::from_parameter(products), &user, |b, user| {
            b.iter(|| prompt_hash(black_box(SYSTEM_PROMPT), black_box(user)))
        });
    }
    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let messy = format!("  {}\n\n\t{}  ", SYSTEM_PROMPT, SYSTEM_PROMPT);
    c.bench_function("normalize_text/system_prompt_x2", |b| {
        b.iter(|| normalize_text(black_box(&messy)))
    });
}

criterion_group!(benches, bench_prompt_hash, bench_normalize);
criterion_main!(benches);
