use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dealrank_engine::{
    catalog::CatalogData,
    core::{Category, Listing, ScoredListing},
    oracle::WeightedSumOracle,
    ranking, CatalogStore, DealEngine, DealQuery,
};
use std::sync::Arc;

fn create_test_listings(count: usize) -> Vec<Listing> {
    (0..count)
        .map(|i| {
            Listing::new(format!("Test Phone {}", i), format!("Seller {}", i % 7), 500.0 + (i % 37) as f64 * 25.0)
                .with_rating(3.0 + (i % 5) as f64 * 0.5)
                .with_spec_score((i % 100) as f64)
                .with_delivery_days((i % 6) as u32)
        })
        .collect()
}

fn create_scored(count: usize) -> Vec<ScoredListing> {
    create_test_listings(count)
        .into_iter()
        .enumerate()
        // Coarse scores force the tie-break chain to do work
        .map(|(i, listing)| ScoredListing::new(listing, (i % 10) as f64 / 10.0))
        .collect()
}

fn bench_ranking(c: &mut Criterion) {
    let scored_100 = create_scored(100);
    let scored_1000 = create_scored(1000);
    let scored_10000 = create_scored(10000);

    c.bench_function("rank_top3_100", |b| {
        b.iter(|| black_box(ranking::rank(scored_100.clone(), 3)));
    });

    c.bench_function("rank_top3_1000", |b| {
        b.iter(|| black_box(ranking::rank(scored_1000.clone(), 3)));
    });

    c.bench_function("rank_top3_10000", |b| {
        b.iter(|| black_box(ranking::rank(scored_10000.clone(), 3)));
    });
}

fn bench_search(c: &mut Criterion) {
    let data = CatalogData {
        listings: create_test_listings(500)
            .into_iter()
            .map(|l| (Category::Phone, l))
            .collect(),
        ..Default::default()
    };
    let catalog = Arc::new(CatalogStore::from_data(data, "bench").unwrap());
    let engine = DealEngine::new(catalog, Arc::new(WeightedSumOracle::default()));
    let runtime = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("search_weighted_500", |b| {
        b.to_async(&runtime)
            .iter(|| async { black_box(engine.search(DealQuery::new("best phone deals")).await.unwrap()) });
    });
}

criterion_group!(benches, bench_ranking, bench_search);
criterion_main!(benches);
