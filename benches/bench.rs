// Criterion benchmarks for Listing Facets

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use chrono::{Duration, Utc};
use listing_facets::core::{derive_tags, FacetEngine};
use listing_facets::models::{
    ClassifyingAttributes, FilterRequest, HairColor, Listing, Nationality, NewListing, Service,
};

const CITIES: [&str; 4] = ["Lisboa", "Porto", "Faro", "Braga"];

fn create_attributes(id: usize) -> ClassifyingAttributes {
    ClassifyingAttributes {
        nationality: Some(if id % 2 == 0 { Nationality::Brasileira } else { Nationality::Portuguesa }),
        hair_color: Some(if id % 3 == 0 { HairColor::Loira } else { HairColor::Morena }),
        services: vec![Service::Acompanhamento, Service::Webcam],
        age: Some(18 + (id % 30) as u8),
        price: Some(50.0 + (id % 12) as f64 * 50.0),
        city: Some(CITIES[id % CITIES.len()].to_string()),
        height_cm: Some(155 + (id % 25) as u16),
        weight_kg: Some(48 + (id % 30) as u16),
        is_verified: id % 3 == 0,
        is_active: true,
    }
}

fn create_listing(id: usize) -> Listing {
    let mut listing = Listing::new(
        NewListing {
            name: format!("Listing {}", id),
            description: Some("Atendimento discreto no centro".to_string()),
            images: vec![],
            attributes: create_attributes(id),
            is_online: id % 4 != 0,
            rating: Some((id % 50) as f64 / 10.0),
        },
        Utc::now(),
    );
    listing.created_at = listing.created_at - Duration::minutes(id as i64);
    listing
}

fn bench_derive_tags(c: &mut Criterion) {
    let attributes = create_attributes(0);

    c.bench_function("derive_tags_full_profile", |b| {
        b.iter(|| derive_tags(black_box(&attributes)));
    });
}

fn bench_facet_query(c: &mut Criterion) {
    let engine = FacetEngine::default();
    let request = FilterRequest {
        city: Some("Lisboa".to_string()),
        tags: vec!["Loira".to_string()],
        min_price: Some(100.0),
        max_price: Some(400.0),
        ..Default::default()
    };

    let mut group = c.benchmark_group("facet_query");

    for listing_count in [100, 1000, 10000].iter() {
        let listings: Vec<Listing> = (0..*listing_count).map(create_listing).collect();

        group.bench_with_input(
            BenchmarkId::new("query", listing_count),
            listing_count,
            |b, _| {
                b.iter(|| engine.query(black_box(listings.clone()), black_box(&request)));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_derive_tags, bench_facet_query);
criterion_main!(benches);
