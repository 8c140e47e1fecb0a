// Unit tests for Listing Facets

use chrono::{Duration, Utc};
use listing_facets::core::{derive_tags, matches_price, matches_request, FacetEngine, DEFAULT_SEARCHABLE_FIELDS};
use listing_facets::models::{
    ClassifyingAttributes, FilterRequest, HairColor, Listing, Nationality, NewListing, PageDefaults,
    SearchParams, Service,
};

fn scenario_attributes() -> ClassifyingAttributes {
    ClassifyingAttributes {
        nationality: Some(Nationality::Brasileira),
        hair_color: Some(HairColor::Loira),
        services: vec![Service::Webcam],
        age: Some(22),
        price: Some(250.0),
        city: Some("Lisboa".to_string()),
        height_cm: Some(170),
        weight_kg: Some(55),
        is_verified: true,
        is_active: true,
    }
}

fn create_test_listing(name: &str, attributes: ClassifyingAttributes, is_online: bool, rating: f64) -> Listing {
    Listing::new(
        NewListing {
            name: name.to_string(),
            description: None,
            images: vec![],
            attributes,
            is_online,
            rating: Some(rating),
        },
        Utc::now(),
    )
}

#[test]
fn test_full_profile_derives_every_rule() {
    let tags = derive_tags(&scenario_attributes());

    let expected = [
        "Brasileira",
        "Brasileira em Portugal",
        "Brasileiras",
        "Brasileiras em Portugal",
        "Loira",
        "Loira em Portugal",
        "Loiras",
        "Loiras em Portugal",
        "Webcam",
        "Webcam em Portugal",
        "Videochamada",
        "Cam Girl",
        "Jovem",
        "Jovens",
        "Universitária",
        "Universitárias",
        "VIP",
        "VIP em Portugal",
        "Acompanhante em Lisboa",
        "Lisboa",
        "Acompanhantes em Lisboa",
        "Normal",
        "Disponível",
        "Disponível Agora",
        "Verificada",
        "Perfil Verificado",
    ];

    for tag in expected {
        assert!(tags.contains(tag), "missing tag {}", tag);
    }
    assert_eq!(tags.len(), expected.len());

    // Price 250 sits between tiers
    assert!(!tags.contains("Elite"));
    assert!(!tags.contains("Econômica"));
}

#[test]
fn test_inactive_unverified_profile_loses_status_tags() {
    let attributes = ClassifyingAttributes {
        is_active: false,
        is_verified: false,
        ..scenario_attributes()
    };
    let tags = derive_tags(&attributes);

    assert!(!tags.contains("Disponível"));
    assert!(!tags.contains("Perfil Verificado"));
    assert_eq!(tags.len(), 22);
}

#[test]
fn test_single_price_bound_applies_no_filter() {
    let cheap = create_test_listing(
        "Ana",
        ClassifyingAttributes { price: Some(50.0), is_active: true, ..Default::default() },
        true,
        4.0,
    );

    assert!(matches_price(&cheap, Some(100.0), None));
    assert!(matches_price(&cheap, None, Some(10.0)));
    assert!(!matches_price(&cheap, Some(100.0), Some(300.0)));

    let request = FilterRequest { min_price: Some(100.0), ..Default::default() };
    assert!(matches_request(&cheap, &request, DEFAULT_SEARCHABLE_FIELDS));
}

#[test]
fn test_min_price_only_query_keeps_everything() {
    let engine = FacetEngine::default();
    let listings: Vec<Listing> = [50.0, 150.0, 600.0]
        .into_iter()
        .enumerate()
        .map(|(i, price)| {
            create_test_listing(
                &format!("Listing {}", i),
                ClassifyingAttributes { price: Some(price), is_active: true, ..Default::default() },
                false,
                3.0,
            )
        })
        .collect();

    let params = SearchParams { min_price: Some("100".to_string()), ..Default::default() };
    let request = params.into_filter_request(PageDefaults::default()).unwrap();
    let result = engine.query(listings, &request).unwrap();

    assert_eq!(result.total, 3);
}

#[test]
fn test_tag_facet_requires_all_tags() {
    let engine = FacetEngine::default();
    let blonde_vip = create_test_listing("Clara", scenario_attributes(), true, 4.0);
    let blonde_budget = create_test_listing(
        "Bia",
        ClassifyingAttributes { price: Some(80.0), ..scenario_attributes() },
        true,
        4.0,
    );
    let brunette_vip = create_test_listing(
        "Rita",
        ClassifyingAttributes { hair_color: Some(HairColor::Morena), ..scenario_attributes() },
        true,
        4.0,
    );

    let request = FilterRequest {
        tags: vec!["Loira".to_string(), "VIP".to_string()],
        ..Default::default()
    };
    let result = engine
        .query(vec![blonde_vip, blonde_budget, brunette_vip], &request)
        .unwrap();

    assert_eq!(result.total, 1);
    assert_eq!(result.items[0].name, "Clara");
}

#[test]
fn test_sort_order_online_verified_rating_recency() {
    let engine = FacetEngine::default();
    let unverified = ClassifyingAttributes { is_verified: false, ..scenario_attributes() };

    let offline_top_rated = create_test_listing("offline", scenario_attributes(), false, 5.0);
    let online_unverified = create_test_listing("online-unverified", unverified, true, 5.0);
    let online_low = create_test_listing("online-low", scenario_attributes(), true, 3.0);
    let mut online_old = create_test_listing("online-old", scenario_attributes(), true, 4.5);
    online_old.created_at = Utc::now() - Duration::days(30);
    let online_new = create_test_listing("online-new", scenario_attributes(), true, 4.5);

    let result = engine
        .query(
            vec![offline_top_rated, online_unverified, online_low, online_old, online_new],
            &FilterRequest::default(),
        )
        .unwrap();

    let names: Vec<&str> = result.items.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["online-new", "online-old", "online-low", "online-unverified", "offline"]
    );
}

#[test]
fn test_search_params_reject_malformed_numbers() {
    let params = SearchParams {
        min_age: Some("twenty".to_string()),
        max_age: Some("30".to_string()),
        ..Default::default()
    };

    assert!(params.into_filter_request(PageDefaults::default()).is_err());
}
