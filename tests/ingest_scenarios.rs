mod common;

use common::{harness, Call};
use house_evaluator::orchestrator::{import_listings, parse_listing_inputs};

const SCRAPED: &str = r#"[
    {"address": "456 Oak Ave", "city": "Portland", "price": "$425,000",
     "image_urls": ["https://img/1.jpg"], "features": {"bedrooms": 3, "bathrooms": 2.0}},
    {"address": "456 oak avenue", "city": "Portland", "price": 430000},
    {"address": "", "city": "Nowhere"},
    {"address": "12 Birch Street", "description": "Sunny bungalow"}
]"#;

#[tokio::test]
async fn test_import_skips_duplicates_and_blank_addresses() {
    let h = harness();
    let inputs = parse_listing_inputs(SCRAPED).unwrap();

    let summary = import_listings(&h.store, inputs, None).await.unwrap();

    assert_eq!(summary.imported, 2);
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.imported_ids.len(), 2);

    let oak = h.store.find_by_address("456 OAK AVE.").await.unwrap().unwrap();
    assert_eq!(oak.price, Some(425_000));
    assert_eq!(oak.city, "Portland");
    assert_eq!(oak.image_urls.len(), 1);
    assert_eq!(oak.features.bedrooms, Some(3));
    assert!(oak.vision_analysis.is_none());
    assert!(!oak.is_scored());
}

#[tokio::test]
async fn test_reimport_adds_nothing() {
    let h = harness();
    import_listings(&h.store, parse_listing_inputs(SCRAPED).unwrap(), None)
        .await
        .unwrap();

    let again = import_listings(&h.store, parse_listing_inputs(SCRAPED).unwrap(), None)
        .await
        .unwrap();

    assert_eq!(again.imported, 0);
    assert_eq!(again.skipped, 4);
    assert_eq!(h.store.list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_import_limit() {
    let h = harness();

    let summary = import_listings(&h.store, parse_listing_inputs(SCRAPED).unwrap(), Some(1))
        .await
        .unwrap();

    assert_eq!(summary.imported, 1);
    assert_eq!(summary.skipped, 0);
    assert_eq!(h.store.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_single_object_input() {
    let inputs = parse_listing_inputs(r#"{"address": "7 Cedar Ct", "price": null}"#).unwrap();
    assert_eq!(inputs.len(), 1);
    assert_eq!(inputs[0].price, None);

    assert!(parse_listing_inputs("\"just a string\"").is_err());
}

#[tokio::test]
async fn test_imported_listings_are_picked_up_by_batch() {
    let h = harness();
    let summary = import_listings(&h.store, parse_listing_inputs(SCRAPED).unwrap(), None)
        .await
        .unwrap();

    let report = h.pipeline.run_batch(None).await.unwrap();

    assert_eq!(report.total(), 2);
    assert_eq!(report.succeeded(), 2);
    for id in &summary.imported_ids {
        assert_eq!(report.as_map().get(id), Some(&true));
    }
    // One listing has images, the other gets the placeholder.
    assert_eq!(h.provider.count(Call::Vision).await, 1);
}

#[tokio::test]
async fn test_addresses_with_the_same_slug_get_distinct_ids() {
    let h = harness();
    let inputs = parse_listing_inputs(
        r#"[
            {"address": "12-B Oak St"},
            {"address": "12B Oak St"},
            {"address": "1234 Northwest Extraordinarily Long Boulevard Name Unit 101"},
            {"address": "1234 Northwest Extraordinarily Long Boulevard Name Unit 102"}
        ]"#,
    )
    .unwrap();

    let summary = import_listings(&h.store, inputs, None).await.unwrap();

    assert_eq!(summary.imported, 4);
    let stored = h.store.list().await.unwrap();
    assert_eq!(stored.len(), summary.imported);

    let mut ids = summary.imported_ids.clone();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 4);
    for id in &summary.imported_ids {
        assert!(h.store.load(id).await.unwrap().is_some());
    }
    assert!(h.store.find_by_address("12-B Oak St").await.unwrap().is_some());
    assert!(h.store.find_by_address("12B Oak St").await.unwrap().is_some());
}
