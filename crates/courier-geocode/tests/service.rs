//! Integration tests for `GeocodingService` using wiremock HTTP mocks.

use std::time::Duration;

use courier_geocode::{
    BatchOptions, Confidence, GeocodeError, GeocodeOptions, GeocodingConfig, GeocodingService,
    HealthStatus, LocationType, ReverseGeocodeOptions, ValidationOptions,
};
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config() -> GeocodingConfig {
    GeocodingConfig {
        api_key: Some("test-key".to_owned()),
        max_retries: 0,
        batch_delay: Duration::from_millis(1),
        ..GeocodingConfig::default()
    }
}

fn test_service(base_url: &str) -> GeocodingService {
    GeocodingService::with_base_url(test_config(), base_url)
        .expect("service construction should not fail")
}

fn rooftop_body(formatted_address: &str, lat: f64, lng: f64) -> serde_json::Value {
    serde_json::json!({
        "status": "OK",
        "results": [{
            "formatted_address": formatted_address,
            "geometry": {
                "location": { "lat": lat, "lng": lng },
                "location_type": "ROOFTOP",
                "viewport": {
                    "northeast": { "lat": lat + 0.001, "lng": lng + 0.001 },
                    "southwest": { "lat": lat - 0.001, "lng": lng - 0.001 }
                }
            },
            "place_id": "ChIJtest",
            "types": ["street_address"],
            "address_components": [
                { "long_name": "1600", "short_name": "1600", "types": ["street_number"] },
                { "long_name": "Amphitheatre Parkway", "short_name": "Amphitheatre Pkwy", "types": ["route"] },
                { "long_name": "Mountain View", "short_name": "Mountain View", "types": ["locality", "political"] }
            ]
        }]
    })
}

#[tokio::test]
async fn geocode_normalizes_first_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("key", "test-key"))
        .and(query_param("address", "1600 Amphitheatre Parkway, Mountain View, CA"))
        .and(query_param("language", "en"))
        .and(query_param("region", "US"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rooftop_body(
            "1600 Amphitheatre Pkwy, Mountain View, CA 94043, USA",
            37.422_476_4,
            -122.084_249_9,
        )))
        .mount(&server)
        .await;

    let service = test_service(&server.uri());
    let result = service
        .geocode(
            "1600 Amphitheatre Parkway, Mountain View, CA",
            &GeocodeOptions::default(),
        )
        .await
        .expect("geocode should succeed")
        .expect("result should be present");

    assert_eq!(
        result.formatted_address,
        "1600 Amphitheatre Pkwy, Mountain View, CA 94043, USA"
    );
    assert!((result.geometry.location.lat - 37.422_476_4).abs() < 1e-9);
    assert_eq!(result.geometry.location_type, LocationType::Rooftop);
    assert_eq!(result.place_id, "ChIJtest");
    assert!(!result.partial_match);
    assert!(result.geometry.viewport.is_some());
}

#[tokio::test]
async fn zero_results_maps_to_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ZERO_RESULTS",
            "results": []
        })))
        .mount(&server)
        .await;

    let service = test_service(&server.uri());
    let result = service
        .geocode("nowhere at all", &GeocodeOptions::default())
        .await
        .expect("no-match is not an error");
    assert!(result.is_none());
}

#[tokio::test]
async fn api_error_status_surfaces_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid."
        })))
        .mount(&server)
        .await;

    let service = test_service(&server.uri());
    let err = service
        .geocode("1 Main St", &GeocodeOptions::default())
        .await
        .expect_err("REQUEST_DENIED must be an error");
    let msg = err.to_string();
    assert!(
        msg.contains("The provided API key is invalid."),
        "expected upstream message, got: {msg}"
    );
}

#[tokio::test]
async fn identical_requests_within_ttl_hit_provider_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("address", "1 Cache Ln"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(rooftop_body("1 Cache Ln", 37.0, -122.0)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let service = test_service(&server.uri());
    let first = service
        .geocode("1 Cache Ln", &GeocodeOptions::default())
        .await
        .expect("first call")
        .expect("present");
    let second = service
        .geocode("1 Cache Ln", &GeocodeOptions::default())
        .await
        .expect("second call")
        .expect("present");
    assert_eq!(first, second);

    let stats = service.stats().await;
    assert_eq!(stats.cache_size, 1);
    // One provider call means exactly one rate-limit slot consumed.
    assert_eq!(
        stats.remaining_requests,
        stats.rate_limit_per_minute - 1
    );
}

#[tokio::test]
async fn expired_entry_triggers_fresh_provider_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("address", "2 Stale Ave"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(rooftop_body("2 Stale Ave", 37.0, -122.0)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let config = GeocodingConfig {
        cache_ttl: Duration::ZERO,
        ..test_config()
    };
    let service =
        GeocodingService::with_base_url(config, &server.uri()).expect("service");

    for _ in 0..2 {
        service
            .geocode("2 Stale Ave", &GeocodeOptions::default())
            .await
            .expect("call should succeed");
    }
    assert_eq!(service.stats().await.cache_size, 1, "stale entry was replaced");
}

#[tokio::test]
async fn rate_limit_rejects_before_any_network_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(rooftop_body("3 Busy Blvd", 37.0, -122.0)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = GeocodingConfig {
        rate_limit_per_minute: 1,
        ..test_config()
    };
    let service =
        GeocodingService::with_base_url(config, &server.uri()).expect("service");

    service
        .geocode("3 Busy Blvd", &GeocodeOptions::default())
        .await
        .expect("first call within budget");

    // Different address: cache miss, so the limiter is consulted.
    let err = service
        .geocode("4 Other St", &GeocodeOptions::default())
        .await
        .expect_err("second uncached call must be rejected locally");
    assert!(
        matches!(err, GeocodeError::RateLimited { retry_after_secs } if retry_after_secs >= 1),
        "got: {err}"
    );
}

#[tokio::test]
async fn cached_hit_bypasses_exhausted_limiter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(rooftop_body("5 Hot Path", 37.0, -122.0)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = GeocodingConfig {
        rate_limit_per_minute: 1,
        ..test_config()
    };
    let service =
        GeocodingService::with_base_url(config, &server.uri()).expect("service");

    service
        .geocode("5 Hot Path", &GeocodeOptions::default())
        .await
        .expect("first call within budget");
    // Budget is now zero, but the repeat request is served from cache.
    let cached = service
        .geocode("5 Hot Path", &GeocodeOptions::default())
        .await
        .expect("cache hit must not consult the limiter");
    assert!(cached.is_some());
}

#[tokio::test]
async fn reverse_geocode_passes_filters_and_caches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("latlng", "37.4224764,-122.0842499"))
        .and(query_param("result_type", "street_address|route"))
        .and(query_param("location_type", "ROOFTOP"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rooftop_body(
            "1600 Amphitheatre Pkwy, Mountain View, CA 94043, USA",
            37.422_476_4,
            -122.084_249_9,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let service = test_service(&server.uri());
    let options = ReverseGeocodeOptions {
        result_types: vec!["street_address".to_owned(), "route".to_owned()],
        location_types: vec!["ROOFTOP".to_owned()],
        ..ReverseGeocodeOptions::default()
    };

    for _ in 0..2 {
        let result = service
            .reverse_geocode(37.422_476_4, -122.084_249_9, &options)
            .await
            .expect("reverse geocode should succeed")
            .expect("result should be present");
        assert!(result.formatted_address.contains("Amphitheatre"));
    }
}

#[tokio::test]
async fn validate_address_rooftop_is_high_confidence_deliverable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rooftop_body(
            "1600 Amphitheatre Pkwy, Mountain View, CA 94043, USA",
            37.422_476_4,
            -122.084_249_9,
        )))
        .mount(&server)
        .await;

    let service = test_service(&server.uri());
    let validation = service
        .validate_address(
            "1600 Amphitheatre Parkway, Mountain View, CA",
            &ValidationOptions {
                check_deliverability: true,
                ..ValidationOptions::default()
            },
        )
        .await
        .expect("validation should succeed");

    assert!(validation.is_valid);
    assert!(validation.is_deliverable);
    assert_eq!(validation.confidence, Confidence::High);
    assert!(validation.issues.is_empty());
}

#[tokio::test]
async fn validate_address_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ZERO_RESULTS"
        })))
        .mount(&server)
        .await;

    let service = test_service(&server.uri());
    let validation = service
        .validate_address("garbage input", &ValidationOptions::default())
        .await
        .expect("no-match is not an error");

    assert!(!validation.is_valid);
    assert!(!validation.is_deliverable);
    assert_eq!(validation.confidence, Confidence::Low);
    assert_eq!(validation.issues, vec!["Address not found".to_owned()]);
}

#[tokio::test]
async fn validate_address_rejects_po_box() {
    let server = MockServer::start().await;
    let body = serde_json::json!({
        "status": "OK",
        "results": [{
            "formatted_address": "PO Box 123, Mountain View, CA 94042, USA",
            "geometry": {
                "location": { "lat": 37.39, "lng": -122.08 },
                "location_type": "GEOMETRIC_CENTER"
            },
            "place_id": "ChIJpobox",
            "types": ["post_box"],
            "address_components": []
        }]
    });
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let service = test_service(&server.uri());
    let validation = service
        .validate_address("PO Box 123, Mountain View, CA", &ValidationOptions::default())
        .await
        .expect("validation should succeed");

    assert!(validation.is_valid);
    assert!(!validation.is_deliverable, "PO Boxes are not deliverable");
    assert!(
        validation.issues.iter().any(|i| i.contains("PO Box")),
        "issues must name the PO Box problem: {:?}",
        validation.issues
    );
}

#[tokio::test]
async fn validate_address_approximate_downgrades_confidence_monotonically() {
    let server = MockServer::start().await;
    let body = serde_json::json!({
        "status": "OK",
        "results": [{
            "formatted_address": "Mountain View, CA, USA",
            "geometry": {
                "location": { "lat": 37.39, "lng": -122.08 },
                "location_type": "APPROXIMATE"
            },
            "place_id": "ChIJcity",
            "types": ["locality"],
            "address_components": [],
            "partial_match": true
        }]
    });
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let service = test_service(&server.uri());
    let validation = service
        .validate_address("Mountain View", &ValidationOptions::default())
        .await
        .expect("validation should succeed");

    // Partial match downgrades to medium, approximate to low; the later
    // partial-match finding must never upgrade it back.
    assert_eq!(validation.confidence, Confidence::Low);
    assert!(!validation.is_deliverable);
    assert_eq!(validation.issues.len(), 2);
}

#[tokio::test]
async fn validate_address_strict_mode_rejects_partial_match() {
    let server = MockServer::start().await;
    let body = serde_json::json!({
        "status": "OK",
        "results": [{
            "formatted_address": "1600 Amphitheater Pkwy, Mountain View, CA 94043, USA",
            "geometry": {
                "location": { "lat": 37.422_476_4, "lng": -122.084_249_9 },
                "location_type": "ROOFTOP"
            },
            "place_id": "ChIJpartial",
            "types": ["street_address"],
            "address_components": [
                { "long_name": "1600", "short_name": "1600", "types": ["street_number"] }
            ],
            "partial_match": true
        }]
    });
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let service = test_service(&server.uri());
    let validation = service
        .validate_address(
            "1600 Amphitheater Parkway",
            &ValidationOptions {
                strict_validation: true,
                ..ValidationOptions::default()
            },
        )
        .await
        .expect("validation should succeed");

    assert!(validation.is_valid);
    assert!(
        !validation.is_deliverable,
        "strict mode must reject partial matches"
    );
    assert_eq!(validation.confidence, Confidence::Medium);
    assert!(
        validation.issues.iter().any(|i| i.contains("partial match")),
        "issues must name the partial match: {:?}",
        validation.issues
    );
}

#[tokio::test]
async fn validate_address_allow_approximate_keeps_deliverable() {
    let server = MockServer::start().await;
    let body = serde_json::json!({
        "status": "OK",
        "results": [{
            "formatted_address": "742 Evergreen Terrace, Springfield, USA",
            "geometry": {
                "location": { "lat": 39.8, "lng": -89.6 },
                "location_type": "APPROXIMATE"
            },
            "place_id": "ChIJapprox",
            "types": ["street_address"],
            "address_components": []
        }]
    });
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let service = test_service(&server.uri());
    let validation = service
        .validate_address(
            "742 Evergreen Terrace",
            &ValidationOptions {
                allow_approximate_matches: true,
                ..ValidationOptions::default()
            },
        )
        .await
        .expect("validation should succeed");

    assert!(validation.is_deliverable);
    assert_eq!(validation.confidence, Confidence::Low);
}

#[tokio::test]
async fn validate_address_missing_required_components() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rooftop_body(
            "1600 Amphitheatre Pkwy, Mountain View, CA 94043, USA",
            37.422_476_4,
            -122.084_249_9,
        )))
        .mount(&server)
        .await;

    let service = test_service(&server.uri());
    let validation = service
        .validate_address(
            "1600 Amphitheatre Parkway",
            &ValidationOptions {
                required_components: vec!["postal_code".to_owned(), "locality".to_owned()],
                ..ValidationOptions::default()
            },
        )
        .await
        .expect("validation should succeed");

    // locality is present in the fixture; postal_code is not.
    assert!(!validation.is_deliverable);
    assert!(
        validation
            .issues
            .iter()
            .any(|i| i.contains("postal_code") && !i.contains("locality")),
        "issue must name only the missing component: {:?}",
        validation.issues
    );
}

#[tokio::test]
async fn batch_geocode_accounts_for_every_address() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("address", "10 Good St"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(rooftop_body("10 Good St", 37.0, -122.0)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("address", "11 Missing Rd"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ZERO_RESULTS"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("address", "12 Broken Way"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "UNKNOWN_ERROR",
            "error_message": "backend error"
        })))
        .mount(&server)
        .await;

    let service = test_service(&server.uri());
    let addresses = vec![
        "10 Good St".to_owned(),
        "11 Missing Rd".to_owned(),
        "12 Broken Way".to_owned(),
    ];
    let batch = service
        .batch_geocode(&addresses, &BatchOptions::default())
        .await;

    assert_eq!(batch.summary.total, 3);
    assert_eq!(batch.summary.successful, 1);
    assert_eq!(batch.summary.failed, 2);
    assert_eq!(
        batch.summary.total,
        batch.summary.successful + batch.summary.failed
    );
    assert_eq!(batch.results.len(), 3);
    assert!(batch.results[0].success);
    assert!(!batch.results[1].success);
    assert_eq!(
        batch.results[1].error.as_deref(),
        Some("address not found")
    );
    assert!(!batch.results[2].success);
    assert!(batch.results[2]
        .error
        .as_deref()
        .is_some_and(|e| e.contains("backend error")));
}

#[tokio::test]
async fn batch_geocode_attaches_validation_when_requested() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("address", "20 Valid Ct"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(rooftop_body("20 Valid Ct", 37.0, -122.0)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let service = test_service(&server.uri());
    let batch = service
        .batch_geocode(
            &["20 Valid Ct".to_owned()],
            &BatchOptions {
                validate_delivery: true,
            },
        )
        .await;

    let item = &batch.results[0];
    assert!(item.success);
    let validation = item.validation.as_ref().expect("validation attached");
    assert!(validation.is_deliverable);
}

#[tokio::test]
async fn health_check_healthy_when_probe_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rooftop_body(
            "1600 Amphitheatre Pkwy, Mountain View, CA 94043, USA",
            37.422_476_4,
            -122.084_249_9,
        )))
        .mount(&server)
        .await;

    let service = test_service(&server.uri());
    let report = service.health_check().await;
    assert_eq!(report.status, HealthStatus::Healthy);
    assert!(report.api_key_configured);
    assert!(report.last_error.is_none());
}

#[tokio::test]
async fn health_check_degraded_when_probe_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let service = test_service(&server.uri());
    let report = service.health_check().await;
    assert_eq!(report.status, HealthStatus::Degraded);
    assert!(report.api_key_configured);
    assert!(report.last_error.is_some());
}

#[tokio::test]
async fn clear_cache_forces_refetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("address", "30 Reset Pl"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(rooftop_body("30 Reset Pl", 37.0, -122.0)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let service = test_service(&server.uri());
    service
        .geocode("30 Reset Pl", &GeocodeOptions::default())
        .await
        .expect("first call");
    service.clear_cache().await;
    assert_eq!(service.stats().await.cache_size, 0);
    service
        .geocode("30 Reset Pl", &GeocodeOptions::default())
        .await
        .expect("refetch after clear");
}
