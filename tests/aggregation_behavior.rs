//! Fan-out behavior across providers: failure isolation, deterministic
//! ordering, and provider-set restriction.

use biofed_core::{
    AggregateRecords, MapService, NameService, OccurrenceService, ProviderId, RawParams,
    ValidationError,
};
use biofed_tests::{scripted_broker, ScriptedHttpClient};

const DATASET_KEY: &str = "e635240a-3cb1-4d26-ab87-57d8c7afdfdb";

#[tokio::test]
async fn one_broken_name_provider_does_not_sink_the_fanout() {
    let client = ScriptedHttpClient::new()
        .on(
            "species/match",
            r#"{"usageKey": 2704179, "scientificName": "Poa annua L.",
                "canonicalName": "Poa annua", "status": "ACCEPTED",
                "matchType": "EXACT", "kingdom": "Plantae"}"#,
        )
        .fail_on("ipni.org", "connection refused")
        .fail_on("services.itis.gov", "connection refused")
        .fail_on("marinespecies.org", "connection refused");
    let (_, executor, registry) = scripted_broker(client);

    let raw = RawParams::new()
        .set("namestr", "Poa annua")
        .set("gbif_parse", "false");
    let response = NameService::new(registry, executor)
        .run(&raw)
        .await
        .expect("valid request");

    let AggregateRecords::Providers(results) = &response.records else {
        panic!("name service must nest provider envelopes");
    };
    let codes = results.iter().map(|r| r.provider.code).collect::<Vec<_>>();
    assert_eq!(
        codes,
        vec![
            ProviderId::Gbif,
            ProviderId::Ipni,
            ProviderId::Itis,
            ProviderId::Worms,
        ]
    );

    let gbif = &results[0];
    assert_eq!(gbif.count, 1);
    assert!(!gbif.errors.has_errors());
    assert_eq!(gbif.provider.status_code, Some(200));

    for broken in &results[1..] {
        assert_eq!(broken.count, 0);
        assert!(broken.errors.has_errors());
        assert!(broken.records.is_empty());
    }
}

#[tokio::test]
async fn response_is_stamped_with_the_broker_identity() {
    let (_, executor, registry) = scripted_broker(ScriptedHttpClient::new());

    let raw = RawParams::new()
        .set("namestr", "Poa annua")
        .set("gbif_parse", "false");
    let response = NameService::new(registry, executor)
        .run(&raw)
        .await
        .expect("valid request");

    assert_eq!(response.provider.code, ProviderId::Broker);
    let query_url = response.provider.query_url.first().expect("self url");
    assert!(query_url.starts_with("https://broker.spcoco.org/api/v1/name?"));
    assert!(query_url.contains("namestr=Poa annua"));
}

#[tokio::test]
async fn dataset_key_queries_only_gbif() {
    let client = ScriptedHttpClient::new().on(
        "occurrence/search",
        r#"{"count": 2, "results": [{"gbifID": 101}, {"gbifID": 102}]}"#,
    );
    let (client, _, registry) = scripted_broker(client);

    let raw = RawParams::new().set("gbif_dataset_key", DATASET_KEY);
    let response = OccurrenceService::new(registry)
        .run(&raw)
        .await
        .expect("valid request");

    let AggregateRecords::Providers(results) = &response.records else {
        panic!("occ service must nest provider envelopes");
    };
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].provider.code, ProviderId::Gbif);
    assert_eq!(results[0].count, 2);
    assert_eq!(results[0].records.len(), 2);

    let requested = client.requests();
    assert_eq!(requested.len(), 1);
    assert!(requested[0].contains("dataset_key="));
}

#[tokio::test]
async fn count_only_reports_totals_without_record_bodies() {
    let client = ScriptedHttpClient::new().on(
        "occurrence/search",
        r#"{"count": 2, "results": [{"gbifID": 101}, {"gbifID": 102}]}"#,
    );
    let (_, _, registry) = scripted_broker(client);

    let raw = RawParams::new()
        .set("occid", "test-occurrence-guid")
        .set("provider", "gbif")
        .set("count_only", "true");
    let response = OccurrenceService::new(registry)
        .run(&raw)
        .await
        .expect("valid request");

    let AggregateRecords::Providers(results) = &response.records else {
        panic!("occ service must nest provider envelopes");
    };
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].count, 2);
    assert!(results[0].records.is_empty());
}

#[tokio::test]
async fn specify_answers_first_in_occurrence_fanout() {
    let (_, _, registry) = scripted_broker(ScriptedHttpClient::new());

    let raw = RawParams::new().set("occid", "test-occurrence-guid");
    let response = OccurrenceService::new(registry)
        .run(&raw)
        .await
        .expect("valid request");

    let AggregateRecords::Providers(results) = &response.records else {
        panic!("occ service must nest provider envelopes");
    };
    let codes = results.iter().map(|r| r.provider.code).collect::<Vec<_>>();
    assert_eq!(
        codes,
        vec![
            ProviderId::Specify,
            ProviderId::Gbif,
            ProviderId::Idigbio,
            ProviderId::Morphosource,
        ]
    );
}

#[tokio::test]
async fn gbif_count_enriches_each_match_with_occurrence_totals() {
    let client = ScriptedHttpClient::new()
        .on(
            "species/match",
            r#"{"usageKey": 2704179, "scientificName": "Poa annua L.",
                "canonicalName": "Poa annua", "status": "ACCEPTED",
                "matchType": "EXACT"}"#,
        )
        .on("taxonKey=", r#"{"count": 42, "results": []}"#);
    let (_, executor, registry) = scripted_broker(client);

    let raw = RawParams::new()
        .set("namestr", "Poa annua")
        .set("provider", "gbif")
        .set("gbif_parse", "false")
        .set("gbif_count", "true");
    let response = NameService::new(registry, executor)
        .run(&raw)
        .await
        .expect("valid request");

    let AggregateRecords::Providers(results) = &response.records else {
        panic!("name service must nest provider envelopes");
    };
    let gbif = &results[0];
    assert_eq!(gbif.count, 1);
    assert!(!gbif.errors.has_errors());

    let record = &gbif.records[0];
    assert_eq!(record["s2n:gbif_occurrence_count"], 42);
    let occ_url = record["s2n:gbif_occurrence_url"]
        .as_str()
        .expect("occurrence url");
    assert!(occ_url.contains("occurrence/search?taxonKey=2704179"));

    // The match call plus one count call per matched record.
    assert_eq!(gbif.provider.query_url.len(), 2);
    assert!(gbif.provider.query_url[0].contains("species/match"));
    assert!(gbif.provider.query_url[1].contains("taxonKey=2704179"));
}

#[tokio::test]
async fn parser_falls_back_to_the_scientific_name_on_partial_parses() {
    let client = ScriptedHttpClient::new().on(
        "parser/name",
        r#"[{"parsed": true, "canonicalName": "? Poa annua",
             "scientificName": "Poa annua L."}]"#,
    );
    let (client, executor, registry) = scripted_broker(client);

    let raw = RawParams::new()
        .set("namestr", "Poa annua var. bogus")
        .set("provider", "gbif")
        .set("gbif_parse", "true");
    let response = NameService::new(registry, executor)
        .run(&raw)
        .await
        .expect("valid request");

    let requested = client.requests();
    assert_eq!(requested.len(), 2);
    assert!(requested[0].contains("parser/name?name=Poa%20annua%20var.%20bogus"));
    assert!(requested[1].contains("species/match?name=Poa%20annua%20L."));

    let parser_url = response.provider.query_url.last().expect("parser url");
    assert!(parser_url.contains("parser/name"));
}

#[tokio::test]
async fn accepted_map_names_resolve_through_the_gbif_backbone() {
    let client = ScriptedHttpClient::new().on(
        "species/match",
        r#"{"usageKey": 2704179, "scientificName": "Poa annua L.",
            "canonicalName": "Poa annua", "status": "ACCEPTED",
            "matchType": "EXACT"}"#,
    );
    let (client, executor, registry) = scripted_broker(client);

    let raw = RawParams::new()
        .set("namestr", "Poa annua")
        .set("is_accepted", "true")
        .set("gbif_parse", "false");
    MapService::new(registry, executor)
        .run(&raw)
        .await
        .expect("valid request");

    let requested = client.requests();
    assert!(requested
        .iter()
        .any(|url| url.contains("species/match")));
    assert!(requested
        .iter()
        .any(|url| url.contains("data.lifemapper.org")
            && url.contains("displayname=Poa%20annua%20L.")));
}

#[tokio::test]
async fn occurrence_request_without_identifier_is_rejected() {
    let (_, _, registry) = scripted_broker(ScriptedHttpClient::new());

    let err = OccurrenceService::new(registry)
        .run(&RawParams::new())
        .await
        .expect_err("must fail");
    assert!(matches!(
        err,
        ValidationError::MissingRequiredParam { name: "occid" }
    ));
}
