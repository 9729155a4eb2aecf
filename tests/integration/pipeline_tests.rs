//! End-to-end tests of the legacy record transformation

use chrono::{TimeZone, Utc};
use record_migrator::{
    models::RECORD_SCHEMA,
    transform::{transform_value, FixedClock},
    TransformError,
};
use serde_json::{json, Value};

fn clock() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2016, 9, 12, 8, 45, 0).unwrap())
}

fn legacy_record() -> Value {
    json!({
        "recid": 12345,
        "title": "Higgs boson measurements",
        "upload_type": {"type": "publication", "subtype": "article"},
        "authors": [
            {"name": "Doe, Jane", "affiliation": ["CERN", "University of Geneva"]},
            {"name": "Roe, Richard", "affiliation": "EPFL"}
        ],
        "imprint": {"publisher": "CERN", "place": "Geneva", "year": "2015"},
        "owner": {"id": "5", "email": "x@y.com", "username": "", "deposition_id": 99},
        "conference_url": "http://conf.example.org",
        "grants": [{"identifier": "123", "acronym": "FOO"}],
        "references": [{"raw_reference": "Smith 2010"}, {"raw_reference": ""}],
        "oai": {"oai": "oai:zenodo.org:12345", "indicator": ["openaire", "user-higgs"]},
        "communities": ["higgs", "physics", "higgs"],
        "provisional_communities": ["physics", "ecfa"],
        "fft": [{"url": "http://legacy"}],
        "restriction": {"email": ""},
        "creation_date": "2015-01-01",
        "files": [{"bucket": "0b3a4b0e-8f5e-4bd3-a1f1-7e5a1c6f0d11", "key": "paper.pdf"}]
    })
}

#[test]
fn test_full_legacy_record() {
    let out = transform_value(legacy_record(), &clock()).unwrap();

    assert_eq!(
        out,
        json!({
            "recid": 12345,
            "title": "Higgs boson measurements",
            "resource_type": {"type": "publication", "subtype": "article"},
            "creators": [
                {"name": "Doe, Jane", "affiliation": "CERN"},
                {"name": "Roe, Richard", "affiliation": "EPFL"}
            ],
            "part_of": {"publisher": "CERN", "year": "2015"},
            "owners": [5],
            "_internal": {
                "state": "published",
                "source": {
                    "legacy_deposit_id": 99,
                    "agents": [{"role": "uploader", "email": "x@y.com", "user_id": "5"}]
                }
            },
            "meetings": {"url": "http://conf.example.org"},
            "grants": [{"$ref": "http://dx.zenodo.org/grants/10.13039/501100000780::123"}],
            "references": [{"raw_reference": "Smith 2010"}],
            "_oai": {
                "id": "oai:zenodo.org:12345",
                "sets": ["openaire", "user-higgs"],
                "updated": "2016-09-12T08:45:00Z"
            },
            "communities": ["higgs", "physics"],
            "provisional_communities": ["ecfa"],
            "description": "",
            "files": [{"bucket": "0b3a4b0e-8f5e-4bd3-a1f1-7e5a1c6f0d11", "key": "paper.pdf"}],
            "$schema": RECORD_SCHEMA
        })
    );
}

#[test]
fn test_transform_is_idempotent() {
    let once = transform_value(legacy_record(), &clock()).unwrap();
    let later = FixedClock(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap());
    let twice = transform_value(once.clone(), &later).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_resource_type_replaces_upload_type() {
    for upload_type in [
        json!("software"),
        json!({"type": "image", "subtype": "figure"}),
        json!(null),
    ] {
        let out = transform_value(
            json!({"upload_type": upload_type.clone(), "authors": []}),
            &clock(),
        )
        .unwrap();
        assert_eq!(out.get("resource_type"), Some(&upload_type));
        assert!(out.get("upload_type").is_none());
    }
}

#[test]
fn test_missing_upload_type_fails() {
    let mut legacy = legacy_record();
    legacy.as_object_mut().unwrap().remove("upload_type");
    assert_eq!(
        transform_value(legacy, &clock()).unwrap_err(),
        TransformError::MissingField("upload_type")
    );
}

#[test]
fn test_provisional_fully_confirmed_is_removed() {
    let out = transform_value(
        json!({
            "upload_type": "dataset",
            "authors": [],
            "communities": ["a"],
            "provisional_communities": ["a"]
        }),
        &clock(),
    )
    .unwrap();
    assert!(out.get("provisional_communities").is_none());
    assert_eq!(out["communities"], json!(["a"]));
}
