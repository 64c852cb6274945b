//! Serialization of trees and options (requires the `serde` feature)

#![cfg(feature = "serde")]

use oddb_compositions::{parse, Composition, ParseOptions};

#[test]
fn test_composition_json() {
    let composition = parse("Calcii carbonas 500 mg corresp. Calcium 200 mg").unwrap();
    let json = serde_json::to_value(&composition).unwrap();

    let member = &json["groups"][0]["members"][0];
    assert_eq!(member["name"], "Calcii carbonas");
    assert_eq!(member["kind"], "Active");
    assert_eq!(member["dose"]["unit"], "mg");
    assert_eq!(member["correspondence"]["name"], "Calcium");

    let back: Composition = serde_json::from_value(json).unwrap();
    assert_eq!(back, composition);
}

#[test]
fn test_options_defaults_fill_missing_fields() {
    let options: ParseOptions = serde_json::from_str(r#"{ "verbose": true }"#).unwrap();
    assert!(options.verbose);
    assert_eq!(options.max_nesting, ParseOptions::default().max_nesting);
    assert_eq!(options.max_steps, ParseOptions::default().max_steps);
}
