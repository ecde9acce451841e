//! Integration tests for reading types and annotations from the example schema.

use std::path::Path;

use xmlconf::schema::types::TypeKind;
use xmlconf::schema::DeclKind;
use xmlconf::{SchemaIntrospector, XmlConfError};

fn schema() -> SchemaIntrospector {
    SchemaIntrospector::load(Path::new("example/topology.xsd")).unwrap()
}

#[test]
fn numeric_builtin_bounds() {
    let delay = schema().get_type("delay").unwrap();
    assert_eq!(delay.kind, TypeKind::Numeric);
    assert_eq!(delay.min, Some(1.0));
    assert_eq!(delay.max, None);
    assert_eq!(delay.step, Some(1.0));
}

#[test]
fn enumerations_from_named_types() {
    let encap = schema().get_type("encapsulation").unwrap();
    assert_eq!(encap.kind, TypeKind::Enum);
    assert_eq!(encap.enum_values, ["GSE", "RLE", "AAL5"]);

    let carrier_type = schema().get_attribute_type("type", "carrier").unwrap();
    assert_eq!(carrier_type.enum_values, ["ctrl", "data"]);
}

#[test]
fn facets_from_the_included_schema() {
    let ratio = schema().get_type("roll_off").unwrap();
    assert_eq!(ratio.kind, TypeKind::Numeric);
    assert_eq!(ratio.min, Some(0.0));
    assert_eq!(ratio.max, Some(1.0));
    let step = ratio.step.unwrap();
    assert!((step - 0.01).abs() < 1e-12);
}

#[test]
fn file_types() {
    let schema = schema();
    assert_eq!(schema.get_type("plan").unwrap().kind, TypeKind::File);
    assert_eq!(
        schema.get_attribute_type("trace", "carrier").unwrap().kind,
        TypeKind::File
    );
    assert_eq!(
        schema.get_file_elements(DeclKind::Element),
        ["modcod_def", "plan"]
    );
    assert_eq!(schema.get_file_elements(DeclKind::Attribute), ["trace"]);
    assert_eq!(
        schema.get_file_source("trace", Some("carrier")).as_deref(),
        Some("trace.txt")
    );
}

#[test]
fn documentation_and_units() {
    let schema = schema();
    assert_eq!(
        schema.get_documentation("global", None).as_deref(),
        Some("Link wide parameters")
    );
    assert_eq!(schema.get_unit("delay", None).as_deref(), Some("ms"));
    assert_eq!(schema.get_unit("bandwidth", None).as_deref(), Some("MHz"));
    assert_eq!(schema.get_unit("encapsulation", None), None);
}

#[test]
fn display_hints() {
    let schema = schema();
    assert!(schema.do_hide("enabled"));
    assert!(schema.do_hide_adv("debug_level", false));
    assert!(!schema.do_hide_adv("debug_level", true));
    assert!(schema.do_conf("spot"));
    assert!(!schema.do_hide("delay"));
}

#[test]
fn table_cardinality() {
    let schema = schema();
    assert_eq!(schema.min_occurs("spot"), 0);
    assert_eq!(schema.max_occurs("spot"), xmlconf::schema::UNBOUNDED_OCCURS);
    assert_eq!(schema.min_occurs("carrier"), 1);
    assert_eq!(schema.max_occurs("delay"), 1);
}

#[test]
fn xpath_restrictions() {
    let restrictions = schema().get_xpath_restrictions("carriers", None).unwrap();
    assert_eq!(
        restrictions,
        [
            ("path".to_string(), "//carriers".to_string()),
            ("mode".to_string(), "table".to_string()),
        ]
    );
    assert_eq!(schema().get_xpath_restrictions("delay", None), None);
}

#[test]
fn missing_schema() {
    let err = SchemaIntrospector::load(Path::new("example/absent.xsd")).unwrap_err();
    assert!(matches!(err, XmlConfError::FileNotFound { .. }));
}
