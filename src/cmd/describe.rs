//! `xmlconf describe`: what a schema says about an element or attribute.

use serde::Serialize;

use crate::cli::DescribeArgs;
use crate::error::XmlConfError;
use crate::schema::types::TypeDescriptor;
use crate::schema::{SchemaIntrospector, UiHints};

#[derive(Debug, Serialize)]
struct Description {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    value_type: Option<TypeDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    documentation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    hints: UiHints,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_occurs: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_occurs: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    xpath: Option<Vec<(String, String)>>,
}

fn describe(schema: &SchemaIntrospector, name: &str, parent: Option<&str>) -> Description {
    let value_type = match parent {
        Some(parent) => schema.get_attribute_type(name, parent),
        None => schema.get_type(name),
    };
    let is_element = parent.is_none();
    Description {
        name: name.to_string(),
        parent: parent.map(str::to_string),
        value_type,
        documentation: schema.get_documentation(name, parent),
        unit: schema.get_unit(name, parent),
        default: schema.get_default(name, parent),
        source: schema.get_file_source(name, parent),
        hints: schema.ui_hints(name),
        min_occurs: is_element.then(|| schema.min_occurs(name)),
        max_occurs: is_element.then(|| schema.max_occurs(name)),
        xpath: schema.get_xpath_restrictions(name, parent),
    }
}

pub fn execute(args: &DescribeArgs) -> Result<(), XmlConfError> {
    let schema = SchemaIntrospector::load(&args.schema)?;
    let description = describe(&schema, &args.name, args.parent.as_deref());

    if args.json {
        let json = serde_json::to_string_pretty(&description)
            .map_err(|e| XmlConfError::Io(std::io::Error::other(e.to_string())))?;
        println!("{json}");
        return Ok(());
    }

    match &description.parent {
        Some(parent) => println!("{}/@{}", parent, description.name),
        None => println!("{}", description.name),
    }
    if let Some(value_type) = &description.value_type {
        let mut line = format!("  type:     {}", value_type.kind.as_str());
        if let Some(min) = value_type.min {
            line.push_str(&format!(" min={min}"));
        }
        if let Some(max) = value_type.max {
            line.push_str(&format!(" max={max}"));
        }
        if let Some(step) = value_type.step {
            line.push_str(&format!(" step={step}"));
        }
        if !value_type.enum_values.is_empty() {
            line.push_str(&format!(" [{}]", value_type.enum_values.join(", ")));
        }
        println!("{line}");
    }
    let fields = [
        ("doc", &description.documentation),
        ("unit", &description.unit),
        ("default", &description.default),
        ("source", &description.source),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            println!("  {:<9} {value}", format!("{label}:"));
        }
    }
    if let (Some(min), Some(max)) = (description.min_occurs, description.max_occurs) {
        println!("  occurs:   {min}..{max}");
    }
    let hints = &description.hints;
    let flags: Vec<&str> = [
        (hints.hidden, "hidden"),
        (hints.hidden_unless_advanced, "advanced"),
        (hints.not_listable, "not-listable"),
        (hints.requires_explicit_confirmation, "confirm"),
    ]
    .into_iter()
    .filter_map(|(set, label)| set.then_some(label))
    .collect();
    if !flags.is_empty() {
        println!("  hints:    {}", flags.join(", "));
    }
    if let Some(xpath) = &description.xpath {
        let pairs: Vec<String> = xpath.iter().map(|(k, v)| format!("{k}={v}")).collect();
        println!("  xpath:    {}", pairs.join(" "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Document;

    const XSD: &str = r#"<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema">
  <xsd:element name="configuration"/>
  <xsd:element name="delay" type="xsd:positiveInteger">
    <xsd:annotation><xsd:documentation>Propagation delay<unit>ms</unit><adv>true</adv></xsd:documentation></xsd:annotation>
  </xsd:element>
</xsd:schema>"#;

    #[test]
    fn element_description_carries_occurs_and_hints() {
        let schema = SchemaIntrospector::from_documents(Document::parse(XSD).unwrap(), None);
        let d = describe(&schema, "delay", None);
        assert_eq!(d.unit.as_deref(), Some("ms"));
        assert!(d.hints.hidden_unless_advanced);
        assert_eq!(d.min_occurs, Some(0));
        assert_eq!(d.max_occurs, Some(1));
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["type"]["type"], "numeric");
        assert_eq!(json["type"]["min"], 1.0);
    }
}
