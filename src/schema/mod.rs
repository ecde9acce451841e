//! Schema loading and introspection.
//!
//! A [`SchemaIntrospector`] holds the primary XSD document and, when the
//! primary `include`s one, the shared common schema. Lookups search the
//! common schema first, then the primary one, in document order. Every
//! metadata query degrades to `None` when the schema says nothing: editors
//! built on top must keep working with incomplete annotations.
//!
//! Whole-document validation lives in [`validate`], type descriptors in
//! [`types`].

pub mod types;
pub mod validate;

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::XmlConfError;
use crate::tree::{Document, NodeId};
use types::{local_name, step_from_fraction_digits, TypeDescriptor, TypeKind};

pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// Returned by [`SchemaIntrospector::max_occurs`] for `maxOccurs="unbounded"`.
pub const UNBOUNDED_OCCURS: u32 = 100;

/// Name of the pseudo-type marking values that reference auxiliary files.
pub const FILE_TYPE: &str = "file";

const MAX_TYPE_DEPTH: usize = 16;

/// Whether file-typed declarations are searched among elements or attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Element,
    Attribute,
}

impl DeclKind {
    const fn tag(self) -> &'static str {
        match self {
            Self::Element => "element",
            Self::Attribute => "attribute",
        }
    }
}

/// Presentation flags read from `annotation/documentation`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UiHints {
    /// `<hide>true</hide>`
    pub hidden: bool,
    /// `<adv>true</adv>`: only shown in advanced mode.
    pub hidden_unless_advanced: bool,
    /// `<not_list>true</not_list>`
    pub not_listable: bool,
    /// `<conf>true</conf>`
    pub requires_explicit_confirmation: bool,
}

/// A declaration node inside one of the schema documents.
#[derive(Clone, Copy)]
pub(crate) struct Decl<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl<'a> Decl<'a> {
    fn tag(&self) -> &'a str {
        local_name(self.doc.name(self.id))
    }

    fn attr(&self, name: &str) -> Option<&'a str> {
        self.doc.attribute(self.id, name)
    }

    fn text(&self) -> Option<&'a str> {
        self.doc.node(self.id).text()
    }

    fn parent(&self) -> Option<Decl<'a>> {
        self.doc.parent(self.id).map(|id| Decl { doc: self.doc, id })
    }

    fn children(&self) -> Vec<Decl<'a>> {
        self.doc
            .elements(self.id)
            .into_iter()
            .map(|id| Decl { doc: self.doc, id })
            .collect()
    }

    fn children_tagged(&self, tag: &str) -> Vec<Decl<'a>> {
        self.children()
            .into_iter()
            .filter(|c| c.tag() == tag)
            .collect()
    }

    fn child(&self, tag: &str) -> Option<Decl<'a>> {
        self.children().into_iter().find(|c| c.tag() == tag)
    }

    /// Name of the nearest ancestor declaration carrying a `name`.
    fn owner_name(&self) -> Option<&'a str> {
        let mut current = self.parent();
        while let Some(decl) = current {
            if let Some(name) = decl.attr("name") {
                return Some(name);
            }
            current = decl.parent();
        }
        None
    }

    /// `annotation/documentation{field}` children; the documentation
    /// element itself when `field` is empty.
    fn documentation(&self, field: &str) -> Vec<Decl<'a>> {
        let mut out = Vec::new();
        for annotation in self.children_tagged("annotation") {
            for doc in annotation.children_tagged("documentation") {
                if field.is_empty() {
                    out.push(doc);
                } else {
                    out.extend(doc.children_tagged(field));
                }
            }
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct SchemaIntrospector {
    primary: Document,
    common: Option<Document>,
    xsd_prefixes: Vec<String>,
}

/// Built-in type, named simple/complex type, or the `file` pseudo-type.
#[derive(Clone, Copy)]
pub(crate) enum TypeRef<'a> {
    Builtin(&'a str),
    File,
    Simple(Decl<'a>),
    Complex(Decl<'a>),
    Unknown,
}

impl SchemaIntrospector {
    /// Load a schema file and the single common schema it may include.
    /// Relative include locations resolve against the including file's directory.
    pub fn load(path: &Path) -> Result<Self, XmlConfError> {
        let primary = read_schema(path)?;

        let locations: Vec<String> = primary
            .descendants(primary.root())
            .into_iter()
            .filter(|id| local_name(primary.name(*id)) == "include")
            .filter_map(|id| primary.attribute(id, "schemaLocation").map(str::to_string))
            .collect();

        let common = match locations.as_slice() {
            [] => None,
            [location, rest @ ..] => {
                if !rest.is_empty() {
                    tracing::warn!(
                        schema = %path.display(),
                        ignored = rest.len(),
                        "only the first schema include is loaded"
                    );
                }
                let resolved = resolve_include(path, location);
                tracing::debug!(include = %resolved.display(), "loading common schema");
                Some(read_schema(&resolved)?)
            }
        };

        Ok(Self::from_documents(primary, common))
    }

    /// Build from already parsed documents.
    #[must_use]
    pub fn from_documents(primary: Document, common: Option<Document>) -> Self {
        let mut xsd_prefixes: Vec<String> = std::iter::once(&primary)
            .chain(common.as_ref())
            .flat_map(|doc| doc.node(doc.root()).attributes().to_vec())
            .filter(|(key, value)| key.starts_with("xmlns:") && value == XSD_NAMESPACE)
            .map(|(key, _)| key.trim_start_matches("xmlns:").to_string())
            .collect();
        if xsd_prefixes.is_empty() {
            xsd_prefixes = vec!["xsd".to_string(), "xs".to_string()];
        }
        Self {
            primary,
            common,
            xsd_prefixes,
        }
    }

    fn documents(&self) -> impl Iterator<Item = &Document> {
        self.common.iter().chain(std::iter::once(&self.primary))
    }

    /// Every declaration node with the given tag, common schema first.
    fn all_tagged(&self, tag: &str) -> Vec<Decl<'_>> {
        self.documents()
            .flat_map(|doc| {
                doc.descendants(doc.root())
                    .into_iter()
                    .map(move |id| Decl { doc, id })
            })
            .filter(|d| d.tag() == tag)
            .collect()
    }

    fn find(&self, tag: &str, attr: &str, value: &str) -> Vec<Decl<'_>> {
        self.all_tagged(tag)
            .into_iter()
            .filter(|d| d.attr(attr) == Some(value))
            .collect()
    }

    /// Top-level declarations (direct children of `schema`).
    fn global(&self, tag: &str, name: &str) -> Option<Decl<'_>> {
        self.documents()
            .flat_map(|doc| {
                doc.elements(doc.root())
                    .into_iter()
                    .map(move |id| Decl { doc, id })
            })
            .find(|d| d.tag() == tag && d.attr("name").map(local_name) == Some(name))
    }

    /// Element declaration by name. With several candidates, the first
    /// whose typing (`type` present or not) matches `with_type` wins,
    /// else the first in document order.
    pub(crate) fn element_decl(&self, name: &str, with_type: bool) -> Option<Decl<'_>> {
        let candidates = self.find("element", "name", name);
        match candidates.as_slice() {
            [] => None,
            [one] => Some(*one),
            many => many
                .iter()
                .find(|d| d.attr("type").is_some() == with_type)
                .or_else(|| many.first())
                .copied(),
        }
    }

    /// First element declared by `ref` to `name`.
    fn reference_decl(&self, name: &str) -> Option<Decl<'_>> {
        self.find("element", "ref", name).into_iter().next()
    }

    /// Declared type of the first element named `name`.
    fn complex_name(&self, name: &str) -> Option<&str> {
        self.find("element", "name", name)
            .into_iter()
            .next()
            .and_then(|d| d.attr("type"))
    }

    /// Attribute declaration owned by `parent_name` (or by its declared type).
    pub(crate) fn attribute_decl(&self, name: &str, parent_name: &str) -> Option<Decl<'_>> {
        let owner = self.complex_name(parent_name).unwrap_or(parent_name);
        self.find("attribute", "name", name)
            .into_iter()
            .find(|d| d.owner_name().map(local_name) == Some(local_name(owner)))
    }

    fn decl_for(&self, name: &str, parent_name: Option<&str>) -> Option<Decl<'_>> {
        match parent_name {
            Some(parent) => self.attribute_decl(name, parent),
            None => self.element_decl(name, false),
        }
    }

    /// Raw text of `annotation/documentation{field}` for an element (or an
    /// attribute of `parent_name`). Falls back to the declaration that
    /// references `name`. `field` is `""` for the documentation text itself,
    /// or a sub-field such as `"unit"` or `"/unit"`.
    #[must_use]
    pub fn get_doc_param(&self, field: &str, name: &str, parent_name: Option<&str>) -> Option<String> {
        let field = field.trim_start_matches('/');
        let decl = self.decl_for(name, parent_name)?;
        let mut found = decl.documentation(field);
        if found.len() != 1 {
            found = self
                .reference_decl(name)
                .map(|r| r.documentation(field))
                .unwrap_or_default();
        }
        match found.as_slice() {
            [one] => one.text().map(str::to_string),
            _ => None,
        }
    }

    /// Human-readable description, whitespace-normalised with `\n` and `\t`
    /// escapes expanded.
    #[must_use]
    pub fn get_documentation(&self, name: &str, parent_name: Option<&str>) -> Option<String> {
        self.get_doc_param("", name, parent_name)
            .map(|text| normalize_doc_text(&text))
    }

    #[must_use]
    pub fn get_unit(&self, name: &str, parent_name: Option<&str>) -> Option<String> {
        self.get_doc_param("unit", name, parent_name)
            .map(|text| normalize_doc_text(&text))
    }

    /// Source template of a file-typed value.
    #[must_use]
    pub fn get_file_source(&self, name: &str, parent_name: Option<&str>) -> Option<String> {
        self.get_doc_param("source", name, parent_name)
    }

    /// Default of a file-typed value.
    #[must_use]
    pub fn get_default(&self, name: &str, parent_name: Option<&str>) -> Option<String> {
        self.get_doc_param("default", name, parent_name)
    }

    fn flag(&self, field: &str, name: &str) -> bool {
        self.get_doc_param(field, name, None).as_deref() == Some("true")
    }

    #[must_use]
    pub fn ui_hints(&self, name: &str) -> UiHints {
        UiHints {
            hidden: self.flag("hide", name),
            hidden_unless_advanced: self.flag("adv", name),
            not_listable: self.flag("not_list", name),
            requires_explicit_confirmation: self.flag("conf", name),
        }
    }

    /// Whether an element flagged advanced-only should be hidden in the given mode.
    #[must_use]
    pub fn do_hide_adv(&self, name: &str, advanced_mode: bool) -> bool {
        !advanced_mode && self.flag("adv", name)
    }

    #[must_use]
    pub fn do_hide(&self, name: &str) -> bool {
        self.flag("hide", name)
    }

    #[must_use]
    pub fn do_not_list(&self, name: &str) -> bool {
        self.flag("not_list", name)
    }

    #[must_use]
    pub fn do_conf(&self, name: &str) -> bool {
        self.flag("conf", name)
    }

    /// Attributes of `annotation/documentation/xpath`, in declaration order.
    #[must_use]
    pub fn get_xpath_restrictions(
        &self,
        name: &str,
        parent_name: Option<&str>,
    ) -> Option<Vec<(String, String)>> {
        let decl = self.decl_for(name, parent_name)?;
        let mut found = decl.documentation("xpath");
        if found.len() != 1 {
            found = self
                .reference_decl(name)
                .map(|r| r.documentation("xpath"))
                .unwrap_or_default();
        }
        match found.as_slice() {
            [one] => Some(one.doc.node(one.id).attributes().to_vec()),
            _ => None,
        }
    }

    /// Type of an element.
    #[must_use]
    pub fn get_type(&self, name: &str) -> Option<TypeDescriptor> {
        let decl = self.element_decl(name, true)?;
        self.describe_decl(decl)
    }

    /// Type of an attribute of `parent_name`.
    #[must_use]
    pub fn get_attribute_type(&self, name: &str, parent_name: &str) -> Option<TypeDescriptor> {
        let decl = self.attribute_decl(name, parent_name)?;
        self.describe_decl(decl)
    }

    fn describe_decl(&self, decl: Decl<'_>) -> Option<TypeDescriptor> {
        match decl.attr("type") {
            Some(FILE_TYPE) => Some(TypeDescriptor::of(TypeKind::File)),
            Some(type_name) => self.describe_type(type_name, 0),
            None => decl
                .child("simpleType")
                .and_then(|inline| self.describe_simple_type(inline, 0)),
        }
    }

    fn describe_type(&self, type_name: &str, depth: usize) -> Option<TypeDescriptor> {
        match self.resolve_type_name(type_name) {
            TypeRef::Builtin(local) => Some(TypeDescriptor::builtin(local)),
            TypeRef::File => Some(TypeDescriptor::of(TypeKind::File)),
            TypeRef::Simple(decl) => self.describe_simple_type(decl, depth),
            TypeRef::Complex(_) | TypeRef::Unknown => None,
        }
    }

    /// Named simple type description.
    #[must_use]
    pub fn get_simple_type(&self, name: &str) -> Option<TypeDescriptor> {
        let decl = self.find("simpleType", "name", name).into_iter().next()?;
        self.describe_simple_type(decl, 0)
    }

    fn describe_simple_type(&self, decl: Decl<'_>, depth: usize) -> Option<TypeDescriptor> {
        if depth > MAX_TYPE_DEPTH {
            tracing::warn!(depth, "simple type derivation too deep, giving up");
            return None;
        }
        let restrictions = decl.children_tagged("restriction");
        let [restriction] = restrictions.as_slice() else {
            return None;
        };
        let base = restriction.attr("base")?;

        let enum_values: Vec<String> = restriction
            .children_tagged("enumeration")
            .iter()
            .filter_map(|e| e.attr("value").map(str::to_string))
            .collect();

        let mut descriptor = match types::numeric_builtin(base) {
            Some(numeric) if self.is_builtin_name(base) => numeric,
            _ => match self.describe_type(base, depth + 1) {
                Some(inherited) => inherited,
                None => return None,
            },
        };

        if descriptor.kind == TypeKind::Numeric
            || (descriptor.kind == TypeKind::Enum && descriptor.step.is_some())
        {
            let facet = |tag: &str| {
                restriction
                    .child(tag)
                    .and_then(|f| f.attr("value"))
                    .and_then(|v| v.trim().parse::<f64>().ok())
            };
            if let Some(min) = facet("minInclusive") {
                descriptor.min = Some(min);
            }
            if let Some(max) = facet("maxInclusive") {
                descriptor.max = Some(max);
            }
            if let Some(digits) = restriction
                .child("fractionDigits")
                .and_then(|f| f.attr("value"))
                .and_then(|v| v.trim().parse::<u32>().ok())
            {
                descriptor.step = Some(step_from_fraction_digits(digits));
            }
        }

        if !enum_values.is_empty() {
            descriptor.kind = TypeKind::Enum;
            descriptor.enum_values = enum_values;
        }
        Some(descriptor)
    }

    fn is_builtin_name(&self, type_name: &str) -> bool {
        matches!(self.resolve_type_name(type_name), TypeRef::Builtin(_))
    }

    /// Resolve a `type`/`base` reference. Prefixed XSD names are built-ins;
    /// otherwise named complex and simple types take precedence over the
    /// `file` pseudo-type and unprefixed built-in names.
    pub(crate) fn resolve_type_name<'s>(&'s self, type_name: &'s str) -> TypeRef<'s> {
        if let Some((prefix, local)) = type_name.split_once(':') {
            if self.xsd_prefixes.iter().any(|p| p == prefix) {
                return TypeRef::Builtin(local);
            }
        }
        let local = local_name(type_name);
        if let Some(decl) = self.global("complexType", local) {
            return TypeRef::Complex(decl);
        }
        if let Some(decl) = self.global("simpleType", local) {
            return TypeRef::Simple(decl);
        }
        if local == FILE_TYPE {
            return TypeRef::File;
        }
        if validate::is_known_builtin(local) {
            return TypeRef::Builtin(local);
        }
        TypeRef::Unknown
    }

    fn occurs_values(&self, table_name: &str, attr: &str) -> Vec<&str> {
        let by_ref = self.find("element", "ref", table_name);
        let by_name = self.find("element", "name", table_name);
        by_ref
            .into_iter()
            .chain(by_name)
            .filter_map(|d| d.attr(attr))
            .collect()
    }

    /// `minOccurs` of a table element, 0 when undeclared.
    #[must_use]
    pub fn min_occurs(&self, table_name: &str) -> u32 {
        self.occurs_values(table_name, "minOccurs")
            .first()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }

    /// `maxOccurs` of a table element, 1 when undeclared and
    /// [`UNBOUNDED_OCCURS`] for `unbounded`.
    #[must_use]
    pub fn max_occurs(&self, table_name: &str) -> u32 {
        match self.occurs_values(table_name, "maxOccurs").first() {
            Some(&"unbounded") => UNBOUNDED_OCCURS,
            Some(value) => value.trim().parse().unwrap_or(1),
            None => 1,
        }
    }

    /// Names of elements or attributes declared with the `file` type.
    #[must_use]
    pub fn get_file_elements(&self, kind: DeclKind) -> Vec<String> {
        self.find(kind.tag(), "type", FILE_TYPE)
            .into_iter()
            .filter_map(|d| d.attr("name").map(str::to_string))
            .collect()
    }
}

fn read_schema(path: &Path) -> Result<Document, XmlConfError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            XmlConfError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            XmlConfError::Io(e)
        }
    })?;
    let doc = Document::parse(&content).map_err(|e| XmlConfError::load(path, e))?;
    if local_name(doc.name(doc.root())) != "schema" {
        return Err(XmlConfError::load(
            path,
            format!("root element is '{}', not a schema", doc.name(doc.root())),
        ));
    }
    Ok(doc)
}

fn resolve_include(schema_path: &Path, location: &str) -> PathBuf {
    let location = Path::new(location);
    if location.is_absolute() {
        return location.to_path_buf();
    }
    let sibling = schema_path
        .parent()
        .map_or_else(|| location.to_path_buf(), |dir| dir.join(location));
    if sibling.exists() {
        sibling
    } else {
        location.to_path_buf()
    }
}

fn normalize_doc_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace("\\n", "\n")
        .replace("\\t", "\t")
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMMON: &str = r#"<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema">
  <xsd:simpleType name="file">
    <xsd:restriction base="xsd:string"/>
  </xsd:simpleType>
  <xsd:simpleType name="Percent">
    <xsd:restriction base="xsd:decimal">
      <xsd:minInclusive value="0"/>
      <xsd:maxInclusive value="100"/>
      <xsd:fractionDigits value="3"/>
    </xsd:restriction>
  </xsd:simpleType>
  <xsd:element name="enabled" type="xsd:boolean">
    <xsd:annotation>
      <xsd:documentation>Enable the thing<hide>true</hide></xsd:documentation>
    </xsd:annotation>
  </xsd:element>
</xsd:schema>"#;

    const PRIMARY: &str = r#"<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema">
  <xsd:include schemaLocation="common.xsd"/>
  <xsd:simpleType name="Encap">
    <xsd:restriction base="xsd:string">
      <xsd:enumeration value="GSE"/>
      <xsd:enumeration value="RLE"/>
      <xsd:enumeration value="AAL5"/>
    </xsd:restriction>
  </xsd:simpleType>
  <xsd:simpleType name="Level">
    <xsd:restriction base="xsd:int">
      <xsd:enumeration value="1"/>
      <xsd:enumeration value="2"/>
    </xsd:restriction>
  </xsd:simpleType>
  <xsd:element name="carrier">
    <xsd:complexType>
      <xsd:attribute name="id" type="xsd:positiveInteger" use="required"/>
      <xsd:attribute name="symbol_rate" type="xsd:decimal">
        <xsd:annotation>
          <xsd:documentation>Symbol rate<unit>Bauds</unit></xsd:documentation>
        </xsd:annotation>
      </xsd:attribute>
      <xsd:attribute name="trace" type="file">
        <xsd:annotation>
          <xsd:documentation>
            <default>trace.txt</default>
            <source>trace.txt</source>
          </xsd:documentation>
        </xsd:annotation>
      </xsd:attribute>
    </xsd:complexType>
  </xsd:element>
  <xsd:complexType name="modcodType">
    <xsd:attribute name="id" type="Level"/>
  </xsd:complexType>
  <xsd:element name="modcod" type="modcodType"/>
  <xsd:element name="configuration">
    <xsd:complexType>
      <xsd:sequence>
        <xsd:element name="global">
          <xsd:annotation>
            <xsd:documentation>
              Global
              parameters\nof the   link
              <adv>true</adv>
              <conf>true</conf>
              <xpath path="/configuration/global" mode="ro"/>
            </xsd:documentation>
          </xsd:annotation>
          <xsd:complexType>
            <xsd:sequence>
              <xsd:element name="delay" type="xsd:positiveInteger">
                <xsd:annotation>
                  <xsd:documentation>Delay<unit>ms</unit></xsd:documentation>
                </xsd:annotation>
              </xsd:element>
              <xsd:element name="encap" type="Encap"/>
              <xsd:element name="loss" type="Percent"/>
              <xsd:element name="level" type="Level"/>
              <xsd:element name="topology" type="file"/>
              <xsd:element ref="enabled" minOccurs="0"/>
              <xsd:element name="carriers">
                <xsd:complexType>
                  <xsd:sequence>
                    <xsd:element ref="carrier" minOccurs="1" maxOccurs="unbounded">
                      <xsd:annotation>
                        <xsd:documentation>One carrier</xsd:documentation>
                      </xsd:annotation>
                    </xsd:element>
                  </xsd:sequence>
                </xsd:complexType>
              </xsd:element>
              <xsd:element name="modcods">
                <xsd:complexType>
                  <xsd:sequence>
                    <xsd:element ref="modcod" maxOccurs="4"/>
                  </xsd:sequence>
                </xsd:complexType>
              </xsd:element>
            </xsd:sequence>
          </xsd:complexType>
        </xsd:element>
        <xsd:element name="debug">
          <xsd:complexType>
            <xsd:sequence>
              <xsd:element name="delay" type="xsd:string"/>
            </xsd:sequence>
          </xsd:complexType>
        </xsd:element>
      </xsd:sequence>
    </xsd:complexType>
  </xsd:element>
</xsd:schema>"#;

    fn schema() -> SchemaIntrospector {
        SchemaIntrospector::from_documents(
            Document::parse(PRIMARY).unwrap(),
            Some(Document::parse(COMMON).unwrap()),
        )
    }

    #[test]
    fn positive_integer_is_numeric_with_lower_bound() {
        let ty = schema().get_type("delay").unwrap();
        assert_eq!(ty.kind, TypeKind::Numeric);
        assert_eq!(ty.min, Some(1.0));
        assert_eq!(ty.step, Some(1.0));
    }

    #[test]
    fn enumerations_keep_declaration_order() {
        let ty = schema().get_type("encap").unwrap();
        assert_eq!(ty.kind, TypeKind::Enum);
        assert_eq!(ty.enum_values, vec!["GSE", "RLE", "AAL5"]);

        let level = schema().get_type("level").unwrap();
        assert_eq!(level.kind, TypeKind::Enum);
        assert_eq!(level.enum_values, vec!["1", "2"]);
        assert_eq!(level.step, Some(1.0));
    }

    #[test]
    fn restriction_facets_refine_numeric_types() {
        let ty = schema().get_type("loss").unwrap();
        assert_eq!(ty.kind, TypeKind::Numeric);
        assert_eq!(ty.min, Some(0.0));
        assert_eq!(ty.max, Some(100.0));
        assert!((ty.step.unwrap() - 0.001).abs() < 1e-12);
    }

    #[test]
    fn file_pseudo_type_wins_over_its_simple_type() {
        assert_eq!(schema().get_type("topology").unwrap().kind, TypeKind::File);
        assert_eq!(
            schema().get_attribute_type("trace", "carrier").unwrap().kind,
            TypeKind::File
        );
    }

    #[test]
    fn typed_duplicate_is_preferred_for_types() {
        // both `delay` declarations are typed, so the first one is used
        let schema = schema();
        assert_eq!(schema.get_type("delay").unwrap().kind, TypeKind::Numeric);
        assert_eq!(schema.get_unit("delay", None).as_deref(), Some("ms"));
    }

    #[test]
    fn attribute_types_follow_the_owner_or_its_named_type() {
        let schema = schema();
        let id = schema.get_attribute_type("id", "carrier").unwrap();
        assert_eq!(id.min, Some(1.0));
        let modcod = schema.get_attribute_type("id", "modcod").unwrap();
        assert_eq!(modcod.kind, TypeKind::Enum);
        assert!(schema.get_attribute_type("id", "global").is_none());
        assert_eq!(
            schema.get_unit("symbol_rate", Some("carrier")).as_deref(),
            Some("Bauds")
        );
    }

    #[test]
    fn documentation_is_normalised() {
        let doc = schema().get_documentation("global", None).unwrap();
        assert_eq!(doc, "Global parameters\nof the link");
    }

    #[test]
    fn ui_hints_read_documentation_flags() {
        let schema = schema();
        let hints = schema.ui_hints("global");
        assert!(hints.hidden_unless_advanced);
        assert!(hints.requires_explicit_confirmation);
        assert!(!hints.hidden);
        assert!(schema.do_hide_adv("global", false));
        assert!(!schema.do_hide_adv("global", true));
        assert!(schema.do_hide("enabled"));
        assert!(!schema.do_not_list("global"));
        assert!(schema.do_conf("global"));
    }

    #[test]
    fn documentation_falls_back_to_the_referencing_declaration() {
        assert_eq!(
            schema().get_documentation("carrier", None).as_deref(),
            Some("One carrier")
        );
    }

    #[test]
    fn xpath_restrictions_return_attributes() {
        let restrictions = schema().get_xpath_restrictions("global", None).unwrap();
        assert_eq!(
            restrictions,
            vec![
                ("path".to_string(), "/configuration/global".to_string()),
                ("mode".to_string(), "ro".to_string()),
            ]
        );
    }

    #[test]
    fn cardinality_defaults_and_unbounded_sentinel() {
        let schema = schema();
        assert_eq!(schema.min_occurs("carrier"), 1);
        assert_eq!(schema.max_occurs("carrier"), UNBOUNDED_OCCURS);
        assert_eq!(schema.max_occurs("modcod"), 4);
        assert_eq!(schema.min_occurs("modcod"), 0);
        assert_eq!(schema.max_occurs("global"), 1);
        assert_eq!(schema.min_occurs("nothing"), 0);
    }

    #[test]
    fn file_declarations_are_listed() {
        let schema = schema();
        assert_eq!(schema.get_file_elements(DeclKind::Element), vec!["topology"]);
        assert_eq!(schema.get_file_elements(DeclKind::Attribute), vec!["trace"]);
        assert_eq!(
            schema.get_default("trace", Some("carrier")).as_deref(),
            Some("trace.txt")
        );
    }

    #[test]
    fn missing_metadata_is_none() {
        let schema = schema();
        assert!(schema.get_type("nothing").is_none());
        assert!(schema.get_documentation("nothing", None).is_none());
        assert!(schema.get_unit("encap", None).is_none());
        assert!(schema.get_attribute_type("nothing", "carrier").is_none());
        assert_eq!(schema.ui_hints("nothing"), UiHints::default());
    }
}
