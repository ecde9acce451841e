//! Validation of a configuration document against the loaded schema.
//!
//! Covers the part of XSD that configuration schemas use: global and local
//! element declarations, `ref`, named and anonymous complex types with
//! `sequence`/`choice`/`all`/`group` particles and occurrence bounds,
//! attributes (`use`, `fixed`, attribute groups, `anyAttribute`), simple and
//! complex content derivation, and simple types built from restriction
//! facets, lists and unions over the built-in types.
//!
//! Content models are matched greedily without backtracking. Identity
//! constraints, substitution groups and `xsi:type` are not checked.

use regex::Regex;

use super::types::local_name;
use super::{Decl, SchemaIntrospector, TypeRef, MAX_TYPE_DEPTH};
use crate::error::ValidationError;
use crate::tree::{Document, NodeId};

const STRING_BUILTINS: &[&str] = &[
    "string",
    "normalizedString",
    "token",
    "language",
    "Name",
    "NCName",
    "QName",
    "NMTOKEN",
    "NMTOKENS",
    "ID",
    "IDREF",
    "IDREFS",
    "ENTITY",
    "ENTITIES",
    "NOTATION",
    "anyURI",
    "base64Binary",
    "hexBinary",
    "duration",
    "dateTime",
    "date",
    "time",
    "gYear",
    "gYearMonth",
    "gMonth",
    "gMonthDay",
    "gDay",
    "anySimpleType",
    "anyType",
];

/// Bounds of the integer-derived built-ins.
fn integer_bounds(name: &str) -> Option<(Option<i128>, Option<i128>)> {
    let bounds = match name {
        "integer" => (None, None),
        "long" => (Some(i128::from(i64::MIN)), Some(i128::from(i64::MAX))),
        "int" => (Some(i128::from(i32::MIN)), Some(i128::from(i32::MAX))),
        "short" => (Some(i128::from(i16::MIN)), Some(i128::from(i16::MAX))),
        "byte" => (Some(i128::from(i8::MIN)), Some(i128::from(i8::MAX))),
        "nonNegativeInteger" => (Some(0), None),
        "positiveInteger" => (Some(1), None),
        "nonPositiveInteger" => (None, Some(0)),
        "negativeInteger" => (None, Some(-1)),
        "unsignedLong" => (Some(0), Some(i128::from(u64::MAX))),
        "unsignedInt" => (Some(0), Some(i128::from(u32::MAX))),
        "unsignedShort" => (Some(0), Some(i128::from(u16::MAX))),
        "unsignedByte" => (Some(0), Some(i128::from(u8::MAX))),
        _ => return None,
    };
    Some(bounds)
}

/// Whether `name` is the local name of an XSD built-in type.
pub(crate) fn is_known_builtin(name: &str) -> bool {
    STRING_BUILTINS.contains(&name)
        || integer_bounds(name).is_some()
        || matches!(name, "boolean" | "decimal" | "float" | "double")
}

impl SchemaIntrospector {
    /// Validate a whole document. Every violation found is reported, each
    /// located by the canonical path of the offending node.
    pub fn validate(&self, doc: &Document) -> Result<(), Vec<ValidationError>> {
        let mut validator = Validator {
            schema: self,
            doc,
            errors: Vec::new(),
        };
        let root = doc.root();
        match self.global("element", local_name(doc.name(root))) {
            Some(decl) => validator.validate_element(root, decl, 0),
            None => validator.report(
                root,
                "No matching global declaration available for the validation root",
            ),
        }
        if validator.errors.is_empty() {
            Ok(())
        } else {
            Err(validator.errors)
        }
    }
}

#[derive(Clone, Copy)]
enum SimpleType<'a> {
    Builtin(&'a str),
    Derived(Decl<'a>),
}

enum ContentType<'a> {
    Complex(Decl<'a>),
    Simple(SimpleType<'a>),
    Any,
}

#[derive(Default)]
struct ComplexModel<'a> {
    particles: Vec<Decl<'a>>,
    attributes: Vec<Decl<'a>>,
    any_attribute: bool,
    simple_content: Option<SimpleType<'a>>,
    mixed: bool,
}

struct Validator<'a> {
    schema: &'a SchemaIntrospector,
    doc: &'a Document,
    errors: Vec<ValidationError>,
}

type Assigned<'a> = Vec<(NodeId, Option<Decl<'a>>)>;

impl<'a> Validator<'a> {
    fn report(&mut self, id: NodeId, message: impl Into<String>) {
        self.errors
            .push(ValidationError::new(self.doc.get_path(id), message));
    }

    fn validate_element(&mut self, id: NodeId, decl: Decl<'a>, depth: usize) {
        let decl = match decl.attr("ref") {
            Some(reference) => match self.schema.global("element", local_name(reference)) {
                Some(global) => global,
                None => {
                    self.report(id, format!("referenced element '{reference}' is not declared"));
                    return;
                }
            },
            None => decl,
        };

        match self.content_type(id, decl) {
            ContentType::Complex(ct) => self.validate_complex(id, ct, depth),
            ContentType::Simple(st) => self.validate_simple_element(id, st),
            ContentType::Any => {}
        }
    }

    fn content_type(&mut self, id: NodeId, decl: Decl<'a>) -> ContentType<'a> {
        if let Some(type_name) = decl.attr("type") {
            return match self.schema.resolve_type_name(type_name) {
                TypeRef::Builtin("anyType") => ContentType::Any,
                TypeRef::Builtin(local) => ContentType::Simple(SimpleType::Builtin(local)),
                TypeRef::File => ContentType::Simple(SimpleType::Builtin("string")),
                TypeRef::Simple(st) => ContentType::Simple(SimpleType::Derived(st)),
                TypeRef::Complex(ct) => ContentType::Complex(ct),
                TypeRef::Unknown => {
                    self.report(id, format!("type '{type_name}' is not declared"));
                    ContentType::Any
                }
            };
        }
        if let Some(ct) = decl.child("complexType") {
            return ContentType::Complex(ct);
        }
        if let Some(st) = decl.child("simpleType") {
            return ContentType::Simple(SimpleType::Derived(st));
        }
        ContentType::Any
    }

    fn simple_ref(&self, type_name: &'a str) -> Option<SimpleType<'a>> {
        match self.schema.resolve_type_name(type_name) {
            TypeRef::Builtin(local) => Some(SimpleType::Builtin(local)),
            TypeRef::File => Some(SimpleType::Builtin("string")),
            TypeRef::Simple(decl) => Some(SimpleType::Derived(decl)),
            TypeRef::Complex(_) | TypeRef::Unknown => None,
        }
    }

    fn validate_simple_element(&mut self, id: NodeId, st: SimpleType<'a>) {
        if !self.doc.elements(id).is_empty() {
            self.report(
                id,
                "Element content is not allowed, because the type is a simple type",
            );
        }
        let doc = self.doc;
        for (key, _) in doc.node(id).attributes() {
            if !is_namespace_attribute(key) {
                self.report(id, format!("The attribute '{key}' is not allowed"));
            }
        }
        let value = doc.node(id).text().unwrap_or_default();
        if let Err(message) = self.check_simple(value, st, 0) {
            self.report(id, message);
        }
    }

    fn validate_complex(&mut self, id: NodeId, ct: Decl<'a>, depth: usize) {
        if depth > MAX_TYPE_DEPTH * 8 {
            return;
        }
        let mut model = ComplexModel::default();
        self.collect_complex(ct, &mut model, 0);
        self.check_attributes(id, &model);

        let doc = self.doc;
        let text = doc.node(id).text().filter(|t| !t.trim().is_empty());
        let children = doc.elements(id);

        if let Some(st) = model.simple_content {
            if !children.is_empty() {
                self.report(
                    id,
                    "Element content is not allowed, because the content type is a simple type",
                );
            }
            if let Err(message) = self.check_simple(text.unwrap_or_default(), st, 0) {
                self.report(id, message);
            }
            return;
        }
        if text.is_some() && !model.mixed {
            self.report(
                id,
                "Character content other than whitespace is not allowed because the content type is 'element-only'",
            );
        }

        let mut pos = 0;
        let mut assigned: Assigned<'a> = Vec::new();
        let mut failed = None;
        for particle in &model.particles {
            if !self.match_particle(*particle, &children, &mut pos, &mut assigned, 0) {
                failed = Some(*particle);
                break;
            }
        }

        if let Some(particle) = failed {
            let present: Vec<&str> = children
                .iter()
                .map(|c| local_name(doc.name(*c)))
                .collect();
            let mut missing = Vec::new();
            required_names(particle, &mut missing, 0);
            missing.retain(|name| !present.contains(name));
            missing.dedup();
            if missing.is_empty() {
                self.report(id, "Child elements do not match the declared content model");
            } else {
                self.report(
                    id,
                    format!("Missing child element(s). Expected: {}", missing.join(", ")),
                );
            }
        } else if let Some(&extra) = children.get(pos) {
            self.report(extra, "This element is not expected");
        }

        for (child, decl) in assigned {
            if let Some(decl) = decl {
                self.validate_element(child, decl, depth + 1);
            }
        }
    }

    /// Flatten a complex type, its derivation base and attribute groups.
    fn collect_complex(&self, decl: Decl<'a>, model: &mut ComplexModel<'a>, depth: usize) {
        if depth > MAX_TYPE_DEPTH {
            return;
        }
        if decl.attr("mixed") == Some("true") {
            model.mixed = true;
        }
        for child in decl.children() {
            match child.tag() {
                "sequence" | "choice" | "all" | "group" => model.particles.push(child),
                "attribute" => model.attributes.push(child),
                "anyAttribute" => model.any_attribute = true,
                "attributeGroup" => {
                    if let Some(group) = child
                        .attr("ref")
                        .and_then(|r| self.schema.global("attributeGroup", local_name(r)))
                    {
                        self.collect_complex(group, model, depth + 1);
                    }
                }
                "simpleContent" | "complexContent" => {
                    if child.attr("mixed") == Some("true") {
                        model.mixed = true;
                    }
                    let simple = child.tag() == "simpleContent";
                    for derivation in child.children() {
                        let extension = match derivation.tag() {
                            "extension" => true,
                            "restriction" => false,
                            _ => continue,
                        };
                        if let Some(base) = derivation.attr("base") {
                            match self.schema.resolve_type_name(base) {
                                TypeRef::Complex(base_ct) if extension || simple => {
                                    self.collect_complex(base_ct, model, depth + 1);
                                }
                                TypeRef::Complex(_) => {}
                                _ if simple => model.simple_content = self.simple_ref(base),
                                _ => {}
                            }
                        }
                        self.collect_complex(derivation, model, depth + 1);
                    }
                }
                _ => {}
            }
        }
    }

    fn check_attributes(&mut self, id: NodeId, model: &ComplexModel<'a>) {
        let declared: Vec<(&'a str, Decl<'a>, Decl<'a>)> = model
            .attributes
            .iter()
            .filter_map(|use_decl| {
                let decl = match use_decl.attr("ref") {
                    Some(r) => self.schema.global("attribute", local_name(r))?,
                    None => *use_decl,
                };
                let name = decl.attr("name")?;
                Some((name, *use_decl, decl))
            })
            .collect();

        let doc = self.doc;
        for (key, value) in doc.node(id).attributes() {
            if is_namespace_attribute(key) {
                continue;
            }
            let found = declared
                .iter()
                .find(|(name, _, _)| *name == key.as_str() || *name == local_name(key));
            match found {
                Some((_, use_decl, _)) if use_decl.attr("use") == Some("prohibited") => {
                    self.report(id, format!("The attribute '{key}' is not allowed"));
                }
                Some((_, use_decl, decl)) => {
                    let fixed = use_decl.attr("fixed").or_else(|| decl.attr("fixed"));
                    if let Some(fixed) = fixed.filter(|f| *f != value.as_str()) {
                        self.report(
                            id,
                            format!("attribute '{key}': value must be the fixed value '{fixed}'"),
                        );
                    }
                    if let Some(st) = self.attribute_type(*decl) {
                        if let Err(message) = self.check_simple(value, st, 0) {
                            self.report(id, format!("attribute '{key}': {message}"));
                        }
                    }
                }
                None if model.any_attribute => {}
                None => self.report(id, format!("The attribute '{key}' is not allowed")),
            }
        }

        for (name, use_decl, _) in &declared {
            if use_decl.attr("use") == Some("required") && doc.attribute(id, name).is_none() {
                self.report(id, format!("The attribute '{name}' is required but missing"));
            }
        }
    }

    fn attribute_type(&self, decl: Decl<'a>) -> Option<SimpleType<'a>> {
        match decl.attr("type") {
            Some(type_name) => self.simple_ref(type_name),
            None => decl.child("simpleType").map(SimpleType::Derived),
        }
    }

    fn match_particle(
        &self,
        particle: Decl<'a>,
        children: &[NodeId],
        pos: &mut usize,
        out: &mut Assigned<'a>,
        depth: usize,
    ) -> bool {
        let (min, max) = occurs(particle);
        let mut count = 0;
        while count < max {
            let (start, assigned) = (*pos, out.len());
            if !self.match_once(particle, children, pos, out, depth) {
                *pos = start;
                out.truncate(assigned);
                break;
            }
            count += 1;
            if *pos == start {
                // matched without consuming anything; repeating cannot progress
                count = count.max(min);
                break;
            }
        }
        count >= min
    }

    fn match_once(
        &self,
        particle: Decl<'a>,
        children: &[NodeId],
        pos: &mut usize,
        out: &mut Assigned<'a>,
        depth: usize,
    ) -> bool {
        if depth > MAX_TYPE_DEPTH * 8 {
            return false;
        }
        match particle.tag() {
            "element" => match (element_name(particle), children.get(*pos)) {
                (Some(name), Some(&child)) if local_name(self.doc.name(child)) == name => {
                    out.push((child, Some(particle)));
                    *pos += 1;
                    true
                }
                _ => false,
            },
            "any" => match children.get(*pos) {
                Some(&child) => {
                    out.push((child, None));
                    *pos += 1;
                    true
                }
                None => false,
            },
            "sequence" => particles(particle)
                .into_iter()
                .all(|p| self.match_particle(p, children, pos, out, depth + 1)),
            "choice" => {
                let (start, assigned) = (*pos, out.len());
                let mut empty_match = false;
                for alternative in particles(particle) {
                    if self.match_particle(alternative, children, pos, out, depth + 1) {
                        if *pos > start {
                            return true;
                        }
                        empty_match = true;
                    }
                    *pos = start;
                    out.truncate(assigned);
                }
                empty_match
            }
            "all" => {
                let members = particles(particle);
                let mut counts = vec![0usize; members.len()];
                while let Some(&child) = children.get(*pos) {
                    let name = local_name(self.doc.name(child));
                    let hit = members.iter().enumerate().find(|(i, m)| {
                        element_name(**m) == Some(name) && counts[*i] < occurs(**m).1
                    });
                    let Some((i, member)) = hit else { break };
                    out.push((child, Some(*member)));
                    counts[i] += 1;
                    *pos += 1;
                }
                members
                    .iter()
                    .zip(&counts)
                    .all(|(m, count)| *count >= occurs(*m).0)
            }
            "group" => particle
                .attr("ref")
                .and_then(|r| self.schema.global("group", local_name(r)))
                .is_some_and(|group| {
                    particles(group)
                        .into_iter()
                        .all(|p| self.match_particle(p, children, pos, out, depth + 1))
                }),
            _ => false,
        }
    }

    fn check_simple(&self, value: &str, st: SimpleType<'a>, depth: usize) -> Result<(), String> {
        let decl = match st {
            SimpleType::Builtin(name) => return check_builtin(name, value),
            SimpleType::Derived(decl) => decl,
        };
        if depth > MAX_TYPE_DEPTH {
            return Ok(());
        }
        if let Some(restriction) = decl.child("restriction") {
            return self.check_restriction(value, restriction, depth);
        }
        if let Some(list) = decl.child("list") {
            let item_type = match list.attr("itemType") {
                Some(name) => self.simple_ref(name),
                None => list.child("simpleType").map(SimpleType::Derived),
            };
            if let Some(item_type) = item_type {
                for item in value.split_whitespace() {
                    self.check_simple(item, item_type, depth + 1)?;
                }
            }
            return Ok(());
        }
        if let Some(union) = decl.child("union") {
            let mut members: Vec<SimpleType<'a>> = union
                .attr("memberTypes")
                .unwrap_or_default()
                .split_whitespace()
                .filter_map(|name| self.simple_ref(name))
                .collect();
            members.extend(
                union
                    .children_tagged("simpleType")
                    .into_iter()
                    .map(SimpleType::Derived),
            );
            if members.is_empty()
                || members
                    .iter()
                    .any(|m| self.check_simple(value, *m, depth + 1).is_ok())
            {
                return Ok(());
            }
            return Err(format!("'{value}' is not a valid value of the union type"));
        }
        Ok(())
    }

    fn check_restriction(&self, value: &str, restriction: Decl<'a>, depth: usize) -> Result<(), String> {
        let base = match restriction.attr("base") {
            Some(name) => self.simple_ref(name),
            None => restriction.child("simpleType").map(SimpleType::Derived),
        };
        if let Some(base) = base {
            self.check_simple(value, base, depth + 1)?;
        }

        let trimmed = value.trim();
        let enumeration: Vec<&str> = restriction
            .children_tagged("enumeration")
            .iter()
            .filter_map(|e| e.attr("value"))
            .collect();
        if !enumeration.is_empty() && !enumeration.contains(&trimmed) {
            return Err(format!(
                "'{value}' is not an element of the set {{{}}}",
                enumeration.join(", ")
            ));
        }

        let patterns: Vec<&str> = restriction
            .children_tagged("pattern")
            .iter()
            .filter_map(|p| p.attr("value"))
            .collect();
        if !patterns.is_empty() && !patterns.iter().any(|p| pattern_matches(p, value)) {
            return Err(format!(
                "'{value}' is not accepted by the pattern '{}'",
                patterns.join("|")
            ));
        }

        for facet in restriction.children() {
            let Some(bound) = facet.attr("value") else {
                continue;
            };
            check_facet(facet.tag(), bound, value)?;
        }
        Ok(())
    }
}

fn check_facet(facet: &str, bound: &str, value: &str) -> Result<(), String> {
    let trimmed = value.trim();
    let number = trimmed.parse::<f64>().ok();
    let limit = bound.trim().parse::<f64>().ok();
    let count = bound.trim().parse::<usize>().ok();

    let ok = match (facet, number, limit, count) {
        ("minInclusive", Some(v), Some(l), _) => v >= l,
        ("maxInclusive", Some(v), Some(l), _) => v <= l,
        ("minExclusive", Some(v), Some(l), _) => v > l,
        ("maxExclusive", Some(v), Some(l), _) => v < l,
        ("length", _, _, Some(n)) => value.chars().count() == n,
        ("minLength", _, _, Some(n)) => value.chars().count() >= n,
        ("maxLength", _, _, Some(n)) => value.chars().count() <= n,
        ("totalDigits", _, _, Some(n)) => total_digits(trimmed) <= n,
        ("fractionDigits", _, _, Some(n)) => fraction_digits(trimmed) <= n,
        _ => true,
    };
    if ok {
        Ok(())
    } else {
        Err(format!("'{value}' violates the facet '{facet}' with value '{bound}'"))
    }
}

fn pattern_matches(pattern: &str, value: &str) -> bool {
    match Regex::new(&format!("^(?:{pattern})$")) {
        Ok(re) => re.is_match(value),
        Err(err) => {
            tracing::debug!(pattern, error = %err, "ignoring unsupported schema pattern");
            true
        }
    }
}

fn check_builtin(name: &str, value: &str) -> Result<(), String> {
    let v = value.trim();
    let valid = if let Some((min, max)) = integer_bounds(name) {
        v.parse::<i128>()
            .is_ok_and(|n| min.map_or(true, |m| m <= n) && max.map_or(true, |m| n <= m))
    } else {
        match name {
            "boolean" => matches!(v, "true" | "false" | "1" | "0"),
            "decimal" => is_decimal(v),
            "float" | "double" => is_float(v),
            _ => true,
        }
    };
    if valid {
        Ok(())
    } else {
        Err(format!("'{value}' is not a valid value of the atomic type '{name}'"))
    }
}

fn is_decimal(v: &str) -> bool {
    let digits = v.strip_prefix(['+', '-']).unwrap_or(v);
    let (int, frac) = digits.split_once('.').unwrap_or((digits, ""));
    !(int.is_empty() && frac.is_empty())
        && int.bytes().all(|b| b.is_ascii_digit())
        && frac.bytes().all(|b| b.is_ascii_digit())
}

fn is_float(v: &str) -> bool {
    matches!(v, "INF" | "+INF" | "-INF" | "NaN")
        || (v
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
            && v.parse::<f64>().is_ok())
}

fn total_digits(v: &str) -> usize {
    let digits = v.strip_prefix(['+', '-']).unwrap_or(v);
    let (int, frac) = digits.split_once('.').unwrap_or((digits, ""));
    let int = int.trim_start_matches('0');
    let frac = frac.trim_end_matches('0');
    int.len() + frac.len()
}

fn fraction_digits(v: &str) -> usize {
    v.split_once('.')
        .map_or(0, |(_, frac)| frac.trim_end_matches('0').len())
}

fn is_namespace_attribute(key: &str) -> bool {
    key == "xmlns" || key.starts_with("xmlns:") || key.starts_with("xsi:")
}

fn is_particle(decl: &Decl<'_>) -> bool {
    matches!(
        decl.tag(),
        "element" | "any" | "sequence" | "choice" | "all" | "group"
    )
}

fn particles<'a>(decl: Decl<'a>) -> Vec<Decl<'a>> {
    decl.children().into_iter().filter(is_particle).collect()
}

fn element_name<'a>(decl: Decl<'a>) -> Option<&'a str> {
    decl.attr("name").or_else(|| decl.attr("ref")).map(local_name)
}

fn occurs(decl: Decl<'_>) -> (usize, usize) {
    let min = decl
        .attr("minOccurs")
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(1);
    let max = match decl.attr("maxOccurs") {
        Some("unbounded") => usize::MAX,
        Some(v) => v.trim().parse().unwrap_or(1),
        None => 1,
    };
    (min, max)
}

/// Element names a particle requires at least once.
fn required_names<'a>(decl: Decl<'a>, out: &mut Vec<&'a str>, depth: usize) {
    if depth > MAX_TYPE_DEPTH || occurs(decl).0 == 0 {
        return;
    }
    match decl.tag() {
        "element" => out.extend(element_name(decl)),
        "sequence" | "all" => {
            for p in particles(decl) {
                required_names(p, out, depth + 1);
            }
        }
        _ => {}
    }
}
