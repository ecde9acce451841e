//! Per-spot, per-gateway and per-line artifact filenames.
//!
//! A file source template such as `plan.xml` is turned into
//! `plan_spot7_gw2.xml` for a value held under `<spot id="7" gw="2">`, and
//! into `plan_spot7_gw2_3.xml` for the third row of a table under it.
//! Markers already present in the template are stripped first, so adapting
//! an adapted name gives the same name.

use std::sync::LazyLock;

use regex::Regex;

use crate::dimension::{GW_ATTR, ID_ATTR, SPOT_TAG};
use crate::tree::{Document, NodeId};

static SPOT_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_?spot_?[0-9]*").expect("invalid regex"));
static GW_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_?gw_?[0-9]*").expect("invalid regex"));
static LINE_BEFORE_EXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_[0-9]*\.").expect("invalid regex"));
static TRAILING_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_[0-9]*$").expect("invalid regex"));
static PATH_INDEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([0-9]+)\]$").expect("invalid regex"));

/// Adapt `source` to where `node` sits.
///
/// Without `line` the spot is looked up on the node's parent (a file-typed
/// element). With `line` the node is a table row carrying a file-typed
/// attribute, so the spot is its grandparent, and a non-empty line is
/// appended as `_<line>`.
#[must_use]
pub fn adapt_filename(doc: &Document, source: &str, node: NodeId, line: Option<&str>) -> String {
    let name = SPOT_MARKER.replace_all(source, "");
    let name = GW_MARKER.replace_all(&name, "");
    let name = LINE_BEFORE_EXT.replace_all(&name, ".");
    let name = TRAILING_LINE.replace_all(&name, "");

    let (mut stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) => (stem.to_string(), Some(ext)),
        None => (name.to_string(), None),
    };

    let holder = match line {
        None => doc.parent(node),
        Some(_) => doc.parent(node).and_then(|parent| doc.parent(parent)),
    };
    if let Some(spot) = holder.filter(|id| doc.name(*id) == SPOT_TAG) {
        if let Some(id) = doc.attribute(spot, ID_ATTR) {
            stem.push_str("_spot");
            stem.push_str(id);
        }
        if let Some(gw) = doc.attribute(spot, GW_ATTR) {
            stem.push_str("_gw");
            stem.push_str(gw);
        }
    }
    if let Some(line) = line.filter(|l| !l.is_empty()) {
        stem.push('_');
        stem.push_str(line);
    }

    match ext {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    }
}

/// Row number carried by the last step of a node path, `""` when the step
/// has no index: `/configuration/t/row[3]` → `3`.
#[must_use]
pub fn line_index(path: &str) -> &str {
    PATH_INDEX
        .captures(path)
        .and_then(|c| c.get(1))
        .map_or("", |m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = r#"<configuration>
  <forward_down_band>
    <spot id="7" gw="2">
      <plan>plan.xml</plan>
      <carriers>
        <carrier id="1" trace="trace.txt"/>
        <carrier id="2" trace="trace.txt"/>
      </carriers>
    </spot>
    <spot id="3">
      <plan>plan.xml</plan>
    </spot>
  </forward_down_band>
  <global>
    <plan>plan.xml</plan>
  </global>
</configuration>"#;

    fn node(doc: &Document, path: &str) -> NodeId {
        doc.resolve_one(path).unwrap()
    }

    #[test]
    fn appends_spot_and_gateway() {
        let doc = Document::parse(XML).unwrap();
        let plan = node(&doc, "/configuration/forward_down_band/spot[@id='7']/plan");
        let adapted = adapt_filename(&doc, "plan.xml", plan, None);
        assert_eq!(adapted, "plan_spot7_gw2.xml");
        assert_eq!(adapt_filename(&doc, &adapted, plan, None), adapted);
    }

    #[test]
    fn spot_without_gateway_and_no_spot() {
        let doc = Document::parse(XML).unwrap();
        let plan = node(&doc, "/configuration/forward_down_band/spot[@id='3']/plan");
        assert_eq!(adapt_filename(&doc, "plan.xml", plan, None), "plan_spot3.xml");
        let global = node(&doc, "/configuration/global/plan");
        assert_eq!(adapt_filename(&doc, "plan_spot3.xml", global, None), "plan.xml");
    }

    #[test]
    fn rows_use_the_grandparent_and_line() {
        let doc = Document::parse(XML).unwrap();
        let row = node(&doc, "//carrier[@id='2']");
        let line = line_index(&doc.get_path(row)).to_string();
        assert_eq!(line, "2");
        let adapted = adapt_filename(&doc, "trace.txt", row, Some(&line));
        assert_eq!(adapted, "trace_spot7_gw2_2.txt");
        assert_eq!(adapt_filename(&doc, &adapted, row, Some(&line)), adapted);
        assert_eq!(adapt_filename(&doc, "trace.txt", row, Some("")), "trace_spot7_gw2.txt");
    }

    #[test]
    fn names_without_extension() {
        let doc = Document::parse(XML).unwrap();
        let plan = node(&doc, "/configuration/forward_down_band/spot[@id='7']/plan");
        assert_eq!(adapt_filename(&doc, "plan_4", plan, None), "plan_spot7_gw2");
    }

    #[test]
    fn line_index_reads_the_last_step_only() {
        assert_eq!(line_index("/configuration/t/row[3]"), "3");
        assert_eq!(line_index("/configuration/t[2]/row"), "");
    }
}
