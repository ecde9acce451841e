//! Spot and gateway dimensions.
//!
//! Sections hold `spot` rows identified by `id` (and `gw` when the spot is
//! served by a gateway) and `gw` rows identified by `id`. Adding a spot or
//! a gateway clones existing rows so every (gateway, spot) combination the
//! section covers gets its own row, inserted right after its source row.
//!
//! Rows are walked over a snapshot of the section, so clones are never
//! revisited, and a clone is skipped when the section already holds a row
//! with the same identity. Calling an add operation twice is the same as
//! calling it once.

use crate::error::XmlConfError;
use crate::store::XmlConfig;
use crate::tree::{Document, NodeId};

pub const SPOT_TAG: &str = "spot";
pub const GW_TAG: &str = "gw";
pub const ID_ATTR: &str = "id";
pub const GW_ATTR: &str = "gw";

fn is_spot(doc: &Document, id: NodeId) -> bool {
    doc.name(id) == SPOT_TAG
}

fn is_gw(doc: &Document, id: NodeId) -> bool {
    doc.name(id) == GW_TAG
}

/// Whether `section` already has a spot row `(gw, spot_id)`.
fn has_spot(doc: &Document, section: NodeId, gw: Option<&str>, spot_id: &str) -> bool {
    doc.elements(section).into_iter().any(|row| {
        is_spot(doc, row)
            && doc.attribute(row, ID_ATTR) == Some(spot_id)
            && doc.attribute(row, GW_ATTR) == gw
    })
}

fn has_gw(doc: &Document, section: NodeId, gw_id: &str) -> bool {
    doc.elements(section)
        .into_iter()
        .any(|row| is_gw(doc, row) && doc.attribute(row, ID_ATTR) == Some(gw_id))
}

/// Clone `row` right after itself with `attribute` set to `value`.
fn clone_after(doc: &mut Document, row: NodeId, attribute: &str, value: &str) -> NodeId {
    let copy = doc.clone_subtree(row);
    doc.set_attribute(copy, attribute, value);
    doc.insert_after(row, copy);
    copy
}

/// Add `spot_id` to one section. Returns the number of rows created.
pub(crate) fn add_spot_in(doc: &mut Document, section: NodeId, spot_id: &str) -> usize {
    let mut gws: Vec<String> = Vec::new();
    let mut spots: Vec<String> = vec![spot_id.to_string()];
    let mut added = 0;

    for row in doc.elements(section) {
        if !is_spot(doc, row) {
            continue;
        }
        let id = doc.attribute(row, ID_ATTR).map(str::to_string);
        let Some(gw) = doc.attribute(row, GW_ATTR).map(str::to_string) else {
            // gateway-less spots: one copy of the first row is enough
            if !has_spot(doc, section, None, spot_id) {
                clone_after(doc, row, ID_ATTR, spot_id);
                added += 1;
            }
            break;
        };

        let spot_seen = id.as_ref().is_some_and(|id| spots.contains(id));
        if gws.contains(&gw) {
            if spot_seen {
                break;
            }
            spots.extend(id);
            continue;
        }
        gws.push(gw.clone());
        spots.extend(id);

        if !has_spot(doc, section, Some(&gw), spot_id) {
            clone_after(doc, row, ID_ATTR, spot_id);
            added += 1;
        }
    }
    added
}

/// Add `gw_id` to one section. Returns the number of rows created.
pub(crate) fn add_gw_in(doc: &mut Document, section: NodeId, gw_id: &str) -> usize {
    let mut gws: Vec<String> = vec![gw_id.to_string()];
    let mut spots: Vec<String> = Vec::new();
    let mut added = 0;

    for row in doc.elements(section) {
        if is_spot(doc, row) {
            let (Some(gw), Some(id)) = (
                doc.attribute(row, GW_ATTR).map(str::to_string),
                doc.attribute(row, ID_ATTR).map(str::to_string),
            ) else {
                continue;
            };
            if (gws.contains(&gw) && spots.contains(&id)) || gw == gw_id {
                break;
            }
            if !gws.contains(&gw) && spots.contains(&id) {
                gws.push(gw);
                continue;
            }
            if !has_spot(doc, section, Some(gw_id), &id) {
                clone_after(doc, row, GW_ATTR, gw_id);
                added += 1;
            }
            spots.push(id);
        } else if is_gw(doc, row) {
            let Some(id) = doc.attribute(row, ID_ATTR) else {
                continue;
            };
            if id == gw_id {
                break;
            }
            if !has_gw(doc, section, gw_id) {
                clone_after(doc, row, ID_ATTR, gw_id);
                added += 1;
            }
        }
    }
    added
}

/// Detach the direct children of `section` matching `predicate`.
fn remove_rows(
    doc: &mut Document,
    section: NodeId,
    predicate: impl Fn(&Document, NodeId) -> bool,
) -> usize {
    let view: &Document = doc;
    let doomed: Vec<NodeId> = view
        .elements(section)
        .into_iter()
        .filter(|row| predicate(view, *row))
        .collect();
    for row in &doomed {
        doc.detach(*row);
    }
    doomed.len()
}

fn spot_matches(spot_id: &str) -> impl Fn(&Document, NodeId) -> bool + '_ {
    move |doc: &Document, row: NodeId| {
        is_spot(doc, row) && doc.attribute(row, ID_ATTR) == Some(spot_id)
    }
}

fn gw_matches(gw_id: &str) -> impl Fn(&Document, NodeId) -> bool + '_ {
    move |doc: &Document, row: NodeId| {
        (is_spot(doc, row) && doc.attribute(row, GW_ATTR) == Some(gw_id))
            || (is_gw(doc, row) && doc.attribute(row, ID_ATTR) == Some(gw_id))
    }
}

impl XmlConfig {
    /// Replicate spot rows for `spot_id` in every section.
    pub fn add_spot(&mut self, spot_id: &str) -> usize {
        let sections = self.get_sections();
        let doc = self.document_mut();
        let added: usize = sections
            .into_iter()
            .map(|section| add_spot_in(doc, section, spot_id))
            .sum();
        tracing::debug!(spot = spot_id, added, "spot added");
        added
    }

    /// Remove every spot row with id `spot_id`.
    pub fn remove_spot(&mut self, spot_id: &str) -> usize {
        let sections = self.get_sections();
        let doc = self.document_mut();
        let removed: usize = sections
            .into_iter()
            .map(|section| remove_rows(doc, section, spot_matches(spot_id)))
            .sum();
        tracing::debug!(spot = spot_id, removed, "spot removed");
        removed
    }

    /// Replicate spot and gateway rows for `gw_id` in every section.
    pub fn add_gw(&mut self, gw_id: &str) -> usize {
        let sections = self.get_sections();
        let doc = self.document_mut();
        let added: usize = sections
            .into_iter()
            .map(|section| add_gw_in(doc, section, gw_id))
            .sum();
        tracing::debug!(gw = gw_id, added, "gateway added");
        added
    }

    /// [`add_gw`](Self::add_gw) restricted to the section at `section_path`.
    pub fn add_gw_in(&mut self, section_path: &str, gw_id: &str) -> Result<usize, XmlConfError> {
        let section = self.document().resolve_one(section_path)?;
        let added = add_gw_in(self.document_mut(), section, gw_id);
        tracing::debug!(section = section_path, gw = gw_id, added, "gateway added");
        Ok(added)
    }

    /// Remove every row served by or describing gateway `gw_id`.
    pub fn remove_gw(&mut self, gw_id: &str) -> usize {
        let sections = self.get_sections();
        let doc = self.document_mut();
        let removed: usize = sections
            .into_iter()
            .map(|section| remove_rows(doc, section, gw_matches(gw_id)))
            .sum();
        tracing::debug!(gw = gw_id, removed, "gateway removed");
        removed
    }

    pub fn remove_gw_in(&mut self, section_path: &str, gw_id: &str) -> Result<usize, XmlConfError> {
        let section = self.document().resolve_one(section_path)?;
        let removed = remove_rows(self.document_mut(), section, gw_matches(gw_id));
        tracing::debug!(section = section_path, gw = gw_id, removed, "gateway removed");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(xml: &str) -> (Document, NodeId) {
        let doc = Document::parse(&format!("<configuration><band>{xml}</band></configuration>"))
            .unwrap();
        let section = doc.elements(doc.root())[0];
        (doc, section)
    }

    /// `(gw, id)` of every spot row, `("gw", id)` for gateway rows.
    fn rows(doc: &Document, section: NodeId) -> Vec<(String, String)> {
        doc.elements(section)
            .into_iter()
            .map(|row| {
                let id = doc.attribute(row, ID_ATTR).unwrap_or_default().to_string();
                if is_gw(doc, row) {
                    ("gw".to_string(), id)
                } else {
                    (doc.attribute(row, GW_ATTR).unwrap_or("-").to_string(), id)
                }
            })
            .collect()
    }

    fn pairs(expected: &[(&str, &str)]) -> Vec<(String, String)> {
        expected
            .iter()
            .map(|(a, b)| ((*a).to_string(), (*b).to_string()))
            .collect()
    }

    #[test]
    fn new_spot_follows_its_source_row() {
        let (mut doc, band) = section(r#"<spot id="10" gw="1"><bw>5</bw></spot>"#);
        assert_eq!(add_spot_in(&mut doc, band, "11"), 1);
        assert_eq!(rows(&doc, band), pairs(&[("1", "10"), ("1", "11")]));
        let copy = doc.elements(band)[1];
        assert_eq!(doc.node(doc.elements(copy)[0]).text(), Some("5"));
    }

    #[test]
    fn add_spot_covers_every_gateway_once() {
        let (mut doc, band) = section(
            r#"<spot id="1" gw="0"/><spot id="2" gw="0"/><spot id="1" gw="1"/><spot id="2" gw="1"/>"#,
        );
        assert_eq!(add_spot_in(&mut doc, band, "3"), 2);
        assert_eq!(
            rows(&doc, band),
            pairs(&[
                ("0", "1"),
                ("0", "3"),
                ("0", "2"),
                ("1", "1"),
                ("1", "3"),
                ("1", "2"),
            ])
        );
    }

    #[test]
    fn add_spot_is_idempotent() {
        let (mut doc, band) = section(r#"<spot id="1" gw="0"/><spot id="1" gw="1"/>"#);
        add_spot_in(&mut doc, band, "2");
        let once = rows(&doc, band);
        assert_eq!(add_spot_in(&mut doc, band, "2"), 0);
        assert_eq!(rows(&doc, band), once);
    }

    #[test]
    fn gateway_less_spots_copy_the_first_row() {
        let (mut doc, band) = section(r#"<spot id="1"/><spot id="2"/>"#);
        assert_eq!(add_spot_in(&mut doc, band, "3"), 1);
        assert_eq!(rows(&doc, band), pairs(&[("-", "1"), ("-", "3"), ("-", "2")]));
        assert_eq!(add_spot_in(&mut doc, band, "3"), 0);
    }

    #[test]
    fn add_gw_clones_spot_and_gateway_rows() {
        let (mut doc, band) = section(r#"<gw id="0"/><spot id="1" gw="0"/><spot id="2" gw="0"/>"#);
        assert_eq!(add_gw_in(&mut doc, band, "1"), 3);
        assert_eq!(
            rows(&doc, band),
            pairs(&[
                ("gw", "0"),
                ("gw", "1"),
                ("0", "1"),
                ("1", "1"),
                ("0", "2"),
                ("1", "2"),
            ])
        );
        assert_eq!(add_gw_in(&mut doc, band, "1"), 0);
    }

    #[test]
    fn removal_targets_matching_rows_only() {
        let (mut doc, band) = section(
            r#"<gw id="0"/><gw id="1"/><spot id="1" gw="0"/><spot id="1" gw="1"/><spot id="2" gw="1"/>"#,
        );
        assert_eq!(remove_rows(&mut doc, band, gw_matches("1")), 3);
        assert_eq!(rows(&doc, band), pairs(&[("gw", "0"), ("0", "1")]));
        assert_eq!(remove_rows(&mut doc, band, spot_matches("1")), 1);
        assert_eq!(rows(&doc, band), pairs(&[("gw", "0")]));
    }
}
