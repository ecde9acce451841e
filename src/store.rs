//! The configuration store: a document bound to its file and schema.
//!
//! [`XmlConfig`] loads a configuration file and its schema, validates the
//! document, and exposes path-addressed reads and structural mutations.
//! Mutations only touch the in-memory tree; [`XmlConfig::write`] validates
//! the whole document before anything reaches the disk, and reloads from
//! disk when validation fails so the store never keeps an invalid tree.
//!
//! The on-disk version is a SHA-256 digest of the file bytes, used to warn
//! when the file changed underneath the store before it is overwritten.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::XmlConfError;
use crate::filename::{adapt_filename, line_index};
use crate::path::PathExpr;
use crate::schema::{DeclKind, SchemaIntrospector};
use crate::tree::{Document, NodeId, NodeKind, XmlElement};

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigVersion {
    Hash(String),
}

/// One occurrence of a file-typed element or attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReference {
    /// Node path; attributes are addressed as `<row path>/@<name>`.
    pub path: String,
    /// Schema default for the file, if documented.
    pub default: Option<String>,
    /// Source filename adapted to the node's spot/gateway/line.
    pub source: Option<String>,
}

#[derive(Debug)]
pub struct XmlConfig {
    path: PathBuf,
    schema_path: PathBuf,
    doc: Document,
    /// The document as last loaded, restored when a write cannot reach the disk.
    loaded: Document,
    schema: SchemaIntrospector,
    version: ConfigVersion,
}

#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

fn read_content(path: &Path) -> Result<String, XmlConfError> {
    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            XmlConfError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            XmlConfError::Io(e)
        }
    })
}

impl XmlConfig {
    /// Load a configuration file and its schema, then validate the document.
    pub fn open(xml: impl AsRef<Path>, xsd: impl AsRef<Path>) -> Result<Self, XmlConfError> {
        let path = xml.as_ref().to_path_buf();
        let schema_path = xsd.as_ref().to_path_buf();
        let (doc, schema, version) = load(&path, &schema_path)?;
        tracing::debug!(
            config = %path.display(),
            schema = %schema_path.display(),
            "configuration loaded"
        );
        Ok(Self {
            path,
            schema_path,
            loaded: doc.clone(),
            doc,
            schema,
            version,
        })
    }

    /// Replace the in-memory state with what is on disk. Node handles taken
    /// before a reload are invalid afterwards.
    pub fn reload(&mut self) -> Result<(), XmlConfError> {
        let (doc, schema, version) = load(&self.path, &self.schema_path)?;
        self.loaded = doc.clone();
        self.doc = doc;
        self.schema = schema;
        self.version = version;
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn schema_path(&self) -> &Path {
        &self.schema_path
    }

    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.doc
    }

    pub(crate) fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    #[must_use]
    pub const fn schema(&self) -> &SchemaIntrospector {
        &self.schema
    }

    /// Digest of the file as it was when last loaded.
    #[must_use]
    pub const fn version(&self) -> &ConfigVersion {
        &self.version
    }

    pub fn has_changed_on_disk(&self) -> Result<bool, XmlConfError> {
        let content = read_content(&self.path)?;
        Ok(self.version != ConfigVersion::Hash(sha256_hex(content.as_bytes())))
    }

    /// Validate the in-memory document without writing it.
    pub fn validate(&self) -> Result<(), XmlConfError> {
        self.schema
            .validate(&self.doc)
            .map_err(|errors| XmlConfError::Validation { errors })
    }

    /// Validate, then write the document with its declared encoding and reload.
    /// An invalid document is discarded: the store reloads from disk and the
    /// diagnostics are returned. The file is replaced atomically; when that
    /// fails the document reverts to its last loaded state.
    pub fn write(&mut self) -> Result<(), XmlConfError> {
        if let Err(errors) = self.schema.validate(&self.doc) {
            tracing::warn!(
                config = %self.path.display(),
                errors = errors.len(),
                "modified configuration is invalid, reloading from disk"
            );
            self.reload()?;
            return Err(XmlConfError::Validation { errors });
        }

        match self.has_changed_on_disk() {
            Ok(true) => tracing::warn!(
                config = %self.path.display(),
                "file changed on disk since it was loaded, overwriting"
            ),
            Ok(false) => {}
            Err(err) => tracing::warn!(
                config = %self.path.display(),
                error = %err,
                "cannot compare with the file on disk"
            ),
        }

        if let Err(err) = self.replace_file() {
            tracing::warn!(
                config = %self.path.display(),
                error = %err,
                "cannot write configuration, discarding changes"
            );
            if let Err(reload) = self.reload() {
                tracing::debug!(error = %reload, "reload failed, restoring last loaded document");
                self.doc = self.loaded.clone();
            }
            return Err(err);
        }
        tracing::info!(config = %self.path.display(), "configuration written");
        self.reload()
    }

    /// Write to a sibling temporary file, then rename it over the configuration.
    fn replace_file(&self) -> Result<(), XmlConfError> {
        let xml = self.doc.to_xml_string()?;
        let dir = self
            .path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        file.write_all(xml.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| XmlConfError::Io(e.error))?;
        Ok(())
    }

    /// Root-level sections, comments excluded.
    #[must_use]
    pub fn get_sections(&self) -> Vec<NodeId> {
        self.doc.elements(self.doc.root())
    }

    #[must_use]
    pub fn get_name(&self, node: NodeId) -> &str {
        self.doc.name(node)
    }

    /// Keys of a section, comments excluded.
    #[must_use]
    pub fn get_keys(&self, section: NodeId) -> Vec<NodeId> {
        self.doc.elements(section)
    }

    #[must_use]
    pub fn is_table(&self, key: NodeId) -> bool {
        self.doc.kind(key) == NodeKind::Table
    }

    /// Text of a scalar key.
    pub fn get_value(&self, key: NodeId) -> Result<Option<&str>, XmlConfError> {
        if self.is_table(key) {
            return Err(XmlConfError::invalid(format!(
                "'{}' is a table, it has no value",
                self.doc.get_path(key)
            )));
        }
        Ok(self.doc.node(key).text())
    }

    /// Rows of a table, comments excluded.
    #[must_use]
    pub fn get_table_elements(&self, table: NodeId) -> Vec<NodeId> {
        self.doc.elements(table)
    }

    /// Attributes of a row, in document order.
    #[must_use]
    pub fn get_element_content(&self, row: NodeId) -> &[(String, String)] {
        self.doc.node(row).attributes()
    }

    #[must_use]
    pub fn get_path(&self, node: NodeId) -> String {
        self.doc.get_path(node)
    }

    /// The node at `path` when exactly one matches.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<NodeId> {
        self.doc.resolve_optional(path)
    }

    pub fn get_all(&self, path: &str) -> Result<Vec<NodeId>, XmlConfError> {
        self.doc.resolve_many(path)
    }

    /// Set the text of a scalar key, or an existing attribute.
    ///
    /// Without `attribute`, `path` must match exactly one non-table element.
    /// With `attribute`, the first match is updated when several nodes
    /// match, and the attribute must already exist on it. A path ending in
    /// `/@name` stands for `attribute = Some("name")`.
    pub fn set_value(
        &mut self,
        value: &str,
        path: &str,
        attribute: Option<&str>,
    ) -> Result<(), XmlConfError> {
        let expr = PathExpr::parse(path)?;
        let matches = expr.select(&self.doc);
        let attribute = attribute.or_else(|| expr.attribute());

        let Some(attribute) = attribute else {
            let [target] = matches.as_slice() else {
                return Err(XmlConfError::Path {
                    path: path.to_string(),
                    found: matches.len(),
                });
            };
            if self.doc.kind(*target) == NodeKind::Comment
                || self.is_table(*target)
                || !self.doc.elements(*target).is_empty()
            {
                return Err(XmlConfError::invalid(format!(
                    "'{path}' is not a scalar key"
                )));
            }
            tracing::debug!(path, value, "set value");
            self.doc.set_text(*target, value);
            return Ok(());
        };

        let target = match matches.as_slice() {
            [] => {
                return Err(XmlConfError::Path {
                    path: path.to_string(),
                    found: 0,
                })
            }
            [one] => *one,
            [first, ..] => {
                tracing::debug!(
                    path,
                    found = matches.len(),
                    "several nodes match, updating the first one"
                );
                *first
            }
        };
        if self.doc.attribute(target, attribute).is_none() {
            return Err(XmlConfError::invalid(format!(
                "'{}' has no attribute '{attribute}'",
                self.doc.get_path(target)
            )));
        }
        tracing::debug!(path, attribute, value, "set attribute");
        self.doc.set_attribute(target, attribute, value);
        Ok(())
    }

    /// Set an existing attribute on every node matching `path`. Nothing is
    /// changed unless every match carries the attribute. Returns the number
    /// of updated nodes.
    pub fn set_values(
        &mut self,
        value: &str,
        path: &str,
        attribute: &str,
    ) -> Result<usize, XmlConfError> {
        let matches = self.doc.resolve_many(path)?;
        if matches.is_empty() {
            return Err(XmlConfError::Path {
                path: path.to_string(),
                found: 0,
            });
        }
        if let Some(missing) = matches
            .iter()
            .find(|id| self.doc.attribute(**id, attribute).is_none())
        {
            return Err(XmlConfError::invalid(format!(
                "'{}' has no attribute '{attribute}'",
                self.doc.get_path(*missing)
            )));
        }
        for id in &matches {
            self.doc.set_attribute(*id, attribute, value);
        }
        tracing::debug!(path, attribute, value, updated = matches.len(), "set values");
        Ok(matches.len())
    }

    /// Insert a copy of `element` into the parent of `path`, at `position`
    /// among the parent's children (clamped).
    pub fn add_element(
        &mut self,
        path: &str,
        element: &XmlElement,
        position: usize,
    ) -> Result<NodeId, XmlConfError> {
        if PathExpr::parse(path)?.is_attribute() {
            return Err(XmlConfError::invalid(format!(
                "cannot insert an element at attribute path '{path}'"
            )));
        }
        let parent_path = parent_path(path).ok_or_else(|| {
            XmlConfError::invalid(format!("'{path}' has no parent element to insert into"))
        })?;
        let parent = self.doc.resolve_one(parent_path)?;
        let id = self.doc.insert_fragment(parent, position, element);
        tracing::debug!(parent = parent_path, element = %element.name, position, "element added");
        Ok(id)
    }

    /// Delete the single node matching `path`.
    pub fn del_element(&mut self, path: &str) -> Result<(), XmlConfError> {
        let id = self.doc.resolve_one(path)?;
        if id == self.doc.root() {
            return Err(XmlConfError::invalid("the root element cannot be deleted"));
        }
        self.doc.detach(id);
        tracing::debug!(path, "element deleted");
        Ok(())
    }

    /// Append a copy of the table's first row.
    pub fn add_line(&mut self, table_path: &str) -> Result<NodeId, XmlConfError> {
        let table = self.doc.resolve_one(table_path)?;
        let first = self
            .doc
            .elements(table)
            .first()
            .copied()
            .ok_or_else(|| {
                XmlConfError::invalid(format!("table '{table_path}' has no row to copy"))
            })?;
        let copy = self.doc.clone_subtree(first);
        self.doc.append_child(table, copy);
        tracing::debug!(table = table_path, "line added");
        Ok(copy)
    }

    /// Append a new `tag` row carrying exactly `attributes`.
    pub fn create_line(
        &mut self,
        attributes: Vec<(String, String)>,
        tag: &str,
        table_path: &str,
    ) -> Result<NodeId, XmlConfError> {
        let table = self.doc.resolve_one(table_path)?;
        let row = XmlElement {
            name: tag.to_string(),
            attributes,
            ..XmlElement::default()
        };
        let id = self.doc.insert_fragment(table, usize::MAX, &row);
        tracing::debug!(table = table_path, tag, "line created");
        Ok(id)
    }

    /// Remove the row at `index` (0-based, comments not counted).
    pub fn remove_line(&mut self, table_path: &str, index: usize) -> Result<(), XmlConfError> {
        let table = self.doc.resolve_one(table_path)?;
        let rows = self.doc.elements(table);
        if rows.is_empty() {
            return Err(XmlConfError::invalid(format!(
                "table '{table_path}' has no row to remove"
            )));
        }
        let row = rows.get(index).copied().ok_or_else(|| {
            XmlConfError::invalid(format!(
                "table '{table_path}' has {} rows, cannot remove row {index}",
                rows.len()
            ))
        })?;
        self.doc.detach(row);
        tracing::debug!(table = table_path, index, "line removed");
        Ok(())
    }

    /// Every occurrence of a file-typed element or attribute, with its
    /// documented default and adapted source filename.
    #[must_use]
    pub fn get_file_paths(&self) -> Vec<FileReference> {
        let doc = &self.doc;
        let all = doc.descendants(doc.root());
        let mut files = Vec::new();

        for name in self.schema.get_file_elements(DeclKind::Element) {
            for id in all.iter().copied().filter(|id| doc.name(*id) == name) {
                let source = self
                    .schema
                    .get_file_source(&name, None)
                    .map(|source| adapt_filename(doc, &source, id, None));
                files.push(FileReference {
                    path: doc.get_path(id),
                    default: self.schema.get_default(&name, None),
                    source,
                });
            }
        }

        for name in self.schema.get_file_elements(DeclKind::Attribute) {
            for id in all
                .iter()
                .copied()
                .filter(|id| doc.attribute(*id, &name).is_some())
            {
                let owner = doc.name(id);
                let path = doc.get_path(id);
                let line = line_index(&path);
                let source = self
                    .schema
                    .get_file_source(&name, Some(owner))
                    .map(|source| adapt_filename(doc, &source, id, Some(line)));
                files.push(FileReference {
                    path: format!("{path}/@{name}"),
                    default: self.schema.get_default(&name, Some(owner)),
                    source,
                });
            }
        }
        files
    }

    /// Adapted source filename of every file reference, keyed by node path.
    #[must_use]
    pub fn get_file_sources(&self) -> BTreeMap<String, String> {
        self.get_file_paths()
            .into_iter()
            .filter_map(|file| file.source.map(|source| (file.path, source)))
            .collect()
    }

    /// Tree as JSON: attributes become `@name` keys, text `#text` (or the
    /// value itself for plain keys), repeated children arrays.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let root = self.doc.root();
        let mut map = Map::new();
        map.insert(self.doc.name(root).to_string(), element_json(&self.doc, root));
        Value::Object(map)
    }
}

fn load(
    path: &Path,
    schema_path: &Path,
) -> Result<(Document, SchemaIntrospector, ConfigVersion), XmlConfError> {
    let content = read_content(path)?;
    let doc = Document::parse(&content).map_err(|e| XmlConfError::load(path, e))?;
    let schema = SchemaIntrospector::load(schema_path)?;
    schema
        .validate(&doc)
        .map_err(|errors| XmlConfError::Validation { errors })?;
    let version = ConfigVersion::Hash(sha256_hex(content.as_bytes()));
    Ok((doc, schema, version))
}

/// Path of the parent of the last step, ignoring `/` inside predicates.
fn parent_path(path: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut quote = None;
    let mut last = None;
    for (i, c) in path.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, '/') if depth == 0 => last = Some(i),
            _ => {}
        }
    }
    let cut = last?;
    // `a//b` has no single parent step
    if cut == 0 || path[..cut].ends_with('/') {
        return None;
    }
    Some(&path[..cut])
}

fn element_json(doc: &Document, id: NodeId) -> Value {
    let node = doc.node(id);
    let text = node.text().filter(|t| !t.is_empty());
    let children = doc.elements(id);
    if children.is_empty() && node.attributes().is_empty() {
        return Value::String(text.unwrap_or_default().to_string());
    }

    let mut map = Map::new();
    for (key, value) in node.attributes() {
        map.insert(format!("@{key}"), Value::String(value.clone()));
    }
    if let Some(text) = text {
        map.insert("#text".into(), Value::String(text.to_string()));
    }
    for child in children {
        let value = element_json(doc, child);
        match map.get_mut(doc.name(child)) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(doc.name(child).to_string(), value);
            }
        }
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_path_skips_predicates() {
        assert_eq!(
            parent_path("/configuration/global/delay"),
            Some("/configuration/global")
        );
        assert_eq!(
            parent_path("/configuration/spot[@name='a/b']/x"),
            Some("/configuration/spot[@name='a/b']")
        );
        assert_eq!(parent_path("/configuration"), None);
        assert_eq!(parent_path("/configuration//spot"), None);
    }

    #[test]
    fn json_export_groups_repeated_children() {
        let doc = Document::parse(
            r#"<configuration component="st">
  <global><delay>250</delay>
    <carriers><carrier id="1"/><carrier id="2"/></carriers>
  </global>
</configuration>"#,
        )
        .unwrap();
        let json = element_json(&doc, doc.root());
        assert_eq!(
            json,
            serde_json::json!({
                "@component": "st",
                "global": {
                    "delay": "250",
                    "carriers": {"carrier": [{"@id": "1"}, {"@id": "2"}]}
                }
            })
        );
    }

    #[test]
    fn digest_is_lowercase_hex() {
        let digest = sha256_hex(b"abc");
        assert_eq!(digest.len(), 64);
        assert!(digest.starts_with("ba7816bf"));
    }
}
