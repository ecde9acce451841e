//! Build a [`Document`] from XML text using quick-xml.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

use super::{Document, NodeId};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("xml: {0}")]
    Xml(String),
    #[error("document has no root element")]
    NoRoot,
    #[error("document has more than one root element ('{0}')")]
    MultipleRoots(String),
}

/// Parse a complete document. Whitespace-only text is dropped and the
/// remaining text is trimmed; comments inside the root element are kept.
pub fn parse_document(xml: &str) -> Result<Document, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut doc: Option<Document> = None;
    let mut encoding: Option<String> = None;
    let mut stack: Vec<NodeId> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Decl(ref d)) => {
                encoding = d
                    .encoding()
                    .and_then(Result::ok)
                    .map(|e| String::from_utf8_lossy(&e).into_owned());
            }
            Ok(Event::Start(ref e)) => {
                let id = open_element(&mut doc, &stack, e)?;
                stack.push(id);
            }
            Ok(Event::Empty(ref e)) => {
                open_element(&mut doc, &stack, e)?;
            }
            Ok(Event::End(_)) => {
                stack.pop();
            }
            Ok(Event::Text(ref t)) => {
                if let (Some(doc), Some(&current)) = (doc.as_mut(), stack.last()) {
                    let text = t.unescape().map_err(|err| ParseError::Xml(err.to_string()))?;
                    append_text(doc, current, &text);
                }
            }
            Ok(Event::CData(ref c)) => {
                if let (Some(doc), Some(&current)) = (doc.as_mut(), stack.last()) {
                    append_text(doc, current, &String::from_utf8_lossy(c));
                }
            }
            Ok(Event::Comment(ref c)) => {
                // comments outside the root element are not kept
                if let (Some(doc), Some(&current)) = (doc.as_mut(), stack.last()) {
                    let comment = doc.new_comment(String::from_utf8_lossy(c).trim());
                    doc.append_child(current, comment);
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                return Err(ParseError::Xml(format!(
                    "at position {}: {err}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(ParseError::Xml("unexpected end of document".into()));
    }
    let mut doc = doc.ok_or(ParseError::NoRoot)?;
    doc.set_encoding(encoding);
    let root = doc.root();
    doc.classify(root);
    Ok(doc)
}

fn open_element(
    doc: &mut Option<Document>,
    stack: &[NodeId],
    start: &BytesStart<'_>,
) -> Result<NodeId, ParseError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let attributes = read_attributes(start)?;

    match (doc.as_mut(), stack.last()) {
        (None, _) => {
            let mut created = Document::new(&name);
            let root = created.root();
            for (key, value) in &attributes {
                created.set_attribute(root, key, value);
            }
            *doc = Some(created);
            Ok(root)
        }
        (Some(doc), Some(&parent)) => {
            let id = doc.new_element(&name, attributes, None);
            doc.append_child(parent, id);
            Ok(id)
        }
        (Some(_), None) => Err(ParseError::MultipleRoots(name)),
    }
}

fn read_attributes(start: &BytesStart<'_>) -> Result<Vec<(String, String)>, ParseError> {
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|err| ParseError::Xml(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| ParseError::Xml(err.to_string()))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(attributes)
}

fn append_text(doc: &mut Document, id: NodeId, text: &str) {
    let merged = match doc.node(id).text() {
        Some(existing) if !existing.is_empty() => format!("{existing} {text}"),
        _ => text.to_string(),
    };
    doc.set_text(id, &merged);
}
