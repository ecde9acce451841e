//! Pretty serialization of a [`Document`] using quick-xml's indenting writer.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::{Document, NodeId, NodeKind};

const DEFAULT_ENCODING: &str = "UTF-8";

/// Serialize the document with an XML declaration carrying the declared
/// encoding (UTF-8 when none was declared) and two-space indentation.
pub fn to_xml_string(doc: &Document) -> std::io::Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    let encoding = doc.encoding().unwrap_or(DEFAULT_ENCODING);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some(encoding), None)))
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    write_node(&mut writer, doc, doc.root())?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    String::from_utf8(bytes).map_err(|e| std::io::Error::other(e.to_string()))
}

fn write_node(writer: &mut Writer<Vec<u8>>, doc: &Document, id: NodeId) -> std::io::Result<()> {
    let node = doc.node(id);
    if node.kind() == NodeKind::Comment {
        let text = format!(" {} ", node.text().unwrap_or_default());
        return emit(writer, Event::Comment(BytesText::from_escaped(text.as_str())));
    }

    let mut start = BytesStart::new(node.name());
    for (key, value) in node.attributes() {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    let text = node.text().filter(|t| !t.is_empty());
    let children = doc.children(id);

    if children.is_empty() && text.is_none() {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    if let Some(text) = text {
        emit(writer, Event::Text(BytesText::new(text)))?;
    }
    for child in children {
        write_node(writer, doc, *child)?;
    }
    emit(writer, Event::End(BytesEnd::new(node.name())))
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> std::io::Result<()> {
    writer
        .write_event(event)
        .map_err(|e| std::io::Error::other(e.to_string()))
}

#[cfg(test)]
mod tests {
    use crate::tree::Document;

    const SOURCE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<configuration component="st">
  <!-- physical layer -->
  <physical>
    <delay>250</delay>
    <modcods>
      <modcod id="1" name="QPSK &lt;1/2&gt;"/>
      <modcod id="2" name="8PSK"/>
    </modcods>
  </physical>
</configuration>
"#;

    #[test]
    fn output_is_indented_and_declares_encoding() {
        let doc = Document::parse(SOURCE).unwrap();
        let xml = doc.to_xml_string().unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<configuration"));
        assert!(xml.contains("\n    <delay>250</delay>\n"));
        assert!(xml.contains("<modcod id=\"1\" name=\"QPSK &lt;1/2&gt;\"/>"));
        assert!(xml.contains("<!-- physical layer -->"));
        assert!(xml.ends_with("</configuration>\n"));
    }

    #[test]
    fn reparsing_output_yields_the_same_tree() {
        let doc = Document::parse(SOURCE).unwrap();
        let again = Document::parse(&doc.to_xml_string().unwrap()).unwrap();
        assert_eq!(doc.to_fragment(doc.root()), again.to_fragment(again.root()));
        assert_eq!(doc.to_xml_string().unwrap(), again.to_xml_string().unwrap());
    }
}
