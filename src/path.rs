//! XPath-style path expressions over a [`Document`].
//!
//! Supported syntax is the subset configuration tooling relies on:
//!
//! - absolute steps `/configuration/global/delay` and descendant steps `//spot`
//! - the wildcard `*` and `comment()` name tests
//! - predicates `[2]`, `[last()]`, `[@id]`, `[@id='1']` (chainable)
//! - a trailing attribute selector `/@name`
//!
//! Paths are parsed once into a [`PathExpr`] and evaluated against arena
//! handles. An attribute path selects the elements that carry the attribute.

use std::collections::{HashMap, HashSet};

use crate::error::XmlConfError;
use crate::tree::{Document, NodeId, NodeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NameTest {
    Any,
    Comment,
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    Position(usize),
    Last,
    HasAttribute(String),
    AttributeEquals(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    test: NameTest,
    predicates: Vec<Predicate>,
}

/// A parsed path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    steps: Vec<Step>,
    attribute: Option<(Axis, String)>,
}

impl PathExpr {
    pub fn parse(path: &str) -> Result<Self, XmlConfError> {
        Parser::new(path).parse()
    }

    /// Whether the expression ends in an `@attribute` selector.
    #[must_use]
    pub fn is_attribute(&self) -> bool {
        self.attribute.is_some()
    }

    #[must_use]
    pub fn attribute(&self) -> Option<&str> {
        self.attribute.as_ref().map(|(_, name)| name.as_str())
    }

    /// Evaluate against `doc`, returning matches in document order.
    #[must_use]
    pub fn select(&self, doc: &Document) -> Vec<NodeId> {
        // `None` stands for the document node above the root element.
        let mut context: Vec<Option<NodeId>> = vec![None];
        let mut reordered = false;

        for step in &self.steps {
            if step.axis == Axis::Descendant {
                context = descendant_or_self(doc, &context);
                reordered = true;
            }
            let mut next = Vec::new();
            for ctx in &context {
                let mut candidates: Vec<NodeId> = children_of(doc, *ctx)
                    .into_iter()
                    .filter(|c| matches_test(doc, *c, &step.test))
                    .collect();
                for predicate in &step.predicates {
                    candidates = apply_predicate(doc, candidates, predicate);
                }
                next.extend(candidates.into_iter().map(Some));
            }
            context = next;
        }

        if let Some((axis, name)) = &self.attribute {
            if *axis == Axis::Descendant {
                context = descendant_or_self(doc, &context);
                reordered = true;
            }
            context.retain(|c| c.is_some_and(|id| doc.attribute(id, name).is_some()));
        }

        let mut seen = HashSet::new();
        let mut out: Vec<NodeId> = context
            .into_iter()
            .flatten()
            .filter(|id| seen.insert(*id))
            .collect();
        if reordered {
            let order = document_order(doc);
            out.sort_by_key(|id| order.get(id).copied().unwrap_or(usize::MAX));
        }
        out
    }
}

impl Document {
    /// All nodes matching `path`. Zero matches is not an error.
    pub fn resolve_many(&self, path: &str) -> Result<Vec<NodeId>, XmlConfError> {
        Ok(PathExpr::parse(path)?.select(self))
    }

    /// The single node matching `path`; any other match count is a path error.
    pub fn resolve_one(&self, path: &str) -> Result<NodeId, XmlConfError> {
        let found = self.resolve_many(path)?;
        match found.as_slice() {
            [one] => Ok(*one),
            _ => Err(XmlConfError::Path {
                path: path.to_string(),
                found: found.len(),
            }),
        }
    }

    /// The single node matching `path`, or `None` for zero, several or an
    /// unparseable expression.
    #[must_use]
    pub fn resolve_optional(&self, path: &str) -> Option<NodeId> {
        match self.resolve_many(path) {
            Ok(found) if found.len() == 1 => found.first().copied(),
            Ok(_) => None,
            Err(err) => {
                tracing::debug!(path, error = %err, "unresolvable path");
                None
            }
        }
    }

    /// Canonical path of a node. A step carries a `[n]` index whenever its
    /// parent holds more than one element of the same name.
    #[must_use]
    pub fn get_path(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            segments.push(self.step_label(parent, current));
            current = parent;
        }
        segments.push(self.name(current).to_string());
        segments.reverse();
        format!("/{}", segments.join("/"))
    }

    fn step_label(&self, parent: NodeId, child: NodeId) -> String {
        let is_comment = self.kind(child) == NodeKind::Comment;
        let same: Vec<NodeId> = self
            .children(parent)
            .iter()
            .copied()
            .filter(|c| {
                if is_comment {
                    self.kind(*c) == NodeKind::Comment
                } else {
                    self.kind(*c) != NodeKind::Comment && self.name(*c) == self.name(child)
                }
            })
            .collect();
        let label = if is_comment {
            "comment()".to_string()
        } else {
            self.name(child).to_string()
        };
        if same.len() > 1 {
            let index = same.iter().position(|c| *c == child).unwrap_or(0) + 1;
            format!("{label}[{index}]")
        } else {
            label
        }
    }
}

fn children_of(doc: &Document, ctx: Option<NodeId>) -> Vec<NodeId> {
    match ctx {
        None => vec![doc.root()],
        Some(id) => doc.children(id).to_vec(),
    }
}

fn descendant_or_self(doc: &Document, context: &[Option<NodeId>]) -> Vec<Option<NodeId>> {
    let mut out = Vec::new();
    for ctx in context {
        out.push(*ctx);
        let start = ctx.unwrap_or_else(|| doc.root());
        // `descendants` yields the start node too, pushed above
        out.extend(
            doc.descendants(start)
                .into_iter()
                .filter(|d| Some(*d) != *ctx)
                .map(Some),
        );
    }
    out
}

fn matches_test(doc: &Document, id: NodeId, test: &NameTest) -> bool {
    let is_comment = doc.kind(id) == NodeKind::Comment;
    match test {
        NameTest::Any => !is_comment,
        NameTest::Comment => is_comment,
        NameTest::Name(name) => !is_comment && doc.name(id) == name,
    }
}

fn apply_predicate(doc: &Document, candidates: Vec<NodeId>, predicate: &Predicate) -> Vec<NodeId> {
    match predicate {
        Predicate::Position(n) => candidates.get(n - 1).copied().into_iter().collect(),
        Predicate::Last => candidates.last().copied().into_iter().collect(),
        Predicate::HasAttribute(name) => candidates
            .into_iter()
            .filter(|c| doc.attribute(*c, name).is_some())
            .collect(),
        Predicate::AttributeEquals(name, value) => candidates
            .into_iter()
            .filter(|c| doc.attribute(*c, name) == Some(value.as_str()))
            .collect(),
    }
}

fn document_order(doc: &Document) -> HashMap<NodeId, usize> {
    let mut order = HashMap::new();
    let mut stack = vec![doc.root()];
    while let Some(id) = stack.pop() {
        order.insert(id, order.len());
        stack.extend(doc.children(id).iter().rev().copied());
    }
    order
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.trim().chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> XmlConfError {
        XmlConfError::PathSyntax {
            path: self.source.to_string(),
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn parse(mut self) -> Result<PathExpr, XmlConfError> {
        if self.peek() != Some('/') {
            return Err(self.error("only absolute paths are supported"));
        }
        let mut steps = Vec::new();
        let mut attribute = None;

        while self.peek().is_some() {
            if !self.eat('/') {
                return Err(self.error(format!("expected '/' at offset {}", self.pos)));
            }
            let axis = if self.eat('/') {
                Axis::Descendant
            } else {
                Axis::Child
            };

            if self.eat('@') {
                let name = self.name()?;
                if self.peek().is_some() {
                    return Err(self.error("attribute selector must be the last step"));
                }
                attribute = Some((axis, name));
                break;
            }

            let test = if self.eat('*') {
                NameTest::Any
            } else {
                let name = self.name()?;
                if name == "comment" && self.eat('(') {
                    if !self.eat(')') {
                        return Err(self.error("expected ')' after 'comment('"));
                    }
                    NameTest::Comment
                } else {
                    NameTest::Name(name)
                }
            };

            let mut predicates = Vec::new();
            while self.eat('[') {
                predicates.push(self.predicate()?);
            }
            steps.push(Step {
                axis,
                test,
                predicates,
            });
        }

        if steps.is_empty() && attribute.is_none() {
            return Err(self.error("empty path"));
        }
        Ok(PathExpr { steps, attribute })
    }

    fn name(&mut self) -> Result<String, XmlConfError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error(format!("expected a name at offset {start}")));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn predicate(&mut self) -> Result<Predicate, XmlConfError> {
        self.skip_ws();
        let predicate = if self.eat('@') {
            let name = self.name()?;
            self.skip_ws();
            if self.eat('=') {
                self.skip_ws();
                let value = self.literal()?;
                Predicate::AttributeEquals(name, value)
            } else {
                Predicate::HasAttribute(name)
            }
        } else if self.peek().is_some_and(|c| c.is_ascii_digit()) {
            let start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
            }
            let digits: String = self.chars[start..self.pos].iter().collect();
            match digits.parse::<usize>() {
                Ok(n) if n >= 1 => Predicate::Position(n),
                _ => return Err(self.error(format!("invalid position '{digits}'"))),
            }
        } else {
            let name = self.name()?;
            if name == "last" && self.eat('(') && self.eat(')') {
                Predicate::Last
            } else {
                return Err(self.error(format!("unsupported predicate '{name}'")));
            }
        };
        self.skip_ws();
        if !self.eat(']') {
            return Err(self.error("expected ']'"));
        }
        Ok(predicate)
    }

    fn literal(&mut self) -> Result<String, XmlConfError> {
        let quote = match self.peek() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error("expected a quoted value")),
        };
        self.pos += 1;
        let start = self.pos;
        while self.peek().is_some_and(|c| c != quote) {
            self.pos += 1;
        }
        if !self.eat(quote) {
            return Err(self.error("unterminated quoted value"));
        }
        Ok(self.chars[start..self.pos - 1].iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<configuration component="sat">
  <global>
    <delay>250</delay>
    <carriers>
      <!-- template -->
      <carrier id="0" type="ctrl"/>
      <carrier id="1" type="data"/>
      <carrier id="2"/>
    </carriers>
  </global>
  <forward_band>
    <spot id="1" gw="0"><bandwidth>50</bandwidth></spot>
    <spot id="2" gw="0"><bandwidth>60</bandwidth></spot>
  </forward_band>
</configuration>"#;

    fn doc() -> Document {
        Document::parse(DOC).unwrap()
    }

    fn names(doc: &Document, ids: &[NodeId]) -> Vec<String> {
        ids.iter().map(|id| doc.get_path(*id)).collect()
    }

    #[test]
    fn absolute_path_resolves_one() {
        let doc = doc();
        let delay = doc.resolve_one("/configuration/global/delay").unwrap();
        assert_eq!(doc.node(delay).text(), Some("250"));
    }

    #[test]
    fn positional_predicates_count_elements_only() {
        let doc = doc();
        let second = doc
            .resolve_one("/configuration/global/carriers/carrier[2]")
            .unwrap();
        assert_eq!(doc.attribute(second, "id"), Some("1"));
        let last = doc
            .resolve_one("/configuration/global/carriers/carrier[last()]")
            .unwrap();
        assert_eq!(doc.attribute(last, "id"), Some("2"));
    }

    #[test]
    fn attribute_predicates_filter() {
        let doc = doc();
        let spot = doc
            .resolve_one("//forward_band/spot[@id='2'][@gw=\"0\"]/bandwidth")
            .unwrap();
        assert_eq!(doc.node(spot).text(), Some("60"));
        let typed = doc
            .resolve_many("/configuration/global/carriers/carrier[@type]")
            .unwrap();
        assert_eq!(typed.len(), 2);
    }

    #[test]
    fn descendant_steps_return_document_order() {
        let doc = doc();
        let found = doc.resolve_many("//bandwidth").unwrap();
        assert_eq!(
            names(&doc, &found),
            vec![
                "/configuration/forward_band/spot[1]/bandwidth",
                "/configuration/forward_band/spot[2]/bandwidth",
            ]
        );
        let all = doc.resolve_many("//*[@id]").unwrap();
        assert_eq!(all.len(), 5);
    }

    #[test]
    fn attribute_paths_select_owning_elements() {
        let doc = doc();
        let expr = PathExpr::parse("/configuration/global/carriers/carrier/@type").unwrap();
        assert!(expr.is_attribute());
        assert_eq!(expr.attribute(), Some("type"));
        assert_eq!(expr.select(&doc).len(), 2);
    }

    #[test]
    fn match_counts_drive_resolution_policy() {
        let doc = doc();
        assert!(doc.resolve_many("/configuration/nothing").unwrap().is_empty());
        assert!(matches!(
            doc.resolve_one("//carrier"),
            Err(XmlConfError::Path { found: 3, .. })
        ));
        assert!(matches!(
            doc.resolve_one("/configuration/nothing"),
            Err(XmlConfError::Path { found: 0, .. })
        ));
        assert!(doc.resolve_optional("//carrier").is_none());
        assert!(doc.resolve_optional("/configuration/global").is_some());
        assert!(doc.resolve_optional("not a path").is_none());
    }

    #[test]
    fn get_path_round_trips_through_resolution() {
        let doc = doc();
        for id in doc.descendants(doc.root()) {
            let path = doc.get_path(id);
            assert_eq!(doc.resolve_one(&path).unwrap(), id, "{path}");
        }
        let comment = doc.children(doc.resolve_one("//carriers").unwrap())[0];
        assert_eq!(
            doc.get_path(comment),
            "/configuration/global/carriers/comment()"
        );
        assert_eq!(doc.resolve_one("//carriers/comment()").unwrap(), comment);
    }

    #[test]
    fn malformed_paths_are_syntax_errors() {
        for bad in [
            "configuration",
            "/configuration/",
            "/a[0]",
            "/a[@id=1]",
            "/a/@b/c",
            "/a[foo]",
            "/a[1",
        ] {
            assert!(
                matches!(PathExpr::parse(bad), Err(XmlConfError::PathSyntax { .. })),
                "{bad}"
            );
        }
    }
}
