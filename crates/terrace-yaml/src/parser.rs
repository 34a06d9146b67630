//! YAML parser that builds YamlWithSourceInfo trees.

use crate::{Error, Result, SourceSpan, Value, YamlHashEntry, YamlWithSourceInfo};
use indexmap::IndexSet;
use std::collections::HashMap;
use terrace_source_map::LineIndex;
use tracing::debug;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser, Tag};
use yaml_rust2::scanner::{Marker, TScalarStyle};

/// One document segment of a multi-document source text.
#[derive(Debug, Clone, PartialEq)]
pub struct YamlDocument {
    /// 0-based position of the segment in the source text
    pub index: usize,
    pub root: YamlWithSourceInfo,
}

/// Parse the first YAML document in `content`.
///
/// # Example
///
/// ```rust
/// use terrace_yaml::parse;
///
/// let yaml = parse("kind: Project").unwrap();
/// assert!(yaml.is_hash());
/// ```
///
/// # Errors
///
/// Returns an error if the YAML is invalid or contains no document.
pub fn parse(content: &str) -> Result<YamlWithSourceInfo> {
    parse_documents(content)?
        .into_iter()
        .next()
        .map(|doc| doc.root)
        .ok_or_else(|| Error::ParseError {
            message: "No YAML document found".into(),
            document: 0,
            location: None,
        })
}

/// Parse every document segment in `content`.
///
/// Spans are relative to the whole text, so a node in the second document
/// reports line numbers past the first document's end. An empty text yields
/// no documents.
///
/// # Errors
///
/// The first syntax or structure error in any segment aborts the call; no
/// partial result is returned. The error carries the failing segment's index.
pub fn parse_documents(content: &str) -> Result<Vec<YamlDocument>> {
    let mut parser = Parser::new_from_str(content);
    let mut builder = YamlBuilder::new(content);

    if let Err(err) = parser.load(&mut builder, true) {
        // Structural errors found by the builder precede the scanner's.
        if let Some(error) = builder.error {
            return Err(error);
        }
        let offset = builder.offset(err.marker());
        return Err(Error::ParseError {
            message: err.info().to_string(),
            document: builder.documents.len(),
            location: builder.index.span(offset, offset),
        });
    }

    builder.finish()
}

/// Builder that implements MarkedEventReceiver to construct document trees.
struct YamlBuilder<'a> {
    source: &'a str,

    /// Line-break index built once for the whole text
    index: LineIndex,

    /// Stack of containers being constructed
    stack: Vec<BuildNode>,

    /// Anchored nodes of the current document, by anchor id
    anchors: HashMap<usize, YamlWithSourceInfo>,

    /// Completed root of the current document
    root: Option<YamlWithSourceInfo>,

    documents: Vec<YamlDocument>,

    /// First structural error; later events are ignored once set
    error: Option<Error>,
}

/// A container being constructed during parsing.
enum BuildNode {
    Sequence {
        start: usize,
        anchor: usize,
        items: Vec<YamlWithSourceInfo>,
    },
    Mapping {
        start: usize,
        anchor: usize,
        entries: Vec<(YamlWithSourceInfo, Option<YamlWithSourceInfo>)>,
    },
}

impl<'a> YamlBuilder<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            index: LineIndex::new(source),
            stack: Vec::new(),
            anchors: HashMap::new(),
            root: None,
            documents: Vec::new(),
            error: None,
        }
    }

    fn finish(self) -> Result<Vec<YamlDocument>> {
        if let Some(error) = self.error {
            return Err(error);
        }
        debug!(documents = self.documents.len(), "parsed yaml text");
        Ok(self.documents)
    }

    /// Byte offset of a parser marker. Markers count characters.
    fn offset(&self, marker: &Marker) -> usize {
        self.index.byte_offset_of_char(marker.index())
    }

    fn fail(&mut self, error: Error) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    fn structure_error(&mut self, message: &str, offset: usize) {
        let location = self.index.span(offset, offset);
        self.fail(Error::InvalidStructure {
            message: message.to_string(),
            document: self.documents.len(),
            location,
        });
    }

    fn push_complete(&mut self, node: YamlWithSourceInfo) {
        match self.stack.last_mut() {
            None => self.root = Some(node),
            Some(BuildNode::Sequence { items, .. }) => items.push(node),
            Some(BuildNode::Mapping { entries, .. }) => match entries.last_mut() {
                Some((_, value @ None)) => *value = Some(node),
                _ => entries.push((node, None)),
            },
        }
    }

    fn remember_anchor(&mut self, anchor: usize, node: &YamlWithSourceInfo) {
        if anchor > 0 {
            self.anchors.insert(anchor, node.clone());
        }
    }

    /// Span of a container from its first token to the token that closed it.
    ///
    /// The closing marker of a block container sits on the next token, so
    /// trailing whitespace is trimmed; a flow container's closing bracket is
    /// included.
    fn container_span(&self, start: usize, end: usize) -> Option<SourceSpan> {
        let mut end = end.min(self.source.len());
        if matches!(self.source.as_bytes().get(end), Some(b'}' | b']')) {
            end += 1;
        }
        let text = self.source.get(start..end)?;
        let end = start + text.trim_end().len();
        if end <= start {
            return None;
        }
        self.index.span(start, end)
    }

    fn scalar_span(&self, start: usize, value: &str, style: TScalarStyle) -> Option<SourceSpan> {
        let rest = self.source.get(start..)?;
        match style {
            TScalarStyle::DoubleQuoted => self.index.span(start, start + quoted_len(rest, '"')),
            TScalarStyle::SingleQuoted => self.index.span(start, start + quoted_len(rest, '\'')),
            // Empty plain scalars are synthesized by the parser and have no text.
            TScalarStyle::Plain if value.is_empty() => None,
            TScalarStyle::Plain if rest.starts_with(value) => {
                self.index.span(start, start + value.len())
            }
            TScalarStyle::Literal | TScalarStyle::Folded => {
                // Content starts on the line after the `|` or `>` header.
                let body = match rest.find('\n') {
                    Some(newline) if rest.starts_with(['|', '>']) => newline + 1,
                    _ => 0,
                };
                let (first, last) = folded_extent(&rest[body..], value)?;
                self.index.span(start + body + first, start + body + last)
            }
            _ => {
                let (first, last) = folded_extent(rest, value)?;
                self.index.span(start + first, start + last)
            }
        }
    }

    fn on_scalar(
        &mut self,
        value: String,
        style: TScalarStyle,
        anchor: usize,
        tag: Option<Tag>,
        marker: Marker,
    ) {
        let start = self.offset(&marker);
        let span = self.scalar_span(start, &value, style);
        let typed = match (&tag, style) {
            (Some(tag), _) if is_core_tag(tag, "str") => Value::String(value),
            (_, TScalarStyle::Plain) => parse_plain_scalar(&value),
            _ => Value::String(value),
        };
        let node = YamlWithSourceInfo::new_scalar(typed, span);
        self.remember_anchor(anchor, &node);
        self.push_complete(node);
    }

    fn on_sequence_end(&mut self, marker: Marker) {
        let end = self.offset(&marker);
        let Some(BuildNode::Sequence { start, anchor, items }) = self.stack.pop() else {
            self.structure_error("sequence end without matching start", end);
            return;
        };
        let node = YamlWithSourceInfo::new_array(self.container_span(start, end), items);
        self.remember_anchor(anchor, &node);
        self.push_complete(node);
    }

    fn on_mapping_end(&mut self, marker: Marker) {
        let end = self.offset(&marker);
        let Some(BuildNode::Mapping { start, anchor, entries }) = self.stack.pop() else {
            self.structure_error("mapping end without matching start", end);
            return;
        };

        let mut seen = IndexSet::with_capacity(entries.len());
        let mut hash_entries = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let Some(value) = value else {
                self.structure_error("mapping entry without value", end);
                return;
            };
            let name = key_string(&key.value);
            if !seen.insert(name.clone()) {
                self.fail(Error::DuplicateKey {
                    key: name,
                    document: self.documents.len(),
                    location: key.span,
                });
                return;
            }
            let entry_span = match (key.span, value.span.or(key.span)) {
                (Some(k), Some(v)) => Some(SourceSpan::new(k.start, v.end)),
                _ => None,
            };
            hash_entries.push(YamlHashEntry::new(name, value, key.span, entry_span));
        }

        // A block mapping's start event is emitted at its first key's `:`.
        let start = match hash_entries.first().and_then(|entry| entry.key_span) {
            Some(key) if self.source.as_bytes().get(start) != Some(&b'{') => {
                key.start.offset.min(start)
            }
            _ => start,
        };
        let node = YamlWithSourceInfo::new_hash(self.container_span(start, end), hash_entries);
        self.remember_anchor(anchor, &node);
        self.push_complete(node);
    }

    fn on_alias(&mut self, id: usize, marker: Marker) {
        match self.anchors.get(&id) {
            // An alias resolves to the anchored node, spans included.
            Some(node) => {
                let node = node.clone();
                self.push_complete(node);
            }
            None => {
                let offset = self.offset(&marker);
                self.structure_error("alias refers to an unknown anchor", offset);
            }
        }
    }

    fn on_document_end(&mut self) {
        let root = self
            .root
            .take()
            .unwrap_or_else(|| YamlWithSourceInfo::new_scalar(Value::Null, None));
        self.anchors.clear();
        self.documents.push(YamlDocument {
            index: self.documents.len(),
            root,
        });
    }
}

impl MarkedEventReceiver for YamlBuilder<'_> {
    fn on_event(&mut self, ev: Event, marker: Marker) {
        if self.error.is_some() {
            return;
        }

        match ev {
            Event::Nothing | Event::StreamStart | Event::StreamEnd => {}
            Event::DocumentStart { .. } => {
                self.root = None;
                self.stack.clear();
            }
            Event::DocumentEnd => self.on_document_end(),
            Event::Scalar(value, style, anchor, tag) => {
                self.on_scalar(value, style, anchor, tag, marker)
            }
            Event::SequenceStart(anchor, _tag) => {
                let start = self.offset(&marker);
                self.stack.push(BuildNode::Sequence {
                    start,
                    anchor,
                    items: Vec::new(),
                });
            }
            Event::SequenceEnd => self.on_sequence_end(marker),
            Event::MappingStart(anchor, _tag) => {
                let start = self.offset(&marker);
                self.stack.push(BuildNode::Mapping {
                    start,
                    anchor,
                    entries: Vec::new(),
                });
            }
            Event::MappingEnd => self.on_mapping_end(marker),
            Event::Alias(id) => self.on_alias(id, marker),
        }
    }
}

/// Byte range of `text` that spells out `value` once line folding and
/// indentation are undone.
///
/// Plain and block scalars carry no escapes, so the non-whitespace characters
/// of the decoded value appear in the source in the same order. Returns `None`
/// when the value has no visible characters or the text does not match.
fn folded_extent(text: &str, value: &str) -> Option<(usize, usize)> {
    let mut source = text.char_indices();
    let mut first = None;
    let mut last = None;
    for expected in value.chars().filter(|c| !c.is_whitespace()) {
        let (at, found) = source.find(|(_, c)| !c.is_whitespace())?;
        if found != expected {
            return None;
        }
        first.get_or_insert(at);
        last = Some(at + found.len_utf8());
    }
    Some((first?, last?))
}

/// Length in bytes of a quoted scalar starting at its opening quote.
fn quoted_len(text: &str, quote: char) -> usize {
    let mut chars = text.char_indices().skip(1).peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' if quote == '"' => {
                chars.next();
            }
            c if c == quote => {
                // '' is an escaped quote inside single-quoted scalars
                if quote == '\'' && matches!(chars.peek(), Some((_, '\''))) {
                    chars.next();
                } else {
                    return i + c.len_utf8();
                }
            }
            _ => {}
        }
    }
    text.len()
}

fn is_core_tag(tag: &Tag, suffix: &str) -> bool {
    matches!(tag.handle.as_str(), "!!" | "tag:yaml.org,2002:") && tag.suffix == suffix
}

/// Map keys are always strings; other scalars use their canonical form.
fn key_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Type a plain scalar with the YAML 1.2 core schema.
fn parse_plain_scalar(value: &str) -> Value {
    match value {
        "" | "~" | "null" | "Null" | "NULL" => return Value::Null,
        "true" | "True" | "TRUE" => return Value::Bool(true),
        "false" | "False" | "FALSE" => return Value::Bool(false),
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => {
            return Value::Float(f64::INFINITY);
        }
        "-.inf" | "-.Inf" | "-.INF" => return Value::Float(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => return Value::Float(f64::NAN),
        _ => {}
    }

    if let Some(hex) = value.strip_prefix("0x") {
        if let Ok(n) = i64::from_str_radix(hex, 16) {
            return Value::Integer(n);
        }
    }
    if let Some(oct) = value.strip_prefix("0o") {
        if let Ok(n) = i64::from_str_radix(oct, 8) {
            return Value::Integer(n);
        }
    }

    let unsigned = value.strip_prefix(['-', '+']).unwrap_or(value);
    if !unsigned.is_empty() && unsigned.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(n) = value.parse::<i64>() {
            return Value::Integer(n);
        }
    }
    if is_core_float(unsigned) {
        if let Ok(f) = value.parse::<f64>() {
            return Value::Float(f);
        }
    }

    Value::String(value.to_string())
}

/// `( \. [0-9]+ | [0-9]+ ( \. [0-9]* )? ) ( [eE] [-+]? [0-9]+ )?`
fn is_core_float(text: &str) -> bool {
    let (mantissa, exponent) = match text.find(['e', 'E']) {
        Some(at) => (&text[..at], Some(&text[at + 1..])),
        None => (text, None),
    };

    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    let mantissa_ok = match mantissa.split_once('.') {
        Some(("", frac)) => digits(frac),
        Some((int, frac)) => digits(int) && (frac.is_empty() || digits(frac)),
        None => digits(mantissa),
    };
    let exponent_ok = match exponent {
        Some(exp) => digits(exp.strip_prefix(['-', '+']).unwrap_or(exp)),
        None => true,
    };
    mantissa_ok && exponent_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scalar() {
        let yaml = parse("hello").unwrap();
        assert!(yaml.is_scalar());
        assert_eq!(yaml.value.as_str(), Some("hello"));
    }

    #[test]
    fn test_core_schema_typing() {
        assert_eq!(parse_plain_scalar("42"), Value::Integer(42));
        assert_eq!(parse_plain_scalar("-7"), Value::Integer(-7));
        assert_eq!(parse_plain_scalar("0x1F"), Value::Integer(31));
        assert_eq!(parse_plain_scalar("0o17"), Value::Integer(15));
        assert_eq!(parse_plain_scalar("1.5"), Value::Float(1.5));
        assert_eq!(parse_plain_scalar("1e3"), Value::Float(1000.0));
        assert_eq!(parse_plain_scalar(".5"), Value::Float(0.5));
        assert_eq!(parse_plain_scalar("true"), Value::Bool(true));
        assert_eq!(parse_plain_scalar("~"), Value::Null);

        // YAML 1.1 booleans and version-like strings stay strings
        assert_eq!(parse_plain_scalar("yes"), Value::from("yes"));
        assert_eq!(parse_plain_scalar("off"), Value::from("off"));
        assert_eq!(parse_plain_scalar("1.2.3"), Value::from("1.2.3"));
        assert_eq!(parse_plain_scalar("inf"), Value::from("inf"));
    }

    #[test]
    fn test_quoted_scalars_are_strings() {
        let yaml = parse("a: \"42\"\nb: 'true'\nc: !!str 7\n").unwrap();
        assert_eq!(yaml.get_hash_value("a").unwrap().value, Value::from("42"));
        assert_eq!(yaml.get_hash_value("b").unwrap().value, Value::from("true"));
        assert_eq!(yaml.get_hash_value("c").unwrap().value, Value::from("7"));
    }

    #[test]
    fn test_parse_hash_preserves_order() {
        let yaml = parse("zeta: 1\nalpha: 2\n").unwrap();
        let keys: Vec<_> = yaml.as_hash().unwrap().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_non_string_keys_are_stringified() {
        let yaml = parse("1: one\ntrue: yes\n").unwrap();
        assert_eq!(yaml.get_hash_value("1").unwrap().value, Value::from("one"));
        assert!(yaml.get_hash_value("true").is_some());
    }

    #[test]
    fn test_nested_structure() {
        let yaml = parse(
            r#"
kind: Project
environments:
  - name: local
    production: false
"#,
        )
        .unwrap();

        let envs = yaml.get_hash_value("environments").unwrap();
        assert!(envs.is_array());
        let local = envs.get_array_item(0).unwrap();
        assert_eq!(local.get_hash_value("production").unwrap().value, Value::Bool(false));
    }

    #[test]
    fn test_multiple_documents() {
        let text = "kind: Project\nname: p\n---\nkind: Build\ntype: docker\n";
        let docs = parse_documents(text).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].index, 0);
        assert_eq!(docs[1].index, 1);

        let build_type = docs[1].root.get_hash_value("type").unwrap();
        assert_eq!(build_type.value.as_str(), Some("docker"));
        let span = build_type.span.unwrap();
        assert_eq!((span.start_line(), span.start_col()), (5, 7));
    }

    #[test]
    fn test_empty_text_has_no_documents() {
        assert!(parse_documents("").unwrap().is_empty());
        assert!(parse("").is_err());
    }

    #[test]
    fn test_plain_scalar_span() {
        let yaml = parse("name: local\n").unwrap();
        let name = yaml.get_hash_entry("name").unwrap();
        let span = name.value.span.unwrap();
        assert_eq!((span.start.offset, span.end.offset), (6, 11));

        let key_span = name.key_span.unwrap();
        assert_eq!((key_span.start.offset, key_span.end.offset), (0, 4));
        let entry_span = name.entry_span.unwrap();
        assert_eq!((entry_span.start.offset, entry_span.end.offset), (0, 11));
    }

    #[test]
    fn test_quoted_scalar_span_covers_quotes() {
        let text = "a: \"x\\\"y\"\nb: 'it''s'\n";
        let yaml = parse(text).unwrap();

        let a = yaml.get_hash_value("a").unwrap();
        assert_eq!(a.value.as_str(), Some("x\"y"));
        let span = a.span.unwrap();
        insta::assert_snapshot!(&text[span.start.offset..span.end.offset], @r#""x\"y""#);

        let b = yaml.get_hash_value("b").unwrap();
        assert_eq!(b.value.as_str(), Some("it's"));
        let span = b.span.unwrap();
        insta::assert_snapshot!(&text[span.start.offset..span.end.offset], @"'it''s'");
    }

    #[test]
    fn test_empty_value_is_null_without_span() {
        let yaml = parse("a:\nb: 1\n").unwrap();
        let a = yaml.get_hash_value("a").unwrap();
        assert_eq!(a.value, Value::Null);
        assert!(a.span.is_none());
    }

    #[test]
    fn test_flow_container_span_includes_brackets() {
        let text = "ports: [80, 443]\n";
        let yaml = parse(text).unwrap();
        let ports = yaml.get_hash_value("ports").unwrap();
        let span = ports.span.unwrap();
        assert_eq!(&text[span.start.offset..span.end.offset], "[80, 443]");
    }

    #[test]
    fn test_block_container_span_trims_trailing_whitespace() {
        let text = "env:\n  a: 1\n  b: 2\n\nnext: 3\n";
        let yaml = parse(text).unwrap();
        let env = yaml.get_hash_value("env").unwrap();
        let span = env.span.unwrap();
        assert_eq!(&text[span.start.offset..span.end.offset], "a: 1\n  b: 2");
    }

    #[test]
    fn test_block_mapping_span_starts_at_first_key() {
        let text = "kind: Project\nenvironments:\n  - name: local\n    production: false\n";
        let yaml = parse(text).unwrap();
        let root = yaml.span.unwrap();
        assert_eq!(root.start.offset, 0);

        let local = yaml.get_hash_value("environments").unwrap().get_array_item(0).unwrap();
        let span = local.span.unwrap();
        assert_eq!(
            &text[span.start.offset..span.end.offset],
            "name: local\n    production: false"
        );
    }

    #[test]
    fn test_flow_mapping_span_keeps_brace() {
        let text = "env: {a: 1, b: 2}\n";
        let yaml = parse(text).unwrap();
        let span = yaml.get_hash_value("env").unwrap().span.unwrap();
        assert_eq!(&text[span.start.offset..span.end.offset], "{a: 1, b: 2}");
    }

    #[test]
    fn test_empty_value_before_nested_key_has_no_span() {
        let yaml = parse("name:\n  \nitems: []\n").unwrap();
        assert!(yaml.get_hash_value("name").unwrap().span.is_none());
    }

    #[test]
    fn test_block_scalar_span_covers_source_lines() {
        let text = "script: |\n  echo hi\n  echo bye\nnext: 1\n";
        let yaml = parse(text).unwrap();
        let script = yaml.get_hash_value("script").unwrap();
        assert_eq!(script.value.as_str(), Some("echo hi\necho bye\n"));
        let span = script.span.unwrap();
        assert_eq!(&text[span.start.offset..span.end.offset], "echo hi\n  echo bye");

        let text = "note: >-\n  folded\n  text\n";
        let yaml = parse(text).unwrap();
        let span = yaml.get_hash_value("note").unwrap().span.unwrap();
        assert_eq!(&text[span.start.offset..span.end.offset], "folded\n  text");
    }

    #[test]
    fn test_multiline_plain_scalar_span() {
        let text = "description: this is\n  folded plain\nnext: 1\n";
        let yaml = parse(text).unwrap();
        let description = yaml.get_hash_value("description").unwrap();
        assert_eq!(description.value.as_str(), Some("this is folded plain"));
        let span = description.span.unwrap();
        assert_eq!(&text[span.start.offset..span.end.offset], "this is\n  folded plain");
        assert_eq!((span.end_line(), span.end_col()), (2, 15));
    }

    #[test]
    fn test_unicode_offsets_are_bytes() {
        let text = "título: café\nnext: x\n";
        let yaml = parse(text).unwrap();
        let next = yaml.get_hash_value("next").unwrap();
        let span = next.span.unwrap();
        assert_eq!(&text[span.start.offset..span.end.offset], "x");
        assert_eq!((span.start_line(), span.start_col()), (2, 7));
    }

    #[test]
    fn test_anchor_and_alias() {
        let yaml = parse("base: &b\n  image: nginx\ncopy: *b\n").unwrap();
        let copy = yaml.get_hash_value("copy").unwrap();
        assert_eq!(copy.value, yaml.get_hash_value("base").unwrap().value);
        assert!(copy.is_hash());
    }

    #[test]
    fn test_duplicate_key_is_an_error() {
        let err = parse_documents("a: 1\n---\nb: 1\nb: 2\n").unwrap_err();
        match err {
            Error::DuplicateKey { key, document, location } => {
                assert_eq!(key, "b");
                assert_eq!(document, 1);
                assert_eq!(location.unwrap().start_line(), 4);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_syntax_error_reports_failing_document() {
        let err = parse_documents("a: 1\n---\nb: [1, 2\n").unwrap_err();
        assert!(matches!(err, Error::ParseError { .. }));
        assert_eq!(err.document(), 1);
        assert!(err.location().is_some());
    }
}
