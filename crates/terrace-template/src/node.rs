//! Template trees: literal values mixed with unresolved expressions.

use indexmap::IndexMap;
use terrace_value::{PathSegment, StructuralPath, Value};
use thiserror::Error;

/// A template expression could not be split into parts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    #[error("unterminated template expression starting at offset {offset}")]
    Unterminated { offset: usize },

    #[error("empty template expression at offset {offset}")]
    Empty { offset: usize },
}

/// One piece of a template string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Part<'a> {
    Literal(&'a str),
    /// Body of a `${...}` expression, trimmed.
    Expr(&'a str),
}

/// A string containing one or more `${...}` expressions, kept verbatim until
/// a context evaluates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateExpr {
    raw: String,
}

impl TemplateExpr {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether `text` would be treated as a template.
    pub fn is_template(text: &str) -> bool {
        text.contains("${")
    }

    /// Split into literal text and expression bodies.
    ///
    /// ```rust
    /// use terrace_template::{Part, TemplateExpr};
    ///
    /// let expr = TemplateExpr::new("${var.registry}/api:${var.tag}");
    /// assert_eq!(
    ///     expr.parts().unwrap(),
    ///     vec![Part::Expr("var.registry"), Part::Literal("/api:"), Part::Expr("var.tag")]
    /// );
    /// ```
    pub fn parts(&self) -> Result<Vec<Part<'_>>, ExprError> {
        let mut parts = Vec::new();
        let mut rest = self.raw.as_str();
        let mut offset = 0;

        while let Some(start) = rest.find("${") {
            if start > 0 {
                parts.push(Part::Literal(&rest[..start]));
            }
            let body = &rest[start + 2..];
            let Some(end) = body.find('}') else {
                return Err(ExprError::Unterminated {
                    offset: offset + start,
                });
            };
            let inner = body[..end].trim();
            if inner.is_empty() {
                return Err(ExprError::Empty {
                    offset: offset + start,
                });
            }
            parts.push(Part::Expr(inner));

            let consumed = start + 2 + end + 1;
            offset += consumed;
            rest = &rest[consumed..];
        }

        if !rest.is_empty() {
            parts.push(Part::Literal(rest));
        }
        Ok(parts)
    }
}

/// A configuration tree whose leaves are either literal values or unresolved
/// template expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateNode {
    Literal(Value),
    Unresolved(TemplateExpr),
    Seq(Vec<TemplateNode>),
    Map(IndexMap<String, TemplateNode>),
}

impl TemplateNode {
    /// Build a template tree from a parsed value.
    ///
    /// Strings containing `${` become unresolved leaves; containers are
    /// converted recursively; other scalars stay literal.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(s) if TemplateExpr::is_template(&s) => {
                TemplateNode::Unresolved(TemplateExpr::new(s))
            }
            Value::Seq(items) => {
                TemplateNode::Seq(items.into_iter().map(TemplateNode::from_value).collect())
            }
            Value::Map(map) => TemplateNode::Map(
                map.into_iter()
                    .map(|(k, v)| (k, TemplateNode::from_value(v)))
                    .collect(),
            ),
            other => TemplateNode::Literal(other),
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, TemplateNode::Seq(_) | TemplateNode::Map(_))
    }

    /// Get a direct child by segment.
    pub fn get(&self, segment: &PathSegment) -> Option<&TemplateNode> {
        match (self, segment) {
            (TemplateNode::Map(map), PathSegment::Key(key)) => map.get(key),
            (TemplateNode::Seq(items), PathSegment::Index(index)) => items.get(*index),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TemplateNode::Map(map) => map.len(),
            TemplateNode::Seq(items) => items.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Paths of every unresolved leaf, in pre-order.
    pub fn unresolved_paths(&self) -> Vec<StructuralPath> {
        fn walk(node: &TemplateNode, path: &mut StructuralPath, out: &mut Vec<StructuralPath>) {
            match node {
                TemplateNode::Unresolved(_) => out.push(path.clone()),
                TemplateNode::Literal(_) => {}
                TemplateNode::Seq(items) => {
                    for (index, item) in items.iter().enumerate() {
                        path.push_index(index);
                        walk(item, path, out);
                        path.pop();
                    }
                }
                TemplateNode::Map(map) => {
                    for (key, child) in map {
                        path.push_key(key.clone());
                        walk(child, path, out);
                        path.pop();
                    }
                }
            }
        }

        let mut out = Vec::new();
        walk(self, &mut StructuralPath::root(), &mut out);
        out
    }
}

impl From<Value> for TemplateNode {
    fn from(value: Value) -> Self {
        TemplateNode::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use terrace_value::path;

    #[test]
    fn test_from_value_marks_templates() {
        let node = TemplateNode::from_value(Value::from(json!({
            "name": "api",
            "image": "${var.registry}/api",
            "ports": [80, "${var.port}"]
        })));

        assert!(matches!(
            node.get(&PathSegment::from("name")),
            Some(TemplateNode::Literal(_))
        ));
        assert_eq!(
            node.unresolved_paths(),
            vec![path!["image"], path!["ports", 1]]
        );
    }

    #[test]
    fn test_parts_plain_text() {
        let expr = TemplateExpr::new("no templates");
        assert_eq!(expr.parts().unwrap(), vec![Part::Literal("no templates")]);
    }

    #[test]
    fn test_parts_errors() {
        assert_eq!(
            TemplateExpr::new("abc ${var.x").parts(),
            Err(ExprError::Unterminated { offset: 4 })
        );
        assert_eq!(
            TemplateExpr::new("x${ }").parts(),
            Err(ExprError::Empty { offset: 1 })
        );
    }
}
