//! Evaluation contexts for template expressions.

use crate::node::{Part, TemplateExpr};
use terrace_value::{PathSegment, ReadError, ReadResult, StructuralPath, Value};

/// Options passed through to template evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOpts {
    /// Return unresolvable expressions verbatim instead of failing.
    pub allow_partial: bool,
}

impl ResolveOpts {
    pub fn partial() -> Self {
        Self {
            allow_partial: true,
        }
    }
}

/// Something that can evaluate template expressions.
///
/// `path` is the structural path of the leaf being read; implementations put
/// it in the [`ReadError`] they return.
pub trait ConfigContext: Send + Sync {
    fn resolve(
        &self,
        expr: &TemplateExpr,
        path: &StructuralPath,
        opts: &ResolveOpts,
    ) -> ReadResult<Value>;
}

/// Resolves `${a.b.c}` expressions by key path lookup in a value tree.
///
/// A string consisting of a single expression resolves to the looked-up
/// value with its type intact. Otherwise each expression is interpolated
/// into the surrounding text, which only works for scalars.
///
/// ```rust
/// use serde_json::json;
/// use terrace_template::{ConfigContext, KeyPathContext, ResolveOpts, TemplateExpr};
/// use terrace_value::{StructuralPath, Value};
///
/// let context = KeyPathContext::new(Value::from(json!({"var": {"replicas": 3}})));
/// let value = context
///     .resolve(
///         &TemplateExpr::new("${var.replicas}"),
///         &StructuralPath::root(),
///         &ResolveOpts::default(),
///     )
///     .unwrap();
/// assert_eq!(value, Value::Integer(3));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyPathContext {
    root: Value,
}

impl KeyPathContext {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// Look up a dot-separated key path. Numeric segments index sequences.
    pub fn lookup(&self, key: &str) -> Option<&Value> {
        key.split('.').try_fold(&self.root, |current, part| {
            let segment = match (current, part.parse::<usize>()) {
                (Value::Seq(_), Ok(index)) => PathSegment::Index(index),
                _ => PathSegment::from(part),
            };
            current.get(&segment)
        })
    }
}

impl ConfigContext for KeyPathContext {
    fn resolve(
        &self,
        expr: &TemplateExpr,
        path: &StructuralPath,
        opts: &ResolveOpts,
    ) -> ReadResult<Value> {
        let fail = |message: String| ReadError::template(path.clone(), expr.as_str(), message);
        let parts = expr.parts().map_err(|e| fail(e.to_string()))?;

        if let [Part::Expr(key)] = parts.as_slice() {
            return match self.lookup(key) {
                Some(value) => Ok(value.clone()),
                None if opts.allow_partial => Ok(Value::String(expr.as_str().to_string())),
                None => Err(fail(format!("could not find key `{}`", key))),
            };
        }

        let mut out = String::new();
        for part in parts {
            match part {
                Part::Literal(text) => out.push_str(text),
                Part::Expr(key) => match self.lookup(key) {
                    Some(Value::String(s)) => out.push_str(s),
                    Some(value) if value.is_container() => {
                        return Err(fail(format!(
                            "`{}` is {} and cannot be interpolated into a string",
                            key,
                            value.type_name()
                        )));
                    }
                    Some(value) => out.push_str(&value.to_string()),
                    None if opts.allow_partial => {
                        out.push_str("${");
                        out.push_str(key);
                        out.push('}');
                    }
                    None => return Err(fail(format!("could not find key `{}`", key))),
                },
            }
        }
        Ok(Value::String(out))
    }
}
