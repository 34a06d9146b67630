//! Lazy read-through view over a template tree.

use crate::context::{ConfigContext, ResolveOpts};
use crate::node::TemplateNode;
use terrace_value::{ContainerKind, Node, PathSegment, ReadResult, StructuralPath, View};
use tracing::trace;

/// A container of a [`TemplateNode`] tree, read through a [`ConfigContext`].
///
/// Literal leaves are returned as borrowed values. Unresolved leaves are
/// evaluated when read, every time they are read; nothing is evaluated when
/// the view is created or its keys are listed. Nested containers come back as
/// further `LazyView`s, so branches that are never read cost nothing.
pub struct LazyView<'a> {
    node: &'a TemplateNode,
    context: &'a dyn ConfigContext,
    opts: ResolveOpts,
    path: StructuralPath,
}

impl<'a> LazyView<'a> {
    /// Open a template tree for reading.
    ///
    /// A container root becomes a view. A leaf root is read right away, so
    /// an unresolved leaf root can fail here.
    pub fn root(
        node: &'a TemplateNode,
        context: &'a dyn ConfigContext,
        opts: ResolveOpts,
    ) -> ReadResult<Node<'a>> {
        read_node(node, context, opts, StructuralPath::root())
    }
}

fn read_node<'a>(
    node: &'a TemplateNode,
    context: &'a dyn ConfigContext,
    opts: ResolveOpts,
    path: StructuralPath,
) -> ReadResult<Node<'a>> {
    match node {
        TemplateNode::Literal(value) => Ok(Node::borrowed(value)),
        TemplateNode::Unresolved(expr) => {
            trace!(path = %path, expression = expr.as_str(), "resolving template leaf");
            context.resolve(expr, &path, &opts).map(Node::owned)
        }
        TemplateNode::Seq(_) | TemplateNode::Map(_) => Ok(Node::view(LazyView {
            node,
            context,
            opts,
            path,
        })),
    }
}

impl View for LazyView<'_> {
    fn kind(&self) -> ContainerKind {
        match self.node {
            TemplateNode::Seq(_) => ContainerKind::Seq,
            _ => ContainerKind::Map,
        }
    }

    fn path(&self) -> &StructuralPath {
        &self.path
    }

    fn keys(&self) -> Vec<PathSegment> {
        match self.node {
            TemplateNode::Seq(items) => (0..items.len()).map(PathSegment::Index).collect(),
            TemplateNode::Map(map) => map.keys().map(PathSegment::from).collect(),
            _ => Vec::new(),
        }
    }

    fn has(&self, segment: &PathSegment) -> bool {
        self.node.get(segment).is_some()
    }

    fn get(&self, segment: &PathSegment) -> ReadResult<Option<Node<'_>>> {
        match self.node.get(segment) {
            Some(child) => read_node(
                child,
                self.context,
                self.opts,
                self.path.child(segment.clone()),
            )
            .map(Some),
            None => Ok(None),
        }
    }

    fn len(&self) -> usize {
        self.node.len()
    }
}
