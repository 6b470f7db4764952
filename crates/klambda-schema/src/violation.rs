//! # Violation Trees
//!
//! A schema engine reports failures as a tree: a failing conditional or
//! composite keyword nests the reasons for its failure beneath it. Callers
//! want a flat list of `path: message` strings instead.
//!
//! [`ViolationNode::flatten`] walks the tree depth-first with an explicit
//! stack. At each node the effective path is the node's own instance
//! location when non-empty, otherwise the path inherited from its parent,
//! so a message-only node deep inside an `allOf` still points at a concrete
//! field. Nodes without a message contribute nothing but still pass their
//! path down. Output is in pre-order: a parent before its causes, causes in
//! the order they were reported.
//!
//! jsonschema reports a flat error list, so the registry builds a
//! one-level tree: a message-less root over one leaf per error. Deeper
//! nesting, and with it path inheritance across levels, only occurs in
//! trees built directly, as in the unit tests below.

/// One node of a violation tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViolationNode {
    /// JSON pointer into the instance. Empty means "same as parent".
    pub instance_location: String,
    /// Human-readable failure, if this node carries one.
    pub message: Option<String>,
    /// Nested reasons.
    pub causes: Vec<ViolationNode>,
}

impl ViolationNode {
    /// A message-less node at the document root holding `causes`.
    pub fn root(causes: Vec<ViolationNode>) -> Self {
        Self {
            instance_location: String::new(),
            message: None,
            causes,
        }
    }

    /// A node carrying a message and no causes.
    pub fn leaf(instance_location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            instance_location: instance_location.into(),
            message: Some(message.into()),
            causes: Vec::new(),
        }
    }

    /// Flatten into `path: message` strings (bare `message` at the root).
    pub fn flatten(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack: Vec<(&ViolationNode, &str)> = vec![(self, "")];
        while let Some((node, parent_path)) = stack.pop() {
            let path = if node.instance_location.is_empty() {
                parent_path
            } else {
                node.instance_location.as_str()
            };
            if let Some(message) = &node.message {
                if path.is_empty() {
                    out.push(message.clone());
                } else {
                    out.push(format!("{path}: {message}"));
                }
            }
            for cause in node.causes.iter().rev() {
                stack.push((cause, path));
            }
        }
        out
    }
}
