use std::fmt::{Debug, Display};

use super::{EdgeLength, NewickFormat, NodeId};

#[derive(Clone)]
/// A node of the Tree
pub struct Node {
    /// Index of the node within its tree
    pub id: NodeId,
    /// Name of the node (the taxon label for leaves)
    pub name: Option<String>,
    /// Index of the parent node
    pub parent: Option<NodeId>,
    /// Indices of child nodes
    pub children: Vec<NodeId>,
    /// length of branch between parent and node
    pub parent_edge: Option<EdgeLength>,
    /// Optional comment attached to node
    pub comment: Option<String>,
}

impl Node {
    /// Creates a new Node
    pub fn new() -> Self {
        Self {
            id: 0,
            name: None,
            parent: None,
            children: vec![],
            parent_edge: None,
            comment: None,
        }
    }

    /// Creates a new named Node
    pub fn new_named(name: &str) -> Self {
        Self {
            name: Some(String::from(name)),
            ..Self::new()
        }
    }

    /// Sets the internal Node name
    pub fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    /// Set the parent node and the length of the edge leading to it
    pub fn set_parent(&mut self, parent: NodeId, parent_edge: Option<EdgeLength>) {
        self.parent = Some(parent);
        self.parent_edge = parent_edge;
    }

    /// Adds a child to the node
    /// ```
    /// use stbl::tree::Node;
    ///
    /// let mut parent = Node::new();
    /// parent.id = 0;
    /// let mut child = Node::new();
    /// child.id = 1;
    ///
    /// child.set_parent(parent.id, Some(0.1));
    /// parent.add_child(child.id);
    ///
    /// assert_eq!(child.parent_edge, Some(0.1));
    /// assert_eq!(parent.children, vec![1]);
    /// ```
    pub fn add_child(&mut self, child: NodeId) {
        self.children.push(child);
    }

    /// Check if the node is a tip node
    pub fn is_tip(&self) -> bool {
        self.children.is_empty()
    }

    /// Check if the node is a root node
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    fn format_name(&self) -> String {
        match &self.name {
            Some(name) if name.contains(|c: char| c.is_whitespace() || "():;,[]".contains(c)) => {
                format!("'{name}'")
            }
            Some(name) => name.clone(),
            None => String::new(),
        }
    }

    fn format_length(&self) -> String {
        self.parent_edge
            .map(|v| format!(":{v}"))
            .unwrap_or_default()
    }

    fn format_comment(&self) -> String {
        self.comment
            .clone()
            .map(|v| format!("[{v}]"))
            .unwrap_or_default()
    }

    /// Returns String with node in newick format
    pub fn to_newick(&self, format: NewickFormat) -> String {
        let mut repr = String::new();

        match format {
            NewickFormat::AllFields | NewickFormat::NoComments | NewickFormat::OnlyNames => {
                repr += &self.format_name()
            }
            NewickFormat::Topology => (),
        }

        if let NewickFormat::AllFields | NewickFormat::NoComments = format {
            repr += &self.format_length()
        }

        if let NewickFormat::AllFields = format {
            repr += &self.format_comment()
        }

        repr
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.parent_edge {
            Some(l) => write!(f, "({l:.5}) {}", self.format_name()),
            None => write!(f, "{}", self.format_name()),
        }
    }
}

impl Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({:?}) {:?} Id[{}] Parent[{:?}] Comments[{:?}] Children({:?})",
            self.parent_edge, self.name, self.id, self.parent, self.comment, self.children,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newick_fields() {
        let mut node = Node::new_named("A");
        node.set_parent(0, Some(0.25));
        node.comment = Some("&support=1".into());

        assert_eq!(node.to_newick(NewickFormat::AllFields), "A:0.25[&support=1]");
        assert_eq!(node.to_newick(NewickFormat::NoComments), "A:0.25");
        assert_eq!(node.to_newick(NewickFormat::OnlyNames), "A");
        assert_eq!(node.to_newick(NewickFormat::Topology), "");
    }

    #[test]
    fn tip_and_root() {
        let mut node = Node::new();
        assert!(node.is_tip());
        assert!(node.is_root());

        node.add_child(3);
        node.set_parent(1, None);
        assert!(!node.is_tip());
        assert!(!node.is_root());
    }
}
