use std::{collections::HashSet, fs, path::Path};

use ptree::{print_tree, TreeBuilder};
use thiserror::Error;

use super::node::Node;
use super::{Edge, EdgeLength, NewickFormat, NodeId};

/// Errors that can occur when reading, writing and manipulating [`Tree`] structs.
#[derive(Error, Debug)]
pub enum TreeError {
    /// The tree is empty and we are trying to do something that require at least one node
    #[error("This tree is empty.")]
    IsEmpty,
    /// No root node was found in the tree
    #[error("No root node found")]
    RootNotFound,
    /// Some of the leaves in the tree have no name
    #[error("All your leaf nodes must be named.")]
    UnnamedLeaves,
    /// Some of the leaves in the tree share the same name
    #[error("Leaf name {0:?} is used more than once.")]
    DuplicateLeafNames(String),
    /// The branch above a node has no length
    #[error("Missing branch length above node {0}.")]
    MissingBranchLengths(NodeId),
    /// The requested node with index [`NodeId`] does not exist in the tree
    #[error("There is no node with index: {0}")]
    NodeNotFound(NodeId),
    /// We walked up from a node to the root without meeting the expected ancestor
    #[error("Node {ancestor} is not an ancestor of node {node}")]
    NotAnAncestor {
        /// Starting node of the walk
        node: NodeId,
        /// Expected ancestor
        ancestor: NodeId,
    },
    /// There was a [`std::io::Error`] when writing or printing the tree
    #[error("Error writing tree")]
    IoError(#[from] std::io::Error),
}

/// Errors that can occur when parsing newick strings.
#[derive(Error, Debug)]
pub enum NewickParseError {
    /// There is whitespace in one of the branch lengths
    #[error("Cannot have whitespace in number field.")]
    WhiteSpaceInNumber,
    /// There is whitespace inside an unquoted label
    #[error("Cannot have whitespace in unquoted labels.")]
    WhiteSpaceInName,
    /// There is an unclosed bracket in the newick String
    #[error("Missing a closing bracket.")]
    UnclosedBracket,
    /// A quoted label is never closed
    #[error("Missing a closing quote.")]
    UnclosedQuote,
    /// A `[...]` comment is never closed
    #[error("Missing the end of a comment.")]
    UnclosedComment,
    /// The newick string is missing a final semi-colon
    #[error("The tree is missing a semi colon at the end.")]
    NoClosingSemicolon,
    /// We are trying to close a subtree but have no parent node.
    #[error("Parent node of subtree not found")]
    NoSubtreeParent,
    /// A character appeared where it cannot start a new node
    #[error("Unexpected character {0:?}")]
    UnexpectedCharacter(char),
    /// The input does not contain any tree
    #[error("No tree found in input")]
    EmptyTree,
    /// There was a [`TreeError`] when building a tree from the newick string
    #[error("Problem with building the tree.")]
    TreeError(#[from] TreeError),
    /// There was a [`std::num::ParseFloatError`] when parsing branch lengths
    #[error("Could not parse a branch length")]
    FloatError(#[from] std::num::ParseFloatError),
    /// There was a [`std::io::Error`] when reading a newick file
    #[error("Problem reading file")]
    IoError(#[from] std::io::Error),
}

/// A Phylogenetic tree
#[derive(Debug, Clone, Default)]
pub struct Tree {
    nodes: Vec<Node>,
}

/// Base methods to add and get [`Node`] objects to and from the [`Tree`].
impl Tree {
    /// Create a new empty Tree object
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Add a new node to the tree. The node's id is set to its index in the tree.
    pub fn add(&mut self, node: Node) -> NodeId {
        let idx = self.nodes.len();
        let mut node = node;
        node.id = idx;
        self.nodes.push(node);

        idx
    }

    /// Add a child to one of the tree's nodes.
    ///
    /// # Example
    /// ```
    /// use stbl::tree::{Tree, Node};
    ///
    /// let mut tree = Tree::new();
    /// let root_id = tree.add(Node::new());
    ///
    /// let left = tree.add_child(Node::new(), root_id, None).unwrap();
    /// let right = tree.add_child(Node::new(), root_id, Some(0.1)).unwrap();
    ///
    /// assert_eq!(tree.get(&root_id).unwrap().children, vec![left, right]);
    /// assert_eq!(tree.get(&right).unwrap().parent_edge, Some(0.1));
    /// ```
    pub fn add_child(
        &mut self,
        node: Node,
        parent: NodeId,
        edge: Option<EdgeLength>,
    ) -> Result<NodeId, TreeError> {
        if parent >= self.nodes.len() {
            return Err(TreeError::NodeNotFound(parent));
        }

        let mut node = node;
        node.set_parent(parent, edge);

        let id = self.add(node);
        self.get_mut(&parent)?.add_child(id);

        Ok(id)
    }

    /// Get a reference to a specific Node of the tree
    pub fn get(&self, id: &NodeId) -> Result<&Node, TreeError> {
        self.nodes.get(*id).ok_or(TreeError::NodeNotFound(*id))
    }

    /// Get a mutable reference to a specific Node of the tree
    pub fn get_mut(&mut self, id: &NodeId) -> Result<&mut Node, TreeError> {
        self.nodes.get_mut(*id).ok_or(TreeError::NodeNotFound(*id))
    }

    /// Get a reference to a node in the tree by name.
    /// If several nodes share the name, the first one in the tree is returned.
    pub fn get_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes
            .iter()
            .find(|node| node.name.as_deref() == Some(name))
    }

    /// Gets the root node.
    pub fn get_root(&self) -> Result<NodeId, TreeError> {
        if self.nodes.is_empty() {
            return Err(TreeError::IsEmpty);
        }
        self.nodes
            .iter()
            .find(|node| node.is_root())
            .map(|node| node.id)
            .ok_or(TreeError::RootNotFound)
    }

    /// Returns a [`Vec`] containing the Node IDs of leaf nodes of the tree
    pub fn get_leaves(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|node| node.is_tip())
            .map(|node| node.id)
            .collect()
    }

    /// Returns the labels of the leaves, in node order. Fails if a leaf is
    /// unnamed or if two leaves share a label.
    /// ```
    /// use stbl::tree::Tree;
    ///
    /// let tree = Tree::from_newick("((A,B)E,(C,D)F);").unwrap();
    /// assert_eq!(tree.leaf_labels().unwrap(), vec!["A", "B", "C", "D"]);
    /// ```
    pub fn leaf_labels(&self) -> Result<Vec<String>, TreeError> {
        let mut seen = HashSet::new();
        let mut labels = Vec::new();
        for leaf in self.get_leaves() {
            let name = self.get(&leaf)?.name.clone().ok_or(TreeError::UnnamedLeaves)?;
            if !seen.insert(name.clone()) {
                return Err(TreeError::DuplicateLeafNames(name));
            }
            labels.push(name);
        }

        Ok(labels)
    }

    /// Number of nodes in the tree
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    /// Number of leaves in the tree
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_tip()).count()
    }

    /// Gets the node ids of all the leaves in the subtree rooted at the specified
    /// node, from left to right.
    /// ```
    /// use stbl::tree::Tree;
    ///
    /// let tree = Tree::from_newick("(A:0.1,B:0.2,(C:0.3,D:0.4)E:0.5)F;").unwrap();
    /// let sub_root = tree.get_by_name("E").unwrap();
    /// let sub_leaves: Vec<_> = tree.get_subtree_leaves(&sub_root.id)
    ///     .unwrap()
    ///     .iter()
    ///     .filter_map(|id| tree.get(id).unwrap().name.clone())
    ///     .collect();
    ///
    /// assert_eq!(sub_leaves, vec!["C", "D"])
    /// ```
    pub fn get_subtree_leaves(&self, root: &NodeId) -> Result<Vec<NodeId>, TreeError> {
        let mut leaves = vec![];
        for id in self.preorder(root)? {
            if self.get(&id)?.is_tip() {
                leaves.push(id);
            }
        }

        Ok(leaves)
    }
}

/// Methods to traverse the [`Tree`]
impl Tree {
    /// Returns node ids in [preorder](https://en.wikipedia.org/wiki/Tree_traversal#Pre-order,_NLR)
    /// ```
    /// use stbl::tree::Tree;
    ///
    /// let tree = Tree::from_newick("((A,(C,E)D)B,((H)I)G)F;").unwrap();
    /// let preorder: Vec<_> = tree.preorder(&tree.get_root().unwrap())
    ///     .unwrap()
    ///     .iter()
    ///     .filter_map(|id| tree.get(id).unwrap().name.clone())
    ///     .collect();
    ///
    /// assert_eq!(preorder, vec!["F", "B", "A", "D", "C", "E", "G", "I", "H"])
    /// ```
    pub fn preorder(&self, root: &NodeId) -> Result<Vec<NodeId>, TreeError> {
        let mut order = vec![];
        let mut stack = vec![*root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.get(&id)?.children.iter().rev());
        }

        Ok(order)
    }

    /// Returns node ids in [postorder](https://en.wikipedia.org/wiki/Tree_traversal#Post-order,_LRN):
    /// every node comes after all of its descendants.
    /// ```
    /// use stbl::tree::Tree;
    ///
    /// let tree = Tree::from_newick("((A,(C,E)D)B,((H)I)G)F;").unwrap();
    /// let postorder: Vec<_> = tree.postorder(&tree.get_root().unwrap())
    ///     .unwrap()
    ///     .iter()
    ///     .filter_map(|id| tree.get(id).unwrap().name.clone())
    ///     .collect();
    ///
    /// assert_eq!(postorder, vec!["A", "C", "E", "D", "B", "H", "I", "G", "F"])
    /// ```
    pub fn postorder(&self, root: &NodeId) -> Result<Vec<NodeId>, TreeError> {
        let mut order = vec![];
        let mut stack = vec![(*root, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            stack.push((id, true));
            for child in self.get(&id)?.children.iter().rev() {
                stack.push((*child, false));
            }
        }

        Ok(order)
    }

    /// Internal (non-leaf) nodes of the whole tree, in postorder.
    pub fn postorder_internal(&self) -> Result<Vec<NodeId>, TreeError> {
        let mut internal = vec![];
        for id in self.postorder(&self.get_root()?)? {
            if !self.get(&id)?.is_tip() {
                internal.push(id);
            }
        }

        Ok(internal)
    }

    /// Every edge of the tree as a `(parent, child)` pair, ordered by a
    /// postorder traversal of the child nodes. The root has no incoming edge.
    /// ```
    /// use stbl::tree::Tree;
    ///
    /// let tree = Tree::from_newick("((A,B)E,C)R;").unwrap();
    /// // R=0 E=1 A=2 B=3 C=4
    /// assert_eq!(tree.postorder_edges().unwrap(), vec![(1, 2), (1, 3), (0, 1), (0, 4)]);
    /// ```
    pub fn postorder_edges(&self) -> Result<Vec<Edge>, TreeError> {
        let mut edges = vec![];
        for id in self.postorder(&self.get_root()?)? {
            if let Some(parent) = self.get(&id)?.parent {
                edges.push((parent, id));
            }
        }

        Ok(edges)
    }
}

/// Methods to find paths and distances in the [`Tree`]
impl Tree {
    /// Returns the path from the root to the node
    /// ```
    /// use stbl::tree::Tree;
    ///
    /// let tree = Tree::from_newick("((A,(C,E)D)B,((H)I)G)F;").unwrap();
    /// let e = tree.get_by_name("E").unwrap().id;
    /// let path: Vec<_> = tree.get_path_from_root(&e)
    ///     .unwrap()
    ///     .iter()
    ///     .filter_map(|id| tree.get(id).unwrap().name.clone())
    ///     .collect();
    ///
    /// assert_eq!(path, vec!["F", "B", "D", "E"])
    /// ```
    pub fn get_path_from_root(&self, node: &NodeId) -> Result<Vec<NodeId>, TreeError> {
        let mut path = vec![];
        let mut current_node = *node;
        loop {
            path.push(current_node);
            match self.get(&current_node)?.parent {
                Some(parent) => current_node = parent,
                None => break,
            }
        }
        path.reverse();

        Ok(path)
    }

    /// Gets the most recent common ancestor between two tree nodes
    /// ```
    /// use stbl::tree::Tree;
    ///
    /// let tree = Tree::from_newick("((A,(C,E)D)B,((H)I)G)F;").unwrap();
    /// let ancestor = tree.get_common_ancestor(
    ///     &tree.get_by_name("A").unwrap().id,
    ///     &tree.get_by_name("D").unwrap().id,
    /// ).unwrap();
    ///
    /// assert_eq!(tree.get(&ancestor).unwrap().name, Some("B".to_owned()))
    /// ```
    pub fn get_common_ancestor(
        &self,
        source: &NodeId,
        target: &NodeId,
    ) -> Result<NodeId, TreeError> {
        let root_to_source = self.get_path_from_root(source)?;
        let root_to_target = self.get_path_from_root(target)?;

        root_to_source
            .iter()
            .zip(root_to_target.iter())
            .take_while(|(s, t)| s == t)
            .map(|(s, _)| *s)
            .last()
            .ok_or(TreeError::RootNotFound)
    }

    /// Edges traversed when walking up from `node` to `ancestor`, as
    /// `(parent, child)` pairs starting at `node`.
    pub fn path_to_ancestor(
        &self,
        node: &NodeId,
        ancestor: &NodeId,
    ) -> Result<Vec<Edge>, TreeError> {
        let mut edges = vec![];
        let mut current = *node;
        while current != *ancestor {
            match self.get(&current)?.parent {
                Some(parent) => {
                    edges.push((parent, current));
                    current = parent;
                }
                None => {
                    return Err(TreeError::NotAnAncestor {
                        node: *node,
                        ancestor: *ancestor,
                    })
                }
            }
        }

        Ok(edges)
    }

    /// Distance from the root to every node, indexed by [`NodeId`]. Every
    /// non-root node must carry a branch length. The length of the edge
    /// above the root, if any, is ignored.
    pub fn root_distances(&self) -> Result<Vec<EdgeLength>, TreeError> {
        let mut distances = vec![0.0; self.nodes.len()];
        for id in self.preorder(&self.get_root()?)? {
            let node = self.get(&id)?;
            if let Some(parent) = node.parent {
                let length = node.parent_edge.ok_or(TreeError::MissingBranchLengths(id))?;
                distances[id] = distances[parent] + length;
            }
        }

        Ok(distances)
    }

    /// Sets the length of the branch between a node and its parent
    pub fn set_parent_edge(&mut self, id: &NodeId, length: EdgeLength) -> Result<(), TreeError> {
        self.get_mut(id)?.parent_edge = Some(length);
        Ok(())
    }
}

/// Methods to read and write [`Tree`] objects
impl Tree {
    fn to_newick_impl(&self, root: &NodeId, format: NewickFormat) -> Result<String, TreeError> {
        let node = self.get(root)?;
        if node.is_tip() {
            return Ok(node.to_newick(format));
        }

        let children: Vec<String> = node
            .children
            .iter()
            .map(|child| self.to_newick_impl(child, format))
            .collect::<Result<_, _>>()?;

        Ok(format!("({}){}", children.join(","), node.to_newick(format)))
    }

    /// Writes the tree as a newick formatted string
    /// # Example
    /// ```
    /// use stbl::tree::Tree;
    ///
    /// let newick = "(A:0.1,B:0.2,(C:0.3,D:0.4)E:0.5)F;";
    /// let tree = Tree::from_newick(newick).unwrap();
    ///
    /// assert_eq!(tree.to_newick().unwrap(), newick);
    /// ```
    pub fn to_newick(&self) -> Result<String, TreeError> {
        self.to_formatted_newick(NewickFormat::AllFields)
    }

    /// Writes the tree as a newick formatted string with a specified
    /// output format from [`NewickFormat`].
    /// ```
    /// use stbl::tree::{Tree, NewickFormat};
    ///
    /// let tree = Tree::from_newick("(A:0.1,B:0.2,(C:0.3,D:0.4)E:0.5[x])F;").unwrap();
    ///
    /// assert_eq!(tree.to_formatted_newick(NewickFormat::Topology).unwrap(), "(,,(,));");
    /// assert_eq!(tree.to_formatted_newick(NewickFormat::OnlyNames).unwrap(), "(A,B,(C,D)E)F;");
    /// assert_eq!(
    ///     tree.to_formatted_newick(NewickFormat::NoComments).unwrap(),
    ///     "(A:0.1,B:0.2,(C:0.3,D:0.4)E:0.5)F;"
    /// );
    /// ```
    pub fn to_formatted_newick(&self, format: NewickFormat) -> Result<String, TreeError> {
        let root = self.get_root()?;
        Ok(self.to_newick_impl(&root, format)? + ";")
    }

    /// Read a newick formatted string and build a [`Tree`] struct from it.
    /// Labels may be quoted with `'` or `"`, `[...]` comments are attached to
    /// the node they follow. Underscores in labels are kept as is.
    /// # Example
    /// ```
    /// use stbl::tree::Tree;
    ///
    /// let tree = Tree::from_newick("(A:0.1,B:0.2,(C:0.3,D:0.4)E:0.5)F;").unwrap();
    ///
    /// assert_eq!(tree.size(), 6);
    /// assert_eq!(tree.n_leaves(), 4);
    /// ```
    pub fn from_newick(newick: &str) -> Result<Self, NewickParseError> {
        #[derive(Debug, PartialEq)]
        enum Field {
            Name,
            Length,
            Comment,
        }

        let mut tree = Tree::new();

        let mut parsing = Field::Name;
        let mut current_name: Option<String> = None;
        let mut current_length: Option<String> = None;
        let mut current_comment: Option<String> = None;
        // Subtree that was just closed and still waits for its name/length
        let mut current_index: Option<NodeId> = None;
        let mut parent_stack: Vec<NodeId> = Vec::new();

        let mut quote: Option<char> = None;
        let mut name_done = false;
        let mut length_done = false;

        for c in newick.chars() {
            if let Some(q) = quote {
                if c == q {
                    quote = None;
                } else {
                    current_name.get_or_insert_with(String::new).push(c);
                }
                continue;
            }

            if parsing == Field::Comment {
                if c == ']' {
                    parsing = Field::Name;
                } else {
                    current_comment.get_or_insert_with(String::new).push(c);
                }
                continue;
            }

            if c.is_whitespace() {
                match parsing {
                    Field::Name if current_name.is_some() => name_done = true,
                    Field::Length if current_length.is_some() => length_done = true,
                    _ => (),
                }
                continue;
            }

            match c {
                '\'' | '"' if parsing == Field::Name => {
                    if name_done {
                        return Err(NewickParseError::WhiteSpaceInName);
                    }
                    quote = Some(c);
                }
                '[' => parsing = Field::Comment,
                ':' => {
                    if parsing == Field::Length || current_length.is_some() {
                        return Err(NewickParseError::UnexpectedCharacter(c));
                    }
                    parsing = Field::Length;
                }
                '(' => {
                    if current_index.is_some() {
                        return Err(NewickParseError::UnexpectedCharacter(c));
                    }
                    let id = match parent_stack.last() {
                        None if tree.size() == 0 => tree.add(Node::new()),
                        None => return Err(NewickParseError::NoSubtreeParent),
                        Some(parent) => tree.add_child(Node::new(), *parent, None)?,
                    };
                    parent_stack.push(id);
                }
                ',' | ')' | ';' => {
                    let id = match current_index.take() {
                        Some(id) => id,
                        None => match parent_stack.last() {
                            Some(parent) => tree.add_child(Node::new(), *parent, None)?,
                            None if c == ';' && tree.size() == 0 => {
                                if current_name.is_none() {
                                    return Err(NewickParseError::EmptyTree);
                                }
                                tree.add(Node::new())
                            }
                            None => return Err(NewickParseError::NoSubtreeParent),
                        },
                    };

                    let node = tree.get_mut(&id)?;
                    if let Some(name) = current_name.take() {
                        node.set_name(name);
                    }
                    if let Some(length) = current_length.take() {
                        node.parent_edge = Some(length.parse()?);
                    }
                    node.comment = current_comment.take();

                    parsing = Field::Name;
                    name_done = false;
                    length_done = false;

                    match c {
                        ',' if parent_stack.is_empty() => {
                            return Err(NewickParseError::NoSubtreeParent)
                        }
                        ')' => {
                            let parent = parent_stack
                                .pop()
                                .ok_or(NewickParseError::NoSubtreeParent)?;
                            current_index = Some(parent);
                        }
                        ';' => {
                            if !parent_stack.is_empty() {
                                return Err(NewickParseError::UnclosedBracket);
                            }
                            return Ok(tree);
                        }
                        _ => (),
                    }
                }
                _ => match parsing {
                    Field::Name => {
                        if name_done {
                            return Err(NewickParseError::WhiteSpaceInName);
                        }
                        current_name.get_or_insert_with(String::new).push(c)
                    }
                    Field::Length => {
                        if length_done {
                            return Err(NewickParseError::WhiteSpaceInNumber);
                        }
                        current_length.get_or_insert_with(String::new).push(c)
                    }
                    Field::Comment => unreachable!("comments are consumed before matching"),
                },
            }
        }

        if quote.is_some() {
            return Err(NewickParseError::UnclosedQuote);
        }
        if parsing == Field::Comment {
            return Err(NewickParseError::UnclosedComment);
        }

        Err(NewickParseError::NoClosingSemicolon)
    }

    /// Reads every `;`-terminated tree of a newick string.
    /// ```
    /// use stbl::tree::Tree;
    ///
    /// let trees = Tree::forest_from_newick("(A,B);\n(A,(B,C));\n").unwrap();
    /// assert_eq!(trees.len(), 2);
    /// assert_eq!(trees[1].n_leaves(), 3);
    /// ```
    pub fn forest_from_newick(newick: &str) -> Result<Vec<Self>, NewickParseError> {
        let trees: Vec<Self> = split_newick_statements(newick)
            .into_iter()
            .filter(|chunk| !chunk.trim().is_empty())
            .map(|chunk| Self::from_newick(&format!("{chunk};")))
            .collect::<Result<_, _>>()?;

        if trees.is_empty() {
            return Err(NewickParseError::EmptyTree);
        }

        Ok(trees)
    }

    /// Writes the tree to a newick file
    pub fn to_file(&self, path: &Path) -> Result<(), TreeError> {
        fs::write(path, self.to_formatted_newick(NewickFormat::NoComments)? + "\n")?;
        Ok(())
    }

    /// Creates a tree from the first tree of a newick file
    pub fn from_file(path: &Path) -> Result<Self, NewickParseError> {
        let mut trees = Self::forest_from_file(path)?;
        Ok(trees.swap_remove(0))
    }

    /// Reads every tree of a newick file
    pub fn forest_from_file(path: &Path) -> Result<Vec<Self>, NewickParseError> {
        let newick_string = fs::read_to_string(path)?;
        Self::forest_from_newick(&newick_string)
    }

    fn print_nodes(
        &self,
        root_idx: &NodeId,
        output_tree: &mut TreeBuilder,
    ) -> Result<(), TreeError> {
        let root = self.get(root_idx)?;
        let label = format!("{root}");

        if root.is_tip() {
            output_tree.add_empty_child(label);
        } else {
            output_tree.begin_child(label);
            for child_idx in root.children.iter() {
                self.print_nodes(child_idx, output_tree)?;
            }
            output_tree.end_child();
        }

        Ok(())
    }

    /// Print the tree to the console
    pub fn print(&self) -> Result<(), TreeError> {
        let root = self.get_root()?;
        let mut builder = TreeBuilder::new(format!("{}", self.get(&root)?));
        for child_idx in self.get(&root)?.children.iter() {
            self.print_nodes(child_idx, &mut builder)?;
        }
        print_tree(&builder.build())?;
        Ok(())
    }
}

/// Splits a string on `;` characters that are outside quotes and comments.
/// The terminating `;` is not included in the returned chunks.
pub(crate) fn split_newick_statements(input: &str) -> Vec<&str> {
    let mut chunks = vec![];
    let mut quote: Option<char> = None;
    let mut in_comment = false;
    let mut start = 0;

    for (i, c) in input.char_indices() {
        match (quote, in_comment, c) {
            (Some(q), _, c) if c == q => quote = None,
            (Some(_), _, _) => (),
            (None, true, ']') => in_comment = false,
            (None, true, _) => (),
            (None, false, '[') => in_comment = true,
            (None, false, '\'' | '"') => quote = Some(c),
            (None, false, ';') => {
                chunks.push(&input[start..i]);
                start = i + 1;
            }
            _ => (),
        }
    }
    if !input[start..].trim().is_empty() {
        chunks.push(&input[start..]);
    }

    chunks
}
