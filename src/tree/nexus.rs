//! Read trees from the `TREES` block of Nexus files.
//!
//! Only the parts of the format needed to get trees out are handled: the
//! `#NEXUS` header, `BEGIN TREES;` ... `END;` blocks, an optional `TRANSLATE`
//! table and `TREE name = <newick>;` statements. Other blocks are skipped.
//! ```
//! use stbl::tree::nexus::parse_nexus;
//!
//! let nexus = "#NEXUS
//! BEGIN TREES;
//!     TRANSLATE 1 Homo, 2 Pan, 3 Gorilla;
//!     TREE first = [&R] ((1:1,2:1):1,3:2);
//! END;
//! ";
//! let trees = parse_nexus(nexus).unwrap();
//! assert_eq!(trees[0].leaf_labels().unwrap(), vec!["Homo", "Pan", "Gorilla"]);
//! ```

use std::{collections::HashMap, fs, path::Path};

use thiserror::Error;

use super::tree_impl::split_newick_statements;
use super::{NewickParseError, Tree};

/// Errors that can occur when reading Nexus files.
#[derive(Error, Debug)]
pub enum NexusError {
    /// The file does not start with `#NEXUS`
    #[error("Missing #NEXUS header.")]
    MissingHeader,
    /// No `TREES` block with at least one tree was found
    #[error("No tree found in a TREES block.")]
    NoTrees,
    /// A `TREE` statement has no `=` sign
    #[error("Malformed TREE statement: {0}")]
    MalformedTreeStatement(String),
    /// A `TRANSLATE` entry is not a `token label` pair
    #[error("Malformed TRANSLATE entry: {0}")]
    MalformedTranslation(String),
    /// The newick string of a tree could not be parsed
    #[error("Could not parse tree {name}")]
    Newick {
        /// Name of the tree in the TREE statement
        name: String,
        /// Underlying newick error
        #[source]
        source: NewickParseError,
    },
    /// There was a [`std::io::Error`] when reading the file
    #[error("Problem reading file")]
    IoError(#[from] std::io::Error),
}

/// Reads a Nexus file and returns every tree of its `TREES` blocks.
pub fn read_nexus(path: &Path) -> Result<Vec<Tree>, NexusError> {
    let content = fs::read_to_string(path)?;
    parse_nexus(&content)
}

/// Parses a Nexus formatted string and returns every tree of its `TREES` blocks,
/// in file order, with translated leaf labels.
pub fn parse_nexus(content: &str) -> Result<Vec<Tree>, NexusError> {
    let content = content.trim_start();
    let has_header = content
        .get(..6)
        .map_or(false, |header| header.eq_ignore_ascii_case("#NEXUS"));
    if !has_header {
        return Err(NexusError::MissingHeader);
    }

    let mut trees = vec![];
    let mut in_trees_block = false;
    let mut translation: HashMap<String, String> = HashMap::new();

    for statement in split_newick_statements(&content[6..]) {
        let statement = strip_leading_comments(statement);
        let (keyword, rest) = split_keyword(statement);
        let keyword = keyword.to_ascii_uppercase();

        match keyword.as_str() {
            "BEGIN" => {
                in_trees_block = rest.trim().eq_ignore_ascii_case("TREES");
                translation.clear();
            }
            "END" | "ENDBLOCK" => in_trees_block = false,
            "TRANSLATE" if in_trees_block => {
                for entry in split_outside_quotes(rest, ',') {
                    let entry = entry.trim();
                    if entry.is_empty() {
                        continue;
                    }
                    let (token, label) = split_keyword(entry);
                    if label.trim().is_empty() {
                        return Err(NexusError::MalformedTranslation(entry.into()));
                    }
                    translation.insert(token.to_string(), unquote(label.trim()));
                }
            }
            "TREE" | "UTREE" if in_trees_block => {
                let (name, newick) = rest
                    .split_once('=')
                    .ok_or_else(|| NexusError::MalformedTreeStatement(statement.into()))?;
                let name = unquote(name.trim());
                let newick = strip_leading_comments(newick);
                let mut tree = Tree::from_newick(&format!("{newick};"))
                    .map_err(|source| NexusError::Newick { name, source })?;
                translate_leaves(&mut tree, &translation);
                trees.push(tree);
            }
            _ => (),
        }
    }

    if trees.is_empty() {
        return Err(NexusError::NoTrees);
    }

    Ok(trees)
}

fn translate_leaves(tree: &mut Tree, translation: &HashMap<String, String>) {
    if translation.is_empty() {
        return;
    }
    for leaf in tree.get_leaves() {
        if let Ok(node) = tree.get_mut(&leaf) {
            if let Some(label) = node.name.as_ref().and_then(|name| translation.get(name)) {
                node.name = Some(label.clone());
            }
        }
    }
}

/// Splits off the first whitespace delimited word of a statement.
fn split_keyword(statement: &str) -> (&str, &str) {
    let statement = statement.trim_start();
    match statement.find(char::is_whitespace) {
        Some(idx) => (&statement[..idx], &statement[idx..]),
        None => (statement, ""),
    }
}

fn strip_leading_comments(mut text: &str) -> &str {
    loop {
        text = text.trim_start();
        match text.strip_prefix('[').and_then(|rest| rest.split_once(']')) {
            Some((_, rest)) => text = rest,
            None => return text,
        }
    }
}

fn split_outside_quotes(text: &str, separator: char) -> Vec<&str> {
    let mut parts = vec![];
    let mut start = 0;
    let mut quote: Option<char> = None;
    for (i, c) in text.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => (),
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == separator => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            None => (),
        }
    }
    parts.push(&text[start..]);

    parts
}

fn unquote(label: &str) -> String {
    for q in ['\'', '"'] {
        if label.len() >= 2 && label.starts_with(q) && label.ends_with(q) {
            return label[1..label.len() - 1].to_string();
        }
    }
    label.to_string()
}
