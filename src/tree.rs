//! Owned directory tree backing [`MemoryStore`](crate::MemoryStore).
//!
//! Directories own their children exclusively; a child name is unique
//! within its directory by construction (`BTreeMap` key). The root
//! directory is created with the tree and can never be detached.

use std::collections::BTreeMap;
use std::time::SystemTime;

use crate::{DirEntry, FileType, IgfsError, IgfsPath, Metadata, Result};

/// A node of the namespace.
#[derive(Debug, Clone)]
pub(crate) enum Node {
    Directory {
        children: BTreeMap<String, Node>,
        modified: SystemTime,
    },
    File {
        content: Vec<u8>,
        modified: SystemTime,
    },
}

impl Node {
    pub(crate) fn empty_dir() -> Self {
        Node::Directory {
            children: BTreeMap::new(),
            modified: SystemTime::now(),
        }
    }

    pub(crate) fn empty_file() -> Self {
        Node::File {
            content: Vec::new(),
            modified: SystemTime::now(),
        }
    }

    pub(crate) fn metadata(&self) -> Metadata {
        match self {
            Node::Directory { modified, .. } => Metadata {
                file_type: FileType::Directory,
                size: 0,
                modified: *modified,
            },
            Node::File { content, modified } => Metadata {
                file_type: FileType::File,
                size: content.len() as u64,
                modified: *modified,
            },
        }
    }
}

#[derive(Debug)]
pub(crate) struct Tree {
    root: Node,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    pub(crate) fn new() -> Self {
        Self {
            root: Node::empty_dir(),
        }
    }

    /// Walk `path` from the root. Walking through a file yields `None`.
    pub(crate) fn get(&self, path: &IgfsPath) -> Option<&Node> {
        path.segments()
            .iter()
            .try_fold(&self.root, |node, segment| match node {
                Node::Directory { children, .. } => children.get(segment),
                Node::File { .. } => None,
            })
    }

    pub(crate) fn get_mut(&mut self, path: &IgfsPath) -> Option<&mut Node> {
        path.segments()
            .iter()
            .try_fold(&mut self.root, |node, segment| match node {
                Node::Directory { children, .. } => children.get_mut(segment),
                Node::File { .. } => None,
            })
    }

    /// Parent directory of `path` as (children, modified), plus the last segment.
    fn parent_dir_mut<'a>(
        &mut self,
        path: &'a IgfsPath,
    ) -> Result<(&mut BTreeMap<String, Node>, &mut SystemTime, &'a str)> {
        let (name, _) = path
            .segments()
            .split_last()
            .ok_or_else(|| IgfsError::conflict(path, "root directory"))?;
        let parent = path.parent().ok_or_else(|| IgfsError::conflict(path, "root directory"))?;
        match self.get_mut(&parent) {
            Some(Node::Directory { children, modified }) => Ok((children, modified, name.as_str())),
            Some(Node::File { .. }) => Err(IgfsError::conflict(parent, "parent is a file")),
            None => Err(IgfsError::not_found(parent)),
        }
    }

    /// Attach `node` at `path`. The parent must be an existing directory and
    /// the name must be free.
    pub(crate) fn insert(&mut self, path: &IgfsPath, node: Node) -> Result<()> {
        let (children, modified, name) = self.parent_dir_mut(path)?;
        if children.contains_key(name) {
            return Err(IgfsError::conflict(path, "already exists"));
        }
        children.insert(name.to_owned(), node);
        *modified = SystemTime::now();
        Ok(())
    }

    /// Attach `node` at `path`, returning the node it displaced. The parent
    /// must be an existing directory.
    pub(crate) fn replace(&mut self, path: &IgfsPath, node: Node) -> Result<Option<Node>> {
        let (children, modified, name) = self.parent_dir_mut(path)?;
        let displaced = children.insert(name.to_owned(), node);
        *modified = SystemTime::now();
        Ok(displaced)
    }

    /// Detach the node at `path` together with its subtree, in one step.
    pub(crate) fn detach(&mut self, path: &IgfsPath) -> Result<Node> {
        let (children, modified, name) = self.parent_dir_mut(path)?;
        let node = children
            .remove(name)
            .ok_or_else(|| IgfsError::not_found(path))?;
        *modified = SystemTime::now();
        Ok(node)
    }

    pub(crate) fn list(&self, path: &IgfsPath) -> Result<Vec<DirEntry>> {
        match self.get(path) {
            Some(Node::Directory { children, .. }) => children
                .iter()
                .map(|(name, child)| {
                    let meta = child.metadata();
                    Ok(DirEntry {
                        name: name.clone(),
                        path: path.join(name)?,
                        file_type: meta.file_type,
                        size: meta.size,
                    })
                })
                .collect(),
            Some(Node::File { .. }) => Err(IgfsError::conflict(path, "not a directory")),
            None => Err(IgfsError::not_found(path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PathResolver;

    fn p(s: &str) -> IgfsPath {
        PathResolver::new("igfs").resolve(s).unwrap()
    }

    #[test]
    fn root_always_present() {
        let tree = Tree::new();
        assert!(matches!(tree.get(&p("igfs:///")), Some(Node::Directory { .. })));
    }

    #[test]
    fn insert_requires_directory_parent() {
        let mut tree = Tree::new();
        assert!(matches!(
            tree.insert(&p("igfs:///a/b"), Node::empty_dir()),
            Err(IgfsError::NotFound { .. })
        ));
        tree.insert(&p("igfs:///f"), Node::empty_file()).unwrap();
        assert!(matches!(
            tree.insert(&p("igfs:///f/x"), Node::empty_file()),
            Err(IgfsError::Conflict { .. })
        ));
    }

    #[test]
    fn insert_rejects_duplicate_name() {
        let mut tree = Tree::new();
        tree.insert(&p("igfs:///a"), Node::empty_dir()).unwrap();
        assert!(matches!(
            tree.insert(&p("igfs:///a"), Node::empty_file()),
            Err(IgfsError::Conflict { .. })
        ));
    }

    #[test]
    fn detach_removes_whole_subtree() {
        let mut tree = Tree::new();
        tree.insert(&p("igfs:///a"), Node::empty_dir()).unwrap();
        tree.insert(&p("igfs:///a/b"), Node::empty_dir()).unwrap();
        tree.insert(&p("igfs:///a/b/f"), Node::empty_file()).unwrap();

        let detached = tree.detach(&p("igfs:///a")).unwrap();
        assert!(matches!(detached, Node::Directory { .. }));
        assert!(tree.get(&p("igfs:///a")).is_none());
        assert!(tree.get(&p("igfs:///a/b/f")).is_none());
    }

    #[test]
    fn replace_displaces_existing_node() {
        let mut tree = Tree::new();
        tree.insert(&p("igfs:///f"), Node::empty_file()).unwrap();
        let displaced = tree.replace(&p("igfs:///f"), Node::empty_dir()).unwrap();
        assert!(matches!(displaced, Some(Node::File { .. })));
        assert!(matches!(tree.get(&p("igfs:///f")), Some(Node::Directory { .. })));
        assert!(tree.replace(&p("igfs:///g"), Node::empty_file()).unwrap().is_none());
        assert!(matches!(
            tree.replace(&p("igfs:///x/y"), Node::empty_file()),
            Err(IgfsError::NotFound { .. })
        ));
    }

    #[test]
    fn root_cannot_be_detached() {
        let mut tree = Tree::new();
        assert!(matches!(
            tree.detach(&p("igfs:///")),
            Err(IgfsError::Conflict { .. })
        ));
    }

    #[test]
    fn walking_through_file_finds_nothing() {
        let mut tree = Tree::new();
        tree.insert(&p("igfs:///f"), Node::empty_file()).unwrap();
        assert!(tree.get(&p("igfs:///f/g")).is_none());
    }

    #[test]
    fn list_returns_immediate_children_only() {
        let mut tree = Tree::new();
        tree.insert(&p("igfs:///d"), Node::empty_dir()).unwrap();
        tree.insert(&p("igfs:///d/2"), Node::empty_dir()).unwrap();
        tree.insert(&p("igfs:///d/2/3"), Node::empty_file()).unwrap();
        tree.insert(&p("igfs:///d/1"), Node::empty_file()).unwrap();

        let entries = tree.list(&p("igfs:///d")).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["1", "2"]);
        assert_eq!(entries[1].file_type, FileType::Directory);
        assert_eq!(entries[1].path, p("igfs:///d/2"));
    }
}
