//! The category tree store.
//!
//! Categories arrive as a flat collection of records, each carrying its own
//! `parent_id`. [`CategoryTree::build`] turns that collection into an arena
//! of nodes indexed by id, with child lists resolved once and every
//! structural invariant checked at this single boundary:
//!
//! - every `parent_id` resolves inside the input set (no orphans),
//! - the parent chains are acyclic (a forest, single parent per node),
//! - each record's stored `level` equals its computed depth.
//!
//! Siblings are ordered by `order_seq`, with input order as tie-break.
//! The mutation primitives ([`CategoryTree::add_root`],
//! [`CategoryTree::add_child`], [`CategoryTree::rename`],
//! [`CategoryTree::remove_subtree`]) validate before touching any state,
//! so a rejected call leaves the tree unchanged.

use std::collections::{HashMap, VecDeque};

use crate::error::{BoqError, Result};
use crate::model::{CategoryId, CategoryNode, CategoryRecord};

/// A validated forest of category nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryTree {
    nodes: HashMap<CategoryId, CategoryNode>,
    roots: Vec<CategoryId>,
}

impl CategoryTree {
    /// An empty forest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from flat records.
    ///
    /// # Errors
    ///
    /// - [`BoqError::Validation`] on a duplicate id.
    /// - [`BoqError::OrphanParent`] when a `parent_id` does not resolve.
    /// - [`BoqError::Cycle`] when a parent chain loops (including
    ///   self-parenting).
    /// - [`BoqError::LevelMismatch`] when a stored level disagrees with the
    ///   computed depth.
    pub fn build(records: &[CategoryRecord]) -> Result<Self> {
        let mut parents: HashMap<CategoryId, Option<CategoryId>> =
            HashMap::with_capacity(records.len());
        for rec in records {
            if parents.insert(rec.id, rec.parent_id).is_some() {
                return Err(BoqError::validation(format!(
                    "duplicate category id {}",
                    rec.id
                )));
            }
        }

        // Orphan check before any depth walking.
        for rec in records {
            if let Some(parent) = rec.parent_id {
                if !parents.contains_key(&parent) {
                    return Err(BoqError::OrphanParent {
                        child: rec.id,
                        parent,
                    });
                }
            }
        }

        // Depth of every node, with cycle detection along the parent chain.
        let mut depths: HashMap<CategoryId, u32> = HashMap::with_capacity(records.len());
        for rec in records {
            let computed = computed_depth(rec.id, &parents, &mut depths)?;
            if computed != rec.level {
                return Err(BoqError::LevelMismatch {
                    id: rec.id,
                    stored: rec.level,
                    computed,
                });
            }
        }

        // Populate the arena and the child lists, in input order first.
        let mut nodes: HashMap<CategoryId, CategoryNode> = records
            .iter()
            .map(|rec| (rec.id, CategoryNode::from_record(rec)))
            .collect();
        let mut roots: Vec<CategoryId> = Vec::new();
        for rec in records {
            match rec.parent_id {
                Some(parent) => {
                    if let Some(node) = nodes.get_mut(&parent) {
                        node.children.push(rec.id);
                    }
                }
                None => roots.push(rec.id),
            }
        }

        // Sibling order: order_seq, ties broken by insertion order. The
        // sort is stable, so input order survives equal keys.
        let order_of = |id: &CategoryId, nodes: &HashMap<CategoryId, CategoryNode>| {
            nodes.get(id).map_or(0, |n| n.order_seq)
        };
        roots.sort_by_key(|id| order_of(id, &nodes));
        let ids: Vec<CategoryId> = nodes.keys().copied().collect();
        for id in ids {
            let mut children = nodes
                .get_mut(&id)
                .map(|n| std::mem::take(&mut n.children))
                .unwrap_or_default();
            children.sort_by_key(|c| order_of(c, &nodes));
            if let Some(node) = nodes.get_mut(&id) {
                node.children = children;
            }
        }

        Ok(Self { nodes, roots })
    }

    // -- Queries ------------------------------------------------------------

    #[must_use]
    pub fn get(&self, id: CategoryId) -> Option<&CategoryNode> {
        self.nodes.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: CategoryId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of categories in the forest.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Root categories in sibling order.
    #[must_use]
    pub fn roots(&self) -> &[CategoryId] {
        &self.roots
    }

    /// Direct children in sibling order; empty for unknown ids.
    #[must_use]
    pub fn children_of(&self, id: CategoryId) -> &[CategoryId] {
        self.nodes.get(&id).map_or(&[], |n| n.children.as_slice())
    }

    /// All category ids, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = CategoryId> + '_ {
        self.nodes.keys().copied()
    }

    /// Depth of `id`, derived by walking to the root. Equals the node's
    /// `level` by construction.
    ///
    /// # Errors
    ///
    /// [`BoqError::CategoryNotFound`] if `id` is not in the tree.
    pub fn depth_of(&self, id: CategoryId) -> Result<u32> {
        let mut node = self
            .nodes
            .get(&id)
            .ok_or(BoqError::CategoryNotFound { id })?;
        let mut depth = 0;
        while let Some(parent) = node.parent_id {
            // Parents always resolve: build checked orphans and the
            // mutation primitives never detach a referenced parent.
            match self.nodes.get(&parent) {
                Some(p) => node = p,
                None => break,
            }
            depth += 1;
        }
        Ok(depth)
    }

    /// Ids of the subtree rooted at `id`, in BFS order (root first).
    ///
    /// # Errors
    ///
    /// [`BoqError::CategoryNotFound`] if `id` is not in the tree.
    pub fn subtree_ids(&self, id: CategoryId) -> Result<Vec<CategoryId>> {
        if !self.contains(id) {
            return Err(BoqError::CategoryNotFound { id });
        }
        let mut result = Vec::new();
        let mut queue: VecDeque<CategoryId> = VecDeque::new();
        queue.push_back(id);
        while let Some(current) = queue.pop_front() {
            result.push(current);
            queue.extend(self.children_of(current).iter().copied());
        }
        Ok(result)
    }

    // -- Mutation primitives ------------------------------------------------

    /// Insert a new root category at level 0, `order_seq` = current root
    /// count.
    ///
    /// # Errors
    ///
    /// [`BoqError::Validation`] if `id` already exists.
    pub fn add_root(&mut self, id: CategoryId, name: String) -> Result<()> {
        if self.contains(id) {
            return Err(BoqError::validation(format!(
                "category id {id} already exists"
            )));
        }
        let order_seq = i64::try_from(self.roots.len()).unwrap_or(i64::MAX);
        self.nodes.insert(
            id,
            CategoryNode {
                id,
                name,
                parent_id: None,
                level: 0,
                order_seq,
                is_active: true,
                children: Vec::new(),
            },
        );
        self.roots.push(id);
        Ok(())
    }

    /// Insert a new category directly under `parent`, at `parent.level + 1`,
    /// `order_seq` = current sibling count.
    ///
    /// # Errors
    ///
    /// [`BoqError::CategoryNotFound`] if the parent is missing or inactive;
    /// [`BoqError::Validation`] if `id` already exists.
    pub fn add_child(&mut self, parent: CategoryId, id: CategoryId, name: String) -> Result<()> {
        let (level, order_seq) = match self.nodes.get(&parent) {
            Some(p) if p.is_active => (
                p.level + 1,
                i64::try_from(p.children.len()).unwrap_or(i64::MAX),
            ),
            _ => return Err(BoqError::CategoryNotFound { id: parent }),
        };
        if self.contains(id) {
            return Err(BoqError::validation(format!(
                "category id {id} already exists"
            )));
        }
        self.nodes.insert(
            id,
            CategoryNode {
                id,
                name,
                parent_id: Some(parent),
                level,
                order_seq,
                is_active: true,
                children: Vec::new(),
            },
        );
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        Ok(())
    }

    /// Rename a category in place.
    ///
    /// # Errors
    ///
    /// [`BoqError::CategoryNotFound`] if `id` is not in the tree.
    pub fn rename(&mut self, id: CategoryId, name: String) -> Result<()> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(BoqError::CategoryNotFound { id })?;
        node.name = name;
        Ok(())
    }

    /// Remove the subtree rooted at `id` and return the removed ids in BFS
    /// order. The caller cascades the ledger with the same id set, so the
    /// delete never orphans a line item.
    ///
    /// # Errors
    ///
    /// [`BoqError::CategoryNotFound`] if `id` is not in the tree.
    pub fn remove_subtree(&mut self, id: CategoryId) -> Result<Vec<CategoryId>> {
        let removed = self.subtree_ids(id)?;
        let parent_id = self.nodes.get(&id).and_then(|n| n.parent_id);
        for node_id in &removed {
            self.nodes.remove(node_id);
        }
        match parent_id {
            Some(parent) => {
                if let Some(p) = self.nodes.get_mut(&parent) {
                    p.children.retain(|c| *c != id);
                }
            }
            None => self.roots.retain(|r| *r != id),
        }
        Ok(removed)
    }
}

/// Depth of `start`, memoized across calls. Walks the parent chain,
/// detecting revisits within the current walk as cycles.
fn computed_depth(
    start: CategoryId,
    parents: &HashMap<CategoryId, Option<CategoryId>>,
    memo: &mut HashMap<CategoryId, u32>,
) -> Result<u32> {
    let mut path: Vec<CategoryId> = Vec::new();
    let mut current = start;
    // Depth assigned to the last node pushed onto `path` once the walk
    // terminates at a root (0) or a memoized ancestor (its depth + 1).
    let base = loop {
        if let Some(&d) = memo.get(&current) {
            break d + 1;
        }
        if path.contains(&current) {
            let pos = path.iter().position(|&c| c == current).unwrap_or(0);
            let mut cycle: Vec<CategoryId> = path[pos..].to_vec();
            cycle.push(current);
            return Err(BoqError::Cycle { path: cycle });
        }
        path.push(current);
        match parents.get(&current).copied().flatten() {
            Some(parent) => current = parent,
            None => break 0,
        }
    };
    let mut depth = base;
    for node in path.iter().rev() {
        memo.insert(*node, depth);
        depth += 1;
    }
    memo.get(&start)
        .copied()
        .ok_or(BoqError::CategoryNotFound { id: start })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
