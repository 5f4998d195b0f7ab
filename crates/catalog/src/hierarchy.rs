//! Category hierarchy rules.
//!
//! Categories form a forest through their optional `parent` link. The store
//! only keeps the integer parent reference; everything that needs to reason
//! about the tree (cycle prevention, bulk re-parenting, nested listings) works
//! on an in-memory arena built from the full category table.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use stockconf_core::{DomainError, DomainResult};

use crate::category::{Category, CategoryId};

/// Parent links of every known category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hierarchy {
    parents: BTreeMap<CategoryId, Option<CategoryId>>,
}

/// A parent change produced by [`Hierarchy::plan_update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reparent {
    pub category: CategoryId,
    pub parent: Option<CategoryId>,
}

struct Ancestry {
    chain: Vec<CategoryId>,
    /// The walk hit its bound, which only happens on a parent loop.
    looped: bool,
}

impl Hierarchy {
    pub fn new<'a>(categories: impl IntoIterator<Item = &'a Category>) -> Self {
        Self {
            parents: categories.into_iter().map(|c| (c.id, c.parent)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn contains(&self, id: CategoryId) -> bool {
        self.parents.contains_key(&id)
    }

    pub fn parent_of(&self, id: CategoryId) -> Option<CategoryId> {
        self.parents.get(&id).copied().flatten()
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: CategoryId) -> Vec<CategoryId> {
        self.walk(id).chain
    }

    // Bounded by the number of categories so a corrupt loop cannot spin forever.
    fn walk(&self, id: CategoryId) -> Ancestry {
        let mut chain = Vec::new();
        let mut current = self.parent_of(id);
        while let Some(parent) = current {
            if chain.len() >= self.parents.len() {
                return Ancestry { chain, looped: true };
            }
            chain.push(parent);
            current = self.parent_of(parent);
        }
        Ancestry {
            chain,
            looped: false,
        }
    }

    /// Every category below `id`, in breadth-first order.
    #[cfg(test)]
    fn descendants(&self, id: CategoryId) -> Vec<CategoryId> {
        let mut out = Vec::new();
        let mut seen = BTreeSet::from([id]);
        let mut frontier = vec![id];
        while !frontier.is_empty() {
            let mut next = Vec::new();
            for (child, parent) in &self.parents {
                if parent.is_some_and(|p| frontier.contains(&p)) && seen.insert(*child) {
                    out.push(*child);
                    next.push(*child);
                }
            }
            frontier = next;
        }
        out
    }

    /// Whether `candidate` sits anywhere below `id`.
    #[cfg(test)]
    fn is_descendant(&self, candidate: CategoryId, id: CategoryId) -> bool {
        self.walk(candidate).chain.contains(&id)
    }

    /// Check that `id` may hang under `parent`.
    ///
    /// Rejects self-parenting and any parent that is currently a descendant of
    /// `id`. Unknown parents are reported as not found.
    pub fn check_parent(&self, id: CategoryId, parent: Option<CategoryId>) -> DomainResult<()> {
        let Some(parent) = parent else {
            return Ok(());
        };
        if parent == id {
            return Err(DomainError::validation(
                "parent",
                "a category cannot be its own parent",
            ));
        }
        if !self.contains(parent) {
            return Err(DomainError::not_found(CategoryId::ENTITY, parent));
        }
        let ancestry = self.walk(parent);
        if ancestry.looped || ancestry.chain.contains(&id) {
            return Err(DomainError::validation(
                "parent",
                format!("category {parent} is a descendant of category {id}"),
            ));
        }
        Ok(())
    }

    pub fn set_parent(&mut self, id: CategoryId, parent: Option<CategoryId>) {
        self.parents.insert(id, parent);
    }

    /// Validate an edit of `id` and compute the child re-parenting it implies.
    ///
    /// The new parent of `id` is applied first, then every added child is
    /// checked against the updated tree and moved under `id`. Removed children
    /// are promoted to top level when they currently belong to `id`; others are
    /// left alone. The returned list never includes `id` itself.
    pub fn plan_update(
        &mut self,
        id: CategoryId,
        parent: Option<CategoryId>,
        add_children: &[CategoryId],
        remove_children: &[CategoryId],
    ) -> DomainResult<Vec<Reparent>> {
        if !self.contains(id) {
            return Err(DomainError::not_found(CategoryId::ENTITY, id));
        }
        self.check_parent(id, parent)?;
        self.set_parent(id, parent);

        let mut changes = Vec::new();
        for &child in add_children {
            if !self.contains(child) {
                return Err(DomainError::not_found(CategoryId::ENTITY, child));
            }
            if self.parent_of(child) == Some(id) {
                continue;
            }
            self.check_parent(child, Some(id)).map_err(|_| {
                DomainError::validation(
                    "add_children",
                    format!("category {child} cannot become a subcategory of category {id}"),
                )
            })?;
            self.set_parent(child, Some(id));
            changes.push(Reparent {
                category: child,
                parent: Some(id),
            });
        }

        for &child in remove_children {
            if !self.contains(child) {
                return Err(DomainError::not_found(CategoryId::ENTITY, child));
            }
            if self.parent_of(child) == Some(id) {
                self.set_parent(child, None);
                changes.push(Reparent {
                    category: child,
                    parent: None,
                });
            }
        }

        Ok(changes)
    }
}

/// A category with its subcategories attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<CategoryNode>,
}

#[cfg(test)]
impl CategoryNode {
    /// Number of categories in this subtree, including the node itself.
    fn size(&self) -> usize {
        1 + self.children.iter().map(CategoryNode::size).sum::<usize>()
    }
}

/// Arrange categories into top-level trees, siblings ordered by name.
///
/// Categories whose parent is missing from the input are treated as roots.
pub fn build_forest(mut categories: Vec<Category>) -> Vec<CategoryNode> {
    categories.sort_by(|a, b| a.name.cmp(&b.name));
    let known: BTreeSet<CategoryId> = categories.iter().map(|c| c.id).collect();

    let mut by_parent: BTreeMap<CategoryId, Vec<Category>> = BTreeMap::new();
    let mut roots = Vec::new();
    for category in categories {
        match category.parent {
            Some(parent) if parent != category.id && known.contains(&parent) => {
                by_parent.entry(parent).or_default().push(category)
            }
            _ => roots.push(category),
        }
    }

    let mut forest: Vec<CategoryNode> = roots
        .into_iter()
        .map(|c| attach(c, &mut by_parent))
        .collect();

    // Leftovers are only possible when stored data already contains a loop.
    while let Some((_, group)) = by_parent.pop_first() {
        for category in group {
            forest.push(attach(category, &mut by_parent));
        }
    }

    forest
}

/// Category listing: nested top-level trees, or every category flat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CategoryListing {
    Tree(Vec<CategoryNode>),
    Flat(Vec<Category>),
}

impl CategoryListing {
    pub fn new(mut categories: Vec<Category>, root_only: bool) -> Self {
        if root_only {
            Self::Tree(build_forest(categories))
        } else {
            categories.sort_by(|a, b| a.name.cmp(&b.name));
            Self::Flat(categories)
        }
    }

    /// Number of categories in the listing, nested ones included.
    #[cfg(test)]
    fn count(&self) -> usize {
        match self {
            Self::Tree(forest) => forest.iter().map(CategoryNode::size).sum(),
            Self::Flat(categories) => categories.len(),
        }
    }
}

fn attach(category: Category, by_parent: &mut BTreeMap<CategoryId, Vec<Category>>) -> CategoryNode {
    let children = by_parent.remove(&category.id).unwrap_or_default();
    let children = children.into_iter().map(|c| attach(c, by_parent)).collect();
    CategoryNode { category, children }
}

/// `{id, name}` pair returned by the subcategory lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildSummary {
    pub id: CategoryId,
    pub name: String,
}

/// Subcategory lookup payload, shaped `{ "results": [{ "id", "name" }, ...] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChildLookup {
    pub results: Vec<ChildSummary>,
}

impl ChildLookup {
    pub fn from_children(children: impl IntoIterator<Item = Category>) -> Self {
        let mut results: Vec<ChildSummary> = children
            .into_iter()
            .map(|c| ChildSummary {
                id: c.id,
                name: c.name,
            })
            .collect();
        results.sort_by(|a, b| a.name.cmp(&b.name));
        Self { results }
    }
}
