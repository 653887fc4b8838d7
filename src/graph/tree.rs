//! Handle-keyed branch arena shared by every typed graph, with the
//! breadth-first closures used for inheritance queries.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::fuzzy::FuzzyMatcher;
use crate::handle::{Handle, HandleRegistry};

use super::branch::{push_handle, remove_handle, BranchMeta, Link};

/// Depth bound of a closure query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Depth {
    /// Follow edges until the closure is complete.
    #[default]
    Unbounded,
    /// Follow at most this many edges; `Limited(0)` yields nothing.
    Limited(u32),
}

impl Depth {
    /// Direct edges only.
    pub const DIRECT: Self = Self::Limited(1);

    /// True if an entity found after `level` edges is within bounds.
    #[must_use]
    pub const fn allows(self, level: u32) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Limited(max) => level <= max,
        }
    }

    /// The bound left after following one edge.
    #[must_use]
    pub const fn step(self) -> Self {
        match self {
            Self::Unbounded => Self::Unbounded,
            Self::Limited(max) => Self::Limited(max.saturating_sub(1)),
        }
    }
}

impl From<i32> for Depth {
    fn from(depth: i32) -> Self {
        u32::try_from(depth).map_or(Self::Unbounded, Self::Limited)
    }
}

/// A node stored in an [`EntityGraph`].
pub trait Branch: Clone + fmt::Debug {
    /// Builds an empty branch around its metadata.
    fn new(meta: BranchMeta) -> Self;
    /// Common metadata.
    fn meta(&self) -> &BranchMeta;
    /// Common metadata, mutably.
    fn meta_mut(&mut self) -> &mut BranchMeta;
}

/// Mother/child/disjoint edges of a hierarchical branch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HierarchyLinks {
    /// Direct parents.
    pub mothers: Vec<Link>,
    /// Direct children.
    pub children: Vec<Handle>,
    /// Entities declared disjoint with this one.
    pub disjoints: Vec<Handle>,
}

/// Branches that take part in an inheritance hierarchy.
pub trait Hierarchy: Branch {
    /// Hierarchy edges.
    fn links(&self) -> &HierarchyLinks;
    /// Hierarchy edges, mutably.
    fn links_mut(&mut self) -> &mut HierarchyLinks;
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Up,
    Down,
}

/// Arena of branches keyed by handle, with a name index.
///
/// Every cross-branch reference is a handle; a handle whose branch is gone
/// simply contributes nothing to traversals.
#[derive(Debug, Clone)]
pub struct EntityGraph<B> {
    branches: HashMap<Handle, B>,
    by_name: HashMap<String, Handle>,
    registry: Arc<HandleRegistry>,
}

impl<B: Branch> EntityGraph<B> {
    /// Creates an empty graph issuing handles from `registry`.
    #[must_use]
    pub fn new(registry: Arc<HandleRegistry>) -> Self {
        Self {
            branches: HashMap::new(),
            by_name: HashMap::new(),
            registry,
        }
    }

    /// Registry shared with the sibling graphs.
    #[must_use]
    pub fn registry(&self) -> &Arc<HandleRegistry> {
        &self.registry
    }

    /// Handle of the branch called `name`.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<Handle> {
        self.by_name.get(name).copied()
    }

    /// Branch by handle.
    #[must_use]
    pub fn get(&self, handle: Handle) -> Option<&B> {
        self.branches.get(&handle)
    }

    /// Branch by handle, mutably.
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut B> {
        self.branches.get_mut(&handle)
    }

    /// Branch by name.
    #[must_use]
    pub fn branch(&self, name: &str) -> Option<&B> {
        self.find(name).and_then(|h| self.branches.get(&h))
    }

    /// True if `handle` is a live branch of this graph.
    #[must_use]
    pub fn contains(&self, handle: Handle) -> bool {
        self.branches.contains_key(&handle)
    }

    /// Identifier of a branch.
    #[must_use]
    pub fn name(&self, handle: Handle) -> Option<&str> {
        self.branches.get(&handle).map(|b| b.meta().name.as_str())
    }

    /// Existing branch called `name`, or a new empty one.
    pub fn find_or_create(&mut self, name: &str) -> Handle {
        if let Some(handle) = self.find(name) {
            return handle;
        }
        let handle = self.registry.intern(name);
        self.branches.insert(handle, B::new(BranchMeta::new(name, handle)));
        self.by_name.insert(name.to_string(), handle);
        handle
    }

    /// Unlinks a branch from the arena. References held by other branches
    /// must be scrubbed by the caller.
    pub fn remove(&mut self, handle: Handle) -> Option<B> {
        let branch = self.branches.remove(&handle)?;
        self.by_name.remove(&branch.meta().name);
        Some(branch)
    }

    /// Iterates over every branch.
    pub fn iter(&self) -> impl Iterator<Item = &B> {
        self.branches.values()
    }

    /// Iterates over every branch, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut B> {
        self.branches.values_mut()
    }

    /// Handles of every branch.
    #[must_use]
    pub fn handles(&self) -> Vec<Handle> {
        self.branches.keys().copied().collect()
    }

    /// Number of branches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    /// True if the graph holds no branch.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// Maps handles to identifiers, skipping dead handles.
    #[must_use]
    pub fn names(&self, handles: &HashSet<Handle>) -> HashSet<String> {
        handles
            .iter()
            .filter_map(|h| self.name(*h).map(str::to_string))
            .collect()
    }

    /// True if `name` is a branch of this graph.
    #[must_use]
    pub fn touch(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Marks a branch dirty.
    pub fn mark_updated(&mut self, handle: Handle) {
        if let Some(branch) = self.branches.get_mut(&handle) {
            branch.meta_mut().mark_updated();
        }
    }

    /// Handles of dirty branches.
    #[must_use]
    pub fn updated(&self) -> Vec<Handle> {
        self.branches
            .values()
            .filter(|b| b.meta().updated)
            .map(|b| b.meta().handle)
            .collect()
    }

    /// Clears every dirty flag.
    pub fn clear_updated(&mut self) {
        for branch in self.branches.values_mut() {
            branch.meta_mut().updated = false;
        }
    }

    /// Adds a spoken label.
    pub fn add_label(&mut self, handle: Handle, lang: &str, label: &str) -> bool {
        self.branches.get_mut(&handle).is_some_and(|b| {
            let added = b.meta_mut().dictionary.add_spoken(lang, label);
            if added {
                b.meta_mut().mark_updated();
            }
            added
        })
    }

    /// Adds a muted label.
    pub fn add_muted_label(&mut self, handle: Handle, lang: &str, label: &str) -> bool {
        self.branches
            .get_mut(&handle)
            .is_some_and(|b| b.meta_mut().dictionary.add_muted(lang, label))
    }

    /// Removes a label from both dictionaries.
    pub fn remove_label(&mut self, handle: Handle, lang: &str, label: &str) -> bool {
        self.branches.get_mut(&handle).is_some_and(|b| {
            let removed = b.meta_mut().dictionary.remove(lang, label);
            if removed {
                b.meta_mut().mark_updated();
            }
            removed
        })
    }

    /// Preferred label in `lang`: the first spoken label without `_`,
    /// then any spoken label, then the identifier.
    #[must_use]
    pub fn get_name(&self, handle: Handle, lang: &str) -> Option<String> {
        let meta = self.branches.get(&handle)?.meta();
        let spoken = meta.dictionary.spoken(lang);
        let label = spoken
            .iter()
            .find(|l| !l.contains('_'))
            .or_else(|| spoken.first())
            .unwrap_or(&meta.name);
        Some(label.clone())
    }

    /// Spoken labels in `lang`, or the identifier when there are none.
    #[must_use]
    pub fn get_names(&self, handle: Handle, lang: &str) -> Vec<String> {
        let Some(branch) = self.branches.get(&handle) else {
            return Vec::new();
        };
        let meta = branch.meta();
        let spoken = meta.dictionary.spoken(lang);
        if spoken.is_empty() {
            vec![meta.name.clone()]
        } else {
            spoken.to_vec()
        }
    }

    /// Spoken and muted labels in `lang`, or the identifier when there are none.
    #[must_use]
    pub fn get_every_names(&self, handle: Handle, lang: &str) -> Vec<String> {
        let Some(branch) = self.branches.get(&handle) else {
            return Vec::new();
        };
        let meta = branch.meta();
        let every: Vec<String> = meta.dictionary.every(lang).cloned().collect();
        if every.is_empty() {
            vec![meta.name.clone()]
        } else {
            every
        }
    }

    /// Branches whose identifier or a label in `lang` equals `text`.
    #[must_use]
    pub fn find_by_label(&self, text: &str, lang: &str) -> HashSet<Handle> {
        self.branches
            .values()
            .filter(|b| {
                let meta = b.meta();
                meta.name == text || meta.dictionary.every(lang).any(|l| l == text)
            })
            .map(|b| b.meta().handle)
            .collect()
    }

    /// Branches at minimal normalized edit distance from `text`, as long as
    /// that distance does not exceed `threshold`.
    #[must_use]
    pub fn find_fuzzy(&self, text: &str, lang: &str, threshold: f64) -> HashSet<Handle> {
        let mut matcher = FuzzyMatcher::new(text, threshold);
        for branch in self.branches.values() {
            let meta = branch.meta();
            matcher.offer(&meta.name, meta.handle);
            for label in meta.dictionary.every(lang) {
                matcher.offer(label, meta.handle);
            }
        }
        matcher.finish().into_iter().collect()
    }

    /// Independent copy bound to another registry.
    #[must_use]
    pub fn deep_copy(&self, registry: Arc<HandleRegistry>) -> Self {
        Self {
            branches: self.branches.clone(),
            by_name: self.by_name.clone(),
            registry,
        }
    }
}

impl<B: Hierarchy> EntityGraph<B> {
    fn closure(&self, start: Handle, depth: Depth, direction: Direction) -> HashSet<Handle> {
        let mut visited = HashSet::from([start]);
        let mut result = HashSet::new();
        let mut frontier = vec![start];
        let mut level = 0;

        while !frontier.is_empty() && depth.allows(level + 1) {
            level += 1;
            let mut next = Vec::new();
            for handle in frontier {
                let Some(branch) = self.branches.get(&handle) else {
                    continue;
                };
                let links = branch.links();
                let neighbours: Vec<Handle> = match direction {
                    Direction::Up => links.mothers.iter().map(|l| l.target).collect(),
                    Direction::Down => links.children.clone(),
                };
                for neighbour in neighbours {
                    if self.branches.contains_key(&neighbour) && visited.insert(neighbour) {
                        result.insert(neighbour);
                        next.push(neighbour);
                    }
                }
            }
            frontier = next;
        }
        result
    }

    /// Ancestors within `depth` edges, excluding the entity itself.
    #[must_use]
    pub fn up(&self, handle: Handle, depth: Depth) -> HashSet<Handle> {
        self.closure(handle, depth, Direction::Up)
    }

    /// Descendants within `depth` edges, excluding the entity itself.
    #[must_use]
    pub fn down(&self, handle: Handle, depth: Depth) -> HashSet<Handle> {
        self.closure(handle, depth, Direction::Down)
    }

    /// The entity and all of its ancestors.
    #[must_use]
    pub fn up_inclusive(&self, handle: Handle) -> HashSet<Handle> {
        let mut set = self.up(handle, Depth::Unbounded);
        if self.contains(handle) {
            set.insert(handle);
        }
        set
    }

    /// The entity and all of its descendants.
    #[must_use]
    pub fn down_inclusive(&self, handle: Handle) -> HashSet<Handle> {
        let mut set = self.down(handle, Depth::Unbounded);
        if self.contains(handle) {
            set.insert(handle);
        }
        set
    }

    /// True if `ancestor` is `handle` or one of its ancestors.
    #[must_use]
    pub fn is_a(&self, handle: Handle, ancestor: Handle) -> bool {
        (handle == ancestor && self.contains(handle)) || self.up(handle, Depth::Unbounded).contains(&ancestor)
    }

    /// Keeps the members of `set` whose inclusive up-closure holds `selector`.
    #[must_use]
    pub fn select(&self, set: &HashSet<Handle>, selector: Handle) -> HashSet<Handle> {
        set.iter().copied().filter(|h| self.is_a(*h, selector)).collect()
    }

    /// Links `child` under `mother`. Returns false if the edge existed or
    /// either branch is missing.
    pub fn add_mother(&mut self, child: Handle, mother: Handle, weight: f64, inferred: bool) -> bool {
        if child == mother || !self.contains(child) || !self.contains(mother) {
            return false;
        }
        let Some(child_branch) = self.branches.get_mut(&child) else {
            return false;
        };
        let mothers = &mut child_branch.links_mut().mothers;
        if let Some(link) = mothers.iter_mut().find(|l| l.target == mother) {
            link.weight = weight;
            link.inferred = link.inferred && inferred;
            return false;
        }
        mothers.push(Link {
            target: mother,
            weight,
            inferred,
        });
        child_branch.meta_mut().mark_updated();
        if let Some(mother_branch) = self.branches.get_mut(&mother) {
            push_handle(&mut mother_branch.links_mut().children, child);
            mother_branch.meta_mut().mark_updated();
        }
        true
    }

    /// Removes the edge between `child` and `mother`.
    pub fn remove_mother(&mut self, child: Handle, mother: Handle) -> bool {
        let removed = self.branches.get_mut(&child).is_some_and(|b| {
            let mothers = &mut b.links_mut().mothers;
            let before = mothers.len();
            mothers.retain(|l| l.target != mother);
            let removed = mothers.len() != before;
            if removed {
                b.meta_mut().mark_updated();
            }
            removed
        });
        if let Some(mother_branch) = self.branches.get_mut(&mother) {
            if remove_handle(&mut mother_branch.links_mut().children, child) {
                mother_branch.meta_mut().mark_updated();
            }
        }
        removed
    }

    /// Declares `a` and `b` disjoint (both directions).
    pub fn add_disjoint(&mut self, a: Handle, b: Handle) -> bool {
        if a == b || !self.contains(a) || !self.contains(b) {
            return false;
        }
        let mut added = false;
        for (from, to) in [(a, b), (b, a)] {
            if let Some(branch) = self.branches.get_mut(&from) {
                if push_handle(&mut branch.links_mut().disjoints, to) {
                    branch.meta_mut().mark_updated();
                    added = true;
                }
            }
        }
        added
    }

    /// Removes a disjointness declaration (both directions).
    pub fn remove_disjoint(&mut self, a: Handle, b: Handle) -> bool {
        let mut removed = false;
        for (from, to) in [(a, b), (b, a)] {
            if let Some(branch) = self.branches.get_mut(&from) {
                removed |= remove_handle(&mut branch.links_mut().disjoints, to);
            }
        }
        removed
    }

    /// Everything disjoint with `handle`: entities declared disjoint with it
    /// or with one of its ancestors, plus all of their descendants.
    #[must_use]
    pub fn disjoint(&self, handle: Handle) -> HashSet<Handle> {
        let mut result = HashSet::new();
        for ancestor in self.up_inclusive(handle) {
            let Some(branch) = self.branches.get(&ancestor) else {
                continue;
            };
            for disjoint in &branch.links().disjoints {
                result.extend(self.down_inclusive(*disjoint));
            }
        }
        result
    }

    /// Removes every hierarchy edge pointing at `handle` from other branches.
    pub fn detach(&mut self, handle: Handle) {
        for branch in self.branches.values_mut() {
            let links = branch.links_mut();
            links.mothers.retain(|l| l.target != handle);
            remove_handle(&mut links.children, handle);
            remove_handle(&mut links.disjoints, handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Node {
        meta: BranchMeta,
        links: HierarchyLinks,
    }

    impl Branch for Node {
        fn new(meta: BranchMeta) -> Self {
            Self {
                meta,
                links: HierarchyLinks::default(),
            }
        }
        fn meta(&self) -> &BranchMeta {
            &self.meta
        }
        fn meta_mut(&mut self) -> &mut BranchMeta {
            &mut self.meta
        }
    }

    impl Hierarchy for Node {
        fn links(&self) -> &HierarchyLinks {
            &self.links
        }
        fn links_mut(&mut self) -> &mut HierarchyLinks {
            &mut self.links
        }
    }

    fn chain() -> (EntityGraph<Node>, Handle, Handle, Handle) {
        let mut graph = EntityGraph::<Node>::new(Arc::new(HandleRegistry::new()));
        let animal = graph.find_or_create("Animal");
        let mammal = graph.find_or_create("Mammal");
        let dog = graph.find_or_create("Dog");
        graph.add_mother(mammal, animal, 1.0, false);
        graph.add_mother(dog, mammal, 1.0, false);
        (graph, animal, mammal, dog)
    }

    #[test]
    fn depth_bounds_closure() {
        let (graph, animal, mammal, dog) = chain();
        assert_eq!(graph.up(dog, Depth::DIRECT), HashSet::from([mammal]));
        assert_eq!(graph.up(dog, Depth::Unbounded), HashSet::from([mammal, animal]));
        assert!(graph.up(dog, Depth::Limited(0)).is_empty());
        assert_eq!(graph.down(animal, Depth::Limited(2)), HashSet::from([mammal, dog]));
    }

    #[test]
    fn cycles_terminate() {
        let (mut graph, animal, mammal, dog) = chain();
        graph.add_mother(animal, dog, 1.0, false);
        let up = graph.up(dog, Depth::Unbounded);
        assert_eq!(up, HashSet::from([mammal, animal]));
    }

    #[test]
    fn find_or_create_does_not_duplicate() {
        let (mut graph, animal, ..) = chain();
        assert_eq!(graph.find_or_create("Animal"), animal);
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn disjoint_covers_descendants() {
        let (mut graph, _animal, mammal, dog) = chain();
        let rock = graph.find_or_create("Rock");
        let pebble = graph.find_or_create("Pebble");
        graph.add_mother(pebble, rock, 1.0, false);
        graph.add_disjoint(mammal, rock);
        assert_eq!(graph.disjoint(dog), HashSet::from([rock, pebble]));
    }

    #[test]
    fn select_uses_inclusive_closure() {
        let (graph, animal, mammal, dog) = chain();
        let set = HashSet::from([animal, mammal, dog]);
        assert_eq!(graph.select(&set, mammal), HashSet::from([mammal, dog]));
    }

    #[test]
    fn negative_depth_is_unbounded() {
        assert_eq!(Depth::from(-1), Depth::Unbounded);
        assert_eq!(Depth::from(2), Depth::Limited(2));
    }
}
