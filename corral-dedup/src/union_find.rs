//! Disjoint sets over record indices, owned by a single merge pass.

/// Union-find with path compression and union by size.
///
/// Each root also keeps its member list so callers can inspect both sides
/// before deciding to join two sets.
#[derive(Debug, Clone)]
pub(crate) struct UnionFind {
    parent: Vec<usize>,
    members: Vec<Vec<usize>>,
}

impl UnionFind {
    /// `len` singleton sets.
    pub(crate) fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            members: (0..len).map(|index| vec![index]).collect(),
        }
    }

    /// Representative of `item`'s set.
    pub(crate) fn find(&mut self, item: usize) -> usize {
        let mut root = item;
        while let Some(&parent) = self.parent.get(root) {
            if parent == root {
                break;
            }
            root = parent;
        }
        let mut current = item;
        while current != root {
            let Some(slot) = self.parent.get_mut(current) else {
                break;
            };
            current = std::mem::replace(slot, root);
        }
        root
    }

    /// Members of the set rooted at `root`, in insertion order.
    pub(crate) fn members(&self, root: usize) -> &[usize] {
        self.members.get(root).map_or(&[][..], Vec::as_slice)
    }

    /// Join the sets holding `a` and `b`; returns the surviving root.
    pub(crate) fn union(&mut self, a: usize, b: usize) -> usize {
        let left = self.find(a);
        let right = self.find(b);
        if left == right {
            return left;
        }
        let (keep, absorb) = if self.members(left).len() >= self.members(right).len() {
            (left, right)
        } else {
            (right, left)
        };
        let moved = self
            .members
            .get_mut(absorb)
            .map(std::mem::take)
            .unwrap_or_default();
        if let Some(slot) = self.parent.get_mut(absorb) {
            *slot = keep;
        }
        if let Some(list) = self.members.get_mut(keep) {
            list.extend(moved);
        }
        keep
    }

    /// Every set as a sorted member list, ordered by smallest member.
    pub(crate) fn into_sets(mut self) -> Vec<Vec<usize>> {
        let roots: Vec<usize> = (0..self.parent.len())
            .filter(|&index| self.find(index) == index)
            .collect();
        let mut sets: Vec<Vec<usize>> = roots
            .into_iter()
            .filter_map(|root| self.members.get_mut(root).map(std::mem::take))
            .collect();
        for set in &mut sets {
            set.sort_unstable();
        }
        sets.sort_unstable();
        sets
    }
}
