use std::collections::HashMap;

use super::spanning_tree::SpanningTree;

/// Tree distances against one spanning tree build. The cache lives and dies
/// with the tree: a rebuild replaces the whole oracle.
#[derive(Debug)]
pub(crate) struct DistanceOracle {
    tree: SpanningTree,
    cache: HashMap<(usize, usize), usize>,
}

impl DistanceOracle {
    pub(crate) fn new(tree: SpanningTree) -> Self {
        DistanceOracle {
            tree,
            cache: HashMap::new(),
        }
    }

    pub(crate) fn tree(&self) -> &SpanningTree {
        &self.tree
    }

    pub(crate) fn distance(&mut self, a: usize, b: usize) -> usize {
        if a == b {
            return 0;
        }

        let key = (a.min(b), a.max(b));
        if let Some(&distance) = self.cache.get(&key) {
            return distance;
        }

        let lca = self.lowest_common_ancestor(a, b);
        let distance = self.tree.depth(a) + self.tree.depth(b) - 2 * self.tree.depth(lca);
        self.cache.insert(key, distance);
        distance
    }

    fn lowest_common_ancestor(&self, mut a: usize, mut b: usize) -> usize {
        while self.tree.depth(a) > self.tree.depth(b) {
            a = self.parent_or_root(a);
        }
        while self.tree.depth(b) > self.tree.depth(a) {
            b = self.parent_or_root(b);
        }
        while a != b {
            a = self.parent_or_root(a);
            b = self.parent_or_root(b);
        }
        a
    }

    fn parent_or_root(&self, vertex: usize) -> usize {
        self.tree.parent(vertex).unwrap_or(self.tree.root)
    }

    #[cfg(test)]
    pub(crate) fn cached_pairs(&self) -> usize {
        self.cache.len()
    }
}
