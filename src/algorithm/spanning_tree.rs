use std::collections::VecDeque;

use crate::common::VertexState;
use crate::graph::Graph;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TreeNode {
    pub(crate) parent: Option<usize>,
    pub(crate) children: Vec<usize>,
    pub(crate) depth: usize,
    pub(crate) tag: usize, // 0 for the root, one id per first-level subtree
}

/// Spanning tree rooted at the robot, one arena slot per vertex id.
#[derive(Debug, Clone)]
pub(crate) struct SpanningTree {
    pub(crate) root: usize,
    pub(crate) nodes: Vec<TreeNode>,
}

impl SpanningTree {
    pub(crate) fn build(graph: &Graph, root: usize) -> Self {
        let mut nodes = vec![
            TreeNode {
                parent: None,
                children: Vec::new(),
                depth: 0,
                tag: 0,
            };
            graph.len()
        ];
        let mut visited = vec![false; graph.len()];
        visited[root] = true;

        // Each direct neighbor of the root opens its own branch.
        let mut stack = Vec::with_capacity(graph.len());
        for (index, &neighbor) in graph.neighbors(root).iter().enumerate() {
            visited[neighbor] = true;
            nodes[neighbor].parent = Some(root);
            nodes[neighbor].depth = 1;
            nodes[neighbor].tag = index + 1;
            nodes[root].children.push(neighbor);
            stack.push(neighbor);
        }

        while let Some(current) = stack.pop() {
            for &neighbor in graph.neighbors(current) {
                if visited[neighbor] {
                    continue;
                }
                visited[neighbor] = true;
                nodes[neighbor].parent = Some(current);
                nodes[neighbor].depth = nodes[current].depth + 1;
                nodes[neighbor].tag = nodes[current].tag;
                nodes[current].children.push(neighbor);
                stack.push(neighbor);
            }
        }

        debug_assert!(
            visited.iter().all(|&seen| seen),
            "spanning tree must cover a connected graph"
        );
        SpanningTree { root, nodes }
    }

    pub(crate) fn tag(&self, vertex: usize) -> usize {
        self.nodes[vertex].tag
    }

    pub(crate) fn depth(&self, vertex: usize) -> usize {
        self.nodes[vertex].depth
    }

    pub(crate) fn parent(&self, vertex: usize) -> Option<usize> {
        self.nodes[vertex].parent
    }

    pub(crate) fn children(&self, vertex: usize) -> &[usize] {
        &self.nodes[vertex].children
    }

    /// Root to `target`, root excluded, target included.
    pub(crate) fn path_to(&self, target: usize) -> Vec<usize> {
        let mut path = Vec::with_capacity(self.depth(target));
        let mut current = target;
        while current != self.root {
            path.push(current);
            match self.parent(current) {
                Some(parent) => current = parent,
                None => break,
            }
        }
        path.reverse();
        path
    }

    /// Holes sharing the goal's branch tag, and every other hole.
    pub(crate) fn split_holes(&self, states: &[VertexState], goal: usize) -> (usize, usize) {
        let goal_tag = self.tag(goal);
        let mut front = 0;
        let mut back = 0;
        for (vertex, node) in self.nodes.iter().enumerate() {
            if states[vertex] != VertexState::Hole {
                continue;
            }
            if node.tag == goal_tag {
                front += 1;
            } else {
                back += 1;
            }
        }
        (front, back)
    }

    /// Holes strictly below `node`, breadth first.
    pub(crate) fn holes_below(&self, node: usize, states: &[VertexState]) -> Vec<usize> {
        let mut holes = Vec::new();
        let mut queue = VecDeque::from([node]);
        while let Some(current) = queue.pop_front() {
            for &child in self.children(current) {
                if states[child] == VertexState::Hole {
                    holes.push(child);
                }
                queue.push_back(child);
            }
        }
        holes
    }

    /// Nearest vertex behind the robot (away from the goal's branch) that
    /// offers more than one way on. The robot itself counts if the graph
    /// branches there.
    pub(crate) fn nearest_branch_behind(&self, graph: &Graph, goal: usize) -> Option<usize> {
        if graph.is_branch_vertex(self.root) {
            return Some(self.root);
        }

        let goal_tag = self.tag(goal);
        let mut current = *self
            .children(self.root)
            .iter()
            .find(|&&child| self.tag(child) != goal_tag)?;

        loop {
            match self.children(current) {
                [] => return None,
                [only] => current = *only,
                _ => return Some(current),
            }
        }
    }
}

/// Minimum holes needed to walk `path` (root excluded): every branch vertex
/// needs its run plus one sidestep, the last run needs its own length.
pub(crate) fn min_holes_needed(path: &[usize], graph: &Graph) -> usize {
    let mut run = 0;
    let mut min_holes = 0;
    for (index, &vertex) in path.iter().enumerate() {
        run += 1;
        if graph.is_branch_vertex(vertex) {
            min_holes = min_holes.max(run + 1);
            run = 1;
        } else if index == path.len() - 1 {
            min_holes = min_holes.max(run);
        }
    }
    min_holes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::{path_graph, star_graph};

    // 0 - 1 - 2 - 3
    //     |
    //     4 - 5
    //     |
    //     6
    fn forked_graph() -> Graph {
        let mut graph = Graph::new(7);
        for (u, v) in [(0, 1), (1, 2), (2, 3), (1, 4), (4, 5), (4, 6)] {
            graph.add_edge(u, v).unwrap();
        }
        graph
    }

    #[test]
    fn test_tags_follow_first_level_subtrees() {
        let graph = star_graph(3);
        let tree = SpanningTree::build(&graph, 1);
        assert_eq!(tree.root, 1);
        assert_eq!(tree.tag(1), 0);
        assert_eq!(tree.tag(0), 1);
        assert_eq!(tree.tag(2), 1);
        assert_eq!(tree.tag(3), 1);
        assert_eq!(tree.depth(3), 2);
        assert_eq!(tree.parent(1), None);
        assert_eq!(tree.parent(2), Some(0));
        assert_eq!(tree.children(0), &[2, 3]);

        let tree = SpanningTree::build(&graph, 0);
        assert_eq!(
            (1..=3).map(|leaf| tree.tag(leaf)).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_depth_is_parent_plus_one() {
        let graph = forked_graph();
        let tree = SpanningTree::build(&graph, 3);
        for vertex in 0..graph.len() {
            match tree.parent(vertex) {
                Some(parent) => assert_eq!(tree.depth(vertex), tree.depth(parent) + 1),
                None => assert_eq!(vertex, 3),
            }
        }
        assert_eq!(tree.path_to(6), vec![2, 1, 4, 6]);
        assert!(tree.path_to(3).is_empty());
    }

    #[test]
    fn test_cycle_neighbors_of_root_keep_own_tag() {
        // Triangle 0-1-2: both 1 and 2 are first-level, even though 2 is
        // also reachable through 1.
        let mut graph = Graph::new(3);
        graph.add_edge(0, 1).unwrap();
        graph.add_edge(1, 2).unwrap();
        graph.add_edge(2, 0).unwrap();
        let tree = SpanningTree::build(&graph, 0);
        assert_eq!(tree.tag(1), 1);
        assert_eq!(tree.tag(2), 2);
        assert_eq!(tree.depth(2), 1);
    }

    #[test]
    fn test_split_holes_and_holes_below() {
        let graph = forked_graph();
        let mut states = vec![VertexState::Hole; 7];
        states[0] = VertexState::Robot;
        states[2] = VertexState::Obstacle;
        states[5] = VertexState::Obstacle;
        let tree = SpanningTree::build(&graph, 0);

        // Everything hangs below vertex 1.
        assert_eq!(tree.split_holes(&states, 3), (4, 0));
        assert_eq!(tree.holes_below(1, &states), vec![4, 3, 6]);
        assert_eq!(tree.holes_below(4, &states), vec![6]);

        let mut states = states;
        states[0] = VertexState::Hole;
        states[1] = VertexState::Robot;
        let tree = SpanningTree::build(&graph, 1);
        assert_eq!(tree.split_holes(&states, 3), (1, 3));
    }

    #[test]
    fn test_min_holes_needed() {
        let graph = path_graph(5);
        let tree = SpanningTree::build(&graph, 0);
        assert_eq!(min_holes_needed(&tree.path_to(4), &graph), 4);

        let graph = forked_graph();
        let tree = SpanningTree::build(&graph, 0);
        // Path 1 (branch), 4 (branch), 6: the run into 4 needs 2 + 1.
        assert_eq!(min_holes_needed(&tree.path_to(6), &graph), 3);
        // Path 1 (branch), 2, 3: final run of three.
        assert_eq!(min_holes_needed(&tree.path_to(3), &graph), 3);

        let graph = star_graph(3);
        let tree = SpanningTree::build(&graph, 1);
        assert_eq!(min_holes_needed(&tree.path_to(2), &graph), 2);
    }

    #[test]
    fn test_nearest_branch_behind() {
        let graph = forked_graph();

        // Robot at 2, goal at 3: walk back through 1, which branches.
        let tree = SpanningTree::build(&graph, 2);
        assert_eq!(tree.nearest_branch_behind(&graph, 3), Some(1));

        // Robot on a branch vertex uses itself.
        let tree = SpanningTree::build(&graph, 1);
        assert_eq!(tree.nearest_branch_behind(&graph, 3), Some(1));

        // Nothing behind a dead end.
        let graph = path_graph(4);
        let tree = SpanningTree::build(&graph, 0);
        assert_eq!(tree.nearest_branch_behind(&graph, 3), None);
        let tree = SpanningTree::build(&graph, 1);
        assert_eq!(tree.nearest_branch_behind(&graph, 3), None);
    }
}
