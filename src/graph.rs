use std::collections::{BTreeMap, HashSet};

use crate::error::InstanceError;

#[derive(Debug, Clone)]
pub struct Vertex {
    pub neighbors: Vec<usize>, // Insertion ordered, no duplicates
}

impl Vertex {
    pub fn degree(&self) -> usize {
        self.neighbors.len()
    }
}

/// Undirected graph over vertex ids `0..N`. The edge set is fixed once an
/// instance is built; only vertex states change while solving.
#[derive(Debug, Clone)]
pub struct Graph {
    pub vertices: Vec<Vertex>,
    pub branch_vertices: HashSet<usize>,
}

impl Graph {
    pub fn new(vertex_count: usize) -> Self {
        Graph {
            vertices: vec![
                Vertex {
                    neighbors: Vec::new()
                };
                vertex_count
            ],
            branch_vertices: HashSet::new(),
        }
    }

    /// Build from an adjacency listing as stored in instance files, where each
    /// key lists (some of) its neighbors. Vertex ids must be dense.
    pub fn from_adjacency(edges: &BTreeMap<usize, Vec<usize>>) -> Result<Self, InstanceError> {
        let vertex_count = edges
            .iter()
            .flat_map(|(node, neighbors)| std::iter::once(node).chain(neighbors.iter()))
            .max()
            .map_or(0, |max| max + 1);

        let mut graph = Graph::new(vertex_count);
        for (&node, neighbors) in edges {
            for &neighbor in neighbors {
                graph.add_edge(node, neighbor)?;
            }
        }
        Ok(graph)
    }

    pub fn add_edge(&mut self, u: usize, v: usize) -> Result<(), InstanceError> {
        let vertex_count = self.len();
        for vertex in [u, v] {
            if vertex >= vertex_count {
                return Err(InstanceError::VertexOutOfRange {
                    vertex,
                    vertex_count,
                });
            }
        }
        if u == v {
            return Err(InstanceError::SelfLoop(u));
        }
        // Duplicate edges are silently merged.
        if self.vertices[u].neighbors.contains(&v) {
            return Ok(());
        }

        self.vertices[u].neighbors.push(v);
        self.vertices[v].neighbors.push(u);
        for vertex in [u, v] {
            if self.vertices[vertex].degree() > 2 {
                self.branch_vertices.insert(vertex);
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn contains(&self, vertex: usize) -> bool {
        vertex < self.len()
    }

    pub fn neighbors(&self, vertex: usize) -> &[usize] {
        &self.vertices[vertex].neighbors
    }

    pub fn degree(&self, vertex: usize) -> usize {
        self.vertices[vertex].degree()
    }

    pub fn is_branch_vertex(&self, vertex: usize) -> bool {
        self.branch_vertices.contains(&vertex)
    }

    pub fn edge_count(&self) -> usize {
        self.vertices.iter().map(Vertex::degree).sum::<usize>() / 2
    }

    /// Adjacency listing with every edge stored once, under its smaller end.
    pub fn to_adjacency(&self) -> BTreeMap<usize, Vec<usize>> {
        self.vertices
            .iter()
            .enumerate()
            .map(|(node, vertex)| {
                let mut upper: Vec<usize> = vertex
                    .neighbors
                    .iter()
                    .copied()
                    .filter(|&neighbor| neighbor > node)
                    .collect();
                upper.sort_unstable();
                (node, upper)
            })
            .collect()
    }

    pub fn is_connected(&self) -> bool {
        if self.is_empty() {
            return true;
        }

        let mut visited = vec![false; self.len()];
        let mut stack = vec![0];
        visited[0] = true;
        let mut reached = 1;

        while let Some(current) = stack.pop() {
            for &neighbor in self.neighbors(current) {
                if !visited[neighbor] {
                    visited[neighbor] = true;
                    reached += 1;
                    stack.push(neighbor);
                }
            }
        }

        reached == self.len()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn path_graph(vertex_count: usize) -> Graph {
        let mut graph = Graph::new(vertex_count);
        for v in 1..vertex_count {
            graph.add_edge(v - 1, v).unwrap();
        }
        graph
    }

    pub(crate) fn star_graph(leaves: usize) -> Graph {
        let mut graph = Graph::new(leaves + 1);
        for leaf in 1..=leaves {
            graph.add_edge(0, leaf).unwrap();
        }
        graph
    }

    #[test]
    fn test_branch_vertices_follow_degree() {
        let graph = star_graph(3);
        assert_eq!(graph.degree(0), 3);
        assert!(graph.is_branch_vertex(0));
        assert!(!graph.is_branch_vertex(1));

        let path = path_graph(5);
        assert!(path.branch_vertices.is_empty());
        assert_eq!(path.edge_count(), 4);
    }

    #[test]
    fn test_duplicate_edges_are_merged() {
        let mut graph = Graph::new(3);
        graph.add_edge(0, 1).unwrap();
        graph.add_edge(1, 0).unwrap();
        graph.add_edge(1, 2).unwrap();
        assert_eq!(graph.neighbors(1), &[0, 2]);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_rejects_bad_edges() {
        let mut graph = Graph::new(2);
        assert!(matches!(
            graph.add_edge(0, 5),
            Err(InstanceError::VertexOutOfRange { vertex: 5, .. })
        ));
        assert!(matches!(graph.add_edge(1, 1), Err(InstanceError::SelfLoop(1))));
    }

    #[test]
    fn test_connectivity() {
        assert!(path_graph(4).is_connected());

        let mut graph = Graph::new(4);
        graph.add_edge(0, 1).unwrap();
        graph.add_edge(2, 3).unwrap();
        assert!(!graph.is_connected());
    }

    #[test]
    fn test_adjacency_listing() {
        let mut edges = BTreeMap::new();
        edges.insert(0, vec![1, 2]);
        edges.insert(2, vec![3]);
        let graph = Graph::from_adjacency(&edges).unwrap();
        assert_eq!(graph.len(), 4);
        assert_eq!(graph.neighbors(2), &[0, 3]);

        let listing = graph.to_adjacency();
        assert_eq!(listing[&0], vec![1, 2]);
        assert_eq!(listing[&1], Vec::<usize>::new());
        assert_eq!(listing[&2], vec![3]);
    }
}
