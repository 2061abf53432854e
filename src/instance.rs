use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::common::VertexState;
use crate::error::InstanceError;
use crate::graph::Graph;

const NAME_WORDS: [&str; 48] = [
    "still", "characterize", "foot", "river", "lantern", "copper", "meadow", "signal", "harbor",
    "quiet", "branch", "window", "ember", "garden", "hollow", "marble", "needle", "orbit",
    "pepper", "quarry", "ribbon", "saddle", "timber", "valley", "walnut", "anchor", "beacon",
    "canvas", "dune", "falcon", "glacier", "hazel", "island", "jungle", "kettle", "lemon",
    "mirror", "nectar", "oyster", "pillow", "rocket", "silver", "thunder", "velvet", "willow",
    "yellow", "zephyr", "bridge",
];

/// On-disk instance layout: every edge listed once, under its smaller end.
#[derive(Debug, Serialize, Deserialize)]
struct InstanceRecord {
    edges: BTreeMap<usize, Vec<usize>>,
    obstacles: Vec<usize>,
    robot: usize,
    goal: usize,
    name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GeneratorParams {
    pub chain_count: usize,
    pub min_chain_length: usize,
    pub max_chain_length: usize,
    pub cycle_count: usize,
    pub obstacle_ratio: f64,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        GeneratorParams {
            chain_count: 3,
            min_chain_length: 1,
            max_chain_length: 3,
            cycle_count: 0,
            obstacle_ratio: 0.7,
        }
    }
}

impl GeneratorParams {
    /// Parameters for the `index`-th instance of a batch: one extra chain
    /// every ten instances.
    pub fn for_batch_index(&self, index: usize) -> Self {
        GeneratorParams {
            chain_count: self.chain_count + index / 10,
            ..self.clone()
        }
    }
}

/// A validated problem: connected graph, robot, goal and obstacle set.
#[derive(Debug, Clone)]
pub struct Instance {
    pub name: String,
    pub graph: Graph,
    pub obstacles: Vec<usize>,
    pub robot: usize,
    pub goal: usize,
}

impl Instance {
    pub fn new(
        name: impl Into<String>,
        graph: Graph,
        obstacles: Vec<usize>,
        robot: usize,
        goal: usize,
    ) -> Result<Self, InstanceError> {
        let vertex_count = graph.len();
        for &vertex in obstacles.iter().chain([robot, goal].iter()) {
            if !graph.contains(vertex) {
                return Err(InstanceError::VertexOutOfRange {
                    vertex,
                    vertex_count,
                });
            }
        }

        let mut seen = HashSet::new();
        for &obstacle in &obstacles {
            if !seen.insert(obstacle) {
                return Err(InstanceError::DuplicateObstacle(obstacle));
            }
        }
        if seen.contains(&robot) {
            return Err(InstanceError::RobotOnObstacle(robot));
        }
        if !graph.is_connected() {
            return Err(InstanceError::Disconnected);
        }

        Ok(Instance {
            name: name.into(),
            graph,
            obstacles,
            robot,
            goal,
        })
    }

    pub fn initial_states(&self) -> Vec<VertexState> {
        let mut states = vec![VertexState::Hole; self.graph.len()];
        for &obstacle in &self.obstacles {
            states[obstacle] = VertexState::Obstacle;
        }
        states[self.robot] = VertexState::Robot;
        states
    }

    pub fn from_json_str(json: &str) -> Result<Self, InstanceError> {
        let record: InstanceRecord = serde_json::from_str(json)?;
        Self::from_record(record)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, InstanceError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let record: InstanceRecord = serde_json::from_reader(reader)?;
        let instance = Self::from_record(record)?;
        info!(
            "Read instance: {} ({} vertices, {} obstacles)",
            instance.name,
            instance.graph.len(),
            instance.obstacles.len()
        );
        Ok(instance)
    }

    fn from_record(record: InstanceRecord) -> Result<Self, InstanceError> {
        let graph = Graph::from_adjacency(&record.edges)?;
        Self::new(
            record.name,
            graph,
            record.obstacles,
            record.robot,
            record.goal,
        )
    }

    pub fn to_json_string(&self) -> Result<String, InstanceError> {
        Ok(serde_json::to_string(&self.to_record())?)
    }

    fn to_record(&self) -> InstanceRecord {
        InstanceRecord {
            edges: self.graph.to_adjacency(),
            obstacles: self.obstacles.clone(),
            robot: self.robot,
            goal: self.goal,
            name: self.name.clone(),
        }
    }

    /// Write the instance as `<dir>/<name>.json`.
    pub fn export(&self, dir: &Path) -> Result<PathBuf, InstanceError> {
        let path = dir.join(format!("{}.json", self.name));
        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &self.to_record())?;
        writer.flush()?;
        Ok(path)
    }

    /// Random instance built from chains hanging off earlier chain endings,
    /// plus `cycle_count` extra vertices closing cycles between endings.
    /// Chains attach to endings, so `max_chain_length` is routinely exceeded.
    pub fn generate<R: Rng + ?Sized>(
        params: &GeneratorParams,
        rng: &mut R,
    ) -> Result<Self, InstanceError> {
        let mut edges: Vec<(usize, usize)> = Vec::new();
        let mut chain_endings: BTreeSet<usize> = BTreeSet::new();
        let mut current_index = 0;

        for _ in 0..params.chain_count {
            let mut starter = match pick(&chain_endings, rng) {
                Some(ending) => ending,
                None => current_index,
            };
            chain_endings.insert(starter);

            let chain_length = rng.gen_range(params.min_chain_length..=params.max_chain_length);
            for _ in 0..chain_length {
                edges.push((starter, current_index + 1));
                current_index += 1;
                starter = current_index;
            }
            chain_endings.insert(starter);
        }

        for _ in 0..params.cycle_count {
            current_index += 1;
            let first = pick(&chain_endings, rng).unwrap_or(0);
            let second = pick(&chain_endings, rng).unwrap_or(0);
            edges.push((first, current_index));
            edges.push((current_index, second));
        }

        let mut graph = Graph::new(current_index + 1);
        for (u, v) in edges {
            graph.add_edge(u, v)?;
        }

        let mut nodes: Vec<usize> = (0..graph.len()).collect();
        nodes.shuffle(rng);
        let robot = nodes.remove(0);

        let ratio = params.obstacle_ratio.clamp(0.0, 1.0);
        let obstacle_count = ((ratio * graph.len() as f64) as usize).min(nodes.len());
        let obstacles = nodes[..obstacle_count].to_vec();

        // The goal may land on an obstacle; the planner clears it like any
        // other vertex on the path.
        let goal = nodes.choose(rng).copied().unwrap_or(robot);

        let name = format!("{}-{}", graph.len(), random_name(rng));
        debug!("generated {name}: robot {robot}, goal {goal}, obstacles {obstacles:?}");
        Self::new(name, graph, obstacles, robot, goal)
    }
}

fn pick<R: Rng + ?Sized>(set: &BTreeSet<usize>, rng: &mut R) -> Option<usize> {
    set.iter().copied().collect::<Vec<_>>().choose(rng).copied()
}

pub fn random_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..3)
        .map(|_| *NAME_WORDS.choose(rng).unwrap_or(&"instance"))
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::path_graph;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_rejects_malformed_instances() {
        assert!(matches!(
            Instance::new("a", path_graph(3), vec![1, 1], 0, 2),
            Err(InstanceError::DuplicateObstacle(1))
        ));
        assert!(matches!(
            Instance::new("b", path_graph(3), vec![0], 0, 2),
            Err(InstanceError::RobotOnObstacle(0))
        ));
        assert!(matches!(
            Instance::new("c", path_graph(3), vec![], 0, 7),
            Err(InstanceError::VertexOutOfRange { vertex: 7, .. })
        ));

        let mut split = Graph::new(4);
        split.add_edge(0, 1).unwrap();
        split.add_edge(2, 3).unwrap();
        assert!(matches!(
            Instance::new("d", split, vec![], 0, 3),
            Err(InstanceError::Disconnected)
        ));
    }

    #[test]
    fn test_read_instance_json() {
        let json = r#"{"edges": {"0": [1, 2, 3], "1": [], "2": [], "3": []},
                       "obstacles": [0], "robot": 1, "goal": 2, "name": "star"}"#;
        let instance = Instance::from_json_str(json).unwrap();
        assert_eq!(instance.name, "star");
        assert_eq!(instance.graph.len(), 4);
        assert!(instance.graph.is_branch_vertex(0));
        assert_eq!(
            instance.initial_states(),
            vec![
                VertexState::Obstacle,
                VertexState::Robot,
                VertexState::Hole,
                VertexState::Hole
            ]
        );

        let reread = Instance::from_json_str(&instance.to_json_string().unwrap()).unwrap();
        assert_eq!(reread.graph.to_adjacency(), instance.graph.to_adjacency());
        assert_eq!(reread.obstacles, instance.obstacles);
    }

    #[test]
    fn test_batch_adds_a_chain_every_ten_instances() {
        let params = GeneratorParams::default();
        assert_eq!(params.for_batch_index(0).chain_count, 3);
        assert_eq!(params.for_batch_index(9).chain_count, 3);
        assert_eq!(params.for_batch_index(10).chain_count, 4);
        assert_eq!(params.for_batch_index(25).chain_count, 5);
        assert_eq!(params.for_batch_index(25).obstacle_ratio, params.obstacle_ratio);
    }

    #[test]
    fn test_generate_instance() {
        let mut rng = StdRng::seed_from_u64(7);
        let params = GeneratorParams {
            chain_count: 6,
            cycle_count: 2,
            ..GeneratorParams::default()
        };

        for _ in 0..20 {
            let instance = Instance::generate(&params, &mut rng).unwrap();
            let vertex_count = instance.graph.len();
            assert!(instance.graph.is_connected());
            assert!(instance.name.starts_with(&format!("{vertex_count}-")));
            assert!(!instance.obstacles.contains(&instance.robot));
            assert_ne!(instance.goal, instance.robot);
            assert_eq!(
                instance.obstacles.len(),
                ((0.7 * vertex_count as f64) as usize).min(vertex_count - 1)
            );
        }
    }
}
