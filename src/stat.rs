use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct Stats {
    pub costs: usize,
    pub time_us: usize,
    pub tree_rebuilds: usize,
    pub forward_moves: usize,
    pub backward_moves: usize,
    pub obstacle_moves: usize,
    pub robot_moves: usize,
}

impl Stats {
    pub(crate) fn print(&self) {
        info!(
            "Cost {:?} Time(microseconds) {:?} Tree rebuilds {:?} Forward/backward moves {:?}/{:?} Obstacle/robot moves {:?}/{:?}",
            self.costs,
            self.time_us,
            self.tree_rebuilds,
            self.forward_moves,
            self.backward_moves,
            self.obstacle_moves,
            self.robot_moves
        );
    }
}
