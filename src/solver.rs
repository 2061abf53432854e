mod motion;

pub use motion::MotionPlanner;

use crate::common::Solution;
use crate::config::Config;
use crate::error::SolveError;

pub trait Solver {
    /// Run until the robot reaches its goal or the instance is proven
    /// unsolvable. Errors are planner bugs or the caller's iteration cap.
    fn solve(&mut self, config: &Config) -> Result<Solution, SolveError>;
}
