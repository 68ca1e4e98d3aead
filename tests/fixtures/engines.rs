//! Deterministic route solving engines for tests.

use std::sync::Mutex;

use route_planner::engine::{RouteSolvingEngine, SolveOutcome};
use route_planner::haversine::DistanceMatrix;
use route_planner::params::SolverParameters;

/// What an engine was asked to solve.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveCall {
    pub matrix: DistanceMatrix,
    pub depot: usize,
    pub params: SolverParameters,
}

/// Returns a fixed outcome and records every call.
#[derive(Debug)]
pub struct ScriptedEngine {
    outcome: SolveOutcome,
    calls: Mutex<Vec<SolveCall>>,
}

impl ScriptedEngine {
    pub fn new(outcome: SolveOutcome) -> Self {
        Self {
            outcome,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn solved(order: Vec<usize>, cost: f64) -> Self {
        Self::new(SolveOutcome::Solved { order, cost })
    }

    pub fn no_solution() -> Self {
        Self::new(SolveOutcome::NoSolution {
            reason: "fail_timeout".to_string(),
        })
    }

    pub fn unavailable() -> Self {
        Self::new(SolveOutcome::Unavailable {
            reason: "engine not installed".to_string(),
        })
    }

    pub fn calls(&self) -> Vec<SolveCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl RouteSolvingEngine for ScriptedEngine {
    fn solve(
        &self,
        matrix: &DistanceMatrix,
        depot: usize,
        params: &SolverParameters,
    ) -> SolveOutcome {
        self.calls.lock().unwrap().push(SolveCall {
            matrix: matrix.clone(),
            depot,
            params: *params,
        });
        self.outcome.clone()
    }
}

/// Greedy nearest-neighbour tour. Cost is the closed-tour matrix total.
#[derive(Debug, Default)]
pub struct NearestNeighborEngine;

impl RouteSolvingEngine for NearestNeighborEngine {
    fn solve(
        &self,
        matrix: &DistanceMatrix,
        depot: usize,
        _params: &SolverParameters,
    ) -> SolveOutcome {
        let n = matrix.len();
        let mut visited = vec![false; n];
        let mut order = vec![depot];
        visited[depot] = true;

        while order.len() < n {
            let last = *order.last().unwrap();
            let next = (0..n)
                .filter(|&j| !visited[j])
                .min_by_key(|&j| matrix.get(last, j).unwrap())
                .unwrap();
            visited[next] = true;
            order.push(next);
        }

        let cost: u64 = (0..n)
            .map(|i| u64::from(matrix.get(order[i], order[(i + 1) % n]).unwrap()))
            .sum();
        SolveOutcome::Solved {
            order,
            cost: cost as f64,
        }
    }
}
