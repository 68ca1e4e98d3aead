//! Search strategy enumerations understood by the route solving engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A closed enumeration of named heuristics.
pub trait Strategy: Copy + Eq + fmt::Debug + 'static {
    /// Label used in logs and errors.
    const KIND: &'static str;
    /// Every member, in declaration order.
    const ALL: &'static [Self];

    /// Exact wire name of the member.
    fn name(&self) -> &'static str;

    /// Exact, case-sensitive lookup by wire name.
    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|member| member.name() == name)
    }
}

/// Heuristic used to build the initial route before improvement starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FirstSolutionStrategy {
    Automatic,
    PathCheapestArc,
    Savings,
    Sweep,
    Christofides,
    AllUnperformed,
    BestInsertion,
    ParallelCheapestInsertion,
    LocalCheapestInsertion,
    GlobalCheapestArc,
    LocalCheapestArc,
    FirstUnboundMinValue,
}

impl Strategy for FirstSolutionStrategy {
    const KIND: &'static str = "first solution";
    const ALL: &'static [Self] = &[
        Self::Automatic,
        Self::PathCheapestArc,
        Self::Savings,
        Self::Sweep,
        Self::Christofides,
        Self::AllUnperformed,
        Self::BestInsertion,
        Self::ParallelCheapestInsertion,
        Self::LocalCheapestInsertion,
        Self::GlobalCheapestArc,
        Self::LocalCheapestArc,
        Self::FirstUnboundMinValue,
    ];

    fn name(&self) -> &'static str {
        match self {
            Self::Automatic => "AUTOMATIC",
            Self::PathCheapestArc => "PATH_CHEAPEST_ARC",
            Self::Savings => "SAVINGS",
            Self::Sweep => "SWEEP",
            Self::Christofides => "CHRISTOFIDES",
            Self::AllUnperformed => "ALL_UNPERFORMED",
            Self::BestInsertion => "BEST_INSERTION",
            Self::ParallelCheapestInsertion => "PARALLEL_CHEAPEST_INSERTION",
            Self::LocalCheapestInsertion => "LOCAL_CHEAPEST_INSERTION",
            Self::GlobalCheapestArc => "GLOBAL_CHEAPEST_ARC",
            Self::LocalCheapestArc => "LOCAL_CHEAPEST_ARC",
            Self::FirstUnboundMinValue => "FIRST_UNBOUND_MIN_VALUE",
        }
    }
}

/// Metaheuristic used to improve a route once one exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocalSearchStrategy {
    Automatic,
    GreedyDescent,
    GuidedLocalSearch,
    SimulatedAnnealing,
    TabuSearch,
}

impl Strategy for LocalSearchStrategy {
    const KIND: &'static str = "local search";
    const ALL: &'static [Self] = &[
        Self::Automatic,
        Self::GreedyDescent,
        Self::GuidedLocalSearch,
        Self::SimulatedAnnealing,
        Self::TabuSearch,
    ];

    fn name(&self) -> &'static str {
        match self {
            Self::Automatic => "AUTOMATIC",
            Self::GreedyDescent => "GREEDY_DESCENT",
            Self::GuidedLocalSearch => "GUIDED_LOCAL_SEARCH",
            Self::SimulatedAnnealing => "SIMULATED_ANNEALING",
            Self::TabuSearch => "TABU_SEARCH",
        }
    }
}

impl FromStr for FirstSolutionStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| Error::UnknownStrategy {
            kind: Self::KIND,
            name: s.to_string(),
        })
    }
}

impl FromStr for LocalSearchStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| Error::UnknownStrategy {
            kind: Self::KIND,
            name: s.to_string(),
        })
    }
}

impl fmt::Display for FirstSolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for LocalSearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A strategy as supplied by a caller: either already typed, a raw name that
/// still has to be matched against the enumeration, or some other JSON value
/// that never matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StrategyChoice<T> {
    Known(T),
    Named(String),
    Other(serde_json::Value),
}

impl<T: Strategy> StrategyChoice<T> {
    /// The typed member, if this choice names one exactly.
    pub fn resolve(&self) -> Option<T> {
        match self {
            StrategyChoice::Known(strategy) => Some(*strategy),
            StrategyChoice::Named(name) => T::from_name(name),
            StrategyChoice::Other(_) => None,
        }
    }
}

impl<T> From<T> for StrategyChoice<T> {
    fn from(value: T) -> Self {
        StrategyChoice::Known(value)
    }
}

impl From<&str> for StrategyChoice<FirstSolutionStrategy> {
    fn from(value: &str) -> Self {
        StrategyChoice::Named(value.to_string())
    }
}

impl From<&str> for StrategyChoice<LocalSearchStrategy> {
    fn from(value: &str) -> Self {
        StrategyChoice::Named(value.to_string())
    }
}
