//! 可达图构造：从初始标识出发的广度优先显式状态枚举.
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use indexmap::{IndexMap, IndexSet};
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, EdgeReference, NodeIndex};
use smallvec::SmallVec;

use crate::analysis::AnalysisError;
use crate::net::core::escape_label;
use crate::net::ids::{StateId, TransitionId};
use crate::net::index_vec::{Idx, IndexVec};
use crate::net::structure::Marking;
use crate::net::Net;

type Outgoing = SmallVec<[(TransitionId, StateId); 4]>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExploreConfig {
    /// 最多探索的状态数量. None 表示不设上限.
    pub state_limit: Option<usize>,
    /// 探索的时间上限. None 表示不设上限.
    pub time_limit: Option<Duration>,
}

impl ExploreConfig {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_state_limit(limit: usize) -> Self {
        Self {
            state_limit: Some(limit),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateGraphStats {
    pub state_count: usize,
    pub edge_count: usize,
    pub deadlock_count: usize,
}

/// The explored state space of a net from one initial marking.
///
/// States are numbered in discovery order, which for a FIFO traversal is
/// also breadth-first order; `StateId(0)` is always the initial marking.
/// Every enabled `(marking, transition)` pair is stored exactly once,
/// including edges that close cycles or re-enter known markings.
#[derive(Debug, Clone)]
pub struct ReachabilityGraph {
    states: IndexSet<Marking>,
    successors: IndexVec<StateId, Outgoing>,
    edge_count: usize,
}

/// Explores `net` from `initial` without any bound.
pub fn explore(net: &Net, initial: &Marking) -> Result<ReachabilityGraph, AnalysisError> {
    ReachabilityGraph::explore(net, initial)
}

impl ReachabilityGraph {
    pub fn explore(net: &Net, initial: &Marking) -> Result<Self, AnalysisError> {
        Self::explore_with(net, initial, &ExploreConfig::default())
    }

    pub fn explore_with(
        net: &Net,
        initial: &Marking,
        config: &ExploreConfig,
    ) -> Result<Self, AnalysisError> {
        if initial.len() != net.places_len() {
            return Err(AnalysisError::DimensionMismatch {
                expected: net.places_len(),
                found: initial.len(),
            });
        }

        let started = Instant::now();
        let mut states: IndexSet<Marking> = IndexSet::new();
        let mut successors: IndexVec<StateId, Outgoing> = IndexVec::new();
        let mut queue = VecDeque::new();
        let mut edge_count = 0usize;

        log::debug!(
            "exploring {} places / {} transitions from {}",
            net.places_len(),
            net.transitions_len(),
            initial
        );

        check_state_limit(config, states.len())?;
        let (initial_index, _) = states.insert_full(initial.clone());
        queue.push_back(StateId::from_usize(initial_index));

        // `states` doubles as the visited-or-queued set: a marking is only
        // enqueued the first time it is discovered.
        while let Some(state) = queue.pop_front() {
            if let Some(limit) = config.time_limit {
                if started.elapsed() > limit {
                    log::warn!(
                        "exploration exceeded {:?} after {} states",
                        limit,
                        states.len()
                    );
                    return Err(AnalysisError::DeadlineExceeded { limit });
                }
            }
            debug_assert_eq!(state.index(), successors.len());

            let marking = states[state.index()].clone();
            let mut outgoing = Outgoing::new();
            for transition in net.enabled_transitions(&marking) {
                let next = net.fire(&marking, transition)?;
                let target = match states.get_index_of(&next) {
                    Some(index) => StateId::from_usize(index),
                    None => {
                        check_state_limit(config, states.len())?;
                        let (index, _) = states.insert_full(next);
                        let id = StateId::from_usize(index);
                        queue.push_back(id);
                        id
                    }
                };
                outgoing.push((transition, target));
            }
            edge_count += outgoing.len();
            successors.push(outgoing);
        }

        log::info!(
            "reachability graph: {} states, {} edges in {:?}",
            states.len(),
            edge_count,
            started.elapsed()
        );

        Ok(Self {
            states,
            successors,
            edge_count,
        })
    }

    pub fn initial_id(&self) -> StateId {
        StateId::new(0)
    }

    pub fn initial(&self) -> &Marking {
        self.marking(self.initial_id())
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Visited markings in breadth-first order.
    pub fn states(&self) -> impl Iterator<Item = &Marking> {
        self.states.iter()
    }

    pub fn state_ids(&self) -> impl Iterator<Item = StateId> + use<> {
        (0..self.states.len()).map(StateId::from_usize)
    }

    pub fn contains(&self, marking: &Marking) -> bool {
        self.states.contains(marking)
    }

    pub fn state_id(&self, marking: &Marking) -> Option<StateId> {
        self.states.get_index_of(marking).map(StateId::from_usize)
    }

    /// # Panics
    ///
    /// Panics if `state` does not belong to this graph.
    pub fn marking(&self, state: StateId) -> &Marking {
        &self.states[state.index()]
    }

    pub fn successors(&self, state: StateId) -> &[(TransitionId, StateId)] {
        self.successors
            .get(state)
            .map(|outgoing| outgoing.as_slice())
            .unwrap_or(&[])
    }

    /// Destination of `transition` fired at `marking`, if that edge was
    /// explored.
    pub fn successor(&self, marking: &Marking, transition: TransitionId) -> Option<&Marking> {
        let state = self.state_id(marking)?;
        self.successors(state)
            .iter()
            .find(|(fired, _)| *fired == transition)
            .map(|(_, target)| self.marking(*target))
    }

    /// All `(source, transition, destination)` triples.
    pub fn edges(&self) -> impl Iterator<Item = (&Marking, TransitionId, &Marking)> {
        self.successors
            .iter_enumerated()
            .flat_map(move |(source, outgoing)| {
                outgoing.iter().map(move |&(transition, target)| {
                    (self.marking(source), transition, self.marking(target))
                })
            })
    }

    /// The transition relation as an owned `(marking, transition) -> marking`
    /// map.
    pub fn edge_map(&self) -> IndexMap<(Marking, TransitionId), Marking> {
        self.edges()
            .map(|(source, transition, target)| ((source.clone(), transition), target.clone()))
            .collect()
    }

    /// States without any enabled transition.
    pub fn deadlocks(&self) -> impl Iterator<Item = StateId> + '_ {
        self.successors
            .iter_enumerated()
            .filter(|(_, outgoing)| outgoing.is_empty())
            .map(|(state, _)| state)
    }

    pub fn stats(&self) -> StateGraphStats {
        StateGraphStats {
            state_count: self.state_count(),
            edge_count: self.edge_count,
            deadlock_count: self.deadlocks().count(),
        }
    }

    pub fn to_graph(&self) -> DiGraph<Marking, TransitionId> {
        let mut graph = DiGraph::with_capacity(self.state_count(), self.edge_count);
        for marking in self.states.iter() {
            graph.add_node(marking.clone());
        }
        for (source, outgoing) in self.successors.iter_enumerated() {
            for &(transition, target) in outgoing.iter() {
                graph.add_edge(
                    NodeIndex::new(source.index()),
                    NodeIndex::new(target.index()),
                    transition,
                );
            }
        }
        graph
    }

    pub fn dot(&self, net: &Net) -> String {
        let graph = self.to_graph();

        let mut edge_attr = |_, edge: EdgeReference<'_, TransitionId>| -> String {
            let transition = &net.transitions[*edge.weight()];
            format!(
                "label=\"{} / {}\"",
                escape_label(&transition.name),
                escape_label(&transition.label)
            )
        };
        let mut node_attr = |_, (idx, marking): (NodeIndex, &Marking)| -> String {
            format!("label=\"s{}\\n{}\"", idx.index(), marking)
        };

        format!(
            "{:?}",
            Dot::with_attr_getters(
                &graph,
                &[Config::EdgeNoLabel, Config::NodeNoLabel],
                &mut edge_attr,
                &mut node_attr
            )
        )
    }

    pub fn write_dot<P: AsRef<Path>>(&self, net: &Net, path: P) -> std::io::Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.dot(net))
    }
}

fn check_state_limit(config: &ExploreConfig, discovered: usize) -> Result<(), AnalysisError> {
    match config.state_limit {
        Some(limit) if discovered >= limit => {
            log::warn!("exploration stopped: more than {} states", limit);
            Err(AnalysisError::StateSpaceTooLarge { limit })
        }
        _ => Ok(()),
    }
}
