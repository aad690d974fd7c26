//! 补网构造：划分可达标识并计算在发生下封闭的终止标识集合.
use indexmap::IndexSet;
use rayon::prelude::*;

use crate::analysis::AnalysisError;
use crate::analysis::reachability::{ExploreConfig, ReachabilityGraph};
use crate::analysis::upward::UpwardClosure;
use crate::net::ids::StateId;
use crate::net::index_vec::IndexVec;
use crate::net::structure::Marking;
use crate::net::Net;

/// The complemented net: same structure as the source net, with the
/// reachable markings outside the forbidden region classified.
#[derive(Debug, Clone)]
pub struct Complement {
    /// Independent copy of the source net's places, transitions, arcs and
    /// labels.
    pub net: Net,
    pub initial: Marking,
    /// Reachable markings that dominate no forbidden generator, in
    /// breadth-first order.
    pub complement_states: IndexSet<Marking>,
    /// Complement states from which no single enabled firing leaves the
    /// complement.
    pub final_markings: IndexSet<Marking>,
}

pub fn complement(
    net: &Net,
    initial: &Marking,
    forbidden: &UpwardClosure,
) -> Result<Complement, AnalysisError> {
    complement_with(net, initial, forbidden, &ExploreConfig::default())
}

pub fn complement_with(
    net: &Net,
    initial: &Marking,
    forbidden: &UpwardClosure,
    config: &ExploreConfig,
) -> Result<Complement, AnalysisError> {
    if initial.len() != net.places_len() {
        return Err(AnalysisError::EmptyReachableSet {
            expected: net.places_len(),
            found: initial.len(),
        });
    }
    forbidden.check_dimension(net.places_len())?;
    let graph = ReachabilityGraph::explore_with(net, initial, config)?;
    Complement::from_graph(net, &graph, forbidden)
}

/// Runs one complementation per region over a single shared graph.
///
/// Results are returned in the order of `regions`.
pub fn complement_all(
    net: &Net,
    graph: &ReachabilityGraph,
    regions: &[UpwardClosure],
) -> Vec<Result<Complement, AnalysisError>> {
    regions
        .par_iter()
        .map(|region| Complement::from_graph(net, graph, region))
        .collect()
}

impl Complement {
    /// Classifies the markings of an already explored `graph`.
    ///
    /// The closure test walks the recorded edges of each state rather than
    /// firing transitions again; since the graph holds one edge per enabled
    /// transition, a state is final iff every recorded successor is itself
    /// a complement state. Disabled transitions impose nothing.
    pub fn from_graph(
        net: &Net,
        graph: &ReachabilityGraph,
        forbidden: &UpwardClosure,
    ) -> Result<Self, AnalysisError> {
        if graph.initial().len() != net.places_len() {
            return Err(AnalysisError::DimensionMismatch {
                expected: net.places_len(),
                found: graph.initial().len(),
            });
        }
        forbidden.check_dimension(net.places_len())?;

        let outside: IndexVec<StateId, bool> =
            graph.states().map(|marking| !forbidden.contains(marking)).collect();

        let complement_states: IndexSet<Marking> = graph
            .state_ids()
            .filter(|&state| outside[state])
            .map(|state| graph.marking(state).clone())
            .collect();

        let final_markings: IndexSet<Marking> = graph
            .state_ids()
            .filter(|&state| outside[state])
            .filter(|&state| {
                graph
                    .successors(state)
                    .iter()
                    .all(|&(_, target)| outside[target])
            })
            .map(|state| graph.marking(state).clone())
            .collect();

        log::info!(
            "complement: {} of {} reachable markings outside the forbidden region, {} final",
            complement_states.len(),
            graph.state_count(),
            final_markings.len()
        );
        if !outside[graph.initial_id()] {
            log::warn!(
                "initial marking {} already lies in the forbidden region",
                graph.initial()
            );
        }

        Ok(Self {
            net: net.clone(),
            initial: graph.initial().clone(),
            complement_states,
            final_markings,
        })
    }

    pub fn is_complement_state(&self, marking: &Marking) -> bool {
        self.complement_states.contains(marking)
    }

    pub fn is_final(&self, marking: &Marking) -> bool {
        self.final_markings.contains(marking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::structure::{Place, Transition};

    fn m(tokens: &[u64]) -> Marking {
        Marking::from_tokens(tokens.to_vec())
    }

    /// Two places; `step` moves a token from `a` to `b`, `back` returns it.
    fn shuttle() -> Net {
        let mut net = Net::empty();
        net.add_place(Place::new("a"));
        net.add_place(Place::new("b"));
        let step = net.add_transition(Transition::new("step", "x"));
        let back = net.add_transition(Transition::new("back", "y"));
        net.set_arc_vector(step, &[-1, 1]);
        net.set_arc_vector(back, &[1, -1]);
        net
    }

    #[test]
    fn closure_uses_edges_back_into_visited_states() {
        let net = shuttle();
        let result = complement(&net, &m(&[1, 0]), &UpwardClosure::single(m(&[2, 0]))).unwrap();

        // (0,1) returns to the initial marking through `back`; that edge
        // must be seen for (0,1) to count as final.
        assert_eq!(result.complement_states.len(), 2);
        assert!(result.is_final(&m(&[1, 0])));
        assert!(result.is_final(&m(&[0, 1])));
    }

    #[test]
    fn state_with_escaping_edge_is_not_final() {
        let net = shuttle();
        let result = complement(&net, &m(&[1, 0]), &UpwardClosure::single(m(&[0, 1]))).unwrap();

        assert_eq!(result.complement_states.iter().collect::<Vec<_>>(), vec![&m(&[1, 0])]);
        assert!(result.final_markings.is_empty());
        assert!(!result.is_complement_state(&m(&[0, 1])));
    }

    #[test]
    fn forbidden_initial_marking_leaves_empty_complement() {
        let net = shuttle();
        let result = complement(&net, &m(&[1, 0]), &UpwardClosure::single(m(&[0, 0]))).unwrap();

        assert!(result.complement_states.is_empty());
        assert!(result.final_markings.is_empty());
        assert_eq!(result.initial, m(&[1, 0]));
    }

    #[test]
    fn invalid_initial_marking_reports_empty_reachable_set() {
        let net = shuttle();
        let result = complement(&net, &m(&[1]), &UpwardClosure::empty());

        assert_eq!(
            result.unwrap_err(),
            AnalysisError::EmptyReachableSet {
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn generator_dimension_is_checked() {
        let net = shuttle();
        let result = complement(&net, &m(&[1, 0]), &UpwardClosure::single(m(&[1, 0, 0])));

        assert_eq!(
            result.unwrap_err(),
            AnalysisError::DimensionMismatch {
                expected: 2,
                found: 3
            }
        );
    }

    #[test]
    fn parallel_queries_match_sequential_ones() {
        let net = shuttle();
        let graph = ReachabilityGraph::explore(&net, &m(&[2, 0])).unwrap();
        let regions = vec![
            UpwardClosure::empty(),
            UpwardClosure::single(m(&[0, 2])),
            UpwardClosure::new([m(&[2, 0]), m(&[0, 2])]),
        ];

        let parallel = complement_all(&net, &graph, &regions);

        assert_eq!(parallel.len(), regions.len());
        for (region, result) in regions.iter().zip(parallel) {
            let sequential = Complement::from_graph(&net, &graph, region).unwrap();
            let result = result.unwrap();
            assert_eq!(result.complement_states, sequential.complement_states);
            assert_eq!(result.final_markings, sequential.final_markings);
        }
    }

    #[test]
    fn complemented_net_is_an_independent_copy() {
        let net = shuttle();
        let mut result = complement(&net, &m(&[1, 0]), &UpwardClosure::empty()).unwrap();

        assert_eq!(result.net, net);
        result.net.set_arc_vector(crate::net::TransitionId::new(0), &[0, 0]);
        assert_eq!(net.arc_vector(crate::net::TransitionId::new(0)), vec![-1, 1]);
    }
}
