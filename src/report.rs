//! 补网分析报告：按库所名称渲染标识，支持文本与 JSON 输出.
use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::analysis::{Complement, ReachabilityGraph};
use crate::net::io::{IoError, write_json};
use crate::net::{Marking, Net, Tokens};

/// A marking keyed by place name, in canonical place order.
pub type NamedMarking = IndexMap<String, Tokens>;

pub fn render_marking(net: &Net, marking: &Marking, include_zero_tokens: bool) -> NamedMarking {
    marking
        .iter()
        .filter(|(_, tokens)| include_zero_tokens || **tokens > 0)
        .map(|(place, tokens)| (net.places[place].name.clone(), *tokens))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportStats {
    pub reachable: usize,
    pub edges: usize,
    pub deadlocks: usize,
    pub complement_states: usize,
    pub final_markings: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplementReport {
    pub places: Vec<String>,
    pub initial: NamedMarking,
    pub stats: ReportStats,
    pub complement_states: Vec<NamedMarking>,
    pub final_markings: Vec<NamedMarking>,
}

impl ComplementReport {
    pub fn new(
        complement: &Complement,
        graph: &ReachabilityGraph,
        include_zero_tokens: bool,
    ) -> Self {
        let net = &complement.net;
        let render = |marking: &Marking| render_marking(net, marking, include_zero_tokens);
        let graph_stats = graph.stats();

        Self {
            places: net.places.iter().map(|place| place.name.clone()).collect(),
            initial: render(&complement.initial),
            stats: ReportStats {
                reachable: graph_stats.state_count,
                edges: graph_stats.edge_count,
                deadlocks: graph_stats.deadlock_count,
                complement_states: complement.complement_states.len(),
                final_markings: complement.final_markings.len(),
            },
            complement_states: complement.complement_states.iter().map(render).collect(),
            final_markings: complement.final_markings.iter().map(render).collect(),
        }
    }

    /// 将报告以 JSON 格式保存到文件中
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), IoError> {
        write_json(path, self)
    }
}

fn format_named(marking: &NamedMarking) -> String {
    format!(
        "{{{}}}",
        marking
            .iter()
            .map(|(place, tokens)| format!("{place}: {tokens}"))
            .join(", ")
    )
}

impl fmt::Display for ComplementReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Complement Report:")?;
        writeln!(f, "Places: {}", self.places.join(", "))?;
        writeln!(f, "Initial Marking: {}", format_named(&self.initial))?;
        writeln!(
            f,
            "Reachable: {} markings, {} edges, {} deadlocks",
            self.stats.reachable, self.stats.edges, self.stats.deadlocks
        )?;
        writeln!(
            f,
            "Complement States ({}):",
            self.stats.complement_states
        )?;
        for marking in &self.complement_states {
            writeln!(f, "  {}", format_named(marking))?;
        }
        writeln!(f, "Final Markings ({}):", self.stats.final_markings)?;
        for marking in &self.final_markings {
            writeln!(f, "  {}", format_named(marking))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::UpwardClosure;
    use crate::net::{Place, Transition};

    fn handoff() -> Net {
        let mut net = Net::empty();
        net.add_place(Place::new("ready"));
        net.add_place(Place::new("done"));
        let t = net.add_transition(Transition::new("finish", "a"));
        net.set_arc_vector(t, &[-1, 1]);
        net
    }

    #[test]
    fn zero_token_places_can_be_hidden() {
        let net = handoff();
        let marking = Marking::from_tokens(vec![0, 2]);

        assert_eq!(
            render_marking(&net, &marking, true).into_iter().collect::<Vec<_>>(),
            vec![("ready".to_string(), 0), ("done".to_string(), 2)]
        );
        assert_eq!(
            render_marking(&net, &marking, false).into_iter().collect::<Vec<_>>(),
            vec![("done".to_string(), 2)]
        );
    }

    #[test]
    fn report_counts_and_text() {
        let net = handoff();
        let initial = Marking::from_tokens(vec![1, 0]);
        let graph = ReachabilityGraph::explore(&net, &initial).unwrap();
        let complement = Complement::from_graph(&net, &graph, &UpwardClosure::empty()).unwrap();
        let report = ComplementReport::new(&complement, &graph, false);

        assert_eq!(
            report.stats,
            ReportStats {
                reachable: 2,
                edges: 1,
                deadlocks: 1,
                complement_states: 2,
                final_markings: 2,
            }
        );
        let text = report.to_string();
        assert!(text.contains("Initial Marking: {ready: 1}"));
        assert!(text.contains("Final Markings (2):"));
    }
}
