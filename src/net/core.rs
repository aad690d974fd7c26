//! 运行时: 网结构构造、可发生判定与发生语义.
use std::collections::HashSet;
use std::fmt::{self, Write as FmtWrite};
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use thiserror::Error;

use crate::net::ids::{PlaceId, TransitionId};
use crate::net::incidence::Incidence;
use crate::net::index_vec::{Idx, IndexVec};
use crate::net::structure::{Effect, Marking, Place, Tokens, Transition};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FireError {
    #[error("transition {0:?} is out of bounds")]
    OutOfBounds(TransitionId),
    #[error("marking has {found} places but the net declares {expected}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("transition {0:?} is not enabled under the supplied marking")]
    NotEnabled(TransitionId),
}

/// Failures while assembling a [`Net`] from named parts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetError {
    #[error("place `{0}` is declared twice")]
    DuplicatePlace(String),
    #[error("transition `{0}` is declared twice")]
    DuplicateTransition(String),
    #[error("arc vector given for undeclared transition `{0}`")]
    UnknownTransition(String),
    #[error("transition `{0}` has no arc vector")]
    MissingArc(String),
    #[error("transition `{0}` has no label")]
    MissingLabel(String),
    #[error("arc vector of `{transition}` has {found} entries, expected {expected}")]
    ArcLength {
        transition: String,
        expected: usize,
        found: usize,
    },
    #[error("marking has {found} places but the net declares {expected}")]
    DimensionMismatch { expected: usize, found: usize },
}

/// 带标签的 P/T 网。`effect` 的第 `t` 列即迁移 `t` 的弧向量。
#[derive(Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Net {
    pub places: IndexVec<PlaceId, Place>,
    pub transitions: IndexVec<TransitionId, Transition>,
    pub effect: Incidence<Effect>,
}

impl fmt::Debug for Net {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Net")
            .field("places", &self.places)
            .field("transitions", &self.transitions)
            .field("effect", &self.effect)
            .finish()
    }
}

impl Net {
    pub fn empty() -> Self {
        Self {
            places: IndexVec::new(),
            transitions: IndexVec::new(),
            effect: Incidence::new(0, 0, 0),
        }
    }

    /// Builds a net from named places, named transitions, per-transition
    /// arc vectors (aligned to `places`) and per-transition labels.
    ///
    /// Place order as given is the canonical order of every marking over the
    /// resulting net.
    pub fn from_parts<P, T>(
        places: P,
        transitions: T,
        arcs: &IndexMap<String, Vec<Effect>>,
        labeling: &IndexMap<String, String>,
    ) -> Result<Self, NetError>
    where
        P: IntoIterator,
        P::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        let mut net = Net::empty();

        let mut seen = HashSet::new();
        for name in places {
            let name = name.into();
            if !seen.insert(name.clone()) {
                return Err(NetError::DuplicatePlace(name));
            }
            net.add_place(Place::new(name));
        }

        let mut seen = HashSet::new();
        for name in transitions {
            let name = name.into();
            if !seen.insert(name.clone()) {
                return Err(NetError::DuplicateTransition(name));
            }
            let arc = arcs
                .get(&name)
                .ok_or_else(|| NetError::MissingArc(name.clone()))?;
            let label = labeling
                .get(&name)
                .ok_or_else(|| NetError::MissingLabel(name.clone()))?;
            if arc.len() != net.places_len() {
                return Err(NetError::ArcLength {
                    transition: name,
                    expected: net.places_len(),
                    found: arc.len(),
                });
            }
            let transition = net.add_transition(Transition::new(name, label.clone()));
            net.set_arc_vector(transition, arc);
        }

        if let Some(unknown) = arcs.keys().find(|name| !seen.contains(*name)) {
            return Err(NetError::UnknownTransition(unknown.clone()));
        }

        Ok(net)
    }

    pub fn add_place(&mut self, place: Place) -> PlaceId {
        let place_id = self.places.push(place);
        self.effect.push_place_with_default(0);
        place_id
    }

    pub fn add_transition(&mut self, transition: Transition) -> TransitionId {
        let transition_id = self.transitions.push(transition);
        self.effect.push_transition_with_default(0);
        transition_id
    }

    pub fn set_effect(&mut self, place: PlaceId, transition: TransitionId, delta: Effect) {
        self.effect.set(place, transition, delta);
    }

    /// Overwrites the whole arc vector of `transition`; extra entries beyond
    /// the place count are ignored.
    pub fn set_arc_vector(&mut self, transition: TransitionId, arc: &[Effect]) {
        for (place, delta) in self.places.indices().zip(arc.iter()) {
            self.effect.set(place, transition, *delta);
        }
    }

    pub fn arc_vector(&self, transition: TransitionId) -> Vec<Effect> {
        self.effect.column(transition).copied().collect()
    }

    pub fn label(&self, transition: TransitionId) -> &str {
        &self.transitions[transition].label
    }

    pub fn get_place(&self, place: PlaceId) -> Option<&Place> {
        self.places.get(place)
    }

    pub fn get_transition(&self, transition: TransitionId) -> Option<&Transition> {
        self.transitions.get(transition)
    }

    pub fn place_by_name(&self, name: &str) -> Option<PlaceId> {
        self.places
            .iter_enumerated()
            .find(|(_, place)| place.name == name)
            .map(|(id, _)| id)
    }

    pub fn transition_by_name(&self, name: &str) -> Option<TransitionId> {
        self.transitions
            .iter_enumerated()
            .find(|(_, transition)| transition.name == name)
            .map(|(id, _)| id)
    }

    pub fn places_len(&self) -> usize {
        self.places.len()
    }

    pub fn transitions_len(&self) -> usize {
        self.transitions.len()
    }

    /// Validates a token vector against the declared places.
    pub fn marking(&self, tokens: &[Tokens]) -> Result<Marking, NetError> {
        if tokens.len() != self.places_len() {
            return Err(NetError::DimensionMismatch {
                expected: self.places_len(),
                found: tokens.len(),
            });
        }
        Ok(Marking::from_tokens(tokens.to_vec()))
    }

    pub fn enabled_transitions(&self, marking: &Marking) -> Vec<TransitionId> {
        self.transitions
            .indices()
            .filter(|&transition| self.is_enabled(marking, transition))
            .collect()
    }

    /// `true` iff adding the arc vector of `transition` keeps every place
    /// non-negative.
    pub fn is_enabled(&self, marking: &Marking, transition: TransitionId) -> bool {
        transition.index() < self.transitions_len()
            && marking.len() == self.places_len()
            && self.apply(marking, transition).is_some()
    }

    pub fn fire(&self, marking: &Marking, transition: TransitionId) -> Result<Marking, FireError> {
        if transition.index() >= self.transitions_len() {
            return Err(FireError::OutOfBounds(transition));
        }
        if marking.len() != self.places_len() {
            return Err(FireError::DimensionMismatch {
                expected: self.places_len(),
                found: marking.len(),
            });
        }
        self.apply(marking, transition)
            .ok_or(FireError::NotEnabled(transition))
    }

    fn apply(&self, marking: &Marking, transition: TransitionId) -> Option<Marking> {
        marking
            .0
            .iter()
            .zip(self.effect.column(transition))
            .map(|(tokens, delta)| tokens.checked_add_signed(*delta))
            .collect::<Option<IndexVec<PlaceId, Tokens>>>()
            .map(Marking::new)
    }

    pub fn to_dot(&self) -> String {
        let mut dot = String::new();
        let _ = writeln!(&mut dot, "digraph PetriNet {{");
        let _ = writeln!(&mut dot, "    rankdir=LR;");
        let _ = writeln!(&mut dot, "    node [fontname=\"Helvetica\"];");

        for (place_id, place) in self.places.iter_enumerated() {
            let _ = writeln!(
                &mut dot,
                "    place_{} [label=\"{}\", shape=circle, style=filled, fillcolor=\"#e3f2fd\"];",
                place_id.index(),
                escape_label(&place.name)
            );
        }

        for (transition_id, transition) in self.transitions.iter_enumerated() {
            let _ = writeln!(
                &mut dot,
                "    trans_{} [label=\"{}\\n{}\", shape=box, style=filled, fillcolor=\"#ffe0b2\"];",
                transition_id.index(),
                escape_label(&transition.name),
                escape_label(&transition.label)
            );
        }

        for (place_id, row) in self.effect.rows().iter_enumerated() {
            let place_node = format!("place_{}", place_id.index());
            for (idx, delta) in row.iter().enumerate() {
                let transition_node = format!("trans_{}", idx);
                let (from, to) = match delta.signum() {
                    0 => continue,
                    -1 => (&place_node, &transition_node),
                    _ => (&transition_node, &place_node),
                };
                let weight = delta.unsigned_abs();
                if weight == 1 {
                    let _ = writeln!(&mut dot, "    {} -> {};", from, to);
                } else {
                    let _ = writeln!(&mut dot, "    {} -> {} [label=\"{}\"];", from, to, weight);
                }
            }
        }

        let _ = writeln!(&mut dot, "}}");
        dot
    }

    pub fn write_dot<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_dot())
    }
}

impl Default for Net {
    fn default() -> Self {
        Self::empty()
    }
}

pub(crate) fn escape_label(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arcs(entries: &[(&str, &[Effect])]) -> IndexMap<String, Vec<Effect>> {
        entries
            .iter()
            .map(|(name, arc)| (name.to_string(), arc.to_vec()))
            .collect()
    }

    fn labels(entries: &[(&str, &str)]) -> IndexMap<String, String> {
        entries
            .iter()
            .map(|(name, label)| (name.to_string(), label.to_string()))
            .collect()
    }

    fn producer_consumer() -> (Net, TransitionId, TransitionId) {
        let mut net = Net::empty();
        let p = net.add_place(Place::new("p"));
        let q = net.add_place(Place::new("q"));
        let move_token = net.add_transition(Transition::new("move", "a"));
        let take_two = net.add_transition(Transition::new("take_two", "b"));

        net.set_effect(p, move_token, -1);
        net.set_effect(q, move_token, 1);
        net.set_effect(q, take_two, -2);

        (net, move_token, take_two)
    }

    #[test]
    fn add_place_and_transition_updates_incidence() {
        let (net, move_token, take_two) = producer_consumer();

        assert_eq!(net.places_len(), 2);
        assert_eq!(net.transitions_len(), 2);
        assert_eq!(net.arc_vector(move_token), vec![-1, 1]);
        assert_eq!(net.arc_vector(take_two), vec![0, -2]);
        assert_eq!(net.label(take_two), "b");
    }

    #[test]
    fn enabling_requires_non_negative_result() {
        let (net, move_token, take_two) = producer_consumer();
        let marking = Marking::from_tokens(vec![1, 1]);

        assert!(net.is_enabled(&marking, move_token));
        assert!(!net.is_enabled(&marking, take_two));
        assert_eq!(net.enabled_transitions(&marking), vec![move_token]);

        let next = net.fire(&marking, move_token).unwrap();
        assert_eq!(next, Marking::from_tokens(vec![0, 2]));
        assert_eq!(marking, Marking::from_tokens(vec![1, 1]));
        assert!(net.is_enabled(&next, take_two));
    }

    #[test]
    fn firing_disabled_transition_is_an_error() {
        let (net, _, take_two) = producer_consumer();
        let marking = Marking::zeros(2);

        assert_eq!(
            net.fire(&marking, take_two),
            Err(FireError::NotEnabled(take_two))
        );
        assert_eq!(
            net.fire(&marking, TransitionId::new(7)),
            Err(FireError::OutOfBounds(TransitionId::new(7)))
        );
        assert_eq!(
            net.fire(&Marking::zeros(3), take_two),
            Err(FireError::DimensionMismatch {
                expected: 2,
                found: 3
            })
        );
        assert!(!net.is_enabled(&Marking::zeros(3), take_two));
    }

    #[test]
    fn from_parts_follows_declared_order() {
        let net = Net::from_parts(
            ["s", "p"],
            ["t"],
            &arcs(&[("t", &[-1, 1])]),
            &labels(&[("t", "a")]),
        )
        .unwrap();

        assert_eq!(net.place_by_name("p"), Some(PlaceId::new(1)));
        assert_eq!(net.transition_by_name("t"), Some(TransitionId::new(0)));
        assert_eq!(net.arc_vector(TransitionId::new(0)), vec![-1, 1]);
    }

    #[test]
    fn from_parts_rejects_inconsistent_descriptions() {
        assert_eq!(
            Net::from_parts(["s", "s"], ["t"], &arcs(&[]), &labels(&[])),
            Err(NetError::DuplicatePlace("s".into()))
        );
        assert_eq!(
            Net::from_parts(["s"], ["t"], &arcs(&[]), &labels(&[("t", "a")])),
            Err(NetError::MissingArc("t".into()))
        );
        assert_eq!(
            Net::from_parts(["s"], ["t"], &arcs(&[("t", &[1])]), &labels(&[])),
            Err(NetError::MissingLabel("t".into()))
        );
        assert_eq!(
            Net::from_parts(
                ["s"],
                ["t"],
                &arcs(&[("t", &[1, 0])]),
                &labels(&[("t", "a")])
            ),
            Err(NetError::ArcLength {
                transition: "t".into(),
                expected: 1,
                found: 2
            })
        );
        assert_eq!(
            Net::from_parts(
                ["s"],
                ["t"],
                &arcs(&[("t", &[1]), ("u", &[1])]),
                &labels(&[("t", "a")])
            ),
            Err(NetError::UnknownTransition("u".into()))
        );
    }

    #[test]
    fn marking_checks_dimension() {
        let (net, _, _) = producer_consumer();

        assert!(net.marking(&[1, 0]).is_ok());
        assert_eq!(
            net.marking(&[1]),
            Err(NetError::DimensionMismatch {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn dot_draws_consumption_and_production() {
        let (net, _, _) = producer_consumer();
        let dot = net.to_dot();

        assert!(dot.contains("place_0 -> trans_0;"));
        assert!(dot.contains("trans_0 -> place_1;"));
        assert!(dot.contains("place_1 -> trans_1 [label=\"2\"];"));
    }
}
