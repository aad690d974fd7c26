//! 禁止区域：由若干生成元确定的向上闭包及其成员判定.
use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisError;
use crate::net::structure::Marking;

/// `true` iff `marking` is component-wise `>=` some vector of `forbidden`.
pub fn dominates(marking: &Marking, forbidden: &[Marking]) -> bool {
    forbidden.iter().any(|generator| marking.dominates(generator))
}

/// The upward closure `{ m | ∃g ∈ generators: m >= g }`.
///
/// Generators are kept as given; redundant (non-minimal) ones only cost
/// extra comparisons. Without generators the region is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpwardClosure {
    generators: Vec<Marking>,
}

impl UpwardClosure {
    pub fn new(generators: impl IntoIterator<Item = Marking>) -> Self {
        Self {
            generators: generators.into_iter().collect(),
        }
    }

    pub fn single(generator: Marking) -> Self {
        Self {
            generators: vec![generator],
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn generators(&self) -> &[Marking] {
        &self.generators
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    pub fn contains(&self, marking: &Marking) -> bool {
        dominates(marking, &self.generators)
    }

    /// Ensures every generator ranges over exactly `places` places.
    pub fn check_dimension(&self, places: usize) -> Result<(), AnalysisError> {
        match self.generators.iter().find(|g| g.len() != places) {
            Some(generator) => Err(AnalysisError::DimensionMismatch {
                expected: places,
                found: generator.len(),
            }),
            None => Ok(()),
        }
    }
}

impl FromIterator<Marking> for UpwardClosure {
    fn from_iter<I: IntoIterator<Item = Marking>>(iter: I) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(tokens: &[u64]) -> Marking {
        Marking::from_tokens(tokens.to_vec())
    }

    #[test]
    fn membership_needs_one_dominated_generator() {
        let region = UpwardClosure::new([m(&[1, 0, 0]), m(&[0, 0, 2])]);

        assert!(region.contains(&m(&[1, 0, 0])));
        assert!(region.contains(&m(&[3, 1, 0])));
        assert!(region.contains(&m(&[0, 5, 2])));
        assert!(!region.contains(&m(&[0, 1, 1])));
    }

    #[test]
    fn single_vector_misses_what_second_generator_catches() {
        let candidate = m(&[0, 0, 2]);

        assert!(!UpwardClosure::single(m(&[1, 0, 0])).contains(&candidate));
        assert!(dominates(&candidate, &[m(&[1, 0, 0]), m(&[0, 0, 1])]));
    }

    #[test]
    fn empty_region_contains_nothing() {
        let region = UpwardClosure::empty();

        assert!(region.is_empty());
        assert!(!region.contains(&m(&[0, 0])));
    }

    #[test]
    fn dimension_check_reports_offending_generator() {
        let region = UpwardClosure::new([m(&[1, 0]), m(&[1])]);

        assert_eq!(
            region.check_dimension(2),
            Err(AnalysisError::DimensionMismatch {
                expected: 2,
                found: 1
            })
        );
        assert_eq!(UpwardClosure::single(m(&[0, 1])).check_dimension(2), Ok(()));
    }
}
