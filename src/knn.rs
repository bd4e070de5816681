use tracing::{trace, warn};

use crate::error::{Error, Result};
use crate::sample::Sample;
use crate::sample_set::{collect_distinct_values, DEFAULT_EPSILON};

pub const DEFAULT_K: usize = 7;

/// Rule used to pick a winner when several classes share the highest vote count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TieBreak {
    /// The tied class discovered first in the training set.
    #[default]
    FirstSeen,
    /// The tied class discovered last in the training set.
    LastSeen,
    /// The tied class with the smallest value.
    SmallestValue,
}

#[derive(Debug, Clone, Copy)]
struct Neighbor {
    distance: f64,
    class: f64,
}

#[derive(Debug)]
struct Tally {
    entries: Vec<(f64, usize)>,
    epsilon: f64,
}

impl Tally {
    fn new(classes: Vec<f64>, epsilon: f64) -> Self {
        Self {
            entries: classes.into_iter().map(|class| (class, 0)).collect(),
            epsilon,
        }
    }

    fn vote(&mut self, class: f64) {
        let epsilon = self.epsilon;

        let entry = self
            .entries
            .iter_mut()
            .find(|(known, _)| (*known - class).abs() < epsilon);
        debug_assert!(entry.is_some(), "class {class} missing from tally");

        if let Some((_, votes)) = entry {
            *votes += 1;
        }
    }

    fn winner(&self, tie_break: TieBreak) -> Option<f64> {
        let mut best: Option<(f64, usize)> = None;

        for &(class, votes) in &self.entries {
            let replace = match best {
                None => true,
                Some((best_class, best_votes)) => match tie_break {
                    TieBreak::FirstSeen => votes > best_votes,
                    TieBreak::LastSeen => votes >= best_votes,
                    TieBreak::SmallestValue => {
                        votes > best_votes || (votes == best_votes && class < best_class)
                    }
                },
            };

            if replace {
                best = Some((class, votes));
            }
        }

        best.map(|(class, _)| class)
    }
}

#[derive(Debug, Clone)]
pub struct KNearestNeighbors {
    k: usize,
    epsilon: f64,
    tie_break: TieBreak,
}

impl Default for KNearestNeighbors {
    fn default() -> Self {
        Self::new(DEFAULT_K)
    }
}

impl KNearestNeighbors {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            epsilon: DEFAULT_EPSILON,
            tie_break: TieBreak::default(),
        }
    }

    #[must_use]
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    #[must_use]
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    pub fn classify(
        &self,
        target: &mut Sample,
        training_samples: &[Sample],
        class_attribute_index: usize,
    ) -> Result<()> {
        let class = self.predict(target, training_samples, class_attribute_index)?;
        target.set(class_attribute_index, class)
    }

    /// Checks `training_samples` once before a batch of predictions.
    ///
    /// Logs a warning when `k` covers the whole set, since every prediction
    /// then degrades to the global majority.
    pub fn validate(&self, training_samples: &[Sample]) -> Result<()> {
        self.check(training_samples)?;

        if self.k >= training_samples.len() {
            warn!(
                k = self.k,
                training_samples = training_samples.len(),
                "k covers the whole training set, voting degrades to a global majority"
            );
        }

        Ok(())
    }

    fn check(&self, training_samples: &[Sample]) -> Result<()> {
        if training_samples.is_empty() {
            return Err(Error::EmptyTrainingSet);
        }

        if self.k == 0 {
            return Err(Error::InvalidNeighborCount);
        }

        Ok(())
    }

    pub fn predict(
        &self,
        target: &Sample,
        training_samples: &[Sample],
        class_attribute_index: usize,
    ) -> Result<f64> {
        self.check(training_samples)?;

        if self.k >= training_samples.len() {
            trace!(
                k = self.k,
                training_samples = training_samples.len(),
                "k covers the whole training set"
            );
        }

        let nearest = self.nearest_neighbors(target, training_samples, class_attribute_index)?;

        let classes =
            collect_distinct_values(training_samples, class_attribute_index, self.epsilon)?;
        let mut tally = Tally::new(classes, self.epsilon);
        for neighbor in &nearest {
            tally.vote(neighbor.class);
        }

        let class = tally.winner(self.tie_break).ok_or(Error::EmptyTrainingSet)?;

        trace!(class, votes = ?tally.entries, "sample classified");

        Ok(class)
    }

    fn nearest_neighbors(
        &self,
        target: &Sample,
        training_samples: &[Sample],
        class_attribute_index: usize,
    ) -> Result<Vec<Neighbor>> {
        let mut nearest: Vec<Neighbor> = Vec::with_capacity(self.k + 1);

        for sample in training_samples {
            let neighbor = Neighbor {
                distance: target.distance_to(sample, class_attribute_index)?,
                class: sample.get(class_attribute_index)?,
            };

            let position = nearest.partition_point(|known| known.distance < neighbor.distance);
            nearest.insert(position, neighbor);
            nearest.truncate(self.k);
        }

        Ok(nearest)
    }
}
