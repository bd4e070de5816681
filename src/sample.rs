use ndarray::{Array1, ArrayView1};
use tracing::warn;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    attributes: Array1<f64>,
}

impl Sample {
    pub fn new(attribute_count: usize) -> Self {
        Self {
            attributes: Array1::zeros(attribute_count),
        }
    }

    pub fn from_attributes(values: Vec<f64>) -> Self {
        let sample = Self {
            attributes: Array1::from(values),
        };

        for (index, value) in sample.out_of_range_attributes() {
            warn_not_normalized(index, value);
        }

        sample
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn attributes(&self) -> ArrayView1<'_, f64> {
        self.attributes.view()
    }

    pub fn get(&self, attribute_index: usize) -> Result<f64> {
        self.attributes
            .get(attribute_index)
            .copied()
            .ok_or(Error::OutOfRange {
                index: attribute_index,
                len: self.len(),
            })
    }

    pub fn set(&mut self, attribute_index: usize, value: f64) -> Result<()> {
        let len = self.len();
        let slot = self
            .attributes
            .get_mut(attribute_index)
            .ok_or(Error::OutOfRange {
                index: attribute_index,
                len,
            })?;

        if !is_normalized(value) {
            warn_not_normalized(attribute_index, value);
        }

        *slot = value;

        Ok(())
    }

    /// Euclidean distance over every attribute except `ignored_attribute_index`.
    ///
    /// An ignored index past the end of the vector excludes nothing.
    pub fn distance_to(&self, other: &Self, ignored_attribute_index: usize) -> Result<f64> {
        if !self.is_compatible_with(other) {
            return Err(Error::DimensionMismatch {
                expected: self.len(),
                actual: other.len(),
            });
        }

        let mut difference = &self.attributes - &other.attributes;
        if let Some(ignored) = difference.get_mut(ignored_attribute_index) {
            *ignored = 0.0;
        }

        Ok(difference.dot(&difference).sqrt())
    }

    pub fn is_compatible_with(&self, other: &Self) -> bool {
        self.len() == other.len()
    }

    pub fn out_of_range_attributes(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.attributes
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, value)| !is_normalized(value))
    }
}

fn is_normalized(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

fn warn_not_normalized(attribute_index: usize, value: f64) {
    warn!(
        attribute_index,
        value, "attribute value is outside [0, 1], check that normalization was applied"
    );
}
