use tracing::debug;

use crate::error::Result;
use crate::sample::Sample;

pub const DEFAULT_EPSILON: f64 = 0.01;

/// How [`equalize`] treats classes once the minimum class count is known.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EqualizationPolicy {
    /// Keep only samples of classes whose count is strictly below the minimum
    /// class count. Every class has at least the minimum count, so this keeps
    /// nothing from a non-empty set.
    #[default]
    StrictMinority,
    /// Keep the first `minimum` samples of every class, in input order.
    Downsample,
}

fn close_enough(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

pub fn collect_distinct_values(
    samples: &[Sample],
    attribute_index: usize,
    epsilon: f64,
) -> Result<Vec<f64>> {
    let mut values: Vec<f64> = Vec::new();

    for sample in samples {
        let value = sample.get(attribute_index)?;

        if !values
            .iter()
            .any(|&known| close_enough(known, value, epsilon))
        {
            values.push(value);
        }
    }

    Ok(values)
}

pub fn count_occurrences(
    samples: &[Sample],
    value: f64,
    attribute_index: usize,
    epsilon: f64,
) -> Result<usize> {
    let mut count = 0;

    for sample in samples {
        if close_enough(sample.get(attribute_index)?, value, epsilon) {
            count += 1;
        }
    }

    Ok(count)
}

pub fn equalize(
    samples: &[Sample],
    attribute_index: usize,
    epsilon: f64,
    policy: EqualizationPolicy,
) -> Result<Vec<Sample>> {
    let classes = collect_distinct_values(samples, attribute_index, epsilon)?;

    let mut counts = Vec::with_capacity(classes.len());
    for &class in &classes {
        counts.push(count_occurrences(samples, class, attribute_index, epsilon)?);
    }

    let Some(&minimum) = counts.iter().min() else {
        return Ok(Vec::new());
    };

    debug!(
        classes = classes.len(),
        minimum,
        ?policy,
        "minimum class count determined"
    );

    let mut kept = vec![0usize; classes.len()];
    let mut equalized = Vec::with_capacity(minimum * classes.len());

    for sample in samples {
        let value = sample.get(attribute_index)?;
        let Some(class) = classes
            .iter()
            .position(|&class| close_enough(class, value, epsilon))
        else {
            continue;
        };

        let keep = match policy {
            EqualizationPolicy::StrictMinority => counts[class] < minimum,
            EqualizationPolicy::Downsample => kept[class] < minimum,
        };

        if keep {
            kept[class] += 1;
            equalized.push(sample.clone());
        }
    }

    debug!(
        before = samples.len(),
        after = equalized.len(),
        "samples equalized"
    );

    Ok(equalized)
}
