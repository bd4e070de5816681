use std::path::Path;

use csv::Writer;

use crate::error::{Error, Result};
use crate::image_adapter::PixelSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassScore {
    /// Red channel value identifying the class in a mask.
    pub class: u8,
    pub total: usize,
    pub correct: usize,
}

impl ClassScore {
    pub fn accuracy(&self) -> f64 {
        percentage(self.correct, self.total)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    pub classes: Vec<ClassScore>,
}

impl Evaluation {
    pub fn total(&self) -> usize {
        self.classes.iter().map(|score| score.total).sum()
    }

    pub fn correct(&self) -> usize {
        self.classes.iter().map(|score| score.correct).sum()
    }

    pub fn accuracy(&self) -> f64 {
        percentage(self.correct(), self.total())
    }
}

fn percentage(correct: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (correct as f64 / total as f64) * 100.0
    }
}

// Classes are listed in the order they first appear in `truth`.
pub fn evaluate<P, T>(predicted: &P, truth: &T) -> Result<Evaluation>
where
    P: PixelSource,
    T: PixelSource,
{
    let (width, height) = truth.dimensions();
    if predicted.dimensions() != (width, height) {
        return Err(Error::ImageSizeMismatch {
            expected: (width, height),
            actual: predicted.dimensions(),
        });
    }

    let mut evaluation = Evaluation::default();

    for x in 0..width {
        for y in 0..height {
            let [expected, _, _] = truth.read_pixel(x, y);
            let [actual, _, _] = predicted.read_pixel(x, y);

            let index = match evaluation
                .classes
                .iter()
                .position(|score| score.class == expected)
            {
                Some(index) => index,
                None => {
                    evaluation.classes.push(ClassScore {
                        class: expected,
                        total: 0,
                        correct: 0,
                    });
                    evaluation.classes.len() - 1
                }
            };

            let score = &mut evaluation.classes[index];
            score.total += 1;
            if actual == expected {
                score.correct += 1;
            }
        }
    }

    Ok(evaluation)
}

pub fn write_report(evaluation: &Evaluation, path: impl AsRef<Path>) -> Result<()> {
    let mut writer = Writer::from_path(path)?;
    write_rows(evaluation, &mut writer)?;
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

fn write_rows<W: std::io::Write>(evaluation: &Evaluation, writer: &mut Writer<W>) -> Result<()> {
    writer.write_record(["class", "total", "correct", "accuracy"])?;

    for score in &evaluation.classes {
        writer.write_record([
            score.class.to_string(),
            score.total.to_string(),
            score.correct.to_string(),
            format!("{:.3}", score.accuracy()),
        ])?;
    }

    Ok(())
}
