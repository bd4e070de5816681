use std::path::Path;

use image::{Rgb, RgbImage};
use rayon::prelude::*;
use tracing::debug;

use crate::error::{Error, Result};
use crate::knn::KNearestNeighbors;
use crate::sample::Sample;

pub const CLASS_ATTRIBUTE: usize = 0;
pub const RED_ATTRIBUTE: usize = 1;
pub const GREEN_ATTRIBUTE: usize = 2;
pub const BLUE_ATTRIBUTE: usize = 3;
pub const ATTRIBUTE_COUNT: usize = 4;

const CHANNEL_MAX: f64 = 255.0;

pub trait PixelSource {
    fn dimensions(&self) -> (u32, u32);

    fn read_pixel(&self, x: u32, y: u32) -> [u8; 3];
}

pub trait PixelSink {
    fn write_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]);
}

impl PixelSource for RgbImage {
    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    fn read_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.get_pixel(x, y).0
    }
}

impl PixelSink for RgbImage {
    fn write_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        self.put_pixel(x, y, Rgb(rgb));
    }
}

pub fn decode_image(path: impl AsRef<Path>) -> Result<RgbImage> {
    Ok(image::open(path)?.to_rgb8())
}

pub fn encode_image(image: &RgbImage, path: impl AsRef<Path>) -> Result<()> {
    image.save(path)?;
    Ok(())
}

fn normalize(channel: u8) -> f64 {
    f64::from(channel) / CHANNEL_MAX
}

fn color_sample(rgb: [u8; 3]) -> Result<Sample> {
    let mut sample = Sample::new(ATTRIBUTE_COUNT);
    sample.set(RED_ATTRIBUTE, normalize(rgb[0]))?;
    sample.set(GREEN_ATTRIBUTE, normalize(rgb[1]))?;
    sample.set(BLUE_ATTRIBUTE, normalize(rgb[2]))?;
    Ok(sample)
}

pub fn unlabeled_sample(rgb: [u8; 3]) -> Result<Sample> {
    color_sample(rgb)
}

// The class of a training pixel is the red channel of its ground truth.
pub fn labeled_samples<S, T>(image: &S, ground_truth: &T) -> Result<Vec<Sample>>
where
    S: PixelSource,
    T: PixelSource,
{
    let (width, height) = image.dimensions();
    if ground_truth.dimensions() != (width, height) {
        return Err(Error::ImageSizeMismatch {
            expected: (width, height),
            actual: ground_truth.dimensions(),
        });
    }

    let mut samples = Vec::with_capacity(width as usize * height as usize);

    for x in 0..width {
        for y in 0..height {
            let mut sample = color_sample(image.read_pixel(x, y))?;
            let [class, _, _] = ground_truth.read_pixel(x, y);
            sample.set(CLASS_ATTRIBUTE, normalize(class))?;

            samples.push(sample);
        }
    }

    debug!(width, height, samples = samples.len(), "training samples read");

    Ok(samples)
}

pub fn classified_pixel(sample: &Sample) -> Result<[u8; 3]> {
    let class = sample.get(CLASS_ATTRIBUTE)?;

    #[allow(clippy::cast_possible_truncation)]
    #[allow(clippy::cast_sign_loss)]
    let red = (class.clamp(0.0, 1.0) * CHANNEL_MAX).round() as u8;

    Ok([red, 0, 0])
}

/// Classifies every pixel of `image` in parallel into a new mask image.
pub fn classify_image<S>(
    image: &S,
    training_samples: &[Sample],
    classifier: &KNearestNeighbors,
) -> Result<RgbImage>
where
    S: PixelSource + Sync,
{
    classifier.validate(training_samples)?;

    let (width, height) = image.dimensions();

    let pixels = (0..width)
        .into_par_iter()
        .flat_map_iter(|x| (0..height).map(move |y| (x, y)))
        .map(|(x, y)| -> Result<(u32, u32, [u8; 3])> {
            let mut sample = unlabeled_sample(image.read_pixel(x, y))?;
            classifier.classify(&mut sample, training_samples, CLASS_ATTRIBUTE)?;
            Ok((x, y, classified_pixel(&sample)?))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut output = RgbImage::new(width, height);
    for (x, y, rgb) in pixels {
        output.write_pixel(x, y, rgb);
    }

    debug!(width, height, "image classified");

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn two_tone() -> (RgbImage, RgbImage) {
        let image = RgbImage::from_fn(4, 2, |x, _| {
            if x < 2 {
                Rgb([200, 30, 30])
            } else {
                Rgb([30, 200, 30])
            }
        });
        let truth = RgbImage::from_fn(4, 2, |x, _| {
            if x < 2 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 0, 0])
            }
        });

        (image, truth)
    }

    #[test]
    fn test_labeled_samples_layout() {
        let (image, truth) = two_tone();
        let samples = labeled_samples(&image, &truth).unwrap();

        assert_eq!(samples.len(), 8);

        // column-major: (0,0), (0,1), (1,0), ...
        let first = &samples[0];
        assert_abs_diff_eq!(first.get(CLASS_ATTRIBUTE).unwrap(), 1.0);
        assert_abs_diff_eq!(first.get(RED_ATTRIBUTE).unwrap(), 200.0 / 255.0);
        assert_abs_diff_eq!(first.get(GREEN_ATTRIBUTE).unwrap(), 30.0 / 255.0);
        assert_abs_diff_eq!(first.get(BLUE_ATTRIBUTE).unwrap(), 30.0 / 255.0);

        let last = &samples[7];
        assert_abs_diff_eq!(last.get(CLASS_ATTRIBUTE).unwrap(), 0.0);
        assert_abs_diff_eq!(last.get(GREEN_ATTRIBUTE).unwrap(), 200.0 / 255.0);
    }

    #[test]
    fn test_labeled_samples_size_mismatch() {
        let (image, _) = two_tone();
        let truth = RgbImage::new(3, 2);

        assert!(matches!(
            labeled_samples(&image, &truth),
            Err(Error::ImageSizeMismatch {
                expected: (4, 2),
                actual: (3, 2)
            })
        ));
    }

    #[test]
    fn test_unlabeled_sample_has_default_class() {
        let sample = unlabeled_sample([255, 0, 51]).unwrap();
        assert_eq!(sample.len(), ATTRIBUTE_COUNT);
        assert_abs_diff_eq!(sample.get(CLASS_ATTRIBUTE).unwrap(), 0.0);
        assert_abs_diff_eq!(sample.get(RED_ATTRIBUTE).unwrap(), 1.0);
        assert_abs_diff_eq!(sample.get(BLUE_ATTRIBUTE).unwrap(), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_classified_pixel() {
        let mut sample = Sample::new(ATTRIBUTE_COUNT);
        assert_eq!(classified_pixel(&sample).unwrap(), [0, 0, 0]);

        sample.set(CLASS_ATTRIBUTE, 1.0).unwrap();
        assert_eq!(classified_pixel(&sample).unwrap(), [255, 0, 0]);

        sample.set(CLASS_ATTRIBUTE, 128.0 / 255.0).unwrap();
        assert_eq!(classified_pixel(&sample).unwrap(), [128, 0, 0]);

        assert!(classified_pixel(&Sample::new(0)).is_err());
    }

    #[test]
    fn test_classify_image_reproduces_mask() {
        let (image, truth) = two_tone();
        let training = labeled_samples(&image, &truth).unwrap();

        let output = classify_image(&image, &training, &KNearestNeighbors::new(3)).unwrap();

        assert_eq!(output, truth);
    }

    #[test]
    fn test_classify_image_empty_training_set() {
        let (image, _) = two_tone();
        assert!(matches!(
            classify_image(&image, &[], &KNearestNeighbors::new(3)),
            Err(Error::EmptyTrainingSet)
        ));
    }
}
