use image::{Rgb, RgbImage};
use knn::{
    evaluation::evaluate,
    image_adapter::{classify_image, labeled_samples, CLASS_ATTRIBUTE},
    sample_set::{count_occurrences, equalize, DEFAULT_EPSILON},
    EqualizationPolicy, Error, KNearestNeighbors,
};

const TOMATO: [u8; 3] = [210, 40, 35];
const LEAF: [u8; 3] = [40, 160, 50];

// A red disc on a green background, with its mask.
fn scene(size: u32, radius: u32) -> (RgbImage, RgbImage) {
    let center = size / 2;
    let inside = |x: u32, y: u32| {
        let dx = x.abs_diff(center);
        let dy = y.abs_diff(center);
        dx * dx + dy * dy <= radius * radius
    };

    let image = RgbImage::from_fn(size, size, |x, y| {
        let jitter = u8::try_from((x * 7 + y * 3) % 11).unwrap();
        let [r, g, b] = if inside(x, y) { TOMATO } else { LEAF };
        Rgb([r.saturating_add(jitter), g.saturating_sub(jitter), b])
    });
    let mask = RgbImage::from_fn(size, size, |x, y| {
        if inside(x, y) {
            Rgb([255, 0, 0])
        } else {
            Rgb([0, 0, 0])
        }
    });

    (image, mask)
}

#[test]
fn downsampled_training_segments_unseen_image() {
    let (train, labels) = scene(16, 4);
    let samples = labeled_samples(&train, &labels).unwrap();

    let balanced = equalize(
        &samples,
        CLASS_ATTRIBUTE,
        DEFAULT_EPSILON,
        EqualizationPolicy::Downsample,
    )
    .unwrap();

    let foreground = count_occurrences(&balanced, 1.0, CLASS_ATTRIBUTE, DEFAULT_EPSILON).unwrap();
    let background = count_occurrences(&balanced, 0.0, CLASS_ATTRIBUTE, DEFAULT_EPSILON).unwrap();
    assert_eq!(foreground, background);
    assert_eq!(foreground + background, balanced.len());

    let (input, truth) = scene(12, 3);
    let output = classify_image(&input, &balanced, &KNearestNeighbors::new(5)).unwrap();

    let evaluation = evaluate(&output, &truth).unwrap();
    assert_eq!(evaluation.total(), 144);
    assert_eq!(evaluation.correct(), 144);
}

#[test]
fn strict_minority_equalization_leaves_nothing_to_train_on() {
    let (train, labels) = scene(8, 2);
    let samples = labeled_samples(&train, &labels).unwrap();

    let balanced = equalize(
        &samples,
        CLASS_ATTRIBUTE,
        DEFAULT_EPSILON,
        EqualizationPolicy::StrictMinority,
    )
    .unwrap();
    assert!(balanced.is_empty());

    let (input, _) = scene(4, 1);
    assert!(matches!(
        classify_image(&input, &balanced, &KNearestNeighbors::new(3)),
        Err(Error::EmptyTrainingSet)
    ));
}

#[test]
fn classification_is_repeatable() {
    let (train, labels) = scene(10, 3);
    let samples = labeled_samples(&train, &labels).unwrap();
    let classifier = KNearestNeighbors::new(7);

    let (input, _) = scene(9, 2);
    let first = classify_image(&input, &samples, &classifier).unwrap();
    let second = classify_image(&input, &samples, &classifier).unwrap();

    assert_eq!(first, second);
}
