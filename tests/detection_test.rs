//! Detection tests on synthetic star fields: known star positions rendered
//! with Gaussian PSFs and noise, run through the peak finder.


use fits_fixture::render_stars;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use starfinder::{find_peaks, find_peaks_with_config, PeakFinderConfig, PixelBuffer};

fn noisy_field(
    rows: usize,
    cols: usize,
    stars: &[(f64, f64, f64)],
    noise_sigma: f64,
    rng: &mut StdRng,
) -> PixelBuffer {
    let noise = Normal::new(0.0f64, noise_sigma).unwrap();
    let mut pixels = render_stars(rows, cols, 1000.0, stars, 1.5);
    for p in pixels.iter_mut() {
        *p += noise.sample(rng);
    }
    PixelBuffer::new(rows, cols, pixels).unwrap()
}

/// A grid of well-separated stars: every star is found exactly once, at its
/// centre pixel, brightest first.
#[test]
fn test_star_grid_recovered() {
    let _ = tracing_subscriber::fmt().with_env_filter("info").try_init();

    let mut rng = StdRng::seed_from_u64(42);
    let centres = [15usize, 45, 75, 105];
    let stars: Vec<(f64, f64, f64)> = centres
        .iter()
        .flat_map(|&r| centres.iter().map(move |&c| (r, c)))
        .map(|(r, c)| (r as f64, c as f64, rng.random_range(2500.0..3000.0)))
        .collect();

    let image = noisy_field(128, 128, &stars, 5.0, &mut rng);
    let result = find_peaks(&image).unwrap();

    println!(
        "Found {} stars in {} passes, threshold {:.1}",
        result.len(),
        result.iterations,
        result.threshold
    );

    let mut found = result.coordinates();
    found.sort_unstable();
    let mut expected: Vec<(usize, usize)> = stars
        .iter()
        .map(|&(r, c, _)| (r as usize, c as usize))
        .collect();
    expected.sort_unstable();
    assert_eq!(found, expected);

    // Brightest first
    for pair in result.peaks.windows(2) {
        assert!(pair[0].value >= pair[1].value);
    }
    assert!(!result.iteration_cap_hit);
}

/// Properties that hold for any image: detections are inside the image, at
/// or above threshold, and never inside an earlier detection's window.
#[test]
fn test_random_fields_invariants() {
    let mut rng = StdRng::seed_from_u64(7);

    for trial in 0..20 {
        let rows = rng.random_range(1..80usize);
        let cols = rng.random_range(1..80usize);
        let nstars = rng.random_range(0..12usize);
        let stars: Vec<(f64, f64, f64)> = (0..nstars)
            .map(|_| {
                (
                    rng.random_range(0.0..rows as f64),
                    rng.random_range(0.0..cols as f64),
                    rng.random_range(100.0..3000.0),
                )
            })
            .collect();
        let image = noisy_field(rows, cols, &stars, 20.0, &mut rng);

        let radius = rng.random_range(1..15usize);
        let config = PeakFinderConfig {
            suppression_radius: radius,
            max_iterations: None,
        };
        let result = find_peaks_with_config(&image, &config).unwrap();

        assert!(!result.is_empty(), "trial {trial}: global maximum must be found");
        for (i, p) in result.peaks.iter().enumerate() {
            assert!(p.row < rows && p.col < cols, "trial {trial}: {p:?} out of bounds");
            assert!(p.value >= result.threshold, "trial {trial}: {p:?} below threshold");
            assert_eq!(image.get(p.row, p.col), Some(p.value));

            for earlier in &result.peaks[..i] {
                // Window is [earlier - radius, earlier + radius) on each axis
                let in_row = p.row + radius >= earlier.row && p.row < earlier.row + radius;
                let in_col = p.col + radius >= earlier.col && p.col < earlier.col + radius;
                assert!(
                    !(in_row && in_col),
                    "trial {trial}: {p:?} inside window of {earlier:?} (radius {radius})"
                );
            }
        }
    }
}

/// The global maximum is always the first detection.
#[test]
fn test_first_detection_is_global_max() {
    let mut rng = StdRng::seed_from_u64(99);
    let image = noisy_field(64, 48, &[(20.0, 30.0, 500.0), (50.0, 10.0, 800.0)], 10.0, &mut rng);

    let result = find_peaks(&image).unwrap();
    let first = result.peaks[0];
    assert_eq!(first.value, result.global_max);
    assert_eq!((first.row, first.col), (50, 10));
}

#[test]
fn test_single_pixel_image() {
    let image = PixelBuffer::new(1, 1, vec![3.5]).unwrap();
    let result = find_peaks(&image).unwrap();
    assert_eq!(result.coordinates(), vec![(0, 0)]);
    assert_eq!(result.threshold, 0.0);
}

#[test]
fn test_negative_image() {
    // Everything below zero: threshold is the (positive) dynamic range, so
    // nothing reaches it.
    let mut image = PixelBuffer::filled(10, 10, -50.0).unwrap();
    image.set(4, 4, -10.0).unwrap();
    let result = find_peaks(&image).unwrap();
    assert!(result.is_empty());
    assert_eq!(result.threshold, 40.0);
    assert_eq!(result.iterations, 0);
}
