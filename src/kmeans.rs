//! K-means clustering of RGB samples with k-means++ seeding.
//!
//! The clusterer is a plain function over a sample slice. It owns no state
//! between calls and takes its random source as an argument, so it can run on
//! any thread and tests can pin the seeding with a seeded generator.

use log::{debug, trace};
use rand::Rng;

use crate::color::Rgb;

/// Default bound on Lloyd iterations.
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// A cluster center and the number of samples assigned to it in the final
/// iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Centroid {
    pub color: Rgb,
    pub population: usize,
}

/// Partition `samples` into at most `k` clusters.
///
/// Returns `min(k, samples.len())` centroids; some may have zero population
/// when their seed ended up with no samples. An empty sample list returns no
/// centroids.
pub fn kmeans<R>(samples: &[Rgb], k: usize, max_iterations: usize, rng: &mut R) -> Vec<Centroid>
where
    R: Rng + ?Sized,
{
    let actual_k = k.min(samples.len());
    if actual_k == 0 {
        return Vec::new();
    }

    let mut centroids = seed_centroids(samples, actual_k, rng);
    let (assignments, iterations, converged) = lloyd(samples, &mut centroids, max_iterations);

    debug!(
        "k-means: {} samples, k = {}, {} iterations ({})",
        samples.len(),
        actual_k,
        iterations,
        if converged { "converged" } else { "iteration limit" }
    );

    let mut populations = vec![0usize; actual_k];
    for &cluster in &assignments {
        if let Some(count) = populations.get_mut(cluster) {
            *count += 1;
        }
    }

    centroids
        .into_iter()
        .zip(populations)
        .map(|(color, population)| Centroid { color, population })
        .collect()
}

/// Lloyd iteration from the given seeds. Stops as soon as an assignment pass
/// changes nothing. Returns the final assignments, the number of passes run
/// and whether it converged before `max_iterations`.
fn lloyd(samples: &[Rgb], centroids: &mut [Rgb], max_iterations: usize) -> (Vec<usize>, usize, bool) {
    let mut assignments = vec![usize::MAX; samples.len()];
    let mut iterations = 0;

    while iterations < max_iterations {
        iterations += 1;

        if !assign(samples, centroids, &mut assignments) {
            return (assignments, iterations, true);
        }
        update_centroids(samples, &assignments, centroids);
        trace!("iteration {}: centroids {:?}", iterations, centroids);
    }
    (assignments, iterations, false)
}

/// k-means++ seeding: the first center is uniform over the samples, each
/// further center is drawn with probability proportional to its squared
/// distance from the nearest center chosen so far.
///
/// `k` must be in `1..=samples.len()`. If a weighted draw fails (every sample
/// already coincides with a center, or rounding exhausts the cumulative sum)
/// the remaining slots are filled with the last sample.
pub fn seed_centroids<R>(samples: &[Rgb], k: usize, rng: &mut R) -> Vec<Rgb>
where
    R: Rng + ?Sized,
{
    let Some(&last) = samples.last() else {
        return Vec::new();
    };

    let first = samples[rng.random_range(0..samples.len())];
    let mut centroids = Vec::with_capacity(k);
    centroids.push(first);

    let mut nearest: Vec<f64> = samples.iter().map(|s| s.distance_squared(&first)).collect();

    while centroids.len() < k {
        let Some(index) = weighted_draw(&nearest, rng) else {
            break;
        };
        let chosen = samples[index];
        centroids.push(chosen);

        for (dist, sample) in nearest.iter_mut().zip(samples) {
            let d = sample.distance_squared(&chosen);
            if d < *dist {
                *dist = d;
            }
        }
    }

    if centroids.len() < k {
        debug!(
            "k-means++ seeding short by {}, padding with last sample",
            k - centroids.len()
        );
        centroids.resize(k, last);
    }
    centroids
}

/// Index drawn with probability proportional to `weights[i]`, or `None` when
/// every weight is zero.
fn weighted_draw<R>(weights: &[f64], rng: &mut R) -> Option<usize>
where
    R: Rng + ?Sized,
{
    let total: f64 = weights.iter().sum();
    if total.is_nan() || total <= 0.0 {
        return None;
    }

    let mut target = rng.random::<f64>() * total;
    for (i, &w) in weights.iter().enumerate() {
        if target < w {
            return Some(i);
        }
        target -= w;
    }
    None
}

/// Index of the closest centroid; ties go to the lowest index.
fn nearest_centroid(sample: &Rgb, centroids: &[Rgb]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let d = sample.distance_squared(c);
        if d < best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

/// Reassign every sample. Returns whether any assignment changed.
fn assign(samples: &[Rgb], centroids: &[Rgb], assignments: &mut [usize]) -> bool {
    let mut changed = false;
    for (sample, slot) in samples.iter().zip(assignments.iter_mut()) {
        let cluster = nearest_centroid(sample, centroids);
        if *slot != cluster {
            *slot = cluster;
            changed = true;
        }
    }
    changed
}

/// Move each centroid to the rounded channel mean of its samples. Empty
/// clusters reset to neutral gray.
fn update_centroids(samples: &[Rgb], assignments: &[usize], centroids: &mut [Rgb]) {
    let mut sums = vec![[0u64; 3]; centroids.len()];
    let mut counts = vec![0u64; centroids.len()];

    for (sample, &cluster) in samples.iter().zip(assignments) {
        let sum = &mut sums[cluster];
        sum[0] += sample.r as u64;
        sum[1] += sample.g as u64;
        sum[2] += sample.b as u64;
        counts[cluster] += 1;
    }

    for ((centroid, sum), &count) in centroids.iter_mut().zip(&sums).zip(&counts) {
        *centroid = if count == 0 {
            Rgb::NEUTRAL_GRAY
        } else {
            let n = count as f64;
            Rgb::from_f64_channels(sum[0] as f64 / n, sum[1] as f64 / n, sum[2] as f64 / n)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};

    fn two_blobs() -> Vec<Rgb> {
        let mut samples = Vec::new();
        for i in 0..20u8 {
            samples.push(Rgb::new(200 + i % 3, 10, 10));
            samples.push(Rgb::new(10, 10, 200 + i % 3));
        }
        samples
    }

    #[test]
    fn empty_samples_produce_no_clusters() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(kmeans(&[], 5, 100, &mut rng).is_empty());
    }

    #[test]
    fn cluster_count_is_bounded_by_sample_count() {
        let samples = [Rgb::new(1, 2, 3), Rgb::new(100, 100, 100)];
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let clusters = kmeans(&samples, 8, 100, &mut rng);
            assert!(clusters.len() <= 2);
            let total: usize = clusters.iter().map(|c| c.population).sum();
            assert_eq!(total, 2);
        }
    }

    #[test]
    fn uniform_samples_collapse_to_one_effective_cluster() {
        let samples = vec![Rgb::new(30, 140, 90); 64];
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let clusters = kmeans(&samples, 4, 100, &mut rng);
            let live: Vec<_> = clusters.iter().filter(|c| c.population > 0).collect();
            assert_eq!(live.len(), 1, "seed {seed}");
            assert_eq!(live[0].color, Rgb::new(30, 140, 90));
            assert_eq!(live[0].population, 64);
        }
    }

    #[test]
    fn seeding_pads_with_last_sample_when_draws_fail() {
        let samples = vec![Rgb::new(9, 9, 9); 5];
        let mut rng = StdRng::seed_from_u64(3);
        let seeds = seed_centroids(&samples, 3, &mut rng);
        assert_eq!(seeds, vec![Rgb::new(9, 9, 9); 3]);
    }

    #[test]
    fn seeding_never_picks_an_existing_center_twice() {
        let samples = vec![Rgb::new(0, 0, 0), Rgb::new(0, 0, 0), Rgb::new(255, 255, 255)];
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let seeds = seed_centroids(&samples, 2, &mut rng);
            assert_ne!(seeds[0], seeds[1], "seed {seed}");
        }
    }

    #[test]
    fn separates_two_well_spaced_groups() {
        let samples = two_blobs();
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut clusters = kmeans(&samples, 2, 100, &mut rng);
            clusters.sort_by_key(|c| c.color.r);
            assert_eq!(clusters[0].color, Rgb::new(10, 10, 201));
            assert_eq!(clusters[1].color, Rgb::new(201, 10, 10));
            assert_eq!(clusters[0].population, 20);
            assert_eq!(clusters[1].population, 20);
        }
    }

    #[test]
    fn stops_once_assignments_repeat() {
        let samples = two_blobs();
        let mut centroids = [Rgb::new(200, 10, 10), Rgb::new(10, 10, 200)];
        let (assignments, iterations, converged) = lloyd(&samples, &mut centroids, 100);
        // one pass to assign and move, one pass that changes nothing
        assert_eq!(iterations, 2);
        assert!(converged);
        assert_eq!(centroids, [Rgb::new(201, 10, 10), Rgb::new(10, 10, 201)]);
        assert!(assignments.iter().step_by(2).all(|&a| a == 0));
    }

    #[test]
    fn converged_result_ignores_extra_iterations() {
        let samples = two_blobs();
        for seed in 0..5 {
            let short = kmeans(&samples, 2, 3, &mut StdRng::seed_from_u64(seed));
            let long = kmeans(&samples, 2, 100, &mut StdRng::seed_from_u64(seed));
            assert_eq!(short, long, "seed {seed}");
        }
    }

    #[test]
    fn iteration_limit_reports_not_converged() {
        let samples = two_blobs();
        let mut centroids = [Rgb::new(200, 10, 10), Rgb::new(10, 10, 200)];
        let (_, iterations, converged) = lloyd(&samples, &mut centroids, 1);
        assert_eq!(iterations, 1);
        assert!(!converged);
    }

    #[test]
    fn accepts_a_trait_object_rng() {
        let samples = two_blobs();
        let mut boxed: Box<dyn RngCore> = Box::new(StdRng::seed_from_u64(4));
        let clusters = kmeans(&samples, 2, 100, boxed.as_mut());
        assert_eq!(clusters.iter().map(|c| c.population).sum::<usize>(), samples.len());
    }

    #[test]
    fn empty_cluster_resets_to_neutral_gray() {
        let samples = [Rgb::new(10, 10, 10), Rgb::new(20, 20, 20)];
        let mut centroids = [Rgb::new(15, 15, 15), Rgb::new(250, 0, 0)];
        let mut assignments = [usize::MAX; 2];
        assert!(assign(&samples, &centroids, &mut assignments));
        update_centroids(&samples, &assignments, &mut centroids);
        assert_eq!(centroids, [Rgb::new(15, 15, 15), Rgb::NEUTRAL_GRAY]);
    }

    #[test]
    fn ties_go_to_lowest_index() {
        let centroids = [Rgb::new(0, 0, 0), Rgb::new(20, 0, 0)];
        assert_eq!(nearest_centroid(&Rgb::new(10, 0, 0), &centroids), 0);
    }

    #[test]
    fn iteration_limit_bounds_work() {
        let samples = two_blobs();
        let mut rng = StdRng::seed_from_u64(7);
        let clusters = kmeans(&samples, 3, 1, &mut rng);
        let total: usize = clusters.iter().map(|c| c.population).sum();
        assert_eq!(total, samples.len());
    }
}
