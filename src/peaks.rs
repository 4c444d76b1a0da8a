//! Peak detection on trajectories with gaps.
//!
//! The tracked object is at its lowest point when its Y coordinate (which points down) is at a
//! local maximum. [`find_peaks`] finds such maxima and rejects the ones that barely stand out from
//! their surroundings.

use itertools::Itertools;

/// Parameters for [`find_peaks`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakOptions {
    prominence: f64,
    window: usize,
    min_valid: usize,
    min_distance: usize,
}

impl Default for PeakOptions {
    fn default() -> Self {
        Self {
            prominence: 0.02,
            window: 10,
            min_valid: 10,
            min_distance: 1,
        }
    }
}

impl PeakOptions {
    /// Sets the minimum height of a peak above the higher of the lowest samples to either side.
    ///
    /// # Panics
    ///
    /// Panics if `prominence` is negative or not finite.
    pub fn prominence(self, prominence: f64) -> Self {
        assert!(prominence.is_finite() && prominence >= 0.0);
        Self { prominence, ..self }
    }

    /// Sets how many samples to each side of a peak are considered when computing its prominence.
    ///
    /// # Panics
    ///
    /// Panics if `window` is 0.
    pub fn window(self, window: usize) -> Self {
        assert!(window > 0);
        Self { window, ..self }
    }

    /// Sets the number of present samples required before any peak is reported.
    pub fn min_valid(self, min_valid: usize) -> Self {
        Self { min_valid, ..self }
    }

    /// Sets the minimum number of samples between two reported peaks.
    ///
    /// Peaks that are closer than this to the previously reported peak are dropped. The default of
    /// 1 reports all peaks.
    pub fn min_distance(self, min_distance: usize) -> Self {
        Self {
            min_distance,
            ..self
        }
    }
}

/// Returns the indices of all sufficiently prominent local maxima in `samples`, in ascending
/// order.
///
/// A sample is a local maximum if it is greater than both of its neighbors, where missing
/// neighbors never prevent a maximum. The first and last sample are never reported.
///
/// Returns no peaks while `samples` contains fewer than [`PeakOptions::min_valid`] present samples.
pub fn find_peaks(samples: &[Option<f64>], options: &PeakOptions) -> Vec<usize> {
    let valid = samples.iter().flatten().count();
    if valid < options.min_valid {
        log::trace!(
            "deferring peak detection: {valid}/{} valid samples",
            options.min_valid
        );
        return Vec::new();
    }

    let mut peaks: Vec<usize> = Vec::new();
    let candidates = samples
        .iter()
        .tuple_windows()
        .enumerate()
        .filter_map(|(i, (prev, cur, next))| {
            let cur = (*cur)?;
            let prev = prev.unwrap_or(f64::NEG_INFINITY);
            let next = next.unwrap_or(f64::NEG_INFINITY);
            (cur > prev && cur > next).then_some((i + 1, cur))
        });

    for (i, value) in candidates {
        let left = window_min(&samples[i.saturating_sub(options.window)..i]);
        let right = window_min(&samples[i + 1..(i + 1 + options.window).min(samples.len())]);

        let accepted = match (left, right) {
            (None, None) => true,
            (left, right) => {
                let base = left
                    .unwrap_or(f64::NEG_INFINITY)
                    .max(right.unwrap_or(f64::NEG_INFINITY));
                value - base >= options.prominence
            }
        };
        if !accepted {
            continue;
        }

        match peaks.last() {
            Some(&last) if i - last < options.min_distance => {}
            _ => peaks.push(i),
        }
    }

    peaks
}

/// Lowest present sample, or [`None`] if all are missing.
fn window_min(samples: &[Option<f64>]) -> Option<f64> {
    samples.iter().flatten().copied().reduce(f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bump(len: usize, at: usize, amplitude: f64) -> Vec<Option<f64>> {
        (0..len)
            .map(|i| Some(if i == at { 0.5 + amplitude } else { 0.5 }))
            .collect()
    }

    #[test]
    fn single_bump() {
        let options = PeakOptions::default();
        assert_eq!(find_peaks(&bump(12, 6, 0.05), &options), [6]);
        assert_eq!(find_peaks(&bump(12, 6, 0.01), &options), [] as [usize; 0]);
    }

    #[test]
    fn too_few_samples() {
        let options = PeakOptions::default();
        let mut samples = bump(12, 6, 0.05);
        for sample in &mut samples[..3] {
            *sample = None;
        }
        // 9 valid samples.
        assert!(find_peaks(&samples, &options).is_empty());
        assert_eq!(find_peaks(&samples, &options.min_valid(9)), [6]);
    }

    #[test]
    fn edges_are_never_peaks() {
        let samples = [0.9, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.9].map(Some);
        assert!(find_peaks(&samples, &PeakOptions::default()).is_empty());
    }

    #[test]
    fn missing_neighbors_dont_block() {
        let mut samples = bump(14, 6, 0.05);
        samples[5] = None;
        samples[7] = None;
        assert_eq!(find_peaks(&samples, &PeakOptions::default()), [6]);
    }

    #[test]
    fn missing_sample_is_not_a_candidate() {
        let mut samples = bump(14, 6, 0.05);
        samples[6] = None;
        assert!(find_peaks(&samples, &PeakOptions::default()).is_empty());
    }

    #[test]
    fn unconstrained_peak_is_accepted() {
        // Both prominence windows consist only of missing samples.
        let mut samples = vec![None; 9];
        samples[4] = Some(0.5);
        assert_eq!(
            find_peaks(&samples, &PeakOptions::default().min_valid(1).window(3)),
            [4]
        );
    }

    #[test]
    fn prominence_uses_higher_side() {
        // Deep valley on the left, shallow on the right: only the right side counts.
        let samples = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.61, 0.6, 0.6, 0.6, 0.6, 0.6].map(Some);
        let options = PeakOptions::default();
        assert!(find_peaks(&samples, &options).is_empty());
        assert_eq!(find_peaks(&samples, &options.prominence(0.005)), [6]);
    }

    #[test]
    fn prominence_window_is_bounded() {
        // The deep valley on each side is more than 3 samples away from the peak.
        let samples = [0.0, 0.5, 0.5, 0.5, 0.6, 0.5, 0.5, 0.5, 0.0].map(Some);
        let options = PeakOptions::default().min_valid(1).prominence(0.2);
        assert_eq!(find_peaks(&samples, &options), [4]);
        assert!(find_peaks(&samples, &options.window(3)).is_empty());
    }

    #[test]
    fn ascending_order_and_min_distance() {
        let mut samples = vec![Some(0.5); 20];
        samples[4] = Some(0.6);
        samples[7] = Some(0.6);
        samples[15] = Some(0.6);
        let options = PeakOptions::default();
        assert_eq!(find_peaks(&samples, &options), [4, 7, 15]);
        assert_eq!(find_peaks(&samples, &options.min_distance(5)), [4, 15]);
    }
}
