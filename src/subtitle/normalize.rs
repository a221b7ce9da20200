//! Caption normalization
//!
//! Three passes over freshly parsed captions:
//! 1. stable sort by start time, then end time
//! 2. merge adjacent duplicates (same text, overlapping spans)
//! 3. lane assignment so concurrently shown captions stack instead of colliding

use std::collections::HashSet;

use crate::config::NormalizerConfig;
use crate::types::Caption;

/// Runs the normalization passes with one set of thresholds
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Sort, merge and assign lanes
    pub fn normalize(&self, mut captions: Vec<Caption>) -> Vec<Caption> {
        let parsed = captions.len();
        sort_captions(&mut captions);
        self.merge_duplicates(&mut captions);
        self.assign_lanes(&mut captions);
        tracing::debug!(
            "Normalized {} parsed captions into {} (max lane {})",
            parsed,
            captions.len(),
            captions.iter().map(|c| c.lane).max().unwrap_or(0)
        );
        captions
    }

    /// Whether `later` overlaps `earlier` enough to matter. Both comparisons
    /// are strict: an overlap exactly at a threshold does not count.
    pub fn overlaps(&self, earlier: &Caption, later: &Caption) -> bool {
        let intersection = earlier.intersection(later);
        intersection > self.config.merge_min_overlap_secs
            || intersection > self.config.merge_min_overlap_ratio * later.duration()
    }

    /// Merge adjacent captions with identical text whose spans overlap. The
    /// later caption survives with the union of both spans. Repeats until no
    /// pair merges, so running it again on its own output changes nothing.
    pub fn merge_duplicates(&self, captions: &mut Vec<Caption>) {
        loop {
            let mut removed = Vec::new();

            for i in 1..captions.len() {
                let (head, tail) = captions.split_at_mut(i);
                let earlier = &head[i - 1];
                let later = &mut tail[0];

                if earlier.text == later.text && self.overlaps(earlier, later) {
                    later.start_time = later.start_time.min(earlier.start_time);
                    later.end_time = later.end_time.max(earlier.end_time);
                    removed.push(i - 1);
                }
            }

            if removed.is_empty() {
                return;
            }

            tracing::debug!("Merged {} duplicate captions", removed.len());
            // Back to front so pending indices stay valid.
            for index in removed.into_iter().rev() {
                captions.remove(index);
            }
        }
    }

    /// Give each caption the lowest lane not occupied by an overlapping
    /// predecessor.
    ///
    /// Only the most recent caption of each lane is considered (older ones are
    /// shadowed by it), visited newest first. The scan stops after
    /// `lane_lookback_misses` non-overlapping lane tails, which keeps the pass
    /// near linear; very dense overlap chains can occasionally end up sharing
    /// a lane.
    pub fn assign_lanes(&self, captions: &mut [Caption]) {
        // lane -> index of the latest caption placed in it
        let mut lane_tails: Vec<usize> = Vec::new();

        for i in 0..captions.len() {
            let mut tails: Vec<(usize, usize)> = lane_tails
                .iter()
                .enumerate()
                .map(|(lane, &idx)| (idx, lane))
                .collect();
            tails.sort_unstable_by(|a, b| b.0.cmp(&a.0));

            let mut taken = HashSet::new();
            let mut misses = 0;
            for (idx, lane) in tails {
                if self.overlaps(&captions[idx], &captions[i]) {
                    taken.insert(lane);
                } else {
                    misses += 1;
                    if misses >= self.config.lane_lookback_misses {
                        break;
                    }
                }
            }

            let lane = (0..=taken.len())
                .find(|lane| !taken.contains(lane))
                .unwrap_or(0);
            captions[i].lane = lane;

            if lane < lane_tails.len() {
                lane_tails[lane] = i;
            } else {
                lane_tails.push(i);
            }
        }
    }
}

/// Stable sort by start time, ties broken by end time
pub fn sort_captions(captions: &mut [Caption]) {
    captions.sort_by(|a, b| {
        a.start_time
            .total_cmp(&b.start_time)
            .then(a.end_time.total_cmp(&b.end_time))
    });
}
