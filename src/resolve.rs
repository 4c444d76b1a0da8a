//! Attribution of detected peaks to body parts.

use std::fmt;

use crate::{
    detection::BoundingBox,
    history::BoxHistory,
    poi::{Poi, PoiMap},
};

/// What to do when a peak is detected, but no body part position is known at the peak's frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnresolvedPolicy {
    /// Keep the histories. The same peak will be examined again on the next frame, and is only
    /// dropped once it leaves the history window.
    #[default]
    Retain,
    /// Clear the histories, dropping the peak.
    Discard,
}

/// A counted contact between the tracked object and a body part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// The body part that touched the object.
    pub poi: Poi,
    /// History slot of the frame the contact happened in.
    pub slot: usize,
    /// Distance between the object and the body part at that frame.
    pub distance: f64,
    /// Predicted object position at that frame.
    pub object: BoundingBox,
}

/// Cumulative number of contacts per body part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counts(PoiMap<u32>);

impl Counts {
    /// Returns the number of contacts counted for `poi`.
    ///
    /// This is always 0 for [`Poi::TrackedObject`].
    pub fn get(&self, poi: Poi) -> u32 {
        self.0[poi]
    }

    /// Returns the number of contacts across all body parts.
    pub fn total(&self) -> u32 {
        self.0.values().sum()
    }

    /// Iterates over the counts of all body parts, in [`Poi`] declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Poi, u32)> + '_ {
        self.0.iter().filter(|(poi, _)| poi.is_body()).map(|(poi, n)| (poi, *n))
    }

    fn increment(&mut self, poi: Poi) {
        assert!(poi.is_body(), "contacts are only counted for body parts");
        self.0[poi] += 1;
    }
}

impl fmt::Display for Counts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (poi, n)) in self.iter().enumerate() {
            if i != 0 {
                f.write_str(", ")?;
            }
            write!(f, "{poi}: {n}")?;
        }
        Ok(())
    }
}

/// Finds the body part closest to the tracked object at history slot `slot`.
///
/// Body parts without a prediction at `slot` are skipped. If several body parts are at exactly
/// the same distance, the one declared first in [`Poi`] wins. Returns [`None`] if neither the
/// object nor any body part has a prediction at `slot`.
pub fn nearest_body_part(predictions: &BoxHistory, slot: usize) -> Option<Contact> {
    let object = (*predictions[Poi::TrackedObject].get(slot)?)?;

    Poi::BODY
        .into_iter()
        .filter_map(|poi| {
            let pos = (*predictions[poi].get(slot)?)?;
            Some((poi, object.distance(&pos)))
        })
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(poi, distance)| Contact {
            poi,
            slot,
            distance,
            object,
        })
}

/// Turns peaks into counted contacts.
#[derive(Debug, Clone, Default)]
pub struct EventResolver {
    policy: UnresolvedPolicy,
    counts: Counts,
}

impl EventResolver {
    pub fn new(policy: UnresolvedPolicy) -> Self {
        Self {
            policy,
            counts: Counts::default(),
        }
    }

    pub fn counts(&self) -> &Counts {
        &self.counts
    }

    /// Attributes the peak at history slot `slot` to the nearest body part.
    ///
    /// On success, the body part's count is incremented and both histories are cleared, so that the
    /// same contact isn't counted again on the next frame.
    pub fn resolve(
        &mut self,
        slot: usize,
        measurements: &mut BoxHistory,
        predictions: &mut BoxHistory,
    ) -> Option<Contact> {
        match nearest_body_part(predictions, slot) {
            Some(contact) => {
                self.counts.increment(contact.poi);
                log::debug!(
                    "contact with {} at slot {} (distance {:.3}); counts: {}",
                    contact.poi,
                    slot,
                    contact.distance,
                    self.counts,
                );
                clear(measurements, predictions);
                Some(contact)
            }
            None => {
                log::debug!("no body part found for peak at slot {slot} ({:?})", self.policy);
                if self.policy == UnresolvedPolicy::Discard {
                    clear(measurements, predictions);
                }
                None
            }
        }
    }
}

fn clear(measurements: &mut BoxHistory, predictions: &mut BoxHistory) {
    for history in measurements.values_mut().chain(predictions.values_mut()) {
        history.clear();
    }
}

#[cfg(test)]
mod tests {
    use crate::history::box_history;

    use super::*;

    fn single_frame(positions: &[(Poi, Option<[f64; 2]>)]) -> BoxHistory {
        let mut history = box_history(100);
        for &(poi, pos) in positions {
            history[poi].push(pos.map(|[x, y]| BoundingBox::point(x, y)));
        }
        history
    }

    #[test]
    fn picks_closest() {
        let preds = single_frame(&[
            (Poi::TrackedObject, Some([0.5, 0.8])),
            (Poi::Head, Some([0.5, 0.1])),
            (Poi::LeftKnee, Some([0.45, 0.7])),
            (Poi::RightKnee, None),
            (Poi::LeftFoot, Some([0.52, 0.82])),
            (Poi::RightFoot, Some([0.7, 0.9])),
        ]);
        let contact = nearest_body_part(&preds, 0).unwrap();
        assert_eq!(contact.poi, Poi::LeftFoot);
        assert_eq!(contact.slot, 0);
        assert_eq!(contact.object, BoundingBox::point(0.5, 0.8));
    }

    #[test]
    fn ties_go_to_first_declared() {
        let preds = single_frame(&[
            (Poi::TrackedObject, Some([0.5, 0.5])),
            (Poi::Head, Some([0.5, 0.9])),
            (Poi::LeftKnee, Some([0.4, 0.5])),
            (Poi::RightKnee, Some([0.6, 0.5])),
            (Poi::LeftFoot, None),
            (Poi::RightFoot, None),
        ]);
        assert_eq!(nearest_body_part(&preds, 0).unwrap().poi, Poi::LeftKnee);
    }

    #[test]
    fn nothing_to_attribute() {
        let preds = single_frame(&[
            (Poi::TrackedObject, Some([0.5, 0.5])),
            (Poi::Head, None),
            (Poi::LeftKnee, None),
            (Poi::RightKnee, None),
            (Poi::LeftFoot, None),
            (Poi::RightFoot, None),
        ]);
        assert_eq!(nearest_body_part(&preds, 0), None);
        assert_eq!(nearest_body_part(&preds, 1), None);
    }

    #[test]
    fn resolve_counts_and_clears() {
        let mut measurements = single_frame(&[(Poi::TrackedObject, None), (Poi::Head, None)]);
        let mut preds = single_frame(&[
            (Poi::TrackedObject, Some([0.5, 0.2])),
            (Poi::Head, Some([0.5, 0.15])),
        ]);
        let mut resolver = EventResolver::default();
        let contact = resolver.resolve(0, &mut measurements, &mut preds).unwrap();
        assert_eq!(contact.poi, Poi::Head);
        assert_eq!(resolver.counts().get(Poi::Head), 1);
        assert_eq!(resolver.counts().total(), 1);
        assert!(measurements.values().chain(preds.values()).all(|h| h.is_empty()));
    }

    #[test]
    fn unresolved_policies() {
        let positions = [(Poi::TrackedObject, Some([0.5, 0.2])), (Poi::Head, None)];

        let mut measurements = single_frame(&positions);
        let mut preds = single_frame(&positions);
        let mut resolver = EventResolver::new(UnresolvedPolicy::Retain);
        assert_eq!(resolver.resolve(0, &mut measurements, &mut preds), None);
        assert_eq!(resolver.counts().total(), 0);
        assert_eq!(preds[Poi::TrackedObject].len(), 1);
        assert_eq!(measurements[Poi::Head].len(), 1);

        let mut resolver = EventResolver::new(UnresolvedPolicy::Discard);
        assert_eq!(resolver.resolve(0, &mut measurements, &mut preds), None);
        assert_eq!(resolver.counts().total(), 0);
        assert!(preds.values().all(|h| h.is_empty()));
        assert!(measurements.values().all(|h| h.is_empty()));
    }

    #[test]
    fn display_counts() {
        let mut counts = Counts::default();
        counts.increment(Poi::LeftFoot);
        counts.increment(Poi::LeftFoot);
        counts.increment(Poi::Head);
        assert_eq!(
            counts.to_string(),
            "head: 1, left knee: 0, right knee: 0, left foot: 2, right foot: 0"
        );
        assert_eq!(counts.get(Poi::TrackedObject), 0);
    }

    #[test]
    #[should_panic]
    fn object_is_not_counted() {
        Counts::default().increment(Poi::TrackedObject);
    }
}
