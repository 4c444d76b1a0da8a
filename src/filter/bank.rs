use crate::{
    detection::{BoundingBox, Detections},
    poi::{Poi, PoiMap},
};

use super::{Filter, FilterFactory};

/// One filter per [`Poi`] and axis.
///
/// All filters are created up front by a [`FilterFactory`]. Widths and heights are not filtered;
/// predictions carry the size of the most recent detection of their POI. This includes frames
/// where the POI is missing: the size is held just like the filtered position, rather than
/// dropping to 0x0.
pub struct FilterBank<F> {
    /// X and Y filter of every POI.
    filters: PoiMap<[F; 2]>,
    sizes: PoiMap<Option<[f64; 2]>>,
}

impl<F: Filter> FilterBank<F> {
    pub fn new<B>(factory: &B) -> Self
    where
        B: FilterFactory<Filter = F>,
    {
        Self {
            filters: PoiMap::from_fn(|_| [factory.build(), factory.build()]),
            sizes: PoiMap::default(),
        }
    }

    /// Feeds one frame of detections through the filters, returning the prediction for every POI.
    ///
    /// A POI's prediction is [`None`] until it has been detected at least once.
    pub fn step(&mut self, detections: &Detections) -> PoiMap<Option<BoundingBox>> {
        PoiMap::from_fn(|poi| self.step_poi(poi, detections.get(poi)))
    }

    fn step_poi(&mut self, poi: Poi, detection: Option<BoundingBox>) -> Option<BoundingBox> {
        let [fx, fy] = &mut self.filters[poi];
        if let Some(det) = detection {
            fx.update(det.x());
            fy.update(det.y());
            self.sizes[poi] = Some([det.w(), det.h()]);
        }

        let x = fx.predict();
        let y = fy.predict();
        if !(fx.is_initialized() && fy.is_initialized()) {
            return None;
        }

        let [w, h] = self.sizes[poi].unwrap_or_default();
        Some(BoundingBox::new(x, y, w, h))
    }

    /// Returns the X and Y filter of `poi`.
    pub fn filters(&self, poi: Poi) -> &[F; 2] {
        &self.filters[poi]
    }

    /// Resets every filter to its freshly built state.
    pub fn reset(&mut self) {
        for filter in self.filters.values_mut().flatten() {
            filter.reset();
        }
        self.sizes = PoiMap::default();
    }
}

#[cfg(test)]
mod tests {
    use crate::filter::{KalmanParams, Passthrough};

    use super::*;

    #[test]
    fn eagerly_built_and_lazily_initialized() {
        let mut bank = FilterBank::new(&KalmanParams::default());
        assert!(Poi::ALL
            .iter()
            .all(|&poi| bank.filters(poi).iter().all(|f| !f.is_initialized())));

        let preds = bank.step(&Detections::new().with(Poi::Head, BoundingBox::point(0.5, 0.2)));
        assert_eq!(preds[Poi::Head], Some(BoundingBox::point(0.5, 0.2)));
        for poi in Poi::ALL.into_iter().filter(|&poi| poi != Poi::Head) {
            assert_eq!(preds[poi], None, "{poi}");
        }
    }

    #[test]
    fn sizes_pass_through() {
        let mut bank = FilterBank::new(&Passthrough::new);
        let ball = BoundingBox::new(0.5, 0.5, 0.1, 0.2);
        let preds = bank.step(&Detections::new().with(Poi::TrackedObject, ball));
        assert_eq!(preds[Poi::TrackedObject], Some(ball));

        // Missing frames keep the last position and size.
        let preds = bank.step(&Detections::new());
        assert_eq!(preds[Poi::TrackedObject], Some(ball));

        let moved = BoundingBox::new(0.6, 0.4, 0.12, 0.22);
        let preds = bank.step(&Detections::new().with(Poi::TrackedObject, moved));
        assert_eq!(preds[Poi::TrackedObject], Some(moved));
    }

    #[test]
    fn reset_forgets_everything() {
        let mut bank = FilterBank::new(&Passthrough::new);
        bank.step(&Detections::new().with(Poi::LeftFoot, BoundingBox::point(0.3, 0.9)));
        bank.reset();
        let preds = bank.step(&Detections::new());
        assert_eq!(preds[Poi::LeftFoot], None);
    }

    #[test]
    fn boxed_filters() {
        let factory = || -> Box<dyn Filter + Send> { Box::new(Passthrough::new()) };
        let mut bank = FilterBank::new(&factory);
        let preds = bank.step(&Detections::new().with(Poi::Head, BoundingBox::point(0.1, 0.2)));
        assert_eq!(preds[Poi::Head], Some(BoundingBox::point(0.1, 0.2)));
    }
}
