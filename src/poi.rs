//! Points of interest and per-POI storage.

use std::{
    array, fmt,
    ops::{Index, IndexMut},
};

/// Names for the tracked points of interest.
///
/// The declaration order is meaningful: when two body parts are exactly equally close to the
/// tracked object, the one declared first gets the contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Poi {
    /// The object whose contacts are counted (the ball).
    TrackedObject,
    Head,
    LeftKnee,
    RightKnee,
    LeftFoot,
    RightFoot,
}

impl Poi {
    /// The number of [`Poi`] variants.
    pub const COUNT: usize = 6;

    /// All POIs, in declaration order.
    pub const ALL: [Poi; Self::COUNT] = [
        Poi::TrackedObject,
        Poi::Head,
        Poi::LeftKnee,
        Poi::RightKnee,
        Poi::LeftFoot,
        Poi::RightFoot,
    ];

    /// All POIs except [`Poi::TrackedObject`], in declaration order.
    pub const BODY: [Poi; Self::COUNT - 1] = [
        Poi::Head,
        Poi::LeftKnee,
        Poi::RightKnee,
        Poi::LeftFoot,
        Poi::RightFoot,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn is_body(self) -> bool {
        self != Poi::TrackedObject
    }

    /// Returns a human-readable name of the POI.
    pub fn name(self) -> &'static str {
        match self {
            Poi::TrackedObject => "ball",
            Poi::Head => "head",
            Poi::LeftKnee => "left knee",
            Poi::RightKnee => "right knee",
            Poi::LeftFoot => "left foot",
            Poi::RightFoot => "right foot",
        }
    }

    /// Returns the index of the BlazePose landmark this POI is read from.
    ///
    /// BlazePose outputs 33 landmarks per person. The head is represented by the nose, the feet by
    /// the foot index (toe) landmarks. Returns [`None`] for [`Poi::TrackedObject`], which comes
    /// from an object detector instead.
    pub fn pose_landmark(self) -> Option<usize> {
        match self {
            Poi::TrackedObject => None,
            Poi::Head => Some(0),
            Poi::LeftKnee => Some(25),
            Poi::RightKnee => Some(26),
            Poi::LeftFoot => Some(31),
            Poi::RightFoot => Some(32),
        }
    }
}

impl fmt::Display for Poi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A fixed-size map holding one `T` for every [`Poi`].
///
/// Iteration always happens in [`Poi`] declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoiMap<T>([T; Poi::COUNT]);

impl<T> PoiMap<T> {
    /// Creates a [`PoiMap`] by invoking a closure with every [`Poi`].
    pub fn from_fn<F>(mut cb: F) -> Self
    where
        F: FnMut(Poi) -> T,
    {
        Self(array::from_fn(|i| cb(Poi::ALL[i])))
    }

    /// Applies a closure to each value, returning a new map.
    pub fn map<F, U>(self, mut f: F) -> PoiMap<U>
    where
        F: FnMut(Poi, T) -> U,
    {
        let mut i = 0;
        PoiMap(self.0.map(|v| {
            let poi = Poi::ALL[i];
            i += 1;
            f(poi, v)
        }))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Poi, &T)> + '_ {
        Poi::ALL.into_iter().zip(&self.0)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Poi, &mut T)> + '_ {
        Poi::ALL.into_iter().zip(&mut self.0)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.0.iter()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        self.0.iter_mut()
    }
}

impl<T: Default> Default for PoiMap<T> {
    fn default() -> Self {
        Self::from_fn(|_| T::default())
    }
}

impl<T> Index<Poi> for PoiMap<T> {
    type Output = T;

    #[inline]
    fn index(&self, poi: Poi) -> &T {
        &self.0[poi.index()]
    }
}

impl<T> IndexMut<Poi> for PoiMap<T> {
    #[inline]
    fn index_mut(&mut self, poi: Poi) -> &mut T {
        &mut self.0[poi.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_follow_declaration_order() {
        for (i, poi) in Poi::ALL.into_iter().enumerate() {
            assert_eq!(poi.index(), i);
        }
        assert_eq!(&Poi::ALL[1..], &Poi::BODY);
        assert!(Poi::BODY.iter().all(|poi| poi.is_body()));
    }

    #[test]
    fn map_visits_every_poi() {
        let map = PoiMap::from_fn(|poi| poi.index() * 10);
        assert_eq!(map[Poi::LeftFoot], 40);

        let names = map.map(|poi, v| format!("{poi}={v}"));
        assert_eq!(names[Poi::TrackedObject], "ball=0");
        assert_eq!(names[Poi::RightFoot], "right foot=50");

        let order = map.iter().map(|(poi, _)| poi).collect::<Vec<_>>();
        assert_eq!(order, Poi::ALL);
    }

    #[test]
    fn pose_landmarks() {
        assert_eq!(Poi::TrackedObject.pose_landmark(), None);
        assert_eq!(Poi::Head.pose_landmark(), Some(0));
        assert_eq!(Poi::RightFoot.pose_landmark(), Some(32));
    }
}
