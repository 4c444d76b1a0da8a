use super::Filter;

/// A [`Filter`] that does no filtering.
///
/// Predictions are the most recent measurement, held through frames without a measurement.
#[derive(Debug, Clone, Default)]
pub struct Passthrough {
    last: Option<f64>,
}

impl Passthrough {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Filter for Passthrough {
    fn predict(&mut self) -> f64 {
        self.last.unwrap_or(0.0)
    }

    fn update(&mut self, measurement: f64) {
        self.last = Some(measurement);
    }

    fn is_initialized(&self) -> bool {
        self.last.is_some()
    }

    fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holds_last_measurement() {
        let mut filter = Passthrough::new();
        assert!(!filter.is_initialized());
        filter.update(0.4);
        assert_eq!(filter.predict(), 0.4);
        assert_eq!(filter.predict(), 0.4);
        filter.update(0.6);
        assert_eq!(filter.predict(), 0.6);
        filter.reset();
        assert!(!filter.is_initialized());
    }
}
