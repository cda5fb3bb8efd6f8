// THEORY:
// A `RegionFilter` is the single caller-tunable heuristic of the pipeline. The
// extractor knows nothing about what a plate looks like; it asks the filter,
// once per discovered blob, whether a box of the given size is worth keeping.
//
// The filter is passed in by reference for each call rather than registered
// anywhere global, so independent detection calls never share state through it.
// It must be cheap and must not block: it runs inline in the labeling loop.

use serde::{Deserialize, Serialize};

/// Accept/reject predicate over candidate box sizes.
pub trait RegionFilter {
    fn accept(&self, width: u32, height: u32) -> bool;
}

impl<F> RegionFilter for F
where
    F: Fn(u32, u32) -> bool,
{
    fn accept(&self, width: u32, height: u32) -> bool {
        self(width, height)
    }
}

/// Keeps every candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl RegionFilter for AcceptAll {
    fn accept(&self, _width: u32, _height: u32) -> bool {
        true
    }
}

/// Drops every candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectAll;

impl RegionFilter for RejectAll {
    fn accept(&self, _width: u32, _height: u32) -> bool {
        false
    }
}

/// Size window for frontal licence plates.
///
/// A box is rejected when it is both wider than `max_width` and taller than
/// `max_height`, or when either side is below its minimum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlateSizeFilter {
    pub min_width: u32,
    pub min_height: u32,
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for PlateSizeFilter {
    fn default() -> Self {
        Self {
            min_width: 45,
            min_height: 45,
            max_width: 300,
            max_height: 200,
        }
    }
}

impl RegionFilter for PlateSizeFilter {
    fn accept(&self, width: u32, height: u32) -> bool {
        tracing::trace!(width, height, "potential blob region");
        let too_big = width > self.max_width && height > self.max_height;
        let too_small = width < self.min_width || height < self.min_height;
        !(too_big || too_small)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_filters() {
        let wide_only = |w: u32, h: u32| w > h;
        assert!(wide_only.accept(10, 5));
        assert!(!wide_only.accept(5, 10));
    }

    #[test]
    fn plate_filter_window() {
        let filter = PlateSizeFilter::default();
        assert!(filter.accept(120, 60));
        assert!(filter.accept(45, 45));
        assert!(!filter.accept(44, 60), "too narrow");
        assert!(!filter.accept(120, 44), "too short");
        assert!(!filter.accept(301, 201), "too big");
        // Only one side over the maximum is still a plausible plate.
        assert!(filter.accept(301, 100));
        assert!(filter.accept(200, 250));
    }

    #[test]
    fn constant_filters() {
        assert!(AcceptAll.accept(1, 1));
        assert!(!RejectAll.accept(100, 100));
    }

    #[test]
    fn plate_filter_fills_missing_fields_from_defaults() {
        let filter: PlateSizeFilter = serde_json::from_str(r#"{ "min_width": 60 }"#).unwrap();
        assert_eq!(filter.min_width, 60);
        assert_eq!(filter.max_height, 200);
    }
}
