//! Geo Lookup Module
//! Static state -> centroid table backing the map view.

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashMap;

/// Approximate geographic center of a state, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Centroid {
    pub lat: f64,
    pub lon: f64,
}

static STATE_CENTROIDS: Lazy<HashMap<String, Centroid>> = Lazy::new(|| {
    serde_json::from_str(include_str!("../assets/state_centroids.json"))
        .expect("embedded centroid table parses")
});

/// Centroid for a state, exact-name lookup. Unknown names return `None`
/// and simply don't plot.
pub fn state_centroid(state: &str) -> Option<Centroid> {
    STATE_CENTROIDS.get(state).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_states_resolve() {
        let kerala = state_centroid("Kerala").unwrap();
        assert!((kerala.lat - 10.9).abs() < 1e-9);
        assert!((kerala.lon - 76.3).abs() < 1e-9);
        assert!(state_centroid("Uttar Pradesh").is_some());
    }

    #[test]
    fn unknown_states_are_none_not_a_panic() {
        assert!(state_centroid("Atlantis").is_none());
        assert!(state_centroid("kerala").is_none());
    }

    #[test]
    fn every_centroid_is_inside_the_india_bounding_box() {
        for (state, c) in STATE_CENTROIDS.iter() {
            assert!((6.0..=37.0).contains(&c.lat), "{state} lat {}", c.lat);
            assert!((68.0..=98.0).contains(&c.lon), "{state} lon {}", c.lon);
        }
    }
}
