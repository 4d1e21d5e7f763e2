use crate::catalog::{CityCatalog, CityId};
use crate::fetch::observation::Observation;
use std::collections::HashSet;

/// Everything collected so far for one user, in insertion order.
///
/// Invariant: at most one observation per city. [`CollectionState::merge`]
/// enforces it on append, and [`CollectionState::from_observations`] restores
/// it when rehydrating a persisted blob, keeping the first record per city.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionState {
    observations: Vec<Observation>,
    collected: HashSet<CityId>,
}

impl CollectionState {
    /// Rehydrates a state from persisted records.
    pub fn from_observations(observations: Vec<Observation>) -> Self {
        let mut state = Self::default();
        state.merge(observations);
        state
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn contains(&self, city: CityId) -> bool {
        self.collected.contains(&city)
    }

    /// Number of distinct cities collected.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Appends observations for cities not yet present, returning how many
    /// were actually added. Later duplicates are dropped.
    pub fn merge(&mut self, batch: Vec<Observation>) -> usize {
        let mut added = 0;
        for observation in batch {
            if self.collected.insert(observation.city_id) {
                self.observations.push(observation);
                added += 1;
            }
        }
        added
    }

    /// Whether every city in `catalog` has an observation here.
    pub fn is_complete(&self, catalog: &CityCatalog) -> bool {
        catalog.ids().all(|city| self.collected.contains(&city))
    }

    /// Number of collected cities that are still part of `catalog`.
    ///
    /// Persisted observations can outlive a catalog change; progress against
    /// the current catalog must not count the retired ones.
    pub fn collected_in(&self, catalog: &CityCatalog) -> usize {
        self.collected
            .iter()
            .filter(|city| catalog.contains(**city))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn observation(city: u32) -> Observation {
        Observation {
            user_id: "alice".to_string(),
            taken_at: Utc::now(),
            city_id: CityId(city),
            temperature_c: 12.0,
            humidity_pct: 55,
        }
    }

    #[test]
    fn merge_keeps_one_observation_per_city() {
        let mut state = CollectionState::default();
        assert_eq!(state.merge(vec![observation(100), observation(200)]), 2);
        assert_eq!(state.merge(vec![observation(200), observation(300)]), 1);

        let cities: Vec<CityId> = state.observations().iter().map(|o| o.city_id).collect();
        assert_eq!(cities, [CityId(100), CityId(200), CityId(300)]);
        assert_eq!(state.len(), 3);
    }

    #[test]
    fn rehydration_drops_duplicate_records() {
        let state =
            CollectionState::from_observations(vec![observation(100), observation(100)]);
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn completeness_is_judged_against_the_catalog() {
        let catalog = CityCatalog::from_ids([CityId(100), CityId(200)]);
        let mut state = CollectionState::from_observations(vec![observation(100)]);
        assert!(!state.is_complete(&catalog));

        state.merge(vec![observation(200)]);
        assert!(state.is_complete(&catalog));

        // Observations outside the catalog do not count towards completeness.
        let stray = CollectionState::from_observations(vec![observation(900)]);
        assert!(!stray.is_complete(&catalog));
    }

    #[test]
    fn collected_in_ignores_cities_retired_from_the_catalog() {
        let catalog = CityCatalog::from_ids([CityId(100), CityId(200)]);
        let state = CollectionState::from_observations(vec![
            observation(100),
            observation(900),
        ]);
        assert_eq!(state.len(), 2);
        assert_eq!(state.collected_in(&catalog), 1);
    }
}
