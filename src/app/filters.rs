//! Filter/search panel state

use crate::models::{Region, SearchQuery};

/// Step used by the min-rating control
pub const RATING_STEP: f64 = 0.1;
pub const MAX_RATING: f64 = 5.0;

/// Search criteria being edited plus the panel's own view state.
/// Values only change through explicit user actions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterState {
    pub name: String,
    pub min_rating: f64,
    /// Selected regions, in the order they were checked
    pub regions: Vec<Region>,
    /// Disclosure state of the panel; independent of the values
    pub expanded: bool,
    /// Highlighted row in the region checklist
    pub region_cursor: usize,
}

impl FilterState {
    pub fn toggle_expanded(&mut self) {
        self.expanded = !self.expanded;
    }

    /// Add the region if unchecked, remove it if checked
    pub fn toggle_region(&mut self, region: Region) {
        if let Some(pos) = self.regions.iter().position(|r| *r == region) {
            self.regions.remove(pos);
        } else {
            self.regions.push(region);
        }
    }

    pub fn toggle_highlighted_region(&mut self) {
        if let Some(region) = Region::ALL.get(self.region_cursor).copied() {
            self.toggle_region(region);
        }
    }

    pub fn is_selected(&self, region: Region) -> bool {
        self.regions.contains(&region)
    }

    pub fn next_region(&mut self) {
        self.region_cursor = (self.region_cursor + 1) % Region::ALL.len();
    }

    pub fn prev_region(&mut self) {
        self.region_cursor = self
            .region_cursor
            .checked_sub(1)
            .unwrap_or(Region::ALL.len() - 1);
    }

    pub fn raise_min_rating(&mut self) {
        self.min_rating = one_decimal(self.min_rating + RATING_STEP).min(MAX_RATING);
    }

    pub fn lower_min_rating(&mut self) {
        self.min_rating = one_decimal(self.min_rating - RATING_STEP).max(0.0);
    }

    /// Reset all criteria; the disclosure state is left alone
    pub fn clear(&mut self) {
        self.name.clear();
        self.min_rating = 0.0;
        self.regions.clear();
    }

    pub fn to_query(&self) -> SearchQuery {
        SearchQuery {
            name: self.name.trim().to_string(),
            min_rating: self.min_rating,
            regions: self.regions.clone(),
        }
    }
}

/// Keeps repeated steps from drifting (0.1 + 0.2 != 0.3)
fn one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_twice_restores_set() {
        let mut filters = FilterState::default();
        filters.toggle_region(Region::Carmel);
        filters.toggle_region(Region::Negev);
        let before = filters.regions.clone();

        filters.toggle_region(Region::Sharon);
        assert!(filters.is_selected(Region::Sharon));
        filters.toggle_region(Region::Sharon);
        assert_eq!(filters.regions, before);

        filters.toggle_region(Region::Carmel);
        assert_eq!(filters.regions, vec![Region::Negev]);
    }

    #[test]
    fn test_disclosure_does_not_touch_values() {
        let mut filters = FilterState {
            name: "Golan".into(),
            min_rating: 2.5,
            regions: vec![Region::GolanHeights],
            ..Default::default()
        };
        let query = filters.to_query();
        filters.toggle_expanded();
        filters.toggle_expanded();
        filters.toggle_expanded();
        assert!(filters.expanded);
        assert_eq!(filters.to_query(), query);
    }

    #[test]
    fn test_min_rating_is_clamped() {
        let mut filters = FilterState::default();
        filters.lower_min_rating();
        assert_eq!(filters.min_rating, 0.0);
        for _ in 0..60 {
            filters.raise_min_rating();
        }
        assert_eq!(filters.min_rating, MAX_RATING);
        filters.lower_min_rating();
        assert_eq!(filters.min_rating, 4.9);
    }

    #[test]
    fn test_min_rating_steps_by_tenths() {
        let mut filters = FilterState::default();
        for _ in 0..38 {
            filters.raise_min_rating();
        }
        assert_eq!(filters.min_rating, 3.8);
        assert_eq!(filters.to_query().min_rating, 3.8);
        filters.lower_min_rating();
        filters.lower_min_rating();
        filters.lower_min_rating();
        assert_eq!(filters.min_rating, 3.5);
    }

    #[test]
    fn test_region_cursor_wraps_and_toggles() {
        let mut filters = FilterState::default();
        filters.prev_region();
        assert_eq!(filters.region_cursor, Region::ALL.len() - 1);
        filters.toggle_highlighted_region();
        assert_eq!(filters.regions, vec![Region::JerusalemMountains]);
        filters.next_region();
        assert_eq!(filters.region_cursor, 0);
    }

    #[test]
    fn test_clear_keeps_disclosure() {
        let mut filters = FilterState {
            name: "x".into(),
            min_rating: 1.0,
            regions: vec![Region::Samson],
            expanded: true,
            region_cursor: 3,
        };
        filters.clear();
        assert!(filters.to_query().is_unfiltered());
        assert!(filters.expanded);
    }
}
