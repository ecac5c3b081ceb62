//! Per-winery rating submissions.
//!
//! A submission is shown optimistically while in flight. Every server
//! aggregate that arrives is written back unless a newer one was already
//! applied; on failure the display falls back to the last aggregate the
//! server confirmed. Only the newest submission decides the widget state.

use std::collections::{HashMap, HashSet};

use crate::models::{Winery, WineryId};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RatingState {
    Pending { request_id: u64, rating: u8 },
    Confirmed { rating: u8, average: f64 },
    Failed { rating: u8 },
}

#[derive(Clone, Debug, Default)]
pub struct RatingBook {
    states: HashMap<WineryId, RatingState>,
    /// Submissions still waiting for an outcome
    outstanding: HashSet<u64>,
    /// Request whose aggregate was last written back, per winery
    applied: HashMap<WineryId, u64>,
}

impl RatingBook {
    /// Record a new in-flight submission, superseding any earlier one
    pub fn submit(&mut self, winery_id: WineryId, request_id: u64, rating: u8) {
        self.outstanding.insert(request_id);
        self.states
            .insert(winery_id, RatingState::Pending { request_id, rating });
    }

    /// Record a successful submission. Returns true when the caller must
    /// write `average` into the collection: false for unknown requests and
    /// for aggregates older than one already applied. A superseded success
    /// still counts as the last confirmed value but leaves the newer
    /// submission pending.
    pub fn confirm(&mut self, winery_id: WineryId, request_id: u64, average: f64) -> bool {
        if !self.outstanding.remove(&request_id) {
            return false;
        }
        if let Some(RatingState::Pending { request_id: pending, rating }) =
            self.states.get(&winery_id).copied()
        {
            if pending == request_id {
                self.states
                    .insert(winery_id, RatingState::Confirmed { rating, average });
            }
        }
        match self.applied.get(&winery_id) {
            Some(newest) if *newest > request_id => false,
            _ => {
                self.applied.insert(winery_id, request_id);
                true
            }
        }
    }

    /// Roll back a failed submission. Returns false for stale or unknown requests.
    pub fn fail(&mut self, winery_id: WineryId, request_id: u64) -> bool {
        if !self.outstanding.remove(&request_id) {
            return false;
        }
        match self.states.get(&winery_id) {
            Some(RatingState::Pending { request_id: pending, rating }) if *pending == request_id => {
                let rating = *rating;
                self.states.insert(winery_id, RatingState::Failed { rating });
                true
            }
            _ => false,
        }
    }

    pub fn state(&self, winery_id: WineryId) -> Option<RatingState> {
        self.states.get(&winery_id).copied()
    }

    /// Value the star widget shows for this winery
    pub fn displayed(&self, winery: &Winery) -> f64 {
        match self.states.get(&winery.id) {
            Some(RatingState::Pending { rating, .. }) => f64::from(*rating),
            _ => winery.average_rating,
        }
    }

    pub fn clear(&mut self) {
        self.states.clear();
        self.outstanding.clear();
        self.applied.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn winery(id: WineryId, average_rating: f64) -> Winery {
        Winery {
            id,
            name: format!("W{}", id),
            description: String::new(),
            latitude: 32.0,
            longitude: 35.0,
            region: None,
            average_rating,
        }
    }

    #[test]
    fn test_pending_then_confirmed() {
        let mut book = RatingBook::default();
        let w = winery(1, 3.0);
        book.submit(1, 10, 5);
        assert_eq!(book.displayed(&w), 5.0);

        assert!(book.confirm(1, 10, 4.5));
        assert_eq!(book.state(1), Some(RatingState::Confirmed { rating: 5, average: 4.5 }));
        // The caller writes the average into the collection
        assert_eq!(book.displayed(&winery(1, 4.5)), 4.5);
    }

    #[test]
    fn test_failure_rolls_back() {
        let mut book = RatingBook::default();
        let w = winery(2, 3.2);
        book.submit(2, 11, 1);
        assert_eq!(book.displayed(&w), 1.0);
        assert!(book.fail(2, 11));
        assert_eq!(book.displayed(&w), 3.2);
        assert_eq!(book.state(2), Some(RatingState::Failed { rating: 1 }));
    }

    #[test]
    fn test_stale_outcomes_are_ignored() {
        let mut book = RatingBook::default();
        book.submit(3, 20, 2);
        book.submit(3, 21, 4);
        assert!(!book.fail(3, 20));
        assert_eq!(book.state(3), Some(RatingState::Pending { request_id: 21, rating: 4 }));
        assert!(book.confirm(3, 21, 3.9));
        // A second outcome for the same request does nothing
        assert!(!book.fail(3, 21));
        assert!(!book.confirm(3, 21, 1.0));
    }

    #[test]
    fn test_superseded_success_still_updates_aggregate() {
        let mut book = RatingBook::default();
        book.submit(4, 30, 5);
        book.submit(4, 31, 4);

        // Older request lands first: its aggregate is applied, newer stays pending
        assert!(book.confirm(4, 30, 4.6));
        assert_eq!(book.state(4), Some(RatingState::Pending { request_id: 31, rating: 4 }));
        assert_eq!(book.displayed(&winery(4, 4.6)), 4.0);

        assert!(book.fail(4, 31));
        assert_eq!(book.displayed(&winery(4, 4.6)), 4.6);
    }

    #[test]
    fn test_late_older_aggregate_does_not_overwrite_newer() {
        let mut book = RatingBook::default();
        book.submit(5, 40, 1);
        book.submit(5, 41, 5);
        assert!(book.confirm(5, 41, 4.2));
        assert!(!book.confirm(5, 40, 3.1));
        assert_eq!(book.state(5), Some(RatingState::Confirmed { rating: 5, average: 4.2 }));
    }

    #[test]
    fn test_other_wineries_unaffected() {
        let mut book = RatingBook::default();
        book.submit(1, 1, 5);
        assert_eq!(book.displayed(&winery(2, 2.5)), 2.5);
        book.clear();
        assert_eq!(book.state(1), None);
        assert!(!book.confirm(1, 1, 5.0));
    }
}
