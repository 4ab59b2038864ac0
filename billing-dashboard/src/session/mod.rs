use std::collections::{BTreeMap, BTreeSet};

use billing_client::{ApiError, CustomerId, DailyReadings, MonthKey};
use time::Date;

/// A chosen date range. Ordering of the two ends is not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub start: Date,
    pub end: Date,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("No meter reading recorded on {0}.")]
    NotSelectable(Date),
}

/// Per-session reading cache and selection.
///
/// Every customer change bumps `generation`; fetch completions carrying an
/// older generation belong to a previous customer and are discarded.
#[derive(Debug, Default)]
pub struct SessionState {
    customer: Option<CustomerId>,
    generation: u64,
    readings: BTreeMap<Date, f64>,
    loaded: BTreeSet<MonthKey>,
    in_flight: BTreeSet<MonthKey>,
    selection: Option<Selection>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn customer(&self) -> Option<&CustomerId> {
        self.customer.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Drop everything owned by the previous customer and start a new generation.
    pub fn reset(&mut self, customer: Option<CustomerId>) -> u64 {
        self.readings.clear();
        self.loaded.clear();
        self.in_flight.clear();
        self.selection = None;
        self.customer = customer.filter(|c| !c.is_empty());
        self.generation += 1;

        tracing::debug!(generation = self.generation, customer = ?self.customer, "session reset");
        self.generation
    }

    /// Merge a month of readings; later merges overwrite overlapping dates.
    /// Returns the number of dates that were not cached before.
    pub fn merge_readings(&mut self, readings: &DailyReadings) -> usize {
        let mut added = 0;
        for (date, kwh) in readings.iter() {
            if self.readings.insert(date, kwh).is_none() {
                added += 1;
            }
        }
        added
    }

    pub fn mark_loaded(&mut self, month: MonthKey) {
        self.loaded.insert(month);
    }

    pub fn is_loaded(&self, month: MonthKey) -> bool {
        self.loaded.contains(&month)
    }

    pub fn is_in_flight(&self, month: MonthKey) -> bool {
        self.in_flight.contains(&month)
    }

    /// Whether a request for `month` should go out for `customer`.
    pub fn should_fetch(&self, customer: &CustomerId, month: MonthKey) -> bool {
        if customer.is_empty() || self.customer.as_ref() != Some(customer) {
            return false;
        }
        !self.loaded.contains(&month) && !self.in_flight.contains(&month)
    }

    /// Record an outgoing request and return the generation it belongs to.
    pub fn begin_fetch(&mut self, month: MonthKey) -> u64 {
        self.in_flight.insert(month);
        self.generation
    }

    /// Begin a fetch for `month` unless [`should_fetch`](Self::should_fetch)
    /// rules it out. Returns the generation to tag the request with.
    pub fn request_month(&mut self, customer: &CustomerId, month: MonthKey) -> Option<u64> {
        if !self.should_fetch(customer, month) {
            metrics::counter!("dashboard_month_fetch_skipped_total").increment(1);
            tracing::debug!(%customer, %month, "month loaded or in flight, skipping fetch");
            return None;
        }
        Some(self.begin_fetch(month))
    }

    /// Apply a fetch completion. Returns `true` only when readings were merged.
    ///
    /// Failures leave the month unmarked so it can be retried.
    pub fn complete_fetch(
        &mut self,
        generation: u64,
        month: MonthKey,
        result: Result<DailyReadings, ApiError>,
    ) -> bool {
        if generation != self.generation {
            metrics::counter!("dashboard_stale_responses_total").increment(1);
            tracing::debug!(
                %month,
                generation,
                current = self.generation,
                "discarding response for a previous customer"
            );
            return false;
        }

        self.in_flight.remove(&month);

        match result {
            Ok(readings) => {
                let added = self.merge_readings(&readings);
                self.loaded.insert(month);
                metrics::counter!("dashboard_month_fetch_total").increment(1);
                tracing::info!(
                    %month,
                    received = readings.len(),
                    added,
                    cached = self.readings.len(),
                    "month readings merged"
                );
                true
            }
            Err(e) => {
                metrics::counter!("dashboard_month_fetch_failed_total").increment(1);
                tracing::warn!(%month, error = %e, "failed to fetch daily readings");
                false
            }
        }
    }

    pub fn is_selectable(&self, date: Date) -> bool {
        self.readings.contains_key(&date)
    }

    pub fn valid_dates(&self) -> BTreeSet<Date> {
        self.readings.keys().copied().collect()
    }

    pub fn reading_at(&self, date: Date) -> Option<f64> {
        self.readings.get(&date).copied()
    }

    pub fn reading_count(&self) -> usize {
        self.readings.len()
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn set_selection(&mut self, start: Date, end: Date) -> Result<Selection, SelectionError> {
        for date in [start, end] {
            if !self.is_selectable(date) {
                return Err(SelectionError::NotSelectable(date));
            }
        }
        let selection = Selection { start, end };
        self.selection = Some(selection);
        Ok(selection)
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }
}
