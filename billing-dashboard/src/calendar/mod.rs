//! Date range selection on top of a swappable calendar widget.

use std::collections::BTreeSet;

use billing_client::MonthKey;
use time::Date;

use crate::{billing::format::format_label_date, session::SessionState};

/// Capabilities the dashboard needs from a concrete calendar control.
///
/// A widget reports user interaction as [`CalendarEvent`]s tagged with the
/// instance id it was mounted with.
pub trait CalendarWidget {
    /// Build a fresh instance showing `visible`, with only `valid_dates` enabled.
    fn mount(&mut self, instance: u64, visible: MonthKey, valid_dates: &BTreeSet<Date>);
    /// Re-render the mounted instance.
    fn render(&mut self, visible: MonthKey, valid_dates: &BTreeSet<Date>);
    /// Tear down the mounted instance and its event bindings.
    fn unmount(&mut self);
    fn set_enabled(&mut self, enabled: bool);
    fn set_label(&mut self, label: Option<&str>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Previous,
    Next,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarAction {
    Apply { start: Date, end: Date },
    Cancel,
    Navigate(Step),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarEvent {
    pub instance: u64,
    pub action: CalendarAction,
}

/// `01 Mar 2024 - 31 Mar 2024`
pub fn range_label(start: Date, end: Date) -> String {
    format!("{} - {}", format_label_date(start), format_label_date(end))
}

/// `01 Mar 2024 to 31 Mar 2024`
pub fn period_label(start: Date, end: Date) -> String {
    format!("{} to {}", format_label_date(start), format_label_date(end))
}

pub struct DateRangeSelector<W> {
    widget: W,
    mounted: Option<u64>,
    instances: u64,
    visible: Option<MonthKey>,
    enabled: bool,
}

impl<W: CalendarWidget> DateRangeSelector<W> {
    /// Starts disabled with nothing mounted.
    pub fn new(mut widget: W) -> Self {
        widget.set_enabled(false);
        Self {
            widget,
            mounted: None,
            instances: 0,
            visible: None,
            enabled: false,
        }
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    pub fn widget_mut(&mut self) -> &mut W {
        &mut self.widget
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn visible_month(&self) -> Option<MonthKey> {
        self.visible
    }

    pub fn mounted_instance(&self) -> Option<u64> {
        self.mounted
    }

    /// Tear down any existing instance and mount a fresh, enabled one.
    pub fn reinitialize(&mut self, session: &SessionState, visible: MonthKey) {
        if self.mounted.take().is_some() {
            self.widget.unmount();
        }
        self.instances += 1;
        let instance = self.instances;

        self.widget.mount(instance, visible, &session.valid_dates());
        self.widget.set_label(None);
        self.widget.set_enabled(true);

        self.mounted = Some(instance);
        self.visible = Some(visible);
        self.enabled = true;
        tracing::debug!(instance, %visible, "date range selector initialised");
    }

    pub fn disable(&mut self) {
        self.widget.set_label(None);
        self.widget.set_enabled(false);
        self.enabled = false;
    }

    /// Only events from the live, enabled instance are honoured.
    pub fn accepts(&self, event: &CalendarEvent) -> bool {
        self.enabled && self.mounted == Some(event.instance)
    }

    pub fn show_range(&mut self, start: Date, end: Date) {
        self.widget.set_label(Some(&range_label(start, end)));
    }

    pub fn clear_range(&mut self) {
        self.widget.set_label(None);
    }

    /// Move the visible month and return the month that became visible.
    pub fn navigate(&mut self, session: &SessionState, step: Step) -> Option<MonthKey> {
        let current = self.visible?;
        let visible = match step {
            Step::Previous => current.previous(),
            Step::Next => current.next(),
        };
        self.visible = Some(visible);
        self.widget.render(visible, &session.valid_dates());
        Some(visible)
    }

    /// Recompute the selectable dates after new readings arrived.
    pub fn refresh(&mut self, session: &SessionState) {
        if let (Some(_), Some(visible)) = (self.mounted, self.visible) {
            self.widget.render(visible, &session.valid_dates());
        }
    }
}
