use std::{
    collections::BTreeSet,
    io::Write,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use billing_client::MonthKey;
use time::{Date, Month};

use crate::calendar::CalendarWidget;

/// Id of the currently mounted calendar; 0 when nothing is mounted.
///
/// Shared with the input reader so typed commands bind to the live instance.
#[derive(Debug, Clone, Default)]
pub struct LiveInstance(Arc<AtomicU64>);

impl LiveInstance {
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    fn set(&self, instance: u64) {
        self.0.store(instance, Ordering::SeqCst);
    }
}

/// Month grid printed to a writer; selectable days show their number.
pub struct TerminalCalendar<Wr> {
    out: Wr,
    live: LiveInstance,
    enabled: bool,
    label: Option<String>,
}

impl<Wr: Write> TerminalCalendar<Wr> {
    pub fn new(out: Wr, live: LiveInstance) -> Self {
        Self {
            out,
            live,
            enabled: false,
            label: None,
        }
    }

    pub fn get_ref(&self) -> &Wr {
        &self.out
    }

    pub fn into_inner(self) -> Wr {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            tracing::warn!(error = %e, "failed to write calendar");
        }
    }
}

/// Render `visible` as a Monday-first grid.
pub fn month_grid(visible: MonthKey, valid_dates: &BTreeSet<Date>) -> String {
    let mut text = format!("{:^20}\nMo Tu We Th Fr Sa Su\n", visible.title());
    let (Ok(month), Some(first)) = (Month::try_from(visible.month()), visible.first_day()) else {
        return text;
    };

    let offset = first.weekday().number_days_from_monday() as usize;
    let mut cells: Vec<String> = vec!["  ".to_string(); offset];
    for day in 1..=month.length(visible.year()) {
        let selectable = Date::from_calendar_date(visible.year(), month, day)
            .map(|d| valid_dates.contains(&d))
            .unwrap_or(false);
        cells.push(if selectable { format!("{day:>2}") } else { " .".to_string() });
    }

    for week in cells.chunks(7) {
        text.push_str(week.join(" ").trim_end());
        text.push('\n');
    }
    text
}

impl<Wr: Write> CalendarWidget for TerminalCalendar<Wr> {
    fn mount(&mut self, instance: u64, visible: MonthKey, valid_dates: &BTreeSet<Date>) {
        self.live.set(instance);
        self.render(visible, valid_dates);
    }

    fn render(&mut self, visible: MonthKey, valid_dates: &BTreeSet<Date>) {
        let grid = month_grid(visible, valid_dates);
        self.emit(&grid);
    }

    fn unmount(&mut self) {
        self.live.set(0);
    }

    fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.emit(if enabled {
                "date range: enabled\n"
            } else {
                "date range: disabled\n"
            });
        }
    }

    fn set_label(&mut self, label: Option<&str>) {
        if self.label.as_deref() == label {
            return;
        }
        self.label = label.map(str::to_string);
        self.emit(&format!("date range: {}\n", label.unwrap_or("(none)")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn grid_marks_only_known_days() {
        let valid: BTreeSet<Date> = [date!(2024 - 03 - 01), date!(2024 - 03 - 31)].into_iter().collect();
        let grid = month_grid(MonthKey::new(2024, 3).unwrap(), &valid);
        let lines: Vec<&str> = grid.lines().collect();

        assert_eq!(lines[0].trim(), "March 2024");
        // 1 March 2024 is a Friday.
        assert_eq!(lines[2], "             1  .  .");
        assert!(lines.last().unwrap().ends_with("31"));
        assert!(!grid.contains("15"));
    }

    #[test]
    fn leap_february_ends_on_29th() {
        let valid: BTreeSet<Date> = [date!(2024 - 02 - 29)].into_iter().collect();
        let grid = month_grid(MonthKey::new(2024, 2).unwrap(), &valid);
        assert!(grid.lines().last().unwrap().ends_with("29"));

        let plain = month_grid(MonthKey::new(2023, 2).unwrap(), &BTreeSet::new());
        let cells: usize = plain.lines().skip(2).map(|l| l.matches('.').count()).sum();
        assert_eq!(cells, 28);
    }

    #[test]
    fn mount_publishes_live_instance() {
        let live = LiveInstance::default();
        let mut cal = TerminalCalendar::new(Vec::new(), live.clone());
        cal.mount(3, MonthKey::new(2024, 3).unwrap(), &BTreeSet::new());
        assert_eq!(live.get(), 3);
        cal.unmount();
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn cleared_label_is_printed() {
        let mut cal = TerminalCalendar::new(Vec::new(), LiveInstance::default());
        cal.set_label(None);
        assert!(cal.get_ref().is_empty());

        cal.set_label(Some("01 Mar 2024 - 31 Mar 2024"));
        cal.set_label(None);
        cal.set_label(None);

        let out = String::from_utf8(cal.into_inner()).unwrap();
        assert_eq!(out, "date range: 01 Mar 2024 - 31 Mar 2024\ndate range: (none)\n");
    }
}
