//! The dashboard controller.
//!
//! [`Dashboard`] owns all session state and is driven by [`Event`]s: user
//! input and fetch completions. Network work is requested through the
//! returned [`Command`]s, which the runtime executes and answers with further
//! events, so state is only ever mutated from the event loop.

pub mod panel;

pub use panel::{ResultsPanel, ERROR_MARKER};

use billing_client::{ApiError, CustomerId, DailyReadings, MonthKey};
use time::{Date, OffsetDateTime};

use crate::{
    billing::{self, parse_amount, BillInputs, Preview, RateInputs},
    calendar::{period_label, CalendarAction, CalendarEvent, CalendarWidget, DateRangeSelector, Step},
    customers::{CustomerOption, CustomerSelector},
    fetcher::prefetch_window,
    session::SessionState,
};

/// The non-calendar controls of the page.
pub trait Frontend {
    fn show_customers(&mut self, options: &[CustomerOption]);
    fn show_results(&mut self, panel: &ResultsPanel);
    /// Blocking, user-facing message.
    fn alert(&mut self, message: &str);
}

#[derive(Debug)]
pub enum Event {
    ReloadCustomers,
    CustomersLoaded(Result<Vec<CustomerId>, ApiError>),
    CustomerChanged(CustomerId),
    Calendar(CalendarEvent),
    ExportKwhInput(String),
    ImportRateInput(String),
    ExportRateInput(String),
    ComputeRequested,
    ShowResults,
    PrefetchSettled {
        generation: u64,
        results: Vec<(MonthKey, Result<DailyReadings, ApiError>)>,
    },
    MonthFetched {
        generation: u64,
        month: MonthKey,
        result: Result<DailyReadings, ApiError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    LoadCustomers,
    /// Fetch all `months` concurrently and answer once every request settled.
    Prefetch {
        generation: u64,
        customer: CustomerId,
        months: Vec<MonthKey>,
    },
    FetchMonth {
        generation: u64,
        customer: CustomerId,
        month: MonthKey,
    },
}

pub fn local_today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

pub struct Dashboard<F, W> {
    session: SessionState,
    customers: CustomerSelector,
    selector: DateRangeSelector<W>,
    inputs: RateInputs,
    panel: ResultsPanel,
    frontend: F,
    currency_label: String,
    clock: fn() -> Date,
}

impl<F: Frontend, W: CalendarWidget> Dashboard<F, W> {
    pub fn new(frontend: F, widget: W, currency_label: impl Into<String>) -> Self {
        Self {
            session: SessionState::new(),
            customers: CustomerSelector::new(),
            selector: DateRangeSelector::new(widget),
            inputs: RateInputs::default(),
            panel: ResultsPanel::default(),
            frontend,
            currency_label: currency_label.into(),
            clock: local_today,
        }
    }

    /// Replace the source of "today" used for the prefetch window.
    pub fn with_clock(mut self, clock: fn() -> Date) -> Self {
        self.clock = clock;
        self
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn panel(&self) -> &ResultsPanel {
        &self.panel
    }

    pub fn customer_options(&self) -> &[CustomerOption] {
        self.customers.options()
    }

    pub fn selector(&self) -> &DateRangeSelector<W> {
        &self.selector
    }

    pub fn frontend(&self) -> &F {
        &self.frontend
    }

    pub fn frontend_mut(&mut self) -> &mut F {
        &mut self.frontend
    }

    /// Commands to issue when the page comes up.
    pub fn start(&mut self) -> Vec<Command> {
        self.selector.disable();
        vec![Command::LoadCustomers]
    }

    pub fn handle(&mut self, event: Event) -> Vec<Command> {
        match event {
            Event::ReloadCustomers => vec![Command::LoadCustomers],
            Event::CustomersLoaded(result) => {
                self.customers_loaded(result);
                Vec::new()
            }
            Event::CustomerChanged(customer) => self.change_customer(customer),
            Event::Calendar(event) => self.calendar_event(event),
            Event::ExportKwhInput(value) => {
                self.inputs.export_kwh = value;
                self.update_preview();
                Vec::new()
            }
            Event::ImportRateInput(value) => {
                self.inputs.import_rate = value;
                Vec::new()
            }
            Event::ExportRateInput(value) => {
                self.inputs.export_rate = value;
                Vec::new()
            }
            Event::ComputeRequested => {
                self.compute_and_display();
                Vec::new()
            }
            Event::ShowResults => {
                self.frontend.show_results(&self.panel);
                Vec::new()
            }
            Event::PrefetchSettled { generation, results } => {
                self.prefetch_settled(generation, results);
                Vec::new()
            }
            Event::MonthFetched {
                generation,
                month,
                result,
            } => {
                if self.session.complete_fetch(generation, month, result) {
                    self.selector.refresh(&self.session);
                }
                Vec::new()
            }
        }
    }

    fn customers_loaded(&mut self, result: Result<Vec<CustomerId>, ApiError>) {
        match result {
            Ok(customers) => {
                tracing::info!(count = customers.len(), "customer list loaded");
                self.customers.populate(&customers);
            }
            Err(e) => {
                metrics::counter!("dashboard_customer_fetch_failed_total").increment(1);
                tracing::error!(error = %e, "failed to fetch customers");
                self.customers.populate_failed();
            }
        }
        self.frontend.show_customers(self.customers.options());
    }

    fn change_customer(&mut self, customer: CustomerId) -> Vec<Command> {
        let customer = (!customer.is_empty()).then_some(customer);
        let generation = self.session.reset(customer.clone());
        self.selector.disable();

        let Some(customer) = customer else {
            tracing::info!("customer cleared");
            return Vec::new();
        };

        if !self.customers.contains(&customer) {
            tracing::debug!(%customer, "customer is not in the loaded directory");
        }

        let months: Vec<MonthKey> = prefetch_window((self.clock)())
            .into_iter()
            .filter(|&month| self.session.request_month(&customer, month).is_some())
            .collect();

        tracing::info!(%customer, generation, ?months, "customer selected, prefetching readings");
        vec![Command::Prefetch {
            generation,
            customer,
            months,
        }]
    }

    fn prefetch_settled(
        &mut self,
        generation: u64,
        results: Vec<(MonthKey, Result<DailyReadings, ApiError>)>,
    ) {
        for (month, result) in results {
            self.session.complete_fetch(generation, month, result);
        }
        if generation != self.session.generation() {
            return;
        }

        let visible = MonthKey::from_date((self.clock)());
        self.selector.reinitialize(&self.session, visible);
        tracing::info!(
            generation,
            cached = self.session.reading_count(),
            "prefetch settled, date range selector enabled"
        );
    }

    fn calendar_event(&mut self, event: CalendarEvent) -> Vec<Command> {
        if !self.selector.accepts(&event) {
            tracing::debug!(instance = event.instance, "ignoring event from an inactive calendar");
            return Vec::new();
        }

        match event.action {
            CalendarAction::Apply { start, end } => {
                self.apply_range(start, end);
                Vec::new()
            }
            CalendarAction::Cancel => {
                self.session.clear_selection();
                self.selector.clear_range();
                Vec::new()
            }
            CalendarAction::Navigate(step) => self.navigate(step),
        }
    }

    fn apply_range(&mut self, start: Date, end: Date) {
        if let Err(e) = self.session.set_selection(start, end) {
            tracing::warn!(error = %e, "rejected date range");
            self.frontend.alert(&e.to_string());
            return;
        }

        self.selector.show_range(start, end);
        self.panel.set_period(period_label(start, end));
        self.update_preview();
    }

    fn navigate(&mut self, step: Step) -> Vec<Command> {
        let Some(visible) = self.selector.navigate(&self.session, step) else {
            return Vec::new();
        };
        let Some(customer) = self.session.customer().cloned() else {
            return Vec::new();
        };

        let Some(generation) = self.session.request_month(&customer, visible) else {
            return Vec::new();
        };
        tracing::info!(%customer, month = %visible, "fetching readings for navigated month");
        vec![Command::FetchMonth {
            generation,
            customer,
            month: visible,
        }]
    }

    fn update_preview(&mut self) {
        let Some(selection) = self.session.selection() else {
            return;
        };
        let start = self.session.reading_at(selection.start);
        let end = self.session.reading_at(selection.end);

        match billing::preview(start, end, parse_amount(&self.inputs.export_kwh)) {
            None => return,
            Some(Preview::Inconsistent) => self.panel.show_inconsistent(),
            Some(Preview::Figures(figures)) => self.panel.show_preview(&figures),
        }
        self.frontend.show_results(&self.panel);
    }

    fn compute_and_display(&mut self) {
        let outcome = match self.session.selection() {
            None => Err(billing::BillingError::IncompleteSelection),
            Some(selection) => BillInputs::new(
                self.session.reading_at(selection.start),
                self.session.reading_at(selection.end),
                &self.inputs,
            )
            .and_then(|inputs| billing::compute(&inputs)),
        };

        match outcome {
            Ok(bill) => {
                metrics::counter!("dashboard_bills_computed_total").increment(1);
                tracing::info!(
                    total_kwh = bill.total_kwh,
                    import_kwh = bill.import_kwh,
                    total_bill = bill.total_bill,
                    "bill computed"
                );
                self.panel.show_bill(&bill, &self.currency_label);
                self.frontend.show_results(&self.panel);
            }
            Err(e) => {
                tracing::warn!(error = ?e, "bill not computed");
                self.frontend.alert(&e.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::tests::{FakeCalendar, WidgetCall};
    use time::macros::date;

    #[derive(Debug, Default)]
    struct FakeFrontend {
        customers: Vec<CustomerOption>,
        results_shown: usize,
        alerts: Vec<String>,
    }

    impl Frontend for FakeFrontend {
        fn show_customers(&mut self, options: &[CustomerOption]) {
            self.customers = options.to_vec();
        }

        fn show_results(&mut self, _panel: &ResultsPanel) {
            self.results_shown += 1;
        }

        fn alert(&mut self, message: &str) {
            self.alerts.push(message.to_string());
        }
    }

    type TestDashboard = Dashboard<FakeFrontend, FakeCalendar>;

    fn march_10() -> Date {
        date!(2024 - 03 - 10)
    }

    fn month(y: i32, m: u8) -> MonthKey {
        MonthKey::new(y, m).unwrap()
    }

    fn server_error() -> ApiError {
        ApiError::Status {
            endpoint: "/api/daily-readings".to_string(),
            status: 500,
        }
    }

    fn march_readings() -> DailyReadings {
        [(date!(2024 - 03 - 01), 1000.0), (date!(2024 - 03 - 31), 1200.0)]
            .into_iter()
            .collect()
    }

    fn dashboard() -> TestDashboard {
        let mut d = Dashboard::new(FakeFrontend::default(), FakeCalendar::default(), "RM").with_clock(march_10);
        assert_eq!(d.start(), vec![Command::LoadCustomers]);
        d.handle(Event::CustomersLoaded(Ok(vec![CustomerId::from("A"), CustomerId::from("B")])));
        d
    }

    fn select_customer(d: &mut TestDashboard, id: &str) -> u64 {
        let commands = d.handle(Event::CustomerChanged(CustomerId::from(id)));
        match commands.as_slice() {
            [Command::Prefetch { generation, .. }] => *generation,
            other => panic!("expected a prefetch, got {other:?}"),
        }
    }

    fn settle_march(d: &mut TestDashboard, generation: u64) {
        d.handle(Event::PrefetchSettled {
            generation,
            results: vec![
                (month(2024, 2), Err(server_error())),
                (month(2024, 3), Ok(march_readings())),
                (month(2024, 4), Err(server_error())),
            ],
        });
    }

    fn calendar(d: &TestDashboard, action: CalendarAction) -> Event {
        Event::Calendar(CalendarEvent {
            instance: d.selector().mounted_instance().unwrap(),
            action,
        })
    }

    fn ready_dashboard() -> TestDashboard {
        let mut d = dashboard();
        let generation = select_customer(&mut d, "A");
        settle_march(&mut d, generation);
        d
    }

    #[test]
    fn customer_change_prefetches_three_month_window() {
        let mut d = dashboard();
        let commands = d.handle(Event::CustomerChanged(CustomerId::from("A")));

        assert_eq!(
            commands,
            vec![Command::Prefetch {
                generation: d.session().generation(),
                customer: CustomerId::from("A"),
                months: vec![month(2024, 2), month(2024, 3), month(2024, 4)],
            }]
        );
        assert!(!d.selector().is_enabled());
    }

    #[test]
    fn selector_enabled_only_after_prefetch_settles() {
        let mut d = dashboard();
        let generation = select_customer(&mut d, "A");
        assert!(!d.selector().is_enabled());

        settle_march(&mut d, generation);
        assert!(d.selector().is_enabled());
        assert_eq!(d.selector().visible_month(), Some(month(2024, 3)));
        assert!(d.session().is_loaded(month(2024, 3)));
        assert!(!d.session().is_loaded(month(2024, 2)));
        assert_eq!(d.selector().widget().valid.len(), 2);
    }

    #[test]
    fn march_bill_end_to_end() {
        let mut d = ready_dashboard();
        d.handle(calendar(
            &d,
            CalendarAction::Apply {
                start: date!(2024 - 03 - 01),
                end: date!(2024 - 03 - 31),
            },
        ));
        d.handle(Event::ExportKwhInput("50".to_string()));
        d.handle(Event::ImportRateInput("0.5".to_string()));
        d.handle(Event::ExportRateInput("0.3".to_string()));
        d.handle(Event::ComputeRequested);

        let p = d.panel();
        assert_eq!(p.period.as_deref(), Some("01 Mar 2024 to 31 Mar 2024"));
        assert_eq!(p.start_kwh.as_deref(), Some("1000.00"));
        assert_eq!(p.end_kwh.as_deref(), Some("1200.00"));
        assert_eq!(p.total_kwh.as_deref(), Some("200.00"));
        assert_eq!(p.import_kwh.as_deref(), Some("150.00"));
        assert_eq!(p.import_kwh_display.as_deref(), Some("150.00"));
        assert_eq!(p.export_kwh.as_deref(), Some("50.00"));
        assert_eq!(p.import_cost.as_deref(), Some("RM 75.00"));
        assert_eq!(p.export_revenue.as_deref(), Some("RM 15.00"));
        assert_eq!(p.total_bill.as_deref(), Some("RM 90.00"));
        assert!(d.frontend().alerts.is_empty());
        assert_eq!(
            d.selector().widget().label.as_deref(),
            Some("01 Mar 2024 - 31 Mar 2024")
        );
    }

    #[test]
    fn swapped_range_alerts_once_without_result() {
        let mut d = ready_dashboard();
        d.handle(calendar(
            &d,
            CalendarAction::Apply {
                start: date!(2024 - 03 - 31),
                end: date!(2024 - 03 - 01),
            },
        ));
        d.handle(Event::ExportKwhInput("50".to_string()));
        d.handle(Event::ImportRateInput("0.5".to_string()));
        d.handle(Event::ExportRateInput("0.3".to_string()));
        d.handle(Event::ComputeRequested);

        assert_eq!(d.frontend().alerts.len(), 1);
        assert!(d.frontend().alerts[0].contains("End reading is lower than start reading"));
        assert_eq!(d.panel().import_cost, None);
        assert_eq!(d.panel().total_bill, None);
    }

    #[test]
    fn swapped_range_preview_shows_error_marker() {
        let mut d = ready_dashboard();
        d.handle(calendar(
            &d,
            CalendarAction::Apply {
                start: date!(2024 - 03 - 31),
                end: date!(2024 - 03 - 01),
            },
        ));

        assert_eq!(d.panel().total_kwh.as_deref(), Some(ERROR_MARKER));
        assert_eq!(d.panel().import_kwh.as_deref(), Some("0.00"));
        assert_eq!(d.panel().import_kwh_display.as_deref(), Some("0.00"));
        assert!(d.frontend().alerts.is_empty());
    }

    #[test]
    fn preview_follows_export_input_and_allows_negative_import() {
        let mut d = ready_dashboard();
        d.handle(calendar(
            &d,
            CalendarAction::Apply {
                start: date!(2024 - 03 - 01),
                end: date!(2024 - 03 - 31),
            },
        ));
        d.handle(Event::ExportKwhInput("250".to_string()));

        assert_eq!(d.panel().import_kwh.as_deref(), Some("-50.00"));
        assert_eq!(d.panel().total_bill, None);
    }

    #[test]
    fn export_input_without_selection_does_nothing() {
        let mut d = ready_dashboard();
        d.handle(Event::ExportKwhInput("10".to_string()));
        assert_eq!(d.frontend().results_shown, 0);
        assert_eq!(d.panel(), &ResultsPanel::default());
    }

    #[test]
    fn compute_without_selection_alerts() {
        let mut d = ready_dashboard();
        d.handle(Event::ComputeRequested);
        assert_eq!(d.frontend().alerts, vec!["Please select a start and end date.".to_string()]);
    }

    #[test]
    fn cancel_clears_selection_but_keeps_cache() {
        let mut d = ready_dashboard();
        d.handle(calendar(
            &d,
            CalendarAction::Apply {
                start: date!(2024 - 03 - 01),
                end: date!(2024 - 03 - 31),
            },
        ));
        d.handle(calendar(&d, CalendarAction::Cancel));

        assert!(d.session().selection().is_none());
        assert_eq!(d.session().reading_count(), 2);
        assert_eq!(d.selector().widget().label, None);
    }

    #[test]
    fn unknown_dates_cannot_be_applied() {
        let mut d = ready_dashboard();
        d.handle(calendar(
            &d,
            CalendarAction::Apply {
                start: date!(2024 - 03 - 01),
                end: date!(2024 - 03 - 15),
            },
        ));
        assert!(d.session().selection().is_none());
        assert_eq!(d.frontend().alerts.len(), 1);
    }

    #[test]
    fn navigation_fetches_unloaded_month_and_refreshes() {
        let mut d = ready_dashboard();
        let commands = d.handle(calendar(&d, CalendarAction::Navigate(Step::Next)));
        let generation = d.session().generation();
        assert_eq!(
            commands,
            vec![Command::FetchMonth {
                generation,
                customer: CustomerId::from("A"),
                month: month(2024, 4),
            }]
        );

        // Already in flight: no duplicate request.
        d.handle(calendar(&d, CalendarAction::Navigate(Step::Previous)));
        assert!(d.handle(calendar(&d, CalendarAction::Navigate(Step::Next))).is_empty());

        let april: DailyReadings = [(date!(2024 - 04 - 01), 1210.0)].into_iter().collect();
        d.handle(Event::MonthFetched {
            generation,
            month: month(2024, 4),
            result: Ok(april),
        });

        assert!(d.session().is_selectable(date!(2024 - 04 - 01)));
        assert_eq!(
            d.selector().widget().calls.last(),
            Some(&WidgetCall::Render(month(2024, 4), 3))
        );
    }

    #[test]
    fn navigation_to_loaded_month_issues_no_fetch() {
        let mut d = ready_dashboard();
        assert!(!d.handle(calendar(&d, CalendarAction::Navigate(Step::Next))).is_empty());
        assert!(d.handle(calendar(&d, CalendarAction::Navigate(Step::Previous))).is_empty());
    }

    #[test]
    fn failed_month_is_requested_again() {
        let mut d = ready_dashboard();
        let generation = d.session().generation();
        let fetch_april = vec![Command::FetchMonth {
            generation,
            customer: CustomerId::from("A"),
            month: month(2024, 4),
        }];
        assert_eq!(d.handle(calendar(&d, CalendarAction::Navigate(Step::Next))), fetch_april);

        d.handle(Event::MonthFetched {
            generation,
            month: month(2024, 4),
            result: Err(server_error()),
        });
        assert!(!d.session().is_loaded(month(2024, 4)));

        d.handle(calendar(&d, CalendarAction::Navigate(Step::Previous)));
        assert_eq!(d.handle(calendar(&d, CalendarAction::Navigate(Step::Next))), fetch_april);
    }
    #[test]
    fn customer_switch_discards_stale_prefetch() {
        let mut d = dashboard();
        let first = select_customer(&mut d, "A");
        let second = select_customer(&mut d, "B");
        assert_ne!(first, second);

        settle_march(&mut d, first);
        assert_eq!(d.session().reading_count(), 0);
        assert!(!d.selector().is_enabled());
        assert_eq!(d.session().customer(), Some(&CustomerId::from("B")));

        settle_march(&mut d, second);
        assert!(d.selector().is_enabled());
        assert_eq!(d.session().reading_count(), 2);
    }

    #[test]
    fn customer_switch_clears_state_and_stale_month_is_dropped() {
        let mut d = ready_dashboard();
        d.handle(calendar(
            &d,
            CalendarAction::Apply {
                start: date!(2024 - 03 - 01),
                end: date!(2024 - 03 - 31),
            },
        ));
        let old_instance = d.selector().mounted_instance().unwrap();
        let commands = d.handle(calendar(&d, CalendarAction::Navigate(Step::Next)));
        let Command::FetchMonth { generation: stale, .. } = commands[0].clone() else {
            panic!("expected a month fetch");
        };

        select_customer(&mut d, "B");
        assert!(d.session().selection().is_none());
        assert_eq!(d.session().reading_count(), 0);
        assert!(!d.selector().is_enabled());

        let april: DailyReadings = [(date!(2024 - 04 - 01), 1210.0)].into_iter().collect();
        d.handle(Event::MonthFetched {
            generation: stale,
            month: month(2024, 4),
            result: Ok(april),
        });
        assert_eq!(d.session().reading_count(), 0);

        // Events bound to the torn-down calendar are ignored.
        let commands = d.handle(Event::Calendar(CalendarEvent {
            instance: old_instance,
            action: CalendarAction::Navigate(Step::Next),
        }));
        assert!(commands.is_empty());
    }

    #[test]
    fn clearing_customer_leaves_selector_disabled() {
        let mut d = ready_dashboard();
        let commands = d.handle(Event::CustomerChanged(CustomerId::from("")));
        assert!(commands.is_empty());
        assert!(!d.selector().is_enabled());
        assert!(d.session().customer().is_none());
        assert_eq!(d.session().reading_count(), 0);
    }

    #[test]
    fn directory_failure_shows_single_error_option() {
        let mut d = Dashboard::new(FakeFrontend::default(), FakeCalendar::default(), "RM");
        d.start();
        d.handle(Event::CustomersLoaded(Err(server_error())));

        let options = &d.frontend().customers;
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].label, crate::customers::ERROR_LABEL);
        assert!(d.frontend().alerts.is_empty());
    }

    #[test]
    fn reload_requests_customer_list() {
        let mut d = dashboard();
        assert_eq!(d.handle(Event::ReloadCustomers), vec![Command::LoadCustomers]);
        assert_eq!(d.frontend().customers.len(), 3);
    }
}
