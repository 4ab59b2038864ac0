use crate::billing::{format_fixed, format_money, BillResult, PreviewFigures};

pub const ERROR_MARKER: &str = "Error";

/// Text shown in the results panel. `None` means the field was never filled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultsPanel {
    pub period: Option<String>,
    pub start_kwh: Option<String>,
    pub end_kwh: Option<String>,
    pub total_kwh: Option<String>,
    pub import_kwh: Option<String>,
    pub export_kwh: Option<String>,
    pub import_cost: Option<String>,
    pub export_revenue: Option<String>,
    pub total_bill: Option<String>,
    /// Read-only import figure mirrored next to the inputs.
    pub import_kwh_display: Option<String>,
}

impl ResultsPanel {
    pub fn set_period(&mut self, period: String) {
        self.period = Some(period);
    }

    pub fn show_preview(&mut self, figures: &PreviewFigures) {
        self.start_kwh = Some(format_fixed(figures.start_kwh));
        self.end_kwh = Some(format_fixed(figures.end_kwh));
        self.total_kwh = Some(format_fixed(figures.total_kwh));
        self.import_kwh_display = Some(format_fixed(figures.import_kwh));
        self.import_kwh = Some(format_fixed(figures.import_kwh));
        self.export_kwh = Some(format_fixed(figures.export_kwh));
    }

    pub fn show_inconsistent(&mut self) {
        self.import_kwh_display = Some(format_fixed(0.0));
        self.import_kwh = Some(format_fixed(0.0));
        self.total_kwh = Some(ERROR_MARKER.to_string());
    }

    pub fn show_bill(&mut self, bill: &BillResult, currency_label: &str) {
        self.show_preview(&PreviewFigures {
            start_kwh: bill.start_kwh,
            end_kwh: bill.end_kwh,
            total_kwh: bill.total_kwh,
            import_kwh: bill.import_kwh,
            export_kwh: bill.export_kwh,
        });
        self.import_cost = Some(format_money(currency_label, bill.import_cost));
        self.export_revenue = Some(format_money(currency_label, bill.export_revenue));
        self.total_bill = Some(format_money(currency_label, bill.total_bill));
    }

    /// Label/value rows in display order.
    pub fn rows(&self) -> [(&'static str, Option<&str>); 9] {
        [
            ("Period", self.period.as_deref()),
            ("Start reading (kWh)", self.start_kwh.as_deref()),
            ("End reading (kWh)", self.end_kwh.as_deref()),
            ("Total generated (kWh)", self.total_kwh.as_deref()),
            ("Import (kWh)", self.import_kwh.as_deref()),
            ("Export (kWh)", self.export_kwh.as_deref()),
            ("Import cost", self.import_cost.as_deref()),
            ("Export revenue", self.export_revenue.as_deref()),
            ("Total bill", self.total_bill.as_deref()),
        ]
    }
}
