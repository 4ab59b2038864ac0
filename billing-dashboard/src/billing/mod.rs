//! Solar import/export billing.
//!
//! `total = end - start`, `import = total - export`,
//! `import_cost = import * import_rate`, `export_revenue = export * export_rate`,
//! `total_bill = import_cost + export_revenue`.

pub mod format;

pub use format::{format_fixed, format_money, parse_amount};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum BillingError {
    #[error("Please select a start and end date.")]
    IncompleteSelection,
    /// A selected date has no cached reading. Surfaced like an incomplete selection.
    #[error("Please select a start and end date.")]
    MissingReadingData(String),
    #[error("Error: End reading is lower than start reading. Please check the meter data.")]
    InconsistentReadings { start: f64, end: f64 },
}

/// Raw numeric input fields as typed by the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateInputs {
    pub export_kwh: String,
    pub import_rate: String,
    pub export_rate: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BillInputs {
    pub start_reading: f64,
    pub end_reading: f64,
    pub export_kwh: f64,
    pub import_rate: f64,
    pub export_rate: f64,
}

impl BillInputs {
    /// Readings must be present; unparseable numeric fields fall back to 0.
    pub fn new(
        start_reading: Option<f64>,
        end_reading: Option<f64>,
        fields: &RateInputs,
    ) -> Result<Self, BillingError> {
        let start_reading = start_reading.ok_or_else(|| BillingError::MissingReadingData("start".to_string()))?;
        let end_reading = end_reading.ok_or_else(|| BillingError::MissingReadingData("end".to_string()))?;

        Ok(Self {
            start_reading,
            end_reading,
            export_kwh: parse_amount(&fields.export_kwh),
            import_rate: parse_amount(&fields.import_rate),
            export_rate: parse_amount(&fields.export_rate),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BillResult {
    pub start_kwh: f64,
    pub end_kwh: f64,
    pub total_kwh: f64,
    pub import_kwh: f64,
    pub export_kwh: f64,
    pub import_cost: f64,
    pub export_revenue: f64,
    pub total_bill: f64,
}

/// Energy-only figures shown while the operator is still editing inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewFigures {
    pub start_kwh: f64,
    pub end_kwh: f64,
    pub total_kwh: f64,
    pub import_kwh: f64,
    pub export_kwh: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Preview {
    Figures(PreviewFigures),
    /// End reading below start reading.
    Inconsistent,
}

/// Live preview. `None` when either reading is not available yet.
pub fn preview(start: Option<f64>, end: Option<f64>, export_kwh: f64) -> Option<Preview> {
    let (start, end) = (start?, end?);
    if end < start {
        return Some(Preview::Inconsistent);
    }

    let total_kwh = end - start;
    Some(Preview::Figures(PreviewFigures {
        start_kwh: start,
        end_kwh: end,
        total_kwh,
        import_kwh: total_kwh - export_kwh,
        export_kwh,
    }))
}

pub fn compute(inputs: &BillInputs) -> Result<BillResult, BillingError> {
    let BillInputs {
        start_reading,
        end_reading,
        export_kwh,
        import_rate,
        export_rate,
    } = *inputs;

    if end_reading < start_reading {
        return Err(BillingError::InconsistentReadings {
            start: start_reading,
            end: end_reading,
        });
    }

    let total_kwh = end_reading - start_reading;
    let import_kwh = total_kwh - export_kwh;
    let import_cost = import_kwh * import_rate;
    let export_revenue = export_kwh * export_rate;

    Ok(BillResult {
        start_kwh: start_reading,
        end_kwh: end_reading,
        total_kwh,
        import_kwh,
        export_kwh,
        import_cost,
        export_revenue,
        total_bill: import_cost + export_revenue,
    })
}
