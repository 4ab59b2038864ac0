use std::io::Write;

use crate::{
    customers::CustomerOption,
    dashboard::{Frontend, ResultsPanel},
};

/// Prints the dashboard controls to a writer (stdout in the binary).
pub struct TerminalFrontend<Wr> {
    out: Wr,
}

impl<Wr: Write> TerminalFrontend<Wr> {
    pub fn new(out: Wr) -> Self {
        Self { out }
    }

    pub fn get_ref(&self) -> &Wr {
        &self.out
    }

    pub fn into_inner(self) -> Wr {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            tracing::warn!(error = %e, "failed to write to terminal");
        }
    }
}

impl<Wr: Write> Frontend for TerminalFrontend<Wr> {
    fn show_customers(&mut self, options: &[CustomerOption]) {
        let mut text = String::from("customers:\n");
        for option in options {
            if option.is_placeholder() {
                text.push_str(&format!("  ({})\n", option.label));
            } else {
                text.push_str(&format!("  {}\n", option.label));
            }
        }
        self.emit(&text);
    }

    fn show_results(&mut self, panel: &ResultsPanel) {
        let mut text = String::from("results:\n");
        for (label, value) in panel.rows() {
            text.push_str(&format!("  {label:<22} {}\n", value.unwrap_or("-")));
        }
        self.emit(&text);
    }

    fn alert(&mut self, message: &str) {
        self.emit(&format!("!! {message}\n"));
    }
}
