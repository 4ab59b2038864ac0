use billing_client::CustomerId;

pub const PLACEHOLDER_LABEL: &str = "Select Customer";
pub const ERROR_LABEL: &str = "Error loading customers";

/// One entry of the customer dropdown. An empty `value` is a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerOption {
    pub value: String,
    pub label: String,
}

impl CustomerOption {
    fn placeholder(label: &str) -> Self {
        Self {
            value: String::new(),
            label: label.to_string(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.value.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct CustomerSelector {
    options: Vec<CustomerOption>,
}

impl CustomerSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(&self) -> &[CustomerOption] {
        &self.options
    }

    pub fn populate(&mut self, customers: &[CustomerId]) {
        self.options = std::iter::once(CustomerOption::placeholder(PLACEHOLDER_LABEL))
            .chain(customers.iter().map(|c| CustomerOption {
                value: c.as_str().to_string(),
                label: c.as_str().to_string(),
            }))
            .collect();
    }

    pub fn populate_failed(&mut self) {
        self.options = vec![CustomerOption::placeholder(ERROR_LABEL)];
    }

    pub fn contains(&self, customer: &CustomerId) -> bool {
        self.options.iter().any(|o| !o.is_placeholder() && o.value == customer.as_str())
    }
}
