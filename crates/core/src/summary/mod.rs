//! Invoice classification and bill-run summarization.

pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use service::SummaryService;
pub use types::{BillRunSummary, InvoiceClassification};
