//! Cancel/rebill invoice pair planning.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::RebillError;
pub use service::RebillService;
pub use types::{
    InvoiceDraft, InvoiceTree, LicenceDraft, LicenceTree, RebillPlan, RebillResult,
    RebilledInvoice,
};
