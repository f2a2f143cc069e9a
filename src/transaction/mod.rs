//! Payment transactions reported by senders.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and the database functions for storing it
//! - Storage of the uploaded payment screenshots
//! - The submission endpoint

mod core;
mod submit_endpoint;
mod upload;

pub use core::{NewTransaction, Transaction, create_transaction, create_transaction_table};
pub use submit_endpoint::{SubmissionReply, submit_transaction_endpoint};

#[cfg(test)]
pub use core::get_all_transactions;
