// SomnoWatch — Fault Taxonomy
//
// Every recoverable failure in the wake sequence maps onto one of these
// variants so the controller can decide what to skip and what to drop.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Fault {
    /// Storage mount or sensor bus bring-up failed. Aborts the rest of
    /// the wake, but never prevents the sleep timer from being armed.
    #[error("init failure: {0}")]
    Init(String),

    /// Association, provisioning, or time-service failure. Non-fatal;
    /// the affected step is retried on the next eligible wake.
    #[error("connectivity failure: {0}")]
    Connectivity(String),

    /// The collector rejected a batch or the transfer did not complete.
    /// The log store is left untouched so the batch is retried.
    #[error("delivery failure: {0}")]
    Delivery(String),

    /// A persisted line did not parse as a sample record.
    #[error("malformed record: {0}")]
    Malformed(String),

    /// Log read/write error. On append this drops that one record.
    #[error("log i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Fault>;
