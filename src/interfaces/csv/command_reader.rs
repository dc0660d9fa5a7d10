use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    Register,
    Request,
    Approve,
    Reject,
    CreateJob,
    SetStatus,
    DeleteJob,
    Pay,
    Confirm,
    DeletePayment,
}

/// One row of a command script.
///
/// `actor` is the caller's email (for `register`, the email being
/// registered). `target` is a user email or the label of an earlier record,
/// depending on `op`. `label` names the record this command creates.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Command {
    pub op: Op,
    pub actor: Option<String>,
    pub target: Option<String>,
    pub value: Option<String>,
    pub amount: Option<Decimal>,
    pub label: Option<String>,
    pub at: Option<DateTime<Utc>>,
}

/// Reads a command script: a header row naming the columns, then one
/// command per row.
///
/// Rows may stop early; trailing columns such as `label` and `at` are then
/// treated as empty. Padding around fields is ignored, and an `at` value must
/// be an RFC 3339 timestamp.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Commands in script order. A row that does not parse yields an error
    /// and the rows after it are still read.
    pub fn commands(self) -> impl Iterator<Item = Result<Command>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(LedgerError::from))
    }
}
