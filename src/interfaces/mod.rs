//! Outer surfaces that drive the ledger: CSV command scripts in, CSV
//! reports out.

pub mod csv;
pub mod replay;
