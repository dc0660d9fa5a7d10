//! Domain model: records, value objects, authorization predicates and the
//! storage ports the application layer depends on.

pub mod connection;
pub mod ids;
pub mod job;
pub mod money;
pub mod payment;
pub mod policy;
pub mod ports;
pub mod user;
