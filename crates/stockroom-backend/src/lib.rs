//! Stationery inventory backend.
//!
//! The backend collaborator behind the gateway: a category lookup over an
//! immutable in-memory catalog, returning results in the wrapped
//! `{"statusCode": ..., "body": "<json string>"}` collaborator shape. All
//! request state is carried in the per-call [`InvocationContext`]; nothing
//! is shared mutably across invocations.
//!
//! [`InvocationContext`]: stockroom_gateway::InvocationContext

#![deny(warnings)]

mod catalog;
mod handler;

pub use catalog::{Availability, Item, StationeryCatalog};
pub use handler::{StationeryBackend, UNKNOWN_CATEGORY_MESSAGE};
