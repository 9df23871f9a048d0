//! Client-side transport for the Pulseboard server.
//!
//! [`Transport`] sends each operation to the structured `/api/v1` routes and
//! falls back once to the legacy dispatch endpoint when the primary route is
//! missing or unreachable.

pub mod config;
pub mod error;
pub mod operation;
pub mod transport;

pub use config::TransportConfig;
pub use error::TransportError;
pub use operation::Operation;
pub use transport::{Route, Transport, TransportOutcome, TransportResult};
