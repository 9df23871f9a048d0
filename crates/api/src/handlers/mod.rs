//! Request handlers.
//!
//! Handlers extract the acting user and request data, delegate to
//! [`crate::operations`] and wrap results in [`crate::response::DataResponse`].

pub mod dashboards;
pub mod legacy;
pub mod transfer;
pub mod widgets;
