//! Outbound webhook execution for dashboard widgets.

pub mod client;

pub use client::{WebhookClient, WebhookClientConfig};
