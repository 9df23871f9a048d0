pub mod dashboard;
pub mod error;
pub mod links;
pub mod path;
pub mod processor;
pub mod transfer;
pub mod transport;
pub mod types;
pub mod webhook;
pub mod widget;
