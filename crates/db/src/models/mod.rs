//! Database row structs.
//!
//! Widget rows are converted to the shared `WidgetRecord` at the store
//! boundary so nothing above this crate sees column layout.

pub mod dashboard;
pub mod widget;
