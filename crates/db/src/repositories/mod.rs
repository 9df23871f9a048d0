//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod dashboard_repo;
pub mod widget_repo;

pub use dashboard_repo::DashboardRepo;
pub use widget_repo::WidgetRepo;
