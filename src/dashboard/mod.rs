pub mod render;
pub mod shell;
pub mod state;
pub mod terminal;

pub use shell::{DashboardEvent, DashboardShell};
pub use state::{ActiveView, DashboardState};
