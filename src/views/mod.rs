// =============================================================================
// Views Module
// =============================================================================
//
// Per-view UI state. Each view owns its own slot; a fetch only ever writes to
// the slot it was dispatched for, so no cross-view locking is needed.

pub mod dashboard;
pub mod events;
pub mod slot;
pub mod weekly;

pub use dashboard::{DashboardSnapshot, DashboardView};
pub use events::{EventsSnapshot, EventsView};
pub use slot::Resolution;
pub use weekly::{WeeklySnapshot, WeeklyView};
