pub mod assign;
pub mod capacity;
pub mod preview;
pub mod wallclock;

pub use assign::{simulate_assignment, AssignedJob, Assignment, UNASSIGNED};
pub use capacity::*;
pub use preview::*;
pub use wallclock::*;
