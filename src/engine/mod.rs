//! Decision engine
//!
//! Vitals scoring, escalation, staffing and bed allocation. Components
//! take the state they act on as arguments; [`Hospital`](crate::Hospital)
//! owns that state and wires the calls together.

pub mod allocation;
pub mod beds;
pub mod escalation;
pub mod intake;
pub mod protocols;
pub mod roster;
pub mod vitals;
