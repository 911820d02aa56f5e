//! Controller layer: reactions to controller notifications and the quit confirmation gate.

pub mod events;
pub mod quit;
