//! UI layer: widget handles built from the UI description and the egui front-end.

pub mod app;
pub mod widgets;

pub use app::EframeFrontend;
