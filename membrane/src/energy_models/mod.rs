//! Individual terms of the membrane energy model.

pub mod area_penalty;
pub mod bending;
pub mod global_area;
pub mod pressure;

pub use area_penalty::AreaPenalty;
pub use bending::BendingEnergy;
pub use global_area::GlobalAreaPenalty;
pub use pressure::PressureForce;
