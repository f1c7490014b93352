pub mod cache;
pub mod catalog;
pub mod classify;
pub mod dissonance;
pub mod field;
pub mod math;
pub mod node;
pub mod refine;
pub mod voicing;
