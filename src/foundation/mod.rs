/// Value types shared by every module.
pub mod core;
/// Error taxonomy.
pub mod error;
/// Deterministic random numbers and pixel math.
pub mod math;
