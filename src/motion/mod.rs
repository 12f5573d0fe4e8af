/// Camera controller.
pub mod camera;
/// Physics integrator.
pub mod physics;
