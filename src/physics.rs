//! The physics boundary. Each game state owns one world and steps it once
//! per frame, between the update and late-update passes.

/// A steppable physics world.
pub trait PhysicsWorld {
    /// Advances the simulation by `dt` seconds of scaled time.
    fn step(&mut self, dt: f32, velocity_iterations: u32, position_iterations: u32);
}

/// The world a state gets when the host supplies none.
#[derive(Debug, Default)]
pub struct NullWorld;

impl PhysicsWorld for NullWorld {
    fn step(&mut self, _: f32, _: u32, _: u32) {}
}
