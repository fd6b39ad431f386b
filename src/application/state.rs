//! Game states: self-contained worlds the engine stacks on top of each
//! other. Only the top of the stack runs; anything below is paused but
//! keeps all of its objects until it is popped for good.

use std::cell::{Cell, RefCell, RefMut};
use std::rc::Weak;

use crate::ecs::{Registry, UpdateContext};
use crate::errors::Result;
use crate::physics::{NullWorld, PhysicsWorld};
use crate::utils::Timer;
use crate::video::Renderer;

use super::engine::{Context, StateHandle};
use super::settings::StateParams;
use super::time::TimeStep;

type StateLink = RefCell<Option<Weak<RefCell<dyn State>>>>;

/// The world every state embeds: its object registry, physics world, task
/// timer and simulation parameters.
pub struct StateCore {
    registry: Registry,
    physics: RefCell<Box<dyn PhysicsWorld>>,
    timer: Timer,
    time_scale: Cell<f32>,
    velocity_iterations: Cell<u32>,
    position_iterations: Cell<u32>,
    in_use: Cell<bool>,
    next: StateLink,
    last: StateLink,
}

impl Default for StateCore {
    fn default() -> Self {
        StateCore::new()
    }
}

impl StateCore {
    pub fn new() -> Self {
        StateCore::with_physics(Box::new(NullWorld))
    }

    pub fn with_physics(physics: Box<dyn PhysicsWorld>) -> Self {
        StateCore::with_params(physics, &StateParams::default())
    }

    pub fn with_params(physics: Box<dyn PhysicsWorld>, params: &StateParams) -> Self {
        StateCore {
            registry: Registry::new(),
            physics: RefCell::new(physics),
            timer: Timer::new(),
            time_scale: Cell::new(params.time_scale),
            velocity_iterations: Cell::new(params.velocity_iterations),
            position_iterations: Cell::new(params.position_iterations),
            in_use: Cell::new(false),
            next: RefCell::new(None),
            last: RefCell::new(None),
        }
    }

    /// The state's object registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The state's task timer, driven by the state's scaled time.
    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale.get()
    }

    /// Sets the multiplier applied to frame time before it reaches this
    /// state's objects, physics world and timer. Zero freezes them all.
    pub fn set_time_scale(&self, scale: f32) {
        self.time_scale.set(scale);
    }

    /// The state's physics world. Do not hold the guard across a `step`.
    pub fn physics(&self) -> RefMut<Box<dyn PhysicsWorld>> {
        self.physics.borrow_mut()
    }

    pub fn velocity_iterations(&self) -> u32 {
        self.velocity_iterations.get()
    }

    pub fn set_velocity_iterations(&self, iterations: u32) {
        self.velocity_iterations.set(iterations);
    }

    pub fn position_iterations(&self) -> u32 {
        self.position_iterations.get()
    }

    pub fn set_position_iterations(&self, iterations: u32) {
        self.position_iterations.set(iterations);
    }

    /// Runs one simulation step over the state's world: sweep what was
    /// marked last frame, advance the timer, update, step physics, late
    /// update.
    pub fn step(&self, time: &TimeStep) {
        let dt = time.unscaled_dt * self.time_scale.get();

        self.registry.destroy_marked();
        self.timer.progress(f64::from(dt));

        let ctx = UpdateContext {
            dt,
            unscaled_dt: time.unscaled_dt,
            registry: &self.registry,
        };

        self.registry.update(&ctx);
        self.physics.borrow_mut().step(
            dt,
            self.velocity_iterations.get(),
            self.position_iterations.get(),
        );
        self.registry.late_update(&ctx);
    }

    /// Runs the registry's draw pass.
    pub fn draw_world(&self, renderer: &mut dyn Renderer) {
        self.registry.draw(renderer);
    }

    /// The state stacked on top of this one, while one exists.
    pub fn next(&self) -> Option<StateHandle> {
        self.next.borrow().as_ref().and_then(Weak::upgrade)
    }

    /// The state below this one on the stack, while this state is pushed.
    pub fn last(&self) -> Option<StateHandle> {
        self.last.borrow().as_ref().and_then(Weak::upgrade)
    }

    /// True from the moment the state is pushed, forever; state values are
    /// single-use.
    pub fn is_in_use(&self) -> bool {
        self.in_use.get()
    }

    pub(crate) fn set_in_use(&self) {
        self.in_use.set(true);
    }

    pub(crate) fn set_next(&self, link: Option<Weak<RefCell<dyn State>>>) {
        *self.next.borrow_mut() = link;
    }

    pub(crate) fn set_last(&self, link: Option<Weak<RefCell<dyn State>>>) {
        *self.last.borrow_mut() = link;
    }
}

/// A stackable game state. Implementations embed a [`StateCore`] and
/// override the hooks they care about; the default `update` and `draw`
/// simply run the embedded world.
pub trait State: 'static {
    fn core(&self) -> &StateCore;

    /// Runs once, right after the state lands on the stack (after the first
    /// `on_resume`).
    fn on_init(&mut self, _ctx: &Context) -> Result<()> {
        Ok(())
    }

    /// Runs whenever the state stops being the top of the stack, including
    /// the moment it is popped.
    fn on_pause(&mut self, _ctx: &Context) {}

    /// Runs whenever the state becomes the top of the stack.
    fn on_resume(&mut self, _ctx: &Context) {}

    /// Runs once, after the popped state's world has been torn down.
    fn on_destroy(&mut self, _ctx: &Context) {}

    fn update(&mut self, _ctx: &Context, time: &TimeStep) -> Result<()> {
        self.core().step(time);
        Ok(())
    }

    fn draw(&mut self, _ctx: &Context, renderer: &mut dyn Renderer) -> Result<()> {
        self.core().draw_world(renderer);
        Ok(())
    }
}
