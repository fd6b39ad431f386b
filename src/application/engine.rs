//! The engine: a stack of game states, a deferred transition queue, and
//! the frame loop that drives the top of the stack.
//!
//! Transitions requested through the [`Context`] never act immediately;
//! they queue up and are applied at the top of the next `update`, before
//! any state code runs. A transition enqueued while the queue is being
//! drained waits for the frame after that. This keeps pushes and pops from
//! tearing a world down underneath the callback that asked for them.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::assets::AssetLoader;
use crate::errors::{Error, Result};
use crate::video::{HeadlessRenderer, Renderer};

use super::settings::Settings;
use super::state::State;
use super::time::{TimeSource, TimeSystem, WallClock};

/// A shared, type-erased handle to a stacked state.
pub type StateHandle = Rc<RefCell<dyn State>>;

enum Transition {
    Push(StateHandle),
    Pop,
}

/// Where the engine currently is in its frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    /// Not a single frame has run yet.
    Inactive,
    /// Between frames.
    Idle,
    /// Applying queued pushes and pops.
    HandlingTransitions,
    /// Inside the active state's `update`.
    Update,
    /// Inside the active state's `draw`.
    Draw,
}

/// The engine services visible to states and their objects: the transition
/// queue, settings, asset loading and shutdown.
pub struct Context {
    pending: RefCell<VecDeque<Transition>>,
    assets: RefCell<Option<Box<dyn AssetLoader>>>,
    settings: Settings,
    shutdown: Cell<bool>,
}

impl Context {
    fn new(settings: Settings) -> Self {
        Context {
            pending: RefCell::new(VecDeque::new()),
            assets: RefCell::new(None),
            settings,
            shutdown: Cell::new(false),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Queues a state to be pushed at the start of the next frame, and
    /// returns a handle to it so the caller can keep talking to it.
    pub fn push_state<T: State>(&self, state: T) -> Rc<RefCell<T>> {
        let strong = Rc::new(RefCell::new(state));
        let handle: StateHandle = strong.clone();
        self.pending.borrow_mut().push_back(Transition::Push(handle));
        strong
    }

    /// Queues an existing handle to be pushed at the start of the next
    /// frame. State values are single-use; re-pushing a handle that has
    /// already been on the stack panics when the transition is applied.
    pub fn push_handle(&self, state: StateHandle) {
        self.pending.borrow_mut().push_back(Transition::Push(state));
    }

    /// Queues the removal of the top of the state stack at the start of the
    /// next frame. Popping an empty stack is a no-op.
    pub fn pop_state(&self) {
        self.pending.borrow_mut().push_back(Transition::Pop);
    }

    /// Asks the engine's main loop to exit after the current frame.
    pub fn shutdown(&self) {
        self.shutdown.set(true);
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.get()
    }

    /// Loads an asset through the attached loader and downcasts it to `T`.
    pub fn load_asset<T: Any>(&self, name: &str) -> Result<Rc<T>> {
        let mut assets = self.assets.borrow_mut();
        let loader = assets.as_mut().ok_or(Error::NoAssetLoader)?;
        let raw = loader.load(name)?;
        raw.downcast::<T>()
            .map_err(|_| Error::AssetKindMismatch(name.to_string()))
    }

    pub(crate) fn set_asset_loader(&self, loader: Box<dyn AssetLoader>) {
        *self.assets.borrow_mut() = Some(loader);
    }

    fn drain_pending(&self) -> Vec<Transition> {
        self.pending.borrow_mut().drain(..).collect()
    }

    fn has_pending(&self) -> bool {
        !self.pending.borrow().is_empty()
    }
}

/// The engine instance. Owns the state stack, the frame clock and the
/// renderer; states reach everything else through the shared [`Context`].
pub struct Engine {
    context: Rc<Context>,
    stack: Vec<StateHandle>,
    status: EngineStatus,
    time: TimeSystem,
    renderer: Box<dyn Renderer>,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Engine::new_with(Settings::default())
    }

    pub fn new_with(settings: Settings) -> Self {
        let time = TimeSystem::new(Box::new(WallClock::new()), settings.time.clone());

        Engine {
            context: Rc::new(Context::new(settings)),
            stack: Vec::new(),
            status: EngineStatus::Inactive,
            time,
            renderer: Box::new(HeadlessRenderer::new()),
        }
    }

    /// Replaces the default headless renderer.
    pub fn set_renderer(&mut self, renderer: Box<dyn Renderer>) {
        self.renderer = renderer;
    }

    /// Replaces the default wall clock. Resets the frame measurement, not
    /// the accumulated total.
    pub fn set_time_source(&mut self, source: Box<dyn TimeSource>) {
        self.time = TimeSystem::new(source, self.context.settings.time.clone());
    }

    pub fn set_asset_loader(&mut self, loader: Box<dyn AssetLoader>) {
        self.context.set_asset_loader(loader);
    }

    /// The shared engine context. Clone the `Rc` to hand it to long-lived
    /// callbacks.
    pub fn context(&self) -> &Rc<Context> {
        &self.context
    }

    pub fn status(&self) -> EngineStatus {
        self.status
    }

    /// The state currently on top of the stack.
    pub fn active_state(&self) -> Option<StateHandle> {
        self.stack.last().cloned()
    }

    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    /// Runs one frame of logic: apply queued transitions, advance the
    /// clock, update the active state.
    ///
    /// Panics when called from inside a state callback.
    pub fn update(&mut self) -> Result<()> {
        assert!(
            self.status == EngineStatus::Inactive || self.status == EngineStatus::Idle,
            "`Engine::update` can not be called from inside a state callback"
        );

        let result = self.frame_logic();
        self.status = EngineStatus::Idle;
        result
    }

    fn frame_logic(&mut self) -> Result<()> {
        self.status = EngineStatus::HandlingTransitions;

        // Snapshot the queue; transitions enqueued by the callbacks below
        // are applied next frame.
        for transition in self.context.drain_pending() {
            match transition {
                Transition::Push(state) => self.perform_push(state)?,
                Transition::Pop => self.perform_pop(),
            }
        }

        let time = self.time.advance();

        self.status = EngineStatus::Update;
        if let Some(active) = self.stack.last().cloned() {
            active.borrow_mut().update(&self.context, &time)?;
        }

        Ok(())
    }

    /// Draws the active state through the renderer, inside a
    /// `begin_frame`/`end_frame` bracket.
    pub fn draw(&mut self) -> Result<()> {
        assert!(
            self.status == EngineStatus::Inactive || self.status == EngineStatus::Idle,
            "`Engine::draw` can not be called from inside a state callback"
        );

        self.status = EngineStatus::Draw;
        self.renderer.begin_frame();

        let result = match self.stack.last().cloned() {
            Some(active) => active
                .borrow_mut()
                .draw(&self.context, self.renderer.as_mut()),
            None => Ok(()),
        };

        self.renderer.end_frame();
        self.status = EngineStatus::Idle;
        result
    }

    /// Runs update/draw frames until the stack runs dry or somebody calls
    /// [`Context::shutdown`]. Returns the engine for inspection.
    pub fn run(mut self) -> Result<Self> {
        info!("engine entering the main loop");

        loop {
            self.update()?;
            self.draw()?;

            if self.context.is_shutdown() {
                info!("engine shut down on request");
                break;
            }

            if self.stack.is_empty() && !self.context.has_pending() {
                info!("engine ran out of states");
                break;
            }
        }

        Ok(self)
    }

    fn perform_push(&mut self, state: StateHandle) -> Result<()> {
        assert!(
            !state.borrow().core().is_in_use(),
            "game states can not be pushed twice"
        );

        if let Some(prev) = self.stack.last() {
            prev.borrow_mut().on_pause(&self.context);
            prev.borrow().core().set_next(Some(Rc::downgrade(&state)));
            state.borrow().core().set_last(Some(Rc::downgrade(prev)));
        }

        state.borrow().core().set_in_use();
        self.stack.push(Rc::clone(&state));
        debug!("pushed a state; the stack holds {}", self.stack.len());

        state.borrow_mut().on_resume(&self.context);
        state.borrow_mut().on_init(&self.context)?;
        Ok(())
    }

    fn perform_pop(&mut self) {
        let popped = match self.stack.pop() {
            Some(state) => state,
            None => {
                debug!("a pop was requested on an empty state stack");
                return;
            }
        };

        popped.borrow_mut().on_pause(&self.context);
        popped.borrow().core().registry().truly_destroy_all();
        popped.borrow_mut().on_destroy(&self.context);
        popped.borrow().core().set_last(None);
        debug!("popped a state; the stack holds {}", self.stack.len());

        if let Some(exposed) = self.stack.last() {
            exposed.borrow().core().set_next(None);
            exposed.borrow_mut().on_resume(&self.context);
        }
    }
}
