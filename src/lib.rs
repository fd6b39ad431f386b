//! # Cadence
//!
//! A small stacked-state game framework built around a type-bucketed
//! object store.
//!
//! The building blocks:
//!
//! - [`ecs`]: lifecycle-tracked game objects with deferred (mark/sweep)
//!   destruction, a store that buckets objects by exact type and answers
//!   subtype-aware queries through cached relations, and the
//!   entity/component registry with fixed update, late-update and draw
//!   orderings.
//! - [`application`]: a stack of game states, each a fully isolated world
//!   with its own registry, physics world, task timer and time scale;
//!   pushes and pops are deferred to frame boundaries.
//! - [`video`], [`physics`], [`assets`]: the traits a host application
//!   implements to plug in real rendering, simulation and content.
//!
//! ```rust
//! use cadence::prelude::*;
//!
//! struct Boot {
//!     core: StateCore,
//! }
//!
//! impl State for Boot {
//!     fn core(&self) -> &StateCore {
//!         &self.core
//!     }
//!
//!     fn on_init(&mut self, ctx: &Context) -> Result<()> {
//!         ctx.shutdown();
//!         Ok(())
//!     }
//! }
//!
//! let engine = Engine::new();
//! engine.context().push_state(Boot {
//!     core: StateCore::new(),
//! });
//! engine.run().unwrap();
//! ```

#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde;

pub mod application;
pub mod assets;
pub mod ecs;
pub mod errors;
pub mod physics;
pub mod prelude;
pub mod utils;
pub mod video;

pub use crate::errors::{Error, Result};
