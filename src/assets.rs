//! The asset boundary. The engine context forwards load requests to a
//! host-supplied loader and downcasts the result for the caller.

use std::any::Any;
use std::rc::Rc;

use crate::errors::Result;

/// Resolves asset names to loaded values. Loaders are expected to cache;
/// the engine asks for the same name as often as states request it.
pub trait AssetLoader {
    fn load(&mut self, name: &str) -> Result<Rc<dyn Any>>;
}
