//! Route registry and request dispatch.

pub mod registry;
pub mod dispatcher;

pub use dispatcher::{DispatchError, Dispatcher};
pub use registry::{BoxedHandler, Handler, Registry, RegistryBuilder};
