#![forbid(unsafe_code)]

mod connect;
mod error;
mod layout;
mod model;
mod mutate;
mod names;
mod node;
mod registry;

pub use connect::*;
pub use error::*;
pub use layout::*;
pub use model::*;
pub use names::*;
pub use node::*;
pub use registry::*;
