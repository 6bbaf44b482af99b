pub mod command;
pub mod event;
pub mod order;
pub mod position;
pub mod quote;
pub mod simulation;

pub use command::*;
pub use event::*;
pub use order::*;
pub use position::*;
pub use quote::*;
pub use simulation::*;
