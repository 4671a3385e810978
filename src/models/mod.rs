mod delivery;
mod endpoint;
mod event;

pub use delivery::*;
pub use endpoint::*;
pub use event::*;
