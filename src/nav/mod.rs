pub mod location;
pub mod manager;
pub mod port;

pub use location::Location;
pub use manager::{NavigationManager, NavigationState};
pub use port::{MemoryHistory, NavigationPort};
