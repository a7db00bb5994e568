pub mod entry;
pub mod projector;

pub use entry::{EntryKind, ObjectEntry, DELETE_ICON};
pub use projector::{Hint, ListMode, ListRequest, Listing, ListingProjector, ListingRow};
