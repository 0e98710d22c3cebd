pub mod anime;
pub mod entry;
pub mod profile;

pub use anime::AnimeRef;
pub use entry::{filter, ListEntry, ListFilter, ListStats};
pub use profile::{Profile, Subject};
