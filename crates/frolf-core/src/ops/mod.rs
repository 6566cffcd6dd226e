pub mod tracker;

pub use tracker::{ChangeTracker, EntryState};
