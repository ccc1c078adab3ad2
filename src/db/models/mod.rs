pub mod term;

pub use term::{StoredTerm, UnifiedDocument};
