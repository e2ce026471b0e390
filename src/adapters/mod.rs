// Adapters layer: concrete implementations of the domain ports.

pub mod sqlite_store;
pub mod tequila;

pub use sqlite_store::SqliteBaselineStore;
pub use tequila::{TequilaConfig, TequilaSource};
