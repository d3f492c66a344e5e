//! In-memory adapters - the fallback when no database or bucket is configured.

mod objects;
mod store;

pub use objects::InMemoryObjectStore;
pub use store::InMemoryStore;

#[cfg(test)]
mod tests;
