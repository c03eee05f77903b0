pub mod engine;
pub mod executor;
pub mod json;
pub mod script;

pub use engine::{NftCommandEngine, NftSession};
pub use executor::{NftExecutor, ProcessExecutor};
