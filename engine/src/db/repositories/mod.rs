//! Repository implementations:
//! - `local`: in-memory, for tests and ephemeral sessions
//! - `file`: one JSON file per key under a data directory
pub mod file;
pub mod local;

pub use file::FileRepository;
pub use local::LocalRepository;
