// minibackend - File-backed JSON record store and HTTP backend for contacts and tasks

pub mod config;
pub mod error;
pub mod id;
pub mod jsonfile;
pub mod models;
pub mod record;
pub mod server;
pub mod store;

// Re-export main types for convenience
pub use config::Config;
pub use error::StoreError;
pub use id::{Clock, IdGenerator, IdPolicy, SystemClock};
pub use models::{CATEGORIES, Contact, Subtask, Task};
pub use record::Record;
pub use store::{Collection, Store};
