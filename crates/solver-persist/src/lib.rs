pub mod models;
pub mod error;
pub mod timestamp;
pub mod trait_client;
pub mod memory;
#[cfg(feature = "mongodb")]
pub mod dbs;

pub use models::{Thread, Message, MessageRole, NewMessage};
pub use trait_client::PersistenceClient;
pub use memory::InMemoryPersistenceClient;
pub use error::{PersistError, Result};

#[cfg(feature = "mongodb")]
pub use dbs::mongo::MongoPersistenceClient;
