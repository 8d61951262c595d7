pub mod error;
pub mod firebase;
pub mod memory;
pub mod paths;
pub mod push_id;
pub mod sse;
pub mod store;
pub mod tree;

pub use error::StoreError;
pub use firebase::FirebaseClient;
pub use memory::InMemoryStore;
pub use store::{store_from_config, RealtimeStore, Snapshot, Subscription};
