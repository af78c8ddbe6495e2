pub mod change_feed;
pub mod memory;
pub mod seed;
pub mod state;
pub mod store;
pub mod supabase;
pub mod supabase_store;

pub use change_feed::{ChangeFeed, ChangeReceiver};
pub use memory::InMemoryStore;
pub use state::AppState;
pub use store::{ClinicStore, StoreError, StoreResult};
