mod file_store;
mod store;

pub use file_store::FileCredentialStore;
pub use store::{CredentialStore, CredentialStoreError, InMemoryCredentialStore};
