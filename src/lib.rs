//! k9track: activity timers for dog-training facilities
//!
//! Resolves each facility's activity types (built-ins, overrides, custom
//! types) and derives live threshold status for dogs' running activities.

pub mod activity;
pub mod backend;
pub mod config;
pub mod error;
pub mod interactive;
pub mod logging;
pub mod store;
pub mod supabase;
pub mod ticker;
pub mod utils;
pub mod workflow;

use std::sync::Arc;

use backend::FacilityBackend;
use config::Config;
use error::{Result, StoreError};
use store::{FileStore, LocalBackend};
use supabase::SupabaseClient;

/// Pick the backend the config asks for: Supabase when remote settings are
/// present, the local file store otherwise.
pub fn backend_from_config(config: &Config) -> Result<Arc<dyn FacilityBackend>> {
    if let Some(remote) = config.remote() {
        tracing::debug!(url = %remote.base_url, "using supabase backend");
        return Ok(Arc::new(SupabaseClient::new(&remote)?));
    }

    let dir = config.store_dir().ok_or(StoreError::NoDataDir)?;
    tracing::debug!(dir = %dir.display(), "using local backend");
    Ok(Arc::new(LocalBackend::new(Arc::new(FileStore::new(dir)))))
}
