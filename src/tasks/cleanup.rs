//! TTL Cleanup Task
//!
//! Background task that periodically removes expired cache entries.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{CacheProvider, EntryStore};

/// Spawns a background task that periodically purges expired cache entries.
///
/// Reads already treat expired entries as misses; the sweep only reclaims
/// memory held by entries nobody asks for again. The Redis store expires
/// keys natively and always reports zero.
///
/// Returns a JoinHandle that can be aborted during graceful shutdown.
pub fn spawn_cleanup_task<S: EntryStore>(
    cache: CacheProvider<S>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            interval_secs = interval.as_secs(),
            backend = cache.backend_name(),
            "Starting TTL cleanup task"
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.purge_expired().await;
            if removed > 0 {
                info!(removed, "TTL cleanup: removed expired entries");
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}
