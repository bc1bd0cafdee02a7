//! Host metadata shared with the request handler.
//!
//! The metadata is collected asynchronously after startup, so handlers may run
//! before it exists. [`Environment`] makes that explicit: [`Environment::get`]
//! returns `None` until an [`EnvironmentBuilder`] has published a value, and
//! [`Environment::ready`] waits for it.

use std::{
    collections::BTreeMap,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::watch;
use tracing::info;

/// Facts about the machine the agent runs on.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HostMetadata {
    /// Configured agent identity.
    pub host: String,
    /// Operating system name, e.g. `linux`.
    pub os: String,
    /// CPU architecture, e.g. `x86_64`.
    pub arch: String,
    /// Agent process id.
    pub pid: u32,
    /// Agent version.
    pub agent_version: String,
    /// Seconds since the Unix epoch when collection finished.
    pub collected_at: u64,
    /// Builder-specific extras.
    pub extra: BTreeMap<String, String>,
}

/// Shared, write-once cell for [`HostMetadata`].
///
/// Clones share the same cell.
#[derive(Clone, Debug)]
pub struct Environment {
    cell: Arc<watch::Sender<Option<Arc<HostMetadata>>>>,
}

impl Default for Environment {
    fn default() -> Self { Self::new() }
}

impl Environment {
    /// Create an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cell: Arc::new(watch::Sender::new(None)),
        }
    }

    /// Current metadata, or `None` if it has not been published yet.
    #[must_use]
    pub fn get(&self) -> Option<Arc<HostMetadata>> { self.cell.borrow().clone() }

    /// Returns `true` once metadata is available.
    #[must_use]
    pub fn is_ready(&self) -> bool { self.cell.borrow().is_some() }

    /// Wait until metadata is available.
    pub async fn ready(&self) -> Arc<HostMetadata> {
        let mut updates = self.cell.subscribe();
        loop {
            if let Some(metadata) = updates.borrow_and_update().as_ref() {
                return Arc::clone(metadata);
            }
            // `self` keeps the sender alive, so this cannot observe closure.
            let _ = updates.changed().await;
        }
    }

    /// Store `metadata`. Only the first publication wins; returns whether this
    /// call stored its value.
    pub fn publish(&self, metadata: HostMetadata) -> bool {
        let metadata = Arc::new(metadata);
        self.cell.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(metadata);
            true
        })
    }
}

/// Collects [`HostMetadata`] once at startup.
#[async_trait]
pub trait EnvironmentBuilder: Send + Sync + 'static {
    /// Gather metadata for the agent identified by `host`.
    async fn build(&self, host: &str) -> HostMetadata;
}

/// Records basic facts about the running process.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemEnvironmentBuilder;

#[async_trait]
impl EnvironmentBuilder for SystemEnvironmentBuilder {
    async fn build(&self, host: &str) -> HostMetadata {
        let collected_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs());
        let mut extra = BTreeMap::new();
        extra.insert("family".to_owned(), std::env::consts::FAMILY.to_owned());
        if let Ok(name) = std::env::var("HOSTNAME") {
            extra.insert("hostname".to_owned(), name);
        }
        HostMetadata {
            host: host.to_owned(),
            os: std::env::consts::OS.to_owned(),
            arch: std::env::consts::ARCH.to_owned(),
            pid: std::process::id(),
            agent_version: env!("CARGO_PKG_VERSION").to_owned(),
            collected_at,
            extra,
        }
    }
}

/// Run `builder` in the background and publish its result into `environment`.
///
/// The caller does not wait for collection to finish.
pub fn spawn_builder(
    builder: Arc<dyn EnvironmentBuilder>,
    host: String,
    environment: Environment,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let metadata = builder.build(&host).await;
        environment.publish(metadata);
        info!(host = %host, "host environment collected");
    })
}
