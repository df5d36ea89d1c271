//! Two-tier persistence of the session token and state snapshot.
//!
//! The durable tier survives restarts ("remember me"); the session tier only
//! lives as long as the browsing session. The token is kept in exactly one
//! tier, and the snapshot follows it: whichever tier holds a durable token
//! receives the snapshot and the other tier's snapshot keys are erased.
//!
//! Write failures are logged and swallowed. Persistence never blocks or fails
//! the state transition that triggered it.

mod tier;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use storekeep_core::ProductId;
use tracing::{debug, warn};

pub use tier::{FileStorage, MemoryStorage, StorageError, StorageTier, Tier};
#[cfg(test)]
pub(crate) use tier::FailingStorage;

use crate::config::ClientConfig;
use crate::store::{AppState, CartState, SessionState, WishlistState};

/// Keys used inside each tier document.
pub mod keys {
    /// Bearer credential.
    pub const TOKEN: &str = "token";
    /// Serialized line array.
    pub const CART: &str = "cart";
    /// Serialized `{session, cart, wishlist}` snapshot.
    pub const STATE: &str = "state";
    /// In-flight verification marker (session tier only).
    pub const VERIFYING: &str = "verifying";

    /// Keys that move together with the snapshot.
    pub const SNAPSHOT: [&str; 2] = [STATE, CART];
}

const DEFAULT_MARKER_TTL: Duration = Duration::from_secs(60);

/// The persisted slices of [`AppState`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub session: SessionState,
    #[serde(default)]
    pub cart: CartState,
    #[serde(default)]
    pub wishlist: WishlistState,
    /// Checked-out cart lines. Absent in older snapshots, meaning all lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<BTreeSet<ProductId>>,
}

impl From<&AppState> for Snapshot {
    fn from(state: &AppState) -> Self {
        Self {
            session: state.session.clone(),
            cart: state.cart.clone(),
            wishlist: state.wishlist.clone(),
            selection: Some(state.cart.selected().clone()),
        }
    }
}

/// Reads and writes session data across the two storage tiers.
#[derive(Debug, Clone)]
pub struct PersistenceAdapter {
    durable: Arc<dyn StorageTier>,
    session: Arc<dyn StorageTier>,
    marker_ttl: Duration,
}

impl PersistenceAdapter {
    /// Create an adapter over the given tiers.
    pub fn new(durable: Arc<dyn StorageTier>, session: Arc<dyn StorageTier>) -> Self {
        Self {
            durable,
            session,
            marker_ttl: DEFAULT_MARKER_TTL,
        }
    }

    /// Adapter over two fresh in-memory tiers.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryStorage::new()),
        )
    }

    /// File-backed tiers under the configured data and session directories.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if either directory cannot be created.
    pub fn open(config: &ClientConfig) -> Result<Self, StorageError> {
        let durable = FileStorage::open(&config.data_dir, "durable")?;
        let session = FileStorage::open(&config.session_dir, "session")?;
        Ok(Self::new(Arc::new(durable), Arc::new(session))
            .with_marker_ttl(config.verify_marker_ttl))
    }

    /// Set the age after which a verification marker is ignored.
    #[must_use]
    pub fn with_marker_ttl(mut self, ttl: Duration) -> Self {
        self.marker_ttl = ttl;
        self
    }

    fn tier(&self, tier: Tier) -> &dyn StorageTier {
        match tier {
            Tier::Durable => self.durable.as_ref(),
            Tier::Session => self.session.as_ref(),
        }
    }

    fn read_logged(&self, tier: Tier, key: &str) -> Option<String> {
        match self.tier(tier).read(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(tier = %tier, key, error = %e, "Failed to read from storage tier");
                None
            }
        }
    }

    fn write_logged(&self, tier: Tier, key: &str, value: &str) {
        if let Err(e) = self.tier(tier).write(key, value) {
            warn!(tier = %tier, key, error = %e, "Failed to write to storage tier");
        }
    }

    fn remove_logged(&self, tier: Tier, key: &str) {
        if let Err(e) = self.tier(tier).remove(key) {
            warn!(tier = %tier, key, error = %e, "Failed to remove from storage tier");
        }
    }

    // =========================================================================
    // Token
    // =========================================================================

    /// The stored token and the tier holding it. The durable tier wins if
    /// both somehow hold one.
    #[must_use]
    pub fn token(&self) -> Option<(SecretString, Tier)> {
        [Tier::Durable, Tier::Session].into_iter().find_map(|tier| {
            self.read_logged(tier, keys::TOKEN)
                .filter(|t| !t.is_empty())
                .map(|t| (SecretString::from(t), tier))
        })
    }

    /// The tier currently holding the token.
    #[must_use]
    pub fn token_tier(&self) -> Option<Tier> {
        self.token().map(|(_, tier)| tier)
    }

    /// Store the token in `tier`, clearing it from the other tier first.
    pub fn store_token(&self, token: &SecretString, tier: Tier) {
        self.remove_logged(tier.other(), keys::TOKEN);
        self.write_logged(tier, keys::TOKEN, token.expose_secret());
        debug!(tier = %tier, "Stored session token");
    }

    /// Remove the token from whichever tier holds it.
    pub fn clear_token(&self) {
        self.remove_logged(Tier::Durable, keys::TOKEN);
        self.remove_logged(Tier::Session, keys::TOKEN);
    }

    // =========================================================================
    // Snapshot
    // =========================================================================

    /// Persist a snapshot to the tier that holds the durable token, or the
    /// session tier otherwise, erasing the snapshot keys from the other tier.
    pub fn save(&self, snapshot: &Snapshot) {
        let target = if self.token_tier() == Some(Tier::Durable) {
            Tier::Durable
        } else {
            Tier::Session
        };

        let encoded = serde_json::to_string(snapshot)
            .and_then(|state| serde_json::to_string(&snapshot.cart).map(|cart| (state, cart)));
        let (state, cart) = match encoded {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "Failed to serialize state snapshot");
                return;
            }
        };

        for key in keys::SNAPSHOT {
            self.remove_logged(target.other(), key);
        }
        self.write_logged(target, keys::STATE, &state);
        self.write_logged(target, keys::CART, &cart);
    }

    /// Load the snapshot, durable tier first. Unreadable snapshots are
    /// skipped with a warning.
    #[must_use]
    pub fn load(&self) -> Option<Snapshot> {
        [Tier::Durable, Tier::Session].into_iter().find_map(|tier| {
            let raw = self.read_logged(tier, keys::STATE)?;
            match serde_json::from_str(&raw) {
                Ok(snapshot) => {
                    debug!(tier = %tier, "Loaded state snapshot");
                    Some(snapshot)
                }
                Err(e) => {
                    warn!(tier = %tier, error = %e, "Discarding unreadable state snapshot");
                    None
                }
            }
        })
    }

    /// Erase the snapshot keys from both tiers.
    pub fn clear_snapshot(&self) {
        for tier in [Tier::Durable, Tier::Session] {
            for key in keys::SNAPSHOT {
                self.remove_logged(tier, key);
            }
        }
    }

    // =========================================================================
    // Verification marker
    // =========================================================================

    /// When the current verification attempt started, if one is recorded.
    #[must_use]
    pub fn verify_marker(&self) -> Option<DateTime<Utc>> {
        let raw = self.read_logged(Tier::Session, keys::VERIFYING)?;
        match DateTime::parse_from_rfc3339(&raw) {
            Ok(at) => Some(at.with_timezone(&Utc)),
            Err(e) => {
                warn!(error = %e, "Ignoring malformed verification marker");
                None
            }
        }
    }

    /// Whether a verification attempt is in flight as of `now`. Markers
    /// older than the configured TTL are treated as abandoned.
    #[must_use]
    pub fn verify_in_flight(&self, now: DateTime<Utc>) -> bool {
        let ttl = TimeDelta::from_std(self.marker_ttl).unwrap_or(TimeDelta::MAX);
        self.verify_marker()
            .is_some_and(|started| now.signed_duration_since(started) < ttl)
    }

    pub fn set_verify_marker(&self, now: DateTime<Utc>) {
        self.write_logged(Tier::Session, keys::VERIFYING, &now.to_rfc3339());
    }

    pub fn clear_verify_marker(&self) {
        self.remove_logged(Tier::Session, keys::VERIFYING);
    }
}
