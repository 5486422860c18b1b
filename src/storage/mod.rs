// This file is part of RadarStore.
//
// Copyright (C) 2025 Matheus Cardoso <varvedb@matheus.sbs>
//
// This Source Code Form is subject to the terms of the Mozilla Public License
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at http://mozilla.org/MPL/2.0/.

use std::path::Path;
use std::sync::Arc;

use heed::{Env, EnvOpenOptions, RwTxn};

use crate::constants;
use crate::conversation::Conversations;
use crate::error::{Error, Result};
use crate::message::Messages;
#[cfg(feature = "metrics")]
use crate::metrics::StoreMetrics;
use crate::sequence::{Allocated, SequenceAllocator};
use crate::traits::Sequenced;
use crate::types::{CountersDb, EntitiesDb, IndexDb};

/// Configuration for opening a RadarStore environment.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub map_size: usize,
    pub max_dbs: u32,
    /// Create the environment directory if it does not exist.
    pub create_dir: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            map_size: constants::DEFAULT_MAP_SIZE,
            max_dbs: constants::DEFAULT_MAX_DBS,
            create_dir: true,
        }
    }
}

impl StoreConfig {
    fn validate(&self) -> Result<()> {
        if self.map_size == 0 {
            return Err(Error::InvalidConfig("map_size must be non-zero".into()));
        }
        if self.max_dbs < constants::REQUIRED_DBS {
            return Err(Error::InvalidConfig(format!(
                "max_dbs must be at least {}, got {}",
                constants::REQUIRED_DBS,
                self.max_dbs
            )));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub(crate) struct StoreCore {
    pub(crate) env: Env,
    pub(crate) counters: CountersDb,
    pub(crate) conversations: EntitiesDb,
    pub(crate) messages: EntitiesDb,
    /// Key: ConversationID + MessageID.
    pub(crate) conversation_messages: IndexDb,
    /// Key: UserID + ConversationID.
    pub(crate) user_conversations: IndexDb,
    #[cfg(feature = "metrics")]
    pub(crate) metrics: Option<Arc<StoreMetrics>>,
}

/// Handle to one LMDB environment holding counters and chat entities.
///
/// Cloning is cheap: every clone and every view handed out by
/// [`allocator`](Self::allocator), [`conversations`](Self::conversations) and
/// [`messages`](Self::messages) shares the same environment. Handles are
/// `Send + Sync`; LMDB serializes writers internally.
///
/// An environment may only be opened once per process, so drop every handle
/// before reopening the same path.
#[derive(Clone)]
pub struct Store {
    core: Arc<StoreCore>,
}

impl Store {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_config(path, StoreConfig::default())
    }

    pub fn with_config(path: impl AsRef<Path>, config: StoreConfig) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref();

        if config.create_dir {
            std::fs::create_dir_all(path)?;
        }

        let env = unsafe {
            EnvOpenOptions::new()
                .read_txn_with_tls()
                .max_dbs(config.max_dbs)
                .map_size(config.map_size)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let counters = env.create_database(&mut wtxn, Some(constants::COUNTERS_DB_NAME))?;
        let conversations =
            env.create_database(&mut wtxn, Some(constants::CONVERSATIONS_DB_NAME))?;
        let messages = env.create_database(&mut wtxn, Some(constants::MESSAGES_DB_NAME))?;
        let conversation_messages =
            env.create_database(&mut wtxn, Some(constants::CONVERSATION_MESSAGES_DB_NAME))?;
        let user_conversations =
            env.create_database(&mut wtxn, Some(constants::USER_CONVERSATIONS_DB_NAME))?;
        wtxn.commit()?;

        #[cfg(feature = "log_info")]
        crate::log::macros::info!(path = %path.display(), "store opened");

        Ok(Self {
            core: Arc::new(StoreCore {
                env,
                counters,
                conversations,
                messages,
                conversation_messages,
                user_conversations,
                #[cfg(feature = "metrics")]
                metrics: None,
            }),
        })
    }

    /// Attaches Prometheus metrics to this handle and every view created from it afterwards.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(self, metrics: Arc<StoreMetrics>) -> Self {
        let mut core = (*self.core).clone();
        core.metrics = Some(metrics);
        Self {
            core: Arc::new(core),
        }
    }

    pub fn allocator(&self) -> SequenceAllocator {
        SequenceAllocator::new(Arc::clone(&self.core))
    }

    pub fn conversations(&self) -> Conversations {
        Conversations::new(Arc::clone(&self.core))
    }

    pub fn messages(&self) -> Messages {
        Messages::new(Arc::clone(&self.core))
    }

    /// Reserves a key for an entity of type `T`.
    ///
    /// This is the first half of entity creation; hand the token to the
    /// matching `persist_with_key`. Dropping the token leaves a gap in the
    /// sequence, never a duplicate.
    pub fn allocate<T: Sequenced>(&self) -> Result<Allocated<T>> {
        self.allocator().allocate::<T>()
    }

    /// Opens a write transaction for callers that want to allocate with
    /// [`SequenceAllocator::next_in`] and persist atomically.
    pub fn write_txn(&self) -> Result<RwTxn<'_>> {
        Ok(self.core.env.write_txn()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_missing_directory() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("nested").join("radar.mdb");

        let store = Store::new(&path).expect("Failed to open store");
        assert!(path.is_dir());
        assert_eq!(store.allocator().counters().expect("counters").len(), 0);
    }

    #[test]
    fn test_open_without_create_dir_fails_on_missing_path() {
        let dir = tempdir().expect("Failed to create temp dir");
        let config = StoreConfig {
            create_dir: false,
            ..Default::default()
        };

        let result = Store::with_config(dir.path().join("missing"), config);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_too_few_databases() {
        let dir = tempdir().expect("Failed to create temp dir");
        let config = StoreConfig {
            max_dbs: 2,
            ..Default::default()
        };

        let result = Store::with_config(dir.path(), config);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_zero_map_size() {
        let dir = tempdir().expect("Failed to create temp dir");
        let config = StoreConfig {
            map_size: 0,
            ..Default::default()
        };

        let result = Store::with_config(dir.path(), config);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_store_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Store>();
        assert_send_sync::<SequenceAllocator>();
        assert_send_sync::<Conversations>();
        assert_send_sync::<Messages>();
    }
}
