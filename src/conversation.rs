// This file is part of RadarStore.
//
// Copyright (C) 2025 Matheus Cardoso <varvedb@matheus.sbs>
//
// This Source Code Form is subject to the terms of the Mozilla Public License
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at http://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use heed::{PutFlags, RoTxn, RwTxn};

use crate::error::{Error, Result};
use crate::model::{decode, encode, now_millis, Conversation};
use crate::sequence::{Allocated, SequenceAllocator};
use crate::storage::StoreCore;
use crate::traits::Sequenced;
use crate::types::{pair_key, split_pair_key};

/// View over the conversations of a [`Store`](crate::storage::Store).
#[derive(Clone)]
pub struct Conversations {
    core: Arc<StoreCore>,
}

fn normalize_participants(participants: &[u64]) -> Result<Vec<u64>> {
    let mut participants = participants.to_vec();
    participants.sort_unstable();
    participants.dedup();
    if participants.len() < 2 {
        return Err(Error::Validation(
            "a conversation needs at least two distinct participants".into(),
        ));
    }
    Ok(participants)
}

impl Conversations {
    pub(crate) fn new(core: Arc<StoreCore>) -> Self {
        Self { core }
    }

    /// Returns the conversation between exactly these participants, creating it if needed.
    ///
    /// Order and duplicates in `participants` are ignored.
    pub fn start(&self, participants: &[u64]) -> Result<Conversation> {
        let participants = normalize_participants(participants)?;

        {
            let rtxn = self.core.env.read_txn()?;
            if let Some(existing) = self.find_in(&rtxn, &participants)? {
                return Ok(existing);
            }
        }

        let allocator = SequenceAllocator::new(Arc::clone(&self.core));
        let mut wtxn = self.core.env.write_txn()?;
        // Another writer may have created it since the read above.
        if let Some(existing) = self.find_in(&wtxn, &participants)? {
            return Ok(existing);
        }
        let key = allocator.allocate_in::<Conversation>(&mut wtxn)?;
        let conversation = self.insert_in(&mut wtxn, key, participants)?;
        wtxn.commit()?;

        allocator.record(Conversation::KIND, 1);
        self.persisted(&conversation);
        Ok(conversation)
    }

    /// Stores a new conversation under an allocated key.
    ///
    /// Unlike [`start`](Self::start) this never reuses an existing
    /// conversation with the same participants.
    pub fn persist_with_key(
        &self,
        key: Allocated<Conversation>,
        participants: &[u64],
    ) -> Result<Conversation> {
        let participants = normalize_participants(participants)?;

        let mut wtxn = self.core.env.write_txn()?;
        let conversation = self.insert_in(&mut wtxn, key, participants)?;
        wtxn.commit()?;

        self.persisted(&conversation);
        Ok(conversation)
    }

    pub fn get(&self, id: u64) -> Result<Option<Conversation>> {
        let rtxn = self.core.env.read_txn()?;
        self.load(&rtxn, id)
    }

    /// Conversations `user` takes part in, most recently updated first.
    pub fn for_user(&self, user: u64) -> Result<Vec<Conversation>> {
        let rtxn = self.core.env.read_txn()?;
        let prefix = user.to_be_bytes();

        let mut out = Vec::new();
        for entry in self
            .core
            .user_conversations
            .prefix_iter(&rtxn, prefix.as_slice())?
        {
            let (key, ()) = entry?;
            let Some((_, conversation_id)) = split_pair_key(key) else {
                continue;
            };
            if let Some(conversation) = self.load(&rtxn, conversation_id)? {
                out.push(conversation);
            }
        }

        out.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(out)
    }

    pub fn is_participant(&self, conversation: u64, user: u64) -> Result<bool> {
        let rtxn = self.core.env.read_txn()?;
        let key = pair_key(user, conversation);
        Ok(self
            .core
            .user_conversations
            .get(&rtxn, key.as_slice())?
            .is_some())
    }

    pub(crate) fn load(&self, txn: &RoTxn<'_>, id: u64) -> Result<Option<Conversation>> {
        self.core
            .conversations
            .get(txn, &id)?
            .map(decode::<Conversation>)
            .transpose()
    }

    /// Overwrites an existing conversation record; participants must not change.
    pub(crate) fn save_in(&self, wtxn: &mut RwTxn<'_>, conversation: &Conversation) -> Result<()> {
        let bytes = encode(conversation)?;
        self.core
            .conversations
            .put(wtxn, &conversation.id, bytes.as_slice())?;
        Ok(())
    }

    fn find_in(&self, txn: &RoTxn<'_>, participants: &[u64]) -> Result<Option<Conversation>> {
        let Some(first) = participants.first() else {
            return Ok(None);
        };
        let prefix = first.to_be_bytes();

        for entry in self
            .core
            .user_conversations
            .prefix_iter(txn, prefix.as_slice())?
        {
            let (key, ()) = entry?;
            let Some((_, conversation_id)) = split_pair_key(key) else {
                continue;
            };
            if let Some(conversation) = self.load(txn, conversation_id)? {
                if conversation.participants == participants {
                    return Ok(Some(conversation));
                }
            }
        }
        Ok(None)
    }

    fn insert_in(
        &self,
        wtxn: &mut RwTxn<'_>,
        key: Allocated<Conversation>,
        participants: Vec<u64>,
    ) -> Result<Conversation> {
        let now = now_millis();
        let conversation = Conversation {
            id: key.id(),
            participants,
            last_message: None,
            created_at: now,
            updated_at: now,
        };

        let bytes = encode(&conversation)?;
        match self.core.conversations.put_with_flags(
            wtxn,
            PutFlags::NO_OVERWRITE,
            &conversation.id,
            bytes.as_slice(),
        ) {
            Err(heed::Error::Mdb(heed::MdbError::KeyExist)) => {
                #[cfg(feature = "log_warn")]
                crate::log::macros::warn!(
                    kind = Conversation::KIND,
                    id = conversation.id,
                    "key already taken"
                );
                return Err(Error::DuplicateKey {
                    kind: Conversation::KIND,
                    id: conversation.id,
                })
            }
            other => other?,
        }

        for user in &conversation.participants {
            let index_key = pair_key(*user, conversation.id);
            self.core
                .user_conversations
                .put(wtxn, index_key.as_slice(), &())?;
        }
        Ok(conversation)
    }

    fn persisted(&self, conversation: &Conversation) {
        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.core.metrics {
            metrics
                .entities_persisted
                .with_label_values(&[Conversation::KIND])
                .inc();
        }

        #[cfg(feature = "log_debug")]
        crate::log::macros::debug!(
            id = conversation.id,
            participants = ?conversation.participants,
            "conversation created"
        );

        #[cfg(not(any(feature = "metrics", feature = "log_debug")))]
        let _ = conversation;
    }
}
