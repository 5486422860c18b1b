// This file is part of RadarStore.
//
// Copyright (C) 2025 Matheus Cardoso <varvedb@matheus.sbs>
//
// This Source Code Form is subject to the terms of the Mozilla Public License
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at http://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use heed::{PutFlags, RoTxn};

use crate::conversation::Conversations;
use crate::error::{Error, Result};
use crate::model::{decode, encode, now_millis, Conversation, Message};
use crate::sequence::{Allocated, SequenceAllocator};
use crate::storage::StoreCore;
use crate::traits::Sequenced;
use crate::types::{pair_key, split_pair_key};

/// View over the messages of a [`Store`](crate::storage::Store).
#[derive(Clone)]
pub struct Messages {
    core: Arc<StoreCore>,
    conversations: Conversations,
}

fn normalize_text(text: &str) -> Result<&str> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::Validation("message text is required".into()));
    }
    Ok(text)
}

impl Messages {
    pub(crate) fn new(core: Arc<StoreCore>) -> Self {
        let conversations = Conversations::new(Arc::clone(&core));
        Self {
            core,
            conversations,
        }
    }

    /// Sends `text` from `sender` into `conversation`.
    ///
    /// The request is checked before a key is allocated, so rejected sends do
    /// not consume sequence values.
    pub fn send(&self, sender: u64, conversation: u64, text: &str) -> Result<Message> {
        let text = normalize_text(text)?;

        {
            let rtxn = self.core.env.read_txn()?;
            self.check_sender(&rtxn, sender, conversation)?;
        }

        let key = SequenceAllocator::new(Arc::clone(&self.core)).allocate::<Message>()?;
        self.persist_with_key(key, sender, conversation, text)
    }

    /// Stores a message under an allocated key and moves the conversation's
    /// `last_message` forward, in one write transaction.
    pub fn persist_with_key(
        &self,
        key: Allocated<Message>,
        sender: u64,
        conversation: u64,
        text: &str,
    ) -> Result<Message> {
        let text = normalize_text(text)?;

        let mut wtxn = self.core.env.write_txn()?;
        let mut parent = self.check_sender(&wtxn, sender, conversation)?;

        let now = now_millis();
        let message = Message {
            id: key.id(),
            sender,
            conversation,
            text: text.to_string(),
            created_at: now,
            updated_at: now,
        };

        let bytes = encode(&message)?;
        match self.core.messages.put_with_flags(
            &mut wtxn,
            PutFlags::NO_OVERWRITE,
            &message.id,
            bytes.as_slice(),
        ) {
            Err(heed::Error::Mdb(heed::MdbError::KeyExist)) => {
                #[cfg(feature = "log_warn")]
                crate::log::macros::warn!(
                    kind = Message::KIND,
                    id = message.id,
                    "key already taken"
                );
                return Err(Error::DuplicateKey {
                    kind: Message::KIND,
                    id: message.id,
                })
            }
            other => other?,
        }

        let index_key = pair_key(conversation, message.id);
        self.core
            .conversation_messages
            .put(&mut wtxn, index_key.as_slice(), &())?;

        // Keys may become visible out of order; keep the highest one.
        if parent.last_message.map_or(true, |last| message.id > last) {
            parent.last_message = Some(message.id);
        }
        parent.updated_at = now;
        self.conversations.save_in(&mut wtxn, &parent)?;

        wtxn.commit()?;

        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.core.metrics {
            metrics
                .entities_persisted
                .with_label_values(&[Message::KIND])
                .inc();
        }

        #[cfg(feature = "log_debug")]
        crate::log::macros::debug!(id = message.id, conversation, sender, "message sent");

        Ok(message)
    }

    pub fn get(&self, id: u64) -> Result<Option<Message>> {
        let rtxn = self.core.env.read_txn()?;
        self.load(&rtxn, id)
    }

    /// Messages of `conversation`, oldest first. Unknown conversations yield an empty list.
    pub fn list(&self, conversation: u64) -> Result<Vec<Message>> {
        let rtxn = self.core.env.read_txn()?;
        let prefix = conversation.to_be_bytes();

        let mut out = Vec::new();
        for entry in self
            .core
            .conversation_messages
            .prefix_iter(&rtxn, prefix.as_slice())?
        {
            let (key, ()) = entry?;
            let Some((_, message_id)) = split_pair_key(key) else {
                continue;
            };
            if let Some(message) = self.load(&rtxn, message_id)? {
                out.push(message);
            }
        }
        Ok(out)
    }

    /// Deletes a message on behalf of its sender and returns it.
    ///
    /// A message that does not exist and one sent by someone else are both
    /// reported as `NotFound`.
    pub fn delete(&self, id: u64, requester: u64) -> Result<Message> {
        let mut wtxn = self.core.env.write_txn()?;

        let message = self
            .load(&wtxn, id)?
            .filter(|m| m.sender == requester)
            .ok_or(Error::NotFound {
                kind: Message::KIND,
                id,
            })?;

        self.core.messages.delete(&mut wtxn, &id)?;
        let index_key = pair_key(message.conversation, id);
        self.core
            .conversation_messages
            .delete(&mut wtxn, index_key.as_slice())?;

        if let Some(mut parent) = self.conversations.load(&wtxn, message.conversation)? {
            if parent.last_message == Some(id) {
                parent.last_message = self.latest_in(&wtxn, parent.id)?;
            }
            parent.updated_at = now_millis();
            self.conversations.save_in(&mut wtxn, &parent)?;
        }

        wtxn.commit()?;

        #[cfg(feature = "log_debug")]
        crate::log::macros::debug!(id, requester, "message deleted");

        Ok(message)
    }

    fn load(&self, txn: &RoTxn<'_>, id: u64) -> Result<Option<Message>> {
        self.core
            .messages
            .get(txn, &id)?
            .map(decode::<Message>)
            .transpose()
    }

    fn latest_in(&self, txn: &RoTxn<'_>, conversation: u64) -> Result<Option<u64>> {
        let prefix = conversation.to_be_bytes();
        let mut iter = self
            .core
            .conversation_messages
            .rev_prefix_iter(txn, prefix.as_slice())?;
        match iter.next().transpose()? {
            Some((key, ())) => Ok(split_pair_key(key).map(|(_, message_id)| message_id)),
            None => Ok(None),
        }
    }

    fn check_sender(
        &self,
        txn: &RoTxn<'_>,
        sender: u64,
        conversation: u64,
    ) -> Result<Conversation> {
        let parent = self
            .conversations
            .load(txn, conversation)?
            .ok_or(Error::NotFound {
                kind: Conversation::KIND,
                id: conversation,
            })?;
        if parent.participants.binary_search(&sender).is_err() {
            return Err(Error::NotAuthorized {
                kind: Conversation::KIND,
                id: conversation,
                user: sender,
            });
        }
        Ok(parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Store;
    use tempfile::tempdir;

    fn open_with_pair() -> (Store, Conversation, tempfile::TempDir) {
        let dir = tempdir().expect("Failed to create temp dir");
        let store = Store::new(dir.path()).expect("Failed to open store");
        let conversation = store.conversations().start(&[1, 2]).expect("start");
        (store, conversation, dir)
    }

    #[test]
    fn test_send_assigns_sequential_ids_and_updates_conversation() {
        let (store, conversation, _dir) = open_with_pair();
        let messages = store.messages();

        let first = messages.send(1, conversation.id, "  hello  ").expect("send");
        let second = messages.send(2, conversation.id, "hi!").expect("send");

        assert_eq!(first.id, 1);
        assert_eq!(first.text, "hello");
        assert_eq!(second.id, 2);

        let parent = store
            .conversations()
            .get(conversation.id)
            .expect("get")
            .expect("conversation exists");
        assert_eq!(parent.last_message, Some(2));
        assert!(parent.updated_at >= conversation.updated_at);

        let listed = messages.list(conversation.id).expect("list");
        assert_eq!(listed, vec![first, second]);
    }

    #[test]
    fn test_rejected_sends_do_not_consume_ids() {
        let (store, conversation, _dir) = open_with_pair();
        let messages = store.messages();

        assert!(matches!(
            messages.send(1, conversation.id, "   "),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            messages.send(3, conversation.id, "let me in"),
            Err(Error::NotAuthorized { user: 3, .. })
        ));
        assert!(matches!(
            messages.send(1, 404, "anyone?"),
            Err(Error::NotFound { id: 404, .. })
        ));

        assert_eq!(
            store.allocator().current(Message::KIND).expect("current"),
            None
        );
    }

    #[test]
    fn test_only_sender_can_delete() {
        let (store, conversation, _dir) = open_with_pair();
        let messages = store.messages();

        let message = messages.send(1, conversation.id, "oops").expect("send");

        assert!(matches!(
            messages.delete(message.id, 2),
            Err(Error::NotFound { .. })
        ));
        assert_eq!(messages.delete(message.id, 1).expect("delete"), message);
        assert_eq!(messages.get(message.id).expect("get"), None);
        assert!(matches!(
            messages.delete(message.id, 1),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_deleting_last_message_rewinds_pointer() {
        let (store, conversation, _dir) = open_with_pair();
        let messages = store.messages();
        let conversations = store.conversations();

        let first = messages.send(1, conversation.id, "one").expect("send");
        let second = messages.send(2, conversation.id, "two").expect("send");

        messages.delete(second.id, 2).expect("delete");
        let parent = conversations
            .get(conversation.id)
            .expect("get")
            .expect("conversation exists");
        assert_eq!(parent.last_message, Some(first.id));

        messages.delete(first.id, 1).expect("delete");
        let parent = conversations
            .get(conversation.id)
            .expect("get")
            .expect("conversation exists");
        assert_eq!(parent.last_message, None);

        // Deleted IDs are never reissued.
        let third = messages.send(1, conversation.id, "three").expect("send");
        assert_eq!(third.id, 3);
    }

    #[test]
    fn test_messages_are_scoped_to_their_conversation() {
        let (store, conversation, _dir) = open_with_pair();
        let other = store.conversations().start(&[2, 3]).expect("start");
        let messages = store.messages();

        messages.send(1, conversation.id, "first room").expect("send");
        messages.send(3, other.id, "second room").expect("send");

        let listed = messages.list(other.id).expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].text, "second room");
        assert!(messages.list(999).expect("list").is_empty());
    }

    #[test]
    fn test_two_step_persist_with_key() {
        let (store, conversation, _dir) = open_with_pair();
        let messages = store.messages();

        let key = store.allocate::<Message>().expect("allocate");
        let message = messages
            .persist_with_key(key, 2, conversation.id, "explicit")
            .expect("persist");
        assert_eq!(message.id, 1);

        // A failed persist keeps its key out of circulation.
        let rejected = store.allocate::<Message>().expect("allocate");
        assert!(matches!(
            messages.persist_with_key(rejected, 9, conversation.id, "intruder"),
            Err(Error::NotAuthorized { user: 9, .. })
        ));
        assert_eq!(messages.send(1, conversation.id, "next").expect("send").id, 3);
        assert_eq!(messages.list(conversation.id).expect("list").len(), 2);
    }
}
