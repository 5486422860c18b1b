// This file is part of RadarStore.
//
// Copyright (C) 2025 Matheus Cardoso <varvedb@matheus.sbs>
//
// This Source Code Form is subject to the terms of the Mozilla Public License
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at http://mozilla.org/MPL/2.0/.

use rkyv::{Archive, Deserialize, Serialize};

use crate::error::Result;
use crate::traits::Sequenced;

/// A chat between two or more users.
#[derive(Archive, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[rkyv(derive(Debug))]
pub struct Conversation {
    pub id: u64,
    /// Sorted, deduplicated user IDs.
    pub participants: Vec<u64>,
    /// ID of the newest message still stored in this conversation.
    pub last_message: Option<u64>,
    /// Unix milliseconds.
    pub created_at: u64,
    /// Unix milliseconds; bumped on every message sent or deleted.
    pub updated_at: u64,
}

impl Sequenced for Conversation {
    const KIND: &'static str = "Conversation";

    fn id(&self) -> u64 {
        self.id
    }
}

/// A single message inside a [`Conversation`].
#[derive(Archive, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[rkyv(derive(Debug))]
pub struct Message {
    pub id: u64,
    pub sender: u64,
    pub conversation: u64,
    pub text: String,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Sequenced for Message {
    const KIND: &'static str = "Message";

    fn id(&self) -> u64 {
        self.id
    }
}

/// Serializes an entity for storage.
pub(crate) fn encode<T>(value: &T) -> Result<rkyv::util::AlignedVec>
where
    T: for<'a> rkyv::Serialize<
        rkyv::api::high::HighSerializer<
            rkyv::util::AlignedVec,
            rkyv::ser::allocator::ArenaHandle<'a>,
            rkyv::rancor::Error,
        >,
    >,
{
    Ok(rkyv::to_bytes::<rkyv::rancor::Error>(value)?)
}

/// Validates and deserializes stored bytes.
///
/// LMDB hands out pages with no alignment guarantee, so the bytes are copied
/// into an aligned buffer before access.
pub(crate) fn decode<T>(bytes: &[u8]) -> Result<T>
where
    T: Archive,
    T::Archived: for<'a> rkyv::bytecheck::CheckBytes<
            rkyv::api::high::HighValidator<'a, rkyv::rancor::Error>,
        > + rkyv::Deserialize<T, rkyv::api::high::HighDeserializer<rkyv::rancor::Error>>,
{
    let mut aligned = rkyv::util::AlignedVec::<16>::new();
    aligned.extend_from_slice(bytes);
    Ok(rkyv::from_bytes::<T, rkyv::rancor::Error>(&aligned)?)
}

/// Current wall-clock time in Unix milliseconds (0 if the clock is before the epoch).
pub(crate) fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}
