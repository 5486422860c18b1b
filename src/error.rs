// This file is part of RadarStore.
//
// Copyright (C) 2025 Matheus Cardoso <varvedb@matheus.sbs>
//
// This Source Code Form is subject to the terms of the Mozilla Public License
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Custom error type for RadarStore operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error occurred (e.g., file system issues).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// LMDB storage error (via `heed`).
    #[error("LMDB error: {0}")]
    Heed(#[from] heed::Error),

    /// Entity (de)serialization failed.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Kind name rejected before touching the counter.
    #[error("Invalid sequence kind {kind:?}: {reason}")]
    InvalidKind { kind: String, reason: &'static str },

    /// Batch reservations need at least one value.
    #[error("Invalid batch size for kind {kind:?}: {count}")]
    InvalidBatch { kind: String, count: u64 },

    /// The counter cannot be incremented without overflowing.
    #[error("Sequence exhausted for kind {kind:?} at {seq}")]
    SequenceExhausted { kind: String, seq: u64 },

    /// An entity is already stored under this key.
    #[error("Duplicate key {id} for kind {kind}")]
    DuplicateKey { kind: &'static str, id: u64 },

    /// Entity lookup failed.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: u64 },

    /// The user may not act on this entity.
    #[error("User {user} is not allowed to access {kind} {id}")]
    NotAuthorized {
        kind: &'static str,
        id: u64,
        user: u64,
    },

    /// Input rejected before any write.
    #[error("Validation failed: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether the failure came from the backing store rather than the request.
    ///
    /// A transient error means no key may be fabricated; the caller can retry
    /// the whole creation, which allocates a fresh key. A full map is not
    /// transient: retries keep failing until the store is reopened with a
    /// larger `map_size`.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::Heed(heed::Error::Mdb(
                heed::MdbError::KeyExist | heed::MdbError::MapFull,
            )) => false,
            Self::Heed(_) => true,
            _ => false,
        }
    }
}

impl From<rkyv::rancor::Error> for Error {
    fn from(e: rkyv::rancor::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
