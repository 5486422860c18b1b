// This file is part of RadarStore.
//
// Copyright (C) 2025 Matheus Cardoso <varvedb@matheus.sbs>
//
// This Source Code Form is subject to the terms of the Mozilla Public License
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at http://mozilla.org/MPL/2.0/.

//! Atomic per-kind sequence allocation.
//!
//! Each kind owns one counter record in the `counters` database holding the
//! last value issued. Allocation reads, increments and writes that record
//! inside a single LMDB write transaction. LMDB admits one writer at a time,
//! so no two callers can ever observe the same pre-increment value, across
//! threads or processes sharing the environment.
//!
//! Values are unique and issued in increasing order per kind. They are not
//! guaranteed to be contiguous once attached to entities: a key obtained and
//! then never persisted is a permanent gap.

use std::fmt;
use std::marker::PhantomData;
use std::ops::RangeInclusive;
use std::sync::Arc;

use heed::RwTxn;

use crate::constants::MAX_KIND_LEN;
use crate::error::{Error, Result};
use crate::storage::StoreCore;
use crate::timed_dbg;
use crate::traits::Sequenced;

/// Hands out strictly increasing integers per named kind.
///
/// Obtain one through [`Store::allocator`](crate::storage::Store::allocator).
/// Cheap to clone and safe to share across threads.
#[derive(Clone)]
pub struct SequenceAllocator {
    core: Arc<StoreCore>,
}

/// A key reserved for an entity of type `T` that has not been persisted yet.
///
/// Only the allocator can create one, so an entity cannot be stored under a
/// key that was never issued. The token is consumed on persistence.
#[must_use = "dropping an allocated key leaves a gap in the sequence"]
pub struct Allocated<T> {
    id: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Allocated<T> {
    pub(crate) fn new(id: u64) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl<T: Sequenced> fmt::Debug for Allocated<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Allocated")
            .field("kind", &T::KIND)
            .field("id", &self.id)
            .finish()
    }
}

fn validate_kind(kind: &str) -> Result<()> {
    if kind.is_empty() {
        return Err(Error::InvalidKind {
            kind: kind.to_string(),
            reason: "kind must not be empty",
        });
    }
    if kind.len() > MAX_KIND_LEN {
        return Err(Error::InvalidKind {
            kind: kind.to_string(),
            reason: "kind exceeds the maximum key size",
        });
    }
    Ok(())
}

impl SequenceAllocator {
    pub(crate) fn new(core: Arc<StoreCore>) -> Self {
        Self { core }
    }

    /// Returns the next value for `kind`, creating its counter at 0 first if absent.
    ///
    /// The first call for a fresh kind returns `1`. Runs in its own write
    /// transaction and commits before returning, so the value is never issued
    /// again even if the caller fails to use it.
    pub fn next(&self, kind: &str) -> Result<u64> {
        #[cfg(feature = "metrics")]
        let _timer = self
            .core
            .metrics
            .as_ref()
            .map(|m| m.allocate_latency.start_timer());

        let mut wtxn = self.core.env.write_txn()?;
        let seq = self.next_in(&mut wtxn, kind)?;
        timed_dbg!("allocate_commit", wtxn.commit()).inspect_err(|_e| {
            #[cfg(feature = "log_error")]
            crate::log::macros::error!(
                kind,
                seq,
                error = %_e,
                "allocation commit failed"
            );
        })?;
        self.record(kind, 1);

        #[cfg(feature = "log_debug")]
        crate::log::macros::debug!(kind, seq, "sequence allocated");

        Ok(seq)
    }

    /// Same as [`next`](Self::next) but inside a caller-owned write transaction.
    ///
    /// Nothing is durable until the caller commits; aborting the transaction
    /// returns the value to the counter. Use this to allocate and persist an
    /// entity atomically.
    pub fn next_in(&self, wtxn: &mut RwTxn<'_>, kind: &str) -> Result<u64> {
        let range = self.increment(wtxn, kind, 1)?;
        Ok(*range.end())
    }

    /// Reserves `count` consecutive values for `kind` in one transaction.
    pub fn next_batch(&self, kind: &str, count: u64) -> Result<RangeInclusive<u64>> {
        if count == 0 {
            return Err(Error::InvalidBatch {
                kind: kind.to_string(),
                count,
            });
        }

        let mut wtxn = self.core.env.write_txn()?;
        let range = self.increment(&mut wtxn, kind, count)?;
        timed_dbg!(format!("batch_commit({count})"), wtxn.commit())?;
        self.record(kind, count);

        #[cfg(feature = "log_debug")]
        crate::log::macros::debug!(
            kind,
            first = *range.start(),
            last = *range.end(),
            "sequence batch allocated"
        );

        Ok(range)
    }

    /// Reserves a key for an entity of type `T`.
    pub fn allocate<T: Sequenced>(&self) -> Result<Allocated<T>> {
        self.next(T::KIND).map(Allocated::new)
    }

    /// Same as [`allocate`](Self::allocate) inside a caller-owned write transaction.
    pub fn allocate_in<T: Sequenced>(&self, wtxn: &mut RwTxn<'_>) -> Result<Allocated<T>> {
        self.next_in(wtxn, T::KIND).map(Allocated::new)
    }

    /// Last value issued for `kind`, or `None` if nothing was ever allocated.
    pub fn current(&self, kind: &str) -> Result<Option<u64>> {
        validate_kind(kind)?;
        let rtxn = self.core.env.read_txn()?;
        Ok(self.core.counters.get(&rtxn, kind)?)
    }

    /// Every counter record as `(kind, last issued value)`, ordered by kind.
    pub fn counters(&self) -> Result<Vec<(String, u64)>> {
        let rtxn = self.core.env.read_txn()?;
        let mut out = Vec::new();
        for entry in self.core.counters.iter(&rtxn)? {
            let (kind, seq) = entry?;
            out.push((kind.to_string(), seq));
        }
        Ok(out)
    }

    /// Accounts for `count` values of `kind` that were committed.
    pub(crate) fn record(&self, kind: &str, count: u64) {
        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.core.metrics {
            metrics.allocations.with_label_values(&[kind]).inc_by(count);
        }

        #[cfg(not(feature = "metrics"))]
        let _ = (kind, count);
    }

    /// The only place the counter record is ever written.
    fn increment(
        &self,
        wtxn: &mut RwTxn<'_>,
        kind: &str,
        count: u64,
    ) -> Result<RangeInclusive<u64>> {
        validate_kind(kind)?;

        let last = self.core.counters.get(&*wtxn, kind)?.unwrap_or(0);
        let seq = last
            .checked_add(count)
            .ok_or_else(|| {
                #[cfg(feature = "log_warn")]
                crate::log::macros::warn!(kind, seq = last, count, "sequence exhausted");
                Error::SequenceExhausted {
                    kind: kind.to_string(),
                    seq: last,
                }
            })?;

        self.core.counters.put(wtxn, kind, &seq)?;
        Ok(last + 1..=seq)
    }
}
