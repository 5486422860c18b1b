// This file is part of RadarStore.
//
// Copyright (C) 2025 Matheus Cardoso <varvedb@matheus.sbs>
//
// This Source Code Form is subject to the terms of the Mozilla Public License
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at http://mozilla.org/MPL/2.0/.

use heed::byteorder::BigEndian;
use heed::types::{Bytes, Str, Unit, U64};
use heed::Database;

pub type EntityKey = U64<BigEndian>;

/// Kind name -> last issued value.
pub type CountersDb = Database<Str, EntityKey>;
/// Entity ID -> rkyv archive.
pub type EntitiesDb = Database<EntityKey, Bytes>;
/// Composite `(u64, u64)` big-endian key with no payload.
pub type IndexDb = Database<Bytes, Unit>;

/// Builds a composite index key that sorts by `(major, minor)` numerically.
pub fn pair_key(major: u64, minor: u64) -> [u8; 16] {
    let mut buf = [0u8; 16];
    buf[0..8].copy_from_slice(&major.to_be_bytes());
    buf[8..16].copy_from_slice(&minor.to_be_bytes());
    buf
}

/// Splits a composite key built by [`pair_key`]. Returns `None` on a malformed key.
pub fn split_pair_key(key: &[u8]) -> Option<(u64, u64)> {
    if key.len() != 16 {
        return None;
    }
    let major = u64::from_be_bytes(key[0..8].try_into().ok()?);
    let minor = u64::from_be_bytes(key[8..16].try_into().ok()?);
    Some((major, minor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_key_sorts_numerically() {
        let a = pair_key(1, 255);
        let b = pair_key(1, 256);
        let c = pair_key(2, 0);
        assert!(a < b);
        assert!(b < c);
        assert_eq!(split_pair_key(&b), Some((1, 256)));
    }

    #[test]
    fn test_split_rejects_short_keys() {
        assert_eq!(split_pair_key(&[0u8; 8]), None);
    }
}
