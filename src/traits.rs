// This file is part of RadarStore.
//
// Copyright (C) 2025 Matheus Cardoso <varvedb@matheus.sbs>
//
// This Source Code Form is subject to the terms of the Mozilla Public License
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at http://mozilla.org/MPL/2.0/.

/// An entity whose primary key is issued by the sequence allocator.
///
/// `KIND` names the counter record the keys come from. It must stay stable
/// for the lifetime of the data: renaming a kind starts a fresh counter and
/// the old one is orphaned.
pub trait Sequenced {
    /// Counter name shared by every entity of this type.
    const KIND: &'static str;

    /// The allocated primary key.
    fn id(&self) -> u64;
}
