// This file is part of RadarStore.
//
// Copyright (C) 2025 Matheus Cardoso <varvedb@matheus.sbs>
//
// This Source Code Form is subject to the terms of the Mozilla Public License
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at http://mozilla.org/MPL/2.0/.

pub const COUNTERS_DB_NAME: &str = "counters";
pub const CONVERSATIONS_DB_NAME: &str = "conversations";
pub const MESSAGES_DB_NAME: &str = "messages";
pub const CONVERSATION_MESSAGES_DB_NAME: &str = "conversation_messages";
pub const USER_CONVERSATIONS_DB_NAME: &str = "user_conversations";

/// Number of named databases the store creates on open.
pub const REQUIRED_DBS: u32 = 5;

pub const DEFAULT_MAP_SIZE: usize = 10 * 1024 * 1024; // 10 MB
pub const DEFAULT_MAX_DBS: u32 = 8;

/// LMDB rejects keys longer than this (default `MDB_MAXKEYSIZE`).
pub const MAX_KIND_LEN: usize = 511;
