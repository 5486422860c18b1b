// This file is part of RadarStore.
//
// Copyright (C) 2025 Matheus Cardoso <varvedb@matheus.sbs>
//
// This Source Code Form is subject to the terms of the Mozilla Public License
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at http://mozilla.org/MPL/2.0/.

//! Embedded LMDB storage for chat entities keyed by atomic per-kind sequences.
//!
//! ```no_run
//! use radar_store::Store;
//!
//! # fn main() -> radar_store::Result<()> {
//! let store = Store::new("radar.mdb")?;
//! let conversation = store.conversations().start(&[1, 2])?;
//! let message = store.messages().send(1, conversation.id, "Hello!")?;
//! assert_eq!(store.allocator().current("Message")?, Some(message.id));
//! # Ok(())
//! # }
//! ```

mod utils;

pub mod constants;
pub mod conversation;
pub mod error;
pub mod log;
pub mod message;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod model;
pub mod sequence;
pub mod storage;
pub mod traits;
pub mod types;

pub use conversation::Conversations;
pub use error::{Error, Result};
pub use message::Messages;
pub use model::{Conversation, Message};
pub use sequence::{Allocated, SequenceAllocator};
pub use storage::{Store, StoreConfig};
pub use traits::Sequenced;
