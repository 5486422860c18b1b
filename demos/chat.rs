// This file is part of RadarStore.
//
// Copyright (C) 2025 Matheus Cardoso <varvedb@matheus.sbs>
//
// This Source Code Form is subject to the terms of the Mozilla Public License
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at http://mozilla.org/MPL/2.0/.

use radar_store::{Message, Sequenced, Store};
use tempfile::tempdir;

const RECRUITER: u64 = 1;
const CANDIDATE: u64 = 2;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let store = Store::new(dir.path())?;

    let conversation = store.conversations().start(&[RECRUITER, CANDIDATE])?;
    println!("Conversation #{} started", conversation.id);

    let messages = store.messages();
    messages.send(RECRUITER, conversation.id, "Hi! Are you open to a backend role?")?;
    messages.send(CANDIDATE, conversation.id, "Yes, happy to chat.")?;
    let typo = messages.send(RECRUITER, conversation.id, "Does Thrusday work?")?;
    messages.delete(typo.id, RECRUITER)?;
    messages.send(RECRUITER, conversation.id, "Does Thursday work?")?;

    for message in messages.list(conversation.id)? {
        println!("#{} [{}] {}", message.id, message.sender, message.text);
    }

    // Message 3 was deleted; its ID is never reused.
    println!(
        "Last issued {} id: {:?}",
        Message::KIND,
        store.allocator().current(Message::KIND)?
    );
    Ok(())
}
