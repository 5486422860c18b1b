// This file is part of RadarStore.
//
// Copyright (C) 2025 Matheus Cardoso <varvedb@matheus.sbs>
//
// This Source Code Form is subject to the terms of the Mozilla Public License
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at http://mozilla.org/MPL/2.0/.

use radar_store::{Conversation, Message, Sequenced, Store};
use rstest::rstest;
use tempfile::tempdir;

#[test]
fn test_fresh_kind_counts_from_one() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let store = Store::new(dir.path())?;
    let allocator = store.allocator();

    assert_eq!(allocator.current("Message")?, None);

    let issued: Vec<u64> = (0..3)
        .map(|_| allocator.next("Message"))
        .collect::<Result<_, _>>()?;
    assert_eq!(issued, vec![1, 2, 3]);
    assert_eq!(allocator.current("Message")?, Some(3));

    Ok(())
}

#[test]
fn test_unpersisted_key_is_a_permanent_gap() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let store = Store::new(dir.path())?;
    let conversation = store.conversations().start(&[10, 20])?;
    let messages = store.messages();

    for i in 1..=6 {
        let message = messages.send(10, conversation.id, &format!("message {i}"))?;
        assert_eq!(message.id, i);
    }

    // Allocation succeeds, then the entity write never happens.
    let lost = store.allocate::<Message>()?;
    assert_eq!(lost.id(), 7);
    drop(lost);

    let next = messages.send(20, conversation.id, "after the crash")?;
    assert_eq!(next.id, 8);
    assert_eq!(messages.get(7)?, None);

    let ids: Vec<u64> = messages.list(conversation.id)?.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 8]);

    Ok(())
}

#[rstest]
#[case(Message::KIND, Conversation::KIND)]
#[case("Job", "Application")]
fn test_kinds_are_independent(#[case] left: &str, #[case] right: &str) {
    let dir = tempdir().expect("Failed to create temp dir");
    let store = Store::new(dir.path()).expect("Failed to open store");
    let allocator = store.allocator();

    for expected in 1..=5 {
        assert_eq!(allocator.next(left).expect("next"), expected);
    }
    assert_eq!(allocator.next(right).expect("next"), 1);
    assert_eq!(allocator.next(left).expect("next"), 6);
    assert_eq!(allocator.next(right).expect("next"), 2);
}

#[test]
fn test_atomic_allocate_and_persist_leaves_no_gap() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let store = Store::new(dir.path())?;
    let allocator = store.allocator();

    // Committed together.
    {
        let mut wtxn = store.write_txn()?;
        assert_eq!(allocator.next_in(&mut wtxn, "Invoice")?, 1);
        wtxn.commit()?;
    }
    // Rolled back together.
    {
        let mut wtxn = store.write_txn()?;
        assert_eq!(allocator.next_in(&mut wtxn, "Invoice")?, 2);
    }

    assert_eq!(allocator.current("Invoice")?, Some(1));
    assert_eq!(allocator.next("Invoice")?, 2);

    Ok(())
}

#[test]
fn test_counters_lists_every_kind() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let store = Store::new(dir.path())?;

    let conversation = store.conversations().start(&[1, 2])?;
    store.messages().send(1, conversation.id, "ping")?;
    store.messages().send(2, conversation.id, "pong")?;
    store.allocator().next_batch("Job", 10)?;

    assert_eq!(
        store.allocator().counters()?,
        vec![
            ("Conversation".to_string(), 1),
            ("Job".to_string(), 10),
            ("Message".to_string(), 2),
        ]
    );

    Ok(())
}
