//! Ordering and lifecycle under concurrent writers and subscribers.

use blogcast::{
    BlogService, ChannelSink, MutationGateway, QueryGateway, Record, RecordId, RecordInput,
    RecordStore, SubscriptionConfig, TopicBus,
};
use crossbeam_channel::unbounded;
use proptest::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

const WRITERS: usize = 8;
const WRITES_PER_WRITER: usize = 250;

#[test]
fn test_concurrent_writers_get_unique_sequential_ids() {
    let service = Arc::new(BlogService::default());
    let barrier = Arc::new(Barrier::new(WRITERS));

    let handles: Vec<_> = (0..WRITERS)
        .map(|w| {
            let service = Arc::clone(&service);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut ids = Vec::new();
                for i in 0..WRITES_PER_WRITER {
                    let record = service
                        .add_new_blog(&format!("w{} #{}", w, i), &format!("writer-{}", w))
                        .unwrap();
                    ids.push(record.id);
                }
                ids
            })
        })
        .collect();

    let mut all_ids = Vec::new();
    for handle in handles {
        let ids = handle.join().unwrap();
        // Each writer observes its own ids increasing
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        all_ids.extend(ids);
    }

    all_ids.sort();
    let expected: Vec<RecordId> = (1..=(WRITERS * WRITES_PER_WRITER) as u64)
        .map(RecordId)
        .collect();
    assert_eq!(all_ids, expected);

    let stored: Vec<RecordId> = service.get_blogs().iter().map(|r| r.id).collect();
    assert_eq!(stored, expected);
}

#[test]
fn test_subscribers_see_concurrent_writes_in_id_order() {
    let service = Arc::new(BlogService::default());

    let mut receivers = Vec::new();
    for _ in 0..3 {
        let (tx, rx) = unbounded();
        service.new_blog(ChannelSink::new(tx)).unwrap();
        receivers.push(rx);
    }

    let handles: Vec<_> = (0..4)
        .map(|w| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                for i in 0..100 {
                    service
                        .add_new_blog(&format!("{}-{}", w, i), "writer")
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stored = service.get_blogs();
    for rx in &receivers {
        let mut received: Vec<Record> = Vec::new();
        while received.len() < stored.len() {
            received.push(rx.recv_timeout(Duration::from_secs(2)).unwrap());
        }
        assert_eq!(received, stored);
    }
}

#[test]
fn test_unsubscribe_during_publish_stops_delivery() {
    let bus: Arc<TopicBus<u64>> = Arc::new(TopicBus::with_config(SubscriptionConfig {
        buffer_size: 1_000_000,
    }));
    let subscription = bus.subscribe("ticks").unwrap();
    let stop = Arc::new(AtomicBool::new(false));

    let publisher = {
        let bus = Arc::clone(&bus);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let mut n = 0u64;
            // Stay under the buffer so the bus never drops the subscriber itself
            while !stop.load(Ordering::Relaxed) && n < 900_000 {
                bus.publish("ticks", n);
                n += 1;
            }
        })
    };

    thread::sleep(Duration::from_millis(5));
    assert!(bus.unsubscribe(subscription.id()));
    assert!(!subscription.is_live());

    // Nothing is dispatched after removal returns: the buffered count is
    // frozen and the sequence terminates.
    let buffered = subscription.receiver().len();
    thread::sleep(Duration::from_millis(20));
    assert_eq!(subscription.receiver().len(), buffered);

    stop.store(true, Ordering::Relaxed);
    publisher.join().unwrap();

    let values: Vec<u64> = subscription.collect();
    assert_eq!(values.len(), buffered);
    assert!(values.windows(2).all(|w| w[0] + 1 == w[1]));
}

#[test]
fn test_sessions_open_and_close_while_writing() {
    let service = Arc::new(BlogService::default());
    let stop = Arc::new(AtomicBool::new(false));

    let writer = {
        let service = Arc::clone(&service);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let mut count = 0;
            while !stop.load(Ordering::Relaxed) {
                service.add_new_blog("tick", "clock").unwrap();
                count += 1;
            }
            count
        })
    };

    for _ in 0..50 {
        let (tx, rx) = unbounded();
        let id = service.new_blog(ChannelSink::new(tx)).unwrap();
        thread::sleep(Duration::from_millis(1));
        let summary = service.disconnect(id).unwrap();

        // Everything the session counted reached the sink, in id order
        let received: Vec<Record> = rx.try_iter().collect();
        assert_eq!(received.len() as u64, summary.delivered);
        assert!(received.windows(2).all(|w| w[0].id.next() == w[1].id));
    }

    stop.store(true, Ordering::Relaxed);
    let written = writer.join().unwrap();
    assert_eq!(service.get_blogs().len(), written);
    assert_eq!(service.stats().subscribers, 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_ids_follow_insertion_order(
        inputs in prop::collection::vec(("[a-z]{0,8}", "[a-z]{0,4}"), 0..40)
    ) {
        let store = Arc::new(RecordStore::new());
        let bus = Arc::new(TopicBus::new());
        let mutations = MutationGateway::new(Arc::clone(&store), Arc::clone(&bus), "blogs");
        let queries = QueryGateway::new(Arc::clone(&store));
        let subscription = bus.subscribe("blogs").unwrap();

        let mut accepted = Vec::new();
        for (content, author) in &inputs {
            let valid = !content.is_empty() && !author.is_empty();
            match mutations.add_record(RecordInput::new(content.clone(), author.clone())) {
                Ok(record) => {
                    prop_assert!(valid);
                    accepted.push(record);
                }
                Err(_) => prop_assert!(!valid),
            }
        }

        let expected_ids: Vec<RecordId> = (1..=accepted.len() as u64).map(RecordId).collect();
        let ids: Vec<RecordId> = accepted.iter().map(|r| r.id).collect();
        prop_assert_eq!(ids, expected_ids);
        prop_assert_eq!(queries.get_all(), accepted.clone());

        let published: Vec<Record> = subscription.receiver().try_iter().collect();
        prop_assert_eq!(published, accepted);
    }
}
