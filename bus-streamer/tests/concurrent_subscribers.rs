/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

mod support;

use bus_streamer::{
    CallContext, Command, Event, EventKind, EventSink, SubscribeRequest, Subscriber,
    SubscriberRegistry, Topic,
};
use futures::future::join_all;
use integration_test_utils::{BlockingSink, FailingSink, RecordingSink, SilentBus};
use std::sync::Arc;
use std::time::Duration;
use support::{make_streamer, publish_request, topic, wait_for_subscribers, WAIT};

#[tokio::test]
async fn remaining_subscriber_keeps_receiving_after_a_peer_leaves() {
    let streamer = make_streamer(Arc::new(SilentBus));
    let staying = RecordingSink::new("staying");
    let staying_ctx = CallContext::new();
    let leaving_ctx = CallContext::new();

    let staying_call = tokio::spawn({
        let streamer = streamer.clone();
        let sink: Arc<dyn EventSink> = staying.clone();
        let ctx = staying_ctx.clone();
        async move {
            streamer
                .subscribe(SubscribeRequest::topics(["1/2/3"], EventKind::Unspecified), sink, ctx)
                .await
        }
    });
    let leaving = RecordingSink::new("leaving");
    let leaving_call = tokio::spawn({
        let streamer = streamer.clone();
        let sink: Arc<dyn EventSink> = leaving.clone();
        let ctx = leaving_ctx.clone();
        async move {
            streamer
                .subscribe(SubscribeRequest::topics(["1/2/3"], EventKind::Unspecified), sink, ctx)
                .await
        }
    });
    wait_for_subscribers(&streamer, topic("1/2/3"), 2).await;

    leaving_ctx.cancel();
    leaving_call.await.unwrap().unwrap();
    assert_eq!(streamer.registry().subscriber_count(topic("1/2/3")).await, 1);

    streamer
        .publish(publish_request("1/2/3", EventKind::Write, &[0x07]))
        .await
        .unwrap();

    assert!(staying.wait_for(1, WAIT).await);
    assert!(leaving.messages().await.is_empty());

    staying_ctx.cancel();
    staying_call.await.unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_disjoint_registrations_stay_consistent() {
    let registry = Arc::new(SubscriberRegistry::new());
    let handles: Vec<_> = (0..64u16)
        .map(|index| {
            let sink: Arc<dyn EventSink> = RecordingSink::new(&format!("peer-{index}"));
            (Topic::from_raw(index), Subscriber::new(EventKind::Unspecified, sink))
        })
        .collect();

    join_all(handles.iter().map(|(topic, handle)| {
        let registry = registry.clone();
        let topic = *topic;
        let handle = handle.clone();
        tokio::spawn(async move { registry.add_by_topics(&[topic], &handle).await })
    }))
    .await;
    assert_eq!(registry.topic_count().await, 64);

    join_all(handles.iter().step_by(2).map(|(topic, handle)| {
        let registry = registry.clone();
        let topic = *topic;
        let handle = handle.clone();
        tokio::spawn(async move { registry.remove_by_topics(&[topic], &handle).await })
    }))
    .await;

    assert_eq!(registry.topic_count().await, 32);
    for (index, (topic, handle)) in handles.iter().enumerate() {
        assert_eq!(registry.contains(*topic, handle).await, index % 2 == 1);
    }
}

#[tokio::test]
async fn failing_sink_is_skipped_and_stays_registered() {
    let streamer = make_streamer(Arc::new(SilentBus));
    let failing = FailingSink::new("broken-peer");
    let healthy = RecordingSink::new("healthy-peer");
    let ctx = CallContext::new();

    let calls: Vec<_> = [
        failing.clone() as Arc<dyn EventSink>,
        healthy.clone() as Arc<dyn EventSink>,
    ]
    .into_iter()
    .map(|sink| {
        let streamer = streamer.clone();
        let ctx = ctx.clone();
        tokio::spawn(async move {
            streamer
                .subscribe(SubscribeRequest::topics(["2/0/1"], EventKind::Write), sink, ctx)
                .await
        })
    })
    .collect();
    wait_for_subscribers(&streamer, topic("2/0/1"), 2).await;

    for payload in [1u8, 2] {
        streamer
            .publish(publish_request("2/0/1", EventKind::Write, &[payload]))
            .await
            .unwrap();
    }

    assert!(healthy.wait_for(2, WAIT).await);
    assert_eq!(failing.attempts(), 2);
    assert_eq!(streamer.registry().subscriber_count(topic("2/0/1")).await, 2);

    ctx.cancel();
    for call in join_all(calls).await {
        call.unwrap().unwrap();
    }
}

#[tokio::test]
async fn slow_sink_stalls_the_rest_of_its_phase() {
    let streamer = make_streamer(Arc::new(SilentBus));
    let blocking = BlockingSink::new("slow-peer");
    let sniffer = RecordingSink::new("sniffer");
    let ctx = CallContext::new();

    let calls = vec![
        tokio::spawn({
            let streamer = streamer.clone();
            let sink: Arc<dyn EventSink> = blocking.clone();
            let ctx = ctx.clone();
            async move {
                streamer
                    .subscribe(SubscribeRequest::topics(["3/0/0"], EventKind::Unspecified), sink, ctx)
                    .await
            }
        }),
        tokio::spawn({
            let streamer = streamer.clone();
            let sink: Arc<dyn EventSink> = sniffer.clone();
            let ctx = ctx.clone();
            async move {
                streamer
                    .subscribe(SubscribeRequest::sniffer(EventKind::Unspecified), sink, ctx)
                    .await
            }
        }),
    ];
    wait_for_subscribers(&streamer, topic("3/0/0"), 1).await;
    support::wait_for_sniffers(&streamer, 1).await;

    let event = Event::new(topic("3/0/0"), Command::Write, vec![0x01]);
    let dispatch = tokio::spawn({
        let streamer = streamer.clone();
        async move { streamer.dispatch(&event).await }
    });

    tokio::time::timeout(WAIT, async {
        while blocking.waiting() == 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .unwrap();
    assert!(!sniffer.wait_for(1, Duration::from_millis(50)).await);

    blocking.release(1);
    let report = dispatch.await.unwrap();
    assert_eq!(report.delivered, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(sniffer.messages().await.len(), 1);

    ctx.cancel();
    for call in join_all(calls).await {
        call.unwrap().unwrap();
    }
}

#[tokio::test]
async fn dropped_stream_unregisters_without_finish() {
    let streamer = make_streamer(Arc::new(SilentBus));
    let shared_ctx = CallContext::new();

    let dropped = streamer.open_stream(
        SubscribeRequest::topics(["1/2/3"], EventKind::Unspecified),
        shared_ctx.clone(),
    );
    let mut kept = streamer.open_stream(
        SubscribeRequest::topics(["1/2/3"], EventKind::Unspecified),
        shared_ctx.clone(),
    );
    wait_for_subscribers(&streamer, topic("1/2/3"), 2).await;

    drop(dropped);
    wait_for_subscribers(&streamer, topic("1/2/3"), 1).await;
    assert!(!shared_ctx.is_cancelled());

    let report = streamer
        .dispatch(&Event::new(topic("1/2/3"), Command::Write, vec![0x05]))
        .await;
    assert_eq!(report.delivered, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(kept.recv().await.unwrap().payload, vec![0x05]);

    drop(kept);
    wait_for_subscribers(&streamer, topic("1/2/3"), 0).await;
    assert_eq!(streamer.registry().topic_count().await, 0);
}
