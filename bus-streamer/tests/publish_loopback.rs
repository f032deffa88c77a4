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

use async_trait::async_trait;
use bus_streamer::{
    BusError, BusTransport, CallContext, Code, Event, EventKind, EventSink, PublishRequest,
    StreamerConfig, SubscribeRequest,
};
use integration_test_utils::{FailingBus, RecordingSink, SilentBus, SimulatedBusSegment};
use std::sync::Arc;
use std::time::Duration;
use support::{
    make_streamer, make_streamer_with, publish_request, topic, wait_for_sniffers,
    wait_for_subscribers, WAIT,
};

struct StuckBus;

#[async_trait]
impl BusTransport for StuckBus {
    async fn send(&self, _event: &Event) -> Result<(), BusError> {
        std::future::pending().await
    }

    async fn receive(&self) -> Result<Event, BusError> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn published_event_reaches_bus_and_local_subscriber_once() {
    let segment = SimulatedBusSegment::new(16);
    let device = segment.connect();
    let streamer = make_streamer(Arc::new(segment.connect()));
    let recorder = RecordingSink::new("client-a");
    let ctx = CallContext::new();

    let subscription = tokio::spawn({
        let streamer = streamer.clone();
        let sink: Arc<dyn EventSink> = recorder.clone();
        let ctx = ctx.clone();
        async move {
            streamer
                .subscribe(
                    SubscribeRequest::topics(["1/2/3"], EventKind::Unspecified),
                    sink,
                    ctx,
                )
                .await
        }
    });
    wait_for_subscribers(&streamer, topic("1/2/3"), 1).await;

    streamer
        .publish(publish_request("1/2/3", EventKind::Write, &[0x01]))
        .await
        .expect("publish should succeed");

    assert!(recorder.wait_for(1, WAIT).await);
    let messages = recorder.messages().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].topic, "1/2/3");
    assert_eq!(messages[0].kind, EventKind::Write);
    assert_eq!(messages[0].payload, vec![0x01]);
    assert_eq!(messages[0].origin_address, None);

    let on_the_wire = device.receive().await.expect("device should see the frame");
    assert_eq!(on_the_wire.destination, topic("1/2/3"));
    assert_eq!(on_the_wire.payload, vec![0x01]);

    ctx.cancel();
    subscription.await.unwrap().expect("cancelled call ends cleanly");
    assert_eq!(streamer.registry().topic_count().await, 0);

    // No second copy shows up after the call ended.
    assert_eq!(recorder.messages().await.len(), 1);
}

#[tokio::test]
async fn sniffer_kind_filter_applies_to_published_events() {
    let streamer = make_streamer(Arc::new(SilentBus));
    let recorder = RecordingSink::new("sniffer");
    let ctx = CallContext::new();

    let subscription = tokio::spawn({
        let streamer = streamer.clone();
        let sink: Arc<dyn EventSink> = recorder.clone();
        let ctx = ctx.clone();
        async move {
            streamer
                .subscribe(SubscribeRequest::sniffer(EventKind::Response), sink, ctx)
                .await
        }
    });
    wait_for_sniffers(&streamer, 1).await;

    streamer
        .publish(publish_request("4/5/6", EventKind::Write, &[0x00]))
        .await
        .unwrap();
    streamer
        .publish(publish_request("4/5/6", EventKind::Response, &[0x2a]))
        .await
        .unwrap();

    assert!(recorder.wait_for(1, WAIT).await);
    let messages = recorder.messages().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].kind, EventKind::Response);
    assert_eq!(messages[0].payload, vec![0x2a]);

    ctx.cancel();
    subscription.await.unwrap().unwrap();
}

#[tokio::test]
async fn publish_with_origin_carries_it_to_subscribers() {
    let streamer = make_streamer(Arc::new(SilentBus));
    let mut stream = streamer.open_stream(
        SubscribeRequest::topics(["1/2/3"], EventKind::Unspecified),
        CallContext::new(),
    );
    wait_for_subscribers(&streamer, topic("1/2/3"), 1).await;

    streamer
        .publish(PublishRequest {
            origin_address: "1.1.5".to_string(),
            ..publish_request("1/2/3", EventKind::Unspecified, &[0x01])
        })
        .await
        .unwrap();

    let message = stream.recv().await.unwrap();
    assert_eq!(message.origin_address.as_deref(), Some("1.1.5"));
    assert_eq!(message.kind, EventKind::Write);
    stream.finish().await.unwrap();
}

#[tokio::test]
async fn malformed_publish_requests_are_invalid_arguments() {
    let streamer = make_streamer(Arc::new(SilentBus));

    let bad_topic = streamer
        .publish(publish_request("32/0/0", EventKind::Write, &[]))
        .await
        .unwrap_err();
    assert_eq!(bad_topic.code(), Code::InvalidArgument);
    assert!(bad_topic.message().starts_with("parse topic: "));

    let bad_origin = streamer
        .publish(PublishRequest {
            origin_address: "1.1".to_string(),
            ..publish_request("1/2/3", EventKind::Write, &[])
        })
        .await
        .unwrap_err();
    assert_eq!(bad_origin.code(), Code::InvalidArgument);
    assert!(bad_origin.message().starts_with("parse origin address: "));
}

#[tokio::test]
async fn failed_bus_send_is_internal_and_skips_dispatch() {
    let streamer = make_streamer(Arc::new(FailingBus::new("gateway unreachable")));
    let recorder = RecordingSink::new("client-a");
    let ctx = CallContext::new();

    let subscription = tokio::spawn({
        let streamer = streamer.clone();
        let sink: Arc<dyn EventSink> = recorder.clone();
        let ctx = ctx.clone();
        async move {
            streamer
                .subscribe(SubscribeRequest::sniffer(EventKind::Unspecified), sink, ctx)
                .await
        }
    });
    wait_for_sniffers(&streamer, 1).await;

    let status = streamer
        .publish(publish_request("1/2/3", EventKind::Write, &[0x01]))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::Internal);
    assert!(status.message().contains("gateway unreachable"));
    assert!(recorder.messages().await.is_empty());

    ctx.cancel();
    subscription.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn stuck_bus_send_times_out() {
    let mut config = StreamerConfig::default();
    config.bus.send_timeout = Duration::from_millis(250);
    let streamer = make_streamer_with(config, Arc::new(StuckBus));

    let status = streamer
        .publish(publish_request("1/2/3", EventKind::Write, &[0x01]))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::Internal);
    assert!(status.message().contains("timed out after 250ms"));
}
