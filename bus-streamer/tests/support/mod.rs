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

#![allow(dead_code)]

use bus_streamer::{
    BusStreamer, BusTransport, EventKind, PublishRequest, StreamerConfig, Topic,
};
use std::sync::Arc;
use std::time::Duration;

pub(crate) const WAIT: Duration = Duration::from_secs(2);

pub(crate) fn make_streamer(bus: Arc<dyn BusTransport>) -> BusStreamer {
    make_streamer_with(StreamerConfig::default(), bus)
}

pub(crate) fn make_streamer_with(config: StreamerConfig, bus: Arc<dyn BusTransport>) -> BusStreamer {
    integration_test_utils::init_logging();
    BusStreamer::new(config, bus).expect("streamer creation should succeed")
}

pub(crate) fn topic(raw: &str) -> Topic {
    raw.parse().expect("topic should parse")
}

pub(crate) fn publish_request(topic: &str, kind: EventKind, payload: &[u8]) -> PublishRequest {
    PublishRequest {
        topic: topic.to_string(),
        origin_address: String::new(),
        kind,
        payload: payload.to_vec(),
    }
}

/// Waits until `topic` has `count` subscribers.
pub(crate) async fn wait_for_subscribers(streamer: &BusStreamer, topic: Topic, count: usize) {
    tokio::time::timeout(WAIT, async {
        while streamer.registry().subscriber_count(topic).await != count {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("subscriber count should settle");
}

pub(crate) async fn wait_for_sniffers(streamer: &BusStreamer, count: usize) {
    tokio::time::timeout(WAIT, async {
        while streamer.registry().sniffer_count().await != count {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("sniffer count should settle");
}
