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

//! Storage owner for active subscriptions, keyed by topic plus a sniffer list.

use crate::address::Topic;
use crate::event::EventKind;
use crate::observability::{events, fields};
use crate::sink::EventSink;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, Level};

const COMPONENT: &str = "subscriber_registry";

/// One active subscription: a kind filter plus the sink to deliver to.
///
/// Registered as `Arc<Subscriber>`. Two handles are the same subscription only
/// when they point at the same allocation.
pub struct Subscriber {
    kind: EventKind,
    sink: Arc<dyn EventSink>,
}

impl Subscriber {
    pub fn new(kind: EventKind, sink: Arc<dyn EventSink>) -> Arc<Self> {
        Arc::new(Self { kind, sink })
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn sink(&self) -> &Arc<dyn EventSink> {
        &self.sink
    }

    pub fn peer(&self) -> &str {
        self.sink.peer()
    }
}

impl Debug for Subscriber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber")
            .field("kind", &self.kind)
            .field("peer", &self.peer())
            .finish()
    }
}

/// Unordered set of subscription handles compared by identity.
#[derive(Debug, Default)]
pub(crate) struct SubscriberSet {
    handles: Vec<Arc<Subscriber>>,
}

impl SubscriberSet {
    pub(crate) fn push(&mut self, handle: Arc<Subscriber>) {
        self.handles.push(handle);
    }

    /// Removes one occurrence of `handle`. Order of the remaining handles is not kept.
    pub(crate) fn remove(&mut self, handle: &Arc<Subscriber>) -> bool {
        match self.handles.iter().position(|h| Arc::ptr_eq(h, handle)) {
            Some(index) => {
                self.handles.swap_remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn contains(&self, handle: &Arc<Subscriber>) -> bool {
        self.handles.iter().any(|h| Arc::ptr_eq(h, handle))
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<Subscriber>> {
        self.handles.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.handles.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

/// Registry of every active subscription of one streamer instance.
///
/// Topic subscriptions and sniffers are guarded by independent locks, so the
/// two dispatch phases never wait on each other's lock.
#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    by_topic: Mutex<HashMap<Topic, SubscriberSet>>,
    sniffers: Mutex<SubscriberSet>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `handle` once under each of `topics`.
    pub async fn add_by_topics(&self, topics: &[Topic], handle: &Arc<Subscriber>) {
        debug_assert!(!topics.is_empty(), "topic subscription without topics");
        if topics.is_empty() {
            error!(
                event = events::REGISTRY_ADD_EMPTY_TOPICS,
                component = COMPONENT,
                peer = handle.peer(),
                "refusing topic registration without topics"
            );
            return;
        }

        let mut by_topic = self.by_topic.lock().await;
        for topic in topics {
            by_topic.entry(*topic).or_default().push(handle.clone());
        }
        let topic_count = by_topic.len();
        drop(by_topic);

        if tracing::enabled!(Level::DEBUG) {
            debug!(
                event = events::REGISTRY_ADD,
                component = COMPONENT,
                peer = handle.peer(),
                kind = %handle.kind(),
                topics = fields::format_topics(topics).as_str(),
                topic_count,
                "registered topic subscriber"
            );
        }
    }

    /// Removes one occurrence of `handle` from each of `topics`.
    ///
    /// Topics left without subscribers are deleted. Returns how many topic sets
    /// held the handle; unknown handles are ignored.
    pub async fn remove_by_topics(&self, topics: &[Topic], handle: &Arc<Subscriber>) -> usize {
        let mut removed = 0;
        let mut by_topic = self.by_topic.lock().await;
        for topic in topics {
            let Some(set) = by_topic.get_mut(topic) else {
                continue;
            };
            if set.remove(handle) {
                removed += 1;
            }
            if set.is_empty() {
                by_topic.remove(topic);
            }
        }
        let topic_count = by_topic.len();
        drop(by_topic);

        if tracing::enabled!(Level::DEBUG) {
            debug!(
                event = events::REGISTRY_REMOVE,
                component = COMPONENT,
                peer = handle.peer(),
                topics = fields::format_topics(topics).as_str(),
                removed,
                topic_count,
                "unregistered topic subscriber"
            );
        }
        removed
    }

    pub async fn add_sniffer(&self, handle: &Arc<Subscriber>) {
        let mut sniffers = self.sniffers.lock().await;
        sniffers.push(handle.clone());
        let sniffer_count = sniffers.len();
        drop(sniffers);

        debug!(
            event = events::REGISTRY_ADD,
            component = COMPONENT,
            peer = handle.peer(),
            kind = %handle.kind(),
            sniffer_count,
            "registered sniffer"
        );
    }

    /// Returns `false` when `handle` was not a registered sniffer.
    pub async fn remove_sniffer(&self, handle: &Arc<Subscriber>) -> bool {
        let mut sniffers = self.sniffers.lock().await;
        let removed = sniffers.remove(handle);
        let sniffer_count = sniffers.len();
        drop(sniffers);

        debug!(
            event = events::REGISTRY_REMOVE,
            component = COMPONENT,
            peer = handle.peer(),
            removed,
            sniffer_count,
            "unregistered sniffer"
        );
        removed
    }

    /// Number of topics with at least one subscriber.
    pub async fn topic_count(&self) -> usize {
        self.by_topic.lock().await.len()
    }

    pub async fn subscriber_count(&self, topic: Topic) -> usize {
        self.by_topic
            .lock()
            .await
            .get(&topic)
            .map_or(0, SubscriberSet::len)
    }

    pub async fn sniffer_count(&self) -> usize {
        self.sniffers.lock().await.len()
    }

    pub async fn contains(&self, topic: Topic, handle: &Arc<Subscriber>) -> bool {
        self.by_topic
            .lock()
            .await
            .get(&topic)
            .is_some_and(|set| set.contains(handle))
    }

    pub async fn contains_sniffer(&self, handle: &Arc<Subscriber>) -> bool {
        self.sniffers.lock().await.contains(handle)
    }

    pub(crate) async fn lock_topics(&self) -> MutexGuard<'_, HashMap<Topic, SubscriberSet>> {
        self.by_topic.lock().await
    }

    pub(crate) async fn lock_sniffers(&self) -> MutexGuard<'_, SubscriberSet> {
        self.sniffers.lock().await
    }
}
