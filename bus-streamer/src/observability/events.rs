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

//! Canonical structured event names used across `bus-streamer`.

// Registry events.
pub const REGISTRY_ADD: &str = "registry_add";
pub const REGISTRY_REMOVE: &str = "registry_remove";
pub const REGISTRY_ADD_EMPTY_TOPICS: &str = "registry_add_empty_topics";

// Dispatch events.
pub const DISPATCH_START: &str = "dispatch_start";
pub const DISPATCH_SEND_FAILED: &str = "dispatch_send_failed";
pub const DISPATCH_DONE: &str = "dispatch_done";

// Stream lifecycle events.
pub const STREAM_TRANSITION: &str = "stream_transition";
pub const STREAM_INVALID_TOPIC: &str = "stream_invalid_topic";
pub const STREAM_ABORTED: &str = "stream_aborted";

// Unary aggregation events.
pub const UNARY_START: &str = "unary_start";
pub const UNARY_DONE: &str = "unary_done";
pub const UNARY_FAILED: &str = "unary_failed";

// Publish path events.
pub const PUBLISH_INVALID_REQUEST: &str = "publish_invalid_request";
pub const PUBLISH_BUS_SEND_FAILED: &str = "publish_bus_send_failed";
pub const PUBLISH_BUS_SEND_TIMEOUT: &str = "publish_bus_send_timeout";
pub const PUBLISH_OK: &str = "publish_ok";

// Bus reader events.
pub const BUS_READER_START: &str = "bus_reader_start";
pub const BUS_RECEIVE: &str = "bus_receive";
pub const BUS_RECEIVE_FAILED: &str = "bus_receive_failed";
pub const BUS_INACTIVE: &str = "bus_inactive";
pub const BUS_READER_STOP: &str = "bus_reader_stop";

// Process lifecycle events.
pub const STREAMER_CREATED: &str = "streamer_created";
pub const SHUTDOWN_TRIGGERED: &str = "shutdown_triggered";
