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

//! Collect-then-return adapter over the streaming subscription.

use crate::context::CallContext;
use crate::messages::{SubscribeUnaryRequest, SubscribeUnaryResponse};
use crate::observability::events;
use crate::status::{Code, Status};
use crate::streamer::BusStreamer;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

const COMPONENT: &str = "unary_aggregator";
const PEER_PREFIX: &str = "internal-unary";

/// Parses the `for` window. Empty means "first message only".
///
/// Windows use humantime syntax (`"500ms"`, `"1m 30s"`). Fractional values
/// such as `"1.5s"` are rejected; write `"1s 500ms"` instead.
pub(crate) fn parse_window(raw: &str) -> Result<Option<Duration>, Status> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    humantime::parse_duration(raw).map(Some).map_err(|err| {
        Status::fail_with_code(Code::InvalidArgument, format!("parsing 'for': {err}"))
    })
}

pub(crate) async fn collect(
    streamer: &BusStreamer,
    request: SubscribeUnaryRequest,
    ctx: CallContext,
) -> Result<SubscribeUnaryResponse, Status> {
    let window = parse_window(&request.r#for)?;
    let internal_ctx = match window {
        Some(window) => ctx.child_with_timeout(window),
        None => ctx.child(),
    };
    let peer = format!("{PEER_PREFIX}/{}", Uuid::new_v4());

    debug!(
        event = events::UNARY_START,
        component = COMPONENT,
        peer = peer.as_str(),
        window = ?window,
        "collecting unary subscription"
    );

    let mut stream = streamer.open_labelled_stream(peer.clone(), request.request, internal_ctx);
    let mut messages = Vec::new();
    while let Some(message) = stream.recv().await {
        messages.push(Arc::unwrap_or_clone(message));
        if window.is_none() {
            break;
        }
    }

    match stream.finish().await {
        Ok(()) => {
            debug!(
                event = events::UNARY_DONE,
                component = COMPONENT,
                peer = peer.as_str(),
                collected = messages.len(),
                "unary subscription done"
            );
            Ok(SubscribeUnaryResponse { messages })
        }
        Err(status) if status.code() == Code::InvalidArgument => Err(status),
        Err(status) => {
            warn!(
                event = events::UNARY_FAILED,
                component = COMPONENT,
                peer = peer.as_str(),
                err = %status,
                "internal stream ended abnormally"
            );
            Err(Status::fail_with_code(
                Code::Internal,
                format!("stream closed: {status}"),
            ))
        }
    }
}
