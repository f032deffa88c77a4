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

//! Line-oriented bus over a pair of byte streams.
//!
//! Each line is one telegram in `PublishRequest` JSON shape, e.g.
//! `{"topic":"1/2/3","origin_address":"1.1.5","kind":"write","payload":[1]}`.
//! Outgoing telegrams and subscription output share one writer, so lines
//! never interleave.

use async_trait::async_trait;
use bus_streamer::{BusError, BusTransport, Event, PublishRequest};
use serde::Serialize;
use std::sync::Arc;
use tokio::io::{
    stdin, stdout, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines,
    Stdin, Stdout,
};
use tokio::sync::Mutex;
use tracing::{debug, warn};

const COMPONENT: &str = "stdio_bus";

pub(crate) type SharedWriter<W> = Arc<Mutex<W>>;
pub(crate) type StdioBus = LineBus<BufReader<Stdin>, Stdout>;

/// Bus on stdin/stdout plus the stdout handle for everything else printed.
pub(crate) fn stdio_bus() -> (StdioBus, SharedWriter<Stdout>) {
    let out = Arc::new(Mutex::new(stdout()));
    (LineBus::new(BufReader::new(stdin()), out.clone()), out)
}

/// Writes `value` as one JSON line and flushes.
pub(crate) async fn write_json_line<W, T>(writer: &Mutex<W>, value: &T) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize + ?Sized,
{
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');

    let mut writer = writer.lock().await;
    writer.write_all(&line).await?;
    writer.flush().await
}

pub(crate) struct LineBus<R, W> {
    lines: Mutex<Lines<R>>,
    writer: SharedWriter<W>,
}

impl<R, W> LineBus<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub(crate) fn new(reader: R, writer: SharedWriter<W>) -> Self {
        Self {
            lines: Mutex::new(reader.lines()),
            writer,
        }
    }
}

fn parse_line(line: &str) -> Result<Event, String> {
    let request: PublishRequest = serde_json::from_str(line).map_err(|err| err.to_string())?;
    Event::try_from(&request).map_err(|err| err.to_string())
}

#[async_trait]
impl<R, W> BusTransport for LineBus<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&self, event: &Event) -> Result<(), BusError> {
        write_json_line(&self.writer, &PublishRequest::from(event))
            .await
            .map_err(|err| BusError::Send(err.to_string()))
    }

    async fn receive(&self) -> Result<Event, BusError> {
        let mut lines = self.lines.lock().await;
        loop {
            let line = lines
                .next_line()
                .await
                .map_err(|err| BusError::Receive(err.to_string()))?
                .ok_or(BusError::Closed)?;

            if line.trim().is_empty() {
                continue;
            }

            match parse_line(&line) {
                Ok(event) => {
                    debug!(component = COMPONENT, line = line.as_str(), "read telegram");
                    return Ok(event);
                }
                Err(err) => warn!(
                    component = COMPONENT,
                    line = line.as_str(),
                    err = err.as_str(),
                    "skipping malformed telegram"
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{write_json_line, LineBus};
    use bus_streamer::{BusError, BusTransport, Command, Event, SubscribeResponse, Topic};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[tokio::test]
    async fn malformed_and_blank_lines_are_skipped_until_eof() {
        let input: &[u8] = b"not json\n\n{\"topic\":\"1/2/3\",\"kind\":\"read\"}\n{\"topic\":\"99/0/0\"}\n";
        let bus = LineBus::new(input, Arc::new(Mutex::new(Vec::new())));

        let event = bus.receive().await.unwrap();
        assert_eq!(event.destination, "1/2/3".parse::<Topic>().unwrap());
        assert_eq!(event.command, Command::Read);
        assert_eq!(event.origin, None);

        assert_eq!(bus.receive().await, Err(BusError::Closed));
    }

    #[tokio::test]
    async fn sends_and_output_share_one_writer() {
        let out = Arc::new(Mutex::new(Vec::new()));
        let bus = LineBus::new(&b""[..], out.clone());
        let event = Event::new(Topic::from_raw(0x0a03), Command::Write, vec![1, 2]);

        bus.send(&event).await.unwrap();
        write_json_line(&out, &SubscribeResponse::from(&event))
            .await
            .unwrap();

        let written = String::from_utf8(out.lock().await.clone()).unwrap();
        let lines: Vec<_> = written.lines().collect();
        assert_eq!(
            lines[0],
            "{\"topic\":\"1/2/3\",\"origin_address\":\"\",\"kind\":\"write\",\"payload\":[1,2]}"
        );
        assert!(lines[1].starts_with("{\"topic\":\"1/2/3\""));
        assert_eq!(lines.len(), 2);
    }
}
