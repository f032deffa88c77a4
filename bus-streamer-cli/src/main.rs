/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
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

mod stdio_bus;

use anyhow::{Context, Result};
use bus_streamer::{
    BusError, BusStreamer, CallContext, Code, EventKind, StreamerConfig, StreamerError,
    SubscribeRequest, SubscribeResponse, SubscribeUnaryRequest,
};
use clap::Parser;
use std::sync::Arc;
use tokio::io::Stdout;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(about = "Streams KNX group telegrams read from stdin")]
struct StreamerArgs {
    /// json5 configuration file. Built-in defaults apply when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Group address to subscribe to. Repeat for more; none means every topic.
    #[arg(short, long = "topic", value_name = "TOPIC")]
    topics: Vec<String>,

    /// Only deliver telegrams of this kind (read, response, write).
    #[arg(short, long, default_value = "unspecified")]
    kind: EventKind,

    /// Collect for this long (e.g. "5s"), print one response and exit.
    #[arg(long = "for", value_name = "DURATION")]
    r#for: Option<String>,
}

fn init_logging(config: &StreamerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log.level.as_str()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = sigterm.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

async fn print_json<T: serde::Serialize + ?Sized>(
    out: &stdio_bus::SharedWriter<Stdout>,
    value: &T,
) -> Result<()> {
    stdio_bus::write_json_line(out, value)
        .await
        .context("unable to write to stdout")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = StreamerArgs::parse();

    let config = match args.config.as_deref() {
        Some(path) => StreamerConfig::from_file(path)
            .with_context(|| format!("unable to load config from {path}"))?,
        None => StreamerConfig::default(),
    };
    init_logging(&config);

    info!(name = config.streamer.name.as_str(), "started bus-streamer");

    let (bus, out) = stdio_bus::stdio_bus();
    let streamer = BusStreamer::new(config, Arc::new(bus))
        .context("unable to create bus streamer")?;

    let reader = tokio::spawn({
        let streamer = streamer.clone();
        async move { streamer.run().await }
    });

    tokio::spawn({
        let streamer = streamer.clone();
        async move {
            match wait_for_shutdown_signal().await {
                Ok(()) => streamer.shutdown("termination signal received"),
                Err(err) => warn!(err = %err, "unable to listen for termination signals"),
            }
        }
    });

    let request = SubscribeRequest {
        topics: args.topics,
        kind: args.kind,
    };

    let outcome = match args.r#for {
        Some(window) => {
            let response = streamer
                .subscribe_unary(
                    SubscribeUnaryRequest {
                        request,
                        r#for: window,
                    },
                    CallContext::new(),
                )
                .await;
            streamer.shutdown("unary collection finished");
            match response {
                Ok(response) => print_json(&out, &response).await.map_err(|err| {
                    bus_streamer::Status::fail_with_code(Code::Internal, format!("{err:#}"))
                }),
                Err(status) => Err(status),
            }
        }
        None => {
            let mut stream = streamer.open_stream(request, CallContext::new());
            while let Some(message) = stream.recv().await {
                let message: &SubscribeResponse = &message;
                if let Err(err) = print_json(&out, message).await {
                    error!(err = format!("{err:#}").as_str(), "stopping output");
                    break;
                }
            }
            stream.finish().await
        }
    };

    let reader_result = reader.await.context("bus reader task failed")?;
    match reader_result {
        Ok(()) | Err(StreamerError::Bus(BusError::Closed)) => {}
        Err(err) => return Err(err).context("bus reader stopped"),
    }

    match outcome {
        Ok(()) => Ok(()),
        Err(status) if status.code() == Code::Aborted => {
            info!(reason = status.message(), "subscription ended by shutdown");
            Ok(())
        }
        Err(status) => Err(status).context("subscription failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::StreamerArgs;
    use bus_streamer::{EventKind, StreamerConfig};
    use clap::Parser;
    use std::time::Duration;

    #[test]
    fn shipped_config_is_valid() {
        let config = StreamerConfig::from_json5_str(include_str!("../DEFAULT_CONFIG.json5"))
            .expect("shipped config should parse");
        assert_eq!(config.streamer.name, "bus-streamer");
        assert_eq!(config.bus.inactivity_timeout, Some(Duration::from_secs(300)));
    }

    #[test]
    fn topics_repeat_and_kind_parses() {
        let args = StreamerArgs::parse_from([
            "bus-streamer",
            "-t",
            "1/2/3",
            "--topic",
            "1/2/4",
            "--kind",
            "response",
            "--for",
            "2s",
        ]);
        assert_eq!(args.topics, vec!["1/2/3", "1/2/4"]);
        assert_eq!(args.kind, EventKind::Response);
        assert_eq!(args.r#for.as_deref(), Some("2s"));
        assert_eq!(args.config, None);
    }
}
