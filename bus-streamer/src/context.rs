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

//! Cancellation sources for a single call and for the whole process.

use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

/// How a [`CallContext`] ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CallEnd {
    Canceled,
    DeadlineExceeded,
}

/// Call-scoped cancellation with an optional deadline.
///
/// Children inherit cancellation and the deadline of their parent. A child deadline
/// can only be earlier than the parent's.
#[derive(Clone, Debug, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().child_with_timeout(timeout)
    }

    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let requested = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(parent) if parent < requested => parent,
            _ => requested,
        };

        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Resolves once the call is cancelled or its deadline passes.
    pub async fn done(&self) -> CallEnd {
        let Some(deadline) = self.deadline else {
            self.token.cancelled().await;
            return CallEnd::Canceled;
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => CallEnd::Canceled,
            _ = sleep_until(deadline) => CallEnd::DeadlineExceeded,
        }
    }
}

/// Process-wide shutdown source that remembers why it fired.
///
/// The first recorded cause wins. Clones observe the same signal.
#[derive(Clone, Debug, Default)]
pub struct ShutdownSignal {
    token: CancellationToken,
    cause: Arc<OnceLock<String>>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires the signal. Returns `false` when it had already fired.
    pub fn trigger(&self, cause: impl Into<String>) -> bool {
        let first = self.cause.set(cause.into()).is_ok();
        self.token.cancel();
        first
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn cause(&self) -> Option<&str> {
        self.cause.get().map(String::as_str)
    }

    pub async fn triggered(&self) {
        self.token.cancelled().await;
    }
}
