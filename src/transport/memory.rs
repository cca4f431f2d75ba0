// SPDX-FileCopyrightText: Copyright (c) 2025 picolink contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory transport

use super::*;
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard},
};

type Queue = Arc<Mutex<VecDeque<u8>>>;

/// One end of an in-memory byte channel.
///
/// Created either as a connected [`pair`](MemoryTransport::pair) or as a
/// single scripted end with [`new`](MemoryTransport::new). A scripted end
/// receives bytes pushed by hand, either right away
/// ([`push_incoming`](MemoryTransport::push_incoming)) or as the reply to
/// the next send ([`push_reply`](MemoryTransport::push_reply)).
#[derive(Debug, Default)]
pub struct MemoryTransport {
    inbox: Queue,
    outbox: Queue,
    replies: VecDeque<Vec<u8>>,
    max_chunk: Option<usize>,
    fail_sends: bool,
    receive_calls: usize,
}

impl MemoryTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Two connected ends: bytes sent on one end are received on the other.
    #[must_use]
    pub fn pair() -> (Self, Self) {
        let a = Self::new();
        let b = Self {
            inbox: Arc::clone(&a.outbox),
            outbox: Arc::clone(&a.inbox),
            ..Self::default()
        };
        (a, b)
    }

    /// Deliver at most `max_chunk` bytes per `receive` call.
    #[must_use]
    pub fn with_max_chunk(mut self, max_chunk: usize) -> Self {
        self.max_chunk = Some(max_chunk);
        self
    }

    /// Make every following `send` fail.
    pub fn fail_sends(&mut self, fail: bool) {
        self.fail_sends = fail;
    }

    /// Queue bytes to be received by this end.
    pub fn push_incoming(&self, bytes: &[u8]) {
        lock(&self.inbox).extend(bytes);
    }

    /// Queue bytes that arrive once the next `send` succeeded.
    ///
    /// Every successful `send` releases one queued reply.
    pub fn push_reply(&mut self, bytes: &[u8]) {
        self.replies.push_back(bytes.to_vec());
    }

    /// Take all bytes sent by this end that have not been received yet.
    pub fn take_sent(&self) -> Vec<u8> {
        lock(&self.outbox).drain(..).collect()
    }

    /// How often `receive` has been called.
    #[must_use]
    pub const fn receive_calls(&self) -> usize {
        self.receive_calls
    }
}

fn lock(queue: &Queue) -> MutexGuard<'_, VecDeque<u8>> {
    // A panicking peer leaves the queue itself intact.
    queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Transport for MemoryTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        if self.fail_sends {
            return Err(Error::Transport);
        }
        lock(&self.outbox).extend(bytes);
        if let Some(reply) = self.replies.pop_front() {
            lock(&self.inbox).extend(reply);
        }
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.receive_calls += 1;
        let mut inbox = lock(&self.inbox);
        if inbox.is_empty() {
            return Err(Error::NoIncomingPackage);
        }
        let cnt = buf
            .len()
            .min(inbox.len())
            .min(self.max_chunk.unwrap_or(usize::MAX));
        for (dst, src) in buf.iter_mut().zip(inbox.drain(..cnt)) {
            *dst = src;
        }
        Ok(cnt)
    }

    fn discard_pending(&mut self) -> Result<()> {
        lock(&self.inbox).clear();
        Ok(())
    }
}
