/*!
    Thread-safe FIFO of packets awaiting decode.
*/

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::Packet;

struct Inner {
    packets: VecDeque<Arc<Packet>>,
    closed: bool,
    /// Packets removed from the front so far, by pop or clear.
    removed: u64,
}

/**
    Identifies the packet that was at the head of a [`PacketQueue`] when
    it was peeked.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeadTicket(u64);

/**
    Ordered queue of compressed packets shared between a demuxer (producer)
    and a decode stream (consumer).

    The consumer takes a shared handle to the head with [`peek`](Self::peek),
    works with it without holding the lock, and commits with
    [`pop_if`](Self::pop_if) once the decoder has accepted it. The commit
    only removes the packet that was peeked, even if the queue was cleared
    and refilled in between. Producers may bound memory by waiting for the
    queue to drain below a watermark before pushing more.
*/
pub struct PacketQueue {
    inner: Mutex<Inner>,
    drained: Condvar,
}

impl PacketQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                packets: VecDeque::new(),
                closed: false,
                removed: 0,
            }),
            drained: Condvar::new(),
        }
    }

    /**
        Append a packet to the back of the queue.

        Returns false (dropping the packet) if the queue has been closed.
    */
    pub fn push(&self, packet: Packet) -> bool {
        let mut inner = self.inner.lock();
        if inner.closed {
            return false;
        }
        inner.packets.push_back(Arc::new(packet));
        true
    }

    /**
        Returns the packet at the head of the queue without removing it,
        along with a ticket for [`pop_if`](Self::pop_if).
    */
    pub fn peek(&self) -> Option<(HeadTicket, Arc<Packet>)> {
        let inner = self.inner.lock();
        inner
            .packets
            .front()
            .map(|packet| (HeadTicket(inner.removed), Arc::clone(packet)))
    }

    /**
        Run `f` on the packet at the head of the queue without removing it.

        The queue stays locked while `f` runs. Returns `None` if the queue
        is empty.
    */
    pub fn peek_with<R>(&self, f: impl FnOnce(&Packet) -> R) -> Option<R> {
        let inner = self.inner.lock();
        inner.packets.front().map(|packet| f(packet.as_ref()))
    }

    /**
        Remove and return the packet at the head of the queue.
    */
    pub fn pop(&self) -> Option<Packet> {
        let packet = {
            let mut inner = self.inner.lock();
            let packet = inner.packets.pop_front();
            if packet.is_some() {
                inner.removed += 1;
            }
            packet
        };
        packet.map(|packet| {
            self.drained.notify_all();
            Arc::unwrap_or_clone(packet)
        })
    }

    /**
        Remove the head packet only if it is still the one `ticket` was
        issued for.

        Returns `None`, leaving the queue untouched, if that packet was
        already removed.
    */
    pub fn pop_if(&self, ticket: HeadTicket) -> Option<Packet> {
        let packet = {
            let mut inner = self.inner.lock();
            if inner.removed != ticket.0 {
                return None;
            }
            let packet = inner.packets.pop_front();
            if packet.is_some() {
                inner.removed += 1;
            }
            packet
        };
        packet.map(|packet| {
            self.drained.notify_all();
            Arc::unwrap_or_clone(packet)
        })
    }

    /**
        Discard all queued packets, returning how many were dropped.
    */
    pub fn clear(&self) -> usize {
        let dropped = {
            let mut inner = self.inner.lock();
            let dropped = inner.packets.len();
            inner.packets.clear();
            inner.removed += dropped as u64;
            dropped
        };
        self.drained.notify_all();
        dropped
    }

    pub fn len(&self) -> usize {
        self.inner.lock().packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().packets.is_empty()
    }

    /**
        Close the queue. Further pushes are rejected and waiting producers wake up.

        Packets already queued remain available to the consumer.
    */
    pub fn close(&self) {
        self.inner.lock().closed = true;
        self.drained.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /**
        Block until fewer than `watermark` packets are queued or the queue is closed.

        Returns true if the queue is still open.
    */
    pub fn wait_below(&self, watermark: usize) -> bool {
        let mut inner = self.inner.lock();
        while !inner.closed && inner.packets.len() >= watermark {
            self.drained.wait(&mut inner);
        }
        !inner.closed
    }

    /**
        Like [`wait_below`](Self::wait_below) but gives up after `timeout`.

        Returns true if the queue is open and below the watermark.
    */
    pub fn wait_below_timeout(&self, watermark: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut inner = self.inner.lock();
        while !inner.closed && inner.packets.len() >= watermark {
            if self.drained.wait_until(&mut inner, deadline).timed_out() {
                break;
            }
        }
        !inner.closed && inner.packets.len() < watermark
    }
}

impl Default for PacketQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PacketQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("PacketQueue")
            .field("len", &inner.packets.len())
            .field("closed", &inner.closed)
            .finish()
    }
}

static_assertions::assert_impl_all!(PacketQueue: Send, Sync);
