use chrono::{DateTime, Utc};
use qrun_types::errors::ChannelError;
use qrun_types::{Event, QrError, QrResult};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, trace};

/// A half-open `[start, end)` window of wall-clock time. Events timestamped
/// outside the window are silently discarded by the channel rather than
/// rejected, matching a feed that simply has nothing useful to say outside
/// its configured run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeFrame {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeFrame {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        assert!(start <= end, "TimeFrame start must not be after end");
        Self { start, end }
    }

    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        time >= self.start && time < self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimeframePosition {
    Before,
    Inside,
    AtOrAfterEnd,
}

struct ChannelInner {
    capacity: usize,
    timeframe: Option<TimeFrame>,
    queue: Mutex<VecDeque<Event>>,
    readable: Notify,
    writable: Notify,
    closed: AtomicBool,
}

/// A bounded, backpressured channel of [`Event`]s connecting a [`crate::feed::Feed`]
/// to the run loop. Supports both a blocking [`EventChannel::send`] (waits
/// for room) and a non-blocking [`EventChannel::offer`] (evicts the oldest
/// queued event rather than block), since a feed producing faster than the
/// strategy consumes should not stall on old data it no longer needs.
///
/// Grounded in `gb-engine`'s event-ordered dispatch (`simulator.rs`) for the
/// timeframe-filtering behavior, built on `tokio::sync` primitives the way
/// the teacher's async engines are, since plain `tokio::sync::mpsc` has no
/// evict-oldest primitive to build `offer` on directly.
#[derive(Clone)]
pub struct EventChannel {
    inner: Arc<ChannelInner>,
}

impl EventChannel {
    pub fn new(capacity: usize) -> Self {
        Self::with_timeframe(capacity, None)
    }

    pub fn bounded(capacity: usize, timeframe: TimeFrame) -> Self {
        Self::with_timeframe(capacity, Some(timeframe))
    }

    fn with_timeframe(capacity: usize, timeframe: Option<TimeFrame>) -> Self {
        assert!(capacity > 0, "EventChannel capacity must be positive");
        Self {
            inner: Arc::new(ChannelInner {
                capacity,
                timeframe,
                queue: Mutex::new(VecDeque::with_capacity(capacity)),
                readable: Notify::new(),
                writable: Notify::new(),
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn timeframe(&self) -> Option<TimeFrame> {
        self.inner.timeframe
    }

    /// Where `event.time` falls relative to this channel's timeframe, if it
    /// has one.
    fn classify(&self, event: &Event) -> TimeframePosition {
        match self.inner.timeframe {
            None => TimeframePosition::Inside,
            Some(tf) if event.time < tf.start => TimeframePosition::Before,
            Some(tf) if event.time >= tf.end => TimeframePosition::AtOrAfterEnd,
            Some(_) => TimeframePosition::Inside,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Marks the channel closed. Already-queued events remain available to
    /// drain via [`EventChannel::receive`]; once drained, further receives
    /// return `QrError::Channel(ChannelError::Exhausted)`.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        self.inner.readable.notify_waiters();
        self.inner.writable.notify_waiters();
        debug!("event channel closed");
    }

    /// Blocking send: waits for queue room (or channel close). Events
    /// before the channel's timeframe are silently dropped. An event at or
    /// after the timeframe's end closes the channel and is itself dropped —
    /// the timeframe's end is exclusive, so nothing at or past it is ever
    /// delivered. Sends to an already-closed channel are dropped too.
    pub async fn send(&self, event: Event) -> QrResult<()> {
        match self.classify(&event) {
            TimeframePosition::Before => {
                trace!(time = %event.time, "event dropped, before channel timeframe");
                return Ok(());
            }
            TimeframePosition::AtOrAfterEnd => {
                trace!(time = %event.time, "event reached timeframe end, closing channel");
                self.close();
                return Ok(());
            }
            TimeframePosition::Inside => {}
        }
        loop {
            if self.is_closed() {
                return Err(QrError::Channel(ChannelError::Closed));
            }
            {
                let mut queue = self.inner.queue.lock().await;
                if queue.len() < self.inner.capacity {
                    queue.push_back(event);
                    self.inner.readable.notify_one();
                    return Ok(());
                }
            }
            self.inner.writable.notified().await;
        }
    }

    /// Non-blocking send: evicts the oldest queued event if the channel is
    /// at capacity. Returns `Ok(true)` if an older event was evicted to make
    /// room, `Ok(false)` if the event was queued (or dropped as
    /// out-of-timeframe) without eviction.
    pub async fn offer(&self, event: Event) -> QrResult<bool> {
        if self.is_closed() {
            return Err(QrError::Channel(ChannelError::Closed));
        }
        match self.classify(&event) {
            TimeframePosition::Before => {
                trace!(time = %event.time, "event dropped, before channel timeframe");
                return Ok(false);
            }
            TimeframePosition::AtOrAfterEnd => {
                trace!(time = %event.time, "event reached timeframe end, closing channel");
                self.close();
                return Ok(false);
            }
            TimeframePosition::Inside => {}
        }
        let mut queue = self.inner.queue.lock().await;
        let evicted = if queue.len() >= self.inner.capacity {
            queue.pop_front();
            true
        } else {
            false
        };
        queue.push_back(event);
        drop(queue);
        self.inner.readable.notify_one();
        Ok(evicted)
    }

    /// Waits for and returns the next event. Returns
    /// `QrError::Channel(ChannelError::Exhausted)` once the channel is
    /// closed and drained.
    pub async fn receive(&self) -> QrResult<Event> {
        loop {
            {
                let mut queue = self.inner.queue.lock().await;
                if let Some(event) = queue.pop_front() {
                    drop(queue);
                    self.inner.writable.notify_one();
                    if self.classify(&event) == TimeframePosition::AtOrAfterEnd {
                        trace!(time = %event.time, "received event reached timeframe end, closing channel");
                        self.close();
                        return Err(QrError::Channel(ChannelError::Exhausted));
                    }
                    return Ok(event);
                }
                if self.is_closed() {
                    return Err(QrError::Channel(ChannelError::Exhausted));
                }
            }
            self.inner.readable.notified().await;
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.queue.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qrun_types::Event;

    fn event_at(secs: i64) -> Event {
        Event::empty(DateTime::from_timestamp(secs, 0).unwrap())
    }

    #[tokio::test]
    async fn send_then_receive_round_trips() {
        let channel = EventChannel::new(4);
        channel.send(event_at(1)).await.unwrap();
        let received = channel.receive().await.unwrap();
        assert_eq!(received.time, event_at(1).time);
    }

    #[tokio::test]
    async fn offer_evicts_oldest_when_full() {
        let channel = EventChannel::new(2);
        channel.offer(event_at(1)).await.unwrap();
        channel.offer(event_at(2)).await.unwrap();
        let evicted = channel.offer(event_at(3)).await.unwrap();
        assert!(evicted);
        let first = channel.receive().await.unwrap();
        assert_eq!(first.time, event_at(2).time);
    }

    #[tokio::test]
    async fn receive_after_close_drains_then_errors() {
        let channel = EventChannel::new(4);
        channel.send(event_at(1)).await.unwrap();
        channel.close();
        let drained = channel.receive().await.unwrap();
        assert_eq!(drained.time, event_at(1).time);
        let err = channel.receive().await.unwrap_err();
        assert!(matches!(
            err,
            QrError::Channel(qrun_types::errors::ChannelError::Exhausted)
        ));
    }

    #[tokio::test]
    async fn events_outside_timeframe_are_dropped() {
        let tf = TimeFrame::new(event_at(10).time, event_at(20).time);
        let channel = EventChannel::bounded(4, tf);
        channel.send(event_at(1)).await.unwrap();
        assert!(channel.is_empty().await);
        channel.send(event_at(15)).await.unwrap();
        assert_eq!(channel.len().await, 1);
    }

    #[tokio::test]
    async fn event_at_or_after_end_closes_channel_instead_of_queueing() {
        // S6: feed emits t=0..9, channel end=t=5 — the consumer receives
        // exactly 5 events (t=0..4); the event at t=5 closes the channel
        // instead of being queued or delivered.
        let tf = TimeFrame::new(event_at(0).time, event_at(5).time);
        let channel = EventChannel::bounded(16, tf);
        for t in 0..10 {
            channel.send(event_at(t)).await.unwrap();
        }
        assert!(channel.is_closed());
        let mut received = Vec::new();
        loop {
            match channel.receive().await {
                Ok(event) => received.push(event.time),
                Err(_) => break,
            }
        }
        assert_eq!(received.len(), 5);
        assert_eq!(received, (0..5).map(|t| event_at(t).time).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn offer_at_timeframe_end_closes_channel_without_eviction() {
        let bounded = EventChannel::bounded(16, TimeFrame::new(event_at(0).time, event_at(5).time));
        bounded.offer(event_at(2)).await.unwrap();
        let evicted = bounded.offer(event_at(5)).await.unwrap();
        assert!(!evicted);
        assert!(bounded.is_closed());
        let received = bounded.receive().await.unwrap();
        assert_eq!(received.time, event_at(2).time);
        assert!(bounded.receive().await.is_err());
    }

    #[tokio::test]
    async fn send_blocks_until_room_then_succeeds() {
        let channel = EventChannel::new(1);
        channel.send(event_at(1)).await.unwrap();
        let channel2 = channel.clone();
        let sender = tokio::spawn(async move { channel2.send(event_at(2)).await });
        tokio::task::yield_now().await;
        let first = channel.receive().await.unwrap();
        assert_eq!(first.time, event_at(1).time);
        sender.await.unwrap().unwrap();
        let second = channel.receive().await.unwrap();
        assert_eq!(second.time, event_at(2).time);
    }
}
