//! Market-Data Broadcast Hub (component H, §4.8). A purely in-process mock
//! of a zero-copy shared-memory transport: publishers push fixed-size
//! `MarketDataBlock`s into a bounded ring buffer, subscribers block on a
//! condvar until a new block lands or their timeout expires. The interface
//! (`Publisher`/`Subscriber`/`BroadcastManager`) is shaped the way a real
//! shared-memory transport would be used, so swapping the backing store
//! later does not change call sites.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::block::{DataType, MarketDataBlock};
use super::config::BroadcastConfig;
use crate::error::CoreResult;

#[derive(Debug, Default)]
pub struct PublisherStats {
    pub blocks_published: AtomicU64,
    pub records_published: AtomicU64,
    pub bytes_published: AtomicU64,
    pub blocks_dropped: AtomicU64,
    pub errors: AtomicU64,
}

struct StreamState {
    config: BroadcastConfig,
    buffer: Mutex<VecDeque<Arc<MarketDataBlock>>>,
    not_empty: Condvar,
    next_sequence: AtomicU64,
    total_published: AtomicU64,
    stats: PublisherStats,
}

impl StreamState {
    fn new(config: BroadcastConfig) -> Self {
        StreamState {
            config,
            buffer: Mutex::new(VecDeque::new()),
            not_empty: Condvar::new(),
            next_sequence: AtomicU64::new(1),
            total_published: AtomicU64::new(0),
            stats: PublisherStats::default(),
        }
    }

    fn publish(&self, timestamp_ns: u64, record_count: u64, data_type: DataType, payload: &[u8]) -> CoreResult<u64> {
        let sequence_number = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        let block = MarketDataBlock::new(sequence_number, timestamp_ns, record_count, data_type, payload)
            .map_err(|err| {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                err
            })?;
        let block = Arc::new(block);

        let mut buffer = self.buffer.lock();
        if buffer.len() >= self.config.buffer_depth {
            buffer.pop_front();
            self.stats.blocks_dropped.fetch_add(1, Ordering::Relaxed);
        }
        buffer.push_back(block);
        self.total_published.fetch_add(1, Ordering::Relaxed);
        drop(buffer);

        self.stats.blocks_published.fetch_add(1, Ordering::Relaxed);
        self.stats.records_published.fetch_add(record_count, Ordering::Relaxed);
        self.stats.bytes_published.fetch_add(payload.len() as u64, Ordering::Relaxed);
        self.not_empty.notify_all();
        Ok(sequence_number)
    }
}

/// Handle held by a single producer for one named stream. Sequence numbers
/// are assigned centrally by the stream, so multiple `Publisher` handles to
/// the same stream never collide.
pub struct Publisher {
    stream: Arc<StreamState>,
}

impl Publisher {
    pub fn publish(&self, timestamp_ns: u64, record_count: u64, data_type: DataType, payload: &[u8]) -> CoreResult<u64> {
        self.stream.publish(timestamp_ns, record_count, data_type, payload)
    }

    pub fn stats(&self) -> &PublisherStats {
        &self.stream.stats
    }
}

/// Handle held by a single consumer. A subscriber only ever observes blocks
/// published after it attached — its cursor starts at the stream's current
/// total-published count, never at sequence 1 of a long-running stream.
pub struct Subscriber {
    stream: Arc<StreamState>,
    last_seen: u64,
}

impl Subscriber {
    /// Blocks until a block with `sequence_number > last_seen` is available,
    /// or `timeout` elapses (waits indefinitely when `None`). Returns blocks
    /// one at a time in strictly increasing sequence order.
    pub fn receive(&mut self, timeout: Option<Duration>) -> Option<Arc<MarketDataBlock>> {
        let deadline = timeout.map(|d| Instant::now() + d);
        let mut buffer = self.stream.buffer.lock();
        loop {
            if let Some(block) = buffer
                .iter()
                .find(|block| block.sequence_number > self.last_seen)
                .cloned()
            {
                self.last_seen = block.sequence_number;
                return Some(block);
            }
            match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return None;
                    }
                    let timed_out = self.stream.not_empty.wait_for(&mut buffer, deadline - now).timed_out();
                    if timed_out {
                        return None;
                    }
                }
                None => {
                    self.stream.not_empty.wait(&mut buffer);
                }
            }
        }
    }

    pub fn last_seen_sequence(&self) -> u64 {
        self.last_seen
    }

    /// Non-blocking poll: returns a block immediately if one past `last_seen`
    /// is already buffered, else `None`.
    pub fn try_receive(&mut self) -> Option<Arc<MarketDataBlock>> {
        let buffer = self.stream.buffer.lock();
        let block = buffer.iter().find(|block| block.sequence_number > self.last_seen).cloned();
        if let Some(block) = &block {
            self.last_seen = block.sequence_number;
        }
        block
    }

    /// Async, timeout-bounded receive for callers already inside a tokio
    /// runtime (the demo binary). Polls `try_receive` rather than blocking
    /// the executor thread on the stream's condvar.
    pub async fn receive_async(&mut self, timeout: Duration) -> Option<Arc<MarketDataBlock>> {
        tokio::time::timeout(timeout, async {
            loop {
                if let Some(block) = self.try_receive() {
                    return block;
                }
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .ok()
    }
}

/// Owns every named stream in the process. Each stream is independent: its
/// own config, ring buffer, sequence counter, and stats.
#[derive(Default)]
pub struct BroadcastManager {
    streams: Mutex<HashMap<String, Arc<StreamState>>>,
}

impl BroadcastManager {
    pub fn new() -> Self {
        BroadcastManager { streams: Mutex::new(HashMap::new()) }
    }

    fn stream_for(&self, name: &str, config: &BroadcastConfig) -> Arc<StreamState> {
        let mut streams = self.streams.lock();
        streams
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(StreamState::new(config.clone())))
            .clone()
    }

    /// Creates (or attaches to) the named stream and returns a publisher
    /// handle for it. `config` only takes effect the first time a stream is
    /// created; later callers attach to the existing configuration.
    pub fn publisher(&self, stream_name: &str, config: BroadcastConfig) -> CoreResult<Publisher> {
        config.validate()?;
        let stream = self.stream_for(stream_name, &config);
        Ok(Publisher { stream })
    }

    /// Subscribes to the named stream, starting from whatever has already
    /// been published on it (or from nothing, if the stream does not exist
    /// yet — it is created with default config so a publisher can attach
    /// later).
    pub fn subscriber(&self, stream_name: &str) -> Subscriber {
        let stream = self.stream_for(stream_name, &BroadcastConfig::default());
        let last_seen = stream.total_published.load(Ordering::SeqCst);
        Subscriber { stream, last_seen }
    }

    pub fn stream_names(&self) -> Vec<String> {
        self.streams.lock().keys().cloned().collect()
    }

    pub fn remove_stream(&self, stream_name: &str) -> bool {
        self.streams.lock().remove(stream_name).is_some()
    }
}

pub fn default_stream_name() -> &'static str {
    "market_data"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscriber_receives_published_blocks_in_sequence_order() {
        // Spec §8 S6 publishes 1000 blocks and expects one subscriber to
        // receive all 1000 in order; a drop-oldest ring can only guarantee
        // that when its depth covers the whole run, so size it accordingly
        // rather than relying on the (much shallower) default.
        let mut config = BroadcastConfig::default();
        config.buffer_depth = 1000;
        let manager = BroadcastManager::new();
        let publisher = manager.publisher("market_data", config).unwrap();
        let mut subscriber = manager.subscriber("market_data");

        for i in 0..1000u32 {
            publisher.publish(i as u64, 1, DataType::Tick, &i.to_le_bytes()).unwrap();
        }

        for expected_seq in 1..=1000u64 {
            let block = subscriber.receive(Some(Duration::from_millis(50))).unwrap();
            assert_eq!(block.sequence_number, expected_seq);
            let value = u32::from_le_bytes(block.payload()[..4].try_into().unwrap());
            assert_eq!(value as u64, expected_seq - 1);
        }
        assert!(subscriber.receive(Some(Duration::from_millis(10))).is_none());
    }

    #[test]
    fn late_subscriber_only_sees_blocks_published_after_it_attaches() {
        let manager = BroadcastManager::new();
        let publisher = manager.publisher("market_data", BroadcastConfig::default()).unwrap();
        publisher.publish(0, 1, DataType::Tick, b"before").unwrap();

        let mut subscriber = manager.subscriber("market_data");
        publisher.publish(1, 1, DataType::Tick, b"after").unwrap();

        let block = subscriber.receive(Some(Duration::from_millis(50))).unwrap();
        assert_eq!(&block.payload()[..6], b"after");
        assert!(subscriber.receive(Some(Duration::from_millis(10))).is_none());
    }

    #[test]
    fn overflowing_buffer_drops_oldest_and_increments_drop_counter() {
        let mut config = BroadcastConfig::default();
        config.buffer_depth = 4;
        let manager = BroadcastManager::new();
        let publisher = manager.publisher("tiny", config).unwrap();

        for i in 0..10u32 {
            publisher.publish(i as u64, 1, DataType::Tick, &i.to_le_bytes()).unwrap();
        }
        assert_eq!(publisher.stats().blocks_dropped.load(Ordering::Relaxed), 6);

        let mut subscriber = manager.subscriber("tiny");
        let block = subscriber.receive(Some(Duration::from_millis(10))).unwrap();
        assert_eq!(block.sequence_number, 7);
    }

    #[test]
    fn invalid_config_is_rejected_before_stream_creation() {
        let mut config = BroadcastConfig::default();
        config.max_subscribers = 0;
        let manager = BroadcastManager::new();
        assert!(manager.publisher("bad", config).is_err());
        assert!(manager.stream_names().is_empty());
    }
}
