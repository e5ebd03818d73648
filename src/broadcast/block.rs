//! Market-Data Block wire layout (component H, §6.3).
//!
//! Every block is exactly 8192 bytes, 64-byte aligned: a 32-byte header
//! (`sequence_number`, `timestamp_ns`, `record_count`, `data_type`, `flags`,
//! reserved) followed by an 8160-byte opaque payload. The payload is never
//! interpreted by the hub; producers and subscribers agree on its internal
//! layout out of band via `data_type`.

use crate::error::CoreError;

pub const BLOCK_SIZE: usize = 8192;
pub const HEADER_SIZE: usize = 32;
pub const PAYLOAD_CAPACITY: usize = BLOCK_SIZE - HEADER_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Tick,
    Bar,
    Kline,
    OrderBook,
    Trade,
    Unknown,
}

impl DataType {
    pub fn as_u8(self) -> u8 {
        match self {
            DataType::Tick => 0,
            DataType::Bar => 1,
            DataType::Kline => 2,
            DataType::OrderBook => 3,
            DataType::Trade => 4,
            DataType::Unknown => 255,
        }
    }

    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => DataType::Tick,
            1 => DataType::Bar,
            2 => DataType::Kline,
            3 => DataType::OrderBook,
            4 => DataType::Trade,
            _ => DataType::Unknown,
        }
    }
}

/// Fixed-size, 64-byte-aligned market data block. The first 32 bytes match
/// the normative wire header exactly; `payload` holds the full 8160-byte
/// opaque region, zero-padded past whatever a producer actually wrote.
/// There is no byte-length field in the block itself (`record_count` counts
/// logical records, not bytes) — a caller that needs to know how many bytes
/// it supplied already has that length and slices `payload()` with it.
#[repr(C, align(64))]
#[derive(Clone)]
pub struct MarketDataBlock {
    pub sequence_number: u64,
    pub timestamp_ns: u64,
    pub record_count: u64,
    pub data_type: u8,
    pub flags: u8,
    pub reserved: [u8; 6],
    pub payload: [u8; PAYLOAD_CAPACITY],
}

impl MarketDataBlock {
    pub fn new(sequence_number: u64, timestamp_ns: u64, record_count: u64, data_type: DataType, payload: &[u8]) -> Result<Self, CoreError> {
        if payload.len() > PAYLOAD_CAPACITY {
            return Err(CoreError::Overflow {
                size: payload.len(),
                max: PAYLOAD_CAPACITY,
            });
        }
        let mut buf = [0u8; PAYLOAD_CAPACITY];
        buf[..payload.len()].copy_from_slice(payload);
        Ok(MarketDataBlock {
            sequence_number,
            timestamp_ns,
            record_count,
            data_type: data_type.as_u8(),
            flags: 0,
            reserved: [0; 6],
            payload: buf,
        })
    }

    pub fn data_type(&self) -> DataType {
        DataType::from_u8(self.data_type)
    }

    pub fn payload(&self) -> &[u8; PAYLOAD_CAPACITY] {
        &self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem;

    #[test]
    fn block_is_exactly_8192_bytes_and_64_byte_aligned() {
        assert_eq!(mem::size_of::<MarketDataBlock>(), BLOCK_SIZE);
        assert_eq!(mem::align_of::<MarketDataBlock>(), 64);
    }

    #[test]
    fn payload_round_trips_exactly_for_the_bytes_supplied() {
        let data = vec![7u8; 128];
        let block = MarketDataBlock::new(1, 1000, 4, DataType::Trade, &data).unwrap();
        assert_eq!(&block.payload()[..data.len()], data.as_slice());
        assert_eq!(block.data_type(), DataType::Trade);
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let data = vec![0u8; PAYLOAD_CAPACITY + 1];
        assert!(MarketDataBlock::new(1, 0, 0, DataType::Tick, &data).is_err());
    }
}
