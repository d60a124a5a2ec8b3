use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_PAYLOAD_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("payload exceeds {MAX_PAYLOAD_LEN} bytes")]
    PayloadTooLong,
}

/// A single received or to-be-sent CAN frame. Immutable once constructed;
/// TX candidates are built fresh each control cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanFrame {
    pub addr: u16,
    pub bus: u8,
    pub len: u8,
    pub payload: [u8; MAX_PAYLOAD_LEN],
}

impl CanFrame {
    pub fn new(addr: u16, bus: u8, data: &[u8]) -> Result<Self, FrameError> {
        if data.len() > MAX_PAYLOAD_LEN {
            return Err(FrameError::PayloadTooLong);
        }
        let mut payload = [0u8; MAX_PAYLOAD_LEN];
        payload[..data.len()].copy_from_slice(data);
        Ok(Self {
            addr,
            bus,
            len: data.len() as u8,
            payload,
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.payload[..self.len as usize]
    }
}
