//! ISO 9564 format-0 PIN block.
//!
//! PIN field: `0`, the PIN length nibble, the PIN digits, `F` nibbles up to
//! 16 hex digits. PAN field: `0000` followed by the 12 account digits that
//! precede the check digit. The block is their XOR.

use crate::infra::error::{GatewayError, GatewayResult};
use std::fmt;

/// Block size in bytes
pub const PIN_BLOCK_LEN: usize = 8;

const MIN_PAN_LEN: usize = 13;
const MIN_PIN_LEN: usize = 4;
const MAX_PIN_LEN: usize = 12;

/// Eight-byte format-0 PIN block bound to an account number.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PinBlock([u8; PIN_BLOCK_LEN]);

impl PinBlock {
    /// Build the block for `pan` and `pin`.
    ///
    /// # Errors
    ///
    /// [`GatewayError::InvalidInput`] when the PAN is shorter than 13
    /// characters or not all digits, or the PIN is not 4 to 12 digits.
    pub fn build(pan: &str, pin: &str) -> GatewayResult<Self> {
        let pin_field = Self::pin_field(pin)?;
        let pan_field = Self::pan_field(pan)?;

        let mut block = [0u8; PIN_BLOCK_LEN];
        for (i, byte) in block.iter_mut().enumerate() {
            *byte = pin_field[i] ^ pan_field[i];
        }
        Ok(Self(block))
    }

    fn pin_field(pin: &str) -> GatewayResult<[u8; PIN_BLOCK_LEN]> {
        if !(MIN_PIN_LEN..=MAX_PIN_LEN).contains(&pin.len()) {
            return Err(GatewayError::InvalidInput(format!(
                "PIN must be {MIN_PIN_LEN} to {MAX_PIN_LEN} digits, got {}",
                pin.len()
            )));
        }
        if !pin.bytes().all(|b| b.is_ascii_digit()) {
            return Err(GatewayError::InvalidInput(
                "PIN must contain only digits".to_string(),
            ));
        }

        let mut nibbles = format!("0{:X}{pin}", pin.len());
        while nibbles.len() < PIN_BLOCK_LEN * 2 {
            nibbles.push('F');
        }
        Self::decode_field(&nibbles)
    }

    fn pan_field(pan: &str) -> GatewayResult<[u8; PIN_BLOCK_LEN]> {
        if pan.len() < MIN_PAN_LEN {
            return Err(GatewayError::InvalidInput(format!(
                "account number must have at least {MIN_PAN_LEN} digits, got {}",
                pan.len()
            )));
        }
        if !pan.bytes().all(|b| b.is_ascii_digit()) {
            return Err(GatewayError::InvalidInput(
                "account number must contain only digits".to_string(),
            ));
        }

        let digits = &pan[pan.len() - MIN_PAN_LEN..pan.len() - 1];
        Self::decode_field(&format!("0000{digits}"))
    }

    fn decode_field(nibbles: &str) -> GatewayResult<[u8; PIN_BLOCK_LEN]> {
        let mut field = [0u8; PIN_BLOCK_LEN];
        hex::decode_to_slice(nibbles, &mut field)
            .map_err(|e| GatewayError::InvalidInput(format!("PIN block field: {e}")))?;
        Ok(field)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; PIN_BLOCK_LEN] {
        &self.0
    }

    /// Uppercase hex rendering, as printed by PIN block calculators.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }
}

impl fmt::Debug for PinBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PinBlock([REDACTED])")
    }
}
