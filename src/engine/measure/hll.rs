use crate::engine::errors::CodecError;
use crate::shared::byte_cursor::ByteCursor;

pub const MIN_PRECISION: u8 = 4;
pub const MAX_PRECISION: u8 = 16;
pub const DEFAULT_PRECISION: u8 = 14;

/// HyperLogLog sketch. Registers are indexed by the top `precision` bits of
/// the hash; merge takes the register-wise maximum.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HllCounter {
    precision: u8,
    registers: Vec<u8>,
}

impl HllCounter {
    pub fn new(precision: u8) -> Self {
        debug_assert!((MIN_PRECISION..=MAX_PRECISION).contains(&precision));
        let precision = precision.clamp(MIN_PRECISION, MAX_PRECISION);
        Self {
            precision,
            registers: vec![0u8; 1 << precision],
        }
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    pub fn add_hash(&mut self, hash: u64) {
        let p = self.precision as u32;
        let idx = (hash >> (64 - p)) as usize;
        let w = hash << p;
        let rank = (w.leading_zeros() + 1).min(64 - p + 1) as u8;
        if rank > self.registers[idx] {
            self.registers[idx] = rank;
        }
    }

    pub fn merge(&mut self, other: &HllCounter) {
        debug_assert_eq!(self.precision, other.precision);
        for (a, b) in self.registers.iter_mut().zip(other.registers.iter()) {
            if *b > *a {
                *a = *b;
            }
        }
    }

    pub fn count_estimate(&self) -> u64 {
        let m = self.registers.len() as f64;
        let alpha = match self.registers.len() {
            16 => 0.673,
            32 => 0.697,
            64 => 0.709,
            _ => 0.7213 / (1.0 + 1.079 / m),
        };

        let mut inv_sum = 0.0;
        let mut zeros = 0u32;
        for &r in &self.registers {
            inv_sum += 2f64.powi(-(r as i32));
            if r == 0 {
                zeros += 1;
            }
        }

        let raw = alpha * m * m / inv_sum;

        // Small range correction.
        if raw <= 2.5 * m && zeros > 0 {
            let z = zeros as f64;
            return (m * (m / z).ln()).round().max(0.0) as u64;
        }

        raw.round().max(0.0) as u64
    }

    /// Bytes needed by [`write_registers`](Self::write_registers).
    pub fn serialized_len(&self) -> usize {
        1 + self.registers.len()
    }

    pub fn write_registers(&self, out: &mut Vec<u8>) {
        out.push(self.precision);
        out.extend_from_slice(&self.registers);
    }

    pub fn read_registers(cursor: &mut ByteCursor<'_>) -> Result<Self, CodecError> {
        let precision = cursor
            .read_u8()
            .ok_or(CodecError::Truncated("hll precision"))?;
        if !(MIN_PRECISION..=MAX_PRECISION).contains(&precision) {
            return Err(CodecError::InvalidDescriptor(format!(
                "hll precision {precision} out of range"
            )));
        }
        let registers = cursor
            .read_bytes(1 << precision)
            .ok_or(CodecError::Truncated("hll registers"))?
            .to_vec();
        Ok(Self {
            precision,
            registers,
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut cursor = ByteCursor::new(bytes);
        Self::read_registers(&mut cursor)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.serialized_len());
        self.write_registers(&mut out);
        out
    }
}
