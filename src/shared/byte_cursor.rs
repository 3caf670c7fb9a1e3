pub const SIZE_U16: usize = 2;
pub const SIZE_U32: usize = 4;
pub const SIZE_U64: usize = 8;

/// Forward-only reader over a borrowed block. Every read is bounds checked and
/// returns `None` instead of panicking on truncated input.
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    pub fn has_bytes(&self, n: usize) -> bool {
        self.remaining() >= n
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.buf.len()
    }

    pub fn read_u8(&mut self) -> Option<u8> {
        let v = *self.buf.get(self.pos)?;
        self.pos += 1;
        Some(v)
    }

    pub fn read_bytes(&mut self, n: usize) -> Option<&'a [u8]> {
        if !self.has_bytes(n) {
            return None;
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Some(out)
    }

    pub fn read_u16_be(&mut self) -> Option<u16> {
        let raw = self.read_bytes(SIZE_U16)?;
        Some(u16::from_be_bytes(raw.try_into().ok()?))
    }

    pub fn read_u32_le(&mut self) -> Option<u32> {
        let raw = self.read_bytes(SIZE_U32)?;
        Some(u32::from_le_bytes(raw.try_into().ok()?))
    }

    pub fn read_u64_be(&mut self) -> Option<u64> {
        let raw = self.read_bytes(SIZE_U64)?;
        Some(u64::from_be_bytes(raw.try_into().ok()?))
    }

    pub fn read_i64_le(&mut self) -> Option<i64> {
        let raw = self.read_bytes(SIZE_U64)?;
        Some(i64::from_le_bytes(raw.try_into().ok()?))
    }

    /// Reads an unsigned big-endian integer stored in `width` bytes (1..=4).
    pub fn read_uint_be(&mut self, width: usize) -> Option<u32> {
        if width == 0 || width > SIZE_U32 {
            return None;
        }
        let raw = self.read_bytes(width)?;
        Some(raw.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32))
    }
}

/// Appends `value` as a `width`-byte big-endian integer. Callers guarantee the
/// value fits; dictionary widths are sized from cardinality.
pub fn write_uint_be(out: &mut Vec<u8>, value: u32, width: usize) {
    let bytes = value.to_be_bytes();
    out.extend_from_slice(&bytes[SIZE_U32 - width..]);
}
