//! Little-endian cursor used by the read-back parsers

use super::FormatError;

pub(crate) struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    pub(crate) fn take(&mut self, len: usize) -> Result<&'a [u8], FormatError> {
        if self.remaining() < len {
            return Err(FormatError::UnexpectedEof {
                offset: self.offset,
                needed: len,
                available: self.remaining(),
            });
        }
        let slice = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    pub(crate) fn read_i32(&mut self) -> Result<i32, FormatError> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn read_f32(&mut self) -> Result<f32, FormatError> {
        let b = self.take(4)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read an `i32` count and reject negative values
    pub(crate) fn read_count(&mut self, field: &'static str) -> Result<usize, FormatError> {
        let value = self.read_i32()?;
        usize::try_from(value).map_err(|_| FormatError::NegativeCount { field, value })
    }

    /// Capacity for `count` records of at least `record_size` bytes, bounded by the
    /// bytes left so a corrupt count cannot trigger a huge allocation
    pub(crate) fn capacity_for(&self, count: usize, record_size: usize) -> usize {
        count.min(self.remaining() / record_size.max(1))
    }

    pub(crate) fn read_f32_array<const N: usize>(&mut self) -> Result<[f32; N], FormatError> {
        let mut out = [0.0f32; N];
        for v in out.iter_mut() {
            *v = self.read_f32()?;
        }
        Ok(out)
    }

    pub(crate) fn read_i32_array<const N: usize>(&mut self) -> Result<[i32; N], FormatError> {
        let mut out = [0i32; N];
        for v in out.iter_mut() {
            *v = self.read_i32()?;
        }
        Ok(out)
    }

    pub(crate) fn finish(self) -> Result<(), FormatError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(FormatError::TrailingBytes(n)),
        }
    }
}
