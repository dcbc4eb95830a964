//! Flat parcel codec for command-channel buffers.
//!
//! Values are packed little-endian in 4-byte aligned slots:
//! `bool` and `u32` take one slot, `f64` two, and C strings are written as
//! their bytes plus a NUL terminator, zero padded to the next slot.

/// Errors while reading a parcel.
#[derive(Debug, thiserror::Error)]
pub enum ParcelError {
    #[error("parcel truncated: need {needed} bytes at offset {offset}, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("unterminated C string at offset {0}")]
    UnterminatedString(usize),

    #[error("C string at offset {0} is not valid UTF-8")]
    InvalidUtf8(usize),

    #[error("C string contains interior NUL")]
    InteriorNul,
}

/// Growable byte buffer with a read cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parcel {
    data: Vec<u8>,
    position: usize,
}

impl Parcel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap received bytes for reading from the start.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data, position: 0 }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn data_size(&self) -> usize {
        self.data.len()
    }

    /// Move the read cursor back to the start.
    pub fn rewind(&mut self) {
        self.position = 0;
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_u32(u32::from(value));
    }

    pub fn write_u32(&mut self, value: u32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_f64(&mut self, value: f64) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_cstring(&mut self, value: &str) -> Result<(), ParcelError> {
        if value.as_bytes().contains(&0) {
            return Err(ParcelError::InteriorNul);
        }
        self.data.extend_from_slice(value.as_bytes());
        self.data.push(0);
        let padded = self.data.len().next_multiple_of(4);
        self.data.resize(padded, 0);
        Ok(())
    }

    pub fn read_bool(&mut self) -> Result<bool, ParcelError> {
        Ok(self.read_u32()? != 0)
    }

    pub fn read_u32(&mut self) -> Result<u32, ParcelError> {
        Ok(u32::from_le_bytes(self.take::<4>()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, ParcelError> {
        Ok(i32::from_le_bytes(self.take::<4>()?))
    }

    pub fn read_f64(&mut self) -> Result<f64, ParcelError> {
        Ok(f64::from_le_bytes(self.take::<8>()?))
    }

    pub fn read_cstring(&mut self) -> Result<String, ParcelError> {
        let start = self.position;
        let rest = self.data.get(start..).unwrap_or_default();
        let len = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(ParcelError::UnterminatedString(start))?;
        let value = std::str::from_utf8(&rest[..len])
            .map_err(|_| ParcelError::InvalidUtf8(start))?
            .to_string();
        self.position = (start + len + 1).next_multiple_of(4).min(self.data.len());
        Ok(value)
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], ParcelError> {
        let end = self.position + N;
        let bytes = self
            .data
            .get(self.position..end)
            .ok_or(ParcelError::Truncated {
                offset: self.position,
                needed: N,
                available: self.data.len().saturating_sub(self.position),
            })?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        self.position = end;
        Ok(out)
    }
}
