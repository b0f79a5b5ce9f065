// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Little-endian read/write cursors for the binary wire format.

use crate::error::{Error, ErrorKind, Result};

/// Generate write methods for primitive types.
macro_rules! impl_write_le {
    ($name:ident, $type:ty) => {
        #[inline]
        pub fn $name(&mut self, value: $type) {
            self.buffer.extend_from_slice(&value.to_le_bytes());
        }
    };
}

/// Generate read methods for primitive types.
///
/// Each generated method checks bounds (`DeserializationFailure` with the
/// current offset on overflow), reads N bytes and advances.
macro_rules! impl_read_le {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self) -> Result<$type> {
            let mut bytes = [0u8; $size];
            bytes.copy_from_slice(self.read_bytes($size)?);
            Ok(<$type>::from_le_bytes(bytes))
        }
    };
}

/// Growable output buffer.
#[derive(Debug, Default)]
pub struct Writer {
    buffer: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    impl_write_le!(write_u8, u8);
    impl_write_le!(write_i8, i8);
    impl_write_le!(write_u16_le, u16);
    impl_write_le!(write_i16_le, i16);
    impl_write_le!(write_u32_le, u32);
    impl_write_le!(write_i32_le, i32);
    impl_write_le!(write_u64_le, u64);
    impl_write_le!(write_i64_le, i64);
    impl_write_le!(write_f32_le, f32);
    impl_write_le!(write_f64_le, f64);

    pub fn write_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// `u32` length prefix then the bytes.
    pub fn write_prefixed(&mut self, data: &[u8]) -> Result<()> {
        self.write_len(data.len())?;
        self.write_bytes(data);
        Ok(())
    }

    /// Length or count prefix.
    pub fn write_len(&mut self, len: usize) -> Result<()> {
        let len = u32::try_from(len).map_err(|_| {
            Error::new(
                ErrorKind::SerializationFailure,
                format!("length {} does not fit the u32 prefix", len),
            )
        })?;
        self.write_u32_le(len);
        Ok(())
    }

    pub fn offset(&self) -> usize {
        self.buffer.len()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }
}

/// Bounds-checked reading cursor.
pub struct Cursor<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    impl_read_le!(read_u8, u8, 1);
    impl_read_le!(read_i8, i8, 1);
    impl_read_le!(read_u16_le, u16, 2);
    impl_read_le!(read_i16_le, i16, 2);
    impl_read_le!(read_u32_le, u32, 4);
    impl_read_le!(read_i32_le, i32, 4);
    impl_read_le!(read_u64_le, u64, 8);
    impl_read_le!(read_i64_le, i64, 8);
    impl_read_le!(read_f32_le, f32, 4);
    impl_read_le!(read_f64_le, f64, 8);

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.buffer.len())
            .ok_or_else(|| Error::deserialization(self.offset, "unexpected end of buffer"))?;
        let slice = &self.buffer[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    /// Length or count prefix. Never trusts it beyond the bytes left, since
    /// every element takes at least `min_element` bytes.
    pub fn read_len(&mut self, min_element: usize) -> Result<usize> {
        let at = self.offset;
        let len = self.read_u32_le()? as usize;
        if len.saturating_mul(min_element) > self.remaining() {
            return Err(Error::deserialization(
                at,
                format!("length {} exceeds remaining {} bytes", len, self.remaining()),
            ));
        }
        Ok(len)
    }

    /// `u32` length prefix then the bytes.
    pub fn read_prefixed(&mut self) -> Result<&'a [u8]> {
        let len = self.read_len(1)?;
        self.read_bytes(len)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    pub fn is_eof(&self) -> bool {
        self.offset >= self.buffer.len()
    }
}
