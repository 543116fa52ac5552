//! Bounds-checked little-endian reader for program account buffers.
//!
//! Fields are read strictly in order with no padding. Every read checks the
//! remaining length first and reports the field name and offset on failure.

use solana_program::pubkey::Pubkey;

use crate::constants::{DISCRIMINATOR_LEN, PUBKEY_LEN};
use crate::error::{SdkError, SdkResult};

pub struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Start after the 8-byte account discriminator.
    pub fn after_discriminator(data: &'a [u8]) -> SdkResult<Self> {
        let mut reader = Self::new(data);
        reader.take("discriminator", DISCRIMINATOR_LEN)?;
        Ok(reader)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    fn take(&mut self, field: &'static str, len: usize) -> SdkResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(SdkError::BufferTooShort {
                field,
                offset: self.offset,
                needed: len,
                available: self.remaining(),
            });
        }
        let slice = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self, field: &'static str) -> SdkResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(field, N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self, field: &'static str) -> SdkResult<u8> {
        Ok(self.take(field, 1)?[0])
    }

    pub fn read_u16(&mut self, field: &'static str) -> SdkResult<u16> {
        Ok(u16::from_le_bytes(self.array(field)?))
    }

    pub fn read_u32(&mut self, field: &'static str) -> SdkResult<u32> {
        Ok(u32::from_le_bytes(self.array(field)?))
    }

    pub fn read_u64(&mut self, field: &'static str) -> SdkResult<u64> {
        Ok(u64::from_le_bytes(self.array(field)?))
    }

    pub fn read_i64(&mut self, field: &'static str) -> SdkResult<i64> {
        Ok(i64::from_le_bytes(self.array(field)?))
    }

    /// Strict bool: anything other than 0 or 1 is a layout mismatch.
    pub fn read_bool(&mut self, field: &'static str) -> SdkResult<bool> {
        match self.read_u8(field)? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(SdkError::UnknownVariant { field, value }),
        }
    }

    pub fn read_pubkey(&mut self, field: &'static str) -> SdkResult<Pubkey> {
        Ok(Pubkey::new_from_array(self.array::<PUBKEY_LEN>(field)?))
    }

    /// Borsh `Option<T>`: one presence byte, then the body when present.
    pub fn read_option<T>(
        &mut self,
        field: &'static str,
        read: impl FnOnce(&mut Self) -> SdkResult<T>,
    ) -> SdkResult<Option<T>> {
        if self.read_bool(field)? {
            read(self).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Borsh `Vec<T>`: u32 LE count, then `count` entries of `entry_len` bytes.
    ///
    /// The whole body is length-checked up front so a corrupt count cannot
    /// drive a huge allocation.
    pub fn read_vec<T>(
        &mut self,
        field: &'static str,
        entry_len: usize,
        mut read: impl FnMut(&mut Self) -> SdkResult<T>,
    ) -> SdkResult<Vec<T>> {
        let count = self.read_u32(field)? as usize;
        let needed = count.checked_mul(entry_len).ok_or(SdkError::ArithmeticOverflow)?;
        if self.remaining() < needed {
            return Err(SdkError::BufferTooShort {
                field,
                offset: self.offset,
                needed,
                available: self.remaining(),
            });
        }
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(read(self)?);
        }
        Ok(items)
    }
}
