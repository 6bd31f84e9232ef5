//! Fixed-width integer and raw byte codecs

use std::marker::PhantomData;

use byteorder::ByteOrder;

use super::Hexer;
use crate::cursor::Cursor;
use crate::error::Result;

/// Single byte codec for `u8` and `i8`
#[derive(Debug, Clone, Copy, Default)]
pub struct U8Hexer;

impl Hexer<u8> for U8Hexer {
    fn decode(&self, cursor: &Cursor) -> Result<u8> {
        Ok(cursor.get_byte(0)?)
    }

    fn encode(&self, value: &u8, cursor: &Cursor) -> Result<()> {
        Ok(cursor.write(0, &[*value])?)
    }

    fn size_of(&self, _value: &u8) -> u64 {
        1
    }
}

impl Hexer<i8> for U8Hexer {
    fn decode(&self, cursor: &Cursor) -> Result<i8> {
        Ok(cursor.get_byte(0)? as i8)
    }

    fn encode(&self, value: &i8, cursor: &Cursor) -> Result<()> {
        Ok(cursor.write(0, &[*value as u8])?)
    }

    fn size_of(&self, _value: &i8) -> u64 {
        1
    }
}

/// Multi-byte integer codec in byte order `B`
/// (`Ordered<LittleEndian>` for GBA/NDS data, `Ordered<BigEndian>` for N64/GameCube).
#[derive(Debug, Clone, Copy)]
pub struct Ordered<B> {
    _order: PhantomData<B>,
}

impl<B> Ordered<B> {
    pub const fn new() -> Self {
        Self {
            _order: PhantomData,
        }
    }
}

impl<B> Default for Ordered<B> {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! ordered_int {
    ($ty:ty, $width:expr, $read:ident, $write:ident) => {
        impl<B: ByteOrder> Hexer<$ty> for Ordered<B> {
            fn decode(&self, cursor: &Cursor) -> Result<$ty> {
                let mut buf = [0u8; $width];
                cursor.read_into(0, &mut buf)?;
                Ok(B::$read(&buf))
            }

            fn encode(&self, value: &$ty, cursor: &Cursor) -> Result<()> {
                let mut buf = [0u8; $width];
                B::$write(&mut buf, *value);
                Ok(cursor.write(0, &buf)?)
            }

            fn size_of(&self, _value: &$ty) -> u64 {
                $width
            }
        }
    };
}

ordered_int!(u16, 2, read_u16, write_u16);
ordered_int!(i16, 2, read_i16, write_i16);
ordered_int!(u32, 4, read_u32, write_u32);
ordered_int!(i32, 4, read_i32, write_i32);
ordered_int!(u64, 8, read_u64, write_u64);
ordered_int!(i64, 8, read_i64, write_i64);

/// Fixed-length byte array codec (magic numbers, padded names, reserved blocks)
#[derive(Debug, Clone, Copy, Default)]
pub struct RawBytes<const N: usize>;

impl<const N: usize> Hexer<[u8; N]> for RawBytes<N> {
    fn decode(&self, cursor: &Cursor) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        cursor.read_into(0, &mut buf)?;
        Ok(buf)
    }

    fn encode(&self, value: &[u8; N], cursor: &Cursor) -> Result<()> {
        Ok(cursor.write(0, value)?)
    }

    fn size_of(&self, _value: &[u8; N]) -> u64 {
        N as u64
    }
}
