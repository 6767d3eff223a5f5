// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Software model of the HLS primitives targeted by the generated
//! stream routines: `ap_uint<N>`, `ap_axiu<N, 0, 0, 0>` and `hls::stream`.

use bytes::{BufMut, Bytes, BytesMut};
use std::collections::VecDeque;
use std::fmt;

/// Type of bit range errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("range ({high}, {low}) is outside of the {width}-bit word")]
    OutOfBounds { high: usize, low: usize, width: usize },
    #[error("range ({high}, {low}) is wider than 128 bits")]
    TooWide { high: usize, low: usize },
}

/// Type of stream read errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("read from an empty stream")]
    EmptyStream,
    #[error(transparent)]
    Range(#[from] RangeError),
}

/// Arbitrary precision unsigned integer, modelled after `ap_uint<N>`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ApUint {
    width: usize,
    limbs: Vec<u64>,
}

impl ApUint {
    /// Create a zero valued word of `width` bits.
    pub fn new(width: usize) -> Self {
        ApUint { width, limbs: vec![0; width.div_ceil(64)] }
    }

    /// Create a word of `width` bits with all bits set, i.e. the
    /// result of assigning `-1`.
    pub fn ones(width: usize) -> Self {
        let mut word = ApUint { width, limbs: vec![u64::MAX; width.div_ceil(64)] };
        word.truncate();
        word
    }

    /// Rebuild a word from its little-endian byte image.
    /// Bytes past the word width are ignored.
    pub fn from_bytes(width: usize, bytes: &[u8]) -> Self {
        let mut word = ApUint::new(width);
        for (index, byte) in bytes.iter().enumerate().take(width.div_ceil(8)) {
            word.limbs[index / 8] |= (*byte as u64) << ((index % 8) * 8);
        }
        word.truncate();
        word
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Read the bits `[high, low]`, equivalent to `word.range(high, low)`.
    pub fn range(&self, high: usize, low: usize) -> Result<u128, RangeError> {
        self.check_range(high, low)?;
        let mut value = 0u128;
        for bit in (low..=high).rev() {
            value = (value << 1) | self.bit(bit) as u128;
        }
        Ok(value)
    }

    /// Overwrite the bits `[high, low]` with the low bits of `value`,
    /// equivalent to `word.range(high, low) = value`.
    pub fn set_range(&mut self, high: usize, low: usize, value: u128) -> Result<(), RangeError> {
        self.check_range(high, low)?;
        for bit in low..=high {
            self.set_bit(bit, (value >> (bit - low)) & 1 == 1);
        }
        Ok(())
    }

    /// Little-endian byte image of the word, `ceil(width / 8)` bytes long.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.width.div_ceil(8));
        for index in 0..self.width.div_ceil(8) {
            buf.put_u8((self.limbs[index / 8] >> ((index % 8) * 8)) as u8);
        }
        buf.freeze()
    }

    fn check_range(&self, high: usize, low: usize) -> Result<(), RangeError> {
        if low > high || high >= self.width {
            Err(RangeError::OutOfBounds { high, low, width: self.width })
        } else if high - low >= 128 {
            Err(RangeError::TooWide { high, low })
        } else {
            Ok(())
        }
    }

    fn bit(&self, index: usize) -> bool {
        (self.limbs[index / 64] >> (index % 64)) & 1 == 1
    }

    fn set_bit(&mut self, index: usize, value: bool) {
        let mask = 1u64 << (index % 64);
        if value {
            self.limbs[index / 64] |= mask;
        } else {
            self.limbs[index / 64] &= !mask;
        }
    }

    // Clear the bits past the word width in the last limb.
    fn truncate(&mut self) {
        let used = self.width % 64;
        if let (Some(last), true) = (self.limbs.last_mut(), used != 0) {
            *last &= (1u64 << used) - 1;
        }
    }
}

impl fmt::Debug for ApUint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ap_uint<{}>(0x", self.width)?;
        for limb in self.limbs.iter().rev() {
            write!(f, "{:016x}", limb)?;
        }
        write!(f, ")")
    }
}

/// One beat of an AXI4-Stream interface, modelled after
/// `ap_axiu<N, 0, 0, 0>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisWord {
    pub data: ApUint,
    pub keep: ApUint,
    pub strb: ApUint,
    pub last: bool,
}

impl AxisWord {
    /// Default constructed word: every member is zero.
    pub fn new(width: usize) -> Self {
        AxisWord {
            data: ApUint::new(width),
            keep: ApUint::new(width.div_ceil(8)),
            strb: ApUint::new(width.div_ceil(8)),
            last: false,
        }
    }

    pub fn width(&self) -> usize {
        self.data.width()
    }
}

/// First-in first-out channel, modelled after `hls::stream<T>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stream<T> {
    words: VecDeque<T>,
}

impl<T> Default for Stream<T> {
    fn default() -> Self {
        Stream { words: VecDeque::new() }
    }
}

impl<T> Stream<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pop the oldest word. The hardware stream would block, the
    /// model reports the underflow instead.
    pub fn read(&mut self) -> Result<T, DecodeError> {
        self.words.pop_front().ok_or(DecodeError::EmptyStream)
    }

    pub fn write(&mut self, word: T) {
        self.words.push_back(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.words.iter()
    }
}

impl Stream<AxisWord> {
    /// Concatenated byte image of the data lanes of every queued word.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::new();
        for word in self.words.iter() {
            buf.put(word.data.to_bytes());
        }
        buf.freeze()
    }
}
