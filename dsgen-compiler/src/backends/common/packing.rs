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

use crate::layout::{Error, Field, Record};
use serde::Serialize;
use std::{fmt::Debug, ops::Deref};

pub trait Symbol: Clone + Debug + Eq {}
impl<T: Clone + Debug + Eq> Symbol for T {}

/// A field placed inside a transfer word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slot<S: Symbol> {
    /// Offset into the word where this field starts.
    pub offset: usize,
    /// Language-specific symbol (variable, field, etc.) which holds the value to encode.
    pub symbol: S,
    /// Width of the encodable value in bits.
    pub width: usize,
}

/// One transfer word and the fields it carries, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Word<S: Symbol> {
    pub slots: Vec<Slot<S>>,
    /// Number of bits used by the slots.
    pub used: usize,
}

/// Packs a sequence of fields into fixed-width transfer words.
///
/// Fields are laid out greedily in arrival order: a new word is opened
/// whenever the next field does not fit in the remaining bits of the
/// current one. Fields are never split across words and never reordered.
#[derive(Debug)]
pub struct WordPacker<S: Symbol> {
    word_width: usize,
    words: Vec<Word<S>>,
}

impl<S: Symbol> WordPacker<S> {
    pub fn new(word_width: usize) -> Self {
        Self { word_width, words: vec![] }
    }

    /// Get the generated words.
    pub fn pack(self) -> Placement<S> {
        Placement { word_width: self.word_width, words: self.words }
    }

    /// Place the next field. Fails if the field is wider than a word.
    pub fn add_field(&mut self, symbol: S, width: usize) -> Result<(), usize> {
        if width > self.word_width {
            return Err(width);
        }
        match self.words.last_mut() {
            Some(word) if word.used + width <= self.word_width => {
                word.slots.push(Slot { offset: word.used, symbol, width });
                word.used += width;
            }
            _ => self.words.push(Word { slots: vec![Slot { offset: 0, symbol, width }], used: width }),
        }
        Ok(())
    }
}

/// Word-by-word placement of a record for one word width.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement<S: Symbol> {
    pub word_width: usize,
    pub words: Vec<Word<S>>,
}

impl<S: Symbol> Deref for Placement<S> {
    type Target = Vec<Word<S>>;

    fn deref(&self) -> &Self::Target {
        &self.words
    }
}

impl<S: Symbol> Placement<S> {
    /// Iterate over every slot with the index of its word.
    pub fn slots(&self) -> impl Iterator<Item = (usize, &Slot<S>)> {
        self.words
            .iter()
            .enumerate()
            .flat_map(|(index, word)| word.slots.iter().map(move |slot| (index, slot)))
    }

    /// Return the word index and bit offset of a symbol, if placed.
    pub fn locate(&self, symbol: &S) -> Option<(usize, usize)> {
        self.slots().find(|(_, slot)| &slot.symbol == symbol).map(|(index, slot)| (index, slot.offset))
    }
}

/// Compute the placement of a record's fields for one word width.
///
/// Every field is checked against the word width before packing,
/// and all the offending fields are reported.
pub fn pack_record(record: &Record, word_width: usize) -> Result<Placement<&Field>, Vec<Error>> {
    let errors = record.check_word_width(word_width);
    if !errors.is_empty() {
        return Err(errors);
    }

    let mut packer = WordPacker::new(word_width);
    for field in &record.fields {
        packer.add_field(field, field.width()).map_err(|width| {
            vec![Error::FieldTooWide { field: field.id.clone(), width, word_width }]
        })?;
    }
    Ok(packer.pack())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::layout::Type;

    fn record(widths: &[usize]) -> Record {
        let mut record = Record::new("R");
        for (index, width) in widths.iter().enumerate() {
            record.append(Field::new(&format!("f{index}"), Type::unsigned(*width).unwrap()));
        }
        record
    }

    fn offsets(placement: &Placement<&Field>) -> Vec<(String, usize, usize)> {
        placement
            .slots()
            .map(|(index, slot)| (slot.symbol.id.clone(), index, slot.offset))
            .collect()
    }

    #[test]
    fn fields_share_a_word() {
        let mut record = Record::new("R");
        record
            .append(Field::new("a", Type::unsigned(8).unwrap()))
            .append(Field::new("b", Type::signed(16).unwrap()));
        let placement = pack_record(&record, 32).unwrap();
        assert_eq!(placement.len(), 1);
        assert_eq!(placement[0].used, 24);
        assert_eq!(
            offsets(&placement),
            vec![("a".to_owned(), 0, 0), ("b".to_owned(), 0, 8)]
        );
    }

    #[test]
    fn field_opens_new_word_when_it_does_not_fit() {
        let record = record(&[20, 20]);
        let placement = pack_record(&record, 32).unwrap();
        assert_eq!(placement.len(), 2);
        assert_eq!(
            offsets(&placement),
            vec![("f0".to_owned(), 0, 0), ("f1".to_owned(), 1, 0)]
        );
    }

    #[test]
    fn fields_are_never_reordered() {
        // Reordering as 20+12, 20 would use two words.
        let record = record(&[20, 20, 12]);
        let placement = pack_record(&record, 32).unwrap();
        assert_eq!(placement.len(), 2);
        assert_eq!(placement.locate(&&record.fields[2]), Some((1, 20)));
        assert_eq!(
            offsets(&placement),
            vec![("f0".to_owned(), 0, 0), ("f1".to_owned(), 1, 0), ("f2".to_owned(), 1, 20)]
        );
    }

    #[test]
    fn field_filling_the_word() {
        let record = record(&[32, 1, 31, 32]);
        let placement = pack_record(&record, 32).unwrap();
        assert_eq!(placement.len(), 3);
        assert_eq!(placement.iter().map(|word| word.used).collect::<Vec<_>>(), vec![32, 32, 32]);
    }

    #[test]
    fn empty_record_has_no_words() {
        let record = record(&[]);
        let placement = pack_record(&record, 32).unwrap();
        assert!(placement.is_empty());
    }

    #[test]
    fn field_too_wide() {
        assert_eq!(
            pack_record(&record(&[8, 33, 64]), 32),
            Err(vec![
                Error::FieldTooWide { field: "f1".to_owned(), width: 33, word_width: 32 },
                Error::FieldTooWide { field: "f2".to_owned(), width: 64, word_width: 32 },
            ])
        );
        let mut packer = WordPacker::new(8);
        assert_eq!(packer.add_field("x", 9), Err(9));
    }

    #[test]
    fn word_count_matches_arrival_count() {
        // Deterministic pseudo-random field lists.
        let mut seed = 0x2545_f491u32;
        for word_width in [8, 24, 32, 64, 100] {
            for _ in 0..50 {
                let widths: Vec<usize> = (0..(seed % 12) as usize)
                    .map(|_| {
                        seed ^= seed << 13;
                        seed ^= seed >> 17;
                        seed ^= seed << 5;
                        1 + (seed as usize) % word_width
                    })
                    .collect();
                seed = seed.wrapping_add(0x9e37_79b9);

                let mut expected = 0;
                let mut used = None;
                for width in &widths {
                    match used {
                        Some(bits) if bits + width <= word_width => used = Some(bits + width),
                        _ => {
                            expected += 1;
                            used = Some(*width);
                        }
                    }
                }

                let record = record(&widths);
                let placement = pack_record(&record, word_width).unwrap();
                assert_eq!(placement.len(), expected);
                for word in placement.iter() {
                    let mut end = 0;
                    for slot in &word.slots {
                        assert_eq!(slot.offset, end, "slots overlap or leave a gap");
                        end = slot.offset + slot.width;
                    }
                    assert!(end <= word_width);
                }
            }
        }
    }
}
