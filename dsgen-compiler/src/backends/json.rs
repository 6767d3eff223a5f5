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

//! JSON backend.

use crate::backends::common::packing::{Placement, WordPacker};
use crate::layout::{self, Record};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct RecordLayout<'a> {
    #[serde(flatten)]
    record: &'a Record,
    bit_width: usize,
    placements: Vec<Placement<&'a str>>,
}

#[derive(Debug, Serialize)]
struct Layouts<'a> {
    widths: Vec<usize>,
    records: Vec<RecordLayout<'a>>,
}

fn placement<'a>(record: &'a Record, word_width: usize) -> Result<Placement<&'a str>, String> {
    let mut packer = WordPacker::new(word_width);
    for field in &record.fields {
        packer.add_field(field.id.as_str(), field.width()).map_err(|width| {
            layout::Error::FieldTooWide { field: field.id.clone(), width, word_width }.to_string()
        })?;
    }
    Ok(packer.pack())
}

fn join_errors(errors: Vec<layout::Error>) -> String {
    errors.iter().map(|err| err.to_string()).collect::<Vec<_>>().join("\n")
}

/// Turn the record layouts and their word placements into a JSON
/// representation.
pub fn generate(records: &[Record], widths: &[usize]) -> Result<String, String> {
    let mut errors = layout::word_widths(widths).err().unwrap_or_default();
    let widths = layout::distinct_widths(widths);
    for record in records {
        for width in &widths {
            errors.extend(record.check_word_width(*width));
        }
    }
    if !errors.is_empty() {
        return Err(join_errors(errors));
    }

    let mut layouts = Layouts { widths: widths.clone(), records: vec![] };
    for record in records {
        layouts.records.push(RecordLayout {
            record,
            bit_width: record.bit_width(),
            placements: widths
                .iter()
                .map(|width| placement(record, *width))
                .collect::<Result<Vec<_>, _>>()?,
        });
    }
    serde_json::to_string_pretty(&layouts)
        .map_err(|err| format!("could not JSON serialize layouts: {err}"))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::layout::{EnumType, Field, Type};
    use serde_json::{json, Value};

    fn sample() -> Record {
        let mut record = Record::new("Sample");
        record
            .append(Field::new("a", Type::unsigned(8).unwrap()).with_description("first"))
            .append(Field::new("b", Type::signed(16).unwrap()))
            .append(Field::new(
                "c",
                Type::enumeration(EnumType::new("Mode", vec!["OFF", "ON"], None).unwrap()),
            ));
        record
    }

    #[test]
    fn placements_are_reported_per_width() {
        let text = generate(&[sample()], &[16, 32]).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["widths"], json!([16, 32]));

        let record = &value["records"][0];
        assert_eq!(record["id"], "Sample");
        assert_eq!(record["bit_width"], 25);

        let narrow = &record["placements"][0];
        assert_eq!(narrow["word_width"], 16);
        assert_eq!(narrow["words"].as_array().unwrap().len(), 3);
        assert_eq!(narrow["words"][1]["slots"][0], json!({"offset": 0, "symbol": "b", "width": 16}));
        assert_eq!(narrow["words"][1]["used"], 16);

        let wide = &record["placements"][1];
        assert_eq!(wide["words"].as_array().unwrap().len(), 1);
        assert_eq!(wide["words"][0]["slots"][2], json!({"offset": 24, "symbol": "c", "width": 1}));
    }

    #[test]
    fn fields_are_described() {
        let text = generate(&[sample()], &[32]).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        let fields = &value["records"][0]["fields"];
        assert_eq!(
            fields[0],
            json!({
                "id": "a",
                "type": {"kind": "integer", "width": 8, "signed": false},
                "description": "first",
                "comment_style": "inline",
            })
        );
        assert_eq!(fields[1]["type"], json!({"kind": "integer", "width": 16, "signed": true}));
        assert_eq!(
            fields[2]["type"],
            json!({
                "kind": "enum",
                "id": "Mode",
                "tags": [{"id": "OFF", "value": 0}, {"id": "ON", "value": 1}],
                "width": 1,
            })
        );
    }

    #[test]
    fn invalid_widths_are_rejected() {
        assert!(generate(&[sample()], &[0]).is_err());
        let err = generate(&[sample()], &[8]).unwrap_err();
        assert_eq!(err, "field `b` has width 16 bits, which exceeds bus width 8 bits");
        let err = generate(&[sample()], &[0, 8]).unwrap_err();
        assert_eq!(
            err,
            "invalid width 0 for bus width, the width must be positive\n\
             field `b` has width 16 bits, which exceeds bus width 8 bits"
        );
    }
}
