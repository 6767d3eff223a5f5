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

//! Width specific stream routines and the width dispatchers.

use super::indent;
use super::types::{decode, encode};
use crate::backends::common::packing::Placement;
use crate::layout::{Error, Field, Record};

fn word_var(index: usize) -> String {
    format!("w{}", index)
}

fn width_check(record: &Record, routine: &str, width: usize) -> Vec<String> {
    vec![
        "constexpr int bus_bits = decltype(Tstream::data)::width;".to_owned(),
        format!(
            "static_assert(bus_bits == {width}, \"Only {width}-bit stream supported in {}::{}_{width}\");",
            record.id, routine
        ),
    ]
}

/// Generate `stream_read_<W>`: one `in.read()` per word, then the
/// field reads of that word. Returns the `last` flag of the final word.
pub fn generate_stream_read(
    record: &Record,
    placement: &Placement<&Field>,
) -> Result<String, Error> {
    let width = placement.word_width;
    let mut body = width_check(record, "stream_read", width);
    body.push(String::new());

    for (index, word) in placement.iter().enumerate() {
        let var = word_var(index);
        body.push(format!("Tstream {} = in.read();", var));
        for slot in &word.slots {
            let expr = decode(&slot.symbol.ty, &format!("{}.data", var), width, slot.offset)?;
            body.push(format!("this->{} = {};", slot.symbol.id, expr));
        }
    }

    match placement.len() {
        0 => body.push("return true;".to_owned()),
        count => {
            body.push(format!("bool tlast = {}.last;", word_var(count - 1)));
            body.push(String::new());
            body.push("return tlast;".to_owned());
        }
    }

    Ok(format!(
        "template<typename Tstream>\nbool stream_read_{}(hls::stream<Tstream>& in) {{\n{}\n}}",
        width,
        indent(&body.join("\n"), 1)
    ))
}

/// Generate `stream_write_<W>`: every word is cleared, filled, and
/// written in order. Only the final word carries the caller's `tlast`.
pub fn generate_stream_write(
    record: &Record,
    placement: &Placement<&Field>,
) -> Result<String, Error> {
    let width = placement.word_width;
    let mut body = width_check(record, "stream_write", width);

    for (index, word) in placement.iter().enumerate() {
        let var = word_var(index);
        body.push(String::new());
        body.push(format!("Tstream {};", var));
        body.push(format!("{}.data = 0;", var));
        body.push(format!("{}.keep = -1;", var));
        body.push(format!("{}.strb = -1;", var));
        for slot in &word.slots {
            body.push(encode(
                &slot.symbol.ty,
                &format!("this->{}", slot.symbol.id),
                &format!("{}.data", var),
                width,
                slot.offset,
            )?);
        }
        let last = if index + 1 == placement.len() { "tlast" } else { "false" };
        body.push(format!("{}.last = {};", var, last));
        body.push(format!("out.write({});", var));
    }

    Ok(format!(
        "template<typename Tstream>\nvoid stream_write_{}(hls::stream<Tstream>& out, bool tlast = true) const {{\n{}\n}}",
        width,
        indent(&body.join("\n"), 1)
    ))
}

const READ_SIGNATURE: &str = "template<typename Tstream>\nbool stream_read(hls::stream<Tstream>& in) {";
const WRITE_SIGNATURE: &str =
    "template<typename Tstream>\nvoid stream_write(hls::stream<Tstream>& out, bool tlast = true) const {";

/// Generate the `stream_read` and `stream_write` dispatchers.
///
/// The width specific routine is selected with `if constexpr` on the
/// width of `Tstream::data`; any other width fails to compile. Without
/// configured widths the dispatchers fail to compile unconditionally.
pub fn generate_stream_dispatch(record: &Record, widths: &[usize]) -> (String, String) {
    let Some(first) = widths.first() else {
        let unconfigured = format!(
            "static_assert(sizeof(Tstream) == 0, \"No stream bus widths configured for {}\");",
            record.id
        );
        return (
            format!("{}\n{}\n    return false;\n}}", READ_SIGNATURE, indent(&unconfigured, 1)),
            format!("{}\n{}\n}}", WRITE_SIGNATURE, indent(&unconfigured, 1)),
        );
    };

    let supported = widths.iter().map(|width| width.to_string()).collect::<Vec<_>>().join(", ");
    let unsupported = format!(
        "static_assert(bus_bits == {}, \"Unsupported bus width. Supported widths: {}\");",
        first, supported
    );

    let mut read = vec!["constexpr int bus_bits = decltype(Tstream::data)::width;".to_owned()];
    let mut write = read.clone();
    for (index, width) in widths.iter().enumerate() {
        let branch = if index == 0 { "if constexpr" } else { "} else if constexpr" };
        read.push(format!("{} (bus_bits == {}) {{", branch, width));
        read.push(format!("    return stream_read_{}(in);", width));
        write.push(format!("{} (bus_bits == {}) {{", branch, width));
        write.push(format!("    stream_write_{}(out, tlast);", width));
    }
    read.extend(["} else {".to_owned(), indent(&unsupported, 1), "    return false;".to_owned()]);
    write.extend(["} else {".to_owned(), indent(&unsupported, 1)]);
    read.push("}".to_owned());
    write.push("}".to_owned());

    (
        format!("{}\n{}\n}}", READ_SIGNATURE, indent(&read.join("\n"), 1)),
        format!("{}\n{}\n}}", WRITE_SIGNATURE, indent(&write.join("\n"), 1)),
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::backends::common::packing::pack_record;
    use crate::layout::Type;
    use crate::test_utils::{assert_contains, assert_eq_with_diff};

    fn scenario() -> Record {
        let mut record = Record::new("Sample");
        record
            .append(Field::new("a", Type::unsigned(8).unwrap()))
            .append(Field::new("b", Type::signed(16).unwrap()));
        record
    }

    #[test]
    fn read_single_word() {
        let record = scenario();
        let placement = pack_record(&record, 32).unwrap();
        assert_eq_with_diff(
            "expected",
            r#"template<typename Tstream>
bool stream_read_32(hls::stream<Tstream>& in) {
    constexpr int bus_bits = decltype(Tstream::data)::width;
    static_assert(bus_bits == 32, "Only 32-bit stream supported in Sample::stream_read_32");

    Tstream w0 = in.read();
    this->a = w0.data.range(7, 0);
    this->b = w0.data.range(23, 8);
    bool tlast = w0.last;

    return tlast;
}"#,
            "actual",
            &generate_stream_read(&record, &placement).unwrap(),
        );
    }

    #[test]
    fn write_single_word() {
        let record = scenario();
        let placement = pack_record(&record, 32).unwrap();
        assert_eq_with_diff(
            "expected",
            r#"template<typename Tstream>
void stream_write_32(hls::stream<Tstream>& out, bool tlast = true) const {
    constexpr int bus_bits = decltype(Tstream::data)::width;
    static_assert(bus_bits == 32, "Only 32-bit stream supported in Sample::stream_write_32");

    Tstream w0;
    w0.data = 0;
    w0.keep = -1;
    w0.strb = -1;
    w0.data.range(7, 0) = this->a;
    w0.data.range(23, 8) = this->b;
    w0.last = tlast;
    out.write(w0);
}"#,
            "actual",
            &generate_stream_write(&record, &placement).unwrap(),
        );
    }

    #[test]
    fn write_marks_only_the_final_word() {
        let mut record = Record::new("Pair");
        record
            .append(Field::new("a", Type::unsigned(20).unwrap()))
            .append(Field::new("b", Type::unsigned(20).unwrap()));
        let placement = pack_record(&record, 32).unwrap();
        let code = generate_stream_write(&record, &placement).unwrap();
        assert_contains(&code, "    w0.data.range(19, 0) = this->a;\n    w0.last = false;\n    out.write(w0);");
        assert_contains(&code, "    w1.data.range(19, 0) = this->b;\n    w1.last = tlast;\n    out.write(w1);");
        assert_eq!(code.matches("out.write(").count(), 2);

        let code = generate_stream_read(&record, &placement).unwrap();
        assert_contains(&code, "    Tstream w1 = in.read();\n    this->b = w1.data.range(19, 0);");
        assert_contains(&code, "bool tlast = w1.last;");
    }

    #[test]
    fn whole_word_fields_use_direct_assignment() {
        let mut record = Record::new("Wide");
        record.append(Field::new("x", Type::unsigned(64).unwrap()));
        let placement = pack_record(&record, 64).unwrap();
        assert_contains(&generate_stream_read(&record, &placement).unwrap(), "this->x = w0.data;");
        assert_contains(&generate_stream_write(&record, &placement).unwrap(), "w0.data = this->x;");
        let placement = pack_record(&record, 128).unwrap();
        assert_contains(
            &generate_stream_read(&record, &placement).unwrap(),
            "this->x = w0.data.range(63, 0);",
        );
    }

    #[test]
    fn fields_named_like_generated_locals() {
        let mut record = Record::new("Shadow");
        record
            .append(Field::new("tlast", Type::unsigned(8).unwrap()))
            .append(Field::new("w1", Type::unsigned(30).unwrap()))
            .append(Field::new("conv", Type::Float));
        let placement = pack_record(&record, 32).unwrap();

        let write = generate_stream_write(&record, &placement).unwrap();
        assert_contains(&write, "    w0.data.range(7, 0) = this->tlast;\n    w0.last = false;");
        assert_contains(&write, "    w1.data.range(29, 0) = this->w1;\n    w1.last = false;");
        assert_contains(&write, "conv.f = this->conv;");
        assert!(!write.contains("= tlast;\n    w0"));

        let read = generate_stream_read(&record, &placement).unwrap();
        assert_contains(&read, "    this->tlast = w0.data.range(7, 0);");
        assert_contains(&read, "    this->w1 = w1.data.range(29, 0);");
        assert_contains(
            &read,
            "    this->conv = [&] { union { float f; uint32_t u; } conv; conv.u = w2.data.range(31, 0).to_uint(); return conv.f; }();",
        );
        assert_contains(&read, "    bool tlast = w2.last;");
    }

    #[test]
    fn empty_record_routines() {
        let record = Record::new("Empty");
        let placement = pack_record(&record, 32).unwrap();
        let read = generate_stream_read(&record, &placement).unwrap();
        assert_contains(&read, "    return true;\n}");
        assert!(!read.contains("in.read()"));
        let write = generate_stream_write(&record, &placement).unwrap();
        assert!(!write.contains("out.write("));
    }

    #[test]
    fn dispatch_over_widths() {
        let (read, write) = generate_stream_dispatch(&scenario(), &[32, 64]);
        assert_eq_with_diff(
            "expected",
            r#"template<typename Tstream>
bool stream_read(hls::stream<Tstream>& in) {
    constexpr int bus_bits = decltype(Tstream::data)::width;
    if constexpr (bus_bits == 32) {
        return stream_read_32(in);
    } else if constexpr (bus_bits == 64) {
        return stream_read_64(in);
    } else {
        static_assert(bus_bits == 32, "Unsupported bus width. Supported widths: 32, 64");
        return false;
    }
}"#,
            "actual",
            &read,
        );
        assert_eq_with_diff(
            "expected",
            r#"template<typename Tstream>
void stream_write(hls::stream<Tstream>& out, bool tlast = true) const {
    constexpr int bus_bits = decltype(Tstream::data)::width;
    if constexpr (bus_bits == 32) {
        stream_write_32(out, tlast);
    } else if constexpr (bus_bits == 64) {
        stream_write_64(out, tlast);
    } else {
        static_assert(bus_bits == 32, "Unsupported bus width. Supported widths: 32, 64");
    }
}"#,
            "actual",
            &write,
        );
    }

    #[test]
    fn dispatch_without_widths_never_compiles() {
        let (read, write) = generate_stream_dispatch(&scenario(), &[]);
        assert_eq_with_diff(
            "expected",
            r#"template<typename Tstream>
bool stream_read(hls::stream<Tstream>& in) {
    static_assert(sizeof(Tstream) == 0, "No stream bus widths configured for Sample");
    return false;
}"#,
            "actual",
            &read,
        );
        assert_contains(&write, "static_assert(sizeof(Tstream) == 0, \"No stream bus widths configured for Sample\");");
        assert!(!write.contains("stream_write_"));
    }
}
