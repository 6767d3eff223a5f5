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

//! Header file wrapper and file naming conventions.

use heck::{ToShoutySnakeCase, ToSnakeCase};

/// Name of the header generated for the record `record_id`.
pub fn default_file_name(record_id: &str) -> String {
    format!("{}.h", record_id.to_snake_case())
}

/// Include guard macro derived from a header file name.
pub fn include_guard(file_name: &str) -> String {
    file_name.replace(['.', '-'], "_").to_shouty_snake_case()
}

/// Wrap generated class definitions into a self contained header.
pub fn header(guard: &str, code: &str) -> String {
    format!(
        r#"// File generated by dsgen, do not modify.

#ifndef {guard}
#define {guard}

#include <hls_stream.h>
#include <ap_int.h>
#include <ap_axi_sdata.h>
#include <cstdint>
#include <string>
#include <sstream>

{code}
#endif // {guard}
"#,
        guard = guard,
        code = code
    )
}
