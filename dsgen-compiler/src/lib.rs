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

//! Serialization code generator for bit-packed records exchanged over
//! AXI4-Stream interfaces.
//!
//! A record description is parsed ([`parser`]), checked and lowered
//! into a [`layout::Record`] ([`analyzer`]), packed into transfer words
//! for each selected bus width ([`backends::common::packing`]) and
//! turned into Vitis HLS C++ ([`backends::hls`]).

pub mod analyzer;
pub mod ast;
pub mod backends;
pub mod layout;
pub mod model;
pub mod parser;
#[cfg(test)]
pub mod test_utils;
