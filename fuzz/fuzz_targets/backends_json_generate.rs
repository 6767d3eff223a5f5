#![no_main]

use dsgen_compiler::{analyzer, ast, backends, parser};
use libfuzzer_sys::fuzz_target;

// Fuzz dsgen_compiler::backends::json::generate.
fuzz_target!(|source: String| {
    let mut sources = ast::SourceDatabase::new();
    let Ok(file) = parser::parse_inline(&mut sources, "input.dsg", source) else {
        return;
    };
    let Ok(records) = analyzer::analyze(&file) else {
        return;
    };
    let _ = backends::json::generate(&records, &[32, 64]);
});
