#![no_main]

use dsgen_compiler::{analyzer, ast, backends, parser};
use libfuzzer_sys::fuzz_target;

// Fuzz dsgen_compiler::backends::hls::generate.
fuzz_target!(|source: String| {
    let mut sources = ast::SourceDatabase::new();
    let Ok(file) = parser::parse_inline(&mut sources, "input.dsg", source) else {
        return;
    };
    let Ok(records) = analyzer::analyze(&file) else {
        return;
    };
    let Ok(widths) = analyzer::check_bus_widths(&file, &records, &[8, 32, 64, 512]) else {
        return;
    };
    for record in &records {
        // Widths accepted by the analyzer must always generate.
        backends::hls::generate(record, &widths).unwrap();
    }
});
