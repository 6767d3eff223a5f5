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

//! Transfer word serialization code generator.

use argh::FromArgs;
use codespan_reporting::term::{self, termcolor};
use std::path::Path;

use dsgen_compiler::{analyzer, ast, backends, layout, parser};

/// Bus width selected when none is given on the command line.
const DEFAULT_BUS_WIDTH: usize = 32;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum OutputFormat {
    Hls,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_lowercase().as_str() {
            "hls" => Ok(Self::Hls),
            "json" => Ok(Self::Json),
            _ => Err(format!("could not parse {input:?}, valid option are 'hls', 'json'.")),
        }
    }
}

#[derive(FromArgs, Debug)]
/// Transfer word serialization code generator.
struct Opt {
    #[argh(switch)]
    /// print tool version and exit.
    version: bool,

    #[argh(option, default = "OutputFormat::Hls")]
    /// generate output in this format ("hls", "json").
    /// The input file is the source record description.
    output_format: OutputFormat,

    #[argh(positional)]
    /// input file.
    input_file: Option<String>,

    #[argh(option)]
    /// bus width in bits supported by the generated stream routines.
    /// May be repeated, the first width is the default of the dispatchers.
    /// Defaults to 32 bits.
    bus_width: Vec<usize>,

    #[argh(switch)]
    /// generate the stream dispatchers without any supported bus width.
    no_bus_width: bool,

    #[argh(option)]
    /// exclude declarations from the generated output.
    exclude_declaration: Vec<String>,

    #[argh(option)]
    /// directory where generated headers should go, one per record.
    /// If omitted, the generated code will be printed to stdout.
    output_dir: Option<String>,

    #[argh(option)]
    /// name of the generated header, when a single record is generated.
    include_file: Option<String>,
}

/// Remove declarations listed in the input filter.
fn filter_declarations(file: ast::File, exclude_declarations: &[String]) -> ast::File {
    ast::File {
        declarations: file
            .declarations
            .into_iter()
            .filter(|decl| !exclude_declarations.iter().any(|id| id == decl.id()))
            .collect(),
        ..file
    }
}

fn emit_diagnostics(
    sources: &ast::SourceDatabase,
    diagnostics: &analyzer::Diagnostics,
) -> Result<(), String> {
    diagnostics
        .emit(sources, &mut termcolor::StandardStream::stderr(termcolor::ColorChoice::Always).lock())
        .map_err(|err| format!("could not print analyzer diagnostics: {err}"))
}

fn layout_errors(errors: Vec<layout::Error>) -> String {
    errors.iter().map(|err| err.to_string()).collect::<Vec<_>>().join("\n")
}

fn bus_widths(opt: &Opt) -> Vec<usize> {
    if opt.no_bus_width {
        vec![]
    } else if opt.bus_width.is_empty() {
        vec![DEFAULT_BUS_WIDTH]
    } else {
        opt.bus_width.clone()
    }
}

fn generate_hls(opt: &Opt, records: &[layout::Record], widths: &[usize]) -> Result<(), String> {
    let classes = records
        .iter()
        .map(|record| backends::hls::generate(record, widths).map_err(layout_errors))
        .collect::<Result<Vec<_>, _>>()?;

    let include_file = match (&opt.include_file, records) {
        (Some(include_file), [_]) => Some(include_file.clone()),
        (Some(_), _) if opt.output_dir.is_some() => {
            return Err(String::from("'--include-file' requires exactly one generated record"))
        }
        (include_file, _) => include_file.clone(),
    };

    let Some(output_dir) = opt.output_dir.as_ref() else {
        let file_name = include_file
            .or_else(|| records.first().map(|record| backends::hls::default_file_name(&record.id)))
            .unwrap_or_else(|| String::from("dsgen.h"));
        let code = classes.iter().map(|output| output.code.as_str()).collect::<Vec<_>>().join("\n");
        print!("{}", backends::hls::header(&backends::hls::include_guard(&file_name), &code));
        return Ok(());
    };

    let output_dir = Path::new(output_dir);
    std::fs::create_dir_all(output_dir)
        .map_err(|err| format!("could not create {}: {err}", output_dir.display()))?;
    for (record, output) in records.iter().zip(classes) {
        let file_name = include_file
            .clone()
            .unwrap_or_else(|| backends::hls::default_file_name(&record.id));
        let path = output_dir.join(&file_name);
        let text = backends::hls::header(&backends::hls::include_guard(&file_name), &output.code);
        std::fs::write(&path, text)
            .map_err(|err| format!("could not write {}: {err}", path.display()))?;
        eprintln!("Generated {} for bus widths {:?}", path.display(), output.widths);
    }
    Ok(())
}

fn generate_backend(opt: &Opt, input_file: &str) -> Result<(), String> {
    let mut sources = ast::SourceDatabase::new();
    let file = match parser::parse_file(&mut sources, input_file) {
        Ok(file) => filter_declarations(file, &opt.exclude_declaration),
        Err(err) => {
            let writer = termcolor::StandardStream::stderr(termcolor::ColorChoice::Always);
            let config = term::Config::default();
            term::emit(&mut writer.lock(), &config, &sources, &err)
                .map_err(|err| format!("could not print error: {err}"))?;
            return Err(String::from("Error while parsing input"));
        }
    };

    let records = match analyzer::analyze(&file) {
        Ok(records) => records,
        Err(diagnostics) => {
            emit_diagnostics(&sources, &diagnostics)?;
            return Err(String::from("Analysis failed"));
        }
    };

    let widths = match analyzer::check_bus_widths(&file, &records, &bus_widths(opt)) {
        Ok(widths) => widths,
        Err(diagnostics) => {
            emit_diagnostics(&sources, &diagnostics)?;
            return Err(String::from("Invalid bus widths"));
        }
    };

    let warnings = analyzer::warnings(&file, &widths);
    if !warnings.is_empty() {
        emit_diagnostics(&sources, &warnings)?;
    }

    match opt.output_format {
        OutputFormat::Hls => generate_hls(opt, &records, &widths),
        OutputFormat::Json if opt.output_dir.is_some() => {
            Err(String::from("'--output-dir' is only supported with '--output-format hls'"))
        }
        OutputFormat::Json => {
            println!("{}", backends::json::generate(&records, &widths)?);
            Ok(())
        }
    }
}

fn main() -> Result<(), String> {
    let opt: Opt = argh::from_env();

    if opt.version {
        println!("dsgen {}\nCopyright (C) 2025 Google LLC", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let Some(input_file) = opt.input_file.as_ref() else {
        return Err("No input file is specified".to_owned());
    };

    generate_backend(&opt, input_file)
}
