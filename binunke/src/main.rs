//! Unke command-line tool for checking, formatting, and transcoding Unke documents.
//!
//! Usage: unke [OPTIONS] [FILE|DIR]
//!
//! Options:
//!   -f, --from <FORMAT>    Input format (unke, json, yaml, toml, cbor) [default: unke]
//!   -t, --to <FORMAT>      Output format (unke, json, yaml, toml, cbor) [default: unke]
//!   -w, --write            Write output to file with inferred name
//!   -o, --output <FILE>    Write output to specified file
//!   --check                Check if input is valid (exit 0 if valid, 1 if invalid)
//!   --compact              Single-line output
//!   --indent <N>           Spaces per nesting level [default: 4]
//!   -v, --verbose          Log parser activity to stderr
//!   -h, --help             Print help
//!   -V, --version          Print version

use libunke::{
    document_to_json, document_to_value, dumps, parse_with_filename, value_to_document, Document,
    DumpOptions, JsonOptions,
};
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod transcode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Unke,
    Json,
    Yaml,
    Toml,
    Cbor,
}

fn parse_format(s: &str) -> Option<Format> {
    match s {
        "unke" | "unk" => Some(Format::Unke),
        "json" => Some(Format::Json),
        "yaml" | "yml" => Some(Format::Yaml),
        "toml" => Some(Format::Toml),
        "cbor" => Some(Format::Cbor),
        _ => None,
    }
}

fn format_extension(format: Format) -> &'static str {
    match format {
        Format::Unke => "unk",
        Format::Json => "json",
        Format::Yaml => "yaml",
        Format::Toml => "toml",
        Format::Cbor => "cbor",
    }
}

fn format_name(format: Format) -> &'static str {
    match format {
        Format::Unke => "Unke",
        Format::Json => "JSON",
        Format::Yaml => "YAML",
        Format::Toml => "TOML",
        Format::Cbor => "CBOR",
    }
}

/// Settings shared by every input processed in one run.
struct Options {
    from: Format,
    to: Format,
    write_back: bool,
    output_file: Option<String>,
    check_only: bool,
    compact: bool,
    indent: usize,
}

impl Options {
    fn dump_options(&self) -> DumpOptions {
        if self.compact {
            DumpOptions::compact()
        } else {
            DumpOptions {
                beautify: true,
                indent: self.indent,
            }
        }
    }

    fn json_options(&self) -> JsonOptions {
        if self.compact {
            JsonOptions {
                indent: 0,
                minify: true,
            }
        } else {
            JsonOptions {
                indent: self.indent,
                minify: false,
            }
        }
    }
}

fn expect_value<'a>(args: &'a [String], i: usize, flag: &str) -> &'a str {
    match args.get(i) {
        Some(value) => value.as_str(),
        None => {
            eprintln!("Error: {} requires an argument", flag);
            process::exit(1);
        }
    }
}

fn expect_format(args: &[String], i: usize, flag: &str) -> Format {
    let name = expect_value(args, i, flag);
    parse_format(name).unwrap_or_else(|| {
        eprintln!("Error: Unknown format: {}", name);
        process::exit(1);
    })
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut options = Options {
        from: Format::Unke,
        to: Format::Unke,
        write_back: false,
        output_file: None,
        check_only: false,
        compact: false,
        indent: DumpOptions::default().indent,
    };
    let mut verbose = false;
    let mut input_path: Option<&str> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                return;
            }
            "-V" | "--version" => {
                println!("unke {}", env!("CARGO_PKG_VERSION"));
                return;
            }
            "-f" | "--from" => {
                i += 1;
                options.from = expect_format(&args, i, "-f");
            }
            "-t" | "--to" => {
                i += 1;
                options.to = expect_format(&args, i, "-t");
            }
            "-w" | "--write" => {
                options.write_back = true;
            }
            "-o" | "--output" => {
                i += 1;
                options.output_file = Some(expect_value(&args, i, "--output").to_string());
            }
            "--check" => {
                options.check_only = true;
            }
            "--compact" => {
                options.compact = true;
            }
            "--indent" => {
                i += 1;
                let value = expect_value(&args, i, "--indent");
                options.indent = value.parse().unwrap_or_else(|_| {
                    eprintln!("Error: --indent expects a number, got: {}", value);
                    process::exit(1);
                });
            }
            "-v" | "--verbose" => {
                verbose = true;
            }
            "-" => {
                // Explicit stdin
            }
            arg if arg.starts_with('-') => {
                eprintln!("Error: Unknown option: {}", arg);
                process::exit(1);
            }
            _ => {
                if input_path.is_some() {
                    eprintln!("Error: Multiple input paths not supported");
                    process::exit(1);
                }
                input_path = Some(&args[i]);
            }
        }
        i += 1;
    }

    if options.write_back && options.output_file.is_some() {
        eprintln!("Error: --write and --output are mutually exclusive");
        process::exit(1);
    }

    init_logging(verbose);

    if let Some(path) = input_path {
        if Path::new(path).is_dir() {
            if options.output_file.is_some() {
                eprintln!("Error: --output cannot be used with directory input");
                process::exit(1);
            }
            process::exit(process_directory(path, &options));
        }
    }

    let raw_bytes: Vec<u8> = match input_path {
        Some(path) => match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("Error reading {}: {}", path, e);
                process::exit(1);
            }
        },
        None => {
            let mut buffer = Vec::new();
            if let Err(e) = io::stdin().read_to_end(&mut buffer) {
                eprintln!("Error reading stdin: {}", e);
                process::exit(1);
            }
            buffer
        }
    };

    process::exit(process_input(&raw_bytes, input_path, &options));
}

/// Process every file in `dir_path` whose extension matches the input format.
fn process_directory(dir_path: &str, options: &Options) -> i32 {
    let entries = match fs::read_dir(dir_path) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Error reading directory {}: {}", dir_path, e);
            return 1;
        }
    };

    let ext = format_extension(options.from);
    let mut paths: Vec<_> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().map(|e| e == ext).unwrap_or(false))
        .collect();
    paths.sort();
    debug!(dir = dir_path, files = paths.len(), "processing directory");

    let mut had_errors = false;
    for path in paths {
        let path_str = path.to_string_lossy();
        let input = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("Error reading {}: {}", path_str, e);
                had_errors = true;
                continue;
            }
        };
        if process_input(&input, Some(&path_str), options) != 0 {
            had_errors = true;
        }
    }

    if had_errors {
        1
    } else {
        0
    }
}

fn process_input(input: &[u8], input_file: Option<&str>, options: &Options) -> i32 {
    let filename = input_file.map(|p| {
        Path::new(p)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| p.to_string())
    });

    let doc = match read_document(input, filename.as_deref(), options.from) {
        Ok(doc) => doc,
        Err(e) => {
            if let Some(path) = input_file {
                eprintln!("{}: {}", path, e);
            } else {
                eprintln!("Parse error: {}", e);
            }
            return 1;
        }
    };

    if options.check_only {
        if let Some(path) = input_file {
            println!("{}: ok", path);
        }
        return 0;
    }

    let output = match encode_document(&doc, options) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("Error: Cannot convert to {}: {}", format_name(options.to), e);
            return 1;
        }
    };

    let target = match output_target(input_file, options) {
        Ok(target) => target,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match write_output(&output, target.as_deref()) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error writing {}: {}", target.as_deref().unwrap_or("stdout"), e);
            1
        }
    }
}

fn utf8(input: &[u8]) -> Result<&str, String> {
    std::str::from_utf8(input).map_err(|e| format!("input is not valid UTF-8: {}", e))
}

/// Read the input as a document, going through the dictionary form for every
/// format but Unke itself.
fn read_document(input: &[u8], filename: Option<&str>, from: Format) -> Result<Document, String> {
    let value: serde_json::Value = match from {
        Format::Unke => {
            return parse_with_filename(utf8(input)?, filename).map_err(|e| e.to_string());
        }
        Format::Json => {
            serde_json::from_slice(input).map_err(|e| format!("JSON parse error: {}", e))?
        }
        Format::Yaml => transcode::yaml::decode(utf8(input)?)?,
        Format::Toml => transcode::toml::decode(utf8(input)?)?,
        Format::Cbor => transcode::cbor::decode(input)?,
    };
    value_to_document(&value).map_err(|e| e.to_string())
}

fn encode_document(doc: &Document, options: &Options) -> Result<Vec<u8>, String> {
    let text = match options.to {
        Format::Unke => dumps(doc, &options.dump_options()).map_err(|e| e.to_string())?,
        Format::Json => document_to_json(doc, &options.json_options()).map_err(|e| e.to_string())?,
        Format::Yaml => transcode::yaml::encode(&dictionary(doc)?)?,
        Format::Toml => transcode::toml::encode(&dictionary(doc)?)?,
        Format::Cbor => return transcode::cbor::encode(&dictionary(doc)?),
    };
    let mut bytes = text.into_bytes();
    if bytes.last() != Some(&b'\n') {
        bytes.push(b'\n');
    }
    Ok(bytes)
}

fn dictionary(doc: &Document) -> Result<serde_json::Value, String> {
    document_to_value(doc).map_err(|e| e.to_string())
}

/// Where the output goes: an explicit file, a sibling of the input with the
/// output format's extension, or stdout (`None`).
fn output_target(input_file: Option<&str>, options: &Options) -> Result<Option<String>, String> {
    if let Some(path) = &options.output_file {
        return Ok(Some(path.clone()));
    }
    if !options.write_back {
        return Ok(None);
    }
    match input_file {
        Some(input_path) => {
            let ext = format_extension(options.to);
            let output_path = Path::new(input_path).with_extension(ext);
            Ok(Some(output_path.to_string_lossy().to_string()))
        }
        None => Err("--write requires an input file".to_string()),
    }
}

fn write_output(output: &[u8], target: Option<&str>) -> io::Result<()> {
    match target {
        Some(path) => {
            debug!(path, bytes = output.len(), "writing output");
            fs::write(path, output)
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(output)?;
            handle.flush()
        }
    }
}

fn print_help() {
    println!(
        "unke - Unke command-line tool

USAGE:
    unke [OPTIONS] [FILE|DIR]

ARGS:
    [FILE|DIR]    Input file or directory (reads from stdin if not provided)
                  When a directory is given, processes every file in it with
                  the input format's extension (.unk by default)

OPTIONS:
    -f, --from <FORMAT>    Input format [default: unke]
                           Supported: unke, json, yaml, toml, cbor

    -t, --to <FORMAT>      Output format [default: unke]
                           Supported: unke, json, yaml, toml, cbor

    -w, --write            Write output to file with inferred extension

    -o, --output <FILE>    Write output to specified file (not valid with directory input)

    --check                Check if input is valid (exit 0 if valid, 1 if invalid)

    --compact              Single-line Unke or JSON output

    --indent <N>           Spaces per nesting level [default: 4]

    -v, --verbose          Log parser activity to stderr (RUST_LOG overrides)

    -h, --help             Print help

    -V, --version          Print version

EXAMPLES:
    # Reformat an Unke file
    unke tree.unk

    # Reformat in place with two-space indentation
    unke --indent 2 -w tree.unk

    # Validate all Unke files in a directory
    unke --check ./scenes/

    # Convert Unke to JSON
    unke -t json tree.unk

    # Convert JSON back to Unke
    unke -f json -t unke tree.json

    # Convert Unke to YAML, TOML or CBOR
    unke -t yaml tree.unk
    unke -t toml tree.unk -o tree.toml
    unke -t cbor tree.unk -o tree.cbor

    # Convert every Unke file in a directory to JSON
    unke -t json -w ./scenes/
"
    );
}
