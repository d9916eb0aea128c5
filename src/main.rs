use std::env;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::process;

use awk_lite::{Interpreter, RecordSource, parse_source};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() {
    // diagnostics go to stderr so program output stays clean
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();

    match run(&args[1..]) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("awk-lite: {}", e);
            process::exit(2);
        }
    }
}

/// Where the records come from
enum DataSource {
    File(String),
    Stdin,
    Nothing,
}

fn run(args: &[String]) -> Result<i32, Box<dyn std::error::Error>> {
    let mut field_separator: Option<String> = None;
    let mut program_source: Option<String> = None;
    let mut data_file: Option<String> = None;
    let mut variables: Vec<(String, String)> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];

        if arg == "--help" || arg == "-h" {
            print_help();
            return Ok(0);
        }

        if arg == "--version" {
            println!("awk-lite {}", env!("CARGO_PKG_VERSION"));
            return Ok(0);
        }

        if arg == "-F" {
            i += 1;
            let fs = args.get(i).ok_or("option -F requires an argument")?;
            field_separator = Some(fs.clone());
        } else if let Some(fs) = arg.strip_prefix("-F") {
            field_separator = Some(fs.to_string());
        } else if arg == "-v" {
            i += 1;
            let assignment = args.get(i).ok_or("option -v requires an argument")?;
            let (name, value) = assignment
                .split_once('=')
                .ok_or_else(|| format!("invalid variable assignment: {}", assignment))?;
            variables.push((name.to_string(), value.to_string()));
        } else if arg == "-f" {
            i += 1;
            let script_file = args.get(i).ok_or("option -f requires an argument")?;
            program_source = Some(fs::read_to_string(script_file)?);
        } else if arg.starts_with('-') && arg != "-" {
            return Err(format!("unknown option: {}", arg).into());
        } else if program_source.is_none() {
            program_source = Some(arg.clone());
        } else if data_file.is_none() {
            data_file = Some(arg.clone());
        } else {
            return Err(format!("only one data file is accepted, got extra {}", arg).into());
        }

        i += 1;
    }

    let (program_source, data) = match program_source {
        Some(source) => {
            let data = match data_file {
                Some(path) if path != "-" => DataSource::File(path),
                _ => DataSource::Stdin,
            };
            (source, data)
        }
        None => prompt_for_paths()?,
    };

    let program = parse_source(&program_source)?;
    debug!(
        functions = program.functions.len(),
        blocks = program.other_blocks.len(),
        "parsed program"
    );

    let needs_records = !program.other_blocks.is_empty() || !program.end_blocks.is_empty();
    let (records, filename) = match data {
        DataSource::File(path) => {
            let records = RecordSource::from_reader(BufReader::new(File::open(&path)?))?;
            (records, path)
        }
        DataSource::Stdin if needs_records => {
            (RecordSource::from_reader(io::stdin().lock())?, String::new())
        }
        _ => (RecordSource::default(), String::new()),
    };

    let mut interpreter = Interpreter::new(&program).with_records(records);
    interpreter.set_filename(&filename);
    if let Some(fs) = &field_separator {
        interpreter.set_fs(fs);
    }
    for (name, value) in &variables {
        interpreter.set_variable(name, value);
    }

    let stdout = io::stdout();
    let mut output = stdout.lock();
    let status = interpreter.run(&mut output).inspect_err(|e| {
        if e.is_runtime() {
            debug!(error = %e, records = needs_records, "program aborted while running");
        }
    })?;
    Ok(status)
}

/// Ask for the script path, then the data path; an empty data path means no records
fn prompt_for_paths() -> Result<(String, DataSource), Box<dyn std::error::Error>> {
    let stdin = io::stdin();
    let mut input = stdin.lock();

    let script_path = prompt(&mut input, "Script file: ")?;
    if script_path.is_empty() {
        return Err("no program provided".into());
    }
    let source = fs::read_to_string(&script_path)?;

    let data_path = prompt(&mut input, "Data file: ")?;
    let data = if data_path.is_empty() {
        DataSource::Nothing
    } else {
        DataSource::File(data_path)
    };

    Ok((source, data))
}

fn prompt(input: &mut impl BufRead, label: &str) -> io::Result<String> {
    let mut stderr = io::stderr();
    stderr.write_all(label.as_bytes())?;
    stderr.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn print_help() {
    println!(
        r#"Usage: awk-lite [OPTIONS] 'program' [datafile]
       awk-lite [OPTIONS] -f progfile [datafile]
       awk-lite              (prompts for the script and data paths)

A small AWK dialect. Regular expressions are written between backticks.

Options:
  -F fs          Set the field separator to fs
  -v var=val     Assign value to variable before execution
  -f progfile    Read the program from file
  --version      Print version information
  --help         Print this help message

Environment:
  RUST_LOG       Diagnostic log filter, e.g. RUST_LOG=awk_lite=debug

Examples:
  awk-lite '{{ print $1 }}' file.txt
  awk-lite -F: '{{ print $1 }}' /etc/passwd
  awk-lite 'BEGIN {{ print "Hello" }}'
  awk-lite '$0 ~ `pattern` {{ print }}' file.txt
"#
    );
}
