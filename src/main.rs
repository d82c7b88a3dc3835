mod debug_report;

use querylex::{DEFAULT_START_CONTEXT, Options, default_registry, parse_verbose_with};
use std::io::{self, IsTerminal, Read};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "QUERYLEX_LOG";

fn main() {
    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    init_tracing();

    let run = default_registry().and_then(|registry| parse_verbose_with(&config.input, registry, &config.options));
    match run {
        Ok(run) => debug_report::print_run(&config.input, &config.options, &run, config.color),
        Err(err) => {
            debug_report::print_error(&config.input, &err, config.color);
            std::process::exit(1);
        }
    }
}

/// Log events go to stderr, filtered by `QUERYLEX_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).try_init();
}

struct CliConfig {
    input: String,
    options: Options,
    color: bool,
}

fn parse_args() -> Result<CliConfig, String> {
    let mut input: Option<String> = None;
    let mut options = Options::default();
    let mut color = io::stdout().is_terminal();
    let mut args = std::env::args().skip(1).peekable();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("querylex {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => color = true,
            "--no-color" => color = false,
            "--start" | "-s" => {
                options.start_context = args.next().ok_or_else(|| "error: --start expects a value".to_string())?;
            }
            "--max-steps" => {
                let value = args.next().ok_or_else(|| "error: --max-steps expects a value".to_string())?;
                options.max_steps = Some(parse_max_steps(&value)?);
            }
            "--input" | "-i" => {
                let value = args.next().ok_or_else(|| "error: --input expects a value".to_string())?;
                set_input(&mut input, value)?;
            }
            "--" => {
                let rest = args.collect::<Vec<_>>().join(" ");
                if !rest.trim().is_empty() {
                    set_input(&mut input, rest)?;
                }
                break;
            }
            _ if arg.starts_with("--start=") => {
                options.start_context = arg.trim_start_matches("--start=").to_string();
            }
            _ if arg.starts_with("--max-steps=") => {
                options.max_steps = Some(parse_max_steps(arg.trim_start_matches("--max-steps="))?);
            }
            _ if arg.starts_with("--input=") => {
                set_input(&mut input, arg.trim_start_matches("--input=").to_string())?;
            }
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                let rest = std::iter::once(arg).chain(args).collect::<Vec<_>>().join(" ");
                set_input(&mut input, rest)?;
                break;
            }
        }
    }

    let input = match input {
        Some(value) => value,
        None => read_stdin_input()?,
    };

    if input.trim().is_empty() {
        return Err(format!("error: no query provided\n\n{}", help_text()));
    }
    if options.start_context.is_empty() {
        return Err("error: --start expects a context name".to_string());
    }

    Ok(CliConfig { input, options, color })
}

fn set_input(input: &mut Option<String>, value: String) -> Result<(), String> {
    if input.is_some() {
        return Err("error: query provided multiple times".to_string());
    }
    *input = Some(value);
    Ok(())
}

fn parse_max_steps(value: &str) -> Result<usize, String> {
    value.parse().map_err(|_| format!("error: invalid --max-steps '{value}' (expected a non-negative integer)"))
}

fn read_stdin_input() -> Result<String, String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    let trimmed = buffer.trim_end_matches(['\n', '\r']).len();
    buffer.truncate(trimmed);
    Ok(buffer)
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "querylex {version}

Tokenize a selector query and print its token tree.

Usage:
  querylex [OPTIONS] [--] <query...>
  querylex [OPTIONS] --input <query>

Options:
  -i, --input <query>        Query to scan. If omitted, reads remaining args
                             or stdin when no args are provided.
  -s, --start <context>      Grammar context to start in.
                             Default: {default_start}
  --max-steps <n>            Fail once more than <n> rules have fired.
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Environment:
  {log_env}               Log filter for scanner events, e.g. 'debug' or
                             'querylex=trace'. Default: warn

Exit codes:
  0  Success.
  1  The query could not be scanned.
  2  Invalid arguments or missing query.
",
        version = env!("CARGO_PKG_VERSION"),
        default_start = DEFAULT_START_CONTEXT,
        log_env = LOG_ENV,
    )
}
