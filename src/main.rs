//! bscript - scripting front-end for batch transformation runs
//!
//! Usage:
//!   bscript script.bs            Feed a script, printing surfaced lines
//!   bscript -c "text"            Feed inline script text
//!   bscript --classify script.bs Label each line instead of executing

use bscript::{BasicEvaluator, CommandScanner, PropertyRegistry, ScanError, Scanner};
use std::path::Path;
use std::process::ExitCode;
use std::rc::Rc;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_help() {
    println!(
        r#"bscript-{} Scripting front-end for batch transformation runs

USAGE:
    bscript [OPTIONS] <script>      Scan a script file
    bscript [OPTIONS] -c <text>     Scan inline script text
    bscript --help                  Show this help message
    bscript --version               Show version

OPTIONS:
    --classify      Classify each line instead of executing built-ins
    --no-trim       Keep surrounding whitespace on surfaced lines
    --compress      Collapse whitespace runs inside lines
    --env           Seed the `env` property table from the environment
    --verbose       Trace macro resolution on stderr

Built-ins (echo, print, include, setProperty, properties, sleep) are
executed transparently; every other line is printed to stdout."#,
        VERSION
    );
}

struct Options {
    classify: bool,
    trim: bool,
    compress: bool,
    env: bool,
    verbose: bool,
    inline: Option<String>,
    script: Option<String>,
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut opts = Options {
        classify: false,
        trim: true,
        compress: false,
        env: false,
        verbose: false,
        inline: None,
        script: None,
    };
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--classify" => opts.classify = true,
            "--no-trim" => opts.trim = false,
            "--compress" => opts.compress = true,
            "--env" => opts.env = true,
            "--verbose" => opts.verbose = true,
            "-c" => match iter.next() {
                Some(text) => opts.inline = Some(text.clone()),
                None => return Err("-c requires an argument".to_string()),
            },
            other if other.starts_with('-') => {
                return Err(format!("unknown option: {}", other));
            }
            other => {
                if opts.script.is_some() {
                    return Err(format!("unexpected argument: {}", other));
                }
                opts.script = Some(other.to_string());
            }
        }
    }
    if opts.inline.is_none() && opts.script.is_none() {
        return Err("no script given".to_string());
    }
    Ok(opts)
}

fn run_scanner(opts: &Options) -> Result<(), ScanError> {
    let mut scanner = Scanner::script(PropertyRegistry::shared(), Rc::new(BasicEvaluator))?
        .verbose(opts.verbose);
    if opts.env {
        scanner = scanner.with_environment();
    }
    match (&opts.inline, &opts.script) {
        (Some(text), _) => scanner.open_literal("(inline)", text, opts.trim, opts.compress),
        (None, Some(path)) => scanner.open_path(Path::new(path), opts.trim, opts.compress)?,
        (None, None) => unreachable!(),
    }
    while let Some(line) = scanner.try_next_line()? {
        println!("{}", line);
    }
    Ok(())
}

fn run_classifier(opts: &Options) -> Result<(), ScanError> {
    let mut scanner = CommandScanner::new(PropertyRegistry::shared(), Rc::new(BasicEvaluator))?
        .verbose(opts.verbose);
    match (&opts.inline, &opts.script) {
        (Some(text), _) => scanner.open_literal("(inline)", text, opts.trim, opts.compress),
        (None, Some(path)) => scanner.open_path(Path::new(path), opts.trim, opts.compress)?,
        (None, None) => unreachable!(),
    }
    while let Some(line) = scanner.try_next_line()? {
        let label = match scanner.command() {
            Some(cmd) => variant_name(cmd),
            None => "?",
        };
        let echoed = if scanner.echoed() { " (echoed)" } else { "" };
        println!("{:<12}{} {}", label, echoed, line);
    }
    Ok(())
}

fn variant_name(cmd: &bscript::Command) -> &'static str {
    use bscript::Command::*;
    match cmd {
        MakeNewRoot(_) => "makeNewRoot",
        Batch(_) => "batch",
        Foreach => "foreach",
        End => "end",
        Properties { .. } => "properties",
        SetProperty { .. } => "setProperty",
        Print(_) => "print",
        SaveTo(_) => "saveTo",
        UseAsInput(_) => "useAsInput",
        Sleep(_) => "sleep",
        Include(_) => "include",
        Ordinary(_) => "ordinary",
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return ExitCode::SUCCESS;
    }
    if args.iter().any(|a| a == "--version") {
        println!("bscript {}", VERSION);
        return ExitCode::SUCCESS;
    }

    let opts = match parse_args(&args) {
        Ok(opts) => opts,
        Err(msg) => {
            eprintln!("bscript: {}", msg);
            eprintln!("Try 'bscript --help' for usage.");
            return ExitCode::from(2);
        }
    };

    let result = if opts.classify {
        run_classifier(&opts)
    } else {
        run_scanner(&opts)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_defect() => {
            // a defect in the scanner itself, not in the script
            eprintln!("bscript: fatal: {}", e);
            ExitCode::from(70)
        }
        Err(e) => {
            eprintln!("bscript: {}", e);
            ExitCode::FAILURE
        }
    }
}
