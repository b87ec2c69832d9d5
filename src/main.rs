use clap::{crate_version, App, AppSettings, Arg, ArgMatches, ErrorKind, SubCommand};
use nofex::scanner;
use nofex::{run_file, Error, Options, Value};
use std::fs;
use std::io;
use std::process;
use tracing_subscriber::EnvFilter;

// https://www.freebsd.org/cgi/man.cgi?query=sysexits
const EXIT_USAGE: i32 = 64;
const EXIT_DATA: i32 = 65;
const EXIT_NO_INPUT: i32 = 66;
const EXIT_SOFTWARE: i32 = 70;

fn main() {
    let app = App::new("nofex")
        .version(crate_version!())
        .about("Runs programs written in the nofex register-machine language")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("run")
                .about("Lex and execute a program")
                .arg(Arg::with_name("file").required(true))
                .arg(
                    Arg::with_name("modules")
                        .long("modules")
                        .takes_value(true)
                        .value_name("DIR")
                        .help("Directory that `use` references resolve against"),
                )
                .arg(
                    Arg::with_name("trace")
                        .long("trace")
                        .help("Log every executed statement"),
                ),
        )
        .subcommand(
            SubCommand::with_name("tokens")
                .about("Print the token table of a program")
                .arg(Arg::with_name("file").required(true)),
        )
        .subcommand(
            SubCommand::with_name("fmt")
                .about("Print a program in canonical form")
                .arg(Arg::with_name("file").required(true)),
        );
    let matches = match app.get_matches_safe() {
        Ok(x) => x,
        Err(e) => match e.kind {
            ErrorKind::HelpDisplayed | ErrorKind::VersionDisplayed => e.exit(),
            _ => {
                eprintln!("{}", e.message);
                process::exit(EXIT_USAGE);
            }
        },
    };
    let code = match matches.subcommand() {
        ("run", Some(args)) => run(args),
        ("tokens", Some(args)) => tokens(args),
        ("fmt", Some(args)) => format(args),
        _ => EXIT_USAGE,
    };
    process::exit(code);
}

fn init_logging(trace: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if trace { "trace" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(args: &ArgMatches) -> i32 {
    let trace = args.is_present("trace");
    init_logging(trace);
    let mut options = Options::new().trace(trace);
    if let Some(dir) = args.value_of("modules") {
        options = options.module_root(dir);
    }
    let file = args.value_of("file").unwrap_or_default();
    match run_file(file, &options) {
        Ok(Value::Null) => 0,
        Ok(value) => {
            println!("{}", value);
            0
        }
        Err(e) => report(file, e),
    }
}

fn tokens(args: &ArgMatches) -> i32 {
    let file = args.value_of("file").unwrap_or_default();
    let tokens = match read_source(file).and_then(|s| Ok(scanner::scan_tokens(&s)?)) {
        Ok(x) => x,
        Err(e) => return report(file, e),
    };
    let mut line = 0;
    for (index, token) in tokens.iter().enumerate() {
        if token.line == line {
            print!("{:04}    | ", index);
        } else {
            print!("{:04} {:4} ", index, token.line);
            line = token.line;
        }
        println!(
            "{:3} {:20} {}",
            token.column,
            token.tokentype.kind(),
            token.tokentype
        );
    }
    0
}

fn format(args: &ArgMatches) -> i32 {
    let file = args.value_of("file").unwrap_or_default();
    match read_source(file).and_then(|s| Ok(scanner::scan_tokens(&s)?)) {
        Ok(tokens) => {
            print!("{}", scanner::unscan(&tokens));
            0
        }
        Err(e) => report(file, e),
    }
}

fn read_source(file: &str) -> Result<String, Error> {
    Ok(fs::read_to_string(file)?)
}

fn report(file: &str, error: Error) -> i32 {
    match error {
        Error::Io(e) => {
            eprintln!("Error: could not read {}: {}", file, e);
            EXIT_NO_INPUT
        }
        Error::Scan(e) => {
            eprintln!("{}", e);
            EXIT_DATA
        }
        Error::Runtime(e) => {
            eprintln!("{}", e);
            EXIT_SOFTWARE
        }
    }
}
