//! Gridtypes - Typed spreadsheet column declarations from the command line

mod config;

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use gridtypes_core::TypeManager;
use gridtypes_core::registry::{UnitExpr, UnitTerm};
use gridtypes_core::storage::{parse_type, parse_unit};
use gridtypes_engine::types::{
    DataType, DateTimeFormats, DateTimeType, FlexibleParse, TypeMismatch, TypeRelation,
    check_same,
};
use gridtypes_engine::units::{ExponentOverflow, UnitAtom, UnitExp, UnitVarId, UnitVarTable};
use tracing_subscriber::EnvFilter;

use config::Config;

fn print_usage() {
    eprintln!("Usage: gridtypes [OPTIONS] [FILE]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [FILE]                         Type declarations to load (.types)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -o, --output <FILE>            Write the declarations to FILE instead of stdout");
    eprintln!("  --unify <TYPE> <TYPE>          Unify two types and print the result");
    eprintln!("  --units <UNIT> <UNIT>          Solve two units for their unit variables");
    eprintln!("  --parse-date <GRANULARITY> <TEXT>");
    eprintln!("                                 Parse TEXT as YEARMONTHDAY, YEARMONTH, TIMEOFDAY,");
    eprintln!("                                 DATETIME or DATETIMEZONED");
    eprintln!("  --no-default-types             Do not load default.types from the config dir");
    eprintln!("  -h, --help                     Print help");
}

enum Mode {
    Save,
    Unify(String, String),
    Units(String, String),
    ParseDate(String, String),
}

struct Cli {
    file_path: Option<PathBuf>,
    output_file: Option<PathBuf>,
    no_default_types: bool,
    mode: Mode,
}

fn take_pair(args: &[String], i: &mut usize, option: &str, what: &str) -> (String, String) {
    if *i + 2 >= args.len() {
        eprintln!("Error: {} requires two {}", option, what);
        std::process::exit(1);
    }
    let pair = (args[*i + 1].to_string(), args[*i + 2].to_string());
    *i += 2;
    pair
}

fn parse_args(args: &[String]) -> Cli {
    let mut cli = Cli {
        file_path: None,
        output_file: None,
        no_default_types: false,
        mode: Mode::Save,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                std::process::exit(0);
            }
            "-o" | "--output" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --output requires a file path");
                    std::process::exit(1);
                }
                cli.output_file = Some(PathBuf::from(&args[i]));
            }
            "--unify" => {
                let (a, b) = take_pair(args, &mut i, "--unify", "types");
                cli.mode = Mode::Unify(a, b);
            }
            "--units" => {
                let (a, b) = take_pair(args, &mut i, "--units", "units");
                cli.mode = Mode::Units(a, b);
            }
            "--parse-date" => {
                let (granularity, text) = take_pair(args, &mut i, "--parse-date", "arguments");
                cli.mode = Mode::ParseDate(granularity, text);
            }
            "--no-default-types" => cli.no_default_types = true,
            arg if arg.starts_with('-') => {
                eprintln!("Error: Unknown option: {}", arg);
                print_usage();
                std::process::exit(1);
            }
            _ => {
                if cli.file_path.is_none() {
                    cli.file_path = Some(PathBuf::from(&args[i]));
                } else {
                    eprintln!("Error: Unexpected argument: {}", args[i]);
                    print_usage();
                    std::process::exit(1);
                }
            }
        }
        i += 1;
    }
    cli
}

fn init_logging(level: &str) -> anyhow::Result<()> {
    let filter = match env::var("GRIDTYPES_LOG") {
        Ok(directives) => EnvFilter::try_new(&directives)
            .with_context(|| format!("Invalid GRIDTYPES_LOG filter '{}'", directives))?,
        Err(_) => EnvFilter::try_new(level).with_context(|| format!("Invalid log level '{}'", level))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install logger: {}", e))
}

fn load_types(cli: &Cli, config: &Config) -> anyhow::Result<TypeManager> {
    let mut manager = TypeManager::new();
    let mut paths: Vec<&Path> = Vec::new();
    if !cli.no_default_types {
        if let Some(path) = config.default_types.as_deref() {
            paths.push(path);
        }
    }
    if let Some(path) = cli.file_path.as_deref() {
        paths.push(path);
    }
    for path in paths {
        let loaded = manager
            .load_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?;
        log::info!("loaded {} types from {}", loaded.len(), path.display());
    }
    Ok(manager)
}

/// Returns whether the command succeeded; failures already printed.
fn run(cli: &Cli, config: &Config) -> anyhow::Result<bool> {
    match &cli.mode {
        Mode::Save => {
            let manager = load_types(cli, config)?;
            let text = manager.save()?;
            match &cli.output_file {
                Some(path) => {
                    fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Saved to {}", path.display());
                }
                None => print!("{}", text),
            }
            Ok(true)
        }
        Mode::Unify(a, b) => {
            let manager = load_types(cli, config)?;
            let a = manager.resolve(&parse_type(a)?)?;
            let b = manager.resolve(&parse_type(b)?)?;
            Ok(unify_types(&a, &b, config.relation))
        }
        Mode::Units(a, b) => unify_units(&parse_unit(a)?, &parse_unit(b)?),
        Mode::ParseDate(granularity, text) => {
            let Some(granularity) = DateTimeType::from_keyword(&granularity.to_ascii_uppercase()) else {
                bail!("Unknown date/time granularity: {}", granularity);
            };
            Ok(parse_date(granularity, text))
        }
    }
}

fn unify_types(a: &DataType, b: &DataType, relation: TypeRelation) -> bool {
    let mut failed = false;
    let unified = check_same(a, b, relation, &mut |mismatch: TypeMismatch| {
        failed = true;
        eprintln!("Error: {}", mismatch);
    });
    match unified {
        Some(ty) => {
            println!("{}", ty.to_display(true));
            true
        }
        None => {
            if !failed {
                eprintln!("Error: Types differ: {} and {}", a, b);
            }
            false
        }
    }
}

/// Render `exp` with the user's variable names where it mentions them.
fn named(exp: &UnitExp, names: &BTreeMap<String, UnitVarId>) -> Result<String, ExponentOverflow> {
    let terms = exp.atoms().map(|(atom, power)| {
        let term = match atom {
            UnitAtom::Var(var) => match names.iter().find(|(_, id)| *id == var) {
                Some((name, _)) => UnitTerm::Var(name.clone()),
                None => UnitTerm::Var(var.to_string()),
            },
            UnitAtom::Concrete(single) => UnitTerm::Named(single.clone()),
        };
        (term, power)
    });
    Ok(UnitExpr::from_terms(terms)?.to_string())
}

fn unify_units(a: &UnitExpr, b: &UnitExpr) -> anyhow::Result<bool> {
    let mut table = UnitVarTable::new();
    let mut names: BTreeMap<String, UnitVarId> = BTreeMap::new();
    let left = a.to_unit_exp(&mut names, &mut table)?;
    let right = b.to_unit_exp(&mut names, &mut table)?;

    match table.unify(&left, &right) {
        Ok(unified) => {
            println!("{}", named(&unified, &names)?);
            for (name, var) in &names {
                let value = table.resolve(&UnitExp::from_var(*var))?;
                println!("@UNITVAR {} = {}", name, named(&value, &names)?);
            }
            Ok(true)
        }
        Err(err) => {
            eprintln!("Error: {} and {} have {}", a, b, err);
            Ok(false)
        }
    }
}

fn parse_date(granularity: DateTimeType, text: &str) -> bool {
    let formats = DateTimeFormats::new();
    let formats = formats.for_type(granularity);
    if let Some(value) = formats.parse_strict(text) {
        println!("{}", value);
        return true;
    }
    match formats.parse_flexible(text) {
        FlexibleParse::Unique(value) => {
            println!("{}", value);
            true
        }
        FlexibleParse::Ambiguous(candidates) => {
            eprintln!("Error: \"{}\" is ambiguous:", text);
            for candidate in candidates {
                eprintln!("  {} (from {})", candidate.value, candidate.pattern);
            }
            false
        }
        FlexibleParse::NoMatch => {
            eprintln!("Error: \"{}\" is not a valid {}", text, granularity);
            false
        }
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let cli = parse_args(&args);

    let (config, warnings) = config::load_config(None);
    if let Err(e) = init_logging(&config.log_level) {
        eprintln!("Warning: {:#}", e);
    }
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }

    match run(&cli, &config) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
