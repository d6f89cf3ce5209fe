use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stepmatch::config::Config;
use stepmatch::{unify_worksheet, Renumber};

/// Justifies proof worksheet steps that restate an earlier step up to associativity,
/// commutativity and replacement of equals.
#[derive(Parser, Debug)]
#[command(name = "stepmatch")]
struct Args {
	/// Metamath library file.
	library: String,

	/// Proof worksheet file.
	worksheet: String,

	/// Renumber derivation steps starting from this number.
	#[arg(long)]
	renumber: Option<u32>,

	/// Step number increment used with `--renumber`.
	#[arg(long, default_value_t = 1)]
	increment: u32,

	/// Type code of provable statements.
	#[arg(long)]
	provable_type: Option<String>,

	/// Syntax type the provable type code stands for.
	#[arg(long)]
	logic_type: Option<String>,
}

fn run(args: &Args) -> Result<String, String> {
	let default = Config::default();
	let config = Config::with_types(
		args.provable_type.as_deref().unwrap_or(&default.provable_type),
		args.logic_type.as_deref().unwrap_or(&default.logic_type),
	);
	let library = std::fs::read_to_string(&args.library).map_err(|err| format!("can't read `{}`: {}", args.library, err))?;
	let worksheet = std::fs::read_to_string(&args.worksheet).map_err(|err| format!("can't read `{}`: {}", args.worksheet, err))?;
	let renumber = args.renumber.map(|start| Renumber { start, increment: args.increment });

	unify_worksheet(&library, &worksheet, &config, renumber).map_err(|_| format!("`{}` is not OK", args.worksheet))
}

fn main() {
	tracing_subscriber::registry()
		.with(fmt::layer().with_ansi(false).without_time())
		.with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
		.init();

	let args = Args::parse();
	match run(&args) {
		Ok(text) => println!("{}", text),
		Err(err) => {
			eprintln!("{}", err.red());
			std::process::exit(1);
		},
	}
}
