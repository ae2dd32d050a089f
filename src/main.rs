use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use traefik_migrate::config::{MergedConfig, discover_configs, load_merged_config, user_config_path};
use traefik_migrate::convert::{ConvertOptions, Converter};
use traefik_migrate::migration::{DirectoryStore, MigrationRequest, ResourceType, migrate};
use traefik_migrate::resource::{KindRegistry, decode_manifests, encode_manifests};

/// Path argument meaning stdin or stdout.
const STDIO: &str = "-";

#[derive(Parser)]
#[command(name = "traefik-migrate")]
#[command(
	author,
	version,
	about = "CLI tool for migrating Traefik v2 IngressRoute and Middleware resources to v3"
)]
#[command(arg_required_else_help = true)]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Convert v2 manifests to v3
	Convert {
		/// Manifest file to convert, `-` for stdin
		#[arg(short = 'f', long = "file", default_value = STDIO)]
		file: PathBuf,

		/// Output file or directory, `-` for stdout
		#[arg(short, long, default_value = STDIO)]
		output: PathBuf,

		/// Keep v2 rules verbatim and tag routes with `syntax: v2`
		#[arg(long)]
		keep_syntax: bool,
	},

	/// Migrate stored v2 resources to v3
	Migrate {
		/// Type of resource to migrate
		#[arg(short = 't', long = "resource-type", value_enum, ignore_case = true)]
		resource_type: ResourceTypeArg,

		/// Name of a single resource to migrate
		#[arg(short = 'r', long = "resource-name")]
		resource_name: Option<String>,

		/// Namespace to migrate; all namespaces when omitted
		#[arg(short, long)]
		namespace: Option<String>,

		/// Directory holding the resources
		#[arg(long, value_name = "DIR")]
		store: PathBuf,

		/// Report what would be created without writing anything
		#[arg(long)]
		dry_run: bool,

		/// Leave middlewares configuring options removed in v3 untouched
		#[arg(long)]
		skip_deprecated: bool,
	},

	/// Display the version
	Version,

	/// Configuration management commands
	Config {
		#[command(subcommand)]
		action: ConfigAction,
	},
}

#[derive(Subcommand)]
enum ConfigAction {
	/// Display merged effective configuration with source annotations
	Show,
	/// Check all config files for errors without running anything
	Validate,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ResourceTypeArg {
	#[value(name = "ingressroute", alias = "ingress-route")]
	IngressRoute,
	Middleware,
}

impl From<ResourceTypeArg> for ResourceType {
	fn from(value: ResourceTypeArg) -> Self {
		match value {
			ResourceTypeArg::IngressRoute => ResourceType::IngressRoute,
			ResourceTypeArg::Middleware => ResourceType::Middleware,
		}
	}
}

fn main() -> ExitCode {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
		)
		.with_writer(std::io::stderr)
		.init();

	match run() {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn run() -> Result<ExitCode> {
	let cli = Cli::parse();

	match cli.command {
		Commands::Convert {
			file,
			output,
			keep_syntax,
		} => handle_convert(&file, &output, keep_syntax),
		Commands::Migrate {
			resource_type,
			resource_name,
			namespace,
			store,
			dry_run,
			skip_deprecated,
		} => {
			let config = load_config()?;
			let request = MigrationRequest {
				resource_type: resource_type.into(),
				name: resource_name,
				namespace,
				dry_run,
				skip_deprecated: skip_deprecated || config.skip_deprecated,
			};
			handle_migrate(&config, &store, &request)
		}
		Commands::Version => {
			println!("{}", env!("CARGO_PKG_VERSION"));
			Ok(ExitCode::SUCCESS)
		}
		Commands::Config { action } => match action {
			ConfigAction::Show => handle_config_show(),
			ConfigAction::Validate => handle_config_validate(),
		},
	}
}

fn load_config() -> Result<MergedConfig> {
	let cwd = std::env::current_dir().context("Failed to get current directory")?;
	load_merged_config(&cwd).context("Failed to load configuration")
}

fn is_stdio(path: &Path) -> bool {
	path.as_os_str() == STDIO
}

fn handle_convert(file: &Path, output: &Path, keep_syntax: bool) -> Result<ExitCode> {
	let config = load_config()?;
	let mut options = ConvertOptions::from(&config);
	options.keep_syntax |= keep_syntax;

	let input = if is_stdio(file) {
		let mut input = String::new();
		std::io::stdin()
			.read_to_string(&mut input)
			.context("Failed to read manifests from stdin")?;
		input
	} else {
		std::fs::read_to_string(file)
			.with_context(|| format!("Failed to read {}", file.display()))?
	};

	let registry = KindRegistry::traefik();
	let manifests = decode_manifests(&input, &registry).context("Failed to parse manifests")?;

	let converter = Converter::new(&options).context("Failed to build converter")?;
	let report = converter.convert_all(&manifests);
	let encoded = encode_manifests(&report.converted).context("Failed to encode manifests")?;

	if is_stdio(output) {
		std::io::stdout()
			.write_all(encoded.as_bytes())
			.context("Failed to write to stdout")?;
	} else {
		let path = output_path(output, file)?;
		std::fs::write(&path, encoded)
			.with_context(|| format!("Failed to write {}", path.display()))?;
	}

	if report.is_success() {
		Ok(ExitCode::SUCCESS)
	} else {
		eprintln!(
			"{} of {} resources failed to convert",
			report.failures.len(),
			manifests.len()
		);
		Ok(ExitCode::FAILURE)
	}
}

/// An output directory receives a file named after the input.
fn output_path(output: &Path, input: &Path) -> Result<PathBuf> {
	if !output.is_dir() {
		return Ok(output.to_path_buf());
	}
	match input.file_name() {
		Some(name) if !is_stdio(input) => Ok(output.join(name)),
		_ => bail!(
			"Output {} is a directory, which requires an input file",
			output.display()
		),
	}
}

fn handle_migrate(
	config: &MergedConfig,
	store_root: &Path,
	request: &MigrationRequest,
) -> Result<ExitCode> {
	let registry = KindRegistry::traefik();
	let store = DirectoryStore::new(store_root, &registry);
	let converter =
		Converter::new(&ConvertOptions::from(config)).context("Failed to build converter")?;

	let report = migrate(&store, &converter, request)
		.with_context(|| format!("Failed to migrate {} resources", request.resource_type))?;

	println!(
		"{} created, {} already existed, {} skipped, {} failed{}",
		report.created.len(),
		report.already_exists.len(),
		report.skipped.len(),
		report.failures.len(),
		if request.dry_run { " (dry run)" } else { "" }
	);

	if report.is_success() {
		Ok(ExitCode::SUCCESS)
	} else {
		Ok(ExitCode::FAILURE)
	}
}

fn handle_config_show() -> Result<ExitCode> {
	let config = load_config()?;

	if config.sources.is_empty() {
		println!("No configuration files found.");
	} else {
		println!("Configuration files (most specific first):");
		for source in &config.sources {
			println!("  {}", source.display());
		}
	}
	println!();

	println!("Effective configuration:");
	println!("  keep-syntax: {}", config.keep_syntax);
	println!("  skip-deprecated: {}", config.skip_deprecated);
	if config.skip_annotations.is_empty() {
		println!("  skip-annotations: (none)");
	} else {
		println!("  skip-annotations:");
		for key in &config.skip_annotations {
			println!("    {key}");
		}
	}
	println!();

	// Show user config path
	if let Ok(user_path) = user_config_path() {
		println!("User config path: {}", user_path.display());
		if user_path.exists() {
			println!("  (exists)");
		} else {
			println!("  (not found)");
		}
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_config_validate() -> Result<ExitCode> {
	let cwd = std::env::current_dir().context("Failed to get current directory")?;

	match discover_configs(&cwd) {
		Ok(configs) => {
			if configs.is_empty() {
				println!("No configuration files found.");
			} else {
				println!("All configuration files are valid:");
				for loaded in &configs {
					println!("  {}", loaded.path.display());
				}
			}
			Ok(ExitCode::SUCCESS)
		}
		Err(e) => {
			eprintln!("Configuration error: {}", e);
			Ok(ExitCode::FAILURE)
		}
	}
}
