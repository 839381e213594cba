use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use retro_binds_codegen::{CONFIG_FILE_NAME, GeneratedOutput, Generator, GeneratorConfig};

#[derive(Parser, Debug)]
#[command(name = "retro-binds")]
#[command(about = "Generates managed and native binding stubs for the Retro engine", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate and write every binding artifact
    Generate {
        #[command(flatten)]
        input: InputArgs,

        /// Directory for the managed stubs and bindings.rs
        #[arg(long, value_name = "DIR")]
        managed_out: PathBuf,

        /// Directory for the native stubs, registration.cpp and index.ixx
        #[arg(long, value_name = "DIR")]
        native_out: PathBuf,
    },

    /// Validate declarations and report what would be generated
    Check {
        #[command(flatten)]
        input: InputArgs,
    },
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Directory scanned for annotated declarations
    #[arg(long, value_name = "DIR")]
    sources: PathBuf,

    /// Crate `src` directory module paths are derived from (defaults to --sources)
    #[arg(long, value_name = "DIR")]
    src_root: Option<PathBuf>,

    /// Generator config (defaults to retro-binds.toml in the working directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Native module every fragment belongs to
    #[arg(long)]
    module_name: Option<String>,

    /// Prefix for module partition names
    #[arg(long)]
    fragment_prefix: Option<String>,

    /// Native namespace of the registration function
    #[arg(long)]
    generated_namespace: Option<String>,

    /// Count the return slot towards parameter-block sizes
    #[arg(long)]
    include_return_slot: bool,

    /// Target pointer width in bytes
    #[arg(long, value_parser = ["4", "8"])]
    pointer_width: Option<String>,

    /// Alignment of 8-byte scalars on the target (4 on 32-bit x86 Unix)
    #[arg(long, value_parser = ["4", "8"])]
    wide_scalar_align: Option<String>,
}

impl InputArgs {
    /// The config file merged with command line overrides.
    fn config(&self) -> anyhow::Result<GeneratorConfig> {
        let mut config = match &self.config {
            Some(path) => {
                if !path.exists() {
                    bail!("config file {} does not exist", path.display());
                }
                GeneratorConfig::load_or_default(path)?
            }
            None => GeneratorConfig::load_or_default(Path::new(CONFIG_FILE_NAME))?,
        };

        if let Some(module_name) = &self.module_name {
            config.module_name = module_name.clone();
        }
        if let Some(prefix) = &self.fragment_prefix {
            config.fragment_prefix = Some(prefix.clone());
        }
        if let Some(namespace) = &self.generated_namespace {
            config.generated_namespace = namespace.clone();
        }
        if self.include_return_slot {
            config.include_return_slot = true;
        }
        if let Some(width) = &self.pointer_width {
            config.pointer_width = width.parse().context("invalid pointer width")?;
        }
        if let Some(align) = &self.wide_scalar_align {
            config.wide_scalar_align = align.parse().context("invalid wide scalar alignment")?;
        }
        Ok(config)
    }

    fn generate(&self) -> anyhow::Result<GeneratedOutput> {
        let config = self.config()?;
        log::debug!("generator config: {config:?}");
        let src_root = self.src_root.as_deref().unwrap_or(&self.sources);
        let output = Generator::new(config)
            .generate_dir(src_root, &self.sources)
            .with_context(|| format!("failed to generate bindings for {}", self.sources.display()))?;
        Ok(output)
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Generate {
            input,
            managed_out,
            native_out,
        } => {
            let output = input.generate()?;
            let written = output.write(&managed_out, &native_out)?;
            println!(
                "{} exports, {written} files updated",
                output.classes.len()
            );
        }
        Command::Check { input } => {
            let output = input.generate()?;
            for class in &output.classes {
                println!("{} ({})", class.class.qualified_name(), class.class.kind);
                for method in &class.class.methods {
                    println!(
                        "  {}::{} [{} bytes]",
                        class.class.module_name(),
                        method.export_name,
                        method.block_size
                    );
                }
            }
        }
    }
    Ok(())
}
