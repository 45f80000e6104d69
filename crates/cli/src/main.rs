use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use context_preset::{expand_with_case, Compiler, CompilerConfig, OptimizationLevel, PresetStore};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Config file picked up from the project root when `--config` is absent
const PROJECT_CONFIG_FILE: &str = ".context-preset/config.toml";

#[derive(Parser)]
#[command(name = "context-preset")]
#[command(about = "Compile file selections into glob presets and expand them back", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile selected files into patterns
    Compile(CompileArgs),

    /// Expand patterns into the files they select
    Expand(ExpandArgs),

    /// List stored presets
    List(RootArgs),

    /// Delete a stored preset
    Delete(DeleteArgs),
}

#[derive(Args)]
struct RootArgs {
    /// Project root
    #[arg(long, default_value = ".")]
    root: PathBuf,
}

#[derive(Args)]
struct CompileArgs {
    /// Selected files relative to the root (read from stdin when omitted)
    paths: Vec<String>,

    /// Project root
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Optimization level: minimal, balanced or aggressive
    #[arg(short, long, default_value = "balanced")]
    level: OptimizationLevel,

    /// Compiler config file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output the full result as JSON
    #[arg(long)]
    json: bool,

    /// Store the patterns as a named preset
    #[arg(long)]
    save: Option<String>,

    /// Comment written at the top of the pattern text
    #[arg(long)]
    header: Option<String>,
}

#[derive(Args)]
struct ExpandArgs {
    /// Pattern file (read from stdin when omitted)
    #[arg(conflicts_with = "preset")]
    file: Option<PathBuf>,

    /// Expand a stored preset
    #[arg(long)]
    preset: Option<String>,

    /// Project root
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Compiler config file (TOML), used for its case policy
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output the file list as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct DeleteArgs {
    /// Preset name
    name: String,

    /// Project root
    #[arg(long, default_value = ".")]
    root: PathBuf,
}

fn main() -> Result<()> {
    let mut cli = Cli::parse();

    let json_output = match &cli.command {
        Commands::Compile(args) => args.json,
        Commands::Expand(args) => args.json,
        _ => false,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Compile(args) => run_compile(args),
        Commands::Expand(args) => run_expand(args),
        Commands::List(args) => run_list(args),
        Commands::Delete(args) => run_delete(args),
    }
}

fn run_compile(args: CompileArgs) -> Result<()> {
    let root = canonical_root(&args.root)?;
    let config = load_config(&root, args.config.as_deref())?;

    let selection = if args.paths.is_empty() {
        read_stdin_lines().context("Failed to read selection from stdin")?
    } else {
        args.paths
    };
    if selection.is_empty() {
        log::warn!("Empty selection; nothing to compile");
    }

    let result = Compiler::new()
        .with_config(config)
        .compile(&selection, &root, args.level)
        .context("Compilation failed")?;
    let text = result.to_pattern_text(args.header.as_deref());

    if let Some(name) = &args.save {
        let store = PresetStore::for_project(&root);
        let path = store
            .save(name, &text)
            .with_context(|| format!("Failed to save preset '{name}'"))?;
        log::info!("Preset '{name}' written to {}", path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{text}");
        log::info!(
            "{} files -> {} patterns ({} saved)",
            result.stats.input_files,
            result.stats.pattern_count,
            result.stats.patterns_saved
        );
    }
    Ok(())
}

fn run_expand(args: ExpandArgs) -> Result<()> {
    let root = canonical_root(&args.root)?;
    let config = load_config(&root, args.config.as_deref())?;

    let text = match (&args.preset, &args.file) {
        (Some(name), _) => PresetStore::for_project(&root)
            .load(name)
            .with_context(|| format!("Failed to load preset '{name}'"))?,
        (None, Some(file)) => fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?,
        (None, None) => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read patterns from stdin")?;
            buf
        }
    };

    let files = expand_with_case(&text, &root, config.case_sensitivity)
        .context("Expansion failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&files)?);
    } else {
        for file in &files {
            println!("{file}");
        }
    }
    Ok(())
}

fn run_list(args: RootArgs) -> Result<()> {
    let root = canonical_root(&args.root)?;
    let store = PresetStore::for_project(&root);
    let names = store.list().context("Failed to list presets")?;
    if names.is_empty() {
        log::info!("No presets in {}", store.dir().display());
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}

fn run_delete(args: DeleteArgs) -> Result<()> {
    let root = canonical_root(&args.root)?;
    PresetStore::for_project(&root)
        .delete(&args.name)
        .with_context(|| format!("Failed to delete preset '{}'", args.name))
}

fn canonical_root(root: &Path) -> Result<PathBuf> {
    root.canonicalize()
        .with_context(|| format!("Invalid project root {}", root.display()))
}

fn load_config(root: &Path, explicit: Option<&Path>) -> Result<CompilerConfig> {
    if let Some(path) = explicit {
        return CompilerConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()));
    }
    let project_config = root.join(PROJECT_CONFIG_FILE);
    if project_config.is_file() {
        log::debug!("Using project config {}", project_config.display());
        return CompilerConfig::load(&project_config)
            .with_context(|| format!("Failed to load config {}", project_config.display()));
    }
    Ok(CompilerConfig::default())
}

fn read_stdin_lines() -> io::Result<Vec<String>> {
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

