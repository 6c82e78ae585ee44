//! CloudFormation Controller Generator CLI
//!
//! Command-line interface for generating Kubernetes controller types and
//! CloudFormation stack objects from the CloudFormation resource specification.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use cfn_controller_gen_common::{GeneratorConfig, ResourceKind, ResourceSet, TypeResolver};
use cfn_controller_gen_generator::ControllerGenerator;
use cfn_controller_gen_parser::{
    load_resource_set, FileSpecSource, HttpSpecSource, SpecSource, DEFAULT_SPEC_URL,
};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_CONFIG: &str = "awsctrl-generator.yaml";
const DEFAULT_BOILERPLATE: &str = "./hack/boilerplate.go.txt";

#[derive(Parser)]
#[command(name = "cfn-controller-gen")]
#[command(version, about = "Generate Kubernetes controllers from the CloudFormation resource specification", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate controller artifacts for the configured resources
    #[command(after_help = "EXAMPLES:\n  \
        # Generate from the published specification\n  \
        cfn-controller-gen run -f awsctrl-generator.yaml -o .\n\n  \
        # Generate from a local copy of the specification\n  \
        cfn-controller-gen run --spec CloudFormationResourceSpecification.json")]
    Run {
        /// Generator configuration file
        #[arg(short = 'f', long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,

        /// License header prepended to every generated file
        #[arg(short, long, default_value = DEFAULT_BOILERPLATE)]
        boilerplate: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Read the specification from a file instead of fetching it
        #[arg(long)]
        spec: Option<PathBuf>,
    },

    /// Normalize the specification and list the selected resources
    #[command(after_help = "EXAMPLES:\n  \
        # List every ApiGateway resource\n  \
        cfn-controller-gen parse --groups apigateway\n\n  \
        # Inspect single resources from a local file\n  \
        cfn-controller-gen parse --spec spec.json --resources ecr:repository,sns:topic -v")]
    Parse {
        /// Read the specification from a file instead of fetching it
        #[arg(long)]
        spec: Option<PathBuf>,

        /// Comma-separated list of API groups to include
        #[arg(long, value_delimiter = ',')]
        groups: Vec<String>,

        /// Comma-separated list of group:kind pairs to include
        #[arg(long, value_delimiter = ',')]
        resources: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if cli.verbose {
        println!("{} Verbose mode enabled", "→".cyan());
    }

    match cli.command {
        Commands::Run {
            config,
            boilerplate,
            output,
            spec,
        } => {
            run_command(
                config.as_path(),
                boilerplate.as_path(),
                output.as_path(),
                spec.as_deref(),
                cli.verbose,
            )?;
        },
        Commands::Parse {
            spec,
            groups,
            resources,
        } => {
            parse_command(spec.as_deref(), &groups, &resources, cli.verbose)?;
        },
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    if tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

/// Pick the local file when given, otherwise fetch over HTTP
fn spec_source(spec: Option<&Path>, spec_url: Option<&str>) -> Box<dyn SpecSource> {
    match spec {
        Some(path) => Box::new(FileSpecSource::new(path)),
        None => Box::new(HttpSpecSource::new(spec_url.unwrap_or(DEFAULT_SPEC_URL))),
    }
}

fn load_specification(
    source: &dyn SpecSource,
    groups: &[String],
    resources: &[String],
) -> Result<ResourceSet> {
    println!(
        "{} Loading specification from: {}",
        "→".cyan(),
        source.describe()
    );

    let set = load_resource_set(source, groups, resources)
        .with_context(|| format!("Failed to load specification from {}", source.describe()))?;

    println!(
        "{} Normalized {} resources (specification {})",
        "✓".green(),
        set.all_resources().len(),
        set.specification_version.yellow()
    );

    Ok(set)
}

fn read_boilerplate(path: &Path) -> Result<String> {
    if !path.exists() && path == Path::new(DEFAULT_BOILERPLATE) {
        tracing::info!(path = %path.display(), "no boilerplate header found");
        return Ok(String::new());
    }

    fs::read_to_string(path)
        .with_context(|| format!("Failed to read boilerplate {}", path.display()))
}

fn run_command(
    config_path: &Path,
    boilerplate: &Path,
    output: &Path,
    spec: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    println!(
        "{} Loading configuration: {}",
        "→".cyan(),
        config_path.display()
    );
    let config = GeneratorConfig::load(config_path).context("Failed to load configuration")?;

    if verbose {
        println!("  Groups: {}", config.spec.groups.join(", "));
        println!("  Resources: {}", config.spec.resources.join(", "));
        println!("  Output: {}", output.display());
    }

    let source = spec_source(spec, config.spec.spec_url.as_deref());
    let set = load_specification(source.as_ref(), &config.spec.groups, &config.spec.resources)?;

    let selected = set.resources().len();
    if selected == 0 {
        println!(
            "{} No resources selected by {}",
            "!".yellow(),
            config_path.display()
        );
        return Ok(());
    }

    println!("{} Generating {} resources...", "→".cyan(), selected);
    let header = read_boilerplate(boilerplate)?;
    let generator = ControllerGenerator::new(set)
        .context("Failed to create generator")?
        .with_boilerplate(header);

    let report = generator
        .generate_to_directory(output)
        .context("Failed to write generated files")?;

    if verbose {
        println!("\n{}", "Written:".bold());
        for path in &report.written {
            println!("  📄 {}", path.display());
        }
        if !report.skipped.is_empty() {
            println!("\n{}", "Left untouched:".bold());
            for path in &report.skipped {
                println!("  • {}", path.display());
            }
        }
    }

    println!(
        "\n{} {} written, {} left untouched",
        "Files:".bold(),
        report.written.len(),
        report.skipped.len()
    );

    if !report.is_success() {
        println!("\n{}", "Failed resources:".red().bold());
        for failure in &report.failures {
            println!("  {} {}: {}", "✗".red(), failure.resource.yellow(), failure.error);
        }
        bail!(
            "{} of {} resources failed to generate",
            report.failures.len(),
            selected
        );
    }

    println!("\n{}", "✓ Generation complete!".green().bold());
    println!("\n{}", "Next steps:".bold());
    println!("  1. Review generated files in {}", output.display());
    println!("  2. Regenerate deepcopy functions: controller-gen object paths=./...");

    Ok(())
}

fn parse_command(
    spec: Option<&Path>,
    groups: &[String],
    resources: &[String],
    verbose: bool,
) -> Result<()> {
    let source = spec_source(spec, None);
    let set = load_specification(source.as_ref(), groups, resources)?;

    let selected = set.resources();
    println!("\n{}", "✓ Parse successful!".green().bold());
    println!("  Selected: {}", selected.len());

    println!("\n{}", "Resources:".bold());
    for resource in selected {
        println!(
            "  • {} ({}/{})",
            resource.resource_name.cyan(),
            resource.group,
            resource.kind
        );
        if verbose {
            print_resource_details(resource);
        }
    }

    Ok(())
}

fn print_resource_details(resource: &ResourceKind) {
    println!("    Properties: {}", resource.root.properties.len());
    for (name, property) in resource.root.sorted_properties() {
        let field = TypeResolver::resolve_property(name, property, &resource.kind);
        println!("      {}: {}", field.name, field.target.describe().dimmed());
    }
    println!("    Attributes: {}", resource.root.attributes.len());
    println!("    Nested types: {}", resource.property_types.len());

    let missing = resource.missing_nested_types();
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(String::as_str).collect();
        println!("    {} {}", "Missing nested types:".red(), names.join(", "));
    }
}
