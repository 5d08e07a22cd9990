mod cli;

use lbc::hcl_front::HclSources;
use lbc::parse_tree::Document;
use lbc::validate::{security, semantic};

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("LBC_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Compile(compile_cli) => compile(compile_cli),
        cli::Command::Check(check_cli) => check(check_cli),
        cli::Command::Dev(dev_cli) => dev(dev_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

pub fn compile(cli: cli::CompileCommand) -> anyhow::Result<()> {
    let document = load(&cli.input)?;
    let compiled = lbc::compile_document(&document)?;

    let report = semantic::check(&compiled.config);
    for finding in &report.findings {
        eprintln!("{finding}");
    }
    for issue in &security::audit(&compiled.config).issues {
        eprintln!("security {issue}");
    }
    if report.has_errors() && !cli.no_validate {
        anyhow::bail!(
            "validation failed with {} error(s), use --no-validate to write the configuration anyway",
            report.errors().count()
        );
    }

    match &cli.output {
        Some(path) => {
            std::fs::write(path, &compiled.output)?;
            tracing::info!(path=%path.display(), "configuration written");
        }
        None => print!("{}", compiled.output),
    }
    Ok(())
}

pub fn check(cli: cli::CheckCommand) -> anyhow::Result<()> {
    let document = load(&cli.input)?;
    let compiled = lbc::compile_document(&document)?;

    let report = semantic::check(&compiled.config);
    let audit = security::audit(&compiled.config);

    println!("semantic: {} finding(s)", report.findings.len());
    print!("{report}");
    println!(
        "security: {} issue(s), highest {}",
        audit.issues.len(),
        audit
            .max_level()
            .map_or_else(|| "none".to_string(), |level| level.to_string())
    );
    print!("{audit}");

    anyhow::ensure!(!report.has_errors(), "configuration has semantic errors");
    Ok(())
}

fn load(input: &cli::InputArgs) -> anyhow::Result<Document> {
    if !input.workdir && input.files.is_empty() && input.directories.is_empty() {
        let stdin = std::io::read_to_string(std::io::stdin())?;
        return Ok(lbc::hcl_front::parse_document(&stdin)?);
    }

    let mut sources = HclSources::default();

    if input.workdir {
        sources.load_directory(&std::env::current_dir()?)?;
    }

    for file_path in &input.files {
        sources.load_file(file_path)?;
    }

    for dir_path in &input.directories {
        sources.load_directory(dir_path)?;
    }

    anyhow::ensure!(sources.source_count() > 0, "No files loaded");

    Ok(sources.into_document())
}

fn output(output: &cli::OutputArgs, value: &impl serde::Serialize) -> anyhow::Result<()> {
    match output.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), value)?,
        cli::OutputFormat::Json => serde_json::to_writer_pretty(std::io::stdout(), value)?,
    };

    Ok(())
}

/// (lbc-)developer utilities
///
/// A quick way to expose internal structures for debugging purposes
pub fn dev(cli: cli::DevCommand) -> anyhow::Result<()> {
    use cli::DevSubCommand::*;

    match cli.command {
        Tree(args) => output(&args.output, &load(&args.input)?),
        Ir(args) => {
            let compiled = lbc::compile_document(&load(&args.input)?)?;
            output(&args.output, &compiled.config)
        }
    }
}
