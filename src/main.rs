//! axmlpack CLI - Command-line tool for generating Android binary XML resources.
//!
//! This is the main entry point for the axmlpack command-line application.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use axmlpack::prelude::*;

/// axmlpack - Android binary XML resource generator
#[derive(Parser)]
#[command(name = "axmlpack")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a compiled config_webview_packages.xml
    Webview {
        /// Output file
        #[arg(short, long, default_value = "config_webview_packages_patched.xml")]
        output: PathBuf,

        /// JSON file with the provider list (defaults to Chrome, then Android WebView)
        #[arg(short, long)]
        providers: Option<PathBuf>,

        /// Source line recorded for the root element
        #[arg(long)]
        first_line: Option<u32>,
    },

    /// Compile a text XML file to binary XML
    Compile {
        /// Input XML file
        #[arg(short, long)]
        input: PathBuf,

        /// Output binary XML file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Webview { output, providers, first_line } => {
            cmd_webview(&output, providers.as_deref(), first_line)?;
        }
        Commands::Compile { input, output } => {
            cmd_compile(&input, &output)?;
        }
    }

    Ok(())
}

fn cmd_webview(output: &Path, providers: Option<&Path>, first_line: Option<u32>) -> Result<()> {
    let mut config = match providers {
        Some(path) => {
            println!("Loading providers: {}", path.display());
            let json = fs::read_to_string(path).context("Failed to read provider list")?;
            WebViewConfig::new(parse_providers(&json)?)
        }
        None => WebViewConfig::default(),
    };
    if let Some(line) = first_line {
        config = config.first_line(line);
    }

    for (i, provider) in config.providers.iter().enumerate() {
        println!("  {}. {} ({})", i + 1, provider.description, provider.package_name);
    }

    let doc = config.to_document().context("Failed to build WebView provider list")?;
    write_document(&doc, output)
}

fn cmd_compile(input: &Path, output: &Path) -> Result<()> {
    println!("Compiling: {} -> {}", input.display(), output.display());

    let data = fs::read(input).context("Failed to read input file")?;
    let builder = XmlBuilder::from_xml_bytes(&data).context("Failed to parse XML")?;
    let doc = builder.build().context("Failed to build document")?;

    write_document(&doc, output)
}

fn parse_providers(json: &str) -> Result<Vec<WebViewProvider>> {
    let providers: Vec<WebViewProvider> = serde_json::from_str(json).context("Invalid provider list JSON")?;
    if providers.is_empty() {
        anyhow::bail!("Provider list is empty");
    }
    Ok(providers)
}

/// Encode the whole document in memory, then write it in one go.
fn write_document(doc: &XmlDocument, output: &Path) -> Result<()> {
    let bytes = doc.encode().context("Failed to encode binary XML")?;
    fs::write(output, &bytes).context("Failed to write output file")?;

    let stats = doc.stats();
    println!("Written {} bytes to {}", bytes.len(), output.display());
    println!(
        "Strings: {}, elements: {}, attributes: {}",
        stats.strings, stats.elements, stats.attributes
    );

    Ok(())
}
