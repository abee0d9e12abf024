//! Command-line interface for the renderer.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use console::style;
use xmlscope_engine::{config::DEFAULT_ENCODING, ResolutionPolicy, SerializeOptions};

use crate::error::Result;
use crate::outline;

/// xmlscope - Render document outlines to XML.
#[derive(Parser)]
#[command(name = "xmlscope")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a YAML or JSON outline to XML.
    Render(RenderArgs),
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct RenderArgs {
    /// Outline file (.yaml, .yml or .json), or - for YAML on stdin
    pub outline: PathBuf,

    /// Doctype body written as <!DOCTYPE ...> (e.g., html)
    #[arg(long)]
    pub doctype: Option<String>,

    /// Encoding named in the XML declaration
    #[arg(long, default_value = DEFAULT_ENCODING)]
    pub encoding: String,

    /// Write the <?xml ...?> declaration line
    #[arg(long)]
    pub declaration: bool,

    /// Indent nested elements
    #[arg(long)]
    pub pretty: bool,

    /// Only allow these tags (repeatable)
    #[arg(long = "allow", value_name = "TAG")]
    pub allow: Vec<String>,

    /// Refuse these tags (repeatable; ignored when --allow is given)
    #[arg(long = "deny", value_name = "TAG")]
    pub deny: Vec<String>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl RenderArgs {
    /// Resolution policy from the allow/deny flags.
    pub fn policy(&self) -> ResolutionPolicy {
        ResolutionPolicy::default()
            .with_allow(self.allow.iter().cloned())
            .with_deny(self.deny.iter().cloned())
    }

    /// Serialization options from the output flags.
    pub fn serialize_options(&self) -> SerializeOptions {
        let options = SerializeOptions::new()
            .encoding(self.encoding.as_str())
            .declaration(self.declaration)
            .pretty(self.pretty);
        match &self.doctype {
            Some(doctype) => options.doctype(doctype.as_str()),
            None => options,
        }
    }
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render(args) => render_command(&args),
    }
}

/// Execute the render command.
fn render_command(args: &RenderArgs) -> Result<()> {
    let outline = outline::load(&args.outline)?;
    let text = outline::render(&outline, args.policy(), &args.serialize_options())?;

    match args.output.as_deref() {
        Some(path) => write_output(path, &text),
        None => {
            println!("{text}");
            Ok(())
        }
    }
}

/// Write rendered text to `path`, ending with a newline.
fn write_output(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, format!("{text}\n"))?;
    tracing::debug!(path = %path.display(), bytes = text.len() + 1, "Wrote output");
    eprintln!("{} {}", style("Saved to:").green().bold(), path.display());
    Ok(())
}
