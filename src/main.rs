//! Hamlet CLI
//!
//! Usage:
//!   hamlet [OPTIONS] [FILE]
//!
//! Options:
//!   -l, --locals <FILE>      JSON object of template locals
//!   -c, --config <FILE>      Compilation options (TOML format)
//!   --xml                    Self-close every empty tag
//!   --escape-html            Escape `=` output by default
//!   --escape-with <NAME>     Built-in used to escape output
//!   --strict-doctype         Fail on unknown `!!!` keywords
//!   --no-optimize            Keep literal fragments unmerged
//!   --tree                   Print the compiled tree instead of rendering
//!   -h, --help               Print help

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::Parser;
use serde_json::Value;

use hamlet::{build, SelfClosingPolicy, TemplateConfig};

#[derive(Parser)]
#[command(name = "hamlet")]
#[command(about = "Render indentation-sensitive markup templates to HTML")]
struct Cli {
    /// Template file (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// JSON file with an object of template locals
    #[arg(short, long)]
    locals: Option<PathBuf>,

    /// Compilation options file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Self-close every tag without content
    #[arg(long)]
    xml: bool,

    /// Escape `=` output by default
    #[arg(long)]
    escape_html: bool,

    /// Built-in function used to escape output
    #[arg(long, value_name = "NAME")]
    escape_with: Option<String>,

    /// Fail on unknown doctype keywords
    #[arg(long)]
    strict_doctype: bool,

    /// Skip literal folding
    #[arg(long)]
    no_optimize: bool,

    /// Print the compiled expression tree instead of rendering
    #[arg(long)]
    tree: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match TemplateConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => TemplateConfig::default(),
    };
    if cli.xml {
        config = config.with_self_closing(SelfClosingPolicy::Xml);
    }
    if cli.escape_html {
        config = config.with_escape_html_by_default(true);
    }
    if let Some(name) = &cli.escape_with {
        config = config.with_custom_escape(name.clone());
    }
    if cli.strict_doctype {
        config = config.with_strict_doctype(true);
    }
    if cli.no_optimize {
        config = config.with_optimize(false);
    }

    let locals = match &cli.locals {
        Some(path) => match read_locals(path) {
            Ok(locals) => locals,
            Err(message) => {
                eprintln!("Error loading locals '{}': {}", path.display(), message);
                std::process::exit(1);
            }
        },
        None => Value::Object(Default::default()),
    };

    // Read input
    let (source, filename) = match &cli.input {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => (content, path.display().to_string()),
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => (buffer, "<stdin>".to_string()),
                Err(e) => {
                    eprintln!("Error reading from stdin: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    let template = match build(&source, &config) {
        Ok(template) => template,
        Err(e) => {
            eprint!("{}", e.format(&source, &filename));
            std::process::exit(1);
        }
    };

    if cli.tree {
        print!("{}", template.tree());
        return;
    }

    let (html, errors) = template.render_with_diagnostics(&locals);
    for error in &errors {
        log::warn!("{}", error);
    }
    println!("{}", html);
}

fn read_locals(path: &Path) -> Result<Value, String> {
    let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
    let locals: Value = serde_json::from_str(&content).map_err(|e| e.to_string())?;
    if !locals.is_object() {
        return Err("expected a JSON object".to_string());
    }
    Ok(locals)
}
