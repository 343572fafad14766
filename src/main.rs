use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

use blockmark_lib::diff::{self, Change, DiffBlock, DiffResult};
use blockmark_lib::{blocks_to_html, blocks_to_markdown, markdown_to_blocks, LinkMap};

/// Exit code when a diff found differences.
const EXIT_CHANGES: i32 = 1;
/// Exit code for tool errors (unreadable input, bad arguments).
const EXIT_TOOL_ERROR: i32 = 2;

#[derive(Parser)]
#[command(name = "blockmark", version, about = "Block-document markdown conversion and revision diffing")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a markdown file into blocks and re-serialize it
    Convert {
        /// Markdown file to convert
        file: PathBuf,
        /// Output form
        #[arg(long, value_enum, default_value_t = OutputForm::Html)]
        to: OutputForm,
    },
    /// Compare two markdown revisions
    Diff {
        /// Old revision
        old: PathBuf,
        /// New revision
        new: PathBuf,
        /// Diff mode
        #[arg(long, value_enum, default_value_t = DiffMode::Structure)]
        mode: DiffMode,
        /// Output format
        #[arg(long, value_enum, default_value_t = DiffFormat::Text)]
        format: DiffFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputForm {
    Markdown,
    Html,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum DiffMode {
    /// Index-paired block diff
    Blocks,
    /// Whole document as one annotated paragraph per side
    Whole,
    /// Whole document re-split on paragraph boundaries
    Paragraphs,
    /// Structure-preserving diff (default)
    Structure,
}

#[derive(Clone, Copy, ValueEnum)]
enum DiffFormat {
    Text,
    Html,
    Json,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{}: {err:#}", "error".red().bold());
            std::process::exit(EXIT_TOOL_ERROR);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Convert { file, to } => {
            let blocks = markdown_to_blocks(&read(&file)?);
            match to {
                OutputForm::Markdown => println!("{}", blocks_to_markdown(&blocks, &LinkMap::new())),
                OutputForm::Html => println!("{}", blocks_to_html(&blocks)),
                OutputForm::Json => println!("{}", serde_json::to_string_pretty(&blocks)?),
            }
            Ok(0)
        }
        Commands::Diff {
            old,
            new,
            mode,
            format,
        } => {
            let left = markdown_to_blocks(&read(&old)?);
            let right = markdown_to_blocks(&read(&new)?);
            let result = match mode {
                DiffMode::Blocks => diff::diff_blocks(&left, &right),
                DiffMode::Whole => diff::diff_whole_document(&left, &right),
                DiffMode::Paragraphs => diff::diff_whole_document_by_paragraph(&left, &right),
                DiffMode::Structure => diff::diff_blocks_by_structure(&left, &right),
            };
            match format {
                DiffFormat::Text => print_text_diff(&result),
                DiffFormat::Html => println!("{}", render_html_diff(&result)),
                DiffFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
            }
            Ok(if result.has_changes() { EXIT_CHANGES } else { 0 })
        }
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn print_text_diff(result: &DiffResult) {
    println!("{}", "--- old".red().bold());
    for block in &result.left {
        println!("{}", render_text_side(block));
    }
    println!("{}", "+++ new".green().bold());
    for block in &result.right {
        println!("{}", render_text_side(block));
    }
}

fn render_text_side(block: &DiffBlock) -> String {
    block
        .content
        .iter()
        .map(|span| {
            let text = span.node.plain_text();
            match span.change.or(block.change) {
                Some(Change::Removed) => text.as_str().red().strikethrough().to_string(),
                Some(Change::Added) => text.as_str().green().to_string(),
                None => text,
            }
        })
        .collect()
}

fn render_html_diff(result: &DiffResult) -> String {
    let side = |blocks: &[DiffBlock]| -> String {
        blocks
            .iter()
            .map(|block| {
                let inner: String = block
                    .content
                    .iter()
                    .map(|span| {
                        let text = escape(&span.node.plain_text());
                        match span.change.or(block.change) {
                            Some(Change::Removed) => format!("<del>{text}</del>"),
                            Some(Change::Added) => format!("<ins>{text}</ins>"),
                            None => text,
                        }
                    })
                    .collect();
                format!("<p>{inner}</p>")
            })
            .collect()
    };
    format!(
        "<div class=\"diff-old\">{}</div><div class=\"diff-new\">{}</div>",
        side(&result.left),
        side(&result.right)
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
