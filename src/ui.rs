use colored::*;
use terminal_size::{terminal_size, Height, Width};

use crate::tools::dispatch::OutputSink;

/// Output sink that prints agent messages to the terminal.
pub struct ConsoleSink;

impl OutputSink for ConsoleSink {
    fn deliver(&self, message: &str) {
        println!("\n{} {}\n", "[Sam]:".green().bold(), message);
    }
}

pub fn print_header(model: &str, provider: &str) {
    let (width, _) = terminal_size().unwrap_or((Width(80), Height(24)));
    let width = width.0 as usize;

    let line = "─".repeat(width);
    println!("{}", line.black().bold());

    let name = "Sam".yellow().bold();
    let version = format!("v{}", env!("CARGO_PKG_VERSION")).black().bold();
    println!("  {} {}", name, version);

    let info = format!("  {}  •  {}", model, provider).cyan();
    println!("{}", info);

    println!("{}", line.black().bold());
}

pub fn print_memory_dump(dump: &str) {
    let line = "----------------";
    println!("{}\n{}\n{}", line.black().bold(), dump.trim_end(), line.black().bold());
}

pub fn print_step(msg: &str) {
    println!("  {} {}", "•".green(), msg);
}

pub fn print_success(msg: &str) {
    println!("  {} {}", "✓".green().bold(), msg.green());
}

pub fn print_warning(msg: &str) {
    println!("  {} {}", "⚠️ ".yellow().bold(), msg.yellow());
}

pub fn print_error(msg: &str) {
    println!("  {} {}", "❌".red().bold(), msg.red());
}
