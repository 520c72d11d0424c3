//! Colored terminal output. `colored` honours NO_COLOR and CLICOLOR.

use std::fmt::Display;

use colored::Colorize;

/// `error: msg` on stderr.
pub fn error(msg: &(impl Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

pub fn success(msg: &(impl Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// `label: msg` with a green label.
pub fn action(label: &str, msg: &(impl Display + ?Sized)) {
    println!("{}: {}", label.green(), msg);
}

pub fn header(msg: &(impl Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Indented `key: value` line, key padded and dimmed.
pub fn field(key: &str, value: &(impl Display + ?Sized)) {
    let key = format!("{:<14}", format!("{key}:"));
    println!("  {} {}", key.dimmed(), value);
}

pub fn detail(msg: &(impl Display + ?Sized)) {
    println!("  {}", msg);
}

/// Uncolored data output, e.g. JSON or TOML.
pub fn info(msg: &(impl Display + ?Sized)) {
    println!("{}", msg);
}
