//! Terminal rendering and input for the chat loop

use colored::*;
use crossterm::{
    event::{self, Event, KeyCode},
    terminal::{disable_raw_mode, enable_raw_mode, size},
};
use pulldown_cmark::{Event as MdEvent, Parser, Tag, TagEnd};
use std::io::{self, IsTerminal, Write};

use bloom_core::{Result, SourceDocument};

/// Display the startup banner.
pub fn display_banner() {
    let terminal_width = size().map(|(w, _)| w as usize).unwrap_or(80);
    let banner_width = std::cmp::min(64, terminal_width.saturating_sub(4));

    println!();
    for line in banner_lines(banner_width) {
        println!("{}", line);
    }
    println!();
}

// All width arithmetic saturates so a terminal narrower than the banner
// degrades instead of panicking.
fn banner_lines(banner_width: usize) -> Vec<String> {
    let inner = banner_width.saturating_sub(2);
    let top_border = format!("┌{}┐", "─".repeat(inner));
    let bottom_border = format!("└{}┘", "─".repeat(inner));
    let empty_line = format!("│{}│", " ".repeat(inner));

    let mut lines = Vec::new();
    lines.push(top_border.magenta().to_string());
    lines.push(empty_line.magenta().to_string());

    let title = "Bloom - Course Advisor";
    lines.push(format!(
        "│  {}{}│",
        title.magenta().bold(),
        " ".repeat(banner_width.saturating_sub(title.len() + 4))
    ));

    lines.push(empty_line.magenta().to_string());

    let feature_lines = [
        "Chat with the course catalogue",
        "",
        "• Ask for courses in natural language",
        "• Follow-up questions keep their context",
        "• Answers cite the catalogue entries they used",
        "• Command history navigation (↑/↓ arrows)",
        "",
        "v0.1.0 • type 'help' for commands",
    ];

    for line in feature_lines {
        if line.is_empty() {
            lines.push(empty_line.magenta().to_string());
        } else {
            let padding = " ".repeat(banner_width.saturating_sub(display_len(line) + 4));
            let content = if line.starts_with("v0.1.0") {
                format!("│  {}{}│", line.dimmed(), padding)
            } else {
                format!("│  {}{}│", line, padding)
            };
            lines.push(content.magenta().to_string());
        }
    }

    lines.push(empty_line.magenta().to_string());
    lines.push(bottom_border.magenta().to_string());
    lines
}

// Arrows and bullets are one column wide but several bytes long.
fn display_len(line: &str) -> usize {
    line.chars().count()
}

/// Read one line of input with arrow-key history navigation. Falls back to
/// plain line reads when stdin is piped.
pub fn read_question(history: &mut Vec<String>) -> Result<String> {
    if !io::stdin().is_terminal() {
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim().to_string();
        if !input.is_empty() {
            history.push(input.clone());
        }
        return Ok(input);
    }

    enable_raw_mode()?;
    let mut input = String::new();
    let mut history_index: Option<usize> = None;
    let mut cursor_pos = 0;

    print!("{} ", "you>".green().bold());
    io::stdout().flush()?;

    loop {
        if let Event::Key(key_event) = event::read()? {
            match key_event.code {
                KeyCode::Enter => {
                    disable_raw_mode()?;
                    println!();
                    if !input.is_empty() {
                        history.push(input.clone());
                    }
                    return Ok(input);
                }
                KeyCode::Char(c) => {
                    input.insert(cursor_pos, c);
                    cursor_pos += 1;
                    print!("\r{} {}", "you>".green().bold(), input);
                    io::stdout().flush()?;
                }
                KeyCode::Backspace => {
                    if cursor_pos > 0 {
                        input.remove(cursor_pos - 1);
                        cursor_pos -= 1;
                        print!(
                            "\r{} {}  \r{} {}",
                            "you>".green().bold(),
                            input,
                            "you>".green().bold(),
                            input
                        );
                        io::stdout().flush()?;
                    }
                }
                KeyCode::Up => {
                    if !history.is_empty() {
                        let new_index = match history_index {
                            None => history.len() - 1,
                            Some(idx) if idx > 0 => idx - 1,
                            Some(idx) => idx,
                        };
                        history_index = Some(new_index);
                        input = history[new_index].clone();
                        cursor_pos = input.len();
                        print!(
                            "\r{} {}  \r{} {}",
                            "you>".green().bold(),
                            " ".repeat(60),
                            "you>".green().bold(),
                            input
                        );
                        io::stdout().flush()?;
                    }
                }
                KeyCode::Down => {
                    if let Some(idx) = history_index {
                        if idx < history.len() - 1 {
                            let new_index = idx + 1;
                            history_index = Some(new_index);
                            input = history[new_index].clone();
                        } else {
                            history_index = None;
                            input.clear();
                        }
                        cursor_pos = input.len();
                        print!(
                            "\r{} {}  \r{} {}",
                            "you>".green().bold(),
                            " ".repeat(60),
                            "you>".green().bold(),
                            input
                        );
                        io::stdout().flush()?;
                    }
                }
                KeyCode::Esc => {
                    disable_raw_mode()?;
                    println!();
                    return Ok(String::new());
                }
                _ => {}
            }
        }
    }
}

pub fn print_help() {
    println!("{}", "Available commands:".bold());
    println!(
        "  {} - Ask anything about the course catalogue",
        "<question>".green()
    );
    println!("  {} - Show this help message", "help".green());
    println!("  {} - Exit the chat", "exit/quit".green());
    println!();
    println!("{}", "Examples:".bold());
    println!("  what courses do you have about Go?");
    println!("  which of those are instructor-led?");
    println!("  what is the best rated course?");
}

pub fn print_assistant_prefix() {
    print!("{} ", "bloom>".magenta().bold());
    let _ = io::stdout().flush();
}

/// Print one streamed answer token in place.
pub fn print_token(token: &str) {
    print!("{}", token);
    let _ = io::stdout().flush();
}

pub fn print_notice(notice: &str) {
    println!("{}", notice.dimmed());
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message.red());
}

/// List the catalogue entries an answer was grounded in.
pub fn print_sources(sources: &[SourceDocument]) {
    if sources.is_empty() {
        return;
    }

    println!();
    println!("{}", "Sources:".dimmed().bold());
    for doc in sources {
        let title = doc
            .page_content
            .lines()
            .next()
            .unwrap_or(&doc.page_content);
        match doc.metadata.get("source").and_then(|v| v.as_str()) {
            Some(source) => println!("  {} {}", format!("• {}", title).dimmed(), format!("({})", source).dimmed()),
            None => println!("  {}", format!("• {}", title).dimmed()),
        }
    }
}

/// Flatten markdown to plain styled terminal text: bold headings, bulleted
/// lists, everything else as-is.
pub fn render_markdown(markdown: &str) -> String {
    let mut output = String::new();
    let mut list_depth = 0usize;

    for event in Parser::new(markdown) {
        match event {
            MdEvent::Start(Tag::Heading { .. }) => {
                if !output.is_empty() && !output.ends_with('\n') {
                    output.push('\n');
                }
            }
            MdEvent::End(TagEnd::Heading(_)) => output.push('\n'),
            MdEvent::Start(Tag::List(_)) => list_depth += 1,
            MdEvent::End(TagEnd::List(_)) => {
                list_depth = list_depth.saturating_sub(1);
            }
            MdEvent::Start(Tag::Item) => {
                output.push_str(&"  ".repeat(list_depth.saturating_sub(1)));
                output.push_str("• ");
            }
            MdEvent::End(TagEnd::Item) => output.push('\n'),
            MdEvent::Start(Tag::Paragraph) => {}
            MdEvent::End(TagEnd::Paragraph) => {
                if list_depth == 0 {
                    output.push_str("\n\n");
                }
            }
            MdEvent::Text(text) | MdEvent::Code(text) => output.push_str(&text),
            MdEvent::SoftBreak | MdEvent::HardBreak => output.push('\n'),
            _ => {}
        }
    }

    output.trim_end().to_string()
}
