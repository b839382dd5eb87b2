//! Shared UI primitives for notecmd
//!
//! Conventions:
//! - Prompts: lowercase with colon and space: `title: `
//! - Key hints in brackets: `[Tab]`, `[Ctrl+S]save`
//! - Feedback: short sentences: `Saved.`, `Error: ...`

use anyhow::Result;
use crossterm::{
    cursor,
    style::{Color, Stylize},
    terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType},
    ExecutableCommand,
};
use inquire::{ui::RenderConfig, Confirm, Password, PasswordDisplayMode, Select, Text};
use std::io::{self, Write};

// ============================================================================
// Terminal Writer
// ============================================================================

/// Terminal writer that handles raw mode newlines.
///
/// In raw mode, newlines are `\r\n`; in cooked mode `\n`. Write errors are
/// ignored so a broken terminal never aborts the editor.
pub struct Term {
    raw_mode: bool,
    stdout: io::Stdout,
}

impl Term {
    pub fn new() -> Self {
        Self {
            raw_mode: false,
            stdout: io::stdout(),
        }
    }

    /// Enter raw mode, returning an error if the terminal refuses.
    pub fn try_raw() -> Result<Self> {
        enable_raw_mode()?;
        Ok(Self {
            raw_mode: true,
            stdout: io::stdout(),
        })
    }

    #[inline]
    pub fn is_raw(&self) -> bool {
        self.raw_mode
    }

    /// Write a line with proper newline handling
    pub fn line(&mut self, s: &str) {
        if self.raw_mode {
            let _ = write!(self.stdout, "{}\r\n", s);
        } else {
            let _ = writeln!(self.stdout, "{}", s);
        }
    }

    /// Clear the screen and move cursor to top-left
    pub fn clear(&mut self) {
        let _ = self.stdout.execute(Clear(ClearType::All));
        let _ = self.stdout.execute(cursor::MoveTo(0, 0));
    }

    #[inline]
    pub fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    pub fn show_cursor(&mut self, visible: bool) {
        let _ = if visible {
            self.stdout.execute(cursor::Show)
        } else {
            self.stdout.execute(cursor::Hide)
        };
    }
}

impl Default for Term {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Term {
    fn drop(&mut self) {
        if self.raw_mode {
            let _ = self.stdout.execute(cursor::Show);
            let _ = disable_raw_mode();
        }
    }
}

// ============================================================================
// Status Bar Builder
// ============================================================================

const MAX_STATUS_ACTIONS: usize = 8;

/// Builder for key hint lines.
///
/// Example output: "[Tab]field [Ctrl+S]save | [Esc]"
pub struct StatusBar<'a> {
    actions: [Option<(&'a str, &'a str)>; MAX_STATUS_ACTIONS],
    action_count: usize,
}

impl<'a> StatusBar<'a> {
    pub fn new() -> Self {
        Self {
            actions: [None; MAX_STATUS_ACTIONS],
            action_count: 0,
        }
    }

    /// Add an action hint: `.action("Tab", "field")` produces `[Tab]field`
    pub fn action(mut self, key: &'a str, label: &'a str) -> Self {
        if self.action_count < MAX_STATUS_ACTIONS {
            self.actions[self.action_count] = Some((key, label));
            self.action_count += 1;
        }
        self
    }

    /// Add a visual separator (" | ")
    pub fn separator(self) -> Self {
        self.action("|", "")
    }

    /// Render to a single line, dropping labels when the terminal is narrow.
    pub fn render(&self) -> String {
        let (width, _) = term_size();
        let full = self.render_with(true);
        if full.chars().count() > width.saturating_sub(2) {
            self.render_with(false)
        } else {
            full
        }
    }

    fn render_with(&self, labels: bool) -> String {
        let mut result = String::new();
        for (key, label) in self.actions.iter().take(self.action_count).flatten() {
            if *key == "|" {
                result.push_str(" | ");
                continue;
            }
            if !result.is_empty() && !result.ends_with(" | ") {
                result.push(' ');
            }
            result.push('[');
            result.push_str(key);
            result.push(']');
            if labels {
                result.push_str(label);
            }
        }
        result
    }
}

impl Default for StatusBar<'_> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Layout Primitives
// ============================================================================

/// Truncate a string to max_chars, adding an ellipsis if needed.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_chars - 1).collect();
    format!("{}…", kept)
}

/// Parse `#RRGGBB` or `#RGB` into components.
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim().strip_prefix('#')?;
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return None,
    };
    let channel = |i: usize| u8::from_str_radix(expanded.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// Two-cell colour block for a hex colour, or blanks when unparsable.
pub fn swatch(hex: &str) -> String {
    match hex_to_rgb(hex) {
        Some((r, g, b)) => "  ".on(Color::Rgb { r, g, b }).to_string(),
        None => "  ".to_string(),
    }
}

// ============================================================================
// Message Functions
// ============================================================================

/// Print an error message to stderr
#[inline]
pub fn error(msg: &str) {
    eprintln!("Error: {}", msg);
}

// ============================================================================
// Screen
// ============================================================================

/// Clear the terminal screen and move cursor to top-left
pub fn clear_screen() -> Result<()> {
    let mut stdout = io::stdout();
    stdout.execute(Clear(ClearType::All))?;
    stdout.execute(cursor::MoveTo(0, 0))?;
    stdout.flush()?;
    Ok(())
}

/// Terminal dimensions, defaulting to 80x24 for pipes and non-TTY output
pub fn term_size() -> (usize, usize) {
    crossterm::terminal::size()
        .map(|(w, h)| (w as usize, h as usize))
        .unwrap_or((80, 24))
}

/// Rows available to a scrolling list below a header and status line.
pub fn visible_lines() -> usize {
    let (_, height) = term_size();
    height.saturating_sub(4).max(5)
}

// ============================================================================
// Prompts
// ============================================================================

/// Get a minimal render config for inquire prompts
pub fn minimal_render_config() -> RenderConfig<'static> {
    RenderConfig::default_colored()
        .with_prompt_prefix(inquire::ui::Styled::new(""))
        .with_answered_prompt_prefix(inquire::ui::Styled::new(""))
}

/// Display a selection menu and return the chosen index
pub fn select<T: ToString>(prompt: &str, options: &[T]) -> Result<Option<usize>> {
    if options.is_empty() {
        return Ok(None);
    }

    let items: Vec<String> = options.iter().map(|o| o.to_string()).collect();

    let result = Select::new(prompt, items.clone())
        .with_render_config(minimal_render_config())
        .with_page_size(visible_lines())
        .with_vim_mode(true)
        .prompt_skippable()?;

    Ok(result.and_then(|selected| items.iter().position(|o| *o == selected)))
}

/// Prompt for text input with optional default value
pub fn text_input(prompt: &str, default: Option<&str>) -> Result<Option<String>> {
    let mut builder = Text::new(prompt).with_render_config(minimal_render_config());

    if let Some(d) = default.filter(|d| !d.is_empty()) {
        builder = builder.with_default(d);
    }

    Ok(builder.prompt_skippable()?)
}

/// Prompt for a secret without echoing it
pub fn password_input(prompt: &str) -> Result<Option<String>> {
    let result = Password::new(prompt)
        .with_render_config(minimal_render_config())
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt_skippable()?;
    Ok(result)
}

/// Prompt for yes/no confirmation (default: no)
pub fn confirm(prompt: &str) -> Result<bool> {
    let result = Confirm::new(prompt)
        .with_render_config(minimal_render_config())
        .with_default(false)
        .prompt()?;
    Ok(result)
}
