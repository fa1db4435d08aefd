//! Interaction scripts
//!
//! One intent per line; blank lines and `#` comments are skipped.
//!
//! ```text
//! open
//! type ger
//! next
//! confirm
//! write ["us", "de"]
//! ```

use anyhow::{bail, Context, Result};
use blinc_combobox::option::flatten;
use blinc_combobox::prelude::*;

/// A single scripted intent
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    Open,
    Close,
    Type(String),
    Next,
    Prev,
    Confirm,
    Cancel,
    Click(String),
    Remove(String),
    Clear,
    Tag,
    Write(BoundValue),
    Disable,
    Enable,
    Blur,
}

/// Parse a script line, returning `None` for blanks and comments
pub fn parse_line(line: &str) -> Result<Option<Step>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    let step = match command {
        "open" => Step::Open,
        "close" => Step::Close,
        "type" => Step::Type(rest.to_string()),
        "next" => Step::Next,
        "prev" => Step::Prev,
        "confirm" => Step::Confirm,
        "cancel" => Step::Cancel,
        "click" => Step::Click(required(command, rest)?),
        "remove" => Step::Remove(required(command, rest)?),
        "clear" => Step::Clear,
        "tag" => Step::Tag,
        "write" => {
            let raw: serde_json::Value = serde_json::from_str(rest)
                .with_context(|| format!("Invalid JSON value '{}'", rest))?;
            Step::Write(BoundValue::from_json(raw))
        }
        "disable" => Step::Disable,
        "enable" => Step::Enable,
        "blur" => Step::Blur,
        other => bail!("Unknown command '{}'", other),
    };
    Ok(Some(step))
}

fn required(command: &str, rest: &str) -> Result<String> {
    if rest.is_empty() {
        bail!("'{}' needs a value", command);
    }
    Ok(rest.to_string())
}

/// Parse a whole script
pub fn parse_script(content: &str) -> Result<Vec<Step>> {
    let mut steps = Vec::new();
    for (index, line) in content.lines().enumerate() {
        if let Some(step) =
            parse_line(line).with_context(|| format!("Line {}: '{}'", index + 1, line))?
        {
            steps.push(step);
        }
    }
    Ok(steps)
}

/// Find an option by the textual form of its value
fn find_option(combobox: &Combobox, value: &str) -> Option<ComboOption> {
    let visible = combobox.visible().options();
    let known = flatten(combobox.groups(), combobox.options());
    visible
        .into_iter()
        .chain(known)
        .chain(combobox.added_options().iter())
        .find(|o| o.value.to_string() == value)
        .cloned()
}

/// Apply one step to a combobox
pub fn apply(combobox: &mut Combobox, step: &Step) {
    tracing::debug!(?step, "applying step");
    match step {
        Step::Open => combobox.open(),
        Step::Close => combobox.close(),
        Step::Type(text) => combobox.input(text),
        Step::Next => combobox.navigate(NavIntent::Next),
        Step::Prev => combobox.navigate(NavIntent::Previous),
        Step::Confirm => combobox.navigate(NavIntent::Confirm),
        Step::Cancel => combobox.navigate(NavIntent::Cancel),
        Step::Click(value) => match find_option(combobox, value) {
            Some(option) => combobox.select(&option),
            None => tracing::warn!(%value, "no option with this value"),
        },
        Step::Remove(value) => {
            let option = combobox
                .selected_options()
                .iter()
                .find(|o| o.value.to_string() == *value)
                .cloned();
            match option {
                Some(option) => combobox.remove_tag(&option),
                None => tracing::warn!(%value, "no selected option with this value"),
            }
        }
        Step::Clear => combobox.clear(true),
        Step::Tag => {
            if !combobox.add_tag() {
                tracing::warn!("no tag candidate for the current input");
            }
        }
        Step::Write(value) => combobox.write_value(value.clone()),
        Step::Disable => combobox.set_disabled(true),
        Step::Enable => combobox.set_disabled(false),
        Step::Blur => combobox.focus_out(),
    }
}
