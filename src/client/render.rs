//! Plain-text rendering of the board.

use std::fmt::Write;

use super::state::BoardState;

/// Render the whole board. Rows are numbered from 1 for the command prompt.
pub fn render(state: &BoardState, api_root: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Tasks");
    let _ = writeln!(out, "{}", "─".repeat(40));

    if let Some(err) = state.error() {
        let _ = writeln!(out, "! {}", err);
    }

    if state.tasks().is_empty() {
        let _ = writeln!(out, "  No tasks yet.");
    }

    for (index, task) in state.tasks().iter().enumerate() {
        let check = if task.done { "[x]" } else { "[ ]" };
        match state.editing() {
            Some(session) if session.task_id == task.id => {
                let _ = writeln!(out, "{:>3}. {} ✎ {}_", index + 1, check, session.draft);
            }
            _ => {
                let title = if task.done {
                    strike(&task.title)
                } else {
                    task.title.clone()
                };
                let _ = writeln!(out, "{:>3}. {} {}", index + 1, check, title);
            }
        }
    }

    if state.is_busy() {
        let _ = writeln!(out, "  (working…)");
    }
    let _ = writeln!(out, "API: {}", api_root);
    out
}

/// Combining long stroke overlay, the terminal stand-in for line-through.
fn strike(text: &str) -> String {
    text.chars().flat_map(|c| [c, '\u{0336}']).collect()
}
