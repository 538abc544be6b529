//! Plain-text rendering of directory state.
//!
//! Renderers are pure: they take domain values and return the text to print.
//! Passwords are never rendered.

use crate::domain::{DirectorySnapshot, FetchState, FieldErrors, User};

const HEADERS: [&str; 4] = ["ID", "Name", "Email", "Account Type"];

/// Render the directory as a table, an empty notice, or an error line.
#[must_use]
pub fn render_directory(snapshot: &DirectorySnapshot) -> String {
    match snapshot.state() {
        FetchState::Idle | FetchState::Pending => "Loading...".to_owned(),
        FetchState::Error(message) => format!("Error: {message}"),
        FetchState::Success(users) if users.is_empty() => "No users found".to_owned(),
        FetchState::Success(users) => render_table(users),
    }
}

fn render_table(users: &[User]) -> String {
    let rows: Vec<[String; 4]> = users
        .iter()
        .map(|user| {
            [
                user.id().to_string(),
                user.name().to_owned(),
                user.email().to_owned(),
                user.account_type().label().to_owned(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|header| header.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut table = format_row(HEADERS.iter().copied(), &widths);
    for row in &rows {
        table.push('\n');
        table.push_str(&format_row(row.iter().map(String::as_str), &widths));
    }
    table
}

fn format_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize; 4]) -> String {
    let line = cells
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join(" | ");
    line.trim_end().to_owned()
}

/// Render one user as labelled lines.
#[must_use]
pub fn render_user(user: &User) -> String {
    format!(
        "ID: {}\nName: {}\nEmail: {}\nAccount Type: {}",
        user.id(),
        user.name(),
        user.email(),
        user.account_type()
    )
}

/// Render field errors in display order, one `Label: message` per line.
#[must_use]
pub fn render_field_errors(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, error)| format!("{field}: {error}"))
        .collect::<Vec<_>>()
        .join("\n")
}
