//! Domain records shared by every crate.
//!
//! All records use `camelCase` field names so stored collections stay
//! compatible with the JSON files written by earlier clients. Enum values are
//! read leniently (unknown strings fall back to a default with a warning)
//! and written canonically.

#[macro_use]
mod macros;

mod project;
mod task;

pub use project::{Project, ProjectStatus};
pub use task::{Task, TaskNote, TaskPriority, TaskStatus};

/// Read an explicit JSON `null` the same as a missing field.
///
/// Use with `#[serde(default, deserialize_with = "...")]`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + serde::Deserialize<'de>,
{
    let value = <Option<T> as serde::Deserialize>::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

/// Collapse empty or whitespace-only optional strings to `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_blank_filters() {
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some(String::new())), None);
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(Some("x".into())), Some("x".into()));
    }
}
