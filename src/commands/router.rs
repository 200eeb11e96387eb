//! Command-path and option-tree resolution
//!
//! Recovers the logical (command, group, sub-group) path from the nested
//! option payload and locates the focused option for autocomplete.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Initial implementation

use super::interaction::{InteractionData, InteractionOption};
use super::model::OptionType;
use crate::core::CommandError;

/// Logical path of an invoked command
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandPath {
    pub command: String,
    pub group: Option<String>,
    pub sub_group: Option<String>,
}

/// Result of routing: the path plus the leaf option list it carries
#[derive(Debug, Clone, PartialEq)]
pub struct Route<'a> {
    pub path: CommandPath,
    pub options: &'a [InteractionOption],
}

/// Walk the first top-level option to find the invoked command.
///
/// A sub-command makes the interaction name the group; a sub-command group
/// additionally names the sub-group and must wrap exactly one sub-command.
pub fn resolve_path(data: &InteractionData) -> Result<Route<'_>, CommandError> {
    let Some(first) = data.options.first() else {
        return Ok(Route {
            path: CommandPath {
                command: data.name.clone(),
                group: None,
                sub_group: None,
            },
            options: &data.options,
        });
    };

    match first.kind {
        OptionType::SubCommand => Ok(Route {
            path: CommandPath {
                command: first.name.clone(),
                group: Some(data.name.clone()),
                sub_group: None,
            },
            options: &first.options,
        }),
        OptionType::SubCommandGroup => {
            let sub_command = first.options.first().ok_or_else(|| {
                CommandError::MalformedPayload(format!(
                    "sub-command group '{}' of '{}' has no sub-command",
                    first.name, data.name
                ))
            })?;
            Ok(Route {
                path: CommandPath {
                    command: sub_command.name.clone(),
                    group: Some(data.name.clone()),
                    sub_group: Some(first.name.clone()),
                },
                options: &sub_command.options,
            })
        }
        _ => Ok(Route {
            path: CommandPath {
                command: data.name.clone(),
                group: None,
                sub_group: None,
            },
            options: &data.options,
        }),
    }
}

/// Depth-first search for the option the user is typing into
pub fn find_focused(options: &[InteractionOption]) -> Option<&InteractionOption> {
    for option in options {
        if option.focused {
            return Some(option);
        }
        if option.options.is_empty() {
            continue;
        }
        if let Some(found) = find_focused(&option.options) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(raw: serde_json::Value) -> InteractionData {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn test_plain_command() {
        let data = data(json!({
            "name": "ping",
            "type": 1,
            "options": [{"name": "loud", "type": 5, "value": true}]
        }));
        let route = resolve_path(&data).unwrap();
        assert_eq!(route.path.command, "ping");
        assert_eq!(route.path.group, None);
        assert_eq!(route.options.len(), 1);
    }

    #[test]
    fn test_no_options() {
        let data = data(json!({"name": "ping", "type": 1}));
        let route = resolve_path(&data).unwrap();
        assert_eq!(route.path.command, "ping");
        assert!(route.options.is_empty());
    }

    #[test]
    fn test_sub_command() {
        let data = data(json!({
            "name": "social",
            "type": 1,
            "options": [{
                "name": "greet",
                "type": 1,
                "options": [{"name": "name", "type": 3, "value": "Ada"}]
            }]
        }));
        let route = resolve_path(&data).unwrap();
        assert_eq!(route.path.command, "greet");
        assert_eq!(route.path.group.as_deref(), Some("social"));
        assert_eq!(route.path.sub_group, None);
        assert_eq!(route.options[0].name, "name");
    }

    #[test]
    fn test_sub_command_group() {
        let data = data(json!({
            "name": "admin",
            "type": 1,
            "options": [{
                "name": "roles",
                "type": 2,
                "options": [{
                    "name": "grant",
                    "type": 1,
                    "options": [
                        {"name": "who", "type": 6, "value": "1"},
                        {"name": "role", "type": 8, "value": "2"}
                    ]
                }]
            }]
        }));
        let route = resolve_path(&data).unwrap();
        assert_eq!(
            route.path,
            CommandPath {
                command: "grant".into(),
                group: Some("admin".into()),
                sub_group: Some("roles".into()),
            }
        );
        let names: Vec<_> = route.options.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["who", "role"]);
    }

    #[test]
    fn test_empty_sub_command_group_is_malformed() {
        let data = data(json!({
            "name": "admin",
            "type": 1,
            "options": [{"name": "roles", "type": 2}]
        }));
        assert!(matches!(
            resolve_path(&data),
            Err(CommandError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_find_focused_deep() {
        let data = data(json!({
            "name": "admin",
            "type": 1,
            "options": [{
                "name": "roles",
                "type": 2,
                "options": [{
                    "name": "grant",
                    "type": 1,
                    "options": [
                        {"name": "who", "type": 3, "value": "a"},
                        {"name": "role", "type": 3, "value": "mod", "focused": true}
                    ]
                }]
            }]
        }));
        let focused = find_focused(&data.options).unwrap();
        assert_eq!(focused.name, "role");
    }

    #[test]
    fn test_find_focused_first_match_wins() {
        let data = data(json!({
            "name": "x",
            "type": 1,
            "options": [
                {"name": "a", "type": 3, "value": "1", "focused": true},
                {"name": "b", "type": 3, "value": "2", "focused": true}
            ]
        }));
        assert_eq!(find_focused(&data.options).unwrap().name, "a");
    }

    #[test]
    fn test_find_focused_none() {
        let data = data(json!({
            "name": "x",
            "type": 1,
            "options": [{"name": "a", "type": 3, "value": "1"}]
        }));
        assert!(find_focused(&data.options).is_none());
    }
}
