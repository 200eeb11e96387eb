//! Argument materialization
//!
//! Converts the routed option list plus the resolved table into named call
//! arguments, substituting full entity data for reference-typed options.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Member arguments carry the user they belong to
//! - 1.1.0: Mentionable wrapper resolving to role or user by id
//! - 1.0.0: Initial implementation

use std::collections::HashMap;

use serde_json::Value;

use super::interaction::{InteractionData, InteractionOption, Resolved, ResolvedSection};
use super::model::OptionType;
use crate::core::CommandError;

/// Named call arguments handed to a command callback
pub type Arguments = HashMap<String, ArgValue>;

/// A materialized argument
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// Verbatim wire value; also the fallback for unresolved references
    Value(Value),
    User(Value),
    /// Guild member plus its user; `user` is `Null` when neither section carries it
    Member { user: Value, member: Value },
    Role(Value),
    Channel(Value),
    Attachment(Value),
    Message(Value),
    Mentionable(Mentionable),
}

impl ArgValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::Value(v) => v.as_str(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ArgValue::Value(v) => v.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ArgValue::Value(v) => v.as_f64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Value(v) => v.as_bool(),
            _ => None,
        }
    }

    /// Full entity data for resolved references
    pub fn object(&self) -> Option<&Value> {
        match self {
            ArgValue::Value(_) => None,
            ArgValue::Member { member, .. } => Some(member),
            ArgValue::User(v)
            | ArgValue::Role(v)
            | ArgValue::Channel(v)
            | ArgValue::Attachment(v)
            | ArgValue::Message(v) => Some(v),
            ArgValue::Mentionable(m) => m.object(),
        }
    }

    /// User object behind a user, member or user mentionable
    pub fn user(&self) -> Option<&Value> {
        let user = match self {
            ArgValue::User(user) | ArgValue::Member { user, .. } => user,
            ArgValue::Mentionable(Mentionable::User { user, .. }) => user,
            _ => return None,
        };
        (!user.is_null()).then_some(user)
    }
}

/// A role-or-user reference, decided by which resolved section holds the id
#[derive(Debug, Clone, PartialEq)]
pub enum Mentionable {
    Role(Value),
    User { user: Value, member: Option<Value> },
    /// Id not present in the resolved table
    Unresolved(String),
}

impl Mentionable {
    pub fn resolve(id: &str, resolved: &Resolved) -> Self {
        if let Some(role) = resolved.roles.get(id) {
            return Mentionable::Role(role.clone());
        }
        let member = resolved.members.get(id);
        match (user_of(id, member, resolved), member) {
            (user, Some(member)) => Mentionable::User {
                user,
                member: Some(member.clone()),
            },
            (user, None) if !user.is_null() => Mentionable::User { user, member: None },
            _ => Mentionable::Unresolved(id.to_string()),
        }
    }

    pub fn object(&self) -> Option<&Value> {
        match self {
            Mentionable::Role(v) => Some(v),
            Mentionable::User { member: Some(m), .. } => Some(m),
            Mentionable::User { user, .. } => Some(user),
            Mentionable::Unresolved(_) => None,
        }
    }
}

/// Resolved sections tried, in order, for each reference-typed option
pub fn candidate_sections(kind: OptionType) -> &'static [ResolvedSection] {
    match kind {
        OptionType::Role => &[ResolvedSection::Roles],
        OptionType::User => &[ResolvedSection::Members, ResolvedSection::Users],
        OptionType::Channel => &[ResolvedSection::Channels],
        OptionType::Attachment => &[ResolvedSection::Attachments],
        _ => &[],
    }
}

/// User for `id`: the `users` entry, else a non-null `user` on the member entry.
/// Member objects inside `resolved` normally omit `user`.
fn user_of(id: &str, member: Option<&Value>, resolved: &Resolved) -> Value {
    resolved
        .users
        .get(id)
        .or_else(|| member.and_then(|m| m.get("user")).filter(|u| !u.is_null()))
        .cloned()
        .unwrap_or(Value::Null)
}

fn wrap(section: ResolvedSection, id: &str, value: &Value, resolved: &Resolved) -> ArgValue {
    let value = value.clone();
    match section {
        ResolvedSection::Users => ArgValue::User(value),
        ResolvedSection::Members => ArgValue::Member {
            user: user_of(id, Some(&value), resolved),
            member: value,
        },
        ResolvedSection::Roles => ArgValue::Role(value),
        ResolvedSection::Channels => ArgValue::Channel(value),
        ResolvedSection::Attachments => ArgValue::Attachment(value),
        ResolvedSection::Messages => ArgValue::Message(value),
    }
}

fn id_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn leaf_value(option: &InteractionOption) -> Result<&Value, CommandError> {
    option.value.as_ref().ok_or_else(|| {
        CommandError::MalformedPayload(format!("option '{}' carries no value", option.name))
    })
}

/// Materialize leaf options, resolving references through `resolved`.
///
/// Missing resolved entries degrade to the raw id.
pub fn materialize(options: &[InteractionOption], resolved: &Resolved) -> Result<Arguments, CommandError> {
    let mut arguments = Arguments::with_capacity(options.len());

    for option in options {
        let raw = leaf_value(option)?;

        let value = if option.kind == OptionType::Mentionable {
            match id_of(raw) {
                Some(id) => ArgValue::Mentionable(Mentionable::resolve(&id, resolved)),
                None => ArgValue::Value(raw.clone()),
            }
        } else {
            id_of(raw)
                .and_then(|id| {
                    resolved
                        .lookup(candidate_sections(option.kind), &id)
                        .map(|(section, object)| wrap(section, &id, object, resolved))
                })
                .unwrap_or_else(|| ArgValue::Value(raw.clone()))
        };

        arguments.insert(option.name.clone(), value);
    }

    Ok(arguments)
}

/// Autocomplete variant: values are always passed through unresolved,
/// since the user may still be typing.
pub fn raw_arguments(options: &[InteractionOption]) -> Result<Arguments, CommandError> {
    options
        .iter()
        .map(|option| Ok((option.name.clone(), ArgValue::Value(leaf_value(option)?.clone()))))
        .collect()
}

/// Arguments for user and message context-menu commands: the single target object
pub fn resolved_target(data: &InteractionData) -> Result<Arguments, CommandError> {
    let resolved = &data.resolved;

    let pick = |section: &'_ HashMap<String, Value>| -> Option<(String, Value)> {
        data.target_id
            .as_ref()
            .and_then(|id| section.get_key_value(id))
            .or_else(|| section.iter().next())
            .map(|(id, value)| (id.clone(), value.clone()))
    };

    let (name, value) = if let Some((_, message)) = pick(&resolved.messages) {
        ("message", ArgValue::Message(message))
    } else if let Some((id, member)) = pick(&resolved.members) {
        ("user", wrap(ResolvedSection::Members, &id, &member, resolved))
    } else if let Some((_, user)) = pick(&resolved.users) {
        ("user", ArgValue::User(user))
    } else {
        return Err(CommandError::MalformedPayload(format!(
            "context command '{}' has no resolved message, member or user",
            data.name
        )));
    };

    Ok(Arguments::from([(name.to_string(), value)]))
}
