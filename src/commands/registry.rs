//! Command registry, tree builder and remote differ
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Identity-keyed weak registry, group tree builder, remote synchronization
//! - 1.0.0: Initial implementation for handler dispatch

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use anyhow::Result;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::try_join_all;
use log::{debug, info, warn};
use serenity::model::id::{ApplicationId, GuildId};

use super::handler::RegisteredCommand;
use super::model::{CommandDescriptor, CommandOption, CommandType, OptionType, Unique, GROUP_DESCRIPTION};
use crate::transport::CommandTransport;

struct Slot {
    /// Registration order; kept when a live entry is overwritten
    seq: u64,
    command: Weak<RegisteredCommand>,
}

/// Registry of declared commands keyed by identity
///
/// Entries are non-owning: a command stays registered only while something
/// else (usually a [`Plugin`](super::plugin::Plugin)) holds it.
///
/// # Example
///
/// ```ignore
/// let registry = CommandRegistry::new(None);
/// let ping = Arc::new(CommandBuilder::chat_input(Ping).build()?);
/// registry.register(Arc::clone(&ping));
///
/// let tree = registry.build_commands();
/// ```
pub struct CommandRegistry {
    entries: DashMap<Unique, Slot>,
    next_seq: AtomicU64,
    default_guild: Option<GuildId>,
}

/// Outcome of one synchronization pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub deleted: Vec<CommandDescriptor>,
    pub created: Vec<CommandDescriptor>,
}

impl CommandRegistry {
    pub fn new(default_guild: Option<GuildId>) -> Self {
        Self {
            entries: DashMap::new(),
            next_seq: AtomicU64::new(0),
            default_guild,
        }
    }

    pub fn default_guild(&self) -> Option<GuildId> {
        self.default_guild
    }

    /// Register a command under its identity key, applying the default guild.
    ///
    /// Last registration for a key wins. The caller keeps ownership.
    pub fn register(&self, command: Arc<RegisteredCommand>) -> Arc<RegisteredCommand> {
        let key = command.unique(self.default_guild);
        let weak = Arc::downgrade(&command);

        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                let slot = occupied.get_mut();
                if slot.command.strong_count() == 0 {
                    // Dead entries lose their place, like a fresh insert
                    slot.seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                }
                slot.command = weak;
                debug!("Replaced command registration '{}'", occupied.key().name);
            }
            Entry::Vacant(vacant) => {
                debug!("Registered command '{}'", vacant.key().name);
                vacant.insert(Slot {
                    seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
                    command: weak,
                });
            }
        }
        command
    }

    /// Remove a registration. Returns whether a live command was removed.
    pub fn unregister(&self, key: &Unique) -> bool {
        self.entries
            .remove(key)
            .map(|(_, slot)| slot.command.strong_count() > 0)
            .unwrap_or(false)
    }

    /// Drop entries whose command has been released; returns how many were removed
    pub fn prune(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, slot| slot.command.strong_count() > 0);
        before - self.entries.len()
    }

    /// Exact-key lookup
    pub fn get(&self, key: &Unique) -> Option<Arc<RegisteredCommand>> {
        self.entries.get(key).and_then(|slot| slot.command.upgrade())
    }

    /// Guild-scoped lookup, falling back to the global variant of the key
    pub fn lookup(&self, key: &Unique) -> Option<Arc<RegisteredCommand>> {
        self.get(key).or_else(|| {
            if key.guild_id.is_some() {
                self.get(&key.global())
            } else {
                None
            }
        })
    }

    /// Number of live registrations
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|slot| slot.command.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live commands in registration order
    fn live_commands(&self) -> Vec<(Unique, Arc<RegisteredCommand>)> {
        let mut live: Vec<(u64, Unique, Arc<RegisteredCommand>)> = self
            .entries
            .iter()
            .filter_map(|slot| {
                slot.command
                    .upgrade()
                    .map(|command| (slot.seq, slot.key().clone(), command))
            })
            .collect();
        live.sort_by_key(|(seq, _, _)| *seq);
        live.into_iter().map(|(_, key, command)| (key, command)).collect()
    }

    /// Reduce registered commands into the top-level descriptors the wire format needs.
    ///
    /// Grouped commands become sub-commands under a synthesized parent;
    /// sub-grouped commands go one level deeper under a synthesized
    /// sub-command group. Output is identical across calls on an unchanged registry.
    pub fn build_commands(&self) -> Vec<CommandDescriptor> {
        let pruned = self.prune();
        if pruned > 0 {
            debug!("Pruned {pruned} released command registrations");
        }

        let mut built: Vec<CommandDescriptor> = Vec::new();
        let mut index: HashMap<Unique, usize> = HashMap::new();

        for (key, command) in self.live_commands() {
            let app = &command.descriptor;

            match (&command.group, &command.sub_group) {
                (Some(group), Some(sub_group)) => {
                    // command
                    //     sub-command group
                    //         sub-command
                    let parent = top_level(&mut built, &mut index, group, app.kind, key.guild_id, app.default_permission);
                    let children = &mut built[parent].options;

                    let position = children.iter().position(|child| {
                        child.name == *sub_group
                            && child.description == GROUP_DESCRIPTION
                            && child.kind == OptionType::SubCommandGroup
                    });
                    let position = match position {
                        Some(position) => position,
                        None => {
                            children.push(CommandOption::new(
                                OptionType::SubCommandGroup,
                                sub_group.clone(),
                                GROUP_DESCRIPTION,
                            ));
                            children.len() - 1
                        }
                    };
                    children[position].options.push(as_sub_command(app));
                }
                (Some(group), None) => {
                    let parent = top_level(&mut built, &mut index, group, app.kind, key.guild_id, app.default_permission);
                    built[parent].options.push(as_sub_command(app));
                }
                (None, sub_group) => {
                    if let Some(sub_group) = sub_group {
                        warn!("Command '{}' has sub-group '{sub_group}' but no group; registering it top-level", app.name);
                    }
                    let mut descriptor = app.clone();
                    descriptor.guild_id = key.guild_id;
                    let top = descriptor.unique();
                    match index.get(&top) {
                        Some(&position) => built[position] = descriptor,
                        None => {
                            index.insert(top, built.len());
                            built.push(descriptor);
                        }
                    }
                }
            }
        }

        built
    }

    /// Fetch the global command set and every guild's set concurrently
    pub async fn get_remote_commands(
        &self,
        transport: &dyn CommandTransport,
        application_id: ApplicationId,
        guilds: &[GuildId],
    ) -> Result<Vec<CommandDescriptor>> {
        let global = transport.fetch_commands(application_id, None);
        let per_guild = try_join_all(
            guilds
                .iter()
                .map(|&guild| transport.fetch_commands(application_id, Some(guild))),
        );

        let (mut commands, per_guild) = tokio::try_join!(global, per_guild)?;
        commands.extend(per_guild.into_iter().flatten());
        Ok(commands)
    }

    /// Reconcile remote commands with the local tree.
    ///
    /// Deletes remote commands with no loosely-matching local command and
    /// posts local commands not already present with identical content.
    /// Deletes and creates are issued concurrently with no ordering between them.
    pub async fn synchronize(
        &self,
        transport: &dyn CommandTransport,
        application_id: ApplicationId,
        guilds: &[GuildId],
    ) -> Result<SyncReport> {
        let remote = self.get_remote_commands(transport, application_id, guilds).await?;
        let local = self.build_commands();
        let (to_delete, to_post) = diff(&local, &remote);

        info!(
            "Synchronizing commands: {} local, {} remote, {} to delete, {} to create",
            local.len(),
            remote.len(),
            to_delete.len(),
            to_post.len()
        );

        let deletes = try_join_all(
            to_delete
                .iter()
                .map(|command| transport.delete_command(application_id, command)),
        );
        let creates = try_join_all(
            to_post
                .iter()
                .map(|command| transport.create_command(application_id, command)),
        );
        tokio::try_join!(deletes, creates)?;

        Ok(SyncReport {
            deleted: to_delete,
            created: to_post,
        })
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Compute `(to_delete, to_post)`.
///
/// Deletion uses loose identity so a changed command leaves no orphan;
/// posting uses full equality so an unchanged command is never re-created.
pub fn diff(
    local: &[CommandDescriptor],
    remote: &[CommandDescriptor],
) -> (Vec<CommandDescriptor>, Vec<CommandDescriptor>) {
    let to_delete = remote
        .iter()
        .filter(|r| !local.iter().any(|l| r.is_same_command(l)))
        .cloned()
        .collect();
    let to_post = local
        .iter()
        .filter(|l| !remote.contains(l))
        .cloned()
        .collect();
    (to_delete, to_post)
}

/// Index of the top-level descriptor for `group`, synthesizing it if needed
fn top_level(
    built: &mut Vec<CommandDescriptor>,
    index: &mut HashMap<Unique, usize>,
    group: &str,
    kind: CommandType,
    guild_id: Option<GuildId>,
    default_permission: bool,
) -> usize {
    let key = Unique::new(group, kind, guild_id, None, None);
    if let Some(&position) = index.get(&key) {
        return position;
    }

    let mut parent = CommandDescriptor::new(kind, group, GROUP_DESCRIPTION);
    parent.guild_id = guild_id;
    parent.default_permission = default_permission;

    index.insert(key, built.len());
    built.push(parent);
    built.len() - 1
}

fn as_sub_command(app: &CommandDescriptor) -> CommandOption {
    CommandOption {
        options: app.options.clone(),
        ..CommandOption::new(OptionType::SubCommand, app.name.clone(), app.description.clone())
    }
}
