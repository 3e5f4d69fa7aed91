//! Command registry
//!
//! Built once at startup. Registering two commands with the same id is an
//! error rather than a silent overwrite.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::{Command, ConnectToPeerCommand, ErasedCommand};
use crate::errors::RegistryError;
use crate::types::CommandId;

/// Mapping from numeric command id to command
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<CommandId, Arc<dyn ErasedCommand>>,
}

impl CommandRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in client command
    pub fn standard() -> Result<Self, RegistryError> {
        Self::new().with(ConnectToPeerCommand)
    }

    /// Add a command, rejecting duplicate ids
    pub fn register<C: Command>(&mut self, command: C) -> Result<(), RegistryError> {
        let id = command.id();
        if let Some(existing) = self.commands.get(&id) {
            return Err(RegistryError::DuplicateCommandId {
                id,
                existing: existing.command_name(),
                rejected: command.name(),
            });
        }

        debug!(command = command.name(), %id, "Registered command");
        self.commands.insert(id, Arc::new(command));
        Ok(())
    }

    /// Builder form of [`CommandRegistry::register`]
    pub fn with<C: Command>(mut self, command: C) -> Result<Self, RegistryError> {
        self.register(command)?;
        Ok(self)
    }

    pub fn contains(&self, id: CommandId) -> bool {
        self.commands.contains_key(&id)
    }

    /// Name of the command registered under `id`
    pub fn name_of(&self, id: CommandId) -> Option<&'static str> {
        self.commands.get(&id).map(|command| command.command_name())
    }

    /// Registered ids in ascending order
    pub fn ids(&self) -> Vec<CommandId> {
        let mut ids: Vec<_> = self.commands.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub(crate) fn get(&self, id: CommandId) -> Option<Arc<dyn ErasedCommand>> {
        self.commands.get(&id).cloned()
    }
}

impl core::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.ids()).finish()
    }
}
