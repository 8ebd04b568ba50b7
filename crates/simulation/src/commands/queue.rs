use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::{CommandResult, GameCommand};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedCommand {
    pub tick: u64,
    pub command: GameCommand,
}

/// FIFO intake for player intent. The UI pushes; the executor drains once
/// per fixed tick, so every mutation happens inside the simulation step.
#[derive(Resource, Debug, Clone, Default)]
pub struct CommandQueue {
    pending: Vec<QueuedCommand>,
}

impl CommandQueue {
    pub fn push(&mut self, tick: u64, command: GameCommand) {
        self.pending.push(QueuedCommand { tick, command });
    }

    pub fn drain(&mut self) -> Vec<QueuedCommand> {
        self.pending.drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

/// Bounded record of executed commands and their outcomes, newest last.
#[derive(Resource, Debug, Clone, Default)]
pub struct CommandLog {
    entries: Vec<(GameCommand, CommandResult)>,
}

impl CommandLog {
    const CAPACITY: usize = 256;

    pub fn push(&mut self, command: GameCommand, result: CommandResult) {
        if !result.is_success() {
            debug!("command rejected: {:?} -> {:?}", command, result);
        }
        self.entries.push((command, result));
        if self.entries.len() > Self::CAPACITY {
            let excess = self.entries.len() - Self::CAPACITY;
            self.entries.drain(0..excess);
        }
    }

    pub fn last(&self) -> Option<&(GameCommand, CommandResult)> {
        self.entries.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(GameCommand, CommandResult)> {
        self.entries.iter()
    }
}
