use anyhow::{Context, Result};
use serde::Deserialize;
use std::{collections::VecDeque, fs, path::Path};
use stonequarry_core::SimTick;

#[derive(Debug, Deserialize)]
struct InteractionScriptFile {
    steps: Vec<InteractionStepDef>,
}

#[derive(Debug, Clone, Deserialize)]
struct InteractionStepDef {
    tick: u64,
    command: String,
}

#[derive(Debug, Clone)]
struct InteractionStep {
    tick: SimTick,
    command: String,
}

/// Deterministic interaction script.
///
/// A script is a list of `{tick, command}` steps sorted by tick; steps sharing
/// a tick run in file order.
#[derive(Debug)]
pub struct InteractionScript {
    pending: VecDeque<InteractionStep>,
    last_tick: SimTick,
}

impl InteractionScript {
    /// Load a script from a JSON file on disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        Self::from_str(&contents).with_context(|| format!("invalid script {}", path.display()))
    }

    /// Load a script from an in-memory JSON string.
    pub fn from_str(contents: &str) -> Result<Self> {
        let file: InteractionScriptFile = serde_json::from_str(contents)?;
        if file.steps.is_empty() {
            anyhow::bail!("interaction script contains no steps");
        }

        let mut pending = VecDeque::with_capacity(file.steps.len());
        let mut last_tick = SimTick::ZERO;
        for (index, step) in file.steps.into_iter().enumerate() {
            let command = step.command.trim().to_string();
            if command.is_empty() {
                anyhow::bail!("step {index} has an empty command");
            }
            let tick = SimTick(step.tick);
            if index > 0 && tick < last_tick {
                anyhow::bail!("interaction script steps must be sorted by tick");
            }
            last_tick = tick;
            pending.push_back(InteractionStep { tick, command });
        }

        Ok(Self { pending, last_tick })
    }

    /// Tick of the final step.
    pub fn last_tick(&self) -> SimTick {
        self.last_tick
    }

    /// Drain and return all commands scheduled for ticks `<= tick`.
    pub fn drain_ready_commands(&mut self, tick: SimTick) -> Vec<String> {
        let mut commands = Vec::new();
        while self.pending.front().is_some_and(|step| step.tick <= tick) {
            if let Some(step) = self.pending.pop_front() {
                commands.push(step.command);
            }
        }
        commands
    }

    pub fn is_finished(&self) -> bool {
        self.pending.is_empty()
    }
}
