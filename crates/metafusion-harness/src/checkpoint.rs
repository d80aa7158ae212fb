//! Readiness signals between scenario phases.

use std::collections::BTreeSet;
use std::fmt;
use std::io::{self, BufRead, Write};

use serde::Serialize;
use tracing::info;

use crate::error::HarnessResult;
use crate::inventory::InventoryTotals;

/// Phases of a scenario run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Phase {
    Forge,
    PacketTransfer,
    PacketOpening,
    PromptTransfer,
    ImageCreation,
    ImageTransfer,
    ImageBurn,
}

impl Phase {
    pub const ALL: [Phase; 7] = [
        Phase::Forge,
        Phase::PacketTransfer,
        Phase::PacketOpening,
        Phase::PromptTransfer,
        Phase::ImageCreation,
        Phase::ImageTransfer,
        Phase::ImageBurn,
    ];
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Forge => "forge",
            Phase::PacketTransfer => "packet transfer",
            Phase::PacketOpening => "packet opening",
            Phase::PromptTransfer => "prompt transfer",
            Phase::ImageCreation => "image creation",
            Phase::ImageTransfer => "image transfer",
            Phase::ImageBurn => "image burn",
        })
    }
}

/// Called by the driver once a phase is complete and reconciled.
pub trait Checkpoint {
    fn reached(&mut self, phase: Phase, totals: &InventoryTotals) -> HarnessResult<()>;
}

/// Logs each completed phase and continues immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogCheckpoint;

impl Checkpoint for LogCheckpoint {
    fn reached(&mut self, phase: Phase, totals: &InventoryTotals) -> HarnessResult<()> {
        info!(%phase, %totals, "phase complete");
        Ok(())
    }
}

/// Waits for a line on `input` after selected phases.
pub struct ConsoleCheckpoint<R> {
    input: R,
    pause_after: BTreeSet<Phase>,
}

impl ConsoleCheckpoint<io::StdinLock<'static>> {
    /// Pauses on stdin after image creation, where generated images are
    /// usually inspected.
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock(), [Phase::ImageCreation])
    }
}

impl<R: BufRead> ConsoleCheckpoint<R> {
    pub fn new(input: R, pause_after: impl IntoIterator<Item = Phase>) -> Self {
        Self {
            input,
            pause_after: pause_after.into_iter().collect(),
        }
    }
}

impl<R: BufRead> Checkpoint for ConsoleCheckpoint<R> {
    fn reached(&mut self, phase: Phase, totals: &InventoryTotals) -> HarnessResult<()> {
        LogCheckpoint.reached(phase, totals)?;
        if !self.pause_after.contains(&phase) {
            return Ok(());
        }

        let mut stdout = io::stdout();
        write!(stdout, "Press [ENTER] to continue...")?;
        stdout.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(())
    }
}

/// Remembers every phase it sees.
#[derive(Debug, Clone, Default)]
pub struct RecordingCheckpoint {
    pub phases: Vec<(Phase, InventoryTotals)>,
}

impl Checkpoint for RecordingCheckpoint {
    fn reached(&mut self, phase: Phase, totals: &InventoryTotals) -> HarnessResult<()> {
        self.phases.push((phase, *totals));
        Ok(())
    }
}
