//! Input command queue for externally-submitted game actions.
//!
//! Commands are queued by the game client (UI, scripting, automation) and
//! applied at the start of the next tick so frame timing never changes the
//! outcome. Each command is one atomic player action; rejected actions are
//! dropped silently, exactly as if the player had clicked a disabled
//! button.

use crate::id::{DustUpgradeId, GeneratorId, PlanetId, ResearchId};
use crate::state::BuyQuantity;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Command enum
// ---------------------------------------------------------------------------

/// A single player action submitted to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Manually start a cycle on a generator.
    RunGenerator { generator: GeneratorId },
    /// Buy generator units at the current buy quantity.
    BuyGenerator { generator: GeneratorId },
    /// Hire the manager for a generator.
    BuyManager { generator: GeneratorId },
    /// Unlock a planet.
    UnlockPlanet { planet: PlanetId },
    /// Purchase a research node.
    PurchaseResearch { node: ResearchId },
    /// Buy one level of a dust upgrade.
    PurchaseDustUpgrade { upgrade: DustUpgradeId },
    /// Change the buy quantity used by `BuyGenerator`.
    SetBuyQuantity { quantity: BuyQuantity },
    /// Accept the pending timed event.
    ActivateEvent,
    /// Decline the pending timed event.
    DismissEvent,
    /// Perform a stellar reset.
    StellarReset,
}

// ---------------------------------------------------------------------------
// CommandQueue
// ---------------------------------------------------------------------------

/// Commands waiting to be applied at the next tick boundary.
///
/// Supports optional history tracking for replay and debugging.
pub struct CommandQueue {
    pending: Vec<Command>,
    /// History of applied commands: (timestamp ms, command).
    history: Vec<(u64, Command)>,
    /// Maximum history entries to retain. 0 = no history.
    max_history: usize,
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandQueue {
    /// Create a new empty command queue with no history tracking.
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            history: Vec::new(),
            max_history: 0,
        }
    }

    /// Create a new command queue that retains up to `max_history` entries.
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            pending: Vec::new(),
            history: Vec::new(),
            max_history,
        }
    }

    /// Push a single command onto the queue.
    pub fn push(&mut self, command: Command) {
        self.pending.push(command);
    }

    /// Push multiple commands onto the queue at once.
    pub fn push_batch(&mut self, commands: impl IntoIterator<Item = Command>) {
        self.pending.extend(commands);
    }

    /// Drain all pending commands, moving them to history stamped with
    /// `now_ms`. Returns the drained commands in submission order.
    pub fn drain(&mut self, now_ms: u64) -> Vec<Command> {
        let commands: Vec<Command> = self.pending.drain(..).collect();

        if self.max_history > 0 {
            for cmd in &commands {
                self.history.push((now_ms, cmd.clone()));
            }
            let excess = self.history.len().saturating_sub(self.max_history);
            if excess > 0 {
                self.history.drain(..excess);
            }
        }

        commands
    }

    /// Number of commands waiting to be applied.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Whether the queue has no pending commands.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Get the command history (timestamp, command) pairs.
    pub fn history(&self) -> &[(u64, Command)] {
        &self.history
    }

    /// Clear all history entries.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Drop pending commands without applying them.
    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }
}

// ===========================================================================
// Tests
// ===========================================================================
