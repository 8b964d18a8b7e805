//! Client-held `(habit, day) -> done` state with optimistic toggles.

use crate::aggregate::per_habit_day_state;
use crate::errors::LedgerError;
use crate::ledger::CheckLedger;
use crate::models::{Check, Habit, HabitDayState, Identity};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub type CellKey = (String, NaiveDate);

/// What to do with a cell whose upsert did not go through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcilePolicy {
    /// Leave the optimistic value in place. The cell may disagree with the
    /// ledger until the next reload.
    #[default]
    KeepOptimistic,
    /// Restore the last value the ledger confirmed for the cell and report it.
    RollbackOnFailure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Settled(bool),
    /// `confirmed` is the last value known to be stored: the seed or the
    /// newest acknowledged upsert.
    Pending {
        value: bool,
        confirmed: bool,
        ticket: u64,
    },
}

impl CellState {
    pub fn value(&self) -> bool {
        match *self {
            Self::Settled(value) | Self::Pending { value, .. } => value,
        }
    }

    fn confirmed(&self) -> bool {
        match *self {
            Self::Settled(value) | Self::Pending { confirmed: value, .. } => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The ledger declined to act (anonymous caller).
    Declined,
    Ledger(LedgerError),
}

/// A rolled-back toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleFailure {
    pub habit_id: String,
    pub day: NaiveDate,
    pub reason: FailureReason,
}

#[derive(Debug)]
struct ToggleOutcome {
    ticket: u64,
    key: CellKey,
    result: Result<Option<Check>, LedgerError>,
}

pub struct HabitDayCache<L> {
    ledger: Arc<L>,
    identity: Identity,
    policy: ReconcilePolicy,
    habits: Vec<Habit>,
    cells: HashMap<CellKey, CellState>,
    loaded: bool,
    next_ticket: u64,
    /// Outcomes with a ticket at or below this predate the last seed.
    seeded_at: u64,
    outcomes_tx: mpsc::UnboundedSender<ToggleOutcome>,
    outcomes_rx: mpsc::UnboundedReceiver<ToggleOutcome>,
}

impl<L> HabitDayCache<L>
where
    L: CheckLedger + Send + Sync + 'static,
{
    pub fn new(ledger: Arc<L>, identity: Identity, policy: ReconcilePolicy) -> Self {
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        Self {
            ledger,
            identity,
            policy,
            habits: Vec::new(),
            cells: HashMap::new(),
            loaded: false,
            next_ticket: 0,
            seeded_at: 0,
            outcomes_tx,
            outcomes_rx,
        }
    }

    /// Replaces every cell. Unconfirmed toggles are dropped and their late
    /// outcomes ignored.
    pub fn seed(&mut self, habits: Vec<Habit>, state: HabitDayState) {
        self.cells = state
            .into_iter()
            .flat_map(|(habit_id, days)| {
                days.into_iter()
                    .map(move |(day, done)| ((habit_id.clone(), day), CellState::Settled(done)))
            })
            .collect();
        self.habits = habits;
        self.loaded = true;
        self.seeded_at = self.next_ticket;
    }

    /// Reads the ledger and reseeds over `window`.
    ///
    /// On failure the cache is left as it was; callers should treat that as
    /// "not yet loaded" rather than empty.
    pub async fn reload(&mut self, window: &[NaiveDate]) -> Result<(), LedgerError> {
        let read = match self.ledger.list_habits_and_checks(&self.identity).await {
            Ok(read) => read,
            Err(err) => {
                warn!("reload failed, keeping current cells: {err}");
                return Err(err);
            }
        };
        let state = per_habit_day_state(&read.habits, &read.checks, window);
        info!(
            habits = read.habits.len(),
            checks = read.checks.len(),
            "reseeded habit cache"
        );
        self.seed(read.habits, state);
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    pub fn policy(&self) -> ReconcilePolicy {
        self.policy
    }

    /// Unknown cells read as not done.
    pub fn get(&self, habit_id: &str, day: NaiveDate) -> bool {
        self.cell(habit_id, day)
            .map(|cell| cell.value())
            .unwrap_or(false)
    }

    pub fn cell(&self, habit_id: &str, day: NaiveDate) -> Option<CellState> {
        self.cells.get(&(habit_id.to_string(), day)).copied()
    }

    pub fn pending(&self) -> usize {
        self.cells
            .values()
            .filter(|cell| matches!(cell, CellState::Pending { .. }))
            .count()
    }

    /// Nested view of the current cells, pending values included.
    pub fn snapshot(&self) -> HabitDayState {
        let mut state = HabitDayState::new();
        for ((habit_id, day), cell) in &self.cells {
            state
                .entry(habit_id.clone())
                .or_default()
                .insert(*day, cell.value());
        }
        state
    }

    /// Shows `done` immediately and sends the upsert in the background.
    ///
    /// Must be called inside a tokio runtime. The returned handle can be
    /// ignored; the outcome is picked up by [`Self::drain_outcomes`] or
    /// [`Self::settle_next`].
    pub fn toggle(&mut self, habit_id: &str, day: NaiveDate, done: bool) -> JoinHandle<()> {
        let key: CellKey = (habit_id.to_string(), day);
        let confirmed = self
            .cells
            .get(&key)
            .map(CellState::confirmed)
            .unwrap_or(false);
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.cells.insert(
            key.clone(),
            CellState::Pending {
                value: done,
                confirmed,
                ticket,
            },
        );
        debug!(habit_id, %day, done, ticket, "optimistic toggle");

        let ledger = Arc::clone(&self.ledger);
        let identity = self.identity.clone();
        let outcomes = self.outcomes_tx.clone();
        tokio::spawn(async move {
            let result = ledger.upsert_check(&identity, &key.0, key.1, done).await;
            // a closed channel means the cache is gone
            let _ = outcomes.send(ToggleOutcome {
                ticket,
                key,
                result,
            });
        })
    }

    /// Applies every outcome that has already arrived.
    pub fn drain_outcomes(&mut self) -> Vec<ToggleFailure> {
        let mut failures = Vec::new();
        while let Ok(outcome) = self.outcomes_rx.try_recv() {
            failures.extend(self.apply(outcome));
        }
        failures
    }

    /// Waits for the next upsert to resolve and applies it. Never resolves if
    /// nothing is in flight.
    pub async fn settle_next(&mut self) -> Option<ToggleFailure> {
        let outcome = self.outcomes_rx.recv().await?;
        self.apply(outcome)
    }

    fn apply(&mut self, outcome: ToggleOutcome) -> Option<ToggleFailure> {
        let ToggleOutcome {
            ticket,
            key,
            result,
        } = outcome;
        if ticket <= self.seeded_at {
            debug!(ticket, "outcome predates the last reload, ignoring");
            return None;
        }
        let cell = self.cells.get_mut(&key)?;
        let CellState::Pending {
            value,
            confirmed,
            ticket: current,
        } = *cell
        else {
            debug!(ticket, "outcome for a settled cell, ignoring");
            return None;
        };
        if current != ticket {
            // an older upsert that landed still moves the rollback target
            if let Ok(Some(check)) = &result {
                *cell = CellState::Pending {
                    value,
                    confirmed: check.done,
                    ticket: current,
                };
            }
            debug!(ticket, current, "outcome superseded by a later toggle");
            return None;
        }

        let reason = match result {
            Ok(Some(_)) => {
                self.cells.insert(key, CellState::Settled(value));
                return None;
            }
            Ok(None) => FailureReason::Declined,
            Err(err) => FailureReason::Ledger(err),
        };

        match self.policy {
            ReconcilePolicy::KeepOptimistic => {
                warn!(habit_id = %key.0, day = %key.1, ?reason, "upsert failed, keeping optimistic value");
                self.cells.insert(key, CellState::Settled(value));
                None
            }
            ReconcilePolicy::RollbackOnFailure => {
                warn!(habit_id = %key.0, day = %key.1, ?reason, "upsert failed, rolling back");
                self.cells.insert(key.clone(), CellState::Settled(confirmed));
                let (habit_id, day) = key;
                Some(ToggleFailure {
                    habit_id,
                    day,
                    reason,
                })
            }
        }
    }
}
