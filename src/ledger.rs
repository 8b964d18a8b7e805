//! The authoritative store of habits and checks.

use crate::errors::LedgerError;
use crate::models::{Check, Habit, HabitsAndChecks, Identity, LedgerData};
use crate::state::AppState;
use crate::storage::persist_data;
use chrono::NaiveDate;
use std::future::Future;
use tracing::{debug, info};
use uuid::Uuid;

/// Cap on habits per owner and on checks per habit in every read.
pub const LIST_LIMIT: usize = 200;

impl LedgerData {
    pub fn list_habits(&self, identity: &Identity) -> Vec<Habit> {
        let Some(owner) = identity.owner_id() else {
            return Vec::new();
        };
        self.habits
            .iter()
            .filter(|habit| habit.owner_id == owner)
            .take(LIST_LIMIT)
            .cloned()
            .collect()
    }

    /// Declines (returns `None`) for a blank name or an anonymous caller.
    pub fn create_habit(&mut self, identity: &Identity, name: &str) -> Option<Habit> {
        let owner = identity.owner_id()?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let habit = Habit {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            owner_id: owner.to_string(),
        };
        self.habits.push(habit.clone());
        Some(habit)
    }

    /// Insert or overwrite the record for `(habit_id, day)`.
    ///
    /// Declines for an anonymous caller. The habit must exist and belong to
    /// the caller.
    pub fn upsert_check(
        &mut self,
        identity: &Identity,
        habit_id: &str,
        day: NaiveDate,
        done: bool,
    ) -> Result<Option<Check>, LedgerError> {
        let Some(owner) = identity.owner_id() else {
            return Ok(None);
        };
        let owned = self
            .habits
            .iter()
            .any(|habit| habit.id == habit_id && habit.owner_id == owner);
        if !owned {
            return Err(LedgerError::HabitNotFound(habit_id.to_string()));
        }
        self.checks
            .entry(habit_id.to_string())
            .or_default()
            .insert(day, done);
        Ok(Some(Check {
            habit_id: habit_id.to_string(),
            day,
            done,
        }))
    }

    /// Every stored record for one habit, `done: false` included, newest
    /// [`LIST_LIMIT`] days in ascending order.
    pub fn checks_for_habit(&self, habit_id: &str) -> Vec<Check> {
        self.recent_checks(habit_id, |_| true)
    }

    /// Habits of the caller joined with their `done == true` checks.
    ///
    /// An explicit un-check is stored as `done: false` and so is missing here,
    /// the same as a day that was never touched.
    pub fn habits_and_checks(&self, identity: &Identity) -> HabitsAndChecks {
        let habits = self.list_habits(identity);
        let checks = habits
            .iter()
            .flat_map(|habit| self.recent_checks(&habit.id, |done| done))
            .collect();
        HabitsAndChecks { habits, checks }
    }

    fn recent_checks(&self, habit_id: &str, keep: impl Fn(bool) -> bool) -> Vec<Check> {
        let Some(days) = self.checks.get(habit_id) else {
            return Vec::new();
        };
        let mut checks: Vec<Check> = days
            .iter()
            .rev()
            .filter(|&(_, &done)| keep(done))
            .take(LIST_LIMIT)
            .map(|(&day, &done)| Check {
                habit_id: habit_id.to_string(),
                day,
                done,
            })
            .collect();
        checks.reverse();
        checks
    }
}

/// Asynchronous ledger contract. Validation declines surface as empty
/// collections or `Ok(None)`, never as errors.
pub trait CheckLedger {
    fn list_habits_and_checks(
        &self,
        identity: &Identity,
    ) -> impl Future<Output = Result<HabitsAndChecks, LedgerError>> + Send;

    fn create_habit(
        &self,
        identity: &Identity,
        name: &str,
    ) -> impl Future<Output = Result<Option<Habit>, LedgerError>> + Send;

    fn upsert_check(
        &self,
        identity: &Identity,
        habit_id: &str,
        day: NaiveDate,
        done: bool,
    ) -> impl Future<Output = Result<Option<Check>, LedgerError>> + Send;
}

impl CheckLedger for AppState {
    async fn list_habits_and_checks(
        &self,
        identity: &Identity,
    ) -> Result<HabitsAndChecks, LedgerError> {
        let data = self.data.lock().await;
        Ok(data.habits_and_checks(identity))
    }

    async fn create_habit(
        &self,
        identity: &Identity,
        name: &str,
    ) -> Result<Option<Habit>, LedgerError> {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        let Some(habit) = next.create_habit(identity, name) else {
            debug!("declined habit creation");
            return Ok(None);
        };
        persist_data(&self.data_path, &next).await?;
        *data = next;
        info!(habit_id = %habit.id, owner = %habit.owner_id, "created habit");
        Ok(Some(habit))
    }

    async fn upsert_check(
        &self,
        identity: &Identity,
        habit_id: &str,
        day: NaiveDate,
        done: bool,
    ) -> Result<Option<Check>, LedgerError> {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        let Some(check) = next.upsert_check(identity, habit_id, day, done)? else {
            debug!(habit_id, "declined anonymous check");
            return Ok(None);
        };
        persist_data(&self.data_path, &next).await?;
        *data = next;
        debug!(habit_id, %day, done, "stored check");
        Ok(Some(check))
    }
}
