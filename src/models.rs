use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Wire value for a caller without a resolved session.
pub const NO_USER: &str = "no_user";

/// Who is asking. Passed explicitly to every ledger operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Identity {
    Anonymous,
    User(String),
}

impl Identity {
    pub fn owner_id(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::User(id) => Some(id.as_str()),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::User(_))
    }
}

impl From<String> for Identity {
    fn from(raw: String) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == NO_USER {
            Self::Anonymous
        } else {
            Self::User(trimmed.to_string())
        }
    }
}

impl From<&str> for Identity {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        match identity {
            Identity::Anonymous => NO_USER.to_string(),
            Identity::User(id) => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub id: String,
    pub name: String,
    pub owner_id: String,
}

/// One completion record. At most one exists per `(habit_id, day)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    pub habit_id: String,
    pub day: NaiveDate,
    pub done: bool,
}

/// Everything the ledger persists.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LedgerData {
    /// Creation order.
    pub habits: Vec<Habit>,
    /// `habit_id -> day -> done`.
    pub checks: BTreeMap<String, BTreeMap<NaiveDate, bool>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HabitsAndChecks {
    pub habits: Vec<Habit>,
    pub checks: Vec<Check>,
}

/// `habit_id -> day -> done`, the shape the checklist renders from.
pub type HabitDayState = BTreeMap<String, BTreeMap<NaiveDate, bool>>;

#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    #[serde(default = "anonymous")]
    pub user_id: Identity,
}

#[derive(Debug, Deserialize)]
pub struct ChecklistQuery {
    #[serde(default = "anonymous")]
    pub user_id: Identity,
    pub days: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct HabitChecksQuery {
    pub habit_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateHabitRequest {
    pub user_id: Identity,
    pub habit_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckHabitRequest {
    pub user_id: Identity,
    pub habit_id: String,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp.
    pub date: String,
    pub done: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChecklistRow {
    pub habit: Habit,
    pub cells: Vec<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChecklistResponse {
    pub days: Vec<NaiveDate>,
    pub rows: Vec<ChecklistRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatCell {
    pub date: NaiveDate,
    pub count: u32,
    pub level: u8,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HeatmapResponse {
    /// Oldest week first, each week oldest day first.
    pub weeks: Vec<Vec<HeatCell>>,
}

fn anonymous() -> Identity {
    Identity::Anonymous
}
