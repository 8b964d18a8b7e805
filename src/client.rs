use crate::calendar::CHECKLIST_DAYS;
use crate::errors::LedgerError;
use crate::ledger::CheckLedger;
use crate::models::{
    Check, CheckHabitRequest, ChecklistResponse, CreateHabitRequest, Habit, HabitsAndChecks,
    HeatmapResponse, Identity,
};
use chrono::NaiveDate;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

/// [`CheckLedger`] over the service's JSON API.
#[derive(Debug, Clone)]
pub struct HttpLedger {
    base_url: String,
    http: Client,
}

impl HttpLedger {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn list_habits(&self, identity: &Identity) -> Result<Vec<Habit>, LedgerError> {
        let response = self
            .http
            .get(format!("{}/api/habits", self.base_url))
            .query(&[("user_id", String::from(identity.clone()))])
            .send()
            .await?;
        decode(response).await
    }

    pub async fn checks_for_habit(&self, habit_id: &str) -> Result<Vec<Check>, LedgerError> {
        let response = self
            .http
            .get(format!("{}/api/checks", self.base_url))
            .query(&[("habit_id", habit_id)])
            .send()
            .await?;
        decode(response).await
    }

    pub async fn checklist(
        &self,
        identity: &Identity,
        days: Option<usize>,
    ) -> Result<ChecklistResponse, LedgerError> {
        let days = days.unwrap_or(CHECKLIST_DAYS).to_string();
        let response = self
            .http
            .get(format!("{}/api/checklist", self.base_url))
            .query(&[("user_id", String::from(identity.clone())), ("days", days)])
            .send()
            .await?;
        decode(response).await
    }

    pub async fn heatmap(&self, identity: &Identity) -> Result<HeatmapResponse, LedgerError> {
        let response = self
            .http
            .get(format!("{}/api/heatmap", self.base_url))
            .query(&[("user_id", String::from(identity.clone()))])
            .send()
            .await?;
        decode(response).await
    }
}

impl CheckLedger for HttpLedger {
    async fn list_habits_and_checks(
        &self,
        identity: &Identity,
    ) -> Result<HabitsAndChecks, LedgerError> {
        let response = self
            .http
            .get(format!("{}/api/habits-and-checks", self.base_url))
            .query(&[("user_id", String::from(identity.clone()))])
            .send()
            .await?;
        decode(response).await
    }

    async fn create_habit(
        &self,
        identity: &Identity,
        name: &str,
    ) -> Result<Option<Habit>, LedgerError> {
        let response = self
            .http
            .post(format!("{}/api/habits", self.base_url))
            .json(&CreateHabitRequest {
                user_id: identity.clone(),
                habit_name: name.to_string(),
            })
            .send()
            .await?;
        decode(response).await
    }

    async fn upsert_check(
        &self,
        identity: &Identity,
        habit_id: &str,
        day: NaiveDate,
        done: bool,
    ) -> Result<Option<Check>, LedgerError> {
        let response = self
            .http
            .post(format!("{}/api/checks", self.base_url))
            .json(&CheckHabitRequest {
                user_id: identity.clone(),
                habit_id: habit_id.to_string(),
                date: day.to_string(),
                done,
            })
            .send()
            .await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, LedgerError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(LedgerError::Rejected {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response.json().await?)
}
