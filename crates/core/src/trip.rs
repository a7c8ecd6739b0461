//! Trip planner state: checklist completion, custom checklist items,
//! logged expenses and the theme choice.
//!
//! Everything lives in the preference store under the app's historical
//! keys, so a store written by the web app reads back unchanged.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::SecondsFormat;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::Error;
use crate::prefs::{CHECKED_KEY, CUSTOM_CHECKLIST_KEY, EXPENSES_KEY, PrefsStore, THEME_KEY};

/// One logged expense. Field names match the stored JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Expense {
    /// Budget category id, e.g. "food".
    #[serde(rename = "c")]
    pub category: String,
    #[serde(rename = "a")]
    pub amount: f64,
    /// When it was logged (ISO 8601, UTC).
    #[serde(rename = "d")]
    pub logged_at: String,
}

/// A checklist item added by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CustomItem {
    pub id: String,
    #[serde(rename = "tx")]
    pub text: String,
}

/// An amount as typed by the user: a number, or text holding one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Amount {
    Number(f64),
    Text(String),
}

impl Amount {
    /// The amount if it is a finite number above zero.
    ///
    /// Blank text counts as zero and is rejected with it.
    pub fn positive(&self) -> Option<f64> {
        let value = match self {
            Amount::Number(n) => *n,
            Amount::Text(text) => {
                let text = text.trim();
                if text.is_empty() { 0.0 } else { text.parse().ok()? }
            }
        };
        (value.is_finite() && value > 0.0).then_some(value)
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Amount::Number(value)
    }
}

impl From<&str> for Amount {
    fn from(value: &str) -> Self {
        Amount::Text(value.to_string())
    }
}

/// Colour scheme preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Follow the system setting.
    #[default]
    Auto,
    Light,
    Dark,
}

/// Typed operations over the trip's stored state.
///
/// Mutations are read-modify-write on a whole stored value, so they are
/// serialized through one lock shared by all clones.
#[derive(Clone, Debug)]
pub struct TripState {
    prefs: PrefsStore,
    lock: Arc<Mutex<()>>,
}

impl TripState {
    pub fn new(prefs: PrefsStore) -> Self {
        Self { prefs, lock: Arc::new(Mutex::new(())) }
    }

    /// Checklist completion by item id.
    pub async fn checked(&self) -> BTreeMap<String, bool> {
        self.prefs.get(CHECKED_KEY, BTreeMap::new()).await
    }

    /// Number of checked items whose id starts with `prefix`.
    pub async fn checked_count(&self, prefix: &str) -> usize {
        self.checked()
            .await
            .iter()
            .filter(|(id, done)| id.starts_with(prefix) && **done)
            .count()
    }

    /// Flip an item's completion and return the new value.
    pub async fn toggle(&self, id: &str) -> Result<bool, Error> {
        let id = required(id, "checklist item id")?;
        let _guard = self.lock.lock().await;

        let mut checked = self.checked().await;
        let done = !checked.get(id).copied().unwrap_or(false);
        checked.insert(id.to_string(), done);
        self.prefs.set(CHECKED_KEY, &checked).await?;

        tracing::debug!(id, done, "toggled checklist item");
        Ok(done)
    }

    pub async fn custom_items(&self) -> Vec<CustomItem> {
        self.prefs.get(CUSTOM_CHECKLIST_KEY, Vec::new()).await
    }

    /// Add a user checklist item with a fresh `cu<millis>` id.
    pub async fn add_custom_item(&self, text: &str) -> Result<CustomItem, Error> {
        let text = required(text, "checklist item text")?;
        let _guard = self.lock.lock().await;

        let mut items = self.custom_items().await;
        let mut stamp = chrono::Utc::now().timestamp_millis();
        while items.iter().any(|item| item.id == format!("cu{stamp}")) {
            stamp += 1;
        }

        let item = CustomItem { id: format!("cu{stamp}"), text: text.to_string() };
        items.push(item.clone());
        self.prefs.set(CUSTOM_CHECKLIST_KEY, &items).await?;
        Ok(item)
    }

    /// Remove a user item along with its completion mark.
    ///
    /// Returns false if no item had that id.
    pub async fn delete_custom_item(&self, id: &str) -> Result<bool, Error> {
        let _guard = self.lock.lock().await;

        let mut items = self.custom_items().await;
        let before = items.len();
        items.retain(|item| item.id != id);

        let mut checked = self.checked().await;
        checked.remove(id);

        self.prefs.set(CUSTOM_CHECKLIST_KEY, &items).await?;
        self.prefs.set(CHECKED_KEY, &checked).await?;
        Ok(items.len() < before)
    }

    pub async fn expenses(&self) -> Vec<Expense> {
        self.prefs.get(EXPENSES_KEY, Vec::new()).await
    }

    /// Total logged for one category.
    pub async fn spent(&self, category: &str) -> f64 {
        self.expenses()
            .await
            .iter()
            .filter(|e| e.category == category)
            .map(|e| e.amount)
            .sum()
    }

    /// Log an expense and return it with its index.
    ///
    /// # Errors
    ///
    /// `Error::InvalidInput` for a blank category or an amount that isn't a
    /// positive number; nothing is stored in that case.
    pub async fn add_expense(&self, category: &str, amount: &Amount) -> Result<(usize, Expense), Error> {
        let (category, amount) = validate_expense(category, amount)?;
        let _guard = self.lock.lock().await;

        let expense = Expense {
            category: category.to_string(),
            amount,
            logged_at: chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        let mut expenses = self.expenses().await;
        expenses.push(expense.clone());
        self.prefs.set(EXPENSES_KEY, &expenses).await?;
        Ok((expenses.len() - 1, expense))
    }

    /// Change the category and amount of a logged expense, keeping its timestamp.
    pub async fn edit_expense(&self, index: usize, category: &str, amount: &Amount) -> Result<Expense, Error> {
        let (category, amount) = validate_expense(category, amount)?;
        let _guard = self.lock.lock().await;

        let mut expenses = self.expenses().await;
        let expense = expenses
            .get_mut(index)
            .ok_or_else(|| Error::InvalidInput(format!("no expense at index {index}")))?;
        expense.category = category.to_string();
        expense.amount = amount;
        let edited = expense.clone();

        self.prefs.set(EXPENSES_KEY, &expenses).await?;
        Ok(edited)
    }

    /// Remove a logged expense and return it.
    pub async fn delete_expense(&self, index: usize) -> Result<Expense, Error> {
        let _guard = self.lock.lock().await;

        let mut expenses = self.expenses().await;
        if index >= expenses.len() {
            return Err(Error::InvalidInput(format!("no expense at index {index}")));
        }
        let removed = expenses.remove(index);
        self.prefs.set(EXPENSES_KEY, &expenses).await?;
        Ok(removed)
    }

    /// Stored theme; `auto` when unset or unrecognized.
    pub async fn theme(&self) -> Theme {
        self.prefs.get(THEME_KEY, Theme::default()).await
    }

    pub async fn set_theme(&self, theme: Theme) -> Result<(), Error> {
        self.prefs.set(THEME_KEY, &theme).await
    }
}

fn required<'a>(value: &'a str, what: &str) -> Result<&'a str, Error> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::InvalidInput(format!("{what} cannot be empty")));
    }
    Ok(value)
}

fn validate_expense<'a>(category: &'a str, amount: &Amount) -> Result<(&'a str, f64), Error> {
    let category = required(category, "expense category")?;
    let amount = amount
        .positive()
        .ok_or_else(|| Error::InvalidInput("expense amount must be a positive number".into()))?;
    Ok((category, amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CacheDb;

    async fn state() -> TripState {
        TripState::new(PrefsStore::new(CacheDb::open_in_memory().await.unwrap(), "bj_"))
    }

    #[tokio::test]
    async fn test_toggle_flips_and_persists() {
        let trip = state().await;
        assert!(trip.toggle("p1").await.unwrap());
        assert!(!trip.toggle("p1").await.unwrap());
        assert!(trip.toggle("k5").await.unwrap());

        let stored = trip.prefs.get_raw(CHECKED_KEY).await.unwrap().unwrap();
        let stored: BTreeMap<String, bool> = serde_json::from_str(&stored).unwrap();
        assert_eq!(stored.get("k5"), Some(&true));
        assert_eq!(stored.get("p1"), Some(&false));
    }

    #[tokio::test]
    async fn test_multiple_toggles() {
        let trip = state().await;
        trip.toggle("p1").await.unwrap();
        trip.toggle("p2").await.unwrap();
        trip.toggle("p1").await.unwrap();

        let checked = trip.checked().await;
        assert_eq!(checked.get("p1"), Some(&false));
        assert_eq!(checked.get("p2"), Some(&true));
        assert_eq!(trip.checked_count("p").await, 1);
    }

    #[tokio::test]
    async fn test_toggle_rejects_blank_id() {
        let trip = state().await;
        assert!(matches!(trip.toggle("  ").await, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_add_expense() {
        let trip = state().await;
        let (index, expense) = trip.add_expense("food", &120.0.into()).await.unwrap();
        assert_eq!(index, 0);
        assert_eq!(expense.category, "food");
        assert_eq!(expense.amount, 120.0);
        assert!(expense.logged_at.ends_with('Z'));

        let stored = trip.prefs.get_raw(EXPENSES_KEY).await.unwrap().unwrap();
        let stored: serde_json::Value = serde_json::from_str(&stored).unwrap();
        assert_eq!(stored[0]["c"], "food");
        assert_eq!(stored[0]["a"], 120.0);
    }

    #[tokio::test]
    async fn test_add_expense_rejects_invalid_input() {
        let trip = state().await;
        assert!(trip.add_expense("", &100.0.into()).await.is_err());
        assert!(trip.add_expense("food", &0.0.into()).await.is_err());
        assert!(trip.add_expense("food", &(-10.0).into()).await.is_err());
        assert!(trip.add_expense("food", &"abc".into()).await.is_err());
        assert!(trip.add_expense("food", &"".into()).await.is_err());
        assert!(trip.expenses().await.is_empty());
    }

    #[tokio::test]
    async fn test_add_expense_converts_text_amount() {
        let trip = state().await;
        let (_, expense) = trip.add_expense("food", &"200".into()).await.unwrap();
        assert_eq!(expense.amount, 200.0);
    }

    #[tokio::test]
    async fn test_delete_expense() {
        let trip = state().await;
        trip.add_expense("food", &100.0.into()).await.unwrap();
        trip.add_expense("transport", &50.0.into()).await.unwrap();

        let removed = trip.delete_expense(0).await.unwrap();
        assert_eq!(removed.category, "food");

        let left = trip.expenses().await;
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].category, "transport");
        assert!(trip.delete_expense(5).await.is_err());
    }

    #[tokio::test]
    async fn test_edit_expense_keeps_timestamp() {
        let trip = state().await;
        let (_, original) = trip.add_expense("food", &100.0.into()).await.unwrap();

        let edited = trip.edit_expense(0, "ticket", &"60".into()).await.unwrap();
        assert_eq!(edited.category, "ticket");
        assert_eq!(edited.amount, 60.0);
        assert_eq!(edited.logged_at, original.logged_at);

        assert!(trip.edit_expense(0, "ticket", &0.0.into()).await.is_err());
        assert!(trip.edit_expense(3, "ticket", &5.0.into()).await.is_err());
        assert_eq!(trip.expenses().await[0].amount, 60.0);
    }

    #[tokio::test]
    async fn test_spent_sums_by_category() {
        let trip = state().await;
        trip.add_expense("food", &100.0.into()).await.unwrap();
        trip.add_expense("food", &250.0.into()).await.unwrap();
        trip.add_expense("transport", &80.0.into()).await.unwrap();

        assert_eq!(trip.spent("food").await, 350.0);
        assert_eq!(trip.spent("transport").await, 80.0);
        assert_eq!(trip.spent("shopping").await, 0.0);
    }

    #[tokio::test]
    async fn test_custom_items_add_and_delete() {
        let trip = state().await;
        let first = trip.add_custom_item("  power bank ").await.unwrap();
        let second = trip.add_custom_item("umbrella").await.unwrap();
        assert_eq!(first.text, "power bank");
        assert!(first.id.starts_with("cu"));
        assert_ne!(first.id, second.id);

        trip.toggle(&first.id).await.unwrap();
        assert!(trip.delete_custom_item(&first.id).await.unwrap());

        let items = trip.custom_items().await;
        assert_eq!(items, vec![second]);
        assert!(!trip.checked().await.contains_key(&first.id));
        assert!(!trip.delete_custom_item(&first.id).await.unwrap());
        assert!(trip.add_custom_item(" ").await.is_err());
    }

    #[tokio::test]
    async fn test_theme_defaults_to_auto() {
        let trip = state().await;
        assert_eq!(trip.theme().await, Theme::Auto);

        trip.set_theme(Theme::Dark).await.unwrap();
        assert_eq!(trip.theme().await, Theme::Dark);

        trip.prefs.set(THEME_KEY, &"sepia").await.unwrap();
        assert_eq!(trip.theme().await, Theme::Auto);
    }

    #[test]
    fn test_amount_parsing() {
        assert_eq!(Amount::from(" 12.5 ").positive(), Some(12.5));
        assert_eq!(Amount::from("NaN").positive(), None);
        assert_eq!(Amount::from("inf").positive(), None);
        assert_eq!(Amount::Number(-1.0).positive(), None);

        let parsed: Amount = serde_json::from_str("\"30\"").unwrap();
        assert_eq!(parsed, Amount::Text("30".into()));
        let parsed: Amount = serde_json::from_str("30").unwrap();
        assert_eq!(parsed, Amount::Number(30.0));
    }
}
