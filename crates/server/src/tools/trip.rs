//! Checklist, expense and theme tools over the trip's stored state.

use std::collections::BTreeMap;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tripshell_core::{Amount, CustomItem, Expense, Theme, TripState};

use super::json_result;

/// Parameters for the checklist_get tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ChecklistGetParams {
    /// Count only checked items whose id starts with this (e.g. "p" for packing).
    #[serde(default)]
    pub prefix: Option<String>,
}

/// Output from the checklist_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ChecklistOutput {
    pub checked: BTreeMap<String, bool>,
    /// Checked items matching the prefix.
    pub completed: usize,
    pub custom_items: Vec<CustomItem>,
}

/// Parameters for the checklist_toggle and checklist_delete_item tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ChecklistItemParams {
    /// Item id, e.g. "p1" or a custom "cu..." id.
    pub id: String,
}

/// Output from the checklist_toggle tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ToggleOutput {
    pub id: String,
    pub checked: bool,
}

/// Parameters for the checklist_add_item tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ChecklistAddParams {
    pub text: String,
}

/// Output from the checklist_delete_item tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DeleteItemOutput {
    pub id: String,
    /// False if no custom item had that id.
    pub deleted: bool,
}

/// Parameters for the expense_list tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ExpenseListParams {
    /// Only report this category's total.
    #[serde(default)]
    pub category: Option<String>,
}

/// Output from the expense_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExpenseListOutput {
    /// Every logged expense; positions are the indexes edit and delete take.
    pub expenses: Vec<Expense>,
    /// Amount spent per category.
    pub spent: BTreeMap<String, f64>,
}

/// Parameters for the expense_add tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExpenseAddParams {
    pub category: String,
    /// A positive number, or text holding one.
    pub amount: Amount,
}

/// Parameters for the expense_edit tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExpenseEditParams {
    pub index: usize,
    pub category: String,
    pub amount: Amount,
}

/// Parameters for the expense_delete tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExpenseDeleteParams {
    pub index: usize,
}

/// Output from the expense_add, expense_edit and expense_delete tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExpenseOutput {
    pub index: usize,
    pub expense: Expense,
    /// Category total after the change.
    pub spent: f64,
}

/// Parameters and output of the theme tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ThemeParams {
    pub theme: Theme,
}

pub async fn checklist_get_impl(trip: &TripState, params: ChecklistGetParams) -> Result<CallToolResult, McpError> {
    let prefix = params.prefix.unwrap_or_default();
    let output = ChecklistOutput {
        checked: trip.checked().await,
        completed: trip.checked_count(&prefix).await,
        custom_items: trip.custom_items().await,
    };
    json_result(&output)
}

pub async fn checklist_toggle_impl(trip: &TripState, params: ChecklistItemParams) -> Result<CallToolResult, McpError> {
    let checked = trip.toggle(&params.id).await?;
    json_result(&ToggleOutput { id: params.id.trim().to_string(), checked })
}

pub async fn checklist_add_impl(trip: &TripState, params: ChecklistAddParams) -> Result<CallToolResult, McpError> {
    let item = trip.add_custom_item(&params.text).await?;
    json_result(&item)
}

pub async fn checklist_delete_impl(trip: &TripState, params: ChecklistItemParams) -> Result<CallToolResult, McpError> {
    let deleted = trip.delete_custom_item(&params.id).await?;
    json_result(&DeleteItemOutput { id: params.id, deleted })
}

pub async fn expense_list_impl(trip: &TripState, params: ExpenseListParams) -> Result<CallToolResult, McpError> {
    let expenses = trip.expenses().await;

    let mut spent = BTreeMap::new();
    for expense in &expenses {
        if params.category.as_ref().is_some_and(|c| *c != expense.category) {
            continue;
        }
        *spent.entry(expense.category.clone()).or_insert(0.0) += expense.amount;
    }

    json_result(&ExpenseListOutput { expenses, spent })
}

pub async fn expense_add_impl(trip: &TripState, params: ExpenseAddParams) -> Result<CallToolResult, McpError> {
    let (index, expense) = trip.add_expense(&params.category, &params.amount).await?;
    let spent = trip.spent(&expense.category).await;
    json_result(&ExpenseOutput { index, expense, spent })
}

pub async fn expense_edit_impl(trip: &TripState, params: ExpenseEditParams) -> Result<CallToolResult, McpError> {
    let expense = trip.edit_expense(params.index, &params.category, &params.amount).await?;
    let spent = trip.spent(&expense.category).await;
    json_result(&ExpenseOutput { index: params.index, expense, spent })
}

pub async fn expense_delete_impl(trip: &TripState, params: ExpenseDeleteParams) -> Result<CallToolResult, McpError> {
    let expense = trip.delete_expense(params.index).await?;
    let spent = trip.spent(&expense.category).await;
    json_result(&ExpenseOutput { index: params.index, expense, spent })
}

pub async fn theme_get_impl(trip: &TripState) -> Result<CallToolResult, McpError> {
    json_result(&ThemeParams { theme: trip.theme().await })
}

pub async fn theme_set_impl(trip: &TripState, params: ThemeParams) -> Result<CallToolResult, McpError> {
    trip.set_theme(params.theme).await?;
    json_result(&params)
}
