//! Lifecycle states of the cache manager.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::Error;

/// `uninstalled → installing → installed → activating → active`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Uninstalled,
    Installing,
    Installed,
    Activating,
    Active,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Lifecycle::Uninstalled => "uninstalled",
            Lifecycle::Installing => "installing",
            Lifecycle::Installed => "installed",
            Lifecycle::Activating => "activating",
            Lifecycle::Active => "active",
        };
        f.write_str(name)
    }
}

/// Shared lifecycle cell. Never held across an await.
#[derive(Debug)]
pub(crate) struct StateCell(Mutex<Lifecycle>);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(Mutex::new(Lifecycle::Uninstalled))
    }

    pub(crate) fn get(&self) -> Lifecycle {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set(&self, state: Lifecycle) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Move to `to` if the current state is one of `from`.
    pub(crate) fn advance(&self, from: &[Lifecycle], to: Lifecycle) -> Result<Lifecycle, Error> {
        let mut state = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if !from.contains(&state) {
            return Err(Error::InvalidState(format!("cannot move from {} to {to}", *state)));
        }
        let previous = *state;
        *state = to;
        Ok(previous)
    }
}
