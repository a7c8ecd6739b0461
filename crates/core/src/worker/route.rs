//! Request classification and path resolution.
//!
//! Both functions are pure: no store or network access, so the routing
//! rules can be tested on their own.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;
use crate::http::AssetRequest;

/// Why a request was left to the network untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PassReason {
    NotGet,
    CrossOrigin,
    /// The manager has not taken control yet.
    Inactive,
}

/// Routing decision for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Passthrough(PassReason),
    Intercept { navigation: bool },
}

/// Decide whether the manager handles `request` for an app served from `origin`.
///
/// Method is checked before origin, so a cross-origin POST reports `NotGet`.
pub fn classify(request: &AssetRequest, origin: &Url) -> Route {
    if !request.is_get() {
        return Route::Passthrough(PassReason::NotGet);
    }
    if request.url.origin() != origin.origin() {
        return Route::Passthrough(PassReason::CrossOrigin);
    }
    Route::Intercept { navigation: request.is_navigation() }
}

/// Resolve a manifest path or request target against the app base URL.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Join relative paths onto `base`; absolute URLs are kept as given
/// 3. Reject anything but http and https
/// 4. Remove fragment (#...)
pub fn resolve(base: &Url, path: &str) -> Result<Url, Error> {
    let trimmed = path.trim();

    if trimmed.is_empty() {
        return Err(Error::InvalidUrl("empty path".into()));
    }

    let mut url = base.join(trimmed).map_err(|e| Error::InvalidUrl(format!("{trimmed}: {e}")))?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(Error::InvalidUrl(format!("unsupported scheme: {scheme}"))),
    }

    url.set_fragment(None);

    Ok(url)
}
