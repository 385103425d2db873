use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

/// Key diagnostics; reports variable names only, never values
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub status: &'static str,
    pub environment_variable_set: bool,
    pub found_openrouter_keys: Vec<String>,
    pub timestamp: String,
}

pub async fn check(State(state): State<Arc<AppState>>) -> Json<CheckReport> {
    let environment_variable_set = state.config.openrouter_api_key.is_some();

    Json(CheckReport {
        status: if environment_variable_set { "ok" } else { "missing_key" },
        environment_variable_set,
        found_openrouter_keys: openrouter_var_names(std::env::vars_os().map(|(k, _)| k)),
        timestamp: Utc::now().to_rfc3339(),
    })
}

fn openrouter_var_names(
    names: impl Iterator<Item = std::ffi::OsString>,
) -> Vec<String> {
    let mut found: Vec<String> = names
        .filter_map(|name| name.into_string().ok())
        .filter(|name| name.to_lowercase().contains("openrouter"))
        .collect();
    found.sort();
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_openrouter_names_reported() {
        let names = ["PATH", "OPENROUTER_API_KEY", "my_openrouter_backup", "HOME"]
            .into_iter()
            .map(std::ffi::OsString::from);

        assert_eq!(
            openrouter_var_names(names),
            vec!["OPENROUTER_API_KEY", "my_openrouter_backup"]
        );
    }
}
