// Module exports for CLI subcommands
//
// Each module handles one subcommand. main.rs only parses arguments and
// dispatches to these handlers.

pub mod exposure;
pub mod plan;
pub mod shade;
pub mod sun;

use std::path::Path;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use tracing::debug;

use skisun_lib::{
    Error as LibError, JsonTopologyStore, PlannerConfig, SkiAreaTopology, StatusSnapshot,
    TopologySource,
};

use crate::GlobalOptions;

/// Load the planner config and apply command-line weight overrides.
pub(crate) fn resolve_config(global: &GlobalOptions) -> Result<PlannerConfig> {
    let mut config = match &global.config {
        Some(path) => PlannerConfig::from_path(path)
            .with_context(|| format!("failed to load planner config from {}", path.display()))?,
        None => PlannerConfig::default(),
    };
    if let Some(weight) = global.sun_weight {
        config.sun_weight = weight;
    }
    if let Some(weight) = global.detour_weight {
        config.detour_weight = weight;
    }
    config.validate().context("invalid planner configuration")?;
    Ok(config)
}

/// Load a ski area from the topology store, overlaying a status snapshot when given.
pub(crate) fn load_ski_area(
    global: &GlobalOptions,
    ski_area_id: &str,
    status: Option<&Path>,
) -> Result<SkiAreaTopology> {
    let store = JsonTopologyStore::from_data_dir(global.data_dir.as_deref())
        .context("failed to resolve the topology store")?;
    debug!(root = %store.root().display(), "using topology store");

    let mut topology = store.load(ski_area_id).map_err(handle_store_failure)?;

    if let Some(path) = status {
        let snapshot = StatusSnapshot::from_path(path)
            .with_context(|| format!("failed to read status snapshot {}", path.display()))?;
        topology
            .apply_status(&snapshot)
            .context("failed to apply status snapshot")?;
    }
    Ok(topology)
}

/// Explicit flag first, then the ski area's own zone, then UTC.
pub(crate) fn resolve_timezone(flag: Option<Tz>, topology: &SkiAreaTopology) -> Tz {
    flag.or(topology.timezone).unwrap_or(Tz::UTC)
}

fn handle_store_failure(err: LibError) -> anyhow::Error {
    match err {
        LibError::UnknownSkiArea { id, suggestions } => {
            anyhow::anyhow!(format_unknown_ski_area_message(&id, &suggestions))
        }
        other => anyhow::Error::new(other),
    }
}

fn format_unknown_ski_area_message(id: &str, suggestions: &[String]) -> String {
    let mut message = format!("Unknown ski area '{}'.", id);
    match suggestions {
        [] => {}
        [only] => message.push_str(&format!(" Did you mean '{only}'?")),
        many => {
            let joined = many
                .iter()
                .map(|s| format!("'{}'", s))
                .collect::<Vec<_>>()
                .join(", ");
            message.push_str(&format!(" Did you mean one of: {}?", joined));
        }
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_ski_area_message_lists_suggestions() {
        assert_eq!(
            format_unknown_ski_area_message("vall", &[]),
            "Unknown ski area 'vall'."
        );
        assert_eq!(
            format_unknown_ski_area_message("vall", &["vail".to_string()]),
            "Unknown ski area 'vall'. Did you mean 'vail'?"
        );
        assert_eq!(
            format_unknown_ski_area_message(
                "vall",
                &["vail".to_string(), "val-d-isere".to_string()]
            ),
            "Unknown ski area 'vall'. Did you mean one of: 'vail', 'val-d-isere'?"
        );
    }

    #[test]
    fn config_overrides_apply_on_top_of_defaults() {
        let global = GlobalOptions {
            sun_weight: Some(2.0),
            ..GlobalOptions::default()
        };
        let config = resolve_config(&global).unwrap();
        assert_eq!(config.sun_weight, 2.0);
        assert_eq!(config.detour_weight, PlannerConfig::default().detour_weight);

        let negative = GlobalOptions {
            detour_weight: Some(-1.0),
            ..GlobalOptions::default()
        };
        assert!(resolve_config(&negative).is_err());
    }
}
