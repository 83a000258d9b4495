//! First-start seeding
//!
//! Creates the default projector, the standard projection defaults and the
//! config defaults, then builds the initial history. Records that already
//! exist are left alone, so running it on every start is fine.

use crate::config_store::ConfigService;
use crate::error::{ApiError, DaemonError, DaemonResult};
use crate::history::HistoryService;
use crate::storage::Storage;
use lectern_types::{
    Element, ElementKey, ElementMap, ElementStore, ProjectionDefault, Projector,
    DEFAULT_PROJECTOR_ID,
};
use serde_json::json;

/// Name and display name of every standard projection default
pub const STANDARD_PROJECTION_DEFAULTS: &[(&str, &str)] = &[
    ("agenda_all_items", "Agenda"),
    ("topics", "Topics"),
    ("agenda_list_of_speakers", "List of speakers"),
    ("agenda_current_list_of_speakers", "Current list of speakers"),
    ("motions", "Motions"),
    ("motionBlocks", "Motion blocks"),
    ("assignments", "Elections"),
    ("users", "Participants"),
    ("mediafiles", "Files"),
    ("messages", "Messages"),
    ("countdowns", "Countdowns"),
];

fn bootstrap_error(err: ApiError) -> DaemonError {
    DaemonError::Bootstrap(err.to_string())
}

fn default_projector() -> DaemonResult<Projector> {
    let clock = Element::from_value(json!({"name": "core/clock", "stable": true}))
        .map_err(|err| DaemonError::Bootstrap(err.to_string()))?;
    let mut elements = ElementMap::new();
    elements.insert(ElementKey::generate(), clock);

    let mut projector = Projector::new("Default projector");
    projector.id = DEFAULT_PROJECTOR_ID;
    projector.elements = ElementStore::new(elements);
    Ok(projector)
}

/// Seed an empty store
pub async fn seed(
    storage: &dyn Storage,
    config: &ConfigService,
    history: &HistoryService,
) -> DaemonResult<()> {
    if !storage.projectors().exists(DEFAULT_PROJECTOR_ID).await? {
        storage.projectors().insert(default_projector()?).await?;
        tracing::info!(projector_id = DEFAULT_PROJECTOR_ID, "Created default projector");
    }

    if storage.projection_defaults().list().await?.is_empty() {
        for (name, display_name) in STANDARD_PROJECTION_DEFAULTS {
            storage
                .projection_defaults()
                .insert(ProjectionDefault::new(
                    *name,
                    *display_name,
                    DEFAULT_PROJECTOR_ID,
                ))
                .await?;
        }
        tracing::info!(
            count = STANDARD_PROJECTION_DEFAULTS.len(),
            "Created projection defaults"
        );
    }

    config.bootstrap().await.map_err(bootstrap_error)?;

    let built = history.build_if_empty().await.map_err(bootstrap_error)?;
    if built > 0 {
        tracing::info!(entries = built, "Built initial history");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autoupdate::BroadcastNotifier;
    use crate::config_store::ConfigRegistry;
    use crate::storage::InMemoryStorage;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_seed_is_repeatable() {
        let storage = Arc::new(InMemoryStorage::new());
        let notifier = Arc::new(BroadcastNotifier::new(16));
        let config = ConfigService::new(storage.clone(), notifier.clone(), ConfigRegistry::core());
        let history = HistoryService::new(storage.clone(), notifier);

        seed(&*storage, &config, &history).await.unwrap();
        seed(&*storage, &config, &history).await.unwrap();

        let projector = storage.projectors().get(1).await.unwrap().unwrap();
        assert_eq!(projector.name, "Default projector");
        assert_eq!(projector.elements.stable().len(), 1);

        let defaults = storage.projection_defaults().list().await.unwrap();
        assert_eq!(defaults.len(), STANDARD_PROJECTION_DEFAULTS.len());
        assert!(defaults.iter().all(|d| d.projector_id == DEFAULT_PROJECTOR_ID));

        let entries = history.entries().await.unwrap();
        let expected = 1 + defaults.len() + config.list().await.unwrap().len();
        assert_eq!(entries.len(), expected);
    }
}
