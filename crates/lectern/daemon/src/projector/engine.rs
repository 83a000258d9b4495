//! Projector operations
//!
//! Every mutation loads the projector, computes the new state and stores it
//! while holding the projector's lock. Notifications go out after the write.

use super::composition::{self, CompositionError};
use super::payload::{ProjectRequest, ViewAction, ViewControl};
use crate::autoupdate::{self, Notifier};
use crate::config_store::ConfigService;
use crate::error::{ApiError, ApiResult};
use crate::locks::KeyedLocks;
use crate::storage::Storage;
use lectern_types::{
    Element, ElementKey, ElementRef, ProjectionDefault, Projector, RecordId, Resolution,
    DEFAULT_PROJECTOR_ID, PROJECTOR_BROADCAST,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

impl From<CompositionError> for ApiError {
    fn from(err: CompositionError) -> Self {
        ApiError::invalid(err.to_string())
    }
}

/// Fields of a projector that may be written through create and update
///
/// Elements are not among them: they only change through the element actions.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectorChanges {
    pub name: Option<String>,
    pub scale: Option<i32>,
    pub scroll: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub blank: Option<bool>,
}

impl ProjectorChanges {
    fn apply(self, projector: &mut Projector) -> ApiResult<()> {
        if let Some(name) = self.name {
            projector.name = name;
        }
        if let Some(scale) = self.scale {
            projector.scale = scale;
        }
        if let Some(scroll) = self.scroll {
            projector.scroll = scroll;
        }
        let resolution = Resolution {
            width: self.width.unwrap_or(projector.width),
            height: self.height.unwrap_or(projector.height),
        };
        resolution
            .validate()
            .map_err(|err| ApiError::invalid(err.to_string()))?;
        projector.width = resolution.width;
        projector.height = resolution.height;
        if let Some(blank) = self.blank {
            projector.blank = blank;
        }
        Ok(())
    }
}

/// Projector element engine and projector CRUD
pub struct ProjectorService {
    storage: Arc<dyn Storage>,
    notifier: Arc<dyn Notifier>,
    config: Arc<ConfigService>,
    locks: KeyedLocks<RecordId>,
}

fn projector_not_found() -> ApiError {
    ApiError::not_found("Not found.")
}

impl ProjectorService {
    pub fn new(
        storage: Arc<dyn Storage>,
        notifier: Arc<dyn Notifier>,
        config: Arc<ConfigService>,
    ) -> Self {
        Self {
            storage,
            notifier,
            config,
            locks: KeyedLocks::new(),
        }
    }

    pub async fn list(&self) -> ApiResult<Vec<Projector>> {
        Ok(self.storage.projectors().list().await?)
    }

    pub async fn get(&self, id: RecordId) -> ApiResult<Projector> {
        self.storage
            .projectors()
            .get(id)
            .await?
            .ok_or_else(projector_not_found)
    }

    /// Run `compute` on the stored projector and persist the result
    ///
    /// `compute` may fail, in which case nothing is written.
    async fn modify<T, F>(&self, id: RecordId, compute: F) -> ApiResult<(Projector, T)>
    where
        F: FnOnce(&mut Projector) -> ApiResult<T> + Send,
        T: Send,
    {
        let _guard = self.locks.lock(&id).await;
        let mut projector = self.get(id).await?;
        let outcome = compute(&mut projector)?;
        self.storage.projectors().upsert(projector.clone()).await?;
        self.inform(&projector)?;
        Ok((projector, outcome))
    }

    fn inform(&self, projector: &Projector) -> ApiResult<()> {
        self.notifier
            .inform_changed(autoupdate::changed(std::slice::from_ref(projector))?);
        Ok(())
    }

    // Resets scroll along with the element swap
    fn prune_into(projector: &mut Projector, elements: Vec<Element>) {
        let mapping = composition::pruned(&projector.elements, elements);
        projector.elements.replace(mapping);
        if projector.scroll != 0 {
            projector.scroll = 0;
        }
    }

    fn clear_into(projector: &mut Projector) {
        Self::prune_into(projector, Vec::new());
    }

    pub async fn create(&self, changes: ProjectorChanges) -> ApiResult<Projector> {
        let mut projector = Projector::new("");
        changes.apply(&mut projector)?;
        let projector = self.storage.projectors().insert(projector).await?;
        self.inform(&projector)?;
        tracing::info!(projector_id = projector.id, name = %projector.name, "Created projector");
        Ok(projector)
    }

    pub async fn update(&self, id: RecordId, changes: ProjectorChanges) -> ApiResult<Projector> {
        let (projector, ()) = self.modify(id, |projector| changes.apply(projector)).await?;
        tracing::info!(projector_id = id, "Updated projector");
        Ok(projector)
    }

    /// Delete a projector
    ///
    /// Projection defaults shown on it move to the default projector and a
    /// broadcast of it is switched off.
    pub async fn destroy(&self, id: RecordId) -> ApiResult<()> {
        if id == DEFAULT_PROJECTOR_ID {
            return Err(ApiError::invalid("The default projector cannot be deleted."));
        }
        let _guard = self.locks.lock(&id).await;
        let projector = self.get(id).await?;

        let mut moved = Vec::new();
        for mut default in self.storage.projection_defaults().list().await? {
            if default.projector_id == projector.id {
                default.projector_id = DEFAULT_PROJECTOR_ID;
                self.storage
                    .projection_defaults()
                    .upsert(default.clone())
                    .await?;
                moved.push(default);
            }
        }
        self.notifier.inform_changed(autoupdate::changed(&moved)?);

        self.config
            .modify(PROJECTOR_BROADCAST, |current| {
                (current.as_i64() == Some(projector.id)).then(|| json!(0))
            })
            .await?;

        self.storage.projectors().delete(projector.id).await?;
        self.notifier
            .inform_deleted(vec![ElementRef::of(&projector)]);
        tracing::info!(
            projector_id = id,
            reassigned_defaults = moved.len(),
            "Deleted projector"
        );
        Ok(())
    }

    pub async fn activate_elements(
        &self,
        id: RecordId,
        elements: Vec<Element>,
    ) -> ApiResult<Projector> {
        let count = elements.len();
        let (projector, ()) = self
            .modify(id, |projector| {
                let mapping = composition::added(&projector.elements, elements);
                projector.elements.replace(mapping);
                Ok(())
            })
            .await?;
        tracing::info!(projector_id = id, count, "Activated projector elements");
        Ok(projector)
    }

    pub async fn prune_elements(
        &self,
        id: RecordId,
        elements: Vec<Element>,
    ) -> ApiResult<Projector> {
        let count = elements.len();
        let (projector, ()) = self
            .modify(id, |projector| {
                Self::prune_into(projector, elements);
                Ok(())
            })
            .await?;
        tracing::info!(projector_id = id, count, "Pruned projector elements");
        Ok(projector)
    }

    pub async fn update_elements(
        &self,
        id: RecordId,
        updates: Vec<(ElementKey, Map<String, Value>)>,
    ) -> ApiResult<Projector> {
        let (projector, ()) = self
            .modify(id, |projector| {
                let mapping = composition::updated(&projector.elements, updates)?;
                projector.elements.replace(mapping);
                Ok(())
            })
            .await?;
        tracing::debug!(projector_id = id, "Updated projector elements");
        Ok(projector)
    }

    pub async fn deactivate_elements(
        &self,
        id: RecordId,
        keys: Vec<ElementKey>,
    ) -> ApiResult<Projector> {
        let (projector, ()) = self
            .modify(id, |projector| {
                let mapping = composition::deactivated(&projector.elements, keys)?;
                projector.elements.replace(mapping);
                Ok(())
            })
            .await?;
        tracing::info!(projector_id = id, "Deactivated projector elements");
        Ok(projector)
    }

    pub async fn clear_elements(&self, id: RecordId) -> ApiResult<Projector> {
        let (projector, ()) = self
            .modify(id, |projector| {
                Self::clear_into(projector);
                Ok(())
            })
            .await?;
        tracing::info!(projector_id = id, "Cleared projector elements");
        Ok(projector)
    }

    /// Clear some projectors, then prune one element onto a target
    ///
    /// The target must exist before anything is cleared. Each projector is
    /// changed under its own lock; the whole call is not atomic.
    pub async fn project(&self, request: ProjectRequest) -> ApiResult<()> {
        if let Some(prune) = &request.prune {
            if !self.storage.projectors().exists(prune.projector_id).await? {
                return Err(ApiError::invalid(format!(
                    "The projector with id \"{}\" does not exist",
                    prune.projector_id
                )));
            }
        }

        for id in &request.clear_ids {
            match self
                .modify(*id, |projector| {
                    Self::clear_into(projector);
                    Ok(())
                })
                .await
            {
                Ok(_) => {}
                // Gone in the meantime, or never existed
                Err(ApiError::NotFound(_)) => continue,
                Err(err) => return Err(err),
            }
        }

        if let Some(prune) = request.prune {
            let target = prune.projector_id;
            self.modify(target, |projector| {
                Self::prune_into(projector, vec![prune.element]);
                Ok(())
            })
            .await?;
        }

        tracing::info!(clear_ids = ?request.clear_ids, "Projected element");
        Ok(())
    }

    pub async fn set_resolution(&self, id: RecordId, resolution: Resolution) -> ApiResult<String> {
        self.modify(id, |projector| {
            projector.width = resolution.width;
            projector.height = resolution.height;
            Ok(())
        })
        .await?;
        tracing::info!(
            projector_id = id,
            width = resolution.width,
            height = resolution.height,
            "Changed projector resolution"
        );
        Ok(format!(
            "Changing resolution to {}x{} was successful.",
            resolution.width, resolution.height
        ))
    }

    /// Relative scale or scroll change against the stored value
    pub async fn control_view(&self, id: RecordId, control: ViewControl) -> ApiResult<String> {
        let (_, value) = self
            .modify(id, |projector| {
                let field = match control.action {
                    ViewAction::Scale => &mut projector.scale,
                    ViewAction::Scroll => &mut projector.scroll,
                };
                *field = control.apply(*field);
                Ok(*field)
            })
            .await?;
        tracing::debug!(projector_id = id, control = %control.describe(), value, "Controlled projector view");
        Ok(format!("{} was successful.", control.describe()))
    }

    pub async fn set_scroll(&self, id: RecordId, scroll: i32) -> ApiResult<String> {
        self.modify(id, |projector| {
            projector.scroll = scroll;
            Ok(())
        })
        .await?;
        Ok(format!("Setting scroll to {} was successful.", scroll))
    }

    pub async fn set_blank(&self, id: RecordId, blank: bool) -> ApiResult<String> {
        self.modify(id, |projector| {
            projector.blank = blank;
            Ok(())
        })
        .await?;
        tracing::info!(projector_id = id, blank, "Changed projector blank state");
        let shown = if blank { "True" } else { "False" };
        Ok(format!("Setting 'blank' to {} was successful.", shown))
    }

    /// Toggle the broadcast between off and this projector
    pub async fn broadcast(&self, id: RecordId) -> ApiResult<String> {
        // Held so a concurrent delete cannot leave the broadcast dangling
        let _guard = self.locks.lock(&id).await;
        let projector = self.get(id).await?;
        let value = self
            .config
            .modify(PROJECTOR_BROADCAST, |current| {
                Some(if current.as_i64().unwrap_or(0) == 0 {
                    json!(projector.id)
                } else {
                    json!(0)
                })
            })
            .await?;
        if value.as_i64() == Some(projector.id) {
            tracing::info!(projector_id = id, "Broadcast enabled");
            Ok(format!(
                "Setting projector {} as broadcast projector was successful.",
                projector.id
            ))
        } else {
            tracing::info!("Broadcast disabled");
            Ok("Disabling broadcast was successful.".to_string())
        }
    }

    pub async fn projection_defaults(&self) -> ApiResult<Vec<ProjectionDefault>> {
        Ok(self.storage.projection_defaults().list().await?)
    }

    pub async fn projection_default(&self, id: RecordId) -> ApiResult<ProjectionDefault> {
        self.storage
            .projection_defaults()
            .get(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Not found."))
    }

    /// Show the projection default `default_id` on projector `id`
    pub async fn set_projection_default(
        &self,
        id: RecordId,
        default_id: RecordId,
    ) -> ApiResult<String> {
        // Held so the projector cannot be deleted halfway
        let _guard = self.locks.lock(&id).await;
        let mut default = self
            .storage
            .projection_defaults()
            .get(default_id)
            .await?
            .ok_or_else(|| {
                ApiError::invalid(format!(
                    "The projectiondefault with pk={} was not found.",
                    default_id
                ))
            })?;
        let projector = self.get(id).await?;

        default.projector_id = projector.id;
        self.storage
            .projection_defaults()
            .upsert(default.clone())
            .await?;
        self.notifier
            .inform_changed(autoupdate::changed(std::slice::from_ref(&default))?);
        tracing::info!(projector_id = id, projection_default = %default.name, "Set projection default");
        Ok(format!(
            "Setting projectiondefault \"{}\" to projector {} was successful.",
            default.display_name, projector.id
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autoupdate::BroadcastNotifier;
    use crate::config_store::ConfigRegistry;
    use crate::projector::payload;
    use crate::storage::InMemoryStorage;

    struct Fixture {
        storage: Arc<InMemoryStorage>,
        notifier: Arc<BroadcastNotifier>,
        config: Arc<ConfigService>,
        service: Arc<ProjectorService>,
    }

    async fn fixture() -> Fixture {
        let storage = Arc::new(InMemoryStorage::new());
        let notifier = Arc::new(BroadcastNotifier::new(256));
        let config = Arc::new(ConfigService::new(
            storage.clone(),
            notifier.clone(),
            ConfigRegistry::core(),
        ));
        config.bootstrap().await.unwrap();
        let service = Arc::new(ProjectorService::new(
            storage.clone(),
            notifier.clone(),
            config.clone(),
        ));
        Fixture {
            storage,
            notifier,
            config,
            service,
        }
    }

    fn element(value: Value) -> Element {
        Element::from_value(value).unwrap()
    }

    async fn projector_with(
        f: &Fixture,
        stable: usize,
        unstable: usize,
    ) -> RecordId {
        let projector = f.service.create(ProjectorChanges::default()).await.unwrap();
        let mut elements = Vec::new();
        for i in 0..stable {
            elements.push(element(json!({"name": "core/clock", "stable": true, "i": i})));
        }
        for i in 0..unstable {
            elements.push(element(json!({"name": "motions/motion", "id": i})));
        }
        f.service
            .activate_elements(projector.id, elements)
            .await
            .unwrap();
        projector.id
    }

    fn unstable_count(projector: &Projector) -> usize {
        projector
            .elements
            .iter()
            .filter(|(_, el)| !el.is_stable())
            .count()
    }

    #[tokio::test]
    async fn test_activate_mints_keys_and_notifies() {
        let f = fixture().await;
        let id = projector_with(&f, 0, 0).await;
        let mut rx = f.notifier.subscribe();

        let projector = f
            .service
            .activate_elements(id, vec![element(json!({"name": "a"})), element(json!({"name": "a"}))])
            .await
            .unwrap();
        assert_eq!(projector.elements.len(), 2);

        let message = rx.try_recv().unwrap();
        assert_eq!(message.changed[0].collection, "core/projector");
        assert_eq!(message.changed[0].id, id);
    }

    #[tokio::test]
    async fn test_prune_resets_scroll() {
        let f = fixture().await;
        let id = projector_with(&f, 1, 2).await;
        f.service.set_scroll(id, 7).await.unwrap();

        let projector = f
            .service
            .prune_elements(id, vec![element(json!({"name": "topics/topic"}))])
            .await
            .unwrap();
        assert_eq!(projector.scroll, 0);
        assert_eq!(projector.elements.len(), 2);
        assert_eq!(unstable_count(&projector), 1);
    }

    #[tokio::test]
    async fn test_rejected_deactivate_leaves_projector_untouched() {
        let f = fixture().await;
        let id = projector_with(&f, 1, 2).await;
        let before = f.service.get(id).await.unwrap();
        let mut rx = f.notifier.subscribe();

        let existing = before.elements.iter().next().map(|(k, _)| k.clone()).unwrap();
        let err = f
            .service
            .deactivate_elements(id, vec![existing, ElementKey::generate()])
            .await
            .unwrap_err();
        assert_eq!(err.detail(), "Invalid UUID.");
        assert_eq!(f.service.get(id).await.unwrap(), before);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_project_clears_without_prune() {
        let f = fixture().await;
        let first = projector_with(&f, 1, 3).await;
        let second = projector_with(&f, 0, 2).await;

        let request = payload::project_request(json!({"clear_ids": [first, second, 999]})).unwrap();
        f.service.project(request).await.unwrap();

        let first = f.service.get(first).await.unwrap();
        let second = f.service.get(second).await.unwrap();
        assert_eq!(unstable_count(&first), 0);
        assert_eq!(first.elements.len(), 1);
        assert!(second.elements.is_empty());
    }

    #[tokio::test]
    async fn test_project_to_missing_target_clears_nothing() {
        let f = fixture().await;
        let first = projector_with(&f, 0, 2).await;
        let before = f.service.get(first).await.unwrap();

        let request = payload::project_request(json!({
            "clear_ids": [first],
            "prune": {"id": 999, "element": {"name": "motions/motion"}}
        }))
        .unwrap();
        let err = f.service.project(request).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
        assert_eq!(f.service.get(first).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_project_moves_element() {
        let f = fixture().await;
        let source = projector_with(&f, 0, 1).await;
        let target = projector_with(&f, 1, 1).await;

        let request = payload::project_request(json!({
            "clear_ids": [source],
            "prune": {"id": target, "element": {"name": "motions/motion", "id": 42}}
        }))
        .unwrap();
        f.service.project(request).await.unwrap();

        assert!(f.service.get(source).await.unwrap().elements.is_empty());
        let target = f.service.get(target).await.unwrap();
        assert_eq!(target.elements.len(), 2);
        assert!(target
            .elements
            .iter()
            .any(|(_, el)| el.get("id") == Some(&json!(42))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_scale_up_is_not_lost() {
        let f = fixture().await;
        let id = projector_with(&f, 0, 0).await;
        let control = payload::view_control(json!({"action": "scale", "direction": "up"})).unwrap();

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let service = f.service.clone();
                tokio::spawn(async move { service.control_view(id, control).await })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "Scale up was successful.");
        }
        assert_eq!(f.service.get(id).await.unwrap().scale, 2);
    }

    #[tokio::test]
    async fn test_destroy_reassigns_defaults_and_resets_broadcast() {
        let f = fixture().await;
        let main = f.service.create(ProjectorChanges::default()).await.unwrap();
        assert_eq!(main.id, DEFAULT_PROJECTOR_ID);
        let mut side = main.clone();
        for _ in 0..4 {
            side = f.service.create(ProjectorChanges::default()).await.unwrap();
        }
        assert_eq!(side.id, 5);

        let default = f
            .storage
            .projection_defaults()
            .insert(ProjectionDefault::new("motions", "Motions", side.id))
            .await
            .unwrap();
        f.service.broadcast(side.id).await.unwrap();
        assert_eq!(f.config.get_i64(PROJECTOR_BROADCAST).await.unwrap(), 5);

        f.service.destroy(side.id).await.unwrap();

        assert_eq!(f.config.get_i64(PROJECTOR_BROADCAST).await.unwrap(), 0);
        let default = f.service.projection_default(default.id).await.unwrap();
        assert_eq!(default.projector_id, DEFAULT_PROJECTOR_ID);
        assert!(matches!(
            f.service.get(side.id).await.unwrap_err(),
            ApiError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_destroy_keeps_unrelated_broadcast() {
        let f = fixture().await;
        let _main = f.service.create(ProjectorChanges::default()).await.unwrap();
        let shown = f.service.create(ProjectorChanges::default()).await.unwrap();
        let doomed = f.service.create(ProjectorChanges::default()).await.unwrap();
        f.service.broadcast(shown.id).await.unwrap();

        f.service.destroy(doomed.id).await.unwrap();
        assert_eq!(
            f.config.get_i64(PROJECTOR_BROADCAST).await.unwrap(),
            shown.id
        );
        assert!(f.service.destroy(DEFAULT_PROJECTOR_ID).await.is_err());
    }

    #[tokio::test]
    async fn test_broadcast_toggles() {
        let f = fixture().await;
        let id = projector_with(&f, 0, 0).await;
        assert_eq!(
            f.service.broadcast(id).await.unwrap(),
            format!("Setting projector {} as broadcast projector was successful.", id)
        );
        assert_eq!(
            f.service.broadcast(id).await.unwrap(),
            "Disabling broadcast was successful."
        );
    }

    #[tokio::test]
    async fn test_broadcast_waits_for_projector_lock() {
        let f = fixture().await;
        let id = projector_with(&f, 0, 0).await;
        let guard = f.service.locks.lock(&id).await;

        let pending = {
            let service = f.service.clone();
            tokio::spawn(async move { service.broadcast(id).await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!pending.is_finished());
        assert_eq!(f.config.get_i64(PROJECTOR_BROADCAST).await.unwrap(), 0);

        drop(guard);
        pending.await.unwrap().unwrap();
        assert_eq!(f.config.get_i64(PROJECTOR_BROADCAST).await.unwrap(), id);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_broadcast_racing_destroy_never_points_at_deleted_projector() {
        let f = fixture().await;
        let _main = f.service.create(ProjectorChanges::default()).await.unwrap();
        for _ in 0..50 {
            let id = projector_with(&f, 0, 0).await;
            let broadcast = {
                let service = f.service.clone();
                tokio::spawn(async move { service.broadcast(id).await })
            };
            let destroy = {
                let service = f.service.clone();
                tokio::spawn(async move { service.destroy(id).await })
            };
            let _ = broadcast.await.unwrap();
            destroy.await.unwrap().unwrap();
            assert_eq!(f.config.get_i64(PROJECTOR_BROADCAST).await.unwrap(), 0);
        }
    }

    #[tokio::test]
    async fn test_project_on_missing_ids_leaves_no_locks_behind() {
        let f = fixture().await;
        let id = projector_with(&f, 0, 1).await;
        let mut clear_ids: Vec<RecordId> = (1_000..1_500).collect();
        clear_ids.push(id);

        let request = payload::project_request(json!({ "clear_ids": clear_ids })).unwrap();
        f.service.project(request).await.unwrap();

        assert!(f.service.get(id).await.unwrap().elements.is_empty());
        assert!(f.service.locks.is_empty());
    }

    #[tokio::test]
    async fn test_set_projection_default() {
        let f = fixture().await;
        let id = projector_with(&f, 0, 0).await;
        let default = f
            .storage
            .projection_defaults()
            .insert(ProjectionDefault::new("agenda_all_items", "Agenda", 100))
            .await
            .unwrap();

        let message = f.service.set_projection_default(id, default.id).await.unwrap();
        assert_eq!(
            message,
            format!("Setting projectiondefault \"Agenda\" to projector {} was successful.", id)
        );
        let err = f.service.set_projection_default(id, 77).await.unwrap_err();
        assert_eq!(err.detail(), "The projectiondefault with pk=77 was not found.");
    }

    #[tokio::test]
    async fn test_update_rejects_bad_resolution() {
        let f = fixture().await;
        let id = projector_with(&f, 0, 0).await;
        let changes = ProjectorChanges {
            width: Some(500),
            ..ProjectorChanges::default()
        };
        assert!(f.service.update(id, changes).await.is_err());
        assert_eq!(f.service.get(id).await.unwrap().width, 1220);
    }
}
