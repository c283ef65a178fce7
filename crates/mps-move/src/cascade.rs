//! Cascading destination picker.
//!
//! A state machine over the six levels campaign → version → onglet →
//! section → tactique → placement. Picking an item at one level clears
//! every deeper level and asks for the next level's items, scoped by the
//! choices made so far.
//!
//! # Stale loads
//!
//! Loads are asynchronous and the user may change an upper choice while a
//! lower list is still loading. Each level carries a generation counter
//! that is bumped whenever a new load starts or the level is cleared; a
//! completion whose generation no longer matches is discarded.

use mps_model::{EntityId, EntityPath, ModelError, PlanContext, PlanEntity};
use mps_store::{NamedItem, PlanStore, StoreError};
use serde::{Deserialize, Serialize};

use crate::error::{MoveError, Result};
use crate::level::{CascadeLevel, TargetLevel};

// =============================================================================
// DESTINATION
// =============================================================================

/// Partial destination chain, one optional choice per cascade level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveDestination {
    choices: [Option<NamedItem>; 6],
}

/// A fully resolved destination: the onglet plus the parent entity path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveTarget {
    pub ctx: PlanContext,
    /// `None` when sections are moved into the onglet itself.
    pub parent: Option<EntityPath>,
}

impl MoveDestination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, level: CascadeLevel) -> Option<&NamedItem> {
        self.choices[level.index()].as_ref()
    }

    /// Id chosen at `level`, ignoring blank ids.
    pub fn id(&self, level: CascadeLevel) -> Option<&str> {
        self.get(level)
            .map(|item| item.id.as_str())
            .filter(|id| !id.trim().is_empty())
    }

    pub fn name(&self, level: CascadeLevel) -> Option<&str> {
        self.get(level).map(|item| item.name.as_str())
    }

    /// Record a choice and clear every deeper level.
    pub fn set(&mut self, level: CascadeLevel, item: NamedItem) {
        self.choices[level.index()] = Some(item);
        self.clear_deeper(level);
    }

    pub fn clear_deeper(&mut self, level: CascadeLevel) {
        for deeper in level.deeper() {
            self.choices[deeper.index()] = None;
        }
    }

    /// First level between campaign and `target` that has no choice.
    pub fn first_missing(&self, target: TargetLevel) -> Option<CascadeLevel> {
        CascadeLevel::ALL
            .into_iter()
            .take(target.cascade_level().index() + 1)
            .find(|level| self.id(*level).is_none())
    }

    /// Whether every level from campaign down to `target` has an id.
    pub fn is_complete(&self, target: TargetLevel) -> bool {
        self.first_missing(target).is_none()
    }

    /// Resolve the destination onglet and parent path for a move to `target`.
    pub fn resolve(&self, client_id: &str, target: TargetLevel) -> Result<MoveTarget> {
        if let Some(level) = self.first_missing(target) {
            return Err(MoveError::IncompleteDestination { level });
        }
        let ctx = self.context(client_id)?;
        let entity = |level: CascadeLevel| -> Result<EntityId> {
            let id = self
                .id(level)
                .ok_or(MoveError::IncompleteDestination { level })?;
            Ok(EntityId::new(id)?)
        };
        let parent = match target {
            TargetLevel::Onglet => None,
            TargetLevel::Section => Some(EntityPath::Section {
                section: entity(CascadeLevel::Section)?,
            }),
            TargetLevel::Tactique => Some(EntityPath::Tactique {
                section: entity(CascadeLevel::Section)?,
                tactique: entity(CascadeLevel::Tactique)?,
            }),
            TargetLevel::Placement => Some(EntityPath::Placement {
                section: entity(CascadeLevel::Section)?,
                tactique: entity(CascadeLevel::Tactique)?,
                placement: entity(CascadeLevel::Placement)?,
            }),
        };
        Ok(MoveTarget { ctx, parent })
    }

    /// Onglet context of the destination.
    pub fn context(&self, client_id: &str) -> Result<PlanContext> {
        let ctx = PlanContext::new(
            client_id,
            self.id(CascadeLevel::Campaign).unwrap_or_default(),
            self.id(CascadeLevel::Version).unwrap_or_default(),
            self.id(CascadeLevel::Onglet).unwrap_or_default(),
        );
        ctx.require()?;
        Ok(ctx)
    }
}

// =============================================================================
// PICKER STATE
// =============================================================================

/// State of one cascade level in the picker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelState {
    pub visible: bool,
    pub required: bool,
    pub items: Vec<NamedItem>,
    pub selected_id: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
    generation: u64,
}

impl LevelState {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn reset(&mut self) {
        self.items.clear();
        self.selected_id = None;
        self.loading = false;
        self.error = None;
        self.generation += 1;
    }
}

/// A pending item-list load for one level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub level: CascadeLevel,
    pub generation: u64,
    pub client_id: String,
    /// Choices above `level` at the time the load started.
    pub scope: MoveDestination,
}

/// Destination picker for one move.
#[derive(Debug, Clone)]
pub struct DestinationPicker {
    client_id: String,
    target: TargetLevel,
    levels: [LevelState; 6],
    destination: MoveDestination,
}

impl DestinationPicker {
    /// Open the picker for a move to `target` and request the campaigns.
    ///
    /// Levels from campaign down to the target are visible and required;
    /// deeper levels stay hidden for the whole session.
    pub fn open(client_id: impl Into<String>, target: TargetLevel) -> (Self, LoadRequest) {
        let floor = target.cascade_level();
        let mut levels: [LevelState; 6] = Default::default();
        for level in CascadeLevel::ALL {
            let state = &mut levels[level.index()];
            state.visible = level <= floor;
            state.required = level <= floor;
        }
        let mut picker = Self {
            client_id: client_id.into(),
            target,
            levels,
            destination: MoveDestination::new(),
        };
        let request = picker.request(CascadeLevel::Campaign);
        tracing::debug!(level = %target, "destination picker opened");
        (picker, request)
    }

    pub fn target(&self) -> TargetLevel {
        self.target
    }

    pub fn destination(&self) -> &MoveDestination {
        &self.destination
    }

    pub fn level(&self, level: CascadeLevel) -> &LevelState {
        &self.levels[level.index()]
    }

    pub fn is_complete(&self) -> bool {
        self.destination.is_complete(self.target)
    }

    pub fn is_loading(&self) -> bool {
        self.levels.iter().any(|state| state.loading)
    }

    /// Resolve the picked destination for [`execute_move`](crate::execute_move).
    pub fn resolve(&self) -> Result<MoveTarget> {
        self.destination.resolve(&self.client_id, self.target)
    }

    /// Pick `item_id` at `level`.
    ///
    /// Deeper choices and item lists are cleared (invalidating their
    /// in-flight loads). Returns the load for the next level, or `None`
    /// once the target level is reached.
    pub fn select(&mut self, level: CascadeLevel, item_id: &str) -> Result<Option<LoadRequest>> {
        let state = &self.levels[level.index()];
        let item = state
            .items
            .iter()
            .find(|item| item.id == item_id)
            .filter(|_| state.visible)
            .cloned()
            .ok_or_else(|| MoveError::UnknownItem {
                level,
                id: item_id.to_string(),
            })?;

        tracing::debug!(level = %level, id = %item.id, name = %item.name, "destination level picked");
        self.destination.set(level, item);
        self.levels[level.index()].selected_id = Some(item_id.to_string());
        for deeper in level.deeper() {
            self.levels[deeper.index()].reset();
        }

        Ok(level
            .next()
            .filter(|next| *next <= self.target.cascade_level())
            .map(|next| self.request(next)))
    }

    /// Deliver the items of a load. Returns `false` when the load is stale.
    pub fn complete_load(&mut self, request: &LoadRequest, items: Vec<NamedItem>) -> bool {
        let Some(state) = self.current(request) else {
            return false;
        };
        state.items = items;
        state.loading = false;
        state.error = None;
        true
    }

    /// Record a failed load. Returns `false` when the load is stale.
    pub fn fail_load(&mut self, request: &LoadRequest, message: impl Into<String>) -> bool {
        let Some(state) = self.current(request) else {
            return false;
        };
        state.loading = false;
        state.error = Some(message.into());
        true
    }

    /// Run `request` against `store` and deliver the outcome.
    pub async fn load<S: PlanStore>(&mut self, store: &S, request: &LoadRequest) -> bool {
        match fetch_level(store, request).await {
            Ok(items) => self.complete_load(request, items),
            Err(error) => self.fail_load(request, error.user_message()),
        }
    }

    fn request(&mut self, level: CascadeLevel) -> LoadRequest {
        let state = &mut self.levels[level.index()];
        state.reset();
        state.loading = true;
        LoadRequest {
            level,
            generation: state.generation,
            client_id: self.client_id.clone(),
            scope: self.destination.clone(),
        }
    }

    fn current(&mut self, request: &LoadRequest) -> Option<&mut LevelState> {
        let state = &mut self.levels[request.level.index()];
        if state.generation != request.generation {
            tracing::warn!(
                level = %request.level,
                received = request.generation,
                current = state.generation,
                "discarding stale destination load"
            );
            return None;
        }
        Some(state)
    }
}

// =============================================================================
// LOADING
// =============================================================================

/// Fetch the items of `request.level`, scoped by the choices above it.
pub async fn fetch_level<S: PlanStore>(
    store: &S,
    request: &LoadRequest,
) -> mps_store::Result<Vec<NamedItem>> {
    let scope = &request.scope;
    let client = request.client_id.as_str();
    let context = || -> mps_store::Result<PlanContext> {
        let ctx = PlanContext::new(
            client,
            required(scope, CascadeLevel::Campaign)?,
            required(scope, CascadeLevel::Version)?,
            required(scope, CascadeLevel::Onglet)?,
        );
        ctx.require()?;
        Ok(ctx)
    };

    match request.level {
        CascadeLevel::Campaign => store.list_campaigns(client).await,
        CascadeLevel::Version => {
            store
                .list_versions(client, required(scope, CascadeLevel::Campaign)?)
                .await
        }
        CascadeLevel::Onglet => {
            store
                .list_onglets(
                    client,
                    required(scope, CascadeLevel::Campaign)?,
                    required(scope, CascadeLevel::Version)?,
                )
                .await
        }
        CascadeLevel::Section => {
            let sections = store.get_sections(&context()?).await?;
            Ok(named(&sections))
        }
        CascadeLevel::Tactique => {
            let tactiques = store
                .get_tactiques(&context()?, &entity_id(scope, CascadeLevel::Section)?)
                .await?;
            Ok(named(&tactiques))
        }
        CascadeLevel::Placement => {
            let placements = store
                .get_placements(
                    &context()?,
                    &entity_id(scope, CascadeLevel::Section)?,
                    &entity_id(scope, CascadeLevel::Tactique)?,
                )
                .await?;
            Ok(named(&placements))
        }
    }
}

fn required(scope: &MoveDestination, level: CascadeLevel) -> mps_store::Result<&str> {
    scope.id(level).ok_or(StoreError::Model(ModelError::MissingContext {
        field: level.as_str(),
    }))
}

fn entity_id(scope: &MoveDestination, level: CascadeLevel) -> mps_store::Result<EntityId> {
    Ok(EntityId::new(required(scope, level)?)?)
}

fn named<T: PlanEntity>(entities: &[T]) -> Vec<NamedItem> {
    entities
        .iter()
        .map(|entity| NamedItem::new(entity.id().as_str(), entity.label()))
        .collect()
}
