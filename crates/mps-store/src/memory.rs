//! In-memory store.
//!
//! Backs the CLI and the test suites. The whole client tree lives behind a
//! mutex; every write is recorded so tests can assert on exactly what was
//! sent, and writes can be made to fail per entity id.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use mps_model::{
    Creatif, Entity, EntityId, EntityPath, FieldMap, Placement, PlanContext, PlanData,
    PlanEntity, Section, Tactique,
};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::traits::PlanStore;
use crate::types::{NamedItem, Shortcode};

// =============================================================================
// SEED FILE
// =============================================================================

/// Serializable content of a store: one client's campaigns down to onglets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSeed {
    pub client_id: String,
    #[serde(default)]
    pub campaigns: Vec<CampaignSeed>,
    #[serde(default)]
    pub shortcodes: Vec<Shortcode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignSeed {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub versions: Vec<VersionSeed>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionSeed {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub onglets: Vec<OngletSeed>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OngletSeed {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub plan: PlanData,
}

impl StoreSeed {
    /// Context of the first onglet in the seed, if any.
    pub fn first_context(&self) -> Option<PlanContext> {
        let campaign = self.campaigns.first()?;
        let version = campaign.versions.first()?;
        let onglet = version.onglets.first()?;
        Some(PlanContext::new(
            &self.client_id,
            &campaign.id,
            &version.id,
            &onglet.id,
        ))
    }

    fn plan(&self, ctx: &PlanContext) -> Option<&PlanData> {
        self.version(&ctx.client_id, &ctx.campaign_id, &ctx.version_id)?
            .onglets
            .iter()
            .find(|o| o.id == ctx.onglet_id)
            .map(|o| &o.plan)
    }

    fn plan_mut(&mut self, ctx: &PlanContext) -> Option<&mut PlanData> {
        if self.client_id != ctx.client_id {
            return None;
        }
        self.campaigns
            .iter_mut()
            .find(|c| c.id == ctx.campaign_id)?
            .versions
            .iter_mut()
            .find(|v| v.id == ctx.version_id)?
            .onglets
            .iter_mut()
            .find(|o| o.id == ctx.onglet_id)
            .map(|o| &mut o.plan)
    }

    fn campaign(&self, client_id: &str, campaign_id: &str) -> Option<&CampaignSeed> {
        if self.client_id != client_id {
            return None;
        }
        self.campaigns.iter().find(|c| c.id == campaign_id)
    }

    fn version(&self, client_id: &str, campaign_id: &str, version_id: &str) -> Option<&VersionSeed> {
        self.campaign(client_id, campaign_id)?
            .versions
            .iter()
            .find(|v| v.id == version_id)
    }
}

// =============================================================================
// CALL LOG
// =============================================================================

/// A write call received by the in-memory store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Add {
        parent: Option<EntityPath>,
        id: EntityId,
    },
    Update {
        path: EntityPath,
        changes: FieldMap,
    },
    Delete {
        path: EntityPath,
    },
}

// =============================================================================
// STORE
// =============================================================================

#[derive(Debug, Default)]
struct State {
    seed: StoreSeed,
    calls: Vec<StoreCall>,
    failing: HashSet<EntityId>,
    shortcode_reads: usize,
    next_id: u64,
}

impl State {
    fn plan(&self, ctx: &PlanContext) -> Result<&PlanData> {
        ctx.require()?;
        self.seed.plan(ctx).ok_or_else(|| scope_error(ctx))
    }

    fn plan_mut(&mut self, ctx: &PlanContext) -> Result<&mut PlanData> {
        ctx.require()?;
        self.seed.plan_mut(ctx).ok_or_else(|| scope_error(ctx))
    }

    fn check_writable(&self, operation: &'static str, id: &EntityId) -> Result<()> {
        if self.failing.contains(id) {
            return Err(StoreError::backend(operation, id.as_str(), "write rejected"));
        }
        Ok(())
    }

    fn update(&mut self, ctx: &PlanContext, path: EntityPath, changes: &FieldMap) -> Result<()> {
        self.calls.push(StoreCall::Update {
            path: path.clone(),
            changes: changes.clone(),
        });
        self.check_writable("update", path.id())?;
        self.plan_mut(ctx)?.apply_changes(&path, changes)?;
        Ok(())
    }

    fn delete(&mut self, ctx: &PlanContext, path: EntityPath) -> Result<()> {
        self.calls.push(StoreCall::Delete { path: path.clone() });
        self.check_writable("delete", path.id())?;
        self.plan_mut(ctx)?.detach(&path)?;
        Ok(())
    }

    fn add(
        &mut self,
        ctx: &PlanContext,
        parent: Option<EntityPath>,
        entity: Entity,
    ) -> Result<EntityId> {
        if let Some(parent) = &parent {
            self.check_writable("add", parent.id())?;
        }
        self.next_id += 1;
        let id = EntityId::new(format!("{}-{}", entity.kind(), self.next_id))?;
        let mut entity = entity;
        entity.set_id(id.clone());
        self.plan_mut(ctx)?.insert(parent.as_ref(), entity)?;
        self.calls.push(StoreCall::Add {
            parent,
            id: id.clone(),
        });
        Ok(id)
    }
}

fn scope_error(ctx: &PlanContext) -> StoreError {
    StoreError::ScopeNotFound {
        scope: format!(
            "onglet {}/{}/{}",
            ctx.campaign_id, ctx.version_id, ctx.onglet_id
        ),
    }
}

fn sorted<T: PlanEntity>(items: &[T]) -> Vec<T> {
    let mut items = items.to_vec();
    items.sort_by_key(T::order);
    items
}

fn named<'a, I>(items: I) -> Vec<NamedItem>
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    items
        .into_iter()
        .map(|(id, name)| NamedItem::new(id, name))
        .collect()
}

/// Thread-safe in-memory [`PlanStore`].
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new(seed: StoreSeed) -> Self {
        Self {
            state: Mutex::new(State {
                seed,
                ..State::default()
            }),
        }
    }

    /// Store holding a single onglet with the given plan.
    pub fn with_plan(ctx: &PlanContext, plan: PlanData) -> Self {
        Self::new(StoreSeed {
            client_id: ctx.client_id.clone(),
            campaigns: vec![CampaignSeed {
                id: ctx.campaign_id.clone(),
                name: ctx.campaign_id.clone(),
                versions: vec![VersionSeed {
                    id: ctx.version_id.clone(),
                    name: ctx.version_id.clone(),
                    onglets: vec![OngletSeed {
                        id: ctx.onglet_id.clone(),
                        name: ctx.onglet_id.clone(),
                        plan,
                    }],
                }],
            }],
            shortcodes: Vec::new(),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| StoreError::backend("lock", "in-memory store", "lock poisoned"))
    }

    /// Make every update / delete of `id`, and every add under `id`, fail.
    pub fn fail_writes_for(&self, id: &EntityId) {
        if let Ok(mut state) = self.lock() {
            state.failing.insert(id.clone());
        }
    }

    /// Undo [`fail_writes_for`](Self::fail_writes_for).
    pub fn allow_writes_for(&self, id: &EntityId) {
        if let Ok(mut state) = self.lock() {
            state.failing.remove(id);
        }
    }

    /// Write calls received so far, in arrival order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().map(|s| s.calls.clone()).unwrap_or_default()
    }

    pub fn clear_calls(&self) {
        if let Ok(mut state) = self.lock() {
            state.calls.clear();
        }
    }

    /// Number of shortcode reads served.
    pub fn shortcode_reads(&self) -> usize {
        self.lock().map(|s| s.shortcode_reads).unwrap_or_default()
    }

    /// Copy of the current content.
    pub fn snapshot(&self) -> Result<StoreSeed> {
        Ok(self.lock()?.seed.clone())
    }

    /// Copy of one onglet's plan.
    pub fn plan(&self, ctx: &PlanContext) -> Result<PlanData> {
        Ok(self.lock()?.plan(ctx)?.clone())
    }
}

impl PlanStore for InMemoryStore {
    async fn get_sections(&self, ctx: &PlanContext) -> Result<Vec<Section>> {
        let state = self.lock()?;
        Ok(sorted(&state.plan(ctx)?.sections))
    }

    async fn get_tactiques(&self, ctx: &PlanContext, section_id: &EntityId) -> Result<Vec<Tactique>> {
        let state = self.lock()?;
        Ok(sorted(state.plan(ctx)?.tactiques_of(section_id)))
    }

    async fn get_placements(
        &self,
        ctx: &PlanContext,
        _section_id: &EntityId,
        tactique_id: &EntityId,
    ) -> Result<Vec<Placement>> {
        let state = self.lock()?;
        Ok(sorted(state.plan(ctx)?.placements_of(tactique_id)))
    }

    async fn get_creatifs(
        &self,
        ctx: &PlanContext,
        _section_id: &EntityId,
        _tactique_id: &EntityId,
        placement_id: &EntityId,
    ) -> Result<Vec<Creatif>> {
        let state = self.lock()?;
        Ok(sorted(state.plan(ctx)?.creatifs_of(placement_id)))
    }

    async fn list_campaigns(&self, client_id: &str) -> Result<Vec<NamedItem>> {
        let state = self.lock()?;
        if state.seed.client_id != client_id {
            return Ok(Vec::new());
        }
        Ok(named(state.seed.campaigns.iter().map(|c| (&c.id, &c.name))))
    }

    async fn list_versions(&self, client_id: &str, campaign_id: &str) -> Result<Vec<NamedItem>> {
        let state = self.lock()?;
        let campaign = state.seed.campaign(client_id, campaign_id).ok_or_else(|| {
            StoreError::ScopeNotFound {
                scope: format!("campaign {campaign_id}"),
            }
        })?;
        Ok(named(campaign.versions.iter().map(|v| (&v.id, &v.name))))
    }

    async fn list_onglets(
        &self,
        client_id: &str,
        campaign_id: &str,
        version_id: &str,
    ) -> Result<Vec<NamedItem>> {
        let state = self.lock()?;
        let version = state
            .seed
            .version(client_id, campaign_id, version_id)
            .ok_or_else(|| StoreError::ScopeNotFound {
                scope: format!("version {version_id}"),
            })?;
        Ok(named(version.onglets.iter().map(|o| (&o.id, &o.name))))
    }

    async fn get_shortcode(&self, id: &str) -> Result<Option<Shortcode>> {
        let mut state = self.lock()?;
        state.shortcode_reads += 1;
        Ok(state.seed.shortcodes.iter().find(|s| s.id == id).cloned())
    }

    async fn add_section(&self, ctx: &PlanContext, section: Section) -> Result<EntityId> {
        self.lock()?.add(ctx, None, section.into())
    }

    async fn add_tactique(
        &self,
        ctx: &PlanContext,
        section_id: &EntityId,
        tactique: Tactique,
    ) -> Result<EntityId> {
        let parent = EntityPath::Section {
            section: section_id.clone(),
        };
        self.lock()?.add(ctx, Some(parent), tactique.into())
    }

    async fn add_placement(
        &self,
        ctx: &PlanContext,
        section_id: &EntityId,
        tactique_id: &EntityId,
        placement: Placement,
    ) -> Result<EntityId> {
        let parent = EntityPath::Tactique {
            section: section_id.clone(),
            tactique: tactique_id.clone(),
        };
        self.lock()?.add(ctx, Some(parent), placement.into())
    }

    async fn add_creatif(
        &self,
        ctx: &PlanContext,
        section_id: &EntityId,
        tactique_id: &EntityId,
        placement_id: &EntityId,
        creatif: Creatif,
    ) -> Result<EntityId> {
        let parent = EntityPath::Placement {
            section: section_id.clone(),
            tactique: tactique_id.clone(),
            placement: placement_id.clone(),
        };
        self.lock()?.add(ctx, Some(parent), creatif.into())
    }

    async fn update_section(
        &self,
        ctx: &PlanContext,
        section_id: &EntityId,
        changes: &FieldMap,
    ) -> Result<()> {
        let path = EntityPath::Section {
            section: section_id.clone(),
        };
        self.lock()?.update(ctx, path, changes)
    }

    async fn update_tactique(
        &self,
        ctx: &PlanContext,
        section_id: &EntityId,
        tactique_id: &EntityId,
        changes: &FieldMap,
    ) -> Result<()> {
        let path = EntityPath::Tactique {
            section: section_id.clone(),
            tactique: tactique_id.clone(),
        };
        self.lock()?.update(ctx, path, changes)
    }

    async fn update_placement(
        &self,
        ctx: &PlanContext,
        section_id: &EntityId,
        tactique_id: &EntityId,
        placement_id: &EntityId,
        changes: &FieldMap,
    ) -> Result<()> {
        let path = EntityPath::Placement {
            section: section_id.clone(),
            tactique: tactique_id.clone(),
            placement: placement_id.clone(),
        };
        self.lock()?.update(ctx, path, changes)
    }

    async fn update_creatif(
        &self,
        ctx: &PlanContext,
        section_id: &EntityId,
        tactique_id: &EntityId,
        placement_id: &EntityId,
        creatif_id: &EntityId,
        changes: &FieldMap,
    ) -> Result<()> {
        let path = EntityPath::Creatif {
            section: section_id.clone(),
            tactique: tactique_id.clone(),
            placement: placement_id.clone(),
            creatif: creatif_id.clone(),
        };
        self.lock()?.update(ctx, path, changes)
    }

    async fn delete_section(&self, ctx: &PlanContext, section_id: &EntityId) -> Result<()> {
        let path = EntityPath::Section {
            section: section_id.clone(),
        };
        self.lock()?.delete(ctx, path)
    }

    async fn delete_tactique(
        &self,
        ctx: &PlanContext,
        section_id: &EntityId,
        tactique_id: &EntityId,
    ) -> Result<()> {
        let path = EntityPath::Tactique {
            section: section_id.clone(),
            tactique: tactique_id.clone(),
        };
        self.lock()?.delete(ctx, path)
    }

    async fn delete_placement(
        &self,
        ctx: &PlanContext,
        section_id: &EntityId,
        tactique_id: &EntityId,
        placement_id: &EntityId,
    ) -> Result<()> {
        let path = EntityPath::Placement {
            section: section_id.clone(),
            tactique: tactique_id.clone(),
            placement: placement_id.clone(),
        };
        self.lock()?.delete(ctx, path)
    }

    async fn delete_creatif(
        &self,
        ctx: &PlanContext,
        section_id: &EntityId,
        tactique_id: &EntityId,
        placement_id: &EntityId,
        creatif_id: &EntityId,
    ) -> Result<()> {
        let path = EntityPath::Creatif {
            section: section_id.clone(),
            tactique: tactique_id.clone(),
            placement: placement_id.clone(),
            creatif: creatif_id.clone(),
        };
        self.lock()?.delete(ctx, path)
    }
}
