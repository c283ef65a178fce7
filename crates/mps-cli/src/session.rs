//! Plan files.
//!
//! A plan file is a [`StoreSeed`] serialized as JSON. Commands load it into
//! an [`InMemoryStore`], work through the store contract, and optionally
//! write the store's final content back.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use mps_model::{EntityId, PlanContext, PlanData};
use mps_store::{InMemoryStore, StoreSeed};

use crate::cli::PlanArgs;

/// An opened plan file and the onglet the command works on.
pub struct Session {
    pub path: PathBuf,
    pub store: InMemoryStore,
    pub ctx: PlanContext,
}

impl Session {
    /// Read the plan file and resolve the onglet from the arguments.
    ///
    /// Missing ids default to the first campaign, version and onglet in
    /// the file.
    pub fn open(args: &PlanArgs) -> Result<Self> {
        let seed = read_seed(&args.plan)?;
        let ctx = resolve_context(&seed, args)?;
        tracing::debug!(
            file = %args.plan.display(),
            campaign = %ctx.campaign_id,
            version = %ctx.version_id,
            onglet = %ctx.onglet_id,
            "plan file opened"
        );
        Ok(Self {
            path: args.plan.clone(),
            store: InMemoryStore::new(seed),
            ctx,
        })
    }

    /// Canonical content of the working onglet.
    pub async fn load_plan(&self) -> Result<PlanData> {
        mps_store::load_plan(&self.store, &self.ctx)
            .await
            .with_context(|| format!("load onglet {}", self.ctx.onglet_id))
    }

    /// Write the store's current content back to the plan file.
    pub fn persist(&self) -> Result<()> {
        let seed = self.store.snapshot().context("snapshot store")?;
        write_seed(&self.path, &seed)?;
        tracing::info!(file = %self.path.display(), "plan file written");
        Ok(())
    }
}

pub fn read_seed(path: &Path) -> Result<StoreSeed> {
    let content =
        fs::read_to_string(path).with_context(|| format!("read plan file {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parse plan file {}", path.display()))
}

pub fn write_seed(path: &Path, seed: &StoreSeed) -> Result<()> {
    let content = serde_json::to_string_pretty(seed).context("serialize plan")?;
    fs::write(path, content).with_context(|| format!("write plan file {}", path.display()))
}

/// Parse command-line ids.
pub fn parse_ids<S: AsRef<str>>(values: &[S]) -> Result<Vec<EntityId>> {
    values
        .iter()
        .map(|value| {
            EntityId::new(value.as_ref())
                .with_context(|| format!("invalid entity id '{}'", value.as_ref()))
        })
        .collect()
}

fn resolve_context(seed: &StoreSeed, args: &PlanArgs) -> Result<PlanContext> {
    let campaign = match &args.campaign {
        Some(id) => seed.campaigns.iter().find(|c| &c.id == id),
        None => seed.campaigns.first(),
    };
    let Some(campaign) = campaign else {
        bail!("campaign not found in plan file");
    };
    let version = match &args.version {
        Some(id) => campaign.versions.iter().find(|v| &v.id == id),
        None => campaign.versions.first(),
    };
    let Some(version) = version else {
        bail!("version not found in campaign {}", campaign.id);
    };
    let onglet = match &args.onglet {
        Some(id) => version.onglets.iter().find(|o| &o.id == id),
        None => version.onglets.first(),
    };
    let Some(onglet) = onglet else {
        bail!("onglet not found in version {}", version.id);
    };
    Ok(PlanContext::new(
        seed.client_id.as_str(),
        campaign.id.as_str(),
        version.id.as_str(),
        onglet.id.as_str(),
    ))
}
