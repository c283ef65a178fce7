//! Loading a whole onglet from the store.

use mps_model::{PlanContext, PlanData};

use crate::error::Result;
use crate::traits::PlanStore;

/// Read every level of the onglet named by `ctx` into a [`PlanData`].
///
/// Levels are read top-down because each query needs its parent ids.
pub async fn load_plan<S: PlanStore>(store: &S, ctx: &PlanContext) -> Result<PlanData> {
    ctx.require()?;
    let mut plan = PlanData::new();
    plan.sections = store.get_sections(ctx).await?;

    for section in &plan.sections {
        let tactiques = store.get_tactiques(ctx, &section.id).await?;
        for tactique in &tactiques {
            let placements = store.get_placements(ctx, &section.id, &tactique.id).await?;
            for placement in &placements {
                let creatifs = store
                    .get_creatifs(ctx, &section.id, &tactique.id, &placement.id)
                    .await?;
                if !creatifs.is_empty() {
                    plan.creatifs.insert(placement.id.clone(), creatifs);
                }
            }
            if !placements.is_empty() {
                plan.placements.insert(tactique.id.clone(), placements);
            }
        }
        if !tactiques.is_empty() {
            plan.tactiques.insert(section.id.clone(), tactiques);
        }
    }

    plan.sort();
    tracing::debug!(
        onglet = %ctx.onglet_id,
        entities = plan.entity_count(),
        "loaded plan"
    );
    Ok(plan)
}
