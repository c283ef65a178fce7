//! Command implementations.
//!
//! Every command opens the plan file into an in-memory store and works
//! through the same engines an interactive client uses. Commands return
//! their printable output instead of printing, so tests can inspect it.

use anyhow::{Context, Result, anyhow, bail};
use mps_model::{EntityId, EntityKind, PlanData, parse_loose};
use mps_move::{
    CascadeLevel, DestinationPicker, MoveDestination, SelectedItem, TargetLevel,
    analyze_selection, execute_move,
};
use mps_naming::{ShortcodeCache, render_taxonomy, taxonomy_values};
use mps_store::InMemoryStore;
use mps_table::{ColumnCatalog, CommitReport, TableEngine};
use tracing::{Instrument, info, info_span, warn};

use crate::cli::{
    AnalyzeArgs, Command, CopyRowArgs, EditArgs, FillDownArgs, MoveArgs, RowsArgs, TaxonomyArgs,
};
use crate::config::AppConfig;
use crate::render;
use crate::session::{Session, parse_ids};

/// Printable result of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub text: String,
    /// `false` maps to a non-zero exit code.
    pub success: bool,
}

impl Outcome {
    fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            success: true,
        }
    }

    fn failed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            success: false,
        }
    }
}

pub async fn run_command(command: &Command, config: &AppConfig) -> Result<Outcome> {
    match command {
        Command::Rows(args) => run_rows(args, config).await,
        Command::Analyze(args) => run_analyze(args).await,
        Command::Edit(args) => run_edit(args, config).await,
        Command::FillDown(args) => run_fill_down(args, config).await,
        Command::CopyRow(args) => run_copy_row(args, config).await,
        Command::Move(args) => run_move(args).await,
        Command::Taxonomy(args) => run_taxonomy(args, config).await,
    }
}

async fn open_engine(session: &Session, config: &AppConfig) -> Result<TableEngine> {
    let plan = session.load_plan().await?;
    Ok(TableEngine::new(session.ctx.clone(), plan).with_config(config.table.clone()))
}

// =============================================================================
// READ-ONLY COMMANDS
// =============================================================================

pub async fn run_rows(args: &RowsArgs, config: &AppConfig) -> Result<Outcome> {
    let session = Session::open(&args.plan)?;
    let mut engine = open_engine(&session, config).await?;
    let level = EntityKind::from(args.level);
    engine.set_selected_level(level);
    if args.expand_all {
        engine.expand_all();
    } else {
        for id in parse_ids(&args.expand)? {
            engine.expand_section(&id);
        }
    }

    let rows = engine.rows();
    let text = if args.outline {
        render::outline(&rows)
    } else {
        render::rows_table(&rows, &engine.columns(), engine.catalog(), level)
    };
    Ok(Outcome::ok(text))
}

pub async fn run_analyze(args: &AnalyzeArgs) -> Result<Outcome> {
    let session = Session::open(&args.plan)?;
    let plan = session.load_plan().await?;
    let selection = select(&plan, &args.ids)?;
    let analysis = analyze_selection(&selection);
    let text = render::analysis(&analysis);
    Ok(if analysis.is_valid {
        Outcome::ok(text)
    } else {
        Outcome::failed(text)
    })
}

fn select(plan: &PlanData, ids: &[String]) -> Result<Vec<SelectedItem>> {
    parse_ids(ids)?
        .iter()
        .map(|id| SelectedItem::from_plan(plan, id).ok_or_else(|| anyhow!("entity {id} not found")))
        .collect()
}

// =============================================================================
// EDITING COMMANDS
// =============================================================================

pub async fn run_edit(args: &EditArgs, config: &AppConfig) -> Result<Outcome> {
    let session = Session::open(&args.plan)?;
    let mut engine = open_engine(&session, config).await?;
    let id = EntityId::new(args.id.as_str()).context("invalid entity id")?;
    let kind = engine
        .plan()
        .locate(&id)
        .map(|path| path.kind())
        .ok_or_else(|| anyhow!("entity {id} not found"))?;
    engine.set_selected_level(kind);

    let value = parse_loose(&args.value);
    if !engine.catalog().validate_value(kind, &args.field, &value) {
        let message = format!("'{}' is not a valid value for {}", args.value, args.field);
        if config.table.block_save_on_invalid {
            return Ok(Outcome::failed(message));
        }
        warn!(entity = %id, field = %args.field, "{message}");
    }
    if let Err(error) = engine.update_cell(&id, &args.field, value) {
        return Ok(Outcome::failed(error.user_message()));
    }
    save(&session, &mut engine, args.write).await
}

pub async fn run_fill_down(args: &FillDownArgs, config: &AppConfig) -> Result<Outcome> {
    let session = Session::open(&args.plan)?;
    let mut engine = open_engine(&session, config).await?;
    let source = EntityId::new(args.source.as_str()).context("invalid source id")?;
    let targets = parse_ids(&args.targets)?;
    let count = engine.fill_down(&source, &args.field, &targets)?;
    info!(source = %source, field = %args.field, targets = count, "fill-down");
    save(&session, &mut engine, args.write).await
}

pub async fn run_copy_row(args: &CopyRowArgs, config: &AppConfig) -> Result<Outcome> {
    let session = Session::open(&args.plan)?;
    let mut engine = open_engine(&session, config).await?;
    let source = EntityId::new(args.source.as_str()).context("invalid source id")?;
    let targets = parse_ids(&args.targets)?;
    let count = engine.copy_values(&source, &targets)?;
    info!(source = %source, targets = count, "copy-row");
    save(&session, &mut engine, args.write).await
}

async fn save(session: &Session, engine: &mut TableEngine, write: bool) -> Result<Outcome> {
    let report: CommitReport = engine
        .save_all_changes(&session.store)
        .instrument(info_span!("save", onglet = %session.ctx.onglet_id))
        .await?;
    if write && report.succeeded().next().is_some() {
        session.persist()?;
    }

    let mut text = render::commit_report(&report);
    if let Some(banner) = engine.last_error() {
        text.push('\n');
        text.push_str(banner);
    }
    Ok(if report.is_success() {
        Outcome::ok(text)
    } else {
        Outcome::failed(text)
    })
}

// =============================================================================
// MOVE
// =============================================================================

pub async fn run_move(args: &MoveArgs) -> Result<Outcome> {
    let session = Session::open(&args.plan)?;
    let plan = session.load_plan().await?;
    let analysis = analyze_selection(&select(&plan, &args.ids)?);
    let Some(target) = analysis.target_level.filter(|_| analysis.can_move) else {
        return Ok(Outcome::failed(render::analysis(&analysis)));
    };

    let destination = pick_destination(&session.store, &session.ctx.client_id, target, &args.to)
        .await?;
    let report = execute_move(&session.store, &session.ctx, &plan, &analysis, &destination).await?;
    if args.write && report.moved().next().is_some() {
        session.persist()?;
    }

    let text = render::move_report(&report);
    Ok(if report.is_success() {
        Outcome::ok(text)
    } else {
        Outcome::failed(text)
    })
}

/// Walk the destination picker along a `campaign/version/onglet/...` path.
///
/// Each level is listed from the store before its segment is picked, so
/// unknown ids are reported the same way an interactive picker would.
async fn pick_destination(
    store: &InMemoryStore,
    client_id: &str,
    target: TargetLevel,
    to: &str,
) -> Result<MoveDestination> {
    let segments: Vec<&str> = to
        .split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect();
    let needed = target.cascade_level().index() + 1;
    if segments.len() != needed {
        let levels: Vec<&str> = CascadeLevel::ALL[..needed]
            .iter()
            .map(|level| level.as_str())
            .collect();
        bail!(
            "moving to a {target} needs a destination of the form {}",
            levels.join("/")
        );
    }

    let (mut picker, first) = DestinationPicker::open(client_id, target);
    let mut request = Some(first);
    for (level, segment) in CascadeLevel::ALL.into_iter().zip(segments) {
        let Some(load) = request.take() else {
            break;
        };
        picker.load(store, &load).await;
        if let Some(error) = &picker.level(level).error {
            bail!("could not list {level}s: {error}");
        }
        request = picker.select(level, segment)?;
    }

    if let Some(level) = picker.destination().first_missing(target) {
        bail!("destination has no {level}");
    }
    Ok(picker.destination().clone())
}

// =============================================================================
// TAXONOMY
// =============================================================================

pub async fn run_taxonomy(args: &TaxonomyArgs, config: &AppConfig) -> Result<Outcome> {
    let session = Session::open(&args.plan)?;
    let plan = session.load_plan().await?;
    let id = EntityId::new(args.id.as_str()).context("invalid entity id")?;
    let path = plan
        .locate(&id)
        .ok_or_else(|| anyhow!("entity {id} not found"))?;
    let key = match path.kind() {
        EntityKind::Placement => "PL_Taxonomy_Values",
        EntityKind::Creatif => "CR_Taxonomy_Values",
        other => bail!("a {other} has no taxonomy values"),
    };
    let fields = plan.fields_of(&path).unwrap_or_default();
    let values = fields
        .get(key)
        .and_then(|raw| raw.as_object())
        .map(taxonomy_values)
        .unwrap_or_default();

    let cache = ShortcodeCache::new(&config.naming);
    let rendered = render_taxonomy(&args.template, &values, &cache, &session.store)
        .await
        .map_err(|error| anyhow!(error.user_message()))?;
    Ok(Outcome::ok(rendered))
}

