//! End-to-end tests of the command layer against plan files on disk.

use std::path::{Path, PathBuf};

use clap::Parser;
use mps_cli::cli::Cli;
use mps_cli::commands::{Outcome, run_command};
use mps_cli::config::AppConfig;
use mps_cli::session::{read_seed, write_seed};
use mps_model::{EntityId, PlanData, Placement, Section, Tactique};
use mps_store::{CampaignSeed, OngletSeed, Shortcode, StoreSeed, VersionSeed};
use serde_json::json;
use tempfile::TempDir;

fn id(value: &str) -> EntityId {
    EntityId::new(value).unwrap()
}

fn plan() -> PlanData {
    let mut plan = PlanData::new();
    plan.sections.push(Section::new(id("S1"), "Digital", 0));
    plan.sections.push(Section::new(id("S2"), "TV", 1));
    plan.tactiques.insert(
        id("S1"),
        vec![
            Tactique::new(id("T1"), id("S1"), "Search", 0),
            Tactique::new(id("T2"), id("S1"), "Social", 1),
        ],
    );
    plan.tactiques.insert(
        id("S2"),
        vec![Tactique::new(id("T3"), id("S2"), "Spots", 0)],
    );
    let mut google = Placement::new(id("P1"), id("T1"), "Google", 0);
    google.taxonomy_values.insert(
        "PUB".to_string(),
        json!({ "shortcodeId": "SC1", "format": "code" }),
    );
    google
        .taxonomy_values
        .insert("FMT".to_string(), json!("video"));
    plan.placements.insert(id("T1"), vec![google]);
    plan
}

fn seed() -> StoreSeed {
    StoreSeed {
        client_id: "acme".to_string(),
        campaigns: vec![CampaignSeed {
            id: "C1".to_string(),
            name: "Spring".to_string(),
            versions: vec![VersionSeed {
                id: "V1".to_string(),
                name: "Draft".to_string(),
                onglets: vec![OngletSeed {
                    id: "O1".to_string(),
                    name: "Main".to_string(),
                    plan: plan(),
                }],
            }],
        }],
        shortcodes: vec![Shortcode {
            id: "SC1".to_string(),
            code: "GOOG".to_string(),
            display_name: "Google".to_string(),
        }],
    }
}

struct Fixture {
    _dir: TempDir,
    plan_path: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let plan_path = dir.path().join("plan.json");
        write_seed(&plan_path, &seed()).unwrap();
        Self {
            _dir: dir,
            plan_path,
        }
    }

    fn plan_arg(&self) -> &str {
        self.plan_path.to_str().unwrap()
    }

    fn stored_plan(&self) -> PlanData {
        let seed = read_seed(&self.plan_path).unwrap();
        seed.campaigns[0].versions[0].onglets[0].plan.clone()
    }
}

async fn run(args: &[&str], config: &AppConfig) -> Outcome {
    let cli = Cli::try_parse_from(std::iter::once("mediaplan").chain(args.iter().copied()))
        .unwrap();
    run_command(&cli.command, config).await.unwrap()
}

fn tactique_budget(plan: &PlanData, section: &str, tactique: &str) -> f64 {
    plan.tactiques_of(&id(section))
        .iter()
        .find(|t| t.id.as_str() == tactique)
        .map(|t| t.budget)
        .unwrap()
}

#[tokio::test]
async fn outline_shows_expanded_hierarchy() {
    let fixture = Fixture::new();
    let outcome = run(
        &[
            "rows",
            "--plan",
            fixture.plan_arg(),
            "--level",
            "tactique",
            "--expand-all",
            "--outline",
        ],
        &AppConfig::default(),
    )
    .await;
    assert!(outcome.success);
    insta::assert_snapshot!(outcome.text, @r"
    - Digital [S1]
      * Search [T1]
        - Google [P1]
      * Social [T2]
    - TV [S2]
      * Spots [T3]
    ");
}

#[tokio::test]
async fn collapsed_sections_hide_their_children() {
    let fixture = Fixture::new();
    let outcome = run(
        &["rows", "--plan", fixture.plan_arg(), "--expand", "S2", "--outline"],
        &AppConfig::default(),
    )
    .await;
    assert_eq!(outcome.text, "* Digital [S1]\n* TV [S2]\n  - Spots [T3]");
}

#[tokio::test]
async fn edit_with_write_persists_the_value() {
    let fixture = Fixture::new();
    let outcome = run(
        &["edit", "--plan", fixture.plan_arg(), "T1", "TC_Budget", "250", "--write"],
        &AppConfig::default(),
    )
    .await;
    assert!(outcome.success, "{}", outcome.text);
    assert!(outcome.text.contains("saved"));
    assert_eq!(tactique_budget(&fixture.stored_plan(), "S1", "T1"), 250.0);
}

#[tokio::test]
async fn edit_without_write_leaves_the_file_alone() {
    let fixture = Fixture::new();
    let before = std::fs::read_to_string(&fixture.plan_path).unwrap();
    let outcome = run(
        &["edit", "--plan", fixture.plan_arg(), "T1", "TC_Budget", "250"],
        &AppConfig::default(),
    )
    .await;
    assert!(outcome.success);
    assert_eq!(std::fs::read_to_string(&fixture.plan_path).unwrap(), before);
}

#[tokio::test]
async fn edit_refuses_to_reparent_a_tactique() {
    let fixture = Fixture::new();
    let before = std::fs::read_to_string(&fixture.plan_path).unwrap();
    let outcome = run(
        &["edit", "--plan", fixture.plan_arg(), "T1", "TC_SectionId", "S2", "--write"],
        &AppConfig::default(),
    )
    .await;
    assert!(!outcome.success);
    assert!(outcome.text.contains("TC_SectionId"), "{}", outcome.text);
    assert_eq!(std::fs::read_to_string(&fixture.plan_path).unwrap(), before);
}

#[tokio::test]
async fn invalid_value_is_blocked_when_configured() {
    let fixture = Fixture::new();
    let config_path = fixture.plan_path.with_file_name("config.toml");
    std::fs::write(&config_path, "[table]\nblock_save_on_invalid = true\n").unwrap();
    let config = AppConfig::load(Some(&config_path)).unwrap();

    let outcome = run(
        &["edit", "--plan", fixture.plan_arg(), "T1", "TC_Budget", "lots", "--write"],
        &config,
    )
    .await;
    assert!(!outcome.success);
    assert!(outcome.text.contains("not a valid value"));
    assert_eq!(tactique_budget(&fixture.stored_plan(), "S1", "T1"), 0.0);
}

#[tokio::test]
async fn fill_down_copies_one_field() {
    let fixture = Fixture::new();
    run(
        &["edit", "--plan", fixture.plan_arg(), "T1", "TC_Budget", "90", "--write"],
        &AppConfig::default(),
    )
    .await;
    let outcome = run(
        &["fill-down", "--plan", fixture.plan_arg(), "T1", "TC_Budget", "T2", "T3", "--write"],
        &AppConfig::default(),
    )
    .await;
    assert!(outcome.success, "{}", outcome.text);
    let plan = fixture.stored_plan();
    assert_eq!(tactique_budget(&plan, "S1", "T2"), 90.0);
    assert_eq!(tactique_budget(&plan, "S2", "T3"), 90.0);
}

#[tokio::test]
async fn mixed_selection_is_reported_as_invalid() {
    let fixture = Fixture::new();
    let outcome = run(
        &["analyze", "--plan", fixture.plan_arg(), "S2", "T1"],
        &AppConfig::default(),
    )
    .await;
    assert!(!outcome.success);
    assert!(outcome.text.contains("Cannot move"));
}

#[tokio::test]
async fn move_with_write_relocates_the_tactique() {
    let fixture = Fixture::new();
    let outcome = run(
        &["move", "--plan", fixture.plan_arg(), "T2", "--to", "C1/V1/O1/S2", "--write"],
        &AppConfig::default(),
    )
    .await;
    assert!(outcome.success, "{}", outcome.text);

    let plan = fixture.stored_plan();
    let digital: Vec<&str> = plan
        .tactiques_of(&id("S1"))
        .iter()
        .map(|t| t.label.as_str())
        .collect();
    let tv: Vec<(&str, u32)> = plan
        .tactiques_of(&id("S2"))
        .iter()
        .map(|t| (t.label.as_str(), t.order))
        .collect();
    assert_eq!(digital, vec!["Search"]);
    assert_eq!(tv, vec![("Spots", 0), ("Social", 1)]);
}

#[tokio::test]
async fn move_destination_must_reach_the_parent_level() {
    let fixture = Fixture::new();
    let cli = Cli::try_parse_from([
        "mediaplan",
        "move",
        "--plan",
        fixture.plan_arg(),
        "T2",
        "--to",
        "C1/V1",
    ])
    .unwrap();
    let error = run_command(&cli.command, &AppConfig::default())
        .await
        .unwrap_err();
    assert!(error.to_string().contains("campaign/version/onglet/section"));
}

#[tokio::test]
async fn taxonomy_resolves_shortcodes() {
    let fixture = Fixture::new();
    let outcome = run(
        &["taxonomy", "--plan", fixture.plan_arg(), "P1", "--template", "<PUB>_<FMT>"],
        &AppConfig::default(),
    )
    .await;
    assert_eq!(outcome.text, "GOOG_video");
}

#[test]
fn missing_explicit_config_is_an_error() {
    let dir = TempDir::new().unwrap();
    let missing: &Path = &dir.path().join("absent.toml");
    assert!(AppConfig::load(Some(missing)).is_err());
}
