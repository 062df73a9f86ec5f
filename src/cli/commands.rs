use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::application::camera::Camera;
use crate::application::controller::{ClickOutcome, InteractionController};
use crate::application::services::{sample_records, LoadedDataset};
use crate::application::transition::Frame;
use crate::application::ApplicationError;
use crate::cli::args::{Cli, Commands, ConfigCommands, OutputFormat};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::builder::TreeBuilder;
use crate::domain::record::normalize;
use crate::domain::{DomainError, TreeArena, TreeNodeConvert};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let project_dir = resolve_project_dir(cli.project_dir.as_deref())?;
    debug!("project_dir: {}", project_dir.display());

    match &cli.command {
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        Some(Commands::Config { command }) => _config(command, &project_dir),
        Some(command) => {
            let container =
                ServiceContainer::new(Settings::load(Some(&project_dir))?, &project_dir);
            match command {
                Commands::Tree { all, toggle } => _tree(&container, *all, toggle),
                Commands::Layout { format, toggle } => _layout(&container, *format, toggle),
                Commands::Click { ids, format } => _click(&container, ids, *format),
                Commands::Simulate { ids, fps, demo } => _simulate(&container, ids, *fps, *demo),
                Commands::Info => _info(&container),
                Commands::Export { sheet, write } => _export(&container, sheet.as_deref(), *write),
                Commands::Sync { url } => _sync(&container, url.as_deref()),
                Commands::Completion { .. } | Commands::Config { .. } => Ok(()),
            }
        }
        None => {
            let container =
                ServiceContainer::new(Settings::load(Some(&project_dir))?, &project_dir);
            _tree(&container, false, &[])
        }
    }
}

fn resolve_project_dir(project_dir: Option<&Path>) -> CliResult<PathBuf> {
    match project_dir {
        Some(dir) if dir.is_dir() => Ok(dir.to_path_buf()),
        Some(dir) => Err(CliError::InvalidArgs(format!(
            "not a directory: {}",
            dir.display()
        ))),
        None => std::env::current_dir().map_err(|e| InfraError::io("current directory", e).into()),
    }
}

fn load(container: &ServiceContainer) -> CliResult<LoadedDataset> {
    let dataset = container.source_chain().load()?;
    if !dataset.report.is_clean() {
        output::warning(&format!(
            "{} record(s) not shown, run `mindmap info` for details",
            dataset.report.detached.len() + dataset.report.unreachable
        ));
    }
    Ok(dataset)
}

/// Flip the given nodes in order, as repeated clicks would.
fn apply_toggles(tree: &mut TreeArena, ids: &[String]) -> CliResult<()> {
    for id in ids {
        let idx = tree
            .find(id)
            .ok_or_else(|| DomainError::UnknownNode(id.clone()))?;
        let visibility = tree
            .toggle(idx)
            .ok_or_else(|| DomainError::NotExpandable(id.clone()))?;
        debug!(%id, ?visibility, "toggled");
    }
    Ok(())
}

fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> CliResult<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    rendered.map_err(|e| {
        ApplicationError::OperationFailed {
            context: "serialize output".to_string(),
            source: Box::new(e),
        }
        .into()
    })
}

#[instrument(skip(container))]
fn _tree(container: &ServiceContainer, all: bool, toggle: &[String]) -> CliResult<()> {
    let mut dataset = load(container)?;
    apply_toggles(&mut dataset.tree, toggle)?;

    output::header(&dataset.provenance);
    let rendered = if all {
        dataset.tree.to_full_tree_string()
    } else {
        dataset.tree.to_tree_string()
    };
    output::info(&rendered);
    Ok(())
}

#[instrument(skip(container))]
fn _layout(container: &ServiceContainer, format: OutputFormat, toggle: &[String]) -> CliResult<()> {
    let mut dataset = load(container)?;
    apply_toggles(&mut dataset.tree, toggle)?;
    let controller = InteractionController::new(dataset.tree, container.settings.view_options());
    let layout = controller.layout();

    match format {
        OutputFormat::Json => output::info(&to_json(layout, true)?),
        OutputFormat::Text => {
            output::header(&format!("{} nodes", layout.len()));
            for card in controller.cards() {
                let Some(placed) = layout.get(&card.id) else {
                    continue;
                };
                let badge = match card.badge {
                    Some(badge) => format!(" {badge:?}"),
                    None => String::new(),
                };
                output::detail(&format!(
                    "{:indent$}{} ({:.0}, {:.0}) {:.0}x{:.0} \"{}\"{}",
                    "",
                    placed.id,
                    placed.position.x,
                    placed.position.y,
                    placed.width,
                    placed.height,
                    card.title,
                    badge,
                    indent = placed.depth * 2
                ));
            }
            output::header(&format!("{} edges", layout.edges.len()));
            for edge in &layout.edges {
                output::detail(&format!(
                    "{} -> {}: {}",
                    edge.from_id,
                    edge.to_id,
                    edge.curve.to_svg()
                ));
            }
        }
    }
    Ok(())
}

#[instrument(skip(container))]
fn _click(container: &ServiceContainer, ids: &[String], format: OutputFormat) -> CliResult<()> {
    let dataset = load(container)?;
    let mut controller =
        InteractionController::new(dataset.tree, container.settings.view_options());

    let mut outcomes = Vec::with_capacity(ids.len());
    for id in ids {
        let outcome = controller.click(id)?;
        settle(&mut controller);
        outcomes.push(outcome);
    }

    match format {
        OutputFormat::Json => output::info(&to_json(&outcomes, true)?),
        OutputFormat::Text => {
            for outcome in &outcomes {
                match outcome {
                    ClickOutcome::Toggled { id, visibility } => {
                        output::action("Toggled", &format!("{id} -> {visibility:?}"))
                    }
                    ClickOutcome::DetailOpened(detail) => {
                        output::action("Detail", &detail.name);
                        output::field("description", &detail.description);
                        if let Some(image) = &detail.image_url {
                            output::field("image", image);
                        }
                        if let Some(link) = &detail.link {
                            output::field("link", link);
                        }
                    }
                    ClickOutcome::LinkRequested { id, url } => {
                        output::action("Link", &format!("{id} -> {url}"))
                    }
                    ClickOutcome::Ignored => output::detail("ignored"),
                }
            }
            output::info(&controller.tree().to_tree_string());
        }
    }
    Ok(())
}

/// Run all animations to their end.
fn settle(controller: &mut InteractionController) {
    while controller.is_animating() {
        controller.tick(f32::MAX);
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulationStep<'a> {
    step: usize,
    elapsed_ms: f32,
    clicked: Option<&'a str>,
    outcome: Option<&'a ClickOutcome>,
    camera: Camera,
    frame: &'a Frame,
}

/// Fixed-rate frame printer, one JSON line per frame.
struct Simulation {
    controller: InteractionController,
    dt_ms: f32,
    step: usize,
    elapsed_ms: f32,
}

impl Simulation {
    fn emit(&mut self, clicked: Option<&str>, outcome: Option<&ClickOutcome>) -> CliResult<()> {
        let frame = self.controller.frame();
        let line = SimulationStep {
            step: self.step,
            elapsed_ms: self.elapsed_ms,
            clicked,
            outcome,
            camera: self.controller.camera(),
            frame: &frame,
        };
        output::info(&to_json(&line, false)?);
        self.step += 1;
        Ok(())
    }

    fn run_until_settled(&mut self) -> CliResult<()> {
        while self.controller.is_animating() {
            self.controller.tick(self.dt_ms);
            self.elapsed_ms += self.dt_ms;
            self.emit(None, None)?;
        }
        Ok(())
    }

    fn click(&mut self, id: &str) -> CliResult<()> {
        let outcome = self.controller.click(id)?;
        self.emit(Some(id), Some(&outcome))?;
        self.run_until_settled()
    }
}

#[instrument(skip(container))]
fn _simulate(container: &ServiceContainer, ids: &[String], fps: u32, demo: bool) -> CliResult<()> {
    if fps == 0 {
        return Err(CliError::InvalidArgs("fps must be positive".to_string()));
    }
    let tree = if demo {
        let mut builder = TreeBuilder::new().with_collapse_depth(container.settings.collapse_depth);
        builder
            .build(&normalize(&sample_records()))
            .ok_or(DomainError::EmptyHierarchy)?
    } else {
        load(container)?.tree
    };
    let mut simulation = Simulation {
        controller: InteractionController::new(tree, container.settings.view_options()),
        dt_ms: 1000.0 / fps as f32,
        step: 0,
        elapsed_ms: 0.0,
    };

    simulation.emit(None, None)?;
    simulation.run_until_settled()?;
    for id in ids {
        simulation.click(id)?;
    }
    Ok(())
}

#[instrument(skip(container))]
fn _info(container: &ServiceContainer) -> CliResult<()> {
    let dataset = load(container)?;
    let tree = &dataset.tree;
    let data_path = container.data_path();

    output::header("Data");
    output::field("source", &dataset.provenance);
    output::field(
        "last sync",
        dataset.synced_at.as_deref().unwrap_or("unknown"),
    );
    output::field(
        "data file",
        &format!(
            "{} ({})",
            data_path.display(),
            if container.fs.is_file(&data_path) {
                "present"
            } else {
                "missing"
            }
        ),
    );

    output::header("Hierarchy");
    if let Some(root) = tree.root_node() {
        output::field("root", &format!("{} ({})", root.data.name, root.data.id));
    }
    output::field("records", &dataset.record_count);
    output::field("nodes", &tree.len());
    output::field("visible", &tree.visible_ids().len());
    output::field("depth", &tree.depth());
    output::field("leaves", &tree.leaf_nodes().len());

    let report = &dataset.report;
    if report.is_clean() {
        output::success("all records attached");
        return Ok(());
    }
    output::header("Diagnostics");
    if !report.detached.is_empty() {
        output::field("detached", &report.detached.iter().join(", "));
    }
    if !report.self_parented.is_empty() {
        output::field("self-parented", &report.self_parented.iter().join(", "));
    }
    if !report.duplicates.is_empty() {
        output::field("duplicates", &report.duplicates.iter().join(", "));
    }
    if report.unreachable > 0 {
        output::field("unreachable", &report.unreachable);
    }
    Ok(())
}

#[instrument(skip(container))]
fn _export(container: &ServiceContainer, sheet: Option<&Path>, write: bool) -> CliResult<()> {
    let sheet = sheet
        .map(Path::to_path_buf)
        .or_else(|| container.settings.sheet_path(&container.project_dir));
    let service = container.export_service();
    let response = service.export(sheet.as_deref());

    if !write {
        output::info(&to_json(&response, true)?);
        return Ok(());
    }
    if let Some(error) = response.error() {
        return Err(ApplicationError::Payload {
            message: error.to_string(),
        }
        .into());
    }
    let path = service.write(&response, &container.data_path())?;
    output::success(&format!(
        "Exported {} nodes to {}",
        response.nodes().len(),
        path.display()
    ));
    Ok(())
}

#[instrument(skip(container))]
fn _sync(container: &ServiceContainer, url: Option<&str>) -> CliResult<()> {
    let url = url
        .or(container.settings.sync.url.as_deref())
        .unwrap_or_default();
    let outcome = container
        .sync_service()
        .sync(url, &container.data_path())?;

    output::success(&format!("Sync successful: {} nodes", outcome.node_count));
    output::field("timestamp", &outcome.timestamp);
    output::field("data file", &outcome.path.display());
    if outcome.flat_list {
        output::field("format", "flat list");
    }
    Ok(())
}

#[instrument]
fn _config(command: &ConfigCommands, project_dir: &Path) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(Some(project_dir))?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => {
            let describe = |path: &Path| {
                let state = if path.exists() { "exists" } else { "not found" };
                format!("{} ({})", path.display(), state)
            };
            match global_config_path() {
                Some(path) => output::field("global", &describe(&path)),
                None => output::field("global", "unavailable"),
            }
            output::field("local", &describe(&local_config_path(project_dir)));
        }
        ConfigCommands::Template => output::info(&Settings::template()),
    }
    Ok(())
}
