//! Command-line interface for stagegate.
//!
//! Provides commands for creating projects, following their workflow,
//! approving gates, and viewing artifacts and dashboards.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::adapters::{ApiGateway, HttpGateway};
use crate::config::{self, ResolvedConfig};
use crate::core::render::tree;
use crate::core::{
    approvable_stage, project_view, render, render_stage, GateApprovalCoordinator,
    RenderDescriptor, TreeNode, WorkflowState, WorkflowStateMachine,
};
use crate::domain::{
    Artifact, GateApprovalRequest, GateId, ProjectCreationRequest, ProjectStatus, Value,
};

/// stagegate - client for gated construction project workflows
#[derive(Parser, Debug)]
#[command(name = "stagegate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Backend base URL (overrides config file and STAGEGATE_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a project (the backend runs stage 1 before answering)
    Create {
        /// Project name
        #[arg(long)]
        name: String,

        /// Client name
        #[arg(long)]
        client: String,

        /// Free-text project description
        #[arg(long)]
        description: String,

        /// Project type (residential, commercial, ...)
        #[arg(long = "type", default_value = "residential")]
        project_type: String,

        /// Budget range, e.g. "$750,000 - $1,200,000"
        #[arg(long)]
        budget: String,

        /// Site location
        #[arg(long)]
        location: String,

        /// Desired features (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        features: Vec<String>,
    },

    /// List project IDs
    Projects,

    /// Show the stage table of a project
    Status {
        /// Project ID
        project_id: String,
    },

    /// Show a project's artifacts
    Show {
        /// Project ID
        project_id: String,

        /// Only show this stage
        #[arg(short, long)]
        stage: Option<u32>,

        /// Write decoded images into this directory
        #[arg(long)]
        save_images: Option<PathBuf>,
    },

    /// Approve (or reject) the pending gate of a project
    Approve {
        /// Project ID
        project_id: String,

        /// Gate ID (e.g. G0)
        gate_id: String,

        /// Who is approving
        #[arg(long, default_value = "user")]
        by: String,

        /// Approval comments
        #[arg(short, long, default_value = "Approved by user")]
        comments: String,

        /// Record a rejection instead of an approval
        #[arg(long)]
        reject: bool,
    },

    /// Fetch and render a single artifact file
    Artifact {
        /// Project ID
        project_id: String,

        /// Stage ID
        stage_id: u32,

        /// Artifact file name
        name: String,

        /// Write a decoded image to this path
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Show the risk register
    Risks {
        /// Project ID
        project_id: String,
    },

    /// Show the cost and schedule baseline
    Financials {
        /// Project ID
        project_id: String,
    },

    /// Show lessons learned
    Knowledge {
        /// Project ID
        project_id: String,
    },

    /// Check that the backend is reachable
    Health,

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let config = resolve_config(self.api_url)?;

        match self.command {
            Commands::Create {
                name,
                client,
                description,
                project_type,
                budget,
                location,
                features,
            } => {
                let request = ProjectCreationRequest {
                    project_name: name,
                    client_name: client,
                    project_description: description,
                    project_type,
                    budget_range: budget,
                    location,
                    desired_features: features,
                };
                create_project(&config, request).await
            }
            Commands::Projects => list_projects(&config).await,
            Commands::Status { project_id } => show_status(&config, &project_id).await,
            Commands::Show {
                project_id,
                stage,
                save_images,
            } => show_artifacts(&config, &project_id, stage, save_images.as_deref()).await,
            Commands::Approve {
                project_id,
                gate_id,
                by,
                comments,
                reject,
            } => {
                let request = if reject {
                    GateApprovalRequest::reject(by, comments)
                } else {
                    GateApprovalRequest::approve(by, comments)
                };
                approve_gate(&config, &project_id, &gate_id, request).await
            }
            Commands::Artifact {
                project_id,
                stage_id,
                name,
                save,
            } => show_artifact(&config, &project_id, stage_id, &name, save.as_deref()).await,
            Commands::Risks { project_id } => show_risks(&config, &project_id).await,
            Commands::Financials { project_id } => show_financials(&config, &project_id).await,
            Commands::Knowledge { project_id } => show_knowledge(&config, &project_id).await,
            Commands::Health => health(&config).await,
            Commands::Config => show_config(&config),
        }
    }
}

/// Resolved config with the command-line override applied
fn resolve_config(api_url: Option<String>) -> Result<ResolvedConfig> {
    let mut config = config::config()?.clone();
    if let Some(url) = api_url {
        config.api.base_url = url;
    }
    Ok(config)
}

fn gateway(config: &ResolvedConfig) -> Result<Arc<HttpGateway>> {
    Ok(Arc::new(HttpGateway::from_settings(&config.api)?))
}

fn state_machine(config: &ResolvedConfig) -> Result<Arc<WorkflowStateMachine>> {
    let gateway: Arc<dyn ApiGateway> = gateway(config)?;
    Ok(Arc::new(WorkflowStateMachine::new(
        gateway,
        Arc::new(config.stage_gates.clone()),
    )))
}

/// Load a project through the state machine; fails on the `Error` state
async fn load_project(
    machine: &WorkflowStateMachine,
    project_id: &str,
) -> Result<Arc<ProjectStatus>> {
    match machine.request_load(project_id).await {
        Some(WorkflowState::Loaded(status)) => Ok(status),
        Some(WorkflowState::Error { message, .. }) => {
            anyhow::bail!("Failed to load project {}: {}", project_id, message)
        }
        other => anyhow::bail!("Unexpected workflow state after load: {:?}", other),
    }
}

async fn create_project(config: &ResolvedConfig, request: ProjectCreationRequest) -> Result<()> {
    let created = gateway(config)?
        .create_project(&request)
        .await
        .context("Failed to create project")?;

    println!("{}", created.project_id);
    if !created.message.is_empty() {
        eprintln!("\n[{}]", created.message);
    }
    Ok(())
}

async fn list_projects(config: &ResolvedConfig) -> Result<()> {
    let list = gateway(config)?
        .list_projects()
        .await
        .context("Failed to list projects")?;

    if list.projects.is_empty() {
        println!("No projects found");
        return Ok(());
    }
    for project_id in list.projects {
        println!("{}", project_id);
    }
    Ok(())
}

async fn show_status(config: &ResolvedConfig, project_id: &str) -> Result<()> {
    let machine = state_machine(config)?;
    let status = load_project(&machine, project_id).await?;
    print_stage_table(&status, &machine);
    Ok(())
}

fn print_stage_table(status: &ProjectStatus, machine: &WorkflowStateMachine) {
    println!("Project: {}", status.project_id());
    println!(
        "Pending gate: {}",
        status.pending_gate().map(GateId::as_str).unwrap_or("none")
    );
    println!(
        "\n{:<4} {:<42} {:<10} {:<10} {:<10}",
        "ID", "STAGE", "STATUS", "ARTIFACTS", "ACTION"
    );
    println!("{}", "-".repeat(80));

    for view in project_view(status, machine.stage_gates()) {
        let action = view
            .approval_gate
            .map(|gate| format!("approve {}", gate))
            .unwrap_or_default();
        println!(
            "{:<4} {:<42} {:<10} {:<10} {:<10}",
            view.stage_id,
            view.name,
            view.status.as_str(),
            view.artifact_count,
            action
        );
    }
}

async fn show_artifacts(
    config: &ResolvedConfig,
    project_id: &str,
    only_stage: Option<u32>,
    save_images: Option<&Path>,
) -> Result<()> {
    let machine = state_machine(config)?;
    let status = load_project(&machine, project_id).await?;

    if let Some(stage_id) = only_stage {
        if status.stage(stage_id).is_none() {
            anyhow::bail!("Project {} has no stage {}", project_id, stage_id);
        }
    }

    if let Some(dir) = save_images {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }

    for stage in status
        .stages()
        .iter()
        .filter(|s| only_stage.map_or(true, |id| s.stage_id == id))
    {
        println!(
            "== Stage {}: {} [{}]",
            stage.stage_id,
            stage.name,
            stage.status.as_str()
        );
        if stage.artifacts.is_empty() {
            println!("  (no artifacts)");
            continue;
        }

        for (index, (name, descriptor)) in render_stage(stage).into_iter().enumerate() {
            let saved = match (&descriptor, save_images) {
                (RenderDescriptor::RawImage(bytes), Some(dir)) => {
                    let path = dir.join(image_file_name(stage.stage_id, index, name, bytes));
                    write_image(&path, bytes)?;
                    Some(path)
                }
                _ => None,
            };
            print_descriptor(name, &descriptor, saved.as_deref());
        }
        println!();
    }

    Ok(())
}

async fn approve_gate(
    config: &ResolvedConfig,
    project_id: &str,
    gate_id: &str,
    request: GateApprovalRequest,
) -> Result<()> {
    let gate_id: GateId = gate_id.parse()?;
    let machine = state_machine(config)?;
    let status = load_project(&machine, project_id).await?;

    if let Some(view) = approvable_stage(&status, machine.stage_gates()) {
        eprintln!(
            "[Stage {} ({}) is waiting on gate {}]",
            view.stage_id,
            view.name,
            status.pending_gate().map(GateId::as_str).unwrap_or("none")
        );
    }

    let coordinator = GateApprovalCoordinator::new(machine.clone());
    coordinator
        .approve(project_id, &gate_id, &request)
        .await
        .with_context(|| format!("Failed to approve gate {} for project {}", gate_id, project_id))?;

    let verb = if request.approved { "approved" } else { "rejected" };
    eprintln!("[Gate {} {}]\n", gate_id, verb);

    match machine.current() {
        WorkflowState::Loaded(status) => print_stage_table(&status, &machine),
        WorkflowState::Error { message, .. } => {
            eprintln!("[Reload after approval failed: {}]", message);
            eprintln!("[Run `stagegate status {}` to retry]", project_id);
        }
        other => eprintln!("[Workflow state: {}]", other.name()),
    }

    Ok(())
}

async fn show_artifact(
    config: &ResolvedConfig,
    project_id: &str,
    stage_id: u32,
    name: &str,
    save: Option<&Path>,
) -> Result<()> {
    let artifact: Artifact = gateway(config)?
        .get_artifact(project_id, stage_id, name)
        .await
        .with_context(|| format!("Failed to fetch artifact {} of stage {}", name, stage_id))?;

    let descriptor = render(&artifact);
    let saved = match (&descriptor, save) {
        (RenderDescriptor::RawImage(bytes), Some(path)) => {
            write_image(path, bytes)?;
            Some(path)
        }
        _ => None,
    };
    print_descriptor(&artifact.name, &descriptor, saved);
    Ok(())
}

async fn show_risks(config: &ResolvedConfig, project_id: &str) -> Result<()> {
    let summary = gateway(config)?
        .get_risks(project_id)
        .await
        .context("Failed to fetch risk summary")?;

    if summary.risk_register.is_empty() {
        println!("No risks recorded");
        return Ok(());
    }

    for (idx, risk) in summary.risk_register.iter().enumerate() {
        println!("{}. [{}] {}", idx + 1, risk.risk_category, risk.risk_description);
        if !risk.mitigation_strategy.is_empty() {
            println!("   Mitigation: {}", risk.mitigation_strategy);
        }
    }
    Ok(())
}

async fn show_financials(config: &ResolvedConfig, project_id: &str) -> Result<()> {
    let summary = gateway(config)?
        .get_financials(project_id)
        .await
        .context("Failed to fetch financial summary")?;

    match summary.total_estimated_cost_usd {
        Some(cost) => println!("Total estimated cost: ${:.2}", cost),
        None => println!("Total estimated cost: unknown"),
    }
    match summary.estimated_duration_weeks {
        Some(weeks) => println!("Estimated duration: {} weeks", weeks),
        None => println!("Estimated duration: unknown"),
    }

    if let Some(Value::Mapping(breakdown)) = &summary.cost_breakdown {
        println!("\nCost breakdown:");
        print_tree(&tree(breakdown), 1);
    }

    if !summary.key_phases.is_empty() {
        println!("\nKey phases:");
        for phase in &summary.key_phases {
            println!("  - {}", phase.to_display_text());
        }
    }
    Ok(())
}

async fn show_knowledge(config: &ResolvedConfig, project_id: &str) -> Result<()> {
    let summary = gateway(config)?
        .get_knowledge(project_id)
        .await
        .context("Failed to fetch knowledge summary")?;

    if let Some(text) = &summary.lessons_learned_summary {
        println!("{}\n", text);
    }
    for (title, items) in [
        ("Key successes", &summary.key_successes),
        ("Challenges encountered", &summary.challenges_encountered),
        ("Actionable lessons", &summary.actionable_lessons),
    ] {
        if items.is_empty() {
            continue;
        }
        println!("{}:", title);
        for item in items {
            println!("  - {}", item.to_display_text());
        }
    }
    Ok(())
}

async fn health(config: &ResolvedConfig) -> Result<()> {
    gateway(config)?
        .health_check()
        .await
        .with_context(|| format!("Backend not reachable at {}", config.api.base_url))?;
    println!("ok: {}", config.api.base_url);
    Ok(())
}

fn show_config(config: &ResolvedConfig) -> Result<()> {
    println!("API base URL: {}", config.api.base_url);
    println!("Timeout: {}s", config.api.timeout_seconds);
    match &config.config_file {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: (none, using defaults)"),
    }
    println!("\nStage gates:");
    for (stage_id, gate) in config.stage_gates.iter() {
        println!("  stage {:<3} -> {}", stage_id, gate);
    }
    Ok(())
}

fn print_descriptor(name: &str, descriptor: &RenderDescriptor, saved: Option<&Path>) {
    match descriptor {
        RenderDescriptor::RawImage(bytes) => match saved {
            Some(path) => println!("  {} [image, {} bytes] -> {}", name, bytes.len(), path.display()),
            None => println!("  {} [image, {} bytes]", name, bytes.len()),
        },
        RenderDescriptor::ExternalLink { url, label } => {
            println!("  {} [link] {}: {}", name, label, url)
        }
        RenderDescriptor::StructuredTree(nodes) => {
            println!("  {}:", name);
            print_tree(nodes, 2);
        }
        RenderDescriptor::PlainText(text) => {
            println!("  {}:", name);
            for line in text.lines() {
                println!("    {}", line);
            }
        }
        RenderDescriptor::Unsupported(reason) => println!("  {} [{}]", name, reason),
    }
}

fn print_tree(nodes: &[TreeNode], depth: usize) {
    let indent = "  ".repeat(depth);
    for node in nodes {
        match node {
            TreeNode::Row { label, value } => println!("{}{}: {}", indent, label, value),
            TreeNode::Group { label, children } => {
                println!("{}{}:", indent, label);
                print_tree(children, depth + 1);
            }
            TreeNode::List { label, items } => {
                println!("{}{}:", indent, label);
                print_tree(items, depth + 1);
            }
            TreeNode::Item(text) => println!("{}- {}", indent, text),
        }
    }
}

fn write_image(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes)
        .with_context(|| format!("Failed to write image: {}", path.display()))
}

/// File name for a decoded image: "<stage>_<n>_<stem>.<ext>", where `n` is
/// the artifact's 1-based position in its stage (stems repeat, e.g.
/// `plan.png` next to `plan.json`) and the extension is sniffed from the bytes
fn image_file_name(stage_id: u32, index: usize, artifact_name: &str, bytes: &[u8]) -> String {
    let stem = Path::new(artifact_name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "artifact".to_string());
    format!("{}_{}_{}.{}", stage_id, index + 1, stem, image_extension(bytes))
}

fn image_extension(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        "png"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "jpg"
    } else if bytes.starts_with(b"GIF8") {
        "gif"
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "webp"
    } else {
        "bin"
    }
}
