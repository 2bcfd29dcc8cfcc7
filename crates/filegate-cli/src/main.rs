//! Filegate CLI
//!
//! Guided file intake from the terminal: validate, transfer, configure,
//! process, and share through a QR code.

mod config;
mod media;
mod progress;
mod qr;
mod session;

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;
use filegate_core::{
    CandidateStatus, CodeImageEncoder, CompletedArtifact, ConfigurationError, DraftSummary,
    FileCandidate, FileDescriptor, Notification, Passphrase, RuntimeError, SessionState,
    TransformStep, WorkflowError, WorkflowEvent, WorkflowHandle, WorkflowRuntime,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

use config::Config;
use progress::{ProcessingSpinner, TransferProgress, format_bytes, format_duration};
use qr::TerminalQrEncoder;
use session::LocalSession;

/// Attempts at entering an acceptable passphrase
const MAX_PASSWORD_ATTEMPTS: usize = 3;

/// Filegate - guided file intake with scannable access references
#[derive(Parser)]
#[command(name = "filegate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path (default: ~/.config/filegate/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transfer and process a file, then print its access reference
    Send {
        /// File to send
        #[arg(required = true)]
        file: PathBuf,

        /// Compress the file
        #[arg(long)]
        compress: bool,

        /// Encrypt the file (prompts for a password)
        #[arg(long)]
        encrypt: bool,

        /// Name of the processed file (defaults to the original name)
        #[arg(short, long)]
        output_name: Option<String>,

        /// Save the QR code as SVG
        #[arg(long)]
        qr_out: Option<PathBuf>,

        /// Don't print the QR code
        #[arg(long)]
        no_qr: bool,
    },

    /// Check whether a file would be accepted
    Check {
        /// File to check
        #[arg(required = true)]
        file: PathBuf,

        /// Apply the profile-image rules instead of the general ones
        #[arg(long)]
        profile_image: bool,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Options of the `send` command
struct SendOptions {
    file: PathBuf,
    compress: bool,
    encrypt: bool,
    output_name: Option<String>,
    qr_out: Option<PathBuf>,
    no_qr: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);

    if let Commands::Config { action } = &cli.command {
        init_logging(cli.verbose, "info");
        return run_config_action(action, &config_path);
    }

    // An explicit path must exist; the default one may be missing
    let config = if cli.config.is_some() {
        Config::load(&config_path)
            .with_context(|| format!("Failed to load config {}", config_path.display()))?
    } else {
        Config::load_or_default(&config_path)?
    };

    init_logging(cli.verbose, &config.logging.level);
    config.validate().context("Invalid configuration")?;

    match cli.command {
        Commands::Send {
            file,
            compress,
            encrypt,
            output_name,
            qr_out,
            no_qr,
        } => {
            let options = SendOptions {
                file,
                compress,
                encrypt,
                output_name,
                qr_out,
                no_qr,
            };
            send_file(&options, &config).await?;
        }
        Commands::Check {
            file,
            profile_image,
        } => {
            check_file(&file, profile_image, &config)?;
        }
        Commands::Config { .. } => {}
    }

    Ok(())
}

fn init_logging(verbose: bool, level: &str) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Describe a file on disk for intake
fn describe_file(path: &Path) -> anyhow::Result<FileDescriptor> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("File not found: {}", path.display()))?;
    if !metadata.is_file() {
        anyhow::bail!("Not a regular file: {}", path.display());
    }

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown");

    Ok(FileDescriptor::new(
        name,
        metadata.len(),
        media::media_type_for_path(path),
    ))
}

fn print_descriptor(descriptor: &FileDescriptor) {
    println!(
        "{} {}",
        media::glyph(&descriptor.media_type),
        style(&descriptor.name).bold()
    );
    println!("Size: {}", format_bytes(descriptor.byte_size));
    println!("Type: {}", descriptor.media_type);
}

/// Check a file against the intake rules
fn check_file(file: &Path, profile_image: bool, config: &Config) -> anyhow::Result<()> {
    let descriptor = describe_file(file)?;
    let workflow = config.to_workflow_config()?;
    let (policy, rules) = if profile_image {
        (&workflow.profile_image, "profile image")
    } else {
        (&workflow.intake, "general")
    };

    print_descriptor(&descriptor);

    policy
        .validate(&descriptor)
        .with_context(|| format!("{} rejected ({rules} rules)", descriptor.name))?;

    println!("{} Accepted ({rules} rules)", style("✓").green());
    Ok(())
}

/// Run the whole workflow for one file
async fn send_file(options: &SendOptions, config: &Config) -> anyhow::Result<()> {
    let descriptor = describe_file(&options.file)?;
    let workflow = config.to_workflow_config()?;
    let session =
        SessionState::from_provider(&LocalSession::new(config.session.user.as_deref()));

    tracing::info!(
        "Sending {:?} as '{}' (compress: {}, encrypt: {})",
        options.file,
        session.user_label,
        options.compress,
        options.encrypt
    );

    print_descriptor(&descriptor);
    println!();

    let (runtime, handle) = WorkflowRuntime::new(workflow, session);
    let runtime_task = tokio::spawn(runtime.run());
    let mut notifications = handle.subscribe();

    let result = run_workflow(&handle, &mut notifications, options, descriptor, config).await;

    // Always end the session; the runtime stops afterwards
    if let Err(err) = handle.dispatch(WorkflowEvent::Logout).await {
        tracing::debug!("Logout after send: {}", err);
    }
    runtime_task.await.context("Workflow runtime panicked")?;

    result
}

async fn run_workflow(
    handle: &WorkflowHandle,
    notifications: &mut broadcast::Receiver<Notification>,
    options: &SendOptions,
    descriptor: FileDescriptor,
    config: &Config,
) -> anyhow::Result<()> {
    handle
        .dispatch(WorkflowEvent::SelectFile(descriptor))
        .await
        .context("File rejected")?;

    let candidate = loop {
        if let Notification::CandidateAccepted(candidate) = next_notification(notifications).await? {
            break candidate;
        }
    };

    transfer(handle, notifications, &candidate).await?;

    handle
        .dispatch(WorkflowEvent::Designate(candidate.id()))
        .await?;
    if options.compress {
        handle.dispatch(WorkflowEvent::SetCompress(true)).await?;
    }
    if options.encrypt {
        handle.dispatch(WorkflowEvent::SetEncrypt(true)).await?;
    }
    if let Some(name) = &options.output_name {
        handle
            .dispatch(WorkflowEvent::SetOutputName(name.clone()))
            .await?;
    }

    if let Some(draft) = latest_draft(notifications) {
        print_draft(&draft);
    }

    submit(handle, options.encrypt).await?;

    let artifact = process(handle, notifications, &candidate).await?;
    print_artifact(&artifact);

    if options.no_qr && options.qr_out.is_none() {
        return Ok(());
    }

    let image = TerminalQrEncoder::new(config.artifact.qr_size)
        .encode(artifact.reference.as_str())
        .context("Failed to generate QR code")?;

    if !options.no_qr {
        println!();
        println!("{}", image.preview);
    }

    if let Some(path) = &options.qr_out {
        std::fs::write(path, &image.export)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("QR code saved to: {} ({})", path.display(), image.export_media_type);
    }

    Ok(())
}

/// Follow the transfer until it succeeds; Ctrl+C aborts it
async fn transfer(
    handle: &WorkflowHandle,
    notifications: &mut broadcast::Receiver<Notification>,
    candidate: &FileCandidate,
) -> anyhow::Result<()> {
    let progress = TransferProgress::new(candidate.name(), candidate.byte_size());

    loop {
        tokio::select! {
            notification = next_notification(notifications) => {
                let Notification::Progress(update) = notification? else {
                    continue;
                };
                if update.candidate != candidate.id() {
                    continue;
                }

                progress.update(&update);
                if progress.is_finished() {
                    return match update.status {
                        CandidateStatus::Failed(err) => {
                            Err(anyhow::anyhow!("Transfer of {} failed: {err}", candidate.name()))
                        }
                        _ => Ok(()),
                    };
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, aborting transfer of {}", candidate.id());
                handle
                    .dispatch(WorkflowEvent::AbortTransfer(candidate.id()))
                    .await?;
            }
        }
    }
}

/// Submit the draft, prompting again while the password is too weak
async fn submit(handle: &WorkflowHandle, encrypt: bool) -> anyhow::Result<()> {
    for attempt in 1..=MAX_PASSWORD_ATTEMPTS {
        if encrypt {
            let Some(password) = prompt_password()? else {
                eprintln!("{} Passwords do not match", style("✗").red());
                continue;
            };
            let passphrase = Passphrase::new(password.as_str());
            handle
                .dispatch(WorkflowEvent::SetPassword(Some(passphrase)))
                .await?;
        }

        match handle.dispatch(WorkflowEvent::Submit).await {
            Ok(()) => return Ok(()),
            Err(RuntimeError::Workflow(WorkflowError::Configuration(
                err @ ConfigurationError::WeakPassword { .. },
            ))) if attempt < MAX_PASSWORD_ATTEMPTS => {
                eprintln!("{} {}", style("✗").red(), err);
            }
            Err(err) => return Err(err).context("Submission rejected"),
        }
    }

    anyhow::bail!("Submission rejected after {MAX_PASSWORD_ATTEMPTS} attempts")
}

/// Read a password twice; `None` if the entries differ
fn prompt_password() -> anyhow::Result<Option<Zeroizing<String>>> {
    let password = Zeroizing::new(
        rpassword::prompt_password("Password: ").context("Failed to read password")?,
    );
    let confirm = Zeroizing::new(
        rpassword::prompt_password("Confirm password: ").context("Failed to read password")?,
    );

    Ok((*password == *confirm).then_some(password))
}

/// Wait for processing to finish; Ctrl+C cancels it
async fn process(
    handle: &WorkflowHandle,
    notifications: &mut broadcast::Receiver<Notification>,
    candidate: &FileCandidate,
) -> anyhow::Result<CompletedArtifact> {
    let spinner = ProcessingSpinner::start(format!("Processing {}", candidate.name()));
    let started = Instant::now();

    loop {
        tokio::select! {
            notification = next_notification(notifications) => {
                if let Notification::Completed(artifact) = notification? {
                    spinner.finish_with_message(format!(
                        "Processed in {}",
                        format_duration(started.elapsed())
                    ));
                    return Ok(artifact);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                spinner.abandon();
                handle.dispatch(WorkflowEvent::Cancel).await?;
                anyhow::bail!("Processing of {} cancelled", candidate.name());
            }
        }
    }
}

/// Next notification, skipping over lag
async fn next_notification(
    notifications: &mut broadcast::Receiver<Notification>,
) -> anyhow::Result<Notification> {
    loop {
        match notifications.recv().await {
            Ok(notification) => return Ok(notification),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("Display lagged, skipped {} notifications", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => {
                anyhow::bail!("Workflow runtime stopped unexpectedly");
            }
        }
    }
}

/// Most recent draft among the queued notifications
fn latest_draft(notifications: &mut broadcast::Receiver<Notification>) -> Option<DraftSummary> {
    let mut latest = None;
    while let Ok(notification) = notifications.try_recv() {
        if let Notification::DraftChanged(summary) = notification {
            latest = Some(summary);
        }
    }
    latest
}

fn describe_steps(steps: &[TransformStep]) -> String {
    if steps.is_empty() {
        return "none".to_string();
    }
    steps
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" → ")
}

fn print_draft(draft: &DraftSummary) {
    println!("Output name: {}", draft.output_name);
    println!("Pipeline: {}", describe_steps(&draft.steps));
    if let Some(estimate) = draft.estimate {
        println!(
            "Estimated size: {} → {} (~{}% smaller, estimate)",
            format_bytes(estimate.original_bytes),
            format_bytes(estimate.estimated_bytes),
            estimate.reduction_percent
        );
    }
}

fn print_artifact(artifact: &CompletedArtifact) {
    println!();
    println!("{}", style("File ready").green().bold());
    println!("  Name: {}", artifact.config.output_name());
    println!("  Pipeline: {}", describe_steps(artifact.config.steps()));
    println!(
        "  Protected: {}",
        if artifact.config.encrypt_enabled() {
            "yes"
        } else {
            "no"
        }
    );
    println!("  Reference: {}", style(&artifact.reference).cyan());
}

/// Handle `filegate config ...`
fn run_config_action(action: &ConfigAction, path: &Path) -> anyhow::Result<()> {
    match action {
        ConfigAction::Path => {
            println!("{}", path.display());
        }
        ConfigAction::Show => {
            let config = Config::load_or_default(path)?;
            config.validate().context("Invalid configuration")?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "Config already exists at {} (use --force to overwrite)",
                    path.display()
                );
            }
            Config::default().save(path)?;
            println!("Wrote default configuration to {}", path.display());
        }
    }
    Ok(())
}
