//! Command execution on top of the lifecycle controller

use std::sync::Arc;

use colored::Colorize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::app::options::{AppOptions, Command};
use crate::deploy::controller::{
    ControllerEvent, LifecycleController, Navigation, INVALID_REPOSITORY_NOTICE,
};
use crate::deploy::fsm::LifecycleState;
use crate::errors::LauncherError;
use crate::http::client::HttpClient;
use crate::http::deadline::with_timeout;
use crate::models::deployment::{DeploymentRecord, Notice, NoticeKind};
use crate::validate::{format_identifier, require_repository_reference};

/// How a command ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Cancelled,
    Failed,
}

/// Run a command against the deployment service
///
/// `input` supplies answers to confirmation prompts.
pub async fn run<R>(
    command: Command,
    options: AppOptions,
    input: &mut R,
) -> Result<Outcome, LauncherError>
where
    R: AsyncBufRead + Unpin,
{
    let http_client = Arc::new(HttpClient::new(
        &options.backend_base_url,
        options.request_timeout,
    )?);
    info!("Using deployment API at {}", http_client.base_url());

    match command {
        Command::Deploy { repository } => deploy(http_client, &repository, &options).await,
        Command::Status { container_id } => status(http_client, &container_id, &options).await,
        Command::Stop { container_id } => {
            stop(http_client, &container_id, &options, input).await
        }
        Command::StopRepository { repository } => {
            stop_repository(&http_client, &repository, &options, input).await
        }
    }
}

fn new_controller(
    http_client: Arc<HttpClient>,
    options: &AppOptions,
) -> (LifecycleController, mpsc::UnboundedReceiver<ControllerEvent>) {
    LifecycleController::new(http_client, options.fsm_settings.clone())
}

async fn deploy(
    http_client: Arc<HttpClient>,
    repository: &str,
    options: &AppOptions,
) -> Result<Outcome, LauncherError> {
    let (controller, mut events) = new_controller(http_client, options);

    controller.submit(repository).await;
    let Some(Navigation::Deployment {
        container_id,
        hand_off,
    }) = drain(&mut events)
    else {
        return Ok(Outcome::Failed);
    };

    let state = controller.enter(&container_id, Some(hand_off)).await;
    drain(&mut events);
    Ok(show(&controller, state))
}

async fn status(
    http_client: Arc<HttpClient>,
    container_id: &str,
    options: &AppOptions,
) -> Result<Outcome, LauncherError> {
    let (controller, mut events) = new_controller(http_client, options);

    let state = controller.enter(container_id, None).await;
    drain(&mut events);
    Ok(show(&controller, state))
}

async fn stop<R>(
    http_client: Arc<HttpClient>,
    container_id: &str,
    options: &AppOptions,
    input: &mut R,
) -> Result<Outcome, LauncherError>
where
    R: AsyncBufRead + Unpin,
{
    let (controller, mut events) = new_controller(http_client, options);

    let state = controller.enter(container_id, None).await;
    drain(&mut events);
    if show(&controller, state) != Outcome::Succeeded {
        return Ok(Outcome::Failed);
    }

    controller.request_stop();
    let confirmed = options.assume_yes
        || confirm(
            "Are you sure you want to stop this deployment? This action cannot be undone.",
            input,
        )
        .await?;

    if !confirmed {
        controller.cancel_stop();
        drain(&mut events);
        println!("Stop cancelled");
        return Ok(Outcome::Cancelled);
    }

    let state = controller.confirm_stop().await;
    if let Some(Navigation::Home) = drain(&mut events) {
        controller.leave();
    }

    Ok(match state {
        LifecycleState::Stopped => Outcome::Succeeded,
        _ => Outcome::Failed,
    })
}

async fn stop_repository<R>(
    http_client: &HttpClient,
    repository: &str,
    options: &AppOptions,
    input: &mut R,
) -> Result<Outcome, LauncherError>
where
    R: AsyncBufRead + Unpin,
{
    let repository = match require_repository_reference(repository) {
        Ok(repository) => repository,
        Err(e) => {
            warn!("{}", e);
            print_notice(&Notice::error(INVALID_REPOSITORY_NOTICE));
            return Ok(Outcome::Failed);
        }
    };

    let prompt = format!("Stop every deployment of {}?", repository);
    if !options.assume_yes && !confirm(&prompt, input).await? {
        println!("Stop cancelled");
        return Ok(Outcome::Cancelled);
    }

    let stop = http_client.stop_deployment_by_repository(repository);
    match with_timeout(options.fsm_settings.operation_timeout, stop).await {
        Ok(message) => {
            print_notice(&Notice::success(message));
            Ok(Outcome::Succeeded)
        }
        Err(e) => {
            warn!("stop by repository failed: {}", e);
            print_notice(&Notice::error(format!("Failed to stop deployment: {}", e)));
            Ok(Outcome::Failed)
        }
    }
}

/// Print pending notices and return the last navigation request, if any
fn drain(events: &mut mpsc::UnboundedReceiver<ControllerEvent>) -> Option<Navigation> {
    let mut navigation = None;
    while let Ok(event) = events.try_recv() {
        match event {
            ControllerEvent::Notice(notice) => print_notice(&notice),
            ControllerEvent::Navigate(target) => navigation = Some(target),
            ControllerEvent::StateChanged { .. } => {}
        }
    }
    navigation
}

fn show(controller: &LifecycleController, state: LifecycleState) -> Outcome {
    match (state, controller.view().record) {
        (LifecycleState::Active, Some(record)) => {
            print_record(&record);
            Outcome::Succeeded
        }
        _ => Outcome::Failed,
    }
}

fn print_record(record: &DeploymentRecord) {
    println!("{}", "Deployment Active".green().bold());
    println!("  {:<14}{}", "Repository", record.source_reference);
    println!(
        "  {:<14}{}",
        "Container ID",
        format_identifier(record.container_id()).cyan()
    );
    println!("  {:<14}{}", "Public URL", record.public_url.underline());
}

fn print_notice(notice: &Notice) {
    match notice.kind {
        NoticeKind::Success => println!("{} {}", "✔".green(), notice.text),
        NoticeKind::Error => eprintln!("{} {}", "✘".red(), notice.text.red()),
    }
}

async fn confirm<R>(prompt: &str, input: &mut R) -> Result<bool, LauncherError>
where
    R: AsyncBufRead + Unpin,
{
    println!("{} {} [y/N]", "?".yellow().bold(), prompt);

    let mut answer = String::new();
    input.read_line(&mut answer).await?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
