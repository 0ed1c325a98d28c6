//! Headless TeamTask client
//!
//! Restores the stored session (or signs in with TEAMTASK_EMAIL and
//! TEAMTASK_PASSWORD), loads the user's teams, projects and tasks, then
//! follows live task updates until interrupted.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use teamtask_client::config::Config;
use teamtask_client::realtime::Scope;
use teamtask_client::store::Event;
use teamtask_client::{selectors, BoxError, Client};

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting TeamTask client");
    tracing::info!("API URL: {}", config.api_base_url);
    tracing::info!("Push channel URL: {}", config.ws_url);
    tracing::info!("Session storage: {:?}", config.storage_path);

    let client = Client::connect(config.clone()).await?;
    let actions = client.actions();

    // Restore or sign in
    let restored = actions.restore_session().await;
    if !selectors::is_authenticated(&client.store().state()) {
        let (Some(email), Some(password)) = (&config.email, &config.password) else {
            tracing::warn!("No stored session. Set TEAMTASK_EMAIL and TEAMTASK_PASSWORD to sign in.");
            return Ok(());
        };
        let login = actions.login(email, password).await;
        if let Some(err) = login.error {
            return Err(format!("Sign in failed: {}", err.message).into());
        }
    } else if matches!(restored.data, Some(None)) {
        // Tokens without a cached user: fetch it.
        let profile = actions.refresh_profile().await;
        if let Some(err) = profile.error {
            return Err(format!("Could not load the profile: {}", err.message).into());
        }
    }

    let state = client.store().state();
    let Some(user) = selectors::current_user(&state).cloned() else {
        return Err("Signed in without a user".into());
    };
    tracing::info!(user_id = user.id, "Signed in as {}", user.display_name());

    // Initial load
    let teams = actions.fetch_user_teams().await;
    for team in teams.data.unwrap_or_default() {
        let projects = actions.fetch_team_projects(team.id).await;
        let projects = projects.data.unwrap_or_default();
        tracing::info!(team_id = team.id, projects = projects.len(), "Team {}", team.name);

        for project in projects {
            let tasks = actions.fetch_project_tasks(project.id).await;
            tracing::info!(
                project_id = project.id,
                tasks = tasks.data.map(|t| t.len()).unwrap_or(0),
                "Project {}",
                project.name
            );
        }
    }

    let state = client.store().state();
    let mine = selectors::tasks_assigned_to(&state, user.id);
    let overdue = selectors::overdue_tasks(&state, chrono::Local::now().date_naive());
    tracing::info!(assigned = mine.len(), overdue = overdue.len(), "Tasks loaded");

    // Follow live updates
    let subscription = client.subscribe(Scope::User(user.id));
    let mut feed = client.store().dispatched();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
            batch = feed.recv() => match batch {
                Ok(events) => {
                    for event in events.iter() {
                        tracing::info!(domain = ?event.domain(), "{}", render(event));
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event feed lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    subscription.close().await;
    Ok(())
}

/// JSON form of an event for the log; falls back to `Debug` so one odd
/// event never stops the loop.
fn render(event: &Event) -> String {
    serde_json::to_string(event).unwrap_or_else(|e| {
        tracing::warn!("Event not serializable: {}", e);
        format!("{:?}", event)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use teamtask_client::store::{Domain, TaskEvent};

    #[test]
    fn test_render_tags_events() {
        let rendered = render(&Event::settled(Domain::Task));
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value, serde_json::to_value(Event::Task(TaskEvent::Settled)).unwrap());
    }
}
