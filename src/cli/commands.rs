use chrono::FixedOffset;
use serde::Serialize;
use std::time::Duration;
use tracing::info;

use crate::cli::args::{Cli, Commands};
use crate::config::Settings;
use crate::controllers::{MarkerKey, PanelBody, RefreshOutcome, RefreshState};
use crate::error::{MapError, Result};
use crate::fetchers::{MosmixClient, SuggestionFetcher};
use crate::formatters::text::{render_forecast, render_markers, render_suggestions};
use crate::formatters::DisplayZone;
use crate::session::{MapEvent, MapSession, MapSnapshot};
use crate::models::ClusterSize;
use crate::utils::constants::{
    DEFAULT_USER_AGENT, MSG_FORECAST_FAILED, MSG_FORECAST_LOADING, MSG_NO_STATION_ID,
};
use crate::utils::coordinates::format_readout;
use crate::utils::progress::ProgressReporter;

pub async fn run(cli: Cli) -> Result<()> {
    let settings = settings_from(&cli)?;
    let json = cli.json;

    match cli.command {
        Commands::Suggest { query, polygon } => {
            let fetcher = SuggestionFetcher::from_settings(&settings)?
                .with_polygon(polygon || settings.request_polygon);

            let progress = ProgressReporter::new_spinner("Searching places...", json);
            let suggestions = fetcher.suggestions(&query).await;
            progress.finish_and_clear();

            if json {
                print_json(&suggestions)?;
            } else {
                print!("{}", render_suggestions(&suggestions));
            }
        }

        Commands::Search { query } => {
            let fetcher = SuggestionFetcher::from_settings(&settings)?;

            let progress = ProgressReporter::new_spinner("Searching...", json);
            let found = fetcher.search_location(&query).await;
            progress.finish_and_clear();

            match (found, json) {
                (found, true) => print_json(&found)?,
                (Some(place), false) => print!("{}", render_suggestions(&[place])),
                (None, false) => println!("Keine Treffer"),
            }
        }

        Commands::Forecast {
            station_id,
            utc_offset,
        } => {
            let zone = display_zone(utc_offset)?;
            let client = MosmixClient::from_settings(&settings)?;

            let progress = ProgressReporter::new_spinner(MSG_FORECAST_LOADING, json);
            let payload = client.try_forecast(&station_id).await;
            progress.finish_and_clear();

            let view = zone.format(&payload?);
            info!("Forecast for {}: {} rows", station_id, view.row_count());

            if json {
                print_json(&view)?;
            } else {
                print!("{}", render_forecast(&view));
            }
        }

        Commands::Stations { bounds } => {
            let bounds = bounds.to_bounds()?;
            let client = MosmixClient::from_settings(&settings)?;

            let progress = ProgressReporter::new_spinner("Loading stations...", json);
            let markers = client.stations_in(bounds).await;
            progress.finish_and_clear();
            let markers = markers?;

            if json {
                print_json(&markers)?;
            } else {
                println!(
                    "{} Stationen ({})",
                    markers.len(),
                    ClusterSize::for_count(markers.len()).as_str()
                );
                print!("{}", render_markers(&markers));
            }
        }

        Commands::Browse {
            bounds,
            select,
            width,
            utc_offset,
        } => {
            let bounds = bounds.to_bounds()?;
            let session = MapSession::new(
                MosmixClient::from_settings(&settings)?,
                MosmixClient::from_settings(&settings)?,
                SuggestionFetcher::from_settings(&settings)?,
            )
            .with_display_zone(display_zone(utc_offset)?)
            .with_viewport_width(width)
            .with_initial_bounds(bounds);

            let handle = session.spawn();
            let mut snapshots = handle.subscribe();
            // Covers the bounds request plus the forecast request
            let patience = settings.timeout() * 2 + Duration::from_secs(1);

            let progress = ProgressReporter::new_spinner("Loading map view...", json);
            let loaded = wait_for(&mut snapshots, patience, initial_refresh_settled).await;
            progress.finish_and_clear();
            let mut snapshot = loaded?;
            if snapshot.last_refresh == Some(RefreshOutcome::Failed) {
                handle.shutdown().await?;
                return Err(MapError::MissingData(
                    "Station fetch for the requested bounds failed".to_string(),
                ));
            }

            if let Some(index) = select {
                let key = MarkerKey {
                    generation: snapshot.generation,
                    index,
                };
                if index >= snapshot.markers.len() {
                    return Err(MapError::MissingData(format!(
                        "No marker {} in a view of {} markers",
                        index,
                        snapshot.markers.len()
                    )));
                }

                handle.send(MapEvent::MarkerClicked(key)).await?;
                let progress = ProgressReporter::new_spinner(MSG_FORECAST_LOADING, json);
                let opened = wait_for(&mut snapshots, patience, |s| {
                    s.panel_content
                        .as_ref()
                        .is_some_and(|c| c.body != PanelBody::Loading)
                })
                .await;
                progress.finish_and_clear();
                snapshot = opened?;
            }

            if json {
                print_json(&snapshot)?;
            } else {
                print_snapshot(&snapshot);
            }

            handle.shutdown().await?;
        }
    }

    Ok(())
}

fn settings_from(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load(cli.config.as_deref())?;

    if let Some(url) = &cli.geocoding_url {
        settings = settings.with_geocoding_base_url(url);
    }
    if let Some(url) = &cli.api_url {
        settings = settings.with_api_base_url(url);
    }
    if let Some(agent) = &cli.user_agent {
        settings = settings.with_user_agent(agent);
    }
    if settings.user_agent.is_none() {
        settings = settings.with_user_agent(DEFAULT_USER_AGENT);
    }

    Ok(settings)
}

fn display_zone(utc_offset: Option<i32>) -> Result<DisplayZone> {
    match utc_offset {
        None => Ok(DisplayZone::Local),
        Some(hours) => hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .map(DisplayZone::Fixed)
            .ok_or_else(|| MapError::InvalidFormat(format!("UTC offset out of range: {}", hours))),
    }
}

/// The first bounds fetch has come back, successfully or not
fn initial_refresh_settled(snapshot: &MapSnapshot) -> bool {
    snapshot.refresh_state == RefreshState::Idle && snapshot.last_refresh.is_some()
}

async fn wait_for<P>(
    snapshots: &mut tokio::sync::watch::Receiver<MapSnapshot>,
    patience: Duration,
    predicate: P,
) -> Result<MapSnapshot>
where
    P: FnMut(&MapSnapshot) -> bool,
{
    match tokio::time::timeout(patience, snapshots.wait_for(predicate)).await {
        Ok(Ok(snapshot)) => Ok(snapshot.clone()),
        Ok(Err(_)) => Err(MapError::ChannelClosed),
        Err(_) => Err(MapError::MissingData(format!(
            "Map view not ready after {:?}",
            patience
        ))),
    }
}

fn print_snapshot(snapshot: &MapSnapshot) {
    println!("{} Stationen", snapshot.markers.len());
    for (index, marker) in snapshot.markers.iter().enumerate() {
        let flag = match snapshot.highlighted {
            Some(key) if key.index == index => "*",
            _ => " ",
        };
        println!(
            "{} [{}] {} ({:.4}, {:.4})",
            flag, index, marker.title, marker.coordinate.latitude, marker.coordinate.longitude
        );
    }

    let Some(content) = &snapshot.panel_content else {
        return;
    };

    let selected = snapshot
        .highlighted
        .and_then(|key| snapshot.markers.get(key.index))
        .map(|m| m.coordinate.as_tuple());
    println!("\n{}", content.title);
    println!("{}", format_readout(selected));
    for line in &content.lines {
        println!("  {}", line);
    }
    println!();
    match &content.body {
        PanelBody::Loading => println!("{}", MSG_FORECAST_LOADING),
        PanelBody::Forecast(view) => print!("{}", render_forecast(view)),
        PanelBody::LoadFailed => println!("{}", MSG_FORECAST_FAILED),
        PanelBody::NoForecastAvailable => println!("{}", MSG_NO_STATION_ID),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_display_zone_from_offset() {
        assert_eq!(display_zone(None).unwrap(), DisplayZone::Local);
        assert_eq!(
            display_zone(Some(-5)).unwrap(),
            DisplayZone::Fixed(FixedOffset::west_opt(5 * 3600).unwrap())
        );
        assert!(display_zone(Some(30)).is_err());
        assert!(display_zone(Some(i32::MAX)).is_err());
    }

    #[tokio::test]
    async fn test_browse_reports_failed_station_fetch_promptly() {
        // Nothing listens on a port we just released
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let cli = Cli::try_parse_from([
            "mosmix-map",
            "browse",
            "--west",
            "9.0",
            "--south",
            "54.0",
            "--east",
            "10.0",
            "--north",
            "55.0",
            "--json",
            "--api-url",
            base.as_str(),
            "--geocoding-url",
            base.as_str(),
        ])
        .unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), run(cli))
            .await
            .unwrap();
        match result {
            Err(MapError::MissingData(message)) => assert!(message.contains("failed")),
            other => panic!("expected a failed station fetch, got {:?}", other),
        }
    }
}
