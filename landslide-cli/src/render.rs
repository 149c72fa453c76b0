use chrono::{DateTime, Local, Utc};
use landslide_core::{
    CommunityLocation, RiskSnapshot, StoreState, format_elapsed, get_risk_level_label,
};

/// One line per registry entry for `landslide communities`.
pub fn community_line(location: &CommunityLocation) -> String {
    let view = location.map_view();
    format!(
        "{:<6} {:<22} {:.6}, {:.6} (zoom {})",
        location.id.as_str(),
        location.display_name,
        view.lat,
        view.lng,
        view.zoom
    )
}

/// Text rendering of the store state, the CLI's stand-in for the page.
///
/// Errors that suppress content hide the title and map; every other error
/// keeps them so the user can still orient and switch location.
pub fn render_state(
    location: Option<&CommunityLocation>,
    state: &StoreState,
    now: DateTime<Utc>,
) -> String {
    let mut lines = Vec::new();

    if state.loading {
        lines.push("Loading landslide risk data...".to_string());
    }

    let suppress = state.error.as_ref().is_some_and(|e| e.category.suppresses_content());

    if let Some(location) = location.filter(|_| !suppress) {
        lines.push(format!("{}, Alaska", location.name));
        let view = location.map_view();
        lines.push(format!("Map: {:.6}, {:.6} (zoom {})", view.lat, view.lng, view.zoom));
    }

    if let Some(error) = &state.error {
        lines.push(format!("Error: {}", error.message));
        lines.push("Switch location with `landslide browse`.".to_string());
    }

    if let Some(data) = &state.data {
        lines.extend(snapshot_lines(data, now));
    }

    lines.join("\n")
}

fn snapshot_lines(data: &RiskSnapshot, now: DateTime<Utc>) -> Vec<String> {
    vec![
        format!("{} risk of landslide now", data.risk_level_label()),
        format!(
            "  Next 24 hours: {} | 2 days: {} | 3 days: {}",
            get_risk_level_label(data.risk_24hr),
            get_risk_level_label(data.risk_2days),
            get_risk_level_label(data.risk_3days)
        ),
        format!(
            "Precipitation: {:.2}\" ({:.1} mm)",
            data.precipitation_inches, data.precipitation_mm
        ),
        format!(
            "  24 hr / 2 days / 3 days: {:.1} / {:.1} / {:.1}",
            data.precipitation_24hr, data.precipitation_2days, data.precipitation_3days
        ),
        format!(
            "Updated: {} ({}), valid until {}",
            data.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            ago(now - data.timestamp),
            data.expires_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        ),
    ]
}

fn ago(elapsed: chrono::Duration) -> String {
    let phrase = format_elapsed(elapsed);
    if elapsed.num_minutes() < 1 { phrase } else { format!("{phrase} ago") }
}
