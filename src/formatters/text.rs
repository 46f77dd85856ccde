use crate::formatters::forecast_view::ForecastView;
use crate::models::{StationMarker, SuggestionRecord};
use crate::utils::constants::MSG_NO_FORECAST_DATA;

const TABLE_HEADER: [&str; 8] = [
    "Zeit",
    "Temp",
    "Wind",
    "Richtung",
    "Luftdruck",
    "Niederschlag",
    "Wolken",
    "Sonne",
];

/// Plain-text rendering of a forecast view for terminals and logs
pub fn render_forecast(view: &ForecastView) -> String {
    let (summary, groups) = match view {
        ForecastView::Unavailable => return format!("{}\n", MSG_NO_FORECAST_DATA),
        ForecastView::Table { summary, groups } => (summary, groups),
    };

    let mut out = String::from("Zusammenfassung\n");
    for line in summary.lines() {
        out.push_str("  ");
        out.push_str(&line);
        out.push('\n');
    }
    out.push('\n');

    let mut rows: Vec<[String; 8]> = Vec::new();
    let mut date_rows: Vec<(usize, String)> = Vec::new();
    for group in groups {
        date_rows.push((rows.len(), group.label.clone()));
        for row in &group.rows {
            let direction = match row.direction_arrow {
                Some(arrow) => format!("{} {}", arrow, row.direction),
                None => row.direction.clone(),
            };
            rows.push([
                row.time.clone(),
                row.temperature.clone(),
                row.wind_speed.clone(),
                direction,
                row.pressure.clone(),
                row.precipitation.clone(),
                row.cloud_cover.clone(),
                row.sunshine.clone(),
            ]);
        }
    }

    let mut widths: Vec<usize> = TABLE_HEADER.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    out.push_str(&render_line(TABLE_HEADER.iter().copied(), &widths));
    let mut dates = date_rows.into_iter().peekable();
    for (index, row) in rows.iter().enumerate() {
        if let Some((_, label)) = dates.next_if(|(start, _)| *start == index) {
            out.push_str(&label);
            out.push('\n');
        }
        out.push_str(&render_line(row.iter().map(String::as_str), &widths));
    }

    out
}

pub fn render_suggestions(suggestions: &[SuggestionRecord]) -> String {
    if suggestions.is_empty() {
        return "Keine Treffer\n".to_string();
    }

    suggestions
        .iter()
        .enumerate()
        .map(|(i, s)| {
            format!(
                "{}. {} ({:.6}, {:.6})\n",
                i + 1,
                s.display_name,
                s.coordinate.latitude,
                s.coordinate.longitude
            )
        })
        .collect()
}

pub fn render_markers(markers: &[StationMarker]) -> String {
    if markers.is_empty() {
        return "Keine Marker im aktuellen Ansichtsbereich gefunden.\n".to_string();
    }

    let mut out = String::new();
    for marker in markers {
        out.push_str(&format!(
            "{} ({:.4}, {:.4})\n",
            marker.title, marker.coordinate.latitude, marker.coordinate.longitude
        ));
        for line in marker.info_lines() {
            out.push_str("  ");
            out.push_str(&line);
            out.push('\n');
        }
    }
    out
}

fn render_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let mut line = cells
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join("  ");
    line.truncate(line.trim_end().len());
    line.push('\n');
    line
}
