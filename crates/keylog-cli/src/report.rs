//! Plain-text rendering of an award report.

use keylog_core::{AwardId, AwardProgress, AwardReport, ProgressDetail};

const BAR_WIDTH: usize = 20;
const NAME_WIDTH: usize = 22;

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Whole numbers without a fraction, points with one decimal.
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

pub fn progress_bar(percent: f64) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

fn status(progress: &AwardProgress) -> String {
    match (progress.achieved, progress.endorsement_label()) {
        (true, Some(label)) => label,
        (true, None) => "achieved".to_string(),
        (false, _) => format!("{} to go", format_value(progress.remaining())),
    }
}

/// Extra line under an award, if its detail has something worth showing.
fn detail_line(progress: &AwardProgress) -> Option<String> {
    match &progress.detail {
        ProgressDetail::Tier(detail) => {
            if !detail.prerequisite_met {
                return detail
                    .prerequisite
                    .map(|p| format!("requires {}", p.display_name()));
            }
            let mut parts = Vec::new();
            if let Some(after) = detail.counting_after {
                parts.push(format!("counting after {}", after.format("%Y-%m-%d")));
            }
            if let (Some(count), Some(required)) = (detail.combined_count, detail.combined_required) {
                parts.push(format!("combined {}/{}", count, required));
            }
            if let Some(next) = detail.next_target {
                parts.push(format!("next at {}", next));
            }
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        ProgressDetail::BandPoints(detail) => {
            let bands: Vec<String> = detail
                .bands
                .iter()
                .map(|b| format!("{} {}", b.band, format_value(b.points)))
                .collect();
            (!bands.is_empty()).then(|| bands.join(" "))
        }
        ProgressDetail::Qualifying { contacts } => contacts
            .iter()
            .max_by(|a, b| a.ratio.total_cmp(&b.ratio))
            .map(|best| format!("best {} at {:.0} mi/W", best.callsign, best.ratio)),
        ProgressDetail::Coverage(detail) => {
            let levels: Vec<String> = detail
                .levels
                .iter()
                .map(|level| {
                    let mark = if level.achieved { "+" } else { " " };
                    let mut text = format!(
                        "{}{} {}/{}",
                        mark, level.level, level.regions_satisfied, level.regions_required
                    );
                    if let Some(band) = level.best_band {
                        text.push_str(&format!(" on {}", band));
                    }
                    text
                })
                .collect();
            Some(levels.join("  "))
        }
        ProgressDetail::KeyDiversity(detail) => {
            let classes: Vec<String> = detail
                .per_class
                .iter()
                .map(|(class, count)| format!("{} {}", class, count))
                .collect();
            Some(classes.join(" "))
        }
        ProgressDetail::Duration(detail) => {
            let mut parts = vec![format!("{} contacts", detail.qualifying_contacts)];
            if detail.back_to_back_rejected > 0 {
                parts.push(format!("{} back-to-back", detail.back_to_back_rejected));
            }
            if let Some(best) = detail.bands.iter().max_by(|a, b| a.minutes.total_cmp(&b.minutes)) {
                parts.push(format!("most on {} ({} min)", best.band, format_value(best.minutes)));
            }
            Some(parts.join(", "))
        }
        ProgressDetail::PrefixPoints(detail) => {
            (detail.unique_prefixes > 0).then(|| format!("{} prefixes", detail.unique_prefixes))
        }
        ProgressDetail::Entities(detail) => {
            let mut text = format!("{} entities", detail.entities.len());
            if let Some(next) = detail.next_target {
                text.push_str(&format!(", next at {}", next));
            }
            Some(text)
        }
    }
}

/// Render `report` as aligned text lines, one award per line plus an
/// optional detail line.
pub fn render_text(report: &AwardReport, member: Option<&str>) -> String {
    let mut lines = Vec::new();
    match member {
        Some(member) => lines.push(format!("Award progress for member {}", member)),
        None => lines.push("Award progress".to_string()),
    }
    lines.push(String::new());

    for award in AwardId::ALL {
        let name = truncate_string(award.display_name(), NAME_WIDTH);
        if let Some(reason) = report.misconfigured.get(&award) {
            lines.push(format!("{:<width$} unavailable: {}", name, reason, width = NAME_WIDTH));
            continue;
        }
        let Some(progress) = report.get(award) else {
            continue;
        };
        lines.push(format!(
            "{:<width$} {} {:>6}/{:<6} {}",
            name,
            progress_bar(progress.progress_percent()),
            format_value(progress.current_value),
            format_value(progress.required_value),
            status(progress),
            width = NAME_WIDTH
        ));
        if let Some(detail) = detail_line(progress) {
            lines.push(format!("{:<width$} {}", "", detail, width = NAME_WIDTH));
        }
    }

    lines.join("\n")
}

// ============================================================================
// Tests
// ============================================================================
