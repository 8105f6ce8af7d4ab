//! Human-readable renderings for the terminal.

use crate::parser::schema::{AnalyzeTraceResult, HotSpot, HotType};

/// Render the hot-spot tree, unterminated events and duplicate packages
///
/// **Public** - printed by `analyze --summary`
///
/// # Arguments
/// * `result` - Analysis result to render
/// * `max_hot_spots` - Number of top-level hot spots to show
pub fn render_summary(result: &AnalyzeTraceResult, max_hot_spots: usize) -> String {
    let mut lines = Vec::new();

    lines.push("  HOT SPOTS".to_string());
    if result.hot_spots.is_empty() {
        lines.push("    (none)".to_string());
    }
    for hot_spot in result.hot_spots.iter().take(max_hot_spots) {
        render_hot_spot(hot_spot, &mut lines);
    }
    let hidden = result.hot_spots.len().saturating_sub(max_hot_spots);
    if hidden > 0 {
        lines.push(format!("    ... {} more", hidden));
    }

    if !result.unterminated_events.is_empty() {
        lines.push(String::new());
        lines.push("  UNTERMINATED EVENTS".to_string());
        for event in &result.unterminated_events {
            let mut line = format!("    {} at {:.1}ms", event.name(), event.ts / 1000.0);
            if let Some(path) = event.path() {
                line.push_str(&format!(" ({})", path));
            }
            lines.push(line);
        }
    }

    if !result.duplicate_packages.is_empty() {
        lines.push(String::new());
        lines.push("  DUPLICATE PACKAGES".to_string());
        for package in &result.duplicate_packages {
            lines.push(format!("    {}", package.name));
            for instance in &package.instances {
                lines.push(format!("      {}@{}", instance.path, instance.version));
            }
        }
    }

    lines.join("\n")
}

fn render_hot_spot(root: &HotSpot, lines: &mut Vec<String>) {
    let mut stack = vec![(root, 0usize)];

    while let Some((hot_spot, depth)) = stack.pop() {
        lines.push(format!(
            "    {}{:.0}ms {}",
            "  ".repeat(depth),
            hot_spot.duration_millis(),
            hot_spot.description
        ));
        for child in hot_spot.children.iter().rev() {
            stack.push((child, depth + 1));
        }
    }
}

/// Render a type and its expanded relations, one type per line
///
/// **Public** - printed by the `type` command
pub fn render_hot_type(root: &HotType) -> String {
    let mut lines = Vec::new();
    let mut stack = vec![(root, 0usize)];

    while let Some((hot_type, depth)) = stack.pop() {
        let ty = &hot_type.resolved_type;
        lines.push(format!(
            "{}{} {} {:?}",
            "  ".repeat(depth),
            ty.id,
            ty.label(),
            ty.flags
        ));
        for child in hot_type.children.iter().rev() {
            stack.push((child, depth + 1));
        }
    }

    lines.join("\n")
}
