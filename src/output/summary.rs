//! Plain-text tree summary.
//!
//! One line per node, indented by depth, followed by one line per enabled
//! dimension. Means are taken over the node frequency.

use crate::tree::{Dimension, DimensionData, Drt, NumericData, TimeData, TreeNode};
use crate::utils::config::SUMMARY_LABEL_WIDTH;
use chrono::TimeDelta;

/// Summary rendering options
#[derive(Debug, Clone, Default)]
pub struct SummaryOptions {
    /// Deepest node depth to print; deeper nodes are elided
    pub max_depth: Option<i64>,
}

impl SummaryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: i64) -> Self {
        self.max_depth = Some(max_depth);
        self
    }
}

/// Render a tree as an indented text listing
///
/// **Public** - used by the discover command
///
/// # Arguments
/// * `tree` - Discovered tree
/// * `options` - Depth limit
///
/// # Returns
/// Multi-line summary; the first line reports tree-wide counts
pub fn generate_tree_summary(tree: &Drt, options: &SummaryOptions) -> String {
    let mut lines = Vec::new();

    let root = tree.root_node();
    lines.push(format!(
        "  DIRECTLY-ROOTED TREE ({} cases, {} nodes, max depth {}{})",
        root.frequency,
        tree.len(),
        tree.max_depth(),
        if tree.is_grouped() { ", grouped" } else { "" }
    ));
    lines.push(format!("  {}", "─".repeat(SUMMARY_LABEL_WIDTH + 16)));

    let mut hidden = 0usize;
    for node in tree.iter() {
        if options.max_depth.is_some_and(|limit| node.depth > limit) {
            hidden += 1;
            continue;
        }
        push_node_lines(&mut lines, tree, node);
    }

    if hidden > 0 {
        lines.push(String::new());
        lines.push(format!(
            "   ({} deeper nodes not shown, limit depth {})",
            hidden,
            options.max_depth.unwrap_or_default()
        ));
    }

    lines.join("\n")
}

/// **Private** - header and dimension lines of one node
fn push_node_lines(lines: &mut Vec<String>, tree: &Drt, node: &TreeNode) {
    let indent = "  ".repeat((node.depth + 1).max(0) as usize);
    let label = truncate_label(&node.name, SUMMARY_LABEL_WIDTH.saturating_sub(indent.len()));

    lines.push(format!(
        "  {}{:<width$} freq {:>6}",
        indent,
        label,
        node.frequency,
        width = SUMMARY_LABEL_WIDTH.saturating_sub(indent.len())
    ));

    for dimension in tree.dimensions().iter() {
        let detail = match node.data(dimension) {
            Some(DimensionData::Numeric(data)) => numeric_line(dimension, data, node.frequency),
            Some(DimensionData::Time(data)) => time_line(data, node.frequency),
            None => continue,
        };
        lines.push(format!("  {}    {}", indent, detail));
    }
}

fn numeric_line(dimension: Dimension, data: &NumericData, frequency: u64) -> String {
    if frequency == 0 {
        return format!("{:<11} -", dimension.as_str());
    }
    format!(
        "{:<11} total {:.2}  mean {:.2}  min {:.2}  max {:.2}  acc {:.2}  rem {:.2}",
        dimension.as_str(),
        data.total,
        data.mean(frequency),
        data.min,
        data.max,
        data.accumulated,
        data.remainder
    )
}

fn time_line(data: &TimeData, frequency: u64) -> String {
    if frequency == 0 {
        return format!("{:<11} -", Dimension::Time.as_str());
    }
    let mean = mean_duration(data.lead, frequency);
    format!(
        "{:<11} lead {}  mean {}  service {}  waiting {}  min {}  max {}  acc {}  rem {}",
        Dimension::Time.as_str(),
        format_duration(data.lead),
        format_duration(mean),
        format_duration(data.service),
        format_duration(data.waiting),
        format_duration(data.min),
        format_duration(data.max),
        format_duration(data.lead_accumulated),
        format_duration(data.lead_remainder)
    )
}

/// Mean of `total` over `frequency` visits, at millisecond precision
fn mean_duration(total: TimeDelta, frequency: u64) -> TimeDelta {
    match i64::try_from(frequency) {
        Ok(0) => TimeDelta::zero(),
        Ok(count) => TimeDelta::milliseconds(total.num_milliseconds() / count),
        Err(_) => TimeDelta::zero(),
    }
}

/// Format a duration as `[-]1d 2h 3m 4s`, dropping leading zero units
///
/// **Public** - shared by the CLI reports
pub fn format_duration(duration: TimeDelta) -> String {
    let sign = if duration < TimeDelta::zero() { "-" } else { "" };
    let total = duration.num_seconds().unsigned_abs();
    let (days, hours, minutes, seconds) = (
        total / 86_400,
        total % 86_400 / 3_600,
        total % 3_600 / 60,
        total % 60,
    );

    let text = if days > 0 {
        format!("{}d {}h {}m {}s", days, hours, minutes, seconds)
    } else if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    };
    format!("{}{}", sign, text)
}

/// Shorten labels that would break column alignment
///
/// **Private** - internal utility
fn truncate_label(name: &str, width: usize) -> String {
    let count = name.chars().count();
    if count <= width || width <= 3 {
        return name.to_string();
    }
    let tail: String = name.chars().skip(count - (width - 3)).collect();
    format!("...{}", tail)
}
