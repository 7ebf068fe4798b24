//! Text output: usage tables with optional colors.

use chrono::NaiveDateTime;
use ghameter_core::{AlarmLimits, AlarmState, AuditReport, RunnerOs, UsageByOs};

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";

const REPO_NAME_HEADER: &str = "Repo Name";
const WORKFLOW_HEADER: &str = "Workflow";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

// ============================================================================
// Table
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Plain,
    Bold,
    Dim,
    Green,
    Yellow,
    Red,
}

#[derive(Debug, Clone)]
struct Cell {
    text: String,
    style: Style,
}

impl Cell {
    fn plain(text: impl Into<String>) -> Self {
        Self::styled(text, Style::Plain)
    }

    fn styled(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    fn empty() -> Self {
        Self::plain("")
    }
}

#[derive(Debug, Clone)]
enum Row {
    Cells(Vec<Cell>),
    Rule,
}

/// Boxed table. The first `left_columns` columns are left aligned, the rest
/// right aligned.
#[derive(Debug, Clone)]
struct Table {
    headers: Vec<String>,
    left_columns: usize,
    rows: Vec<Row>,
}

impl Table {
    fn new(headers: &[&str], left_columns: usize) -> Self {
        Self {
            headers: headers.iter().map(|h| (*h).to_string()).collect(),
            left_columns,
            rows: Vec::new(),
        }
    }

    fn push(&mut self, mut cells: Vec<Cell>) {
        cells.resize_with(self.headers.len(), Cell::empty);
        self.rows.push(Row::Cells(cells));
    }

    fn rule(&mut self) {
        if !matches!(self.rows.last(), Some(Row::Rule) | None) {
            self.rows.push(Row::Rule);
        }
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            if let Row::Cells(cells) = row {
                for (width, cell) in widths.iter_mut().zip(cells) {
                    *width = (*width).max(cell.text.chars().count());
                }
            }
        }
        widths
    }

    fn render(&self, formatter: &TextFormatter) -> String {
        let widths = self.widths();
        let rule = format!(
            "+{}+",
            widths
                .iter()
                .map(|w| "-".repeat(w + 2))
                .collect::<Vec<_>>()
                .join("+")
        );

        let header: Vec<Cell> = self
            .headers
            .iter()
            .map(|h| Cell::styled(h.as_str(), Style::Bold))
            .collect();

        let mut lines = vec![
            rule.clone(),
            self.render_cells(&header, &widths, formatter),
            rule.clone(),
        ];
        for row in &self.rows {
            match row {
                Row::Cells(cells) => lines.push(self.render_cells(cells, &widths, formatter)),
                Row::Rule => lines.push(rule.clone()),
            }
        }
        if !matches!(self.rows.last(), Some(Row::Rule)) {
            lines.push(rule);
        }
        lines.join("\n")
    }

    fn render_cells(&self, cells: &[Cell], widths: &[usize], formatter: &TextFormatter) -> String {
        let rendered: Vec<String> = cells
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(column, (cell, &width))| {
                let padded = if column < self.left_columns {
                    format!("{:<width$}", cell.text)
                } else {
                    format!("{:>width$}", cell.text)
                };
                formatter.paint(cell.style, &padded)
            })
            .collect();
        format!("| {} |", rendered.join(" | "))
    }
}

// ============================================================================
// Text Formatter
// ============================================================================

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Formats the full report: summary table, workflow table, outcome.
    pub fn format_report(
        &self,
        report: &AuditReport,
        limits: &AlarmLimits,
        state: &AlarmState,
        generated_at: NaiveDateTime,
    ) -> String {
        let stamp = generated_at.format(TIMESTAMP_FORMAT).to_string();
        let outcome = match state.message() {
            Some(message) => format!("{} {}", self.red("Alarm:"), message),
            None => self.green("No usage thresholds breached"),
        };

        [
            self.format_summary_table(report, limits, state, &stamp),
            self.format_workflow_table(report, limits, state, &stamp),
            outcome,
        ]
        .join("\n\n")
    }

    /// One row per listed repository, then totals and GitHub's figures.
    pub fn format_summary_table(
        &self,
        report: &AuditReport,
        limits: &AlarmLimits,
        state: &AlarmState,
        stamp: &str,
    ) -> String {
        let mut headers = vec![REPO_NAME_HEADER];
        headers.extend(RunnerOs::ALL.map(RunnerOs::display_name));
        let mut table = Table::new(&headers, 1);

        for repo in &report.usage.repositories {
            let mut cells = vec![Cell::plain(repo.name())];
            cells.extend(usage_cells(repo.usage()));
            table.push(cells);
        }
        table.rule();

        let mut totals = vec![Cell::styled(format!("Usage Minutes {stamp}"), Style::Bold)];
        totals.extend(usage_cells(report.usage.totals));
        table.push(totals);
        table.rule();

        push_stats(&mut table, report, limits, state, 0);
        table.render(self)
    }

    /// Workflows grouped by repository, then totals and GitHub's figures.
    pub fn format_workflow_table(
        &self,
        report: &AuditReport,
        limits: &AlarmLimits,
        state: &AlarmState,
        stamp: &str,
    ) -> String {
        let mut headers = vec![REPO_NAME_HEADER, WORKFLOW_HEADER];
        headers.extend(RunnerOs::ALL.map(RunnerOs::display_name));
        let mut table = Table::new(&headers, 2);

        for repo in &report.usage.repositories {
            if repo.actions().is_empty() {
                let mut cells = vec![
                    Cell::plain(repo.name()),
                    Cell::styled("No workflows", Style::Dim),
                ];
                cells.extend(usage_cells(UsageByOs::zero()));
                table.push(cells);
            }
            for (index, workflow) in repo.actions().iter().enumerate() {
                // Repository name only on the first row of its group.
                let name = if index == 0 { repo.name() } else { "" };
                let mut cells = vec![Cell::plain(name), Cell::plain(workflow.name())];
                cells.extend(usage_cells(workflow.usage()));
                table.push(cells);
            }
            table.rule();
        }

        let mut totals = vec![
            Cell::styled(format!("Usage Minutes {stamp}"), Style::Bold),
            Cell::empty(),
        ];
        totals.extend(usage_cells(report.usage.totals));
        table.push(totals);
        table.rule();

        push_stats(&mut table, report, limits, state, 1);
        table.render(self)
    }

    // ========================================================================
    // Color/style helpers
    // ========================================================================

    fn paint(&self, style: Style, text: &str) -> String {
        let code = match style {
            Style::Plain => return text.to_string(),
            Style::Bold => BOLD,
            Style::Dim => DIM,
            Style::Green => GREEN,
            Style::Yellow => YELLOW,
            Style::Red => RED,
        };
        if self.use_colors {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn green(&self, text: &str) -> String {
        self.paint(Style::Green, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(Style::Red, text)
    }
}

fn usage_cells(usage: UsageByOs) -> impl Iterator<Item = Cell> {
    RunnerOs::ALL
        .into_iter()
        .map(move |os| Cell::plain(usage.get(os).to_string()))
}

/// Appends GitHub's billing figures. `gap` blank cells separate the label
/// from the per-OS columns.
fn push_stats(
    table: &mut Table,
    report: &AuditReport,
    limits: &AlarmLimits,
    state: &AlarmState,
    gap: usize,
) {
    let label_row = |table: &mut Table, label: String, style: Style| {
        table.push(vec![Cell::styled(label, style)]);
    };

    let billing = &report.billing;
    let remaining_style = match state {
        AlarmState::RemainingMinutesThresholdBreached { .. } => Style::Red,
        _ => Style::Plain,
    };
    let paid_style = match state {
        AlarmState::PaidMinutesThresholdBreached { .. } => Style::Red,
        _ => Style::Plain,
    };

    label_row(table, "Stats From GitHub".to_string(), Style::Bold);
    label_row(
        table,
        format!("Monthly Allowance: {}", billing.included_minutes),
        Style::Plain,
    );

    let mut used = vec![Cell::plain(format!(
        "Usage Minutes: {}",
        billing.total_minutes_used
    ))];
    used.extend(std::iter::repeat_with(Cell::empty).take(gap));
    used.extend(usage_cells(billing.minutes_used_breakdown));
    table.push(used);

    label_row(
        table,
        format!("Remaining Minutes: {}", report.reconciled.remaining_minutes),
        remaining_style,
    );
    label_row(
        table,
        format!("Alarm Triggered at: {}", limits.remaining_minutes_threshold),
        Style::Plain,
    );
    label_row(
        table,
        format!("Paid Minutes: {}", billing.total_paid_minutes_used),
        paid_style,
    );
    if limits.paid_check_enabled() {
        label_row(
            table,
            format!("Alarm on Paid Usage Above: {}", limits.paid_usage_limit),
            Style::Plain,
        );
    }

    let drift = report.reconciled.drift;
    if !drift.is_balanced() {
        let mut cells = vec![Cell::styled("Billing Drift", Style::Yellow)];
        cells.extend(std::iter::repeat_with(Cell::empty).take(gap));
        cells.extend(
            RunnerOs::ALL
                .into_iter()
                .map(|os| Cell::styled(format!("{:+}", drift.get(os)), Style::Yellow)),
        );
        table.push(cells);
    }

    label_row(
        table,
        format!("Days Left in Cycle: {}", report.period.days_left),
        Style::Plain,
    );
}

// ============================================================================
// Tests
// ============================================================================
