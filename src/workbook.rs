use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tracing::info;

use crate::error::Result;
use crate::models::{Analysis, MetricValue, Priority, SiteStatus};
use crate::report;

pub const ANALYSIS_SHEET: &str = "Site Visit Analysis";
pub const SUMMARY_SHEET: &str = "Summary";
pub const PRIORITY_SHEET: &str = "Priority Sites";
pub const BREAKDOWN_SHEET: &str = "Priority Breakdown";

const HIGH_FILL: u32 = 0xFFCCCC; // light red
const MEDIUM_FILL: u32 = 0xFFFF99; // light yellow
const MAX_COLUMN_WIDTH: usize = 50;
const NO_DATA: &str = "No Data";

const SITE_HEADERS: [&str; 5] = [
    "Site",
    "Last_Visit_Date",
    "Days_Since_Visit",
    "Priority",
    "Visit_Required",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// Rendered character count, used for column sizing.
    pub fn display_len(&self) -> usize {
        match self {
            Cell::Text(text) => text.chars().count(),
            Cell::Number(number) => number.to_string().len(),
            Cell::Bool(true) => 4,
            Cell::Bool(false) => 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub cells: Vec<Cell>,
    pub fill: Option<u32>,
}

/// One worksheet's worth of cells before it is written.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: &'static str,
    pub headers: Vec<&'static str>,
    pub rows: Vec<Row>,
}

impl Table {
    /// Longest value per column plus padding, capped at 50 characters.
    pub fn column_widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(col, header)| {
                let longest = self
                    .rows
                    .iter()
                    .filter_map(|row| row.cells.get(col))
                    .map(Cell::display_len)
                    .fold(header.chars().count(), usize::max);
                (longest + 2).min(MAX_COLUMN_WIDTH)
            })
            .collect()
    }
}

fn priority_fill(priority: Priority) -> Option<u32> {
    match priority {
        Priority::High => Some(HIGH_FILL),
        Priority::Medium => Some(MEDIUM_FILL),
        Priority::Low => None,
    }
}

fn site_row(status: &SiteStatus) -> Row {
    let last_visit = status
        .last_visit
        .map(|date| Cell::Text(date.format("%Y-%m-%d").to_string()))
        .unwrap_or_else(|| Cell::text(NO_DATA));
    let days = status
        .days_since_visit
        .map(|days| Cell::Number(days as f64))
        .unwrap_or_else(|| Cell::text(NO_DATA));

    Row {
        cells: vec![
            Cell::text(status.site.as_str()),
            last_visit,
            days,
            Cell::text(status.priority.label()),
            Cell::Bool(status.visit_required),
        ],
        fill: priority_fill(status.priority),
    }
}

pub fn site_table<'a>(
    name: &'static str,
    statuses: impl IntoIterator<Item = &'a SiteStatus>,
) -> Table {
    Table {
        name,
        headers: SITE_HEADERS.to_vec(),
        rows: statuses.into_iter().map(site_row).collect(),
    }
}

pub fn summary_table(analysis: &Analysis) -> Table {
    let rows = analysis
        .summary
        .metrics()
        .into_iter()
        .map(|(label, value)| {
            let value = match value {
                MetricValue::Count(count) => Cell::Number(count as f64),
                MetricValue::Days(days) => Cell::Number(days as f64),
                MetricValue::Average(avg) => Cell::Number(avg),
                MetricValue::Missing => Cell::text(NO_DATA),
            };
            Row {
                cells: vec![Cell::text(label), value],
                fill: None,
            }
        })
        .collect();

    Table {
        name: SUMMARY_SHEET,
        headers: vec!["Metric", "Value"],
        rows,
    }
}

pub fn breakdown_table(analysis: &Analysis) -> Table {
    let rows = report::priority_breakdown(&analysis.statuses)
        .into_iter()
        .map(|tier| Row {
            cells: vec![
                Cell::text(tier.priority.label()),
                Cell::Text(tier.sites.join(", ")),
                Cell::Number(tier.count as f64),
                Cell::Number(tier.avg_days),
            ],
            fill: None,
        })
        .collect();

    Table {
        name: BREAKDOWN_SHEET,
        headers: vec!["Priority", "Sites", "Count", "Avg_Days"],
        rows,
    }
}

/// The four report sheets, in workbook order.
pub fn tables(analysis: &Analysis) -> Vec<Table> {
    let flagged = analysis
        .statuses
        .iter()
        .filter(|s| matches!(s.priority, Priority::High | Priority::Medium));

    vec![
        site_table(ANALYSIS_SHEET, &analysis.statuses),
        summary_table(analysis),
        site_table(PRIORITY_SHEET, flagged),
        breakdown_table(analysis),
    ]
}

fn write_table(worksheet: &mut Worksheet, table: &Table) -> Result<()> {
    worksheet.set_name(table.name)?;

    let header = Format::new().set_bold();
    for (col, title) in table.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *title, &header)?;
    }

    for (idx, row) in table.rows.iter().enumerate() {
        let row_num = (idx + 1) as u32;
        let format = match row.fill {
            Some(color) => Format::new().set_background_color(color),
            None => Format::new(),
        };

        for (col, cell) in row.cells.iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Text(text) => {
                    worksheet.write_string_with_format(row_num, col, text, &format)?;
                }
                Cell::Number(number) => {
                    worksheet.write_number_with_format(row_num, col, *number, &format)?;
                }
                Cell::Bool(flag) => {
                    worksheet.write_boolean_with_format(row_num, col, *flag, &format)?;
                }
            }
        }
    }

    for (col, width) in table.column_widths().into_iter().enumerate() {
        worksheet.set_column_width(col as u16, width as f64)?;
    }

    Ok(())
}

pub fn render(analysis: &Analysis) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    for table in tables(analysis) {
        write_table(workbook.add_worksheet(), &table)?;
    }
    Ok(workbook)
}

pub fn write(analysis: &Analysis, path: &Path) -> Result<()> {
    let mut workbook = render(analysis)?;
    workbook.save(path)?;
    info!(path = %path.display(), sites = analysis.statuses.len(), "workbook saved");
    Ok(())
}
