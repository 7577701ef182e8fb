use prettytable::{format, Cell, Row, Table};

use super::{ProcessingResult, Route};
use crate::error::CropError;

/// One line of the end-of-run table
#[derive(Debug, Clone)]
pub struct ReportEntry {
    pub filename: String,
    pub source_size: Option<(u32, u32)>,
    pub faces_found: usize,
    pub crop: Option<String>,
    pub outcome: String,
}

impl ReportEntry {
    pub fn from_result(filename: &str, result: &Result<ProcessingResult, CropError>) -> Self {
        match result {
            Ok(r) => Self {
                filename: filename.to_string(),
                source_size: Some(r.source_size),
                faces_found: r.faces_found,
                crop: Some(r.crop.to_string()),
                outcome: match r.route {
                    Route::Succeeded => "output".to_string(),
                    Route::Failed => "failed (center crop)".to_string(),
                },
            },
            Err(e) => Self {
                filename: filename.to_string(),
                source_size: match e {
                    CropError::TooSmall { width, height, .. } => Some((*width, *height)),
                    _ => None,
                },
                faces_found: 0,
                crop: None,
                outcome: format!("skipped: {}", e.kind()),
            },
        }
    }
}

#[derive(Debug, Default)]
pub struct CropReport {
    pub entries: Vec<ReportEntry>,
}

impl CropReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entry: ReportEntry) {
        self.entries.push(entry);
    }

    pub fn build_table(&self) -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_BOX_CHARS);

        table.add_row(Row::new(vec![
            Cell::new("Input"),
            Cell::new("Size"),
            Cell::new("Faces"),
            Cell::new("Crop"),
            Cell::new("Result"),
        ]));

        for entry in &self.entries {
            let size = entry
                .source_size
                .map(|(w, h)| format!("{}x{}", w, h))
                .unwrap_or_else(|| "-".to_string());

            table.add_row(Row::new(vec![
                Cell::new(&truncate(&entry.filename, 32)),
                Cell::new(&size),
                Cell::new(&entry.faces_found.to_string()),
                Cell::new(entry.crop.as_deref().unwrap_or("-")),
                Cell::new(&entry.outcome),
            ]));
        }

        table
    }

    /// Print the report as a formatted table
    pub fn print(&self) {
        if self.entries.is_empty() {
            return;
        }
        println!("\nCROP REPORT ({} files)\n", self.entries.len());
        self.build_table().printstd();
        println!();
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
