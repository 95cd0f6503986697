//! Review analytics report: rating histogram, chart series and the
//! low-rating insight table, plus a printable HTML export.

pub mod export;

use crate::models::{LowRating, RatingCount};

pub use export::{page_count, render_html, ExportOptions};

/// Pie slice colours, cycled when there are more buckets than colours
pub const PIE_PALETTE: [&str; 5] = ["#ff6384", "#36a2eb", "#cc65fe", "#ffce56", "#4bc0c0"];

pub const BAR_COLOR: &str = "#744ecd";

/// Ratings that get a column in the insight table
pub const INSIGHT_RATINGS: [i32; 3] = [1, 2, 3];

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSlice {
    pub label: String,
    pub count: u64,
    /// Share of all reviews, 0.0..=100.0
    pub percent: f64,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewReport {
    pub counts: Vec<RatingCount>,
    pub total: u64,
    pub insights: InsightTable,
}

impl ReviewReport {
    pub fn build(counts: Vec<RatingCount>, low_ratings: &[LowRating]) -> Self {
        let total = counts.iter().map(|c| c.count).sum();
        Self {
            counts,
            total,
            insights: InsightTable::from_low_ratings(low_ratings),
        }
    }

    pub fn pie_slices(&self) -> Vec<ChartSlice> {
        self.counts
            .iter()
            .enumerate()
            .map(|(i, c)| ChartSlice {
                label: rating_label(c.star_rating),
                count: c.count,
                percent: percent_of(c.count, self.total),
                color: PIE_PALETTE[i % PIE_PALETTE.len()],
            })
            .collect()
    }

    pub fn bar_series(&self) -> Vec<ChartSlice> {
        self.counts
            .iter()
            .map(|c| ChartSlice {
                label: rating_label(c.star_rating),
                count: c.count,
                percent: percent_of(c.count, self.total),
                color: BAR_COLOR,
            })
            .collect()
    }
}

pub fn rating_label(rating: Option<i32>) -> String {
    match rating {
        Some(r) => r.to_string(),
        None => "Unrated".to_string(),
    }
}

fn percent_of(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 * 100.0 / total as f64
    }
}

/// Usernames grouped into one column per rating in [`INSIGHT_RATINGS`].
/// Columns are ragged; the table has as many rows as the longest column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsightTable {
    columns: [Vec<String>; 3],
}

impl InsightTable {
    pub fn from_low_ratings(low_ratings: &[LowRating]) -> Self {
        let mut table = Self::default();
        for item in low_ratings {
            if let Some(idx) = INSIGHT_RATINGS.iter().position(|r| *r == item.rating) {
                table.columns[idx].push(item.username.clone());
            }
        }
        table
    }

    /// Usernames that gave `rating`; empty for ratings without a column
    pub fn column(&self, rating: i32) -> &[String] {
        INSIGHT_RATINGS
            .iter()
            .position(|r| *r == rating)
            .map(|idx| self.columns[idx].as_slice())
            .unwrap_or(&[])
    }

    pub fn row_count(&self) -> usize {
        self.columns.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn rows(&self) -> Vec<[Option<&str>; 3]> {
        (0..self.row_count())
            .map(|row| {
                [
                    self.columns[0].get(row).map(String::as_str),
                    self.columns[1].get(row).map(String::as_str),
                    self.columns[2].get(row).map(String::as_str),
                ]
            })
            .collect()
    }
}
