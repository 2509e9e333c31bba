use serde::Serialize;

use crate::aggregate::AggregateCounts;
use crate::category::Filter;

/// Label of the remainder slice in single-category charts
pub const REMAINDER_LABEL: &str = "Outros";

/// Fraction of the radius left empty in the middle of the donut
pub const DONUT_HOLE: f64 = 0.4;

/// Qualitative palette used for slices, cycled when there are more slices
pub const PALETTE: [(u8, u8, u8); 12] = [
    (0x8D, 0xD3, 0xC7),
    (0xFF, 0xFF, 0xB3),
    (0xBE, 0xBA, 0xDA),
    (0xFB, 0x80, 0x72),
    (0x80, 0xB1, 0xD3),
    (0xFD, 0xB4, 0x62),
    (0xB3, 0xDE, 0x69),
    (0xFC, 0xCD, 0xE5),
    (0xD9, 0xD9, 0xD9),
    (0xBC, 0x80, 0xBD),
    (0xCC, 0xEB, 0xC5),
    (0xFF, 0xED, 0x6F),
];

/// What each slice label shows besides its name
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SliceText {
    /// Percentage and category name
    PercentLabel,
    /// Absolute value and percentage
    ValuePercent,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Slice {
    pub label: String,
    pub value: usize,
}

/// Donut chart specification
///
/// Independent of any drawing backend; `render_png` turns it into an image
/// when the `web` feature is enabled.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub slices: Vec<Slice>,
    pub hole: f64,
    pub text: SliceText,
}

impl ChartSpec {
    pub fn total(&self) -> usize {
        self.slices.iter().map(|s| s.value).sum()
    }

    /// Share of each slice in percent, in slice order
    pub fn percentages(&self) -> Vec<f64> {
        let total = self.total();
        self.slices
            .iter()
            .map(|s| {
                if total == 0 {
                    0.0
                } else {
                    s.value as f64 * 100.0 / total as f64
                }
            })
            .collect()
    }

    /// Slice captions as they are drawn next to the donut
    pub fn slice_labels(&self) -> Vec<String> {
        self.slices
            .iter()
            .zip(self.percentages())
            .map(|(slice, pct)| match self.text {
                SliceText::PercentLabel => format!("{} ({:.1}%)", slice.label, pct),
                SliceText::ValuePercent => format!("{}: {} ({:.1}%)", slice.label, slice.value, pct),
            })
            .collect()
    }
}

/// Build the proportion chart for a filter.
///
/// `All` gets one slice per nonzero category. A category gets its count
/// against the remaining rows of the file. Returns `None` when the relevant
/// count is zero.
///
/// # Examples
/// ```
/// use situation_report::aggregate::AggregateCounts;
/// use situation_report::category::Filter;
/// use situation_report::graph::build_chart;
///
/// // Nothing counted, nothing drawn
/// assert!(build_chart(&AggregateCounts::default(), Filter::All, 10).is_none());
/// ```
pub fn build_chart(counts: &AggregateCounts, filter: Filter, total_rows: usize) -> Option<ChartSpec> {
    match filter {
        Filter::All => {
            let slices: Vec<Slice> = counts
                .nonzero()
                .map(|(category, value)| Slice {
                    label: category.column().to_string(),
                    value,
                })
                .collect();
            if slices.is_empty() {
                return None;
            }
            Some(ChartSpec {
                title: String::new(),
                slices,
                hole: DONUT_HOLE,
                text: SliceText::PercentLabel,
            })
        }
        Filter::Category(category) => {
            let count = counts.get(category);
            if count == 0 {
                return None;
            }
            Some(ChartSpec {
                title: format!("Distribuição: {}", category),
                slices: vec![
                    Slice {
                        label: category.column().to_string(),
                        value: count,
                    },
                    Slice {
                        label: REMAINDER_LABEL.to_string(),
                        value: total_rows.saturating_sub(count),
                    },
                ],
                hole: DONUT_HOLE,
                text: SliceText::ValuePercent,
            })
        }
    }
}

/// Configuration options for chart rendering
#[derive(Clone, Debug)]
pub struct GraphOptions {
    /// Width of the image in pixels
    pub width: u32,

    /// Height of the image in pixels
    pub height: u32,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

/// Renders a chart spec as a PNG image
///
/// Draws the donut with `plotters` into a temporary file, then reads the
/// encoded image back.
///
/// # Arguments
/// * `spec` - The chart to draw
/// * `options` - Image size
///
/// # Returns
/// * A Result containing the PNG image data as bytes or an error
#[cfg(feature = "web")]
pub fn render_png(spec: &ChartSpec, options: &GraphOptions) -> crate::error::Result<Vec<u8>> {
    use crate::error::ReportError;

    let file = tempfile::Builder::new()
        .prefix("situation_chart")
        .suffix(".png")
        .tempfile()?;
    let path = file.path().to_path_buf();

    draw_donut(spec, options, &path).map_err(|e| ReportError::Chart(e.to_string()))?;

    let png_data = std::fs::read(&path)?;
    Ok(png_data)
}

#[cfg(feature = "web")]
fn draw_donut(
    spec: &ChartSpec,
    options: &GraphOptions,
    path: &std::path::Path,
) -> Result<(), Box<dyn std::error::Error>> {
    use plotters::element::Pie;
    use plotters::prelude::*;

    let root = BitMapBackend::new(path, (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let root = if spec.title.is_empty() {
        root
    } else {
        root.titled(&spec.title, ("sans-serif", 30).into_font())?
    };

    let (width, height) = root.dim_in_pixel();
    let center = (width as i32 / 2, height as i32 / 2);
    let radius = f64::from(width.min(height)) * 0.35;

    let sizes: Vec<f64> = spec.slices.iter().map(|s| s.value as f64).collect();
    let colors: Vec<RGBColor> = (0..spec.slices.len())
        .map(|i| {
            let (r, g, b) = PALETTE[i % PALETTE.len()];
            RGBColor(r, g, b)
        })
        .collect();
    let labels = spec.slice_labels();

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.start_angle(-90.0);
    pie.label_style(("sans-serif", 16).into_font().color(&BLACK));
    pie.donut_hole(radius * spec.hole);
    root.draw(&pie)?;

    root.present()?;
    Ok(())
}
