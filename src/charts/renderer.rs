//! Static Chart Renderer
//! Draws the exploratory charts to PNG files with plotters.
//!
//! Every chart shares the figure settings of [`PlotStyle`]: white
//! background, left and bottom axes only, no grid lines unless enabled.

use crate::charts::style::{Palette, PlotStyle};
use crate::stats::Histogram;
use chrono::{Duration, NaiveDate};
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontDesc;
use std::ops::Range;
use std::path::Path;
use thiserror::Error;

/// Marker radius in pixels, close to a matplotlib marker size of 30.
const MARKER_RADIUS: u32 = 4;
/// Fraction of the data span added on each side of an axis.
const AXIS_PAD: f64 = 0.05;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Render error: {0}")]
    Render(String),
    #[error("Series '{0}' is empty")]
    EmptySeries(&'static str),
    #[error("Series lengths differ ({0} vs {1})")]
    LengthMismatch(usize, usize),
    #[error("Invalid colour '{0}', expected #rrggbb")]
    InvalidColor(String),
}

fn render_err<E: std::fmt::Display>(e: E) -> ChartError {
    ChartError::Render(e.to_string())
}

/// Title and axis descriptions of a chart.
#[derive(Debug, Clone, Copy)]
pub struct ChartLabels<'a> {
    pub title: &'a str,
    pub x_label: &'a str,
    pub y_label: &'a str,
}

/// A series drawn on one axis of a dual-axis chart.
#[derive(Debug, Clone, Copy)]
pub struct AxisSeries<'a> {
    pub values: &'a [f64],
    pub label: &'a str,
}

/// A named series of an overlaid histogram.
#[derive(Debug, Clone, Copy)]
pub struct NamedHistogram<'a> {
    pub hist: &'a Histogram,
    pub name: &'a str,
}

pub struct StaticChartRenderer {
    style: PlotStyle,
    primary: RGBColor,
    secondary: RGBColor,
}

/// Bitmap drawing area backed by a PNG file.
type Canvas<'p> = DrawingArea<BitMapBackend<'p>, Shift>;
/// Chart with `f64` coordinates on both axes.
type XyChart<'a, 'p> = ChartContext<'a, BitMapBackend<'p>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

impl StaticChartRenderer {
    pub fn new(style: PlotStyle, palette: &Palette) -> Result<Self, ChartError> {
        Ok(Self {
            style,
            primary: palette.primary_rgb()?,
            secondary: palette.secondary_rgb()?,
        })
    }

    fn font(&self, size: u32) -> FontDesc<'_> {
        (self.style.font_family.as_str(), size).into_font()
    }

    fn label_size(&self) -> u32 {
        self.style.font_size.saturating_sub(2).max(1)
    }

    /// Axis description colours of the dual-axis chart: x, left y, right y.
    fn dual_axis_desc_colors(&self) -> [RGBColor; 3] {
        [BLACK, self.primary, self.secondary]
    }

    /// White figure of the configured size, writing to `path` on present.
    fn canvas<'p>(&self, path: &'p Path) -> Result<Canvas<'p>, ChartError> {
        let root = BitMapBackend::new(path, self.style.pixel_size()).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;
        Ok(root)
    }

    /// Builder with the title, margins and label areas shared by all charts.
    fn builder<'a, 'p>(
        &'a self,
        root: &'a Canvas<'p>,
        title: &str,
    ) -> ChartBuilder<'a, 'a, BitMapBackend<'p>> {
        let mut builder = ChartBuilder::on(root);
        builder
            .caption(title, self.font(self.style.title_size()))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(80);
        builder
    }

    /// Cartesian chart with both axes described and drawn.
    fn xy_chart<'a, 'p>(
        &'a self,
        root: &'a Canvas<'p>,
        labels: ChartLabels<'_>,
        x_range: Range<f64>,
        y_range: Range<f64>,
    ) -> Result<XyChart<'a, 'p>, ChartError> {
        let mut chart = self
            .builder(root, labels.title)
            .build_cartesian_2d(x_range, y_range)
            .map_err(render_err)?;

        let mut mesh = chart.configure_mesh();
        if !self.style.show_grid {
            mesh.disable_mesh();
        }
        mesh.x_desc(labels.x_label)
            .y_desc(labels.y_label)
            .axis_desc_style(self.font(self.style.font_size))
            .label_style(self.font(self.label_size()))
            .draw()
            .map_err(render_err)?;

        Ok(chart)
    }

    fn draw_legend<'a, 'p: 'a>(
        &self,
        chart: &mut XyChart<'a, 'p>,
        position: SeriesLabelPosition,
    ) -> Result<(), ChartError> {
        chart
            .configure_series_labels()
            .position(position)
            .label_font(self.font(self.label_size()))
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(render_err)
    }

    /// Points coloured with the primary colour at 75% opacity.
    pub fn scatterplot(
        &self,
        path: &Path,
        x: &[f64],
        y: &[f64],
        labels: ChartLabels<'_>,
    ) -> Result<(), ChartError> {
        check_pair(x, y)?;
        let x_range = padded_range(x, AXIS_PAD)?;
        let y_range = padded_range(y, AXIS_PAD)?;

        let root = self.canvas(path)?;
        let mut chart = self.xy_chart(&root, labels, x_range, y_range)?;

        let marker = self.primary.mix(0.75).filled();
        chart
            .draw_series(
                x.iter()
                    .zip(y)
                    .map(|(&xi, &yi)| Circle::new((xi, yi), MARKER_RADIUS, marker)),
            )
            .map_err(render_err)?;

        root.present().map_err(render_err)?;
        Ok(())
    }

    /// A single line, 2 px wide, drawn in ascending x order.
    pub fn lineplot(
        &self,
        path: &Path,
        x: &[f64],
        y: &[f64],
        labels: ChartLabels<'_>,
    ) -> Result<(), ChartError> {
        check_pair(x, y)?;
        let x_range = padded_range(x, AXIS_PAD)?;
        let y_range = padded_range(y, AXIS_PAD)?;

        let root = self.canvas(path)?;
        let mut chart = self.xy_chart(&root, labels, x_range, y_range)?;

        chart
            .draw_series(LineSeries::new(sorted_pairs(x, y), self.primary.stroke_width(2)))
            .map_err(render_err)?;

        root.present().map_err(render_err)?;
        Ok(())
    }

    /// Fit line with a shaded confidence band. `band` holds
    /// `(x, low, upper)` sorted by x.
    pub fn lineplot_ci(
        &self,
        path: &Path,
        x: &[f64],
        y: &[f64],
        band: &[(f64, f64, f64)],
        band_label: &str,
        labels: ChartLabels<'_>,
    ) -> Result<(), ChartError> {
        check_pair(x, y)?;
        if band.is_empty() {
            return Err(ChartError::EmptySeries("confidence band"));
        }
        let x_range = padded_range(x, AXIS_PAD)?;
        let band_values: Vec<f64> = band.iter().flat_map(|&(_, lo, hi)| [lo, hi]).collect();
        let y_range = padded_range(&[y, band_values.as_slice()].concat(), AXIS_PAD)?;

        let root = self.canvas(path)?;
        let mut chart = self.xy_chart(&root, labels, x_range, y_range)?;

        let line = self.primary.stroke_width(1);
        chart
            .draw_series(LineSeries::new(sorted_pairs(x, y), line))
            .map_err(render_err)?
            .label("Fit")
            .legend(move |(lx, ly)| PathElement::new(vec![(lx, ly), (lx + 20, ly)], line));

        // Upper edge left to right, then lower edge back.
        let outline: Vec<(f64, f64)> = band
            .iter()
            .map(|&(bx, _, hi)| (bx, hi))
            .chain(band.iter().rev().map(|&(bx, lo, _)| (bx, lo)))
            .collect();
        let fill = self.primary.mix(0.4).filled();
        chart
            .draw_series(std::iter::once(Polygon::new(outline, fill)))
            .map_err(render_err)?
            .label(band_label)
            .legend(move |(lx, ly)| Rectangle::new([(lx, ly - 5), (lx + 20, ly + 5)], fill));

        self.draw_legend(&mut chart, SeriesLabelPosition::UpperLeft)?;

        root.present().map_err(render_err)?;
        Ok(())
    }

    /// Two series over the same dates, each on its own y axis. The y axis
    /// descriptions take the colour of their series.
    pub fn lineplot_2y(
        &self,
        path: &Path,
        dates: &[NaiveDate],
        left: AxisSeries<'_>,
        right: AxisSeries<'_>,
        title: &str,
        x_label: &str,
    ) -> Result<(), ChartError> {
        if dates.is_empty() {
            return Err(ChartError::EmptySeries("dates"));
        }
        for series in [left.values, right.values] {
            if series.len() != dates.len() {
                return Err(ChartError::LengthMismatch(dates.len(), series.len()));
            }
        }
        let x_range = date_range(dates)?;
        let y1_range = padded_range(left.values, AXIS_PAD)?;
        let y2_range = padded_range(right.values, AXIS_PAD)?;

        let root = self.canvas(path)?;
        let mut chart = self
            .builder(&root, title)
            .right_y_label_area_size(80)
            .build_cartesian_2d(x_range.clone(), y1_range)
            .map_err(render_err)?
            .set_secondary_coord(x_range, y2_range);

        let [x_color, left_color, right_color] = self.dual_axis_desc_colors();
        let blank_date = |_: &NaiveDate| String::new();
        let blank_value = |_: &f64| String::new();

        // A mesh has one description style, so the x and left descriptions
        // are drawn in separate passes; each pass blanks the other's labels.
        let mut x_mesh = chart.configure_mesh();
        if !self.style.show_grid {
            x_mesh.disable_mesh();
        }
        x_mesh
            .x_desc(x_label)
            .y_label_formatter(&blank_value)
            .axis_desc_style(self.font(self.style.font_size).color(&x_color))
            .label_style(self.font(self.label_size()))
            .draw()
            .map_err(render_err)?;

        let mut y_mesh = chart.configure_mesh();
        if !self.style.show_grid {
            y_mesh.disable_mesh();
        }
        y_mesh
            .y_desc(left.label)
            .x_label_formatter(&blank_date)
            .axis_desc_style(self.font(self.style.font_size).color(&left_color))
            .label_style(self.font(self.label_size()))
            .draw()
            .map_err(render_err)?;

        chart
            .configure_secondary_axes()
            .y_desc(right.label)
            .axis_desc_style(self.font(self.style.font_size).color(&right_color))
            .label_style(self.font(self.label_size()))
            .draw()
            .map_err(render_err)?;

        chart
            .draw_series(LineSeries::new(
                dates.iter().copied().zip(left.values.iter().copied()),
                self.primary.stroke_width(1),
            ))
            .map_err(render_err)?;
        chart
            .draw_secondary_series(LineSeries::new(
                dates.iter().copied().zip(right.values.iter().copied()),
                self.secondary.stroke_width(1),
            ))
            .map_err(render_err)?;

        root.present().map_err(render_err)?;
        Ok(())
    }

    /// Bars of a single histogram in the primary colour.
    pub fn histogram(
        &self,
        path: &Path,
        hist: &Histogram,
        labels: ChartLabels<'_>,
    ) -> Result<(), ChartError> {
        let (lo, hi) = hist.range();
        let root = self.canvas(path)?;
        let mut chart = self.xy_chart(
            &root,
            labels,
            pad(lo, hi, AXIS_PAD),
            count_range(hist.max_count()),
        )?;

        let fill = self.primary.filled();
        chart
            .draw_series(
                hist.bins()
                    .map(|(l, r, c)| Rectangle::new([(l, 0.0), (r, c as f64)], fill)),
            )
            .map_err(render_err)?;

        root.present().map_err(render_err)?;
        Ok(())
    }

    /// Two histograms over shared bins: the first opaque in the primary
    /// colour, the second on top at 75% opacity in the secondary colour.
    pub fn overlaid_histogram(
        &self,
        path: &Path,
        first: NamedHistogram<'_>,
        second: NamedHistogram<'_>,
        labels: ChartLabels<'_>,
    ) -> Result<(), ChartError> {
        let (lo1, hi1) = first.hist.range();
        let (lo2, hi2) = second.hist.range();
        let x_range = pad(lo1.min(lo2), hi1.max(hi2), AXIS_PAD);
        let max_count = first.hist.max_count().max(second.hist.max_count());

        let root = self.canvas(path)?;
        let mut chart = self.xy_chart(&root, labels, x_range, count_range(max_count))?;

        for (series, fill) in [
            (first, self.primary.filled()),
            (second, self.secondary.mix(0.75).filled()),
        ] {
            chart
                .draw_series(
                    series
                        .hist
                        .bins()
                        .map(|(l, r, c)| Rectangle::new([(l, 0.0), (r, c as f64)], fill)),
                )
                .map_err(render_err)?
                .label(series.name)
                .legend(move |(lx, ly)| Rectangle::new([(lx, ly - 5), (lx + 20, ly + 5)], fill));
        }

        self.draw_legend(&mut chart, SeriesLabelPosition::UpperRight)?;

        root.present().map_err(render_err)?;
        Ok(())
    }
}

fn check_pair(x: &[f64], y: &[f64]) -> Result<(), ChartError> {
    if x.is_empty() {
        return Err(ChartError::EmptySeries("x"));
    }
    if x.len() != y.len() {
        return Err(ChartError::LengthMismatch(x.len(), y.len()));
    }
    Ok(())
}

/// Points sorted by x so lines are drawn left to right.
fn sorted_pairs(x: &[f64], y: &[f64]) -> Vec<(f64, f64)> {
    let mut points: Vec<(f64, f64)> = x.iter().copied().zip(y.iter().copied()).collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    points
}

/// Data range of finite values widened by `frac` of its span on each side.
fn padded_range(values: &[f64], frac: f64) -> Result<Range<f64>, ChartError> {
    let (min, max) = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
        .ok_or(ChartError::EmptySeries("values"))?;
    Ok(pad(min, max, frac))
}

fn pad(min: f64, max: f64, frac: f64) -> Range<f64> {
    let span = max - min;
    if span == 0.0 {
        let half = if min == 0.0 { 1.0 } else { min.abs() * frac };
        return (min - half)..(max + half);
    }
    (min - span * frac)..(max + span * frac)
}

/// Vertical range for bar heights, starting at zero.
fn count_range(max_count: usize) -> Range<f64> {
    0.0..(max_count.max(1) as f64 * (1.0 + AXIS_PAD))
}

fn date_range(dates: &[NaiveDate]) -> Result<Range<NaiveDate>, ChartError> {
    let first = *dates.iter().min().ok_or(ChartError::EmptySeries("dates"))?;
    let last = *dates.iter().max().ok_or(ChartError::EmptySeries("dates"))?;
    // A single day still needs a non-empty axis.
    if first == last {
        return Ok(first..last + Duration::days(1));
    }
    Ok(first..last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_range() {
        let range = padded_range(&[0.0, 10.0, f64::NAN], 0.05).unwrap();
        assert_eq!(range, -0.5..10.5);

        let flat = padded_range(&[4.0, 4.0], 0.05).unwrap();
        assert!(flat.start < 4.0 && flat.end > 4.0);

        let zero = padded_range(&[0.0], 0.05).unwrap();
        assert_eq!(zero, -1.0..1.0);

        assert!(matches!(
            padded_range(&[f64::NAN], 0.05),
            Err(ChartError::EmptySeries(_))
        ));
    }

    #[test]
    fn test_sorted_pairs() {
        let pairs = sorted_pairs(&[0.3, 0.1, 0.2], &[3.0, 1.0, 2.0]);
        assert_eq!(pairs, vec![(0.1, 1.0), (0.2, 2.0), (0.3, 3.0)]);
    }

    #[test]
    fn test_check_pair() {
        assert!(check_pair(&[1.0], &[2.0]).is_ok());
        assert!(matches!(
            check_pair(&[], &[]),
            Err(ChartError::EmptySeries("x"))
        ));
        assert!(matches!(
            check_pair(&[1.0, 2.0], &[1.0]),
            Err(ChartError::LengthMismatch(2, 1))
        ));
    }

    #[test]
    fn test_date_range_single_day() {
        let day = NaiveDate::from_ymd_opt(2012, 6, 1).unwrap();
        let range = date_range(&[day]).unwrap();
        assert_eq!(range.start, day);
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2012, 6, 2).unwrap());
    }

    #[test]
    fn test_count_range_starts_at_zero() {
        assert_eq!(count_range(0).start, 0.0);
        assert!(count_range(20).end > 20.0);
    }

    fn renderer() -> StaticChartRenderer {
        let style = PlotStyle {
            width_in: 6.4,
            height_in: 4.8,
            ..PlotStyle::default()
        };
        StaticChartRenderer::new(style, &Palette::default()).unwrap()
    }

    fn assert_png(path: &Path) {
        let bytes = std::fs::read(path).unwrap();
        assert!(bytes.len() > 8);
        assert_eq!(&bytes[..4], b"\x89PNG");
    }

    #[test]
    fn test_mismatched_dual_axis_fails_before_drawing() {
        let renderer = renderer();
        let dir = tempfile::TempDir::new().unwrap();
        let day = NaiveDate::from_ymd_opt(2011, 1, 1).unwrap();
        let err = renderer
            .lineplot_2y(
                &dir.path().join("x.png"),
                &[day, day + Duration::days(1)],
                AxisSeries { values: &[1.0, 2.0], label: "a" },
                AxisSeries { values: &[1.0], label: "b" },
                "t",
                "Day",
            )
            .unwrap_err();
        assert!(matches!(err, ChartError::LengthMismatch(2, 1)));
        assert!(!dir.path().join("x.png").exists());
    }

    #[test]
    fn test_only_y_descriptions_are_coloured() {
        let renderer = renderer();
        let palette = Palette::default();
        let [x, left, right] = renderer.dual_axis_desc_colors();
        assert_eq!(x, BLACK);
        assert_eq!(left, palette.primary_rgb().unwrap());
        assert_eq!(right, palette.secondary_rgb().unwrap());
    }

    #[test]
    fn test_empty_band_is_rejected() {
        let renderer = renderer();
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ci.png");
        let labels = ChartLabels { title: "t", x_label: "x", y_label: "y" };
        let err = renderer
            .lineplot_ci(&path, &[0.1, 0.2], &[1.0, 2.0], &[], "95% CI", labels)
            .unwrap_err();
        assert!(matches!(err, ChartError::EmptySeries("confidence band")));
        assert!(!path.exists());
    }

    #[test]
    fn test_draws_dual_axis_and_band_charts() {
        let renderer = renderer();
        let dir = tempfile::TempDir::new().unwrap();
        let start = NaiveDate::from_ymd_opt(2011, 1, 1).unwrap();
        let dates: Vec<NaiveDate> = (0..5).map(|i| start + Duration::days(i)).collect();
        let labels = ChartLabels { title: "t", x_label: "x", y_label: "y" };

        let dual = dir.path().join("dual.png");
        renderer
            .lineplot_2y(
                &dual,
                &dates,
                AxisSeries { values: &[985.0, 801.0, 1349.0, 1562.0, 1600.0], label: "Check outs" },
                AxisSeries { values: &[0.16, 0.25, 0.25, 0.16, 0.19], label: "Windspeed" },
                "t",
                "Day",
            )
            .unwrap();
        assert_png(&dual);

        let ci = dir.path().join("ci.png");
        let band = [(0.1, 0.5, 1.5), (0.2, 1.6, 2.4), (0.3, 2.5, 3.5)];
        renderer
            .lineplot_ci(&ci, &[0.2, 0.1, 0.3], &[2.0, 1.0, 3.0], &band, "95% CI", labels)
            .unwrap();
        assert_png(&ci);
    }
}
