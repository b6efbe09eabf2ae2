//! Chart rendering of a [`PlotDescriptor`] with plotters.

use anyhow::{anyhow, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;
use tolerance_engine::{LineStyle, MarkerKind, PlotDescriptor};

use crate::config::CliConfig;

const FONT: &str = "sans-serif";
/// Dash and gap length as a fraction of the y axis height.
const DASH_FRACTION: f64 = 1.0 / 40.0;

const HISTOGRAM_COLOR: RGBColor = RGBColor(31, 119, 180);
const CURVE_COLOR: RGBColor = RGBColor(255, 127, 14);
const TOLERANCE_COLOR: RGBColor = RGBColor(0, 128, 0);
const SPEC_LIMIT_COLOR: RGBColor = RGBColor(255, 0, 0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    pub width_px: u32,
    pub height_px: u32,
    /// Pixels per typographic point (dpi / 72)
    pub px_per_pt: f64,
}

impl RenderOptions {
    pub fn from_config(config: &CliConfig) -> Self {
        let (width_px, height_px) = config.plot_size_px();
        Self {
            width_px,
            height_px,
            px_per_pt: config.plot_dpi as f64 / 72.0,
        }
    }

    fn pt(&self, points: f64) -> f64 {
        points * self.px_per_pt
    }

    fn stroke(&self, points: f64) -> u32 {
        self.pt(points).round().max(1.0) as u32
    }

    fn px(&self, points: f64) -> i32 {
        self.stroke(points) as i32
    }

    fn font(&self, points: f64) -> FontDesc<'static> {
        (FONT, self.pt(points)).into_font()
    }
}

pub fn render_svg(plot: &PlotDescriptor, path: &Path, options: &RenderOptions) -> Result<()> {
    let root = SVGBackend::new(path, (options.width_px, options.height_px)).into_drawing_area();
    draw(&root, plot, options)
}

fn draw<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    plot: &PlotDescriptor,
    opts: &RenderOptions,
) -> Result<()> {
    root.fill(&WHITE).map_err(plot_err)?;

    let (x_min, x_max) = plot.x_range;
    let y_max = match plot.y_max() {
        y if y > 0.0 && y.is_finite() => y * 1.05,
        _ => 1.0,
    };

    let mut chart = ChartBuilder::on(root)
        .caption(&plot.title, opts.font(12.0))
        .margin(opts.px(10.0))
        .x_label_area_size(opts.px(30.0))
        .y_label_area_size(opts.px(45.0))
        .build_cartesian_2d(x_min..x_max, 0.0..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc(&plot.x_label)
        .y_desc(&plot.y_label)
        .label_style(opts.font(9.0))
        .axis_desc_style(opts.font(10.0))
        .draw()
        .map_err(plot_err)?;

    if let Some(hist) = &plot.histogram {
        chart
            .draw_series(hist.bins().map(|(lo, hi, density)| {
                Rectangle::new([(lo, 0.0), (hi, density)], HISTOGRAM_COLOR.mix(0.8).filled())
            }))
            .map_err(plot_err)?;
    }

    chart
        .draw_series(LineSeries::new(
            plot.density.iter().cloned(),
            CURVE_COLOR.stroke_width(opts.stroke(1.5)),
        ))
        .map_err(plot_err)?;

    let dash = y_max * DASH_FRACTION;
    for marker in &plot.markers {
        let color = match marker.kind {
            MarkerKind::Tolerance => TOLERANCE_COLOR,
            MarkerKind::SpecLimit => SPEC_LIMIT_COLOR,
        };
        let style = color.stroke_width(opts.stroke(1.5));
        let segments = match marker.style {
            LineStyle::Dashed => dashed_segments(marker.x, y_max, dash),
            LineStyle::Solid => vec![((marker.x, 0.0), (marker.x, y_max))],
        };

        let anno = chart
            .draw_series(
                segments
                    .into_iter()
                    .map(move |(a, b)| PathElement::new(vec![a, b], style)),
            )
            .map_err(plot_err)?;

        if let Some(label) = &marker.label {
            let legend_len = opts.px(20.0);
            anno.label(label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + legend_len, y)], style));
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .label_font(opts.font(10.0))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}

/// Vertical dash segments from 0 to `top`, alternating dash and gap.
fn dashed_segments(x: f64, top: f64, dash: f64) -> Vec<((f64, f64), (f64, f64))> {
    if dash <= 0.0 {
        return vec![((x, 0.0), (x, top))];
    }
    let mut segments = Vec::new();
    let mut y = 0.0;
    while y < top {
        segments.push(((x, y), (x, (y + dash).min(top))));
        y += 2.0 * dash;
    }
    segments
}

fn plot_err<E: std::fmt::Debug>(e: E) -> anyhow::Error {
    anyhow!("chart rendering failed: {e:?}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tolerance_engine::{
        SampleSpecification, SpecificationLimits, ToleranceIntervalEngine, ToleranceRequest,
        IntervalParameters, PlotLabels, Sidedness,
    };

    fn render_svg_string(plot: &PlotDescriptor, options: &RenderOptions) -> Result<String> {
        let mut buf = String::new();
        {
            let root = SVGBackend::with_string(&mut buf, (options.width_px, options.height_px))
                .into_drawing_area();
            draw(&root, plot, options)?;
        }
        Ok(buf)
    }

    fn small_options() -> RenderOptions {
        RenderOptions {
            width_px: 440,
            height_px: 320,
            px_per_pt: 1.0,
        }
    }

    #[test]
    fn test_dashed_segments_cover_axis() {
        let segments = dashed_segments(2.0, 1.0, 0.25);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0], ((2.0, 0.0), (2.0, 0.25)));
        assert_eq!(segments[1], ((2.0, 0.5), (2.0, 0.75)));
        assert_eq!(dashed_segments(1.0, 1.0, 0.0).len(), 1);
    }

    #[test]
    fn test_options_from_config() {
        let opts = RenderOptions::from_config(&CliConfig::default());
        assert_eq!((opts.width_px, opts.height_px), (6600, 4800));
        assert!((12..=13).contains(&opts.stroke(1.5)));
    }

    #[test]
    fn test_render_svg_string_contains_legend() {
        let request = ToleranceRequest::new(
            SampleSpecification::raw(vec![9.8, 10.1, 10.0, 9.9, 10.2, 10.3, 9.7, 10.0]),
            IntervalParameters::new(0.05, 0.95, Sidedness::TwoSided),
        )
        .with_limits(SpecificationLimits::two_sided(9.0, 11.0))
        .with_labels(PlotLabels::new("Length", "Batch A"));
        let result = ToleranceIntervalEngine::new().compute(&request).unwrap();

        let svg = render_svg_string(&result.plot, &small_options()).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Batch A"));
        assert!(svg.contains("Tolerance"));
        assert!(svg.contains("Spec Limits"));
        assert!(svg.contains("Probability density"));
    }
}
