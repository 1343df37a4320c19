//! Charts module - Chart rendering

mod renderer;
mod style;

pub use renderer::{AxisSeries, ChartError, ChartLabels, NamedHistogram, StaticChartRenderer};
pub use style::{parse_hex_color, Palette, PlotStyle};

/// The charts produced for every run, in drawing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    /// Check outs against temperature.
    Scatter,
    /// Fitted regression line.
    BestFit,
    /// Fitted line with the mean confidence band.
    BestFitCi,
    /// Check outs and wind speed over time on two axes.
    DualAxis,
    /// Distribution of registered check outs.
    RegisteredHistogram,
    /// Registered vs casual check outs on shared bins.
    OverlaidHistogram,
}

impl ChartKind {
    pub const ALL: [ChartKind; 6] = [
        ChartKind::Scatter,
        ChartKind::BestFit,
        ChartKind::BestFitCi,
        ChartKind::DualAxis,
        ChartKind::RegisteredHistogram,
        ChartKind::OverlaidHistogram,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            ChartKind::Scatter => "checkouts_vs_temperature.png",
            ChartKind::BestFit => "best_fit.png",
            ChartKind::BestFitCi => "best_fit_ci.png",
            ChartKind::DualAxis => "checkouts_windspeed_over_time.png",
            ChartKind::RegisteredHistogram => "registered_distribution.png",
            ChartKind::OverlaidHistogram => "checkouts_by_type.png",
        }
    }

    pub fn labels(self) -> ChartLabels<'static> {
        match self {
            ChartKind::Scatter => ChartLabels {
                title: "Number of Check Outs vs Temperature",
                x_label: "Normalized temperature (C)",
                y_label: "Check outs",
            },
            ChartKind::BestFit | ChartKind::BestFitCi => ChartLabels {
                title: "Line of Best Fit for Number of Check Outs vs Temperature",
                x_label: "Normalized temperature (C)",
                y_label: "Check outs",
            },
            // The right axis is described by the series itself.
            ChartKind::DualAxis => ChartLabels {
                title: "Check Outs and Windspeed Over Time",
                x_label: "Day",
                y_label: "Check outs",
            },
            ChartKind::RegisteredHistogram => ChartLabels {
                title: "Distribution of Registered Check Outs",
                x_label: "Check outs",
                y_label: "Frequency",
            },
            ChartKind::OverlaidHistogram => ChartLabels {
                title: "Distribution of Check Outs By Type",
                x_label: "Check outs",
                y_label: "Frequency",
            },
        }
    }
}
