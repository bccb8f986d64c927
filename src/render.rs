//! Plotly figures for one signal buffer: the readings plus a dashed mean line.
//!
//! Figures are rebuilt from a full buffer snapshot on every call and serialized
//! straight into the `{data, layout}` shape `Plotly.react` accepts.

use serde::Serialize;
use utoipa::ToSchema;

use crate::series::SeriesBuffer;
use crate::signals::Signal;
use crate::timeconv::format_local;

const MEAN_COLOR: &str = "blue";

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ChartFigure {
    pub data: Vec<Trace>,
    /// Absent for the empty placeholder figure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Trace {
    #[serde(rename = "type")]
    pub trace_type: String,
    /// RFC 3339 local timestamps
    pub x: Vec<String>,
    pub y: Vec<f64>,
    pub mode: String,
    pub name: String,
    pub line: Line,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Line {
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Layout {
    pub title: Title,
    pub xaxis: Axis,
    pub yaxis: Axis,
    pub hovermode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Title {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Axis {
    pub title: Title,
}

impl ChartFigure {
    /// Placeholder: no traces, no axes.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            layout: None,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The mean drawn by the reference trace, if any.
    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        self.data.get(1).and_then(|trace| trace.y.first().copied())
    }
}

/// Arithmetic mean, `None` for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let count = values.len() as f64;
    Some(values.iter().sum::<f64>() / count)
}

/// Render `buffer` as the readings trace plus a mean line spanning its first
/// and last timestamp.
#[must_use]
pub fn render(signal: Signal, buffer: &SeriesBuffer) -> ChartFigure {
    let (Some(first), Some(last), Some(mean_value)) = (
        buffer.first_timestamp(),
        buffer.last_timestamp(),
        mean(buffer.values()),
    ) else {
        return ChartFigure::empty();
    };

    let label = signal.label();

    let readings = Trace {
        trace_type: "scatter".to_string(),
        x: buffer.timestamps().iter().map(format_local).collect(),
        y: buffer.values().to_vec(),
        mode: "lines+markers".to_string(),
        name: label.to_string(),
        line: Line {
            color: signal.color().to_string(),
            dash: None,
        },
    };

    let mean_line = Trace {
        trace_type: "scatter".to_string(),
        x: vec![format_local(first), format_local(last)],
        y: vec![mean_value, mean_value],
        mode: "lines".to_string(),
        name: format!("Mean {label}"),
        line: Line {
            color: MEAN_COLOR.to_string(),
            dash: Some("dash".to_string()),
        },
    };

    ChartFigure {
        data: vec![readings, mean_line],
        layout: Some(Layout {
            title: Title {
                text: format!("{label} Over Time"),
            },
            xaxis: Axis {
                title: Title {
                    text: "Timestamp".to_string(),
                },
            },
            yaxis: Axis {
                title: Title {
                    text: label.to_string(),
                },
            },
            hovermode: "closest".to_string(),
        }),
    }
}
