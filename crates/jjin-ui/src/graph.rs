//! Temperature graph math: axis quantization, bar heights and colors for the
//! hourly bar graph, and the per-day range bars.
//!
//! Everything here is pure and works on whole degrees.

use chrono::{Datelike, NaiveDate};
use jjin_weather::DailyForecast;

use crate::theme::{temperature_color, Color, POINT_COLOR};

/// Largest multiple of `step` that is <= `value`.
pub fn floor_to_step(value: i32, step: i32) -> i32 {
    let step = step.max(1);
    value.div_euclid(step) * step
}

/// Smallest multiple of `step` that is >= `value`.
pub fn ceil_to_step(value: i32, step: i32) -> i32 {
    let step = step.max(1);
    -((-value).div_euclid(step) * step)
}

/// Y axis derived from a temperature series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisScale {
    pub graph_min: i32,
    pub graph_max: i32,
    pub true_min: i32,
    pub true_max: i32,
    /// Stepped labels plus the true minimum, descending
    pub labels: Vec<i32>,
}

impl AxisScale {
    /// `None` for an empty series.
    pub fn from_series(series: &[i32], step: i32) -> Option<Self> {
        let step = step.max(1);
        let true_min = *series.iter().min()?;
        let true_max = *series.iter().max()?;
        let graph_min = floor_to_step(true_min, step);
        let graph_max = ceil_to_step(true_max, step);

        let mut labels: Vec<i32> = (graph_min..=graph_max).step_by(step as usize).collect();
        labels.push(true_min);
        labels.sort_unstable_by(|a, b| b.cmp(a));
        labels.dedup();

        Some(Self {
            graph_min,
            graph_max,
            true_min,
            true_max,
            labels,
        })
    }

    /// Span used for normalization; a flat axis counts as 1.
    pub fn range(&self) -> i32 {
        (self.graph_max - self.graph_min).max(1)
    }

    /// Position of `value` on the axis, 0 at `graph_min`, 1 at `graph_max`.
    pub fn position(&self, value: i32) -> f32 {
        ((value - self.graph_min) as f32 / self.range() as f32).clamp(0.0, 1.0)
    }

    /// Bar height fraction, never shorter than `min_fraction`.
    pub fn bar_fraction(&self, value: i32, min_fraction: f32) -> f32 {
        self.position(value).max(min_fraction.clamp(0.0, 1.0))
    }
}

/// 24-hour clock hour shown on the 12-hour axis.
pub fn hour_label(hour: u32) -> u32 {
    if hour > 12 {
        hour - 12
    } else {
        hour
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourlyBar {
    pub hour_label: u32,
    pub temperature: i32,
    pub fraction: f32,
    /// Gradient stop at the top of the bar
    pub top_color: Color,
    /// Gradient stop at the axis floor
    pub bottom_color: Color,
    /// Feels-like marker position, present on the first bar only
    pub feels_like_marker: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Legend {
    pub max_color: Color,
    pub min_color: Color,
    pub feels_like_color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourlyGraph {
    pub scale: AxisScale,
    pub bars: Vec<HourlyBar>,
    pub legend: Legend,
}

impl HourlyGraph {
    /// `temperatures` and `hours` are paired by index; extra entries on
    /// either side are ignored.
    pub fn build(
        temperatures: &[i32],
        hours: &[u32],
        feels_like: i32,
        step: i32,
        min_fraction: f32,
    ) -> Option<Self> {
        let len = temperatures.len().min(hours.len());
        let temperatures = &temperatures[..len];
        let scale = AxisScale::from_series(temperatures, step)?;
        let bottom_color = temperature_color(scale.graph_min);

        let bars = temperatures
            .iter()
            .zip(hours)
            .enumerate()
            .map(|(i, (&temperature, &hour))| HourlyBar {
                hour_label: hour_label(hour),
                temperature,
                fraction: scale.bar_fraction(temperature, min_fraction),
                top_color: temperature_color(temperature),
                bottom_color,
                feels_like_marker: (i == 0).then(|| scale.position(feels_like)),
            })
            .collect();

        let legend = Legend {
            max_color: temperature_color(scale.graph_max),
            min_color: temperature_color(scale.true_min),
            feels_like_color: POINT_COLOR,
        };

        Some(Self {
            scale,
            bars,
            legend,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayLabel {
    Today,
    Date { weekday: String, month: u32, day: u32 },
}

impl DayLabel {
    pub fn for_date(date: NaiveDate, today: NaiveDate) -> Self {
        if date == today {
            Self::Today
        } else {
            Self::Date {
                weekday: date.format("%a").to_string(),
                month: date.month(),
                day: date.day(),
            }
        }
    }
}

/// One day's min..max span on a track shared by the whole list.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRangeBar {
    pub label: DayLabel,
    pub icon_code: String,
    pub min: i32,
    pub max: i32,
    /// Fraction of the track where the bar starts
    pub start: f32,
    /// Fraction of the track where the bar ends
    pub end: f32,
    pub start_color: Color,
    pub end_color: Color,
}

pub fn daily_range_bars(days: &[DailyForecast], today: NaiveDate) -> Vec<DailyRangeBar> {
    let abs_min = days
        .iter()
        .map(|d| d.temperature_range.min as i32)
        .min()
        .unwrap_or(0);
    let abs_max = days
        .iter()
        .map(|d| d.temperature_range.max as i32)
        .max()
        .unwrap_or(0);
    let range = match abs_max - abs_min {
        0 => 1,
        r => r,
    } as f32;

    days.iter()
        .map(|day| {
            let min = day.temperature_range.min as i32;
            let max = day.temperature_range.max as i32;
            DailyRangeBar {
                label: DayLabel::for_date(day.date, today),
                icon_code: day.icon_code.clone(),
                min,
                max,
                start: ((min - abs_min) as f32 / range).clamp(0.0, 1.0),
                end: (1.0 - (abs_max - max) as f32 / range).clamp(0.0, 1.0),
                start_color: temperature_color(min),
                end_color: temperature_color(max),
            }
        })
        .collect()
}
