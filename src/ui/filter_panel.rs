//! Filter sidebar: one dual-handle slider per threshold.
//!
//! Every slider is shown as `low | high` over its domain. For the quality
//! thresholds the handles map onto strict and loose bounds through
//! [`UpperLimit::from_slider`] and [`LowerLimit::from_slider`].

use chrono::{DateTime, Duration, Utc};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState},
};

use crate::classify::{FilterConfig, LowerLimit, Range, UpperLimit};
use crate::config::FilterDefaults;
use crate::table::{Metric, MetricRanges};

const SUN_DOMAIN: (f64, f64) = (-90.0, 90.0);
const LST_STEP: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Date,
    SunElevation,
    InvalidRatioAoi,
    InvalidRatioImage,
    MaxLst,
    MinLst,
}

impl FilterField {
    pub const ALL: [FilterField; 6] = [
        FilterField::Date,
        FilterField::SunElevation,
        FilterField::InvalidRatioAoi,
        FilterField::InvalidRatioImage,
        FilterField::MaxLst,
        FilterField::MinLst,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            FilterField::Date => "Dates",
            FilterField::SunElevation => Metric::SunElevation.label(),
            FilterField::InvalidRatioAoi => Metric::InvalidRatioAoi.label(),
            FilterField::InvalidRatioImage => Metric::InvalidRatioImage.label(),
            FilterField::MaxLst => Metric::MaxLst.label(),
            FilterField::MinLst => Metric::MinLst.label(),
        }
    }

    fn step(&self) -> f64 {
        match self {
            FilterField::MaxLst | FilterField::MinLst => LST_STEP,
            _ => 1.0,
        }
    }
}

/// Which end of a slider moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    Low,
    High,
}

/// Move one handle of `(low, high)` by `delta`, keeping it inside `domain`
/// and never crossing the other handle.
pub fn step_slider(slider: (f64, f64), domain: (f64, f64), handle: Handle, delta: f64) -> (f64, f64) {
    let (low, high) = slider;
    match handle {
        Handle::Low => ((low + delta).clamp(domain.0.min(high), high), high),
        Handle::High => (low, (high + delta).clamp(low, domain.1.max(low))),
    }
}

fn step_dates(
    date: Range<DateTime<Utc>>,
    domain: (DateTime<Utc>, DateTime<Utc>),
    handle: Handle,
    days: i64,
) -> Range<DateTime<Utc>> {
    let delta = Duration::days(days);
    match handle {
        Handle::Low => {
            let moved = date.min + delta;
            Range::new(moved.clamp(domain.0.min(date.max), date.max), date.max)
        }
        Handle::High => {
            let moved = date.max + delta;
            Range::new(date.min, moved.clamp(date.min, domain.1.max(date.min)))
        }
    }
}

/// Sidebar state.
#[derive(Debug, Clone, Default)]
pub struct FilterPanel {
    selected: usize,
}

impl FilterPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(&self) -> FilterField {
        FilterField::ALL[self.selected]
    }

    pub fn move_down(&mut self) {
        if self.selected < FilterField::ALL.len() - 1 {
            self.selected += 1;
        }
    }

    pub fn move_up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
    }

    /// Filters after moving a handle of the focused slider by `steps`.
    pub fn adjust(
        &self,
        filters: &FilterConfig,
        ranges: &MetricRanges,
        defaults: &FilterDefaults,
        handle: Handle,
        steps: i32,
    ) -> FilterConfig {
        let mut next = *filters;
        let field = self.field();
        let delta = field.step() * f64::from(steps);

        match field {
            FilterField::Date => {
                if let Some(domain) = ranges.datetime {
                    next.date = step_dates(filters.date, domain, handle, i64::from(steps));
                }
            }
            FilterField::SunElevation => {
                let sun = filters.sun_elevation;
                let (min, max) = step_slider((sun.min, sun.max), SUN_DOMAIN, handle, delta);
                next.sun_elevation = Range::new(min, max);
            }
            FilterField::InvalidRatioAoi => {
                let slider = upper_slider(&filters.invalid_ratio_aoi);
                next.invalid_ratio_aoi =
                    UpperLimit::from_slider(step_slider(slider, defaults.ratio_domain, handle, delta));
            }
            FilterField::InvalidRatioImage => {
                let slider = upper_slider(&filters.invalid_ratio_image);
                next.invalid_ratio_image =
                    UpperLimit::from_slider(step_slider(slider, defaults.ratio_domain, handle, delta));
            }
            FilterField::MaxLst => {
                let slider = upper_slider(&filters.max_lst);
                let domain = ranges.get(Metric::MaxLst).unwrap_or(slider);
                next.max_lst = UpperLimit::from_slider(step_slider(slider, domain, handle, delta));
            }
            FilterField::MinLst => {
                let slider = lower_slider(&filters.min_lst);
                let domain = ranges.get(Metric::MinLst).unwrap_or(slider);
                next.min_lst = LowerLimit::from_slider(step_slider(slider, domain, handle, delta));
            }
        }

        next
    }
}

fn upper_slider(limit: &UpperLimit) -> (f64, f64) {
    (limit.strict, limit.loose)
}

fn lower_slider(limit: &LowerLimit) -> (f64, f64) {
    (limit.loose, limit.strict)
}

fn field_lines(field: FilterField, filters: &FilterConfig) -> (String, String) {
    match field {
        FilterField::Date => (
            format!(
                "{} .. {}",
                filters.date.min.format("%Y-%m-%d"),
                filters.date.max.format("%Y-%m-%d")
            ),
            String::new(),
        ),
        FilterField::SunElevation => (
            format!("{:.0}° .. {:.0}°", filters.sun_elevation.min, filters.sun_elevation.max),
            String::new(),
        ),
        FilterField::InvalidRatioAoi => ratio_lines(&filters.invalid_ratio_aoi),
        FilterField::InvalidRatioImage => ratio_lines(&filters.invalid_ratio_image),
        FilterField::MaxLst => (
            format!("{:.1} | {:.1} K", filters.max_lst.strict, filters.max_lst.loose),
            "valid | review | invalid".to_string(),
        ),
        FilterField::MinLst => (
            format!("{:.1} | {:.1} K", filters.min_lst.loose, filters.min_lst.strict),
            "invalid | review | valid".to_string(),
        ),
    }
}

fn ratio_lines(limit: &UpperLimit) -> (String, String) {
    (
        format!("{:.0}% | {:.0}%", limit.strict, limit.loose),
        "valid | review | invalid".to_string(),
    )
}

pub fn render(frame: &mut Frame, panel: &FilterPanel, filters: &FilterConfig, focused: bool, area: Rect) {
    let items: Vec<ListItem> = FilterField::ALL
        .iter()
        .map(|&field| {
            let (value, legend) = field_lines(field, filters);
            let mut lines = vec![
                Line::from(Span::styled(field.title(), Style::default().add_modifier(Modifier::BOLD))),
                Line::from(format!("  {}", value)),
            ];
            if !legend.is_empty() {
                lines.push(Line::from(Span::styled(
                    format!("  {}", legend),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            ListItem::new(lines)
        })
        .collect();

    let border_color = if focused { Color::Yellow } else { Color::DarkGray };
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color))
                .title(" Filters "),
        )
        .highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = ListState::default();
    if focused {
        state.select(Some(panel.selected));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::fixtures::{row, table};
    use chrono::TimeZone;

    fn setup() -> (FilterConfig, MetricRanges, FilterDefaults) {
        let mut cold = row("A");
        cold.min_lst = 280.0;
        cold.max_lst = 300.0;
        cold.datetime = Some(Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap());
        let hot = row("B");
        let table = table(vec![cold, hot]);
        let ranges = table.ranges();
        let defaults = FilterDefaults::default();
        (FilterConfig::initial(&ranges, &defaults), ranges, defaults)
    }

    fn panel_at(field: FilterField) -> FilterPanel {
        let mut panel = FilterPanel::new();
        while panel.field() != field {
            panel.move_down();
        }
        panel
    }

    #[test]
    fn test_step_slider_never_crosses() {
        assert_eq!(step_slider((10.0, 40.0), (0.0, 100.0), Handle::Low, 50.0), (40.0, 40.0));
        assert_eq!(step_slider((10.0, 40.0), (0.0, 100.0), Handle::High, -50.0), (10.0, 10.0));
        assert_eq!(step_slider((10.0, 40.0), (0.0, 100.0), Handle::Low, -50.0), (0.0, 40.0));
        assert_eq!(step_slider((10.0, 40.0), (0.0, 100.0), Handle::High, 80.0), (10.0, 100.0));
    }

    #[test]
    fn test_ratio_handles_map_to_strict_and_loose() {
        let (filters, ranges, defaults) = setup();
        let panel = panel_at(FilterField::InvalidRatioAoi);

        let next = panel.adjust(&filters, &ranges, &defaults, Handle::Low, 5);
        assert_eq!(next.invalid_ratio_aoi, UpperLimit { strict: 5.0, loose: 100.0 });

        let next = panel.adjust(&next, &ranges, &defaults, Handle::High, -60);
        assert_eq!(next.invalid_ratio_aoi, UpperLimit { strict: 5.0, loose: 40.0 });
        assert_eq!(next.invalid_ratio_image, filters.invalid_ratio_image);
    }

    #[test]
    fn test_min_lst_low_handle_is_loose() {
        let (filters, ranges, defaults) = setup();
        let panel = panel_at(FilterField::MinLst);
        assert_eq!(filters.min_lst, LowerLimit { strict: 290.0, loose: 280.0 });

        let next = panel.adjust(&filters, &ranges, &defaults, Handle::Low, 4);
        assert_eq!(next.min_lst, LowerLimit { strict: 290.0, loose: 282.0 });

        let next = panel.adjust(&next, &ranges, &defaults, Handle::High, 10);
        assert_eq!(next.min_lst.strict, 290.0);
    }

    #[test]
    fn test_dates_step_by_day_within_data_range() {
        let (filters, ranges, defaults) = setup();
        let panel = panel_at(FilterField::Date);

        let next = panel.adjust(&filters, &ranges, &defaults, Handle::Low, 3);
        assert_eq!(next.date.min, Utc.with_ymd_and_hms(2024, 6, 4, 10, 0, 0).unwrap());

        let next = panel.adjust(&next, &ranges, &defaults, Handle::Low, 100);
        assert_eq!(next.date.min, next.date.max);

        let next = panel.adjust(&filters, &ranges, &defaults, Handle::High, 5);
        assert_eq!(next.date.max, filters.date.max);
    }

    #[test]
    fn test_sun_elevation_domain() {
        let (filters, ranges, defaults) = setup();
        let panel = panel_at(FilterField::SunElevation);

        let next = panel.adjust(&filters, &ranges, &defaults, Handle::Low, -200);
        assert_eq!(next.sun_elevation, Range::new(-90.0, 90.0));
    }
}
