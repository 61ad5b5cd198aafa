use ratatui::{
    prelude::*,
    symbols::Marker,
    widgets::{Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph},
};

use crate::charts::{Histogram, TimePoint};
use crate::classify::ReviewLabel;

/// Series of the time-series plot, in draw order.
const SERIES: [(&str, Color); 4] = [
    ("Rejected", Color::Red),
    ("TBD", Color::Yellow),
    ("Validated", Color::Green),
    ("Picked", Color::Cyan),
];

fn series_index(point: &TimePoint) -> usize {
    match point.label {
        ReviewLabel::Rejected => 0,
        ReviewLabel::Tbd if point.picked => 3,
        ReviewLabel::Tbd => 1,
        ReviewLabel::Validated => 2,
    }
}

/// Split points into per-series coordinates, dropping scenes without a
/// median temperature.
fn series_data(points: &[TimePoint]) -> [Vec<(f64, f64)>; 4] {
    let mut data: [Vec<(f64, f64)>; 4] = Default::default();
    for point in points.iter().filter(|p| !p.median_lst.is_nan()) {
        data[series_index(point)].push((point.datetime.timestamp() as f64, point.median_lst));
    }
    data
}

fn padded_bounds(values: impl Iterator<Item = f64>) -> Option<[f64; 2]> {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if lo > hi {
        return None;
    }
    let pad = ((hi - lo) * 0.05).max(0.5);
    Some([lo - pad, hi + pad])
}

pub fn render_time_series(frame: &mut Frame, points: &[TimePoint], area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Median LST over time ");

    let data = series_data(points);
    let all = || data.iter().flatten();
    let (Some(x_bounds), Some(y_bounds)) = (
        padded_bounds(all().map(|(x, _)| *x)),
        padded_bounds(all().map(|(_, y)| *y)),
    ) else {
        let empty = Paragraph::new("No dated scenes to plot")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    };

    let datasets: Vec<Dataset> = SERIES
        .iter()
        .zip(data.iter())
        .filter(|(_, points)| !points.is_empty())
        .map(|((name, color), points)| {
            Dataset::default()
                .name(*name)
                .marker(Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(*color))
                .data(points)
        })
        .collect();

    let date_label = |ts: f64| {
        chrono::DateTime::from_timestamp(ts as i64, 0)
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    };

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds(x_bounds)
                .labels([date_label(x_bounds[0]), date_label(x_bounds[1])]),
        )
        .y_axis(
            Axis::default()
                .title("K")
                .style(Style::default().fg(Color::Gray))
                .bounds(y_bounds)
                .labels([format!("{:.1}", y_bounds[0]), format!("{:.1}", y_bounds[1])]),
        );

    frame.render_widget(chart, area);
}

pub fn render_histogram(frame: &mut Frame, histogram: &Histogram, area: Rect) {
    let range = match (histogram.edges.first(), histogram.edges.last()) {
        (Some(lo), Some(hi)) => format!("{:.1} .. {:.1}", lo, hi),
        _ => String::new(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(
            " {} {} ({} bins) | all {} / selected {} | Tab: next ",
            histogram.metric.label(),
            range,
            histogram.bins(),
            histogram.total_all(),
            histogram.total_selected()
        ));

    let mut chart = BarChart::default()
        .block(block)
        .bar_width(1)
        .bar_gap(0)
        .group_gap(1);

    for (all, selected) in histogram.all.iter().zip(&histogram.selected) {
        let bars = [
            Bar::default()
                .value(*all)
                .text_value(String::new())
                .style(Style::default().fg(Color::Gray)),
            Bar::default()
                .value(*selected)
                .text_value(String::new())
                .style(Style::default().fg(Color::Green)),
        ];
        chart = chart.data(BarGroup::default().bars(&bars));
    }

    frame.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn point(label: ReviewLabel, picked: bool, median_lst: f64) -> TimePoint {
        TimePoint {
            key: "A".to_string(),
            datetime: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            median_lst,
            label,
            picked,
        }
    }

    #[test]
    fn test_points_split_by_label() {
        let points = vec![
            point(ReviewLabel::Validated, false, 300.0),
            point(ReviewLabel::Tbd, true, 301.0),
            point(ReviewLabel::Tbd, false, 302.0),
            point(ReviewLabel::Rejected, false, f64::NAN),
        ];

        let data = series_data(&points);

        assert!(data[0].is_empty());
        assert_eq!(data[1].len(), 1);
        assert_eq!(data[2].len(), 1);
        assert_eq!(data[3][0].1, 301.0);
    }

    #[test]
    fn test_bounds_padding() {
        assert_eq!(padded_bounds([300.0].into_iter()), Some([299.5, 300.5]));
        assert_eq!(padded_bounds(std::iter::empty()), None);
    }
}
