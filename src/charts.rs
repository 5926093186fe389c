use std::f64::consts::PI;
use std::io::{self, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::cursor;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::widgets::canvas::{Canvas, Points};
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph,
};

use crate::store::{LeagueCount, SeasonCount, SeasonGoals, TOP_LEAGUES};

const SLICE_COLORS: [Color; 3] = [
    Color::Rgb(255, 153, 153),
    Color::Rgb(102, 179, 255),
    Color::Rgb(153, 255, 153),
];
const BAR_COLOR: Color = Color::Rgb(135, 206, 235);
const LINE_COLOR: Color = Color::Green;

#[derive(Debug, Clone, PartialEq)]
pub struct BarChartView {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bars: Vec<(String, u64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineChartView {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieChartView {
    pub title: String,
    pub slices: Vec<(String, u64)>,
}

impl PieChartView {
    // percent of total; empty when the total is 0
    pub fn shares(&self) -> Vec<(String, f64)> {
        let total: u64 = self.slices.iter().map(|(_, v)| *v).sum();
        if total == 0 {
            return Vec::new();
        }
        self.slices
            .iter()
            .map(|(label, v)| (label.clone(), *v as f64 * 100.0 / total as f64))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartView {
    Bar(BarChartView),
    Line(LineChartView),
    Pie(PieChartView),
}

impl ChartView {
    pub fn title(&self) -> &str {
        match self {
            ChartView::Bar(v) => &v.title,
            ChartView::Line(v) => &v.title,
            ChartView::Pie(v) => &v.title,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ChartView::Bar(v) => v.bars.is_empty(),
            ChartView::Line(v) => v.points.is_empty(),
            ChartView::Pie(v) => v.shares().is_empty(),
        }
    }
}

pub fn matches_per_season_chart(rows: &[SeasonCount]) -> ChartView {
    ChartView::Bar(BarChartView {
        title: "Matches per season".to_string(),
        x_label: "Season".to_string(),
        y_label: "Matches".to_string(),
        bars: rows.iter().map(|r| (r.year.clone(), r.matches)).collect(),
    })
}

pub fn average_goals_chart(rows: &[SeasonGoals]) -> ChartView {
    ChartView::Line(LineChartView {
        title: "Average goals per match".to_string(),
        x_label: "Season".to_string(),
        y_label: "Average goals".to_string(),
        points: rows.iter().map(|r| (r.year.clone(), r.avg_goals)).collect(),
    })
}

pub fn top_leagues_chart(rows: &[LeagueCount]) -> ChartView {
    ChartView::Pie(PieChartView {
        title: format!("Top {TOP_LEAGUES} leagues by match count"),
        slices: rows.iter().map(|r| (r.league.clone(), r.matches)).collect(),
    })
}

pub trait ChartSurface {
    fn show(&mut self, chart: &ChartView) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct TerminalSurface;

impl ChartSurface for TerminalSurface {
    fn show(&mut self, chart: &ChartView) -> Result<()> {
        enable_raw_mode().context("enable raw mode")?;
        with_restore(|| draw_until_key(chart), restore_terminal)
    }
}

// Runs `body`, then `restore` whether or not `body` failed. The body's error wins.
fn with_restore<T>(
    body: impl FnOnce() -> Result<T>,
    restore: impl FnOnce() -> Result<()>,
) -> Result<T> {
    let res = body();
    let restored = restore();
    let value = res?;
    restored?;
    Ok(value)
}

fn draw_until_key(chart: &ChartView) -> Result<()> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    run_modal(&mut terminal, chart)
}

fn restore_terminal() -> Result<()> {
    let raw = disable_raw_mode().context("disable raw mode");
    execute!(io::stdout(), LeaveAlternateScreen, cursor::Show)
        .context("leave alternate screen")?;
    raw
}

fn run_modal<B: Backend>(terminal: &mut Terminal<B>, chart: &ChartView) -> Result<()> {
    let poll = Duration::from_millis(250);
    loop {
        terminal
            .draw(|f| {
                let area = f.size();
                render_chart(f, area, chart);
            })
            .context("draw chart")?;
        if event::poll(poll).context("poll terminal events")? {
            if let Event::Key(key) = event::read().context("read terminal event")? {
                if key.kind == KeyEventKind::Press {
                    return Ok(());
                }
            }
        }
    }
}

pub struct TextSurface<W> {
    out: W,
}

impl<W: Write> TextSurface<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ChartSurface for TextSurface<W> {
    fn show(&mut self, chart: &ChartView) -> Result<()> {
        writeln!(self.out, "{}", chart.title()).context("write chart")?;
        match chart {
            ChartView::Bar(v) => {
                for (label, value) in &v.bars {
                    writeln!(self.out, "  {label}: {value}").context("write chart")?;
                }
            }
            ChartView::Line(v) => {
                for (label, value) in &v.points {
                    writeln!(self.out, "  {label}: {value:.2}").context("write chart")?;
                }
            }
            ChartView::Pie(v) => {
                for (label, pct) in v.shares() {
                    writeln!(self.out, "  {label}: {pct:.1}%").context("write chart")?;
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct NoSurface;

impl ChartSurface for NoSurface {
    fn show(&mut self, _chart: &ChartView) -> Result<()> {
        Ok(())
    }
}

pub fn render_chart(frame: &mut Frame, area: Rect, chart: &ChartView) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    if chart.is_empty() {
        let empty = Paragraph::new("No data to chart")
            .style(Style::default().fg(Color::DarkGray))
            .block(chart_block(chart.title()));
        frame.render_widget(empty, chunks[0]);
    } else {
        match chart {
            ChartView::Bar(v) => render_bar(frame, chunks[0], v),
            ChartView::Line(v) => render_line(frame, chunks[0], v),
            ChartView::Pie(v) => render_pie(frame, chunks[0], v),
        }
    }

    let footer = Paragraph::new(footer_text(chart)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[1]);
}

fn footer_text(chart: &ChartView) -> String {
    match chart {
        ChartView::Bar(v) => format!("x: {} | y: {} | any key to continue", v.x_label, v.y_label),
        ChartView::Line(v) => format!("x: {} | y: {} | any key to continue", v.x_label, v.y_label),
        ChartView::Pie(_) => "any key to continue".to_string(),
    }
}

fn chart_block(title: &str) -> Block<'_> {
    Block::default()
        .title(Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
}

fn render_bar(frame: &mut Frame, area: Rect, view: &BarChartView) {
    let bars: Vec<Bar> = view
        .bars
        .iter()
        .map(|(label, value)| {
            Bar::default()
                .label(Line::from(label.clone()))
                .value(*value)
                .text_value(value.to_string())
                .style(Style::default().fg(BAR_COLOR))
                .value_style(Style::default().fg(Color::Black).bg(BAR_COLOR))
        })
        .collect();

    let gap = 1u16;
    let count = bars.len().max(1) as u16;
    let inner_width = area.width.saturating_sub(2);
    let bar_width = (inner_width / count).saturating_sub(gap).clamp(1, 9);

    let chart = BarChart::default()
        .block(chart_block(&view.title))
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(gap);
    frame.render_widget(chart, area);
}

fn render_line(frame: &mut Frame, area: Rect, view: &LineChartView) {
    let data: Vec<(f64, f64)> = view
        .points
        .iter()
        .enumerate()
        .map(|(idx, (_, value))| (idx as f64, *value))
        .collect();

    let x_max = (data.len().saturating_sub(1)).max(1) as f64;
    let y_top = view
        .points
        .iter()
        .map(|(_, v)| *v)
        .fold(0.0_f64, f64::max)
        .max(1.0)
        .ceil();

    let datasets = vec![
        Dataset::default()
            .name(view.y_label.clone())
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(LINE_COLOR))
            .data(&data),
        Dataset::default()
            .marker(Marker::Block)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(LINE_COLOR))
            .data(&data),
    ];

    let x_labels: Vec<Span> = view
        .points
        .iter()
        .map(|(label, _)| Span::raw(label.clone()))
        .collect();
    let y_labels = vec![
        Span::raw("0.0"),
        Span::raw(format!("{:.1}", y_top / 2.0)),
        Span::raw(format!("{y_top:.1}")),
    ];

    let chart = Chart::new(datasets)
        .block(chart_block(&view.title))
        .x_axis(
            Axis::default()
                .title(view.x_label.clone())
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title(view.y_label.clone())
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, y_top])
                .labels(y_labels),
        );
    frame.render_widget(chart, area);
}

fn render_pie(frame: &mut Frame, area: Rect, view: &PieChartView) {
    let block = chart_block(&view.title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(inner);

    let pie_area = square_area(cols[0]);
    let shares = view.shares();
    let fractions: Vec<f64> = shares.iter().map(|(_, pct)| pct / 100.0).collect();
    let sectors = pie_sectors(
        &fractions,
        pie_area.width as usize * 2,
        pie_area.height as usize * 4,
    );
    let labels: Vec<(f64, f64, String)> = label_anchors(&fractions)
        .into_iter()
        .zip(shares.iter())
        .map(|((x, y), (_, pct))| (x, y, format!("{pct:.1}%")))
        .collect();

    if !pie_area.is_empty() {
        render_pie_canvas(frame, pie_area, &sectors, &labels);
    }

    let legend: Vec<Line> = shares
        .iter()
        .enumerate()
        .map(|(idx, (label, pct))| {
            Line::from(vec![
                Span::styled("■ ", Style::default().fg(slice_color(idx))),
                Span::raw(format!("{label}  {pct:.1}%")),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(legend), cols[1]);
}

fn render_pie_canvas(
    frame: &mut Frame,
    area: Rect,
    sectors: &[Vec<(f64, f64)>],
    labels: &[(f64, f64, String)],
) {
    let canvas = Canvas::default()
        .x_bounds([-1.0, 1.0])
        .y_bounds([-1.0, 1.0])
        .marker(Marker::Braille)
        .paint(|ctx| {
            for (idx, coords) in sectors.iter().enumerate() {
                ctx.draw(&Points {
                    coords,
                    color: slice_color(idx),
                });
            }
            ctx.layer();
            for (x, y, text) in labels {
                ctx.print(*x, *y, text.clone());
            }
        });
    frame.render_widget(canvas, area);
}

fn slice_color(idx: usize) -> Color {
    SLICE_COLORS[idx % SLICE_COLORS.len()]
}

// Terminal cells are about twice as tall as wide, so a round pie needs twice
// as many columns as rows.
fn square_area(area: Rect) -> Rect {
    let side = (area.width / 2).min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(side * 2)) / 2,
        y: area.y + (area.height.saturating_sub(side)) / 2,
        width: side * 2,
        height: side,
    }
}

// fraction of a turn, counter-clockwise from twelve o'clock
fn turn_from_top(x: f64, y: f64) -> f64 {
    let deg = y.atan2(x).to_degrees() - 90.0;
    deg.rem_euclid(360.0) / 360.0
}

pub fn pie_sectors(fractions: &[f64], cols: usize, rows: usize) -> Vec<Vec<(f64, f64)>> {
    let mut sectors = vec![Vec::new(); fractions.len()];
    if fractions.is_empty() || cols == 0 || rows == 0 {
        return sectors;
    }

    let mut bounds = Vec::with_capacity(fractions.len());
    let mut acc = 0.0;
    for f in fractions {
        acc += f;
        bounds.push(acc);
    }

    for row in 0..rows {
        let y = 1.0 - (row as f64 + 0.5) * 2.0 / rows as f64;
        for col in 0..cols {
            let x = -1.0 + (col as f64 + 0.5) * 2.0 / cols as f64;
            if x * x + y * y > 1.0 {
                continue;
            }
            let turn = turn_from_top(x, y);
            let idx = bounds
                .iter()
                .position(|b| turn < *b)
                .unwrap_or(fractions.len() - 1);
            sectors[idx].push((x, y));
        }
    }
    sectors
}

fn label_anchors(fractions: &[f64]) -> Vec<(f64, f64)> {
    let mut start = 0.0;
    fractions
        .iter()
        .map(|f| {
            let mid = start + f / 2.0;
            start += f;
            let angle = PI / 2.0 + mid * 2.0 * PI;
            (0.55 * angle.cos(), 0.55 * angle.sin())
        })
        .collect()
}
