//! Ratatui-based terminal UI.
//!
//! Shows the measured lateral force and aligning moment against the fitted
//! model curves, with a small settings panel for grid resolution, channel
//! weighting, and the data source. Every change triggers a refit.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};

use crate::app::pipeline::{RunOutput, run_fit};
use crate::config::FitConfig;
use crate::data::synthetic::SyntheticConfig;
use crate::error::{AppError, FitError};
use crate::plot::{Channel, observed_points, sample_curve};

mod plotters_chart;

use plotters_chart::ChannelChart;

/// Grid resolution range offered in the settings panel.
const MIN_STEPS: usize = 2;
const MAX_STEPS: usize = 10;

const FIELD_COUNT: usize = 4;

/// Start the TUI with `config` as the initial settings.
pub fn run(config: FitConfig) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(config);
    app.refit();
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    config: FitConfig,
    /// Remembered while the measured data set is shown.
    synthetic: SyntheticConfig,
    selected_field: usize,
    status: String,
    run: Option<RunOutput>,
}

impl App {
    fn new(mut config: FitConfig) -> Self {
        // The settings panel drives a uniform grid.
        config.grid.axis_steps = None;
        config.grid.steps = config.grid.steps.clamp(MIN_STEPS, MAX_STEPS);
        let synthetic = config.data.synthetic.unwrap_or_default();
        Self {
            config,
            synthetic,
            selected_field: 0,
            status: String::new(),
            run: None,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => {
                self.selected_field = self.selected_field.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected_field + 1 < FIELD_COUNT {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1),
            KeyCode::Right => self.adjust_field(1),
            KeyCode::Char('r') => self.refit(),
            KeyCode::Char('s') => {
                self.toggle_synthetic();
                self.refit();
            }
            _ => {}
        }
        false
    }

    fn adjust_field(&mut self, delta: i32) {
        match self.selected_field {
            0 => {
                let steps = self.config.grid.steps;
                self.config.grid.steps = if delta >= 0 {
                    (steps + 1).min(MAX_STEPS)
                } else {
                    steps.saturating_sub(1).max(MIN_STEPS)
                };
            }
            1 => {
                let w = self.config.objective.moment;
                // Doubling cannot leave zero, so step up from it.
                self.config.objective.moment = match (delta >= 0, w > 0.0) {
                    (true, true) => w * 2.0,
                    (true, false) => 1.0,
                    (false, _) => w / 2.0,
                };
            }
            2 => self.toggle_synthetic(),
            3 => {
                self.synthetic.seed = if delta >= 0 {
                    self.synthetic.seed.wrapping_add(1)
                } else {
                    self.synthetic.seed.wrapping_sub(1)
                };
                if self.config.data.synthetic.is_some() {
                    self.config.data.synthetic = Some(self.synthetic);
                }
            }
            _ => return,
        }
        self.refit();
    }

    fn toggle_synthetic(&mut self) {
        self.config.data.synthetic = match self.config.data.synthetic.take() {
            Some(current) => {
                self.synthetic = current;
                None
            }
            None => Some(self.synthetic),
        };
    }

    /// Run the fit with the current settings; failures are shown, not fatal.
    fn refit(&mut self) {
        match run_fit(&self.config) {
            Ok(run) => {
                let stats = run.stats();
                self.status = format!(
                    "fit: {} points in {} ms, {} excluded",
                    stats.grid_size,
                    stats.elapsed.as_millis(),
                    stats.excluded
                );
                self.run = Some(run);
            }
            Err(err) => {
                tracing::warn!(error = %err, "interactive fit failed");
                self.status = format!("fit failed: {err}");
                self.run = None;
            }
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("tirefit", Style::default().fg(Color::Cyan)),
            Span::raw(" - Magic Formula grid fit"),
        ]));

        let source = if self.config.data.synthetic.is_some() {
            "synthetic"
        } else {
            "measured"
        };
        lines.push(Line::from(Span::styled(
            format!(
                "data: {source} | n={} | Fz={:.0} N | grid: {}^6 | weights: Fy={} Mz={}",
                self.config.data.slip_angles.len(),
                self.config.tire.vertical_load,
                self.config.grid.steps,
                self.config.objective.lateral,
                self.config.objective.moment,
            ),
            Style::default().fg(Color::Gray),
        )));

        if let Some(run) = &self.run {
            lines.push(Line::from(Span::styled(
                format!(
                    "best error={:.3} | Fy rmse={:.2} | Mz rmse={:.3}",
                    run.outcome.result.best_error,
                    run.channel_errors.lateral_rmse(),
                    run.channel_errors.moment_rmse(),
                ),
                Style::default().fg(Color::Gray),
            )));
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(8)])
            .split(area);
        let charts = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[0]);
        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);

        self.draw_chart(frame, charts[0], Channel::Lateral);
        self.draw_chart(frame, charts[1], Channel::Moment);
        self.draw_params(frame, bottom[0]);
        self.draw_settings(frame, bottom[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect, channel: Channel) {
        let block = Block::default().title(channel.title()).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let series = self.run.as_ref().map(|run| channel_series(run, channel, 200));
        let series = match series {
            Some(Ok(series)) => series,
            Some(Err(err)) => {
                let msg = Paragraph::new(format!("Cannot draw curve: {err}"))
                    .style(Style::default().fg(Color::Red));
                frame.render_widget(msg, inner);
                return;
            }
            None => {
                let msg = Paragraph::new("No fit available.").style(Style::default().fg(Color::Yellow));
                frame.render_widget(msg, inner);
                return;
            }
        };

        let x_label = format!("slip ({})", self.config.data.angle_unit.label());
        let y_label = match channel {
            Channel::Lateral => "Fy (N)",
            Channel::Moment => "Mz",
        };

        let (chart_rect, insets) = chart_layout(inner);
        let widget = ChannelChart {
            curve: &series.curve,
            points: &series.points,
            x_bounds: series.x_bounds,
            y_bounds: series.y_bounds,
            x_label: &x_label,
            y_label,
            fmt_x: fmt_axis_x,
            fmt_y: fmt_axis_y,
        };
        frame.render_widget(widget, chart_rect);

        if let Some(insets) = insets {
            let labels = AxisLabels { x: &x_label, y: y_label };
            draw_axis_ticks(frame, inner, chart_rect, insets, series.x_bounds, series.y_bounds, labels);
        }
    }

    fn draw_params(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = match &self.run {
            Some(run) => run
                .outcome
                .result
                .best_params
                .named()
                .iter()
                .map(|(name, v)| ListItem::new(format!("{name:<3} = {v:>12.4}")))
                .collect(),
            None => vec![ListItem::new("-")],
        };
        let list = List::new(items).block(Block::default().title("Best parameters").borders(Borders::ALL));
        frame.render_widget(list, area);
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let source = if self.config.data.synthetic.is_some() {
            "synthetic"
        } else {
            "measured"
        };
        let items = vec![
            ListItem::new(format!("Grid steps: {}", self.config.grid.steps)),
            ListItem::new(format!("Moment weight: {}", self.config.objective.moment)),
            ListItem::new(format!("Data: {source}")),
            ListItem::new(format!("Synthetic seed: {}", self.synthetic.seed)),
        ];

        let list = List::new(items)
            .block(Block::default().title("Settings").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ratatui::widgets::ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  ←/→ adjust  r refit  s synthetic  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Chart data for one channel.
#[derive(Debug, Clone, PartialEq)]
struct ChannelSeries {
    curve: Vec<(f64, f64)>,
    points: Vec<(f64, f64)>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

fn channel_series(run: &RunOutput, channel: Channel, n: usize) -> Result<ChannelSeries, FitError> {
    let unit = run.config.data.angle_unit;
    let ctx = &run.data.context;
    let curve = sample_curve(
        &run.config.model(),
        &run.outcome.result.best_params,
        ctx,
        channel,
        unit,
        n,
    )?;
    let points = observed_points(ctx, channel, unit);

    let bounds = |pick: fn(&(f64, f64)) -> f64| {
        let (lo, hi) = points
            .iter()
            .chain(&curve)
            .map(pick)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if lo.is_finite() && hi.is_finite() && hi > lo {
            let pad = (hi - lo) * 0.05;
            [lo - pad, hi + pad]
        } else {
            [0.0, 1.0]
        }
    };
    let x_bounds = bounds(|p| p.0);
    let y_bounds = bounds(|p| p.1);

    Ok(ChannelSeries {
        curve,
        points,
        x_bounds,
        y_bounds,
    })
}

fn fmt_axis_x(v: f64) -> String {
    format!("{v:.1}")
}

fn fmt_axis_y(v: f64) -> String {
    format!("{v:.0}")
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

#[derive(Debug, Clone, Copy)]
struct AxisLabels<'a> {
    x: &'a str,
    y: &'a str,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10 || inner.height <= insets.top + insets.bottom + 5 {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    labels: AxisLabels<'_>,
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = fmt_axis_x(x_val);
        let label_len = label.len() as u16;
        let start = x.saturating_sub(label_len / 2);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = fmt_axis_y(y_val);
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label_len);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new(labels.x)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new(labels.y).style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> FitConfig {
        let mut cfg = FitConfig::default();
        cfg.grid.steps = 3;
        cfg
    }

    #[test]
    fn channel_series_bounds_cover_data() {
        let run = run_fit(&small_config()).unwrap();
        let series = channel_series(&run, Channel::Moment, 50).unwrap();
        assert_eq!(series.curve.len(), 50);
        assert_eq!(series.points.len(), 19);
        for &(x, y) in series.points.iter().chain(&series.curve) {
            assert!(x >= series.x_bounds[0] && x <= series.x_bounds[1]);
            assert!(y >= series.y_bounds[0] && y <= series.y_bounds[1]);
        }
    }

    #[test]
    fn settings_keys_update_config() {
        let mut app = App::new(small_config());
        assert!(!app.handle_key(KeyCode::Right));
        assert_eq!(app.config.grid.steps, 4);
        assert!(app.run.is_some());

        app.selected_field = 2;
        app.handle_key(KeyCode::Right);
        assert!(app.config.data.synthetic.is_some());
        app.handle_key(KeyCode::Char('s'));
        assert!(app.config.data.synthetic.is_none());

        assert!(app.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn zero_moment_weight_can_be_raised() {
        let mut cfg = small_config();
        cfg.objective.moment = 0.0;
        let mut app = App::new(cfg);
        app.selected_field = 1;
        app.handle_key(KeyCode::Right);
        assert_eq!(app.config.objective.moment, 1.0);
        app.handle_key(KeyCode::Right);
        assert_eq!(app.config.objective.moment, 2.0);
        app.handle_key(KeyCode::Left);
        assert_eq!(app.config.objective.moment, 1.0);
    }

    #[test]
    fn steps_stay_in_range() {
        let mut app = App::new(small_config());
        app.config.grid.steps = MIN_STEPS;
        app.adjust_field(-1);
        assert_eq!(app.config.grid.steps, MIN_STEPS);
    }
}
