//! Ratatui-based terminal UI.
//!
//! The TUI provides a settings panel for choosing a measurement file, editing
//! the physical constants and the parameter file, and toggling the beam mode.
//! Pressing `f` runs the shared fit pipeline and renders the corrected spectrum
//! with the fitted curve next to the fit report.

use std::io;
use std::path::{Path, PathBuf};
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

use crate::app::pipeline::{self, RunOutput};
use crate::app::read_params_text;
use crate::cli::TuiArgs;
use crate::cli::picker::{discover_data_files, pretty_path};
use crate::domain::{ConstantInputs, FitConfig, FitOptions};
use crate::error::HfsError;

mod plotters_chart;

use plotters_chart::{SpectrumChart, SpectrumSeries};

const X_LABEL: &str = "Frequency [MHz]";
const Y_LABEL: &str = "Counts";

/// Rows of the settings list, in display order.
const FIELD_FILE: usize = 0;
const FIELD_FREQ_OFFSET: usize = 1;
const FIELD_MASS_UNIT: usize = 2;
const FIELD_ION_MASS: usize = 3;
const FIELD_VOLTAGE: usize = 4;
const FIELD_MODE: usize = 5;
const FIELD_PARAMS: usize = 6;
const FIELD_COUNT: usize = 7;

/// Start the TUI.
pub fn run(args: TuiArgs) -> Result<(), HfsError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| HfsError::Io(format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(&args, discover_data_files());
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, HfsError> {
        enable_raw_mode().map_err(|e| HfsError::Io(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(HfsError::Io(format!("Failed to enter alternate screen: {e}")));
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
    files: Vec<PathBuf>,
    data_path: Option<PathBuf>,
    constants: ConstantInputs,
    /// Parameter file; empty means the built-in block.
    params_path: String,
    fit: FitOptions,
    selected_field: usize,
    /// Text buffer while a field is being edited.
    editing: Option<String>,
    status: String,
    run: Option<RunOutput>,
    report_scroll: u16,
}

impl App {
    fn new(args: &TuiArgs, files: Vec<PathBuf>) -> Self {
        let data_path = args.file.clone().or_else(|| files.first().cloned());
        let status = if files.is_empty() && data_path.is_none() {
            "No measurement files found. Select the data file row and press Enter to type a path.".to_string()
        } else {
            "Press f to fit.".to_string()
        };
        Self {
            files,
            data_path,
            constants: args.constants.to_inputs(),
            params_path: args
                .params
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            fit: FitOptions {
                max_iter: args.max_iter,
                ..FitOptions::default()
            },
            selected_field: 0,
            editing: None,
            status,
            run: None,
            report_scroll: 0,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), HfsError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| HfsError::Io(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| HfsError::Io(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| HfsError::Io(format!("Event read error: {e}")))? {
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

    /// Apply one key press. Returns `true` when the user quits.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.editing.is_some() {
            self.handle_edit(code);
            return false;
        }

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
            KeyCode::Enter => {
                if self.selected_field == FIELD_MODE {
                    self.toggle_mode();
                } else {
                    self.editing = Some(self.field_value(self.selected_field));
                    self.status = "Editing. Enter to apply, Esc to cancel.".to_string();
                }
            }
            KeyCode::PageDown => self.report_scroll = self.report_scroll.saturating_add(5),
            KeyCode::PageUp => self.report_scroll = self.report_scroll.saturating_sub(5),
            KeyCode::Char('f') => self.run_fit(),
            KeyCode::Char('e') => self.export(),
            _ => {}
        }

        false
    }

    fn handle_edit(&mut self, code: KeyCode) {
        let Some(buffer) = self.editing.as_mut() else {
            return;
        };
        match code {
            KeyCode::Esc => {
                self.editing = None;
                self.status = "Edit canceled.".to_string();
            }
            KeyCode::Enter => {
                let text = buffer.trim().to_string();
                self.editing = None;
                self.set_field(self.selected_field, text);
            }
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Char(c) => buffer.push(c),
            _ => {}
        }
    }

    fn adjust_field(&mut self, delta: i32) {
        match self.selected_field {
            FIELD_FILE => self.cycle_file(delta),
            FIELD_MODE => self.toggle_mode(),
            _ => {}
        }
    }

    fn cycle_file(&mut self, delta: i32) {
        if self.files.is_empty() {
            self.status = "No measurement files found in the working directory.".to_string();
            return;
        }
        let n = self.files.len();
        let next = match self
            .data_path
            .as_ref()
            .and_then(|p| self.files.iter().position(|f| f == p))
        {
            Some(i) if delta >= 0 => (i + 1) % n,
            Some(i) => (i + n - 1) % n,
            None => 0,
        };
        self.data_path = Some(self.files[next].clone());
        self.status = format!("file: {}", pretty_path(&self.files[next]));
    }

    fn toggle_mode(&mut self) {
        let next = if self.constants.beam_mode.trim().eq_ignore_ascii_case("co") {
            "anti"
        } else {
            "co"
        };
        self.constants.beam_mode = next.to_string();
        self.status = format!("mode: {next}");
    }

    fn field_value(&self, field: usize) -> String {
        match field {
            FIELD_FILE => self
                .data_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            FIELD_FREQ_OFFSET => self.constants.freq_offset.clone(),
            FIELD_MASS_UNIT => self.constants.atomic_mass_unit.clone(),
            FIELD_ION_MASS => self.constants.ion_mass_number.clone(),
            FIELD_VOLTAGE => self.constants.applied_voltage.clone(),
            FIELD_MODE => self.constants.beam_mode.clone(),
            FIELD_PARAMS => self.params_path.clone(),
            _ => String::new(),
        }
    }

    /// Store an edited value. Numbers stay textual until the next fit.
    fn set_field(&mut self, field: usize, text: String) {
        match field {
            FIELD_FILE => {
                self.data_path = (!text.is_empty()).then(|| PathBuf::from(&text));
            }
            FIELD_FREQ_OFFSET => self.constants.freq_offset = text.clone(),
            FIELD_MASS_UNIT => self.constants.atomic_mass_unit = text.clone(),
            FIELD_ION_MASS => self.constants.ion_mass_number = text.clone(),
            FIELD_VOLTAGE => self.constants.applied_voltage = text.clone(),
            FIELD_MODE => self.constants.beam_mode = text.clone(),
            FIELD_PARAMS => self.params_path = text.clone(),
            _ => return,
        }
        self.status = format!("{}: {}", field_label(field), display_or(&text, "(cleared)"));
    }

    fn fit_config(&self) -> Result<FitConfig, HfsError> {
        let Some(data_path) = self.data_path.clone() else {
            return Err(HfsError::input("file", "no data file selected"));
        };
        let params_path = self.params_path.trim();
        let params = (!params_path.is_empty()).then(|| Path::new(params_path));

        Ok(FitConfig {
            data_path,
            params_text: read_params_text(params)?,
            constants: self.constants.clone(),
            fit: self.fit,
            plot: false,
            plot_width: 0,
            plot_height: 0,
            svg: None,
            export_spectrum: None,
            export_curve: None,
        })
    }

    /// Run the fit; on failure the previous run stays on screen.
    fn run_fit(&mut self) {
        match self.fit_config().and_then(|config| pipeline::run_fit(&config)) {
            Ok(run) => {
                self.status = format!(
                    "Fit done: {} rows, redchi={:.4}, {} evaluations",
                    run.spectrum.len(),
                    run.fit.statistics.redchi,
                    run.fit.statistics.nfev
                );
                self.run = Some(run);
                self.report_scroll = 0;
            }
            Err(err) => {
                self.status = err.to_string();
            }
        }
    }

    /// Write the SVG overlay and curve JSON next to the data file.
    fn export(&mut self) {
        let (Some(run), Some(data_path)) = (&self.run, &self.data_path) else {
            self.status = "Nothing to export yet (press f to fit).".to_string();
            return;
        };

        let svg_path = data_path.with_extension("svg");
        let json_path = data_path.with_extension("curve.json");
        let title = crate::plot::plot_title(&run.source_name, run.constants.beam_mode.as_str());
        let result = crate::plot::write_svg(&svg_path, &run.data_grid(), &run.curve, &title)
            .and_then(|()| crate::io::write_curve_json(&json_path, &crate::io::curve_file(run)));

        self.status = match result {
            Ok(()) => format!("Wrote {} and {}", pretty_path(&svg_path), pretty_path(&json_path)),
            Err(err) => format!("Export failed: {err}"),
        };
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
            Span::styled("hfs", Style::default().fg(Color::Cyan)),
            Span::raw(" | Doppler-corrected hyperfine fit"),
        ]));

        let file = self
            .data_path
            .as_deref()
            .map(pretty_path)
            .unwrap_or_else(|| "-".to_string());
        let rows = self.run.as_ref().map(|r| r.spectrum.len()).unwrap_or(0);
        lines.push(Line::from(Span::styled(
            format!("file: {file} | mode: {} | n={rows}", self.constants.beam_mode.trim()),
            Style::default().fg(Color::Gray),
        )));

        if let Some(run) = &self.run {
            let s = &run.fit.statistics;
            lines.push(Line::from(Span::styled(
                format!(
                    "last fit: {} | chisqr={:.4} | redchi={:.4} | bic={:.3}",
                    run.source_name, s.chisqr, s.redchi, s.bic
                ),
                Style::default().fg(Color::Gray),
            )));
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(11)])
            .split(area);
        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(chunks[1]);

        self.draw_chart(frame, chunks[0]);
        self.draw_settings(frame, bottom[0]);
        self.draw_report(frame, bottom[1]);
    }

    fn chart_title(&self) -> String {
        match &self.run {
            Some(run) => crate::plot::plot_title(&run.source_name, run.constants.beam_mode.as_str()),
            None => "Spectrum".to_string(),
        }
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title(self.chart_title()).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(run) = &self.run else {
            let msg = Paragraph::new("No fit yet. Press f to fit the selected file.")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default());
            frame.render_widget(msg, inner);
            return;
        };

        let series = SpectrumSeries::new(&run.data_grid(), &run.curve);
        let (chart_rect, insets) = chart_layout(inner);
        let widget = SpectrumChart {
            series: &series,
            x_label: X_LABEL,
            y_label: Y_LABEL,
            fmt_tick: fmt_axis,
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, series.x_bounds, series.y_bounds);
        }
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = (0..FIELD_COUNT)
            .map(|field| {
                let value = match (&self.editing, field == self.selected_field) {
                    (Some(buffer), true) => format!("{buffer}_"),
                    _ => self.field_display(field),
                };
                ListItem::new(format!("{}: {value}", field_label(field)))
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Settings").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ratatui::widgets::ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);

        if self.editing.is_some() {
            let hint = Paragraph::new("Editing…")
                .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
            let rect = Rect {
                x: area.x + 2,
                y: area.y + area.height.saturating_sub(2),
                width: area.width.saturating_sub(4),
                height: 1,
            };
            frame.render_widget(hint, rect);
        }
    }

    fn field_display(&self, field: usize) -> String {
        match field {
            FIELD_FILE => self
                .data_path
                .as_deref()
                .map(pretty_path)
                .unwrap_or_else(|| "(none)".to_string()),
            FIELD_PARAMS => display_or(&self.params_path, "(built-in)"),
            other => self.field_value(other),
        }
    }

    fn draw_report(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Fit report").borders(Borders::ALL);
        let text = match &self.run {
            Some(run) => Text::from(run.fit.report.as_str()),
            None => Text::from("-"),
        };
        let p = Paragraph::new(text)
            .block(block)
            .scroll((self.report_scroll, 0));
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  ←/→ file/mode  Enter edit  f fit  e export  PgUp/PgDn report  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn field_label(field: usize) -> &'static str {
    match field {
        FIELD_FILE => "Data file",
        FIELD_FREQ_OFFSET => "Freq offset [Hz]",
        FIELD_MASS_UNIT => "m_u [kg]",
        FIELD_ION_MASS => "m_ion",
        FIELD_VOLTAGE => "Voltage [kV]",
        FIELD_MODE => "Mode",
        FIELD_PARAMS => "Params file",
        _ => "",
    }
}

fn display_or(text: &str, empty: &str) -> String {
    if text.trim().is_empty() {
        empty.to_string()
    } else {
        text.to_string()
    }
}

fn fmt_axis(v: f64) -> String {
    format!("{v:.0}")
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10
        || inner.height <= insets.top + insets.bottom + 5
    {
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
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = fmt_axis(x_val);
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
        let label = fmt_axis(y_val);
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

    let x_label = Paragraph::new(X_LABEL)
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

    let y_label = Paragraph::new(Y_LABEL)
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
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
    use crate::cli::{Cli, Command};
    use crate::data::{SimulateConfig, simulate, write_measurement_file};
    use crate::params::{DEFAULT_PARAMS, parse_parameters};
    use clap::Parser;

    fn tui_args(extra: &[&str]) -> TuiArgs {
        let mut argv = vec!["hfs", "tui"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Tui(args) => args,
            other => panic!("expected tui, got {other:?}"),
        }
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(KeyCode::Char(c));
        }
    }

    /// Replace the selected field's value through the edit keys.
    fn edit_selected(app: &mut App, text: &str) {
        app.handle_key(KeyCode::Enter);
        let len = app.editing.as_ref().map(|b| b.chars().count()).unwrap_or(0);
        for _ in 0..len {
            app.handle_key(KeyCode::Backspace);
        }
        type_text(app, text);
        app.handle_key(KeyCode::Enter);
    }

    fn select(app: &mut App, field: usize) {
        for _ in 0..FIELD_COUNT {
            app.handle_key(KeyCode::Up);
        }
        for _ in 0..field {
            app.handle_key(KeyCode::Down);
        }
    }

    fn simulated_file(name: &str) -> PathBuf {
        let params = parse_parameters(DEFAULT_PARAMS).unwrap();
        let constants = ConstantInputs::default().parse().unwrap();
        let cfg = SimulateConfig {
            points: 60,
            noise: false,
            ..SimulateConfig::default()
        };
        let sim = simulate(&params, &constants, &cfg).unwrap();
        let path = std::env::temp_dir().join(name);
        write_measurement_file(&path, &sim, &constants).unwrap();
        path
    }

    #[test]
    fn editing_voltage_keeps_text_until_fit() {
        let mut app = App::new(&tui_args(&[]), Vec::new());
        select(&mut app, FIELD_VOLTAGE);
        edit_selected(&mut app, "abc");
        assert_eq!(app.constants.applied_voltage, "abc");
        assert!(app.editing.is_none());
    }

    #[test]
    fn escape_cancels_an_edit() {
        let mut app = App::new(&tui_args(&[]), Vec::new());
        select(&mut app, FIELD_FREQ_OFFSET);
        let before = app.constants.freq_offset.clone();
        app.handle_key(KeyCode::Enter);
        type_text(&mut app, "999");
        app.handle_key(KeyCode::Esc);
        assert_eq!(app.constants.freq_offset, before);
        assert!(!app.handle_key(KeyCode::Down));
    }

    #[test]
    fn mode_toggles_between_co_and_anti() {
        let mut app = App::new(&tui_args(&["--mode", "co"]), Vec::new());
        select(&mut app, FIELD_MODE);
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.constants.beam_mode, "anti");
        app.handle_key(KeyCode::Right);
        assert_eq!(app.constants.beam_mode, "co");
    }

    #[test]
    fn files_cycle_in_both_directions() {
        let files = vec![PathBuf::from("a.dat"), PathBuf::from("b.dat"), PathBuf::from("c.dat")];
        let mut app = App::new(&tui_args(&[]), files);
        assert_eq!(app.data_path, Some(PathBuf::from("a.dat")));
        app.handle_key(KeyCode::Left);
        assert_eq!(app.data_path, Some(PathBuf::from("c.dat")));
        app.handle_key(KeyCode::Right);
        app.handle_key(KeyCode::Right);
        assert_eq!(app.data_path, Some(PathBuf::from("b.dat")));
    }

    #[test]
    fn fit_without_file_reports_in_status() {
        let mut app = App::new(&tui_args(&[]), Vec::new());
        app.handle_key(KeyCode::Char('f'));
        assert!(app.run.is_none());
        assert!(app.status.contains("no data file"), "{}", app.status);
    }

    #[test]
    fn failed_fit_keeps_previous_run() {
        let path = simulated_file("beam_hfs_tui_scan.dat");
        let file = path.display().to_string();
        let mut app = App::new(&tui_args(&["-f", &file, "--mode", "co", "--voltage", "19.9195"]), Vec::new());

        app.handle_key(KeyCode::Char('f'));
        let first_chisqr = app.run.as_ref().map(|r| r.fit.statistics.chisqr);
        assert!(first_chisqr.is_some(), "{}", app.status);

        select(&mut app, FIELD_VOLTAGE);
        edit_selected(&mut app, "abc");
        app.handle_key(KeyCode::Char('f'));

        assert_eq!(app.run.as_ref().map(|r| r.fit.statistics.chisqr), first_chisqr);
        assert_eq!(app.chart_title(), "Fit: beam_hfs_tui_scan.dat (co)");
        assert!(app.status.contains("Invalid numerical input"), "{}", app.status);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn quit_keys() {
        let mut app = App::new(&tui_args(&[]), Vec::new());
        assert_eq!(app.chart_title(), "Spectrum");
        assert!(app.handle_key(KeyCode::Char('q')));
    }
}
