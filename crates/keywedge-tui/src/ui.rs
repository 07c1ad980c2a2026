use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Tabs};
use ratatui::Frame;

use keywedge_core::{BurstAnalysis, Confidence, Decision, ScanResult};

use crate::app::{App, Tab};

pub fn draw(frame: &mut Frame, app: &App) {
    let [tabs_area, status_area, main_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(4),
        Constraint::Fill(1),
    ])
    .areas(frame.area());

    draw_tabs(frame, app, tabs_area);
    draw_status(frame, app, status_area);

    match app.tab {
        Tab::Scans => draw_scans(frame, app, main_area),
        Tab::Analyses => draw_analyses(frame, app, main_area),
        Tab::Logs => draw_logs(frame, app, main_area),
    }
}

fn draw_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles = vec!["F1:Scans", "F2:Analyses", "F3:Logs"];
    let selected = match app.tab {
        Tab::Scans => 0,
        Tab::Analyses => 1,
        Tab::Logs => 2,
    };
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title("keywedge"))
        .select(selected)
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, area);
}

fn draw_status(frame: &mut Frame, app: &App, area: Rect) {
    let state = &app.state;
    let tuning = &state.tuning;
    let flag = |on: bool, label: &'static str, color: Color| {
        if on {
            Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD))
        } else {
            Span::styled(label, Style::default().fg(Color::DarkGray))
        }
    };

    let line = Line::from(vec![
        Span::raw("context: "),
        Span::styled(
            state.context.to_string(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        flag(state.modal_open, "[MODAL]", Color::Red),
        Span::raw(" "),
        flag(state.focused, "[FOCUS]", Color::Green),
        Span::raw(format!(
            "  timeout {}ms  fast <{}ms/char  barcode {}-{}  fast-len >={}",
            tuning.completion_timeout_ms,
            tuning.fast_threshold_ms,
            tuning.min_barcode_len,
            tuning.max_barcode_len,
            tuning.min_fast_len,
        )),
    ]);

    let warning = match state.warnings.last() {
        Some(w) => Line::styled(w.as_str(), Style::default().fg(Color::Red)),
        None => Line::default(),
    };

    let para = Paragraph::new(vec![line, warning]).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Tab=next context  F5=modal  Esc=quit"),
    );
    frame.render_widget(para, area);
}

fn scan_line(scan: &ScanResult) -> Line<'_> {
    let color = match scan.confidence {
        Confidence::High => Color::Green,
        Confidence::Medium => Color::Yellow,
    };
    Line::from(vec![
        Span::styled(format!("[{}] ", scan.context), Style::default().fg(Color::Cyan)),
        Span::styled(scan.text.as_str(), Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(
            format!(
                "  {} / {} chars / {}ms",
                scan.confidence,
                scan.char_count,
                scan.elapsed.as_millis()
            ),
            Style::default().fg(color),
        ),
    ])
}

fn draw_scans(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Recent scans");
    if app.state.recent_scans.is_empty() {
        let para = Paragraph::new("No scans yet. Scan a barcode or type fast.").block(block);
        frame.render_widget(para, area);
        return;
    }

    let items: Vec<ListItem> = app
        .state
        .recent_scans
        .iter()
        .rev()
        .map(|s| ListItem::new(scan_line(s)))
        .collect();
    frame.render_widget(List::new(items).block(block), area);
}

fn analysis_line(analysis: &BurstAnalysis) -> Line<'_> {
    let decision_style = match analysis.decision {
        Decision::Scanned(_) => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        Decision::Typed => Style::default(),
        Decision::Empty => Style::default().fg(Color::DarkGray),
    };
    let mark = |on: bool, c: char| if on { c } else { '-' };
    Line::from(vec![
        Span::styled(format!("{:<15}", analysis.decision.to_string()), decision_style),
        Span::raw(format!(
            "{:>3} chars {:>7.1}ms/char {}{}{}{} {:<10} ",
            analysis.char_count,
            analysis.ms_per_char,
            mark(analysis.is_fast, 'F'),
            mark(analysis.is_barcode_length, 'L'),
            mark(analysis.all_digits, 'D'),
            mark(analysis.alnum_no_spaces, 'A'),
            format!("{:?}", analysis.trigger).to_lowercase(),
        )),
        Span::raw(format!("{:?}", analysis.text)),
    ])
}

fn draw_analyses(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .state
        .recent_analyses
        .iter()
        .rev()
        .map(|a| ListItem::new(analysis_line(a)))
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Burst analyses (F=fast L=length D=digits A=alnum)"),
    );
    frame.render_widget(list, area);
}

fn draw_logs(frame: &mut Frame, app: &App, area: Rect) {
    let lines: Vec<String> = match app.logs.lock() {
        Ok(logs) => logs.iter().cloned().collect(),
        Err(_) => vec!["log buffer unavailable".to_string()],
    };
    let total = lines.len();

    let visible_height = area.height.saturating_sub(2) as usize;
    let scroll = app.log_scroll.min(total.saturating_sub(visible_height));
    let end = total.saturating_sub(scroll);
    let start = end.saturating_sub(visible_height);

    let items: Vec<ListItem> = lines[start..end]
        .iter()
        .map(|s| ListItem::new(s.as_str()))
        .collect();

    let title = if app.log_auto_scroll {
        "Logs (auto-scroll)"
    } else {
        "Logs (Up/Down=scroll, End=bottom)"
    };
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(list, area);
}
