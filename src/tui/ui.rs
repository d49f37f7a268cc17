use chrono::Local;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect as Area};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, LineGauge, Paragraph, Wrap};

use crate::geometry::Rect;
use crate::model::{Board, Card, Column, color_rgb};

use super::app::{App, Mode};
use super::layout::{self, ColumnView, Slot, clip};
use super::sheet::Field;

pub fn draw(f: &mut Frame, app: &App) {
    let l = &app.layout;
    draw_title_bar(f, l.title_bar, app);
    draw_board(f, app);
    draw_status_bar(f, l.status_bar, app);

    match app.mode {
        Mode::Sheet => draw_sheet(f, app),
        Mode::Confirm => draw_confirm(f, app),
        Mode::Prompt => draw_prompt(f, app),
        Mode::Help => draw_help_overlay(f),
        Mode::Normal => {}
    }
}

fn draw_title_bar(f: &mut Frame, area: Area, app: &App) {
    let progress = app.views.borrow().progress();
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(32)])
        .split(area);

    let bar_style = Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let title = format!(" lanes  │  {}", progress.label());
    f.render_widget(Paragraph::new(title).style(bar_style), chunks[0]);

    let gauge = LineGauge::default()
        .ratio(progress.percent() as f64 / 100.0)
        .label(format!("{:>3}% ", progress.percent()))
        .filled_style(Style::default().fg(Color::Black).bg(Color::Cyan))
        .unfilled_style(Style::default().fg(Color::DarkGray).bg(Color::Cyan))
        .style(bar_style);
    f.render_widget(gauge, chunks[1]);
}

fn draw_board(f: &mut Frame, app: &App) {
    let l = &app.layout;
    let board = app.board();
    let bounds = l.board;
    let now = Local::now().naive_local();

    for (i, view) in l.columns.iter().enumerate() {
        let selected = app.mode == Mode::Normal && i == app.selected_col;
        draw_column(f, board, view, bounds, selected, app.selected_row, now);
    }

    if let Some(r) = l.add_column
        && let Some(area) = clip(r, bounds)
    {
        let button = Paragraph::new("+ Column")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded));
        f.render_widget(button, area);
    }

    if let Some(view) = &l.column_proxy {
        if let Some(area) = clip(view.rect, bounds) {
            f.render_widget(Clear, area);
        }
        draw_column(f, board, view, bounds, false, usize::MAX, now);
    }

    if let Some(proxy) = &l.card_proxy
        && let Some(card) = board.find_card(&proxy.card_id)
    {
        // the proxy may float over the title and status bars
        draw_card(f, card, proxy.rect, f.area(), false, true, now);
    }
}

fn column_style(col: Option<&Column>) -> Color {
    match col {
        Some(c) if c.is_done() => Color::Green,
        Some(c) if c.is_floating() => Color::Magenta,
        _ => Color::DarkGray,
    }
}

fn draw_column(
    f: &mut Frame,
    board: &Board,
    view: &ColumnView,
    bounds: Area,
    selected: bool,
    selected_row: usize,
    now: chrono::NaiveDateTime,
) {
    let Some(area) = clip(view.rect, bounds) else {
        return;
    };
    let col = board.column(&view.column_id);

    if view.placeholder {
        let gap = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM));
        f.render_widget(gap, area);
        return;
    }

    let accent = column_style(col);
    let border_style = if view.hovered {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else if selected {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(accent)
    };
    f.render_widget(Block::default().borders(Borders::ALL).border_style(border_style), area);

    // Header line
    let header = &view.header;
    if let Some(a) = clip(header.grip, bounds) {
        f.render_widget(Paragraph::new("⠿").style(Style::default().fg(Color::DarkGray)), a);
    }
    let title = col.map(|c| c.title.as_str()).unwrap_or("");
    let count = board.list(&view.column_id).len();
    let title_rect = Rect::new(header.title.x, header.title.y, view.rect.right() - 9 - header.title.x, 1);
    if let Some(a) = clip(title_rect, bounds) {
        let line = Line::from(vec![
            Span::styled(title.to_string(), Style::default().fg(accent).add_modifier(Modifier::BOLD)),
            Span::styled(format!(" ({count})"), Style::default().fg(Color::DarkGray)),
        ]);
        f.render_widget(Paragraph::new(line), a);
    }
    for (tool, r) in &header.tools {
        if let Some(a) = clip(*r, bounds) {
            let label = match tool {
                crate::geometry::HeaderTool::AddCard => "[+]",
                crate::geometry::HeaderTool::Delete => "[x]",
            };
            f.render_widget(Paragraph::new(label).style(Style::default().fg(Color::DarkGray)), a);
        }
    }

    // Cards
    let inner = Area::new(
        area.x.saturating_add(1),
        area.y.saturating_add(1),
        area.width.saturating_sub(2),
        area.height.saturating_sub(2),
    );
    let mut row = 0;
    for slot in &view.slots {
        match slot {
            Slot::Card { card_id, rect } => {
                if let Some(card) = board.find_card(card_id) {
                    let is_selected = selected && row == selected_row;
                    draw_card(f, card, *rect, inner, is_selected, false, now);
                }
                row += 1;
            }
            Slot::Placeholder(rect) => {
                if let Some(a) = clip(*rect, inner) {
                    let gap = Block::default()
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded)
                        .border_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::DIM));
                    f.render_widget(gap, a);
                }
            }
            Slot::Hint(rect) => {
                if let Some(a) = clip(*rect, inner) {
                    let hint = Paragraph::new("Drop cards here")
                        .alignment(Alignment::Center)
                        .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC));
                    f.render_widget(hint, a);
                }
            }
        }
    }
}

fn draw_card(
    f: &mut Frame,
    card: &Card,
    rect: Rect,
    bounds: Area,
    selected: bool,
    lifted: bool,
    now: chrono::NaiveDateTime,
) {
    let Some(area) = clip(rect, bounds) else {
        return;
    };

    let stripe = card
        .has_custom_color()
        .then(|| color_rgb(&card.color))
        .flatten()
        .map(|(r, g, b)| Color::Rgb(r, g, b));

    let border_style = if lifted {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else if selected {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(stripe.unwrap_or(Color::Gray))
    };

    let title = if card.title.is_empty() { "Untitled" } else { card.title.as_str() };
    let title_style = if selected {
        Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    };
    let mut lines = vec![Line::from(Span::styled(title.to_string(), title_style))];

    let mut meta = Vec::new();
    if let Some(due) = card.due_label() {
        let style = if card.is_overdue(now) {
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Yellow)
        };
        meta.push(Span::styled(due, style));
        meta.push(Span::raw(" "));
    }
    for tag in &card.tags {
        meta.push(Span::styled(format!("#{tag}"), Style::default().fg(Color::Blue)));
        meta.push(Span::raw(" "));
    }
    if !meta.is_empty() {
        lines.push(Line::from(meta));
    }

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_type(if lifted { BorderType::Double } else { BorderType::Rounded })
        .border_style(border_style);
    if let Some(color) = stripe {
        block = block.title(Span::styled("▌", Style::default().fg(color)));
    }

    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_status_bar(f: &mut Frame, area: Area, app: &App) {
    let mode_str = match app.mode {
        Mode::Normal => "NORMAL",
        Mode::Sheet => "EDIT",
        Mode::Confirm => "CONFIRM",
        Mode::Help => "HELP",
        Mode::Prompt => "PROMPT",
    };

    let left = if app.drag.is_dragging() {
        format!(" {mode_str} │ release over a column to drop, outside to delete")
    } else if let Some(msg) = &app.message {
        format!(" {mode_str} │ {msg}")
    } else {
        format!(" {mode_str} │ ? for help")
    };

    let bar = Paragraph::new(left).style(
        Style::default()
            .fg(Color::Black)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    );
    f.render_widget(bar, area);
}

fn draw_sheet(f: &mut Frame, app: &App) {
    let Some(sheet) = &app.sheet else {
        return;
    };
    let area = layout::sheet_area(f.area());
    f.render_widget(Clear, area);

    let options = app.views.borrow().column_options().to_vec();
    let mut lines = Vec::new();
    for field in Field::ALL {
        let focused = sheet.focus == field;
        let value = match field {
            Field::Column => {
                let title = options
                    .iter()
                    .find(|(id, _)| *id == sheet.column_id)
                    .map(|(_, t)| t.as_str())
                    .unwrap_or("");
                format!("◀ {title} ▶")
            }
            _ => sheet.value(field).to_string(),
        };
        let value_span = if value.is_empty() && !field.hint().is_empty() {
            Span::styled(field.hint(), Style::default().fg(Color::DarkGray))
        } else {
            Span::raw(value)
        };
        let label_style = if focused {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let cursor = if focused && field != Field::Column { "▏" } else { "" };
        lines.push(Line::from(vec![
            Span::styled(format!(" {:<10}", field.label()), label_style),
            value_span,
            Span::styled(cursor, Style::default().fg(Color::Cyan)),
        ]));
    }

    lines.push(Line::from(""));
    if let Some(err) = &sheet.error {
        lines.push(Line::from(Span::styled(format!(" {err}"), Style::default().fg(Color::Red))));
    }
    let mut footer = String::from(" Tab next · Enter save · Esc cancel");
    if sheet.is_edit() {
        footer.push_str(" · Ctrl+D delete");
    }
    lines.push(Line::from(Span::styled(footer, Style::default().fg(Color::DarkGray))));

    let title = if sheet.is_edit() { " Edit Task " } else { " New Task " };
    let widget = Paragraph::new(lines).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(widget, area);
}

fn draw_confirm(f: &mut Frame, app: &App) {
    let Some(action) = &app.confirm else {
        return;
    };
    let area = layout::dialog_area(f.area());
    f.render_widget(Clear, area);
    let lines = vec![
        Line::from(format!(" {}", action.question(app.board()))),
        Line::from(""),
        Line::from(Span::styled(" y confirm · n cancel", Style::default().fg(Color::DarkGray))),
    ];
    let widget = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .title(" Confirm ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red)),
    );
    f.render_widget(widget, area);
}

fn draw_prompt(f: &mut Frame, app: &App) {
    let Some(prompt) = &app.prompt else {
        return;
    };
    let area = layout::dialog_area(f.area());
    f.render_widget(Clear, area);
    let lines = vec![
        Line::from(format!(" {}", prompt.label)),
        Line::from(vec![
            Span::raw(format!(" {}", prompt.input)),
            Span::styled("▏", Style::default().fg(Color::Cyan)),
        ]),
        Line::from(""),
        Line::from(Span::styled(" Enter ok · Esc cancel", Style::default().fg(Color::DarkGray))),
    ];
    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(widget, area);
}

fn draw_help_overlay(f: &mut Frame) {
    let area = layout::help_area(f.area());
    f.render_widget(Clear, area);

    let help_text = vec![
        Line::from(Span::styled(
            "  Quick guide",
            Style::default()
                .add_modifier(Modifier::BOLD)
                .fg(Color::Cyan),
        )),
        Line::from(""),
        Line::from("  Mouse"),
        Line::from("    drag a card       Move it; drop outside to delete"),
        Line::from("    drag ⠿ / header   Reorder categories"),
        Line::from("    click a card      Edit it"),
        Line::from("    click a title     Rename the category"),
        Line::from("    [+] / [x]         Add a card / delete the category"),
        Line::from("    Shift+wheel       Scroll sideways"),
        Line::from(""),
        Line::from("  Keys"),
        Line::from("    h/l j/k arrows    Select"),
        Line::from("    a / Enter / d     Add, edit, delete card"),
        Line::from("    n / r / D         Add, rename, delete category"),
        Line::from("    Shift+←/→         Scroll sideways"),
        Line::from("    x / i / X         Export, import, clear board"),
        Line::from("    ?                 Toggle help"),
        Line::from("    q / Ctrl+C        Quit"),
        Line::from(""),
        Line::from(Span::styled(
            "  Cards in Floating don't count towards progress",
            Style::default().fg(Color::Magenta),
        )),
        Line::from(Span::styled(
            "  Press Esc or click outside to close",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(" Help ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false })
        .alignment(Alignment::Left);

    f.render_widget(help, area);
}
