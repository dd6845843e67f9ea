//! Crossterm frame renderer for the interactive session.
//!
//! Draws from a read-only [`Session`] view; holds no state of its own apart
//! from what the terminal reports about its size each frame.

use std::io;
use std::io::Write;

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::Attribute;
use crossterm::style::Color;
use crossterm::style::Print;
use crossterm::style::ResetColor;
use crossterm::style::SetAttribute;
use crossterm::style::SetForegroundColor;
use crossterm::terminal;
use crossterm::terminal::Clear;
use crossterm::terminal::ClearType;

use portreap_ports::PortRecord;

use crate::app::session::Phase;
use crate::app::session::Session;
use crate::app::session::ToastKind;

const TITLE: &str = " portreap ";
const COLUMN_TITLES: [&str; 7] = ["PROTO", "PORT", "PROCESS", "PID", "USER", "ADDRESS", "STATE"];
const HINTS: &str = "j/k move \u{2502} enter/d terminate \u{2502} r refresh \u{2502} / filter \u{2502} ? help \u{2502} q quit";

// Rows reserved above and below the table.
const HEADER_ROWS: u16 = 3;
const FOOTER_ROWS: u16 = 2;

/// Per-column character widths for the current terminal width.
struct Columns {
    proto: usize,
    port: usize,
    process: usize,
    pid: usize,
    user: usize,
    address: usize,
    state: usize,
}

impl Columns {
    /// Fixed widths for the narrow columns; process and address flex to
    /// share whatever the terminal leaves over.
    fn layout(width: u16) -> Self {
        let fixed = 5 + 5 + 7 + 9 + 11; // proto, port, pid, user, state
        let separators = COLUMN_TITLES.len() - 1;
        let flexible = (width as usize)
            .saturating_sub(fixed + separators + 1)
            .max(16);
        let process = (flexible * 2 / 5).max(8);
        let address = (flexible - process).max(8);
        Self {
            proto: 5,
            port: 5,
            process,
            pid: 7,
            user: 9,
            address,
            state: 11,
        }
    }

    fn widths(&self) -> [usize; 7] {
        [
            self.proto,
            self.port,
            self.process,
            self.pid,
            self.user,
            self.address,
            self.state,
        ]
    }

    fn render(&self, record: &PortRecord) -> String {
        let cells = [
            record.protocol.clone(),
            record.port.to_string(),
            record.process.clone(),
            record.pid.to_string(),
            record.user.clone(),
            record.address.clone(),
            record.state.clone(),
        ];
        join_row(&cells, &self.widths())
    }

    fn header(&self) -> String {
        let cells = COLUMN_TITLES.map(String::from);
        join_row(&cells, &self.widths())
    }
}

/// Renders one full frame.
pub fn draw(out: &mut impl Write, session: &Session) -> io::Result<()> {
    let (width, height) = terminal::size()?;
    let columns = Columns::layout(width);
    queue!(out, Clear(ClearType::All))?;

    draw_header(out, session, &columns, width)?;

    let table_rows = height.saturating_sub(HEADER_ROWS + FOOTER_ROWS).max(1);
    draw_table(out, session, &columns, table_rows)?;
    draw_footer(out, session, width, height)?;

    if session.help_visible() {
        draw_help(out, width, height)?;
    } else if let Phase::Confirming { target, pending } = session.phase() {
        draw_confirm(out, target, *pending, width, height)?;
    }

    out.flush()
}

fn draw_header(
    out: &mut impl Write,
    session: &Session,
    columns: &Columns,
    width: u16,
) -> io::Result<()> {
    let title_line = format!(
        "{TITLE}\u{2500} {} open ports ",
        session.total_count()
    );
    queue!(
        out,
        MoveTo(0, 0),
        SetAttribute(Attribute::Bold),
        Print(pad(&title_line, width as usize)),
        SetAttribute(Attribute::Reset)
    )?;

    let status_line = match session.phase() {
        Phase::Failed { message } => message.clone(),
        _ => session.status().to_string(),
    };
    let status_color = match session.phase() {
        Phase::Failed { .. } => Color::Red,
        _ => Color::DarkGrey,
    };
    queue!(
        out,
        MoveTo(0, 1),
        SetForegroundColor(status_color),
        Print(pad(&status_line, width as usize)),
        ResetColor
    )?;

    queue!(
        out,
        MoveTo(0, 2),
        SetAttribute(Attribute::Bold),
        SetForegroundColor(Color::Cyan),
        Print(pad(&columns.header(), width as usize)),
        ResetColor,
        SetAttribute(Attribute::Reset)
    )?;
    Ok(())
}

fn draw_table(
    out: &mut impl Write,
    session: &Session,
    columns: &Columns,
    table_rows: u16,
) -> io::Result<()> {
    let visible = session.visible_records();
    let selected = session.selected_index();
    let rows = table_rows as usize;

    // Scroll so the selection stays on screen.
    let offset = if selected >= rows { selected + 1 - rows } else { 0 };

    for (slot, record) in visible.iter().skip(offset).take(rows).enumerate() {
        let row_index = offset + slot;
        let line = columns.render(record);
        queue!(out, MoveTo(0, HEADER_ROWS + slot as u16))?;
        if row_index == selected {
            queue!(
                out,
                SetAttribute(Attribute::Reverse),
                Print(line),
                SetAttribute(Attribute::Reset)
            )?;
        } else {
            queue!(out, Print(line))?;
        }
    }

    if visible.is_empty() {
        let message = if session.filter_query().is_empty() {
            "No open ports found."
        } else {
            "No ports match the filter."
        };
        queue!(
            out,
            MoveTo(2, HEADER_ROWS + 1),
            SetForegroundColor(Color::DarkGrey),
            Print(message),
            ResetColor
        )?;
    }
    Ok(())
}

fn draw_footer(
    out: &mut impl Write,
    session: &Session,
    width: u16,
    height: u16,
) -> io::Result<()> {
    let message_row = height.saturating_sub(2);
    let hints_row = height.saturating_sub(1);

    if let Some(toast) = session.toast() {
        let color = match toast.kind {
            ToastKind::Info => Color::Cyan,
            ToastKind::Success => Color::Green,
            ToastKind::Error => Color::Red,
        };
        queue!(
            out,
            MoveTo(0, message_row),
            SetForegroundColor(color),
            Print(pad(&toast.text, width as usize)),
            ResetColor
        )?;
    }

    let hints = if session.filter_editing() {
        format!("filter: {}\u{258f}  (enter accept, esc clear)", session.filter_query())
    } else if session.filter_query().is_empty() {
        HINTS.to_string()
    } else {
        format!("{HINTS} \u{2502} filtered: {:?}", session.filter_query())
    };
    queue!(
        out,
        MoveTo(0, hints_row),
        SetForegroundColor(Color::DarkGrey),
        Print(pad(&hints, width as usize)),
        ResetColor
    )?;
    Ok(())
}

fn draw_confirm(
    out: &mut impl Write,
    target: &PortRecord,
    pending: bool,
    width: u16,
    height: u16,
) -> io::Result<()> {
    let subject = format!("Terminate {} (pid {})?", target.process, target.pid);
    let detail = format!(
        "{} {}:{} {}",
        target.protocol, target.address, target.port, target.state
    );
    let action = if pending {
        "Sending SIGTERM, escalating to SIGKILL if ignored...".to_string()
    } else {
        "[y] terminate      [n] cancel".to_string()
    };

    let lines = [subject, detail, String::new(), action];
    draw_box(out, &lines, width, height, Color::Red)
}

fn draw_help(out: &mut impl Write, width: u16, height: u16) -> io::Result<()> {
    let lines = [
        "Keys".to_string(),
        String::new(),
        "j/k, up/down   move the selection".to_string(),
        "enter, d       select for termination".to_string(),
        "y / n          confirm / cancel".to_string(),
        "r              refresh the list".to_string(),
        "/              filter the list".to_string(),
        "esc            dismiss help, clear the filter".to_string(),
        "q, ctrl-c      quit".to_string(),
    ];
    draw_box(out, &lines, width, height, Color::Cyan)
}

/// Draws a bordered box centered on the screen.
fn draw_box(
    out: &mut impl Write,
    lines: &[String],
    width: u16,
    height: u16,
    border: Color,
) -> io::Result<()> {
    let inner = lines
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0)
        .min(width.saturating_sub(6) as usize)
        .max(10);
    let box_width = inner + 4;
    let box_height = lines.len() + 2;

    let left = (width as usize).saturating_sub(box_width) / 2;
    let top = (height as usize).saturating_sub(box_height) / 2;

    let horizontal = "\u{2500}".repeat(box_width - 2);
    queue!(
        out,
        MoveTo(left as u16, top as u16),
        SetForegroundColor(border),
        Print(format!("\u{250c}{horizontal}\u{2510}")),
        ResetColor
    )?;
    for (i, line) in lines.iter().enumerate() {
        queue!(
            out,
            MoveTo(left as u16, (top + 1 + i) as u16),
            SetForegroundColor(border),
            Print("\u{2502}"),
            ResetColor,
            Print(format!(" {} ", pad(line, inner))),
            SetForegroundColor(border),
            Print("\u{2502}"),
            ResetColor
        )?;
    }
    queue!(
        out,
        MoveTo(left as u16, (top + 1 + lines.len()) as u16),
        SetForegroundColor(border),
        Print(format!("\u{2514}{horizontal}\u{2518}")),
        ResetColor
    )?;
    Ok(())
}

fn join_row(cells: &[String; 7], widths: &[usize; 7]) -> String {
    let mut row = String::new();
    for (i, (cell, &width)) in cells.iter().zip(widths.iter()).enumerate() {
        if i > 0 {
            row.push(' ');
        }
        row.push_str(&pad(cell, width));
    }
    row
}

/// Pads or truncates to exactly `width` characters.
fn pad(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count > width {
        let truncated: String = text.chars().take(width.saturating_sub(1)).collect();
        format!("{truncated}\u{2026}")
    } else {
        let mut padded = text.to_string();
        padded.extend(std::iter::repeat(' ').take(width - count));
        padded
    }
}
