use std::io::{self, Stdout, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType};
use filtertabs::{TABS_PER_PAGE, TabManager};

use crate::app::{TerminalBell, Transcripts};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabHitbox {
    pub name: String,
    pub left: u16,
    pub right: u16,
}

#[derive(Debug, Default, Clone)]
pub struct RenderState {
    pub tab_hitboxes: Vec<TabHitbox>,
}

fn is_ansi_final_byte(ch: char) -> bool {
    ('@'..='~').contains(&ch)
}

pub fn clip_to_width(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

/// Clips to `width` visible columns, passing escape sequences through and
/// resetting the style if the cut lands inside styled text.
pub fn clip_ansi_to_visible_width(text: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut visible = 0usize;
    let mut chars = text.chars();
    let mut saw_ansi = false;
    let mut clipped = false;

    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            saw_ansi = true;
            out.push(ch);

            if let Some(next) = chars.next() {
                out.push(next);
                if next == '[' {
                    for seq_char in chars.by_ref() {
                        out.push(seq_char);
                        if is_ansi_final_byte(seq_char) {
                            break;
                        }
                    }
                }
            }
            continue;
        }

        if visible >= width {
            clipped = true;
            break;
        }

        out.push(ch);
        visible += 1;
    }

    if clipped && saw_ansi {
        out.push_str("\u{1b}[0m");
    }

    out
}

pub fn clip_with_ellipsis(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_owned();
    }
    if width <= 3 {
        return ".".repeat(width);
    }

    let mut out = text.chars().take(width - 3).collect::<String>();
    out.push_str("...");
    out
}

/// A label padded to exactly `width` columns.
pub fn fit_tab_title(label: &str, width: usize) -> String {
    if width < 3 {
        return " ".repeat(width);
    }

    let mut piece = format!(" {} ", clip_with_ellipsis(label, width - 2));
    let count = piece.chars().count();
    if count < width {
        piece.push_str(&" ".repeat(width - count));
    }
    clip_to_width(&piece, width)
}

pub fn unread_marker(unread: bool) -> &'static str {
    if unread { " •" } else { "  " }
}

/// Paging arrows and group position, e.g. `‹ ›  group 2/3`.
pub fn status_label(active_group: usize, groups: usize, offset: usize, tabs: usize) -> String {
    let left = if offset > 0 { '‹' } else { ' ' };
    let right = if offset + TABS_PER_PAGE < tabs { '›' } else { ' ' };
    format!(" {left} {right}  group {}/{}", active_group + 1, groups)
}

pub fn first_body_row(body_start_row: usize, body_height: usize, visible_count: usize) -> usize {
    body_start_row + body_height.saturating_sub(visible_count)
}

pub fn tab_name_at_position(render_state: &RenderState, column: u16, row: u16) -> Option<&str> {
    if row > 2 {
        return None;
    }

    render_state
        .tab_hitboxes
        .iter()
        .find(|hitbox| column >= hitbox.left && column <= hitbox.right)
        .map(|hitbox| hitbox.name.as_str())
}

fn draw_piece_clipped(
    stdout: &mut Stdout,
    x: &mut u16,
    y: u16,
    remaining: &mut usize,
    text: &str,
    color: Option<Color>,
) -> io::Result<()> {
    let shown = clip_to_width(text, *remaining);
    if shown.is_empty() {
        return Ok(());
    }

    let width = shown.chars().count();
    queue!(stdout, MoveTo(*x, y))?;
    if let Some(color) = color {
        queue!(stdout, SetForegroundColor(color), Print(&shown), ResetColor)?;
    } else {
        queue!(stdout, Print(&shown))?;
    }

    *x = x.saturating_add(width as u16);
    *remaining = remaining.saturating_sub(width);
    Ok(())
}

pub fn draw(
    stdout: &mut Stdout,
    manager: &TabManager<Transcripts, TerminalBell>,
) -> io::Result<RenderState> {
    let (cols, rows) = terminal::size()?;
    let cols_usize = cols as usize;
    let rows_usize = rows as usize;

    let mut render_state = RenderState::default();

    queue!(stdout, MoveTo(0, 0), Clear(ClearType::All))?;

    if rows_usize == 0 || cols_usize == 0 {
        stdout.flush()?;
        return Ok(render_state);
    }

    let group = manager.active_tab_group();
    let status = status_label(
        manager.active_group_index(),
        manager.groups().len(),
        manager.tab_offset(),
        group.len(),
    );
    let tab_cols_limit = cols_usize.saturating_sub(status.chars().count());

    let mut x = 0u16;
    let mut tabs_right: u16 = 0;
    for (slot, tab) in manager.visible_tabs().enumerate() {
        let remaining_cols = tab_cols_limit.saturating_sub(x as usize);
        if remaining_cols < 3 {
            break;
        }

        let number_piece = format!(" {} ", slot + 1);
        let unread_piece = unread_marker(tab.is_unread());
        let fixed_inner_width = number_piece.chars().count() + unread_piece.chars().count() + 1;
        let desired_inner_width = fixed_inner_width + tab.name().chars().count() + 2;
        let inner_width = desired_inner_width.min(remaining_cols - 2);
        let title_piece = fit_tab_title(tab.name(), inner_width.saturating_sub(fixed_inner_width));

        let right = x + inner_width as u16 + 1;
        let active = manager.is_tab_active(tab.name());
        let border_color = if active { Color::White } else { Color::DarkGrey };
        let horiz = "─".repeat(inner_width);

        queue!(
            stdout,
            MoveTo(x, 0),
            SetForegroundColor(border_color),
            Print("╭"),
            Print(&horiz),
            Print("╮"),
            ResetColor
        )?;

        if rows_usize >= 2 {
            queue!(
                stdout,
                MoveTo(x, 1),
                SetForegroundColor(border_color),
                Print("│"),
                ResetColor
            )?;

            let mut inner_x = x + 1;
            let mut remaining_inner = inner_width;
            draw_piece_clipped(
                stdout,
                &mut inner_x,
                1,
                &mut remaining_inner,
                &number_piece,
                Some(Color::DarkGrey),
            )?;
            let title_color = if tab.is_whitelist() { None } else { Some(Color::DarkYellow) };
            draw_piece_clipped(
                stdout,
                &mut inner_x,
                1,
                &mut remaining_inner,
                &title_piece,
                title_color,
            )?;
            draw_piece_clipped(
                stdout,
                &mut inner_x,
                1,
                &mut remaining_inner,
                unread_piece,
                Some(Color::Red),
            )?;
            if remaining_inner > 0 {
                queue!(stdout, MoveTo(inner_x, 1), Print(" ".repeat(remaining_inner)))?;
            }

            queue!(
                stdout,
                MoveTo(right, 1),
                SetForegroundColor(border_color),
                Print("│"),
                ResetColor
            )?;
        }

        if rows_usize >= 3 {
            queue!(
                stdout,
                MoveTo(x, 2),
                SetForegroundColor(border_color),
                Print("╰"),
                Print(&horiz),
                Print("╯"),
                ResetColor
            )?;
        }

        render_state.tab_hitboxes.push(TabHitbox {
            name: tab.name().to_owned(),
            left: x,
            right,
        });
        tabs_right = right;
        x = right.saturating_add(2);
    }

    let status_col = if tabs_right > 0 { tabs_right + 1 } else { 0 };
    if (status_col as usize) < cols_usize {
        let shown = clip_to_width(&status, cols_usize - status_col as usize);
        let status_row = if rows_usize >= 2 { 1 } else { 0 };
        queue!(
            stdout,
            MoveTo(status_col, status_row),
            SetForegroundColor(Color::Grey),
            Print(shown),
            ResetColor
        )?;
    }

    let body_start_row = if rows_usize >= 3 { 3usize } else { 2usize };
    if rows_usize <= body_start_row {
        stdout.flush()?;
        return Ok(render_state);
    }

    let body_height = rows_usize - body_start_row;
    let lines = manager
        .active_chat()
        .map(|tab| manager.host().lines(manager.active_group_index(), tab.name()))
        .unwrap_or_default();
    let visible_count = lines.len().min(body_height);
    let first_row = first_body_row(body_start_row, body_height, visible_count);

    for (screen_row, line) in lines.iter().skip(lines.len() - visible_count).enumerate() {
        let y = (first_row + screen_row) as u16;
        let clipped = clip_ansi_to_visible_width(line, cols_usize);
        queue!(stdout, MoveTo(0, y), Print(clipped))?;
    }

    stdout.flush()?;
    Ok(render_state)
}
