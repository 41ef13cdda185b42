//! Terminal fog-of-war walk using crossterm.
//!
//! Run: cargo run --bin walk
//!
//! Logs go to `tilefog-walk.log` so they do not disturb the screen.

use std::io::{self, Write};

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};

use tilefog_demos::{Command, Frame, Shade, Walk};

const LOG_FILE: &str = "tilefog-walk.log";

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{} {}] {}", record.level(), record.target(), message))
        })
        .level(log::LevelFilter::Debug)
        .chain(fern::log_file(LOG_FILE)?)
        .apply()?;
    Ok(())
}

/// Maps a key press to a demo command. `None` for keys the demo ignores.
fn to_command(code: KeyCode, modifiers: KeyModifiers) -> Option<Command> {
    let (dx, dy) = match code {
        KeyCode::Up | KeyCode::Char('k') => (0, -1),
        KeyCode::Down | KeyCode::Char('j') => (0, 1),
        KeyCode::Left | KeyCode::Char('h') => (-1, 0),
        KeyCode::Right | KeyCode::Char('l') => (1, 0),
        KeyCode::Char('s') => return Some(Command::ToggleStatic),
        KeyCode::Char('d') => return Some(Command::ToggleDynamic),
        KeyCode::Char('+') | KeyCode::Char('=') => return Some(Command::RangeUp),
        KeyCode::Char('-') => return Some(Command::RangeDown),
        KeyCode::Char('r') => return Some(Command::ResetHistory),
        _ => return None,
    };
    if modifiers.contains(KeyModifiers::SHIFT) {
        Some(Command::Jump(dx, dy))
    } else {
        Some(Command::Move(dx, dy))
    }
}

fn shade_color(shade: Shade) -> Color {
    match shade {
        Shade::Lit => Color::Rgb { r: 230, g: 220, b: 180 },
        Shade::Dim => Color::Rgb { r: 90, g: 90, b: 110 },
        Shade::Hidden => Color::Reset,
    }
}

fn draw(out: &mut impl Write, frame: &Frame) -> io::Result<()> {
    queue!(out, cursor::MoveTo(0, 0), terminal::Clear(ClearType::All))?;
    for (y, row) in frame.rows.iter().enumerate() {
        queue!(out, cursor::MoveTo(0, y as u16))?;
        for g in row {
            let ch = if g.shade == Shade::Hidden { ' ' } else { g.ch };
            queue!(out, SetForegroundColor(shade_color(g.shade)), Print(ch))?;
        }
    }
    queue!(out, ResetColor)?;
    for (i, line) in frame.status.iter().enumerate() {
        queue!(out, cursor::MoveTo(0, (frame.rows.len() + i) as u16), Print(line))?;
    }
    out.flush()
}

fn run(walk: &mut Walk) -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = io::stdout();
    draw(&mut stdout, &walk.frame()?)?;
    loop {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = event::read()?
        else {
            continue;
        };
        if matches!(code, KeyCode::Char('q') | KeyCode::Esc) {
            return Ok(());
        }
        if let Some(cmd) = to_command(code, modifiers) {
            walk.apply(cmd);
            draw(&mut stdout, &walk.frame()?)?;
        }
    }
}

fn main() {
    if let Err(e) = init_logging() {
        eprintln!("Error: cannot open {LOG_FILE}: {e}");
        std::process::exit(1);
    }
    let mut walk = match Walk::new(42) {
        Ok(walk) => walk,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let setup = terminal::enable_raw_mode()
        .and_then(|()| execute!(io::stdout(), terminal::EnterAlternateScreen, cursor::Hide));
    let result = setup.map_err(Into::into).and_then(|()| run(&mut walk));

    let _ = execute!(io::stdout(), cursor::Show, terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    if let Err(e) = result {
        log::warn!("walk demo failed: {e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
