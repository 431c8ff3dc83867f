use anyhow::Context;
use clap::Parser;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::style::Print;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{ExecutableCommand, QueueableCommand};
use log::info;
use maze_field::config::{Args, Settings};
use maze_field::render::{self, Renderer};
use maze_field::{Field, Pos, Session};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::{self, Stdout, Write};
use std::thread;
use std::time::{Duration, Instant};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_env("MAZE_LOG")
        .init();

    let args = Args::parse();
    let settings = {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut prompt = io::stdout();
        Settings::resolve(args, &mut input, &mut prompt)?
    };
    info!(
        "generating {}x{} maze with seed {}",
        settings.rows, settings.cols, settings.seed
    );

    let mut rng = StdRng::seed_from_u64(settings.seed);
    let (field, elapsed) = match settings.animate {
        Some(frame_time) => animate(&settings, frame_time, &mut rng)?,
        None => {
            let started = Instant::now();
            let field = maze_field::generate(settings.rows, settings.cols, &mut rng)?;
            (field, started.elapsed())
        }
    };

    let mut stdout = io::stdout();
    if settings.plain {
        writeln!(stdout, "{}", render::render_text(&field, settings.show_solution))?;
    } else {
        render::draw(&mut stdout, &field, settings.show_solution)
            .context("failed to draw maze")?;
    }
    if settings.show_time {
        writeln!(stdout, "Generated in {:?}", elapsed)?;
    }
    Ok(())
}

/// Runs generation on the alternate screen. The returned duration excludes
/// time spent drawing, sleeping between frames and waiting for `q`.
fn animate(
    settings: &Settings,
    frame_time: Duration,
    rng: &mut StdRng,
) -> anyhow::Result<(Field, Duration)> {
    let field = Field::new(settings.rows, settings.cols)?;

    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(Hide)?;

    let result = run(&mut stdout, field, settings, frame_time, rng);

    stdout.execute(Show)?;
    stdout.execute(LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;
    result
}

/// Plays back carving frame by frame. `q` skips to the finished maze.
struct Playback<'a> {
    stdout: &'a mut Stdout,
    renderer: Renderer,
    frame_time: Duration,
    skipping: bool,
    failed: Option<io::Error>,
    paused: Duration,
}

impl Playback<'_> {
    fn show(&mut self, field: &Field, traverser: Option<Pos>, phase: &str) {
        if self.skipping || self.failed.is_some() {
            return;
        }
        let frame_start = Instant::now();
        self.draw(field, traverser, phase, frame_start);
        self.paused += frame_start.elapsed();
    }

    fn draw(&mut self, field: &Field, traverser: Option<Pos>, phase: &str, frame_start: Instant) {
        let hud = format!("{}  (q to skip)", phase);
        if let Err(err) = self.renderer.frame(&mut *self.stdout, field, traverser, &hud) {
            self.failed = Some(err);
            return;
        }
        match quit_requested() {
            Ok(true) => self.skipping = true,
            Ok(false) => {}
            Err(err) => self.failed = Some(err),
        }
        let elapsed = frame_start.elapsed();
        if elapsed < self.frame_time {
            thread::sleep(self.frame_time - elapsed);
        }
    }
}

fn run(
    stdout: &mut Stdout,
    field: Field,
    settings: &Settings,
    frame_time: Duration,
    rng: &mut StdRng,
) -> anyhow::Result<(Field, Duration)> {
    let renderer = Renderer::new(field.width(), field.height(), settings.show_solution);
    let mut session = Session::new(field);
    let mut playback = Playback {
        stdout,
        renderer,
        frame_time,
        skipping: false,
        failed: None,
        paused: Duration::ZERO,
    };

    let started = Instant::now();
    session.solve_with(rng, |field, traverser| {
        playback.show(field, traverser, "Carving solution")
    });
    session.grow_branches_with(rng, |field, traverser| {
        playback.show(field, traverser, "Growing branches")
    });
    let elapsed = started.elapsed().saturating_sub(playback.paused);
    if let Some(err) = playback.failed.take() {
        return Err(err).context("failed to draw frame");
    }

    let stats = session.stats();
    let field = session.into_field();
    let hud = format!(
        "Done: {} advances, {} retreats, {} branch cells",
        stats.advances, stats.retreats, stats.branch_cells
    );
    playback.renderer.frame(&mut *playback.stdout, &field, None, &hud)?;
    if let Some(footer) = playback.renderer.footer_row(&field) {
        playback
            .stdout
            .queue(MoveTo(playback.renderer.origin_x(), footer))?;
        playback.stdout.queue(Print("press q to quit"))?;
    }
    playback.stdout.flush()?;
    wait_for_quit()?;
    Ok((field, elapsed))
}

fn quit_requested() -> io::Result<bool> {
    while event::poll(Duration::from_millis(0))? {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && key.code == KeyCode::Char('q') {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

fn wait_for_quit() -> io::Result<()> {
    loop {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && key.code == KeyCode::Char('q') {
                    return Ok(());
                }
            }
        }
    }
}
