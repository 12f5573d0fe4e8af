use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use puffs::{EventBus, FrameDriver, InputEvent, Settings, Slot, Subscription, TextureCatalog};
use resvg::tiny_skia::Pixmap;

#[derive(Parser, Debug)]
#[command(name = "puffs", version)]
struct Cli {
    /// Log debug events to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a scripted session and write the final frame as a PNG.
    Frame(FrameArgs),
    /// Run a scripted session and write every k-th frame as a PNG.
    Sheet(SheetArgs),
}

#[derive(Args, Debug)]
struct Session {
    /// Asset directory containing `manifest.json`.
    #[arg(long, default_value = "assets")]
    assets: PathBuf,

    /// Settings JSON (defaults when omitted).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 60)]
    ticks: u64,

    /// Seconds per tick.
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f64,

    /// Key codes held from the first tick (e.g. `ArrowRight`, `KeyW`).
    #[arg(long = "hold")]
    hold: Vec<String>,

    /// Tick at which every held key is released.
    #[arg(long)]
    release_at: Option<u64>,

    /// Ticks at which a primary click happens.
    #[arg(long = "click-at")]
    click_at: Vec<u64>,

    /// Pointer position in viewport pixels, as `x,y`.
    #[arg(long, value_parser = parse_xy)]
    pointer: Option<(f64, f64)>,

    /// Headwear asset key.
    #[arg(long)]
    headwear: Option<String>,

    /// Weapon asset key.
    #[arg(long)]
    weapon: Option<String>,

    /// Body color, `#RRGGBB[AA]`.
    #[arg(long)]
    body_color: Option<String>,

    /// Outline color, `#RRGGBB[AA]`.
    #[arg(long)]
    outline_color: Option<String>,

    /// Outline thickness.
    #[arg(long)]
    outline_thickness: Option<f64>,

    /// Display name.
    #[arg(long)]
    name: Option<String>,

    /// Pick random equipment and body color before the first tick.
    #[arg(long)]
    randomize: bool,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    session: Session,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct SheetArgs {
    #[command(flatten)]
    session: Session,

    /// Write every k-th tick.
    #[arg(long, default_value_t = 10)]
    every: u64,

    /// Output directory; frames are written as `frame_00000.png`, ...
    #[arg(long)]
    out_dir: PathBuf,
}

fn parse_xy(s: &str) -> Result<(f64, f64), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got '{s}'"))?;
    let x = x.trim().parse::<f64>().map_err(|e| e.to_string())?;
    let y = y.trim().parse::<f64>().map_err(|e| e.to_string())?;
    Ok((x, y))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Sheet(args) => cmd_sheet(args),
    }
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let mut harness = start(&args.session)?;
    run(&mut harness, &args.session, |_, _| Ok(()))?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    write_png(harness.driver.frame(), &args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_sheet(args: SheetArgs) -> anyhow::Result<()> {
    if args.every == 0 {
        anyhow::bail!("--every must be >= 1");
    }
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;

    let mut harness = start(&args.session)?;
    let mut written = 0u64;
    run(&mut harness, &args.session, |tick, frame| {
        if tick % args.every == 0 {
            let path = args.out_dir.join(format!("frame_{tick:05}.png"));
            write_png(frame, &path)?;
            written += 1;
        }
        Ok(())
    })?;
    eprintln!("wrote {written} frames to {}", args.out_dir.display());
    Ok(())
}

/// A driver fed through its own input bus, the way a UI shell would feed it.
struct Harness {
    driver: FrameDriver,
    bus: EventBus,
    inbox: Subscription,
}

impl Harness {
    fn deliver(&mut self) -> anyhow::Result<()> {
        for event in self.inbox.drain() {
            self.driver
                .handle_event(event.clone())
                .with_context(|| format!("apply {event:?}"))?;
        }
        Ok(())
    }
}

fn start(session: &Session) -> anyhow::Result<Harness> {
    let settings = match &session.settings {
        Some(path) => Settings::from_path(path)?,
        None => Settings::default(),
    };
    let catalog = TextureCatalog::load_dir(&session.assets)
        .with_context(|| format!("load assets from '{}'", session.assets.display()))?;
    let mut driver = FrameDriver::new(settings, catalog)?;

    // Let every asset reach its first bitmap before the first frame.
    driver.catalog_mut().pump_until_idle();

    let bus = EventBus::new();
    let inbox = bus.subscribe();
    let mut events = Vec::new();
    if session.randomize {
        events.push(InputEvent::Randomize);
    }
    if let Some(key) = &session.headwear {
        events.push(InputEvent::Equip {
            slot: Slot::Headwear,
            key: Some(key.clone()),
        });
    }
    if let Some(key) = &session.weapon {
        events.push(InputEvent::Equip {
            slot: Slot::Weapon,
            key: Some(key.clone()),
        });
    }
    if let Some(hex) = &session.body_color {
        events.push(InputEvent::BodyColor(hex.clone()));
    }
    if let Some(hex) = &session.outline_color {
        events.push(InputEvent::OutlineColor(hex.clone()));
    }
    if let Some(t) = session.outline_thickness {
        events.push(InputEvent::OutlineThickness(t));
    }
    if let Some(name) = &session.name {
        events.push(InputEvent::Name(name.clone()));
    }
    if let Some((x, y)) = session.pointer {
        events.push(InputEvent::PointerMove(puffs::Vec2::new(x, y)));
    }
    for code in &session.hold {
        events.push(InputEvent::KeyDown {
            code: code.clone(),
            repeat: false,
        });
    }
    for event in events {
        bus.publish(event);
    }
    let mut harness = Harness { driver, bus, inbox };
    harness.deliver()?;
    Ok(harness)
}

fn run<F>(harness: &mut Harness, session: &Session, mut on_frame: F) -> anyhow::Result<()>
where
    F: FnMut(u64, &Pixmap) -> anyhow::Result<()>,
{
    for tick in 0..session.ticks {
        if session.release_at == Some(tick) {
            harness.bus.publish(InputEvent::Blur);
        }
        if session.click_at.contains(&tick) {
            harness.bus.publish(InputEvent::Click);
        }
        harness.deliver()?;
        harness.driver.step(session.dt);
        on_frame(tick, harness.driver.frame())?;
    }

    let stats = harness.driver.stats();
    tracing::debug!(?stats, "session finished");
    if stats.frames_skipped > 0 {
        eprintln!("warning: {} frames skipped", stats.frames_skipped);
    }
    Ok(())
}

fn write_png(pixmap: &Pixmap, path: &Path) -> anyhow::Result<()> {
    let mut data = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let c = px.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    image::save_buffer_with_format(
        path,
        &data,
        pixmap.width(),
        pixmap.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))
}
