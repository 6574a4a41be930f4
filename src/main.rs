use std::{
    fmt::{self, Write},
    path::PathBuf,
};

use anyhow::Context;
use clap::Parser;
use engine::{Config, Event, FogState, Runtime, TaskStore};
use glam::ivec2;
use tracing_subscriber::EnvFilter;
use util::HashMap;

mod roster;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[arg(long, help = "Simulation config file (IDM)")]
    config: Option<PathBuf>,

    #[arg(long, help = "World seed, overrides the config file")]
    seed: Option<u64>,

    #[arg(long, default_value_t = 4, help = "People in the generated roster")]
    people: usize,

    #[arg(long, default_value_t = 12, help = "Tasks in the generated roster")]
    tasks: usize,

    #[arg(long, default_value_t = 3)]
    milestones: usize,

    #[arg(long, default_value_t = 120.0, help = "Simulated seconds to run")]
    seconds: f32,

    #[arg(long, default_value_t = 30, help = "Ticks per simulated second")]
    rate: u32,

    #[arg(long, help = "Print the map when done")]
    map: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    log::info!("seed: {}", config.seed);

    let now = chrono::Local::now().naive_local();
    let mut store = roster::generate(
        config.seed,
        args.people,
        args.tasks,
        args.milestones,
        now.date(),
    );

    let mut rt = Runtime::new(config, &store)
        .context("failed to start simulation")?;

    let dt = 1.0 / args.rate.max(1) as f32;
    let ticks = (args.seconds.max(0.0) / dt).round() as usize;
    let mut events: Vec<Event> = Vec::new();
    for _ in 0..ticks {
        rt.tick(&mut store, &mut events, now, dt);
    }

    print!("{}", report(&rt, &store, &events)?);
    if args.map {
        print!("{}", render_map(&rt));
    }

    Ok(())
}

fn report(
    rt: &Runtime,
    store: &impl TaskStore,
    events: &[Event],
) -> Result<String, fmt::Error> {
    let mut ret = String::new();
    writeln!(
        ret,
        "After {:.0} s, {:.0}% of the map explored",
        rt.clock(),
        rt.explored_fraction() * 100.0
    )?;

    let mut deliveries: HashMap<&str, usize> = HashMap::default();
    for e in events {
        if let Event::StateChanged(p, s) = e {
            if matches!(*s, "Building" | "Depositing") {
                *deliveries.entry(p.as_str()).or_default() += 1;
            }
        }
    }

    for unit in rt.units() {
        writeln!(
            ret,
            "  {:<8} {:<18} {} deliveries",
            unit.person,
            unit.state().name(),
            deliveries.get(unit.person.as_str()).unwrap_or(&0)
        )?;
    }

    for task in store.tasks() {
        writeln!(
            ret,
            "  {:<8} {:>3.0}%  {}",
            task.id, task.percent_complete, task.assignee
        )?;
    }

    for (id, s) in rt.structures() {
        writeln!(ret, "  {id:<8} built {:.0}%", s.progress * 100.0)?;
    }

    Ok(ret)
}

/// Map as text, with hidden tiles blanked out.
fn render_map(rt: &Runtime) -> String {
    let grid = rt.grid();
    let mut ret = String::new();
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let p = ivec2(x, y);
            let c = if rt.fog().state(p) == FogState::Hidden {
                '?'
            } else if rt.units().any(|u| u.tile() == p) {
                '@'
            } else if p == rt.base() {
                'B'
            } else {
                match grid.get(p) {
                    Some(t) if t.structure().is_some() => 'H',
                    Some(t) if t.node().is_some() => '*',
                    Some(t) if t.blocked => '#',
                    Some(t) => t.kind.into(),
                    None => ' ',
                }
            };
            ret.push(c);
        }
        ret.push('\n');
    }
    ret
}
