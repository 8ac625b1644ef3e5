use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use world::io;
use world::util::random;
use world::world::infection::AgeTables;
use world::world::place::Places;
use world::world::World;

/// Discrete-time stochastic simulation of COVID-19 spread over
/// households, schools, workplaces, and hospitals.
#[derive(Parser, Debug)]
#[command(name = "covid_abm")]
struct Args {
    /// Agent file, one agent per line
    #[arg(long)]
    agents: PathBuf,

    /// Household file: `id x y`
    #[arg(long)]
    households: PathBuf,

    /// School file: `id x y type`
    #[arg(long)]
    schools: PathBuf,

    /// Workplace file: `id x y`
    #[arg(long)]
    workplaces: PathBuf,

    /// Hospital file: `id x y`
    #[arg(long)]
    hospitals: Option<PathBuf>,

    /// Model parameter file (`<name> <value>` per line)
    #[arg(long)]
    parameters: PathBuf,

    /// Age-banded mortality probabilities
    #[arg(long)]
    mortality: PathBuf,

    /// Age-banded hospitalization probabilities
    #[arg(long)]
    hospitalization: PathBuf,

    /// Age-banded ICU probabilities
    #[arg(long)]
    icu: PathBuf,

    /// Time step in days
    #[arg(long, default_value_t = 0.25)]
    dt: f64,

    /// Number of steps to simulate
    #[arg(long, default_value_t = 400)]
    steps: u64,

    /// RNG seed; omit for a random run
    #[arg(long)]
    seed: Option<u64>,

    /// Output directory
    #[arg(long, default_value = "output")]
    out_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let params = io::load_parameters(&args.parameters)
        .with_context(|| format!("loading {}", args.parameters.display()))?;
    let tables = AgeTables {
        mortality: io::load_age_bands(&args.mortality)?,
        hospitalization: io::load_age_bands(&args.hospitalization)?,
        icu: io::load_age_bands(&args.icu)?,
    };

    let mut places = Places::default();
    places.households = io::load_households(&args.households, &params)?;
    places.schools = io::load_schools(&args.schools, &params)?;
    places.workplaces = io::load_workplaces(&args.workplaces, &params)?;
    if let Some(path) = &args.hospitals {
        places.hospitals = io::load_hospitals(path, &params)?;
    }
    let agents = io::load_agents(&args.agents)?;
    tracing::info!(
        agents = agents.len(),
        households = places.households.len(),
        schools = places.schools.len(),
        workplaces = places.workplaces.len(),
        hospitals = places.hospitals.len(),
        "world loaded"
    );

    let mut world = World::new(
        args.dt,
        params,
        tables,
        places,
        agents,
        random::seeded_rng(args.seed),
    )?;

    let mut infected = Vec::with_capacity(args.steps as usize + 1);
    for step in 0..=args.steps {
        infected.push(world.num_infected());
        world.step()?;
        if step % 100 == 0 {
            tracing::info!(step, infected = infected[infected.len() - 1], "progress");
        }
    }

    std::fs::create_dir_all(&args.out_dir)?;
    io::write_series(&args.out_dir.join("infected_with_time.txt"), &infected)?;
    let stamp = chrono::Local::now().format("%F_%H-%M-%S");
    world.stat().write(&format!("run_{stamp}"), &args.out_dir)?;
    io::write_entities(&args.out_dir.join("households.txt"), &world.places().households)?;
    io::write_entities(&args.out_dir.join("schools.txt"), &world.places().schools)?;
    io::write_entities(&args.out_dir.join("workplaces.txt"), &world.places().workplaces)?;
    if !world.places().hospitals.is_empty() {
        io::write_entities(&args.out_dir.join("hospitals.txt"), &world.places().hospitals)?;
    }
    io::write_entities(&args.out_dir.join("agents.txt"), world.agents())?;

    tracing::info!(
        total_infected = world.total_infected(),
        total_dead = world.total_dead(),
        total_recovered = world.total_recovered(),
        "finished"
    );
    Ok(())
}
