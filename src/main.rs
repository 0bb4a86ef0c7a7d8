use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Parser, ValueEnum};
use tokio::runtime::Builder;
use tokio::time::sleep;

use dvnet::config::Topology;
use dvnet::sim::Simulation;

#[derive(Parser)]
#[command(name = "dvnet", about = "Packet-switched network simulator with distance-vector routing")]
struct Cli {
    /// Built-in scenario to run.
    #[arg(long, value_enum, default_value = "four-router")]
    scenario: Scenario,

    /// Topology description file; overrides --scenario.
    #[arg(long)]
    topology: Option<PathBuf>,

    /// Seconds to let the routing tables converge.
    #[arg(long, default_value_t = 5)]
    converge_secs: u64,

    /// Seconds to let data packets drain after each message.
    #[arg(long, default_value_t = 2)]
    drain_secs: u64,
}

#[derive(Clone, Copy, ValueEnum)]
enum Scenario {
    TwoRouter,
    FourRouter,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let rt = Builder::new_multi_thread().enable_all().build()?;
    rt.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    let topology = match &cli.topology {
        Some(path) => Topology::load(path)?,
        None => match cli.scenario {
            Scenario::TwoRouter => Topology::two_router(),
            Scenario::FourRouter => Topology::four_router(),
        },
    };

    let mut sim = Simulation::build(&topology)?;
    sim.start();

    // One seeding advertisement starts the routing exchange; everything
    // after that is routers reacting to each other.
    if let Some(seed) = &topology.seed {
        let router = sim
            .router(&seed.router)
            .ok_or_else(|| anyhow!("seed router {} does not exist", seed.router))?;
        router.send_routes(seed.interface).await;
    }
    sleep(Duration::from_secs(cli.converge_secs)).await;

    println!("CONVERGED ROUTING TABLES:");
    for router in sim.routers() {
        println!("\n{}", router.format_routes().await);
    }

    println!("Start sending messages\n");
    for message in &topology.messages {
        let host = sim
            .host(&message.from)
            .ok_or_else(|| anyhow!("sending host {} does not exist", message.from))?;
        host.send(&message.to, &message.payload).await;
        sleep(Duration::from_secs(cli.drain_secs)).await;
    }
    println!("\ndone sending messages\n");

    for host in sim.hosts() {
        let received = host.received().await;
        println!("{host}: delivered {} packet(s): {received:?}", received.len());
    }

    sim.stop().await?;
    println!("done");
    Ok(())
}
