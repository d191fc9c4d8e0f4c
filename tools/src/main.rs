//! gate-runner: headless driver for the simulation gate.
//!
//! Usage:
//!   gate-runner --seed 12345 --ticks 60000 --db run.db
//!   gate-runner --config gate.json --sync --local-time --json

use anyhow::Result;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use std::collections::BTreeMap;
use std::env;
use tickgate_core::{
    aspect::Aspect,
    clock::{CalendarDate, WorldClock},
    config::{GateConfig, SubLayerMode},
    host::{Counterparts, UnitRegistry},
    store::GateStore,
    types::{CaravanId, Tick, Unit, UnitId, UnitKind},
    world::MemoryWorld,
    SimulationGate,
};

/// Absolute tick the demo session starts at (spring, year 5500, 6h).
const GAME_START_ABS_TICK: Tick = 15_000;

/// Caravans on the road. The second one is paused and released by hand
/// every few dwell periods.
const CARAVANS: [CaravanId; 2] = [900, 901];

#[derive(serde::Serialize)]
struct UnitSummary {
    unit_id:         UnitId,
    kind:            UnitKind,
    location:        i64,
    actor_ticks:     u64,
    suspended_ticks: Tick,
    effective_ticks: Tick,
    date:            String,
}

#[derive(serde::Serialize)]
struct RunSummary {
    session_id:    String,
    seed:          u64,
    ticks:         Tick,
    observer_hops: u32,
    caravan_legs:  BTreeMap<CaravanId, u64>,
    world_date:    String,
    units:         Vec<UnitSummary>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let ticks = parse_arg(&args, "--ticks", 60_000u64);
    let dwell = parse_arg(&args, "--dwell", 2_500u64).max(1);
    let json = args.iter().any(|a| a == "--json");
    let db = string_arg(&args, "--db").unwrap_or(":memory:");

    let mut config = match string_arg(&args, "--config") {
        Some(path) => GateConfig::load(path)?,
        None => GateConfig::default(),
    };
    if args.iter().any(|a| a == "--sync") {
        config.set_sub_layer_mode(SubLayerMode::Sync);
    }
    if args.iter().any(|a| a == "--local-time") {
        config.local_time = true;
    }

    let session_id = format!("session-{}", uuid::Uuid::new_v4());
    if !json {
        println!("tickgate gate-runner");
        println!("  session:   {session_id}");
        println!("  started:   {}", chrono::Utc::now().to_rfc3339());
        println!("  seed:      {seed}");
        println!("  ticks:     {ticks}");
        println!("  db:        {db}");
        println!("  sub-layer: {:?}", config.sub_layer_mode());
        println!();
    }

    let store = if db == ":memory:" { GateStore::in_memory()? } else { GateStore::open(db)? };
    store.migrate()?;
    store.insert_session(&session_id, env!("CARGO_PKG_VERSION"))?;

    let mut world = demo_world();
    let mut gate = SimulationGate::new(config, Counterparts::default())
        .with_clock(WorldClock::new(GAME_START_ABS_TICK));

    let candidates: Vec<UnitId> = world
        .registry
        .units()
        .iter()
        .filter(|u| u.owner_is_observer || u.kind == UnitKind::SubLayer)
        .map(|u| u.id)
        .collect();
    let mut rng = Pcg64Mcg::seed_from_u64(seed);
    let mut actor_ticks: BTreeMap<UnitId, u64> = BTreeMap::new();
    let mut hops = 0u32;
    let mut caravan_legs: BTreeMap<CaravanId, u64> = CARAVANS.iter().map(|&id| (id, 0)).collect();
    if candidates.is_empty() {
        log::warn!("demo world has no observer candidates; the observer stays nowhere");
    }

    let events = gate.set_observer(candidates.first().copied(), &world.registry, &mut world.scheduler);
    store.append_events(&session_id, &events)?;

    for tick in 1..=ticks {
        if tick % dwell == 0 && !candidates.is_empty() {
            let next = candidates[rng.gen_range(0..candidates.len())];
            let events = gate.set_observer(Some(next), &world.registry, &mut world.scheduler);
            if !events.is_empty() {
                hops += 1;
                log::info!("tick={tick} observer hop {hops} to unit {next}");
            }
            store.append_events(&session_id, &events)?;
        }

        if tick % (dwell * 3) == 0 {
            let caravan = CARAVANS[1];
            let paused = gate.should_simulate_caravan(caravan);
            log::info!("tick={tick} caravan {caravan} {}", if paused { "halted" } else { "released" });
            let events = gate.set_caravan_paused(caravan, paused);
            store.append_events(&session_id, &events)?;
        }

        let events = gate.on_tick(tick, &world.registry, &mut world.scheduler);
        store.append_events(&session_id, &events)?;

        // Caravans travel by day and rest from 22h.
        let night = gate.calendar_date(&world.registry, None).hour >= 22;
        for (&caravan, legs) in caravan_legs.iter_mut() {
            if gate.should_simulate_caravan(caravan) && !gate.caravan_resting(caravan, night) {
                *legs += 1;
            }
        }

        // Host actor loop: one gate check per actor per tick.
        for id in world.registry.ids().collect::<Vec<_>>() {
            if !world.scheduler.is_scheduled(id) {
                continue;
            }
            for _ in 0..world.registry.actors_on(id) {
                if gate.should_advance(&world.registry, id, Aspect::Jobs) {
                    *actor_ticks.entry(id).or_default() += 1;
                }
            }
        }
    }

    gate.save(&store, &session_id)?;
    log::info!("session {session_id} saved after {ticks} ticks");

    let summary = RunSummary {
        session_id: session_id.clone(),
        seed,
        ticks,
        observer_hops: hops,
        caravan_legs,
        world_date: gate.calendar_date(&world.registry, None).to_string(),
        units: world
            .registry
            .units()
            .iter()
            .map(|u| summarize(&gate, u, &actor_ticks))
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary, &store, &session_id)?;
    }
    Ok(())
}

/// Three settlements, two sub-layers, a raid at settlement 3 and a
/// foreign settlement the gate never touches.
fn demo_world() -> MemoryWorld {
    let mut world = MemoryWorld::new();
    world
        .settlement(1, 10)
        .settlement(2, 20)
        .settlement(3, 30)
        .sub_layer(11, 1010, Some(1))
        .sub_layer(21, 1020, Some(2))
        .battle(40, 30)
        .add(Unit::new(50, 50, UnitKind::Settlement));
    for (id, actors) in [(1, 8), (2, 5), (3, 6), (11, 2), (21, 3), (40, 4), (50, 10)] {
        world.registry.set_actors(id, actors);
    }
    world
}

fn summarize(gate: &SimulationGate, unit: &Unit, actor_ticks: &BTreeMap<UnitId, u64>) -> UnitSummary {
    let now = gate.current_tick();
    UnitSummary {
        unit_id:         unit.id,
        kind:            unit.kind,
        location:        unit.location_key,
        actor_ticks:     actor_ticks.get(&unit.id).copied().unwrap_or(0),
        suspended_ticks: gate.ledger().suspended_total(unit.id, now),
        effective_ticks: gate.global_ticks_effective(unit.id),
        date:            CalendarDate::from_abs_ticks(gate.local_ticks_abs(unit.id)).to_string(),
    }
}

fn print_summary(summary: &RunSummary, store: &GateStore, session_id: &str) -> Result<()> {
    let suspensions = store.event_count(session_id, "unit_suspended")?;
    let resumes = store.event_count(session_id, "unit_resumed")?;

    println!("=== RUN SUMMARY ===");
    println!("  session:        {}", summary.session_id);
    println!("  ticks run:      {}", summary.ticks);
    println!("  observer hops:  {}", summary.observer_hops);
    println!("  suspensions:    {suspensions}");
    println!("  resumes:        {resumes}");
    println!("  world date:     {}", summary.world_date);
    for (caravan, legs) in &summary.caravan_legs {
        println!("  caravan #{caravan}:  {legs} travel ticks");
    }
    println!();
    println!("=== UNITS ===");
    for u in &summary.units {
        println!(
            "  #{:<3} {:<10} tile {:<5} | actor-ticks {:>8} | suspended {:>7} | effective {:>7} | {}",
            u.unit_id,
            format!("{:?}", u.kind),
            u.location,
            u.actor_ticks,
            u.suspended_ticks,
            u.effective_ticks,
            u.date
        );
    }
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}
