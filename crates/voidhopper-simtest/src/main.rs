//! Voidhopper Headless Simulation Harness
//!
//! Drives the routing core through seeded scenarios in `SimWorld`.
//! Runs entirely in-process with no host server.
//!
//! Usage:
//!   cargo run -p voidhopper-simtest
//!   cargo run -p voidhopper-simtest -- --verbose --seed 7 --ticks 4000

use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;
use voidhopper_core::prelude::*;

// ── CLI ─────────────────────────────────────────────────────────────────

/// Headless soak and scenario harness for the vacuum hopper core
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Print every check, not just failures; enables debug logging
    #[arg(short, long)]
    verbose: bool,

    /// RNG seed for the soak world
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Host ticks to run the soak for
    #[arg(long, default_value_t = 2400)]
    ticks: u32,

    /// Hoppers in the soak world
    #[arg(long, default_value_t = 24)]
    hoppers: usize,

    /// JSON config file (defaults used when absent)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for registry files written by the persistence checks
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

/// Machine-readable soak outcome, printed with `--verbose`
#[derive(Serialize)]
struct SoakSummary {
    seed: u64,
    ticks: u64,
    passes: u64,
    hoppers: usize,
    units_dropped: u64,
    units_loose: u64,
    units_stored: u64,
    totals: PassReport,
}

fn check(name: &str, passed: bool, detail: impl Into<String>) -> TestResult {
    TestResult {
        name: name.into(),
        passed,
        detail: detail.into(),
    }
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = match &args.config {
        Some(path) => match HopperConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(2);
            }
        },
        None => HopperConfig::default(),
    };

    let data_dir = args.data_dir.clone().unwrap_or_else(|| {
        std::env::temp_dir().join(format!("voidhopper-simtest-{}", std::process::id()))
    });

    println!("=== Voidhopper Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Routing and overflow
    results.extend(validate_routing(&config));

    // 2. Void filter
    results.extend(validate_void_filter(&config));

    // 3. Link graph cap and pruning
    results.extend(validate_links(&config));

    // 4. Placement / removal round trip
    results.extend(validate_portable_records(&config));

    // 5. Persistence across restart
    results.extend(validate_persistence(&config, &data_dir));

    // 6. Seeded soak with conservation checks
    results.extend(validate_soak(&config, &args));

    if args.data_dir.is_none() {
        let _ = std::fs::remove_dir_all(&data_dir);
    }

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || args.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── Shared setup ────────────────────────────────────────────────────────

fn stack(kind: &str, amount: u32) -> Option<ItemStack> {
    ResourceKind::new(kind).ok().map(|k| ItemStack::new(k, amount))
}

/// Hopper at the origin of "world" with one chest per entry of `chests`
fn single_hopper(
    config: &HopperConfig,
    chests: Vec<(i32, Container)>,
) -> (HopperService, SimWorld, BlockKey) {
    let mut world = SimWorld::new();
    let hopper = BlockKey::new("world", 0, 64, 0);
    world.set_block(&hopper, Block::Hopper);

    let mut service = HopperService::new(config.clone());
    on_place(service.registry_mut(), hopper.clone(), Uuid::new_v4(), None);

    for (x, container) in chests {
        let key = BlockKey::new("world", x, 64, 0);
        world.set_block(&key, Block::Container(container));
        link_container(service.registry_mut(), &world, &hopper, key);
    }

    (service, world, hopper)
}

fn drop_at(world: &mut SimWorld, x: f64, kind: &str, amount: u32) -> Option<hecs::Entity> {
    let stack = stack(kind, amount)?;
    Some(world.spawn_item("world", Vec3::new(x, 64.5, 0.5), stack, 0))
}

// ── 1. Routing ──────────────────────────────────────────────────────────

fn validate_routing(config: &HopperConfig) -> Vec<TestResult> {
    println!("--- Routing ---");
    let mut results = Vec::new();

    let mut nearly_full = Container::new(1);
    if let Some(dirt) = stack("DIRT", 63) {
        nearly_full.add(&dirt);
    }
    let (mut service, mut world, hopper) =
        single_hopper(config, vec![(3, nearly_full), (5, Container::new(100))]);
    let item = drop_at(&mut world, 4.5, "DIRT", 64);

    let report = service.simulate(&mut world);
    let a = world
        .container(&BlockKey::new("world", 3, 64, 0))
        .map(|c| c.count_of("DIRT"))
        .unwrap_or(0);
    let b = world
        .container(&BlockKey::new("world", 5, 64, 0))
        .map(|c| c.count_of("DIRT"))
        .unwrap_or(0);
    let collected = service
        .registry()
        .lookup(&hopper)
        .map(|n| n.items_collected)
        .unwrap_or(0);

    results.push(check(
        "routing_overflow_split",
        a == 64 && b == 63,
        format!("A holds {}, B holds {}", a, b),
    ));
    results.push(check(
        "routing_source_removed",
        item.map(|e| !world.is_alive(e)).unwrap_or(false),
        format!("{} entities removed", report.entities_removed),
    ));
    results.push(check(
        "routing_collected_counter",
        collected == 64,
        format!("collected = {}", collected),
    ));

    // No links: unit stays, only pulled
    let (mut service, mut world, _) = single_hopper(config, Vec::new());
    let item = drop_at(&mut world, 4.5, "DIRT", 10);
    let report = service.simulate(&mut world);
    let still_ten = item
        .and_then(|e| world.item(e))
        .map(|i| i.stack.amount == 10)
        .unwrap_or(false);
    results.push(check(
        "routing_no_links_pull_only",
        still_ten && report.entities_pulled == 1 && report.units_collected == 0,
        format!(
            "pulled {}, collected {}",
            report.entities_pulled, report.units_collected
        ),
    ));

    results
}

// ── 2. Void filter ──────────────────────────────────────────────────────

fn validate_void_filter(config: &HopperConfig) -> Vec<TestResult> {
    println!("--- Void Filter ---");
    let mut results = Vec::new();

    let (mut service, mut world, hopper) = single_hopper(config, vec![(3, Container::default())]);
    if let Ok(kind) = ResourceKind::new("ROTTEN_FLESH") {
        service.registry_mut().add_filter(&hopper, kind);
    }
    drop_at(&mut world, 2.5, "ROTTEN_FLESH", 37);
    drop_at(&mut world, 3.5, "STRING", 5);

    let report = service.simulate(&mut world);
    let chest_total = world
        .container(&BlockKey::new("world", 3, 64, 0))
        .map(|c| c.total())
        .unwrap_or(0);

    results.push(check(
        "filter_voids_exact_quantity",
        report.units_voided == 37,
        format!("voided {}", report.units_voided),
    ));
    results.push(check(
        "filter_passes_other_kinds",
        chest_total == 5,
        format!("chest holds {}", chest_total),
    ));

    results
}

// ── 3. Link graph ───────────────────────────────────────────────────────

fn validate_links(config: &HopperConfig) -> Vec<TestResult> {
    println!("--- Link Graph ---");
    let mut results = Vec::new();

    let chests: Vec<(i32, Container)> = (1..=config.max_links as i32)
        .map(|x| (x + 1, Container::default()))
        .collect();
    let (mut service, mut world, hopper) = single_hopper(config, chests);

    let extra = BlockKey::new("world", -3, 64, 0);
    world.set_block(&extra, Block::Container(Container::default()));
    let outcome = link_container(service.registry_mut(), &world, &hopper, extra);
    let count = service
        .registry()
        .lookup(&hopper)
        .map(|n| n.links.len())
        .unwrap_or(0);
    results.push(check(
        "links_cap_enforced",
        outcome == LinkOutcome::Rejected && count == config.max_links,
        format!("{:?}, {} links", outcome, count),
    ));

    // Break the first chest; the next one in order must receive
    let first = BlockKey::new("world", 2, 64, 0);
    let second = BlockKey::new("world", 3, 64, 0);
    world.set_block(&first, Block::Solid);
    drop_at(&mut world, 4.5, "COAL", 9);
    let report = service.simulate(&mut world);
    let second_coal = world
        .container(&second)
        .map(|c| c.count_of("COAL"))
        .unwrap_or(0);
    results.push(check(
        "links_pruned_on_invalid",
        report.links_pruned == 1 && second_coal == 9,
        format!("pruned {}, next chest got {}", report.links_pruned, second_coal),
    ));

    results
}

// ── 4. Portable records ─────────────────────────────────────────────────

fn validate_portable_records(config: &HopperConfig) -> Vec<TestResult> {
    println!("--- Portable Records ---");
    let mut results = Vec::new();

    let (mut service, _world, hopper) = single_hopper(
        config,
        vec![(3, Container::default()), (4, Container::default())],
    );
    if let Ok(kind) = ResourceKind::new("BONE") {
        service.registry_mut().add_filter(&hopper, kind);
    }

    let Some(record) = on_break(service.registry_mut(), &hopper) else {
        results.push(check("portable_break", false, "no record returned"));
        return results;
    };

    let decoded = record
        .encode()
        .and_then(|bytes| PortableHopper::decode(&bytes));
    results.push(check(
        "portable_bincode_roundtrip",
        decoded.as_ref().map(|d| d == &record).unwrap_or(false),
        format!("{} links, {} filtered", record.links.len(), record.filter.len()),
    ));

    let tags = record.to_tags();
    let from_tags = PortableHopper::from_tags(&tags, |w| w == "world");
    results.push(check(
        "portable_tags_roundtrip",
        from_tags.filter == record.filter && from_tags.links == record.links,
        format!("{:?}", tags),
    ));

    let snapshot = on_place(service.registry_mut(), hopper, Uuid::nil(), Some(&record));
    results.push(check(
        "portable_restore_on_place",
        snapshot
            .as_ref()
            .map(|s| s.links == record.links && s.filter == record.filter)
            .unwrap_or(false),
        format!(
            "restored {} links",
            snapshot.map(|s| s.links.len()).unwrap_or(0)
        ),
    ));

    results
}

// ── 5. Persistence ──────────────────────────────────────────────────────

fn validate_persistence(config: &HopperConfig, data_dir: &std::path::Path) -> Vec<TestResult> {
    println!("--- Persistence ---");
    let mut results = Vec::new();

    let config = HopperConfig {
        data_file: data_dir.join("vacuum-hoppers.json"),
        ..config.clone()
    };
    let _ = std::fs::remove_file(&config.data_file);

    let mut world = SimWorld::new();
    let hopper = BlockKey::new("world", 0, 64, 0);
    let chest = BlockKey::new("world", 3, 64, 0);
    world.set_block(&hopper, Block::Hopper);
    world.set_block(&chest, Block::Container(Container::default()));

    let mut service = match HopperService::open(config.clone(), &world) {
        Ok(service) => service,
        Err(e) => {
            results.push(check("persistence_open", false, e.to_string()));
            return results;
        }
    };
    on_place(service.registry_mut(), hopper.clone(), Uuid::new_v4(), None);
    link_container(service.registry_mut(), &world, &hopper, chest);
    drop_at(&mut world, 4.5, "DIRT", 48);
    service.simulate(&mut world);
    let before = service.registry().lookup(&hopper).cloned();
    let saved = service.shutdown();

    results.push(check(
        "persistence_shutdown_save",
        saved,
        config.data_file.display().to_string(),
    ));

    match HopperService::open(config, &world) {
        Ok(restarted) => {
            let after = restarted.registry().lookup(&hopper).cloned();
            results.push(check(
                "persistence_restart_equivalent",
                before.is_some() && before == after,
                format!(
                    "collected after restart = {}",
                    after.map(|n| n.items_collected).unwrap_or(0)
                ),
            ));
        }
        Err(e) => results.push(check("persistence_reopen", false, e.to_string())),
    }

    results
}

// ── 6. Soak ─────────────────────────────────────────────────────────────

fn validate_soak(config: &HopperConfig, args: &Args) -> Vec<TestResult> {
    println!("--- Soak (seed {}, {} ticks) ---", args.seed, args.ticks);
    let mut results = Vec::new();
    let mut rng = StdRng::seed_from_u64(args.seed);
    const KINDS: [&str; 5] = ["DIRT", "COBBLESTONE", "BONE", "STRING", "IRON_INGOT"];

    let mut world = SimWorld::new();
    world.add_world("world");
    let mut service = HopperService::new(config.clone());
    let mut hoppers = Vec::new();
    let mut chests = Vec::new();

    for i in 0..args.hoppers as i32 {
        let key = BlockKey::new("world", (i % 6) * 24, 64, (i / 6) * 24);
        world.set_block(&key, Block::Hopper);
        on_place(service.registry_mut(), key.clone(), Uuid::new_v4(), None);

        if rng.gen_bool(0.5) {
            if let Ok(kind) = ResourceKind::new(KINDS[rng.gen_range(0..KINDS.len())]) {
                service.registry_mut().add_filter(&key, kind);
            }
        }
        for dx in 0..rng.gen_range(0..3) {
            let chest = BlockKey::new("world", key.x + 2 + dx, 64, key.z);
            world.set_block(&chest, Block::Container(Container::new(rng.gen_range(1..6))));
            link_container(service.registry_mut(), &world, &key, chest.clone());
            chests.push(chest);
        }
        hoppers.push(key);
    }

    let mut dropped: u64 = 0;
    for _ in 0..args.ticks {
        if rng.gen_bool(0.3) && !hoppers.is_empty() {
            let anchor = &hoppers[rng.gen_range(0..hoppers.len())];
            let pos = anchor.center()
                + Vec3::new(rng.gen_range(-10.0..10.0), 0.0, rng.gen_range(-10.0..10.0));
            let amount = rng.gen_range(1..=64);
            if let Some(stack) = stack(KINDS[rng.gen_range(0..KINDS.len())], amount) {
                world.spawn_item("world", pos, stack, rng.gen_range(0..60));
                dropped += amount as u64;
            }
        }

        // Occasionally break a chest to exercise pruning
        if rng.gen_bool(0.001) && !chests.is_empty() {
            let idx = rng.gen_range(0..chests.len());
            let chest = chests.swap_remove(idx);
            world.set_block(&chest, Block::Solid);
        }

        world.advance(1);
        service.tick(&mut world);
    }

    let totals = service.totals().clone();
    let collected: u64 = service
        .registry()
        .nodes()
        .values()
        .map(|n| n.items_collected)
        .sum();
    let voided: u64 = service
        .registry()
        .nodes()
        .values()
        .map(|n| n.items_voided)
        .sum();
    let stored: u64 = chests
        .iter()
        .filter_map(|c| world.container(c))
        .map(|c| c.total())
        .sum();
    let loose = world.loose_units();

    if args.verbose {
        let summary = SoakSummary {
            seed: args.seed,
            ticks: service.ticks(),
            passes: service.passes(),
            hoppers: service.registry().len(),
            units_dropped: dropped,
            units_loose: loose,
            units_stored: stored,
            totals: totals.clone(),
        };
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => log::warn!("Could not serialize soak summary: {}", e),
        }
    }

    results.push(check(
        "soak_passes_ran",
        service.passes() > 0,
        format!("{} passes over {} ticks", service.passes(), service.ticks()),
    ));
    results.push(check(
        "soak_counters_match_reports",
        collected == totals.units_collected && voided == totals.units_voided,
        format!("collected {}, voided {}", collected, voided),
    ));
    // Units broken out of pruned chests are gone with the block, so stored
    // can only fall short of collected, never exceed it
    results.push(check(
        "soak_conservation",
        loose + collected + voided == dropped && stored <= collected,
        format!(
            "dropped {} = loose {} + collected {} + voided {} (stored {})",
            dropped, loose, collected, voided, stored
        ),
    ));
    results.push(check(
        "soak_links_within_cap",
        service
            .registry()
            .nodes()
            .values()
            .all(|n| n.links.len() <= config.max_links),
        format!("{} links pruned", totals.links_pruned),
    ));

    results
}
