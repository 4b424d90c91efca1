//! Integration tests for full transfer passes.
//!
//! Exercises: placement → configuration → pass → persistence, all through
//! the public service API against `SimWorld`.

use uuid::Uuid;
use voidhopper_core::prelude::*;

// ── Helpers ────────────────────────────────────────────────────────────

fn hopper() -> BlockKey {
    BlockKey::new("world", 0, 64, 0)
}

fn chest(x: i32) -> BlockKey {
    BlockKey::new("world", x, 64, 0)
}

fn kind(s: &str) -> ResourceKind {
    ResourceKind::new(s).unwrap()
}

fn stack(s: &str, amount: u32) -> ItemStack {
    ItemStack::new(kind(s), amount)
}

/// Unit dropped 4 blocks east of the hopper, pickup delay already expired
fn drop_near(world: &mut SimWorld, s: &str, amount: u32) -> hecs::Entity {
    world.spawn_item("world", Vec3::new(4.5, 64.5, 0.5), stack(s, amount), 0)
}

/// World with the hopper block and one chest per link, node registered
fn setup(links: &[BlockKey]) -> (HopperService, SimWorld) {
    let mut world = SimWorld::new();
    world.set_block(&hopper(), Block::Hopper);
    for link in links {
        world.set_block(link, Block::Container(Container::default()));
    }

    let mut service = HopperService::new(HopperConfig::default());
    on_place(service.registry_mut(), hopper(), Uuid::new_v4(), None);
    for (i, link) in links.iter().enumerate() {
        assert_eq!(
            link_container(service.registry_mut(), &world, &hopper(), link.clone()),
            LinkOutcome::Linked {
                count: i + 1,
                max: 8,
            }
        );
    }
    (service, world)
}

fn node(service: &HopperService) -> &HopperNode {
    service.registry().lookup(&hopper()).unwrap()
}

// ── Routing ────────────────────────────────────────────────────────────

#[test]
fn single_destination_takes_whole_stack() {
    for amount in [1, 17, 64] {
        let (mut service, mut world) = setup(&[chest(3)]);
        let item = drop_near(&mut world, "IRON_INGOT", amount);

        service.simulate(&mut world);

        assert!(!world.is_alive(item), "amount {}", amount);
        assert_eq!(
            world.container(&chest(3)).unwrap().count_of("IRON_INGOT"),
            amount as u64
        );
        assert_eq!(node(&service).items_collected, amount as u64);
    }
}

#[test]
fn overflow_spills_to_next_destination() {
    // A has room for exactly one more unit, B is effectively unlimited
    let (mut service, mut world) = setup(&[chest(3), chest(5)]);
    let mut nearly_full = Container::new(1);
    nearly_full.add(&stack("DIRT", 63));
    world.set_block(&chest(3), Block::Container(nearly_full));
    world.set_block(&chest(5), Block::Container(Container::new(1000)));
    let item = drop_near(&mut world, "DIRT", 64);

    let report = service.simulate(&mut world);

    assert!(!world.is_alive(item));
    assert_eq!(world.container(&chest(3)).unwrap().count_of("DIRT"), 64);
    assert_eq!(world.container(&chest(5)).unwrap().count_of("DIRT"), 63);
    assert_eq!(node(&service).items_collected, 64);
    assert_eq!(report.units_collected, 64);
}

#[test]
fn all_destinations_full_leaves_remainder_in_world() {
    let (mut service, mut world) = setup(&[chest(3)]);
    let mut full = Container::new(1);
    full.add(&stack("GRAVEL", 64));
    world.set_block(&chest(3), Block::Container(full));
    let item = drop_near(&mut world, "SAND", 12);

    let report = service.simulate(&mut world);

    assert!(world.is_alive(item));
    assert_eq!(world.item(item).unwrap().stack.amount, 12);
    assert_eq!(node(&service).items_collected, 0);
    assert_eq!(report.entities_pulled, 1);
}

#[test]
fn empty_node_only_pulls() {
    let (mut service, mut world) = setup(&[]);
    let item = drop_near(&mut world, "DIRT", 10);

    let report = service.simulate(&mut world);

    assert!(world.is_alive(item));
    assert_eq!(world.item(item).unwrap().stack.amount, 10);
    assert_eq!(node(&service).items_collected, 0);
    assert_eq!(node(&service).items_voided, 0);
    assert_eq!(report.entities_pulled, 1);

    // Pulled west, toward the hopper centre
    let velocity = world.velocity(item).unwrap();
    assert!(velocity.x < 0.0);
    assert!((velocity.length() - 0.3).abs() < 1e-9);
}

#[test]
fn units_close_to_the_node_are_not_pulled() {
    let (mut service, mut world) = setup(&[]);
    let item = world.spawn_item("world", Vec3::new(1.0, 64.5, 0.5), stack("DIRT", 1), 0);

    let report = service.simulate(&mut world);

    assert_eq!(report.entities_pulled, 0);
    assert_eq!(world.velocity(item), Some(Vec3::ZERO));
}

// ── Void filter ────────────────────────────────────────────────────────

#[test]
fn filtered_kind_is_voided_regardless_of_links() {
    for links in [vec![], vec![chest(3)], vec![chest(3), chest(5)]] {
        let (mut service, mut world) = setup(&links);
        assert!(service.registry_mut().add_filter(&hopper(), kind("ROTTEN_FLESH")));
        let item = drop_near(&mut world, "ROTTEN_FLESH", 23);

        service.simulate(&mut world);

        assert!(!world.is_alive(item));
        assert_eq!(node(&service).items_voided, 23);
        assert_eq!(node(&service).items_collected, 0);
        for link in &links {
            assert_eq!(world.container(link).unwrap().total(), 0);
        }
    }
}

#[test]
fn removing_filter_entry_resumes_routing() {
    let (mut service, mut world) = setup(&[chest(3)]);
    service.registry_mut().add_filter(&hopper(), kind("BONE"));
    service.registry_mut().remove_filter(&hopper(), &kind("BONE"));
    drop_near(&mut world, "BONE", 4);

    service.simulate(&mut world);

    assert_eq!(world.container(&chest(3)).unwrap().count_of("BONE"), 4);
    assert_eq!(node(&service).items_voided, 0);
}

// ── Link graph ─────────────────────────────────────────────────────────

#[test]
fn add_link_beyond_max_is_rejected_without_change() {
    let links: Vec<BlockKey> = (1..=8).map(chest).collect();
    let (mut service, mut world) = setup(&links);
    let extra = chest(20);
    world.set_block(&extra, Block::Container(Container::default()));
    let before = node(&service).clone();

    for _ in 0..3 {
        assert!(!service.registry_mut().add_link(&hopper(), extra.clone()));
        assert_eq!(
            link_container(service.registry_mut(), &world, &hopper(), extra.clone()),
            LinkOutcome::Rejected
        );
    }

    assert_eq!(node(&service), &before);
}

#[test]
fn removed_destination_is_pruned_and_next_receives() {
    let (mut service, mut world) = setup(&[chest(3), chest(5)]);
    world.remove_block(&chest(3));
    drop_near(&mut world, "COAL", 30);

    let report = service.simulate(&mut world);

    assert_eq!(report.links_pruned, 1);
    assert_eq!(node(&service).links.as_slice(), &[chest(5)]);
    assert_eq!(world.container(&chest(5)).unwrap().count_of("COAL"), 30);
}

#[test]
fn link_order_is_fixed_across_passes() {
    let (mut service, mut world) = setup(&[chest(3), chest(5)]);

    for _ in 0..5 {
        drop_near(&mut world, "DIRT", 10);
        service.simulate(&mut world);
    }

    // No rotation: the first link absorbs everything while it has room
    assert_eq!(world.container(&chest(3)).unwrap().count_of("DIRT"), 50);
    assert_eq!(world.container(&chest(5)).unwrap().total(), 0);
    assert_eq!(node(&service).links.as_slice(), &[chest(3), chest(5)]);
}

// ── Liveness & scheduling ──────────────────────────────────────────────

#[test]
fn broken_marker_block_deregisters_on_next_pass() {
    let (mut service, mut world) = setup(&[chest(3)]);
    world.remove_block(&hopper());
    let item = drop_near(&mut world, "DIRT", 5);

    let report = service.simulate(&mut world);

    assert_eq!(report.nodes_deregistered, 1);
    assert!(!service.registry().exists(&hopper()));
    assert!(world.is_alive(item));
}

#[test]
fn unloaded_world_is_retried_later() {
    let (mut service, mut world) = setup(&[chest(3)]);
    drop_near(&mut world, "DIRT", 5);
    world.unload_world("world");

    let report = service.simulate(&mut world);
    assert_eq!(report.nodes_skipped_inactive, 1);
    assert!(service.registry().exists(&hopper()));

    world.add_world("world");
    let report = service.simulate(&mut world);
    assert_eq!(report.units_collected, 5);
}

#[test]
fn host_ticks_drive_passes() {
    let (mut service, mut world) = setup(&[chest(3)]);
    world.spawn_item("world", Vec3::new(4.5, 64.5, 0.5), stack("DIRT", 5), 10);

    for _ in 0..19 {
        world.advance(1);
        assert!(service.tick(&mut world).is_none());
    }
    world.advance(1);
    let report = service.tick(&mut world).expect("first pass at tick 20");

    assert_eq!(report.units_collected, 5);
}

// ── Persistence ────────────────────────────────────────────────────────

#[test]
fn registry_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = HopperConfig {
        data_file: dir.path().join("vacuum-hoppers.json"),
        ..Default::default()
    };
    let mut world = SimWorld::new();
    world.set_block(&hopper(), Block::Hopper);
    for x in [3, 5, 7] {
        world.set_block(&chest(x), Block::Container(Container::default()));
    }

    let mut service = HopperService::open(config.clone(), &world).unwrap();
    let owner = Uuid::new_v4();
    on_place(service.registry_mut(), hopper(), owner, None);
    for x in [7, 3, 5] {
        service.registry_mut().add_link(&hopper(), chest(x));
    }
    service.registry_mut().add_filter(&hopper(), kind("BONE"));
    service.registry_mut().add_filter(&hopper(), kind("ARROW"));
    drop_near(&mut world, "DIRT", 40);
    drop_near(&mut world, "BONE", 2);
    service.simulate(&mut world);
    let before = node(&service).clone();
    assert!(service.shutdown());

    let restarted = HopperService::open(config, &world).unwrap();
    let after = restarted.registry().lookup(&hopper()).unwrap();

    assert_eq!(after, &before);
    assert_eq!(after.owner, Some(owner));
    assert_eq!(after.links.as_slice(), &[chest(7), chest(3), chest(5)]);
    assert_eq!(after.items_collected, 40);
    assert_eq!(after.items_voided, 2);
}

#[test]
fn nodes_in_deleted_worlds_are_dropped_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let config = HopperConfig {
        data_file: dir.path().join("vacuum-hoppers.json"),
        ..Default::default()
    };
    let mut world = SimWorld::new();
    world.add_world("world");
    world.add_world("mining");

    let mut service = HopperService::open(config.clone(), &world).unwrap();
    on_place(service.registry_mut(), hopper(), Uuid::nil(), None);
    on_place(
        service.registry_mut(),
        BlockKey::new("mining", 0, 10, 0),
        Uuid::nil(),
        None,
    );
    service
        .registry_mut()
        .add_link(&hopper(), BlockKey::new("mining", 1, 10, 0));
    world.remove_world("mining");

    let restarted = HopperService::open(config, &world).unwrap();

    assert_eq!(restarted.registry().len(), 1);
    assert!(restarted.registry().lookup(&hopper()).unwrap().links.is_empty());
}
