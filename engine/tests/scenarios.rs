use chrono::{Days, NaiveDate, NaiveDateTime};
use engine::{
    find_frontier_tile, Config, Event, MemoryStore, Runtime, TaskStore,
    UnitState, VisibilityField,
};
use glam::ivec2;
use rand::SeedableRng;
use util::GameRng;
use world::{Grid, Milestone, PersonId, Task, TaskId};

const DT: f32 = 0.1;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn now() -> NaiveDateTime {
    today().and_hms_opt(12, 0, 0).unwrap()
}

fn config() -> Config {
    Config {
        map_width: 24,
        map_height: 24,
        base_radius: 3,
        ..Default::default()
    }
}

fn task(id: &str, discovery: f32, done: f32) -> Task {
    Task {
        id: id.into(),
        assignee: "ann".into(),
        discovery_percent: discovery,
        percent_complete: done,
        category: "dev".into(),
        ..Default::default()
    }
}

fn open_world(store: &MemoryStore) -> Runtime {
    let mut rt =
        Runtime::with_grid(config(), Grid::new(24, 24), ivec2(12, 12)).unwrap();
    rt.sync(store, &mut ());
    rt
}

fn ann() -> PersonId {
    "ann".into()
}

fn state_of(rt: &Runtime) -> &UnitState {
    rt.unit(&ann()).unwrap().state()
}

/// State names ann went through, in order.
fn history(events: &[Event]) -> Vec<&'static str> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::StateChanged(p, s) if p == &ann() => Some(*s),
            _ => None,
        })
        .collect()
}

/// Run until ann enters the `name` state and count the ticks she stays in
/// it.
fn ticks_in(
    rt: &mut Runtime,
    store: &mut MemoryStore,
    name: &str,
    limit: usize,
) -> usize {
    let mut n = 0;
    for _ in 0..limit {
        rt.tick(store, &mut (), now(), DT);
        if state_of(rt).name() == name {
            n += 1;
        } else if n > 0 {
            break;
        }
    }
    n
}

fn assert_lasts(ticks: usize, secs: f32) {
    let expected = (secs / DT).round() as usize;
    assert!(
        (expected..=expected + 1).contains(&ticks),
        "{ticks} ticks for {secs} s"
    );
}

fn milestone_store() -> MemoryStore {
    let mut store = MemoryStore::default();
    store.add_person("ann");
    store.insert_milestone(Milestone {
        id: "m1".into(),
        name: "Launch".into(),
    });
    store.insert_task(Task {
        milestone: Some("m1".into()),
        ..task("t1", 20.0, 10.0)
    });
    store
}

#[test]
fn overdue_task_gets_picked_up() {
    let mut store = MemoryStore::default();
    store.add_person("ann");
    store.insert_task(Task {
        expected_date: Some(today() - Days::new(20)),
        ..task("late", 30.0, 10.0)
    });

    let s = engine::stamina::stamina(&store.tasks_for_person(&ann()), now());
    assert!(s < 0.8, "stamina {s}");

    let mut rt = open_world(&store);
    assert!(state_of(&rt).is_idle());
    rt.tick(&mut store, &mut (), now(), DT);

    assert!(
        matches!(
            state_of(&rt),
            UnitState::MovingToResource { .. } | UnitState::Scouting { .. }
        ),
        "unexpected state {:?}",
        state_of(&rt)
    );
}

#[test]
fn exhausted_person_rests() {
    let mut store = MemoryStore::default();
    store.add_person("ann");
    store.insert_task(Task {
        expected_date: Some(today() - Days::new(400)),
        ..task("ancient", 40.0, 0.0)
    });

    let mut rt = open_world(&store);
    rt.tick(&mut store, &mut (), now(), DT);
    assert!(matches!(state_of(&rt), UnitState::Resting { .. }));
}

#[test]
fn frontier_in_dark_map() {
    let grid = Grid::new(20, 20);
    let mut fog = VisibilityField::new(&grid, 1.0, 1.0);
    let center = ivec2(10, 10);
    for p in [center, ivec2(10, 9), ivec2(10, 11)] {
        fog.reveal_tile(p);
    }

    let mut rng = GameRng::seed_from_u64(7);
    let t = find_frontier_tile(&grid, &fog, center, 500, &mut rng).unwrap();
    assert_ne!(t, center);
    assert!(grid.neighbors(t).any(|n| !fog.is_revealed(n)));
}

#[test]
fn structure_shows_milestone_progress() {
    let mut store = MemoryStore::default();
    store.add_person("ann");
    store.insert_milestone(Milestone {
        id: "m1".into(),
        name: "Launch".into(),
    });
    store.insert_milestone(Milestone {
        id: "m2".into(),
        name: "Empty".into(),
    });
    for (id, done) in [("a", 50.0), ("b", 100.0)] {
        store.insert_task(Task {
            milestone: Some("m1".into()),
            ..task(id, 20.0, done)
        });
    }

    let rt = open_world(&store);
    let m1 = rt.structure(&"m1".into()).unwrap();
    assert!((m1.progress - 0.75).abs() < 1e-6);
    assert_eq!(rt.structure(&"m2".into()).unwrap().progress, 0.0);
    assert!(rt.node(&"b".into()).unwrap().is_exhausted());
}

#[test]
fn milestone_cargo_goes_to_structure() {
    let mut store = milestone_store();
    let mut rt = open_world(&store);
    let mut events: Vec<Event> = Vec::new();
    let id: TaskId = "t1".into();

    for _ in 0..3000 {
        rt.tick(&mut store, &mut events, now(), DT);
        if store.task(&id).unwrap().percent_complete > 10.0 {
            break;
        }
    }

    let states = history(&events);
    let gather = states
        .iter()
        .position(|&s| s == "Gathering")
        .expect("never gathered");
    assert_eq!(states.get(gather + 1), Some(&"MovingToStructure"));
    assert!(!states.contains(&"ReturningToBase"));

    let percent = store.task(&id).unwrap().percent_complete;
    assert!((25.0..=35.0).contains(&percent), "percent {percent}");
    assert!(events.contains(&Event::NodeDepleted(id.clone(), false)));
    assert!(events.iter().any(|e| matches!(
        e,
        Event::StructureProgress(m, p)
            if m.as_str() == "m1" && (p - percent / 100.0).abs() < 1e-6
    )));
}

#[test]
fn plain_cargo_goes_home() {
    let mut store = MemoryStore::default();
    store.add_person("ann");
    store.insert_task(task("t1", 20.0, 90.0));

    let mut rt = open_world(&store);
    let mut events: Vec<Event> = Vec::new();
    let id: TaskId = "t1".into();

    for _ in 0..3000 {
        rt.tick(&mut store, &mut events, now(), DT);
        if store.task(&id).unwrap().is_complete() {
            break;
        }
    }

    let states = history(&events);
    assert!(states.contains(&"ReturningToBase"));
    assert!(states.contains(&"Depositing"));
    assert!(!states.contains(&"MovingToStructure"));

    // One delivery of at least 15 points finishes the task.
    assert_eq!(store.task(&id).unwrap().percent_complete, 100.0);
    assert!(rt.node(&id).unwrap().is_exhausted());
    assert!(events.contains(&Event::NodeDepleted(id, true)));

    // Nothing left to do but explore.
    assert!(matches!(
        state_of(&rt),
        UnitState::Scouting { task: None, .. } | UnitState::Idle { .. }
    ));
}

#[test]
fn idle_person_explores() {
    let mut store = MemoryStore::default();
    store.add_person("ann");

    let mut rt = open_world(&store);
    let explored = rt.explored_fraction();

    rt.tick(&mut store, &mut (), now(), DT);
    assert!(matches!(
        state_of(&rt),
        UnitState::Scouting { task: None, .. }
    ));

    for _ in 0..600 {
        rt.tick(&mut store, &mut (), now(), DT);
    }
    assert!(rt.explored_fraction() > explored);
}

#[test]
fn deleted_task_is_abandoned() {
    let mut store = MemoryStore::default();
    store.add_person("ann");
    store.insert_task(task("t1", 20.0, 10.0));

    let mut rt = open_world(&store);
    rt.tick(&mut store, &mut (), now(), DT);
    assert!(matches!(state_of(&rt), UnitState::MovingToResource { .. }));

    store.remove_task(&"t1".into());
    let mut events: Vec<Event> = Vec::new();
    for _ in 0..200 {
        rt.tick(&mut store, &mut events, now(), DT);
    }

    assert!(!history(&events).contains(&"Gathering"));
    assert!(rt.node(&"t1".into()).is_none());
}

#[test]
fn people_come_and_go() {
    let mut store = MemoryStore::default();
    store.add_person("ann");
    let mut rt = open_world(&store);

    store.add_person("bob");
    for _ in 0..60 {
        rt.tick(&mut store, &mut (), now(), DT);
    }
    assert_eq!(rt.units().count(), 2);

    store.remove_person(&ann());
    rt.sync(&store, &mut ());
    assert!(rt.unit(&ann()).is_none());
    assert_eq!(rt.units().count(), 1);
}

#[test]
fn removed_milestone_is_abandoned() {
    let mut store = milestone_store();
    let mut rt = open_world(&store);

    for _ in 0..3000 {
        rt.tick(&mut store, &mut (), now(), DT);
        if matches!(state_of(&rt), UnitState::MovingToStructure { .. }) {
            break;
        }
    }
    assert!(matches!(
        state_of(&rt),
        UnitState::MovingToStructure { .. }
    ));

    store.remove_milestone(&"m1".into());
    rt.sync(&store, &mut ());
    assert!(rt.structure(&"m1".into()).is_none());

    let mut events: Vec<Event> = Vec::new();
    for _ in 0..300 {
        rt.tick(&mut store, &mut events, now(), DT);
    }

    let states = history(&events);
    assert_eq!(states.first(), Some(&"Idle"));
    assert!(!states.contains(&"Building"));
    assert!(!events
        .iter()
        .any(|e| matches!(e, Event::StructureProgress(..))));
}

#[test]
fn hidden_discovery_task_is_scouted_first() {
    let mut store = MemoryStore::default();
    store.add_person("ann");
    store.insert_task(task("far", 90.0, 10.0));

    let mut rt = open_world(&store);
    let pos = rt.node(&"far".into()).unwrap().pos;
    assert!(!rt.fog().is_revealed(pos));

    let mut events: Vec<Event> = Vec::new();
    rt.tick(&mut store, &mut events, now(), DT);
    assert!(matches!(
        state_of(&rt),
        UnitState::Scouting { task: Some(t), .. } if t.as_str() == "far"
    ));

    for _ in 0..600 {
        rt.tick(&mut store, &mut events, now(), DT);
        if matches!(state_of(&rt), UnitState::Gathering { .. }) {
            break;
        }
    }
    assert_eq!(history(&events), vec!["Scouting", "Gathering"]);
    assert_eq!(rt.unit(&ann()).unwrap().tile(), pos);
}

#[test]
fn rest_runs_out() {
    let mut store = MemoryStore::default();
    store.add_person("ann");
    store.insert_task(Task {
        expected_date: Some(today() - Days::new(400)),
        ..task("ancient", 40.0, 0.0)
    });

    let mut rt = open_world(&store);
    let n = ticks_in(&mut rt, &mut store, "Resting", 200);
    assert_lasts(n, config().rest_duration);
    assert!(state_of(&rt).is_idle());
}

#[test]
fn building_takes_build_duration() {
    let mut store = milestone_store();
    let mut rt = open_world(&store);
    let n = ticks_in(&mut rt, &mut store, "Building", 3000);
    assert_lasts(n, config().build_duration);
}

#[test]
fn depositing_takes_deposit_duration() {
    let mut store = MemoryStore::default();
    store.add_person("ann");
    store.insert_task(task("t1", 20.0, 10.0));

    let mut rt = open_world(&store);
    let n = ticks_in(&mut rt, &mut store, "Depositing", 3000);
    assert_lasts(n, config().deposit_duration);
}
