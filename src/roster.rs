//! Made-up team for running the simulation without a tracker.

use chrono::{Days, NaiveDate};
use engine::MemoryStore;
use rand::{Rng, seq::SliceRandom};
use util::srng;
use world::{Milestone, PersonId, Task};

const NAMES: &[&str] = &["ada", "bo", "cy", "dee", "eli", "fay", "gus", "hal"];

const CATEGORIES: &[&str] =
    &["backend", "frontend", "design", "ops", "research", "docs"];

/// Generate a store with random tasks around `today`.
///
/// Same arguments always give the same roster.
pub fn generate(
    seed: u64,
    people: usize,
    tasks: usize,
    milestones: usize,
    today: NaiveDate,
) -> MemoryStore {
    let mut rng = srng(&(seed, "roster"));
    let mut store = MemoryStore::default();

    let names: Vec<PersonId> = (0..people)
        .map(|i| match NAMES.get(i) {
            Some(n) => PersonId::from(*n),
            None => PersonId(format!("person{i}")),
        })
        .collect();
    for n in &names {
        store.add_person(n.clone());
    }

    for i in 0..milestones {
        store.insert_milestone(Milestone {
            id: format!("m{i}").into(),
            name: format!("Milestone {}", i + 1),
        });
    }

    for i in 0..tasks {
        let offset: i64 = rng.gen_range(-30..=60);
        let expected_date = if rng.gen_bool(0.2) {
            None
        } else if offset >= 0 {
            today.checked_add_days(Days::new(offset as u64))
        } else {
            today.checked_sub_days(Days::new(offset.unsigned_abs()))
        };

        let milestone = (milestones > 0 && rng.gen_bool(0.6))
            .then(|| format!("m{}", rng.gen_range(0..milestones)).into());

        store.insert_task(Task {
            id: format!("task{i}").into(),
            assignee: names.choose(&mut rng).cloned().unwrap_or_default(),
            discovery_percent: rng.gen_range(0.0..=100.0f32).round(),
            percent_complete: rng.gen_range(0.0..80.0f32).round(),
            expected_date,
            milestone,
            category: CATEGORIES
                .choose(&mut rng)
                .map(|c| c.to_string())
                .unwrap_or_default(),
        });
    }

    store
}
