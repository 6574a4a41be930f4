//! Schedule health of a person's task set as a single energy value.

use chrono::NaiveDateTime;
use world::{MilestoneId, Task};

/// Energy lost per day overdue, scaled by remaining work.
pub const OVERDUE_DECAY: f32 = 0.03;

/// Discovery share at which a task set is healthiest.
pub const IDEAL_DISCOVERY: f32 = 0.4;

/// Below this a unit stops working and rests.
pub const REST_THRESHOLD: f32 = 0.15;

/// Weight floor so nearly finished tasks still count a little.
const MIN_WEIGHT: f32 = 0.1;

fn weight(task: &Task) -> f32 {
    task.remaining_work().max(MIN_WEIGHT)
}

/// Weighted mean of `f` over tasks, `None` when there's nothing to weigh.
fn weighted_mean(tasks: &[Task], f: impl Fn(&Task) -> f32) -> Option<f32> {
    let (sum, total) = tasks
        .iter()
        .fold((0.0, 0.0), |(s, w), t| (s + f(t) * weight(t), w + weight(t)));
    (total > 0.0).then(|| sum / total)
}

/// Fractional days past the task's expected date, zero if not overdue or
/// undated.
pub fn days_overdue(task: &Task, now: NaiveDateTime) -> f32 {
    let Some(due) = task.expected_date.and_then(|d| d.and_hms_opt(0, 0, 0))
    else {
        return 0.0;
    };
    let secs = (now - due).num_seconds() as f32;
    (secs / 86_400.0).max(0.0)
}

/// How much schedule slack a single task leaves, in [0, 1].
pub fn time_energy(task: &Task, now: NaiveDateTime) -> f32 {
    if task.expected_date.is_none() {
        return 1.0;
    }
    let penalty = days_overdue(task, now) * OVERDUE_DECAY * task.remaining_work();
    (1.0 - penalty).max(0.0)
}

/// Weighted discovery share of a task set, 0.5 when undefined.
pub fn discovery_ratio(tasks: &[Task]) -> f32 {
    weighted_mean(tasks, Task::discovery_ratio).unwrap_or(0.5)
}

/// Penalty for a task set that's lopsided towards either discovery or
/// execution, 1.0 at the ideal mix.
pub fn phase_factor(tasks: &[Task]) -> f32 {
    let dev = (discovery_ratio(tasks) - IDEAL_DISCOVERY).abs();
    (1.0 - 0.8 * (dev / 0.6).powi(2)).clamp(0.0, 1.0)
}

/// Overall energy of a person with the given tasks at time `now`.
///
/// People with no tasks are fully rested.
pub fn stamina(tasks: &[Task], now: NaiveDateTime) -> f32 {
    if tasks.is_empty() {
        return 1.0;
    }
    let time = weighted_mean(tasks, |t| time_energy(t, now)).unwrap_or(1.0);
    (time * phase_factor(tasks)).clamp(0.0, 1.0)
}

/// Gathering progress per second.
pub fn gather_rate(stamina: f32) -> f32 {
    0.5 + 0.5 * stamina
}

/// Movement speed multiplier.
pub fn scout_speed(stamina: f32) -> f32 {
    0.6 + 0.4 * stamina
}

/// Mean completion of a milestone's tasks in [0, 1], zero when it has none.
pub fn structure_progress(milestone: &MilestoneId, tasks: &[Task]) -> f32 {
    let (sum, n) = tasks
        .iter()
        .filter(|t| t.milestone.as_ref() == Some(milestone))
        .fold((0.0, 0), |(s, n), t| (s + t.percent_complete, n + 1));
    if n == 0 {
        return 0.0;
    }
    (sum / n as f32 / 100.0).clamp(0.0, 1.0)
}

#[cfg(test)]
mod test {
    use chrono::{Days, NaiveDate};
    use quickcheck_macros::quickcheck;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn noon() -> NaiveDateTime {
        today().and_hms_opt(12, 0, 0).unwrap()
    }

    fn task(discovery: f32, done: f32, due: Option<i64>) -> Task {
        Task {
            id: "t".into(),
            discovery_percent: discovery,
            percent_complete: done,
            expected_date: due.map(|d| {
                if d >= 0 {
                    today() + Days::new(d as u64)
                } else {
                    today() - Days::new((-d) as u64)
                }
            }),
            ..Default::default()
        }
    }

    #[test]
    fn empty_is_rested() {
        assert_eq!(stamina(&[], noon()), 1.0);
    }

    #[test]
    fn ideal_undated_task_is_full() {
        assert_eq!(stamina(&[task(40.0, 0.0, None)], noon()), 1.0);
        assert_eq!(stamina(&[task(40.0, 50.0, Some(10))], noon()), 1.0);
    }

    #[test]
    fn overdue_task_drains() {
        // 20.5 days late with 90% left.
        let t = task(30.0, 10.0, Some(-20));
        let e = time_energy(&t, noon());
        assert!((e - (1.0 - 20.5 * 0.03 * 0.9)).abs() < 1e-4);

        let s = stamina(&[t], noon());
        assert!(s < 0.8 && s > REST_THRESHOLD, "stamina {s}");
    }

    #[test]
    fn long_overdue_hits_zero() {
        assert_eq!(stamina(&[task(40.0, 0.0, Some(-400))], noon()), 0.0);
    }

    #[test]
    fn phase_penalty() {
        assert_eq!(phase_factor(&[task(40.0, 0.0, None)]), 1.0);
        assert!((phase_factor(&[task(100.0, 0.0, None)]) - 0.2).abs() < 1e-5);
        assert!(phase_factor(&[task(0.0, 0.0, None)]) < 1.0);
        // Nothing to weigh falls back to an even split.
        assert_eq!(discovery_ratio(&[]), 0.5);
    }

    #[test]
    fn rates() {
        assert_eq!(gather_rate(0.0), 0.5);
        assert_eq!(gather_rate(1.0), 1.0);
        assert_eq!(scout_speed(0.0), 0.6);
        assert_eq!(scout_speed(1.0), 1.0);
    }

    #[test]
    fn milestone_progress() {
        let m: MilestoneId = "m1".into();
        let mut a = task(0.0, 50.0, None);
        a.milestone = Some(m.clone());
        let mut b = task(0.0, 100.0, None);
        b.milestone = Some(m.clone());
        let other = task(0.0, 0.0, None);

        let tasks = vec![a, b, other];
        assert!((structure_progress(&m, &tasks) - 0.75).abs() < 1e-6);
        assert_eq!(structure_progress(&"m2".into(), &tasks), 0.0);
    }

    #[quickcheck]
    fn stamina_in_bounds(spec: Vec<(u8, u8, Option<i16>)>) -> bool {
        let tasks: Vec<Task> = spec
            .into_iter()
            .map(|(d, c, due)| {
                task(
                    (d % 101) as f32,
                    (c % 101) as f32,
                    due.map(|x| (x % 500) as i64),
                )
            })
            .collect();
        let s = stamina(&tasks, noon());
        (0.0..=1.0).contains(&s)
    }

    #[quickcheck]
    fn progress_never_drains(d: u8, a: u8, b: u8, late: u16) -> bool {
        let (lo, hi) = ((a % 101).min(b % 101), (a % 101).max(b % 101));
        let due = -((late % 365) as i64) - 1;
        let before = task((d % 101) as f32, lo as f32, Some(due));
        let after = task((d % 101) as f32, hi as f32, Some(due));
        stamina(&[after], noon()) >= stamina(&[before], noon())
    }

    #[quickcheck]
    fn later_is_never_better(d: u8, c: u8, due: i16, wait: u8) -> bool {
        let t = task((d % 101) as f32, (c % 101) as f32, Some((due % 300) as i64));
        let later = noon() + chrono::Duration::hours(wait as i64);
        stamina(&[t.clone()], later) <= stamina(&[t], noon())
    }
}
