use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub enum Schedule {
    Interval(Duration),
    /// 5-field cron in the configured local timezone.
    Cron(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct TaskSpec {
    pub name: &'static str,
    pub schedule: Schedule,
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub time_limit: Duration,
}

/// Canonical task catalog (§4.C11). Names must match worker registrations
/// exactly — `TaskRegistry::validate` fails loudly at startup otherwise,
/// per the task-name-mismatch contract.
pub const TASK_CATALOG: &[TaskSpec] = &[
    TaskSpec {
        name: "fetch_news",
        schedule: Schedule::Interval(Duration::from_secs(30 * 60)),
        max_attempts: 3,
        backoff_base: Duration::from_secs(30),
        time_limit: Duration::from_secs(10 * 60),
    },
    TaskSpec {
        name: "detect_narratives",
        schedule: Schedule::Interval(Duration::from_secs(15 * 60)),
        max_attempts: 2,
        backoff_base: Duration::from_secs(30),
        time_limit: Duration::from_secs(15 * 60),
    },
    TaskSpec {
        name: "sweep_lifecycle",
        schedule: Schedule::Interval(Duration::from_secs(30 * 60)),
        max_attempts: 2,
        backoff_base: Duration::from_secs(30),
        time_limit: Duration::from_secs(10 * 60),
    },
    TaskSpec {
        name: "consolidate_narratives",
        schedule: Schedule::Interval(Duration::from_secs(60 * 60)),
        max_attempts: 1,
        backoff_base: Duration::from_secs(30),
        time_limit: Duration::from_secs(10 * 60),
    },
    TaskSpec {
        name: "compute_signals",
        schedule: Schedule::Interval(Duration::from_secs(5 * 60)),
        max_attempts: 2,
        backoff_base: Duration::from_secs(30),
        time_limit: Duration::from_secs(2 * 60),
    },
    TaskSpec {
        name: "generate_morning_briefing",
        schedule: Schedule::Cron("0 0 8 * * *"),
        max_attempts: 2,
        backoff_base: Duration::from_secs(5 * 60),
        time_limit: Duration::from_secs(10 * 60),
    },
    TaskSpec {
        name: "generate_afternoon_briefing",
        schedule: Schedule::Cron("0 0 14 * * *"),
        max_attempts: 2,
        backoff_base: Duration::from_secs(5 * 60),
        time_limit: Duration::from_secs(10 * 60),
    },
    TaskSpec {
        name: "generate_evening_briefing",
        schedule: Schedule::Cron("0 0 20 * * *"),
        max_attempts: 2,
        backoff_base: Duration::from_secs(5 * 60),
        time_limit: Duration::from_secs(10 * 60),
    },
    TaskSpec {
        name: "cleanup_old_briefings",
        schedule: Schedule::Cron("0 0 3 * * Sun"),
        max_attempts: 1,
        backoff_base: Duration::from_secs(30),
        time_limit: Duration::from_secs(5 * 60),
    },
];

pub fn find(name: &str) -> Option<&'static TaskSpec> {
    TASK_CATALOG.iter().find(|t| t.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_no_duplicate_names() {
        let mut names: Vec<&str> = TASK_CATALOG.iter().map(|t| t.name).collect();
        names.sort();
        let mut deduped = names.clone();
        deduped.dedup();
        assert_eq!(names.len(), deduped.len());
    }

    #[test]
    fn find_returns_known_task() {
        assert!(find("fetch_news").is_some());
    }

    #[test]
    fn find_returns_none_for_unknown() {
        assert!(find("not_a_real_task").is_none());
    }
}
