mod support;

use std::fs;

use predicates::str::contains;

use support::TestEnv;
use taskwatch::user::Role;

#[test]
fn one_shot_sweep_reports_matches_and_creations() {
    let env = TestEnv::init();
    let pm = env.signup("Ana", "ana@example.com", Role::Pm);
    let dev = env.signup("Dev", "dev@example.com", Role::User);
    env.create_task_due_in("Write report", &dev.id, -1);

    env.cmd()
        .args(["sweep", "overdue"])
        .assert()
        .success()
        .stdout(contains("OVERDUE sweep completed"))
        .stdout(contains("tasks matched: 1"))
        .stdout(contains("notifications created: 1"));

    // Same window, nothing new: the dedup gate already holds the triple.
    env.cmd()
        .args(["sweep", "overdue"])
        .assert()
        .success()
        .stdout(contains("tasks matched: 1"))
        .stdout(contains("notifications created: 0"));

    assert_eq!(env.notifications.unread_count(&pm.id).unwrap(), 1);
}

#[test]
fn approaching_window_comes_from_config_when_no_flag() {
    let env = TestEnv::init();
    env.signup("Ana", "ana@example.com", Role::Pm);
    let dev = env.signup("Dev", "dev@example.com", Role::User);
    env.create_task_due_in("Due tomorrow-ish", &dev.id, 20);

    // A 2-hour configured window leaves the task out of range.
    fs::write(
        env.path().join("taskwatch.toml"),
        "[sweep]\napproaching_hours = 2\n",
    )
    .unwrap();

    env.cmd()
        .args(["sweep", "approaching"])
        .assert()
        .success()
        .stdout(contains("tasks matched: 0"));

    // An explicit flag overrides the configured window.
    env.cmd()
        .args(["sweep", "approaching", "--hours", "24"])
        .assert()
        .success()
        .stdout(contains("tasks matched: 1"))
        .stdout(contains("notifications created: 1"));
}

#[test]
fn recurring_run_outlives_a_broken_event_sink() {
    let env = TestEnv::init();
    let pm = env.signup("Ana", "ana@example.com", Role::Pm);
    let dev = env.signup("Dev", "dev@example.com", Role::User);
    env.create_task_due_in("Already late", &dev.id, -1);

    // The data directory is not an appendable file; the sink fails to open
    // on every cycle, but the loop still completes its bounded run.
    env.cmd()
        .args(["sweep", "run", "--cycles", "1"])
        .args(["--events", env.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("cycles: 1"));

    assert_eq!(env.notifications.unread_count(&pm.id).unwrap(), 1);
}

#[test]
fn bounded_recurring_run_executes_both_sweeps() {
    let env = TestEnv::init();
    let pm = env.signup("Ana", "ana@example.com", Role::Pm);
    let dev = env.signup("Dev", "dev@example.com", Role::User);

    env.create_task_due_in("Already late", &dev.id, -1);
    env.create_task_due_in("Due soon", &dev.id, 5);

    let events_path = env.path().join("events.jsonl");
    env.cmd()
        .args(["sweep", "run", "--cycles", "1"])
        .args(["--events", events_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Sweep loop finished"))
        .stdout(contains("cycles: 1"));

    // One OVERDUE plus one DEADLINE_APPROACHING for the single PM.
    assert_eq!(env.notifications.unread_count(&pm.id).unwrap(), 2);

    let contents = fs::read_to_string(&events_path).unwrap();
    let kinds: Vec<String> = contents
        .lines()
        .map(|line| {
            let event: serde_json::Value = serde_json::from_str(line).unwrap();
            event["data"]["kind"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(kinds, ["OVERDUE", "DEADLINE_APPROACHING"]);
}
