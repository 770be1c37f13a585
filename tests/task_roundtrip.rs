mod support;

use std::fs;

use assert_cmd::Command;
use predicates::str::contains;
use serde_json::Value;

use support::TestEnv;
use taskwatch::user::Role;

fn json_data(cmd: &mut Command) -> Value {
    let output = cmd.arg("--json").assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let envelope: Value = serde_json::from_str(&stdout).expect("JSON envelope");
    assert_eq!(envelope["schema_version"], "taskwatch.v1");
    assert_eq!(envelope["status"], "success");
    envelope["data"].clone()
}

#[test]
fn init_signup_create_show_all_through_the_cli() {
    let env = TestEnv::init();

    env.cmd().arg("init").assert().success();

    let profile = json_data(env.cmd().args([
        "user", "signup", "--name", "Dev", "--email", "Dev@Example.com", "--password", "pw",
        "--role", "USER",
    ]));
    let dev_id = profile["id"].as_str().unwrap().to_string();
    // Emails are stored lowercased
    assert_eq!(profile["email"], "dev@example.com");
    assert!(profile.get("password").is_none());

    let task = json_data(env.cmd().args([
        "task",
        "new",
        "--title",
        "Write report",
        "--deadline",
        "2099-12-31",
        "--assign",
        &dev_id,
    ]));
    let task_id = task["id"].as_str().unwrap().to_string();
    assert_eq!(task["status"], "PENDING");
    assert_eq!(task["is_overdue"], false);
    assert_eq!(task["assigned_user"]["id"], dev_id);

    let shown = json_data(env.cmd().args(["task", "show", &task_id]));
    assert_eq!(shown["title"], "Write report");
    assert_eq!(shown["deadline"], "2099-12-31T00:00:00Z");
}

#[test]
fn listing_flags_overdue_tasks() {
    let env = TestEnv::init();
    let dev = env.signup("Dev", "dev@example.com", Role::User);

    env.create_task_due_in("Late", &dev.id, -24);
    env.create_task_due_in("On time", &dev.id, 24);

    env.cmd()
        .args(["task", "list"])
        .assert()
        .success()
        .stdout(contains("2 task(s)"))
        .stdout(contains("[OVERDUE]"));

    let listed = json_data(env.cmd().args(["task", "list"]));
    let flags: Vec<(String, bool)> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|view| {
            (
                view["title"].as_str().unwrap().to_string(),
                view["is_overdue"].as_bool().unwrap(),
            )
        })
        .collect();
    assert!(flags.contains(&("Late".to_string(), true)));
    assert!(flags.contains(&("On time".to_string(), false)));
}

#[test]
fn assignee_filter_returns_empty_not_an_error() {
    let env = TestEnv::init();
    let dev = env.signup("Dev", "dev@example.com", Role::User);
    let idle = env.signup("Idle", "idle@example.com", Role::User);
    env.create_task_due_in("Write report", &dev.id, 24);

    let listed = json_data(env.cmd().args(["task", "list", "--assignee", &idle.id]));
    assert_eq!(listed.as_array().unwrap().len(), 0);
}

#[test]
fn creating_a_task_for_an_unknown_assignee_fails() {
    let env = TestEnv::init();

    env.cmd()
        .args([
            "task",
            "new",
            "--title",
            "Write report",
            "--deadline",
            "2099-12-31",
            "--assign",
            "no-such-user",
        ])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("User not found"));
}

#[test]
fn duplicate_email_signup_is_rejected_case_insensitively() {
    let env = TestEnv::init();
    env.signup("Dev", "dev@example.com", Role::User);

    env.cmd()
        .args([
            "user", "signup", "--name", "Dev2", "--email", "DEV@example.com", "--password", "pw",
            "--role", "USER",
        ])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("already registered"));
}

#[test]
fn login_distinguishes_unknown_user_from_bad_password() {
    let env = TestEnv::init();
    env.signup("Dev", "dev@example.com", Role::User);

    env.cmd()
        .args(["user", "login", "--email", "dev@example.com", "--password", "pw"])
        .assert()
        .success()
        .stdout(contains("Login ok"));

    env.cmd()
        .args(["user", "login", "--email", "dev@example.com", "--password", "nope"])
        .assert()
        .failure()
        .code(3);

    env.cmd()
        .args(["user", "login", "--email", "ghost@example.com", "--password", "pw"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn deleting_a_task_removes_it_from_show() {
    let env = TestEnv::init();
    let dev = env.signup("Dev", "dev@example.com", Role::User);
    let task = env.create_task_due_in("Write report", &dev.id, 24);

    env.cmd().args(["task", "rm", &task.id]).assert().success();

    env.cmd()
        .args(["task", "show", &task.id])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("Task not found"));
}

#[test]
fn events_to_stdout_keep_the_stream_parseable() {
    let env = TestEnv::init();
    let dev = env.signup("Dev", "dev@example.com", Role::User);

    // --json is overridden: stdout must stay line-parseable JSONL.
    let output = env
        .cmd()
        .args([
            "--events",
            "-",
            "--json",
            "task",
            "new",
            "--title",
            "Write report",
            "--deadline",
            "2099-12-31",
            "--assign",
            &dev.id,
        ])
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let lines: Vec<&str> = stdout.lines().filter(|line| !line.trim().is_empty()).collect();
    assert_eq!(lines.len(), 1);

    let event: Value = serde_json::from_str(lines[0]).expect("JSONL event");
    assert_eq!(event["schema_version"], "taskwatch.event.v1");
    assert_eq!(event["event"], "task_created");
}

#[test]
fn events_file_records_the_lifecycle() {
    let env = TestEnv::init();
    let dev = env.signup("Dev", "dev@example.com", Role::User);
    let events_path = env.path().join("events.jsonl");
    let events_arg = events_path.to_str().unwrap().to_string();

    let task = json_data(env.cmd().args([
        "--events",
        &events_arg,
        "task",
        "new",
        "--title",
        "Write report",
        "--deadline",
        "2000-01-01",
        "--assign",
        &dev.id,
    ]));
    let task_id = task["id"].as_str().unwrap();

    env.cmd()
        .args(["--events", &events_arg, "sweep", "overdue"])
        .assert()
        .success();

    env.cmd()
        .args(["--events", &events_arg, "task", "rm", task_id])
        .assert()
        .success();

    let contents = fs::read_to_string(&events_path).unwrap();
    let kinds: Vec<String> = contents
        .lines()
        .map(|line| {
            let event: Value = serde_json::from_str(line).expect("JSONL event");
            assert_eq!(event["schema_version"], "taskwatch.event.v1");
            event["event"].as_str().unwrap().to_string()
        })
        .collect();

    assert_eq!(kinds, vec!["task_created", "sweep_completed", "task_deleted"]);
}
