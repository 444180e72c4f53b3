use assert_cmd::Command;
use predicates::prelude::*;
use std::error::Error;
use tempfile::TempDir;

fn bookkeeper(dir: &TempDir) -> Result<Command, Box<dyn Error>> {
    let mut cmd = Command::cargo_bin("bookkeeper")?;
    cmd.env("BOOKKEEPER_DATA_DIR", dir.path()).env_remove("RUST_LOG");
    Ok(cmd)
}

#[test]
fn config_reports_paths_under_data_dir() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    bookkeeper(&dir)?
        .arg("config")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("bookkeeper.sqlite")
                .and(predicate::str::contains("Max expenses shown: 100")),
        );
    assert!(dir.path().join("config.json").exists());
    Ok(())
}

#[test]
fn category_tree_round_trip() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    bookkeeper(&dir)?
        .args(["category", "add", "Food"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ID: cat-1"));
    bookkeeper(&dir)?
        .args(["category", "add", "Groceries", "--parent", "Food"])
        .assert()
        .success();
    bookkeeper(&dir)?
        .args(["category", "rename", "groceries", "Supermarket"])
        .assert()
        .success();

    bookkeeper(&dir)?
        .args(["category", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Food (cat-1)\n└── Supermarket (cat-2)"));
    Ok(())
}

#[test]
fn moving_under_descendant_fails() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    bookkeeper(&dir)?.args(["category", "add", "Food"]).assert().success();
    bookkeeper(&dir)?
        .args(["category", "add", "Groceries", "-p", "Food"])
        .assert()
        .success();

    bookkeeper(&dir)?
        .args(["category", "move", "Food", "--to", "Groceries"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("descendant"));
    Ok(())
}

#[test]
fn expenses_are_listed_filtered_and_totalled() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    bookkeeper(&dir)?.args(["category", "add", "Food"]).assert().success();
    for (amount, date) in [("12.50", "2024-03-01 12:00"), ("40", "2024-03-15 09:30"), ("7", "2024-04-02 08:00")] {
        bookkeeper(&dir)?
            .args(["expense", "add", amount, "Food", "--date", date, "--comment", "lunch"])
            .assert()
            .success();
    }

    bookkeeper(&dir)?
        .args(["expense", "list", "--where", "amount>=10", "--where", "date<2024-04-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 expenses, total $52.50"));

    bookkeeper(&dir)?
        .args(["expense", "list", "--limit", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 expense, total $12.50"));

    bookkeeper(&dir)?
        .args(["expense", "total", "--from", "2024-03-01", "--to", "2024-03-31 23:59"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Spent $52.50"));

    bookkeeper(&dir)?
        .args(["expense", "total", "--from", "2024-03-01", "--to", "2024-04-02"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Spent $59.50"));
    Ok(())
}

#[test]
fn expense_set_rejects_added_date() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    bookkeeper(&dir)?.args(["category", "add", "Food"]).assert().success();
    bookkeeper(&dir)?.args(["expense", "add", "3", "Food"]).assert().success();

    bookkeeper(&dir)?
        .args(["expense", "set", "exp-1", "added_date=2020-01-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("added_date"));

    bookkeeper(&dir)?
        .args(["expense", "set", "exp-1", "amount=4.25", "comment=coffee"])
        .assert()
        .success()
        .stdout(predicate::str::contains("$4.25").and(predicate::str::contains("coffee")));
    Ok(())
}

#[test]
fn deleting_category_reports_cascade() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    bookkeeper(&dir)?.args(["category", "add", "Food"]).assert().success();
    bookkeeper(&dir)?
        .args(["category", "add", "Groceries", "-p", "Food"])
        .assert()
        .success();
    bookkeeper(&dir)?
        .args(["expense", "add", "5", "Groceries"])
        .assert()
        .success();

    bookkeeper(&dir)?
        .args(["category", "delete", "Groceries", "--expenses", "move"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 category and 1 expense affected"));

    bookkeeper(&dir)?
        .args(["expense", "list", "--category", "Food"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 expense, total $5.00"));
    Ok(())
}

#[test]
fn budget_flags_exceeded_daily_limit() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    bookkeeper(&dir)?.args(["category", "add", "Food"]).assert().success();
    bookkeeper(&dir)?.args(["expense", "add", "50", "Food"]).assert().success();

    bookkeeper(&dir)?
        .args(["budget", "set", "Standard", "40", "500", "2000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("exceeded: daily"));

    bookkeeper(&dir)?
        .args(["budget", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("$40.00!").and(predicate::str::contains("$50.00")));

    bookkeeper(&dir)?
        .args(["budget", "set", "BUDGET_SPENT_GEN_PRESET", "1", "1", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Access denied"));
    Ok(())
}

#[test]
fn audit_log_records_mutations() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    bookkeeper(&dir)?.args(["category", "add", "Food"]).assert().success();

    let log = std::fs::read_to_string(dir.path().join("audit.log"))?;
    assert_eq!(log.lines().count(), 1);
    assert!(log.contains("\"Food\""));
    Ok(())
}
