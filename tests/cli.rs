use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const HEADER: &str = "_id,merchant_id,payer_id,category,amount,purchase_date,created_at,type,status,medium,merchant_name,description";

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let sandbox = Self {
            dir: tempfile::tempdir().unwrap(),
        };
        let config_dir = sandbox.home().join(".config").join("ledgerlens");
        std::fs::create_dir_all(&config_dir).unwrap();
        let settings = serde_json::json!({
            "data_dir": sandbox.data_dir(),
            "timeout_secs": 2,
            "booster": { "rounds": 5 }
        });
        std::fs::write(config_dir.join("settings.json"), settings.to_string()).unwrap();
        sandbox
    }

    fn home(&self) -> &Path {
        self.dir.path()
    }

    fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    fn artifact(&self) -> PathBuf {
        self.data_dir().join("purchases.csv")
    }

    fn write_artifact(&self, counts: &[(&str, usize)]) {
        std::fs::create_dir_all(self.data_dir()).unwrap();
        let mut content = format!("{HEADER}\n");
        for (c, (category, n)) in counts.iter().enumerate() {
            for i in 0..*n {
                let day = i % 28 + 1;
                let amount = 15.0 * (c as f64 + 1.0) + (i % 4) as f64;
                content.push_str(&format!(
                    "{category}-{i},m{c},acct-1,{category},{amount},2025-02-{day:02},2025-02-{day:02}T12:00:00+00:00,merchant,completed,balance,Shop {c},\"note, {i}\"\n"
                ));
            }
        }
        std::fs::write(self.artifact(), content).unwrap();
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("ledgerlens").unwrap();
        cmd.current_dir(self.home())
            .env("HOME", self.home())
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .env_remove("SUPABASE_URL")
            .env_remove("SUPABASE_SERVICE_ROLE")
            .env_remove("CUSTOMER_ID");
        cmd
    }
}

#[test]
fn test_no_args_without_credentials_fails_in_config_stage() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("config stage failed"))
        .stderr(predicate::str::contains("SUPABASE_URL is not set"));
    assert!(!sandbox.artifact().exists());
}

#[test]
fn test_train_reports_from_artifact() {
    let sandbox = Sandbox::new();
    sandbox.write_artifact(&[("food", 30), ("travel", 12), ("bills", 8)]);
    sandbox
        .cmd()
        .arg("train")
        .assert()
        .success()
        .stdout(predicate::str::contains("Classification Report"))
        .stdout(predicate::str::contains("bills"))
        .stdout(predicate::str::contains("travel"))
        .stdout(predicate::str::contains("\"accuracy\""))
        .stdout(predicate::str::contains("50 rows read"));
}

#[test]
fn test_train_twice_prints_identical_report() {
    let sandbox = Sandbox::new();
    sandbox.write_artifact(&[("food", 20), ("travel", 9), ("bills", 6)]);
    let first = sandbox.cmd().arg("train").output().unwrap();
    let second = sandbox.cmd().arg("train").output().unwrap();
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn test_train_without_artifact_names_features_stage() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .arg("train")
        .assert()
        .failure()
        .stderr(predicate::str::contains("features stage failed"))
        .stderr(predicate::str::contains("ledgerlens extract"));
}

#[test]
fn test_train_with_rare_category_fails() {
    let sandbox = Sandbox::new();
    sandbox.write_artifact(&[("food", 50), ("travel", 3), ("bills", 2)]);
    sandbox
        .cmd()
        .arg("train")
        .assert()
        .failure()
        .stderr(predicate::str::contains("train stage failed"))
        .stderr(predicate::str::contains("'bills'"));
}

#[test]
fn test_unreachable_store_fails_in_extract_stage() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .arg("extract")
        .env("SUPABASE_URL", "http://127.0.0.1:9")
        .env("SUPABASE_SERVICE_ROLE", "key")
        .env("CUSTOMER_ID", "cust-1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("extract stage failed"));
    assert!(!sandbox.artifact().exists());
}

#[test]
fn test_dotenv_supplies_credentials() {
    let sandbox = Sandbox::new();
    std::fs::write(
        sandbox.home().join(".env"),
        "SUPABASE_URL=http://127.0.0.1:9\nSUPABASE_SERVICE_ROLE=key\nCUSTOMER_ID=cust-1\n",
    )
    .unwrap();
    sandbox
        .cmd()
        .arg("extract")
        .assert()
        .failure()
        .stderr(predicate::str::contains("extract stage failed"))
        .stderr(predicate::str::contains("config stage failed").not());
}

#[test]
fn test_status_without_artifact() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Artifact not found"))
        .stdout(predicate::str::contains("(not set)"));
}

#[test]
fn test_status_lists_categories() {
    let sandbox = Sandbox::new();
    sandbox.write_artifact(&[("food", 10), ("bills", 2)]);
    sandbox
        .cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rows:           12"))
        .stdout(predicate::str::contains("too few to split"));
}
