//! End-to-end tests for the `gradebook` binary

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

fn gradebook(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("gradebook").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("GOOGLE_API_KEY")
        .env_remove("GRADEBOOK_DB_PATH")
        .env_remove("GRADEBOOK_CSV_PATH")
        .env_remove("GRADEBOOK_MODEL");
    cmd
}

#[test]
fn test_import_then_query_defaults() {
    let dir = TempDir::new().unwrap();
    dir.child("data.csv")
        .write_str("1,Ann,Lee,Math,3.5\n2,Bo,Kim,Math,bad\n1,Cy,Doe,Math,4.0\n")
        .unwrap();

    gradebook(&dir)
        .arg("import")
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported: 1"))
        .stdout(predicate::str::contains("Rejected: 2"))
        .stdout(predicate::str::contains("Row 2: invalid grade 'bad'"))
        .stdout(predicate::str::contains("Row 3: duplicate student_id 1"));

    dir.child("csv.db").assert(predicate::path::is_file());

    gradebook(&dir)
        .args(["query", "SELECT first_name FROM students"])
        .assert()
        .success()
        .stdout("Ann\n");
}

#[test]
fn test_import_explicit_paths() {
    let dir = TempDir::new().unwrap();
    dir.child("grades.csv")
        .write_str("id,first_name,last_name,course_name,grade\n5,Eve,Ng,Art,3.0\n")
        .unwrap();

    gradebook(&dir)
        .args(["-d", "out/school.db", "import", "grades.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Header skipped: yes"));

    gradebook(&dir)
        .env("GRADEBOOK_DB_PATH", "out/school.db")
        .args(["status", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"students\": 1"));
}

#[test]
fn test_missing_csv_fails() {
    let dir = TempDir::new().unwrap();

    gradebook(&dir)
        .args(["import", "absent.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.csv"));
}

#[test]
fn test_query_error_is_reported_as_text() {
    let dir = TempDir::new().unwrap();
    dir.child("data.csv").write_str("1,Ann,Lee,Math,3.5\n").unwrap();
    gradebook(&dir).arg("import").assert().success();

    gradebook(&dir)
        .args(["query", "SELEC oops"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("SQL execution error:"));
}

#[test]
fn test_ask_requires_api_key() {
    let dir = TempDir::new().unwrap();
    dir.child("data.csv").write_str("1,Ann,Lee,Math,3.5\n").unwrap();
    gradebook(&dir).arg("import").assert().success();

    gradebook(&dir)
        .args(["ask", "How many students are there?"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("GOOGLE_API_KEY"));
}

#[test]
fn test_dotenv_supplies_settings() {
    let dir = TempDir::new().unwrap();
    dir.child(".env")
        .write_str("GRADEBOOK_DB_PATH=from_env.db\nGRADEBOOK_CSV_PATH=grades.csv\n")
        .unwrap();
    dir.child("grades.csv").write_str("1,Ann,Lee,Math,3.5\n").unwrap();

    gradebook(&dir)
        .arg("import")
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported: 1"));

    dir.child("from_env.db").assert(predicate::path::is_file());
    dir.child("csv.db").assert(predicate::path::missing());
}

#[test]
fn test_status_does_not_create_schema() {
    let dir = TempDir::new().unwrap();

    gradebook(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Database not found"));
    dir.child("csv.db").assert(predicate::path::missing());

    dir.child("csv.db").touch().unwrap();
    gradebook(&dir)
        .args(["status", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"tables\": []"));
}
