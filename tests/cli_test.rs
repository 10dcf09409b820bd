use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_lists_subcommands() {
    let mut cmd = Command::cargo_bin("cdkconv").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("convert"))
        .stdout(predicate::str::contains("schema"));
}

#[test]
fn test_convert_file_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("main.tf");
    std::fs::write(&input, "resource \"null_resource\" \"a\" {}\n").unwrap();

    let mut cmd = Command::cargo_bin("cdkconv").unwrap();
    cmd.arg("convert")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("new NullResource(this, \"a\""))
        .stdout(predicate::str::contains("export class MyConvertedCode"));
}

#[test]
fn test_convert_directory_concatenates_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("b.tf"),
        "resource \"null_resource\" \"b\" { triggers = { id = null_resource.a.id } }\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("a.tf"), "resource \"null_resource\" \"a\" {}\n").unwrap();

    let mut cmd = Command::cargo_bin("cdkconv").unwrap();
    cmd.arg("convert")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("const a = new NullResource"));
}

#[test]
fn test_convert_rejects_unknown_language() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("main.tf");
    std::fs::write(&input, "\n").unwrap();

    let mut cmd = Command::cargo_bin("cdkconv").unwrap();
    cmd.arg("convert")
        .arg(&input)
        .arg("--language")
        .arg("cobol")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported target language"));
}

#[test]
fn test_convert_writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("main.tf");
    let output = dir.path().join("main.ts");
    std::fs::write(&input, "resource \"null_resource\" \"a\" {}\n").unwrap();

    let mut cmd = Command::cargo_bin("cdkconv").unwrap();
    cmd.arg("convert")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let written = std::fs::read_to_string(&output).unwrap();
    assert!(written.contains("new NullResource"));
}
