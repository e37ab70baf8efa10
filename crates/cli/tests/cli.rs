use assert_cmd::Command;

#[test]
fn help_lists_subcommands() {
    let output = Command::cargo_bin("bookstore-cli")
        .unwrap()
        .arg("--help")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    for sub in ["serve", "migrate", "routes"] {
        assert!(stdout.contains(sub), "missing `{sub}` in help:\n{stdout}");
    }
}

#[test]
fn routes_prints_documented_paths() {
    let output = Command::cargo_bin("bookstore-cli")
        .unwrap()
        .arg("routes")
        .env("BOOKSTORE_ENV", "local")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("/books-isReported/{id}"));
    assert!(stdout.contains("/jwt"));
}

#[test]
fn unknown_subcommand_fails() {
    Command::cargo_bin("bookstore-cli")
        .unwrap()
        .arg("reindex")
        .assert()
        .failure();
}
