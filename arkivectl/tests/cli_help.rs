use assert_cmd::cargo::cargo_bin_cmd;

#[test]
fn help_lists_user_subcommands() {
    let mut cmd = cargo_bin_cmd!("arkivectl");
    let output = cmd
        .arg("--help")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8_lossy(&output);
    assert!(
        text.contains("create-user"),
        "help missing create-user subcommand"
    );
    assert!(
        text.contains("modify-user"),
        "help missing modify-user subcommand"
    );
    assert!(
        text.contains("delete-user"),
        "help missing delete-user subcommand"
    );
}

#[test]
fn create_user_help_documents_prefill_flags() {
    let mut cmd = cargo_bin_cmd!("arkivectl");
    let output = cmd
        .arg("create-user")
        .arg("--help")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8_lossy(&output);
    for flag in ["--email", "--username", "--password", "--role", "--name"] {
        assert!(text.contains(flag), "create-user help missing {flag}");
    }
}

#[test]
fn delete_user_help_mentions_confirmation() {
    let mut cmd = cargo_bin_cmd!("arkivectl");
    let output = cmd
        .arg("delete-user")
        .arg("--help")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8_lossy(&output);
    assert!(
        text.contains("confirmation"),
        "delete-user help missing confirmation note"
    );
}
