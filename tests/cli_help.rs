use assert_cmd::Command;

#[test]
fn cli_help_smoke() {
    let mut cmd = Command::cargo_bin("kira-segeval").unwrap();
    cmd.arg("--help");
    cmd.assert().success();
}

#[test]
fn labels_show_prints_builtin_table() {
    let mut cmd = Command::cargo_bin("kira-segeval").unwrap();
    cmd.args(["labels", "show"]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("hec\tkidney_and_mass\t1,5,6"));
    assert!(text.contains("order\t2,4,3,1,5,6"));
}
