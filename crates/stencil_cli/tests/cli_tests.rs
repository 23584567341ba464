//! Integration tests for the stencil CLI.
//!
//! These tests spawn the compiled binary against fixture templates in a
//! temporary directory and assert on output and exit codes.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::{tempdir, TempDir};

/// Write a minimal python-cli template under `<root>/templates`.
fn write_cli_template(root: &Path, with_makefile: bool) {
    let source = root.join("templates").join("python-cli");
    let project = source.join("{{cookiecutter.project_slug}}");
    let package = project.join("src").join("{{cookiecutter.package_name}}");
    fs::create_dir_all(&package).unwrap();

    fs::write(
        source.join("cookiecutter.json"),
        r#"{"project_name": "My CLI", "author": "someone",
            "project_slug": "{{ cookiecutter.project_name.lower().replace(' ', '-') }}",
            "package_name": "{{ cookiecutter.project_slug.replace('-', '_') }}"}"#,
    )
    .unwrap();
    fs::write(
        project.join("simple.py"),
        "#!/usr/bin/env python3\nprint('{{ cookiecutter.project_name }}')\n",
    )
    .unwrap();
    fs::write(package.join("cli.py"), "NAME = '{{ cookiecutter.package_name }}'\n").unwrap();
    if with_makefile {
        fs::write(project.join("Makefile"), "help:\n\t@echo help\n").unwrap();
    }
}

/// A stencil command isolated from the caller's environment.
fn stencil(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("stencil"));
    cmd.current_dir(dir.path())
        .env_remove("STENCIL_CONFIG")
        .env_remove("STENCIL_TEMPLATES_DIR")
        .env_remove("STENCIL_OUTPUT_DIR")
        .env_remove("STENCIL_ENGINE")
        .env_remove("RUST_LOG")
        .arg("--templates-dir")
        .arg(dir.path().join("templates"))
        .arg("--output-dir")
        .arg(dir.path().join("out"))
        .arg("--engine")
        .arg("builtin");
    cmd
}

#[test]
fn clean_twice_succeeds() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("out/test-cli")).unwrap();

    stencil(&dir)
        .arg("clean")
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed"));
    assert!(!dir.path().join("out").exists());

    stencil(&dir)
        .arg("clean")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to clean"));
}

#[test]
fn show_lists_templates() {
    let dir = tempdir().unwrap();

    stencil(&dir)
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("uv run test-cli --help"))
        .stdout(predicate::str::contains("./bin/test-go-service --help"))
        .stdout(predicate::str::contains("(not generated)"));
}

#[test]
fn generate_cli_template() {
    let dir = tempdir().unwrap();
    write_cli_template(dir.path(), true);

    stencil(&dir)
        .args(["generate", "--only", "cli"])
        .assert()
        .success()
        .stdout(predicate::str::contains("test-cli"));

    let project = dir.path().join("out/test-cli");
    assert!(project.join("src/test_cli/cli.py").is_file());
    assert_eq!(
        fs::read_to_string(project.join("simple.py")).unwrap(),
        "#!/usr/bin/env python3\nprint('Test CLI')\n"
    );

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(project.join("simple.py"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o111, 0o111);
    }
}

#[test]
fn relative_dirs_resolve_against_working_directory() {
    let dir = tempdir().unwrap();
    write_cli_template(dir.path(), true);

    // Later flags override the absolute ones set by `stencil`
    stencil(&dir)
        .args(["--templates-dir", "templates", "--output-dir", "out"])
        .args(["generate", "--only", "cli"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            dir.path().join("out").join("test-cli").display().to_string(),
        ));
    assert!(dir.path().join("out/test-cli/simple.py").is_file());
}

#[test]
fn generate_unknown_key_is_argument_error() {
    let dir = tempdir().unwrap();

    stencil(&dir)
        .args(["generate", "--only", "rust"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn unknown_flag_is_argument_error() {
    let dir = tempdir().unwrap();

    stencil(&dir)
        .args(["clean", "--everything"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--everything"));
}

#[test]
fn help_exits_successfully() {
    let dir = tempdir().unwrap();

    stencil(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("EXIT CODES"));
}

#[test]
fn generate_missing_source_is_template_error() {
    let dir = tempdir().unwrap();

    stencil(&dir)
        .args(["generate", "--only", "go"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("go-service"));
}

#[test]
fn validate_failing_step_exits_with_validation_failure() {
    let dir = tempdir().unwrap();
    // Without a Makefile the first step, `make help`, cannot succeed
    write_cli_template(dir.path(), false);

    stencil(&dir)
        .args(["validate", "--only", "cli"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("❌ make help"))
        .stdout(predicate::str::contains("simple.py").not())
        .stderr(predicate::str::contains("make help"));
}

#[test]
fn validate_dry_run_passes() {
    let dir = tempdir().unwrap();
    write_cli_template(dir.path(), true);

    stencil(&dir)
        .args(["--dry-run", "validate", "--only", "cli"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Results: 11 passed, 0 warnings, 0 failed"))
        .stdout(predicate::str::contains("All validations passed").not());
}

#[test]
fn validate_json_report() {
    let dir = tempdir().unwrap();
    write_cli_template(dir.path(), true);

    let output = stencil(&dir)
        .args(["--dry-run", "--quiet", "validate", "--only", "cli", "--format", "json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.trim_start().starts_with('{'));
    assert!(stdout.contains("\"template\": \"cli\""));
    assert!(stdout.contains("\"step\": \"./simple.py add 2 3\""));
    assert!(stdout.contains("\"status\": \"success\""));
}

#[test]
fn config_file_sets_templates_dir() {
    let dir = tempdir().unwrap();
    write_cli_template(dir.path(), true);
    fs::write(
        dir.path().join("custom.toml"),
        "templates_dir = \"templates\"\noutput_dir = \"generated\"\nengine = \"builtin\"\n",
    )
    .unwrap();

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("stencil"));
    cmd.current_dir(dir.path())
        .env_remove("STENCIL_TEMPLATES_DIR")
        .env_remove("STENCIL_OUTPUT_DIR")
        .env_remove("STENCIL_ENGINE")
        .env("STENCIL_CONFIG", "custom.toml")
        .args(["generate", "--only", "cli"])
        .assert()
        .success();

    assert!(dir.path().join("generated/test-cli/simple.py").is_file());
}

#[test]
fn invalid_config_is_general_error() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("stencil.toml"), "engine = \"jinja\"\n").unwrap();

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("stencil"));
    cmd.current_dir(dir.path())
        .env_remove("STENCIL_CONFIG")
        .env_remove("STENCIL_ENGINE")
        .arg("show")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("stencil.toml"));
}
