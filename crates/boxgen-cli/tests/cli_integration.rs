//! CLI subprocess integration tests.
//!
//! These tests invoke the `boxgen` binary as a subprocess and verify
//! exit codes, stdout content, and JSON output stability.

use std::path::{Path, PathBuf};
use std::process::Command;

fn boxgen_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_boxgen"));
    cmd.env_remove("BOXGEN_LOG");
    cmd
}

fn demo_workspace() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../../demos/leds"))
}

fn write_box(workspace: &Path, name: &str, body: &str) -> PathBuf {
    let dir = workspace.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(format!("{name}.cpp")), "").unwrap();
    let path = dir.join(format!("box_{name}.xml"));
    std::fs::write(
        &path,
        format!(
            r#"<?xml version="1.0"?>
<partition name="{name}" priority="osPriorityNormal">
  <code entry_point="{name}_main"/>
  <stack size="0x400"/>
  <heap size="0x400"/>
  <context_structure_name>ctx</context_structure_name>
  {body}
  <src><filename>{name}.cpp</filename></src>
</partition>
"#
        ),
    )
    .unwrap();
    path
}

fn stdout_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn cli_version_exits_zero() {
    let output = boxgen_bin().arg("--version").output().unwrap();
    assert!(output.status.success(), "boxgen --version must exit 0");
    let stdout = stdout_of(&output);
    assert!(
        stdout.contains("boxgen"),
        "version output must contain 'boxgen': {stdout}"
    );
}

#[test]
fn cli_help_lists_commands() {
    let output = boxgen_bin().arg("--help").output().unwrap();
    assert!(output.status.success(), "boxgen --help must exit 0");
    let stdout = stdout_of(&output);
    for command in ["generate", "check", "inspect", "completions"] {
        assert!(stdout.contains(command), "help must list '{command}'");
    }
}

#[test]
fn cli_generate_demo_workspace() {
    let out = tempfile::tempdir().unwrap();
    let target = out.path().join("generated");

    let output = boxgen_bin()
        .arg("generate")
        .arg(demo_workspace())
        .arg(&target)
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "generate must exit 0. stderr: {}",
        stderr_of(&output)
    );
    for name in [
        "partition_common.inc",
        "partition_description_box_main.inc",
        "partition_description_box_led1.inc",
        "partition_description_box_led2.inc",
    ] {
        assert!(target.join(name).is_file(), "missing artifact {name}");
    }
    let main = std::fs::read_to_string(target.join("partition_description_box_main.inc")).unwrap();
    assert!(main.contains("BOXGEN_MAIN_BOX_BEGIN(box_main)"), "{main}");
    let common = std::fs::read_to_string(target.join("partition_common.inc")).unwrap();
    assert!(common.contains("#define BOXGEN_MMIO_REGION_PAIR_COUNT 3"), "{common}");
}

#[test]
fn cli_generate_json_output_is_stable() {
    let out = tempfile::tempdir().unwrap();

    let output = boxgen_bin()
        .arg("--json")
        .arg("generate")
        .arg(demo_workspace())
        .arg(out.path())
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", stderr_of(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout_of(&output))
        .unwrap_or_else(|e| panic!("generate --json must produce valid JSON: {e}"));
    assert_eq!(json["status"], "generated");
    assert_eq!(json["main_partition"], "box_main");
    assert_eq!(json["region_pairs"], 3);
    assert_eq!(json["manifests"].as_array().unwrap().len(), 3);
    assert_eq!(json["artifacts"].as_array().unwrap().len(), 4);
}

#[test]
fn cli_check_json_lists_partitions_in_discovery_order() {
    let output = boxgen_bin()
        .args(["--json", "check"])
        .arg(demo_workspace())
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", stderr_of(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    assert_eq!(json["status"], "ok");
    let names: Vec<&str> = json["partitions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["box_main", "box_led1", "box_led2"]);
    assert_eq!(json["partitions"][0]["main"], true);
    assert_eq!(json["partitions"][2]["irqs"][0], 0x28);
}

#[test]
fn cli_inspect_prints_emission_plan() {
    let output = boxgen_bin()
        .arg("inspect")
        .arg(demo_workspace())
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", stderr_of(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    assert_eq!(json["common"]["region_pairs"].as_array().unwrap().len(), 3);
    assert_eq!(json["partitions"][0]["is_main"], true);
    assert_eq!(json["partitions"][2]["global_heap"]["minimal_page_number"], 4);
}

#[test]
fn cli_irq_conflict_exits_with_validation_code() {
    let workspace = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let target = out.path().join("generated");
    write_box(workspace.path(), "a", "<irq_num>7</irq_num>");
    write_box(workspace.path(), "b", "<irq_num>0x7</irq_num>");

    let output = boxgen_bin()
        .arg("generate")
        .arg(workspace.path())
        .arg(&target)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(3));
    let stderr = stderr_of(&output);
    assert!(stderr.contains("validation error:"), "{stderr}");
    assert!(stderr.contains("IRQ 7"), "{stderr}");
    assert!(!target.exists(), "no output may be written on failure");
}

#[test]
fn cli_malformed_manifest_exits_with_manifest_code() {
    let workspace = tempfile::tempdir().unwrap();
    write_box(workspace.path(), "a", r#"<stack size="lots"/>"#);

    let output = boxgen_bin()
        .arg("check")
        .arg(workspace.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr_of(&output).contains("manifest error:"));
}

#[test]
fn cli_missing_workspace_fails() {
    let scratch = tempfile::tempdir().unwrap();

    let output = boxgen_bin()
        .arg("check")
        .arg(scratch.path().join("nope"))
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("is not a valid path"));
}

#[test]
fn cli_config_flag_overrides_naming() {
    let scratch = tempfile::tempdir().unwrap();
    let config = scratch.path().join("naming.toml");
    std::fs::write(
        &config,
        "common_artifact = \"regions.h\"\npartition_artifact_extension = \"h\"\n",
    )
    .unwrap();
    let target = scratch.path().join("out");

    let output = boxgen_bin()
        .arg("--config")
        .arg(&config)
        .arg("generate")
        .arg(demo_workspace())
        .arg(&target)
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", stderr_of(&output));
    assert!(target.join("regions.h").is_file());
    assert!(target.join("partition_description_box_led1.h").is_file());
}

#[test]
fn cli_generate_with_template_dir() {
    let scratch = tempfile::tempdir().unwrap();
    let templates = scratch.path().join("templates");
    std::fs::create_dir(&templates).unwrap();
    std::fs::write(
        templates.join("common_configuration.tpl"),
        "// {{ region_pairs | length }} pairs\n",
    )
    .unwrap();
    std::fs::write(
        templates.join("main_box_configuration.tpl"),
        "// main {{ name }}\n",
    )
    .unwrap();
    std::fs::write(
        templates.join("box_configuration.tpl"),
        "// box {{ name }} irq {{ irqs | join(\",\") }}\n",
    )
    .unwrap();
    let target = scratch.path().join("out");

    let output = boxgen_bin()
        .arg("generate")
        .arg(demo_workspace())
        .arg(&target)
        .arg("--templates")
        .arg(&templates)
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", stderr_of(&output));
    let read = |name: &str| std::fs::read_to_string(target.join(name)).unwrap();
    assert_eq!(read("partition_common.inc"), "// 3 pairs\n");
    assert_eq!(read("partition_description_box_main.inc"), "// main box_main\n");
    assert_eq!(read("partition_description_box_led2.inc"), "// box box_led2 irq 40\n");
}

#[test]
fn cli_generate_with_shipped_templates() {
    let scratch = tempfile::tempdir().unwrap();
    let target = scratch.path().join("out");
    let templates = concat!(env!("CARGO_MANIFEST_DIR"), "/../boxgen-core/templates");

    let output = boxgen_bin()
        .arg("generate")
        .arg(demo_workspace())
        .arg(&target)
        .args(["--templates", templates])
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", stderr_of(&output));
    let led1 =
        std::fs::read_to_string(target.join("partition_description_box_led1.inc")).unwrap();
    assert!(led1.contains("BOXGEN_BOX_BEGIN(box_led1)"), "{led1}");
    assert!(led1.contains("BOXGEN_BOX_IRQ(23)"), "{led1}");
}

#[test]
fn cli_missing_template_dir_writes_nothing() {
    let scratch = tempfile::tempdir().unwrap();
    let target = scratch.path().join("out");

    let output = boxgen_bin()
        .arg("generate")
        .arg(demo_workspace())
        .arg(&target)
        .arg("--templates")
        .arg(scratch.path().join("absent"))
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("failed to read template"));
    assert!(!target.exists());
}

#[test]
fn cli_completions_bash() {
    let output = boxgen_bin().args(["completions", "bash"]).output().unwrap();
    assert!(output.status.success());
    assert!(stdout_of(&output).contains("boxgen"));
}

#[test]
fn cli_man_pages_written() {
    let dir = tempfile::tempdir().unwrap();
    let output = boxgen_bin()
        .arg("man-pages")
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(dir.path().join("boxgen.1").is_file());
    assert!(dir.path().join("boxgen-generate.1").is_file());
}
