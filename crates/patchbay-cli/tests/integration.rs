//! Integration tests for patchbay-cli.
//!
//! Tests run the `patchbay` binary against graph files written to a
//! temporary directory.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// Helper to get the path to the `patchbay` binary built by cargo.
fn patchbay_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_patchbay"))
}

const SINE_GRAPH: &str = r#"<graph nextNodeId="3" nextLinkId="2">
  <node id="1" typeName="audio.sine">
    <input socket="frequency" value="440"/>
  </node>
  <node id="2" typeName="audio.output"/>
  <link id="1" srcNodeId="1" srcNodeSocketName="audio" dstNodeId="2" dstNodeSocketName="audio"/>
</graph>
"#;

fn write_graph(dir: &Path, name: &str, xml: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, xml).unwrap();
    path
}

#[test]
fn cli_types_lists_categories() {
    let output = patchbay_bin().arg("types").output().expect("failed to run");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Available Node Types"));
    for type_name in ["math.add", "audio.delay", "audio.graph.poly", "draw.camera", "display"] {
        assert!(stdout.contains(type_name), "listing should contain '{type_name}'");
    }
}

#[test]
fn cli_types_json_describes_sockets() {
    let output = patchbay_bin()
        .args(["types", "audio.delay", "--json"])
        .output()
        .expect("failed to run");
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(json["type"], "audio.delay");
    assert_eq!(json["category"], "Audio");
    assert!(json["inputs"].as_array().is_some_and(|a| !a.is_empty()));
}

#[test]
fn cli_types_unknown_fails() {
    let output = patchbay_bin()
        .args(["types", "audio.theremin"])
        .output()
        .expect("failed to run");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown node type"));
}

#[test]
fn cli_check_accepts_valid_graph() {
    let dir = TempDir::new().unwrap();
    let graph = write_graph(dir.path(), "sine.xml", SINE_GRAPH);

    let output = patchbay_bin().arg("check").arg(&graph).output().expect("failed to run");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("ok (2 nodes, 1 links)"));
}

#[test]
fn cli_check_reports_unknown_type() {
    let dir = TempDir::new().unwrap();
    let graph = write_graph(
        dir.path(),
        "bad.xml",
        &SINE_GRAPH.replace("audio.sine", "audio.theremin"),
    );

    let output = patchbay_bin().arg("check").arg(&graph).output().expect("failed to run");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("audio.theremin"));
}

#[test]
fn cli_run_describes_nodes() {
    let dir = TempDir::new().unwrap();
    let graph = write_graph(dir.path(), "sine.xml", SINE_GRAPH);

    let output = patchbay_bin()
        .arg("run")
        .arg(&graph)
        .args(["--frames", "3", "--describe"])
        .output()
        .expect("failed to run");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("3 frames"));
    assert!(stdout.contains("type: audio.sine"), "got: {stdout}");
}

#[test]
fn cli_render_writes_wav() {
    let dir = TempDir::new().unwrap();
    let graph = write_graph(dir.path(), "sine.xml", SINE_GRAPH);
    let config = dir.path().join("engine.toml");
    std::fs::write(&config, "sample_rate = 8000\nblock_size = 64\n").unwrap();
    let wav = dir.path().join("out.wav");

    let output = patchbay_bin()
        .arg("--config")
        .arg(&config)
        .arg("render")
        .arg(&graph)
        .arg(&wav)
        .args(["--seconds", "0.5"])
        .output()
        .expect("failed to run");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let reader = hound::WavReader::open(&wav).expect("readable wav");
    assert_eq!(reader.spec().sample_rate, 8000);
    assert_eq!(reader.spec().channels, 1);
    assert_eq!(reader.len(), 4000);
}

#[test]
fn cli_render_rejects_missing_graph() {
    let dir = TempDir::new().unwrap();
    let output = patchbay_bin()
        .arg("render")
        .arg(dir.path().join("absent.xml"))
        .arg(dir.path().join("out.wav"))
        .output()
        .expect("failed to run");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("absent.xml"));
}
