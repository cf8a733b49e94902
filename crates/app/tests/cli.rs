use std::path::PathBuf;
use std::process::Command;

use serde_json::Value;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_sound-radar"))
}

fn temp_path(name: &str) -> PathBuf {
    let file = format!("sound-radar-{}-{name}", std::process::id());
    std::env::temp_dir().join(file)
}

#[test]
fn devices_lists_catalog_with_auto_choice() {
    let settings = temp_path("devices.cfg");
    let output = cli()
        .args(["--settings", settings.to_str().unwrap(), "devices"])
        .output()
        .expect("devices command");

    assert!(
        output.status.success(),
        "devices exited with {:?}",
        output.status.code()
    );
    let stdout = String::from_utf8(output.stdout).expect("stdout utf8");
    assert!(stdout.contains("Auto (first available)"), "{stdout}");
    let headphones = stdout
        .lines()
        .find(|line| line.contains("Headphones"))
        .expect("headphones listed");
    assert!(headphones.starts_with('*'), "{headphones}");
    assert!(headphones.ends_with("(auto)"), "{headphones}");
}

#[test]
fn snapshot_writes_draw_list_json() {
    let settings = temp_path("snapshot.cfg");
    let contents = "max_entities=2\nsensitivity=100\n";
    std::fs::write(&settings, contents).expect("write settings");
    let json_path = temp_path("snapshot.json");

    let output = cli()
        .args([
            "--settings",
            settings.to_str().unwrap(),
            "snapshot",
            json_path.to_str().unwrap(),
            "--frames",
            "30",
        ])
        .output()
        .expect("snapshot command");

    assert!(
        output.status.success(),
        "snapshot exited with {:?}",
        output.status.code()
    );
    let text = std::fs::read_to_string(&json_path).expect("snapshot file");
    let payload: Value = serde_json::from_str(&text).expect("snapshot json");
    assert_eq!(payload["stats"]["frames"], 30);
    let primitives = payload["primitives"].as_array().expect("primitives array");
    assert!(primitives.iter().any(|p| p["kind"] == "ring"));

    let visible = payload["slots"]
        .as_array()
        .expect("slots array")
        .iter()
        .filter(|slot| slot["alpha"].as_f64().unwrap_or(0.0) > 0.0)
        .count();
    assert_eq!(visible, 2);

    let _ = std::fs::remove_file(&settings);
    let _ = std::fs::remove_file(&json_path);
}

#[test]
fn timed_run_saves_settings() {
    let settings = temp_path("run.cfg");
    let _ = std::fs::remove_file(&settings);

    let output = cli()
        .args([
            "--settings",
            settings.to_str().unwrap(),
            "run",
            "--seconds",
            "1",
        ])
        .output()
        .expect("run command");

    assert!(
        output.status.success(),
        "run exited with {:?}",
        output.status.code()
    );
    let saved = std::fs::read_to_string(&settings).expect("saved settings");
    assert!(saved.contains("pollrate=60"), "{saved}");
    assert!(saved.contains("output_device_idx=0"), "{saved}");

    let _ = std::fs::remove_file(&settings);
}
