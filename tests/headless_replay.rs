use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

fn temp_dir(name: &str) -> PathBuf {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("stonequarry_{name}_{timestamp}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_script(path: &Path, commands: &[(u64, &str)]) {
    let steps: Vec<_> = commands
        .iter()
        .map(|(tick, command)| json!({"tick": tick, "command": command}))
        .collect();
    let script = json!({ "steps": steps });
    std::fs::write(path, serde_json::to_string_pretty(&script).unwrap()).expect("write script");
}

fn replay(dir: &Path, script: &Path) -> Vec<String> {
    let bin = env!("CARGO_BIN_EXE_stonequarry");
    let output = Command::new(bin)
        .args([
            "--config",
            dir.join("stonequarry.toml").to_str().unwrap(),
            "--script",
            script.to_str().unwrap(),
            "--save",
            dir.join("world").to_str().unwrap(),
        ])
        .stdin(Stdio::null())
        .output()
        .expect("run stonequarry");
    assert!(
        output.status.success(),
        "stonequarry failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn headless_replay_persists_block_entities() {
    let dir = temp_dir("replay");
    let first = dir.join("first.json");
    write_script(
        &first,
        &[
            (0, "/rubble place 0 64 0"),
            (0, "/rubble add 0 64 0 game:stone-granite 6"),
            (2, "/rubble hammer 0 64 0"),
            (2, "/teleport 0 0 0"),
        ],
    );

    let lines = replay(&dir, &first);
    assert_eq!(
        lines,
        vec![
            "[0] Placed rubble storage at (0, 64, 0) (0/512)",
            "[0] Stored 6× game:stone-granite (6/512)",
            "[2] Hammered: stone=4 gravel=1 sand=0",
            "[2] Error: Unknown command: teleport. Try /help",
        ]
    );
    assert!(dir.join("stonequarry.toml").exists());
    assert!(dir.join("world").join("blockentities.sqbe").exists());

    let second = dir.join("second.json");
    write_script(&second, &[(0, "/status")]);
    let lines = replay(&dir, &second);
    assert_eq!(
        lines,
        vec![
            "[0] (0, 64, 0) rubble game:granite stone=4 gravel=1 sand=0 lock=None",
            "[0] Inventory: empty",
        ]
    );

    std::fs::remove_dir_all(&dir).ok();
}
