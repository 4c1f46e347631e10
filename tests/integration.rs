use petrisim::run::Snapshot;
use std::{
    env,
    fs::{self, File},
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    process::Command,
};

fn snapshot_generations(file: &Path) -> Vec<usize> {
    let mut reader = BufReader::new(File::open(file).expect("failed to open trajectory"));
    let mut generations = Vec::new();
    while !reader.fill_buf().expect("failed to read trajectory").is_empty() {
        let snapshot: Snapshot =
            rmp_serde::decode::from_read(&mut reader).expect("failed to decode snapshot");
        generations.push(snapshot.generation);
    }
    generations
}

#[test]
fn basic_workflow() {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("basic_workflow");

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");

    let config_path = test_dir.join("config.toml");
    let config_contents = String::new()
        + "seed = 2024\n"
        + "\n"
        + "[params]\n"
        + "initial_population = 120\n"
        + "growth_rate = 0.4\n"
        + "antibiotic_concentration = 0.3\n"
        + "mutation_rate = 0.05\n"
        + "duration = 20\n"
        + "petri_dish_size = 500\n"
        + "\n"
        + "[output]\n"
        + "steps_per_save = 4\n";

    fs::write(&config_path, config_contents).expect("failed to write config file");

    fn run_bin(args: &[&str]) -> bool {
        let bin = PathBuf::from(env!("CARGO_BIN_EXE_petrisim"));

        let output = Command::new(bin)
            .args(args)
            .output()
            .expect("failed to execute command");

        output.status.success()
    }

    fn run_bin_ok(args: &[&str]) {
        assert!(run_bin(args), "failed to run binary with {args:?}");
    }

    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    run_bin_ok(&["--sim-dir", test_dir_str, "create"]);
    run_bin_ok(&["--sim-dir", test_dir_str, "create"]);

    run_bin_ok(&["--sim-dir", test_dir_str, "run", "--run-idx", "0", "--steps", "5"]);
    run_bin_ok(&["--sim-dir", test_dir_str, "run", "--run-idx", "0"]);
    // A completed run rejects further steps.
    assert!(!run_bin(&["--sim-dir", test_dir_str, "run", "--run-idx", "0"]));

    run_bin_ok(&["--sim-dir", test_dir_str, "run", "--run-idx", "1", "--steps", "3"]);
    run_bin_ok(&["--sim-dir", test_dir_str, "pause", "--run-idx", "1"]);
    // Paused runs cannot be paused again.
    assert!(!run_bin(&["--sim-dir", test_dir_str, "pause", "--run-idx", "1"]));
    run_bin_ok(&["--sim-dir", test_dir_str, "run", "--run-idx", "1", "--steps", "1"]);

    run_bin_ok(&["--sim-dir", test_dir_str, "analyze"]);

    let run_dir = test_dir.join("run-0000");
    assert!(run_dir.join("trajectory-0000.msgpack").is_file());
    assert!(run_dir.join("trajectory-0001.msgpack").is_file());
    // Frames follow the generation count, not the steps of each invocation.
    assert_eq!(
        snapshot_generations(&run_dir.join("trajectory-0000.msgpack")),
        [4]
    );
    assert_eq!(
        snapshot_generations(&run_dir.join("trajectory-0001.msgpack")),
        [8, 12, 16, 20]
    );

    let csv = fs::read_to_string(run_dir.join("statistics.csv")).expect("failed to read csv");
    assert_eq!(csv.lines().count(), 21);

    let results = fs::read_to_string(run_dir.join("results.json")).expect("failed to read json");
    let results: serde_json::Value = serde_json::from_str(&results).expect("invalid json");
    assert_eq!(results["final_state"]["generation"], 20);
    assert_eq!(results["final_state"]["state"], "Completed");

    let csv = fs::read_to_string(test_dir.join("run-0001").join("statistics.csv"))
        .expect("failed to read csv");
    assert_eq!(csv.lines().count(), 5);

    run_bin_ok(&["--sim-dir", test_dir_str, "clean"]);
    assert!(!run_dir.exists());

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn invalid_config_is_rejected() {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("invalid_config");

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");

    let config_contents = "[params]\n\
                           initial_population = 0\n\
                           growth_rate = 0.4\n\
                           antibiotic_concentration = 0.3\n\
                           mutation_rate = 0.05\n\
                           duration = 20\n\
                           petri_dish_size = 500\n\
                           \n\
                           [output]\n\
                           steps_per_save = 4\n";
    fs::write(test_dir.join("config.toml"), config_contents).expect("failed to write config file");

    let bin = PathBuf::from(env!("CARGO_BIN_EXE_petrisim"));
    let output = Command::new(bin)
        .args(["--sim-dir", test_dir.to_str().expect("invalid path"), "create"])
        .output()
        .expect("failed to execute command");
    assert!(!output.status.success());
    assert!(!test_dir.join("run-0000").exists());

    fs::remove_dir_all(&test_dir).ok();
}
