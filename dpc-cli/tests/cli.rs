use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn isp_sim(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_isp-sim"))
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to launch isp-sim")
}

fn register(value: i64, min: i64, max: i64) -> String {
    format!(
        r#"{{ "reg_bit_width": 16, "reg_initial_value": [{value}], "reg_value_min": {min}, "reg_value_max": {max} }}"#
    )
}

fn write_config(dir: &Path, generate: bool) {
    let config = format!(
        r#"{{
    "image_info": {{
        "image_path": "src_image.txt",
        "image_data_bitwidth": 12,
        "generate_random_image": {generate},
        "random_image_path": "random_src_image.txt",
        "seed": 5
    }},
    "register_info": {{
        "reg_image_width": {w},
        "reg_image_height": {h},
        "reg_dpc_enable": {en},
        "reg_dpc_threshold": {th},
        "reg_crop_enable": {en},
        "reg_crop_start_x": {sx},
        "reg_crop_start_y": {sy},
        "reg_crop_end_x": {ex},
        "reg_crop_end_y": {ey}
    }},
    "output_info": {{
        "alg_crop_output_file": "out/alg_crop.txt",
        "alg_dpc_output_file": "out/alg_dpc.txt",
        "hls_dpc_output_file": "out/hls_dpc.txt"
    }}
}}"#,
        generate = u8::from(generate),
        w = register(16, 1, 4096),
        h = register(12, 1, 4096),
        en = register(1, 0, 1),
        th = register(30, 0, 4095),
        sx = register(2, 0, 4095),
        sy = register(1, 0, 4095),
        ex = register(13, 0, 4095),
        ey = register(10, 0, 4095),
    );
    fs::write(dir.join("vibe.json"), config).unwrap();
}

fn frame_text(width: usize, height: usize, f: impl Fn(usize, usize) -> u16) -> String {
    let mut text = String::new();
    for y in 0..height {
        for x in 0..width {
            text.push_str(&format!("{:04x}  # ({y:4}, {x:4})\n", f(x, y)));
        }
    }
    text
}

#[test]
fn test_run_reads_source_crops_and_corrects() {
    let dir = TempDir::new().unwrap();
    write_config(dir.path(), false);
    fs::write(
        dir.path().join("src_image.txt"),
        frame_text(16, 12, |x, y| if (x, y) == (7, 5) { 4095 } else { 600 }),
    )
    .unwrap();

    let out = isp_sim(&["run", "--config", "vibe.json"], dir.path());
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let crop = fs::read_to_string(dir.path().join("out/alg_crop.txt")).unwrap();
    assert_eq!(crop.lines().count(), 12 * 10);
    assert!(crop.contains("0fff"));

    let dpc = fs::read_to_string(dir.path().join("out/alg_dpc.txt")).unwrap();
    assert_eq!(dpc.lines().count(), 12 * 10);
    assert!(dpc.lines().all(|l| l.starts_with("0258")));
}

#[test]
fn test_run_generates_random_source() {
    let dir = TempDir::new().unwrap();
    write_config(dir.path(), true);

    let out = isp_sim(&["run"], dir.path());
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let source = fs::read_to_string(dir.path().join("random_src_image.txt")).unwrap();
    assert_eq!(source.lines().count(), 16 * 12);
    assert!(dir.path().join("out/alg_dpc.txt").exists());
}

#[test]
fn test_run_without_source_fails() {
    let dir = TempDir::new().unwrap();
    write_config(dir.path(), false);

    let out = isp_sim(&["run"], dir.path());
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("No source image found"));
}

#[test]
fn test_process_then_compare() {
    let dir = TempDir::new().unwrap();
    let input = frame_text(5, 5, |x, y| if (x, y) == (2, 2) { 100 } else { 0 });
    fs::write(dir.path().join("in.txt"), &input).unwrap();

    let out = isp_sim(
        &[
            "process",
            "in.txt",
            "out.txt",
            "--width",
            "5",
            "--height",
            "5",
            "--threshold",
            "10",
        ],
        dir.path(),
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    fs::write(dir.path().join("zeros.txt"), frame_text(5, 5, |_, _| 0)).unwrap();
    let same = isp_sim(&["compare", "zeros.txt", "out.txt"], dir.path());
    assert!(same.status.success());

    let differ = isp_sim(&["compare", "in.txt", "out.txt"], dir.path());
    assert_eq!(differ.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&differ.stdout).contains("1 mismatching pixels"));
}

#[test]
fn test_process_rejects_size_mismatch() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("in.txt"), frame_text(2, 5, |_, _| 0)).unwrap();

    let out = isp_sim(
        &["process", "in.txt", "out.txt", "--width", "4", "--height", "4"],
        dir.path(),
    );
    assert!(!out.status.success());
    assert!(!dir.path().join("out.txt").exists());
}

#[test]
fn test_generate_and_crop() {
    let dir = TempDir::new().unwrap();
    let generated = isp_sim(
        &[
            "generate",
            "frame.txt",
            "--width",
            "8",
            "--height",
            "6",
            "--bits",
            "8",
            "--defects",
            "3",
        ],
        dir.path(),
    );
    assert!(generated.status.success(), "{}", String::from_utf8_lossy(&generated.stderr));
    let frame = fs::read_to_string(dir.path().join("frame.txt")).unwrap();
    assert_eq!(frame.lines().count(), 48);
    // 8-bit frames use two hex digits.
    assert!(frame.lines().all(|l| l.find(' ') == Some(2)));

    let crop = isp_sim(
        &[
            "crop",
            "frame.txt",
            "crop.txt",
            "--width",
            "8",
            "--height",
            "6",
            "--start-x",
            "1",
            "--start-y",
            "1",
            "--end-x",
            "4",
            "--end-y",
            "2",
            "--bits",
            "8",
        ],
        dir.path(),
    );
    assert!(crop.status.success(), "{}", String::from_utf8_lossy(&crop.stderr));
    let cropped = fs::read_to_string(dir.path().join("crop.txt")).unwrap();
    assert_eq!(cropped.lines().count(), 8);
}

#[test]
fn test_crop_rejects_oversized_frame() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("frame.txt"), frame_text(2, 2, |_, _| 0)).unwrap();
    let huge = usize::MAX.to_string();

    let out = isp_sim(
        &[
            "crop",
            "frame.txt",
            "crop.txt",
            "--width",
            &huge,
            "--height",
            "2",
            "--start-x",
            "0",
            "--start-y",
            "0",
            "--end-x",
            "1",
            "--end-y",
            "1",
        ],
        dir.path(),
    );
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("too large"));
    assert!(!dir.path().join("crop.txt").exists());
}

#[test]
fn test_compare_outputs_reports_mismatch() {
    let dir = TempDir::new().unwrap();
    write_config(dir.path(), false);
    fs::create_dir_all(dir.path().join("out")).unwrap();
    fs::write(dir.path().join("out/alg_dpc.txt"), frame_text(2, 2, |_, _| 7)).unwrap();

    fs::write(dir.path().join("out/hls_dpc.txt"), frame_text(2, 2, |_, _| 7)).unwrap();
    let same = isp_sim(&["compare-outputs"], dir.path());
    assert!(same.status.success(), "{}", String::from_utf8_lossy(&same.stdout));

    fs::write(dir.path().join("out/hls_dpc.txt"), frame_text(2, 2, |x, _| x as u16)).unwrap();
    let differ = isp_sim(&["compare-outputs"], dir.path());
    assert_eq!(differ.status.code(), Some(1));
}

#[test]
fn test_registers_from_table() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("register_table.csv"),
        "idx,reg_name,bit_width,initial_value,min,max\n\
         0,reg_image_width,16,640,1,8192\n\
         1,reg_dpc_enable,1,1,0,1\n",
    )
    .unwrap();

    let out = isp_sim(
        &["registers", "--table", "register_table.csv", "--csv"],
        dir.path(),
    );
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("reg_image_width,16,640,1,8192"));
    assert!(stdout.contains("reg_dpc_enable,1,1,0,1"));
}

#[test]
fn test_registers_from_config_as_yaml() {
    let dir = TempDir::new().unwrap();
    write_config(dir.path(), false);

    let out = isp_sim(&["registers", "--config", "vibe.json", "--format", "yaml"], dir.path());
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("reg_dpc_threshold:"));
    assert!(stdout.contains("reg_value_max: 4095"));
}
