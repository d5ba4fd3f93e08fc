use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};

use common::SerdeFormat;
use dpc::pixel_text::{self, hex_digits};
use dpc::registers::{format_register_table, load_register_table, ImageInfo, RegisterInfo};
use dpc::synthetic::{inject_defects, random_frame};
use dpc::{Buffer2, CompareReport, CropWindow, FrameConfig, FrameParams, Radix, SimConfig};

pub fn run(config_path: &Path) -> Result<ExitCode> {
    let config = SimConfig::load(config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;
    let base = config_dir(config_path);

    let params = config
        .register_info
        .frame_config()
        .and_then(|c| c.validate())
        .context("Invalid frame registers")?;
    let window = config
        .register_info
        .crop_window()
        .context("Invalid crop registers")?;
    let bits = config.image_info.image_data_bitwidth;
    let digits = hex_digits(bits);

    let source = load_source(&config.image_info, &params, &base)?;
    tracing::info!(
        width = params.width,
        height = params.height,
        bits,
        "Source frame ready"
    );

    let cropped = window.apply(&source).context("Crop failed")?;
    if let Some(path) = config.output_info.alg_crop_output_file() {
        let path = resolve(&base, path);
        pixel_text::write_file(&path, &cropped, digits)?;
        tracing::info!(path = %path.display(), "Wrote crop output");
    }

    let output = dpc::correct_frame(&cropped, params.dpc).context("DPC failed")?;
    if let Some(path) = config.output_info.alg_dpc_output_file() {
        let path = resolve(&base, path);
        pixel_text::write_file(&path, &output.image, digits)?;
        tracing::info!(path = %path.display(), "Wrote DPC output");
    }

    tracing::info!(
        width = output.image.width(),
        height = output.image.height(),
        defects = output.defect_count,
        "Simulation complete"
    );
    Ok(ExitCode::SUCCESS)
}

/// Generates, or reads `image_path` falling back to `random_image_path`.
fn load_source(info: &ImageInfo, params: &FrameParams, base: &Path) -> Result<Buffer2<u16>> {
    let random_path = non_empty(&info.random_image_path).map(|p| resolve(base, p));

    if info.generates_random_image() {
        let seed = info.seed.unwrap_or(0);
        let frame = random_frame(params.width, params.height, info.image_data_bitwidth, seed)?;
        if let Some(path) = &random_path {
            pixel_text::write_file(path, &frame, hex_digits(info.image_data_bitwidth))?;
            tracing::info!(path = %path.display(), seed, "Wrote random source frame");
        }
        return Ok(frame);
    }

    let candidates: Vec<PathBuf> = non_empty(&info.image_path)
        .map(|p| resolve(base, p))
        .into_iter()
        .chain(random_path)
        .collect();

    let Some(path) = candidates.iter().find(|p| p.exists()) else {
        bail!("No source image found, tried {candidates:?}");
    };
    let pixels = pixel_text::read_file(path, Radix::Hex)?;
    let frame = params
        .frame(pixels)
        .with_context(|| format!("Source image {} does not match registers", path.display()))?;
    tracing::info!(path = %path.display(), "Read source frame");
    Ok(frame)
}

pub fn process(
    input: &Path,
    output: &Path,
    config: FrameConfig,
    bits: u32,
    radix: Radix,
) -> Result<ExitCode> {
    let params = config.validate()?;
    let pixels = pixel_text::read_file(input, radix)?;
    let image = params
        .frame(pixels)
        .with_context(|| format!("Input {} does not match frame size", input.display()))?;

    let result = dpc::correct_frame(&image, params.dpc)?;
    pixel_text::write_file(output, &result.image, hex_digits(bits))?;

    println!(
        "{}x{} frame, {} defective pixels corrected -> {}",
        params.width,
        params.height,
        result.defect_count,
        output.display()
    );
    Ok(ExitCode::SUCCESS)
}

pub fn generate(
    output: &Path,
    width: usize,
    height: usize,
    bits: u32,
    seed: u64,
    defects: usize,
) -> Result<ExitCode> {
    if width.checked_mul(height).is_none() {
        bail!("Frame {width}x{height} is too large");
    }
    let mut frame = random_frame(width, height, bits, seed)?;
    let injected = inject_defects(&mut frame, defects, bits, seed.wrapping_add(1))?;
    pixel_text::write_file(output, &frame, hex_digits(bits))?;

    println!(
        "{width}x{height} {bits}-bit frame with {} injected defects -> {}",
        injected.len(),
        output.display()
    );
    for defect in &injected {
        tracing::debug!(x = defect.x, y = defect.y, kind = ?defect.kind, "Injected defect");
    }
    Ok(ExitCode::SUCCESS)
}

pub fn crop(
    input: &Path,
    output: &Path,
    (width, height): (usize, usize),
    window: CropWindow,
    bits: u32,
    radix: Radix,
) -> Result<ExitCode> {
    let Some(expected) = width.checked_mul(height) else {
        bail!("Frame {width}x{height} is too large");
    };
    let pixels = pixel_text::read_file(input, radix)?;
    if pixels.len() != expected {
        bail!(
            "Input {} has {} pixels, expected {width}x{height}",
            input.display(),
            pixels.len()
        );
    }
    let image = Buffer2::new(width, height, pixels);
    let cropped = window.apply(&image)?;
    pixel_text::write_file(output, &cropped, hex_digits(bits))?;

    println!(
        "Cropped {width}x{height} to {}x{} -> {}",
        cropped.width(),
        cropped.height(),
        output.display()
    );
    Ok(ExitCode::SUCCESS)
}

pub fn compare(expected: &Path, actual: &Path, radix: Radix, show: usize) -> Result<ExitCode> {
    let report = compare_files(expected, actual, radix)?;
    print_report(&report, show);
    Ok(exit_code(report.is_identical()))
}

pub fn compare_outputs(config_path: &Path) -> Result<ExitCode> {
    let config = SimConfig::load(config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;
    let base = config_dir(config_path);

    let pairs = config.output_info.comparison_pairs();
    if pairs.is_empty() {
        bail!("No alg_*/hls_* output pairs in {}", config_path.display());
    }

    let mut all_identical = true;
    for (stage, alg, hls) in pairs {
        let (alg, hls) = (resolve(&base, alg), resolve(&base, hls));
        println!("[{stage}] {} vs {}", alg.display(), hls.display());
        match compare_files(&alg, &hls, Radix::Hex) {
            Ok(report) => {
                print_report(&report, 10);
                all_identical &= report.is_identical();
            }
            Err(e) => {
                tracing::warn!(stage, error = %e, "Comparison skipped");
                println!("  unable to compare: {e:#}");
                all_identical = false;
            }
        }
    }

    Ok(exit_code(all_identical))
}

pub fn registers(
    table: Option<&Path>,
    config: Option<&Path>,
    csv: bool,
    format: Option<SerdeFormat>,
) -> Result<ExitCode> {
    let info = match (table, config) {
        (Some(path), _) => load_register_table(path)?,
        (None, Some(path)) => SimConfig::load(path)?.register_info,
        (None, None) => bail!("Pass --table or --config"),
    };

    if let Some(format) = format {
        let text = format
            .serialize(&info)
            .context("Failed to serialize registers")?;
        println!("{}", text.trim_end());
    } else if csv {
        print!("{}", format_register_table(&info));
    } else {
        print_registers(&info);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_registers(info: &RegisterInfo) {
    println!("Registers ({}):", info.len());
    for (name, reg) in info.iter() {
        if reg.reg_bit_width == 1 {
            println!("  {name:>30}            = {:>8}", reg.value());
        } else {
            println!(
                "  {name:>30}[{:>4}:{:>4}] = {:>8} (range: {:>8} ~ {:>8})",
                reg.reg_bit_width.saturating_sub(1),
                0,
                reg.value(),
                reg.reg_value_min,
                reg.reg_value_max
            );
        }
    }
}

fn compare_files(expected: &Path, actual: &Path, radix: Radix) -> Result<CompareReport> {
    let expected = pixel_text::read_file(expected, radix)?;
    let actual = pixel_text::read_file(actual, radix)?;
    Ok(dpc::compare(&expected, &actual))
}

fn print_report(report: &CompareReport, show: usize) {
    if report.is_identical() {
        println!("  identical ({} pixels)", report.expected_len);
        return;
    }
    if !report.length_matches() {
        println!(
            "  length differs: expected {} pixels, actual {}",
            report.expected_len, report.actual_len
        );
    }
    if !report.mismatches.is_empty() {
        println!("  {} mismatching pixels", report.mismatches.len());
        for m in report.mismatches.iter().take(show) {
            println!(
                "    [{}] expected {:#06x}, actual {:#06x}",
                m.index, m.expected, m.actual
            );
        }
    }
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn config_dir(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn non_empty(path: &Path) -> Option<&Path> {
    (!path.as_os_str().is_empty()).then_some(path)
}
