//! Register configuration: the simulator's JSON config file and the CSV register table.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use common::SerdeFormat;

use crate::config::FrameConfig;
use crate::crop::CropWindow;
use crate::error::{Error, Result};

pub const REG_IMAGE_WIDTH: &str = "reg_image_width";
pub const REG_IMAGE_HEIGHT: &str = "reg_image_height";
pub const REG_DPC_ENABLE: &str = "reg_dpc_enable";
pub const REG_DPC_THRESHOLD: &str = "reg_dpc_threshold";
pub const REG_CROP_ENABLE: &str = "reg_crop_enable";
pub const REG_CROP_START_X: &str = "reg_crop_start_x";
pub const REG_CROP_START_Y: &str = "reg_crop_start_y";
pub const REG_CROP_END_X: &str = "reg_crop_end_x";
pub const REG_CROP_END_Y: &str = "reg_crop_end_y";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Register {
    pub reg_bit_width: u32,
    #[serde(default)]
    pub reg_initial_value: Vec<i64>,
    pub reg_value_min: i64,
    pub reg_value_max: i64,
}

impl Register {
    pub fn new(bit_width: u32, value: i64, min: i64, max: i64) -> Self {
        Self {
            reg_bit_width: bit_width,
            reg_initial_value: vec![value],
            reg_value_min: min,
            reg_value_max: max,
        }
    }

    /// First initial value, 0 when none is given.
    pub fn value(&self) -> i64 {
        self.reg_initial_value.first().copied().unwrap_or(0)
    }

    /// [`Register::value`], rejected when outside `[min, max]`.
    ///
    /// A register whose bounds are inverted is treated as unbounded.
    pub fn checked_value(&self, name: &str) -> Result<i64> {
        let value = self.value();
        let (min, max) = (self.reg_value_min, self.reg_value_max);
        if min <= max && !(min..=max).contains(&value) {
            return Err(Error::RegisterOutOfRange {
                name: name.to_string(),
                value,
                min,
                max,
            });
        }
        Ok(value)
    }
}

/// Named registers, in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegisterInfo {
    registers: BTreeMap<String, Register>,
}

impl RegisterInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, register: Register) {
        self.registers.insert(name.into(), register);
    }

    pub fn get(&self, name: &str) -> Option<&Register> {
        self.registers.get(name)
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Register)> {
        self.registers.iter().map(|(name, reg)| (name.as_str(), reg))
    }

    /// Range-checked value of a required register.
    pub fn value(&self, name: &str) -> Result<i64> {
        self.get(name)
            .ok_or_else(|| Error::MissingRegister {
                name: name.to_string(),
            })?
            .checked_value(name)
    }

    /// Range-checked value of an optional register.
    pub fn value_or(&self, name: &str, default: i64) -> Result<i64> {
        match self.get(name) {
            Some(register) => register.checked_value(name),
            None => Ok(default),
        }
    }

    /// DPC frame configuration; dimensions are those of the source frame.
    pub fn frame_config(&self) -> Result<FrameConfig> {
        Ok(FrameConfig::new(
            self.value(REG_IMAGE_WIDTH)?,
            self.value(REG_IMAGE_HEIGHT)?,
            self.value(REG_DPC_ENABLE)? != 0,
            self.value(REG_DPC_THRESHOLD)?,
        ))
    }

    /// Crop window; disabled when the crop registers are absent.
    pub fn crop_window(&self) -> Result<CropWindow> {
        if self.value_or(REG_CROP_ENABLE, 0)? == 0 {
            return Ok(CropWindow::disabled());
        }
        Ok(CropWindow::new(
            self.value(REG_CROP_START_X)?,
            self.value(REG_CROP_START_Y)?,
            self.value(REG_CROP_END_X)?,
            self.value(REG_CROP_END_Y)?,
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    #[serde(default)]
    pub image_path: PathBuf,
    #[serde(default)]
    pub image_format: String,
    #[serde(default = "default_bit_width")]
    pub image_data_bitwidth: u32,
    /// Non-zero to generate a random source frame instead of reading one.
    #[serde(default)]
    pub generate_random_image: i64,
    #[serde(default)]
    pub random_image_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_bit_width() -> u32 {
    12
}

impl Default for ImageInfo {
    fn default() -> Self {
        Self {
            image_path: PathBuf::new(),
            image_format: String::new(),
            image_data_bitwidth: default_bit_width(),
            generate_random_image: 0,
            random_image_path: PathBuf::new(),
            seed: None,
        }
    }
}

impl ImageInfo {
    pub fn generates_random_image(&self) -> bool {
        self.generate_random_image != 0
    }
}

/// Output file paths keyed by name, e.g. `alg_dpc_output_file`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputInfo {
    files: BTreeMap<String, PathBuf>,
}

impl OutputInfo {
    pub const ALG_CROP_OUTPUT: &'static str = "alg_crop_output_file";
    pub const ALG_DPC_OUTPUT: &'static str = "alg_dpc_output_file";

    pub fn insert(&mut self, key: impl Into<String>, path: impl Into<PathBuf>) {
        self.files.insert(key.into(), path.into());
    }

    pub fn get(&self, key: &str) -> Option<&Path> {
        self.files.get(key).map(PathBuf::as_path)
    }

    pub fn alg_crop_output_file(&self) -> Option<&Path> {
        self.get(Self::ALG_CROP_OUTPUT)
    }

    pub fn alg_dpc_output_file(&self) -> Option<&Path> {
        self.get(Self::ALG_DPC_OUTPUT)
    }

    /// `(stage, alg_path, hls_path)` for every `alg_*` entry with an `hls_*` counterpart.
    pub fn comparison_pairs(&self) -> Vec<(&str, &Path, &Path)> {
        self.files
            .iter()
            .filter_map(|(key, alg)| {
                let stage = key.strip_prefix("alg_")?;
                let hls = self.files.get(&format!("hls_{stage}"))?;
                Some((stage, alg.as_path(), hls.as_path()))
            })
            .collect()
    }
}

/// Top-level simulator configuration (`vibe.json`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub image_info: ImageInfo,
    pub register_info: RegisterInfo,
    #[serde(default)]
    pub output_info: OutputInfo,
}

impl SimConfig {
    /// Loads a JSON or YAML config, picked by file extension.
    pub fn load(path: &Path) -> Result<Self> {
        let format = SerdeFormat::from_path(path).map_err(|source| Error::ConfigFormat {
            path: path.to_path_buf(),
            source,
        })?;
        let text = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = format
            .deserialize(&text)
            .map_err(|source| Error::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::info!(
            path = %path.display(),
            registers = config.register_info.len(),
            "Loaded simulator config"
        );
        Ok(config)
    }
}

const NAME_COLUMNS: &[&str] = &["reg_name"];
const BIT_WIDTH_COLUMNS: &[&str] = &["bit_width", "bitwidth", "reg_bit_width"];
const INITIAL_COLUMNS: &[&str] = &["initial_value", "reg_initial_value"];
const MIN_COLUMNS: &[&str] = &["cons_min", "min", "reg_value_min"];
const MAX_COLUMNS: &[&str] = &["cons_max", "max", "reg_value_max"];

/// Column positions in a register table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TableLayout {
    name: usize,
    bit_width: usize,
    initial: usize,
    min: usize,
    max: usize,
}

impl TableLayout {
    /// `index,reg_name,bit_width,initial_value,min,max`
    const POSITIONAL: Self = Self {
        name: 1,
        bit_width: 2,
        initial: 3,
        min: 4,
        max: 5,
    };

    /// Columns found by header name, or the positional layout when the header names none.
    fn from_header(header: &str) -> Self {
        let columns: Vec<String> = header
            .split(',')
            .map(|c| c.trim().to_ascii_lowercase())
            .collect();
        let find = |names: &[&str]| columns.iter().position(|c| names.contains(&c.as_str()));

        match (
            find(NAME_COLUMNS),
            find(BIT_WIDTH_COLUMNS),
            find(INITIAL_COLUMNS),
            find(MIN_COLUMNS),
            find(MAX_COLUMNS),
        ) {
            (Some(name), Some(bit_width), Some(initial), Some(min), Some(max)) => Self {
                name,
                bit_width,
                initial,
                min,
                max,
            },
            _ => Self::POSITIONAL,
        }
    }

    fn width(&self) -> usize {
        [self.name, self.bit_width, self.initial, self.min, self.max]
            .into_iter()
            .max()
            .unwrap_or(0)
            + 1
    }
}

/// Parses a register table. The first line is a header.
///
/// Integers may be decimal or `0x`-prefixed hex. The initial value column may
/// hold several space-separated values.
pub fn parse_register_table(text: &str) -> Result<RegisterInfo> {
    let mut lines = text.lines().enumerate();
    let layout = match lines.next() {
        Some((_, header)) => TableLayout::from_header(header),
        None => return Ok(RegisterInfo::new()),
    };

    let mut info = RegisterInfo::new();
    for (line_idx, line) in lines {
        let line_no = line_idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < layout.width() {
            return Err(Error::InvalidRegisterTable {
                line: line_no,
                reason: format!(
                    "expected {} columns, found {}",
                    layout.width(),
                    fields.len()
                ),
            });
        }

        let name = fields[layout.name];
        if name.is_empty() {
            return Err(Error::InvalidRegisterTable {
                line: line_no,
                reason: "empty register name".to_string(),
            });
        }

        let number = |column: usize, what: &str| {
            parse_int(fields[column]).ok_or_else(|| Error::InvalidRegisterTable {
                line: line_no,
                reason: format!("invalid {what} '{}'", fields[column]),
            })
        };

        let bit_width = number(layout.bit_width, "bit width")?;
        let bit_width = u32::try_from(bit_width).map_err(|_| Error::InvalidRegisterTable {
            line: line_no,
            reason: format!("invalid bit width '{bit_width}'"),
        })?;
        let initial = fields[layout.initial]
            .split_whitespace()
            .map(|token| {
                parse_int(token).ok_or_else(|| Error::InvalidRegisterTable {
                    line: line_no,
                    reason: format!("invalid initial value '{token}'"),
                })
            })
            .collect::<Result<Vec<i64>>>()?;

        info.insert(
            name,
            Register {
                reg_bit_width: bit_width,
                reg_initial_value: initial,
                reg_value_min: number(layout.min, "min")?,
                reg_value_max: number(layout.max, "max")?,
            },
        );
    }

    Ok(info)
}

pub fn load_register_table(path: &Path) -> Result<RegisterInfo> {
    let text = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let info = parse_register_table(&text)?;
    tracing::info!(path = %path.display(), registers = info.len(), "Loaded register table");
    Ok(info)
}

/// Renders `info` as a register table with a
/// `reg_name,bitwidth,initial_value,cons_min,cons_max` header.
pub fn format_register_table(info: &RegisterInfo) -> String {
    let mut out = String::from("reg_name,bitwidth,initial_value,cons_min,cons_max\n");
    for (name, reg) in info.iter() {
        let initial = reg
            .reg_initial_value
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str(&format!(
            "{name},{},{initial},{},{}\n",
            reg.reg_bit_width, reg.reg_value_min, reg.reg_value_max
        ));
    }
    out
}

fn parse_int(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let (radix, body) = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => (16, hex),
        None => (10, digits),
    };
    // `from_str_radix` takes its own sign; only the one stripped above is allowed.
    if body.starts_with(['+', '-']) {
        return None;
    }
    let magnitude = i64::from_str_radix(body, radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}
