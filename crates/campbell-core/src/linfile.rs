// ─────────────────────────────────────────────────────────────────────
// Campbell Core — Linearization Files
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Reader for `.lin` linearization files.
//!
//! Layout: a header of named scalars (ends at `Jacobians included`), the
//! descriptor blocks for states, state derivatives, inputs and outputs
//! (end at `Linearized state matrices:` or `Jacobian matrices:`), then
//! named dense matrices introduced by `NAME: rows x cols`.
//!
//! Files are grouped into operating points by the base name in front of
//! the `.N.lin` suffix.

use campbell_types::constants::TWO_PI;
use campbell_types::error::{CampbellError, CampbellResult};
use campbell_types::snapshot::{Descriptor, OperatingPointGroup, Snapshot};
use ndarray::Array2;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static LIN_FILE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+)\.(\d+)\.lin$").unwrap_or_else(|e| panic!("lin file pattern: {e}"))
});

// ── Parser state ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    States,
    StateRates,
    DiscreteStates,
    Inputs,
    Outputs,
}

impl Block {
    fn from_heading(line: &str) -> Option<Self> {
        match line {
            "Order of continuous states:" => Some(Block::States),
            "Order of continuous state derivatives:" => Some(Block::StateRates),
            "Order of discrete states:" => Some(Block::DiscreteStates),
            "Order of inputs:" => Some(Block::Inputs),
            "Order of outputs:" => Some(Block::Outputs),
            _ => None,
        }
    }

    fn default_order(self) -> u8 {
        match self {
            Block::States | Block::StateRates | Block::DiscreteStates => 2,
            Block::Inputs | Block::Outputs => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Descriptors,
    Matrices,
}

struct Parser<'a> {
    source: &'a str,
    line_no: usize,
}

impl Parser<'_> {
    fn error(&self, message: impl Into<String>) -> CampbellError {
        CampbellError::Parse {
            source_name: self.source.to_string(),
            line: self.line_no,
            message: message.into(),
        }
    }

    fn field<'f>(&self, fields: &[&'f str], at: usize, what: &str) -> CampbellResult<&'f str> {
        fields
            .get(at)
            .copied()
            .ok_or_else(|| self.error(format!("missing value for {what}")))
    }

    fn float(&self, text: &str, what: &str) -> CampbellResult<f64> {
        text.parse::<f64>()
            .map_err(|e| self.error(format!("{what}: '{text}' is not a number ({e})")))
    }

    fn count(&self, text: &str, what: &str) -> CampbellResult<usize> {
        text.parse::<usize>()
            .map_err(|e| self.error(format!("{what}: '{text}' is not a count ({e})")))
    }

    fn flag(&self, text: &str) -> CampbellResult<bool> {
        match text {
            "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
            "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
            other => Err(self.error(format!("rotating-frame flag '{other}' is not a boolean"))),
        }
    }

    /// One descriptor row; `None` when the first column is not an index.
    fn descriptor(
        &self,
        fields: &[&str],
        default_order: u8,
        has_order: bool,
    ) -> CampbellResult<Option<Descriptor>> {
        let Some(index) = fields.first().and_then(|f| f.parse::<usize>().ok()) else {
            return Ok(None);
        };
        if index == 0 {
            return Err(self.error("descriptor indices are 1-based"));
        }
        let mut rest = &fields[1..];

        let mut value_text = self.field(rest, 0, "descriptor value")?;
        rest = &rest[1..];
        if value_text.contains(',') {
            // Orientation triple "a, b, c": keep the first component
            value_text = value_text.trim_matches(',');
            rest = rest.get(2..).ok_or_else(|| self.error("truncated orientation value"))?;
        }
        let value = self.float(value_text, "descriptor value")?;

        let rotating = self.flag(self.field(rest, 0, "rotating-frame flag")?)?;
        rest = &rest[1..];

        let mut derivative_order = default_order;
        if has_order {
            let text = self.field(rest, 0, "derivative order")?;
            derivative_order = text
                .parse::<u8>()
                .map_err(|e| self.error(format!("derivative order '{text}': {e}")))?;
            rest = &rest[1..];
        }

        Ok(Some(Descriptor {
            index: index - 1,
            value,
            rotating,
            derivative_order,
            label: rest.join(" "),
        }))
    }
}

struct MatrixFill {
    name: String,
    data: Array2<f64>,
    row: usize,
    opened_at: usize,
}

// ── Public API ───────────────────────────────────────────────────────

/// Parse the text of one linearization file. `source` names it in errors.
pub fn parse_lin(source: &str, text: &str) -> CampbellResult<Snapshot> {
    let mut p = Parser { source, line_no: 0 };

    let mut sim_time = 0.0;
    let mut rotor_speed = 0.0;
    let mut azimuth = 0.0;
    let mut wind_speed = 0.0;
    let (mut num_x, mut num_xd, mut num_z, mut num_u, mut num_y) = (0, 0, 0, 0, 0);

    let mut states = Vec::new();
    let mut state_rates = Vec::new();
    let mut discrete = Vec::new();
    let mut inputs = Vec::new();
    let mut outputs = Vec::new();
    let mut block: Option<Block> = None;
    let mut has_order = false;

    let mut matrices: BTreeMap<String, Array2<f64>> = BTreeMap::new();
    let mut current: Option<MatrixFill> = None;

    let mut section = Section::Header;
    for (i, raw) in text.lines().enumerate() {
        p.line_no = i + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();

        match section {
            Section::Header => {
                if line.starts_with("Simulation time") {
                    sim_time = p.float(p.field(&fields, 2, "simulation time")?, "simulation time")?;
                } else if line.starts_with("Rotor Speed") {
                    rotor_speed = p.float(p.field(&fields, 2, "rotor speed")?, "rotor speed")?;
                } else if line.starts_with("Azimuth") {
                    azimuth = p
                        .float(p.field(&fields, 1, "azimuth")?, "azimuth")?
                        .rem_euclid(TWO_PI);
                } else if line.starts_with("Wind Speed") {
                    wind_speed = p.float(p.field(&fields, 2, "wind speed")?, "wind speed")?;
                } else if line.starts_with("Number of continuous states") {
                    num_x = p.count(p.field(&fields, 4, "state count")?, "state count")?;
                } else if line.starts_with("Number of discrete states") {
                    num_xd = p.count(p.field(&fields, 4, "discrete count")?, "discrete count")?;
                } else if line.starts_with("Number of constraint states") {
                    num_z = p.count(p.field(&fields, 4, "constraint count")?, "constraint count")?;
                } else if line.starts_with("Number of inputs") {
                    num_u = p.count(p.field(&fields, 3, "input count")?, "input count")?;
                } else if line.starts_with("Number of outputs") {
                    num_y = p.count(p.field(&fields, 3, "output count")?, "output count")?;
                } else if line.starts_with("Jacobians included") {
                    section = Section::Descriptors;
                }
            }
            Section::Descriptors => {
                if let Some(b) = Block::from_heading(line) {
                    block = Some(b);
                    continue;
                }
                if line.contains("Operating Point") {
                    has_order = line.contains("Derivative Order");
                    continue;
                }
                if line == "Linearized state matrices:" || line == "Jacobian matrices:" {
                    section = Section::Matrices;
                    continue;
                }
                let Some(b) = block else {
                    continue;
                };
                if let Some(desc) = p.descriptor(&fields, b.default_order(), has_order)? {
                    match b {
                        Block::States => states.push(desc),
                        Block::StateRates => state_rates.push(desc),
                        Block::DiscreteStates => discrete.push(desc),
                        Block::Inputs => inputs.push(desc),
                        Block::Outputs => outputs.push(desc),
                    }
                }
            }
            Section::Matrices => {
                if fields.len() == 4 && fields[2] == "x" {
                    if let Some(done) = current.take() {
                        finish_matrix(&p, done, &mut matrices)?;
                    }
                    let rows = p.count(fields[1], "matrix rows")?;
                    let cols = p.count(fields[3], "matrix columns")?;
                    current = Some(MatrixFill {
                        name: fields[0].trim_end_matches(':').to_string(),
                        data: Array2::zeros((rows, cols)),
                        row: 0,
                        opened_at: p.line_no,
                    });
                    continue;
                }
                let fill = current
                    .as_mut()
                    .ok_or_else(|| p.error("matrix data before any matrix heading"))?;
                let (rows, cols) = fill.data.dim();
                if fill.row >= rows {
                    return Err(p.error(format!("matrix {} has more than {rows} rows", fill.name)));
                }
                if fields.len() != cols {
                    return Err(p.error(format!(
                        "matrix {} row {} has {} values, expected {cols}",
                        fill.name,
                        fill.row + 1,
                        fields.len()
                    )));
                }
                for (j, text) in fields.iter().enumerate() {
                    fill.data[[fill.row, j]] = p.float(text, "matrix entry")?;
                }
                fill.row += 1;
            }
        }
    }
    if let Some(done) = current.take() {
        finish_matrix(&p, done, &mut matrices)?;
    }

    if section == Section::Header {
        return Err(p.error("header never reached 'Jacobians included'"));
    }
    if discrete.len() != num_xd {
        return Err(CampbellError::CountMismatch {
            context: format!("{source} (discrete state descriptors)"),
            expected: num_xd,
            found: discrete.len(),
        });
    }
    if !discrete.is_empty() {
        tracing::debug!(source, count = discrete.len(), "discrete states ignored");
    }

    let a = match matrices.remove("A") {
        Some(a) => a,
        None if num_x == 0 => Array2::zeros((0, 0)),
        None => return Err(p.error("missing A matrix")),
    };
    let b = matrices.remove("B").unwrap_or_else(|| Array2::zeros((num_x, num_u)));
    let c = matrices.remove("C").unwrap_or_else(|| Array2::zeros((num_y, num_x)));
    let d = matrices.remove("D").unwrap_or_else(|| Array2::zeros((num_y, num_u)));

    let snapshot = Snapshot {
        source: source.to_string(),
        sim_time,
        rotor_speed,
        azimuth,
        wind_speed,
        num_states: num_x,
        num_discrete_states: num_xd,
        num_constraint_states: num_z,
        num_inputs: num_u,
        num_outputs: num_y,
        states,
        state_rates,
        inputs,
        outputs,
        a,
        b,
        c,
        d,
    };
    snapshot.validate()?;
    tracing::debug!(
        source,
        states = num_x,
        inputs = num_u,
        outputs = num_y,
        azimuth,
        "parsed linearization file"
    );
    Ok(snapshot)
}

fn finish_matrix(
    p: &Parser<'_>,
    fill: MatrixFill,
    out: &mut BTreeMap<String, Array2<f64>>,
) -> CampbellResult<()> {
    let rows = fill.data.nrows();
    if fill.row != rows {
        return Err(CampbellError::Parse {
            source_name: p.source.to_string(),
            line: fill.opened_at,
            message: format!("matrix {} has {} of {rows} rows", fill.name, fill.row),
        });
    }
    out.insert(fill.name, fill.data);
    Ok(())
}

/// Read and parse one file.
pub fn read_lin_file(path: impl AsRef<Path>) -> CampbellResult<Snapshot> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    parse_lin(&name, &text)
}

/// Split `name.N.lin` into `(name, N)`.
pub fn split_lin_name(file_name: &str) -> Option<(&str, u32)> {
    let caps = LIN_FILE_NAME.captures(file_name)?;
    let base = caps.get(1)?.as_str();
    let step = caps.get(2)?.as_str().parse().ok()?;
    Some((base, step))
}

/// Files of one operating point, ordered by their numeric suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinFileGroup {
    pub name: String,
    pub files: Vec<PathBuf>,
}

impl LinFileGroup {
    /// Parse every file and build the operating-point group.
    pub fn load(&self) -> CampbellResult<OperatingPointGroup> {
        let snapshots = self
            .files
            .iter()
            .map(read_lin_file)
            .collect::<CampbellResult<Vec<_>>>()?;
        OperatingPointGroup::new(self.name.clone(), snapshots)
    }
}

/// Group paths by base name. Paths not ending in `.N.lin` are skipped.
pub fn group_lin_files<P: AsRef<Path>>(paths: &[P]) -> Vec<LinFileGroup> {
    let mut groups: BTreeMap<String, Vec<(u32, PathBuf)>> = BTreeMap::new();
    for path in paths {
        let path = path.as_ref();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        match split_lin_name(file_name) {
            Some((base, step)) => groups
                .entry(base.to_string())
                .or_default()
                .push((step, path.to_path_buf())),
            None => tracing::debug!(path = %path.display(), "not a linearization file"),
        }
    }
    groups
        .into_iter()
        .map(|(name, mut files)| {
            files.sort_by_key(|(step, _)| *step);
            LinFileGroup {
                name,
                files: files.into_iter().map(|(_, p)| p).collect(),
            }
        })
        .collect()
}

/// List the operating-point groups of `.lin` files directly inside `dir`.
pub fn discover_groups(dir: impl AsRef<Path>) -> CampbellResult<Vec<LinFileGroup>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    let groups = group_lin_files(paths.as_slice());
    tracing::info!(
        dir = %dir.as_ref().display(),
        groups = groups.len(),
        files = groups.iter().map(|g| g.files.len()).sum::<usize>(),
        "discovered linearization files"
    );
    Ok(groups)
}

/// Write a snapshot in the layout [`parse_lin`] reads.
pub fn format_lin(snap: &Snapshot) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    let _ = writeln!(out, "Linearized model: {}", snap.source);
    let _ = writeln!(out);
    let _ = writeln!(out, "Simulation information:");
    let _ = writeln!(out, "Simulation time:            {:.4} s", snap.sim_time);
    let _ = writeln!(out, "Rotor Speed:                {:.6e} rad/s", snap.rotor_speed);
    let _ = writeln!(out, "Azimuth:                    {:.6e} rad", snap.azimuth);
    let _ = writeln!(out, "Wind Speed:                 {:.6e} m/s", snap.wind_speed);
    let _ = writeln!(out, "Number of continuous states: {}", snap.num_states);
    let _ = writeln!(out, "Number of discrete states:   {}", snap.num_discrete_states);
    let _ = writeln!(out, "Number of constraint states: {}", snap.num_constraint_states);
    let _ = writeln!(out, "Number of inputs:            {}", snap.num_inputs);
    let _ = writeln!(out, "Number of outputs:           {}", snap.num_outputs);
    let _ = writeln!(out, "Jacobians included in this file? No");
    let _ = writeln!(out);

    let blocks = [
        ("Order of continuous states:", &snap.states, true),
        ("Order of continuous state derivatives:", &snap.state_rates, true),
        ("Order of inputs:", &snap.inputs, false),
        ("Order of outputs:", &snap.outputs, false),
    ];
    for (heading, descs, with_order) in blocks {
        if descs.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{heading}");
        if with_order {
            let _ = writeln!(
                out,
                "   Row/Column     Operating Point Value     Rotating Frame?   Derivative Order   Description"
            );
        } else {
            let _ = writeln!(out, "   Row/Column     Operating Point Value     Rotating Frame?   Description");
        }
        for d in descs.iter() {
            let rot = if d.rotating { "T" } else { "F" };
            if with_order {
                let _ = writeln!(
                    out,
                    "   {:>4}   {:>16.8e}   {rot}   {}   {}",
                    d.index + 1,
                    d.value,
                    d.derivative_order,
                    d.label
                );
            } else {
                let _ = writeln!(out, "   {:>4}   {:>16.8e}   {rot}   {}", d.index + 1, d.value, d.label);
            }
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "Linearized state matrices:");
    let _ = writeln!(out);
    for (name, m) in [("A", &snap.a), ("B", &snap.b), ("C", &snap.c), ("D", &snap.d)] {
        let (rows, cols) = m.dim();
        if rows == 0 || cols == 0 {
            continue;
        }
        let _ = writeln!(out, "{name}: {rows} x {cols}");
        for row in m.rows() {
            let cells: Vec<String> = row.iter().map(|v| format!("{v:.17e}")).collect();
            let _ = writeln!(out, " {}", cells.join("  "));
        }
        let _ = writeln!(out);
    }
    out
}
