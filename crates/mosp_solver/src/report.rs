//! Result-file codec.
//!
//! A solver writes a fixed ten-line header followed by `num_solutions` blocks of
//! exactly three lines:
//!
//! ```text
//! <caption>
//! n_generated: <int>
//! n_expanded: <int>
//! n_domCheck: <int>
//! rt_initHeu: <float>
//! rt_search: <float>
//! timeout: <0|1>
//! num_nondom_labels_max: <float>
//! num_nondom_labels_avg: <float>
//! num_solutions: <int>
//! label: <id>
//! [<c1>,<c2>,...,<ck>]
//! <v1> <v2> ... <vn>
//! ```
//!
//! Decoding is positional. Line counts and header labels are checked before any
//! block is read, so a format drift surfaces as [`SolverError::MalformedReport`]
//! instead of a shifted parse.

use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::{SolverError, SolverResult, line_writer::LineWriter};

pub const HEADER_LINES: usize = 10;
pub const BLOCK_LINES: usize = 3;

const DEFAULT_CAPTION: &str = "result";
const SOLUTION_LABEL: &str = "label";
const IN_MEMORY_ORIGIN: &str = "<text>";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldKind {
    /// Free text, not decoded.
    Caption,
    Count,
    Seconds,
    Flag,
    Ratio,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HeaderField {
    pub label: &'static str,
    pub kind: FieldKind,
}

impl HeaderField {
    const fn new(label: &'static str, kind: FieldKind) -> Self {
        Self { label, kind }
    }
}

/// Ordered header schema; the index of each entry is its line number.
pub const REPORT_HEADER: [HeaderField; HEADER_LINES] = [
    HeaderField::new("", FieldKind::Caption),
    HeaderField::new("n_generated", FieldKind::Count),
    HeaderField::new("n_expanded", FieldKind::Count),
    HeaderField::new("n_domCheck", FieldKind::Count),
    HeaderField::new("rt_initHeu", FieldKind::Seconds),
    HeaderField::new("rt_search", FieldKind::Seconds),
    HeaderField::new("timeout", FieldKind::Flag),
    HeaderField::new("num_nondom_labels_max", FieldKind::Ratio),
    HeaderField::new("num_nondom_labels_avg", FieldKind::Ratio),
    HeaderField::new("num_solutions", FieldKind::Count),
];

const N_GENERATED: usize = 1;
const N_EXPANDED: usize = 2;
const N_DOM_CHECK: usize = 3;
const RT_INIT_HEU: usize = 4;
const RT_SEARCH: usize = 5;
const TIMEOUT: usize = 6;
const NONDOM_MAX: usize = 7;
const NONDOM_AVG: usize = 8;
const NUM_SOLUTIONS: usize = 9;

/// One Pareto-optimal solution: its cost vector and vertex sequence.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Solution {
    pub cost: Vec<i64>,
    pub path: Vec<u64>,
}

impl Solution {
    pub fn new(cost: Vec<i64>, path: Vec<u64>) -> Self {
        Self { cost, path }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunReport {
    pub caption: String,
    pub n_generated: u64,
    pub n_expanded: u64,
    pub n_dom_check: u64,
    pub rt_init_heu: f64,
    pub rt_search: f64,
    pub timeout: bool,
    pub num_nondom_labels_max: f64,
    pub num_nondom_labels_avg: f64,
    pub num_solutions: usize,
    /// Solutions keyed by the id from their `label:` line.
    pub solutions: BTreeMap<u64, Solution>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self {
            caption: DEFAULT_CAPTION.to_string(),
            n_generated: 0,
            n_expanded: 0,
            n_dom_check: 0,
            rt_init_heu: 0.0,
            rt_search: 0.0,
            timeout: false,
            num_nondom_labels_max: 0.0,
            num_nondom_labels_avg: 0.0,
            num_solutions: 0,
            solutions: BTreeMap::new(),
        }
    }
}

impl RunReport {
    pub fn from_file(file_path: impl AsRef<Path>) -> SolverResult<Self> {
        let file_path = file_path.as_ref();
        let text = fs::read_to_string(file_path)?;
        decode(&text, file_path)
    }

    pub fn from_text(text: &str) -> SolverResult<Self> {
        decode(text, Path::new(IN_MEMORY_ORIGIN))
    }

    pub fn write_to_file(&self, file_path: impl Into<PathBuf>) -> SolverResult<()> {
        fs::write(file_path.into(), self.to_string()).map_err(SolverError::Io)
    }

    /// Adds a solution and keeps `num_solutions` in sync.
    pub fn push_solution(&mut self, id: u64, solution: Solution) {
        self.solutions.insert(id, solution);
        self.num_solutions = self.solutions.len();
    }

    pub fn cost(&self, id: u64) -> Option<&[i64]> {
        self.solutions.get(&id).map(|s| s.cost.as_slice())
    }

    pub fn path(&self, id: u64) -> Option<&[u64]> {
        self.solutions.get(&id).map(|s| s.path.as_slice())
    }
}

fn decode(text: &str, origin: &Path) -> SolverResult<RunReport> {
    let mut lines: Vec<&str> = text.lines().collect();
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }

    if lines.len() < HEADER_LINES {
        return Err(SolverError::malformed(
            origin,
            format!(
                "expected {HEADER_LINES} header lines, found {}",
                lines.len()
            ),
        ));
    }

    let (header, body) = lines.split_at(HEADER_LINES);
    let values = header_values(header, origin)?;

    let num_solutions: usize = parse_value(&values, NUM_SOLUTIONS, origin)?;
    let expected = num_solutions
        .checked_mul(BLOCK_LINES)
        .ok_or_else(|| SolverError::malformed(origin, "num_solutions overflows"))?;
    if body.len() != expected {
        return Err(SolverError::malformed(
            origin,
            format!(
                "num_solutions is {num_solutions}, expecting {expected} block lines after the header, found {}",
                body.len()
            ),
        ));
    }

    let mut report = RunReport {
        caption: header[0].to_string(),
        n_generated: parse_value(&values, N_GENERATED, origin)?,
        n_expanded: parse_value(&values, N_EXPANDED, origin)?,
        n_dom_check: parse_value(&values, N_DOM_CHECK, origin)?,
        rt_init_heu: parse_value(&values, RT_INIT_HEU, origin)?,
        rt_search: parse_value(&values, RT_SEARCH, origin)?,
        timeout: parse_value::<i64>(&values, TIMEOUT, origin)? != 0,
        num_nondom_labels_max: parse_value(&values, NONDOM_MAX, origin)?,
        num_nondom_labels_avg: parse_value(&values, NONDOM_AVG, origin)?,
        num_solutions,
        solutions: BTreeMap::new(),
    };

    for (block_idx, block) in body.chunks_exact(BLOCK_LINES).enumerate() {
        let line_no = HEADER_LINES + block_idx * BLOCK_LINES;
        let id = parse_solution_id(block[0], line_no, origin)?;
        let cost = parse_cost_vector(block[1], line_no + 1, origin)?;
        let path = parse_path(block[2], line_no + 2, origin)?;

        if report
            .solutions
            .insert(id, Solution::new(cost, path))
            .is_some()
        {
            return Err(SolverError::malformed(
                origin,
                format!("line {}: duplicate solution id {id}", line_no + 1),
            ));
        }
    }

    Ok(report)
}

/// Splits every non-caption header line into its value, checking the label against
/// [`REPORT_HEADER`].
fn header_values<'a>(header: &[&'a str], origin: &Path) -> SolverResult<[&'a str; HEADER_LINES]> {
    let mut values = [""; HEADER_LINES];

    for (idx, (line, field)) in header.iter().zip(REPORT_HEADER.iter()).enumerate() {
        if field.kind == FieldKind::Caption {
            continue;
        }
        let Some((label, value)) = line.split_once(':') else {
            return Err(SolverError::malformed(
                origin,
                format!(
                    "line {}: expected '{}: <value>', got '{line}'",
                    idx + 1,
                    field.label
                ),
            ));
        };
        if label.trim() != field.label {
            return Err(SolverError::malformed(
                origin,
                format!(
                    "line {}: expected label '{}', got '{}'",
                    idx + 1,
                    field.label,
                    label.trim()
                ),
            ));
        }
        values[idx] = value.trim();
    }

    Ok(values)
}

fn parse_value<T>(values: &[&str; HEADER_LINES], idx: usize, origin: &Path) -> SolverResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = values[idx];
    raw.parse::<T>().map_err(|e| {
        SolverError::malformed(
            origin,
            format!(
                "line {}: bad {} value '{raw}': {e}",
                idx + 1,
                REPORT_HEADER[idx].label
            ),
        )
    })
}

fn parse_solution_id(line: &str, line_no: usize, origin: &Path) -> SolverResult<u64> {
    let Some((_, raw)) = line.split_once(':') else {
        return Err(SolverError::malformed(
            origin,
            format!("line {}: expected '{SOLUTION_LABEL}: <id>', got '{line}'", line_no + 1),
        ));
    };
    let raw = raw.trim();
    raw.parse::<u64>().map_err(|e| {
        SolverError::malformed(
            origin,
            format!("line {}: bad solution id '{raw}': {e}", line_no + 1),
        )
    })
}

/// `[3,5]`, `[3,5,]` and `[3.0e0,5.9]` all decode to `[3, 5]`: each entry goes through
/// `f64` and is truncated toward zero.
fn parse_cost_vector(line: &str, line_no: usize, origin: &Path) -> SolverResult<Vec<i64>> {
    let trimmed = line.trim();
    let Some(inner) = trimmed.strip_prefix('[') else {
        return Err(SolverError::malformed(
            origin,
            format!("line {}: cost vector must start with '[', got '{line}'", line_no + 1),
        ));
    };
    let inner = inner.trim_end();
    let inner = inner.strip_suffix(']').unwrap_or(inner);

    let cost = inner
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            let value = token.parse::<f64>().map_err(|e| {
                SolverError::malformed(
                    origin,
                    format!("line {}: bad cost entry '{token}': {e}", line_no + 1),
                )
            })?;
            if !value.is_finite() {
                return Err(SolverError::malformed(
                    origin,
                    format!("line {}: non-finite cost entry '{token}'", line_no + 1),
                ));
            }
            Ok(value.trunc() as i64)
        })
        .collect::<SolverResult<Vec<_>>>()?;

    if cost.is_empty() {
        return Err(SolverError::malformed(
            origin,
            format!("line {}: empty cost vector", line_no + 1),
        ));
    }
    Ok(cost)
}

/// The solver ends the vertex list with a separator; tokens are whitespace-delimited so
/// the empty trailing token never reaches the parser.
fn parse_path(line: &str, line_no: usize, origin: &Path) -> SolverResult<Vec<u64>> {
    line.split_whitespace()
        .map(|token| {
            token.parse::<u64>().map_err(|e| {
                SolverError::malformed(
                    origin,
                    format!("line {}: bad path vertex '{token}': {e}", line_no + 1),
                )
            })
        })
        .collect()
}

impl Display for RunReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut writer = LineWriter::new(f);

        writer.line(&self.caption)?;
        writer.kv_colon(REPORT_HEADER[N_GENERATED].label, self.n_generated)?;
        writer.kv_colon(REPORT_HEADER[N_EXPANDED].label, self.n_expanded)?;
        writer.kv_colon(REPORT_HEADER[N_DOM_CHECK].label, self.n_dom_check)?;
        writer.kv_colon(REPORT_HEADER[RT_INIT_HEU].label, self.rt_init_heu)?;
        writer.kv_colon(REPORT_HEADER[RT_SEARCH].label, self.rt_search)?;
        writer.kv_colon(REPORT_HEADER[TIMEOUT].label, u8::from(self.timeout))?;
        writer.kv_colon(REPORT_HEADER[NONDOM_MAX].label, self.num_nondom_labels_max)?;
        writer.kv_colon(REPORT_HEADER[NONDOM_AVG].label, self.num_nondom_labels_avg)?;
        writer.kv_colon(REPORT_HEADER[NUM_SOLUTIONS].label, self.solutions.len())?;

        for (id, solution) in &self.solutions {
            writer.kv_colon(SOLUTION_LABEL, id)?;
            writer.bracketed(&solution.cost)?;
            writer.trailing_row(&solution.path)?;
        }

        Ok(())
    }
}
