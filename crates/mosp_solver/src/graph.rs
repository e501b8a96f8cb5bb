//! Edge-list (`.gr`) cost-layer files read by the solvers.
//!
//! ```text
//! c <comment lines>
//! p sp <num_vertices> <num_edges>
//! c <comment lines>
//! a <u> <v> <weight>
//! ```
//!
//! Vertex ids are 1-based. Each undirected edge is stored as two arcs.

use std::{
    collections::BTreeSet,
    fmt::{Display, Formatter},
    fs,
    path::{Path, PathBuf},
};

use crate::{SolverError, SolverResult, line_writer::LineWriter};

const COMMENT_TAG: &str = "c";
const PROBLEM_TAG: &str = "p";
const ARC_TAG: &str = "a";
const PROBLEM_KIND: &str = "sp";

/// One directed arc `a <from> <to> <weight>`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Arc {
    pub from: u64,
    pub to: u64,
    pub weight: u64,
}

impl Arc {
    pub const fn new(from: u64, to: u64, weight: u64) -> Self {
        Self { from, to, weight }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphFile {
    /// Comment lines before the problem line, without the `c ` prefix.
    pub header_comments: Vec<String>,
    pub num_vertices: usize,
    /// Edge count announced on the problem line.
    pub num_edges: usize,
    /// Comment lines after the problem line.
    pub trailer_comments: Vec<String>,
    pub arcs: Vec<Arc>,
}

impl GraphFile {
    pub fn new(num_vertices: usize, num_edges: usize) -> Self {
        Self {
            num_vertices,
            num_edges,
            ..Default::default()
        }
    }

    pub fn from_file(file_path: impl AsRef<Path>) -> SolverResult<Self> {
        let text = fs::read_to_string(file_path.as_ref())?;
        Self::from_text(&text)
    }

    pub fn from_text(text: &str) -> SolverResult<Self> {
        let mut graph = Self::default();
        let mut saw_problem = false;

        for (line_no, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }

            let (tag, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
            match tag {
                COMMENT_TAG => {
                    let comment = rest.trim().to_string();
                    if saw_problem {
                        graph.trailer_comments.push(comment);
                    } else {
                        graph.header_comments.push(comment);
                    }
                }
                PROBLEM_TAG => {
                    if saw_problem {
                        return Err(SolverError::invalid_data(format!(
                            "line {}: duplicate problem line",
                            line_no + 1
                        )));
                    }
                    let fields: Vec<&str> = rest.split_whitespace().collect();
                    let [kind, vertices, edges] = fields.as_slice() else {
                        return Err(SolverError::invalid_data(format!(
                            "line {}: expected 'p sp <vertices> <edges>', got '{line}'",
                            line_no + 1
                        )));
                    };
                    if *kind != PROBLEM_KIND {
                        return Err(SolverError::invalid_data(format!(
                            "line {}: unsupported problem kind '{kind}'",
                            line_no + 1
                        )));
                    }
                    graph.num_vertices = parse_field(vertices, "vertex count", line_no)?;
                    graph.num_edges = parse_field(edges, "edge count", line_no)?;
                    saw_problem = true;
                }
                ARC_TAG => {
                    if !saw_problem {
                        return Err(SolverError::invalid_data(format!(
                            "line {}: arc before problem line",
                            line_no + 1
                        )));
                    }
                    let fields: Vec<&str> = rest.split_whitespace().collect();
                    let [from, to, weight] = fields.as_slice() else {
                        return Err(SolverError::invalid_data(format!(
                            "line {}: expected 'a <u> <v> <weight>', got '{line}'",
                            line_no + 1
                        )));
                    };
                    let arc = Arc::new(
                        parse_field(from, "arc tail", line_no)?,
                        parse_field(to, "arc head", line_no)?,
                        parse_field(weight, "arc weight", line_no)?,
                    );
                    graph.check_vertex(arc.from, line_no)?;
                    graph.check_vertex(arc.to, line_no)?;
                    graph.arcs.push(arc);
                }
                other => {
                    return Err(SolverError::invalid_data(format!(
                        "line {}: unknown line tag '{other}'",
                        line_no + 1
                    )));
                }
            }
        }

        if !saw_problem {
            return Err(SolverError::invalid_data("missing problem line"));
        }

        Ok(graph)
    }

    pub fn write_to_file(&self, file_path: impl Into<PathBuf>) -> SolverResult<()> {
        fs::write(file_path.into(), self.to_string()).map_err(SolverError::Io)
    }

    /// Number of outgoing arcs per vertex, indexed by 1-based vertex id (slot 0 unused).
    /// Arcs with a tail past `num_vertices` are not counted.
    pub fn out_degrees(&self) -> Vec<usize> {
        let mut degrees = vec![0; self.num_vertices + 1];
        for arc in &self.arcs {
            if let Some(degree) = usize::try_from(arc.from)
                .ok()
                .and_then(|idx| degrees.get_mut(idx))
            {
                *degree += 1;
            }
        }
        degrees
    }

    /// Directed `(from, to)` pairs, sorted, ignoring weights.
    pub fn topology(&self) -> BTreeSet<(u64, u64)> {
        self.arcs.iter().map(|arc| (arc.from, arc.to)).collect()
    }

    fn check_vertex(&self, id: u64, line_no: usize) -> SolverResult<()> {
        if id == 0 || id as usize > self.num_vertices {
            return Err(SolverError::invalid_data(format!(
                "line {}: vertex {id} outside 1..={}",
                line_no + 1,
                self.num_vertices
            )));
        }
        Ok(())
    }
}

fn parse_field<T: std::str::FromStr>(raw: &str, what: &str, line_no: usize) -> SolverResult<T>
where
    T::Err: Display,
{
    raw.parse::<T>().map_err(|e| {
        SolverError::invalid_data(format!("line {}: bad {what} '{raw}': {e}", line_no + 1))
    })
}

impl Display for GraphFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut writer = LineWriter::new(f);

        writer.comments(&self.header_comments)?;
        writeln!(
            writer,
            "{PROBLEM_TAG} {PROBLEM_KIND} {} {}",
            self.num_vertices, self.num_edges
        )?;
        writer.comments(&self.trailer_comments)?;

        for arc in &self.arcs {
            writeln!(writer, "{ARC_TAG} {} {} {}", arc.from, arc.to, arc.weight)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        fs,
        path::PathBuf,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::{Arc, GraphFile};

    const SAMPLE: &str = "\
c Generated map
c
p sp 3 2
c graph contains 3 nodes and 2 arcs
a 1 2 7
a 2 1 7
a 2 3 4
a 3 2 4
";

    fn unique_temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after epoch")
            .as_nanos();
        std::env::temp_dir().join(format!("mosp-solver-tests-{name}-{nanos}"))
    }

    #[test]
    fn from_text_reads_header_problem_and_arcs() {
        let graph = GraphFile::from_text(SAMPLE).expect("parse graph");

        assert_eq!(graph.header_comments, vec!["Generated map", ""]);
        assert_eq!(graph.num_vertices, 3);
        assert_eq!(graph.num_edges, 2);
        assert_eq!(
            graph.trailer_comments,
            vec!["graph contains 3 nodes and 2 arcs"]
        );
        assert_eq!(graph.arcs.len(), 4);
        assert_eq!(graph.arcs[2], Arc::new(2, 3, 4));
    }

    #[test]
    fn display_writes_the_same_text_back() {
        let graph = GraphFile::from_text(SAMPLE).expect("parse graph");
        assert_eq!(graph.to_string(), SAMPLE);
    }

    #[test]
    fn out_degrees_count_arcs_by_tail() {
        let graph = GraphFile::from_text(SAMPLE).expect("parse graph");
        assert_eq!(graph.out_degrees(), vec![0, 1, 2, 1]);
    }

    #[test]
    fn out_degrees_skip_tails_past_vertex_count() {
        let mut graph = GraphFile::from_text(SAMPLE).expect("parse graph");
        graph.arcs.push(Arc::new(7, 1, 1));
        assert_eq!(graph.out_degrees(), vec![0, 1, 2, 1]);
    }

    #[test]
    fn topology_ignores_weights() {
        let graph = GraphFile::from_text(SAMPLE).expect("parse graph");
        let pairs: Vec<_> = graph.topology().into_iter().collect();
        assert_eq!(pairs, vec![(1, 2), (2, 1), (2, 3), (3, 2)]);
    }

    #[test]
    fn from_text_rejects_vertex_outside_problem_range() {
        let err = GraphFile::from_text("p sp 2 1\na 1 3 5\n").expect_err("vertex 3 is invalid");
        assert!(err.to_string().contains("vertex 3 outside 1..=2"));
    }

    #[test]
    fn from_text_rejects_arc_before_problem_line() {
        let err = GraphFile::from_text("a 1 2 5\np sp 2 1\n").expect_err("arc first");
        assert!(err.to_string().contains("arc before problem line"));
    }

    #[test]
    fn from_text_requires_problem_line() {
        let err = GraphFile::from_text("c only comments\n").expect_err("no problem line");
        assert!(err.to_string().contains("missing problem line"));
    }

    #[test]
    fn write_to_file_round_trips_through_disk() {
        let dir = unique_temp_dir("graph-write");
        fs::create_dir_all(&dir).expect("create temp dir");

        let mut graph = GraphFile::new(2, 1);
        graph.header_comments.push("two vertices".to_string());
        graph.arcs.push(Arc::new(1, 2, 3));
        graph.arcs.push(Arc::new(2, 1, 3));

        let path = dir.join("pair.gr");
        graph.write_to_file(&path).expect("write graph");
        let parsed = GraphFile::from_file(&path).expect("read graph");
        assert_eq!(parsed, graph);

        fs::remove_dir_all(&dir).expect("cleanup temp dir");
    }
}
