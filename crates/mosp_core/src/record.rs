use std::fmt::{self, Display, Formatter};

use mosp_solver::{console::ConsoleSummary, report::RunReport};

use crate::test_spec::{Algorithm, TestSpec};

const COLUMNS: [&str; 19] = [
    "test_number",
    "algorithm",
    "map_name",
    "num_dims",
    "time_limit",
    "start",
    "goal",
    "n_generated",
    "n_expanded",
    "n_dom_check",
    "heuristic_time",
    "search_time",
    "timeout",
    "num_nondom_labels_max",
    "num_nondom_labels_avg",
    "num_solutions",
    "num_nodes",
    "num_edges",
    "console_search_time",
];

/// A finished test: its spec merged with the decoded report.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultRecord {
    pub spec: TestSpec,
    pub report: RunReport,
    pub console: Option<ConsoleSummary>,
}

impl ResultRecord {
    pub fn new(spec: TestSpec, report: RunReport, console: Option<ConsoleSummary>) -> Self {
        Self {
            spec,
            report,
            console,
        }
    }

    pub fn test_number(&self) -> usize {
        self.spec.test_number
    }

    pub fn algorithm(&self) -> Algorithm {
        self.spec.algorithm
    }

    /// Tab-separated column names matching `Display`.
    pub fn header() -> String {
        COLUMNS.join("\t")
    }
}

/// Orders records by `(test_number, algorithm)`; the run itself returns them in completion order.
pub fn sort_records(records: &mut [ResultRecord]) {
    records.sort_by(|a, b| {
        (a.test_number(), a.algorithm().as_str()).cmp(&(b.test_number(), b.algorithm().as_str()))
    });
}

/// One tab-separated line; console columns are `-` when the summary was not decoded.
impl Display for ResultRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let spec = &self.spec;
        let report = &self.report;
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            spec.test_number,
            spec.algorithm,
            spec.instance,
            spec.num_dims(),
            spec.time_limit,
            spec.source,
            spec.target,
            report.n_generated,
            report.n_expanded,
            report.n_dom_check,
            report.rt_init_heu,
            report.rt_search,
            u8::from(report.timeout),
            report.num_nondom_labels_max,
            report.num_nondom_labels_avg,
            report.num_solutions,
        )?;

        match &self.console {
            Some(console) => write!(
                f,
                "\t{}\t{}\t{}",
                console.num_nodes, console.num_edges, console.search_time
            ),
            None => f.write_str("\t-\t-\t-"),
        }
    }
}
