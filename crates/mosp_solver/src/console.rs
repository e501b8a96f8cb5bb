//! Summary numbers scraped from a solver's console output.
//!
//! The solver prints, among other progress lines, `num_nodes: <int>`,
//! `num_edges: <int>` and `... solutions in <f>(for heu) + <f>(for search) ...`.
//! Extraction relies on that exact wording; a change to these messages is a breaking
//! change for this decoder.

use std::{fmt::Display, str::FromStr};

use crate::{SolverError, SolverResult};

const NODES_MARKER: &str = "num_nodes: ";
const EDGES_MARKER: &str = "num_edges: ";
const SOLUTIONS_MARKER: &str = "solutions in ";
const HEURISTIC_MARKER: &str = "(for heu)";
const SEARCH_PREFIX_MARKER: &str = "(for heu) + ";
const SEARCH_MARKER: &str = "(for search)";

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ConsoleSummary {
    pub num_nodes: u64,
    pub num_edges: u64,
    pub heuristic_time: f64,
    pub search_time: f64,
}

impl ConsoleSummary {
    pub fn from_text(text: &str) -> SolverResult<Self> {
        let missing: Vec<&str> = [
            NODES_MARKER,
            EDGES_MARKER,
            SOLUTIONS_MARKER,
            HEURISTIC_MARKER,
            SEARCH_PREFIX_MARKER,
            SEARCH_MARKER,
        ]
        .into_iter()
        .filter(|marker| !text.contains(marker))
        .collect();
        if !missing.is_empty() {
            return Err(SolverError::invalid_data(format!(
                "solver output is missing {}",
                missing
                    .iter()
                    .map(|marker| format!("'{}'", marker.trim()))
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }

        Ok(Self {
            num_nodes: parse_token(first_token_after(text, NODES_MARKER), NODES_MARKER)?,
            num_edges: parse_token(first_token_after(text, EDGES_MARKER), EDGES_MARKER)?,
            heuristic_time: parse_token(
                between(text, SOLUTIONS_MARKER, HEURISTIC_MARKER),
                HEURISTIC_MARKER,
            )?,
            search_time: parse_token(
                between(text, SEARCH_PREFIX_MARKER, SEARCH_MARKER),
                SEARCH_MARKER,
            )?,
        })
    }
}

fn first_token_after<'a>(text: &'a str, marker: &str) -> &'a str {
    text.split_once(marker)
        .and_then(|(_, rest)| rest.split_whitespace().next())
        .unwrap_or_default()
}

fn between<'a>(text: &'a str, start: &str, end: &str) -> &'a str {
    text.split_once(start)
        .and_then(|(_, rest)| rest.split_once(end))
        .map(|(value, _)| value.trim())
        .unwrap_or_default()
}

fn parse_token<T>(raw: &str, marker: &str) -> SolverResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse::<T>().map_err(|e| {
        SolverError::invalid_data(format!(
            "bad value '{raw}' near '{}' in solver output: {e}",
            marker.trim()
        ))
    })
}
