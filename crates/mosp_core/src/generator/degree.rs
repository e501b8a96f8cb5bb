//! Extra cost layer derived from a road map's connectivity.

use std::{
    fs,
    path::{Path, PathBuf},
};

use mosp_solver::graph::{Arc, GraphFile};

use crate::{Error, Result};

/// Same arcs as `base`, each weighted by the mean out-degree of its endpoints,
/// rounded up. Comments and the problem line are kept as they are.
pub fn degree_layer(base: &GraphFile) -> Result<GraphFile> {
    let degrees = base.out_degrees();
    let degree_of = |vertex: u64| {
        usize::try_from(vertex)
            .ok()
            .filter(|&idx| idx >= 1)
            .and_then(|idx| degrees.get(idx).copied())
            .ok_or_else(|| {
                Error::invalid_input(format!(
                    "arc endpoint {vertex} is outside 1..={}",
                    base.num_vertices
                ))
            })
    };

    let arcs = base
        .arcs
        .iter()
        .map(|arc| {
            let sum = degree_of(arc.from)? + degree_of(arc.to)?;
            Ok(Arc::new(arc.from, arc.to, sum.div_ceil(2) as u64))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(GraphFile {
        arcs,
        ..base.clone()
    })
}

/// Reads `base_path`, writes the degree layer to `output_path` and returns that path.
pub fn write_degree_layer(base_path: &Path, output_path: &Path) -> Result<PathBuf> {
    let base = GraphFile::from_file(base_path)?;
    let layer = degree_layer(&base)?;

    if let Some(parent) = output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    layer.write_to_file(output_path)?;

    log::debug!(
        "generator.degree: wrote base={} output={} arcs={}",
        base_path.display(),
        output_path.display(),
        layer.arcs.len()
    );
    Ok(output_path.to_path_buf())
}
