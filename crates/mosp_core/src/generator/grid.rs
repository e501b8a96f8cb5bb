//! Random 4-connected grid instances with one cost layer per objective.
//!
//! All layers share the same topology. Weights are pre-drawn as a
//! `num_dims x edge_upper_bound` matrix and every newly discovered edge consumes the
//! next column in every layer at once, so column `k` always belongs to the `k`-th
//! edge in discovery order.

use std::{
    collections::HashSet,
    fmt::{self, Display, Formatter},
    fs,
    path::{Path, PathBuf},
};

use mosp_solver::graph::{Arc, GraphFile};
use rand::{Rng, seq::index};

use crate::{Error, Result};

pub const DEFAULT_WEIGHT_RANGE: u64 = 11;
const FIRST_WALL_CANDIDATE: u64 = 2;
const GRAPH_EXTENSION: &str = "gr";
const WALL_CELL: char = '#';
const OPEN_CELL: char = '*';

/// Neighbour scan order as `(d_col, d_row)`: next row, next column, previous row,
/// previous column.
const NEIGHBOUR_OFFSETS: [(isize, isize); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

#[derive(Clone, Debug, PartialEq)]
pub struct GridParams {
    pub width: usize,
    pub height: usize,
    pub num_dims: usize,
    /// Weights are drawn uniformly from `1..weight_range`.
    pub weight_range: u64,
    pub walls: bool,
    pub walls_ratio: f64,
}

/// Which cells are obstacles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObstacleMap {
    width: usize,
    height: usize,
    walls: Vec<bool>,
}

/// Generated layers kept in memory, before anything is written.
#[derive(Clone, Debug, PartialEq)]
pub struct GridGraph {
    pub layers: Vec<GraphFile>,
    pub obstacles: ObstacleMap,
}

/// A cost-layer set on disk.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphInstance {
    pub num_vertices: usize,
    /// Undirected edges actually produced (half the arc count).
    pub num_edges: usize,
    pub num_dims: usize,
    pub files: Vec<PathBuf>,
    pub obstacles: ObstacleMap,
}

impl GridParams {
    pub fn new(width: usize, height: usize, num_dims: usize) -> Self {
        Self {
            width,
            height,
            num_dims,
            weight_range: DEFAULT_WEIGHT_RANGE,
            walls: false,
            walls_ratio: 0.0,
        }
    }

    pub fn with_weight_range(mut self, weight_range: u64) -> Self {
        self.weight_range = weight_range;
        self
    }

    /// Turns obstacles on; a ratio of `0.0` still marks the grid as walled but removes nothing.
    pub fn with_walls(mut self, walls_ratio: f64) -> Self {
        self.walls = true;
        self.walls_ratio = walls_ratio;
        self
    }

    pub fn num_vertices(&self) -> usize {
        self.width * self.height
    }

    pub fn vertex_id(&self, col: usize, row: usize) -> u64 {
        (row * self.width + col + 1) as u64
    }

    /// Builds all layers and writes them to `{output_prefix}_{dim}.gr`, `dim` starting at 1.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        output_prefix: &Path,
        rng: &mut R,
    ) -> Result<GraphInstance> {
        let graph = self.build(rng)?;

        if let Some(parent) = output_prefix.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let mut files = Vec::with_capacity(graph.layers.len());
        for (idx, layer) in graph.layers.iter().enumerate() {
            let path = layer_path(output_prefix, idx + 1);
            layer.write_to_file(&path)?;
            files.push(path);
        }

        let num_edges = graph.num_edges();
        log::debug!(
            "generator.grid: wrote prefix={} width={} height={} dims={} edges={num_edges} walls={}",
            output_prefix.display(),
            self.width,
            self.height,
            self.num_dims,
            graph.obstacles.wall_count()
        );

        Ok(GraphInstance {
            num_vertices: self.num_vertices(),
            num_edges,
            num_dims: self.num_dims,
            files,
            obstacles: graph.obstacles,
        })
    }

    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<GridGraph> {
        self.validate()?;

        let num_vertices = self.num_vertices();
        let obstacles = self.place_walls(rng)?;

        let columns = edge_upper_bound(self.width, self.height);
        let weights: Vec<Vec<u64>> = (0..self.num_dims)
            .map(|_| {
                (0..columns)
                    .map(|_| rng.random_range(1..self.weight_range))
                    .collect()
            })
            .collect();

        let mut arcs: Vec<Vec<Arc>> = vec![Vec::with_capacity(columns * 2); self.num_dims];
        let mut seen: HashSet<(u64, u64)> = HashSet::with_capacity(columns);
        let mut next_column = 0;

        for row in 0..self.height {
            for col in 0..self.width {
                let u = self.vertex_id(col, row);
                if obstacles.is_wall(u) {
                    continue;
                }

                for (d_col, d_row) in NEIGHBOUR_OFFSETS {
                    let (Some(n_col), Some(n_row)) = (
                        col.checked_add_signed(d_col),
                        row.checked_add_signed(d_row),
                    ) else {
                        continue;
                    };
                    if n_col >= self.width || n_row >= self.height {
                        continue;
                    }

                    let v = self.vertex_id(n_col, n_row);
                    if obstacles.is_wall(v) || !seen.insert((u.min(v), u.max(v))) {
                        continue;
                    }

                    if next_column >= columns {
                        return Err(Error::generation(format!(
                            "weight matrix exhausted after {columns} edges at ({u},{v})"
                        )));
                    }
                    for (layer, layer_weights) in arcs.iter_mut().zip(&weights) {
                        let weight = layer_weights[next_column];
                        layer.push(Arc::new(u, v, weight));
                        layer.push(Arc::new(v, u, weight));
                    }
                    next_column += 1;
                }
            }
        }

        let num_edges = next_column;
        let layers = arcs
            .into_iter()
            .enumerate()
            .map(|(idx, layer_arcs)| {
                let mut layer = GraphFile::new(num_vertices, num_edges);
                layer.header_comments = self.header_comments(idx + 1);
                layer.trailer_comments = vec![
                    format!("graph contains {num_vertices} nodes and {num_edges} arcs"),
                    String::new(),
                ];
                layer.arcs = layer_arcs;
                layer
            })
            .collect();

        Ok(GridGraph { layers, obstacles })
    }

    fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::invalid_input(format!(
                "grid must be at least 1x1, got {}x{}",
                self.width, self.height
            )));
        }
        if self.num_dims == 0 {
            return Err(Error::invalid_input("num_dims must be > 0"));
        }
        if self.weight_range < 2 {
            return Err(Error::invalid_input(format!(
                "weight_range must be >= 2 to draw from 1..weight_range, got {}",
                self.weight_range
            )));
        }
        if !self.walls_ratio.is_finite() || !(0.0..=1.0).contains(&self.walls_ratio) {
            return Err(Error::invalid_input(format!(
                "walls_ratio must be within [0, 1], got {}",
                self.walls_ratio
            )));
        }
        Ok(())
    }

    /// Draws `round(walls_ratio * V)` distinct obstacles from `2..=V-2`. The corner
    /// endpoints `1` and `V` and the vertex `V-1` next to the target stay free.
    fn place_walls<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<ObstacleMap> {
        let num_vertices = self.num_vertices();
        let mut obstacles = ObstacleMap::open(self.width, self.height);
        if !self.walls {
            return Ok(obstacles);
        }

        let candidates = num_vertices.saturating_sub(3);
        let count = (self.walls_ratio * num_vertices as f64).round() as usize;
        if count > candidates {
            return Err(Error::invalid_input(format!(
                "walls_ratio {} asks for {count} obstacles but only {candidates} vertices are eligible",
                self.walls_ratio
            )));
        }

        for idx in index::sample(rng, candidates, count) {
            obstacles.set_wall(FIRST_WALL_CANDIDATE + idx as u64);
        }
        Ok(obstacles)
    }

    fn header_comments(&self, dim: usize) -> Vec<String> {
        vec![
            "Generated map".to_string(),
            format!(
                "Size: {} * {}, weights in range: 1 to {}, walls: {}, with ratio {}",
                self.width,
                self.height,
                self.weight_range - 1,
                self.walls,
                self.walls_ratio
            ),
            format!("dim {dim} of {}", self.num_dims),
            String::new(),
        ]
    }
}

impl GridGraph {
    pub fn num_edges(&self) -> usize {
        self.layers.first().map_or(0, |layer| layer.arcs.len() / 2)
    }
}

/// Undirected edge count of the wall-free grid. Walls only remove edges, so this is
/// always enough weight columns; unused trailing columns are discarded.
pub fn edge_upper_bound(width: usize, height: usize) -> usize {
    height * width.saturating_sub(1) + width * height.saturating_sub(1)
}

fn layer_path(output_prefix: &Path, dim: usize) -> PathBuf {
    let mut name = output_prefix.as_os_str().to_owned();
    name.push(format!("_{dim}.{GRAPH_EXTENSION}"));
    PathBuf::from(name)
}

impl ObstacleMap {
    fn open(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            walls: vec![false; width * height],
        }
    }

    fn set_wall(&mut self, vertex: u64) {
        self.walls[(vertex - 1) as usize] = true;
    }

    pub fn is_wall(&self, vertex: u64) -> bool {
        vertex >= 1 && self.walls.get((vertex - 1) as usize).copied().unwrap_or(false)
    }

    pub fn wall_count(&self) -> usize {
        self.walls.iter().filter(|wall| **wall).count()
    }

    /// Rows as text, last grid row first, `#` for obstacles and `*` for free cells.
    pub fn rows(&self) -> Vec<String> {
        (0..self.height)
            .rev()
            .map(|row| {
                self.walls[row * self.width..(row + 1) * self.width]
                    .iter()
                    .map(|wall| if *wall { WALL_CELL } else { OPEN_CELL })
                    .collect()
            })
            .collect()
    }
}

/// Renders the map as boxed cells, one card per vertex.
impl Display for ObstacleMap {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let border = "+---+".repeat(self.width);
        for row in self.rows() {
            writeln!(f, "{border}")?;
            for cell in row.chars() {
                write!(f, "| {cell} |")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "{border}")
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::BTreeSet,
        fs,
        path::PathBuf,
        time::{SystemTime, UNIX_EPOCH},
    };

    use mosp_solver::graph::GraphFile;
    use rand::{SeedableRng, rngs::StdRng};

    use super::{GridParams, edge_upper_bound};

    fn unique_temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after epoch")
            .as_nanos();
        std::env::temp_dir().join(format!("mosp-core-tests-{name}-{nanos}"))
    }

    fn undirected(layer: &GraphFile) -> BTreeSet<(u64, u64)> {
        layer
            .arcs
            .iter()
            .map(|arc| (arc.from.min(arc.to), arc.from.max(arc.to)))
            .collect()
    }

    #[test]
    fn edge_upper_bound_matches_grid_formula() {
        assert_eq!(edge_upper_bound(4, 4), 24);
        assert_eq!(edge_upper_bound(2, 2), 4);
        assert_eq!(edge_upper_bound(5, 1), 4);
        assert_eq!(edge_upper_bound(1, 1), 0);
    }

    #[test]
    fn wall_free_grid_has_two_arcs_per_grid_edge() {
        let mut rng = StdRng::seed_from_u64(7);
        for (width, height) in [(4, 4), (3, 5), (1, 6), (7, 2)] {
            let graph = GridParams::new(width, height, 2)
                .build(&mut rng)
                .expect("build grid");
            for layer in &graph.layers {
                assert_eq!(layer.arcs.len(), 2 * edge_upper_bound(width, height));
                assert_eq!(layer.num_edges, edge_upper_bound(width, height));
                assert_eq!(layer.num_vertices, width * height);
            }
        }
    }

    #[test]
    fn all_layers_share_topology_and_symmetric_weights() {
        let mut rng = StdRng::seed_from_u64(11);
        let graph = GridParams::new(6, 5, 4)
            .with_walls(0.2)
            .build(&mut rng)
            .expect("build grid");

        let topology = graph.layers[0].topology();
        for layer in &graph.layers {
            assert_eq!(layer.topology(), topology);
            for pair in layer.arcs.chunks_exact(2) {
                assert_eq!(pair[0].from, pair[1].to);
                assert_eq!(pair[0].to, pair[1].from);
                assert_eq!(pair[0].weight, pair[1].weight);
                assert!((1..11).contains(&pair[0].weight));
            }
        }
    }

    #[test]
    fn arcs_are_listed_in_discovery_order() {
        let mut rng = StdRng::seed_from_u64(3);
        let graph = GridParams::new(2, 2, 1).build(&mut rng).expect("build grid");
        let pairs: Vec<(u64, u64)> = graph.layers[0]
            .arcs
            .iter()
            .map(|arc| (arc.from, arc.to))
            .collect();

        assert_eq!(
            pairs,
            vec![
                (1, 3),
                (3, 1),
                (1, 2),
                (2, 1),
                (2, 4),
                (4, 2),
                (3, 4),
                (4, 3)
            ]
        );
    }

    #[test]
    fn walls_have_no_edges_and_keep_endpoints_free() {
        let mut rng = StdRng::seed_from_u64(5);
        let params = GridParams::new(8, 8, 2).with_walls(0.25);
        let graph = params.build(&mut rng).expect("build grid");

        assert_eq!(graph.obstacles.wall_count(), 16);
        assert!(!graph.obstacles.is_wall(1));
        assert!(!graph.obstacles.is_wall(64));

        let walled: Vec<u64> = (1..=64).filter(|v| graph.obstacles.is_wall(*v)).collect();
        for arc in &graph.layers[0].arcs {
            assert!(!walled.contains(&arc.from));
            assert!(!walled.contains(&arc.to));
        }
        assert!(graph.num_edges() < edge_upper_bound(8, 8));
        assert_eq!(graph.layers[1].num_edges, graph.num_edges());
    }

    #[test]
    fn topology_edges_are_unique() {
        let mut rng = StdRng::seed_from_u64(9);
        let graph = GridParams::new(5, 5, 1)
            .with_walls(0.1)
            .build(&mut rng)
            .expect("build grid");
        let layer = &graph.layers[0];
        assert_eq!(undirected(layer).len() * 2, layer.arcs.len());
    }

    #[test]
    fn too_many_walls_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = GridParams::new(3, 3, 1)
            .with_walls(0.9)
            .build(&mut rng)
            .expect_err("only six vertices are eligible");
        assert!(err.to_string().contains("only 6 vertices are eligible"));
    }

    #[test]
    fn vertex_before_target_is_never_a_wall() {
        for seed in 0..8 {
            let mut rng = StdRng::seed_from_u64(seed);
            let graph = GridParams::new(2, 3, 1)
                .with_walls(0.5)
                .build(&mut rng)
                .expect("build grid");
            let walled: Vec<u64> = (1..=6).filter(|v| graph.obstacles.is_wall(*v)).collect();
            assert_eq!(walled, vec![2, 3, 4]);
        }
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(GridParams::new(0, 3, 1).build(&mut rng).is_err());
        assert!(GridParams::new(3, 3, 0).build(&mut rng).is_err());
        assert!(
            GridParams::new(3, 3, 1)
                .with_weight_range(1)
                .build(&mut rng)
                .is_err()
        );
        assert!(
            GridParams::new(3, 3, 1)
                .with_walls(1.5)
                .build(&mut rng)
                .is_err()
        );
    }

    #[test]
    fn generate_writes_one_file_per_dimension() {
        let dir = unique_temp_dir("grid-generate");
        let prefix = dir.join("maps").join("simple_map_2_4_4_0_1");
        let mut rng = StdRng::seed_from_u64(20);

        let instance = GridParams::new(4, 4, 2)
            .generate(&prefix, &mut rng)
            .expect("generate grid");

        assert_eq!(instance.num_vertices, 16);
        assert_eq!(instance.num_edges, 24);
        assert_eq!(instance.num_dims, 2);
        assert_eq!(
            instance.files,
            vec![
                dir.join("maps").join("simple_map_2_4_4_0_1_1.gr"),
                dir.join("maps").join("simple_map_2_4_4_0_1_2.gr"),
            ]
        );

        let text = fs::read_to_string(&instance.files[0]).expect("read layer");
        assert!(text.starts_with("c Generated map\n"));
        assert!(text.contains("c dim 1 of 2\n"));
        assert!(text.contains("\np sp 16 24\nc graph contains 16 nodes and 24 arcs\n"));
        assert_eq!(text.lines().filter(|line| line.starts_with("a ")).count(), 48);

        let first = GraphFile::from_file(&instance.files[0]).expect("parse layer 1");
        let second = GraphFile::from_file(&instance.files[1]).expect("parse layer 2");
        assert_eq!(first.topology(), second.topology());

        fs::remove_dir_all(&dir).expect("cleanup temp dir");
    }

    #[test]
    fn same_seed_writes_identical_files() {
        let dir = unique_temp_dir("grid-seed");
        let params = GridParams::new(6, 6, 3).with_walls(0.1);

        let first = params
            .generate(&dir.join("a"), &mut StdRng::seed_from_u64(42))
            .expect("first generation");
        let second = params
            .generate(&dir.join("b"), &mut StdRng::seed_from_u64(42))
            .expect("second generation");

        for (a, b) in first.files.iter().zip(&second.files) {
            let a = fs::read(a).expect("read first");
            let b = fs::read(b).expect("read second");
            assert_eq!(a, b);
        }

        fs::remove_dir_all(&dir).expect("cleanup temp dir");
    }

    #[test]
    fn obstacle_map_renders_last_row_first() {
        let mut rng = StdRng::seed_from_u64(2);
        let graph = GridParams::new(3, 2, 1).build(&mut rng).expect("build grid");
        assert_eq!(graph.obstacles.rows(), vec!["***", "***"]);

        let card = graph.obstacles.to_string();
        assert_eq!(card.lines().count(), 5);
        assert!(card.starts_with("+---++---++---+\n| * || * || * |\n"));
    }
}
