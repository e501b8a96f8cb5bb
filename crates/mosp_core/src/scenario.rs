//! Test specification builders for the two benchmark scenarios.

use std::{
    fmt::{self, Display, Formatter},
    path::{Path, PathBuf},
    str::FromStr,
};

use rand::Rng;

use crate::{
    Error, Result,
    generator::GridParams,
    test_spec::{Algorithm, TestSpec},
};

/// Vertex count of the 9th DIMACS New York road network.
pub const NY_NUM_VERTICES: u64 = 264_346;
pub const DEFAULT_TIME_LIMIT: u64 = 600;
pub const DEFAULT_MAP_NAME: &str = "simple_map";
const GENERATED_MAPS_DIR: &str = "generated_maps";

/// Random endpoint pairs against a fixed, pre-existing instance.
#[derive(Clone, Debug, PartialEq)]
pub struct FixedMapScenario {
    pub label: String,
    pub cost_files: Vec<PathBuf>,
    /// Endpoints are drawn uniformly from `1..=num_vertices`.
    pub num_vertices: u64,
    pub time_limit: u64,
    pub result_file: PathBuf,
    pub algorithms: Vec<Algorithm>,
}

/// `DIMSxWIDTHxHEIGHT`, e.g. `3x15x15`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct GridShape {
    pub num_dims: usize,
    pub width: usize,
    pub height: usize,
}

/// A fresh generated grid per test number.
#[derive(Clone, Debug, PartialEq)]
pub struct GridScenario {
    pub shape: GridShape,
    pub walls_ratio: f64,
    pub weight_range: u64,
    pub time_limit: u64,
    /// Maps land under `{data_dir}/generated_maps/...`.
    pub data_dir: PathBuf,
    pub map_name: String,
    pub result_file: PathBuf,
    pub algorithms: Vec<Algorithm>,
}

/// Every `(shape, walls_ratio)` combination, numbered consecutively.
#[derive(Clone, Debug, PartialEq)]
pub struct GridSweep {
    pub shapes: Vec<GridShape>,
    pub walls_ratios: Vec<f64>,
    /// Settings shared by all combinations; its shape and ratio are replaced.
    pub base: GridScenario,
}

impl FixedMapScenario {
    pub fn new(label: impl Into<String>, cost_files: Vec<PathBuf>) -> Self {
        Self {
            label: label.into(),
            cost_files,
            num_vertices: NY_NUM_VERTICES,
            time_limit: DEFAULT_TIME_LIMIT,
            result_file: PathBuf::from("result.txt"),
            algorithms: Algorithm::ALL.to_vec(),
        }
    }

    pub fn build<R: Rng + ?Sized>(
        &self,
        num_tests: usize,
        first_test_number: usize,
        rng: &mut R,
    ) -> Result<Vec<TestSpec>> {
        if self.cost_files.is_empty() {
            return Err(Error::invalid_input("fixed-map scenario needs cost files"));
        }
        if self.num_vertices == 0 {
            return Err(Error::invalid_input("fixed-map scenario needs num_vertices > 0"));
        }
        ensure_algorithms(&self.algorithms)?;

        let mut specs = Vec::with_capacity(num_tests * self.algorithms.len());
        for test_number in first_test_number..first_test_number + num_tests {
            let source = rng.random_range(1..=self.num_vertices);
            let target = rng.random_range(1..=self.num_vertices);
            specs.extend(TestSpec::group(
                &self.algorithms,
                test_number,
                &self.label,
                self.time_limit,
                source,
                target,
                &self.result_file,
                &self.cost_files,
            ));
        }

        log::debug!(
            "scenario.fixed_map: built label={} tests={num_tests} specs={}",
            self.label,
            specs.len()
        );
        Ok(specs)
    }
}

impl GridShape {
    pub fn new(num_dims: usize, width: usize, height: usize) -> Self {
        Self {
            num_dims,
            width,
            height,
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let parts: Vec<&str> = raw.trim().split(['x', 'X']).collect();
        let [num_dims, width, height] = parts.as_slice() else {
            return Err(Error::invalid_input(format!(
                "grid shape must be DIMSxWIDTHxHEIGHT, got '{raw}'"
            )));
        };

        let field = |value: &str, what: &str| -> Result<usize> {
            match value.trim().parse::<usize>() {
                Ok(parsed) if parsed > 0 => Ok(parsed),
                _ => Err(Error::invalid_input(format!(
                    "grid shape '{raw}': {what} must be a positive integer"
                ))),
            }
        };

        Ok(Self {
            num_dims: field(*num_dims, "dims")?,
            width: field(*width, "width")?,
            height: field(*height, "height")?,
        })
    }

    pub fn num_vertices(&self) -> usize {
        self.width * self.height
    }
}

impl FromStr for GridShape {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Display for GridShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.num_dims, self.width, self.height)
    }
}

impl GridScenario {
    pub fn new(shape: GridShape, walls_ratio: f64, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            shape,
            walls_ratio,
            weight_range: crate::generator::grid::DEFAULT_WEIGHT_RANGE,
            time_limit: DEFAULT_TIME_LIMIT,
            data_dir: data_dir.into(),
            map_name: DEFAULT_MAP_NAME.to_string(),
            result_file: PathBuf::from("result.txt"),
            algorithms: Algorithm::ALL.to_vec(),
        }
    }

    /// Truncated, so 0.29 maps to the existing `28_walls_ratio` directories.
    pub fn walls_percent(&self) -> u32 {
        (self.walls_ratio * 100.0) as u32
    }

    pub fn label(&self) -> String {
        format!("simple map {} dims", self.shape.num_dims)
    }

    /// `{data_dir}/generated_maps/{dims}_dims/{pct}_walls_ratio/{map}_{dims}_{w}_{h}_{pct}_{n}`
    pub fn map_prefix(&self, test_number: usize) -> PathBuf {
        let GridShape {
            num_dims,
            width,
            height,
        } = self.shape;
        let pct = self.walls_percent();
        self.data_dir
            .join(GENERATED_MAPS_DIR)
            .join(format!("{num_dims}_dims"))
            .join(format!("{pct}_walls_ratio"))
            .join(format!(
                "{}_{num_dims}_{width}_{height}_{pct}_{test_number}",
                self.map_name
            ))
    }

    fn grid_params(&self) -> GridParams {
        let params = GridParams::new(self.shape.width, self.shape.height, self.shape.num_dims)
            .with_weight_range(self.weight_range);
        if self.walls_ratio > 0.0 {
            params.with_walls(self.walls_ratio)
        } else {
            params
        }
    }

    /// Generates one grid per test and routes corner to corner (`1` to `width*height`).
    pub fn build<R: Rng + ?Sized>(
        &self,
        num_tests: usize,
        first_test_number: usize,
        rng: &mut R,
    ) -> Result<Vec<TestSpec>> {
        ensure_algorithms(&self.algorithms)?;

        let params = self.grid_params();
        let label = self.label();
        let target = self.shape.num_vertices() as u64;
        let mut specs = Vec::with_capacity(num_tests * self.algorithms.len());

        for test_number in first_test_number..first_test_number + num_tests {
            let instance = params.generate(&self.map_prefix(test_number), rng)?;
            specs.extend(TestSpec::group(
                &self.algorithms,
                test_number,
                &label,
                self.time_limit,
                1,
                target,
                &self.result_file,
                &instance.files,
            ));
        }

        log::debug!(
            "scenario.grid: built shape={} walls_pct={} tests={num_tests} specs={}",
            self.shape,
            self.walls_percent(),
            specs.len()
        );
        Ok(specs)
    }
}

impl GridSweep {
    pub fn new(shapes: Vec<GridShape>, walls_ratios: Vec<f64>, data_dir: &Path) -> Self {
        let base_shape = shapes.first().copied().unwrap_or(GridShape::new(1, 1, 1));
        Self {
            shapes,
            walls_ratios,
            base: GridScenario::new(base_shape, 0.0, data_dir),
        }
    }

    pub fn scenarios(&self) -> Vec<GridScenario> {
        self.shapes
            .iter()
            .flat_map(|shape| {
                self.walls_ratios.iter().map(|ratio| GridScenario {
                    shape: *shape,
                    walls_ratio: *ratio,
                    ..self.base.clone()
                })
            })
            .collect()
    }

    #[mosp_derive::timer("scenario.grid_sweep")]
    pub fn build<R: Rng + ?Sized>(
        &self,
        tests_per_combination: usize,
        first_test_number: usize,
        rng: &mut R,
    ) -> Result<Vec<TestSpec>> {
        let scenarios = self.scenarios();
        if scenarios.is_empty() {
            return Err(Error::invalid_input(
                "grid sweep needs at least one shape and one walls ratio",
            ));
        }

        let mut specs = Vec::new();
        let mut next_test_number = first_test_number;
        for scenario in &scenarios {
            specs.extend(scenario.build(tests_per_combination, next_test_number, rng)?);
            next_test_number += tests_per_combination;
        }
        Ok(specs)
    }
}

fn ensure_algorithms(algorithms: &[Algorithm]) -> Result<()> {
    if algorithms.is_empty() {
        return Err(Error::invalid_input("at least one algorithm is required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{
        fs,
        path::PathBuf,
        time::{SystemTime, UNIX_EPOCH},
    };

    use rand::{SeedableRng, rngs::StdRng};

    use super::{FixedMapScenario, GridScenario, GridShape, GridSweep};
    use crate::test_spec::Algorithm;

    fn unique_temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after epoch")
            .as_nanos();
        std::env::temp_dir().join(format!("mosp-core-tests-{name}-{nanos}"))
    }

    #[test]
    fn grid_shape_parses_dims_width_height() {
        assert_eq!(
            GridShape::parse("3x15x15").expect("parse"),
            GridShape::new(3, 15, 15)
        );
        assert_eq!(
            " 2X4x8 ".parse::<GridShape>().expect("parse"),
            GridShape::new(2, 4, 8)
        );
        assert_eq!(GridShape::new(4, 10, 12).to_string(), "4x10x12");
    }

    #[test]
    fn grid_shape_rejects_malformed_values() {
        for raw in ["3x15", "3x0x4", "axbxc", "1x2x3x4"] {
            assert!(GridShape::parse(raw).is_err(), "{raw} should fail");
        }
    }

    #[test]
    fn fixed_map_builds_one_group_per_test_with_endpoints_in_range() {
        let mut scenario = FixedMapScenario::new(
            "NY",
            vec![PathBuf::from("USA-road-d.NY.gr"), PathBuf::from("USA-road-t.NY.gr")],
        );
        scenario.num_vertices = 50;
        scenario.time_limit = 60;

        let specs = scenario
            .build(10, 1, &mut StdRng::seed_from_u64(4))
            .expect("build specs");

        assert_eq!(specs.len(), 20);
        for pair in specs.chunks_exact(2) {
            assert_eq!(pair[0].test_number, pair[1].test_number);
            assert_eq!(pair[0].algorithm, Algorithm::Emoa);
            assert_eq!(pair[1].algorithm, Algorithm::Boa);
            assert_eq!(
                (pair[0].source, pair[0].target),
                (pair[1].source, pair[1].target)
            );
            assert!((1..=50).contains(&pair[0].source));
            assert!((1..=50).contains(&pair[0].target));
            assert_eq!(pair[0].time_limit, 60);
            assert_eq!(pair[0].instance, "NY");
        }
        assert_eq!(specs[0].test_number, 1);
        assert_eq!(specs[19].test_number, 10);
    }

    #[test]
    fn fixed_map_same_seed_same_endpoints() {
        let scenario = FixedMapScenario::new("NY", vec![PathBuf::from("d.gr")]);
        let a = scenario
            .build(5, 1, &mut StdRng::seed_from_u64(9))
            .expect("first build");
        let b = scenario
            .build(5, 1, &mut StdRng::seed_from_u64(9))
            .expect("second build");
        assert_eq!(a, b);
    }

    #[test]
    fn fixed_map_requires_cost_files() {
        let scenario = FixedMapScenario::new("NY", Vec::new());
        assert!(scenario.build(1, 1, &mut StdRng::seed_from_u64(1)).is_err());
    }

    #[test]
    fn grid_map_prefix_follows_directory_layout() {
        let scenario = GridScenario::new(GridShape::new(3, 15, 15), 0.2, "data");
        assert_eq!(
            scenario.map_prefix(7),
            PathBuf::from("data/generated_maps/3_dims/20_walls_ratio/simple_map_3_15_15_20_7")
        );
        assert_eq!(scenario.label(), "simple map 3 dims");
    }

    #[test]
    fn walls_percent_truncates_the_ratio() {
        let percent =
            |ratio| GridScenario::new(GridShape::new(2, 4, 4), ratio, "data").walls_percent();
        assert_eq!(percent(0.29), 28);
        assert_eq!(percent(0.2), 20);
        assert_eq!(percent(0.0), 0);
        assert_eq!(
            GridScenario::new(GridShape::new(2, 4, 4), 0.29, "data").map_prefix(1),
            PathBuf::from("data/generated_maps/2_dims/28_walls_ratio/simple_map_2_4_4_28_1")
        );
    }

    #[test]
    fn grid_scenario_materializes_maps_and_routes_corner_to_corner() {
        let dir = unique_temp_dir("grid-scenario");
        let scenario = GridScenario::new(GridShape::new(2, 4, 4), 0.0, &dir);

        let specs = scenario
            .build(2, 1, &mut StdRng::seed_from_u64(3))
            .expect("build specs");

        assert_eq!(specs.len(), 4);
        for spec in &specs {
            assert_eq!((spec.source, spec.target), (1, 16));
            assert_eq!(spec.num_dims(), 2);
            for file in &spec.cost_files {
                assert!(file.exists(), "{} should exist", file.display());
            }
        }
        assert_eq!(
            specs[2].cost_files[1],
            dir.join("generated_maps/2_dims/0_walls_ratio/simple_map_2_4_4_0_2_2.gr")
        );

        fs::remove_dir_all(&dir).expect("cleanup temp dir");
    }

    #[test]
    fn grid_sweep_numbers_combinations_consecutively() {
        let dir = unique_temp_dir("grid-sweep");
        let sweep = GridSweep::new(
            vec![GridShape::new(2, 3, 3), GridShape::new(3, 4, 2)],
            vec![0.0, 0.1],
            &dir,
        );
        assert_eq!(sweep.scenarios().len(), 4);

        let specs = sweep
            .build(2, 1, &mut StdRng::seed_from_u64(8))
            .expect("build sweep");

        assert_eq!(specs.len(), 16);
        let numbers: Vec<usize> = specs.iter().map(|spec| spec.test_number).collect();
        assert_eq!(numbers, vec![1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8]);
        assert_eq!(specs[8].num_dims(), 3);
        assert_eq!(specs[8].target, 8);

        fs::remove_dir_all(&dir).expect("cleanup temp dir");
    }
}
