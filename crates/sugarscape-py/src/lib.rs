use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use sugarscape_core::{ModelConfig, SugarField, SugarscapeModel};

/// Peak capacity of the built-in landscape used when no map is supplied.
const DEFAULT_PEAK_CAPACITY: u32 = 4;

fn parse_config(config_json: &str) -> PyResult<ModelConfig> {
    serde_json::from_str(config_json)
        .map_err(|e| PyValueError::new_err(format!("invalid config json: {e}")))
}

fn build_field(config: &ModelConfig, sugar_map: Option<&str>) -> PyResult<SugarField> {
    let field = match sugar_map {
        Some(text) => SugarField::parse(text),
        None => SugarField::two_peaks(config.width, config.height, DEFAULT_PEAK_CAPACITY),
    };
    field.map_err(|e| PyValueError::new_err(format!("invalid sugar map: {e}")))
}

fn build_model(config_json: &str, sugar_map: Option<&str>) -> PyResult<SugarscapeModel> {
    let config = parse_config(config_json)?;
    let field = build_field(&config, sugar_map)?;
    SugarscapeModel::try_new(config, field)
        .map_err(|e| PyValueError::new_err(format!("invalid model configuration: {e}")))
}

/// Minimal PyO3 module exposing sugarscape-core to Python.
#[pyfunction]
fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[pyfunction]
fn default_config_json() -> PyResult<String> {
    serde_json::to_string(&ModelConfig::default())
        .map_err(|e| PyValueError::new_err(format!("failed to serialize default config: {e}")))
}

#[pyfunction]
#[pyo3(signature = (config_json, sugar_map=None))]
fn validate_config_json(config_json: &str, sugar_map: Option<&str>) -> PyResult<bool> {
    build_model(config_json, sugar_map).map(|_| true)
}

/// Run `steps` ticks and return the run summary (seed plus the per-tick
/// Gini / ratio / avg-tech series) as JSON.
#[pyfunction]
#[pyo3(signature = (config_json, steps, sugar_map=None))]
fn run_json(config_json: &str, steps: usize, sugar_map: Option<&str>) -> PyResult<String> {
    let mut model = build_model(config_json, sugar_map)?;
    let summary = model
        .try_run(steps)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    serde_json::to_string(&summary)
        .map_err(|e| PyValueError::new_err(format!("failed to serialize run summary: {e}")))
}

/// Tick-by-tick handle for interactive drivers: step the engine and read
/// back what a renderer or plot needs.
#[pyclass(name = "Model")]
struct PyModel {
    inner: SugarscapeModel,
}

#[pymethods]
impl PyModel {
    #[new]
    #[pyo3(signature = (config_json, sugar_map=None))]
    fn new(config_json: &str, sugar_map: Option<&str>) -> PyResult<Self> {
        Ok(Self {
            inner: build_model(config_json, sugar_map)?,
        })
    }

    /// Advance one tick and return its summary as JSON.
    fn step(&mut self) -> PyResult<String> {
        let summary = self.inner.step();
        serde_json::to_string(&summary)
            .map_err(|e| PyValueError::new_err(format!("failed to serialize step summary: {e}")))
    }

    #[getter]
    fn tick(&self) -> usize {
        self.inner.tick()
    }

    #[getter]
    fn running(&self) -> bool {
        self.inner.is_running()
    }

    #[getter]
    fn seed(&self) -> u64 {
        self.inner.seed()
    }

    #[getter]
    fn width(&self) -> usize {
        self.inner.field().width()
    }

    #[getter]
    fn height(&self) -> usize {
        self.inner.field().height()
    }

    /// Live agents (id, position, sugar, metabolism, vision, tech,
    /// affiliation) as a JSON array.
    fn agents_json(&self) -> PyResult<String> {
        let agents: Vec<_> = self.inner.agents().collect();
        serde_json::to_string(&agents)
            .map_err(|e| PyValueError::new_err(format!("failed to serialize agents: {e}")))
    }

    /// Current sugar levels, row-major over x.
    fn sugar_levels(&self) -> Vec<f64> {
        self.inner.field().levels().to_vec()
    }

    /// Recorded metrics series as a JSON array, one sample per tick.
    fn metrics_json(&self) -> PyResult<String> {
        serde_json::to_string(self.inner.metrics())
            .map_err(|e| PyValueError::new_err(format!("failed to serialize metrics: {e}")))
    }
}

#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(version, m)?)?;
    m.add_function(wrap_pyfunction!(default_config_json, m)?)?;
    m.add_function(wrap_pyfunction!(validate_config_json, m)?)?;
    m.add_function(wrap_pyfunction!(run_json, m)?)?;
    m.add_class::<PyModel>()?;
    Ok(())
}
