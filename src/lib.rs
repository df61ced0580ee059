#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod geom;
pub mod knot;

use serde::Serialize;
use wasm_bindgen::JsError;
use wasm_bindgen::prelude::*;

use geom::{GeomMesh, GeomMeshDiagnostics};
use knot::{FrameworkMesh, KnotConfig, KnotOutput, generate_knot};

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            // no-op fallback when panic hook is disabled
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    // A second call finds the logger already installed.
    let _ = log::set_logger(&DEFAULT_LOGGER);
    log::set_max_level(LevelFilter::Debug);
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {
    // no-op fallback when debug logs are disabled
}

#[cfg(all(feature = "parallel", target_arch = "wasm32"))]
#[wasm_bindgen]
pub async fn initialize_parallel(worker_count: Option<u32>) -> Result<(), JsError> {
    let threads = worker_count
        .map(|count| count.max(1) as usize)
        .or_else(|| {
            std::thread::available_parallelism()
                .map(|value| value.get())
                .ok()
        })
        .unwrap_or(1);

    wasm_bindgen_rayon::init_thread_pool(threads)
        .await
        .map_err(|err| JsError::new(&format!("could not start the rayon thread pool: {err}")))
}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            #[cfg(target_arch = "wasm32")]
            {
                ::web_sys::console::log_1(&::wasm_bindgen::JsValue::from_str(&format!($($t)*)));
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                println!("{}", format!($($t)*));
            }
        }
    }};
}

#[derive(Debug, Serialize)]
struct MeshExport<'a> {
    strand: Option<usize>,
    vertices: &'a [[f64; 3]],
    indices: &'a [u32],
    #[serde(skip_serializing_if = "Option::is_none")]
    normals: Option<&'a [[f64; 3]]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uvs: Option<&'a [[f64; 2]]>,
}

impl<'a> MeshExport<'a> {
    fn new(strand: Option<usize>, mesh: &'a GeomMesh) -> Self {
        Self {
            strand,
            vertices: &mesh.positions,
            indices: &mesh.indices,
            normals: mesh.normals.as_deref(),
            uvs: mesh.uvs.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
struct WarningExport {
    class: &'static str,
    message: String,
    detail: knot::KnotWarning,
}

#[derive(Debug, Serialize)]
struct GenerateSummary {
    strands: usize,
    crossings: usize,
    non_alternating: usize,
    solids: usize,
    warnings: usize,
    diagnostics: GeomMeshDiagnostics,
}

/// Knot generator exposed to JavaScript hosts.
#[wasm_bindgen]
pub struct KnotEngine {
    initialized: bool,
    output: Option<KnotOutput>,
}

impl Default for KnotEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl KnotEngine {
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new() -> KnotEngine {
        KnotEngine {
            initialized: true,
            output: None,
        }
    }

    #[wasm_bindgen]
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Generates a knot from a framework `{ positions, faces, edges }` and an
    /// optional configuration object. Returns a short summary.
    #[wasm_bindgen]
    pub fn generate(&mut self, mesh: JsValue, config: JsValue) -> Result<JsValue, JsValue> {
        let mesh: FrameworkMesh = serde_wasm_bindgen::from_value(mesh).map_err(|err| js_error(&err.to_string()))?;
        let config: KnotConfig = if config.is_undefined() || config.is_null() {
            KnotConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(|err| js_error(&err.to_string()))?
        };

        self.output = None;
        let output = generate_knot(&mesh, &config).map_err(|err| js_error(&err.to_string()))?;
        debug_log!(
            "generated {} strands with {} crossings",
            output.strands.len(),
            output.crossings.len()
        );

        let summary = GenerateSummary {
            strands: output.strands.len(),
            crossings: output.crossings.len(),
            non_alternating: output.crossings.non_alternating_count(),
            solids: output.solids.len(),
            warnings: output.warnings.len(),
            diagnostics: output.diagnostics(),
        };
        self.output = Some(output);
        to_js(&summary)
    }

    /// The merged mesh when merging is enabled, otherwise one mesh per solid.
    #[wasm_bindgen]
    pub fn get_mesh(&self) -> Result<JsValue, JsValue> {
        let output = self.output()?;
        let meshes: Vec<MeshExport<'_>> = match &output.merged {
            Some(merged) => vec![MeshExport::new(None, merged)],
            None => output
                .solids
                .iter()
                .map(|solid| MeshExport::new(Some(solid.strand), &solid.mesh))
                .collect(),
        };
        to_js(&meshes)
    }

    #[wasm_bindgen]
    pub fn get_curves(&self) -> Result<JsValue, JsValue> {
        to_js(&self.output()?.curve_export())
    }

    #[wasm_bindgen]
    pub fn get_warnings(&self) -> Result<JsValue, JsValue> {
        let warnings: Vec<WarningExport> = self
            .output()?
            .warnings
            .iter()
            .map(|warning| WarningExport {
                class: match warning.class() {
                    knot::WarningClass::Topology => "topology",
                    knot::WarningClass::Geometry => "geometry",
                },
                message: warning.to_string(),
                detail: warning.clone(),
            })
            .collect();
        to_js(&warnings)
    }
}

impl KnotEngine {
    fn output(&self) -> Result<&KnotOutput, JsValue> {
        self.output
            .as_ref()
            .ok_or_else(|| js_error("no knot has been generated"))
    }
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|err| JsError::new(&err.to_string()).into())
}

fn js_error(message: &str) -> JsValue {
    JsError::new(message).into()
}
