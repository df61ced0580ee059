#[cfg(target_arch = "wasm32")]
fn main() {
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("knot_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use knot_engine::geom::{BBox, GeomMesh, GeomMeshDiagnostics, Point3};
    use knot_engine::knot::{FrameworkMesh, KnotConfig, KnotOutput, Profile, generate_knot, primitives};
    use std::fmt::Write as _;
    use std::fs::{self, File};
    use std::io::{BufWriter, Write};
    use std::path::{Path, PathBuf};

    const SNAPSHOT_QUANTIZE: f64 = 1e-6;
    const SNAPSHOT_DECIMALS: usize = 6;

    const USAGE: &str = r#"knot_cli (knot-engine)

USAGE:
  knot_cli list
  knot_cli run <scenario|all> [options]

SCENARIOS:
  tetrahedron
  cube
  octahedron
  quad_loop
  grid
  torus

OPTIONS (run):
  --out-dir <dir>    Write <scenario>.obj, <scenario>.curves.json and <scenario>.snap to this dir (required for `all`)
  --obj <path>       Write OBJ (single scenario only)
  --curves <path>    Write curve control points as JSON (single scenario only)
  --snap <path>      Write golden-style snapshot (single scenario only)
  --seed <n>         Alternation seed (default 0)
  --no-obj           Skip OBJ when using --out-dir
  --no-curves        Skip curve JSON when using --out-dir
  --no-snap          Skip snapshot when using --out-dir
  --overwrite        Overwrite existing output files
  -h, --help         Show this help
"#;

    pub fn run() -> Result<(), String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut args = Args::new(args);

        let Some(command) = args.next() else {
            print_usage();
            return Ok(());
        };

        match command.as_str() {
            "list" => {
                print_scenarios();
                Ok(())
            }
            "run" => cmd_run(&mut args),
            "-h" | "--help" | "help" => {
                print_usage();
                Ok(())
            }
            other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
        }
    }

    fn print_usage() {
        println!("{USAGE}");
    }

    fn print_scenarios() {
        for scenario in Scenario::ALL {
            println!("{}", scenario.name());
        }
    }

    #[derive(Debug, Clone, Copy)]
    struct Outputs {
        obj: bool,
        curves: bool,
        snap: bool,
        overwrite: bool,
    }

    fn cmd_run(args: &mut Args) -> Result<(), String> {
        let scenario_name = args.next().ok_or("missing scenario name")?;

        let mut out_dir: Option<PathBuf> = None;
        let mut obj_path: Option<PathBuf> = None;
        let mut curves_path: Option<PathBuf> = None;
        let mut snap_path: Option<PathBuf> = None;
        let mut seed = 0u64;
        let mut outputs = Outputs {
            obj: true,
            curves: true,
            snap: true,
            overwrite: false,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--out-dir" => out_dir = Some(PathBuf::from(args.value("--out-dir")?)),
                "--obj" => obj_path = Some(PathBuf::from(args.value("--obj")?)),
                "--curves" => curves_path = Some(PathBuf::from(args.value("--curves")?)),
                "--snap" => snap_path = Some(PathBuf::from(args.value("--snap")?)),
                "--seed" => {
                    let value = args.value("--seed")?;
                    seed = value
                        .parse()
                        .map_err(|_| format!("--seed expects an unsigned integer (got `{value}`)"))?;
                }
                "--overwrite" => outputs.overwrite = true,
                "--no-obj" => outputs.obj = false,
                "--no-curves" => outputs.curves = false,
                "--no-snap" => outputs.snap = false,
                "-h" | "--help" => {
                    print_usage();
                    return Ok(());
                }
                other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
            }
        }

        if let Some(dir) = out_dir.as_ref() {
            if obj_path.is_some() || curves_path.is_some() || snap_path.is_some() {
                return Err("use either --out-dir or --obj/--curves/--snap (not both)".to_string());
            }
            if !outputs.obj && !outputs.curves && !outputs.snap {
                return Err("nothing to write (--no-obj, --no-curves and --no-snap all set)".to_string());
            }

            fs::create_dir_all(dir).map_err(|e| format!("create out dir: {e}"))?;

            if scenario_name == "all" {
                for scenario in Scenario::ALL {
                    run_one_scenario_to_dir(*scenario, seed, dir, outputs)?;
                }
                return Ok(());
            }

            let scenario = Scenario::from_str(scenario_name.as_str())
                .ok_or_else(|| unknown_scenario(&scenario_name))?;
            return run_one_scenario_to_dir(scenario, seed, dir, outputs);
        }

        if scenario_name == "all" {
            return Err("`run all` requires --out-dir".to_string());
        }

        let scenario =
            Scenario::from_str(scenario_name.as_str()).ok_or_else(|| unknown_scenario(&scenario_name))?;
        let output = run_scenario(scenario, seed)?;

        if let Some(path) = snap_path.as_deref() {
            write_text_file(path, &output.snapshot, outputs.overwrite)?;
            eprintln!("wrote {}", path.display());
        } else {
            print!("{}", output.snapshot);
        }

        if let Some(path) = obj_path.as_deref() {
            write_obj_file(path, &output.mesh, output.name, outputs.overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        if let Some(path) = curves_path.as_deref() {
            write_text_file(path, &output.curves_json, outputs.overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        print_summary(&output);
        Ok(())
    }

    fn run_one_scenario_to_dir(scenario: Scenario, seed: u64, dir: &Path, outputs: Outputs) -> Result<(), String> {
        let output = run_scenario(scenario, seed)?;

        if outputs.snap {
            let path = dir.join(format!("{}.snap", output.name));
            write_text_file(&path, &output.snapshot, outputs.overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        if outputs.curves {
            let path = dir.join(format!("{}.curves.json", output.name));
            write_text_file(&path, &output.curves_json, outputs.overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        if outputs.obj {
            let path = dir.join(format!("{}.obj", output.name));
            write_obj_file(&path, &output.mesh, output.name, outputs.overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        print_summary(&output);
        Ok(())
    }

    fn print_summary(output: &ScenarioOutput) {
        eprintln!(
            "{}: strands={} crossings={} vertices={} triangles={} warnings={} | {}",
            output.name,
            output.strands,
            output.crossings,
            output.mesh.vertex_count(),
            output.mesh.triangle_count(),
            output.warnings,
            output.mesh_diag.summary()
        );
    }

    fn unknown_scenario(name: &str) -> String {
        let mut message = format!("unknown scenario `{name}`; available:");
        for scenario in Scenario::ALL {
            let _ = write!(message, " {}", scenario.name());
        }
        message
    }

    fn write_text_file(path: &Path, text: &str, overwrite: bool) -> Result<(), String> {
        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }
        fs::write(path, normalize_snapshot_text(text)).map_err(|e| format!("write {}: {e}", path.display()))
    }

    fn write_obj_file(path: &Path, mesh: &GeomMesh, name: &str, overwrite: bool) -> Result<(), String> {
        mesh.validate().map_err(|e| format!("mesh validation failed: {e}"))?;

        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }

        let file = File::create(path).map_err(|e| format!("create {}: {e}", path.display()))?;
        let mut w = BufWriter::new(file);

        writeln!(w, "# knot-engine knot_cli").map_err(|e| format!("write obj: {e}"))?;
        writeln!(w, "o {name}").map_err(|e| format!("write obj: {e}"))?;

        for p in mesh.positions.iter().copied() {
            writeln!(w, "v {} {} {}", p[0], p[1], p[2]).map_err(|e| format!("write obj: {e}"))?;
        }

        if let Some(uvs) = mesh.uvs.as_ref() {
            for uv in uvs.iter().copied() {
                writeln!(w, "vt {} {}", uv[0], uv[1]).map_err(|e| format!("write obj: {e}"))?;
            }
        }

        if let Some(normals) = mesh.normals.as_ref() {
            for n in normals.iter().copied() {
                writeln!(w, "vn {} {} {}", n[0], n[1], n[2]).map_err(|e| format!("write obj: {e}"))?;
            }
        }

        let has_uvs = mesh.uvs.is_some();
        let has_normals = mesh.normals.is_some();

        for tri in mesh.indices.chunks_exact(3) {
            let a = tri[0] + 1;
            let b = tri[1] + 1;
            let c = tri[2] + 1;

            match (has_uvs, has_normals) {
                (true, true) => writeln!(w, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}"),
                (true, false) => writeln!(w, "f {a}/{a} {b}/{b} {c}/{c}"),
                (false, true) => writeln!(w, "f {a}//{a} {b}//{b} {c}//{c}"),
                (false, false) => writeln!(w, "f {a} {b} {c}"),
            }
            .map_err(|e| format!("write obj: {e}"))?;
        }

        w.flush().map_err(|e| format!("flush {}: {e}", path.display()))
    }

    fn normalize_snapshot_text(text: &str) -> String {
        let normalized = text.replace("\r\n", "\n");
        if normalized.ends_with('\n') {
            normalized
        } else {
            format!("{normalized}\n")
        }
    }

    fn quantize_f64(value: f64) -> f64 {
        if !value.is_finite() {
            return value;
        }
        let value = if value == -0.0 { 0.0 } else { value };
        let q = (value / SNAPSHOT_QUANTIZE).round() * SNAPSHOT_QUANTIZE;
        if q == -0.0 { 0.0 } else { q }
    }

    fn write_f64(out: &mut String, value: f64) {
        let value = quantize_f64(value);
        let _ = write!(out, "{value:.SNAPSHOT_DECIMALS$}");
    }

    fn write_point_line(out: &mut String, prefix: &str, p: Point3) {
        let _ = write!(out, "{prefix} ");
        write_f64(out, p.x);
        out.push(' ');
        write_f64(out, p.y);
        out.push(' ');
        write_f64(out, p.z);
        out.push('\n');
    }

    fn write_geom_mesh_diagnostics(out: &mut String, diag: &GeomMeshDiagnostics) {
        let _ = writeln!(out, "mesh_diag.vertex_count {}", diag.vertex_count);
        let _ = writeln!(out, "mesh_diag.triangle_count {}", diag.triangle_count);
        let _ = writeln!(out, "mesh_diag.welded_vertex_count {}", diag.welded_vertex_count);
        let _ = writeln!(out, "mesh_diag.flipped_triangle_count {}", diag.flipped_triangle_count);
        let _ = writeln!(
            out,
            "mesh_diag.degenerate_triangle_count {}",
            diag.degenerate_triangle_count
        );
        let _ = writeln!(out, "mesh_diag.open_edge_count {}", diag.open_edge_count);
        let _ = writeln!(
            out,
            "mesh_diag.non_manifold_edge_count {}",
            diag.non_manifold_edge_count
        );
        let _ = writeln!(out, "mesh_diag.warning_count {}", diag.warnings.len());
        for (idx, warning) in diag.warnings.iter().enumerate() {
            let _ = writeln!(out, "mesh_diag.warning.{idx} {warning}");
        }
    }

    fn write_knot(out: &mut String, output: &KnotOutput) {
        let _ = writeln!(out, "knot.strand_count {}", output.strands.len());
        for (idx, strand) in output.strands.iter().enumerate() {
            let _ = writeln!(
                out,
                "strand.{idx} nodes={} closed={} events={}",
                strand.len(),
                strand.closed,
                output.crossings.events_for(idx).len()
            );
        }

        let _ = writeln!(out, "knot.crossing_count {}", output.crossings.len());
        for (idx, crossing) in output.crossings.crossings.iter().enumerate() {
            let _ = writeln!(
                out,
                "crossing.{idx} {} strands={},{} over={} alternating={}",
                crossing.location, crossing.strands[0], crossing.strands[1], crossing.over, crossing.alternating
            );
        }

        let _ = writeln!(out, "knot.warning_count {}", output.warnings.len());
        for (idx, warning) in output.warnings.iter().enumerate() {
            let _ = writeln!(out, "knot.warning.{idx} {warning}");
        }

        for (idx, curve) in output.curves.iter().enumerate() {
            let _ = writeln!(out, "curve.{idx} points={} closed={}", curve.points.len(), curve.closed);
            for point in &curve.points {
                write_point_line(out, "a", point.anchor);
            }
        }
    }

    fn write_mesh_summary(out: &mut String, mesh: &GeomMesh) {
        let _ = writeln!(out, "mesh.vertex_count {}", mesh.vertex_count());
        let _ = writeln!(out, "mesh.triangle_count {}", mesh.triangle_count());
        let _ = writeln!(out, "mesh.euler_characteristic {}", mesh.euler_characteristic());
        let points: Vec<Point3> = mesh.positions.iter().copied().map(Point3::from).collect();
        if let Some(bbox) = BBox::from_points(&points) {
            write_point_line(out, "mesh.bbox_min", bbox.min);
            write_point_line(out, "mesh.bbox_max", bbox.max);
        } else {
            let _ = writeln!(out, "mesh.bbox none");
        }
    }

    fn snapshot(scenario: &str, sections: impl FnOnce(&mut String)) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# knot-engine golden v1");
        let _ = writeln!(out, "scenario {scenario}");
        let _ = writeln!(out, "quantize {SNAPSHOT_QUANTIZE:.1e}");
        sections(&mut out);
        normalize_snapshot_text(&out)
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Scenario {
        Tetrahedron,
        Cube,
        Octahedron,
        QuadLoop,
        Grid,
        Torus,
    }

    impl Scenario {
        const ALL: &'static [Scenario] = &[
            Scenario::Tetrahedron,
            Scenario::Cube,
            Scenario::Octahedron,
            Scenario::QuadLoop,
            Scenario::Grid,
            Scenario::Torus,
        ];

        fn name(self) -> &'static str {
            match self {
                Scenario::Tetrahedron => "tetrahedron",
                Scenario::Cube => "cube",
                Scenario::Octahedron => "octahedron",
                Scenario::QuadLoop => "quad_loop",
                Scenario::Grid => "grid",
                Scenario::Torus => "torus",
            }
        }

        fn from_str(name: &str) -> Option<Self> {
            Scenario::ALL.iter().copied().find(|scenario| scenario.name() == name)
        }

        fn framework(self) -> FrameworkMesh {
            match self {
                Scenario::Tetrahedron => primitives::tetrahedron(),
                Scenario::Cube => primitives::cube(),
                Scenario::Octahedron => primitives::octahedron(),
                Scenario::QuadLoop => primitives::quad_loop(),
                Scenario::Grid => primitives::grid(3, 3),
                Scenario::Torus => primitives::torus_grid(8, 6, 2.0, 0.75),
            }
        }

        fn config(self, seed: u64) -> KnotConfig {
            let profile = match self {
                Scenario::Grid => Profile::Ribbon {
                    width: 0.2,
                    thickness: 0.04,
                },
                Scenario::Torus => Profile::Pipe { radius: 0.06 },
                _ => Profile::default(),
            };
            KnotConfig {
                profile,
                alternation_seed: seed,
                merge_output: true,
                ..KnotConfig::default()
            }
        }
    }

    struct ScenarioOutput {
        name: &'static str,
        mesh: GeomMesh,
        mesh_diag: GeomMeshDiagnostics,
        curves_json: String,
        strands: usize,
        crossings: usize,
        warnings: usize,
        snapshot: String,
    }

    fn run_scenario(scenario: Scenario, seed: u64) -> Result<ScenarioOutput, String> {
        let output = generate_knot(&scenario.framework(), &scenario.config(seed)).map_err(|e| e.to_string())?;
        let mesh = output.merged.clone().unwrap_or_default();
        let mesh_diag = output.diagnostics();
        let curves_json =
            serde_json::to_string_pretty(&output.curve_export()).map_err(|e| format!("encode curves: {e}"))?;

        let snapshot = snapshot(scenario.name(), |out| {
            let _ = writeln!(out, "seed {seed}");
            write_knot(out, &output);
            write_mesh_summary(out, &mesh);
            write_geom_mesh_diagnostics(out, &mesh_diag);
        });

        Ok(ScenarioOutput {
            name: scenario.name(),
            strands: output.strands.len(),
            crossings: output.crossings.len(),
            warnings: output.warnings.len(),
            mesh,
            mesh_diag,
            curves_json,
            snapshot,
        })
    }

    struct Args {
        args: Vec<String>,
        pos: usize,
    }

    impl Args {
        fn new(args: Vec<String>) -> Self {
            Self { args, pos: 0 }
        }

        fn next(&mut self) -> Option<String> {
            let arg = self.args.get(self.pos)?.clone();
            self.pos += 1;
            Some(arg)
        }

        fn value(&mut self, flag: &str) -> Result<String, String> {
            self.next()
                .ok_or_else(|| format!("missing value for {flag}"))
        }
    }
}
