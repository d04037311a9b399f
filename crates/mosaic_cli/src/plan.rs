//! `mosaic plan` — run the complete floorplanning pipeline.
//!
//! Loads the project configuration and design inputs, runs the shape,
//! placement, and pin-alignment stages, and writes the floorplan dump (plus
//! an optional JSON report). The dump is written even when the run fails, so
//! an infeasible result can be inspected.

use mosaic_diagnostics::DiagnosticSink;
use mosaic_floorplan::{run_floorplan, write_floorplan};

use crate::project;
use crate::{GlobalArgs, PlanArgs};

/// Runs the `mosaic plan` command.
///
/// Returns exit code 0 on a feasible floorplan, 1 on failure.
pub fn run(args: &PlanArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project_dir = project::resolve_project_root(global)?;
    let config = mosaic_config::load_config(&project_dir)?;

    if !global.quiet {
        eprintln!(
            "   Planning {} ({}x{} outline)",
            config.design.name, config.outline.width, config.outline.height
        );
    }

    let mut design = project::load_project_design(&config, &project_dir)?;
    let params = project::build_params(&config, args.seed);

    let sink = DiagnosticSink::new();
    let result = run_floorplan(&mut design, &params, &sink);
    project::print_diagnostics(&sink, global);

    let output = project_dir.join(&args.output);
    write_floorplan(&design, &output)?;

    match result {
        Ok(report) => {
            if let Some(ref json) = args.json {
                let path = project_dir.join(json);
                std::fs::write(&path, serde_json::to_string_pretty(&report)?)?;
            }
            if !global.quiet {
                eprintln!(
                    "   Result: {:.1}x{:.1} in {:.1}x{:.1}, wirelength {:.1}",
                    report.width,
                    report.height,
                    report.outline_width,
                    report.outline_height,
                    report.wirelength
                );
                eprintln!("   Wrote {}", output.display());
            }
            Ok(0)
        }
        Err(err) => {
            eprintln!("error: {err}");
            if !global.quiet {
                eprintln!("   Wrote partial geometry to {}", output.display());
            }
            Ok(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
[design]
name = "tiny"
blocks = "tiny.blocks"
nets = "tiny.nets"

[outline]
width = 900.0
height = 900.0

[floorplan]
seed = 7

[shape]
num_threads = 2
num_runs = 4

[shape.anneal]
max_steps = 25
moves_per_step = 20

[placement]
num_levels = 2
num_workers = 2

[placement.anneal]
max_steps = 40
moves_per_step = 30

[pin_align]
num_threads = 2
num_runs = 4

[pin_align.anneal]
max_steps = 25
moves_per_step = 20
"#;

    const BLOCKS: &str = "\
cluster cpu 0
cluster buf 40000
macro cpu ram0 180 120 10 10
macro cpu ram1 120 180 0 0
terminal clk 0 400
";

    fn write_project(dir: &Path) {
        fs::write(dir.join("mosaic.toml"), CONFIG).unwrap();
        fs::write(dir.join("tiny.blocks"), BLOCKS).unwrap();
        fs::write(dir.join("tiny.nets"), "source: cpu buf 2 clk 1\n").unwrap();
    }

    fn global(dir: &Path) -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            config: Some(dir.to_str().unwrap().to_string()),
        }
    }

    #[test]
    fn plan_writes_floorplan_and_report() {
        let tmp = TempDir::new().unwrap();
        write_project(tmp.path());
        let args = PlanArgs {
            output: "fp.out".to_string(),
            json: Some("fp.json".to_string()),
            seed: None,
        };

        let code = run(&args, &global(tmp.path())).unwrap();

        assert_eq!(code, 0);
        let dump = fs::read_to_string(tmp.path().join("fp.out")).unwrap();
        // Two clusters plus two macros.
        assert_eq!(dump.lines().count(), 4);
        let json = fs::read_to_string(tmp.path().join("fp.json")).unwrap();
        let report: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(report["feasible"], serde_json::Value::Bool(true));
        assert_eq!(report["clusters"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn plan_infeasible_exits_nonzero_but_dumps_geometry() {
        let tmp = TempDir::new().unwrap();
        write_project(tmp.path());
        // Shrink the outline so the macros cannot fit.
        let squeezed = CONFIG
            .replace("width = 900.0", "width = 100.0")
            .replace("height = 900.0", "height = 100.0");
        fs::write(tmp.path().join("mosaic.toml"), squeezed).unwrap();
        let args = PlanArgs {
            output: "fp.out".to_string(),
            json: None,
            seed: None,
        };

        let code = run(&args, &global(tmp.path())).unwrap();

        assert_eq!(code, 1);
        assert!(tmp.path().join("fp.out").exists());
    }

    #[test]
    fn plan_missing_input_file_errors() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("mosaic.toml"), CONFIG).unwrap();
        let args = PlanArgs {
            output: "fp.out".to_string(),
            json: None,
            seed: None,
        };
        assert!(run(&args, &global(tmp.path())).is_err());
    }
}
