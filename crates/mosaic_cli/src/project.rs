//! Shared project helpers for CLI commands.
//!
//! Contains the utilities both `plan` and `check` need: project root
//! resolution, design loading from the configured input files, mapping the
//! configuration tables onto pipeline parameters, and diagnostic printing.

use std::path::{Path, PathBuf};

use mosaic_config::{AnnealConfig, ProjectConfig};
use mosaic_diagnostics::{DiagnosticSink, Severity};
use mosaic_floorplan::{load_design, CostWeights, Design, FloorplanParams, SaParams};

use crate::GlobalArgs;

/// Walks up from `start` looking for the nearest directory containing `mosaic.toml`.
///
/// Returns the directory containing `mosaic.toml`, or an error if none is found.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join("mosaic.toml").exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find mosaic.toml in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Resolves the project root directory from global CLI args.
///
/// If `--config` is specified, uses that path (file → parent dir, dir →
/// itself). Otherwise walks up from the current directory looking for
/// `mosaic.toml`.
pub fn resolve_project_root(global: &GlobalArgs) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(ref config_path) = global.config {
        let p = PathBuf::from(config_path);
        if p.is_file() {
            Ok(p.parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".")))
        } else {
            Ok(p)
        }
    } else {
        find_project_root(&std::env::current_dir()?)
    }
}

/// Loads the design from the input files named in the configuration.
///
/// Relative paths resolve against the project root.
pub fn load_project_design(
    config: &ProjectConfig,
    project_dir: &Path,
) -> Result<Design, Box<dyn std::error::Error>> {
    let blocks = project_dir.join(&config.design.blocks);
    let nets = project_dir.join(&config.design.nets);
    let regions = config
        .design
        .regions
        .as_ref()
        .map(|r| project_dir.join(r));
    Ok(load_design(&blocks, &nets, regions.as_deref())?)
}

fn sa_params(anneal: &AnnealConfig) -> SaParams {
    SaParams {
        max_steps: anneal.max_steps,
        moves_per_step: anneal.moves_per_step,
        init_accept_prob: anneal.init_accept_prob,
        cooling_rate: anneal.cooling_rate,
        max_restarts: anneal.max_restarts,
    }
}

/// Maps the configuration tables onto pipeline parameters.
///
/// Stage seeds are derived from the master seed (CLI override first, then
/// the configured one) exactly as [`FloorplanParams::new`] does.
pub fn build_params(config: &ProjectConfig, seed_override: Option<u64>) -> FloorplanParams {
    let seed = seed_override.unwrap_or(config.floorplan.seed);
    let mut params = FloorplanParams::new(config.outline.width, config.outline.height, seed);

    params.shape.min_aspect_ratio = config.shape.min_aspect_ratio;
    params.shape.dead_space = config.shape.dead_space;
    params.shape.halo_width = config.shape.halo_width;
    params.shape.num_threads = config.shape.num_threads;
    params.shape.num_runs = config.shape.num_runs;
    params.shape.sa = sa_params(&config.shape.anneal);

    params.placement.num_levels = config.placement.num_levels;
    params.placement.num_workers = config.placement.num_workers;
    params.placement.resize_prob = config.placement.resize_prob;
    params.placement.pos_swap_prob = config.placement.pos_swap_prob;
    params.placement.neg_swap_prob = config.placement.neg_swap_prob;
    params.placement.heat_rate = config.placement.heat_rate;
    params.placement.weights = CostWeights {
        area: config.placement.weights.area,
        wirelength: config.placement.weights.wirelength,
        outline: config.placement.weights.outline,
        boundary: config.placement.weights.boundary,
        blockage: config.placement.weights.blockage,
    };
    params.placement.sa = sa_params(&config.placement.anneal);

    params.pin_align.halo_width = config.pin_align.halo_width;
    params.pin_align.num_threads = config.pin_align.num_threads;
    params.pin_align.num_runs = config.pin_align.num_runs;
    params.pin_align.flip_prob = config.pin_align.flip_prob;
    params.pin_align.sa = sa_params(&config.pin_align.anneal);

    params
}

/// Prints accumulated diagnostics to stderr according to the verbosity flags.
///
/// Errors always print; warnings are suppressed by `--quiet`; report-level
/// progress lines print only with `--verbose`.
pub fn print_diagnostics(sink: &DiagnosticSink, global: &GlobalArgs) {
    for diag in sink.diagnostics() {
        let show = match diag.severity {
            Severity::Error => true,
            Severity::Warning => !global.quiet,
            Severity::Report => global.verbose && !global.quiet,
        };
        if show {
            eprintln!("{}", diag.render());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_config::load_config_from_str;
    use std::fs;
    use tempfile::TempDir;

    const MINIMAL: &str = r#"
[design]
name = "t"
blocks = "t.blocks"
nets = "t.nets"

[outline]
width = 500.0
height = 400.0
"#;

    fn global(config: Option<String>) -> GlobalArgs {
        GlobalArgs {
            quiet: false,
            verbose: false,
            config,
        }
    }

    #[test]
    fn find_root_walks_up() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("mosaic.toml"), MINIMAL).unwrap();
        let nested = tmp.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        let root = find_project_root(&nested).unwrap();
        assert_eq!(root, tmp.path());
    }

    #[test]
    fn find_root_fails_without_config() {
        let tmp = TempDir::new().unwrap();
        assert!(find_project_root(tmp.path()).is_err());
    }

    #[test]
    fn resolve_root_from_config_file() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("mosaic.toml");
        fs::write(&config_path, MINIMAL).unwrap();
        let g = global(Some(config_path.to_str().unwrap().to_string()));
        assert_eq!(resolve_project_root(&g).unwrap(), tmp.path());
    }

    #[test]
    fn resolve_root_from_config_dir() {
        let tmp = TempDir::new().unwrap();
        let g = global(Some(tmp.path().to_str().unwrap().to_string()));
        assert_eq!(resolve_project_root(&g).unwrap(), tmp.path());
    }

    #[test]
    fn params_carry_outline_and_seed() {
        let config = load_config_from_str(&format!(
            "{MINIMAL}
[floorplan]
seed = 9
"
        ))
        .unwrap();
        let params = build_params(&config, None);
        assert_eq!(params.shape.outline_width, 500.0);
        assert_eq!(params.placement.outline_height, 400.0);
        assert_eq!(params.shape.seed, 9);
        assert_eq!(params.placement.seed, 10);
        assert_eq!(params.pin_align.seed, 11);
    }

    #[test]
    fn seed_override_wins() {
        let config = load_config_from_str(MINIMAL).unwrap();
        let params = build_params(&config, Some(100));
        assert_eq!(params.shape.seed, 100);
    }

    #[test]
    fn params_map_stage_tables() {
        let config = load_config_from_str(&format!(
            "{MINIMAL}
[shape]
min_aspect_ratio = 0.5
num_runs = 3

[placement]
num_workers = 7
resize_prob = 0.3

[placement.weights]
area = 0.6

[placement.anneal]
cooling_rate = 0.9

[pin_align]
flip_prob = 0.25
"
        ))
        .unwrap();
        let params = build_params(&config, None);
        assert_eq!(params.shape.min_aspect_ratio, 0.5);
        assert_eq!(params.shape.num_runs, 3);
        assert_eq!(params.placement.num_workers, 7);
        assert_eq!(params.placement.resize_prob, 0.3);
        assert_eq!(params.placement.weights.area, 0.6);
        assert_eq!(params.placement.sa.cooling_rate, 0.9);
        assert_eq!(params.pin_align.flip_prob, 0.25);
        // Untouched fields keep their defaults.
        assert_eq!(params.shape.sa.max_steps, 300);
        assert_eq!(params.pin_align.num_runs, 8);
    }

    #[test]
    fn load_design_resolves_relative_paths() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("t.blocks"),
            "cluster a 100\nterminal clk 0 10\n",
        )
        .unwrap();
        fs::write(tmp.path().join("t.nets"), "source: a clk 2\n").unwrap();
        let config = load_config_from_str(MINIMAL).unwrap();
        let design = load_project_design(&config, tmp.path()).unwrap();
        assert_eq!(design.clusters.len(), 1);
        assert_eq!(design.nets.len(), 1);
        assert!(design.regions.is_empty());
    }
}
