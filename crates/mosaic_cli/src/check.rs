//! `mosaic check` — validate configuration and design inputs.
//!
//! Loads and validates `mosaic.toml`, parses the block, net, and region
//! files, and resolves every net reference, without running any annealing.

use crate::project;
use crate::GlobalArgs;

/// Runs the `mosaic check` command.
///
/// Returns exit code 0 when the configuration and inputs are consistent;
/// any load, parse, or resolution failure propagates as an error.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project_dir = project::resolve_project_root(global)?;
    let config = mosaic_config::load_config(&project_dir)?;
    let design = project::load_project_design(&config, &project_dir)?;

    // Surfaces nets referencing names that are neither clusters nor terminals.
    design.resolve_nets()?;

    if !global.quiet {
        let macro_count: usize = design.clusters.iter().map(|c| c.macros.len()).sum();
        eprintln!(
            "   Checked {}: {} cluster(s), {} macro(s), {} net(s), {} terminal(s), {} region(s)",
            config.design.name,
            design.clusters.len(),
            macro_count,
            design.nets.len(),
            design.terminals.len(),
            design.regions.len()
        );
    }
    Ok(0)
}
