//! The unified error type for the floorplanning pipeline.

/// Errors that can occur while parsing inputs or running the floorplanner.
///
/// Every failure class surfaces through this one enum; stages never panic and
/// never signal failure through bare booleans. Stages that fail after
/// producing partial geometry (placement, pin alignment) write that geometry
/// back into the design before returning, so callers can inspect it.
#[derive(Debug, thiserror::Error)]
pub enum FloorplanError {
    /// An I/O error occurred while reading an input file.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The path that could not be read.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A line in an input file could not be parsed.
    #[error("{file}:{line}: {message}")]
    Parse {
        /// The file containing the malformed line.
        file: String,
        /// The 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// A net references a block name that is neither a cluster nor a terminal.
    #[error("net references unknown block '{0}'")]
    UnknownBlock(String),

    /// The shape engine found no macro tiling that fits any trial outline.
    #[error("no feasible tiling for cluster '{cluster}'")]
    NoTiling {
        /// The cluster whose macros could not be tiled.
        cluster: String,
    },

    /// The best placement still exceeds the outline after all restarts.
    #[error(
        "placement exceeds outline: {width:.1}x{height:.1} > {outline_width:.1}x{outline_height:.1}"
    )]
    Infeasible {
        /// Achieved packing width.
        width: f64,
        /// Achieved packing height.
        height: f64,
        /// Target outline width.
        outline_width: f64,
        /// Target outline height.
        outline_height: f64,
    },

    /// No feasible pin alignment was found for a cluster.
    #[error("no feasible pin alignment for cluster '{cluster}'")]
    NoAlignment {
        /// The cluster that could not be aligned.
        cluster: String,
    },
}
