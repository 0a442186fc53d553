//! KGX Explorer - interactive exploration over a knowledge graph index
//!
//! Consolidates what a caller needs to drive exploration into one session:
//! - Selection (single or multi), expansion and insight filters
//! - Highlighted path by shortest search or by external ranking
//! - Relevant-set and cluster queries scoped to the session state
//!
//! # Example
//!
//! ```rust,ignore
//! use kgx_explorer::{ExplorationSession, ExplorerConfig, HeuristicOracle, SelectionMode};
//! use std::sync::Arc;
//!
//! # use kgx_explorer::ExplorerError;
//! # async fn example(index: Arc<kgx_graph::GraphIndex>) -> Result<(), ExplorerError> {
//! let oracle = Arc::new(HeuristicOracle);
//! let session = ExplorationSession::with_oracle(index, ExplorerConfig::new(), oracle);
//! session.set_selection_mode(SelectionMode::Multi);
//! session.toggle_multi_select("acme")?;
//! session.toggle_multi_select("globex")?;
//!
//! let outcome = session.request_ranked_path().await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod oracle;
pub mod session;
pub mod state;

// Re-exports for convenience
pub use config::ExplorerConfig;
pub use error::{ConfigError, ExplorerError, OracleError};
pub use oracle::{HeuristicOracle, NoOracle, RankingOracle, RankingRequest, RankingResponse};
pub use session::{CandidateCount, ExplorationSession, PathOutcome, RankedPathOutcome};
pub use state::{ExplorationState, PathAnnotation, SelectionMode, Toggle};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving a session
    pub use crate::{
        ExplorationSession, ExplorerConfig, ExplorerError, PathOutcome, RankedPathOutcome,
        RankingOracle, SelectionMode, Toggle,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
