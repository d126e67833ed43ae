//! API clients for external services
//!
//! - Resolver: playable stream links and subtitle descriptors for an item
//! - Recommendations: related items shown under the player

pub mod recommendations;
pub mod resolver;

pub use recommendations::{HttpRecommendations, RecommendationService};
pub use resolver::{HttpSourceResolver, ResolveError, SourceResolver};
