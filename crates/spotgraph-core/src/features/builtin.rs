//! Built-in features.

use super::definition::{DependencyScope, FeatureSpec};
use super::value::FeatureValue;

/// Key of [`position_x`].
pub const POSITION_X: &str = "Spot position X";

/// Key of [`link_count`].
pub const LINK_COUNT: &str = "Link count";

/// X coordinate of spots; for links, the X coordinate of the source spot.
///
/// Link values read their endpoints, spot values only the spot itself.
#[must_use]
pub fn position_x() -> FeatureSpec {
    FeatureSpec::new(POSITION_X, DependencyScope::SelfOnly)
        .with_vertex(|v| Ok(FeatureValue::Real(v.x())))
        .with_edge(|e| Ok(FeatureValue::Real(e.source_view()?.x())))
        .with_edge_scope(DependencyScope::SelfAndNeighbors)
}

/// Number of links incident to a spot.
#[must_use]
pub fn link_count() -> FeatureSpec {
    FeatureSpec::new(LINK_COUNT, DependencyScope::SelfAndNeighbors).with_vertex(|v| {
        Ok(FeatureValue::Integer(
            i64::try_from(v.degree()).unwrap_or(i64::MAX),
        ))
    })
}

/// Every built-in feature.
pub(crate) fn all() -> Vec<FeatureSpec> {
    vec![position_x(), link_count()]
}
