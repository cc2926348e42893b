//! Feature registry: feature key -> specification and serializer.

use std::sync::Arc;

use indexmap::IndexMap;

use super::builtin;
use super::definition::FeatureSpec;
use super::serializer::{BincodeFeatureSerializer, FeatureSerializer};
use crate::error::{Error, Result};
use crate::handle::ElementKind;

/// A registered feature.
#[derive(Clone)]
pub struct RegisteredFeature {
    spec: FeatureSpec,
    serializer: Option<Arc<dyn FeatureSerializer>>,
}

impl RegisteredFeature {
    /// The feature specification.
    #[must_use]
    pub fn spec(&self) -> &FeatureSpec {
        &self.spec
    }

    /// The serializer, if the feature can be persisted.
    #[must_use]
    pub fn serializer(&self) -> Option<&dyn FeatureSerializer> {
        self.serializer.as_deref()
    }
}

impl std::fmt::Debug for RegisteredFeature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredFeature")
            .field("spec", &self.spec)
            .field("serializable", &self.serializer.is_some())
            .finish()
    }
}

/// Features known to an engine instance, in registration order.
#[derive(Debug, Default, Clone)]
pub struct FeatureRegistry {
    features: IndexMap<String, RegisteredFeature>,
}

impl FeatureRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in features.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for spec in builtin::all() {
            // Built-in keys are distinct and non-empty.
            if let Err(err) = registry.register_serializable(spec) {
                tracing::error!(error = %err, "failed to register built-in feature");
            }
        }
        registry
    }

    /// Registers a feature.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidFeatureSpec` if the key is blank or nothing is computed
    /// - `Error::DuplicateFeature` if the key is already registered
    pub fn register(
        &mut self,
        spec: FeatureSpec,
        serializer: Option<Arc<dyn FeatureSerializer>>,
    ) -> Result<()> {
        let key = spec.key().to_string();
        if key.trim().is_empty() {
            return Err(Error::InvalidFeatureSpec {
                key,
                reason: "key must not be blank".to_string(),
            });
        }
        if spec.vertex_computer().is_none() && spec.edge_computer().is_none() {
            return Err(Error::InvalidFeatureSpec {
                key,
                reason: "neither a vertex nor an edge computation is defined".to_string(),
            });
        }
        if self.features.contains_key(&key) {
            return Err(Error::DuplicateFeature(key));
        }
        tracing::debug!(
            key = %key,
            vertex_scope = ?spec.scope(ElementKind::Vertex),
            edge_scope = ?spec.scope(ElementKind::Edge),
            serializable = serializer.is_some(),
            "feature registered"
        );
        self.features
            .insert(key, RegisteredFeature { spec, serializer });
        Ok(())
    }

    /// Registers a feature persisted with [`BincodeFeatureSerializer`].
    pub fn register_serializable(&mut self, spec: FeatureSpec) -> Result<()> {
        self.register(spec, Some(Arc::new(BincodeFeatureSerializer)))
    }

    /// Looks up a feature.
    ///
    /// # Errors
    ///
    /// Returns `Error::FeatureNotRegistered` for an unknown key.
    pub fn get(&self, key: &str) -> Result<&RegisteredFeature> {
        self.features
            .get(key)
            .ok_or_else(|| Error::FeatureNotRegistered(key.to_string()))
    }

    /// Looks up the serializer of a feature.
    ///
    /// # Errors
    ///
    /// Returns `Error::FeatureNotRegistered` for an unknown key and
    /// `Error::MissingSerializer` if the feature cannot be persisted.
    pub fn serializer(&self, key: &str) -> Result<&dyn FeatureSerializer> {
        self.get(key)?
            .serializer()
            .ok_or_else(|| Error::MissingSerializer(key.to_string()))
    }

    /// Returns true if `key` is registered.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.features.contains_key(key)
    }

    /// Registered keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.features.keys().map(String::as_str)
    }

    /// Number of registered features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
