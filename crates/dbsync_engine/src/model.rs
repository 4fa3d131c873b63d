//! The fixed order in which models are synchronized.
//!
//! The order is declared, never derived from schema metadata. A model may
//! only reference models that appear before it, so every parent row exists
//! on the destination before its children are written.

use crate::error::{SyncError, SyncResult};
use dbsync_store::is_valid_model_name;
use std::collections::{HashMap, HashSet};

/// Default models with the models each one references.
pub const DEFAULT_MODELS: &[(&str, &[&str])] = &[
    ("user", &[]),
    ("asset", &["user"]),
    ("ticket", &["user", "asset"]),
    ("comment", &["user", "ticket"]),
    ("notification", &["user"]),
    ("auditLog", &["user"]),
];

/// A model and its place in the order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    name: String,
    position: usize,
    depends_on: Vec<String>,
}

impl ModelDescriptor {
    /// The model name, also its table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Zero-based position in the order.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Models this one references.
    pub fn depends_on(&self) -> &[String] {
        &self.depends_on
    }
}

/// A validated, non-empty sequence of models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelOrder {
    models: Vec<ModelDescriptor>,
}

impl ModelOrder {
    /// Builds an order from plain names with no declared dependencies.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidModelOrder`] if the list is empty, has
    /// duplicates, or contains a name that is not a plain identifier.
    pub fn new<I, S>(names: I) -> SyncResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::build(names.into_iter().map(|name| (name.into(), Vec::new())))
    }

    /// Builds an order from `(model, dependencies)` declarations.
    ///
    /// # Errors
    ///
    /// In addition to the checks of [`ModelOrder::new`], fails if a model
    /// depends on an undeclared model, on itself, or on a model declared
    /// after it.
    pub fn from_declarations(declarations: &[(&str, &[&str])]) -> SyncResult<Self> {
        Self::build(declarations.iter().map(|(name, deps)| {
            (
                (*name).to_string(),
                deps.iter().map(|dep| (*dep).to_string()).collect(),
            )
        }))
    }

    /// The built-in order: user, asset, ticket, comment, notification, auditLog.
    pub fn default_order() -> Self {
        let models = DEFAULT_MODELS
            .iter()
            .enumerate()
            .map(|(position, (name, deps))| ModelDescriptor {
                name: (*name).to_string(),
                position,
                depends_on: deps.iter().map(|dep| (*dep).to_string()).collect(),
            })
            .collect();
        Self { models }
    }

    fn build(entries: impl Iterator<Item = (String, Vec<String>)>) -> SyncResult<Self> {
        let models: Vec<ModelDescriptor> = entries
            .enumerate()
            .map(|(position, (name, depends_on))| ModelDescriptor {
                name,
                position,
                depends_on,
            })
            .collect();
        let order = Self { models };
        order.validate()?;
        Ok(order)
    }

    /// Checks the order against its own declarations.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidModelOrder`] describing the first problem.
    pub fn validate(&self) -> SyncResult<()> {
        if self.models.is_empty() {
            return Err(SyncError::model_order("no models configured"));
        }

        let mut positions: HashMap<&str, usize> = HashMap::new();
        for model in &self.models {
            if !is_valid_model_name(&model.name) {
                return Err(SyncError::model_order(format!(
                    "{:?} is not a valid model name",
                    model.name
                )));
            }
            if positions.insert(&model.name, model.position).is_some() {
                return Err(SyncError::model_order(format!(
                    "model {} is listed more than once",
                    model.name
                )));
            }
        }

        for model in &self.models {
            for dep in &model.depends_on {
                match positions.get(dep.as_str()) {
                    None => {
                        return Err(SyncError::model_order(format!(
                            "{} depends on undeclared model {dep}",
                            model.name
                        )))
                    }
                    Some(&position) if position >= model.position => {
                        return Err(SyncError::model_order(format!(
                            "{} must come after {dep}, which it references",
                            model.name
                        )))
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }

    /// Restricts the order to `names`, keeping the declared sequence.
    ///
    /// Dependencies on models left out are dropped; those models are simply
    /// not part of this run.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidModelOrder`] if a name is unknown or the
    /// selection is empty.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> SyncResult<Self> {
        let wanted: HashSet<&str> = names.iter().map(AsRef::as_ref).collect();
        if let Some(unknown) = wanted.iter().find(|name| self.get(name).is_none()) {
            return Err(SyncError::model_order(format!("unknown model {unknown}")));
        }

        Self::build(
            self.models
                .iter()
                .filter(|model| wanted.contains(model.name.as_str()))
                .map(|model| {
                    let deps = model
                        .depends_on
                        .iter()
                        .filter(|dep| wanted.contains(dep.as_str()))
                        .cloned()
                        .collect();
                    (model.name.clone(), deps)
                }),
        )
    }

    /// Looks up a model by name.
    pub fn get(&self, name: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|model| model.name == name)
    }

    /// Iterates models in processing order.
    pub fn iter(&self) -> impl Iterator<Item = &ModelDescriptor> {
        self.models.iter()
    }

    /// Model names in processing order.
    pub fn names(&self) -> Vec<&str> {
        self.models.iter().map(|model| model.name.as_str()).collect()
    }

    /// Number of models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Always false for a validated order; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl<'a> IntoIterator for &'a ModelOrder {
    type Item = &'a ModelDescriptor;
    type IntoIter = std::slice::Iter<'a, ModelDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.models.iter()
    }
}
