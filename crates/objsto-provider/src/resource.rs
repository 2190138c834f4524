//! Resource lifecycle abstraction.
//!
//! Every managed object type implements [`Resource`] with its own typed
//! model. The provider keeps resources behind the object-safe
//! [`AnyResource`] view, which speaks `serde_json::Value` so that one
//! registry can hold every type.
//!
//! ```text
//!   caller ── Value ──▶ AnyResource (blanket impl) ── Model ──▶ Resource ──▶ StorageClient
//!          ◀─ Response<Value> ──────────────────────── Response<Model> ◀──
//! ```

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::diagnostics::Diagnostics;
use crate::schema::Schema;

/// Outcome of a lifecycle operation.
///
/// `state` is `None` when the operation produced no state: either it failed,
/// or the remote object is gone and the resource must be dropped from state.
#[derive(Debug, Clone, PartialEq)]
pub struct Response<T> {
    /// The new state, if any.
    pub state: Option<T>,
    /// Problems found along the way.
    pub diagnostics: Diagnostics,
}

impl<T> Response<T> {
    /// A successful response carrying `state`.
    pub fn ok(state: T) -> Self {
        Self {
            state: Some(state),
            diagnostics: Diagnostics::new(),
        }
    }

    /// The remote object no longer exists.
    pub fn removed() -> Self {
        Self {
            state: None,
            diagnostics: Diagnostics::new(),
        }
    }

    /// A failed response.
    pub fn failed(diagnostics: impl Into<Diagnostics>) -> Self {
        Self {
            state: None,
            diagnostics: diagnostics.into(),
        }
    }

    /// Keep `state` unless `diagnostics` holds an error.
    pub fn from_parts(state: T, diagnostics: Diagnostics) -> Self {
        let state = (!diagnostics.has_error()).then_some(state);
        Self { state, diagnostics }
    }

    /// Whether the response holds an error diagnostic.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.diagnostics.has_error()
    }

    fn map_state<U>(self, f: impl FnOnce(T) -> Result<U, Diagnostics>) -> Response<U> {
        let mut diagnostics = self.diagnostics;
        let state = match self.state.map(f) {
            Some(Ok(state)) => Some(state),
            Some(Err(errors)) => {
                diagnostics.append(errors);
                None
            }
            None => None,
        };
        Response { state, diagnostics }
    }
}

/// A managed object type.
#[async_trait]
pub trait Resource: Send + Sync + 'static {
    /// Configuration and state model.
    type Model: Serialize + DeserializeOwned + Clone + Send + Sync + 'static;

    /// Full type name, e.g. `objsto_bucket`.
    const TYPE_NAME: &'static str;

    /// Attribute schema.
    fn schema(&self) -> Schema;

    /// Attribute-level validation of a planned model.
    fn validate(&self, _model: &Self::Model) -> Diagnostics {
        Diagnostics::new()
    }

    /// Create the remote object.
    async fn create(&self, plan: Self::Model) -> Response<Self::Model>;

    /// Refresh `state` from the remote object.
    async fn read(&self, state: Self::Model) -> Response<Self::Model>;

    /// Apply `plan` over `prior`.
    async fn update(&self, prior: Self::Model, plan: Self::Model) -> Response<Self::Model>;

    /// Remove the remote object.
    async fn delete(&self, state: Self::Model) -> Diagnostics;

    /// Build a partial state from an import identifier; a `read` fills in the rest.
    fn import_state(&self, id: &str) -> Response<Self::Model>;

    /// Whether going from `prior` to `plan` needs destroy-and-recreate.
    ///
    /// The default compares the top-level attributes the schema marks as
    /// replacing.
    ///
    /// # Errors
    ///
    /// Returns diagnostics if the models cannot be compared.
    fn requires_replace(&self, prior: &Self::Model, plan: &Self::Model) -> Result<bool, Diagnostics> {
        let prior = to_value(prior)?;
        let plan = to_value(plan)?;
        Ok(Resource::schema(self)
            .replacing_attributes()
            .any(|name| prior.get(name) != plan.get(name)))
    }
}

fn to_value<T: Serialize>(model: &T) -> Result<Value, Diagnostics> {
    serde_json::to_value(model).map_err(|e| {
        let mut diags = Diagnostics::new();
        diags.add_error("Unable to encode resource data", e.to_string());
        diags
    })
}

fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, Diagnostics> {
    serde_json::from_value(value).map_err(|e| {
        let mut diags = Diagnostics::new();
        diags.add_error("Invalid resource data", e.to_string());
        diags
    })
}

/// Object-safe view of a [`Resource`] working on JSON values.
#[async_trait]
pub trait AnyResource: Send + Sync {
    /// Full type name.
    fn type_name(&self) -> &'static str;

    /// Attribute schema.
    fn schema(&self) -> Schema;

    /// Decode and validate a planned model.
    fn validate_json(&self, plan: Value) -> Diagnostics;

    /// Validate then create.
    async fn create_json(&self, plan: Value) -> Response<Value>;

    /// Refresh state.
    async fn read_json(&self, state: Value) -> Response<Value>;

    /// Validate then update.
    async fn update_json(&self, prior: Value, plan: Value) -> Response<Value>;

    /// Delete.
    async fn delete_json(&self, state: Value) -> Diagnostics;

    /// Import by identifier.
    fn import_state_json(&self, id: &str) -> Response<Value>;

    /// Replacement predicate.
    ///
    /// # Errors
    ///
    /// Returns diagnostics if either side cannot be decoded or compared.
    fn requires_replace_json(&self, prior: Value, plan: Value) -> Result<bool, Diagnostics>;
}

#[async_trait]
impl<R: Resource> AnyResource for R {
    fn type_name(&self) -> &'static str {
        R::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Resource::schema(self)
    }

    fn validate_json(&self, plan: Value) -> Diagnostics {
        match from_value::<R::Model>(plan) {
            Ok(model) => self.validate(&model),
            Err(diags) => diags,
        }
    }

    async fn create_json(&self, plan: Value) -> Response<Value> {
        let plan: R::Model = match from_value(plan) {
            Ok(plan) => plan,
            Err(diags) => return Response::failed(diags),
        };
        let diags = self.validate(&plan);
        if diags.has_error() {
            return Response::failed(diags);
        }
        self.create(plan).await.map_state(|m| to_value(&m))
    }

    async fn read_json(&self, state: Value) -> Response<Value> {
        match from_value(state) {
            Ok(state) => self.read(state).await.map_state(|m| to_value(&m)),
            Err(diags) => Response::failed(diags),
        }
    }

    async fn update_json(&self, prior: Value, plan: Value) -> Response<Value> {
        let (prior, plan): (R::Model, R::Model) = match (from_value(prior), from_value(plan)) {
            (Ok(prior), Ok(plan)) => (prior, plan),
            (prior, plan) => {
                let mut diags = Diagnostics::new();
                for errors in [prior.err(), plan.err()].into_iter().flatten() {
                    diags.append(errors);
                }
                return Response::failed(diags);
            }
        };
        let diags = self.validate(&plan);
        if diags.has_error() {
            return Response::failed(diags);
        }
        self.update(prior, plan).await.map_state(|m| to_value(&m))
    }

    async fn delete_json(&self, state: Value) -> Diagnostics {
        match from_value(state) {
            Ok(state) => self.delete(state).await,
            Err(diags) => diags,
        }
    }

    fn import_state_json(&self, id: &str) -> Response<Value> {
        self.import_state(id).map_state(|m| to_value(&m))
    }

    fn requires_replace_json(&self, prior: Value, plan: Value) -> Result<bool, Diagnostics> {
        let prior: R::Model = from_value(prior)?;
        let plan: R::Model = from_value(plan)?;
        self.requires_replace(&prior, &plan)
    }
}
