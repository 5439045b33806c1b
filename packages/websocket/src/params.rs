use std::{collections::BTreeMap, sync::Arc};

/// Query params sent when a socket connects.
pub type Params = BTreeMap<String, String>;

#[derive(Clone)]
pub enum ParamsSource {
    Static(Params),
    /// Evaluated every time the params are needed.
    Dynamic(Arc<dyn Fn() -> Params + Send + Sync>),
}

impl ParamsSource {
    pub fn dynamic(f: impl Fn() -> Params + Send + Sync + 'static) -> Self {
        Self::Dynamic(Arc::new(f))
    }

    pub fn evaluate(&self) -> Params {
        match self {
            Self::Static(params) => params.clone(),
            Self::Dynamic(f) => f(),
        }
    }
}

impl Default for ParamsSource {
    fn default() -> Self {
        Self::Static(Params::new())
    }
}

impl From<Params> for ParamsSource {
    fn from(params: Params) -> Self {
        Self::Static(params)
    }
}
