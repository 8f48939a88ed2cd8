//! Listener contract.
//!
//! A listener names the tag classes it is interested in and folds the
//! resulting [`Aggregate`] into a value of its own type.

use std::any::Any;
use std::sync::Arc;

use crate::reader::{TagClass, TagQuery};
use crate::record::Aggregate;

/// Consumer of an aggregate.
///
/// # Example
///
/// ```
/// use tagscan::{Aggregate, Listener, TagClass};
///
/// struct Routes;
///
/// impl Listener for Routes {
///     type Output = Vec<String>;
///
///     fn annotations(&self) -> Vec<TagClass> {
///         vec![TagClass::new("web::Route")]
///     }
///
///     fn on_annotation(&self, aggregate: &Aggregate) -> anyhow::Result<Vec<String>> {
///         Ok(aggregate.names().map(str::to_string).collect())
///     }
/// }
/// ```
pub trait Listener: Send + Sync + 'static {
    type Output: Send + Sync + 'static;

    /// Canonical name; defaults to the Rust type name.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Tag classes to aggregate.
    fn annotations(&self) -> Vec<TagClass>;

    /// Parameter names of interest; `None` keeps every parameter.
    fn arguments(&self) -> Option<Vec<String>> {
        None
    }

    /// Fold the aggregate into this listener's result.
    fn on_annotation(&self, annotations: &Aggregate) -> anyhow::Result<Self::Output>;
}

/// Type-erased listener stored by the loader.
pub(crate) trait ErasedListener: Send + Sync {
    fn listener_name(&self) -> &str;

    fn tag_query(&self) -> TagQuery;

    fn reduce(&self, aggregate: &Aggregate) -> anyhow::Result<Arc<dyn Any + Send + Sync>>;
}

impl<L: Listener> ErasedListener for L {
    fn listener_name(&self) -> &str {
        self.name()
    }

    fn tag_query(&self) -> TagQuery {
        TagQuery::new(self.annotations()).with_arguments(self.arguments())
    }

    fn reduce(&self, aggregate: &Aggregate) -> anyhow::Result<Arc<dyn Any + Send + Sync>> {
        let output = self.on_annotation(aggregate)?;
        Ok(Arc::new(output))
    }
}
