//! The annotation loader.
//!
//! The loader orchestrates a build:
//! 1. Resolve every resource string (directory, file, type, function)
//! 2. Discover the types declared by directory and file resources
//! 3. Build a record per element for each requested tag query
//! 4. Hand each listener its aggregate and cache the reduced value

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

use indexmap::IndexMap;

use crate::config::{self, LoaderConfig};
use crate::discover::{ClassLoader, StaticScan};
use crate::error::{Error, Result};
use crate::listener::{ErasedListener, Listener};
use crate::locate::{classify_path, classify_symbol, Locator, SourceFilter};
use crate::reader::{default_reader, Reader, TagClass, TagQuery};
use crate::record::{Aggregate, Record};
use crate::reflect::{ClassHandle, MethodHandle, Runtime};
use crate::tree::{AbstractPolicy, TreeBuilder};

/// Result of loading one name.
#[derive(Clone)]
pub enum Loaded {
    /// A listener's reduced value.
    Reduced {
        listener: String,
        value: Arc<dyn Any + Send + Sync>,
    },
    /// The pruned aggregate for a tag class that names no listener.
    Raw {
        class: TagClass,
        aggregate: Arc<Aggregate>,
    },
}

impl Loaded {
    /// Borrow a reduced value as its concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Loaded::Reduced { value, .. } => value.as_ref().downcast_ref::<T>(),
            Loaded::Raw { .. } => None,
        }
    }

    /// Shared handle to a reduced value as its concrete type.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            Loaded::Reduced { value, .. } => Arc::clone(value).downcast::<T>().ok(),
            Loaded::Raw { .. } => None,
        }
    }

    /// The aggregate of a raw result.
    pub fn aggregate(&self) -> Option<&Aggregate> {
        match self {
            Loaded::Raw { aggregate, .. } => Some(aggregate),
            Loaded::Reduced { .. } => None,
        }
    }

    /// Whether both results are the same cached value.
    pub fn ptr_eq(&self, other: &Loaded) -> bool {
        match (self, other) {
            (Loaded::Reduced { value: a, .. }, Loaded::Reduced { value: b, .. }) => Arc::ptr_eq(a, b),
            (Loaded::Raw { aggregate: a, .. }, Loaded::Raw { aggregate: b, .. }) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Loaded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Loaded::Reduced { listener, .. } => f
                .debug_struct("Reduced")
                .field("listener", listener)
                .finish_non_exhaustive(),
            Loaded::Raw { class, aggregate } => f
                .debug_struct("Raw")
                .field("class", class)
                .field("records", &aggregate.len())
                .finish(),
        }
    }
}

enum BuildState {
    NotBuilt,
    Built(Loaded),
}

impl BuildState {
    fn loaded(&self) -> Option<&Loaded> {
        match self {
            BuildState::Built(loaded) => Some(loaded),
            BuildState::NotBuilt => None,
        }
    }
}

#[derive(Default)]
struct Cache {
    listeners: HashMap<String, BuildState>,
    raw: HashMap<TagClass, BuildState>,
}

impl Cache {
    fn get(&self, target: &Target) -> Option<Loaded> {
        let state = match target {
            Target::Listener(name) => self.listeners.get(name),
            Target::Raw(class) => self.raw.get(class),
        };
        state.and_then(BuildState::loaded).cloned()
    }

    fn store(&mut self, target: &Target, loaded: Loaded) {
        let state = BuildState::Built(loaded);
        match target {
            Target::Listener(name) => self.listeners.insert(name.clone(), state),
            Target::Raw(class) => self.raw.insert(class.clone(), state),
        };
    }

    fn clear(&mut self) {
        for state in self.listeners.values_mut() {
            *state = BuildState::NotBuilt;
        }
        self.raw.clear();
    }
}

/// What a loaded name refers to.
enum Target {
    /// Canonical listener name.
    Listener(String),
    Raw(TagClass),
}

enum Element {
    Class(Arc<ClassHandle>),
    Function(Arc<MethodHandle>),
}

/// Discovers tags on the registered resources and dispatches them to
/// listeners.
///
/// Results are cached per listener (and per raw tag class) until
/// [`rebuild`](Self::rebuild) is called or the listener is registered again.
/// Registering resources does not invalidate cached results.
pub struct AnnotationLoader {
    reader: Arc<dyn Reader>,
    runtime: Arc<Runtime>,
    class_loader: Box<dyn ClassLoader>,
    filter: SourceFilter,
    on_abstract: AbstractPolicy,
    resources: Vec<String>,
    listeners: IndexMap<String, Box<dyn ErasedListener>>,
    /// Alias -> canonical listener name.
    aliases: HashMap<String, String>,
    cache: RwLock<Cache>,
}

impl AnnotationLoader {
    /// Create a loader reading tags with `reader`.
    ///
    /// Without a reader the built-in attribute reader is used; if it is not
    /// compiled in (feature `native-attributes`), this fails with
    /// [`Error::NoReader`].
    pub fn new(reader: Option<Arc<dyn Reader>>) -> Result<Self> {
        Self::with_fallback(reader, default_reader)
    }

    fn with_fallback(
        reader: Option<Arc<dyn Reader>>,
        fallback: impl FnOnce() -> Option<Arc<dyn Reader>>,
    ) -> Result<Self> {
        let reader = match reader {
            Some(reader) => reader,
            None => fallback().ok_or(Error::NoReader)?,
        };

        Ok(Self {
            reader,
            runtime: Arc::new(Runtime::new()),
            class_loader: Box::new(StaticScan::new()),
            filter: SourceFilter::default(),
            on_abstract: AbstractPolicy::default(),
            resources: Vec::new(),
            listeners: IndexMap::new(),
            aliases: HashMap::new(),
            cache: RwLock::new(Cache::default()),
        })
    }

    /// Create a loader from a validated configuration.
    pub fn from_config(config: &LoaderConfig) -> Result<Self> {
        config::validate(config)?;

        let reader = config.reader.map(|kind| kind.build()).transpose()?;
        let mut loader = Self::new(reader)?
            .with_source_filter(SourceFilter::new(&config.extensions, &config.excluded_paths)?)
            .with_abstract_policy(config.on_abstract);
        loader.class_loader = config.discovery.class_loader();
        loader.resource(config.resources.iter().cloned());
        Ok(loader)
    }

    /// Share a runtime with other loaders or with the caller.
    pub fn with_runtime(mut self, runtime: Arc<Runtime>) -> Self {
        self.runtime = runtime;
        self
    }

    /// Replace the discovery strategy.
    pub fn with_class_loader<C: ClassLoader + 'static>(mut self, class_loader: C) -> Self {
        self.class_loader = Box::new(class_loader);
        self
    }

    pub fn with_source_filter(mut self, filter: SourceFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_abstract_policy(mut self, policy: AbstractPolicy) -> Self {
        self.on_abstract = policy;
        self
    }

    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    /// Register resources: directories, source files, type paths or
    /// function paths. Order is kept and duplicates are allowed.
    pub fn resource<I, S>(&mut self, resources: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources.extend(resources.into_iter().map(Into::into));
        self
    }

    /// Register a listener under its canonical name and, optionally, an alias.
    ///
    /// Registering a name again replaces the listener and discards its cached
    /// result.
    pub fn listener<L: Listener>(&mut self, listener: L, alias: Option<&str>) -> &mut Self {
        let name = listener.name().to_string();

        if let Some(alias) = alias {
            self.aliases.insert(alias.to_string(), name.clone());
        }
        self.cache
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .insert(name.clone(), BuildState::NotBuilt);
        self.listeners.insert(name, Box::new(listener));
        self
    }

    /// Load results by listener name, alias or tag class.
    ///
    /// With no names, every listener is loaded in registration order. Names
    /// that are neither a listener nor an alias are treated as tag classes
    /// and yield the raw aggregate. Cached results are returned as is.
    pub fn load(&self, names: &[&str]) -> Result<Vec<Loaded>> {
        let targets = self.targets(names);

        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            let cached: Option<Vec<Loaded>> = targets.iter().map(|t| cache.get(t)).collect();
            if let Some(cached) = cached {
                tracing::debug!(count = cached.len(), "loaded from cache");
                return Ok(cached);
            }
        }

        let mut cache = self.write_cache();
        self.load_targets(&mut cache, &targets)
    }

    /// Load every listener.
    pub fn build(&self) -> Result<Vec<Loaded>> {
        self.load(&[])
    }

    /// Discard every cached result, then load every listener.
    pub fn rebuild(&self) -> Result<Vec<Loaded>> {
        let mut cache = self.write_cache();
        cache.clear();
        let targets = self.targets(&[]);
        self.load_targets(&mut cache, &targets)
    }

    fn write_cache(&self) -> RwLockWriteGuard<'_, Cache> {
        self.cache.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn targets(&self, names: &[&str]) -> Vec<Target> {
        if names.is_empty() {
            return self
                .listeners
                .keys()
                .map(|name| Target::Listener(name.clone()))
                .collect();
        }

        names
            .iter()
            .map(|name| {
                if let Some(canonical) = self.aliases.get(*name) {
                    Target::Listener(canonical.clone())
                } else if self.listeners.contains_key(*name) {
                    Target::Listener(name.to_string())
                } else {
                    Target::Raw(TagClass::new(name))
                }
            })
            .collect()
    }

    /// One build cycle. Resources are resolved at most once and each
    /// distinct tag query is aggregated at most once.
    fn load_targets(&self, cache: &mut Cache, targets: &[Target]) -> Result<Vec<Loaded>> {
        let mut cycle = BuildCycle {
            loader: self,
            elements: None,
            aggregates: HashMap::new(),
        };
        let mut results = Vec::with_capacity(targets.len());

        for target in targets {
            if let Some(loaded) = cache.get(target) {
                results.push(loaded);
                continue;
            }

            let loaded = match target {
                Target::Listener(name) => {
                    let Some(listener) = self.listeners.get(name) else {
                        continue;
                    };
                    let aggregate = cycle.aggregate(&listener.tag_query())?;
                    let value = listener.reduce(&aggregate).map_err(|source| Error::Listener {
                        name: listener.listener_name().to_string(),
                        source,
                    })?;
                    Loaded::Reduced {
                        listener: name.clone(),
                        value,
                    }
                }
                Target::Raw(class) => Loaded::Raw {
                    class: class.clone(),
                    aggregate: cycle.aggregate(&TagQuery::new([class.clone()]))?,
                },
            };

            cache.store(target, loaded.clone());
            results.push(loaded);
        }

        Ok(results)
    }

    /// Resolve every resource into reflected elements, in resource order.
    fn resolve_elements(&self) -> Result<Vec<Element>> {
        // Paths first so that types they declare can be named by later resources.
        let located: Vec<Option<Locator>> = self
            .resources
            .iter()
            .map(|resource| classify_path(resource, &self.filter))
            .collect();

        let mut discovered: Vec<Vec<String>> = Vec::with_capacity(located.len());
        for locator in &located {
            let files = match locator {
                Some(Locator::Directory(dir)) => self.filter.source_files(dir),
                Some(Locator::File(file)) => vec![file.clone()],
                _ => Vec::new(),
            };
            discovered.push(self.discover(&files)?);

            // a listed file also contributes its free functions
            if let Some(Locator::File(file)) = locator {
                if let Err(e) = self.runtime.include(file) {
                    tracing::warn!(
                        file = %file.display(),
                        error = %e,
                        "failed to include file resource"
                    );
                }
            }
        }

        let mut elements = Vec::new();
        let mut seen = HashSet::new();

        for ((resource, locator), names) in self.resources.iter().zip(located).zip(discovered) {
            let locator = match locator {
                Some(locator) => locator,
                None => classify_symbol(resource, &self.runtime),
            };

            match locator {
                Locator::Directory(_) | Locator::File(_) => {
                    for name in names {
                        self.push_class(&name, &mut elements, &mut seen);
                    }
                }
                Locator::Type(name) => self.push_class(&name, &mut elements, &mut seen),
                Locator::Function(name) => {
                    if let Some(function) = self.runtime.reflect_function(&name) {
                        if seen.insert(format!("fn {}", name)) {
                            elements.push(Element::Function(function));
                        }
                    }
                }
                Locator::Unresolved(_) => {}
            }
        }

        Ok(elements)
    }

    fn discover(&self, files: &[PathBuf]) -> Result<Vec<String>> {
        if files.is_empty() {
            return Ok(Vec::new());
        }
        self.class_loader.discover(files, &self.runtime)
    }

    fn push_class(&self, name: &str, elements: &mut Vec<Element>, seen: &mut HashSet<String>) {
        if !seen.insert(format!("type {}", name)) {
            return;
        }
        match self.runtime.reflect_class(name) {
            Some(class) => elements.push(Element::Class(class)),
            None => tracing::debug!(name, "discovered type is not known to the runtime"),
        }
    }
}

struct BuildCycle<'a> {
    loader: &'a AnnotationLoader,
    elements: Option<Vec<Element>>,
    aggregates: HashMap<TagQuery, Arc<Aggregate>>,
}

impl BuildCycle<'_> {
    fn aggregate(&mut self, query: &TagQuery) -> Result<Arc<Aggregate>> {
        if let Some(aggregate) = self.aggregates.get(query) {
            return Ok(Arc::clone(aggregate));
        }

        if self.elements.is_none() {
            self.elements = Some(self.loader.resolve_elements()?);
        }
        let elements = self.elements.as_deref().unwrap_or_default();

        let builder = TreeBuilder::new(self.loader.reader.as_ref(), self.loader.on_abstract);
        let mut aggregate = Aggregate::new();

        for element in elements {
            match element {
                Element::Class(class) => {
                    if let Some(record) = builder.build_class(class, query)? {
                        aggregate.insert(Record::Class(record));
                    }
                }
                Element::Function(function) => {
                    if let Some(record) = builder.build_function(function, query) {
                        aggregate.insert(Record::Function(record));
                    }
                }
            }
        }

        tracing::debug!(
            classes = ?query.classes,
            elements = elements.len(),
            records = aggregate.len(),
            "built aggregate"
        );

        let aggregate = Arc::new(aggregate);
        self.aggregates.insert(query.clone(), Arc::clone(&aggregate));
        Ok(aggregate)
    }
}


#[cfg(test)]
mod construction_tests {
    use super::*;
    use crate::reader::DocReader;

    #[test]
    fn test_missing_reader_is_fatal() {
        let result = AnnotationLoader::with_fallback(None, || None);
        assert!(matches!(result, Err(Error::NoReader)));
    }

    #[test]
    fn test_supplied_reader_needs_no_fallback() {
        let reader: Arc<dyn Reader> = Arc::new(DocReader::new());
        assert!(AnnotationLoader::with_fallback(Some(reader), || None).is_ok());
    }

    #[test]
    #[cfg(not(feature = "native-attributes"))]
    fn test_no_built_in_reader_is_fatal() {
        assert!(matches!(AnnotationLoader::new(None), Err(Error::NoReader)));
    }
}
