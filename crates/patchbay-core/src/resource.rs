//! Shared, reference-counted resources keyed by node, type and name.
//!
//! Node instances that belong to the same description node share state
//! through this registry: every voice of a polyphonic sub-graph asks for the
//! wavetable of node 7 and gets the same object back. The first acquisition
//! constructs the resource and seeds it from the payload embedded in the
//! graph description; later acquisitions only bump a count. The resource is
//! dropped when the last holder releases it.
//!
//! Resource types are registered at startup with a factory:
//!
//! ```rust,ignore
//! let mut resources = ResourceRegistry::new();
//! resources.register_type::<Wavetable>("wavetable", Wavetable::default);
//!
//! let handle = resources.acquire::<Wavetable>(node, "wavetable", "table", None)?;
//! let len = handle.lock().len();
//! resources.release(handle);
//! ```
//!
//! Every [`ResourceHandle`] must be handed back through
//! [`ResourceRegistry::release`]; a handle that is merely dropped keeps the
//! registry entry alive.

use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use thiserror::Error;

use crate::graph::NodeId;

/// A resource payload that could not be loaded.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResourceError {
    /// The payload text is malformed.
    #[error("invalid resource payload: {0}")]
    InvalidPayload(String),
}

/// State shared between node instances and persisted in graph files.
pub trait Resource: Send + 'static {
    /// Replaces the contents with `payload`, the text stored in the graph
    /// description.
    fn load(&mut self, payload: &str) -> Result<(), ResourceError>;

    /// Serializes the contents back to payload text.
    fn save(&self) -> String;
}

type Shared<T> = Mutex<T>;
type Erased = Arc<dyn Any + Send + Sync>;

/// Exclusive access token for an acquired resource.
///
/// Not `Clone`: each successful acquire yields exactly one handle, and each
/// handle is released exactly once.
pub struct ResourceHandle<T: Resource> {
    inner: Arc<Shared<T>>,
}

impl<T: Resource> ResourceHandle<T> {
    /// Locks the resource for reading or writing.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock()
    }

    /// Whether two handles refer to the same resource object.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn address(&self) -> usize {
        Arc::as_ptr(&self.inner).cast::<()>() as usize
    }
}

impl<T: Resource> fmt::Debug for ResourceHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("type", &std::any::type_name::<T>())
            .field("address", &self.address())
            .finish()
    }
}

/// Identity of a resource: owning description node, type name, instance name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ResourceKey {
    /// Description node the resource belongs to.
    pub node: NodeId,
    /// Registered resource type.
    pub type_name: String,
    /// Name of the resource within the node.
    pub name: String,
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:nodes/{}/{}", self.type_name, self.node, self.name)
    }
}

struct TypeEntry {
    type_id: TypeId,
    /// A `fn() -> T` for the registered `T`.
    factory: Box<dyn Any + Send + Sync>,
}

struct Entry {
    object: Erased,
    ref_count: usize,
    save: fn(&(dyn Any + Send + Sync)) -> String,
}

#[derive(Default)]
struct State {
    types: BTreeMap<String, TypeEntry>,
    by_key: BTreeMap<ResourceKey, Entry>,
    by_address: BTreeMap<usize, ResourceKey>,
}

/// Registry of live resources and the factories that create them.
#[derive(Default)]
pub struct ResourceRegistry {
    state: Mutex<State>,
}

fn save_erased<T: Resource>(object: &(dyn Any + Send + Sync)) -> String {
    object
        .downcast_ref::<Shared<T>>()
        .map(|shared| shared.lock().save())
        .unwrap_or_default()
}

impl ResourceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers resource type `T` under `type_name`.
    pub fn register_type<T: Resource>(&mut self, type_name: &str, factory: fn() -> T) {
        let entry = TypeEntry {
            type_id: TypeId::of::<T>(),
            factory: Box::new(factory),
        };
        if self
            .state
            .get_mut()
            .types
            .insert(type_name.to_string(), entry)
            .is_some()
        {
            tracing::warn!(type_name, "resource type registered twice, replacing");
        }
    }

    /// Whether `type_name` is a registered resource type.
    pub fn has_type(&self, type_name: &str) -> bool {
        self.state.lock().types.contains_key(type_name)
    }

    /// Acquires the resource `(node, type_name, name)`, creating it on first
    /// use.
    ///
    /// A new resource is seeded from `payload` when given. A payload that
    /// fails to load leaves the resource default-constructed. Returns `None`
    /// when `type_name` is not registered or was registered with a type other
    /// than `T`.
    pub fn acquire<T: Resource>(
        &self,
        node: NodeId,
        type_name: &str,
        name: &str,
        payload: Option<&str>,
    ) -> Option<ResourceHandle<T>> {
        let key = ResourceKey {
            node,
            type_name: type_name.to_string(),
            name: name.to_string(),
        };
        let mut state = self.state.lock();

        if let Some(entry) = state.by_key.get_mut(&key) {
            let Ok(inner) = Arc::clone(&entry.object).downcast::<Shared<T>>() else {
                tracing::error!(resource = %key, "resource exists with a different type");
                return None;
            };
            entry.ref_count += 1;
            tracing::debug!(resource = %key, count = entry.ref_count, "incremented resource count");
            return Some(ResourceHandle { inner });
        }

        let Some(types) = state.types.get(type_name) else {
            tracing::error!(resource = %key, "unknown resource type");
            return None;
        };
        let factory = match types.factory.downcast_ref::<fn() -> T>() {
            Some(factory) if types.type_id == TypeId::of::<T>() => *factory,
            _ => {
                tracing::error!(resource = %key, "resource type registered with a different type");
                return None;
            }
        };

        let mut object = factory();
        if let Some(payload) = payload {
            if let Err(err) = object.load(payload) {
                tracing::warn!(resource = %key, %err, "failed to load resource payload, using defaults");
                object = factory();
            }
        }

        let inner = Arc::new(Mutex::new(object));
        let handle = ResourceHandle { inner };
        let erased: Erased = Arc::clone(&handle.inner) as Erased;
        state.by_address.insert(handle.address(), key.clone());
        tracing::debug!(resource = %key, "created resource");
        state.by_key.insert(
            key,
            Entry {
                object: erased,
                ref_count: 1,
                save: save_erased::<T>,
            },
        );
        Some(handle)
    }

    /// Releases a handle.
    ///
    /// Returns `true` when this was the last holder and the resource was
    /// dropped. Releasing a handle this registry does not know about is a
    /// programming error.
    pub fn release<T: Resource>(&self, handle: ResourceHandle<T>) -> bool {
        let address = handle.address();
        let mut state = self.state.lock();

        let Some(key) = state.by_address.get(&address).cloned() else {
            debug_assert!(false, "released a resource this registry does not own");
            tracing::error!(address, "failed to find resource");
            return false;
        };
        let Some(entry) = state.by_key.get_mut(&key) else {
            debug_assert!(false, "resource back map out of sync");
            tracing::error!(resource = %key, "failed to find resource entry");
            return false;
        };

        entry.ref_count -= 1;
        if entry.ref_count > 0 {
            tracing::debug!(resource = %key, count = entry.ref_count, "decremented resource count");
            return false;
        }

        tracing::debug!(resource = %key, "resource count reached zero, freeing");
        state.by_key.remove(&key);
        state.by_address.remove(&address);
        drop(state);
        drop(handle);
        true
    }

    /// Number of holders of `(node, type_name, name)`; zero when absent.
    pub fn ref_count(&self, node: NodeId, type_name: &str, name: &str) -> usize {
        let key = ResourceKey {
            node,
            type_name: type_name.to_string(),
            name: name.to_string(),
        };
        self.state.lock().by_key.get(&key).map_or(0, |e| e.ref_count)
    }

    /// Number of live resources.
    pub fn len(&self) -> usize {
        self.state.lock().by_key.len()
    }

    /// Whether no resource is alive.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serializes every live resource, in key order.
    pub fn save_all(&self) -> Vec<(ResourceKey, String)> {
        let entries: Vec<(ResourceKey, Erased, fn(&(dyn Any + Send + Sync)) -> String)> = self
            .state
            .lock()
            .by_key
            .iter()
            .map(|(k, e)| (k.clone(), Arc::clone(&e.object), e.save))
            .collect();
        // Saving locks each resource; the registry lock is already released.
        entries
            .into_iter()
            .map(|(key, object, save)| (key, save(object.as_ref())))
            .collect()
    }
}

impl fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ResourceRegistry")
            .field("types", &state.types.keys().collect::<Vec<_>>())
            .field("live", &state.by_key.len())
            .finish()
    }
}
