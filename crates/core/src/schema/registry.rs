//! Process-wide schema registry
//!
//! One schema per message type, keyed by `TypeId` and built on first request
//! with the current [`SchemaConfig`](crate::config::SchemaConfig). Nested
//! message fields resolve their child schemas through here.

use std::any::{type_name, Any, TypeId};
use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use tracing::{debug, trace};

use super::{create_schema, Message, Schema};
use crate::config::{self, SchemaConfig, Strategy};
use crate::error::{SchemaError, SchemaResult};

/// Global schema cache: TypeId of M -> Arc<dyn Schema<M>>
static SCHEMAS: LazyLock<DashMap<TypeId, Box<dyn Any + Send + Sync>>> =
    LazyLock::new(DashMap::new);

/// Get the shared schema for `M`, building it on first use
///
/// The schema is built without holding any registry lock. When two threads
/// build the same type concurrently, the first one stored wins and both get it.
pub fn schema<M: Message>() -> SchemaResult<Arc<dyn Schema<M>>> {
    let key = TypeId::of::<M>();

    if let Some(entry) = SCHEMAS.get(&key) {
        if let Some(schema) = entry.downcast_ref::<Arc<dyn Schema<M>>>() {
            trace!("Registry hit for {}", type_name::<M>());
            return Ok(Arc::clone(schema));
        }
    }

    let built = build::<M>(&config::current())?;
    debug!("Registered schema for {}", built.message_name());

    let entry = SCHEMAS.entry(key).or_insert_with(|| Box::new(built));
    entry
        .downcast_ref::<Arc<dyn Schema<M>>>()
        .cloned()
        .ok_or_else(|| SchemaError::InvalidMessage {
            message: type_name::<M>(),
            reason: "registry entry holds a different schema type".to_string(),
        })
}

/// Build a fresh schema for `M` under `config`
fn build<M: Message>(config: &SchemaConfig) -> SchemaResult<Arc<dyn Schema<M>>> {
    if config.strategy == Strategy::Specialized {
        if let Some(schema) = M::specialized_schema() {
            return Ok(schema);
        }
        debug!(
            "{} has no generated code, using the generic engine",
            type_name::<M>()
        );
    }
    create_schema(M::descriptor()?, config)
}

/// Drop every cached schema
///
/// Schemas already handed out stay valid; later requests rebuild with the
/// current config.
pub fn clear_cache() {
    SCHEMAS.clear();
    debug!("Schema registry cleared");
}

/// Number of cached schemas
pub fn cache_size() -> usize {
    SCHEMAS.len()
}
