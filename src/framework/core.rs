//! # Core Actor Framework
//!
//! This module defines the generic building blocks for the engine's aggregates.
//!
//! ## Key Types
//!
//! - [`ActorEntity`]: The trait that every aggregate (Schedule, Delivery, Execution) implements.
//! - [`ResourceActor`]: The generic actor that owns a store of aggregates of one type.
//! - [`ResourceClient`]: The generic client for communicating with an actor.
//! - [`FrameworkError`]: Plumbing errors (actor closed, not found, audit failure) plus a boxed
//!   entity error that domain clients downcast back to their own type.
//!
//! ## Transaction Model
//!
//! Each actor processes its messages sequentially, so one message is one transaction scoped to
//! the aggregate it targets. Mutations are applied to a draft clone; the draft replaces the
//! stored aggregate only after the hook succeeded and the audit entry was appended. When that
//! append fails after an `on_create` that called other actors,
//! [`ActorEntity::on_create_aborted`] undoes the calls.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::scope::{Principal, TenantId};
use crate::audit::{AuditRecord, AuditSink};

// =============================================================================
// 1. THE ABSTRACTION (Traits with Hooks, DTOs, and Actions)
// =============================================================================

/// Trait that any aggregate must implement to be managed by [`ResourceActor`].
///
/// # Architecture Note
/// By defining a contract (`ActorEntity`) that all aggregates satisfy, the message loop,
/// tenant filtering and audit plumbing are written *once* in [`ResourceActor`].
///
/// Associated types keep every request type-safe: a `DeliveryAction` can never be sent to the
/// Execution actor.
///
/// # Async & Context
/// Hooks are `#[async_trait]` so they can call other actors. The `Context` type is injected
/// into every hook at `run()` time ("late binding" of dependencies), and the calling
/// [`Principal`] is passed alongside so cross-actor calls stay inside the caller's tenant.
#[async_trait]
pub trait ActorEntity: Clone + Debug + Send + Sync + 'static {
    /// Name used in logs and in audit entries (`entity_type`).
    const KIND: &'static str;

    /// The unique identifier for this aggregate.
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug;

    /// The data required to create a new instance.
    type Create: Send + Sync + Debug;

    /// The data required to update an existing instance.
    /// Use [`std::convert::Infallible`] for aggregates that only change through actions.
    type Update: Send + Sync + Debug;

    /// Enum of aggregate-specific operations (e.g. `Start`, `Arrive`).
    type Action: Send + Sync + Debug;

    /// The result type returned by custom actions.
    type ActionResult: Send + Sync + Debug;

    /// The runtime context (dependencies) injected into the actor.
    type Context: Send + Sync;

    /// One error enum per aggregate; see [`FrameworkError::into_entity_error`].
    type Error: std::error::Error + Send + Sync + 'static;

    /// Construct the aggregate from the ID, the creating principal and the payload.
    /// Called synchronously before `on_create`.
    fn from_create_params(
        id: Self::Id,
        principal: &Principal,
        params: Self::Create,
    ) -> Result<Self, Self::Error>;

    /// Owning tenant; used by the actor to scope every lookup.
    fn tenant_id(&self) -> &TenantId;

    /// Compact state snapshot written as `before` / `after` in audit entries.
    fn audit_state(&self) -> Value;

    /// Dotted audit action name for a custom action, e.g. `delivery.start`.
    fn action_name(action: &Self::Action) -> &'static str;

    /// Extra audit metadata for an action, computed against the state *before* the action.
    fn audit_metadata(&self, _action: &Self::Action) -> Value {
        Value::Null
    }

    // --- Lifecycle Hooks (Async) ---

    /// Called after the aggregate is constructed and before it is stored.
    async fn on_create(
        &mut self,
        _principal: &Principal,
        _ctx: &Self::Context,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called when `on_create` succeeded but the aggregate could not be committed because the
    /// audit append failed. The aggregate is discarded afterwards; entities whose `on_create`
    /// touched other actors undo that work here.
    async fn on_create_aborted(&self, _principal: &Principal, _ctx: &Self::Context) {}

    /// Called when an update request is received.
    async fn on_update(
        &mut self,
        update: Self::Update,
        principal: &Principal,
        ctx: &Self::Context,
    ) -> Result<(), Self::Error>;

    // --- Action Handler (Async) ---

    /// Handle an aggregate-specific action.
    async fn handle_action(
        &mut self,
        action: Self::Action,
        principal: &Principal,
        ctx: &Self::Context,
    ) -> Result<Self::ActionResult, Self::Error>;
}

// =============================================================================
// 2. THE GENERIC MESSAGES & ERRORS
// =============================================================================

/// Errors that can occur within the actor framework itself.
#[derive(Debug, thiserror::Error)]
pub enum FrameworkError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped response channel")]
    ActorDropped,
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Audit write failed: {0}")]
    Audit(String),
    #[error("Entity error: {0}")]
    EntityError(Box<dyn std::error::Error + Send + Sync>),
}

impl FrameworkError {
    /// Recovers the typed entity error carried by [`FrameworkError::EntityError`].
    ///
    /// Returns the original error unchanged when it is a plumbing error or a different type.
    pub fn into_entity_error<E: std::error::Error + 'static>(self) -> Result<E, Self> {
        match self {
            Self::EntityError(source) => source
                .downcast::<E>()
                .map(|typed| *typed)
                .map_err(Self::EntityError),
            other => Err(other),
        }
    }
}

/// Type alias for the one-shot response channel used by actors.
pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

/// Internal message type sent to the actor to request operations.
///
/// Every variant carries the calling [`Principal`]. There is no delete: aggregates in this
/// engine are closed through their own state machines, never removed.
#[derive(Debug)]
pub enum ResourceRequest<T: ActorEntity> {
    Create {
        principal: Principal,
        params: T::Create,
        respond_to: Response<T::Id>,
    },
    Get {
        principal: Principal,
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    Update {
        principal: Principal,
        id: T::Id,
        update: T::Update,
        respond_to: Response<T>,
    },
    Action {
        principal: Principal,
        id: T::Id,
        action: T::Action,
        respond_to: Response<T::ActionResult>,
    },
}

// =============================================================================
// 3. THE GENERIC ACTOR SERVER
// =============================================================================

/// The generic actor that manages a collection of aggregates.
///
/// # Architecture Note
/// This struct is the "Server" half of the actor. It owns the state (`store`) and
/// the receiver end of the channel.
///
/// **Concurrency Model**:
/// Each actor processes its own messages *sequentially*, so no `Mutex` guards the store and
/// every guard an entity checks ("departure already recorded", "issue still open") is
/// evaluated and committed without interleaving.
pub struct ResourceActor<T: ActorEntity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: HashMap<T::Id, T>,
    next_id_fn: Box<dyn Fn() -> T::Id + Send + Sync>,
    audit: Arc<dyn AuditSink>,
}

impl<T: ActorEntity> ResourceActor<T> {
    /// Creates a new `ResourceActor` and its associated `ResourceClient`.
    ///
    /// * `buffer_size` - capacity of the request channel; callers wait when it is full.
    /// * `next_id_fn` - generator for new aggregate IDs.
    /// * `audit` - sink receiving one entry per successful mutation.
    pub fn new(
        buffer_size: usize,
        next_id_fn: impl Fn() -> T::Id + Send + Sync + 'static,
        audit: Arc<dyn AuditSink>,
    ) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            store: HashMap::new(),
            next_id_fn: Box::new(next_id_fn),
            audit,
        };
        let client = ResourceClient::new(sender);
        (actor, client)
    }

    /// Runs the actor's event loop, processing messages until the channel closes.
    ///
    /// # Context Injection
    /// The `context` argument is injected into every entity hook. This allows entities
    /// to access external dependencies (like other clients) that were created *after*
    /// the actor was instantiated but *before* the loop started.
    pub async fn run(mut self, context: T::Context) {
        let entity_type = T::KIND;
        info!(entity_type, "Actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create {
                    principal,
                    params,
                    respond_to,
                } => {
                    debug!(entity_type, tenant = %principal.tenant_id, ?params, "Create");
                    let result = self.create(&principal, params, &context).await;
                    match &result {
                        Ok(id) => info!(entity_type, %id, size = self.store.len(), "Created"),
                        Err(e) => warn!(entity_type, error = %e, "Create failed"),
                    }
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Get {
                    principal,
                    id,
                    respond_to,
                } => {
                    let item = self.lookup(&principal, &id).cloned();
                    debug!(entity_type, %id, found = item.is_some(), "Get");
                    let _ = respond_to.send(Ok(item));
                }
                ResourceRequest::Update {
                    principal,
                    id,
                    update,
                    respond_to,
                } => {
                    debug!(entity_type, %id, ?update, "Update");
                    let result = self.update(&principal, id.clone(), update, &context).await;
                    match &result {
                        Ok(_) => info!(entity_type, %id, "Updated"),
                        Err(e) => warn!(entity_type, %id, error = %e, "Update failed"),
                    }
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Action {
                    principal,
                    id,
                    action,
                    respond_to,
                } => {
                    debug!(entity_type, %id, ?action, "Action");
                    let result = self.act(&principal, id.clone(), action, &context).await;
                    match &result {
                        Ok(_) => info!(entity_type, %id, "Action ok"),
                        Err(e) => warn!(entity_type, %id, error = %e, "Action failed"),
                    }
                    let _ = respond_to.send(result);
                }
            }
        }

        info!(entity_type, size = self.store.len(), "Shutdown");
    }

    /// Tenant-scoped lookup. The only path to a stored aggregate.
    fn lookup(&self, principal: &Principal, id: &T::Id) -> Option<&T> {
        self.store
            .get(id)
            .filter(|item| principal.can_see(item.tenant_id()))
    }

    async fn create(
        &mut self,
        principal: &Principal,
        params: T::Create,
        context: &T::Context,
    ) -> Result<T::Id, FrameworkError> {
        let id = (self.next_id_fn)();
        let mut item = T::from_create_params(id.clone(), principal, params).map_err(entity_error)?;
        item.on_create(principal, context)
            .await
            .map_err(entity_error)?;

        let after = item.audit_state();
        if let Err(e) = self.record(principal, "create", &id, Value::Null, after, Value::Null) {
            warn!(entity_type = T::KIND, %id, "Create not committed, rolling back side effects");
            item.on_create_aborted(principal, context).await;
            return Err(e);
        }
        self.store.insert(id.clone(), item);
        Ok(id)
    }

    async fn update(
        &mut self,
        principal: &Principal,
        id: T::Id,
        update: T::Update,
        context: &T::Context,
    ) -> Result<T, FrameworkError> {
        let current = self
            .lookup(principal, &id)
            .ok_or_else(|| FrameworkError::NotFound(id.to_string()))?;
        let before = current.audit_state();
        let mut draft = current.clone();

        draft
            .on_update(update, principal, context)
            .await
            .map_err(entity_error)?;

        self.record(principal, "update", &id, before, draft.audit_state(), Value::Null)?;
        self.store.insert(id, draft.clone());
        Ok(draft)
    }

    async fn act(
        &mut self,
        principal: &Principal,
        id: T::Id,
        action: T::Action,
        context: &T::Context,
    ) -> Result<T::ActionResult, FrameworkError> {
        let current = self
            .lookup(principal, &id)
            .ok_or_else(|| FrameworkError::NotFound(id.to_string()))?;
        let before = current.audit_state();
        let name = T::action_name(&action);
        let metadata = current.audit_metadata(&action);
        let mut draft = current.clone();

        let result = draft
            .handle_action(action, principal, context)
            .await
            .map_err(entity_error)?;

        self.record(principal, name, &id, before, draft.audit_state(), metadata)?;
        self.store.insert(id, draft);
        Ok(result)
    }

    fn record(
        &self,
        principal: &Principal,
        action: &str,
        id: &T::Id,
        before: Value,
        after: Value,
        metadata: Value,
    ) -> Result<(), FrameworkError> {
        let action = if action.contains('.') {
            action.to_string()
        } else {
            format!("{}.{}", T::KIND.to_lowercase(), action)
        };
        self.audit
            .append(AuditRecord {
                actor: principal.actor.clone(),
                tenant_id: principal.tenant_id.clone(),
                action,
                entity_type: T::KIND.to_string(),
                entity_id: id.to_string(),
                before,
                after,
                metadata,
            })
            .map(|_| ())
            .map_err(|e| FrameworkError::Audit(e.to_string()))
    }
}

fn entity_error<E: std::error::Error + Send + Sync + 'static>(e: E) -> FrameworkError {
    FrameworkError::EntityError(Box::new(e))
}

// =============================================================================
// 4. THE GENERIC CLIENT
// =============================================================================

/// A type-safe client for interacting with a `ResourceActor`.
///
/// Holds only a sender, so cloning is cheap and clones can be shared across tasks.
#[derive(Clone)]
pub struct ResourceClient<T: ActorEntity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
}

impl<T: ActorEntity> ResourceClient<T> {
    pub fn new(sender: mpsc::Sender<ResourceRequest<T>>) -> Self {
        Self { sender }
    }

    pub async fn create(
        &self,
        principal: &Principal,
        params: T::Create,
    ) -> Result<T::Id, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(ResourceRequest::Create {
                principal: principal.clone(),
                params,
                respond_to,
            })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn get(&self, principal: &Principal, id: T::Id) -> Result<Option<T>, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(ResourceRequest::Get {
                principal: principal.clone(),
                id,
                respond_to,
            })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: T::Id,
        update: T::Update,
    ) -> Result<T, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(ResourceRequest::Update {
                principal: principal.clone(),
                id,
                update,
                respond_to,
            })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn perform_action(
        &self,
        principal: &Principal,
        id: T::Id,
        action: T::Action,
    ) -> Result<T::ActionResult, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(ResourceRequest::Action {
                principal: principal.clone(),
                id,
                action,
                respond_to,
            })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }
}

// =============================================================================
// 5. EXAMPLE USAGE (Test)
// =============================================================================
