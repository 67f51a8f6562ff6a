use crate::{
    capture::{ChangeDescriber, XmlChangeDescriber},
    entity::{Entity, LogAll, LogPolicy},
    entry::{AuditEvent, Operation},
    error::{AuditError, DispatchFailure, ProviderFailure, Result},
    identity::{
        resolve_or_default, unconfigured_ip_resolver, unconfigured_user_resolver, IpResolver,
        Resolved, UserResolver,
    },
    provider::AuditLogger,
};
use config_engine::{AuditKeys, ConfigLookup, MemoryConfig};
use futures::future::join_all;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone)]
struct Resolvers {
    user: UserResolver,
    ip: IpResolver,
}

/// Records entity mutations and custom events to every registered provider.
///
/// Built once at startup and shared (usually behind an `Arc`) by the code
/// that persists entities.
pub struct AuditLog {
    providers: RwLock<Vec<Arc<dyn AuditLogger>>>,
    resolvers: RwLock<Resolvers>,
    config: Arc<dyn ConfigLookup>,
    policy: Arc<dyn LogPolicy>,
    describer: Arc<dyn ChangeDescriber>,
    keys: AuditKeys,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl AuditLog {
    pub fn builder() -> AuditLogBuilder {
        AuditLogBuilder::default()
    }

    // =============================================================================
    // Registration
    // =============================================================================

    /// Append a provider. Providers receive records in registration order.
    pub fn register_provider(&self, provider: Arc<dyn AuditLogger>) {
        info!(provider = provider.name(), "Registering audit provider");
        self.providers.write().push(provider);
    }

    /// Same as [`register_provider`](Self::register_provider) for callers
    /// holding an optional provider.
    pub fn register_provider_opt(&self, provider: Option<Arc<dyn AuditLogger>>) -> Result<()> {
        let provider = provider.ok_or_else(|| {
            AuditError::InvalidArgument("audit provider must not be empty".to_string())
        })?;
        self.register_provider(provider);
        Ok(())
    }

    pub fn provider_count(&self) -> usize {
        self.providers.read().len()
    }

    /// Replace the user and/or IP resolver; `None` keeps the current one.
    pub fn configure(&self, user: Option<UserResolver>, ip: Option<IpResolver>) {
        let mut resolvers = self.resolvers.write();
        if let Some(user) = user {
            resolvers.user = user;
        }
        if let Some(ip) = ip {
            resolvers.ip = ip;
        }
    }

    // =============================================================================
    // Entity mutations
    // =============================================================================

    pub async fn record_insert(&self, entity: &dyn Entity) -> Result<()> {
        if !self.should_record(Operation::Insert, entity) {
            return Ok(());
        }

        let data = if self.captures_data(Operation::Insert) {
            self.describer.snapshot(entity)
        } else {
            String::new()
        };

        self.record_event(Operation::Insert.as_str(), &data, Some(entity))
            .await
    }

    pub async fn record_update(&self, entity: &dyn Entity) -> Result<()> {
        if !self.should_record(Operation::Update, entity) {
            return Ok(());
        }

        let mut data = String::new();
        if self.captures_data(Operation::Update) {
            match self.describer.diff(entity).await {
                Ok(changes) if changes.is_empty() => {
                    debug!(
                        item_type = entity.type_name(),
                        "No field changes, update not recorded"
                    );
                    return Ok(());
                }
                Ok(changes) => data = changes,
                Err(e) => warn!(
                    item_type = entity.type_name(),
                    error = %e,
                    "Cannot compute changes, recording update without data"
                ),
            }
        }

        self.record_event(Operation::Update.as_str(), &data, Some(entity))
            .await
    }

    pub async fn record_delete(&self, entity: &dyn Entity) -> Result<()> {
        if !self.should_record(Operation::Delete, entity) {
            return Ok(());
        }

        let mut data = String::new();
        if self.captures_data(Operation::Delete) {
            match self.describer.pre_delete_snapshot(entity).await {
                Ok(values) => data = values,
                Err(e) => warn!(
                    item_type = entity.type_name(),
                    error = %e,
                    "Cannot read values before delete, recording delete without data"
                ),
            }
        }

        self.record_event(Operation::Delete.as_str(), &data, Some(entity))
            .await
    }

    fn should_record(&self, operation: Operation, entity: &dyn Entity) -> bool {
        if entity.is_audit_event() {
            return false;
        }

        let key = self.keys.action(operation.as_str());
        if !self.config.get_bool(&key, false) {
            debug!(key = %key, "Audit action disabled");
            return false;
        }

        if !self.policy.should_log(entity.type_name()) {
            debug!(item_type = entity.type_name(), "Type excluded from audit");
            return false;
        }

        true
    }

    fn captures_data(&self, operation: Operation) -> bool {
        self.config
            .get_bool(&self.keys.data(operation.as_str()), true)
    }

    // =============================================================================
    // Custom events
    // =============================================================================

    pub async fn record_custom_event(&self, name: &str, data: &str) -> Result<()> {
        self.record_event(name, data, None).await
    }

    /// Record an event, taking the user and IP from the configured resolvers.
    pub async fn record_event(
        &self,
        name: &str,
        data: &str,
        entity: Option<&dyn Entity>,
    ) -> Result<()> {
        // Validate before touching the resolvers
        if name.is_empty() {
            return Err(AuditError::InvalidArgument(
                "audit event name must not be empty".to_string(),
            ));
        }

        let user_id = self.current_user_id();
        let user_ip = self.current_user_ip();
        for diagnostic in [&user_id.diagnostic, &user_ip.diagnostic]
            .into_iter()
            .flatten()
        {
            debug!(event = name, "{}; recording as unknown", diagnostic);
        }

        self.record_event_as(
            name,
            data,
            entity,
            user_id.value.as_deref(),
            user_ip.value.as_deref(),
        )
        .await
    }

    /// Record an event with an explicit user and IP; no resolvers are called.
    pub async fn record_event_as(
        &self,
        name: &str,
        data: &str,
        entity: Option<&dyn Entity>,
        user_id: Option<&str>,
        user_ip: Option<&str>,
    ) -> Result<()> {
        let event = AuditEvent::new(
            name,
            data,
            entity,
            user_id.map(str::to_string),
            user_ip.map(str::to_string),
        )?;
        self.record(&event).await
    }

    /// Fan a built event out to every provider.
    ///
    /// All providers run concurrently and every one runs to completion; the
    /// call fails with [`AuditError::Dispatch`] if any of them failed.
    pub async fn record(&self, event: &AuditEvent) -> Result<()> {
        let providers = self.providers.read().clone();

        let mut pending = Vec::with_capacity(providers.len());
        for provider in providers {
            let Some(mut record) = provider.create_record() else {
                debug!(provider = provider.name(), "Provider declined audit record");
                continue;
            };
            record.populate(event);

            pending.push(async move {
                let result = provider.persist(record).await;
                result.map_err(|e| ProviderFailure {
                    provider: provider.name().to_string(),
                    message: e.to_string(),
                })
            });
        }

        let attempted = pending.len();
        let failures: Vec<ProviderFailure> = join_all(pending)
            .await
            .into_iter()
            .filter_map(std::result::Result::err)
            .collect();

        if failures.is_empty() {
            return Ok(());
        }

        for failure in &failures {
            warn!(
                provider = %failure.provider,
                event = event.event(),
                error = %failure.message,
                "Audit provider failed to persist record"
            );
        }
        Err(AuditError::Dispatch(DispatchFailure {
            failures,
            attempted,
        }))
    }

    // =============================================================================
    // Context resolution
    // =============================================================================

    fn resolvers(&self) -> Resolvers {
        self.resolvers.read().clone()
    }

    fn current_user_id(&self) -> Resolved<String> {
        let resolver = self.resolvers().user;
        let user = resolve_or_default("user id", || resolver());
        Resolved {
            value: user.value.map(|identity| identity.id),
            diagnostic: user.diagnostic,
        }
    }

    fn current_user_ip(&self) -> Resolved<String> {
        let resolver = self.resolvers().ip;
        resolve_or_default("user ip", || resolver())
    }
}

/// Startup builder for [`AuditLog`]
pub struct AuditLogBuilder {
    providers: Vec<Arc<dyn AuditLogger>>,
    user: Option<UserResolver>,
    ip: Option<IpResolver>,
    config: Option<Arc<dyn ConfigLookup>>,
    policy: Option<Arc<dyn LogPolicy>>,
    describer: Option<Arc<dyn ChangeDescriber>>,
    keys: AuditKeys,
}

impl Default for AuditLogBuilder {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            user: None,
            ip: None,
            config: None,
            policy: None,
            describer: None,
            keys: AuditKeys::default(),
        }
    }
}

impl AuditLogBuilder {
    /// Configuration area used as the key prefix (`<Area>:Audit:...`).
    pub fn area(mut self, area: impl Into<String>) -> Self {
        self.keys = AuditKeys::new(area);
        self
    }

    pub fn config(mut self, config: impl ConfigLookup + 'static) -> Self {
        self.config = Some(Arc::new(config));
        self
    }

    pub fn policy(mut self, policy: impl LogPolicy + 'static) -> Self {
        self.policy = Some(Arc::new(policy));
        self
    }

    pub fn describer(mut self, describer: impl ChangeDescriber + 'static) -> Self {
        self.describer = Some(Arc::new(describer));
        self
    }

    pub fn provider(self, provider: impl AuditLogger + 'static) -> Self {
        self.shared_provider(Arc::new(provider))
    }

    pub fn shared_provider(mut self, provider: Arc<dyn AuditLogger>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn user_resolver(mut self, resolver: UserResolver) -> Self {
        self.user = Some(resolver);
        self
    }

    pub fn ip_resolver(mut self, resolver: IpResolver) -> Self {
        self.ip = Some(resolver);
        self
    }

    pub fn build(self) -> AuditLog {
        AuditLog {
            providers: RwLock::new(self.providers),
            resolvers: RwLock::new(Resolvers {
                user: self.user.unwrap_or_else(unconfigured_user_resolver),
                ip: self.ip.unwrap_or_else(unconfigured_ip_resolver),
            }),
            config: self
                .config
                .unwrap_or_else(|| Arc::new(MemoryConfig::new())),
            policy: self.policy.unwrap_or_else(|| Arc::new(LogAll)),
            describer: self
                .describer
                .unwrap_or_else(|| Arc::new(XmlChangeDescriber::detached())),
            keys: self.keys,
        }
    }
}
