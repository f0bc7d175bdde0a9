//! Instrumented collaborators shared by the integration tests

#![allow(dead_code)]

use mapforge_core::Properties;
use mapforge_orm::{
    BoxError, BytesResource, DataSource, DatabaseIdProvider, DescriptorParser, Interceptor,
    LanguageDriver, MappedStatement, ObjectFactory, ResourceRef, SessionConfiguration, TypeHandler,
    Vfs,
};
use std::io::{self, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub type Events = Arc<Mutex<Vec<String>>>;

/// Registration state seen by the parser when the descriptor parse starts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorSnapshot {
    pub alias_count: usize,
    pub handler_count: usize,
    pub plugins: Vec<String>,
    pub drivers: Vec<String>,
    pub caches: Vec<String>,
    pub object_factory: String,
    pub vfs: Option<String>,
    pub database_id: Option<String>,
}

impl DescriptorSnapshot {
    fn capture(configuration: &SessionConfiguration) -> Self {
        Self {
            alias_count: configuration.type_aliases().len(),
            handler_count: configuration.type_handlers().len(),
            plugins: configuration
                .interceptors()
                .names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            drivers: configuration
                .language_drivers()
                .names()
                .map(str::to_string)
                .collect(),
            caches: configuration.cache_ids().map(str::to_string).collect(),
            object_factory: configuration.object_factory().name().to_string(),
            vfs: configuration.vfs().map(|v| v.name().to_string()),
            database_id: configuration.database_id().map(str::to_string),
        }
    }
}

/// Parser that records every call with a snapshot of the database id.
///
/// The descriptor parse also captures a [`DescriptorSnapshot`].
///
/// Resource content is line based:
/// - `statement <id> <sql...>` adds a mapped statement
/// - `statement@<db> <id> <sql...>` adds a vendor-specific statement
/// - `default-driver <name>` sets the default language driver
/// - `fail` makes the parse fail
#[derive(Debug, Default)]
pub struct RecordingParser {
    pub events: Events,
    pub snapshots: Arc<Mutex<Vec<DescriptorSnapshot>>>,
}

impl RecordingParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn descriptor_snapshot(&self) -> Option<DescriptorSnapshot> {
        self.snapshots.lock().unwrap().first().cloned()
    }

    fn record(&self, kind: &str, identity: &str, configuration: &SessionConfiguration) {
        self.events.lock().unwrap().push(format!(
            "{}:{}:{}",
            kind,
            identity,
            configuration.database_id().unwrap_or("-")
        ));
    }

    fn apply(
        &self,
        stream: &mut dyn Read,
        configuration: &mut SessionConfiguration,
        identity: &str,
    ) -> Result<(), BoxError> {
        let mut content = String::new();
        stream.read_to_string(&mut content)?;
        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let mut parts = line.splitn(3, ' ');
            match parts.next() {
                Some("fail") => return Err(format!("syntax error in {}", identity).into()),
                Some("default-driver") => {
                    let name = parts.next().ok_or("missing driver name")?;
                    configuration
                        .language_drivers_mut()
                        .set_default(Arc::new(NamedDriver(name.to_string())))?;
                }
                Some(head) if head.starts_with("statement") => {
                    let id = parts.next().ok_or("missing statement id")?;
                    let sql = parts.next().unwrap_or_default();
                    let mut statement = MappedStatement::new(id, sql).with_resource(identity);
                    if let Some((_, db)) = head.split_once('@') {
                        statement = statement.with_database_id(db);
                    }
                    configuration.add_mapped_statement(statement)?;
                }
                _ => return Err(format!("unknown directive '{}'", line).into()),
            }
        }
        Ok(())
    }
}

impl DescriptorParser for RecordingParser {
    fn parse_descriptor(
        &self,
        stream: &mut dyn Read,
        configuration: &mut SessionConfiguration,
        _overrides: &Properties,
    ) -> Result<(), BoxError> {
        self.record("descriptor", "config", configuration);
        self.snapshots
            .lock()
            .unwrap()
            .push(DescriptorSnapshot::capture(configuration));
        self.apply(stream, configuration, "config")
    }

    fn parse_mapper(
        &self,
        stream: &mut dyn Read,
        configuration: &mut SessionConfiguration,
        identity: &str,
    ) -> Result<(), BoxError> {
        self.record("mapper", identity, configuration);
        self.apply(stream, configuration, identity)
    }
}

#[derive(Debug)]
pub struct NamedDriver(pub String);

impl LanguageDriver for NamedDriver {
    fn name(&self) -> &str {
        &self.0
    }
}

#[derive(Debug)]
pub struct NamedPlugin(pub String);

impl NamedPlugin {
    pub fn new(name: &str) -> Arc<dyn Interceptor> {
        Arc::new(Self(name.to_string()))
    }
}

impl Interceptor for NamedPlugin {
    fn name(&self) -> &str {
        &self.0
    }
}

#[derive(Debug)]
pub struct MappedHandler {
    pub name: String,
    pub mapped_type: String,
}

impl MappedHandler {
    pub fn new(name: &str, mapped_type: &str) -> Arc<dyn TypeHandler> {
        Arc::new(Self {
            name: name.to_string(),
            mapped_type: mapped_type.to_string(),
        })
    }
}

impl TypeHandler for MappedHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn mapped_type(&self) -> &str {
        &self.mapped_type
    }
}

#[derive(Debug)]
pub struct NamedObjectFactory(pub String);

impl ObjectFactory for NamedObjectFactory {
    fn name(&self) -> &str {
        &self.0
    }
}

#[derive(Debug)]
pub struct EmptyVfs(pub String);

impl Vfs for EmptyVfs {
    fn name(&self) -> &str {
        &self.0
    }

    fn list(&self, _path: &str) -> io::Result<Vec<String>> {
        Ok(Vec::new())
    }
}

#[derive(Debug)]
pub struct StaticDataSource {
    pub product: String,
}

impl StaticDataSource {
    pub fn new(product: &str) -> Arc<dyn DataSource> {
        Arc::new(Self {
            product: product.to_string(),
        })
    }
}

impl DataSource for StaticDataSource {
    fn product_name(&self) -> Result<String, BoxError> {
        Ok(self.product.clone())
    }
}

/// Provider returning a fixed id and counting lookups
#[derive(Debug)]
pub struct FixedIdProvider {
    pub id: Option<String>,
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl FixedIdProvider {
    pub fn returning(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: Some(id.to_string()),
            calls: AtomicUsize::new(0),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            id: None,
            calls: AtomicUsize::new(0),
            fail: true,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DatabaseIdProvider for FixedIdProvider {
    fn database_id(&self, _data_source: &dyn DataSource) -> Result<Option<String>, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err("database unavailable".into());
        }
        Ok(self.id.clone())
    }
}

pub fn mapper(name: &str, content: &str) -> ResourceRef {
    BytesResource::new(name, content).into_ref()
}
