use cassmock_core::schema::validate_identifier;
use cassmock_core::{Result, SessionConfig, SqliteEngine};

pub use cassmock_core::{Error, ErrorCategory, Parameters, TableSchema, Value};

pub mod session;
pub use session::Session;

pub mod result;
pub use result::{ResultSet, Row};

pub mod statement;
pub use statement::{BoundStatement, PreparedStatement, Statement};

pub mod future;
pub use future::ResponseFuture;

/// Default contact point recorded when none is given
pub const DEFAULT_CONTACT_POINT: &str = "127.0.0.1";

/// Cluster handle
///
/// Contact points, authentication and SSL settings are recorded for
/// inspection only; every [`connect`](Cluster::connect) opens a fresh
/// in-memory engine.
#[derive(Debug, Clone)]
pub struct Cluster {
    contact_points: Vec<String>,
    auth_provider: Option<String>,
    ssl: bool,
    config: SessionConfig,
}

impl Default for Cluster {
    fn default() -> Self {
        Self {
            contact_points: vec![DEFAULT_CONTACT_POINT.to_string()],
            auth_provider: None,
            ssl: false,
            config: SessionConfig::default(),
        }
    }
}

impl Cluster {
    /// Cluster with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> ClusterBuilder {
        ClusterBuilder::new()
    }

    /// Open a session with its own engine and empty schema registry
    ///
    /// # Examples
    ///
    /// ```
    /// use cassmock_api::Cluster;
    ///
    /// let session = Cluster::new().connect(Some("app")).unwrap();
    /// session.execute("CREATE TABLE users (id uuid PRIMARY KEY, name text)").unwrap();
    /// session.execute("INSERT INTO users (id, name) VALUES ('u1', 'Alice')").unwrap();
    ///
    /// let rows = session.execute("SELECT name FROM users WHERE id = 'u1'").unwrap();
    /// assert_eq!(rows.one().unwrap().get_text("name"), Some("Alice"));
    /// ```
    pub fn connect(&self, keyspace: Option<&str>) -> Result<Session> {
        self.config.validate()?;
        if let Some(keyspace) = keyspace {
            validate_identifier(keyspace)?;
        }

        let engine = SqliteEngine::open_in_memory()?;
        tracing::info!(
            contact_points = ?self.contact_points,
            keyspace = ?keyspace,
            "connected session"
        );

        Ok(Session::new(
            Box::new(engine),
            &self.config,
            keyspace.map(str::to_string),
        ))
    }

    pub fn contact_points(&self) -> &[String] {
        &self.contact_points
    }

    pub fn auth_provider(&self) -> Option<&str> {
        self.auth_provider.as_deref()
    }

    pub fn ssl_enabled(&self) -> bool {
        self.ssl
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

/// Builder for [`Cluster`]
#[derive(Debug, Clone, Default)]
pub struct ClusterBuilder {
    contact_points: Vec<String>,
    auth_provider: Option<String>,
    ssl: bool,
    config: SessionConfig,
}

impl ClusterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contact_point(mut self, host: impl Into<String>) -> Self {
        self.contact_points.push(host.into());
        self
    }

    pub fn contact_points<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.contact_points.extend(hosts.into_iter().map(Into::into));
        self
    }

    /// Opaque label of the authentication provider
    pub fn auth_provider(mut self, label: impl Into<String>) -> Self {
        self.auth_provider = Some(label.into());
        self
    }

    pub fn ssl(mut self, enabled: bool) -> Self {
        self.ssl = enabled;
        self
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Cluster> {
        self.config.validate()?;
        let contact_points = if self.contact_points.is_empty() {
            vec![DEFAULT_CONTACT_POINT.to_string()]
        } else {
            self.contact_points
        };
        Ok(Cluster {
            contact_points,
            auth_provider: self.auth_provider,
            ssl: self.ssl,
            config: self.config,
        })
    }
}
