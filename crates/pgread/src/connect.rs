//! Scoped connections.
//!
//! [`Connection::open`] connects, spawns the connection driver, and returns an
//! owned handle. Dropping the handle releases the client, which ends the driver
//! task; this happens on every exit path, including `?` returns and panics.
//! [`Connection::close`] does the same and waits for the driver to finish.

use crate::error::ReadResult;
use crate::session::{ResultSet, Session};
use serde::Deserialize;
use tokio::task::JoinHandle;
use tokio_postgres::tls::{MakeTlsConnect, TlsConnect};
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, Socket};

/// Where and how to connect.
///
/// Loading these values (from files, the environment, a secrets store) is left to
/// the caller; the struct derives `Deserialize` so any serde source can fill it.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ConnectionParams {
    pub host: String,
    pub database: String,
    pub user: String,
    pub password: Option<String>,
    pub port: u16,
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            database: "postgres".to_string(),
            user: "postgres".to_string(),
            password: None,
            port: 5432,
        }
    }
}

impl ConnectionParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Driver configuration for these parameters.
    pub fn to_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .dbname(&self.database)
            .user(&self.user);
        if let Some(password) = &self.password {
            config.password(password);
        }
        config
    }
}

impl std::fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("port", &self.port)
            .finish()
    }
}

/// Background task driving one connection; logs when it is released.
struct Driver {
    handle: Option<JoinHandle<()>>,
    label: String,
}

impl Driver {
    async fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                tracing::warn!(target: "pgread.session", connection = %self.label, error = %err, "connection task failed");
            }
            tracing::debug!(target: "pgread.session", connection = %self.label, "connection closed");
        }
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        if self.handle.is_some() {
            tracing::debug!(target: "pgread.session", connection = %self.label, "connection released");
        }
    }
}

/// An open connection, released when dropped.
pub struct Connection {
    client: Client,
    driver: Driver,
}

impl Connection {
    /// Connect without TLS.
    pub async fn open(params: &ConnectionParams) -> ReadResult<Self> {
        Self::open_with_tls(params, tokio_postgres::NoTls).await
    }

    /// Connect without TLS using a `postgres://` URL or key/value string.
    pub async fn open_url(url: &str) -> ReadResult<Self> {
        let config: tokio_postgres::Config = url.parse()?;
        Self::connect(config, tokio_postgres::NoTls).await
    }

    /// Connect with a custom TLS connector.
    pub async fn open_with_tls<T>(params: &ConnectionParams, tls: T) -> ReadResult<Self>
    where
        T: MakeTlsConnect<Socket> + Send + 'static,
        T::Stream: Send + 'static,
        T::TlsConnect: Send,
        <T::TlsConnect as TlsConnect<Socket>>::Future: Send,
    {
        Self::connect(params.to_config(), tls).await
    }

    async fn connect<T>(config: tokio_postgres::Config, tls: T) -> ReadResult<Self>
    where
        T: MakeTlsConnect<Socket> + Send + 'static,
        T::Stream: Send + 'static,
        T::TlsConnect: Send,
        <T::TlsConnect as TlsConnect<Socket>>::Future: Send,
    {
        let label = describe_target(&config);
        let (client, connection) = config.connect(tls).await?;
        tracing::debug!(target: "pgread.session", connection = %label, "connection opened");

        let task_label = label.clone();
        let handle = tokio::spawn(async move {
            if let Err(err) = connection.await {
                tracing::warn!(target: "pgread.session", connection = %task_label, error = %err, "connection error");
            }
        });

        Ok(Self {
            client,
            driver: Driver {
                handle: Some(handle),
                label,
            },
        })
    }

    /// The underlying driver client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Release the client and wait for the connection task to finish.
    pub async fn close(self) {
        let Connection { client, driver } = self;
        drop(client);
        driver.join().await;
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("target", &self.driver.label)
            .field("closed", &self.client.is_closed())
            .finish()
    }
}

/// `host:port/dbname`, never including credentials.
fn describe_target(config: &tokio_postgres::Config) -> String {
    let host = config
        .get_hosts()
        .first()
        .map(|h| match h {
            tokio_postgres::config::Host::Tcp(name) => name.clone(),
            #[cfg(unix)]
            tokio_postgres::config::Host::Unix(path) => path.display().to_string(),
        })
        .unwrap_or_default();
    let port = config.get_ports().first().copied().unwrap_or(5432);
    let dbname = config.get_dbname().unwrap_or_default();
    format!("{host}:{port}/{dbname}")
}

impl Session for Connection {
    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ReadResult<u64> {
        Session::execute(&self.client, sql, params).await
    }

    async fn fetch(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ReadResult<ResultSet> {
        Session::fetch(&self.client, sql, params).await
    }

    async fn describe(&self, sql: &str) -> ReadResult<Vec<String>> {
        Session::describe(&self.client, sql).await
    }
}
