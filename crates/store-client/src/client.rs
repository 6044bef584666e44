//! The resilient store client.

use crate::error::StoreError;
use crate::literal::{bind, literal, Quoting};
use crate::session::{Connector, QueryOutcome, Session};
use chrono_tz::Tz;
use replay_core::{quote_identifier, ResultSet, RowImage, SqlStatement, SqlValue};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// Schemas that belong to the server rather than to replicated data.
const SYSTEM_DATABASES: &[&str] = &[
    "information_schema",
    "memsql",
    "mysql",
    "performance_schema",
    "sys",
];

/// Fixed-interval retry bounded by a wall-clock window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Pause between attempts.
    pub interval: Duration,
    /// Give up once this much time has passed since the first attempt.
    pub window: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            window: Duration::from_secs(60),
        }
    }
}

/// Client behaviour that does not depend on the connector.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Reconnect before use when the session has been idle longer than this.
    pub idle_timeout: Duration,
    /// Zone used to bind timestamps and for each session's `time_zone`.
    pub time_zone: Tz,
    /// Connection character set, set with `SET NAMES`.
    pub charset: String,
    /// Database selected with `USE` on every new session.
    pub database: Option<String>,
    /// String literal style; must match the target's `NO_BACKSLASH_ESCAPES`.
    pub quoting: Quoting,
    pub retry: RetryPolicy,
    /// Log every bound statement.
    pub log_queries: bool,
    /// Log every result set as a table.
    pub log_results: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(7 * 60 * 60),
            time_zone: Tz::UTC,
            charset: "utf8mb4".to_string(),
            database: None,
            quoting: Quoting::default(),
            retry: RetryPolicy::default(),
            log_queries: false,
            log_results: false,
        }
    }
}

struct Connection<S> {
    session: S,
    last_used: Instant,
}

/// A client for one store that reconnects on its own.
///
/// Before every operation the client makes sure it holds a session that has
/// not been idle longer than [`ClientConfig::idle_timeout`], reconnecting if
/// needed. A session that breaks during a statement is dropped and the error
/// returned, since the statement may already have been applied; the next
/// operation opens a new session.
///
/// Parameters are rendered by the driver as literals for the configured
/// [`Quoting`]; there is no way to interpolate a raw value.
pub struct StoreClient<C: Connector> {
    connector: C,
    config: ClientConfig,
    conn: Option<Connection<C::Session>>,
    connects: u64,
}

impl<C: Connector> StoreClient<C> {
    /// Create a client. No session is opened until the first operation.
    pub fn new(connector: C, config: ClientConfig) -> Self {
        Self {
            connector,
            config,
            conn: None,
            connects: 0,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Number of sessions opened so far.
    pub fn connect_count(&self) -> u64 {
        self.connects
    }

    pub fn set_log_queries(&mut self, enabled: bool) {
        self.config.log_queries = enabled;
    }

    pub fn set_log_results(&mut self, enabled: bool) {
        self.config.log_results = enabled;
    }

    /// Run a write statement and return the number of affected rows.
    pub async fn execute(&mut self, statement: &SqlStatement) -> Result<u64, StoreError> {
        Ok(self.run(statement).await?.row_count())
    }

    /// Run a read statement and return its result set.
    pub async fn query(&mut self, statement: &SqlStatement) -> Result<ResultSet, StoreError> {
        self.run(statement)
            .await?
            .into_result_set()
            .ok_or(StoreError::NotAResultSet)
    }

    /// Run a read statement expected to return at most one row.
    pub async fn get(&mut self, statement: &SqlStatement) -> Result<Option<RowImage>, StoreError> {
        let rows = self.query(statement).await?;
        if rows.len() > 1 {
            return Err(StoreError::MultipleRows(rows.len()));
        }
        Ok(rows.row(0).map(|row| row.to_image()))
    }

    /// Run any statement and report what it produced.
    pub async fn run(&mut self, statement: &SqlStatement) -> Result<QueryOutcome, StoreError> {
        let sql = bind(statement, &self.config.time_zone, self.config.quoting)?;
        if self.config.log_queries {
            info!("{sql}");
        }

        let outcome = self.run_sql(&sql).await?;

        if self.config.log_results {
            match &outcome {
                QueryOutcome::Rows(rows) => info!("\n{}", rows.format_table()),
                QueryOutcome::Affected(n) => info!("{n} row(s) affected"),
            }
        }
        Ok(outcome)
    }

    /// Query repeatedly at the configured interval while `is_retryable`
    /// accepts the latest error.
    ///
    /// The first error `is_retryable` rejects is returned as is. Once the
    /// retry window has passed, [`StoreError::RetryExhausted`] carries the
    /// last error observed.
    pub async fn query_with_retry<F>(
        &mut self,
        statement: &SqlStatement,
        is_retryable: F,
    ) -> Result<ResultSet, StoreError>
    where
        F: Fn(&StoreError) -> bool,
    {
        let policy = self.config.retry;
        let started = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let err = match self.query(statement).await {
                Ok(rows) => return Ok(rows),
                Err(err) => err,
            };

            if !is_retryable(&err) {
                return Err(err);
            }
            let elapsed = started.elapsed();
            if elapsed > policy.window {
                warn!("Giving up after {attempts} attempts in {elapsed:?}: {err}");
                return Err(StoreError::RetryExhausted {
                    attempts,
                    elapsed,
                    last: Box::new(err),
                });
            }

            debug!("Attempt {attempts} failed, retrying: {err}");
            sleep(policy.interval).await;
        }
    }

    /// Create `name` if it does not exist and make it the current database,
    /// for this session and every later one.
    pub async fn ensure_database(&mut self, name: &str) -> Result<(), StoreError> {
        let quoted = quote_identifier(name);
        self.run_sql(&format!("CREATE DATABASE IF NOT EXISTS {quoted}"))
            .await?;
        self.config.database = Some(name.to_string());
        self.run_sql(&format!("USE {quoted}")).await?;
        Ok(())
    }

    /// Base tables of the current database, sorted by name.
    pub async fn tables(&mut self) -> Result<Vec<String>, StoreError> {
        let rows = self.query(&SqlStatement::raw("SHOW FULL TABLES")).await?;
        let mut tables: Vec<String> = rows
            .iter()
            .filter(|row| row.at(1).and_then(|v| v.as_str()) == Some("BASE TABLE"))
            .filter_map(|row| row.at(0).and_then(|v| v.as_str()).map(str::to_string))
            .collect();
        tables.sort();
        Ok(tables)
    }

    /// Databases on the server, excluding system schemas.
    pub async fn databases(&mut self) -> Result<Vec<String>, StoreError> {
        let rows = self.query(&SqlStatement::raw("SHOW DATABASES")).await?;
        Ok(rows
            .iter()
            .filter_map(|row| row.at(0).and_then(|v| v.as_str()).map(str::to_string))
            .filter(|name| !SYSTEM_DATABASES.contains(&name.to_ascii_lowercase().as_str()))
            .collect())
    }

    /// Close the current session, if any.
    pub async fn close(&mut self) -> Result<(), StoreError> {
        match self.conn.take() {
            Some(conn) => conn.session.close().await,
            None => Ok(()),
        }
    }

    async fn run_sql(&mut self, sql: &str) -> Result<QueryOutcome, StoreError> {
        self.ensure_fresh().await?;

        match self.session_mut()?.execute(sql).await {
            Ok(outcome) => {
                if let Some(conn) = self.conn.as_mut() {
                    conn.last_used = Instant::now();
                }
                Ok(outcome)
            }
            Err(err) => {
                if err.is_connection() {
                    warn!("Session lost ({err}), it will be replaced on next use");
                    self.discard_session().await;
                }
                Err(err)
            }
        }
    }

    async fn ensure_fresh(&mut self) -> Result<(), StoreError> {
        let idle = match self.conn.as_ref().map(|conn| conn.last_used.elapsed()) {
            None => return self.reconnect().await,
            Some(idle) => idle,
        };
        if idle > self.config.idle_timeout {
            info!("Session idle for {idle:?}, reconnecting");
            self.reconnect().await?;
        }
        Ok(())
    }

    async fn reconnect(&mut self) -> Result<(), StoreError> {
        self.discard_session().await;

        let init = self.init_statements()?;
        let mut session = self.connector.connect().await?;
        for sql in init {
            if let Err(err) = session.execute(&sql).await {
                if let Err(close_err) = session.close().await {
                    debug!("Failed to close half-initialised session: {close_err}");
                }
                return Err(StoreError::connection(format!(
                    "session initialisation failed on `{sql}`: {err}"
                )));
            }
        }

        self.connects += 1;
        debug!("Opened session #{}", self.connects);
        self.conn = Some(Connection {
            session,
            last_used: Instant::now(),
        });
        Ok(())
    }

    async fn discard_session(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err(err) = conn.session.close().await {
                debug!("Ignoring error while closing stale session: {err}");
            }
        }
    }

    fn init_statements(&self) -> Result<Vec<String>, StoreError> {
        let zone = if self.config.time_zone == Tz::UTC {
            "+00:00".to_string()
        } else {
            self.config.time_zone.name().to_string()
        };

        let mut statements = vec![
            format!("SET NAMES {}", self.config.charset),
            format!(
                "SET time_zone = {}",
                literal(&SqlValue::Text(zone), &Tz::UTC, self.config.quoting)?
            ),
        ];
        if let Some(database) = &self.config.database {
            statements.push(format!("USE {}", quote_identifier(database)));
        }
        Ok(statements)
    }

    fn session_mut(&mut self) -> Result<&mut C::Session, StoreError> {
        self.conn
            .as_mut()
            .map(|conn| &mut conn.session)
            .ok_or_else(|| StoreError::connection("no open session"))
    }
}
