//! One-time seeding of the target before replay starts.
//!
//! Replay only carries changes made after the change log begins, so the
//! target first receives a snapshot of the source database.

use anyhow::{bail, Context};
use async_trait::async_trait;
use std::process::Stdio;
use store_client::MySqlOpts;
use tokio::process::Command;
use tracing::info;

/// Copies the current contents of a source database into the target.
#[async_trait]
pub trait Bootstrap: Send + Sync {
    async fn bootstrap(&self, database: &str) -> anyhow::Result<()>;
}

/// Pipes `mysqldump` of the source database into the `mysql` client
/// connected to the target.
#[derive(Debug, Clone)]
pub struct DumpBootstrap {
    source: MySqlOpts,
    target: MySqlOpts,
    mysqldump: String,
    mysql: String,
}

impl DumpBootstrap {
    pub fn new(source: MySqlOpts, target: MySqlOpts) -> Self {
        Self {
            source,
            target,
            mysqldump: "mysqldump".to_string(),
            mysql: "mysql".to_string(),
        }
    }

    /// Use other programs in place of `mysqldump` and `mysql`.
    pub fn with_programs(mut self, mysqldump: impl Into<String>, mysql: impl Into<String>) -> Self {
        self.mysqldump = mysqldump.into();
        self.mysql = mysql.into();
        self
    }

    fn dump_args(&self, database: &str) -> Vec<String> {
        let mut args = connection_args(&self.source);
        args.extend(
            ["--single-transaction", "--routines", "--databases", database]
                .iter()
                .map(|s| s.to_string()),
        );
        args
    }

    fn load_args(&self) -> Vec<String> {
        connection_args(&self.target)
    }
}

fn connection_args(opts: &MySqlOpts) -> Vec<String> {
    vec![
        format!("--host={}", opts.host),
        format!("--port={}", opts.port),
        format!("--user={}", opts.user),
        "--protocol=TCP".to_string(),
    ]
}

#[async_trait]
impl Bootstrap for DumpBootstrap {
    async fn bootstrap(&self, database: &str) -> anyhow::Result<()> {
        info!(
            "Copying database {database} from {}:{} to {}:{}",
            self.source.host, self.source.port, self.target.host, self.target.port
        );

        // Passwords go through the environment, not the process list.
        let mut dump = Command::new(&self.mysqldump)
            .args(self.dump_args(database))
            .env("MYSQL_PWD", &self.source.password)
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start {}", self.mysqldump))?;

        let dump_out: Stdio = dump
            .stdout
            .take()
            .context("mysqldump stdout was not captured")?
            .try_into()
            .context("Failed to hand mysqldump output to the loader")?;

        let load_status = Command::new(&self.mysql)
            .args(self.load_args())
            .env("MYSQL_PWD", &self.target.password)
            .stdin(dump_out)
            .status()
            .await
            .with_context(|| format!("Failed to run {}", self.mysql))?;

        let dump_status = dump
            .wait()
            .await
            .with_context(|| format!("Failed to wait for {}", self.mysqldump))?;

        if !dump_status.success() {
            bail!("{} exited with {dump_status}", self.mysqldump);
        }
        if !load_status.success() {
            bail!("{} exited with {load_status}", self.mysql);
        }

        info!("Bootstrap of {database} complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(port: u16) -> MySqlOpts {
        MySqlOpts {
            host: "db.local".into(),
            port,
            user: "repl".into(),
            password: "secret".into(),
        }
    }

    #[test]
    fn test_arguments_never_carry_the_password() {
        let bootstrap = DumpBootstrap::new(opts(3307), opts(3306));
        let dump = bootstrap.dump_args("shop");
        assert_eq!(
            dump,
            vec![
                "--host=db.local",
                "--port=3307",
                "--user=repl",
                "--protocol=TCP",
                "--single-transaction",
                "--routines",
                "--databases",
                "shop"
            ]
        );
        assert!(bootstrap.load_args().contains(&"--port=3306".to_string()));
        assert!(!dump.iter().chain(&bootstrap.load_args()).any(|a| a.contains("secret")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_pipes_dump_into_loader() {
        // `echo` stands in for mysqldump and `cat` for the loader.
        let bootstrap = DumpBootstrap::new(opts(3307), opts(3306)).with_programs("echo", "cat");
        bootstrap.bootstrap("shop").await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_dump_is_reported() {
        let bootstrap = DumpBootstrap::new(opts(3307), opts(3306)).with_programs("false", "cat");
        let err = bootstrap.bootstrap("shop").await.unwrap_err();
        assert!(err.to_string().starts_with("false exited with"));
    }
}
