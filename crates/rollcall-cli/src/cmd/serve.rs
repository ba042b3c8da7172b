use anyhow::Context;
use rollcall_core::{config::Config, db};
use std::path::Path;

pub fn run(root: &Path, port: Option<u16>) -> anyhow::Result<()> {
    let config = Config::load(root)?;
    let port = port.unwrap_or(config.server.port);

    // Fail before binding if the database cannot be opened.
    let db_path = config.database_path(root);
    db::open(&db_path).with_context(|| format!("failed to open {}", db_path.display()))?;

    let rt = tokio::runtime::Runtime::new()?;
    let root_buf = root.to_path_buf();

    rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
        let actual_port = listener.local_addr()?.port();
        println!(
            "rollcall API for '{}' at http://localhost:{actual_port}",
            config.project.name
        );

        tokio::select! {
            res = rollcall_server::serve_on(root_buf, listener) => res,
            _ = tokio::signal::ctrl_c() => Ok(()),
        }
    })
}
