use std::fs;
use std::path::{Path, PathBuf};

use axum::Router;
use notify::{Event, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tower_http::services::ServeDir;
use tower_livereload::LiveReloadLayer;
use tracing::{error, info};

use notegraph::io::write_svg;

use crate::settled_graph;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>notegraph</title></head>
<body style="margin:0;background:#1a1a2e">
<img src="graph.svg" alt="graph">
</body>
</html>
"#;

/// Re-layout the input graph and rewrite the preview files
fn regenerate(input: &Path, config: Option<&Path>, output: &Path) -> anyhow::Result<()> {
    let graph = settled_graph(input, config)?;
    fs::create_dir_all(output)?;
    write_svg(&output.join("graph.svg"), &graph.scene())?;
    fs::write(output.join("index.html"), INDEX_HTML)?;
    Ok(())
}

/// Start the preview server with hot reload
pub async fn serve(
    input: &Path,
    config: Option<&Path>,
    output: &Path,
    port: u16,
) -> anyhow::Result<()> {
    regenerate(input, config, output)?;
    info!(output = %output.display(), "generated initial preview");

    let (tx, mut rx) = mpsc::channel::<()>(1);

    let mut watcher = notify::recommended_watcher(move |res: Result<Event, _>| {
        if let Ok(event) = res {
            if event.kind.is_modify() || event.kind.is_create() {
                let _ = tx.blocking_send(());
            }
        }
    })?;

    // Watch the parent directory so editors that replace the file still trigger
    let watch_path = input
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    watcher.watch(&watch_path, RecursiveMode::NonRecursive)?;
    if let Some(config) = config {
        watcher.watch(config, RecursiveMode::NonRecursive)?;
    }

    let input_for_regen = input.to_path_buf();
    let config_for_regen = config.map(Path::to_path_buf);
    let output_for_regen = output.to_path_buf();
    tokio::spawn(async move {
        while rx.recv().await.is_some() {
            // Debounce bursts of events from a single save
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
            while rx.try_recv().is_ok() {}

            match regenerate(
                &input_for_regen,
                config_for_regen.as_deref(),
                &output_for_regen,
            ) {
                Ok(()) => info!("regenerated preview"),
                Err(e) => error!("error regenerating: {e:#}"),
            }
        }
    });

    let livereload = LiveReloadLayer::new();
    let reloader = livereload.reloader();

    let mut output_watcher = notify::recommended_watcher(move |res: Result<Event, _>| {
        if let Ok(event) = res {
            if event.kind.is_modify() || event.kind.is_create() {
                reloader.reload();
            }
        }
    })?;
    output_watcher.watch(output, RecursiveMode::Recursive)?;

    let app = Router::new()
        .fallback_service(ServeDir::new(output))
        .layer(livereload);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!("Preview server running at http://localhost:{port}");
    println!("Watching {} for changes...", input.display());
    println!("Press Ctrl+C to stop");

    // Keep watchers alive
    let _watcher = watcher;
    let _output_watcher = output_watcher;

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn regenerate_writes_preview_files() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("graph.json");
        fs::write(
            &input,
            r#"{ "nodes": [{ "id": "a", "label": "A" }, { "id": "b", "label": "B" }],
                 "edges": [{ "source": "a", "target": "b" }] }"#,
        )
        .unwrap();
        let output = dir.path().join("site");

        regenerate(&input, None, &output).unwrap();

        let svg = fs::read_to_string(output.join("graph.svg")).unwrap();
        assert_eq!(svg.matches("<circle ").count(), 2);
        assert!(fs::read_to_string(output.join("index.html"))
            .unwrap()
            .contains("graph.svg"));
    }

    #[test]
    fn regenerate_reports_bad_input() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("graph.toml");
        fs::write(&input, "").unwrap();

        let err = regenerate(&input, None, &dir.path().join("site")).unwrap_err();
        assert!(format!("{err:#}").contains("unsupported format"));
    }
}
