use keystone::actor::spawn_editor;
use keystone::config::EditorConfig;
use keystone::coords::ViewportRect;
use keystone::drag::PointerEvent;
use keystone::editor::PointerInput;
use keystone::error::{EditorError, ErrorCode};
use keystone::handles::HandleKind;
use keystone::reducer::Action;
use keystone::scene::EditMode;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = EditorConfig::from_env();
    let (handle, task) = spawn_editor(&config);

    if let Err(e) = session(&handle).await {
        tracing::error!(code = e.error_code(), error = %e, "editor session failed");
    }

    if let Err(e) = handle.shutdown().await {
        tracing::warn!(error = %e, "editor already stopped");
    }
    if let Err(e) = task.await {
        tracing::error!(error = %e, "editor task panicked");
    }
}

/// Scripted session: import an image, drag it once, undo, redo.
async fn session(handle: &keystone::actor::EditorHandle) -> Result<(), EditorError> {
    handle.set_viewport(ViewportRect::new(0.0, 0.0, 800.0, 600.0)).await?;

    let layer = handle.image_decoded("data:image/png;base64,", 1024.0, 512.0).await?;
    handle.dispatch(Action::set_edit_mode(EditMode::Move)).await?;
    tracing::info!(layer, "imported");

    // Canvas origin sits at the viewport center under the default projector.
    handle.pointer(PointerInput::Down { kind: HandleKind::MoveCenter, event: PointerEvent::new(1, 400.0, 300.0) }).await?;
    for step in 1..=5 {
        let x = 400.0 + f64::from(step) * 10.0;
        handle.pointer(PointerInput::Move(PointerEvent::new(1, x, 300.0))).await?;
    }
    handle.pointer(PointerInput::Up(PointerEvent::new(1, 450.0, 300.0))).await?;

    let (past, future) = handle.history_depth().await?;
    tracing::info!(past, future, "drag recorded");

    handle.undo().await?;
    handle.redo().await?;

    let scene = handle.scene().await?;
    match serde_json::to_string(&scene) {
        Ok(json) => tracing::info!(scene = %json, "final scene"),
        Err(e) => tracing::warn!(error = %e, "scene did not serialize"),
    }
    Ok(())
}
