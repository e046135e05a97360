//! Serialized editor owner for threaded hosts.
//!
//! DESIGN
//! ======
//! One tokio task owns the [`Editor`]. Callers talk to it through a cloneable
//! [`EditorHandle`], which sends requests over a bounded mpsc queue and
//! awaits a oneshot reply. The task handles one request at a time, so
//! dispatches never interleave no matter how many callers there are.
//!
//! Whenever a request leaves a redraw pending, the task publishes the latest
//! scene on a `watch` channel. A renderer that wakes up late sees only the
//! newest scene, never a backlog.
//!
//! After [`EditorHandle::shutdown`] (or once every handle is dropped) the
//! task exits and all further calls return [`EditorError::ActorClosed`].

#[cfg(test)]
#[path = "actor_test.rs"]
mod actor_test;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::EditorConfig;
use crate::coords::ViewportRect;
use crate::editor::{Command, Editor, PointerInput, RenderInputs};
use crate::error::EditorError;
use crate::math::Vec2;
use crate::projection::Projection;
use crate::reducer::Action;
use crate::scene::{ImageRef, LayerId, Scene};

type Reply<T> = oneshot::Sender<T>;

enum Request {
    Apply { command: Command, reply: Reply<Result<bool, EditorError>> },
    Pointer { input: PointerInput, reply: Reply<Result<bool, EditorError>> },
    SetViewport { rect: ViewportRect, reply: Reply<bool> },
    SetProjectorHandle { index: usize, point: Vec2, reply: Reply<Result<(), EditorError>> },
    ImageDecoded { data_url: ImageRef, width: f64, height: f64, reply: Reply<Result<LayerId, EditorError>> },
    Scene { reply: Reply<Scene> },
    Projection { reply: Reply<Projection> },
    RenderInputs { reply: Reply<Result<RenderInputs, EditorError>> },
    HistoryDepth { reply: Reply<(usize, usize)> },
    Shutdown,
}

/// Cloneable entry point to a running editor task.
#[derive(Clone)]
pub struct EditorHandle {
    tx: mpsc::Sender<Request>,
    scene_rx: watch::Receiver<Scene>,
}

/// Spawn the editor task. Must be called inside a tokio runtime.
#[must_use]
pub fn spawn_editor(config: &EditorConfig) -> (EditorHandle, JoinHandle<()>) {
    let editor = Editor::new(config);
    let (tx, mut rx) = mpsc::channel::<Request>(config.actor_queue.max(1));
    let (scene_tx, scene_rx) = watch::channel(editor.scene().clone());

    info!(
        queue = config.actor_queue,
        canvas_w = config.canvas_size.x,
        canvas_h = config.canvas_size.y,
        history_limit = ?config.history_limit,
        "editor task configured"
    );

    let mut owner = Owner { editor, scene_tx };
    let task = tokio::spawn(async move {
        while let Some(request) = rx.recv().await {
            if matches!(request, Request::Shutdown) {
                break;
            }
            owner.handle(request);
        }
        info!("editor task stopped");
    });

    (EditorHandle { tx, scene_rx }, task)
}

/// State held by the editor task.
struct Owner {
    editor: Editor,
    scene_tx: watch::Sender<Scene>,
}

impl Owner {
    fn handle(&mut self, request: Request) {
        match request {
            Request::Apply { command, reply } => {
                let out = self.editor.apply(command);
                self.reply(reply, out);
            }
            Request::Pointer { input, reply } => {
                let out = self.editor.pointer(input);
                self.reply(reply, out);
            }
            Request::SetViewport { rect, reply } => {
                let out = self.editor.set_viewport(rect);
                self.reply(reply, out);
            }
            Request::SetProjectorHandle { index, point, reply } => {
                let out = self.editor.set_projector_handle(index, point);
                self.reply(reply, out);
            }
            Request::ImageDecoded { data_url, width, height, reply } => {
                let out = self.editor.on_image_decoded(data_url, width, height);
                self.reply(reply, out);
            }
            Request::Scene { reply } => {
                let out = self.editor.scene().clone();
                self.reply(reply, out);
            }
            Request::Projection { reply } => {
                let out = *self.editor.projection();
                self.reply(reply, out);
            }
            Request::RenderInputs { reply } => {
                let out = self.editor.render_inputs();
                self.reply(reply, out);
            }
            Request::HistoryDepth { reply } => {
                let history = self.editor.history();
                let out = (history.past_len(), history.future_len());
                self.reply(reply, out);
            }
            Request::Shutdown => {}
        }
    }

    /// Publish any pending redraw, then answer. Subscribers see the new
    /// scene no later than the caller does.
    fn reply<T>(&mut self, reply: Reply<T>, value: T) {
        if self.editor.take_redraw() {
            let editor = &self.editor;
            self.scene_tx.send_modify(|scene| scene.clone_from(editor.scene()));
        }
        if reply.send(value).is_err() {
            debug!("requester went away before the reply");
        }
    }
}

impl EditorHandle {
    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Request) -> Result<T, EditorError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(make(reply)).await.map_err(|_| EditorError::ActorClosed)?;
        rx.await.map_err(|_| EditorError::ActorClosed)
    }

    /// # Errors
    ///
    /// `ActorClosed` after shutdown, otherwise as [`Editor::apply`].
    pub async fn apply(&self, command: Command) -> Result<bool, EditorError> {
        self.request(|reply| Request::Apply { command, reply }).await?
    }

    /// # Errors
    ///
    /// As [`apply`](Self::apply).
    pub async fn dispatch(&self, action: Action) -> Result<bool, EditorError> {
        self.apply(Command::Dispatch(action)).await
    }

    /// # Errors
    ///
    /// `ActorClosed` after shutdown.
    pub async fn undo(&self) -> Result<bool, EditorError> {
        self.apply(Command::Undo).await
    }

    /// # Errors
    ///
    /// `ActorClosed` after shutdown.
    pub async fn redo(&self) -> Result<bool, EditorError> {
        self.apply(Command::Redo).await
    }

    /// # Errors
    ///
    /// `ActorClosed` after shutdown.
    pub async fn finish_batch(&self) -> Result<(), EditorError> {
        self.apply(Command::FinishBatch).await.map(|_| ())
    }

    /// # Errors
    ///
    /// `ActorClosed` after shutdown, otherwise as [`Editor::pointer`].
    pub async fn pointer(&self, input: PointerInput) -> Result<bool, EditorError> {
        self.request(|reply| Request::Pointer { input, reply }).await?
    }

    /// # Errors
    ///
    /// `ActorClosed` after shutdown.
    pub async fn set_viewport(&self, rect: ViewportRect) -> Result<bool, EditorError> {
        self.request(|reply| Request::SetViewport { rect, reply }).await
    }

    /// # Errors
    ///
    /// `ActorClosed` after shutdown, otherwise as
    /// [`Editor::set_projector_handle`].
    pub async fn set_projector_handle(&self, index: usize, point: Vec2) -> Result<(), EditorError> {
        self.request(|reply| Request::SetProjectorHandle { index, point, reply }).await?
    }

    /// # Errors
    ///
    /// `ActorClosed` after shutdown, otherwise as [`Editor::on_image_decoded`].
    pub async fn image_decoded(&self, data_url: impl Into<ImageRef>, width: f64, height: f64) -> Result<LayerId, EditorError> {
        let data_url = data_url.into();
        self.request(|reply| Request::ImageDecoded { data_url, width, height, reply }).await?
    }

    /// Current scene, straight from the task.
    ///
    /// # Errors
    ///
    /// `ActorClosed` after shutdown.
    pub async fn scene(&self) -> Result<Scene, EditorError> {
        self.request(|reply| Request::Scene { reply }).await
    }

    /// # Errors
    ///
    /// `ActorClosed` after shutdown.
    pub async fn projection(&self) -> Result<Projection, EditorError> {
        self.request(|reply| Request::Projection { reply }).await
    }

    /// # Errors
    ///
    /// `ActorClosed` after shutdown, otherwise as [`Editor::render_inputs`].
    pub async fn render_inputs(&self) -> Result<RenderInputs, EditorError> {
        self.request(|reply| Request::RenderInputs { reply }).await?
    }

    /// `(past, future)` history lengths.
    ///
    /// # Errors
    ///
    /// `ActorClosed` after shutdown.
    pub async fn history_depth(&self) -> Result<(usize, usize), EditorError> {
        self.request(|reply| Request::HistoryDepth { reply }).await
    }

    /// Receiver for the latest published scene.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Scene> {
        self.scene_rx.clone()
    }

    /// Stop the task after the requests already queued.
    ///
    /// # Errors
    ///
    /// `ActorClosed` if it already stopped.
    pub async fn shutdown(&self) -> Result<(), EditorError> {
        self.tx.send(Request::Shutdown).await.map_err(|_| EditorError::ActorClosed)
    }
}
