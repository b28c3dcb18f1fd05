//! Export pipeline: session → captured faces → artifact → saved file.

use crate::assembler::{Artifact, CapturedFace, DocumentAssembler};
use crate::config::ExportConfig;
use crate::rendering::{Background, Bitmap, Face, FaceLayout, Rasterizer, RenderOptions, SoftwareRasterizer};
use crate::save::SaveTarget;
use crate::session::CardSession;
use crate::{Error, Result};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Cooperative cancellation for a running export.
///
/// Cloning shares the token; cancelling any clone cancels all of them. The
/// pipeline checks it between steps and while waiting out the settle delay.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Debug, Default)]
struct CancelInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once the token is cancelled
    pub async fn cancelled(&self) {
        loop {
            // Register before checking the flag so a concurrent cancel is not missed.
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Orchestrates capture, assembly and saving of a card.
pub struct ExportPipeline {
    config: ExportConfig,
    rasterizer: Arc<dyn Rasterizer>,
    assembler: DocumentAssembler,
    cancel: Option<CancelToken>,
}

impl ExportPipeline {
    /// Pipeline with the software rasterizer and the PDF/ZIP builders.
    pub fn new(config: ExportConfig) -> Result<Self> {
        config.validate()?;
        let assembler = DocumentAssembler::default().with_label(config.archive_label.clone());
        Ok(Self {
            config,
            rasterizer: Arc::new(SoftwareRasterizer::new()),
            assembler,
            cancel: None,
        })
    }

    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn Rasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    pub fn with_assembler(mut self, assembler: DocumentAssembler) -> Self {
        self.assembler = assembler.with_label(self.config.archive_label.clone());
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Capture both faces and assemble them as the configured mode says.
    ///
    /// Faces are captured front first. A face that has nothing to show is
    /// passed on as missing and skipped by the assembler; a face that fails
    /// to render aborts the export.
    pub async fn export(&self, session: &mut CardSession) -> Result<Artifact> {
        let mode = self.config.mode;
        info!("exporting card for '{}' as {}", session.preview_text(), mode);
        let mut captured = Vec::with_capacity(Face::ALL.len());
        for face in Face::ALL {
            self.check_cancelled()?;
            let bitmap = self.capture(session, face).await?;
            captured.push(CapturedFace { face, bitmap });
        }
        self.check_cancelled()?;
        self.assembler.assemble(&captured, mode)
    }

    /// [`ExportPipeline::export`] followed by handing the artifact to `target`.
    pub async fn export_and_save(
        &self,
        session: &mut CardSession,
        target: &dyn SaveTarget,
    ) -> Result<PathBuf> {
        let artifact = self.export(session).await?;
        let path = target.save(&artifact)?;
        info!("saved {} ({} bytes) to {}", artifact.file_name, artifact.bytes.len(), path.display());
        Ok(path)
    }

    /// Reveal `face` if needed, let it settle, rasterize it. The reveal is
    /// undone when the guard drops, whatever the outcome.
    async fn capture(&self, session: &mut CardSession, face: Face) -> Result<Option<Bitmap>> {
        let CardSession { record, preview } = session;
        let guard = preview.reveal(face);
        let layout = CardSession::layout(
            record,
            &guard,
            face,
            self.config.template,
            self.config.logo_path.as_ref(),
            self.config.qr_size_px,
        );
        let Some(layout) = layout else {
            debug!("{} face has nothing to render", face);
            return Ok(None);
        };
        if guard.was_revealed() {
            self.settle().await?;
        }
        let bitmap = self.rasterize(layout, self.render_options(face)).await?;
        drop(guard);
        Ok(Some(bitmap))
    }

    fn render_options(&self, face: Face) -> RenderOptions {
        match face {
            Face::Front => RenderOptions {
                scale: self.config.front_scale,
                background: Background::Transparent,
            },
            Face::Back => RenderOptions {
                scale: self.config.back_scale,
                background: Background::White,
            },
        }
    }

    async fn rasterize(&self, layout: FaceLayout, options: RenderOptions) -> Result<Bitmap> {
        let attempts = if self.config.retry_render { 2 } else { 1 };
        let mut attempt = 1;
        loop {
            let rasterizer = Arc::clone(&self.rasterizer);
            let job_layout = layout.clone();
            let result = tokio::task::spawn_blocking(move || rasterizer.render(&job_layout, &options))
                .await
                .map_err(|e| Error::Render(format!("rasterizer task failed: {}", e)))?;
            match result {
                Err(err) if err.is_transient() && attempt < attempts => {
                    warn!("capturing {} face failed ({}), retrying once", layout.face, err);
                    attempt += 1;
                    self.check_cancelled()?;
                }
                other => return other,
            }
        }
    }

    async fn settle(&self) -> Result<()> {
        let delay = self.config.settle_delay();
        if delay.is_zero() {
            return self.check_cancelled();
        }
        debug!("waiting {:?} for the revealed face to settle", delay);
        match &self.cancel {
            Some(token) => tokio::select! {
                _ = tokio::time::sleep(delay) => Ok(()),
                _ = token.cancelled() => Err(Error::Cancelled),
            },
            None => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
        }
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancel_token_wakes_waiters() {
        let token = CancelToken::new();
        let waiter = {
            let token = token.clone();
            tokio::spawn(async move { token.cancelled().await })
        };
        tokio::task::yield_now().await;
        token.cancel();
        waiter.await.unwrap();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn already_cancelled_token_resolves_immediately() {
        let token = CancelToken::new();
        token.cancel();
        token.cancelled().await;
    }

    #[test]
    fn new_rejects_invalid_config() {
        let cfg = ExportConfig {
            qr_size_px: 0,
            ..Default::default()
        };
        assert!(ExportPipeline::new(cfg).is_err());
    }

    #[test]
    fn front_is_captured_sharper_than_back() {
        let p = ExportPipeline::new(ExportConfig::default()).unwrap();
        let front = p.render_options(Face::Front);
        let back = p.render_options(Face::Back);
        assert!(front.scale > back.scale);
        assert_eq!(front.background, Background::Transparent);
        assert_eq!(back.background, Background::White);
    }
}
