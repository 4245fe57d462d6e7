//! Narration around a recording.
//!
//! The [`Director`] brackets a walkthrough: it launches the app and rolls,
//! groups actions into named scenes, inserts reading pauses and
//! announcements, and wraps. Each of these drops a [`SceneMarker`] on a
//! timeline so the raw screen recording can be cut afterwards; the timeline
//! is written as JSON Lines when the recording finishes.
//!
//! # Example
//!
//! ```no_run
//! use autovid_core::director::Director;
//! use autovid_core::humanize::Humanizer;
//! use autovid_core::locator::Locator;
//!
//! # async fn example(humanizer: Humanizer) {
//! let director = Director::new(humanizer).with_timeline("walkthrough.jsonl");
//! director.launch_and_record("com.example.notes").await;
//! director
//!     .scene("Create a note", async {
//!         director.humanizer().tap(&Locator::Id("new-note".into())).await;
//!     })
//!     .await;
//! director.finish_recording().await;
//! # }
//! ```

use std::future::Future;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::humanize::Humanizer;
use crate::pacing::{hold, ms};

/// What happened at a point on the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarkerKind {
    /// The app was launched and recording began.
    OnAir,
    /// A named scene started.
    Scene { name: String },
    /// A caption-worthy announcement.
    Announce { text: String },
    /// Recording finished.
    Wrap,
}

/// One timeline entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneMarker {
    pub id: Uuid,
    #[serde(flatten)]
    pub kind: MarkerKind,
    /// Wall-clock time the marker was recorded.
    pub at: DateTime<Utc>,
    /// Milliseconds since the first marker of the recording.
    pub offset_ms: u64,
}

#[derive(Default)]
struct Timeline {
    started: Option<Instant>,
    markers: Vec<SceneMarker>,
}

/// Narration helpers bracketing a screen recording.
pub struct Director {
    humanizer: Humanizer,
    timeline: Mutex<Timeline>,
    timeline_path: Option<PathBuf>,
}

impl Director {
    pub fn new(humanizer: Humanizer) -> Self {
        Self {
            humanizer,
            timeline: Mutex::new(Timeline::default()),
            timeline_path: None,
        }
    }

    /// Write the timeline to `path` when the recording finishes.
    pub fn with_timeline(mut self, path: impl Into<PathBuf>) -> Self {
        self.timeline_path = Some(path.into());
        self
    }

    pub fn humanizer(&self) -> &Humanizer {
        &self.humanizer
    }

    /// Snapshot of the markers recorded so far.
    pub fn markers(&self) -> Vec<SceneMarker> {
        self.timeline
            .lock()
            .map(|t| t.markers.clone())
            .unwrap_or_default()
    }

    fn mark(&self, kind: MarkerKind) {
        let Ok(mut timeline) = self.timeline.lock() else {
            return;
        };
        let now = Instant::now();
        let started = *timeline.started.get_or_insert(now);
        let marker = SceneMarker {
            id: Uuid::new_v4(),
            kind,
            at: Utc::now(),
            offset_ms: now.duration_since(started).as_millis() as u64,
        };
        timeline.markers.push(marker);
    }

    /// Launch the app and start rolling.
    ///
    /// The timeline restarts here, so offsets are measured from launch.
    pub async fn launch_and_record(&self, bundle_id: &str) {
        if let Err(e) = self.humanizer.driver().launch_app(bundle_id).await {
            warn!(bundle_id, error = %e, "App launch failed, recording anyway.");
        }
        info!(bundle_id, "On Air");
        if let Ok(mut timeline) = self.timeline.lock() {
            timeline.started = Some(Instant::now());
        }
        self.mark(MarkerKind::OnAir);
        hold(self.humanizer.pacing().launch_settle_ms).await;
    }

    /// Run `action` as a named scene, then let the viewer take it in.
    pub async fn scene<F>(&self, name: &str, action: F)
    where
        F: Future<Output = ()>,
    {
        let span = info_span!("scene", name = %name);
        async {
            info!("Scene: {name}");
            self.mark(MarkerKind::Scene { name: name.to_string() });
            action.await;
            hold(self.humanizer.pacing().scene_settle_ms).await;
        }
        .instrument(span)
        .await
    }

    /// Give the viewer time to read; defaults to 2.0 s.
    pub async fn pause(&self, duration: Option<Duration>) {
        let duration = duration.unwrap_or(ms(self.humanizer.pacing().read_pause_ms));
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }

    /// Log an announcement for captions and pause briefly.
    pub async fn announce(&self, text: &str) {
        let span = info_span!("announce");
        async {
            info!("{text}");
            self.mark(MarkerKind::Announce { text: text.to_string() });
            hold(self.humanizer.pacing().announce_settle_ms).await;
        }
        .instrument(span)
        .await
    }

    /// Hold the final frame, close the timeline and write it out.
    pub async fn finish_recording(&self) {
        hold(self.humanizer.pacing().wrap_settle_ms).await;
        self.mark(MarkerKind::Wrap);
        info!("Recording complete. Ready for editing!");

        if let Some(path) = &self.timeline_path {
            match self.write_timeline(path) {
                Ok(()) => info!(path = %path.display(), "timeline written"),
                Err(e) => warn!(path = %path.display(), error = %e, "Could not write timeline."),
            }
        }
    }

    /// Write every marker to `path` as JSON Lines, replacing the file.
    pub fn write_timeline(&self, path: &Path) -> std::io::Result<()> {
        let markers = self.markers();
        let mut writer = BufWriter::new(std::fs::File::create(path)?);
        for marker in &markers {
            let line = serde_json::to_string(marker).map_err(std::io::Error::other)?;
            writeln!(writer, "{line}")?;
        }
        writer.flush()
    }
}
