//! Production scripts: walkthroughs described as data.
//!
//! A [`Production`] is a JSON document naming the app under test and a list
//! of scenes, each a list of [`Step`]s tagged by `"action"`. [`play`] runs
//! it through a [`Director`], one scene at a time.
//!
//! Loading is strict: unknown actions, malformed locators and negative
//! durations are rejected up front. Playback never fails; a step that
//! cannot be performed is logged and skipped like any humanized action.
//!
//! # Example
//!
//! ```
//! use autovid_core::script::Production;
//!
//! let production = Production::from_json(r#"{
//!     "app": "com.example.notes",
//!     "scenes": [{
//!         "name": "Browse notes",
//!         "steps": [
//!             { "action": "scroll", "direction": "up" },
//!             { "action": "tap", "target": { "label": "Groceries" } },
//!             { "action": "pause", "seconds": 1.5 }
//!         ]
//!     }]
//! }"#).unwrap();
//!
//! assert_eq!(production.step_count(), 3);
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::device::{DeviceContext, Orientation};
use crate::director::Director;
use crate::gesture::{Direction, GestureVelocity};
use crate::locator::Locator;

/// Errors from loading a production script.
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid script: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("scene {scene}: {message}")]
    Invalid { scene: usize, message: String },

    #[error("production has no scenes")]
    NoScenes,
}

/// A scripted walkthrough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Production {
    /// Bundle identifier to launch before the first scene.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
    pub scenes: Vec<SceneScript>,
}

/// A named group of steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneScript {
    pub name: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

fn app_root() -> Locator {
    Locator::App
}

/// One humanized action. Times are in seconds; omitted times use the
/// configured pacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Tap {
        target: Locator,
    },
    Type {
        target: Locator,
        text: String,
        #[serde(default)]
        speed: Option<f64>,
    },
    Drag {
        from: Locator,
        to: Locator,
        #[serde(default)]
        duration: Option<f64>,
        #[serde(default)]
        velocity: GestureVelocity,
    },
    Slider {
        target: Locator,
        value: f64,
        #[serde(default)]
        duration: Option<f64>,
    },
    LongPress {
        target: Locator,
        #[serde(default)]
        duration: Option<f64>,
    },
    Orientation {
        orientation: Orientation,
    },
    Scroll {
        direction: Direction,
        #[serde(default = "app_root")]
        target: Locator,
        #[serde(default)]
        duration: Option<f64>,
    },
    Pause {
        #[serde(default)]
        seconds: Option<f64>,
    },
    Announce {
        text: String,
    },
}

impl Step {
    /// Short name for tracing metadata.
    pub fn name(&self) -> &'static str {
        match self {
            Step::Tap { .. } => "tap",
            Step::Type { .. } => "type",
            Step::Drag { .. } => "drag",
            Step::Slider { .. } => "slider",
            Step::LongPress { .. } => "long_press",
            Step::Orientation { .. } => "orientation",
            Step::Scroll { .. } => "scroll",
            Step::Pause { .. } => "pause",
            Step::Announce { .. } => "announce",
        }
    }

    /// The step's timing override, if any.
    fn time(&self) -> Option<f64> {
        match self {
            Step::Type { speed, .. } => *speed,
            Step::Drag { duration, .. }
            | Step::Slider { duration, .. }
            | Step::LongPress { duration, .. }
            | Step::Scroll { duration, .. } => *duration,
            Step::Pause { seconds } => *seconds,
            Step::Tap { .. } | Step::Orientation { .. } | Step::Announce { .. } => None,
        }
    }

    fn validate(&self) -> Result<(), String> {
        if let Some(time) = self.time() {
            if !time.is_finite() || time < 0.0 {
                return Err(format!("{} step has invalid time {time}", self.name()));
            }
        }
        if let Step::Drag { velocity: GestureVelocity::PointsPerSecond(v), .. } = self {
            if !v.is_finite() || *v <= 0.0 {
                return Err(format!("drag velocity must be positive, got {v}"));
            }
        }
        Ok(())
    }
}

impl Production {
    /// Parse and validate a script.
    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        let production: Production = serde_json::from_str(json)?;
        production.validate()?;
        Ok(production)
    }

    /// Read, parse and validate a script file.
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let json = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<(), ScriptError> {
        if self.scenes.is_empty() {
            return Err(ScriptError::NoScenes);
        }
        for (index, scene) in self.scenes.iter().enumerate() {
            let scene_no = index + 1;
            if scene.name.trim().is_empty() {
                return Err(ScriptError::Invalid { scene: scene_no, message: "scene name is empty".into() });
            }
            for step in &scene.steps {
                step.validate().map_err(|message| ScriptError::Invalid { scene: scene_no, message })?;
            }
        }
        Ok(())
    }

    pub fn step_count(&self) -> usize {
        self.scenes.iter().map(|s| s.steps.len()).sum()
    }
}

fn seconds(value: Option<f64>) -> Option<Duration> {
    value.and_then(|s| Duration::try_from_secs_f64(s).ok())
}

/// Run one step.
pub async fn perform(step: &Step, director: &Director, device: &mut DeviceContext) {
    debug!(step = step.name(), "performing step");
    let humanizer = director.humanizer();
    match step {
        Step::Tap { target } => humanizer.tap(target).await,
        Step::Type { target, text, speed } => humanizer.type_text(target, text, seconds(*speed)).await,
        Step::Drag { from, to, duration, velocity } => {
            humanizer.drag(from, to, seconds(*duration), *velocity).await
        }
        Step::Slider { target, value, duration } => {
            humanizer.adjust_slider(target, *value, seconds(*duration)).await
        }
        Step::LongPress { target, duration } => humanizer.long_press(target, seconds(*duration)).await,
        Step::Orientation { orientation } => humanizer.set_orientation(device, *orientation).await,
        Step::Scroll { direction, target, duration } => {
            humanizer.scroll(target, *direction, seconds(*duration)).await
        }
        Step::Pause { seconds: pause } => director.pause(seconds(*pause)).await,
        Step::Announce { text } => director.announce(text).await,
    }
}

/// Play a production: launch (when an app is named), run every scene, wrap.
pub async fn play(production: &Production, director: &Director, device: &mut DeviceContext) {
    if let Some(app) = &production.app {
        director.launch_and_record(app).await;
    }
    for scene in &production.scenes {
        director
            .scene(&scene.name, async {
                for step in &scene.steps {
                    perform(step, director, device).await;
                }
            })
            .await;
    }
    director.finish_recording().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_action() {
        let production = Production::from_json(
            r#"{
                "scenes": [{
                    "name": "All",
                    "steps": [
                        {"action": "tap", "target": {"id": "login"}},
                        {"action": "type", "target": {"label": "Email"}, "text": "hi", "speed": 0.05},
                        {"action": "drag", "from": {"id": "a"}, "to": {"id": "b"}, "velocity": "fast"},
                        {"action": "slider", "target": {"id": "volume"}, "value": 0.7},
                        {"action": "long_press", "target": {"typed": {"selector": "row-*", "element_type": "Cell"}}},
                        {"action": "orientation", "orientation": "landscape_left"},
                        {"action": "scroll", "direction": "down"},
                        {"action": "pause"},
                        {"action": "announce", "text": "Done"}
                    ]
                }]
            }"#,
        )
        .unwrap();

        let steps = &production.scenes[0].steps;
        assert_eq!(steps.len(), 9);
        assert_eq!(production.app, None);
        assert!(matches!(
            &steps[2],
            Step::Drag { velocity: GestureVelocity::Fast, duration: None, .. }
        ));
        assert_eq!(
            steps[4],
            Step::LongPress {
                target: Locator::Typed {
                    selector: "row-*".into(),
                    by_label: false,
                    element_type: "Cell".into(),
                },
                duration: None,
            }
        );
        assert_eq!(
            steps[6],
            Step::Scroll { direction: Direction::Down, target: Locator::App, duration: None }
        );
    }

    #[test]
    fn unknown_action_is_rejected() {
        let err = Production::from_json(
            r#"{"scenes": [{"name": "x", "steps": [{"action": "pinch"}]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ScriptError::Parse(_)));
    }

    #[test]
    fn negative_time_is_rejected() {
        let err = Production::from_json(
            r#"{"scenes": [
                {"name": "ok", "steps": []},
                {"name": "bad", "steps": [{"action": "pause", "seconds": -1.0}]}
            ]}"#,
        )
        .unwrap_err();
        match err {
            ScriptError::Invalid { scene, message } => {
                assert_eq!(scene, 2);
                assert!(message.contains("pause"));
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn empty_production_is_rejected() {
        assert!(matches!(
            Production::from_json(r#"{"scenes": []}"#),
            Err(ScriptError::NoScenes)
        ));
        assert!(matches!(
            Production::from_json(r#"{"scenes": [{"name": "  "}]}"#),
            Err(ScriptError::Invalid { scene: 1, .. })
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Production::load(Path::new("/nonexistent/production.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/production.json"));
    }

    #[test]
    fn seconds_conversion() {
        assert_eq!(seconds(Some(1.5)), Some(Duration::from_millis(1500)));
        assert_eq!(seconds(None), None);
    }
}
