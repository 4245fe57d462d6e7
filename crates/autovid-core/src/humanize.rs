//! Humanized gestures for screen-recorded walkthroughs.
//!
//! [`Humanizer`] wraps an [`AutomationDriver`] and turns each intent (tap,
//! type, drag, slider, long press, rotation, scroll) into a short sequence
//! of driver primitives separated by [`Pacing`] delays, so the recording
//! reads like a person using the app.
//!
//! Nothing here fails. A missing element or a driver error is logged with
//! `warn!` and the step is skipped; the next call starts from a fresh
//! hierarchy snapshot.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use autovid_core::agent_driver::AgentDriver;
//! use autovid_core::driver::AutomationDriver;
//! use autovid_core::humanize::Humanizer;
//! use autovid_core::locator::Locator;
//! use autovid_core::pacing::Pacing;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut driver = AgentDriver::new("localhost", 8080);
//! driver.connect().await?;
//!
//! let humanizer = Humanizer::new(Arc::new(driver), Pacing::default());
//! humanizer.tap(&Locator::Id("sign-in".into())).await;
//! humanizer.scroll_up(&Locator::App, None).await;
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info_span, warn, Instrument};
use unicode_segmentation::UnicodeSegmentation;

use crate::device::{DeviceContext, Orientation};
use crate::driver::{AutomationDriver, DriverError, PressDrag};
use crate::element::UIElement;
use crate::gesture::{Direction, GestureVelocity, Point};
use crate::locator::Locator;
use crate::pacing::{hold, ms, secs, Pacing};
use crate::resolver::resolve;

/// Paces driver primitives into human-looking gestures.
#[derive(Clone)]
pub struct Humanizer {
    driver: Arc<dyn AutomationDriver>,
    pacing: Pacing,
}

/// Selector triple the agent's element commands take.
struct Selector {
    value: String,
    by_label: bool,
    element_type: Option<String>,
}

impl Selector {
    /// Concrete selector for `element`, found through `locator`.
    ///
    /// Glob selectors are replaced by the matched element's actual
    /// identifier or label so the agent acts on the same element.
    fn for_element(locator: &Locator, element: &UIElement) -> Option<Self> {
        let concrete = |field: &Option<String>, pattern: &str| field.clone().unwrap_or_else(|| pattern.to_string());
        match locator {
            Locator::App => None,
            Locator::Id(id) => Some(Self {
                value: concrete(&element.identifier, id),
                by_label: false,
                element_type: None,
            }),
            Locator::Label(label) => Some(Self {
                value: concrete(&element.label, label),
                by_label: true,
                element_type: None,
            }),
            Locator::Typed { selector, by_label, element_type } => Some(Self {
                value: if *by_label {
                    concrete(&element.label, selector)
                } else {
                    concrete(&element.identifier, selector)
                },
                by_label: *by_label,
                element_type: Some(element_type.clone()),
            }),
        }
    }
}

impl Humanizer {
    /// A humanizer issuing primitives to `driver`, paced by `pacing`.
    pub fn new(driver: Arc<dyn AutomationDriver>, pacing: Pacing) -> Self {
        Self { driver, pacing }
    }

    /// The underlying driver.
    pub fn driver(&self) -> &Arc<dyn AutomationDriver> {
        &self.driver
    }

    /// The delays every humanized action uses.
    pub fn pacing(&self) -> &Pacing {
        &self.pacing
    }

    /// Retries `attempt` every poll interval until it yields a value or the
    /// existence timeout passes. Always tries at least once.
    async fn poll<T, F, Fut>(&self, mut attempt: F) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, DriverError>>,
    {
        let deadline = Instant::now() + ms(self.pacing.existence_timeout_ms);
        let interval = ms(self.pacing.poll_interval_ms.max(1));
        loop {
            match attempt().await {
                Ok(Some(found)) => return Some(found),
                Ok(None) => {}
                Err(e) => debug!(error = %e, "snapshot failed while waiting"),
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            tokio::time::sleep_until((now + interval).min(deadline)).await;
        }
    }

    /// Polls fresh snapshots until `probe` matches.
    async fn wait_for<T>(&self, probe: impl Fn(&[UIElement]) -> Option<T>) -> Option<T> {
        let probe = &probe;
        let driver = &self.driver;
        self.poll(move || async move {
            let tree = driver.dump_tree().await?;
            Ok::<_, DriverError>(probe(&tree))
        })
        .await
    }

    /// Waits up to the existence timeout for `locator` to match.
    pub async fn wait_for_existence(&self, locator: &Locator) -> Option<UIElement> {
        self.poll(move || self.driver.find_element(locator)).await
    }

    /// Tap an element the way a presenter would: find it, bring it on
    /// screen if needed, pause, tap, and let the UI react.
    pub async fn tap(&self, locator: &Locator) {
        let span = info_span!("cinematic_tap", locator = %locator);
        self.humanized_tap(locator).instrument(span).await;
    }

    /// Returns whether the tap was delivered.
    async fn humanized_tap(&self, locator: &Locator) -> bool {
        let Some(element) = self.wait_for_existence(locator).await else {
            warn!(%locator, "Element to tap not found, skipping step.");
            return false;
        };

        if !element.is_hittable() {
            debug!(%locator, "element not hittable, scrolling before tap");
            self.scroll_up(&Locator::App, Some(ms(self.pacing.corrective_scroll_ms)))
                .await;
        }

        hold(self.pacing.pre_tap_ms).await;

        let result = match Selector::for_element(locator, &element) {
            Some(Selector { value, by_label: false, element_type: None }) => {
                self.driver.tap_element(&value).await
            }
            Some(Selector { value, by_label: true, element_type: None }) => {
                self.driver.tap_by_label(&value).await
            }
            Some(Selector { value, by_label, element_type: Some(element_type) }) => {
                self.driver.tap_with_type(&value, by_label, &element_type).await
            }
            None => match element.center() {
                Some(center) => self.driver.tap_location(center).await,
                None => {
                    warn!(%locator, "Element has no frame, skipping tap.");
                    return false;
                }
            },
        };

        if let Err(e) = result {
            warn!(%locator, error = %e, "Tap failed, skipping step.");
            return false;
        }

        hold(self.pacing.post_tap_ms).await;
        true
    }

    /// Tap `locator`, then type `text` one user-visible character (grapheme
    /// cluster) at a time with `speed` between characters (default 0.12 s).
    pub async fn type_text(&self, locator: &Locator, text: &str, speed: Option<Duration>) {
        let speed = speed.unwrap_or(ms(self.pacing.type_interval_ms));
        let span = info_span!(
            "cinematic_typing",
            locator = %locator,
            graphemes = text.graphemes(true).count(),
            speed_ms = speed.as_millis() as u64
        );
        async {
            if !self.humanized_tap(locator).await {
                warn!(%locator, "Text field unavailable, skipping typing.");
                return;
            }

            for grapheme in text.graphemes(true) {
                if let Err(e) = self.driver.type_text(grapheme).await {
                    warn!(%locator, error = %e, "Typing failed, skipping rest of text.");
                    return;
                }
                if !speed.is_zero() {
                    tokio::time::sleep(speed).await;
                }
            }

            hold(self.pacing.post_type_ms).await;
        }
        .instrument(span)
        .await
    }

    /// Drag from the centre of `source` to the centre of `destination`.
    ///
    /// `duration` (default 1.0 s) is advisory; `velocity` sets the speed of
    /// the movement.
    pub async fn drag(
        &self,
        source: &Locator,
        destination: &Locator,
        duration: Option<Duration>,
        velocity: GestureVelocity,
    ) {
        let duration = duration.unwrap_or(ms(self.pacing.drag_ms));
        let span = info_span!(
            "cinematic_drag",
            source = %source,
            destination = %destination,
            duration_ms = duration.as_millis() as u64,
            ?velocity
        );
        async {
            let endpoints = self
                .wait_for(|tree| {
                    let from = source.locate(tree)?.center()?;
                    let to = destination.locate(tree)?.center()?;
                    Some((from, to))
                })
                .await;
            let Some((from, to)) = endpoints else {
                warn!(%source, %destination, "Drag endpoints not found, skipping step.");
                return;
            };

            let gesture = PressDrag {
                from,
                to,
                press_secs: secs(self.pacing.drag_press_ms),
                velocity,
                hold_secs: secs(self.pacing.drag_hold_ms),
            };
            if let Err(e) = self.driver.press_drag(gesture).await {
                warn!(error = %e, "Drag failed, skipping step.");
                return;
            }

            hold(self.pacing.post_drag_ms).await;
        }
        .instrument(span)
        .await
    }

    /// Move a slider to `value` in `[0.0, 1.0]`, then hold for `duration`
    /// (default 1.0 s) so the change is visible.
    pub async fn adjust_slider(&self, locator: &Locator, value: f64, duration: Option<Duration>) {
        let duration = duration.unwrap_or(ms(self.pacing.slider_ms));
        let span = info_span!(
            "slider_adjust",
            locator = %locator,
            value,
            duration_ms = duration.as_millis() as u64
        );
        async {
            if *locator == Locator::App {
                warn!("The app root is not a slider, skipping step.");
                return;
            }

            let value = if value.is_nan() {
                warn!(value, "Slider value is not a number, using 0.0.");
                0.0
            } else if !(0.0..=1.0).contains(&value) {
                let clamped = value.clamp(0.0, 1.0);
                warn!(value, clamped, "Slider value out of range, clamping.");
                clamped
            } else {
                value
            };

            let Some(element) = self.wait_for_existence(locator).await else {
                warn!(%locator, "Slider not found, skipping step.");
                return;
            };
            let Some(selector) = Selector::for_element(locator, &element) else {
                return;
            };

            let result = self
                .driver
                .adjust_slider(&selector.value, selector.by_label, selector.element_type.as_deref(), value)
                .await;
            if let Err(e) = result {
                warn!(%locator, error = %e, "Slider adjustment failed, skipping step.");
                return;
            }

            if !duration.is_zero() {
                tokio::time::sleep(duration).await;
            }
        }
        .instrument(span)
        .await
    }

    /// Press and hold the centre of `locator` for `duration` (default 1.0 s).
    pub async fn long_press(&self, locator: &Locator, duration: Option<Duration>) {
        let duration = duration.unwrap_or(ms(self.pacing.long_press_ms));
        let span = info_span!("long_press", locator = %locator, duration_ms = duration.as_millis() as u64);
        async {
            let Some(center) = self.wait_for(|tree| locator.locate(tree)?.center()).await else {
                warn!(%locator, "Element to long-press not found, skipping step.");
                return;
            };

            if let Err(e) = self.driver.long_press(center, duration.as_secs_f64()).await {
                warn!(%locator, error = %e, "Long press failed, skipping step.");
                return;
            }

            hold(self.pacing.post_long_press_ms).await;
        }
        .instrument(span)
        .await
    }

    /// Rotate the device and let the layout settle.
    ///
    /// `device` records the new orientation only if the backend accepted it.
    pub async fn set_orientation(&self, device: &mut DeviceContext, orientation: Orientation) {
        let span = info_span!(
            "orientation_change",
            from = %device.orientation(),
            to = %orientation
        );
        async {
            if let Err(e) = self.driver.set_orientation(orientation).await {
                warn!(error = %e, "Rotation failed, skipping step.");
                return;
            }
            device.record_orientation(orientation);
            hold(self.pacing.orientation_settle_ms).await;
        }
        .instrument(span)
        .await
    }

    /// Slow directional swipe over the scrollable area inside `root`.
    ///
    /// The target is the first table, collection view or scroll view found
    /// under `root` (or `root` itself). `duration` (default 2.0 s) is
    /// advisory; the swipe always uses the slow velocity profile.
    pub async fn scroll(&self, root: &Locator, direction: Direction, duration: Option<Duration>) {
        let duration = duration.unwrap_or(ms(self.pacing.scroll_ms));
        let span = info_span!(
            "smooth_scroll",
            root = %root,
            direction = %direction,
            duration_ms = duration.as_millis() as u64
        );
        self.smooth_scroll(root, direction).instrument(span).await
    }

    async fn smooth_scroll(&self, root: &Locator, direction: Direction) {
        let tree = match self.driver.dump_tree().await {
            Ok(tree) => tree,
            Err(e) => {
                warn!(error = %e, "No scrollable area (Table/Collection/Scroll) found.");
                return;
            }
        };
        let Some(root_element) = root.locate(&tree) else {
            warn!(%root, "No scrollable area (Table/Collection/Scroll) found.");
            return;
        };

        let target = resolve(root_element);
        let Some(frame) = target.frame else {
            warn!(target_type = ?target.element_type, "Scroll target has no frame, skipping step.");
            return;
        };

        let path = direction.path();
        let from: Point = frame.point_at(path.start);
        let to: Point = frame.point_at(path.end);
        debug!(target_type = ?target.element_type, ?from, ?to, "scrolling");

        let gesture = PressDrag {
            from,
            to,
            press_secs: secs(self.pacing.scroll_press_ms),
            velocity: GestureVelocity::Slow,
            hold_secs: secs(self.pacing.scroll_hold_ms),
        };
        if let Err(e) = self.driver.press_drag(gesture).await {
            warn!(error = %e, "Scroll failed, skipping step.");
            return;
        }

        hold(self.pacing.scroll_settle_ms).await;
    }

    /// [`scroll`](Self::scroll) up.
    pub async fn scroll_up(&self, root: &Locator, duration: Option<Duration>) {
        self.scroll(root, Direction::Up, duration).await
    }

    /// [`scroll`](Self::scroll) down.
    pub async fn scroll_down(&self, root: &Locator, duration: Option<Duration>) {
        self.scroll(root, Direction::Down, duration).await
    }

    /// [`scroll`](Self::scroll) left.
    pub async fn scroll_left(&self, root: &Locator, duration: Option<Duration>) {
        self.scroll(root, Direction::Left, duration).await
    }

    /// [`scroll`](Self::scroll) right.
    pub async fn scroll_right(&self, root: &Locator, duration: Option<Duration>) {
        self.scroll(root, Direction::Right, duration).await
    }
}
