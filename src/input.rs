//! Tablet discovery and the evdev-backed stroke source.

use std::sync::mpsc::Receiver;
use std::{thread, time::Duration};

use anyhow::Result;
use evdev::{AbsoluteAxisCode, Device, EventType, KeyCode, SynchronizationCode};
use log::{info, warn};
use thiserror::Error;

use crate::capture::{CaptureOutcome, PenEvent, StrokeSource, StrokeTracker};
use crate::watch::SessionSignal;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("no pen tablet found under /dev/input")]
    NoDevices,
    #[error("unable to open any of the {candidates} detected tablets")]
    OpenFailed { candidates: usize },
}

#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub path: String,
    pub name: String,
}

/// Pen tablets report absolute X/Y plus a pen or touch button. Multitouch
/// slot devices are left alone.
pub fn discover_tablets() -> Vec<DeviceInfo> {
    let mut out = vec![];
    if let Ok(rd) = std::fs::read_dir("/dev/input") {
        for e in rd.flatten() {
            let p = e.path();
            if p.file_name()
                .and_then(|s| s.to_str())
                .map(|s| s.starts_with("event"))
                .unwrap_or(false)
            {
                if let Ok(dev) = Device::open(&p) {
                    if is_tablet(&dev) {
                        out.push(DeviceInfo {
                            path: p.display().to_string(),
                            name: dev.name().unwrap_or("unknown").to_string(),
                        });
                    }
                }
            }
        }
    }
    out
}

fn is_tablet(dev: &Device) -> bool {
    if !dev.supported_events().contains(EventType::ABSOLUTE) {
        return false;
    }
    let axes = dev.supported_absolute_axes();
    let has_xy = axes.as_ref().map_or(false, |a| {
        a.contains(AbsoluteAxisCode::ABS_X) && a.contains(AbsoluteAxisCode::ABS_Y)
    });
    let has_mt = axes.map_or(false, |a| a.contains(AbsoluteAxisCode::ABS_MT_SLOT));
    let keys = dev.supported_keys();
    let has_pen = keys.map_or(false, |k| {
        k.contains(KeyCode::BTN_TOOL_PEN) || k.contains(KeyCode::BTN_TOUCH)
    });
    has_xy && has_pen && !has_mt
}

struct OpenedTablet {
    dev: Device,
    // BTN_TOUCH marks actual contact; BTN_TOOL_PEN alone only marks
    // proximity, so it is the fallback
    contact_code: u16,
}

/// All opened tablets feeding one stroke tracker.
pub struct TabletInput {
    tablets: Vec<OpenedTablet>,
    tracker: StrokeTracker,
}

impl TabletInput {
    pub fn open(page_width: f64, page_height: f64) -> Result<TabletInput, InputError> {
        let found = discover_tablets();
        if found.is_empty() {
            return Err(InputError::NoDevices);
        }

        let candidates = found.len();
        let mut tablets: Vec<OpenedTablet> = vec![];
        for d in found {
            match Device::open(&d.path) {
                Ok(mut dev) => {
                    let _ = dev.set_nonblocking(true);
                    let contact_code = contact_code(&dev);
                    info!("tablet: {} ({})", d.name, d.path);
                    tablets.push(OpenedTablet { dev, contact_code });
                }
                Err(e) => warn!("failed to open {}: {e}", d.path),
            }
        }
        if tablets.is_empty() {
            return Err(InputError::OpenFailed { candidates });
        }

        let mut tracker = StrokeTracker::new(page_width, page_height);
        if let Some((x_min, x_max, y_min, y_max)) =
            tablets.iter().find_map(|t| axis_ranges(&t.dev))
        {
            tracker.set_axis_ranges(x_min, x_max, y_min, y_max);
        }

        Ok(TabletInput { tablets, tracker })
    }
}

fn contact_code(dev: &Device) -> u16 {
    let has_touch = dev
        .supported_keys()
        .map_or(false, |k| k.contains(KeyCode::BTN_TOUCH));
    if has_touch {
        KeyCode::BTN_TOUCH.0
    } else {
        KeyCode::BTN_TOOL_PEN.0
    }
}

fn axis_ranges(dev: &Device) -> Option<(i32, i32, i32, i32)> {
    let mut x = None;
    let mut y = None;
    for (axis, info) in dev.get_absinfo().ok()? {
        if axis == AbsoluteAxisCode::ABS_X {
            x = Some((info.minimum(), info.maximum()));
        } else if axis == AbsoluteAxisCode::ABS_Y {
            y = Some((info.minimum(), info.maximum()));
        }
    }
    let (x_min, x_max) = x?;
    let (y_min, y_max) = y?;
    Some((x_min, x_max, y_min, y_max))
}

impl StrokeSource for TabletInput {
    fn next_stroke(&mut self, signals: &Receiver<SessionSignal>) -> Result<CaptureOutcome> {
        loop {
            if let Ok(sig) = signals.try_recv() {
                return Ok(CaptureOutcome::Interrupted(sig));
            }

            let mut any_event = false;
            for t in self.tablets.iter_mut() {
                if let Ok(events) = t.dev.fetch_events() {
                    for ev in events {
                        any_event = true;

                        let pen = if ev.event_type() == EventType::ABSOLUTE {
                            match ev.code() {
                                c if c == AbsoluteAxisCode::ABS_X.0 => {
                                    Some(PenEvent::AbsX(ev.value()))
                                }
                                c if c == AbsoluteAxisCode::ABS_Y.0 => {
                                    Some(PenEvent::AbsY(ev.value()))
                                }
                                _ => None,
                            }
                        } else if ev.event_type() == EventType::KEY {
                            if ev.code() == t.contact_code {
                                Some(PenEvent::Contact(ev.value() != 0))
                            } else {
                                None
                            }
                        } else if ev.event_type() == EventType::SYNCHRONIZATION
                            && ev.code() == SynchronizationCode::SYN_REPORT.0
                        {
                            Some(PenEvent::Frame)
                        } else {
                            None
                        };

                        if let Some(pen) = pen {
                            if let Some(points) = self.tracker.on_event(pen) {
                                return Ok(CaptureOutcome::Stroke(points));
                            }
                        }
                    }
                }
            }

            if !any_event {
                thread::sleep(Duration::from_millis(4));
            }
        }
    }
}
