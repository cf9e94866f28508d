use anyhow::{Result, anyhow};
use directories::UserDirs;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::{fs, io::Write, path::PathBuf};

use crate::input;
use crate::score;
use crate::session;

#[derive(Debug, Clone, Deserialize)]
pub struct Meta {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    pub lines: u32,
    pub short_lines: bool,
    pub landscape_mode: bool,
    pub margin: f64,
    pub inner_offset: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Scoring {
    pub accuracy_jump: f64,
}

impl Default for Scoring {
    fn default() -> Scoring {
        Scoring {
            accuracy_jump: score::DEFAULT_ACCURACY_JUMP,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Stars {
    pub control: Vec<f64>,
    pub accuracy: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub meta: Meta,
    pub session: SessionSettings,
    #[serde(default)]
    pub scoring: Scoring,
    pub stars: Stars,
}

#[derive(Debug, Clone)]
pub struct ConfigState {
    pub active_name: String,
    pub profile: Profile,
    pub config_dir: PathBuf,
    pub profiles_dir: PathBuf,
    pub active_ptr: PathBuf,
    pub detected_devices: Vec<String>,
}

fn config_dir() -> PathBuf {
    let home = UserDirs::new().unwrap().home_dir().to_path_buf();
    home.join(".config").join("linedrill")
}

fn profiles_dir() -> PathBuf {
    config_dir().join("profiles")
}

fn active_ptr_path() -> PathBuf {
    config_dir().join("active")
}

fn bests_path() -> PathBuf {
    config_dir().join("bests.toml")
}

fn default_profile_text() -> &'static str {
    include_str!("../profiles/default.toml")
}

impl ConfigState {
    pub fn load_or_install_default() -> Result<Self> {
        let cfgdir = config_dir();
        let profdir = profiles_dir();
        fs::create_dir_all(&profdir)?;

        let def_path = profdir.join("default.toml");
        if !def_path.exists() {
            fs::write(&def_path, default_profile_text())?;
            info!("installed default profile at {}", def_path.display());
        }

        let active_ptr = active_ptr_path();
        if !active_ptr.exists() {
            let mut f = fs::File::create(&active_ptr)?;
            f.write_all(b"default")?;
        }

        let active_name = fs::read_to_string(&active_ptr)?.trim().to_string();
        let profile = Self::load_profile(&active_name)?;
        let detected_devices = input::discover_tablets()
            .into_iter()
            .map(|d| format!("{} ({})", d.name, d.path))
            .collect();

        Ok(Self {
            active_name,
            profile,
            config_dir: cfgdir,
            profiles_dir: profdir,
            active_ptr,
            detected_devices,
        })
    }

    /// Reloads the selected profile. On failure the profile last loaded
    /// stays in effect.
    pub fn reload(&mut self) -> Result<()> {
        self.profile = Self::load_profile(&self.active_name)?;
        Ok(())
    }

    /// Switches this process to another profile without touching the
    /// persisted active pointer.
    pub fn select_for_session(&mut self, name: &str) -> Result<()> {
        self.active_name = name.to_string();
        self.reload()
    }

    pub fn set_active(&mut self, name: &str) -> Result<()> {
        let p = self.profiles_dir.join(format!("{name}.toml"));
        if !p.exists() {
            return Err(anyhow!("profile not found: {}", p.display()));
        }
        fs::write(&self.active_ptr, name.as_bytes())?;
        self.active_name = name.to_string();
        self.reload()?;
        Ok(())
    }

    pub fn list_profiles(&self) -> Vec<String> {
        let mut v = Vec::new();
        if let Ok(rd) = fs::read_dir(&self.profiles_dir) {
            for e in rd.flatten() {
                if let Some(ext) = e.path().extension() {
                    if ext == "toml" {
                        if let Some(stem) = e.path().file_stem().and_then(|s| s.to_str()) {
                            v.push(stem.to_string());
                        }
                    }
                }
            }
        }
        v.sort();
        v
    }

    fn load_profile(name: &str) -> Result<Profile> {
        let path = profiles_dir().join(format!("{name}.toml"));
        let txt = fs::read_to_string(&path)
            .map_err(|e| anyhow!("failed to read {}: {e}", path.display()))?;
        let profile: Profile =
            toml::from_str(&txt).map_err(|e| anyhow!("failed to parse {}: {e}", path.display()))?;
        validate_profile(&profile)?;
        Ok(profile)
    }

    pub fn doctor_report(&self) -> serde_json::Value {
        let in_input_group = check_in_input_group();
        serde_json::json!({
            "input_group_member": in_input_group,
            "config_dir": self.config_dir,
            "profiles_dir": self.profiles_dir,
            "active_profile": self.active_name,
            "devices": self.detected_devices,
            "bests_file_present": bests_path().exists(),
            "hints": {
                "add_user_to_input_group": "sudo usermod -aG input $USER && newgrp input"
            }
        })
    }
}

fn validate_profile(p: &Profile) -> Result<()> {
    if !(20..=40).contains(&p.session.lines) {
        return Err(anyhow!("session.lines must be between 20 and 40"));
    }
    if !p.session.margin.is_finite() || p.session.margin <= 0.0 {
        return Err(anyhow!("session.margin must be positive"));
    }
    if !p.session.inner_offset.is_finite() || p.session.inner_offset < 0.0 {
        return Err(anyhow!("session.inner_offset must not be negative"));
    }

    let (page_w, page_h) = session::page_size(p.session.landscape_mode);
    if page_w - 2.0 * p.session.margin < 1.0 {
        return Err(anyhow!("session.margin leaves no drawable width"));
    }
    let usable = page_h - 2.0 * p.session.margin - 2.0 * p.session.inner_offset;
    if (usable / f64::from(p.session.lines - 1)).floor() < 1.0 {
        return Err(anyhow!(
            "ruled layout leaves no vertical room between {} lines",
            p.session.lines
        ));
    }

    if !p.scoring.accuracy_jump.is_finite() || p.scoring.accuracy_jump <= 0.0 {
        return Err(anyhow!("scoring.accuracy_jump must be positive"));
    }

    validate_star_tiers("control", &p.stars.control)?;
    validate_star_tiers("accuracy", &p.stars.accuracy)?;
    Ok(())
}

fn validate_star_tiers(label: &str, tiers: &[f64]) -> Result<()> {
    if tiers.is_empty() {
        return Err(anyhow!("stars.{label} must list at least one threshold"));
    }
    if tiers.iter().any(|t| !t.is_finite() || *t <= 0.0) {
        return Err(anyhow!("stars.{label} thresholds must be positive"));
    }
    for w in tiers.windows(2) {
        if w[1] <= w[0] {
            return Err(anyhow!(
                "stars.{label} thresholds must be strictly ascending"
            ));
        }
    }
    Ok(())
}

/// Cross-session best averages, one per metric. Stored under the config
/// dir so profile edits and bests survive independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalBests {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_control_avg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_accuracy_avg: Option<f64>,
}

impl PersonalBests {
    /// A corrupt or missing bests file reads as "no personal bests yet".
    pub fn load() -> PersonalBests {
        let path = bests_path();
        match fs::read_to_string(&path) {
            Ok(txt) => match toml::from_str(&txt) {
                Ok(bests) => bests,
                Err(e) => {
                    warn!("ignoring corrupt bests file {}: {e}", path.display());
                    PersonalBests::default()
                }
            },
            Err(_) => PersonalBests::default(),
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = bests_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&path, toml::to_string(self)?)?;
        Ok(())
    }

    pub fn reset() -> Result<()> {
        let path = bests_path();
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    /// Merges one session's averages, returning per-metric new-best flags.
    /// A non-finite average never replaces a stored best.
    pub fn absorb(&mut self, control_avg: f64, accuracy_avg: f64) -> (bool, bool) {
        let new_control = beats(control_avg, self.best_control_avg);
        if new_control {
            self.best_control_avg = Some(control_avg);
        }
        let new_accuracy = beats(accuracy_avg, self.best_accuracy_avg);
        if new_accuracy {
            self.best_accuracy_avg = Some(accuracy_avg);
        }
        (new_control, new_accuracy)
    }
}

fn beats(candidate: f64, stored: Option<f64>) -> bool {
    if !candidate.is_finite() {
        return false;
    }
    match stored {
        Some(best) => candidate < best,
        None => true,
    }
}

fn check_in_input_group() -> bool {
    if let Ok(s) = fs::read_to_string("/etc/group") {
        let user = whoami::username();
        for line in s.lines() {
            if line.starts_with("input:") || line.starts_with("input:x:") {
                if line
                    .split(':')
                    .nth(3)
                    .unwrap_or("")
                    .split(',')
                    .any(|u| u == user)
                {
                    return true;
                }
            }
        }
    }
    false
}
