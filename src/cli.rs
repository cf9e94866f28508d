use anyhow::{Result, anyhow};
use log::{error, info};
use pico_args::Arguments;
use std::env;
use std::path::PathBuf;

use crate::clock::{SessionClock, format_clock};
use crate::config::{ConfigState, PersonalBests, Profile};
use crate::input::{InputError, TabletInput};
use crate::session::{self, DrillOutcome, SessionPlan, SessionReport};
use crate::sheet;
use crate::watch;

pub fn run() -> Result<()> {
    let mut pargs = Arguments::from_env();

    // No args -> general help
    if env::args().len() == 1 {
        print_help();
        return Ok(());
    }

    // Flags-based help (-h/--help)
    if pargs.contains("-h") || pargs.contains("--help") {
        print_help();
        return Ok(());
    }

    // Options are pulled before the subcommand so they may appear anywhere
    let random = pargs.contains("--random");
    let sheet_path: Option<PathBuf> = pargs.opt_value_from_str("--sheet")?;
    let profile_override: Option<String> = pargs.opt_value_from_str("--profile")?;

    // First free arg is the subcommand
    let subcmd: Option<String> = pargs.free_from_str().ok();

    match subcmd.as_deref() {
        Some("help") => {
            let topic: Option<String> = pargs.free_from_str().ok();
            if let Some(t) = topic {
                print_subcmd_help(&t);
            } else {
                print_help();
            }
            Ok(())
        }

        Some("run") => cmd_run(random, sheet_path, profile_override),

        Some("pb") => {
            let bests = PersonalBests::load();
            if bests.best_control_avg.is_none() && bests.best_accuracy_avg.is_none() {
                println!("no personal bests yet");
            }
            if let Some(c) = bests.best_control_avg {
                println!("best control avg: {c:.2}");
            }
            if let Some(a) = bests.best_accuracy_avg {
                println!("best accuracy avg: {a:.2}");
            }
            Ok(())
        }

        Some("reset-pb") => {
            PersonalBests::reset()?;
            println!("personal bests cleared");
            Ok(())
        }

        Some("use") => {
            let name: String = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: linedrill use <profile_name>"))?;
            let mut state = ConfigState::load_or_install_default()?;
            state.set_active(&name)?;
            println!("switched active profile to {}", state.active_name);
            Ok(())
        }

        Some("list") => {
            let state = ConfigState::load_or_install_default()?;
            for name in state.list_profiles() {
                let marker = if name == state.active_name { "*" } else { " " };
                println!("{marker} {name}");
            }
            Ok(())
        }

        Some("doctor") => {
            let state = ConfigState::load_or_install_default()?;
            print_response(&state.doctor_report());
            Ok(())
        }

        Some(other) => {
            eprintln!("unknown subcommand: {other}\n");
            print_help();
            Ok(())
        }

        None => {
            print_help();
            Ok(())
        }
    }
}

fn cmd_run(
    random: bool,
    sheet_path: Option<PathBuf>,
    profile_override: Option<String>,
) -> Result<()> {
    let mut state = ConfigState::load_or_install_default()?;
    if let Some(name) = &profile_override {
        state.select_for_session(name)?;
    }

    let hub = watch::session_signals(&state.profiles_dir)?;
    let mut clock = SessionClock::start();

    // Reload signals restart this loop with the freshly loaded profile.
    loop {
        let profile = state.profile.clone();
        let plan = if random {
            SessionPlan::random(&profile, &mut rand::thread_rng())
        } else {
            SessionPlan::ruled(&profile)
        };

        let mut source = match TabletInput::open(plan.page_width, plan.page_height) {
            Ok(source) => source,
            Err(InputError::NoDevices) => {
                println!("run 'linedrill doctor' to inspect devices and permissions");
                return Err(InputError::NoDevices.into());
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(name) = &profile.meta.name {
            info!("profile: {name}");
        }
        println!(
            "drill: {} lines on a {:.0}x{:.0} page",
            plan.lines.len(),
            plan.page_width,
            plan.page_height
        );

        clock.restart();
        match session::run_drill(&mut source, &profile, hub.receiver(), &plan)? {
            DrillOutcome::Completed(attempts) => {
                let report =
                    SessionReport::from_attempts(&attempts, &profile.stars, clock.elapsed(), true);
                let mut bests = PersonalBests::load();
                let new_best = bests.absorb(report.control.avg, report.accuracy.avg);
                if new_best.0 || new_best.1 {
                    bests.save()?;
                }
                finish_session(
                    &plan,
                    &attempts,
                    &profile,
                    &report,
                    &bests,
                    new_best,
                    &sheet_path,
                )?;
                return Ok(());
            }
            DrillOutcome::Cancelled(attempts) => {
                info!("session cancelled");
                let report =
                    SessionReport::from_attempts(&attempts, &profile.stars, clock.elapsed(), false);
                let bests = PersonalBests::load();
                finish_session(
                    &plan,
                    &attempts,
                    &profile,
                    &report,
                    &bests,
                    (false, false),
                    &sheet_path,
                )?;
                return Ok(());
            }
            DrillOutcome::ReloadRequested => {
                match state.reload() {
                    Ok(()) => info!("profile reloaded; restarting drill"),
                    Err(e) => error!("reload failed, keeping last good profile: {e}"),
                }
                hub.drain();
            }
        }
    }
}

fn finish_session(
    plan: &SessionPlan,
    attempts: &[session::Attempt],
    profile: &Profile,
    report: &SessionReport,
    bests: &PersonalBests,
    new_best: (bool, bool),
    sheet_path: &Option<PathBuf>,
) -> Result<()> {
    let summary = summary_lines(report, bests, new_best);
    for line in &summary {
        println!("{line}");
    }
    if let Some(path) = sheet_path {
        sheet::write(path, &sheet::render(plan, attempts, &profile.stars, &summary))?;
        println!("sheet saved to {}", path.display());
    }
    Ok(())
}

fn summary_lines(
    report: &SessionReport,
    bests: &PersonalBests,
    new_best: (bool, bool),
) -> Vec<String> {
    let mut lines = Vec::new();
    if !report.complete {
        lines.push("Session cancelled.".to_string());
    }
    if report.valid > 0 {
        lines.push(format!(
            "Control error. min: {}, avg: {:.2}, max: {}, best avg: {}{}",
            report.control.min,
            report.control.avg,
            report.control.max,
            display_best(bests.best_control_avg),
            if new_best.0 { " (New best!)" } else { "" }
        ));
        lines.push(format!(
            "Accuracy error. min: {:.2}, avg: {:.2}, max: {:.2}, best avg: {}{}",
            report.accuracy.min,
            report.accuracy.avg,
            report.accuracy.max,
            display_best(bests.best_accuracy_avg),
            if new_best.1 { " (New best!)" } else { "" }
        ));
        lines.push(format!(
            "Stars. bronze: {}, silver: {}, gold: {}",
            report.star_counts[2], report.star_counts[1], report.star_counts[0]
        ));
    }
    lines.push(format!("Invalid lines: {}", report.invalid));
    lines.push(format!("Time: {}", format_clock(report.elapsed)));
    lines
}

fn display_best(best: Option<f64>) -> String {
    match best {
        Some(b) => format!("{b:.2}"),
        None => "-".to_string(),
    }
}

fn print_help() {
    println!(
        r#"linedrill — pen tablet line drawing trainer

USAGE:
  linedrill help [command]                Show general or command-specific help
  linedrill run [--random] [--sheet <path>] [--profile <name>]
                                          Run a drill session
  linedrill pb                            Show personal best averages
  linedrill reset-pb                      Clear personal best averages
  linedrill use <name>                    Switch active profile
  linedrill list                          List profiles
  linedrill doctor                        Diagnose permissions/devices

TIPS:
  - Profiles: ~/.config/linedrill/profiles
  - Active profile pointer: ~/.config/linedrill/active
  - Personal bests: ~/.config/linedrill/bests.toml
"#
    );
}

fn print_subcmd_help(cmd: &str) {
    match cmd {
        "run" => println!(
            "usage: linedrill run [--random] [--sheet <path>] [--profile <name>]\nRuns a drill session on the active profile.\n  --random          random line heights and lengths instead of the ruled layout\n  --sheet <path>    save the finished session as an SVG sheet\n  --profile <name>  use a profile for this session without switching"
        ),
        "pb" => println!("usage: linedrill pb\nShows the best control and accuracy averages."),
        "reset-pb" => println!("usage: linedrill reset-pb\nClears the stored personal bests."),
        "use" => {
            println!("usage: linedrill use <name>\nSwitches active profile to <name> and reloads.")
        }
        "list" => {
            println!("usage: linedrill list\nLists available profiles; marks active with '*'.")
        }
        "doctor" => println!(
            "usage: linedrill doctor\nChecks permissions and lists detected drawing tablets."
        ),
        _ => {
            eprintln!("unknown command: {cmd}\n");
            print_help();
        }
    }
}

fn print_response(v: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(v).unwrap_or_default());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::Stats;
    use std::time::Duration;

    fn report() -> SessionReport {
        SessionReport {
            control: Stats {
                min: 4.0,
                avg: 10.0,
                max: 16.0,
            },
            accuracy: Stats {
                min: 0.5,
                avg: 1.5,
                max: 3.0,
            },
            star_counts: [1, 1, 1],
            valid: 4,
            invalid: 1,
            elapsed: Duration::from_millis(61_001),
            complete: true,
        }
    }

    #[test]
    fn summary_marks_each_metric_independently() {
        let bests = PersonalBests {
            best_control_avg: Some(10.0),
            best_accuracy_avg: Some(1.5),
        };
        let lines = summary_lines(&report(), &bests, (true, false));
        assert_eq!(
            lines[0],
            "Control error. min: 4, avg: 10.00, max: 16, best avg: 10.00 (New best!)"
        );
        assert_eq!(
            lines[1],
            "Accuracy error. min: 0.50, avg: 1.50, max: 3.00, best avg: 1.50"
        );
        assert_eq!(lines[2], "Stars. bronze: 1, silver: 1, gold: 1");
        assert_eq!(lines[3], "Invalid lines: 1");
        assert_eq!(lines[4], "Time: 01:01:001");
    }

    #[test]
    fn no_valid_lines_reports_only_the_counts() {
        let mut r = report();
        r.valid = 0;
        r.invalid = 3;
        let lines = summary_lines(&r, &PersonalBests::default(), (false, false));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "Invalid lines: 3");
    }

    #[test]
    fn a_cancelled_session_is_labelled() {
        let mut r = report();
        r.complete = false;
        let lines = summary_lines(&r, &PersonalBests::default(), (false, false));
        assert_eq!(lines[0], "Session cancelled.");
        assert!(lines[1].ends_with("best avg: -"));
    }
}
