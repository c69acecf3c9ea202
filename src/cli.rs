use anyhow::{Result, anyhow};
use pico_args::Arguments;
use std::{
    env,
    io::{self, Write},
    path::PathBuf,
};

use leapctl::config::ProfileStore;
use leapctl::session::{ProfileSource, pipeline};

pub fn run() -> Result<()> {
    let mut pargs = Arguments::from_env();

    // No args -> general help
    if env::args().len() == 1 {
        print_help();
        return Ok(());
    }

    if pargs.contains("-h") || pargs.contains("--help") {
        print_help();
        return Ok(());
    }

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

        Some("replay") => {
            let trace = pargs.contains("--trace");
            let source = profile_source(&mut pargs)?;
            let frames: PathBuf = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: leapctl replay <frames.jsonl> [--profile NAME | --config PATH] [--trace]"))?;
            let (profile, _) = source.load()?;
            let stdout = io::stdout();
            let mut out = stdout.lock();
            let last = pipeline::replay(&frames, &profile, trace, &mut out)?;
            if !trace {
                writeln!(out, "{}", serde_json::to_string_pretty(&last)?)?;
            }
            Ok(())
        }

        Some("follow") => {
            let source = profile_source(&mut pargs)?;
            let (profile, path) = source.load()?;
            let stdout = io::stdout();
            pipeline::follow(profile, path, &mut stdout.lock())?;
            Ok(())
        }

        Some("list") => {
            let store = ProfileStore::load_or_install_default()?;
            for name in store.list_profiles() {
                let mark = if name == store.active_name { '*' } else { ' ' };
                println!("{mark} {name}");
            }
            Ok(())
        }

        Some("use") => {
            let name: String = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: leapctl use <profile_name>"))?;
            let mut store = ProfileStore::load_or_install_default()?;
            store.set_active(&name)?;
            println!("ok: active profile is '{name}' ({:?})", store.profile.variant);
            Ok(())
        }

        Some("check") => {
            let source = match profile_source(&mut pargs)? {
                ProfileSource::Active => match pargs.opt_free_from_str::<String>()? {
                    Some(name) => ProfileSource::Named(name),
                    None => ProfileSource::Active,
                },
                other => other,
            };
            let (profile, path) = source.load()?;
            println!("ok: {} is valid", path.display());
            println!("{}", serde_json::to_string_pretty(&profile)?);
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

fn profile_source(pargs: &mut Arguments) -> Result<ProfileSource> {
    let name: Option<String> = pargs.opt_value_from_str("--profile")?;
    let file: Option<PathBuf> = pargs.opt_value_from_str("--config")?;
    match (name, file) {
        (Some(_), Some(_)) => Err(anyhow!("--profile and --config are mutually exclusive")),
        (Some(n), None) => Ok(ProfileSource::Named(n)),
        (None, Some(p)) => Ok(ProfileSource::File(p)),
        (None, None) => Ok(ProfileSource::Active),
    }
}

fn print_help() {
    println!(
        r#"leapctl - hand-tracking orbit, zoom and pan controls

USAGE:
  leapctl help [command]                  Show general or command-specific help
  leapctl replay <frames.jsonl> [opts]    Run a recorded frame stream, print the final pose
  leapctl follow [opts]                   Drive controls from frames on stdin
  leapctl list                            List profiles
  leapctl use <name>                      Switch active profile
  leapctl check [name]                    Validate a profile and print it resolved

OPTIONS:
  --profile NAME                          Use a named profile instead of the active one
  --config PATH                           Use a profile file outside the profile directory
  --trace                                 (replay) print one JSON record per frame

TIPS:
  - Profiles: ~/.config/leapctl/profiles
  - Active profile pointer: ~/.config/leapctl/active
  - RUST_LOG=debug shows gesture engage/release events
"#
    );
}

fn print_subcmd_help(cmd: &str) {
    match cmd {
        "replay" => println!(
            "usage: leapctl replay <frames.jsonl> [--profile NAME | --config PATH] [--trace]\nReplays one JSON frame per line. Malformed lines abort the replay."
        ),
        "follow" => println!(
            "usage: leapctl follow [--profile NAME | --config PATH]\nReads frames from stdin until EOF or SIGINT/SIGTERM.\nPrints a JSON record per frame; edits to the profile are applied live."
        ),
        "list" => {
            println!("usage: leapctl list\nLists available profiles; marks active with '*'.")
        }
        "use" => println!("usage: leapctl use <name>\nSwitches the active profile to <name>."),
        "check" => println!(
            "usage: leapctl check [name | --config PATH]\nValidates a profile and prints it with variant defaults applied."
        ),
        _ => {
            eprintln!("unknown command: {cmd}\n");
            print_help();
        }
    }
}
