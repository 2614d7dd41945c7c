mod app;

use crate::inout::{Source, STDIN};
use crate::progress::ProgressRecord;
use clap::error::ErrorKind;
use clap::ArgMatches;

/// The validated arguments passed in by the user
#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    pub verbosity: u8,
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Classify {
        sources: Vec<Source>,
    },
    Progress {
        store_filepath: String,
        user: String,
        action: ProgressAction,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressAction {
    Show,
    Award {
        activity: String,
        quiz_point: bool,
    },
    Quiz {
        activity: String,
        score: u32,
        out_of: u32,
    },
    Set(ProgressRecord),
}

fn string_arg(matches: &ArgMatches, name: &str) -> String {
    matches
        .get_one::<String>(name)
        .cloned()
        .unwrap_or_default()
}

fn number_arg(matches: &ArgMatches, name: &str) -> u32 {
    matches.get_one::<u32>(name).copied().unwrap_or_default()
}

pub fn parse_args() -> Args {
    let mut app = app::create();
    let matches = app.get_matches_mut();
    from_matches(&matches).unwrap_or_else(|e| e.format(&mut app).exit())
}

fn from_matches(matches: &ArgMatches) -> Result<Args, clap::Error> {
    let (command, leaf) = match matches.subcommand() {
        Some(("progress", progress)) => {
            let (action, leaf) = match progress.subcommand() {
                Some(("award", m)) => (
                    ProgressAction::Award {
                        activity: string_arg(m, "activity"),
                        quiz_point: m.get_flag("quiz_point"),
                    },
                    m,
                ),
                Some(("quiz", m)) => (
                    ProgressAction::Quiz {
                        activity: string_arg(m, "activity"),
                        score: number_arg(m, "score"),
                        out_of: number_arg(m, "out_of"),
                    },
                    m,
                ),
                Some(("set", m)) => (
                    ProgressAction::Set(ProgressRecord {
                        last_activity: string_arg(m, "activity"),
                        quiz_score: number_arg(m, "quiz_score"),
                        stars: number_arg(m, "stars"),
                        badge_unlocked: false,
                    }),
                    m,
                ),
                Some((_, m)) => (ProgressAction::Show, m),
                None => (ProgressAction::Show, progress),
            };
            (
                Command::Progress {
                    store_filepath: string_arg(leaf, "store_filepath"),
                    user: string_arg(leaf, "user"),
                    action,
                },
                leaf,
            )
        }
        Some((_, classify)) => {
            let payload = classify.get_flag("payload");
            let sources: Vec<Source> = classify
                .get_many::<String>("inputs")
                .map(|v| {
                    v.map(|location| Source {
                        location: location.clone(),
                        payload,
                    })
                    .collect()
                })
                .unwrap_or_default();
            if sources.iter().filter(|s| s.location == STDIN).count() > 1 {
                return Err(clap::Error::raw(
                    ErrorKind::ArgumentConflict,
                    "standard input (`-`) can only be read once\n",
                ));
            }
            (Command::Classify { sources }, classify)
        }
        None => (Command::Classify { sources: Vec::new() }, matches),
    };

    Ok(Args {
        verbosity: leaf.get_count("verbose"),
        command,
    })
}
