use crate::cli_app::{Args, Command, ProgressAction};
use crate::error::Result;
use crate::inout::{self, Source};
use crate::progress::ProgressRecord;
use crate::shape::{self, Shape};
use crate::store::ProgressStore;
use rayon::iter::IntoParallelRefIterator;
use rayon::iter::ParallelIterator;

/// Run the requested command, printing its JSON output to stdout. Returns whether
/// every input was handled; a batch of sketches prints all lines even when some fail.
pub fn run(args: Args) -> Result<bool> {
    match args.command {
        Command::Classify { sources } => classify_all(&sources),
        Command::Progress {
            store_filepath,
            user,
            action,
        } => {
            let store = ProgressStore::open(store_filepath);
            tracing::debug!(store = %store.path().display(), user = %user, "progress command");
            let record = progress(&store, &user, action)?;
            println!("{}", serde_json::to_string(&record)?);
            Ok(true)
        }
    }
}

fn classify_all(sources: &[Source]) -> Result<bool> {
    let results: Vec<Result<Option<Shape>>> = sources
        .par_iter()
        .map(|source| source.image().map(|image| shape::classify(&image)))
        .collect();

    let mut all_ok = true;
    for (result, source) in results.iter().zip(sources) {
        match result {
            Ok(detection) => println!("{}", inout::detection_json(detection)?),
            Err(e) => {
                tracing::warn!(input = %source.location, "could not classify: {}", e);
                println!("{}", inout::error_json(e));
                all_ok = false;
            }
        }
    }
    Ok(all_ok)
}

fn progress(store: &ProgressStore, user: &str, action: ProgressAction) -> Result<ProgressRecord> {
    match action {
        ProgressAction::Show => store.load(user),
        ProgressAction::Award {
            activity,
            quiz_point: false,
        } => store.award_star(user, &activity),
        ProgressAction::Award {
            activity,
            quiz_point: true,
        } => store.award_quiz_point(user, &activity),
        ProgressAction::Quiz {
            activity,
            score,
            out_of,
        } => store.record_quiz(user, &activity, score, out_of),
        ProgressAction::Set(record) => store.save(user, record),
    }
}
