use clap::{command, value_parser, Arg, ArgAction, Command};

fn store_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("store_filepath")
                .value_name("FILEPATH")
                .short('s')
                .long("store")
                .env("KIDPLAY_STORE")
                .default_value("progress.json")
                .global(true)
                .help("JSON file holding every user's progress. Created on the first write."),
        )
        .arg(
            Arg::new("user")
                .value_name("ID")
                .short('u')
                .long("user")
                .default_value(crate::store::DEFAULT_USER)
                .global(true)
                .help("Whose progress to read or change."),
        )
}

fn activity_arg() -> Arg {
    Arg::new("activity")
        .value_name("ACTIVITY")
        .required(true)
        .help("Name of the game that was just played, e.g. \"Matching Game\".")
}

fn progress() -> Command {
    store_args(
        Command::new("progress")
            .about("Read or update a child's stars, quiz score, and badge")
            .subcommand_required(true)
            .subcommand(Command::new("show").about("Print the stored progress record as JSON"))
            .subcommand(
                Command::new("award")
                    .about("Add one star for a finished game")
                    .arg(activity_arg())
                    .arg(
                        Arg::new("quiz_point")
                            .long("quiz-point")
                            .action(ArgAction::SetTrue)
                            .help("The star is for a correct quiz answer, so the quiz score goes up by one too."),
                    ),
            )
            .subcommand(
                Command::new("quiz")
                    .about("Record a quiz score. A perfect score also earns a star.")
                    .arg(activity_arg())
                    .arg(
                        Arg::new("score")
                            .value_name("INTEGER")
                            .long("score")
                            .required(true)
                            .value_parser(value_parser!(u32))
                            .help("Correct answers."),
                    )
                    .arg(
                        Arg::new("out_of")
                            .value_name("INTEGER")
                            .long("out-of")
                            .required(true)
                            .value_parser(value_parser!(u32))
                            .help("Number of questions in the quiz."),
                    ),
            )
            .subcommand(
                Command::new("set")
                    .about("Replace the whole progress record. The badge follows the star count.")
                    .arg(
                        Arg::new("stars")
                            .value_name("INTEGER")
                            .long("stars")
                            .default_value("0")
                            .value_parser(value_parser!(u32)),
                    )
                    .arg(
                        Arg::new("quiz_score")
                            .value_name("INTEGER")
                            .long("quiz-score")
                            .default_value("0")
                            .value_parser(value_parser!(u32)),
                    )
                    .arg(
                        Arg::new("activity")
                            .value_name("ACTIVITY")
                            .long("activity")
                            .default_value(""),
                    ),
            ),
    )
}

fn classify() -> Command {
    Command::new("classify")
        .about("Recognize the shape drawn in each sketch and print it as one JSON line per input")
        .arg(
            Arg::new("inputs")
                .value_name("FILEPATH")
                .required(true)
                .num_args(1..)
                .help("Sketch images to classify. Use `-` to read from standard input."),
        )
        .arg(
            Arg::new("payload")
                .short('p')
                .long("payload")
                .action(ArgAction::SetTrue)
                .help("Inputs contain base64 text, optionally as a `data:image/...;base64,` URL, instead of image bytes."),
        )
}

pub fn create() -> Command {
    command!()
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(classify())
        .subcommand(progress())
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true)
                .help("Output debugging messages to stderr. Pass multiple times for more verbose logging."),
        )
}
