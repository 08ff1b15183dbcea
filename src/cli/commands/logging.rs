use clap::{Arg, ArgAction, ArgMatches, Command, builder::ValueParser};

pub const ARG_VERBOSITY: &str = "verbosity";
pub const ARG_LOG_LEVEL: &str = "log-level";

/// Accept a number up to 5 or a level name.
#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err(format!("invalid log level: {level}")),
        }
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_VERBOSITY)
                .short('v')
                .long("verbose")
                .help("Increase verbosity: -v WARN, -vv INFO, -vvv DEBUG, -vvvv TRACE")
                .global(true)
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new(ARG_LOG_LEVEL)
                .long(ARG_LOG_LEVEL)
                .help("Log level: ERROR, WARN, INFO, DEBUG, TRACE or 0-5 (overrides -v)")
                .env("TESSERA_LOG_LEVEL")
                .global(true)
                .action(ArgAction::Set)
                .value_parser(validator_log_level()),
        )
}

/// The explicit log level when given, otherwise the `-v` count.
#[must_use]
pub fn verbosity(matches: &ArgMatches) -> u8 {
    matches
        .get_one::<u8>(ARG_LOG_LEVEL)
        .or_else(|| matches.get_one::<u8>(ARG_VERBOSITY))
        .copied()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_names_and_numbers() {
        let command = with_args(Command::new("test"));
        for (value, expected) in [("error", 0), ("WARN", 1), ("info", 2), ("3", 3), ("trace", 4)] {
            let matches = temp_env::with_vars([("TESSERA_LOG_LEVEL", Some(value))], || {
                command.clone().try_get_matches_from(["test"])
            });
            assert_eq!(matches.ok().map(|m| verbosity(&m)), Some(expected), "{value}");
        }
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let command = with_args(Command::new("test"));
        let result = temp_env::with_vars([("TESSERA_LOG_LEVEL", Some("loud"))], || {
            command.try_get_matches_from(["test"])
        });
        assert!(result.is_err());
    }

    #[test]
    fn log_level_overrides_the_count() {
        let command = with_args(Command::new("test"));
        let matches = temp_env::with_vars([("TESSERA_LOG_LEVEL", None::<&str>)], || {
            command
                .clone()
                .try_get_matches_from(["test", "-vvv", "--log-level", "warn"])
        });
        assert_eq!(matches.ok().map(|m| verbosity(&m)), Some(1));

        let matches = temp_env::with_vars([("TESSERA_LOG_LEVEL", None::<&str>)], || {
            command.try_get_matches_from(["test", "-vv"])
        });
        assert_eq!(matches.ok().map(|m| verbosity(&m)), Some(2));
    }
}
