//! Command-line surface.
//!
//! The flags are handled by hand on top of clap so the output matches the
//! historical tool: `-h` prints usage on stdout, anything malformed prints it
//! on stderr, `-v` prints `version: <v> - git sha: <sha>`.

use std::ffi::OsString;

use clap::Parser;

pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Commit the binary was built from, injected at build time.
pub const GIT_SHA: Option<&str> = option_env!("REMINDME_GIT_SHA");

#[derive(Parser, Debug)]
#[command(name = "remindme", disable_help_flag = true, disable_version_flag = true)]
pub struct Cli {
    /// Show usage and exit
    #[arg(short = 'h', long = "help")]
    pub help: bool,

    /// Show version and exit
    #[arg(short = 'v', long = "version")]
    pub version: bool,

    /// Run the scheduling process
    #[arg(short = 's', long = "server")]
    pub server: bool,

    /// Path to a remindme.toml (overrides $REMINDME_CONFIG)
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    pub config: Option<String>,

    /// <destination> <timespec> <message>
    ///
    /// Once the first positional is seen, everything after it is taken
    /// verbatim, so a message may start with `-`.
    #[arg(value_name = "ARGS", allow_hyphen_values = true, trailing_var_arg = true)]
    pub args: Vec<String>,
}

/// What the process was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Help,
    Version,
    Serve {
        config: Option<String>,
    },
    Submit {
        config: Option<String>,
        destination: String,
        timespec: String,
        message: String,
    },
    /// Unknown flag or wrong number of positional arguments.
    Usage,
}

impl Cli {
    pub fn invocation(self) -> Invocation {
        if self.help {
            return Invocation::Help;
        }
        if self.version {
            return Invocation::Version;
        }
        if self.server {
            return Invocation::Serve {
                config: self.config,
            };
        }
        match <[String; 3]>::try_from(self.args) {
            Ok([destination, timespec, message]) => Invocation::Submit {
                config: self.config,
                destination,
                timespec,
                message,
            },
            Err(_) => Invocation::Usage,
        }
    }
}

pub fn parse_args<I, T>(args: I) -> Invocation
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => cli.invocation(),
        Err(_) => Invocation::Usage,
    }
}

pub fn version_line() -> String {
    format!("version: {VERSION} - git sha: {}", GIT_SHA.unwrap_or("unknown"))
}

pub fn usage() -> String {
    format!(
        "version: {VERSION}
Usage: {NAME} [-v] [-h] [-s] [-c <path>] <destination> <timespec> <message>
Options:
    -s        run the server
    -c        config file
    -h        help
    -v        show version and exit
Examples:
    {NAME} at 09:16 \"call the handyman\"
    {NAME} in 5m \"login to the meeting\"
    {NAME} on 08/17 \"buy a birthday card\"
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoke(args: &[&str]) -> Invocation {
        parse_args(std::iter::once("remindme").chain(args.iter().copied()))
    }

    #[test]
    fn three_positionals_submit() {
        assert_eq!(
            invoke(&["at", "09:16", "call the handyman"]),
            Invocation::Submit {
                config: None,
                destination: "at".into(),
                timespec: "09:16".into(),
                message: "call the handyman".into(),
            }
        );
    }

    #[test]
    fn message_may_start_with_hyphen() {
        for message in ["-1 day left", "--- standup ---", "-h"] {
            assert_eq!(
                invoke(&["at", "09:16", message]),
                Invocation::Submit {
                    config: None,
                    destination: "at".into(),
                    timespec: "09:16".into(),
                    message: message.into(),
                }
            );
        }
        assert!(matches!(
            invoke(&["-c", "/etc/remindme.toml", "in", "5m", "-x"]),
            Invocation::Submit { ref config, ref message, .. }
                if config.as_deref() == Some("/etc/remindme.toml") && message == "-x"
        ));
    }

    #[test]
    fn wrong_count_is_usage_error() {
        assert_eq!(invoke(&[]), Invocation::Usage);
        assert_eq!(invoke(&["at", "09:16"]), Invocation::Usage);
        assert_eq!(invoke(&["at", "09:16", "call", "the handyman"]), Invocation::Usage);
    }

    #[test]
    fn flags() {
        assert_eq!(invoke(&["-h"]), Invocation::Help);
        assert_eq!(invoke(&["-v"]), Invocation::Version);
        assert_eq!(invoke(&["-s"]), Invocation::Serve { config: None });
        assert_eq!(
            invoke(&["-s", "-c", "/etc/remindme.toml"]),
            Invocation::Serve { config: Some("/etc/remindme.toml".into()) }
        );
        assert_eq!(invoke(&["-x"]), Invocation::Usage);
    }

    #[test]
    fn help_wins_over_everything() {
        assert_eq!(invoke(&["-v", "-h", "-s"]), Invocation::Help);
    }

    #[test]
    fn usage_lists_examples() {
        let text = usage();
        assert!(text.contains("at 09:16 \"call the handyman\""));
        assert!(text.contains("in 5m \"login to the meeting\""));
        assert!(text.contains("on 08/17 \"buy a birthday card\""));
    }

    #[test]
    fn version_line_shape() {
        let line = version_line();
        assert!(line.starts_with(&format!("version: {VERSION} - git sha: ")));
    }
}
