use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Parser)]
#[command(name = "assetforge")]
#[command(author, version, about = "Lazy, composable asset processing jobs")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store a file in the datastore and print its uid
    Store {
        /// File to store
        #[arg(required = true)]
        file: PathBuf,
    },

    /// Build a job, apply it and write the resulting artifact
    Run {
        /// Uid of the stored artifact to fetch first
        uid: Option<String>,

        /// Process step, e.g. `thumbnail:100,100` (repeatable)
        #[arg(short = 'p', long = "process", value_name = "NAME[:ARGS]")]
        process: Vec<StepSpec>,

        /// Final encode step, e.g. `jpg:80`
        #[arg(short = 'e', long = "encode", value_name = "FORMAT[:ARGS]")]
        encode: Option<StepSpec>,

        /// Recipe JSON file whose steps run before any -p/-e steps
        #[arg(long)]
        recipe: Option<PathBuf>,

        /// Where to write the result
        #[arg(short, long, required = true)]
        output: PathBuf,
    },

    /// Run an analyser on a stored artifact and print the JSON result
    Analyse {
        /// Uid of the stored artifact
        uid: String,

        /// Analyser name, e.g. `width`
        name: String,

        /// Process steps applied before analysing
        #[arg(short = 'p', long = "process", value_name = "NAME[:ARGS]")]
        process: Vec<StepSpec>,
    },

    /// Print a job's recipe and signature without running it
    Recipe {
        /// Uid of the stored artifact
        uid: String,

        /// Process step (repeatable)
        #[arg(short = 'p', long = "process", value_name = "NAME[:ARGS]")]
        process: Vec<StepSpec>,

        /// Encode step
        #[arg(short = 'e', long = "encode", value_name = "FORMAT[:ARGS]")]
        encode: Option<StepSpec>,
    },

    /// Remove a stored artifact
    Destroy {
        /// Uid of the stored artifact
        uid: String,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

/// A step given on the command line as `name` or `name:arg1,arg2`.
///
/// Each argument is read as a JSON scalar when it parses as one, so `100`
/// becomes a number and `true` a boolean; anything else stays a string.
#[derive(Debug, Clone, PartialEq)]
pub struct StepSpec {
    pub name: String,
    pub params: Vec<Value>,
}

impl FromStr for StepSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, args) = match s.split_once(':') {
            Some((name, args)) => (name.trim(), Some(args)),
            None => (s.trim(), None),
        };
        if name.is_empty() {
            return Err(format!("missing step name in {s:?}"));
        }

        let params = args
            .into_iter()
            .flat_map(|args| args.split(','))
            .map(str::trim)
            .filter(|arg| !arg.is_empty())
            .map(parse_arg)
            .collect();

        Ok(Self {
            name: name.to_string(),
            params,
        })
    }
}

fn parse_arg(arg: &str) -> Value {
    match serde_json::from_str::<Value>(arg) {
        Ok(value) if !value.is_object() && !value.is_array() => value,
        _ => Value::String(arg.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serde_json::json;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn step_spec_without_args() {
        let spec: StepSpec = "greyscale".parse().unwrap();
        assert_eq!(spec.name, "greyscale");
        assert!(spec.params.is_empty());
    }

    #[test]
    fn step_spec_parses_scalars() {
        let spec: StepSpec = "thumbnail:100, 50".parse().unwrap();
        assert_eq!(spec.name, "thumbnail");
        assert_eq!(spec.params, vec![json!(100), json!(50)]);

        let spec: StepSpec = "label:hello,true,1.5,null".parse().unwrap();
        assert_eq!(
            spec.params,
            vec![json!("hello"), json!(true), json!(1.5), Value::Null]
        );
    }

    #[test]
    fn step_spec_requires_name() {
        assert!(":100".parse::<StepSpec>().is_err());
        assert!("".parse::<StepSpec>().is_err());
    }

    #[test]
    fn run_collects_repeated_process_flags() {
        let cli = Cli::parse_from([
            "assetforge",
            "run",
            "abc",
            "-p",
            "thumbnail:10,10",
            "-p",
            "greyscale",
            "-e",
            "png",
            "-o",
            "out.png",
        ]);
        match cli.command {
            Commands::Run {
                uid,
                process,
                encode,
                ..
            } => {
                assert_eq!(uid.as_deref(), Some("abc"));
                assert_eq!(process.len(), 2);
                assert_eq!(encode.unwrap().name, "png");
            }
            _ => panic!("expected run"),
        }
    }
}
