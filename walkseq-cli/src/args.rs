use std::path::PathBuf;

use walkseq_types::PatternKind;

pub const DEFAULT_SECONDS: f64 = 8.0;

pub const USAGE: &str = "usage: walkseq [--verbose] [--seconds N] [--bpm X] [--pattern NAME] \
[--state FILE] [--save FILE] [--seed N] [--list-ports] [--port N]";

#[derive(Debug, Default, PartialEq)]
pub struct Args {
    pub verbose: bool,
    /// Length of the run; 0 plays until killed (live mode only)
    pub seconds: Option<f64>,
    pub bpm: Option<f64>,
    pub pattern: Option<PatternKind>,
    pub state: Option<PathBuf>,
    pub save: Option<PathBuf>,
    pub seed: Option<u64>,
    pub list_ports: bool,
    pub port: Option<usize>,
    pub help: bool,
}

impl Args {
    pub fn seconds(&self) -> f64 {
        self.seconds.unwrap_or(DEFAULT_SECONDS)
    }
}

/// Parse everything after the program name.
pub fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut parsed = Args::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--verbose" | "-v" => parsed.verbose = true,
            "--list-ports" => parsed.list_ports = true,
            "--help" | "-h" => parsed.help = true,
            "--seconds" => {
                let secs: f64 = parse_value(arg, iter.next())?;
                if !secs.is_finite() || secs < 0.0 {
                    return Err(format!("--seconds must be >= 0, got {}", secs));
                }
                parsed.seconds = Some(secs);
            }
            "--bpm" => parsed.bpm = Some(parse_value(arg, iter.next())?),
            "--seed" => parsed.seed = Some(parse_value(arg, iter.next())?),
            "--port" => parsed.port = Some(parse_value(arg, iter.next())?),
            "--pattern" => {
                let name = value(arg, iter.next())?;
                parsed.pattern = Some(
                    PatternKind::parse(name).ok_or_else(|| format!("unknown pattern '{}'", name))?,
                );
            }
            "--state" => parsed.state = Some(PathBuf::from(value(arg, iter.next())?)),
            "--save" => parsed.save = Some(PathBuf::from(value(arg, iter.next())?)),
            other => return Err(format!("unrecognized argument '{}'", other)),
        }
    }

    Ok(parsed)
}

fn value<'a>(flag: &str, next: Option<&'a String>) -> Result<&'a str, String> {
    next.map(String::as_str)
        .ok_or_else(|| format!("{} needs a value", flag))
}

fn parse_value<T: std::str::FromStr>(flag: &str, next: Option<&String>) -> Result<T, String> {
    let raw = value(flag, next)?;
    raw.parse()
        .map_err(|_| format!("invalid value '{}' for {}", raw, flag))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_args_use_defaults() {
        let parsed = parse_args(&[]).unwrap();
        assert_eq!(parsed, Args::default());
        assert!((parsed.seconds() - DEFAULT_SECONDS).abs() < f64::EPSILON);
    }

    #[test]
    fn parses_all_flags() {
        let parsed = parse_args(&args(&[
            "-v", "--seconds", "2.5", "--bpm", "140", "--pattern", "arp", "--state", "in.json",
            "--save", "out.json", "--seed", "42", "--port", "1",
        ]))
        .unwrap();
        assert!(parsed.verbose);
        assert_eq!(parsed.seconds, Some(2.5));
        assert_eq!(parsed.bpm, Some(140.0));
        assert_eq!(parsed.pattern, Some(PatternKind::Arpeggio));
        assert_eq!(parsed.state, Some(PathBuf::from("in.json")));
        assert_eq!(parsed.save, Some(PathBuf::from("out.json")));
        assert_eq!(parsed.seed, Some(42));
        assert_eq!(parsed.port, Some(1));
    }

    #[test]
    fn missing_value_is_an_error() {
        let err = parse_args(&args(&["--bpm"])).unwrap_err();
        assert!(err.contains("--bpm"));
    }

    #[test]
    fn bad_values_are_errors() {
        assert!(parse_args(&args(&["--port", "x"])).is_err());
        assert!(parse_args(&args(&["--seconds", "-1"])).is_err());
        assert!(parse_args(&args(&["--pattern", "zigzag"])).is_err());
        assert!(parse_args(&args(&["--frobnicate"])).is_err());
    }
}
