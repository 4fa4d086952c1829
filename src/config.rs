use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use crate::pipeline::PipelineOptions;

/// Run configuration: defaults, then `.env`, then the process environment,
/// then command-line flags.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipelineConfig {
    pub input: Option<PathBuf>,
    pub db: Option<PathBuf>,
    pub tendencies_in: Option<PathBuf>,
    pub tendencies_out: Option<PathBuf>,
    pub seasons: Option<Vec<i32>>,
    pub threads: Option<usize>,
    pub include_weather: bool,
    pub sort: bool,
}

impl PipelineConfig {
    /// Loads `.env` if present and resolves against `std::env::args`.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let args = env::args().skip(1).collect::<Vec<_>>();
        Self::resolve(&args, |key| env::var(key).ok())
    }

    pub fn resolve(args: &[String], env_var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let lookup = |flag: &str, key: &str| -> Option<String> {
            arg_value(args, flag).or_else(|| env_var(key).filter(|v| !v.trim().is_empty()))
        };

        let seasons = lookup("--seasons", "PBP_SEASONS")
            .map(|raw| parse_seasons(&raw))
            .transpose()?;
        let threads = lookup("--threads", "PBP_THREADS")
            .map(|raw| {
                raw.trim()
                    .parse::<usize>()
                    .with_context(|| format!("invalid thread count `{raw}`"))
            })
            .transpose()?
            .map(|n| n.clamp(1, 256));

        let include_weather = if has_flag(args, "--no-weather") {
            false
        } else {
            env_var("PBP_WEATHER").map_or(true, |v| parse_bool(&v))
        };
        let sort = has_flag(args, "--sort") || env_var("PBP_SORT").is_some_and(|v| parse_bool(&v));

        Ok(Self {
            input: lookup("--input", "PBP_INPUT").map(PathBuf::from),
            db: lookup("--db", "PBP_DB").map(PathBuf::from),
            tendencies_in: lookup("--tendencies-in", "PBP_TENDENCIES_IN").map(PathBuf::from),
            tendencies_out: lookup("--tendencies-out", "PBP_TENDENCIES_OUT").map(PathBuf::from),
            seasons,
            threads,
            include_weather,
            sort,
        })
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            include_weather: self.include_weather,
            threads: self.threads,
        }
    }
}

/// `--flag=value` or `--flag value`; empty values are ignored.
pub fn arg_value(args: &[String], flag: &str) -> Option<String> {
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() && !next.starts_with("--") {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

pub fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Accepts `2019`, `2018-2023` and comma lists mixing both.
pub fn parse_seasons(raw: &str) -> Result<Vec<i32>> {
    let mut out = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if let Some((lo, hi)) = part.split_once('-') {
            let lo = lo.trim().parse::<i32>().with_context(|| format!("bad season `{lo}`"))?;
            let hi = hi.trim().parse::<i32>().with_context(|| format!("bad season `{hi}`"))?;
            if hi < lo {
                return Err(anyhow!("season range {lo}-{hi} is reversed"));
            }
            out.extend(lo..=hi);
        } else {
            out.push(part.parse::<i32>().with_context(|| format!("bad season `{part}`"))?);
        }
    }
    if out.is_empty() {
        return Err(anyhow!("no seasons in `{raw}`"));
    }
    out.sort_unstable();
    out.dedup();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn flags_override_env() {
        let cfg = PipelineConfig::resolve(
            &args(&["--input=plays.parquet", "--threads", "4", "--no-weather"]),
            |key| match key {
                "PBP_INPUT" => Some("env.parquet".to_string()),
                "PBP_DB" => Some("features.sqlite".to_string()),
                "PBP_WEATHER" => Some("1".to_string()),
                _ => None,
            },
        )
        .unwrap();
        assert_eq!(cfg.input, Some(PathBuf::from("plays.parquet")));
        assert_eq!(cfg.db, Some(PathBuf::from("features.sqlite")));
        assert_eq!(cfg.threads, Some(4));
        assert!(!cfg.include_weather);
        assert!(!cfg.sort);
    }

    #[test]
    fn weather_defaults_on() {
        let cfg = PipelineConfig::resolve(&[], |_| None).unwrap();
        assert!(cfg.include_weather);
        assert_eq!(cfg.seasons, None);
    }

    #[test]
    fn seasons_accept_ranges_and_lists() {
        assert_eq!(parse_seasons("2018-2020").unwrap(), vec![2018, 2019, 2020]);
        assert_eq!(parse_seasons("2021, 2019,2021").unwrap(), vec![2019, 2021]);
        assert!(parse_seasons("2020-2018").is_err());
        assert!(parse_seasons("abc").is_err());
    }
}
