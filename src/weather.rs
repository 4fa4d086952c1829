//! Weather and stadium context, reduced to the numeric interface the feature
//! table consumes: rain severity, temperature and humidity fractions, and a
//! standardized wind speed. Every piece is optional.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::FeatureWarning;
use crate::features::FeatureSource;
use crate::play::{Location, PlayRecord};

const INDOOR_TEMPERATURE: f64 = 70.0;
const INDOOR_HUMIDITY: f64 = 40.0;

/// Season the Los Angeles and Las Vegas franchises moved into their current stadiums.
const NEW_STADIUM_SEASON: i32 = 2020;

/// Stadium long axis, degrees clockwise from north.
static STADIUM_ORIENTATIONS: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    HashMap::from([
        ("ARI", 148.0),
        ("ATL", 90.0),
        ("BAL", 110.4),
        ("BUF", 122.2),
        ("CAR", 140.2),
        ("CHI", 175.8),
        ("CIN", 141.2),
        ("CLE", 55.7),
        ("DAL", 68.8),
        ("DEN", 0.0),
        ("DET", 63.9),
        ("GB", 0.0),
        ("HOU", 178.9),
        ("IND", 25.6),
        ("JAX", 15.5),
        ("KC", 137.2),
        ("LA", 0.0),
        ("LAC", 0.0),
        ("LV", 0.0),
        ("MIA", 121.8),
        ("MIN", 90.0),
        ("NE", 162.2),
        ("NO", 23.5),
        ("NYG", 167.0),
        ("NYJ", 167.0),
        ("PHI", 171.6),
        ("PIT", 155.5),
        ("SEA", 0.0),
        ("SF", 151.7),
        ("TB", 0.0),
        ("TEN", 155.6),
        ("WAS", 120.2),
    ])
});

const NORTH: f64 = 0.0;
const EAST: f64 = 90.0;
const SOUTH: f64 = 180.0;
const WEST: f64 = 270.0;
const NORTHEAST: f64 = (NORTH + EAST) / 2.0;
const NORTHWEST: f64 = (NORTH + 360.0 + WEST) / 2.0;
const SOUTHEAST: f64 = (SOUTH + EAST) / 2.0;
const SOUTHWEST: f64 = (SOUTH + WEST) / 2.0;

static DIRECTION_DEGREES: Lazy<HashMap<&'static str, Option<f64>>> = Lazy::new(|| {
    HashMap::from([
        ("calm", None),
        ("e", Some(EAST)),
        ("en", Some(NORTHEAST)),
        ("ene", Some((EAST + NORTHEAST) / 2.0)),
        ("ese", Some((EAST + SOUTHEAST) / 2.0)),
        ("indoor", None),
        ("n", Some(NORTH)),
        ("nby", None),
        ("ne", Some(NORTHEAST)),
        ("nne", Some((NORTH + NORTHEAST) / 2.0)),
        ("nnecalm", Some((NORTH + NORTHEAST) / 2.0)),
        ("nnw", Some((NORTH + NORTHWEST) / 2.0)),
        ("none", None),
        ("nw", Some(NORTHWEST)),
        ("s", Some(SOUTH)),
        ("se", Some(SOUTHEAST)),
        ("serly", None),
        ("sse", Some((SOUTH + SOUTHEAST) / 2.0)),
        ("ssw", Some((SOUTH + SOUTHWEST) / 2.0)),
        ("sw", Some(SOUTHWEST)),
        ("w", Some(WEST)),
        ("we", Some(SOUTHWEST)),
        ("wnw", Some((WEST + NORTHWEST) / 2.0)),
        ("wsw", Some((WEST + SOUTHWEST) / 2.0)),
    ])
});

const DIRECTION_WORDS: [(&str, &str); 4] =
    [("east", "e"), ("west", "w"), ("south", "s"), ("north", "n")];

const POSSIBLE_RAIN: [&str; 5] = [
    "rain chance",
    "chance of rain",
    "change of rain",
    "threat of rain",
    "a few light flakes of snow",
];
const SOME_RAIN: [&str; 7] = [
    "light snow",
    "light rain",
    "periods of rain",
    "shower",
    "rain expected",
    "snow flurries",
    "rain likely",
];
const STEADY_RAIN: [&str; 2] = ["rain", "snow"];

/// Fields pulled out of a free-text weather string such as
/// `"Cloudy Temp: 45° F, Humidity: 71%, Wind: From SW 10 mph"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub condition: Option<String>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_direction: Option<String>,
    pub wind_speed: Option<f64>,
}

fn leading_digits(s: &str) -> Option<f64> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s[..end].parse::<f64>().ok()
}

fn leading_letters(s: &str) -> usize {
    s.find(|c: char| !c.is_ascii_alphabetic()).unwrap_or(s.len())
}

/// Splits `"<direction> <speed>"` after `Wind: `. A direction is one or two
/// words and only counts when followed by a space.
fn split_wind(rest: &str) -> (Option<String>, &str) {
    let first = leading_letters(rest);
    if first == 0 {
        return (None, rest);
    }
    let after_first = &rest[first..];
    if let Some(tail) = after_first.strip_prefix(' ') {
        let second = leading_letters(tail);
        if second > 0 {
            if let Some(after_second) = tail[second..].strip_prefix(' ') {
                return (Some(rest[..first + 1 + second].to_string()), after_second);
            }
        }
        return (Some(rest[..first].to_string()), tail);
    }
    (None, rest)
}

pub fn parse_weather(weather: &str) -> WeatherReport {
    let mut report = WeatherReport::default();

    let condition = weather
        .find(" Temp:")
        .map(|idx| weather[..idx].trim().to_string())
        .unwrap_or_default();
    if weather.contains(" Temp:") {
        report.condition = Some(condition.clone());
    }
    let indoor = condition.to_lowercase().contains("indoor");

    report.temperature = weather
        .find("Temp: ")
        .and_then(|idx| leading_digits(&weather[idx + "Temp: ".len()..]));
    if report.temperature.is_none() && indoor {
        report.temperature = Some(INDOOR_TEMPERATURE);
    }

    if indoor {
        report.humidity = Some(INDOOR_HUMIDITY);
        report.wind_speed = Some(0.0);
        report.wind_direction = Some("indoor".to_string());
        return report;
    }

    let mut search = weather;
    while let Some(idx) = search.find("Humidity: ") {
        let rest = &search[idx + "Humidity: ".len()..];
        let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if end > 0 && rest[end..].starts_with('%') {
            report.humidity = rest[..end].parse::<f64>().ok();
            break;
        }
        search = rest;
    }

    if let Some(idx) = weather.find("Wind: ") {
        let (direction, rest) = split_wind(&weather[idx + "Wind: ".len()..]);
        report.wind_direction = direction;
        report.wind_speed = Some(leading_digits(rest).unwrap_or(0.0));
    }

    report
}

/// Rain severity in {0, 0.25, 0.5, 1.0}.
pub fn parse_rain(condition: Option<&str>) -> f64 {
    let Some(condition) = condition else {
        return 0.0;
    };
    let condition = condition.to_lowercase();
    if POSSIBLE_RAIN.iter().any(|k| condition.contains(k)) {
        0.25
    } else if SOME_RAIN.iter().any(|k| condition.contains(k)) {
        0.5
    } else if STEADY_RAIN.iter().any(|k| condition.contains(k)) {
        1.0
    } else {
        0.0
    }
}

/// Compass bearing the wind blows toward, where one could be recovered.
pub fn wind_direction_degrees(direction: Option<&str>) -> Option<f64> {
    let direction = direction.filter(|d| !d.is_empty())?;
    if direction == "Southerly" {
        return Some(SOUTH);
    }
    let mut wd = direction.to_lowercase();
    let rotate = wd.starts_with("from ");
    wd = wd.replace("from ", "").replace("calm", "").trim().to_string();
    for (word, abbr) in DIRECTION_WORDS {
        wd = wd.replace(word, abbr);
    }
    let key = wd.replace(' ', "");
    let degrees = (*DIRECTION_DEGREES.get(key.as_str())?)?;
    Some((degrees + if rotate { 180.0 } else { 0.0 }) % 360.0)
}

pub fn stadium_orientation(home_team: &str, season: i32, location: Location) -> Option<f64> {
    if location == Location::Neutral {
        return None;
    }
    if season < NEW_STADIUM_SEASON {
        match home_team {
            "LA" => return Some(90.0),
            "LAC" => return Some(0.0),
            "LV" => return Some(145.5),
            _ => {}
        }
    }
    STADIUM_ORIENTATIONS.get(home_team).copied()
}

fn is_closed_roof(roof: Option<&str>) -> bool {
    matches!(roof.map(str::trim), Some("closed") | Some("dome"))
}

/// Normalized weather covariates for one game.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherFeatures {
    pub rain: f64,
    pub temp_pct: f64,
    pub humidity_pct: f64,
    pub wind_speed_z: f64,
}

impl WeatherFeatures {
    pub fn missing() -> Self {
        Self {
            rain: f64::NAN,
            temp_pct: f64::NAN,
            humidity_pct: f64::NAN,
            wind_speed_z: f64::NAN,
        }
    }
}

impl FeatureSource for WeatherFeatures {
    fn visit_columns(&self, visit: &mut dyn FnMut(&str, f64)) {
        visit("rain", self.rain);
        visit("temp_pct", self.temp_pct);
        visit("humidity_pct", self.humidity_pct);
        visit("wind_speed_z", self.wind_speed_z);
    }
}

#[derive(Debug, Clone)]
struct ParsedGame {
    rain: f64,
    temperature: f64,
    humidity: f64,
    wind_speed: f64,
}

fn parse_game(play: &PlayRecord) -> Option<ParsedGame> {
    let raw = play.weather.as_deref()?;
    let report = parse_weather(raw);
    let closed = is_closed_roof(play.roof.as_deref());

    stadium_orientation(&play.home_team, play.season, play.location)?;

    let calm = matches!(
        report.wind_direction.as_deref(),
        Some("indoor") | Some("none") | Some("Calm")
    );
    let wind_speed = if closed || calm {
        Some(0.0)
    } else {
        report.wind_speed
    };
    let wind_degrees = wind_direction_degrees(report.wind_direction.as_deref());
    let wind_speed = wind_speed.filter(|s| *s == 0.0 || wind_degrees.is_some())?;

    let temperature = match (report.temperature, closed) {
        (Some(t), _) => t,
        (None, true) => INDOOR_TEMPERATURE,
        (None, false) => return None,
    };
    let humidity = report.humidity?;

    Some(ParsedGame {
        rain: parse_rain(report.condition.as_deref()),
        temperature,
        humidity,
        wind_speed,
    })
}

/// Per-game weather covariates. Games without a complete report are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherTable {
    by_game: BTreeMap<String, WeatherFeatures>,
}

impl WeatherTable {
    /// Builds the table from the first play of each game that carries a
    /// weather string. Wind speed is standardized across the games kept.
    pub fn build(plays: &[PlayRecord], warnings: &mut Vec<FeatureWarning>) -> Self {
        let mut parsed: BTreeMap<&str, ParsedGame> = BTreeMap::new();
        let mut attempted: BTreeSet<&str> = BTreeSet::new();
        for play in plays {
            if play.weather.is_none() || !attempted.insert(play.game_id.as_str()) {
                continue;
            }
            match parse_game(play) {
                Some(game) => {
                    parsed.insert(play.game_id.as_str(), game);
                }
                None => debug!(game_id = play.game_id.as_str(), "incomplete weather report"),
            }
        }

        let n = parsed.len();
        let mean = parsed.values().map(|g| g.wind_speed).sum::<f64>() / n.max(1) as f64;
        let std = if n < 2 {
            f64::NAN
        } else {
            let ss: f64 = parsed.values().map(|g| (g.wind_speed - mean).powi(2)).sum();
            (ss / (n - 1) as f64).sqrt()
        };
        let degenerate = n > 0 && !(std.is_finite() && std > 0.0);
        if degenerate {
            warn!(games = n, "wind speed has no spread; wind_speed_z set to 0");
            warnings.push(FeatureWarning::DegenerateAggregate {
                statistic: "wind_speed_z".to_string(),
                season: plays.first().map(|p| p.season).unwrap_or_default(),
                groups: n,
            });
        }

        let by_game = parsed
            .into_iter()
            .map(|(game_id, g)| {
                let wind_speed_z = if degenerate {
                    0.0
                } else {
                    (g.wind_speed - mean) / std
                };
                (
                    game_id.to_string(),
                    WeatherFeatures {
                        rain: g.rain,
                        temp_pct: g.temperature / 100.0,
                        humidity_pct: g.humidity / 100.0,
                        wind_speed_z,
                    },
                )
            })
            .collect();

        Self { by_game }
    }

    pub fn get(&self, game_id: &str) -> WeatherFeatures {
        self.by_game
            .get(game_id)
            .copied()
            .unwrap_or_else(WeatherFeatures::missing)
    }

    pub fn len(&self) -> usize {
        self.by_game.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_game.is_empty()
    }
}
