use pbp_features::play::{Location, PlayRecord};
use pbp_features::weather::{
    WeatherTable, parse_rain, parse_weather, stadium_orientation, wind_direction_degrees,
};

fn opening_play(game: &str, home: &str, weather: Option<&str>, roof: &str) -> PlayRecord {
    PlayRecord {
        game_id: game.to_string(),
        play_id: 1,
        season: 2022,
        qtr: 1,
        home_team: home.to_string(),
        weather: weather.map(str::to_string),
        roof: Some(roof.to_string()),
        game_seconds_remaining: 3600.0,
        half_seconds_remaining: 1800.0,
        quarter_seconds_remaining: 900.0,
        ..PlayRecord::default()
    }
}

#[test]
fn parses_full_weather_string() {
    let report = parse_weather("Cloudy Temp: 45° F, Humidity: 71%, Wind: From SW 10 mph");
    assert_eq!(report.condition.as_deref(), Some("Cloudy"));
    assert_eq!(report.temperature, Some(45.0));
    assert_eq!(report.humidity, Some(71.0));
    assert_eq!(report.wind_direction.as_deref(), Some("From SW"));
    assert_eq!(report.wind_speed, Some(10.0));
}

#[test]
fn calm_wind_has_zero_speed_and_no_direction() {
    let report = parse_weather("Sunny Temp: 80° F, Humidity: 40%, Wind: calm");
    assert_eq!(report.wind_direction, None);
    assert_eq!(report.wind_speed, Some(0.0));
}

#[test]
fn indoor_games_get_fixed_conditions() {
    let report = parse_weather("Indoors Temp: , Humidity: , Wind: ");
    assert_eq!(report.temperature, Some(70.0));
    assert_eq!(report.humidity, Some(40.0));
    assert_eq!(report.wind_speed, Some(0.0));
}

#[test]
fn rain_severity_levels() {
    assert_eq!(parse_rain(None), 0.0);
    assert_eq!(parse_rain(Some("Sunny")), 0.0);
    assert_eq!(parse_rain(Some("Cloudy, chance of rain")), 0.25);
    assert_eq!(parse_rain(Some("Light Rain")), 0.5);
    assert_eq!(parse_rain(Some("Snow flurries")), 0.5);
    assert_eq!(parse_rain(Some("Rain")), 1.0);
}

#[test]
fn wind_direction_to_degrees() {
    assert_eq!(wind_direction_degrees(Some("NNE")), Some(22.5));
    assert_eq!(wind_direction_degrees(Some("From NNE")), Some(202.5));
    assert_eq!(wind_direction_degrees(Some("Northwest")), Some(315.0));
    assert_eq!(wind_direction_degrees(Some("Southerly")), Some(180.0));
    assert_eq!(wind_direction_degrees(Some("calm")), None);
    assert_eq!(wind_direction_degrees(None), None);
}

#[test]
fn relocated_stadiums_use_season() {
    assert_eq!(stadium_orientation("LA", 2019, Location::Home), Some(90.0));
    assert_eq!(stadium_orientation("LA", 2020, Location::Home), Some(0.0));
    assert_eq!(stadium_orientation("KC", 2022, Location::Home), Some(137.2));
}

#[test]
fn weather_table_standardizes_wind_across_games() {
    let plays = vec![
        opening_play(
            "2022_01_A",
            "KC",
            Some("Cloudy Temp: 45° F, Humidity: 71%, Wind: From SW 10 mph"),
            "outdoors",
        ),
        opening_play(
            "2022_01_B",
            "BUF",
            Some("Light Rain Temp: 38° F, Humidity: 90%, Wind: NW 20 mph"),
            "outdoors",
        ),
        opening_play("2022_01_C", "DAL", Some("Cloudy Humidity: 50%"), "closed"),
        opening_play(
            "2022_01_D",
            "GB",
            Some("Sunny Temp: 50° F, Wind: W 5 mph"),
            "outdoors",
        ),
        opening_play("2022_01_E", "NE", None, "outdoors"),
    ];
    let mut warnings = Vec::new();
    let table = WeatherTable::build(&plays, &mut warnings);

    assert!(warnings.is_empty());
    assert_eq!(table.len(), 3);

    let a = table.get("2022_01_A");
    assert_eq!(a.rain, 0.0);
    assert!((a.temp_pct - 0.45).abs() < 1e-12);
    assert!((a.humidity_pct - 0.71).abs() < 1e-12);
    assert!(a.wind_speed_z.abs() < 1e-12);

    let b = table.get("2022_01_B");
    assert_eq!(b.rain, 0.5);
    assert!((b.wind_speed_z - 1.0).abs() < 1e-12);

    let c = table.get("2022_01_C");
    assert!((c.temp_pct - 0.7).abs() < 1e-12);
    assert!((c.wind_speed_z + 1.0).abs() < 1e-12);

    assert!(table.get("2022_01_D").rain.is_nan());
    assert!(table.get("2022_01_E").wind_speed_z.is_nan());
}
