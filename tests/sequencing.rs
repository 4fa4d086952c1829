use pbp_features::clock::ClockTransition;
use pbp_features::error::FeatureError;
use pbp_features::play::{PlayRecord, PlayType};
use pbp_features::sequencer::{sequence_game, sort_chronologically, split_games};

fn play(game: &str, id: i64, drive: i64, secs: f64, play_type: PlayType) -> PlayRecord {
    PlayRecord {
        game_id: game.to_string(),
        play_id: id,
        season: 2022,
        qtr: 1,
        drive: Some(drive),
        quarter_seconds_remaining: secs - 2700.0,
        half_seconds_remaining: secs - 1800.0,
        game_seconds_remaining: secs,
        play_type,
        ..PlayRecord::default()
    }
}

fn opening_drive(game: &str) -> Vec<PlayRecord> {
    let mut out_of_bounds_run = play(game, 4, 2, 3520.0, PlayType::Run);
    out_of_bounds_run.out_of_bounds = true;
    vec![
        play(game, 1, 1, 3600.0, PlayType::Kickoff),
        play(game, 2, 2, 3595.0, PlayType::Run),
        play(game, 3, 2, 3560.0, PlayType::Run),
        out_of_bounds_run,
        play(game, 5, 2, 3500.0, PlayType::Pass),
    ]
}

#[test]
fn clock_state_carries_from_previous_play() {
    let game = opening_drive("2022_01_BUF_LA");
    let seq = sequence_game(&game);

    let transitions: Vec<ClockTransition> = seq.iter().map(|s| s.transition).collect();
    assert_eq!(
        transitions,
        vec![
            ClockTransition::Stops,
            ClockTransition::Runs,
            ClockTransition::Runs,
            ClockTransition::Pauses,
            ClockTransition::Stops,
        ]
    );

    let running: Vec<bool> = seq.iter().map(|s| s.clock_running).collect();
    assert_eq!(running, vec![false, false, true, true, true]);
    let paused: Vec<bool> = seq.iter().map(|s| s.clock_paused_before).collect();
    assert_eq!(paused, vec![false, false, false, false, true]);
}

#[test]
fn drive_continuity_and_lookahead() {
    let game = opening_drive("2022_01_BUF_LA");
    let seq = sequence_game(&game);

    let same: Vec<bool> = seq.iter().map(|s| s.same_drive).collect();
    assert_eq!(same, vec![false, false, true, true, true]);

    assert_eq!(seq[0].next_game_seconds_remaining, Some(3595.0));
    assert_eq!(seq[3].next_half_seconds_remaining, Some(1700.0));
    let last = seq.last().unwrap();
    assert_eq!(last.next_game_seconds_remaining, None);
    assert_eq!(last.next_quarter_seconds_remaining, None);
}

#[test]
fn games_do_not_leak_into_each_other() {
    let mut plays = opening_drive("2022_01_BUF_LA");
    plays.truncate(3);
    plays.extend(opening_drive("2022_01_NO_ATL"));

    let games = split_games(&plays).unwrap();
    assert_eq!(games.len(), 2);

    let first = sequence_game(games[0]);
    let second = sequence_game(games[1]);
    assert_eq!(first.last().unwrap().next_game_seconds_remaining, None);
    assert!(first.last().unwrap().transition.runs_after());
    assert!(!second[0].clock_running);
    assert!(!second[0].same_drive);
}

#[test]
fn interleaved_games_are_rejected() {
    let mut plays = opening_drive("2022_01_BUF_LA");
    let other = opening_drive("2022_01_NO_ATL");
    plays.insert(2, other[0].clone());

    assert!(matches!(
        split_games(&plays),
        Err(FeatureError::UnsortedSequence { game_id, .. }) if game_id == "2022_01_BUF_LA"
    ));
}

#[test]
fn reversed_plays_are_rejected_until_sorted() {
    let mut plays = opening_drive("2022_01_BUF_LA");
    plays.reverse();
    assert!(split_games(&plays).is_err());

    sort_chronologically(&mut plays);
    let ids: Vec<i64> = plays.iter().map(|p| p.play_id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    assert!(split_games(&plays).is_ok());
}
