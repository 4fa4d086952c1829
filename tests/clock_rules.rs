use pbp_features::clock::{ClockInputs, ClockTransition, classify};
use pbp_features::play::PlayType;

fn inputs(play_type: PlayType, game_secs: f64, half_secs: f64) -> ClockInputs {
    ClockInputs {
        play_type,
        complete_pass: false,
        penalty: false,
        fumble_lost: false,
        qb_spike: false,
        touchdown: false,
        out_of_bounds: false,
        game_seconds_remaining: game_secs,
        half_seconds_remaining: half_secs,
    }
}

#[test]
fn completed_pass_in_bounds_keeps_clock_running() {
    let mut play = inputs(PlayType::Pass, 600.0, 600.0);
    play.complete_pass = true;
    assert_eq!(classify(&play), ClockTransition::Runs);
}

#[test]
fn incomplete_pass_stops_at_any_time() {
    for secs in [3600.0, 1800.0, 301.0, 299.0, 10.0] {
        let play = inputs(PlayType::Pass, secs, secs.min(1800.0));
        assert_eq!(classify(&play), ClockTransition::Stops, "at {secs}s");
    }
}

#[test]
fn run_out_of_bounds_pauses_outside_hurry_up() {
    let mut play = inputs(PlayType::Run, 360.0, 180.0);
    play.out_of_bounds = true;
    assert_eq!(classify(&play), ClockTransition::Pauses);
}

#[test]
fn run_out_of_bounds_stops_inside_half_hurry_up() {
    let mut play = inputs(PlayType::Run, 1890.0, 90.0);
    play.out_of_bounds = true;
    assert_eq!(classify(&play), ClockTransition::Stops);
}

#[test]
fn run_out_of_bounds_stops_inside_game_hurry_up() {
    let mut play = inputs(PlayType::Run, 299.0, 299.0);
    play.out_of_bounds = true;
    assert_eq!(classify(&play), ClockTransition::Stops);
}

#[test]
fn non_scrimmage_plays_always_stop() {
    for play_type in [
        PlayType::Punt,
        PlayType::FieldGoal,
        PlayType::Kickoff,
        PlayType::ExtraPoint,
        PlayType::NoPlay,
        PlayType::QbSpike,
        PlayType::Other,
    ] {
        let mut play = inputs(play_type, 2000.0, 200.0);
        play.complete_pass = true;
        assert_eq!(classify(&play), ClockTransition::Stops, "{play_type:?}");
    }
}

#[test]
fn scoring_turnovers_and_flags_stop_the_clock() {
    let base = {
        let mut p = inputs(PlayType::Run, 2000.0, 200.0);
        p.complete_pass = false;
        p
    };
    let cases: [fn(&mut ClockInputs); 4] = [
        |p| p.penalty = true,
        |p| p.fumble_lost = true,
        |p| p.touchdown = true,
        |p| p.qb_spike = true,
    ];
    for set in cases {
        let mut play = base;
        set(&mut play);
        assert_eq!(classify(&play), ClockTransition::Stops);
    }
}

#[test]
fn exactly_one_indicator_is_set_for_every_combination() {
    let types = [
        PlayType::Pass,
        PlayType::Run,
        PlayType::QbKneel,
        PlayType::Punt,
        PlayType::Other,
    ];
    for play_type in types {
        for bits in 0u8..64 {
            for (game, half) in [(3000.0, 1200.0), (250.0, 250.0), (1850.0, 50.0)] {
                let mut play = inputs(play_type, game, half);
                play.complete_pass = bits & 1 != 0;
                play.penalty = bits & 2 != 0;
                play.fumble_lost = bits & 4 != 0;
                play.qb_spike = bits & 8 != 0;
                play.touchdown = bits & 16 != 0;
                play.out_of_bounds = bits & 32 != 0;

                let (stops, pauses, runs) = classify(&play).indicators();
                assert_eq!(stops + pauses + runs, 1.0);
            }
        }
    }
}
