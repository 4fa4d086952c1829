use pbp_features::error::FeatureWarning;
use pbp_features::interactions::{PROB_PASS, SituationalFeatures};
use pbp_features::play::{PlayRecord, PlayType};
use pbp_features::tendency::{compute_penalty_z_tables, compute_proe_tables, compute_tendencies};

fn snap(off: &str, def: &str, season: i32, yardline: f64, pass_oe: f64) -> PlayRecord {
    PlayRecord {
        game_id: format!("{season}_01_{off}_{def}"),
        season,
        posteam: Some(off.to_string()),
        defteam: Some(def.to_string()),
        home_team: off.to_string(),
        yardline_100: Some(yardline),
        pass_oe: Some(pass_oe),
        play_type: PlayType::Pass,
        ..PlayRecord::default()
    }
}

fn flagged(mut play: PlayRecord, team: &str) -> PlayRecord {
    play.penalty = true;
    play.penalty_team = Some(team.to_string());
    play
}

#[test]
fn proe_is_split_by_red_zone_and_scaled() {
    let plays = vec![
        snap("KC", "LV", 2023, 60.0, 10.0),
        snap("KC", "LV", 2023, 45.0, 0.0),
        snap("KC", "LV", 2023, 20.0, -20.0),
        snap("KC", "LV", 2023, 5.0, 40.0),
    ];
    let [off, def, off_rz, def_rz] = compute_proe_tables(&plays);

    assert_eq!(off.get("KC", 2023), Some(0.05));
    assert_eq!(def.get("LV", 2023), Some(0.05));
    assert_eq!(off_rz.get("KC", 2023), Some(0.1));
    assert_eq!(def_rz.get("LV", 2023), Some(0.1));
    assert_eq!(off.get("LV", 2023), None);
}

#[test]
fn plays_missing_proe_inputs_are_skipped() {
    let mut no_pass_oe = snap("KC", "LV", 2023, 60.0, 0.0);
    no_pass_oe.pass_oe = None;
    let mut no_defense = snap("KC", "LV", 2023, 60.0, 50.0);
    no_defense.defteam = None;
    let plays = vec![no_pass_oe, no_defense, snap("KC", "LV", 2023, 60.0, 2.0)];

    let [off, ..] = compute_proe_tables(&plays);
    assert_eq!(off.get("KC", 2023), Some(0.02));
}

#[test]
fn penalty_z_is_negated_and_per_season() {
    let mut plays = Vec::new();
    for (team, flags) in [("BUF", 0), ("MIA", 1), ("NE", 2)] {
        for i in 0..4 {
            let p = snap(team, "NYJ", 2021, 50.0, 0.0);
            plays.push(if i < flags { flagged(p, team) } else { p });
        }
    }
    let mut warnings = Vec::new();
    let [off, _def] = compute_penalty_z_tables(&plays, &mut warnings);

    let buf = off.get("BUF", 2021).unwrap();
    let mia = off.get("MIA", 2021).unwrap();
    let ne = off.get("NE", 2021).unwrap();
    assert!(buf > 0.0 && ne < 0.0);
    assert!(mia.abs() < 1e-12);
    assert!((buf - 1.0).abs() < 1e-12);
    assert!((ne + 1.0).abs() < 1e-12);
    assert!(warnings.iter().all(|w| w.column() != "offense_penalty_z"));
}

#[test]
fn zero_variance_season_warns_and_zeroes() {
    let plays = vec![
        snap("BUF", "MIA", 2020, 50.0, 0.0),
        snap("MIA", "BUF", 2020, 50.0, 0.0),
    ];
    let (tendencies, warnings) = compute_tendencies(&plays);

    assert_eq!(tendencies.offense_penalty_z.get("BUF", 2020), Some(0.0));
    assert!(warnings.contains(&FeatureWarning::DegenerateAggregate {
        statistic: "offense_penalty_z".to_string(),
        season: 2020,
        groups: 2,
    }));
}

#[test]
fn absent_team_season_propagates_nan_into_interactions() {
    let plays = vec![snap("KC", "LV", 2023, 60.0, 10.0)];
    let (tendencies, _) = compute_tendencies(&plays);

    let other_season = snap("KC", "LV", 2024, 60.0, 0.0);
    let inputs = tendencies.inputs_for(&other_season);
    assert!(inputs.offense_proe.is_nan());
    let f = SituationalFeatures::build(&inputs, other_season.in_red_zone(), 0.5);
    assert!(f.offense_log_pass_prob.is_nan());
    assert!(f.off_lpp_pdpm.is_nan());

    let known = tendencies.inputs_for(&snap("KC", "LV", 2023, 60.0, 0.0));
    let f = SituationalFeatures::build(&known, Some(false), 0.0);
    assert!((f.offense_log_pass_prob - (PROB_PASS + 0.1).ln()).abs() < 1e-12);
}
